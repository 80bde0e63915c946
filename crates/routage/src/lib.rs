//! Request-dispatch core for a small web backend.
//!
//! The crate owns the path between a fully buffered request and a fully
//! buffered response: route-table matching with positional parameter
//! extraction, handler invocation, normalization of whatever the handler
//! returns, and a single catch boundary that turns every failure into a
//! JSON envelope with security and CORS headers applied. Reading requests
//! off a connection and flushing responses back is the transport's
//! business. The public surface is [`Application::handle`].
//!
//! # Example
//!
//! ```
//! use http::{Method, StatusCode};
//! use routage::{Application, DispatchError, PathParam, Request, Router, handler_fn};
//! use serde_json::json;
//!
//! fn zone_detail(_request: &Request, params: &[PathParam]) -> Result<serde_json::Value, DispatchError> {
//!     Ok(json!({"zone": params[0].as_int()}))
//! }
//!
//! let router = Router::builder()
//!     .get("/zones/{id}", handler_fn(zone_detail))
//!     .build();
//! let app = Application::new(router);
//!
//! let request = Request::builder()
//!     .method(Method::GET)
//!     .path("/zones/42")
//!     .build();
//!
//! let response = app.handle(&request);
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.body().as_ref(), br#"{"zone":42}"#);
//! assert_eq!(response.header("X-Frame-Options"), Some("DENY"));
//! ```

mod app;
mod error;
mod handler;
mod request;
mod response;
mod router;

pub use app::Application;
pub use app::DEFAULT_HEADERS;
pub use app::Module;
pub use error::DispatchError;
pub use error::HttpError;
pub use handler::FnHandler;
pub use handler::Handler;
pub use handler::Outcome;
pub use handler::handler_fn;
pub use request::Request;
pub use request::RequestBuilder;
pub use response::JSON_CONTENT_TYPE;
pub use response::Response;
pub use router::PathParam;
pub use router::Router;
pub use router::RouterBuilder;
