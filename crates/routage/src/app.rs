//! Application boundary: the single choke point between dispatch and the
//! transport. Every outcome of a dispatch leaves [`Application::handle`] as
//! a well-formed [`Response`] carrying the default security and CORS headers.

use http::StatusCode;
use serde_json::{Value, json};
use tracing::error;

use crate::error::DispatchError;
use crate::request::Request;
use crate::response::Response;
use crate::router::{Router, RouterBuilder};

/// Headers guaranteed on every outgoing response. A header already set by
/// the handler or error path survives; defaults only fill the gaps.
pub const DEFAULT_HEADERS: [(&str, &str); 7] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, PATCH, OPTIONS"),
    (
        "Access-Control-Allow-Headers",
        "Content-Type, Authorization, X-Requested-With, X-CSRF-Token, X-Api-Token",
    ),
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "DENY"),
    ("Referrer-Policy", "strict-origin-when-cross-origin"),
    ("Permissions-Policy", "geolocation=(), microphone=(), camera=()"),
];

/// A feature module contributing routes at bootstrap.
///
/// Modules are registered once, before the first dispatch; the router built
/// from their combined registrations is read-only afterwards.
pub trait Module {
    fn register(&self, router: RouterBuilder) -> RouterBuilder;
}

/// Top-level request/response boundary.
pub struct Application {
    router: Router,
}

impl Application {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Dispatches the request and translates any failure into a JSON error
    /// envelope with the correct status, then applies the default headers.
    ///
    /// An [`crate::HttpError`] surfaces with its own status and either its
    /// structured payload (verbatim, when non-empty) or the generic
    /// `{"success":false,"error":<message>}` shape. Anything else is logged
    /// once and collapsed to a fixed 500 envelope; its detail never reaches
    /// the client.
    pub fn handle(&self, request: &Request) -> Response {
        let response = match self.router.dispatch(request) {
            Ok(response) => response,
            Err(DispatchError::Http(http_error)) => {
                let body = if http_error.payload().is_empty() {
                    json!({"success": false, "error": http_error.message()})
                } else {
                    Value::Object(http_error.payload().clone())
                };
                Response::json(&body, http_error.status())
            }
            Err(DispatchError::Unexpected { source }) => {
                error!(method = %request.method(), path = request.path(), "dispatch failed: {source}");
                Response::json(
                    &json!({"success": false, "error": "internal server error"}),
                    StatusCode::INTERNAL_SERVER_ERROR,
                )
            }
        };

        apply_default_headers(response)
    }
}

fn apply_default_headers(response: Response) -> Response {
    DEFAULT_HEADERS.iter().fold(response, |response, (name, value)| {
        if response.header(name).is_some() {
            response
        } else {
            response.with_header(*name, *value)
        }
    })
}
