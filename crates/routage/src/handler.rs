//! Handler contract and the closed set of results a handler may produce.

use std::marker::PhantomData;

use serde_json::{Map, Value};

use crate::error::DispatchError;
use crate::request::Request;
use crate::response::Response;
use crate::router::PathParam;

/// What a handler may hand back to the router.
///
/// Each variant has exactly one normalization rule (see
/// `Router::dispatch`): a full [`Response`] passes through untouched, the
/// others are shaped into conventional JSON or raw-text responses.
#[derive(Debug)]
pub enum Outcome {
    /// A fully built response, returned unchanged.
    Response(Response),
    /// A JSON document, sent as a 200 JSON body.
    Json(Value),
    /// Shaped into `{"success": <bool>}` with status 200.
    Flag(bool),
    /// Shaped into `{"success": true}` with status 200.
    Empty,
    /// A bare scalar, sent as a raw text body with status 200.
    Text(String),
}

impl From<Response> for Outcome {
    fn from(response: Response) -> Self {
        Outcome::Response(response)
    }
}

impl From<Map<String, Value>> for Outcome {
    fn from(map: Map<String, Value>) -> Self {
        Outcome::Json(Value::Object(map))
    }
}

impl From<bool> for Outcome {
    fn from(flag: bool) -> Self {
        Outcome::Flag(flag)
    }
}

impl From<()> for Outcome {
    fn from(_: ()) -> Self {
        Outcome::Empty
    }
}

impl From<String> for Outcome {
    fn from(text: String) -> Self {
        Outcome::Text(text)
    }
}

impl From<&str> for Outcome {
    fn from(text: &str) -> Self {
        Outcome::Text(text.to_string())
    }
}

/// Loose JSON values route onto the closed set: objects and arrays become
/// JSON bodies, `null` means "done, nothing to say", booleans are success
/// flags and scalars are raw text.
impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(_) | Value::Array(_) => Outcome::Json(value),
            Value::Null => Outcome::Empty,
            Value::Bool(flag) => Outcome::Flag(flag),
            Value::String(text) => Outcome::Text(text),
            Value::Number(number) => Outcome::Text(number.to_string()),
        }
    }
}

/// A route endpoint: the request plus the positionally extracted path
/// parameters, producing an [`Outcome`] or failing through [`DispatchError`].
pub trait Handler: Send + Sync {
    fn invoke(&self, request: &Request, params: &[PathParam]) -> Result<Outcome, DispatchError>;
}

/// A plain function or closure used as a [`Handler`].
pub struct FnHandler<F, T> {
    f: F,
    _marker: PhantomData<fn() -> T>,
}

/// Wraps a function as a [`Handler`]. The function may return any
/// `Result<T, DispatchError>` where `T` converts into an [`Outcome`].
pub fn handler_fn<F, T>(f: F) -> FnHandler<F, T>
where
    F: Fn(&Request, &[PathParam]) -> Result<T, DispatchError> + Send + Sync,
    T: Into<Outcome>,
{
    FnHandler { f, _marker: PhantomData }
}

impl<F, T> Handler for FnHandler<F, T>
where
    F: Fn(&Request, &[PathParam]) -> Result<T, DispatchError> + Send + Sync,
    T: Into<Outcome> + Send + Sync,
{
    fn invoke(&self, request: &Request, params: &[PathParam]) -> Result<Outcome, DispatchError> {
        (self.f)(request, params).map(Into::into)
    }
}
