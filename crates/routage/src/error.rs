use http::StatusCode;
use serde_json::{Map, Value};
use thiserror::Error;

/// An expected request-level failure carrying an HTTP status.
///
/// `HttpError` is the designated signal for "this request cannot be served
/// and the client should be told why": bad input, missing resources, failed
/// authorization. It always carries a status code and a human readable
/// message, and may carry a structured payload which is surfaced verbatim
/// as the error body instead of the generic envelope.
#[derive(Debug, Error)]
#[error("{status}: {message}")]
pub struct HttpError {
    status: StatusCode,
    message: String,
    payload: Map<String, Value>,
}

impl HttpError {
    pub fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self { status, message: message.into(), payload: Map::new() }
    }

    pub fn bad_request() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad request")
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized")
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden")
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not found")
    }

    /// Replaces the default message while keeping the status.
    pub fn with_message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = message.into();
        self
    }

    /// Attaches a structured payload. A non-empty payload is sent to the
    /// client as-is in place of the `{"success":false,"error":..}` envelope.
    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }
}

/// The failure channel of a dispatch.
///
/// Handlers signal expected failures with [`HttpError`]; everything else is
/// carried opaquely as [`DispatchError::Unexpected`] and collapsed to a
/// generic 500 at the application boundary, without leaking its detail.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("unexpected failure: {source}")]
    Unexpected {
        #[from]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl DispatchError {
    pub fn unexpected<E>(e: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Unexpected { source: e.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convenience_constructors_fix_status_and_message() {
        let cases = [
            (HttpError::bad_request(), StatusCode::BAD_REQUEST, "bad request"),
            (HttpError::unauthorized(), StatusCode::UNAUTHORIZED, "unauthorized"),
            (HttpError::forbidden(), StatusCode::FORBIDDEN, "forbidden"),
            (HttpError::not_found(), StatusCode::NOT_FOUND, "not found"),
        ];

        for (error, status, message) in cases {
            assert_eq!(error.status(), status);
            assert_eq!(error.message(), message);
            assert!(error.payload().is_empty());
        }
    }

    #[test]
    fn payload_and_message_are_attachable() {
        let mut payload = Map::new();
        payload.insert("reason".to_string(), Value::String("quota".to_string()));

        let error = HttpError::forbidden().with_message("quota exceeded").with_payload(payload);

        assert_eq!(error.status(), StatusCode::FORBIDDEN);
        assert_eq!(error.message(), "quota exceeded");
        assert_eq!(error.payload().get("reason"), Some(&Value::String("quota".to_string())));
    }

    #[test]
    fn unexpected_wraps_any_error() {
        let io = std::io::Error::other("disk on fire");
        let error = DispatchError::unexpected(io);
        assert!(matches!(error, DispatchError::Unexpected { .. }));
    }

    #[test]
    fn http_error_converts_into_dispatch_error() {
        let error: DispatchError = HttpError::not_found().into();
        assert!(matches!(error, DispatchError::Http(_)));
    }
}
