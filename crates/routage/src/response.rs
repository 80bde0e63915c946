//! Outgoing HTTP message as a value type.
//!
//! A [`Response`] is never mutated in place once handed to another component;
//! every transformation (`with_header`, `with_status`, ...) clones and returns
//! a new value, so earlier references stay stable across the pipeline.

use std::io::{self, Write};

use bytes::Bytes;
use http::StatusCode;
use serde_json::Value;

/// Default content type for JSON bodies, applied by [`Response::json`] when
/// the caller has not supplied one.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// A status code, ordered header list and body buffer.
///
/// Header storage is case-sensitive and insertion-ordered; setting a header
/// replaces the value of an exactly matching key, otherwise appends.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl Response {
    pub fn new<B: Into<Bytes>>(body: B, status: StatusCode) -> Self {
        Self { status, headers: Vec::new(), body: body.into() }
    }

    /// A raw text body with status 200 and no content type, mirroring what a
    /// handler returning a bare scalar produces.
    pub fn text<B: Into<Bytes>>(body: B) -> Self {
        Self::new(body, StatusCode::OK)
    }

    /// Serializes `data` as the response body.
    ///
    /// The encoding keeps non-ASCII characters and forward slashes verbatim
    /// (serde_json's default), so body content is deterministic.
    pub fn json(data: &Value, status: StatusCode) -> Self {
        Self::json_with_headers(data, status, Vec::new())
    }

    /// Like [`Response::json`], with caller supplied headers. `Content-Type`
    /// defaults to [`JSON_CONTENT_TYPE`] unless the caller already set one.
    pub fn json_with_headers(data: &Value, status: StatusCode, headers: Vec<(String, String)>) -> Self {
        let mut response = Self { status, headers, body: Bytes::from(data.to_string()) };
        if response.header("content-type").is_none() {
            set_header(&mut response.headers, "Content-Type", JSON_CONTENT_TYPE);
        }
        response
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Case-insensitive header lookup, first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns a new response with the header set; the receiver is untouched.
    pub fn with_header<K, V>(&self, name: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut clone = self.clone();
        set_header(&mut clone.headers, name, value);
        clone
    }

    /// Returns a new response with every given header set, in order.
    pub fn with_headers<I, K, V>(&self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut clone = self.clone();
        for (name, value) in headers {
            set_header(&mut clone.headers, name, value);
        }
        clone
    }

    pub fn with_status(&self, status: StatusCode) -> Self {
        let mut clone = self.clone();
        clone.status = status;
        clone
    }

    /// Returns a new response with an empty body, headers retained. Used for
    /// `HEAD` responses.
    pub fn without_body(&self) -> Self {
        let mut clone = self.clone();
        clone.body = Bytes::new();
        clone
    }

    /// Writes the response to `writer`: status line, headers and the blank
    /// separator exactly once, then the body.
    ///
    /// When `headers_flushed` is already set the head section is skipped
    /// entirely and only the body is written, so a double send cannot emit
    /// headers twice. The flag is set after the head goes out.
    pub fn write_to<W: Write>(&self, writer: &mut W, headers_flushed: &mut bool) -> io::Result<()> {
        if !*headers_flushed {
            let reason = self.status.canonical_reason().unwrap_or("");
            write!(writer, "HTTP/1.1 {} {}\r\n", self.status.as_u16(), reason)?;
            for (name, value) in &self.headers {
                write!(writer, "{name}: {value}\r\n")?;
            }
            writer.write_all(b"\r\n")?;
            *headers_flushed = true;
        }

        writer.write_all(&self.body)
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(Bytes::new(), StatusCode::OK)
    }
}

/// Last-write-wins per exact key, insertion order preserved otherwise.
fn set_header<K, V>(headers: &mut Vec<(String, String)>, name: K, value: V)
where
    K: Into<String>,
    V: Into<String>,
{
    let name = name.into();
    let value = value.into();
    match headers.iter_mut().find(|(key, _)| *key == name) {
        Some((_, existing)) => *existing = value,
        None => headers.push((name, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_sets_default_content_type() {
        let response = Response::json(&json!({"ok": true}), StatusCode::OK);
        assert_eq!(response.header("Content-Type"), Some(JSON_CONTENT_TYPE));
        assert_eq!(response.body().as_ref(), br#"{"ok":true}"#);
    }

    #[test]
    fn json_respects_caller_content_type() {
        let headers = vec![("Content-Type".to_string(), "application/problem+json".to_string())];
        let response = Response::json_with_headers(&json!({}), StatusCode::BAD_REQUEST, headers);
        assert_eq!(response.header("content-type"), Some("application/problem+json"));
    }

    #[test]
    fn json_keeps_unicode_and_slashes_unescaped() {
        let response = Response::json(&json!({"name": "Départements", "href": "/zones/42"}), StatusCode::OK);
        let body = String::from_utf8(response.body().to_vec()).unwrap();
        assert!(body.contains("Départements"));
        assert!(body.contains("/zones/42"));
        assert!(!body.contains("\\/"));
        assert!(!body.contains("\\u"));
    }

    #[test]
    fn copy_on_write_chains_compose_left_to_right() {
        let base = Response::json(&json!({"ok": true}), StatusCode::OK);
        let overridden = base.with_header("Content-Type", "text/plain");
        let unchanged_by_empty_merge = overridden.with_headers(Vec::<(String, String)>::new());

        assert_eq!(unchanged_by_empty_merge.header("Content-Type"), Some("text/plain"));
        // the earlier values are untouched
        assert_eq!(base.header("Content-Type"), Some(JSON_CONTENT_TYPE));
    }

    #[test]
    fn set_header_is_last_write_wins_per_exact_key() {
        let response = Response::default()
            .with_header("X-Token", "a")
            .with_header("X-Token", "b")
            .with_header("x-token", "c");

        // exact-key replacement, the differently cased key is stored separately
        let stored: Vec<_> = response.headers().iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(stored, vec![("X-Token", "b"), ("x-token", "c")]);
        assert_eq!(response.header("X-TOKEN"), Some("b"));
    }

    #[test]
    fn without_body_keeps_status_and_headers() {
        let response = Response::json(&json!({"ok": true}), StatusCode::CREATED).without_body();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.header("Content-Type"), Some(JSON_CONTENT_TYPE));
        assert!(response.body().is_empty());
    }

    #[test]
    fn write_to_emits_head_then_body() {
        let response = Response::text("pong").with_header("X-Probe", "1");
        let mut out = Vec::new();
        let mut flushed = false;

        response.write_to(&mut out, &mut flushed).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("X-Probe: 1\r\n"));
        assert!(text.ends_with("\r\n\r\npong"));
        assert!(flushed);
    }

    #[test]
    fn write_to_skips_head_when_already_flushed() {
        let response = Response::text("pong");
        let mut out = Vec::new();
        let mut flushed = true;

        response.write_to(&mut out, &mut flushed).unwrap();

        assert_eq!(out, b"pong");
    }
}
