//! Immutable snapshot of an inbound HTTP call.
//!
//! [`RequestBuilder`] is the single boundary where transport specific input
//! (raw target, header list, buffered body) is turned into a stable read-only
//! view; the rest of the crate only ever touches the built [`Request`].

use std::collections::HashMap;

use bytes::Bytes;
use http::Method;
use once_cell::sync::OnceCell;
use serde_json::{Map, Value};

/// An inbound HTTP request, immutable after construction.
///
/// The JSON view of the body is decoded lazily and at most once; a body that
/// is empty, invalid JSON, or not a JSON object reads as an empty object.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: HashMap<String, Vec<String>>,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
    json: OnceCell<Map<String, Value>>,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Normalized absolute path: single leading slash, base path stripped.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_params(&self) -> &HashMap<String, Vec<String>> {
        &self.query
    }

    /// First value for a query key, if present.
    pub fn query_first(&self, key: &str) -> Option<&str> {
        self.query.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// The body decoded as a JSON object. Decoding happens on first access
    /// and is cached; repeated calls are cheap and never fail.
    pub fn json_body(&self) -> &Map<String, Value> {
        self.json.get_or_init(|| decode_json_object(self.body.as_deref()))
    }

    pub fn json_field(&self, key: &str) -> Option<&Value> {
        self.json_body().get(key)
    }

    /// A field from the request payload: the JSON body is preferred, a
    /// urlencoded form body is consulted when the JSON object lacks the key.
    pub fn form_field(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.json_field(key) {
            return Some(value.clone());
        }

        if !self.has_form_body() {
            return None;
        }

        let body = self.body.as_deref()?;
        let fields: Vec<(String, String)> = serde_urlencoded::from_bytes(body).unwrap_or_default();
        fields
            .into_iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| Value::String(value))
    }

    fn has_form_body(&self) -> bool {
        self.header("content-type")
            .and_then(|value| value.parse::<mime::Mime>().ok())
            .is_some_and(|m| m.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str())
    }
}

fn decode_json_object(body: Option<&[u8]>) -> Map<String, Value> {
    let Some(body) = body else { return Map::new() };
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Builds a [`Request`] from transport specific pieces.
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    path: String,
    query_string: String,
    headers: HashMap<String, String>,
    content_type_fallback: Option<String>,
    content_length_fallback: Option<String>,
    base_path: Option<String>,
    body: Option<Bytes>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: Method::GET,
            path: "/".to_string(),
            query_string: String::new(),
            headers: HashMap::new(),
            content_type_fallback: None,
            content_length_fallback: None,
            base_path: None,
            body: None,
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Raw request path as seen by the transport; normalized at build time.
    pub fn path<S: Into<String>>(mut self, path: S) -> Self {
        self.path = path.into();
        self
    }

    /// Raw query string, without the leading `?`.
    pub fn query_string<S: Into<String>>(mut self, query_string: S) -> Self {
        self.query_string = query_string.into();
        self
    }

    /// Adds a header; names are stored lowercase, repeated names overwrite.
    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Content type from a transport side channel, used only when no
    /// `Content-Type` header was provided.
    pub fn content_type_fallback<S: Into<String>>(mut self, value: S) -> Self {
        self.content_type_fallback = Some(value.into());
        self
    }

    /// Content length from a transport side channel, used only when no
    /// `Content-Length` header was provided.
    pub fn content_length_fallback<S: Into<String>>(mut self, value: S) -> Self {
        self.content_length_fallback = Some(value.into());
        self
    }

    /// Deployment prefix to strip from the path. An exact prefix match is
    /// preferred; otherwise the path is cut after the first occurrence.
    pub fn base_path<S: Into<String>>(mut self, base_path: S) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn body<B: Into<Bytes>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn build(self) -> Request {
        let mut headers = self.headers;
        if let Some(content_type) = self.content_type_fallback {
            headers.entry("content-type".to_string()).or_insert(content_type);
        }
        if let Some(content_length) = self.content_length_fallback {
            headers.entry("content-length".to_string()).or_insert(content_length);
        }

        Request {
            method: self.method,
            path: normalize_path(&self.path, self.base_path.as_deref()),
            query: parse_query(&self.query_string),
            headers,
            body: self.body,
            json: OnceCell::new(),
        }
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_path(path: &str, base_path: Option<&str>) -> String {
    let mut path = path;

    if let Some(base) = base_path.filter(|base| !base.is_empty()) {
        if let Some(rest) = path.strip_prefix(base) {
            path = rest;
        } else if let Some(position) = path.find(base) {
            path = &path[position + base.len()..];
        }
    }

    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn parse_query(query_string: &str) -> HashMap<String, Vec<String>> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query_string).unwrap_or_default();

    let mut query: HashMap<String, Vec<String>> = HashMap::new();
    for (key, value) in pairs {
        query.entry(key).or_default().push(value);
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_gets_single_leading_slash() {
        assert_eq!(normalize_path("zones/42", None), "/zones/42");
        assert_eq!(normalize_path("///zones", None), "/zones");
        assert_eq!(normalize_path("//", None), "/");
        assert_eq!(normalize_path("", None), "/");
    }

    #[test]
    fn base_path_exact_prefix_is_stripped() {
        assert_eq!(normalize_path("/api/v1/zones", Some("/api/v1")), "/zones");
    }

    #[test]
    fn base_path_substring_fallback_cuts_through_it() {
        assert_eq!(normalize_path("/mnt/www/api/v1/zones", Some("/api/v1")), "/zones");
    }

    #[test]
    fn absent_base_path_leaves_path_alone() {
        assert_eq!(normalize_path("/zones/42", Some("/api/v1")), "/zones/42");
    }

    #[test]
    fn query_collects_repeated_keys_in_order() {
        let request = Request::builder().query_string("zone=1&zone=2&year=2024").build();
        assert_eq!(request.query_params().get("zone"), Some(&vec!["1".to_string(), "2".to_string()]));
        assert_eq!(request.query_first("year"), Some("2024"));
        assert_eq!(request.query_first("missing"), None);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let request = Request::builder().header("X-Api-Token", "secret").build();
        assert_eq!(request.header("x-api-token"), Some("secret"));
        assert_eq!(request.header("X-API-TOKEN"), Some("secret"));
    }

    #[test]
    fn content_fallbacks_fill_only_missing_headers() {
        let request = Request::builder()
            .header("Content-Type", "application/json")
            .content_type_fallback("text/plain")
            .content_length_fallback("12")
            .build();

        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("content-length"), Some("12"));
    }

    #[test]
    fn json_body_reads_objects() {
        let request = Request::builder().body(r#"{"zone": 42, "label": "Côte"}"#).build();
        assert_eq!(request.json_field("zone"), Some(&Value::from(42)));
        assert_eq!(request.json_field("label"), Some(&Value::String("Côte".to_string())));
    }

    #[test]
    fn invalid_or_non_object_json_reads_as_empty_object() {
        for body in ["not json at all", "[1,2,3]", "\"scalar\"", ""] {
            let request = Request::builder().body(body).build();
            assert!(request.json_body().is_empty(), "body {body:?} should read as empty");
        }
        let without_body = Request::builder().build();
        assert!(without_body.json_body().is_empty());
    }

    #[test]
    fn json_body_is_decoded_once_and_cached() {
        let request = Request::builder().body(r#"{"a":1}"#).build();
        let first = request.json_body() as *const Map<String, Value>;
        let second = request.json_body() as *const Map<String, Value>;
        assert_eq!(first, second);
    }

    #[test]
    fn form_field_prefers_json_then_falls_back_to_form_body() {
        let json_request = Request::builder()
            .header("Content-Type", "application/json")
            .body(r#"{"season": "hiver"}"#)
            .build();
        assert_eq!(json_request.form_field("season"), Some(Value::String("hiver".to_string())));

        let form_request = Request::builder()
            .header("Content-Type", "application/x-www-form-urlencoded; charset=utf-8")
            .body("season=ete&zone=3")
            .build();
        assert_eq!(form_request.form_field("season"), Some(Value::String("ete".to_string())));
        assert_eq!(form_request.form_field("missing"), None);
    }

    #[test]
    fn form_fallback_requires_form_content_type() {
        let request = Request::builder().body("season=ete").build();
        assert_eq!(request.form_field("season"), None);
    }
}
