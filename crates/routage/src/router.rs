//! Route table, pattern compilation and dispatch.
//!
//! Patterns are compiled once at registration and matched many times.
//! `{name}` placeholders (identifier names) become named captures matching
//! any run of non-slash characters; literal text is escaped verbatim. The
//! compiled matcher is anchored at both ends with an optional trailing
//! slash. Candidates are tried strictly in registration order and the first
//! match wins; there is no specificity ranking.

use std::collections::HashMap;
use std::fmt;

use http::{Method, StatusCode};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use tracing::debug;

use crate::error::{DispatchError, HttpError};
use crate::handler::{Handler, Outcome};
use crate::request::Request;
use crate::response::Response;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_]*)\}").expect("placeholder regex is valid"));

/// A positionally extracted route variable.
///
/// A captured segment that parses fully as an integer is handed to the
/// handler as [`PathParam::Int`]; anything else stays a string. This is
/// parameter policy, not validation: `007` becomes `7`, `ab12` stays text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathParam {
    Int(i64),
    Str(String),
}

impl PathParam {
    fn from_segment(segment: &str) -> Self {
        match segment.parse::<i64>() {
            Ok(number) => PathParam::Int(number),
            Err(_) => PathParam::Str(segment.to_string()),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PathParam::Int(number) => Some(*number),
            PathParam::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PathParam::Int(_) => None,
            PathParam::Str(text) => Some(text),
        }
    }
}

impl fmt::Display for PathParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathParam::Int(number) => write!(f, "{number}"),
            PathParam::Str(text) => write!(f, "{text}"),
        }
    }
}

struct Route {
    pattern: String,
    regex: Regex,
    variables: Vec<String>,
    handler: Box<dyn Handler>,
}

/// Compiles a path template into an anchored matcher plus the variable
/// names in declaration order.
fn compile_pattern(pattern: &str) -> (Regex, Vec<String>) {
    let trimmed = pattern.trim_end_matches('/');

    let mut variables = Vec::new();
    let mut source = String::from("^");
    let mut cursor = 0;

    for capture in PLACEHOLDER.captures_iter(trimmed) {
        let whole = capture.get(0).expect("capture 0 always present");
        let name = &capture[1];

        source.push_str(&regex::escape(&trimmed[cursor..whole.start()]));
        source.push_str(&format!("(?P<{name}>[^/]+)"));
        variables.push(name.to_string());
        cursor = whole.end();
    }
    source.push_str(&regex::escape(&trimmed[cursor..]));
    source.push_str("/?$");

    let regex = Regex::new(&source).expect("compiled route pattern is a valid regex");
    (regex, variables)
}

/// Read-only route table; built once, then only matched against.
pub struct Router {
    routes: HashMap<Method, Vec<Route>>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Matches the request against the table, invokes the winning handler
    /// and normalizes its outcome into a [`Response`].
    ///
    /// `HEAD` requests fall back to the `GET` bucket when no `HEAD` routes
    /// exist, and their response body is stripped either way. A request no
    /// route matches fails with a not-found [`HttpError`].
    pub fn dispatch(&self, request: &Request) -> Result<Response, DispatchError> {
        let method = request.method();
        let path = trim_one_trailing_slash(request.path());

        for route in self.candidates(method) {
            let Some(captures) = route.regex.captures(path) else {
                continue;
            };

            let params = route
                .variables
                .iter()
                .filter_map(|name| captures.name(name))
                .map(|capture| PathParam::from_segment(capture.as_str()))
                .collect::<Vec<_>>();

            debug!(pattern = %route.pattern, path, "route matched");

            let outcome = route.handler.invoke(request, &params)?;
            let response = normalize_outcome(outcome);

            return Ok(if *method == Method::HEAD { response.without_body() } else { response });
        }

        Err(HttpError::not_found().into())
    }

    fn candidates(&self, method: &Method) -> &[Route] {
        match self.routes.get(method) {
            Some(routes) if !routes.is_empty() => routes,
            _ if *method == Method::HEAD => {
                self.routes.get(&Method::GET).map(Vec::as_slice).unwrap_or_default()
            }
            _ => &[],
        }
    }
}

/// One normalization rule per [`Outcome`] variant.
fn normalize_outcome(outcome: Outcome) -> Response {
    match outcome {
        Outcome::Response(response) => response,
        Outcome::Json(value) => Response::json(&value, StatusCode::OK),
        Outcome::Flag(flag) => Response::json(&json!({"success": flag}), StatusCode::OK),
        Outcome::Empty => Response::json(&json!({"success": true}), StatusCode::OK),
        Outcome::Text(text) => Response::text(text),
    }
}

fn trim_one_trailing_slash(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(shorter) if !shorter.is_empty() => shorter,
        _ => path,
    }
}

macro_rules! method_route {
    ($name:ident, $method:ident) => {
        pub fn $name<H: Handler + 'static>(self, pattern: &str, handler: H) -> Self {
            self.route(Method::$method, pattern, handler)
        }
    };
}

/// Accumulates routes in registration order, one bucket per verb.
pub struct RouterBuilder {
    routes: HashMap<Method, Vec<Route>>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    method_route!(get, GET);
    method_route!(post, POST);
    method_route!(put, PUT);
    method_route!(delete, DELETE);
    method_route!(patch, PATCH);
    method_route!(options, OPTIONS);

    /// Appends a route under the verb's bucket. Patterns are force-prefixed
    /// with `/`.
    pub fn route<H: Handler + 'static>(mut self, method: Method, pattern: &str, handler: H) -> Self {
        let pattern = if pattern.starts_with('/') {
            pattern.to_string()
        } else {
            format!("/{}", pattern.trim_start_matches('/'))
        };

        let (regex, variables) = compile_pattern(&pattern);

        self.routes
            .entry(method)
            .or_default()
            .push(Route { pattern, regex, variables, handler: Box::new(handler) });
        self
    }

    /// Lets a feature module contribute its routes, preserving the overall
    /// registration order.
    pub fn with_module<M: crate::app::Module>(self, module: &M) -> Self {
        module.register(self)
    }

    pub fn build(self) -> Router {
        Router { routes: self.routes }
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
