use std::io::Write;

use http::{Method, StatusCode};
use routage::{Application, DispatchError, HttpError, PathParam, Request, Response, Router, handler_fn};
use serde_json::json;

fn list_zones(_request: &Request, _params: &[PathParam]) -> Result<serde_json::Value, DispatchError> {
    Ok(json!({"zones": [{"id": 1, "name": "Littoral"}, {"id": 2, "name": "Montagne"}]}))
}

fn zone_detail(request: &Request, params: &[PathParam]) -> Result<serde_json::Value, DispatchError> {
    let Some(id) = params[0].as_int() else {
        return Err(HttpError::bad_request().with_message("zone id must be numeric").into());
    };

    let year = request.query_first("year").unwrap_or("2024");
    Ok(json!({"id": id, "year": year}))
}

fn delete_zone(_request: &Request, params: &[PathParam]) -> Result<bool, DispatchError> {
    // pretend only zone 1 exists
    Ok(params[0] == PathParam::Int(1))
}

fn version(_request: &Request, _params: &[PathParam]) -> Result<&'static str, DispatchError> {
    Ok("routage 0.1.0")
}

fn main() {
    tracing_subscriber::fmt().init();

    let router = Router::builder()
        .get("/zones", handler_fn(list_zones))
        .get("/zones/{id}", handler_fn(zone_detail))
        .delete("/zones/{id}", handler_fn(delete_zone))
        .get("/version", handler_fn(version))
        .build();
    let app = Application::new(router);

    let requests = [
        Request::builder().method(Method::GET).path("/api/v1/zones").base_path("/api/v1").build(),
        Request::builder().method(Method::GET).path("/zones/2").query_string("year=2023").build(),
        Request::builder().method(Method::DELETE).path("/zones/9").build(),
        Request::builder().method(Method::HEAD).path("/version").build(),
        Request::builder().method(Method::GET).path("/nowhere").build(),
    ];

    let mut stdout = std::io::stdout();
    for request in &requests {
        let response: Response = app.handle(request);
        assert_eq!(response.header("X-Content-Type-Options"), Some("nosniff"));
        assert!(response.status() != StatusCode::INTERNAL_SERVER_ERROR);

        let mut headers_flushed = false;
        response.write_to(&mut stdout, &mut headers_flushed).unwrap();
        stdout.write_all(b"\n\n").unwrap();
    }
}
