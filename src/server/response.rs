use may_minihttp::Response;
use serde_json::Value;

use crate::dispatcher::HandlerResponse;

/// Conventional reason phrase for a status code.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown Status")
}

// may_minihttp headers are `&'static str`; custom per-response headers
// have to be leaked. Acceptable for the handful this service sets.
fn push_header(res: &mut Response, name: &str, value: &str) {
    let header = format!("{name}: {value}").into_boxed_str();
    res.header(Box::leak(header));
}

/// Write a translated handler response to the wire.
///
/// The body kind implies the content type: no body emits just the status
/// line, a JSON string body is written as `text/plain`, anything else is
/// serialized as `application/json`.
pub fn write_handler_response(res: &mut Response, hr: HandlerResponse) {
    res.status_code(hr.status as usize, status_reason(hr.status));
    for (name, value) in &hr.headers {
        push_header(res, name, value);
    }
    match hr.body {
        None => {}
        Some(Value::String(s)) => {
            res.header("Content-Type: text/plain");
            res.body_vec(s.into_bytes());
        }
        Some(other) => {
            res.header("Content-Type: application/json");
            let bytes = serde_json::to_vec(&other).unwrap_or_else(|_| b"null".to_vec());
            res.body_vec(bytes);
        }
    }
}

/// Write a framework-level JSON error (routing and dispatch failures
/// that never reached a handler).
pub fn write_json_error(res: &mut Response, status: u16, body: Value) {
    res.status_code(status as usize, status_reason(status));
    res.header("Content-Type: application/json");
    res.body_vec(body.to_string().into_bytes());
}
