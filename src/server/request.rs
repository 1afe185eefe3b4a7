use may_minihttp::Request;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, info};

use crate::dispatcher::HeaderVec;
use crate::router::ParamVec;

/// Parsed HTTP request data used by `AppService`.
#[derive(Debug)]
pub struct ParsedRequest {
    /// HTTP method token (GET, POST, ...).
    pub method: String,
    /// Request path with any query string stripped.
    pub path: String,
    /// HTTP headers with lowercase names.
    pub headers: HeaderVec,
    /// Decoded query string parameters.
    pub query_params: ParamVec,
    /// Request body parsed as JSON, when present and well-formed.
    pub body: Option<serde_json::Value>,
}

/// Parse query string parameters from a raw URL path.
///
/// Everything after the first `?` is percent-decoded as
/// `application/x-www-form-urlencoded` pairs.
#[must_use]
pub fn parse_query_params(raw_path: &str) -> ParamVec {
    match raw_path.find('?') {
        Some(pos) => url::form_urlencoded::parse(raw_path[pos + 1..].as_bytes())
            .map(|(k, v)| (Arc::from(k.as_ref()), v.to_string()))
            .collect(),
        None => ParamVec::new(),
    }
}

/// Extract method, path, headers, query parameters and JSON body from a
/// raw `may_minihttp` request.
#[must_use]
pub fn parse_request(req: Request) -> ParsedRequest {
    let method = req.method().to_string();
    let raw_path = req.path().to_string();
    let path = raw_path
        .split('?')
        .next()
        .unwrap_or("/")
        .to_string();

    let headers: HeaderVec = req
        .headers()
        .iter()
        .map(|h| {
            (
                Arc::from(h.name.to_ascii_lowercase().as_str()),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();

    let query_params = parse_query_params(&raw_path);
    debug!(
        header_count = headers.len(),
        query_param_count = query_params.len(),
        "headers and query params extracted"
    );

    let body = {
        let mut body_str = String::new();
        match req.body().read_to_string(&mut body_str) {
            Ok(size) if size > 0 => {
                let parsed: Result<serde_json::Value, _> = serde_json::from_str(&body_str);
                if parsed.is_err() {
                    debug!(body_size_bytes = size, "request body is not valid JSON");
                }
                parsed.ok()
            }
            _ => None,
        }
    };

    info!(method = %method, path = %path, has_body = body.is_some(), "request parsed");

    ParsedRequest {
        method,
        path,
        headers,
        query_params,
        body,
    }
}
