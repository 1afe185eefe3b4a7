//! Free-function handlers for everything outside the books resource.

use anyhow::anyhow;
use serde_json::json;

use crate::dispatcher::{HandlerRequest, HandlerResult, Outcome};
use crate::server::status_reason;

/// Body served on `GET /`.
pub const WELCOME: &str =
    "Welcome to the bookrack example app - see the terminal for instructions.";

/// `GET /` — fixed welcome text.
pub fn home(_req: &HandlerRequest) -> HandlerResult {
    Ok(Outcome::Text(200, WELCOME.to_string()))
}

/// `GET /status-code/{code}` — respond with the given status and its
/// conventional reason phrase; a non-integer code is a local 500.
pub fn status_code(req: &HandlerRequest) -> HandlerResult {
    match req.get_path_param("code").unwrap_or_default().parse::<u16>() {
        Ok(code) => Ok(Outcome::Text(code, status_reason(code).to_string())),
        Err(_) => Ok(Outcome::Text(
            500,
            "Failed to convert 'code' into a real status code number.".to_string(),
        )),
    }
}

/// `GET /errortest` — always returns an error value, proving the
/// central error handler fires.
pub fn error_test(_req: &HandlerRequest) -> HandlerResult {
    Err(anyhow!("This is a test error!"))
}

/// All-digit paths — fixed payload regardless of the matched digits.
pub fn just_a_number(_req: &HandlerRequest) -> HandlerResult {
    Ok(Outcome::Json(200, json!({ "data": "Just a number!" })))
}

/// Catch-all — structured 404 error list.
pub fn not_found(_req: &HandlerRequest) -> HandlerResult {
    Ok(Outcome::Errors(404, vec!["File not found".to_string()]))
}
