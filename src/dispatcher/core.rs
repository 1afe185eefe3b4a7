use crate::ids::RequestId;
use crate::middleware::Middleware;
use crate::router::{ParamVec, RouteMatch};
use crate::runtime_config::RuntimeConfig;
use http::Method;
use may::coroutine;
use may::sync::mpsc;
use serde_json::{json, Value};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path. Names are shared as
/// `Arc<str>` since they repeat across requests; values are per-request.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Request data passed to a handler coroutine.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request ID for log correlation.
    pub request_id: RequestId,
    pub method: Method,
    /// The request path as received, not the route pattern.
    pub path: String,
    /// Name of the handler that should process this request.
    pub handler_name: String,
    /// Path parameters extracted from templated segments.
    pub path_params: ParamVec,
    /// Query string parameters.
    pub query_params: ParamVec,
    /// HTTP headers (lowercase names).
    pub headers: HeaderVec,
    /// Request body parsed as JSON, when present and well-formed.
    pub body: Option<Value>,
    /// Channel for sending the response back to the dispatcher.
    pub reply_tx: mpsc::Sender<HandlerResponse>,
}

impl HandlerRequest {
    /// Get a path parameter by name (last write wins on duplicates).
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name.
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230).
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What a handler may produce. The dispatcher translates this into an
/// HTTP status, content type and body.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Structured payload serialized as `application/json`.
    Json(u16, Value),
    /// Plain-text body.
    Text(u16, String),
    /// Status line only, no body.
    Status(u16),
    /// API-style structured error list: `{"errors": [...]}` with the
    /// handler-specified status. Bypasses the central error handler.
    Errors(u16, Vec<String>),
}

/// Result type returned by every handler and controller operation.
///
/// An `Err` escalates to the central error handler, which emits a 500
/// with the error's message as a plain-text body; all known failure
/// paths are expressed as an [`Outcome`] at the point of detection.
pub type HandlerResult = anyhow::Result<Outcome>;

/// Response data sent back from a handler coroutine.
#[derive(Debug, Clone)]
pub struct HandlerResponse {
    pub status: u16,
    pub headers: HeaderVec,
    /// `None` emits just the status line. A JSON string body is written
    /// as `text/plain`, everything else as `application/json`.
    pub body: Option<Value>,
}

impl HandlerResponse {
    /// JSON body response.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body: Some(body),
        }
    }

    /// Plain-text body response.
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body: Some(Value::String(body.into())),
        }
    }

    /// Status-only response with an empty body.
    #[must_use]
    pub fn status_only(status: u16) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body: None,
        }
    }

    /// Structured error-list response.
    #[must_use]
    pub fn errors(status: u16, errors: Vec<String>) -> Self {
        Self::json(status, json!({ "errors": errors }))
    }

    /// Get a header by name.
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Translate a handler result into a wire-level response.
///
/// This is the single place where handler error values meet HTTP: an
/// `Err` becomes a 500 whose body is the error's message.
#[must_use]
pub fn into_response(result: HandlerResult) -> HandlerResponse {
    match result {
        Ok(Outcome::Json(status, value)) => HandlerResponse::json(status, value),
        Ok(Outcome::Text(status, text)) => HandlerResponse::text(status, text),
        Ok(Outcome::Status(status)) => HandlerResponse::status_only(status),
        Ok(Outcome::Errors(status, errors)) => HandlerResponse::errors(status, errors),
        Err(err) => {
            error!(error = %err, "handler returned an error value");
            HandlerResponse::text(500, err.to_string())
        }
    }
}

/// Type alias for a channel sender that feeds requests to a handler.
pub type HandlerSender = mpsc::Sender<HandlerRequest>;

/// Dispatcher that routes matched requests to handler coroutines and
/// runs the before/after middleware pipeline around each dispatch.
#[derive(Clone, Default)]
pub struct Dispatcher {
    /// Map of handler names to their channel senders.
    pub handlers: HashMap<String, HandlerSender>,
    /// Ordered list of middleware applied around every dispatch.
    pub middlewares: Vec<Arc<dyn Middleware>>,
}

impl Dispatcher {
    /// Create a new empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append middleware to the pipeline. `before` hooks run in the
    /// order added, `after` hooks likewise.
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    /// Register a handler function under the given name.
    ///
    /// Spawns a coroutine that processes requests from a channel.
    /// Handler panics are caught and converted to 500 responses.
    ///
    /// # Safety
    ///
    /// `may::coroutine::Builder::spawn` is unsafe in the `may` runtime;
    /// the caller must ensure the runtime is initialized before calling
    /// this, which in practice means during startup.
    pub unsafe fn register_handler<F>(&mut self, name: &str, handler_fn: F)
    where
        F: Fn(&HandlerRequest) -> HandlerResult + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<HandlerRequest>();
        let name = name.to_string();
        let handler_name = name.clone();
        let stack_size = RuntimeConfig::from_env().stack_size;

        let spawn_result = coroutine::Builder::new()
            .stack_size(stack_size)
            .spawn(move || {
                debug!(handler_name = %handler_name, stack_size, "handler coroutine start");
                for req in rx.iter() {
                    let reply_tx = req.reply_tx.clone();
                    let request_id = req.request_id;
                    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        into_response(handler_fn(&req))
                    }));
                    let response = match outcome {
                        Ok(resp) => resp,
                        Err(panic) => {
                            error!(
                                request_id = %request_id,
                                handler_name = %handler_name,
                                panic_message = ?panic,
                                "handler panicked"
                            );
                            HandlerResponse::text(500, format!("handler panicked: {panic:?}"))
                        }
                    };
                    let _ = reply_tx.send(response);
                }
            });

        if let Err(e) = spawn_result {
            error!(handler_name = %name, error = %e, "failed to spawn handler coroutine");
            return;
        }
        info!(handler_name = %name, "handler registered");
        self.handlers.insert(name, tx);
    }

    /// Insert a pre-spawned handler sender, replacing any existing
    /// registration of the same name. Dropping the old sender closes its
    /// channel, letting the old coroutine exit.
    pub fn add_handler(&mut self, name: &str, sender: HandlerSender) {
        if self.handlers.remove(name).is_some() {
            warn!(handler_name = %name, "replaced existing handler");
        }
        self.handlers.insert(name.to_string(), sender);
    }

    /// Dispatch a matched request to its handler.
    ///
    /// Runs every `before` hook in registration order; the first early
    /// response short-circuits the handler. The handler executes on its
    /// own coroutine and the reply is awaited on a per-request channel.
    /// Every `after` hook then runs in registration order regardless of
    /// how the response was produced.
    ///
    /// Returns `None` when no handler is registered for the matched
    /// route name.
    #[must_use]
    pub fn dispatch(
        &self,
        route_match: RouteMatch,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: HeaderVec,
        request_id: RequestId,
    ) -> Option<HandlerResponse> {
        let (reply_tx, reply_rx) = mpsc::channel();

        let tx = match self.handlers.get(&route_match.handler_name) {
            Some(tx) => tx,
            None => {
                error!(
                    handler_name = %route_match.handler_name,
                    registered = self.handlers.len(),
                    "handler not registered"
                );
                return None;
            }
        };

        let request = HandlerRequest {
            request_id,
            method,
            path: path.to_string(),
            handler_name: route_match.handler_name,
            path_params: route_match.path_params,
            query_params: route_match.query_params,
            headers,
            body,
            reply_tx,
        };

        let mut early_resp: Option<HandlerResponse> = None;
        for mw in &self.middlewares {
            if early_resp.is_none() {
                early_resp = mw.before(&request);
            } else {
                let _ = mw.before(&request);
            }
        }

        let (mut resp, latency) = if let Some(r) = early_resp {
            (r, Duration::ZERO)
        } else {
            info!(
                request_id = %request_id,
                handler_name = %request.handler_name,
                method = %request.method,
                "request dispatched to handler"
            );
            let start = Instant::now();
            if let Err(e) = tx.send(request.clone()) {
                error!(
                    request_id = %request_id,
                    handler_name = %request.handler_name,
                    error = %e,
                    "failed to send request to handler"
                );
                return None;
            }
            match reply_rx.recv() {
                Ok(response) => (response, start.elapsed()),
                Err(e) => {
                    error!(
                        request_id = %request_id,
                        handler_name = %request.handler_name,
                        error = %e,
                        "handler channel closed before replying"
                    );
                    return Some(HandlerResponse::text(
                        503,
                        format!("handler '{}' is not responding", request.handler_name),
                    ));
                }
            }
        };

        for mw in &self.middlewares {
            mw.after(&request, &mut resp, latency);
        }

        Some(resp)
    }
}
