//! # Dispatcher Module
//!
//! Coroutine-based request handler dispatch. Each registered handler
//! runs in its own `may` coroutine and receives requests over an MPSC
//! channel; responses travel back on a per-request reply channel. The
//! dispatcher also owns the middleware pipeline: every dispatch runs all
//! `before` hooks in registration order (the first early response skips
//! the handler), then the handler, then all `after` hooks regardless of
//! outcome.
//!
//! Handlers return [`HandlerResult`] — a structured payload, a
//! status-only outcome, an API-style error list, or an error value. The
//! translation of those outcomes into wire responses lives in
//! [`into_response`], the crate's central error handler: unrecognized
//! error values become a 500 carrying the error's message.

mod core;

pub use self::core::{
    into_response, Dispatcher, HandlerRequest, HandlerResponse, HandlerResult, HandlerSender,
    HeaderVec, Outcome, MAX_INLINE_HEADERS,
};
