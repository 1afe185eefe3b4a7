//! # bookrack
//!
//! A minimal REST server for an in-memory book collection, built on the
//! `may` coroutine runtime and `may_minihttp`.
//!
//! ## Architecture
//!
//! - **[`router`]** — ordered route table (literal, templated, regex and
//!   catch-all patterns); first match in registration order wins.
//! - **[`dispatcher`]** — channel-based handler dispatch with a
//!   before/after middleware pipeline and central error translation.
//! - **[`controller`]** — resource controllers: one coroutine owns the
//!   controller and its store, serializing every operation.
//! - **[`books`]** — the book entity, its store, and the controller
//!   mapping REST verbs onto it.
//! - **[`server`]** — `may_minihttp` service glue: request parsing,
//!   response writing, server handle.
//! - **[`middleware`]** — response header stamping and request logging.
//! - **[`handlers`]** / **[`registry`]** — the concrete route table and
//!   handler wiring.
//!
//! Each handler runs in its own coroutine and receives requests over an
//! MPSC channel; handlers execute to completion without internal
//! suspension points. The route table and middleware list are built once
//! at startup and immutable afterwards.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bookrack::dispatcher::Dispatcher;
//! use bookrack::registry;
//! use bookrack::server::{AppService, HttpServer};
//!
//! let router = registry::build_router();
//! let mut dispatcher = Dispatcher::new();
//! unsafe { registry::register_all(&mut dispatcher) };
//! let service = AppService::new(Arc::new(router), Arc::new(dispatcher));
//! let handle = HttpServer(service).start("0.0.0.0:9090").unwrap();
//! handle.join().unwrap();
//! ```

pub mod books;
pub mod controller;
pub mod dispatcher;
pub mod handlers;
pub mod ids;
pub mod middleware;
pub mod registry;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use books::{Book, BooksController};
pub use controller::ResourceController;
pub use dispatcher::{Dispatcher, HandlerRequest, HandlerResponse, HandlerResult, Outcome};
pub use ids::RequestId;
pub use router::{RouteMatch, Router};
pub use server::AppService;
