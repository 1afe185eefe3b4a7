//! Route table construction and handler registration, kept together so
//! the mapping from pattern to handler is visible in one place.

use http::Method;

use crate::books::BooksController;
use crate::dispatcher::Dispatcher;
use crate::handlers;
use crate::router::Router;

/// Build the route table. Registration order is match-priority order:
/// the all-digits regex must precede the final catch-all.
#[must_use]
pub fn build_router() -> Router {
    Router::builder()
        .route(Method::GET, "/", "home")
        .route(Method::GET, "/status-code/{code}", "status_code")
        .route(Method::GET, "/errortest", "error_test")
        .resource("/books", "books")
        .regex(Method::GET, r"^/[0-9]+$", "just_a_number")
        .catch_all("not_found")
        .build()
}

/// Spawn and register every handler coroutine.
///
/// # Safety
///
/// Spawns `may` coroutines; call once during startup after the runtime
/// stack size is configured.
pub unsafe fn register_all(dispatcher: &mut Dispatcher) {
    dispatcher.register_handler("home", handlers::home);
    dispatcher.register_handler("status_code", handlers::status_code);
    dispatcher.register_handler("error_test", handlers::error_test);
    dispatcher.register_handler("just_a_number", handlers::just_a_number);
    dispatcher.register_handler("not_found", handlers::not_found);
    dispatcher.register_controller("books", BooksController::new());
}
