//! # Router Module
//!
//! Path matching and route resolution. The router holds an ordered table
//! of `(method, pattern, handler name)` entries built once at startup by
//! [`RouterBuilder`]; incoming requests are scanned against the table in
//! registration order and the first match wins.
//!
//! Three pattern kinds are supported: literal paths, templated paths
//! whose `{name}` segments are compiled to regexes with one capture per
//! parameter, and raw regexes for matchers templates cannot express. An
//! optional catch-all entry soaks up everything that falls through.
//!
//! ```rust,ignore
//! use http::Method;
//! use bookrack::router::Router;
//!
//! let router = Router::builder()
//!     .route(Method::GET, "/status-code/{code}", "status_code")
//!     .resource("/books", "books")
//!     .catch_all("not_found")
//!     .build();
//!
//! let m = router.route(&Method::GET, "/books/42").unwrap();
//! assert_eq!(m.handler_name, "books.read");
//! assert_eq!(m.get_path_param("id"), Some("42"));
//! ```

mod core;

pub use self::core::{
    ParamVec, PathPattern, RouteMatch, RouteMeta, Router, RouterBuilder, MAX_INLINE_PARAMS,
};
