mod core;
mod headers;
mod tracing;

pub use self::core::Middleware;
pub use self::headers::CustomHeaderMiddleware;
pub use self::tracing::TracingMiddleware;
