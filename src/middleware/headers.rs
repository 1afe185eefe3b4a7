use std::time::Duration;

use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Stamps a fixed header onto every response that passes through the
/// dispatcher, including catch-all and error responses.
pub struct CustomHeaderMiddleware {
    name: String,
    value: String,
}

impl CustomHeaderMiddleware {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Middleware for CustomHeaderMiddleware {
    fn after(&self, _req: &HandlerRequest, res: &mut HandlerResponse, _latency: Duration) {
        res.set_header(&self.name, self.value.clone());
    }
}
