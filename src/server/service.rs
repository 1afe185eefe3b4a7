use super::request::{parse_request, ParsedRequest};
use super::response::{write_handler_response, write_json_error};
use crate::dispatcher::Dispatcher;
use crate::ids::RequestId;
use crate::router::Router;
use http::Method;
use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use std::io;
use std::sync::Arc;

/// The HTTP service: routes each parsed request and hands it to the
/// dispatcher.
///
/// Router and dispatcher are built once at startup and shared immutably
/// across connection coroutines; all mutable state lives behind the
/// controller channels inside the dispatcher.
#[derive(Clone)]
pub struct AppService {
    pub router: Arc<Router>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppService {
    #[must_use]
    pub fn new(router: Arc<Router>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { router, dispatcher }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let ParsedRequest {
            method,
            path,
            headers,
            query_params,
            body,
        } = parse_request(req);

        let method = match method.parse::<Method>() {
            Ok(m) => m,
            Err(_) => {
                write_json_error(res, 400, json!({ "error": "unsupported method" }));
                return Ok(());
            }
        };

        let request_id = RequestId::from_header_or_new(
            headers
                .iter()
                .find(|(k, _)| k.as_ref() == "x-request-id")
                .map(|(_, v)| v.as_str()),
        );

        match self.router.route(&method, &path) {
            Some(mut route_match) => {
                route_match.query_params = query_params;
                let handler_response = self.dispatcher.dispatch(
                    route_match,
                    method,
                    &path,
                    body,
                    headers,
                    request_id,
                );
                match handler_response {
                    Some(mut hr) => {
                        hr.set_header("X-Request-Id", request_id.to_string());
                        write_handler_response(res, hr);
                    }
                    None => {
                        write_json_error(
                            res,
                            500,
                            json!({ "error": "handler not registered", "path": path }),
                        );
                    }
                }
            }
            None => {
                // Only reachable when no catch-all route is registered.
                write_json_error(
                    res,
                    404,
                    json!({ "error": "Not Found", "method": method.as_str(), "path": path }),
                );
            }
        }
        Ok(())
    }
}
