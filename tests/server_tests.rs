//! End-to-end tests against a live server on an ephemeral port.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use bookrack::dispatcher::Dispatcher;
use bookrack::middleware::{CustomHeaderMiddleware, TracingMiddleware};
use bookrack::registry;
use bookrack::server::{AppService, HttpServer, ServerHandle};
use serde_json::{json, Value};

struct TestServer {
    addr: SocketAddr,
    handle: Option<ServerHandle>,
}

impl TestServer {
    fn start() -> Self {
        common::setup_may_runtime();

        let router = registry::build_router();
        let mut dispatcher = Dispatcher::new();
        // SAFETY: coroutine spawning after the may runtime is configured.
        unsafe {
            registry::register_all(&mut dispatcher);
        }
        dispatcher.add_middleware(Arc::new(CustomHeaderMiddleware::new(
            "X-Custom-Header",
            "bookrack",
        )));
        dispatcher.add_middleware(Arc::new(TracingMiddleware));

        let service = AppService::new(Arc::new(router), Arc::new(dispatcher));
        let addr = common::free_local_addr();
        let handle = HttpServer(service).start(addr).expect("start server");
        handle.wait_ready().expect("server ready");
        Self {
            addr,
            handle: Some(handle),
        }
    }

    fn get(&self, path: &str) -> common::HttpResponse {
        common::send_request(self.addr, "GET", path, None)
    }

    fn post(&self, path: &str, body: &str) -> common::HttpResponse {
        common::send_request(self.addr, "POST", path, Some(body))
    }

    fn delete(&self, path: &str) -> common::HttpResponse {
        common::send_request(self.addr, "DELETE", path, None)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

#[test]
fn home_serves_welcome_text() {
    let server = TestServer::start();
    let resp = server.get("/");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("content-type"), Some("text/plain"));
    assert!(resp.body.starts_with("Welcome to the bookrack example app"));
}

#[test]
fn status_code_route_echoes_reason_phrase() {
    let server = TestServer::start();

    let resp = server.get("/status-code/200");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, "OK");

    let resp = server.get("/status-code/418");
    assert_eq!(resp.status, 418);

    let resp = server.get("/status-code/abc");
    assert_eq!(resp.status, 500);
    assert_eq!(
        resp.body,
        "Failed to convert 'code' into a real status code number."
    );
}

#[test]
fn errortest_route_hits_central_error_handler() {
    let server = TestServer::start();
    let resp = server.get("/errortest");
    assert_eq!(resp.status, 500);
    assert_eq!(resp.body, "This is a test error!");
}

#[test]
fn all_digit_paths_get_the_number_payload() {
    let server = TestServer::start();
    for path in ["/1", "/12345", "/0"] {
        let resp = server.get(path);
        assert_eq!(resp.status, 200, "{path}");
        let parsed: Value = serde_json::from_str(&resp.body).expect("json body");
        assert_eq!(parsed, json!({ "data": "Just a number!" }));
    }
}

#[test]
fn unmatched_paths_fall_through_to_404() {
    let server = TestServer::start();
    for (method, path) in [("GET", "/nope"), ("GET", "/12abc"), ("PUT", "/books")] {
        let resp = common::send_request(server.addr, method, path, None);
        assert_eq!(resp.status, 404, "{method} {path}");
        let parsed: Value = serde_json::from_str(&resp.body).expect("json body");
        assert_eq!(parsed, json!({ "errors": ["File not found"] }));
    }
}

#[test]
fn books_crud_scenario() {
    let server = TestServer::start();

    let resp = server.get("/books");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, "[]");
    assert_eq!(resp.header("x-books-controller"), Some("true"));

    let book = r#"{"Id":"1","Title":"T","Author":"A","Price":"9.99"}"#;
    let resp = server.post("/books", book);
    assert_eq!(resp.status, 201);
    assert_eq!(resp.body, "");

    let resp = server.get("/books/1");
    assert_eq!(resp.status, 200);
    let parsed: Value = serde_json::from_str(&resp.body).expect("json body");
    assert_eq!(
        parsed,
        json!({ "Id": "1", "Title": "T", "Author": "A", "Price": "9.99" })
    );

    let resp = server.get("/books");
    let parsed: Value = serde_json::from_str(&resp.body).expect("json body");
    assert_eq!(parsed.as_array().map(Vec::len), Some(1));

    let resp = server.delete("/books/1");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, "OK");

    let resp = server.get("/books/1");
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body, "");
}

#[test]
fn delete_many_empties_the_collection() {
    let server = TestServer::start();
    server.post("/books", r#"{"Id":"1","Title":"T","Author":"A","Price":"1"}"#);
    server.post("/books", r#"{"Id":"2","Title":"U","Author":"B","Price":"2"}"#);

    let resp = server.delete("/books");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, "OK");

    let resp = server.get("/books");
    assert_eq!(resp.body, "[]");
}

#[test]
fn create_rejects_unreadable_and_incomplete_bodies() {
    let server = TestServer::start();

    // Not valid JSON at all.
    let resp = server.post("/books", "not json");
    assert_eq!(resp.status, 500);
    let parsed: Value = serde_json::from_str(&resp.body).expect("json body");
    assert_eq!(parsed["errors"][0], "failed to decode request body");

    // Valid JSON, wrong shape.
    let resp = server.post("/books", r#"{"Id":"1"}"#);
    assert_eq!(resp.status, 400);
    let parsed: Value = serde_json::from_str(&resp.body).expect("json body");
    assert_eq!(parsed["errors"].as_array().map(Vec::len), Some(3));

    // Nothing was stored.
    let resp = server.get("/books");
    assert_eq!(resp.body, "[]");
}

#[test]
fn custom_header_is_stamped_on_every_response() {
    let server = TestServer::start();
    for path in ["/", "/errortest", "/books", "/nowhere"] {
        let resp = server.get(path);
        assert_eq!(resp.header("x-custom-header"), Some("bookrack"), "{path}");
    }
}

#[test]
fn books_responses_carry_the_controller_marker() {
    let server = TestServer::start();
    let resp = server.get("/books");
    assert_eq!(resp.header("x-books-controller"), Some("true"));
    let resp = server.get("/");
    assert_eq!(resp.header("x-books-controller"), None);
}

#[test]
fn responses_carry_a_request_id() {
    let server = TestServer::start();
    let resp = server.get("/");
    let id = resp.header("x-request-id").expect("request id header");
    assert!(!id.is_empty());
}
