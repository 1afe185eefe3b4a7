//! The books resource: the entity record, its in-memory store, and the
//! controller mapping REST operations onto it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::controller::ResourceController;
use crate::dispatcher::{HandlerRequest, HandlerResult, HeaderVec, Outcome};

/// Marker header attached to every response served by the books
/// controller.
pub const BOOKS_HEADER: &str = "X-Books-Controller";

/// A book record. The identifier is caller-supplied and not checked for
/// uniqueness; all fields are free-form strings and may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Author")]
    pub author: String,
    #[serde(rename = "Price")]
    pub price: String,
}

const BOOK_FIELDS: [&str; 4] = ["Id", "Title", "Author", "Price"];

/// Controller owning the transient book store.
///
/// The store is an insertion-ordered `Vec` with linear-scan lookup and
/// no secondary index. Delete operations rebuild the sequence rather
/// than mutating entities in place. Exclusive ownership lives with the
/// controller coroutine, which serializes every operation.
#[derive(Debug, Default)]
pub struct BooksController {
    books: Vec<Book>,
}

impl BooksController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceController for BooksController {
    fn before(&mut self, _req: &HandlerRequest, headers: &mut HeaderVec) -> anyhow::Result<()> {
        headers.push((Arc::from(BOOKS_HEADER), "true".to_string()));
        Ok(())
    }

    /// Create a book from a flat field map.
    ///
    /// A body that did not decode as a JSON object is a server-side
    /// decode failure (500). Missing or non-string fields produce a 400
    /// with one message per violation instead of faulting the handler.
    fn create(&mut self, req: &HandlerRequest) -> HandlerResult {
        let map = match req.body.as_ref().and_then(Value::as_object) {
            Some(map) => map,
            None => {
                return Ok(Outcome::Errors(
                    500,
                    vec!["failed to decode request body".to_string()],
                ))
            }
        };

        let mut fields = Vec::with_capacity(BOOK_FIELDS.len());
        let mut errors = Vec::new();
        for name in BOOK_FIELDS {
            match map.get(name) {
                Some(Value::String(s)) => fields.push(s.clone()),
                Some(_) => errors.push(format!("field '{name}' must be a string")),
                None => errors.push(format!("missing field '{name}'")),
            }
        }
        if !errors.is_empty() {
            return Ok(Outcome::Errors(400, errors));
        }

        let mut fields = fields.into_iter();
        let book = Book {
            id: fields.next().unwrap_or_default(),
            title: fields.next().unwrap_or_default(),
            author: fields.next().unwrap_or_default(),
            price: fields.next().unwrap_or_default(),
        };
        info!(id = %book.id, count = self.books.len() + 1, "book created");
        self.books.push(book);
        Ok(Outcome::Status(201))
    }

    /// An untouched store serializes as `[]`, never `null`.
    fn read_many(&mut self, _req: &HandlerRequest) -> HandlerResult {
        Ok(Outcome::Json(200, serde_json::to_value(&self.books)?))
    }

    fn read(&mut self, id: &str, _req: &HandlerRequest) -> HandlerResult {
        match self.books.iter().find(|b| b.id == id) {
            Some(book) => Ok(Outcome::Json(200, serde_json::to_value(book)?)),
            None => Ok(Outcome::Status(404)),
        }
    }

    fn delete_many(&mut self, _req: &HandlerRequest) -> HandlerResult {
        self.books = Vec::new();
        Ok(Outcome::Text(200, "OK".to_string()))
    }

    /// Removes every book sharing the identifier, not just the first.
    /// Deleting an absent id is not an error.
    fn delete(&mut self, id: &str, _req: &HandlerRequest) -> HandlerResult {
        self.books = std::mem::take(&mut self.books)
            .into_iter()
            .filter(|b| b.id != id)
            .collect();
        Ok(Outcome::Text(200, "OK".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::dummy_request;
    use serde_json::json;

    fn create_req(body: Value) -> HandlerRequest {
        let mut req = dummy_request("books.create");
        req.body = Some(body);
        req
    }

    fn book_body(id: &str) -> Value {
        json!({ "Id": id, "Title": "T", "Author": "A", "Price": "9.99" })
    }

    #[test]
    fn create_then_read_returns_equal_entity() {
        let mut c = BooksController::new();
        let outcome = c.create(&create_req(book_body("1"))).unwrap();
        assert!(matches!(outcome, Outcome::Status(201)));

        match c.read("1", &dummy_request("books.read")).unwrap() {
            Outcome::Json(200, value) => {
                assert_eq!(value, book_body("1"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn read_many_on_fresh_store_is_empty_array() {
        let mut c = BooksController::new();
        match c.read_many(&dummy_request("books.read_many")).unwrap() {
            Outcome::Json(200, value) => assert_eq!(value, json!([])),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn read_missing_id_is_404_status_only() {
        let mut c = BooksController::new();
        let outcome = c.read("ghost", &dummy_request("books.read")).unwrap();
        assert!(matches!(outcome, Outcome::Status(404)));
    }

    #[test]
    fn delete_many_always_leaves_empty_store() {
        let mut c = BooksController::new();
        c.create(&create_req(book_body("1"))).unwrap();
        c.create(&create_req(book_body("2"))).unwrap();
        let outcome = c.delete_many(&dummy_request("books.delete_many")).unwrap();
        assert!(matches!(outcome, Outcome::Text(200, ref s) if s == "OK"));
        match c.read_many(&dummy_request("books.read_many")).unwrap() {
            Outcome::Json(200, value) => assert_eq!(value, json!([])),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn delete_missing_id_is_ok_and_leaves_store_unchanged() {
        let mut c = BooksController::new();
        c.create(&create_req(book_body("1"))).unwrap();
        let outcome = c.delete("ghost", &dummy_request("books.delete")).unwrap();
        assert!(matches!(outcome, Outcome::Text(200, _)));
        match c.read_many(&dummy_request("books.read_many")).unwrap() {
            Outcome::Json(200, value) => assert_eq!(value.as_array().unwrap().len(), 1),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn delete_removes_all_entities_sharing_the_id() {
        let mut c = BooksController::new();
        c.create(&create_req(book_body("dup"))).unwrap();
        c.create(&create_req(book_body("keep"))).unwrap();
        c.create(&create_req(book_body("dup"))).unwrap();
        c.delete("dup", &dummy_request("books.delete")).unwrap();
        match c.read_many(&dummy_request("books.read_many")).unwrap() {
            Outcome::Json(200, value) => {
                let books = value.as_array().unwrap().clone();
                assert_eq!(books.len(), 1);
                assert_eq!(books[0]["Id"], "keep");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn create_with_missing_fields_is_a_400_error_list() {
        let mut c = BooksController::new();
        let outcome = c
            .create(&create_req(json!({ "Id": "1", "Price": 9.99 })))
            .unwrap();
        match outcome {
            Outcome::Errors(400, errors) => {
                assert_eq!(errors.len(), 3);
                assert!(errors.iter().any(|e| e.contains("Title")));
                assert!(errors.iter().any(|e| e.contains("Price")));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn create_without_decodable_body_is_a_500() {
        let mut c = BooksController::new();
        let outcome = c.create(&dummy_request("books.create")).unwrap();
        assert!(matches!(outcome, Outcome::Errors(500, _)));
    }

    #[test]
    fn before_pushes_marker_header() {
        let mut c = BooksController::new();
        let mut headers = HeaderVec::new();
        c.before(&dummy_request("books.read_many"), &mut headers)
            .unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].0.as_ref(), BOOKS_HEADER);
        assert_eq!(headers[0].1, "true");
    }
}
