//! Typed client for the library REST API.
//!
//! One method per endpoint, JSON in and out. Errors are not retried or
//! recovered here; callers decide what a failed call means for their state.

use crate::config::AuthUser;
use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A catalog book as served by `GET /books`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub category: String,
    #[serde(default)]
    pub cover_image: String,
    pub available: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRecord {
    pub id: u64,
    pub book_id: u64,
    pub book_title: String,
    pub borrower_name: String,
    /// RFC 3339 timestamp, as the backend stores it.
    pub borrow_date: String,
    pub returned: bool,
}

/// Payload for creating a borrow record. The server assigns the id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBorrowRecord {
    pub book_id: u64,
    pub book_title: String,
    pub borrower_name: String,
    pub borrow_date: String,
    pub returned: bool,
}

/// Partial update for a borrow record. Unset fields are omitted from the
/// request body so the server leaves them untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrower_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub role: Role,
}

/// Body of the borrow/return book endpoints.
#[derive(Debug, Deserialize)]
struct ActionResponse {
    success: bool,
}

/// Trait over the API surface to allow mocking in tests and swapping the
/// login implementation without touching the workflows.
pub trait LibraryApi {
    fn list_books(&self) -> Result<Vec<Book>>;
    fn borrow_book(&self, book_id: u64) -> Result<bool>;
    fn return_book(&self, book_id: u64) -> Result<bool>;
    fn list_borrow_records(&self) -> Result<Vec<BorrowRecord>>;
    fn create_borrow_record(&self, draft: &NewBorrowRecord) -> Result<BorrowRecord>;
    fn update_borrow_record(&self, id: u64, patch: &BorrowRecordPatch) -> Result<BorrowRecord>;
    fn login(&self, username: &str, password: &str) -> Result<User>;
    fn logout(&self) -> Result<()>;
}

pub struct HttpClient {
    base_url: String,
    agent: ureq::Agent,
    /// Login is resolved locally against this table; the backend has no
    /// login endpoint yet. Everything else goes over the wire.
    credentials: Vec<AuthUser>,
}

impl HttpClient {
    pub fn new(base_url: &str, timeout_ms: u64, credentials: Vec<AuthUser>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_millis(timeout_ms))
                .build(),
            credentials,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn decode<T: DeserializeOwned>(
        resp: Result<ureq::Response, ureq::Error>,
        context: &str,
    ) -> Result<T> {
        match resp {
            Ok(r) => Ok(r.into_json()?),
            Err(ureq::Error::Status(code, r)) => {
                let body = r.into_string().unwrap_or_default();
                Err(anyhow!("{}: API error {}: {}", context, code, body))
            }
            Err(e) => Err(anyhow!("{}: request failed: {}", context, e)),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        Self::decode(self.agent.get(&url).call(), path)
    }

    fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        Self::decode(self.agent.post(&url).call(), path)
    }

    fn send_json<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let url = self.url(path);
        Self::decode(self.agent.request(method, &url).send_json(body), path)
    }
}

impl LibraryApi for HttpClient {
    fn list_books(&self) -> Result<Vec<Book>> {
        self.get_json("/books")
    }

    fn borrow_book(&self, book_id: u64) -> Result<bool> {
        let resp: ActionResponse = self.post_empty(&format!("/books/{}/borrow", book_id))?;
        Ok(resp.success)
    }

    fn return_book(&self, book_id: u64) -> Result<bool> {
        let resp: ActionResponse = self.post_empty(&format!("/books/{}/return", book_id))?;
        Ok(resp.success)
    }

    fn list_borrow_records(&self) -> Result<Vec<BorrowRecord>> {
        self.get_json("/borrow-records")
    }

    fn create_borrow_record(&self, draft: &NewBorrowRecord) -> Result<BorrowRecord> {
        self.send_json("POST", "/borrow-records", serde_json::to_value(draft)?)
    }

    fn update_borrow_record(&self, id: u64, patch: &BorrowRecordPatch) -> Result<BorrowRecord> {
        self.send_json(
            "PATCH",
            &format!("/borrow-records/{}", id),
            serde_json::to_value(patch)?,
        )
    }

    fn login(&self, username: &str, password: &str) -> Result<User> {
        let user = self
            .credentials
            .iter()
            .find(|u| u.username == username && u.password == password)
            .ok_or_else(|| anyhow!("invalid username or password"))?;
        Ok(User {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        })
    }

    fn logout(&self) -> Result<()> {
        let url = self.url("/auth/logout");
        match self.agent.post(&url).call() {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(code, r)) => {
                let body = r.into_string().unwrap_or_default();
                Err(anyhow!("/auth/logout: API error {}: {}", code, body))
            }
            Err(e) => Err(anyhow!("/auth/logout: request failed: {}", e)),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A recording in-memory `LibraryApi` used by the page tests.

    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    pub struct MockApi {
        pub books: RefCell<Vec<Book>>,
        pub records: RefCell<Vec<BorrowRecord>>,
        pub users: Vec<AuthUser>,
        /// Operation names, in call order.
        pub calls: RefCell<Vec<String>>,
        /// When set, every operation fails.
        pub fail: Cell<bool>,
        next_id: Cell<u64>,
    }

    impl MockApi {
        pub fn new() -> Self {
            Self {
                next_id: Cell::new(100),
                ..Self::default()
            }
        }

        pub fn with_records(records: Vec<BorrowRecord>) -> Self {
            let api = Self::new();
            *api.records.borrow_mut() = records;
            api
        }

        pub fn call_count(&self, op: &str) -> usize {
            self.calls.borrow().iter().filter(|c| *c == op).count()
        }

        fn record_call(&self, op: &str) -> Result<()> {
            self.calls.borrow_mut().push(op.to_string());
            if self.fail.get() {
                Err(anyhow!("{}: request failed: connection refused", op))
            } else {
                Ok(())
            }
        }
    }

    impl LibraryApi for MockApi {
        fn list_books(&self) -> Result<Vec<Book>> {
            self.record_call("list_books")?;
            Ok(self.books.borrow().clone())
        }

        fn borrow_book(&self, book_id: u64) -> Result<bool> {
            self.record_call("borrow_book")?;
            let mut books = self.books.borrow_mut();
            match books.iter_mut().find(|b| b.id == book_id && b.available) {
                Some(book) => {
                    book.available = false;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        fn return_book(&self, book_id: u64) -> Result<bool> {
            self.record_call("return_book")?;
            let mut books = self.books.borrow_mut();
            match books.iter_mut().find(|b| b.id == book_id && !b.available) {
                Some(book) => {
                    book.available = true;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        fn list_borrow_records(&self) -> Result<Vec<BorrowRecord>> {
            self.record_call("list_borrow_records")?;
            Ok(self.records.borrow().clone())
        }

        fn create_borrow_record(&self, draft: &NewBorrowRecord) -> Result<BorrowRecord> {
            self.record_call("create_borrow_record")?;
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            let record = BorrowRecord {
                id,
                book_id: draft.book_id,
                book_title: draft.book_title.clone(),
                borrower_name: draft.borrower_name.clone(),
                borrow_date: draft.borrow_date.clone(),
                returned: draft.returned,
            };
            self.records.borrow_mut().push(record.clone());
            Ok(record)
        }

        fn update_borrow_record(&self, id: u64, patch: &BorrowRecordPatch) -> Result<BorrowRecord> {
            self.record_call("update_borrow_record")?;
            let mut records = self.records.borrow_mut();
            let record = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| anyhow!("no record {}", id))?;
            if let Some(returned) = patch.returned {
                record.returned = returned;
            }
            if let Some(name) = &patch.borrower_name {
                record.borrower_name = name.clone();
            }
            Ok(record.clone())
        }

        fn login(&self, username: &str, password: &str) -> Result<User> {
            self.record_call("login")?;
            let user = self
                .users
                .iter()
                .find(|u| u.username == username && u.password == password)
                .ok_or_else(|| anyhow!("invalid username or password"))?;
            Ok(User {
                id: user.id,
                username: user.username.clone(),
                role: user.role,
            })
        }

        fn logout(&self) -> Result<()> {
            self.record_call("logout")
        }
    }
}
