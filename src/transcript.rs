use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only JSONL audit log of one client session: page visits, guard
/// denials, API failures, and record mutations.
pub struct Transcript {
    pub path: PathBuf,
    session_id: String,
    file: File,
}

#[derive(Serialize)]
struct Event<'a> {
    ts: DateTime<Utc>,
    session_id: &'a str,
    #[serde(rename = "type")]
    event_type: &'a str,
    #[serde(flatten)]
    data: serde_json::Value,
}

impl Transcript {
    pub fn new(path: &Path, session_id: &str) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            session_id: session_id.to_string(),
            file,
        })
    }

    pub fn log(&mut self, event_type: &str, data: serde_json::Value) -> Result<()> {
        let event = Event {
            ts: Utc::now(),
            session_id: &self.session_id,
            event_type,
            data,
        };
        let line = serde_json::to_string(&event)?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }

    pub fn session_start(&mut self, base_url: &str) -> Result<()> {
        self.log("session_start", serde_json::json!({ "base_url": base_url }))
    }

    pub fn page_visit(&mut self, path: &str) -> Result<()> {
        self.log("page_visit", serde_json::json!({ "path": path }))
    }

    pub fn guard_denied(&mut self, path: &str) -> Result<()> {
        self.log("guard_denied", serde_json::json!({ "path": path }))
    }

    pub fn login_ok(&mut self, username: &str, role: &str) -> Result<()> {
        self.log(
            "login",
            serde_json::json!({ "username": username, "role": role }),
        )
    }

    pub fn login_failed(&mut self, username: &str) -> Result<()> {
        self.log("login_failed", serde_json::json!({ "username": username }))
    }

    pub fn logout(&mut self, username: &str) -> Result<()> {
        self.log("logout", serde_json::json!({ "username": username }))
    }

    pub fn api_error(&mut self, operation: &str, error: &str) -> Result<()> {
        self.log(
            "api_error",
            serde_json::json!({ "operation": operation, "error": error }),
        )
    }

    pub fn record_created(&mut self, id: u64, book_id: u64, borrower: &str) -> Result<()> {
        self.log(
            "record_created",
            serde_json::json!({ "id": id, "book_id": book_id, "borrower": borrower }),
        )
    }

    pub fn record_returned(&mut self, id: u64) -> Result<()> {
        self.log("record_returned", serde_json::json!({ "id": id }))
    }

    pub fn book_borrowed(&mut self, book_id: u64, success: bool) -> Result<()> {
        self.log(
            "book_borrowed",
            serde_json::json!({ "book_id": book_id, "success": success }),
        )
    }

    pub fn book_checked_in(&mut self, book_id: u64, success: bool) -> Result<()> {
        self.log(
            "book_checked_in",
            serde_json::json!({ "book_id": book_id, "success": success }),
        )
    }

    pub fn loan_returned(&mut self, book_id: u64, overdue: bool) -> Result<()> {
        self.log(
            "loan_returned",
            serde_json::json!({ "book_id": book_id, "overdue": overdue }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_are_one_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        let mut transcript = Transcript::new(&path, "s-1").unwrap();

        transcript
            .session_start("http://localhost:3000/api")
            .unwrap();
        transcript.page_visit("records").unwrap();
        transcript.guard_denied("catalog").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["type"], "session_start");
        assert_eq!(first["session_id"], "s-1");
        assert_eq!(first["base_url"], "http://localhost:3000/api");

        let last: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(last["type"], "guard_denied");
        assert_eq!(last["path"], "catalog");
    }
}
