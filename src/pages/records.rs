//! Borrow-records page: the server-backed list, the create form, and the
//! return action.
//!
//! The server response is the source of truth after every mutation: the
//! created record is prepended as returned by the server, and a returned
//! record is replaced in place by the server's copy. On any API failure
//! the local state is left exactly as it was.

use crate::api::{BorrowRecord, BorrowRecordPatch, LibraryApi, NewBorrowRecord};
use anyhow::Result;
use chrono::Utc;

/// Draft fields of the create form. Held as raw strings; validation and
/// the numeric book-id conversion happen at submit time.
#[derive(Debug, Default, Clone)]
pub struct Draft {
    pub book_id: String,
    pub book_title: String,
    pub borrower_name: String,
}

impl Draft {
    fn is_complete(&self) -> bool {
        !self.book_id.trim().is_empty()
            && !self.book_title.trim().is_empty()
            && !self.borrower_name.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The server accepted the record; carries the assigned id.
    Created(u64),
    /// A required field was empty. No API call was made.
    MissingFields,
    /// The book id did not parse as a number. No API call was made.
    InvalidBookId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnOutcome {
    Returned,
    /// Already returned: returning is one-way and idempotent, so no API
    /// call is made.
    AlreadyReturned,
    NotFound,
}

#[derive(Debug, Default)]
pub struct RecordsPage {
    records: Vec<BorrowRecord>,
    draft: Draft,
    loading: bool,
    loaded: bool,
    limit: usize,
}

impl RecordsPage {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn records(&self) -> &[BorrowRecord] {
        &self.records
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn set_draft(&mut self, book_id: &str, book_title: &str, borrower_name: &str) {
        self.draft = Draft {
            book_id: book_id.to_string(),
            book_title: book_title.to_string(),
            borrower_name: borrower_name.to_string(),
        };
    }

    /// Fetch the record list, keeping only the first `limit` entries.
    pub fn load(&mut self, api: &dyn LibraryApi) -> Result<()> {
        self.loading = true;
        let result = api.list_borrow_records();
        self.loading = false;
        let mut records = result?;
        records.truncate(self.limit);
        self.records = records;
        self.loaded = true;
        Ok(())
    }

    /// Load on first visit only; later visits reuse the cached list.
    pub fn ensure_loaded(&mut self, api: &dyn LibraryApi) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        self.load(api)
    }

    /// Submit the draft as a new borrow record.
    ///
    /// Validation failures are outcomes, not errors: the draft and the
    /// list stay untouched. Only a created record clears the draft.
    pub fn submit(&mut self, api: &dyn LibraryApi) -> Result<SubmitOutcome> {
        if !self.draft.is_complete() {
            return Ok(SubmitOutcome::MissingFields);
        }
        let book_id = match self.draft.book_id.trim().parse::<u64>() {
            Ok(id) => id,
            Err(_) => return Ok(SubmitOutcome::InvalidBookId),
        };

        let payload = NewBorrowRecord {
            book_id,
            book_title: self.draft.book_title.trim().to_string(),
            borrower_name: self.draft.borrower_name.trim().to_string(),
            borrow_date: Utc::now().to_rfc3339(),
            returned: false,
        };
        let created = api.create_borrow_record(&payload)?;
        let id = created.id;
        self.records.insert(0, created);
        self.draft = Draft::default();
        Ok(SubmitOutcome::Created(id))
    }

    /// Mark a record returned. The `returned` flag only ever moves
    /// false to true; a record that is already returned is left alone.
    pub fn mark_returned(&mut self, api: &dyn LibraryApi, id: u64) -> Result<ReturnOutcome> {
        let record = match self.records.iter().find(|r| r.id == id) {
            Some(r) => r,
            None => return Ok(ReturnOutcome::NotFound),
        };
        if record.returned {
            return Ok(ReturnOutcome::AlreadyReturned);
        }

        let patch = BorrowRecordPatch {
            returned: Some(true),
            ..Default::default()
        };
        let updated = api.update_borrow_record(id, &patch)?;
        if let Some(slot) = self.records.iter_mut().find(|r| r.id == updated.id) {
            *slot = updated;
        }
        Ok(ReturnOutcome::Returned)
    }

    pub fn render(&self) {
        if self.is_loading() {
            println!("Loading borrow records...");
            return;
        }
        println!("Borrow Records ({} shown)", self.records.len());
        if self.records.is_empty() {
            println!("  No borrow records.");
        }
        for record in self.records() {
            let status = if record.returned {
                "returned"
            } else {
                "open"
            };
            println!(
                "  #{:<4} {} - {} (book {}, borrowed {}, {})",
                record.id,
                record.book_title,
                record.borrower_name,
                record.book_id,
                record.borrow_date,
                status
            );
        }
        // A failed create keeps the form populated.
        let draft = self.draft();
        if draft.is_complete() {
            println!(
                "  Draft: book {} \"{}\" for {}",
                draft.book_id, draft.book_title, draft.borrower_name
            );
        }
        println!("Commands: add <book-id> <title> <borrower> | return <record-id> | reload");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::MockApi;

    fn record(id: u64, returned: bool) -> BorrowRecord {
        BorrowRecord {
            id,
            book_id: id * 10,
            book_title: format!("Book {}", id),
            borrower_name: "Reader".to_string(),
            borrow_date: "2026-07-01T12:00:00+00:00".to_string(),
            returned,
        }
    }

    #[test]
    fn test_load_keeps_first_ten() {
        let api = MockApi::with_records((1..=15).map(|i| record(i, false)).collect());
        let mut page = RecordsPage::new(10);
        page.load(&api).unwrap();
        assert_eq!(page.records().len(), 10);
        assert_eq!(page.records()[0].id, 1);
        assert!(!page.is_loading());
    }

    #[test]
    fn test_ensure_loaded_fetches_once() {
        let api = MockApi::with_records(vec![record(1, false)]);
        let mut page = RecordsPage::new(10);
        page.ensure_loaded(&api).unwrap();
        page.ensure_loaded(&api).unwrap();
        assert_eq!(api.call_count("list_borrow_records"), 1);
    }

    #[test]
    fn test_valid_submit_prepends_and_clears_draft() {
        let api = MockApi::with_records(vec![record(1, false)]);
        let mut page = RecordsPage::new(10);
        page.load(&api).unwrap();

        page.set_draft("42", "Dune", "Paul");
        let outcome = page.submit(&api).unwrap();

        let created_id = match outcome {
            SubmitOutcome::Created(id) => id,
            other => panic!("expected Created, got {:?}", other),
        };
        assert_eq!(page.records().len(), 2);
        assert_eq!(page.records()[0].id, created_id);
        assert_eq!(page.records()[0].book_id, 42);
        assert!(!page.records()[0].returned);
        assert!(page.draft().book_id.is_empty());
        assert!(page.draft().book_title.is_empty());
        assert!(page.draft().borrower_name.is_empty());
    }

    #[test]
    fn test_submit_with_empty_field_changes_nothing() {
        let api = MockApi::with_records(vec![record(1, false)]);
        let mut page = RecordsPage::new(10);
        page.load(&api).unwrap();

        page.set_draft("42", "", "Paul");
        assert_eq!(page.submit(&api).unwrap(), SubmitOutcome::MissingFields);
        assert_eq!(page.records().len(), 1);
        // Draft is retained so the user can fix it.
        assert_eq!(page.draft().book_id, "42");
        assert_eq!(api.call_count("create_borrow_record"), 0);
    }

    #[test]
    fn test_submit_with_non_numeric_book_id_changes_nothing() {
        let api = MockApi::new();
        let mut page = RecordsPage::new(10);

        page.set_draft("abc", "Dune", "Paul");
        assert_eq!(page.submit(&api).unwrap(), SubmitOutcome::InvalidBookId);
        assert!(page.records().is_empty());
        assert_eq!(api.call_count("create_borrow_record"), 0);
    }

    #[test]
    fn test_failed_create_leaves_state_unchanged() {
        let api = MockApi::with_records(vec![record(1, false)]);
        let mut page = RecordsPage::new(10);
        page.load(&api).unwrap();

        page.set_draft("42", "Dune", "Paul");
        api.fail.set(true);
        assert!(page.submit(&api).is_err());
        assert_eq!(page.records().len(), 1);
        assert_eq!(page.draft().book_title, "Dune");
    }

    #[test]
    fn test_mark_returned_replaces_record_in_place() {
        let api = MockApi::with_records(vec![record(1, false), record(2, false)]);
        let mut page = RecordsPage::new(10);
        page.load(&api).unwrap();

        assert_eq!(page.mark_returned(&api, 2).unwrap(), ReturnOutcome::Returned);
        assert_eq!(page.records().len(), 2);
        assert!(!page.records()[0].returned);
        assert!(page.records()[1].returned);
        // Order is unchanged; the record was replaced, not moved.
        assert_eq!(page.records()[1].id, 2);
    }

    #[test]
    fn test_mark_returned_is_idempotent() {
        let api = MockApi::with_records(vec![record(1, false)]);
        let mut page = RecordsPage::new(10);
        page.load(&api).unwrap();

        page.mark_returned(&api, 1).unwrap();
        assert_eq!(
            page.mark_returned(&api, 1).unwrap(),
            ReturnOutcome::AlreadyReturned
        );
        assert_eq!(api.call_count("update_borrow_record"), 1);
    }

    #[test]
    fn test_mark_returned_unknown_id_makes_no_call() {
        let api = MockApi::with_records(vec![record(1, false)]);
        let mut page = RecordsPage::new(10);
        page.load(&api).unwrap();

        assert_eq!(page.mark_returned(&api, 99).unwrap(), ReturnOutcome::NotFound);
        assert_eq!(api.call_count("update_borrow_record"), 0);
    }

    #[test]
    fn test_failed_update_leaves_record_open() {
        let api = MockApi::with_records(vec![record(1, false)]);
        let mut page = RecordsPage::new(10);
        page.load(&api).unwrap();

        api.fail.set(true);
        assert!(page.mark_returned(&api, 1).is_err());
        assert!(!page.records()[0].returned);
    }
}
