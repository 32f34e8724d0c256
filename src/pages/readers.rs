//! Reader roster: borrower names aggregated from the borrow records.

use crate::api::{BorrowRecord, LibraryApi};
use anyhow::Result;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderRow {
    pub name: String,
    pub total_borrows: usize,
    pub open_borrows: usize,
}

/// Aggregate the full record list into one row per borrower, sorted by
/// name.
pub fn roster(records: &[BorrowRecord]) -> Vec<ReaderRow> {
    let mut by_name: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for record in records {
        let entry = by_name.entry(record.borrower_name.as_str()).or_default();
        entry.0 += 1;
        if !record.returned {
            entry.1 += 1;
        }
    }
    by_name
        .into_iter()
        .map(|(name, (total, open))| ReaderRow {
            name: name.to_string(),
            total_borrows: total,
            open_borrows: open,
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct ReadersPage {
    rows: Vec<ReaderRow>,
}

impl ReadersPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[ReaderRow] {
        &self.rows
    }

    /// Rebuild the roster from the server. Always refetches: the roster
    /// is derived data and cheap to recompute.
    pub fn load(&mut self, api: &dyn LibraryApi) -> Result<()> {
        let records = api.list_borrow_records()?;
        self.rows = roster(&records);
        Ok(())
    }

    pub fn render(&self) {
        println!("Readers ({})", self.rows.len());
        if self.rows.is_empty() {
            println!("  No borrow records yet.");
        }
        for row in self.rows() {
            println!(
                "  {} - {} borrows, {} open",
                row.name, row.total_borrows, row.open_borrows
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::MockApi;

    fn record(id: u64, borrower: &str, returned: bool) -> BorrowRecord {
        BorrowRecord {
            id,
            book_id: id,
            book_title: format!("Book {}", id),
            borrower_name: borrower.to_string(),
            borrow_date: "2026-07-01T12:00:00+00:00".to_string(),
            returned,
        }
    }

    #[test]
    fn test_roster_groups_and_sorts_by_name() {
        let records = vec![
            record(1, "Wang", false),
            record(2, "Chen", true),
            record(3, "Wang", true),
            record(4, "Chen", false),
            record(5, "Chen", false),
        ];
        let rows = roster(&records);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Chen");
        assert_eq!(rows[0].total_borrows, 3);
        assert_eq!(rows[0].open_borrows, 2);
        assert_eq!(rows[1].name, "Wang");
        assert_eq!(rows[1].open_borrows, 1);
    }

    #[test]
    fn test_roster_of_empty_records() {
        assert!(roster(&[]).is_empty());
    }

    #[test]
    fn test_load_refetches_every_time() {
        let api = MockApi::with_records(vec![record(1, "Wang", false)]);
        let mut page = ReadersPage::new();
        page.load(&api).unwrap();
        assert_eq!(page.rows().len(), 1);

        api.records.borrow_mut().push(record(2, "Chen", false));
        page.load(&api).unwrap();
        assert_eq!(page.rows().len(), 2);
        assert_eq!(api.call_count("list_borrow_records"), 2);
    }

    #[test]
    fn test_failed_load_keeps_previous_rows() {
        let api = MockApi::with_records(vec![record(1, "Wang", false)]);
        let mut page = ReadersPage::new();
        page.load(&api).unwrap();

        api.fail.set(true);
        assert!(page.load(&api).is_err());
        assert_eq!(page.rows().len(), 1);
    }
}
