//! Book catalog page: the server-backed book list with borrow and
//! check-in actions.

use crate::api::{Book, LibraryApi};
use anyhow::Result;

/// What the server said about a borrow or check-in request. The endpoints
/// only report a success flag, so the local availability bit is flipped
/// on success and left alone otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Ok,
    Refused,
}

#[derive(Debug, Default)]
pub struct CatalogPage {
    books: Vec<Book>,
    loading: bool,
    loaded: bool,
}

impl CatalogPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn load(&mut self, api: &dyn LibraryApi) -> Result<()> {
        self.loading = true;
        let result = api.list_books();
        self.loading = false;
        self.books = result?;
        self.loaded = true;
        Ok(())
    }

    pub fn ensure_loaded(&mut self, api: &dyn LibraryApi) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        self.load(api)
    }

    pub fn borrow(&mut self, api: &dyn LibraryApi, book_id: u64) -> Result<ActionOutcome> {
        if api.borrow_book(book_id)? {
            if let Some(book) = self.books.iter_mut().find(|b| b.id == book_id) {
                book.available = false;
            }
            Ok(ActionOutcome::Ok)
        } else {
            Ok(ActionOutcome::Refused)
        }
    }

    pub fn check_in(&mut self, api: &dyn LibraryApi, book_id: u64) -> Result<ActionOutcome> {
        if api.return_book(book_id)? {
            if let Some(book) = self.books.iter_mut().find(|b| b.id == book_id) {
                book.available = true;
            }
            Ok(ActionOutcome::Ok)
        } else {
            Ok(ActionOutcome::Refused)
        }
    }

    pub fn render(&self) {
        if self.is_loading() {
            println!("Loading catalog...");
            return;
        }
        println!("Book Catalog ({} books)", self.books.len());
        if self.books.is_empty() {
            println!("  No books in the catalog.");
        }
        for book in self.books() {
            let avail = if book.available { "available" } else { "out" };
            println!(
                "  #{:<4} {} - {} [{}] ({})",
                book.id, book.title, book.author, book.category, avail
            );
        }
        println!("Commands: borrow <book-id> | checkin <book-id> | reload");
    }
}
