//! Return desk over a fixed set of sample loans. Purely in-memory: no
//! network calls, the sample set stands in for the patron's checkouts.

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;

/// A checked-out book as the return desk sees it.
#[derive(Debug, Clone)]
pub struct Loan {
    pub id: u64,
    pub title: String,
    /// Day the book is due back, as an ISO date.
    pub due_date: String,
    pub overdue: bool,
    pub return_date: Option<DateTime<Utc>>,
}

fn loan(id: u64, title: &str, due_date: &str, overdue: bool) -> Loan {
    Loan {
        id,
        title: title.to_string(),
        due_date: due_date.to_string(),
        overdue,
        return_date: None,
    }
}

static SAMPLE_LOANS: Lazy<Vec<Loan>> = Lazy::new(|| {
    vec![
        loan(1, "Python编程", "2025-07-15", false),
        loan(2, "数据结构与算法", "2025-07-20", false),
        loan(3, "三体", "2025-07-05", true),
        loan(4, "人类简史", "2025-07-30", false),
        loan(5, "Python数据分析", "2025-06-20", true),
    ]
});

#[derive(Debug, Clone)]
struct StatusMessage {
    text: String,
    expires_at: DateTime<Utc>,
}

/// Partitions the sample loans into borrowed and returned. A loan lives
/// in exactly one of the two lists at any time.
#[derive(Debug)]
pub struct ReturnDesk {
    borrowed: Vec<Loan>,
    returned: Vec<Loan>,
    message: Option<StatusMessage>,
    message_ttl: Duration,
}

impl ReturnDesk {
    pub fn new(message_ttl_secs: i64) -> Self {
        Self {
            borrowed: SAMPLE_LOANS.clone(),
            returned: Vec::new(),
            message: None,
            message_ttl: Duration::seconds(message_ttl_secs),
        }
    }

    pub fn borrowed(&self) -> &[Loan] {
        &self.borrowed
    }

    pub fn returned(&self) -> &[Loan] {
        &self.returned
    }

    /// Return a loan by id: move it to the front of the returned list,
    /// stamp the return date, and post a status message. Unknown ids are
    /// a no-op and returns false.
    pub fn return_loan(&mut self, id: u64, now: DateTime<Utc>) -> bool {
        let pos = match self.borrowed.iter().position(|l| l.id == id) {
            Some(p) => p,
            None => return false,
        };
        let mut loan = self.borrowed.remove(pos);
        loan.return_date = Some(now);

        let suffix = if loan.overdue { " (overdue)" } else { "" };
        self.message = Some(StatusMessage {
            text: format!("\"{}\" returned{}", loan.title, suffix),
            expires_at: now + self.message_ttl,
        });
        self.returned.insert(0, loan);
        true
    }

    /// The current status message, if it has not expired. Expired
    /// messages are dropped on access.
    pub fn message(&mut self, now: DateTime<Utc>) -> Option<&str> {
        let expired = self.message.as_ref().is_some_and(|m| now >= m.expires_at);
        if expired {
            self.message = None;
        }
        self.message.as_ref().map(|m| m.text.as_str())
    }

    pub fn render(&mut self, now: DateTime<Utc>) {
        if let Some(text) = self.message(now) {
            println!("* {}", text);
        }
        println!("To return ({})", self.borrowed.len());
        if self.borrowed.is_empty() {
            println!("  Nothing to return.");
        }
        for loan in self.borrowed() {
            let flag = if loan.overdue { " [overdue]" } else { "" };
            println!("  #{:<3} {} (due {}){}", loan.id, loan.title, loan.due_date, flag);
        }
        if !self.returned.is_empty() {
            println!("Returned ({})", self.returned.len());
            for loan in self.returned() {
                let when = loan
                    .return_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                println!("  #{:<3} {} (returned {})", loan.id, loan.title, when);
            }
        }
        println!("Commands: return <book-id>");
    }
}
