//! Cursor pagination types for list endpoints.
//!
//! Lists are ordered by `created_at` descending and paged with a keyset
//! cursor: the caller passes back the `next_cursor` of the previous page
//! and receives rows strictly older than it. UUIDv7 primary keys make
//! creation timestamps unique enough in practice for this scheme.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u64 = 200;

/// Page size used when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Request parameters for cursor-paginated queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CursorPage {
    /// Number of items per page, clamped to `1..=MAX_PAGE_SIZE`.
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Exclusive upper bound on `created_at`; `None` for the first page.
    #[serde(default)]
    pub cursor: Option<DateTime<Utc>>,
}

const fn default_limit() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Default for CursorPage {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            cursor: None,
        }
    }
}

impl CursorPage {
    /// Creates a page request with the limit clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(limit: Option<u64>, cursor: Option<DateTime<Utc>>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            cursor,
        }
    }

    /// Returns the clamped limit for database queries.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }
}

/// Response wrapper for cursor-paginated data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorResponse<T> {
    /// The items in the current page, newest first.
    pub items: Vec<T>,
    /// Cursor for the next page; `None` when this page was empty.
    pub next_cursor: Option<DateTime<Utc>>,
    /// Total number of items matching the filter, across all pages.
    pub total: u64,
}

impl<T> CursorResponse<T> {
    /// Wraps a page of rows, deriving the next cursor from the oldest row.
    ///
    /// The extractor reads each row's `created_at`; following the upstream
    /// contract, a cursor is returned whenever the page is non-empty, and
    /// the final fetch simply comes back empty.
    #[must_use]
    pub fn from_rows(items: Vec<T>, total: u64, created_at: impl Fn(&T) -> DateTime<Utc>) -> Self {
        let next_cursor = items.last().map(&created_at);
        Self {
            items,
            next_cursor,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug)]
    struct Row {
        created_at: DateTime<Utc>,
    }

    fn row(secs: i64) -> Row {
        Row {
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_limit_clamped() {
        assert_eq!(CursorPage::new(None, None).limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(CursorPage::new(Some(0), None).limit(), 1);
        assert_eq!(CursorPage::new(Some(5_000), None).limit(), MAX_PAGE_SIZE);
        assert_eq!(CursorPage::new(Some(25), None).limit(), 25);
    }

    #[test]
    fn test_next_cursor_is_last_row() {
        let page = CursorResponse::from_rows(vec![row(300), row(200), row(100)], 7, |r| {
            r.created_at
        });
        assert_eq!(page.next_cursor, Some(Utc.timestamp_opt(100, 0).unwrap()));
        assert_eq!(page.total, 7);
    }

    #[test]
    fn test_empty_page_has_no_cursor() {
        let page = CursorResponse::from_rows(Vec::<Row>::new(), 0, |r| r.created_at);
        assert!(page.next_cursor.is_none());
        assert!(page.items.is_empty());
    }
}
