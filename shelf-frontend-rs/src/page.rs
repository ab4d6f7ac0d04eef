//! Transient state of the book list page. None of it is ever sent to the server, and all of it is gone when the page is dropped.

use bookstream::data_model::{Book, BookId};
use chrono::{DateTime, Utc};

/// A value that stops being shown once its deadline passes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expiring<T> {
    value: T,
    expires_at: DateTime<Utc>,
}

impl<T> Expiring<T> {
    pub fn new(value: T, now: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        Self {
            value,
            expires_at: now + ttl,
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    fn live_value(&self, now: DateTime<Utc>) -> Option<&T> {
        self.is_live(now).then_some(&self.value)
    }
}

/// The row being edited in place, seeded from the row when editing starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditBuffer {
    pub id: BookId,
    pub title: String,
    pub author: String,
}

impl EditBuffer {
    pub fn from_book(book: &Book) -> Self {
        Self {
            id: book.id.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookListPage {
    pub title_input: String,
    pub author_input: String,
    pub search: String,
    /// 1-based.
    pub page: usize,
    pub editing: Option<EditBuffer>,
    /// Staged for the confirmation dialog. Nothing is sent until it is confirmed.
    pub pending_delete: Option<Book>,
    pub highlight: Option<Expiring<BookId>>,
    /// One slot. A new message replaces the old one and restarts its timer.
    pub banner: Option<Expiring<String>>,
    /// Set when the bulk fetch failed; cleared by the next successful one.
    pub load_error: Option<String>,
}

impl Default for BookListPage {
    fn default() -> Self {
        Self {
            title_input: String::new(),
            author_input: String::new(),
            search: String::new(),
            page: 1,
            editing: None,
            pending_delete: None,
            highlight: None,
            banner: None,
            load_error: None,
        }
    }
}

impl BookListPage {
    /// Any change to the query sends the user back to the first page.
    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
        self.page = 1;
    }

    pub fn show_banner(&mut self, message: impl Into<String>, now: DateTime<Utc>, ttl: chrono::Duration) {
        self.banner = Some(Expiring::new(message.into(), now, ttl));
    }

    pub fn highlight(&mut self, id: BookId, now: DateTime<Utc>, ttl: chrono::Duration) {
        self.highlight = Some(Expiring::new(id, now, ttl));
    }

    pub fn banner_at(&self, now: DateTime<Utc>) -> Option<&str> {
        self.banner
            .as_ref()
            .and_then(|b| b.live_value(now))
            .map(String::as_str)
    }

    pub fn highlighted_at(&self, now: DateTime<Utc>) -> Option<&BookId> {
        self.highlight.as_ref().and_then(|h| h.live_value(now))
    }

    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        self.banner.as_ref().is_some_and(|b| !b.is_live(now))
            || self.highlight.as_ref().is_some_and(|h| !h.is_live(now))
    }

    /// Drops whatever has run out. Returns true if anything was dropped.
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        let mut changed = false;
        if self.banner.as_ref().is_some_and(|b| !b.is_live(now)) {
            self.banner = None;
            changed = true;
        }
        if self.highlight.as_ref().is_some_and(|h| !h.is_live(now)) {
            self.highlight = None;
            changed = true;
        }
        changed
    }

    /// The earliest deadline still pending, for scheduling the next expiry pass.
    pub fn next_expiry(&self) -> Option<DateTime<Utc>> {
        let banner = self.banner.as_ref().map(Expiring::expires_at);
        let highlight = self.highlight.as_ref().map(Expiring::expires_at);
        match (banner, highlight) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn is_editing(&self, id: &BookId) -> bool {
        self.editing.as_ref().is_some_and(|e| &e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_search_resets_page() {
        let mut page = BookListPage {
            page: 3,
            ..Default::default()
        };
        page.set_search("dune");
        assert_eq!(page.page, 1);
        assert_eq!(page.search, "dune");
    }

    #[test]
    fn test_banner_expires_after_ttl() {
        let mut page = BookListPage::default();
        page.show_banner("author required", t0(), Duration::seconds(5));

        assert_eq!(page.banner_at(t0() + Duration::seconds(4)), Some("author required"));
        assert_eq!(page.banner_at(t0() + Duration::seconds(5)), None);
        assert_eq!(page.next_expiry(), Some(t0() + Duration::seconds(5)));

        assert!(!page.expire(t0() + Duration::seconds(4)));
        assert!(page.expire(t0() + Duration::seconds(5)));
        assert!(page.banner.is_none());
        assert_eq!(page.next_expiry(), None);
    }

    #[test]
    fn test_new_banner_overwrites_and_restarts() {
        let mut page = BookListPage::default();
        page.show_banner("first", t0(), Duration::seconds(5));
        page.show_banner("second", t0() + Duration::seconds(3), Duration::seconds(5));
        assert_eq!(page.banner_at(t0() + Duration::seconds(6)), Some("second"));
    }

    #[test]
    fn test_next_expiry_is_earliest() {
        let mut page = BookListPage::default();
        page.highlight(BookId::from("1"), t0(), Duration::seconds(5));
        page.show_banner("x", t0() + Duration::seconds(2), Duration::seconds(5));
        assert_eq!(page.next_expiry(), Some(t0() + Duration::seconds(5)));

        assert!(page.expire(t0() + Duration::seconds(5)));
        assert!(page.highlight.is_none());
        assert!(page.banner.is_some());
    }
}
