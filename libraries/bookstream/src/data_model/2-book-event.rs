//! # BookEvent
//! A book event records that we observed a notification from the server. Events are created locally on arrival, are never modified, and live for the whole session.
//! The `time` is when *we* saw the notification, not when the server produced it, so two clients can disagree on the order.

use crate::data_model::Book;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(target_arch = "wasm32", derive(tsify::Tsify))]
#[cfg_attr(target_arch = "wasm32", tsify(from_wasm_abi, into_wasm_abi))]
#[serde(rename_all = "camelCase")]
pub enum BookEventKind {
    Added,
    Deleted,
}

impl BookEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookEventKind::Added => "added",
            BookEventKind::Deleted => "deleted",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(target_arch = "wasm32", derive(tsify::Tsify))]
#[cfg_attr(target_arch = "wasm32", tsify(from_wasm_abi, into_wasm_abi))]
#[serde(rename_all = "camelCase")]
pub struct BookEvent {
    #[serde(rename = "type")]
    pub kind: BookEventKind,
    pub book: Book,
    pub time: chrono::DateTime<chrono::Utc>,
}

/// A payload delivered by one of the two subscriptions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    Added(Book),
    Deleted(Book),
}

impl Notification {
    pub fn kind(&self) -> BookEventKind {
        match self {
            Notification::Added(_) => BookEventKind::Added,
            Notification::Deleted(_) => BookEventKind::Deleted,
        }
    }

    pub fn book(&self) -> &Book {
        match self {
            Notification::Added(book) | Notification::Deleted(book) => book,
        }
    }

    pub fn into_event(self, time: chrono::DateTime<chrono::Utc>) -> BookEvent {
        let kind = self.kind();
        let book = match self {
            Notification::Added(book) | Notification::Deleted(book) => book,
        };
        BookEvent { kind, book, time }
    }
}
