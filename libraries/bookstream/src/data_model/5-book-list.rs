//! # BookList
//! The list view: our local copy of the catalog, in arrival order with new arrivals at the front.
//!
//! Every operation here is order tolerant. A fetch replaces everything, and a delete removes every row with the id,
//! so a mutation's own re-fetch and the matching notification can land in either order.

use crate::data_model::{Book, BookId};

/// What to do when an "added" notification names an id that is already in the list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(target_arch = "wasm32", derive(tsify::Tsify))]
#[cfg_attr(target_arch = "wasm32", tsify(from_wasm_abi, into_wasm_abi))]
#[serde(rename_all = "camelCase")]
pub enum DuplicatePolicy {
    /// Prepend anyway. The id shows up twice until the next fetch.
    #[default]
    Keep,
    /// Drop the older rows with that id, then prepend.
    Replace,
}

#[derive(Clone, Debug, Default)]
pub struct BookList {
    books: im::Vector<Book>,
}

impl BookList {
    pub fn replace(&mut self, books: impl IntoIterator<Item = Book>) {
        self.books = books.into_iter().collect();
    }

    pub fn prepend(&mut self, book: Book, policy: DuplicatePolicy) {
        if policy == DuplicatePolicy::Replace {
            self.remove(&book.id);
        }
        self.books.push_front(book);
    }

    /// Removes every row with this id. Returns how many were removed.
    pub fn remove(&mut self, id: &BookId) -> usize {
        let before = self.books.len();
        self.books.retain(|b| &b.id != id);
        before - self.books.len()
    }

    pub fn get(&self, id: &BookId) -> Option<&Book> {
        self.books.iter().find(|b| &b.id == id)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Book> {
        self.books.iter()
    }
}
