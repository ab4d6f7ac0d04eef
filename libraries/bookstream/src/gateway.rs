//! # Gateway
//! The remote side of the catalog: one bulk query and three mutations. Subscriptions are not part of this trait;
//! they arrive on their own channel and are fed to the store as [`Notification`]s.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;

use crate::GatewayError;
use crate::data_model::{Book, BookId, Notification};

pub trait Gateway {
    fn books(&self) -> impl Future<Output = Result<Vec<Book>, GatewayError>>;

    fn add_book(
        &self,
        title: &str,
        author: &str,
    ) -> impl Future<Output = Result<Book, GatewayError>>;

    /// `None` leaves the field unchanged on the server.
    fn update_book(
        &self,
        id: &BookId,
        title: Option<&str>,
        author: Option<&str>,
    ) -> impl Future<Output = Result<Book, GatewayError>>;

    /// Resolves to whatever the server answered; `false` usually means the id was already gone.
    fn delete_book(&self, id: &BookId) -> impl Future<Output = Result<bool, GatewayError>>;
}

impl<G: Gateway> Gateway for Rc<G> {
    fn books(&self) -> impl Future<Output = Result<Vec<Book>, GatewayError>> {
        (**self).books()
    }

    fn add_book(
        &self,
        title: &str,
        author: &str,
    ) -> impl Future<Output = Result<Book, GatewayError>> {
        (**self).add_book(title, author)
    }

    fn update_book(
        &self,
        id: &BookId,
        title: Option<&str>,
        author: Option<&str>,
    ) -> impl Future<Output = Result<Book, GatewayError>> {
        (**self).update_book(id, title, author)
    }

    fn delete_book(&self, id: &BookId) -> impl Future<Output = Result<bool, GatewayError>> {
        (**self).delete_book(id)
    }
}

/// An in-process stand-in for the server.
///
/// It behaves like the real backend closely enough for tests and offline demos: ids are assigned on add,
/// blank fields are rejected, and every add/delete queues the notification the server would push.
/// Nothing is delivered automatically; call [`MemoryGateway::take_notifications`] to pump them.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: RefCell<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    books: Vec<Book>,
    next_id: u64,
    /// One entry per upcoming request; `None` lets that request through.
    failures: VecDeque<Option<GatewayError>>,
    outbox: VecDeque<Notification>,
    requests: usize,
}

impl MemoryGateway {
    pub fn with_books(books: impl IntoIterator<Item = Book>) -> Self {
        let books: Vec<Book> = books.into_iter().collect();
        let gateway = Self::default();
        {
            let mut state = gateway.state.borrow_mut();
            state.next_id = books.len() as u64;
            state.books = books;
        }
        gateway
    }

    /// The next request fails with `error` instead of running.
    pub fn fail_next(&self, error: GatewayError) {
        self.fail_after(0, error);
    }

    /// Lets `successes` requests through, then fails the one after with `error`.
    pub fn fail_after(&self, successes: usize, error: GatewayError) {
        let mut state = self.state.borrow_mut();
        state.failures.extend(std::iter::repeat_n(None, successes));
        state.failures.push_back(Some(error));
    }

    /// Notifications queued since the last call, oldest first.
    pub fn take_notifications(&self) -> Vec<Notification> {
        self.state.borrow_mut().outbox.drain(..).collect()
    }

    /// What the server currently holds.
    pub fn server_books(&self) -> Vec<Book> {
        self.state.borrow().books.clone()
    }

    /// Number of requests received, failed ones included.
    pub fn requests(&self) -> usize {
        self.state.borrow().requests
    }

    fn begin(&self) -> Result<std::cell::RefMut<'_, MemoryState>, GatewayError> {
        let mut state = self.state.borrow_mut();
        state.requests += 1;
        match state.failures.pop_front().flatten() {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), GatewayError> {
    if value.trim().is_empty() {
        return Err(GatewayError::Validation(format!("{field} required")));
    }
    Ok(())
}

impl Gateway for MemoryGateway {
    async fn books(&self) -> Result<Vec<Book>, GatewayError> {
        let state = self.begin()?;
        Ok(state.books.clone())
    }

    async fn add_book(&self, title: &str, author: &str) -> Result<Book, GatewayError> {
        let mut state = self.begin()?;
        require("title", title)?;
        require("author", author)?;

        state.next_id += 1;
        let book = Book::new(state.next_id.to_string(), title, author);
        state.books.push(book.clone());
        state.outbox.push_back(Notification::Added(book.clone()));
        Ok(book)
    }

    async fn update_book(
        &self,
        id: &BookId,
        title: Option<&str>,
        author: Option<&str>,
    ) -> Result<Book, GatewayError> {
        let mut state = self.begin()?;
        let Some(book) = state.books.iter_mut().find(|b| &b.id == id) else {
            return Err(GatewayError::Validation(format!("book {id} not found")));
        };
        if let Some(title) = title {
            require("title", title)?;
            book.title = title.to_string();
        }
        if let Some(author) = author {
            require("author", author)?;
            book.author = author.to_string();
        }
        Ok(book.clone())
    }

    async fn delete_book(&self, id: &BookId) -> Result<bool, GatewayError> {
        let mut state = self.begin()?;
        let Some(position) = state.books.iter().position(|b| &b.id == id) else {
            return Ok(false);
        };
        let book = state.books.remove(position);
        state.outbox.push_back(Notification::Deleted(book));
        Ok(true)
    }
}
