use std::cell::{Ref, RefCell};

use bookstream::data_model::{
    Book, BookId, ListenerKey, Notification, Seq, Slot, SyncStore,
};
use bookstream::{Gateway, GatewayError};
use chrono::{DateTime, Utc};

use crate::clock::{Clock, SystemClock};
use crate::config::CatalogSettings;
use crate::page::{BookListPage, EditBuffer};
use crate::projection::{self, Pagination};
use crate::views::{self, BookListView, LogsView, RECENT_EVENTS};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("book {0} is not in the list")]
    UnknownBook(BookId),
    #[error("no book is being edited")]
    NotEditing,
    #[error("no delete is waiting for confirmation")]
    NothingToDelete,
}

/// The book list page and the live feed, wired to a gateway.
///
/// Never hold a borrow of the store across an `.await`: listeners and gateway callbacks re-enter through `&self`.
pub struct BookCatalog<G, C = SystemClock> {
    gateway: G,
    clock: C,
    settings: CatalogSettings,
    store: RefCell<SyncStore<BookListPage>>,
}

impl<G: Gateway, C: Clock> BookCatalog<G, C> {
    pub fn new(gateway: G, clock: C, settings: CatalogSettings) -> Self {
        Self {
            gateway,
            clock,
            store: RefCell::new(SyncStore::new(
                settings.duplicate_adds,
                BookListPage::default(),
            )),
            settings,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    pub fn store(&self) -> Ref<'_, SyncStore<BookListPage>> {
        self.store.borrow()
    }

    pub fn register_listener(&self, listener: impl Fn(ListenerKey, Slot) + 'static) -> ListenerKey {
        self.store.borrow_mut().register_listener(listener)
    }

    pub fn unregister_listener(&self, key: ListenerKey) {
        self.store.borrow_mut().unregister_listener(key)
    }

    /// Calls every listener owed a notification.
    pub fn flush_notifications(&self) {
        // drain first so no borrow is held while listeners run; they usually read the store again
        let notifications = self.store.borrow_mut().drain_due_notifications();
        for notification in notifications {
            notification();
        }
    }

    fn update_page<R>(&self, modifier: Option<ListenerKey>, f: impl FnOnce(&mut BookListPage) -> R) -> R {
        let mut store = self.store.borrow_mut();
        let mut page = store.overlay_mut(modifier);
        f(&mut page)
    }

    fn show_banner(&self, error: &GatewayError) {
        let now = self.clock.now();
        let ttl = self.settings.transient_ttl;
        self.update_page(None, |page| page.show_banner(error.to_string(), now, ttl));
    }

    // =======
    // remote data
    // =======

    /// Bulk fetch. Replaces the whole list on success.
    pub async fn load_books(&self) -> Result<(), CatalogError> {
        let result = self.gateway.books().await;

        let mut store = self.store.borrow_mut();
        match result {
            Ok(books) => {
                log::info!("Loaded {} books", books.len());
                store.apply_fetch(books);
                if store.overlay().load_error.is_some() {
                    store.overlay_mut(None).load_error = None;
                }
                Ok(())
            }
            Err(e) => {
                log::error!("Error loading books: {e}");
                store.overlay_mut(None).load_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// A payload from one of the subscriptions.
    pub fn receive(&self, notification: Notification) -> Seq {
        let now = self.clock.now();
        let kind = notification.kind();
        let seq = self.store.borrow_mut().apply(notification, now);
        log::debug!("Book {} notification #{}", kind.as_str(), seq.0);
        seq
    }

    // =======
    // add form
    // =======

    pub fn set_title_input(&self, value: String, modifier: Option<ListenerKey>) {
        self.update_page(modifier, |page| page.title_input = value);
    }

    pub fn set_author_input(&self, value: String, modifier: Option<ListenerKey>) {
        self.update_page(modifier, |page| page.author_input = value);
    }

    /// Sends the add form. The new row is not inserted here; it shows up when the "added" notification arrives.
    pub async fn submit_add(&self) -> Result<Book, CatalogError> {
        let (title, author) = self.update_page(None, |page| {
            page.banner = None;
            page.page = 1;
            (page.title_input.clone(), page.author_input.clone())
        });

        match self.gateway.add_book(&title, &author).await {
            Ok(book) => {
                log::info!("Added book {}", book.id);
                let now = self.clock.now();
                let ttl = self.settings.transient_ttl;
                self.update_page(None, |page| {
                    page.title_input.clear();
                    page.author_input.clear();
                    page.highlight(book.id.clone(), now, ttl);
                });
                Ok(book)
            }
            Err(e) => {
                log::error!("Add book error: {e}");
                self.show_banner(&e);
                Err(e.into())
            }
        }
    }

    // =======
    // inline edit
    // =======

    pub fn begin_edit(&self, id: &BookId) -> Result<(), CatalogError> {
        let buffer = self
            .store
            .borrow()
            .books()
            .get(id)
            .map(EditBuffer::from_book)
            .ok_or_else(|| CatalogError::UnknownBook(id.clone()))?;
        self.update_page(None, |page| page.editing = Some(buffer));
        Ok(())
    }

    pub fn set_edit_title(&self, value: String, modifier: Option<ListenerKey>) -> Result<(), CatalogError> {
        self.edit_buffer(modifier, |buffer| buffer.title = value)
    }

    pub fn set_edit_author(&self, value: String, modifier: Option<ListenerKey>) -> Result<(), CatalogError> {
        self.edit_buffer(modifier, |buffer| buffer.author = value)
    }

    fn edit_buffer(
        &self,
        modifier: Option<ListenerKey>,
        f: impl FnOnce(&mut EditBuffer),
    ) -> Result<(), CatalogError> {
        if self.store.borrow().overlay().editing.is_none() {
            return Err(CatalogError::NotEditing);
        }
        self.update_page(modifier, |page| {
            if let Some(buffer) = page.editing.as_mut() {
                f(buffer);
            }
        });
        Ok(())
    }

    pub fn cancel_edit(&self) {
        if self.store.borrow().overlay().editing.is_some() {
            self.update_page(None, |page| page.editing = None);
        }
    }

    /// Sends both fields of the edit buffer, then re-fetches; updates are not pushed by the server.
    pub async fn save_edit(&self) -> Result<(), CatalogError> {
        let buffer = self
            .store
            .borrow()
            .overlay()
            .editing
            .clone()
            .ok_or(CatalogError::NotEditing)?;

        let result = self
            .gateway
            .update_book(&buffer.id, Some(&buffer.title), Some(&buffer.author))
            .await;

        match result {
            Ok(book) => {
                log::info!("Updated book {}", book.id);
                self.update_page(None, |page| {
                    if page.is_editing(&buffer.id) {
                        page.editing = None;
                    }
                });
                self.load_books().await
            }
            Err(e) => {
                log::error!("Update book error: {e}");
                self.show_banner(&e);
                Err(e.into())
            }
        }
    }

    // =======
    // delete confirmation
    // =======

    pub fn request_delete(&self, id: &BookId) -> Result<(), CatalogError> {
        let book = self
            .store
            .borrow()
            .books()
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownBook(id.clone()))?;
        self.update_page(None, |page| page.pending_delete = Some(book));
        Ok(())
    }

    pub fn cancel_delete(&self) {
        if self.store.borrow().overlay().pending_delete.is_some() {
            self.update_page(None, |page| page.pending_delete = None);
        }
    }

    /// Sends the staged delete, then re-fetches. Racing the "deleted" notification is fine: both end with the row gone.
    pub async fn confirm_delete(&self) -> Result<bool, CatalogError> {
        let book = self
            .store
            .borrow()
            .overlay()
            .pending_delete
            .clone()
            .ok_or(CatalogError::NothingToDelete)?;

        let result = self.gateway.delete_book(&book.id).await;
        self.update_page(None, |page| page.pending_delete = None);

        match result {
            Ok(deleted) => {
                if !deleted {
                    log::warn!("Server had nothing to delete for {}", book.id);
                }
                // the row is gone on the server either way; a failed refresh only shows up as the load error
                if let Err(e) = self.load_books().await {
                    log::warn!("Refresh after deleting {} failed: {e}", book.id);
                }
                Ok(deleted)
            }
            Err(e) => {
                log::error!("Delete book error: {e}");
                self.show_banner(&e);
                Err(e.into())
            }
        }
    }

    // =======
    // search and pagination
    // =======

    pub fn set_search(&self, query: String, modifier: Option<ListenerKey>) {
        self.update_page(modifier, |page| page.set_search(query));
    }

    pub fn clear_search(&self) {
        self.update_page(None, |page| page.set_search(String::new()));
    }

    pub fn pagination(&self) -> Pagination {
        let store = self.store.borrow();
        let page = store.overlay();
        let filtered = store
            .books()
            .iter()
            .filter(|book| projection::matches(book, &page.search))
            .count();
        Pagination::new(page.page, filtered, self.settings.page_size)
    }

    /// Returns false, and changes nothing, for a page the controls would not offer.
    pub fn go_to_page(&self, page: usize) -> bool {
        if !self.pagination().can_go_to(page) {
            log::debug!("Ignoring navigation to page {page}");
            return false;
        }
        self.update_page(None, |p| p.page = page);
        true
    }

    pub fn next_page(&self) -> bool {
        let pagination = self.pagination();
        if pagination.next_disabled() {
            return false;
        }
        self.update_page(None, |p| p.page = pagination.current + 1);
        true
    }

    pub fn previous_page(&self) -> bool {
        let pagination = self.pagination();
        if pagination.previous_disabled() {
            return false;
        }
        self.update_page(None, |p| p.page = pagination.current - 1);
        true
    }

    // =======
    // transients
    // =======

    /// Drops expired banners and highlights, and returns when the next one is due.
    pub fn expire_transients(&self) -> Option<DateTime<Utc>> {
        let now = self.clock.now();
        if self.store.borrow().overlay().has_expired(now) {
            self.update_page(None, |page| page.expire(now));
        }
        self.next_expiry()
    }

    pub fn next_expiry(&self) -> Option<DateTime<Utc>> {
        self.store.borrow().overlay().next_expiry()
    }

    // =======
    // views
    // =======

    pub fn book_list_view(&self) -> BookListView {
        let store = self.store.borrow();
        views::book_list_view(
            store.books().iter(),
            store.events().recent(RECENT_EVENTS),
            store.overlay(),
            store.loaded_at_least_once(),
            self.settings.page_size,
            self.clock.now(),
        )
    }

    pub fn logs_view(&self) -> LogsView {
        views::logs_view(self.store.borrow().events().iter())
    }
}
