mod catalog;
mod clock;
mod config;
#[cfg(target_arch = "wasm32")]
mod live;
mod page;
mod projection;
mod routes;
mod views;

#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::LazyLock;

use bookstream::data_model::{Book, BookId, ListenerKey, Notification, Slot};
use bookstream::Gateway;
use bookstream::graphql::GraphqlGateway;
use wasm_bindgen::prelude::*;

pub use catalog::{BookCatalog, CatalogError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CatalogSettings, ShelfConfig};
pub use page::{BookListPage, EditBuffer, Expiring};
pub use projection::{DEFAULT_PAGE_SIZE, Pagination};
pub use routes::Route;
pub use views::{BookListView, ListStatus, LogsView, NavView};

type Catalog = BookCatalog<GraphqlGateway, SystemClock>;

#[wasm_bindgen]
pub struct Shelf {
    // never hold a borrow of the catalog's store across an .await; listeners and socket callbacks re-enter it
    catalog: Rc<Catalog>,
    config: ShelfConfig,
    #[cfg(target_arch = "wasm32")]
    live: RefCell<Option<live::LiveFeed>>,
}

fn set_panic_hook() {
    // better panic messages in the console, at the cost of code size
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

// putting this inside LOGGER prevents us from accidentally initializing the logger more than once
static LOGGER: LazyLock<()> = LazyLock::new(|| {
    set_panic_hook();

    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Logging initialized");
});

fn slot_name(slot: Slot) -> &'static str {
    match slot {
        Slot::Books => "books",
        Slot::Events => "events",
        Slot::Overlay => "overlay",
    }
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
impl Shelf {
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(constructor))]
    pub fn new(config: ShelfConfig) -> Shelf {
        LazyLock::force(&LOGGER);

        let gateway = GraphqlGateway::new(config.gateway_config());
        let catalog = BookCatalog::new(gateway, SystemClock, config.catalog_settings());
        log::info!("Catalog gateway at {}", config.http_url);

        Shelf {
            catalog: Rc::new(catalog),
            config,
            #[cfg(target_arch = "wasm32")]
            live: RefCell::new(None),
        }
    }

    /// The callback gets the listener key and the name of the part that changed: "books", "events" or "overlay".
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn subscribe(&self, callback: js_sys::Function) -> ListenerKey {
        self.catalog.register_listener(move |listener_id, slot| {
            #[cfg(target_arch = "wasm32")]
            {
                let this = JsValue::null();
                let listener_js: JsValue = listener_id.into();
                let slot_js = JsValue::from_str(slot_name(slot));
                let _ = callback.call2(&this, &listener_js, &slot_js);
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                let _ = (listener_id, &callback, slot_name(slot));
            }
        })
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn unsubscribe(&self, key: ListenerKey) {
        self.catalog.unregister_listener(key)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn load_books(&self) -> Result<(), JsValue> {
        let _flusher = FlushLater::new(self);
        self.catalog.load_books().await.map_err(js_error)
    }

    /// Opens the subscription socket. Calling it again replaces the previous socket.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn start_live_updates(&self) -> Result<(), JsValue> {
        #[cfg(target_arch = "wasm32")]
        {
            let catalog = self.catalog.clone();
            let feed = live::LiveFeed::connect(&self.config.gateway_config(), move |notification| {
                catalog.receive(notification);
                catalog.flush_notifications();
            })
            .map_err(js_error)?;
            *self.live.borrow_mut() = Some(feed);
        }
        #[cfg(not(target_arch = "wasm32"))]
        log::warn!("Live updates need a browser; {} was not opened", self.config.ws_url);
        Ok(())
    }

    /// Feeds a `bookAdded` payload in by hand, for hosts that run their own socket.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn receive_added(&self, book_json: &str) -> Result<(), JsValue> {
        let book: Book = serde_json::from_str(book_json).map_err(js_error)?;
        self.receive(Notification::Added(book));
        Ok(())
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn receive_deleted(&self, book_json: &str) -> Result<(), JsValue> {
        let book: Book = serde_json::from_str(book_json).map_err(js_error)?;
        self.receive(Notification::Deleted(book));
        Ok(())
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn set_title_input(&self, value: String, modifier: Option<ListenerKey>) {
        let _flusher = FlushLater::new(self);
        self.catalog.set_title_input(value, modifier);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn set_author_input(&self, value: String, modifier: Option<ListenerKey>) {
        let _flusher = FlushLater::new(self);
        self.catalog.set_author_input(value, modifier);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn submit_add(&self) -> Result<(), JsValue> {
        let _flusher = FlushLater::new(self);
        let result = self.catalog.submit_add().await;
        schedule_expiry(&self.catalog);
        result.map(|_| ()).map_err(js_error)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn begin_edit(&self, id: String) -> Result<(), JsValue> {
        let _flusher = FlushLater::new(self);
        self.catalog.begin_edit(&BookId::from(id)).map_err(js_error)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn set_edit_title(&self, value: String, modifier: Option<ListenerKey>) -> Result<(), JsValue> {
        let _flusher = FlushLater::new(self);
        self.catalog.set_edit_title(value, modifier).map_err(js_error)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn set_edit_author(&self, value: String, modifier: Option<ListenerKey>) -> Result<(), JsValue> {
        let _flusher = FlushLater::new(self);
        self.catalog.set_edit_author(value, modifier).map_err(js_error)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn cancel_edit(&self) {
        let _flusher = FlushLater::new(self);
        self.catalog.cancel_edit();
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn save_edit(&self) -> Result<(), JsValue> {
        let _flusher = FlushLater::new(self);
        let result = self.catalog.save_edit().await;
        schedule_expiry(&self.catalog);
        result.map_err(js_error)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn request_delete(&self, id: String) -> Result<(), JsValue> {
        let _flusher = FlushLater::new(self);
        self.catalog.request_delete(&BookId::from(id)).map_err(js_error)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn cancel_delete(&self) {
        let _flusher = FlushLater::new(self);
        self.catalog.cancel_delete();
    }

    /// Resolves to whether the server still had the book.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn confirm_delete(&self) -> Result<bool, JsValue> {
        let _flusher = FlushLater::new(self);
        let result = self.catalog.confirm_delete().await;
        schedule_expiry(&self.catalog);
        result.map_err(js_error)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn set_search(&self, query: String, modifier: Option<ListenerKey>) {
        let _flusher = FlushLater::new(self);
        self.catalog.set_search(query, modifier);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn clear_search(&self) {
        let _flusher = FlushLater::new(self);
        self.catalog.clear_search();
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn go_to_page(&self, page: usize) -> bool {
        let _flusher = FlushLater::new(self);
        self.catalog.go_to_page(page)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn next_page(&self) -> bool {
        let _flusher = FlushLater::new(self);
        self.catalog.next_page()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn previous_page(&self) -> bool {
        let _flusher = FlushLater::new(self);
        self.catalog.previous_page()
    }

    /// Hosts normally never call this; expiry is scheduled after every action that can raise a banner or a highlight.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn expire_transients(&self) {
        let _flusher = FlushLater::new(self);
        self.catalog.expire_transients();
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn book_list_view(&self) -> BookListView {
        self.catalog.book_list_view()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn logs_view(&self) -> LogsView {
        self.catalog.logs_view()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn nav_view(&self, path: &str) -> NavView {
        views::nav_view(Route::from_path(path))
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn route(&self, path: &str) -> Option<Route> {
        Route::from_path(path)
    }
}

impl Shelf {
    fn receive(&self, notification: Notification) {
        let _flusher = FlushLater::new(self);
        self.catalog.receive(notification);
    }

    pub fn flush_notifications(&self) {
        self.catalog.flush_notifications();
    }
}

struct FlushLater<'a> {
    shelf: &'a Shelf,
}

impl<'a> FlushLater<'a> {
    fn new(shelf: &'a Shelf) -> Self {
        Self { shelf }
    }
}

impl Drop for FlushLater<'_> {
    fn drop(&mut self) {
        self.shelf.flush_notifications();
    }
}

/// Arms a timer for the next banner or highlight deadline. Each firing re-arms itself until nothing is left to expire.
#[cfg(target_arch = "wasm32")]
fn schedule_expiry<G, C>(catalog: &Rc<BookCatalog<G, C>>)
where
    G: Gateway + 'static,
    C: Clock + 'static,
{
    let Some(deadline) = catalog.next_expiry() else {
        return;
    };
    let Some(window) = web_sys::window() else {
        log::warn!("No window to schedule expiry on");
        return;
    };
    let delay_ms = (deadline - catalog.clock().now()).num_milliseconds().max(0);
    let delay_ms = i32::try_from(delay_ms).unwrap_or(i32::MAX);

    let catalog = catalog.clone();
    let callback = Closure::once_into_js(move || {
        catalog.expire_transients();
        catalog.flush_notifications();
        schedule_expiry(&catalog);
    });
    if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        callback.unchecked_ref(),
        delay_ms,
    ) {
        log::error!("Error scheduling expiry: {e:?}");
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn schedule_expiry<G: Gateway, C: Clock>(catalog: &Rc<BookCatalog<G, C>>) {
    if let Some(deadline) = catalog.next_expiry() {
        log::debug!("No timer outside the browser; next expiry at {deadline}");
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use std::cell::Cell;

    use bookstream::{GatewayError, MemoryGateway};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    async fn sleep_ms(ms: i32) {
        let promise = js_sys::Promise::new(&mut |resolve, _| {
            web_sys::window()
                .unwrap()
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
                .unwrap();
        });
        wasm_bindgen_futures::JsFuture::from(promise).await.unwrap();
    }

    #[wasm_bindgen_test]
    async fn banner_clears_itself_without_user_action() {
        let settings = CatalogSettings {
            transient_ttl: chrono::Duration::milliseconds(50),
            ..CatalogSettings::default()
        };
        let gateway = MemoryGateway::default();
        gateway.fail_next(GatewayError::Validation("author required".to_string()));
        let catalog = Rc::new(BookCatalog::new(gateway, SystemClock, settings));

        let overlay_changes = Rc::new(Cell::new(0));
        let counter = overlay_changes.clone();
        catalog.register_listener(move |_, slot| {
            if slot == Slot::Overlay {
                counter.set(counter.get() + 1);
            }
        });

        assert!(catalog.submit_add().await.is_err());
        catalog.flush_notifications();
        assert_eq!(
            catalog.book_list_view().form.error.as_deref(),
            Some("author required")
        );
        let heard_before_expiry = overlay_changes.get();

        schedule_expiry(&catalog);
        sleep_ms(200).await;

        assert!(catalog.store().overlay().banner.is_none());
        assert_eq!(catalog.next_expiry(), None);
        assert_eq!(overlay_changes.get(), heard_before_expiry + 1);
    }
}
