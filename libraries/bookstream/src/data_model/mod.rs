#[path = "1-book.rs"]
mod book;

#[path = "2-book-event.rs"]
mod book_event;

#[path = "3-sequenced.rs"]
mod sequenced;

#[path = "4-event-log.rs"]
mod event_log;

#[path = "5-book-list.rs"]
mod book_list;

#[path = "6-dirty-tracker.rs"]
mod dirty_tracker;

#[path = "7-sync-store.rs"]
mod sync_store;

pub use book::*;
pub use book_event::*;
pub use book_list::*;
pub use dirty_tracker::*;
pub use event_log::*;
pub use sequenced::*;
pub use sync_store::*;

#[cfg_attr(target_arch = "wasm32", wasm_bindgen::prelude::wasm_bindgen)]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ListenerKey(pub(crate) slotmap::DefaultKey);
