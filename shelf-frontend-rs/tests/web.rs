#![cfg(target_arch = "wasm32")]

use shelf_frontend_rs::{ListStatus, Route, Shelf, ShelfConfig};
use wasm_bindgen_test::*;

#[wasm_bindgen_test]
fn new_shelf_is_loading_with_empty_feeds() {
    let shelf = Shelf::new(ShelfConfig::default());
    let view = shelf.book_list_view();
    assert_eq!(view.status, ListStatus::Loading);
    assert!(view.rows.is_empty());
    assert_eq!(
        shelf.logs_view().feed.empty_message.as_deref(),
        Some("No events yet...")
    );
}

#[wasm_bindgen_test]
fn hand_fed_notifications_reach_the_list_and_log() {
    let shelf = Shelf::new(ShelfConfig::default());
    shelf
        .receive_added(r#"{"id":"1","title":"Emma","author":"Jane Austen"}"#)
        .unwrap();
    shelf
        .receive_deleted(r#"{"id":"1","title":"Emma","author":"Jane Austen"}"#)
        .unwrap();
    assert!(shelf.receive_added("not json").is_err());

    assert!(shelf.book_list_view().rows.is_empty());
    let lines = shelf.logs_view().feed.lines;
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].kind, "deleted");
}

#[wasm_bindgen_test]
fn routes_and_nav() {
    let shelf = Shelf::new(ShelfConfig::default());
    assert_eq!(shelf.route("/pages/logs"), Some(Route::Logs));
    assert_eq!(shelf.route("/nowhere"), None);
    assert_eq!(shelf.nav_view("/").current, Some(Route::BookList));
}
