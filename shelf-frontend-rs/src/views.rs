//! Serializable snapshots of what each page should show. The JS shell renders these as-is.

use bookstream::data_model::{Book, BookEvent, BookEventKind};
use chrono::{DateTime, Utc};

use crate::page::BookListPage;
use crate::projection::{self, Pagination};
use crate::routes::Route;

/// How many events the list page shows above the form.
pub const RECENT_EVENTS: usize = 5;

#[derive(Clone, Debug, PartialEq, tsify::Tsify, serde::Serialize)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum ListStatus {
    Loading,
    Failed { message: String },
    Ready,
}

#[derive(Clone, Debug, PartialEq, tsify::Tsify, serde::Serialize)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct BookListView {
    pub status: ListStatus,
    pub recent_events: EventFeedView,
    pub form: AddFormView,
    pub search: String,
    pub rows: Vec<BookRowView>,
    pub pagination: PaginationView,
    pub delete_dialog: Option<DeleteDialogView>,
}

#[derive(Clone, Debug, PartialEq, tsify::Tsify, serde::Serialize)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct AddFormView {
    pub title: String,
    pub author: String,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, tsify::Tsify, serde::Serialize)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct BookRowView {
    pub id: String,
    pub title: String,
    pub author: String,
    pub highlighted: bool,
    /// Present while the row is in edit mode; holds the edit buffer, not the saved values.
    pub editing: Option<EditRowView>,
}

#[derive(Clone, Debug, PartialEq, tsify::Tsify, serde::Serialize)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct EditRowView {
    pub title: String,
    pub author: String,
}

#[derive(Clone, Debug, PartialEq, tsify::Tsify, serde::Serialize)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct PaginationView {
    pub current: usize,
    pub count: usize,
    pub pages: Vec<PageButtonView>,
    pub previous_disabled: bool,
    pub next_disabled: bool,
}

#[derive(Clone, Debug, PartialEq, tsify::Tsify, serde::Serialize)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct PageButtonView {
    pub number: usize,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, tsify::Tsify, serde::Serialize)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDialogView {
    pub id: String,
    pub title: String,
    pub prompt: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, tsify::Tsify, serde::Serialize)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum Tone {
    Success,
    Danger,
}

#[derive(Clone, Debug, PartialEq, tsify::Tsify, serde::Serialize)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct EventLineView {
    /// Stable within one render; ids repeat across events so the position is part of it.
    pub key: String,
    pub kind: String,
    pub tone: Tone,
    pub title: String,
    #[tsify(type = "string")]
    pub time: DateTime<Utc>,
    pub local_time: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, tsify::Tsify, serde::Serialize)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct EventFeedView {
    pub lines: Vec<EventLineView>,
    /// Shown instead of the lines when there are none.
    pub empty_message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, tsify::Tsify, serde::Serialize)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct LogsView {
    pub heading: String,
    pub feed: EventFeedView,
}

#[derive(Clone, Debug, PartialEq, tsify::Tsify, serde::Serialize)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct NavView {
    pub brand: NavLinkView,
    pub links: Vec<NavLinkView>,
    pub current: Option<Route>,
}

#[derive(Clone, Debug, PartialEq, tsify::Tsify, serde::Serialize)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct NavLinkView {
    pub label: String,
    pub path: String,
}

pub fn local_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&chrono::Local)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

pub fn event_line(index: usize, event: &BookEvent) -> EventLineView {
    let tone = match event.kind {
        BookEventKind::Added => Tone::Success,
        BookEventKind::Deleted => Tone::Danger,
    };
    let local_time = local_time(event.time);
    EventLineView {
        key: format!("{}-{index}", event.book.id),
        kind: event.kind.as_str().to_string(),
        tone,
        title: event.book.title.clone(),
        time: event.time,
        text: format!(
            "Book {} was {} on {local_time}.",
            event.book.title,
            event.kind.as_str()
        ),
        local_time,
    }
}

pub fn event_feed<'a>(
    events: impl IntoIterator<Item = &'a BookEvent>,
    empty_message: &str,
) -> EventFeedView {
    let lines: Vec<EventLineView> = events
        .into_iter()
        .enumerate()
        .map(|(index, event)| event_line(index, event))
        .collect();
    let empty_message = lines.is_empty().then(|| empty_message.to_string());
    EventFeedView {
        lines,
        empty_message,
    }
}

pub fn logs_view<'a>(events: impl IntoIterator<Item = &'a BookEvent>) -> LogsView {
    LogsView {
        heading: "Book Event Logs".to_string(),
        feed: event_feed(events, "No events yet..."),
    }
}

pub fn nav_view(current: Option<Route>) -> NavView {
    NavView {
        brand: NavLinkView {
            label: "Book Manager".to_string(),
            path: Route::BookList.path().to_string(),
        },
        links: vec![NavLinkView {
            label: "Logs".to_string(),
            path: Route::Logs.path().to_string(),
        }],
        current,
    }
}

pub fn pagination_view(pagination: Pagination) -> PaginationView {
    PaginationView {
        current: pagination.current,
        count: pagination.count,
        pages: (1..=pagination.count)
            .map(|number| PageButtonView {
                number,
                active: number == pagination.current,
            })
            .collect(),
        previous_disabled: pagination.previous_disabled(),
        next_disabled: pagination.next_disabled(),
    }
}

fn row_view(book: &Book, page: &BookListPage, now: DateTime<Utc>) -> BookRowView {
    let editing = page
        .editing
        .as_ref()
        .filter(|e| e.id == book.id)
        .map(|e| EditRowView {
            title: e.title.clone(),
            author: e.author.clone(),
        });
    BookRowView {
        id: book.id.to_string(),
        title: book.title.clone(),
        author: book.author.clone(),
        highlighted: page.highlighted_at(now) == Some(&book.id),
        editing,
    }
}

/// Everything the list page needs for one render.
pub fn book_list_view<'a>(
    books: impl IntoIterator<Item = &'a Book>,
    recent: impl IntoIterator<Item = &'a BookEvent>,
    page: &BookListPage,
    loaded: bool,
    page_size: usize,
    now: DateTime<Utc>,
) -> BookListView {
    let status = match (&page.load_error, loaded) {
        (Some(message), _) => ListStatus::Failed {
            message: format!("Error: {message}"),
        },
        (None, false) => ListStatus::Loading,
        (None, true) => ListStatus::Ready,
    };

    let filtered = projection::filter(books, &page.search);
    let pagination = Pagination::new(page.page, filtered.len(), page_size);
    let rows = projection::page_slice(&filtered, page.page, page_size)
        .iter()
        .map(|book| row_view(book, page, now))
        .collect();

    let delete_dialog = page.pending_delete.as_ref().map(|book| DeleteDialogView {
        id: book.id.to_string(),
        title: book.title.clone(),
        prompt: format!("Are you sure you want to delete \"{}\"?", book.title),
    });

    BookListView {
        status,
        recent_events: event_feed(recent, "Waiting for book events..."),
        form: AddFormView {
            title: page.title_input.clone(),
            author: page.author_input.clone(),
            error: page.banner_at(now).map(str::to_string),
        },
        search: page.search.clone(),
        rows,
        pagination: pagination_view(pagination),
        delete_dialog,
    }
}
