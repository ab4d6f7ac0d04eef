use std::sync::Arc;

use crate::data_model::{
    Book, BookList, DirtyOnDerefMut, DirtyState, DirtyTracker, DuplicatePolicy,
    EventLog, LatestSlot, ListenerKey, Notification, Seq, Sequenced,
};

/// The parts of the store a listener can be told about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(target_arch = "wasm32", derive(tsify::Tsify))]
#[cfg_attr(target_arch = "wasm32", tsify(into_wasm_abi, from_wasm_abi))]
#[serde(rename_all = "camelCase")]
pub enum Slot {
    Books,
    Events,
    Overlay,
}

/// Process-local reconciliation state.
///
/// `Overlay` is whatever local-only state the owner wants tracked alongside the catalog (search text, edit buffers, banners...).
/// It never reaches the server, but it gets the same dirty tracking and listener notifications as the list and the log.
pub struct SyncStore<Overlay> {
    books: DirtyTracker<BookList>,
    events: DirtyTracker<EventLog>,
    overlay: DirtyTracker<Overlay>,

    last_added: LatestSlot<Book>,
    last_deleted: LatestSlot<Book>,
    /// Recorded but not yet applied to the list, oldest first.
    unapplied: Vec<Sequenced<Notification>>,
    last_seq: Seq,

    duplicate_policy: DuplicatePolicy,
    listeners: slotmap::SlotMap<slotmap::DefaultKey, Arc<dyn Fn(ListenerKey, Slot)>>,
}

impl<Overlay: Default> Default for SyncStore<Overlay> {
    fn default() -> Self {
        Self::new(DuplicatePolicy::default(), Overlay::default())
    }
}

impl<Overlay> SyncStore<Overlay> {
    pub fn new(duplicate_policy: DuplicatePolicy, overlay: Overlay) -> Self {
        Self {
            books: DirtyTracker::default(),
            events: DirtyTracker::default(),
            overlay: DirtyTracker::new(overlay),

            last_added: LatestSlot::default(),
            last_deleted: LatestSlot::default(),
            unapplied: Vec::new(),
            last_seq: Seq(0),

            duplicate_policy,
            listeners: Default::default(),
        }
    }

    pub fn books(&self) -> &BookList {
        self.books.slot()
    }

    pub fn events(&self) -> &EventLog {
        self.events.slot()
    }

    pub fn overlay(&self) -> &Overlay {
        self.overlay.slot()
    }

    pub fn overlay_mut(&mut self, modifier: Option<ListenerKey>) -> DirtyOnDerefMut<'_, Overlay> {
        self.overlay.slot_mut(modifier)
    }

    /// True once a bulk fetch has completed.
    pub fn loaded_at_least_once(&self) -> bool {
        self.books.loaded_at_least_once()
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    pub fn last_added(&self) -> Option<&Sequenced<Book>> {
        self.last_added.peek()
    }

    pub fn last_deleted(&self) -> Option<&Sequenced<Book>> {
        self.last_deleted.peek()
    }

    /// Replaces the list view with a bulk fetch. The last fetch to complete wins.
    pub fn apply_fetch(&mut self, books: impl IntoIterator<Item = Book>) {
        self.books.slot_mut(None).replace(books);
        self.books.mark_loaded(None);
    }

    /// Records an inbound notification and reconciles it into the list view.
    pub fn apply(&mut self, notification: Notification, time: chrono::DateTime<chrono::Utc>) -> Seq {
        let seq = self.record(notification, time);
        self.reconcile();
        seq
    }

    /// Prepends the notification to the log, points the matching "latest" slot at it, and queues it for the list.
    /// The list view is left alone until [`SyncStore::reconcile`] runs.
    pub fn record(&mut self, notification: Notification, time: chrono::DateTime<chrono::Utc>) -> Seq {
        self.last_seq = self.last_seq.next();
        let seq = self.last_seq;

        match &notification {
            Notification::Added(book) => self.last_added.set(seq, book.clone()),
            Notification::Deleted(book) => self.last_deleted.set(seq, book.clone()),
        }
        self.events
            .slot_mut(None)
            .prepend(notification.clone().into_event(time));
        self.unapplied.push(Sequenced {
            seq,
            value: notification,
        });

        seq
    }

    /// Applies every arrival recorded since the last call, oldest first.
    /// Each arrival is applied at most once no matter how often this is called.
    /// Returns how many arrivals were applied.
    pub fn reconcile(&mut self) -> usize {
        // the latest slots only signal that something arrived; the queue holds every arrival
        self.last_added.take();
        self.last_deleted.take();
        let pending = std::mem::take(&mut self.unapplied);

        let applied = pending.len();
        for Sequenced { seq, value } in pending {
            match value {
                Notification::Added(book) => {
                    log::debug!("Reconciling add of {} (#{})", book.id, seq.0);
                    self.books
                        .slot_mut(None)
                        .prepend(book, self.duplicate_policy);
                }
                Notification::Deleted(book) => {
                    let removed = self.books.slot_mut(None).remove(&book.id);
                    log::debug!(
                        "Reconciling delete of {} (#{}), {removed} row(s) removed",
                        book.id,
                        seq.0
                    );
                }
            }
        }
        applied
    }

    /// The listener is invoked with the slot that changed, once per slot per flush.
    pub fn register_listener(
        &mut self,
        listener: impl Fn(ListenerKey, Slot) + 'static,
    ) -> ListenerKey {
        let key = self.listeners.insert(Arc::new(listener));
        ListenerKey(key)
    }

    /// Unregister a previously registered listener.
    pub fn unregister_listener(&mut self, key: ListenerKey) {
        self.listeners.remove(key.0);
    }

    pub fn has_due_notifications(&self) -> bool {
        [
            &self.books.dirty_state,
            &self.events.dirty_state,
            &self.overlay.dirty_state,
        ]
        .iter()
        .any(|state| **state != DirtyState::Clean)
    }

    /// Collects the calls owed to listeners and marks every slot clean.
    /// The calls are returned rather than made so the caller can release any borrow of the store first.
    pub fn drain_due_notifications(&mut self) -> Vec<Box<dyn FnOnce()>> {
        let due = [
            (Slot::Books, self.books.take_dirty()),
            (Slot::Events, self.events.take_dirty()),
            (Slot::Overlay, self.overlay.take_dirty()),
        ];

        let mut notifications: Vec<Box<dyn FnOnce()>> = Vec::new();
        for (slot, state) in due {
            let exclude_key = match state {
                DirtyState::Clean => continue,
                DirtyState::DirtyExcept(key) => Some(key),
                DirtyState::DirtyAll => None,
            };

            for (key, listener) in self.listeners.iter() {
                let listener_key = ListenerKey(key);
                if exclude_key == Some(listener_key) {
                    continue;
                }
                let listener = listener.clone();
                notifications.push(Box::new(move || listener(listener_key, slot)));
            }
        }
        notifications
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use proptest::prelude::*;

    fn now() -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now()
    }

    fn flush<O>(store: &mut SyncStore<O>) {
        for notification in store.drain_due_notifications() {
            notification();
        }
    }

    #[test]
    fn test_reconcile_applies_each_arrival_once() {
        let mut store: SyncStore<()> = SyncStore::default();
        store.record(Notification::Added(Book::new("1", "A", "X")), now());
        assert!(store.books().is_empty());

        assert_eq!(store.reconcile(), 1);
        assert_eq!(store.reconcile(), 0);
        assert_eq!(store.books().len(), 1);
    }

    #[test]
    fn test_redelivered_identical_payload_is_a_new_arrival() {
        let mut store: SyncStore<()> = SyncStore::default();
        let book = Book::new("1", "A", "X");
        let first = store.apply(Notification::Added(book.clone()), now());
        let second = store.apply(Notification::Added(book), now());

        assert_ne!(first, second);
        assert_eq!(store.events().len(), 2);
        assert_eq!(store.books().len(), 2);
        assert_eq!(store.last_added().map(|s| s.seq), Some(second));
    }

    #[test]
    fn test_replace_policy_deduplicates_adds() {
        let mut store: SyncStore<()> = SyncStore::new(DuplicatePolicy::Replace, ());
        let book = Book::new("1", "A", "X");
        store.apply(Notification::Added(book.clone()), now());
        store.apply(Notification::Added(book), now());
        assert_eq!(store.books().len(), 1);
        assert_eq!(store.events().len(), 2);
    }

    #[test]
    fn test_delete_then_add_in_one_batch_keeps_arrival_order() {
        let mut store: SyncStore<()> = SyncStore::default();
        store.apply_fetch(vec![Book::new("1", "A", "X")]);
        store.record(Notification::Deleted(Book::new("1", "A", "X")), now());
        store.record(Notification::Added(Book::new("1", "A", "X")), now());
        assert_eq!(store.reconcile(), 2);

        let ids: Vec<_> = store.books().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn test_same_kind_arrivals_in_one_batch_all_reach_the_list() {
        let mut store: SyncStore<()> = SyncStore::default();
        store.record(Notification::Added(Book::new("1", "A", "X")), now());
        store.record(Notification::Added(Book::new("2", "B", "Y")), now());
        store.record(Notification::Deleted(Book::new("3", "C", "Z")), now());
        store.record(Notification::Deleted(Book::new("1", "A", "X")), now());
        store.record(Notification::Added(Book::new("4", "D", "W")), now());

        assert_eq!(store.reconcile(), 5);
        assert_eq!(store.reconcile(), 0);
        let ids: Vec<_> = store.books().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["4", "2"]);
        assert_eq!(store.events().len(), 5);
        assert_eq!(store.last_added().map(|s| s.value.id.as_str()), Some("4"));
    }

    #[test]
    fn test_listeners_hear_each_dirty_slot_once() {
        let mut store: SyncStore<u32> = SyncStore::default();
        let heard = Rc::new(RefCell::new(Vec::new()));
        let sink = heard.clone();
        store.register_listener(move |_, slot| sink.borrow_mut().push(slot));

        store.apply(Notification::Added(Book::new("1", "A", "X")), now());
        store.apply(Notification::Added(Book::new("2", "B", "Y")), now());
        assert!(store.has_due_notifications());
        flush(&mut store);

        assert_eq!(*heard.borrow(), vec![Slot::Books, Slot::Events]);
        assert!(!store.has_due_notifications());

        flush(&mut store);
        assert_eq!(heard.borrow().len(), 2);
    }

    #[test]
    fn test_overlay_modifier_is_not_notified() {
        let mut store: SyncStore<u32> = SyncStore::default();
        let heard = Rc::new(RefCell::new(Vec::new()));

        let sink = heard.clone();
        let quiet = store.register_listener(move |key, _| sink.borrow_mut().push(key));
        let sink = heard.clone();
        let loud = store.register_listener(move |key, _| sink.borrow_mut().push(key));

        *store.overlay_mut(Some(quiet)) += 1;
        flush(&mut store);
        assert_eq!(*heard.borrow(), vec![loud]);

        store.unregister_listener(loud);
        *store.overlay_mut(Some(quiet)) += 1;
        flush(&mut store);
        assert_eq!(heard.borrow().len(), 1);
        assert_eq!(*store.overlay(), 2);
    }

    #[test]
    fn test_fetch_marks_loaded() {
        let mut store: SyncStore<()> = SyncStore::default();
        assert!(!store.loaded_at_least_once());
        store.apply_fetch(Vec::new());
        assert!(store.loaded_at_least_once());
        assert!(store.has_due_notifications());
    }

    fn notification_strategy() -> impl Strategy<Value = Notification> {
        (any::<bool>(), 0u8..6).prop_map(|(added, id)| {
            let book = Book::new(id.to_string(), format!("title {id}"), "someone");
            if added {
                Notification::Added(book)
            } else {
                Notification::Deleted(book)
            }
        })
    }

    proptest! {
        #[test]
        fn prop_log_has_one_entry_per_arrival_newest_first(
            notifications in prop::collection::vec(notification_strategy(), 0..40)
        ) {
            let mut store: SyncStore<()> = SyncStore::default();
            for n in &notifications {
                store.apply(n.clone(), now());
            }

            prop_assert_eq!(store.events().len(), notifications.len());
            let logged: Vec<_> = store.events().iter().map(|e| (e.kind, e.book.clone())).collect();
            let expected: Vec<_> = notifications.iter().rev().map(|n| (n.kind(), n.book().clone())).collect();
            prop_assert_eq!(logged, expected);
        }

        #[test]
        fn prop_delete_leaves_no_row_with_that_id(
            notifications in prop::collection::vec(notification_strategy(), 1..40)
        ) {
            let mut store: SyncStore<()> = SyncStore::default();
            for n in &notifications {
                store.apply(n.clone(), now());
                if let Notification::Deleted(book) = n {
                    prop_assert!(store.books().iter().all(|b| b.id != book.id));
                }
            }
        }

        #[test]
        fn prop_fetch_result_only_depends_on_payload(
            notifications in prop::collection::vec(notification_strategy(), 0..40),
            fetched in prop::collection::vec(0u8..6, 0..10)
        ) {
            let fetched: Vec<Book> = fetched
                .into_iter()
                .map(|id| Book::new(id.to_string(), "t", "a"))
                .collect();

            let mut store: SyncStore<()> = SyncStore::default();
            for n in notifications {
                store.apply(n, now());
            }
            store.apply_fetch(fetched.clone());

            let listed: Vec<Book> = store.books().iter().cloned().collect();
            prop_assert_eq!(listed, fetched);
        }
    }
}
