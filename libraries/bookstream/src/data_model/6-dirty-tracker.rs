//! # DirtyTracker
//! A DirtyTracker wraps one slot of the store (the list, the log, the overlay) and remembers whether it changed since listeners were last notified.
//! Several mutations between two flushes collapse into a single notification per listener.

use std::ops::{Deref, DerefMut};

use crate::data_model::ListenerKey;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DirtyState {
    /// Not dirty, no pending notifications
    Clean,
    /// Dirty, notify all listeners except the specified one
    DirtyExcept(ListenerKey),
    /// Dirty, notify all listeners
    DirtyAll,
}

#[derive(Clone, Debug)]
pub struct DirtyTracker<Slot> {
    slot: Slot,
    /// Tracks whether there are pending notifications and who should be notified
    pub dirty_state: DirtyState,
    loaded_at_least_once: bool,
}

impl<Slot: Default> Default for DirtyTracker<Slot> {
    fn default() -> Self {
        Self::new(Slot::default())
    }
}

/// Smart pointer that marks the slot as dirty when dereferenced mutably
pub struct DirtyOnDerefMut<'a, Slot> {
    slot: &'a mut Slot,
    dirty_state: &'a mut DirtyState,
    modifier: Option<ListenerKey>,
}

impl<Slot> Deref for DirtyOnDerefMut<'_, Slot> {
    type Target = Slot;

    fn deref(&self) -> &Self::Target {
        self.slot
    }
}

impl<Slot> DerefMut for DirtyOnDerefMut<'_, Slot> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.mark_dirty();
        self.slot
    }
}

impl<Slot> DirtyOnDerefMut<'_, Slot> {
    fn mark_dirty(&mut self) {
        use DirtyState::*;
        *self.dirty_state = match (&self.dirty_state, self.modifier) {
            (Clean, Some(key)) => DirtyExcept(key),
            (DirtyExcept(key1), Some(key2)) if key1 == &key2 => DirtyExcept(*key1),
            (Clean, None) => DirtyAll,
            (DirtyExcept(_), _) | (DirtyAll, _) => DirtyAll,
        };
    }
}

impl<Slot> DirtyTracker<Slot> {
    pub fn new(slot: Slot) -> Self {
        Self {
            slot,
            dirty_state: DirtyState::Clean,
            loaded_at_least_once: false,
        }
    }

    /// Returns true if the `loaded` marker was changed
    pub(crate) fn mark_loaded(&mut self, modifier: Option<ListenerKey>) -> bool {
        if !self.loaded_at_least_once {
            self.loaded_at_least_once = true;
            self.slot_mut(modifier).mark_dirty();
            true
        } else {
            false
        }
    }

    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    pub(crate) fn slot_mut(&mut self, modifier: Option<ListenerKey>) -> DirtyOnDerefMut<'_, Slot> {
        DirtyOnDerefMut {
            slot: &mut self.slot,
            dirty_state: &mut self.dirty_state,
            modifier,
        }
    }

    pub fn loaded_at_least_once(&self) -> bool {
        self.loaded_at_least_once
    }

    /// Resets to clean and returns what the state was.
    pub(crate) fn take_dirty(&mut self) -> DirtyState {
        std::mem::replace(&mut self.dirty_state, DirtyState::Clean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_keys() -> (ListenerKey, ListenerKey) {
        let mut map: slotmap::SlotMap<slotmap::DefaultKey, ()> = slotmap::SlotMap::new();
        (ListenerKey(map.insert(())), ListenerKey(map.insert(())))
    }

    #[test]
    fn test_reading_does_not_mark_dirty() {
        let mut tracker = DirtyTracker::new(vec![1]);
        let view = tracker.slot_mut(None);
        assert_eq!(view.len(), 1);
        drop(view);
        assert_eq!(tracker.dirty_state, DirtyState::Clean);
    }

    #[test]
    fn test_single_modifier_is_excluded() {
        let (k, _) = two_keys();
        let mut tracker = DirtyTracker::new(vec![1]);
        tracker.slot_mut(Some(k)).push(2);
        tracker.slot_mut(Some(k)).push(3);
        assert_eq!(tracker.dirty_state, DirtyState::DirtyExcept(k));
    }

    #[test]
    fn test_mixed_modifiers_notify_everyone() {
        let (a, b) = two_keys();
        let mut tracker = DirtyTracker::new(vec![1]);
        tracker.slot_mut(Some(a)).push(2);
        tracker.slot_mut(Some(b)).push(3);
        assert_eq!(tracker.dirty_state, DirtyState::DirtyAll);
        assert_eq!(tracker.take_dirty(), DirtyState::DirtyAll);
        assert_eq!(tracker.dirty_state, DirtyState::Clean);
    }

    #[test]
    fn test_mark_loaded_only_once() {
        let mut tracker = DirtyTracker::new(());
        assert!(tracker.mark_loaded(None));
        assert!(!tracker.mark_loaded(None));
        assert!(tracker.loaded_at_least_once());
    }
}
