//! # Sequenced
//! Every inbound notification gets a sequence number when it arrives. Two notifications with identical payloads are still distinct arrivals,
//! and the same arrival observed twice is still one arrival. Change detection compares sequence numbers, never payloads.
//!
//! `LatestSlot` holds the most recent arrival of one kind. It can be peeked any number of times but taken only once per arrival.

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Seq(pub u64);

impl Seq {
    pub(crate) fn next(self) -> Seq {
        Seq(self.0 + 1)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Sequenced<T> {
    pub seq: Seq,
    pub value: T,
}

#[derive(Clone, Debug)]
pub struct LatestSlot<T> {
    latest: Option<Sequenced<T>>,
    consumed: Option<Seq>,
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self {
            latest: None,
            consumed: None,
        }
    }
}

impl<T> LatestSlot<T> {
    /// Overwrites the slot. Arrivals older than the current one are ignored.
    pub fn set(&mut self, seq: Seq, value: T) {
        if self.latest.as_ref().is_some_and(|l| l.seq >= seq) {
            return;
        }
        self.latest = Some(Sequenced { seq, value });
    }

    pub fn peek(&self) -> Option<&Sequenced<T>> {
        self.latest.as_ref()
    }

    /// Returns the latest arrival if nobody has taken it yet.
    pub fn take(&mut self) -> Option<&Sequenced<T>> {
        let latest = self.latest.as_ref()?;
        if self.consumed == Some(latest.seq) {
            return None;
        }
        self.consumed = Some(latest.seq);
        Some(latest)
    }

    pub fn is_pending(&self) -> bool {
        match &self.latest {
            Some(latest) => self.consumed != Some(latest.seq),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_fires_once_per_arrival() {
        let mut slot = LatestSlot::default();
        assert!(slot.take().is_none());

        slot.set(Seq(1), "a");
        assert!(slot.is_pending());
        assert_eq!(slot.take().map(|s| s.value), Some("a"));
        assert!(slot.take().is_none());
        assert_eq!(slot.peek().map(|s| s.value), Some("a"));
    }

    #[test]
    fn test_identical_payloads_are_distinct_arrivals() {
        let mut slot = LatestSlot::default();
        slot.set(Seq(1), "same");
        assert!(slot.take().is_some());
        slot.set(Seq(2), "same");
        assert_eq!(slot.take().map(|s| s.seq), Some(Seq(2)));
    }

    #[test]
    fn test_redelivery_of_same_arrival_is_ignored() {
        let mut slot = LatestSlot::default();
        slot.set(Seq(4), "x");
        assert!(slot.take().is_some());
        slot.set(Seq(4), "x");
        slot.set(Seq(3), "older");
        assert!(!slot.is_pending());
        assert_eq!(slot.peek().map(|s| s.value), Some("x"));
    }
}
