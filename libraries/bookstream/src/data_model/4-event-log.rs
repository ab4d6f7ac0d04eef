//! # EventLog
//! The log of every notification observed this session, newest first. It is unbounded and never shrinks.

use crate::data_model::BookEvent;

#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: im::Vector<BookEvent>,
}

impl EventLog {
    pub fn prepend(&mut self, event: BookEvent) {
        self.events.push_front(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BookEvent> {
        self.events.iter()
    }

    /// The `n` most recent events.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &BookEvent> {
        self.events.iter().take(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_model::{Book, BookEventKind};

    fn event(id: &str) -> BookEvent {
        BookEvent {
            kind: BookEventKind::Added,
            book: Book::new(id, "t", "a"),
            time: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_recent_takes_from_the_front() {
        let mut log = EventLog::default();
        for id in ["1", "2", "3", "4", "5", "6", "7"] {
            log.prepend(event(id));
        }
        let recent: Vec<_> = log.recent(5).map(|e| e.book.id.as_str()).collect();
        assert_eq!(recent, vec!["7", "6", "5", "4", "3"]);
        assert_eq!(log.len(), 7);
    }
}
