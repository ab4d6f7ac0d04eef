//! Filtering and pagination of the list view. Everything here is recomputed from scratch on every render.

use bookstream::data_model::Book;

pub const DEFAULT_PAGE_SIZE: usize = 8;

/// Case-insensitive substring match on title or author. An empty query matches everything.
pub fn matches(book: &Book, query: &str) -> bool {
    let query = query.to_lowercase();
    book.title.to_lowercase().contains(&query) || book.author.to_lowercase().contains(&query)
}

pub fn filter<'a>(books: impl IntoIterator<Item = &'a Book>, query: &str) -> Vec<&'a Book> {
    books.into_iter().filter(|book| matches(book, query)).collect()
}

pub fn page_count(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1))
}

/// The items on 1-based `page`. Pages past the end are empty rather than clamped.
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let page_size = page_size.max(1);
    let start = page.saturating_sub(1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub current: usize,
    pub count: usize,
}

impl Pagination {
    pub fn new(current: usize, filtered_len: usize, page_size: usize) -> Self {
        Self {
            current,
            count: page_count(filtered_len, page_size),
        }
    }

    pub fn previous_disabled(&self) -> bool {
        self.current <= 1
    }

    /// Also disabled when there are no pages at all, or the current page fell off the end after a delete.
    pub fn next_disabled(&self) -> bool {
        self.current >= self.count
    }

    pub fn can_go_to(&self, page: usize) -> bool {
        page >= 1 && page <= self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn books() -> Vec<Book> {
        vec![
            Book::new("1", "Dune", "Frank Herbert"),
            Book::new("2", "Emma", "Jane Austen"),
            Book::new("3", "Persuasion", "Jane Austen"),
        ]
    }

    #[test]
    fn test_filter_matches_title_or_author_ignoring_case() {
        let books = books();
        let ids = |q: &str| -> Vec<String> {
            filter(&books, q)
                .into_iter()
                .map(|b| b.id.to_string())
                .collect()
        };
        assert_eq!(ids("JANE"), vec!["2", "3"]);
        assert_eq!(ids("dUnE"), vec!["1"]);
        assert_eq!(ids("er"), vec!["1", "3"]);
        assert_eq!(ids(""), vec!["1", "2", "3"]);
        assert!(ids("tolkien").is_empty());
        assert!(matches(&books[0], "herb"));
    }

    #[test]
    fn test_page_slice_bounds() {
        let items: Vec<u32> = (0..20).collect();
        assert_eq!(page_slice(&items, 1, 8), &items[0..8]);
        assert_eq!(page_slice(&items, 3, 8), &items[16..20]);
        assert!(page_slice(&items, 4, 8).is_empty());
        assert_eq!(page_slice(&items, 0, 8), &items[0..8]);
    }

    #[test]
    fn test_controls_on_empty_list() {
        let pagination = Pagination::new(1, 0, 8);
        assert_eq!(pagination.count, 0);
        assert!(pagination.previous_disabled());
        assert!(pagination.next_disabled());
        assert!(!pagination.can_go_to(1));
    }

    proptest! {
        #[test]
        fn prop_page_count_is_ceiling(len in 0usize..500) {
            prop_assert_eq!(page_count(len, 8), (len + 7) / 8);
        }

        #[test]
        fn prop_controls_disabled_exactly_at_bounds(
            (len, page) in (1usize..200).prop_flat_map(|len| (Just(len), 1..=page_count(len, 8)))
        ) {
            let pagination = Pagination::new(page, len, 8);
            prop_assert_eq!(pagination.previous_disabled(), page == 1);
            prop_assert_eq!(pagination.next_disabled(), page == pagination.count);
        }

        #[test]
        fn prop_pages_partition_the_list(len in 0usize..100) {
            let items: Vec<usize> = (0..len).collect();
            let count = page_count(len, 8);
            let joined: Vec<usize> = (1..=count)
                .flat_map(|p| page_slice(&items, p, 8).iter().copied())
                .collect();
            prop_assert_eq!(joined, items);
        }
    }
}
