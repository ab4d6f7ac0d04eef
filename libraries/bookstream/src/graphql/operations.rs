use serde::{Deserialize, Serialize};

use crate::GatewayError;
use crate::data_model::{Book, BookId, Notification};

pub const GET_BOOKS: &str = r#"
query {
  books {
    id
    title
    author
  }
}
"#;

pub const ADD_BOOK: &str = r#"
mutation AddBook($title: String!, $author: String!) {
  addBook(title: $title, author: $author) {
    id
    title
    author
  }
}
"#;

pub const UPDATE_BOOK: &str = r#"
mutation UpdateBook($id: UUID!, $title: String, $author: String) {
  updateBook(id: $id, title: $title, author: $author) {
    id
    title
    author
  }
}
"#;

pub const DELETE_BOOK: &str = r#"
mutation DeleteBook($id: UUID!) {
  deleteBook(id: $id)
}
"#;

pub const BOOK_ADDED_SUB: &str = r#"
subscription {
  bookAdded {
    id
    title
    author
    createdTime
  }
}
"#;

pub const BOOK_DELETED_SUB: &str = r#"
subscription {
  bookDeleted {
    id
    title
    author
    createdTime
  }
}
"#;

/// Which channel an operation belongs on. Subscriptions use the duplex channel, everything else request/response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    /// Classifies a document by its first operation keyword. A bare selection set (`{ ... }`) is a query.
    pub fn of(document: &str) -> Option<OperationKind> {
        let mut rest = document;
        loop {
            rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
            match rest.strip_prefix('#') {
                Some(comment) => {
                    rest = comment.split_once('\n').map(|(_, tail)| tail).unwrap_or("");
                }
                None => break,
            }
        }

        if rest.starts_with('{') {
            return Some(OperationKind::Query);
        }
        let keyword: String = rest
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        match keyword.as_str() {
            "query" => Some(OperationKind::Query),
            "mutation" => Some(OperationKind::Mutation),
            "subscription" => Some(OperationKind::Subscription),
            _ => None,
        }
    }

    pub fn uses_duplex_channel(&self) -> bool {
        matches!(self, OperationKind::Subscription)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Request<'a, V> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<V>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Response<D> {
    pub data: Option<D>,
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub message: String,
}

impl<D> Response<D> {
    /// Errors win over data: a partial result is still a rejected request.
    pub fn into_result(self) -> Result<D, GatewayError> {
        if !self.errors.is_empty() {
            return Err(GatewayError::from_messages(
                self.errors.iter().map(|e| e.message.as_str()),
            ));
        }
        self.data.ok_or_else(|| {
            GatewayError::Decode("response carried neither data nor errors".to_string())
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct AddBookVariables<'a> {
    pub title: &'a str,
    pub author: &'a str,
}

#[derive(Clone, Debug, Serialize)]
pub struct UpdateBookVariables<'a> {
    pub id: &'a BookId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<&'a str>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DeleteBookVariables<'a> {
    pub id: &'a BookId,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BooksData {
    pub books: Vec<Book>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBookData {
    pub add_book: Book,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookData {
    pub update_book: Book,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBookData {
    pub delete_book: bool,
}

/// The two live feeds the catalog listens to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    BookAdded,
    BookDeleted,
}

impl Topic {
    pub const ALL: [Topic; 2] = [Topic::BookAdded, Topic::BookDeleted];

    pub fn document(&self) -> &'static str {
        match self {
            Topic::BookAdded => BOOK_ADDED_SUB,
            Topic::BookDeleted => BOOK_DELETED_SUB,
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Topic::BookAdded => "bookAdded",
            Topic::BookDeleted => "bookDeleted",
        }
    }

    /// Pulls the book out of a `next` payload's `data` object.
    pub fn decode(&self, data: &serde_json::Value) -> Result<Notification, GatewayError> {
        let book = data.get(self.field()).ok_or_else(|| {
            GatewayError::Decode(format!("subscription payload is missing `{}`", self.field()))
        })?;
        let book = Book::deserialize(book)?;
        Ok(match self {
            Topic::BookAdded => Notification::Added(book),
            Topic::BookDeleted => Notification::Deleted(book),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_document_is_classified() {
        assert_eq!(OperationKind::of(GET_BOOKS), Some(OperationKind::Query));
        assert_eq!(OperationKind::of(ADD_BOOK), Some(OperationKind::Mutation));
        assert_eq!(OperationKind::of(UPDATE_BOOK), Some(OperationKind::Mutation));
        assert_eq!(OperationKind::of(DELETE_BOOK), Some(OperationKind::Mutation));
        for topic in Topic::ALL {
            let kind = OperationKind::of(topic.document()).unwrap();
            assert!(kind.uses_duplex_channel());
        }
    }

    #[test]
    fn test_classification_edge_cases() {
        assert_eq!(OperationKind::of("{ books { id } }"), Some(OperationKind::Query));
        assert_eq!(
            OperationKind::of("# live feed\n  subscription { bookAdded { id } }"),
            Some(OperationKind::Subscription)
        );
        assert_eq!(OperationKind::of("fragment F on Book { id }"), None);
        assert_eq!(OperationKind::of(""), None);
    }

    #[test]
    fn test_errors_take_precedence_over_data() {
        let response: Response<BooksData> = serde_json::from_value(serde_json::json!({
            "data": { "books": [] },
            "errors": [{ "message": "author required", "path": ["addBook"] }]
        }))
        .unwrap();
        assert_eq!(
            response.into_result().unwrap_err(),
            GatewayError::Validation("author required".to_string())
        );
    }

    #[test]
    fn test_empty_response_is_a_decode_error() {
        let response: Response<BooksData> = serde_json::from_str(r#"{"data":null}"#).unwrap();
        assert!(matches!(
            response.into_result(),
            Err(GatewayError::Decode(_))
        ));
    }

    #[test]
    fn test_update_omits_unset_fields() {
        let id = BookId::from("b-1");
        let request = Request {
            query: UPDATE_BOOK,
            variables: Some(UpdateBookVariables {
                id: &id,
                title: Some("New"),
                author: None,
            }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json["variables"],
            serde_json::json!({ "id": "b-1", "title": "New" })
        );
    }

    #[test]
    fn test_topic_decode() {
        let data = serde_json::json!({
            "bookDeleted": { "id": "7", "title": "T", "author": "A", "createdTime": "2025-01-01T00:00:00Z" }
        });
        let notification = Topic::BookDeleted.decode(&data).unwrap();
        assert_eq!(notification.book().id.as_str(), "7");
        assert!(matches!(notification, Notification::Deleted(_)));

        assert!(Topic::BookAdded.decode(&data).is_err());
    }
}
