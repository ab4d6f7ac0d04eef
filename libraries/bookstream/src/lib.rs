//! This is a library for keeping a locally cached book catalog in step with a remote GraphQL server.
//! It was created for the Shelf front-end, so it doesn't include much that was not needed for that project.
//!
//! Reconciliation strategy:
//! 1. The catalog is loaded once with a bulk fetch. A fetch always replaces the whole list, so re-fetching is safe no matter what happened before.
//! 2. The server pushes "added" and "deleted" notifications over a long-lived subscription. Each one is tagged with a local sequence number as it arrives.
//! 3. Every notification is prepended to an event log (newest first, never shrinks) and then applied to the list exactly once: adds go to the front, deletes filter out every row with that id.
//! 4. Consumers register listeners. Mutations only mark slots dirty; listeners are notified once per batch when the owner drains the due notifications.
//!
//! Edits are not pushed by the server, so callers re-fetch after a successful update.

#[cfg(feature = "graphql")]
pub mod graphql;

pub mod data_model;
pub mod error;
pub mod gateway;

pub use error::GatewayError;
pub use gateway::{Gateway, MemoryGateway};
