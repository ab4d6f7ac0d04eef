//! GraphQL wiring for the catalog server.
//!
//! Queries and mutations go over HTTP. Subscriptions go over a WebSocket speaking `graphql-transport-ws`;
//! this crate only implements the protocol state machine, the socket itself belongs to the host.

mod config;
mod http;
mod operations;
mod protocol;

pub use config::GatewayConfig;
pub use http::GraphqlGateway;
pub use operations::*;
pub use protocol::*;
