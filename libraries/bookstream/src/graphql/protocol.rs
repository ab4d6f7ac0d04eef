//! The client half of `graphql-transport-ws`.
//!
//! The session is a plain state machine: the host feeds it socket events and sends whatever it replies with.
//! That keeps the protocol testable without a socket.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::GatewayError;
use crate::data_model::Notification;
use crate::graphql::{ErrorEntry, GatewayConfig, Topic};

pub const SUBPROTOCOL: &str = "graphql-transport-ws";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    ConnectionInit {
        #[serde(skip_serializing_if = "Option::is_none")]
        payload: Option<serde_json::Value>,
    },
    Ping {
        #[serde(skip_serializing_if = "Option::is_none")]
        payload: Option<serde_json::Value>,
    },
    Pong {
        #[serde(skip_serializing_if = "Option::is_none")]
        payload: Option<serde_json::Value>,
    },
    Subscribe {
        id: String,
        payload: SubscribePayload,
    },
    Complete {
        id: String,
    },
}

impl ClientMessage {
    pub fn to_text(&self) -> Result<String, GatewayError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubscribePayload {
    pub query: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    ConnectionAck {
        #[serde(default)]
        payload: Option<serde_json::Value>,
    },
    Ping {
        #[serde(default)]
        payload: Option<serde_json::Value>,
    },
    Pong {
        #[serde(default)]
        payload: Option<serde_json::Value>,
    },
    Next {
        id: String,
        payload: ExecutionResult,
    },
    Error {
        id: String,
        #[serde(default)]
        payload: Vec<ErrorEntry>,
    },
    Complete {
        id: String,
    },
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ExecutionResult {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Socket opened, waiting for `connection_ack`.
    Connecting,
    /// Acknowledged and subscribed.
    Live,
    Closed,
}

/// What the host should do after feeding the session one frame.
#[derive(Debug, Default)]
pub struct SessionOutput {
    /// Frames to send back, in order.
    pub replies: Vec<ClientMessage>,
    pub notifications: Vec<Notification>,
    /// Problems worth logging. None of them end the session by themselves.
    pub errors: Vec<GatewayError>,
}

#[derive(Debug)]
pub struct SubscriptionSession {
    bearer: Option<String>,
    state: SessionState,
    active: HashMap<String, Topic>,
    next_id: u64,
}

impl SubscriptionSession {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            bearer: config.bearer(),
            state: SessionState::Connecting,
            active: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn active_topics(&self) -> impl Iterator<Item = &Topic> {
        self.active.values()
    }

    /// The first frame to send once the socket is open.
    pub fn on_open(&mut self) -> ClientMessage {
        self.state = SessionState::Connecting;
        self.active.clear();
        let payload = self
            .bearer
            .as_ref()
            .map(|bearer| serde_json::json!({ "Authorization": bearer }));
        ClientMessage::ConnectionInit { payload }
    }

    pub fn on_text(&mut self, text: &str) -> SessionOutput {
        let mut output = SessionOutput::default();
        let message = match serde_json::from_str::<ServerMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                output
                    .errors
                    .push(GatewayError::Subscription(format!("unreadable frame: {e}")));
                return output;
            }
        };

        match message {
            ServerMessage::ConnectionAck { .. } => {
                if self.state == SessionState::Live {
                    log::warn!("Duplicate connection_ack ignored");
                    return output;
                }
                self.state = SessionState::Live;
                for topic in Topic::ALL {
                    self.next_id += 1;
                    let id = self.next_id.to_string();
                    self.active.insert(id.clone(), topic);
                    output.replies.push(ClientMessage::Subscribe {
                        id,
                        payload: SubscribePayload {
                            query: topic.document().to_string(),
                        },
                    });
                }
            }
            ServerMessage::Ping { .. } => {
                output.replies.push(ClientMessage::Pong { payload: None });
            }
            ServerMessage::Pong { .. } => {}
            ServerMessage::Next { id, payload } => {
                let Some(topic) = self.active.get(&id) else {
                    log::warn!("Dropping result for unknown subscription {id}");
                    return output;
                };
                if !payload.errors.is_empty() {
                    output.errors.push(GatewayError::Subscription(
                        GatewayError::from_messages(payload.errors.iter().map(|e| &e.message))
                            .to_string(),
                    ));
                }
                if let Some(data) = payload.data {
                    match topic.decode(&data) {
                        Ok(notification) => output.notifications.push(notification),
                        Err(e) => output.errors.push(e),
                    }
                }
            }
            ServerMessage::Error { id, payload } => {
                let topic = self
                    .active
                    .remove(&id)
                    .map(|t| t.field())
                    .unwrap_or("unknown subscription");
                output.errors.push(GatewayError::Subscription(format!(
                    "{topic} rejected: {}",
                    GatewayError::from_messages(payload.iter().map(|e| &e.message))
                )));
            }
            ServerMessage::Complete { id } => {
                if let Some(topic) = self.active.remove(&id) {
                    log::info!("Server completed the {topic:?} subscription");
                }
            }
        }
        output
    }

    /// Live updates stop here; nothing reconnects.
    pub fn on_close(&mut self, code: u16, reason: &str) -> GatewayError {
        self.state = SessionState::Closed;
        self.active.clear();
        GatewayError::Subscription(format!("socket closed ({code}) {reason}"))
    }
}
