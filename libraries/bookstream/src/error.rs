/// Failures reported by a [`crate::Gateway`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The backend rejected the input. Displays as the bare backend message so it can go straight into a banner.
    #[error("{0}")]
    Validation(String),

    /// The request/response channel failed (network, TLS, non-success status).
    #[error("network error: {0}")]
    Transport(String),

    /// The duplex channel failed. Only ever logged.
    #[error("subscription error: {0}")]
    Subscription(String),

    /// The server answered with something we could not make sense of.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Builds a validation error from a list of GraphQL error messages.
    pub fn from_messages<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = messages
            .into_iter()
            .map(|m| m.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("; ");
        if joined.is_empty() {
            GatewayError::Validation("request rejected".to_string())
        } else {
            GatewayError::Validation(joined)
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Decode(e.to_string())
    }
}
