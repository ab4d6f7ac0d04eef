#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Endpoint for queries and mutations.
    pub http_url: String,
    /// Endpoint for subscriptions.
    pub ws_url: String,
    /// Passed through as a bearer token. The server decides what it means.
    pub auth_token: Option<String>,
}

impl GatewayConfig {
    /// The `Authorization` value, if a non-empty token is configured.
    pub fn bearer(&self) -> Option<String> {
        self.auth_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| format!("Bearer {t}"))
    }
}
