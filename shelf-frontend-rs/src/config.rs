use bookstream::data_model::DuplicatePolicy;
use bookstream::graphql::GatewayConfig;

/// Used when the runtime config carries no token.
const BUILD_AUTH_TOKEN: Option<&str> = option_env!("SHELF_AUTH_TOKEN");

#[derive(Clone, Debug, PartialEq, tsify::Tsify, serde::Serialize, serde::Deserialize)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase", default)]
pub struct ShelfConfig {
    pub http_url: String,
    pub ws_url: String,
    pub auth_token: Option<String>,
    pub page_size: usize,
    pub transient_secs: u32,
    pub duplicate_adds: DuplicatePolicy,
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self {
            http_url: "https://localhost:44332/graphql".to_string(),
            ws_url: "wss://localhost:44332/graphql".to_string(),
            auth_token: None,
            page_size: crate::projection::DEFAULT_PAGE_SIZE,
            transient_secs: 5,
            duplicate_adds: DuplicatePolicy::Keep,
        }
    }
}

/// Knobs the catalog itself cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatalogSettings {
    pub page_size: usize,
    /// How long banners and row highlights stay up.
    pub transient_ttl: chrono::Duration,
    pub duplicate_adds: DuplicatePolicy,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        ShelfConfig::default().catalog_settings()
    }
}

impl ShelfConfig {
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            http_url: self.http_url.clone(),
            ws_url: self.ws_url.clone(),
            auth_token: self
                .auth_token
                .clone()
                .or_else(|| BUILD_AUTH_TOKEN.map(str::to_string)),
        }
    }

    pub fn catalog_settings(&self) -> CatalogSettings {
        CatalogSettings {
            // a zero page size would make every page empty
            page_size: self.page_size.max(1),
            transient_ttl: chrono::Duration::seconds(i64::from(self.transient_secs)),
            duplicate_adds: self.duplicate_adds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let config: ShelfConfig =
            serde_json::from_str(r#"{"authToken":"abc","pageSize":0}"#).unwrap();
        assert_eq!(config.http_url, "https://localhost:44332/graphql");
        assert_eq!(config.gateway_config().bearer().as_deref(), Some("Bearer abc"));

        let settings = config.catalog_settings();
        assert_eq!(settings.page_size, 1);
        assert_eq!(settings.transient_ttl, chrono::Duration::seconds(5));
        assert_eq!(settings.duplicate_adds, DuplicatePolicy::Keep);
    }

    #[test]
    fn test_duplicate_policy_is_configurable() {
        let config: ShelfConfig = serde_json::from_str(r#"{"duplicateAdds":"replace"}"#).unwrap();
        assert_eq!(config.duplicate_adds, DuplicatePolicy::Replace);
    }
}
