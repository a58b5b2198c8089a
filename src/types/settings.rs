use serde::{Deserialize, Serialize};

/// Placeholder credential shipped in the default config. Validation flags it.
pub const PLACEHOLDER_API_KEY: &str = "$2a$10$YOUR_API_KEY_HERE";
/// Placeholder remote resource id shipped in the default config.
pub const PLACEHOLDER_RESOURCE_ID: &str = "YOUR_RESOURCE_ID_HERE";

/// Top-level tracker settings container.
///
/// An injected, static record: the core never mutates it after construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackerSettings {
    pub server: ServerSettings,
    pub local: LocalSettings,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            local: LocalSettings::default(),
        }
    }
}

impl TrackerSettings {
    /// Checks the settings for common misconfigurations.
    ///
    /// Findings are warnings, never fatal: an invalid config disables remote
    /// sync but local counting keeps working.
    pub fn validate(&self) -> ConfigReport {
        let mut errors = Vec::new();

        if self.server.enabled {
            if self.server.api_key.is_empty() || self.server.api_key == PLACEHOLDER_API_KEY {
                errors.push("server API key is not configured".to_string());
            }
            if self.server.resource_id.is_empty()
                || self.server.resource_id == PLACEHOLDER_RESOURCE_ID
            {
                errors.push("server resource id is not configured".to_string());
            }
        }

        if self.server.sync_interval_ms < 60_000 {
            errors.push("sync interval must be at least one minute".to_string());
        }

        ConfigReport {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Remote store connection and scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    pub enabled: bool,
    /// Base URL of the remote key-value store.
    pub endpoint: String,
    pub api_key: String,
    /// Identifier of the shared remote document.
    pub resource_id: String,
    pub sync_interval_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://api.jsonbin.io/v3/b".to_string(),
            api_key: PLACEHOLDER_API_KEY.to_string(),
            resource_id: PLACEHOLDER_RESOURCE_ID.to_string(),
            sync_interval_ms: 2 * 60 * 1000,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl ServerSettings {
    /// True when sync is enabled and both credentials are real values.
    pub fn is_configured(&self) -> bool {
        self.enabled
            && !self.api_key.is_empty()
            && self.api_key != PLACEHOLDER_API_KEY
            && !self.resource_id.is_empty()
            && self.resource_id != PLACEHOLDER_RESOURCE_ID
    }
}

/// Local bookkeeping settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalSettings {
    /// Maximum retained visit-history entries (FIFO eviction beyond this).
    pub max_history_records: usize,
    /// Session inactivity timeout in milliseconds.
    pub session_timeout_ms: i64,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            max_history_records: 100,
            session_timeout_ms: 30 * 60 * 1000,
        }
    }
}

/// Result of a settings validation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}
