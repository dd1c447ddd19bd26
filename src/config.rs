//! Client configuration
//!
//! Connection endpoints, the bearer credential, and the timing knobs for
//! background polling and typing debounce.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Client configuration
///
/// Endpoints and timing parameters for a booking chat session. Can be
/// constructed in code or loaded from a JSON file (missing file yields
/// defaults, as for application settings elsewhere).
///
/// # Example
/// ```rust
/// use rentchat::config::ClientConfig;
///
/// let config = ClientConfig::new("https://api.example.com", "wss://ws.example.com/app/key")
///     .with_bearer_token("secret-token");
///
/// assert_eq!(config.unread_poll_interval_ms, 10_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// REST backend origin (no trailing slash required)
    pub api_base_url: String,
    /// Realtime WebSocket endpoint
    pub ws_url: String,
    /// Bearer credential; absence makes session bootstrap refuse to start
    pub bearer_token: Option<String>,
    /// Fixed interval for the unread-count poll in milliseconds
    pub unread_poll_interval_ms: u64,
    /// Quiet period after which the remote-typing affordance clears, in milliseconds
    pub typing_quiet_period_ms: u64,
    /// Minimum spacing between outbound typing signals while typing continuously, in milliseconds
    pub typing_refresh_interval_ms: u64,
}

impl ClientConfig {
    /// Create a configuration for the given endpoints with default timing
    pub fn new(api_base_url: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ws_url: ws_url.into(),
            ..Self::default()
        }
    }

    /// Attach the bearer credential
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Load configuration from a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// The loaded configuration, or defaults if the file doesn't exist
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        if data.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_json::from_str(&data)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to save the configuration file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, json)
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Update the unread-count poll interval at runtime
    pub fn set_unread_poll_interval_ms(&mut self, interval_ms: u64) {
        self.unread_poll_interval_ms = interval_ms;
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            ws_url: "ws://127.0.0.1:6001/app/rentchat".to_string(),
            bearer_token: None,
            unread_poll_interval_ms: 10_000,
            typing_quiet_period_ms: 3_000,
            typing_refresh_interval_ms: 2_500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timing() {
        let config = ClientConfig::default();
        assert_eq!(config.unread_poll_interval_ms, 10_000);
        assert_eq!(config.typing_quiet_period_ms, 3_000);
        assert_eq!(config.typing_refresh_interval_ms, 2_500);
        assert!(config.bearer_token.is_none());
    }

    #[test]
    fn test_builder_keeps_endpoints() {
        let config = ClientConfig::new("https://api.example.com/", "wss://ws.example.com")
            .with_bearer_token("tok");
        assert_eq!(config.api_base_url, "https://api.example.com/");
        assert_eq!(config.bearer_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_load_nonexistent_file_yields_defaults() {
        let config = ClientConfig::load("/tmp/nonexistent_rentchat_config.json")
            .expect("Should return defaults for nonexistent file");
        assert_eq!(config.unread_poll_interval_ms, 10_000);
    }
}
