//! # Client configuration: `notes-client.toml`
//!
//! ```toml
//! [server]
//! base_url = "http://127.0.0.1:8080"
//!
//! [autosave]
//! delay_ms = 2000   # debounce window shared by title, content and folder edits
//! ```
//!
//! | Struct | Purpose |
//! |--------|---------|
//! | [`ClientConfig`] | Top-level config with TOML (de)serialisation and the canonical filename. |
//! | [`ServerConfig`] | Base URL of the notes API. |
//! | [`AutosaveConfig`] | Debounce delay for the autosave controller, default **2 seconds**. |
//!
//! Every section has defaults, so an empty file is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub autosave: AutosaveConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutosaveConfig {
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_delay_ms() -> u64 {
    2000
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
        }
    }
}

impl AutosaveConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl ClientConfig {
    /// Config pointing at `base_url` with default autosave settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            server: ServerConfig {
                base_url: base_url.into(),
            },
            autosave: AutosaveConfig::default(),
        }
    }

    pub fn with_autosave_delay(mut self, delay_ms: u64) -> Self {
        self.autosave.delay_ms = delay_ms;
        self
    }

    pub fn filename() -> &'static str {
        "notes-client.toml"
    }

    pub fn from_toml(s: &str) -> Result<Self, ClientError> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ClientConfig::from_toml("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.autosave.delay(), Duration::from_secs(2));
        assert_eq!(config.server.base_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_partial_config() {
        let config = ClientConfig::from_toml(
            r#"
            [autosave]
            delay_ms = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.autosave.delay_ms, 500);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ClientConfig::new("https://notes.example.com").with_autosave_delay(750);
        let parsed = ClientConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ClientConfig::from_toml("[autosave]\ndelay_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }
}
