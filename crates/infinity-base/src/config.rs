//! Driver configuration.
//!
//! Every field has a default, so an empty file is a valid configuration.
//! Files ending in `.json` are parsed as JSON, anything else as YAML.

use infinity_hid_protocol::{PRODUCT_BASE, VENDOR_ID};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 20;
pub const DEFAULT_REPLY_TIMEOUT_MS: u64 = 3500;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BaseConfig {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Open this HID path instead of the first device matching the IDs.
    pub path: Option<String>,
    /// How long the reader thread blocks in one read before re-checking for shutdown.
    pub poll_interval_ms: u64,
    /// How long a tag query waits for its reply.
    pub reply_timeout_ms: u64,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            vendor_id: VENDOR_ID,
            product_id: PRODUCT_BASE,
            path: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            reply_timeout_ms: DEFAULT_REPLY_TIMEOUT_MS,
        }
    }
}

impl BaseConfig {
    /// # Errors
    /// Returns [`ConfigError::Yaml`] on malformed input and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_yaml_str(input: &str) -> Result<Self, ConfigError> {
        // serde_yaml rejects an empty document, but an empty file means "all defaults"
        let config = if input.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(input)?
        };
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns [`ConfigError::Json`] on malformed input and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML or JSON file, chosen by extension.
    ///
    /// # Errors
    /// Fails when the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&input)
        } else {
            Self::from_yaml_str(&input)
        }
    }

    /// # Errors
    /// Returns [`ConfigError::Invalid`] for zero timeouts or an empty path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.reply_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "reply_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.path.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid("path must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}
