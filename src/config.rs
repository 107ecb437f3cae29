//! Codec Configuration
//!
//! Loaded from a JSON file, e.g.:
//!
//! ```json
//! {
//!   "anchor_policy": "enforce",
//!   "max_string_bytes": 1048576
//! }
//! ```
//!
//! Every field is optional; omitted fields take their defaults. The process-wide
//! codec instances use `CodecConfig::default()`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{DecodeLimits, DEFAULT_MAX_STRING_BYTES};

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config is not valid JSON for `CodecConfig`
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Config parsed but holds an unusable value
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// How the position/anchor relationship of a `ColumnWithPosition` is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnchorPolicy {
    /// Records are written and read as given
    #[default]
    Unchecked,
    /// BEFORE / AFTER require an anchor, FIRST / LAST forbid one, on encode and decode
    Enforce,
}

/// Codec configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Anchor validation policy (default: unchecked)
    #[serde(default)]
    pub anchor_policy: AnchorPolicy,

    /// Largest string accepted while decoding (default: 16 MiB)
    #[serde(default = "default_max_string_bytes")]
    pub max_string_bytes: u32,
}

fn default_max_string_bytes() -> u32 {
    DEFAULT_MAX_STRING_BYTES
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            anchor_policy: AnchorPolicy::default(),
            max_string_bytes: default_max_string_bytes(),
        }
    }
}

impl CodecConfig {
    /// Config that validates anchors
    pub fn enforcing() -> Self {
        Self {
            anchor_policy: AnchorPolicy::Enforce,
            ..Self::default()
        }
    }

    /// Parse and validate config JSON
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: CodecConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Reject values no codec can work with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_string_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_string_bytes must be greater than 0".to_string(),
            ));
        }
        if self.max_string_bytes > i32::MAX as u32 {
            return Err(ConfigError::Invalid(format!(
                "max_string_bytes must not exceed {}",
                i32::MAX
            )));
        }
        Ok(())
    }

    /// Decode limits derived from this config
    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits::new(self.max_string_bytes)
    }
}
