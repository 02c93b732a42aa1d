//! Notary configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no file)
//! yields the standard settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use star_notary_core::DEFAULT_MAX_STORY_BYTES;
use thiserror::Error;

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for the Notary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotaryConfig {
    /// Seconds a wallet has to sign its challenge.
    pub validation_window_secs: u64,

    /// Seconds a validated address may still register a star.
    pub grace_period_secs: u64,

    /// Story limit in bytes of decoded text.
    pub max_story_bytes: usize,

    /// Recompute block hashes on every query and report the result.
    pub verify_on_read: bool,
}

impl Default for NotaryConfig {
    fn default() -> Self {
        Self {
            validation_window_secs: 300,
            grace_period_secs: 30 * 60,
            max_story_bytes: DEFAULT_MAX_STORY_BYTES,
            verify_on_read: true,
        }
    }
}

impl NotaryConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.validation_window_secs == 0 {
            return Err(ConfigError::Invalid(
                "validation_window_secs must be positive".into(),
            ));
        }
        if self.grace_period_secs == 0 {
            return Err(ConfigError::Invalid(
                "grace_period_secs must be positive".into(),
            ));
        }
        if self.max_story_bytes == 0 {
            return Err(ConfigError::Invalid("max_story_bytes must be positive".into()));
        }
        // Timestamps are i64 seconds; larger windows would overflow the arithmetic.
        if self.validation_window_secs > i64::MAX as u64 || self.grace_period_secs > i64::MAX as u64
        {
            return Err(ConfigError::Invalid("window out of range".into()));
        }
        Ok(())
    }
}
