//! Configuration
//!
//! One JSON document with a section per concern. Every field has a default,
//! so `{}` is a valid configuration.

use crate::application::dto::{KeyCacheOptions, RelayOptions, ScanOptions};
use crate::infrastructure::cipher::CipherOptions;
use crate::logging::LoggingConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Semantic problems in an otherwise well-formed configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("scan.max_dimension must be positive")]
    ZeroMaxDimension,

    #[error("scan.text_selector names no tags")]
    EmptySelector,

    #[error("key_cache.ttl_secs must be positive")]
    ZeroTtl,

    #[error("key_cache.storage_key must not be empty")]
    EmptyStorageKey,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookoutConfig {
    pub scan: ScanOptions,
    pub key_cache: KeyCacheOptions,
    pub cipher: CipherOptions,
    pub relay: RelayOptions,
    pub logging: LoggingConfig,
}

impl LookoutConfig {
    /// Parses and validates a JSON document
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).context("failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("invalid configuration in {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.max_dimension == 0 {
            return Err(ConfigError::ZeroMaxDimension);
        }
        if self.scan.selector().tags().is_empty() {
            return Err(ConfigError::EmptySelector);
        }
        if self.key_cache.ttl_secs == 0 {
            return Err(ConfigError::ZeroTtl);
        }
        if self.key_cache.storage_key.is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        Ok(())
    }
}
