//! Logging setup
//!
//! Installs a `tracing` fmt subscriber. `LOOKOUT_LOG` overrides the
//! configured filter directive.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive
pub const LOG_ENV: &str = "LOOKOUT_LOG";

/// Logging section of the configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `LOOKOUT_LOG` is unset
    pub filter: String,
    /// Include the emitting module in each line
    pub with_target: bool,
    /// Use ANSI colors
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "lookout=info".to_string(),
            with_target: false,
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Resolves the effective filter
    pub fn env_filter(&self) -> Result<EnvFilter> {
        match EnvFilter::try_from_env(LOG_ENV) {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.filter)
                .map_err(|e| anyhow!("invalid log filter {:?}: {e}", self.filter)),
        }
    }
}

/// Installs the global subscriber
///
/// Fails instead of panicking when a subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(config.env_filter()?)
        .with_target(config.with_target)
        .with_ansi(config.ansi)
        .try_init()
        .map_err(|e| anyhow!("logging already initialised: {e}"))
}
