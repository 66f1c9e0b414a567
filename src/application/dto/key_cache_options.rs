//! Key cache options DTO

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Storage slot holding the cached credential
pub const DEFAULT_STORAGE_KEY: &str = "ov_enc_key";

/// Options for the ephemeral key cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyCacheOptions {
    /// Lifetime of a saved key, in seconds
    pub ttl_secs: u64,
    /// Storage key of the credential slot
    pub storage_key: String,
    /// Countdown tick period, in milliseconds
    pub countdown_period_ms: u64,
}

impl Default for KeyCacheOptions {
    fn default() -> Self {
        Self {
            ttl_secs: 30 * 60,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            countdown_period_ms: 1_000,
        }
    }
}

impl KeyCacheOptions {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn countdown_period(&self) -> Duration {
        Duration::from_millis(self.countdown_period_ms.max(1))
    }

    /// Sets the key lifetime
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = ttl.as_secs();
        self
    }
}
