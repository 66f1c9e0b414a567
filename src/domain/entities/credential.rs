//! Stored credential entity
//!
//! The single cached secret slot. Field names on the wire match the stored
//! format (`key`, `expiresAt`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A cached secret with an absolute expiry
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    #[serde(rename = "key")]
    pub secret: String,
    #[serde(rename = "expiresAt")]
    pub expires_at_epoch_ms: i64,
}

impl StoredCredential {
    /// Creates a credential expiring `ttl` after `now_ms`
    pub fn new(secret: impl Into<String>, now_ms: i64, ttl: Duration) -> Self {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        Self {
            secret: secret.into(),
            expires_at_epoch_ms: now_ms.saturating_add(ttl_ms),
        }
    }

    /// A credential is expired strictly after its expiry instant
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at_epoch_ms
    }

    /// Returns the time left before expiry, saturating at zero
    pub fn remaining(&self, now_ms: i64) -> Duration {
        remaining_until(self.expires_at_epoch_ms, now_ms)
    }
}

impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredential")
            .field("secret", &"<redacted>")
            .field("expires_at_epoch_ms", &self.expires_at_epoch_ms)
            .finish()
    }
}

/// Milliseconds between `now_ms` and `expires_at_ms`, clamped at zero
pub fn remaining_until(expires_at_ms: i64, now_ms: i64) -> Duration {
    let left = expires_at_ms.saturating_sub(now_ms).max(0);
    Duration::from_millis(left as u64)
}
