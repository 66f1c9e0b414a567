//! Relay options DTO

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options for the privileged relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayOptions {
    /// Network timeout for image fetches, in seconds
    pub fetch_timeout_secs: u64,
    /// Media type used when a server omits `Content-Type`
    pub default_content_type: String,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 15,
            default_content_type: "image/png".to_string(),
        }
    }
}

impl RelayOptions {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
