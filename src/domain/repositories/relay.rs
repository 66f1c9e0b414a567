//! Relay client trait
//!
//! What the scan context needs from the privileged relay: out-of-band image
//! fetches and badge updates.

use async_trait::async_trait;

/// Client side of the privileged relay
///
/// Both calls are best-effort. A missing relay yields `None` or is ignored,
/// never an error.
#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Fetches an image bypassing same-origin rules, as a `data:` URL
    async fn fetch_image(&self, url: &str) -> Option<String>;

    /// Reports the current finding count (fire-and-forget)
    fn update_badge(&self, count: usize);
}
