//! Overlay trait
//!
//! Visual markers drawn over images that carried a QR symbol. Styling is
//! outside this crate; the only contract is "show this payload on this
//! image".

use super::document::NodeId;

/// Sink for visual overlay commands
pub trait OverlaySink: Send + Sync {
    /// Installs overlay styling, idempotent
    fn inject_styles(&self);

    /// Marks `image` as carrying `payload`
    fn add_overlay(&self, image: NodeId, payload: &str);

    /// Removes every overlay and the injected styles
    fn remove_all_overlays(&self);
}
