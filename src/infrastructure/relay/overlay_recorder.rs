//! Overlay ledger
//!
//! Records overlay commands instead of drawing them. Hosts that render
//! overlays read the ledger; tests assert on it.

use crate::domain::repositories::{NodeId, OverlaySink};
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Ledger {
    styles_injected: bool,
    overlays: Vec<(NodeId, String)>,
}

/// Overlay sink that keeps every active overlay in memory
#[derive(Debug, Default)]
pub struct OverlayRecorder {
    ledger: Mutex<Ledger>,
}

impl OverlayRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn styles_injected(&self) -> bool {
        self.ledger.lock().styles_injected
    }

    /// Active overlays in the order they were added
    pub fn overlays(&self) -> Vec<(NodeId, String)> {
        self.ledger.lock().overlays.clone()
    }

    pub fn has_overlay(&self, image: NodeId) -> bool {
        self.ledger.lock().overlays.iter().any(|(id, _)| *id == image)
    }
}

impl OverlaySink for OverlayRecorder {
    fn inject_styles(&self) {
        self.ledger.lock().styles_injected = true;
    }

    fn add_overlay(&self, image: NodeId, payload: &str) {
        let mut ledger = self.ledger.lock();
        if ledger.overlays.iter().any(|(id, _)| *id == image) {
            return;
        }
        ledger.overlays.push((image, payload.to_string()));
    }

    fn remove_all_overlays(&self) {
        let mut ledger = self.ledger.lock();
        ledger.overlays.clear();
        ledger.styles_injected = false;
    }
}
