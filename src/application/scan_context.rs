//! Scan context service
//!
//! The page-side host of a [`ScanEngine`]. Answers `TOGGLE_SCANNING` and
//! `GET_RESULTS` from the control surface and honours the persisted
//! auto-scan flag when it attaches to a page.

use crate::application::scan_engine::ScanEngine;
use crate::domain::entities::{Reply, Request, ScanSnapshot, TabId};
use crate::domain::repositories::{KeyValueStore, RequestHandler};
use async_trait::async_trait;

/// Storage flag that starts scanning on every new page
pub const AUTO_SCAN_FLAG: &str = "autoScanEnabled";

pub struct ScanContext {
    engine: ScanEngine,
}

impl ScanContext {
    pub fn new(engine: ScanEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ScanEngine {
        &self.engine
    }

    /// Enables scanning when the auto-scan flag is set
    ///
    /// Returns whether scanning was started. An unreadable flag counts as
    /// unset.
    pub async fn attach(&self, store: &dyn KeyValueStore) -> bool {
        let auto = store.get_flag(AUTO_SCAN_FLAG).unwrap_or_else(|e| {
            tracing::warn!("cannot read {AUTO_SCAN_FLAG}: {e}");
            false
        });
        if auto {
            self.engine.enable().await;
        }
        auto
    }

    async fn toggle(&self, enabled: bool) -> ScanSnapshot {
        if enabled {
            self.engine.enable().await
        } else {
            self.engine.disable()
        }
    }
}

#[async_trait]
impl RequestHandler for ScanContext {
    async fn handle(&self, request: Request, _sender: Option<TabId>) -> Option<Reply> {
        match request {
            Request::ToggleScanning { enabled } => Some(Reply::Snapshot(self.toggle(enabled).await)),
            Request::GetResults => Some(Reply::Snapshot(self.engine.snapshot())),
            Request::FetchImage { .. } | Request::UpdateBadge { .. } => None,
        }
    }
}
