//! Control surface
//!
//! The popup: toggles scanning on the active tab, shows its snapshot, and
//! decodes uploaded images locally. Calls to a tab that does not exist or
//! no longer answers are no-ops.

use super::finding_view::FindingView;
use crate::domain::entities::{Request, ScanSnapshot};
use crate::domain::repositories::{Clipboard, ClipboardError, KeyValueStore, request_or_swallow};
use crate::domain::services::decode_qr;
use crate::domain::services::raster::extract_from_bytes;
use crate::application::AUTO_SCAN_FLAG;
use crate::infrastructure::messaging::TabRegistry;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Interval between snapshot refreshes while scanning is on
pub const POLL_PERIOD: Duration = Duration::from_secs(2);

#[derive(Default)]
struct SurfaceState {
    enabled: bool,
    snapshot: ScanSnapshot,
    poller: Option<JoinHandle<()>>,
}

struct SurfaceInner {
    tabs: Arc<TabRegistry>,
    store: Arc<dyn KeyValueStore>,
    clipboard: Arc<dyn Clipboard>,
    max_dimension: u32,
    poll_period: Duration,
    state: Mutex<SurfaceState>,
}

/// Popup state and commands
pub struct ControlSurface {
    inner: Arc<SurfaceInner>,
}

impl ControlSurface {
    pub fn new(
        tabs: Arc<TabRegistry>,
        store: Arc<dyn KeyValueStore>,
        clipboard: Arc<dyn Clipboard>,
        max_dimension: u32,
    ) -> Self {
        Self {
            inner: Arc::new(SurfaceInner {
                tabs,
                store,
                clipboard,
                max_dimension,
                poll_period: POLL_PERIOD,
                state: Mutex::new(SurfaceState::default()),
            }),
        }
    }

    /// Loads the persisted toggle and the active tab's snapshot
    pub async fn open(&self) {
        let enabled = self.inner.store.get_flag(AUTO_SCAN_FLAG).unwrap_or_else(|e| {
            tracing::warn!("cannot read {AUTO_SCAN_FLAG}: {e}");
            false
        });
        self.inner.state.lock().enabled = enabled;

        refresh(&self.inner).await;
        if enabled {
            self.start_polling();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.state.lock().enabled
    }

    pub fn is_polling(&self) -> bool {
        self.inner
            .state
            .lock()
            .poller
            .as_ref()
            .is_some_and(|p| !p.is_finished())
    }

    /// Last snapshot received from the active tab
    pub fn snapshot(&self) -> ScanSnapshot {
        self.inner.state.lock().snapshot.clone()
    }

    /// Display models of every finding, QR first
    pub fn findings(&self, envelope_overhead: usize) -> Vec<FindingView> {
        let state = self.inner.state.lock();
        let qr = state
            .snapshot
            .qr_findings
            .iter()
            .map(|f| FindingView::from_qr(f, envelope_overhead));
        let text = state
            .snapshot
            .text_findings
            .iter()
            .map(|f| FindingView::from_text(f, envelope_overhead));
        qr.chain(text).collect()
    }

    /// Persists the toggle and forwards it to the active tab
    pub async fn set_scanning(&self, enabled: bool) {
        self.inner.state.lock().enabled = enabled;
        if let Err(e) = self.inner.store.set(AUTO_SCAN_FLAG, Value::Bool(enabled)) {
            tracing::warn!("cannot persist {AUTO_SCAN_FLAG}: {e}");
        }

        if enabled {
            self.start_polling();
        } else {
            self.stop_polling();
        }

        let Some((tab, port)) = self.inner.tabs.active() else {
            tracing::debug!("no active tab to toggle");
            return;
        };
        let reply: Option<ScanSnapshot> =
            request_or_swallow(port.as_ref(), &Request::ToggleScanning { enabled }).await;
        if let Some(snapshot) = reply {
            tracing::debug!("{tab}: {}", snapshot.summary());
            self.inner.state.lock().snapshot = snapshot;
        }
    }

    /// Re-queries the active tab; `None` when nobody answered
    pub async fn refresh(&self) -> Option<ScanSnapshot> {
        refresh(&self.inner).await
    }

    /// Decodes a QR symbol from uploaded image bytes
    pub async fn decode_upload(&self, bytes: Vec<u8>) -> Option<String> {
        let max = self.inner.max_dimension;
        tokio::task::spawn_blocking(move || {
            let pixels = extract_from_bytes(&bytes, max)?;
            decode_qr(&pixels)
        })
        .await
        .ok()
        .flatten()
    }

    pub fn copy_to_clipboard(&self, text: &str) -> Result<(), ClipboardError> {
        self.inner.clipboard.write_text(text)
    }

    /// Stops background polling; the popup closed
    pub fn close(&self) {
        self.stop_polling();
    }

    fn start_polling(&self) {
        let mut state = self.inner.state.lock();
        if state.poller.as_ref().is_some_and(|p| !p.is_finished()) {
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        state.poller = Some(tokio::spawn(poll(weak, self.inner.poll_period)));
    }

    fn stop_polling(&self) {
        if let Some(poller) = self.inner.state.lock().poller.take() {
            poller.abort();
        }
    }
}

impl Drop for ControlSurface {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

async fn refresh(inner: &SurfaceInner) -> Option<ScanSnapshot> {
    let (_, port) = inner.tabs.active()?;
    let snapshot: ScanSnapshot = request_or_swallow(port.as_ref(), &Request::GetResults).await?;
    inner.state.lock().snapshot = snapshot.clone();
    Some(snapshot)
}

async fn poll(surface: Weak<SurfaceInner>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await;
    loop {
        interval.tick().await;
        let Some(inner) = surface.upgrade() else {
            break;
        };
        if !inner.state.lock().enabled {
            break;
        }
        refresh(&inner).await;
    }
}
