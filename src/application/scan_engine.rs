//! Scan engine
//!
//! Runs both detectors over a live document and keeps the findings.
//!
//! Lifecycle: `Disabled -> Sweeping -> Observing -> Disabled`.
//!
//! - Enabling injects overlay styles, subscribes to document events and
//!   sweeps every current image and leaf text element.
//! - Once the sweep's decodes have settled the engine starts reacting to
//!   mutation batches.
//! - Disabling drops everything. Work already in flight still finishes, but
//!   its results are tagged with a stale epoch and discarded.
//!
//! Images and text elements are marked seen when they are scheduled or
//! visited, not when their result arrives, so a burst of duplicate events
//! can never schedule the same node twice.

use crate::application::dto::ScanOptions;
use crate::application::raster_extractor::RasterExtractor;
use crate::domain::entities::{QrFinding, ScanSnapshot, TextFinding, fingerprint};
use crate::domain::repositories::{
    Document, DocumentEvent, EventSink, EventStream, MutationBatch, NodeId, NodeKind, ObserverId,
    OverlaySink, RelayClient, TagSelector,
};
use crate::domain::services::{TextClassifier, decode_qr};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Disabled,
    /// Initial full-document pass in progress
    Sweeping,
    /// Reacting to structural changes
    Observing,
}

/// Document event subscription held while enabled
struct Subscription {
    observer: ObserverId,
    delivered: Arc<AtomicU64>,
    processed: Arc<AtomicU64>,
    pump: JoinHandle<()>,
}

struct EngineState {
    phase: EnginePhase,
    /// Bumped on every disable; work tagged with an older epoch is dropped
    epoch: u64,
    scan_in_flight: bool,
    qr_findings: Vec<QrFinding>,
    text_findings: Vec<TextFinding>,
    seen_images: HashSet<NodeId>,
    seen_text: HashSet<NodeId>,
    /// Images waiting for their one-shot load notification
    pending_loads: HashSet<NodeId>,
    images_examined: usize,
    text_nodes_examined: usize,
    subscription: Option<Subscription>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            phase: EnginePhase::Disabled,
            epoch: 0,
            scan_in_flight: false,
            qr_findings: Vec::new(),
            text_findings: Vec::new(),
            seen_images: HashSet::new(),
            seen_text: HashSet::new(),
            pending_loads: HashSet::new(),
            images_examined: 0,
            text_nodes_examined: 0,
            subscription: None,
        }
    }

    fn is_live(&self, epoch: u64) -> bool {
        self.epoch == epoch && self.phase != EnginePhase::Disabled
    }

    fn total_findings(&self) -> usize {
        self.qr_findings.len() + self.text_findings.len()
    }

    fn snapshot(&self) -> ScanSnapshot {
        ScanSnapshot {
            qr_findings: self.qr_findings.clone(),
            text_findings: self.text_findings.clone(),
            images_examined: self.images_examined,
            text_nodes_examined: self.text_nodes_examined,
            scan_in_flight: self.scan_in_flight,
        }
    }

    /// Clears findings and dedup sets, returning the old subscription
    fn reset(&mut self) -> Option<Subscription> {
        self.epoch += 1;
        self.phase = EnginePhase::Disabled;
        self.scan_in_flight = false;
        self.qr_findings.clear();
        self.text_findings.clear();
        self.seen_images.clear();
        self.seen_text.clear();
        self.pending_loads.clear();
        self.images_examined = 0;
        self.text_nodes_examined = 0;
        self.subscription.take()
    }
}

struct EngineInner {
    document: Arc<dyn Document>,
    extractor: RasterExtractor,
    relay: Arc<dyn RelayClient>,
    overlays: Arc<dyn OverlaySink>,
    classifier: TextClassifier,
    selector: TagSelector,
    min_image_side: u32,
    state: Mutex<EngineState>,
    /// Decodes started outside the sweep (mutations, load events)
    background: Mutex<Vec<JoinHandle<()>>>,
    progress: Notify,
}

/// Incremental QR and ciphertext scanner for one document
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ScanEngine {
    inner: Arc<EngineInner>,
}

impl ScanEngine {
    pub fn new(
        document: Arc<dyn Document>,
        relay: Arc<dyn RelayClient>,
        overlays: Arc<dyn OverlaySink>,
        options: &ScanOptions,
    ) -> Self {
        let extractor = RasterExtractor::new(
            Arc::clone(&document),
            Arc::clone(&relay),
            options.max_dimension,
        );
        Self {
            inner: Arc::new(EngineInner {
                document,
                extractor,
                relay,
                overlays,
                classifier: options.classifier(),
                selector: options.selector(),
                min_image_side: options.min_image_side,
                state: Mutex::new(EngineState::new()),
                background: Mutex::new(Vec::new()),
                progress: Notify::new(),
            }),
        }
    }

    pub fn phase(&self) -> EnginePhase {
        self.inner.state.lock().phase
    }

    pub fn is_enabled(&self) -> bool {
        self.phase() != EnginePhase::Disabled
    }

    /// Point-in-time copy of the results
    pub fn snapshot(&self) -> ScanSnapshot {
        self.inner.state.lock().snapshot()
    }

    /// Enables scanning and runs the initial sweep
    ///
    /// Returns once every decode scheduled by the sweep has settled. Calling
    /// it while already enabled only returns the current snapshot.
    pub async fn enable(&self) -> ScanSnapshot {
        let epoch = {
            let mut state = self.inner.state.lock();
            if state.phase != EnginePhase::Disabled {
                return state.snapshot();
            }
            state.phase = EnginePhase::Sweeping;
            state.scan_in_flight = true;
            state.epoch
        };

        self.inner.overlays.inject_styles();
        self.subscribe(epoch);

        let images = self.inner.document.images();
        tracing::info!("sweep started: {} images", images.len());

        let scheduled: Vec<JoinHandle<()>> = images
            .into_iter()
            .filter_map(|id| schedule_image(&self.inner, id, epoch))
            .collect();
        scan_text(&self.inner, epoch);

        for handle in scheduled {
            if let Err(e) = handle.await {
                tracing::debug!("decode task failed: {e}");
            }
        }

        let mut state = self.inner.state.lock();
        if state.is_live(epoch) {
            state.scan_in_flight = false;
            state.phase = EnginePhase::Observing;
            tracing::info!(
                "sweep finished: {} images, {} text nodes, {} findings",
                state.images_examined,
                state.text_nodes_examined,
                state.total_findings()
            );
        }
        state.snapshot()
    }

    /// Disables scanning and drops all results
    ///
    /// Safe to call in any phase, including mid-sweep.
    pub fn disable(&self) -> ScanSnapshot {
        let (subscription, snapshot) = {
            let mut state = self.inner.state.lock();
            let subscription = state.reset();
            (subscription, state.snapshot())
        };

        if let Some(sub) = subscription {
            self.inner.document.disconnect(sub.observer);
            sub.pump.abort();
        }
        self.inner.overlays.remove_all_overlays();
        self.inner.relay.update_badge(0);
        self.inner.progress.notify_waiters();

        tracing::info!("scanning disabled");
        snapshot
    }

    /// Feeds one batch of structural changes to the scheduler
    ///
    /// Ignored unless the engine is observing.
    pub fn handle_mutations(&self, batch: &MutationBatch) {
        handle_mutations(&self.inner, batch);
    }

    /// Reacts to a finished image load
    ///
    /// Only images that were still loading when last considered react, and
    /// only once.
    pub fn on_image_loaded(&self, id: NodeId) {
        on_image_loaded(&self.inner, id);
    }

    /// Waits until every delivered document event has been handled and
    /// every decode it started has settled
    ///
    /// Does not wait for a concurrent [`ScanEngine::enable`].
    pub async fn settle(&self) {
        loop {
            let notified = self.inner.progress.notified();
            let (delivered, processed) = {
                let state = self.inner.state.lock();
                match &state.subscription {
                    Some(sub) => (
                        sub.delivered.load(Ordering::Acquire),
                        sub.processed.load(Ordering::Acquire),
                    ),
                    None => (0, 0),
                }
            };

            if processed < delivered {
                notified.await;
                continue;
            }

            let pending = std::mem::take(&mut *self.inner.background.lock());
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                if let Err(e) = handle.await {
                    tracing::debug!("decode task failed: {e}");
                }
            }
        }
    }

    fn subscribe(&self, epoch: u64) {
        let (sink, stream) = EventSink::channel();
        let delivered = stream.delivered_counter();
        let processed = Arc::new(AtomicU64::new(0));
        let observer = self.inner.document.observe(sink);
        let pump = tokio::spawn(pump(
            Arc::downgrade(&self.inner),
            stream,
            Arc::clone(&processed),
        ));

        let mut state = self.inner.state.lock();
        if state.epoch == epoch {
            state.subscription = Some(Subscription {
                observer,
                delivered,
                processed,
                pump,
            });
        } else {
            drop(state);
            self.inner.document.disconnect(observer);
            pump.abort();
        }
    }
}

/// Drains document events into the engine until the subscription ends
async fn pump(engine: Weak<EngineInner>, mut stream: EventStream, processed: Arc<AtomicU64>) {
    while let Some(event) = stream.next().await {
        let Some(inner) = engine.upgrade() else {
            break;
        };
        match event {
            DocumentEvent::Mutations(batch) => handle_mutations(&inner, &batch),
            DocumentEvent::ImageLoaded(id) => on_image_loaded(&inner, id),
        }
        processed.fetch_add(1, Ordering::AcqRel);
        inner.progress.notify_waiters();
    }
}

fn handle_mutations(inner: &Arc<EngineInner>, batch: &MutationBatch) {
    let epoch = {
        let state = inner.state.lock();
        if state.phase != EnginePhase::Observing {
            return;
        }
        state.epoch
    };

    let mut elements_added = false;
    for &id in &batch.added {
        match inner.document.node_kind(id) {
            Some(NodeKind::Image) => {
                elements_added = true;
                track(inner, schedule_image(inner, id, epoch));
            }
            Some(NodeKind::Element) => {
                elements_added = true;
                for image in inner.document.descendant_images(id) {
                    track(inner, schedule_image(inner, image, epoch));
                }
            }
            Some(NodeKind::Text) | None => {}
        }
    }

    // A container whose children changed may have become a leaf, so every
    // current leaf is revisited; seen elements are skipped.
    if elements_added {
        scan_text(inner, epoch);
    }
}

fn on_image_loaded(inner: &Arc<EngineInner>, id: NodeId) {
    let epoch = {
        let mut state = inner.state.lock();
        if state.phase == EnginePhase::Disabled || !state.pending_loads.remove(&id) {
            return;
        }
        state.epoch
    };
    track(inner, schedule_image(inner, id, epoch));
}

fn track(inner: &EngineInner, handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else {
        return;
    };
    let mut background = inner.background.lock();
    background.retain(|h| !h.is_finished());
    background.push(handle);
}

/// Marks an image seen and starts decoding it, or parks it until it loads
fn schedule_image(inner: &Arc<EngineInner>, id: NodeId, epoch: u64) -> Option<JoinHandle<()>> {
    let image = inner.document.image_state(id)?;

    {
        let mut state = inner.state.lock();
        if !state.is_live(epoch) || state.seen_images.contains(&id) {
            return None;
        }

        if image.is_decoded() {
            if !image.meets_minimum(inner.min_image_side) {
                tracing::debug!(
                    "skipping {id}: {}x{} below minimum",
                    image.natural_width,
                    image.natural_height
                );
                return None;
            }
            state.seen_images.insert(id);
            state.images_examined += 1;
            drop(state);
            return Some(tokio::spawn(decode_image(Arc::clone(inner), id, image.src, epoch)));
        }

        state.pending_loads.insert(id);
    }

    // The load may have completed between the state read and the insert.
    if inner
        .document
        .image_state(id)
        .is_some_and(|s| s.is_decoded())
    {
        let still_pending = inner.state.lock().pending_loads.remove(&id);
        if still_pending {
            return schedule_image(inner, id, epoch);
        }
    }
    None
}

async fn decode_image(inner: Arc<EngineInner>, id: NodeId, src: String, epoch: u64) {
    let Some(pixels) = inner.extractor.extract_element(id).await else {
        return;
    };

    let payload = match tokio::task::spawn_blocking(move || decode_qr(&pixels)).await {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            tracing::debug!("no symbol in {id}");
            return;
        }
        Err(e) => {
            tracing::debug!("decoder task failed for {id}: {e}");
            return;
        }
    };

    record_qr(&inner, id, QrFinding::new(payload, src), epoch);
}

fn record_qr(inner: &EngineInner, id: NodeId, finding: QrFinding, epoch: u64) {
    let mut state = inner.state.lock();
    if !state.is_live(epoch) {
        tracing::debug!("discarding stale result for {id}");
        return;
    }
    if state.qr_findings.contains(&finding) {
        return;
    }

    tracing::info!("QR finding {} in {id}", finding.fingerprint());
    inner.overlays.add_overlay(id, &finding.payload);
    state.qr_findings.push(finding);
    inner.relay.update_badge(state.total_findings());
}

/// Classifies every unseen leaf text element
fn scan_text(inner: &EngineInner, epoch: u64) {
    let candidates: Vec<(NodeId, String)> = inner
        .document
        .query_tags(&inner.selector)
        .into_iter()
        .filter(|&id| !inner.document.has_descendant_matching(id, &inner.selector))
        .filter_map(|id| {
            let text = inner.document.text_content(id)?;
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| (id, trimmed.to_string()))
        })
        .collect();

    let mut state = inner.state.lock();
    if !state.is_live(epoch) {
        return;
    }

    let mut found = false;
    for (id, text) in candidates {
        if !state.seen_text.insert(id) {
            continue;
        }
        state.text_nodes_examined += 1;

        if !inner.classifier.looks_like_ciphertext(&text)
            || state.text_findings.iter().any(|f| f.payload == text)
        {
            continue;
        }

        tracing::info!("text finding {} in {id}", fingerprint(&text));
        state.text_findings.push(TextFinding::new(text));
        found = true;
    }

    if found {
        inner.relay.update_badge(state.total_findings());
    }
}
