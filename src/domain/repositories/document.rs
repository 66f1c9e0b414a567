//! Document trait
//!
//! The live, mutating page the scanner inspects. Nodes are addressed by
//! [`NodeId`] handles which are never reused, so holding one in a seen-set
//! does not keep the node alive or alias a later node.

use crate::domain::entities::PixelBuffer;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::mpsc;

/// Stable identity of a node in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Broad node category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Any element other than an image
    Element,
    /// An `<img>` element
    Image,
    /// A text node
    Text,
}

impl NodeKind {
    pub fn is_element(self) -> bool {
        matches!(self, NodeKind::Element | NodeKind::Image)
    }
}

/// Load state of an image element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageState {
    pub src: String,
    pub complete: bool,
    pub natural_width: u32,
    pub natural_height: u32,
}

impl ImageState {
    /// Loaded with a nonzero intrinsic width
    pub fn is_decoded(&self) -> bool {
        self.complete && self.natural_width > 0
    }

    /// Both sides at least `min_side`
    pub fn meets_minimum(&self, min_side: u32) -> bool {
        self.natural_width >= min_side && self.natural_height >= min_side
    }

    /// Network images are eligible for the relay fetch fallback
    pub fn is_network_source(&self) -> bool {
        self.src.starts_with("http")
    }
}

/// A comma-separated list of tag names, matched case-insensitively
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSelector {
    tags: Vec<String>,
}

impl TagSelector {
    /// Parses `"p, span, div"` style selectors
    pub fn parse(selector: &str) -> Self {
        let tags = selector
            .split(',')
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { tags }
    }

    pub fn matches(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// Nodes added to the document in one structural change batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationBatch {
    pub added: Vec<NodeId>,
}

impl MutationBatch {
    pub fn new(added: Vec<NodeId>) -> Self {
        Self { added }
    }
}

/// Notifications a document pushes to its observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// Child-list changes anywhere under the body
    Mutations(MutationBatch),
    /// An image finished loading
    ImageLoaded(NodeId),
}

/// Handle returned by [`Document::observe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// Sending half of a document observer queue
///
/// Counts every delivered event so the consumer can tell when it has caught
/// up with the producer.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<DocumentEvent>,
    delivered: Arc<AtomicU64>,
}

impl EventSink {
    /// Creates a connected sink/stream pair
    pub fn channel() -> (EventSink, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let delivered = Arc::new(AtomicU64::new(0));
        (
            EventSink {
                tx,
                delivered: Arc::clone(&delivered),
            },
            EventStream { rx, delivered },
        )
    }

    /// Queues an event; returns `false` once the stream is gone
    pub fn deliver(&self, event: DocumentEvent) -> bool {
        if self.tx.send(event).is_ok() {
            self.delivered.fetch_add(1, Ordering::AcqRel);
            true
        } else {
            false
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half of a document observer queue
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<DocumentEvent>,
    delivered: Arc<AtomicU64>,
}

impl EventStream {
    /// Waits for the next event; `None` once every sink is dropped
    pub async fn next(&mut self) -> Option<DocumentEvent> {
        self.rx.recv().await
    }

    /// Shared counter of events delivered so far
    pub fn delivered_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.delivered)
    }
}

/// Errors raised when reading pixels back from an image
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DrawError {
    #[error("raster surface tainted by cross-origin image")]
    Tainted,

    #[error("image has zero dimensions")]
    ZeroSize,

    #[error("node {0} is not a loaded image")]
    NotAnImage(NodeId),

    #[error("raster decode failed: {0}")]
    Decode(String),
}

/// Read access to a live document plus structural-change observation
///
/// Implementations must be safe to query while they are being mutated.
pub trait Document: Send + Sync {
    /// Every image element currently in the document, in document order
    fn images(&self) -> Vec<NodeId>;

    /// Image elements nested under `id` (excluding `id` itself)
    fn descendant_images(&self, id: NodeId) -> Vec<NodeId>;

    /// Kind of node, `None` for unknown handles
    fn node_kind(&self, id: NodeId) -> Option<NodeKind>;

    /// Load state of an image element
    fn image_state(&self, id: NodeId) -> Option<ImageState>;

    /// Elements in the document whose tag matches, in document order
    fn query_tags(&self, selector: &TagSelector) -> Vec<NodeId>;

    /// Whether any descendant of `id` matches the selector
    fn has_descendant_matching(&self, id: NodeId, selector: &TagSelector) -> bool;

    /// Concatenated text of the subtree under `id`
    fn text_content(&self, id: NodeId) -> Option<String>;

    /// Draws the image onto an offscreen surface of the given size and reads
    /// the pixels back
    fn draw_image(&self, id: NodeId, width: u32, height: u32) -> Result<PixelBuffer, DrawError>;

    /// Starts delivering events to `sink`
    fn observe(&self, sink: EventSink) -> ObserverId;

    /// Stops delivering events for `observer`
    fn disconnect(&self, observer: ObserverId);
}
