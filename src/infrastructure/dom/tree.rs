//! In-memory document tree
//!
//! Arena-backed [`Document`] implementation. Nodes are never freed, only
//! detached, so a [`NodeId`] always refers to the same node. Structural
//! changes under the body are pushed to observers as mutation batches.

use crate::domain::entities::PixelBuffer;
use crate::domain::repositories::{
    Document, DocumentEvent, DrawError, EventSink, ImageState, MutationBatch, NodeId, NodeKind,
    ObserverId, TagSelector,
};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by tree mutations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Node {0} cannot have children")]
    NotAContainer(NodeId),

    #[error("Appending {child} under {parent} would create a cycle")]
    WouldCycle { parent: NodeId, child: NodeId },

    #[error("Node {0} is not an image")]
    NotAnImage(NodeId),
}

/// Description of an image element to create
#[derive(Debug, Clone)]
pub struct ImageSpec {
    src: String,
    complete: bool,
    natural_width: u32,
    natural_height: u32,
    raster: Option<Arc<RgbaImage>>,
    cross_origin: bool,
}

impl ImageSpec {
    /// An image that has already finished loading
    pub fn loaded(src: impl Into<String>, raster: RgbaImage) -> Self {
        Self {
            src: src.into(),
            complete: true,
            natural_width: raster.width(),
            natural_height: raster.height(),
            raster: Some(Arc::new(raster)),
            cross_origin: false,
        }
    }

    /// An image whose bytes have not arrived yet
    pub fn pending(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            complete: false,
            natural_width: 0,
            natural_height: 0,
            raster: None,
            cross_origin: false,
        }
    }

    /// Served from another origin; reading its pixels in-page fails
    pub fn cross_origin(mut self) -> Self {
        self.cross_origin = true;
        self
    }
}

#[derive(Debug)]
struct ImageNode {
    spec: ImageSpec,
}

#[derive(Debug)]
enum NodeData {
    Element { tag: String },
    Image(ImageNode),
    Text(String),
}

#[derive(Debug)]
struct NodeSlot {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

impl NodeSlot {
    fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Image(_) => NodeKind::Image,
            NodeData::Text(_) => NodeKind::Text,
        }
    }

    fn tag(&self) -> Option<&str> {
        match &self.data {
            NodeData::Element { tag } => Some(tag),
            NodeData::Image(_) => Some("img"),
            NodeData::Text(_) => None,
        }
    }
}

#[derive(Debug)]
struct TreeInner {
    nodes: Vec<NodeSlot>,
    body: NodeId,
    observers: Vec<(ObserverId, EventSink)>,
    next_observer: u64,
}

impl TreeInner {
    fn slot(&self, id: NodeId) -> Option<&NodeSlot> {
        usize::try_from(id.0).ok().and_then(|i| self.nodes.get(i))
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut NodeSlot> {
        usize::try_from(id.0).ok().and_then(|i| self.nodes.get_mut(i))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u64);
        self.nodes.push(NodeSlot {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    fn is_connected(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.body {
                return true;
            }
            current = self.slot(node).and_then(|s| s.parent);
        }
        false
    }

    fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.slot(node).and_then(|s| s.parent);
        }
        false
    }

    /// Pre-order walk of the subtree under `start`
    fn walk(&self, start: NodeId, include_start: bool, mut visit: impl FnMut(NodeId, &NodeSlot)) {
        let Some(root) = self.slot(start) else {
            return;
        };
        if include_start {
            visit(start, root);
        }
        let mut stack: Vec<NodeId> = root.children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(slot) = self.slot(id) {
                visit(id, slot);
                stack.extend(slot.children.iter().rev().copied());
            }
        }
    }

    fn emit(&mut self, event: DocumentEvent) {
        self.observers
            .retain(|(_, sink)| sink.deliver(event.clone()));
    }
}

/// Thread-safe in-memory document
#[derive(Debug)]
pub struct DomTree {
    inner: RwLock<TreeInner>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Creates a document containing only an empty `<body>`
    pub fn new() -> Self {
        let mut inner = TreeInner {
            nodes: Vec::new(),
            body: NodeId(0),
            observers: Vec::new(),
            next_observer: 1,
        };
        inner.body = inner.push(NodeData::Element {
            tag: "body".to_string(),
        });
        Self {
            inner: RwLock::new(inner),
        }
    }

    pub fn body(&self) -> NodeId {
        self.inner.read().body
    }

    /// Creates a detached element
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.inner.write().push(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
        })
    }

    /// Creates a detached text node
    pub fn create_text(&self, text: &str) -> NodeId {
        self.inner.write().push(NodeData::Text(text.to_string()))
    }

    /// Creates a detached image element
    pub fn create_image(&self, spec: ImageSpec) -> NodeId {
        self.inner.write().push(NodeData::Image(ImageNode { spec }))
    }

    /// Appends one child, see [`DomTree::append_children`]
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.append_children(parent, &[child])
    }

    /// Appends children in order as a single structural change
    ///
    /// Observers get one mutation batch when `parent` is in the document.
    pub fn append_children(&self, parent: NodeId, children: &[NodeId]) -> Result<(), DomError> {
        let mut inner = self.inner.write();

        match inner.slot(parent).map(NodeSlot::kind) {
            None => return Err(DomError::UnknownNode(parent)),
            Some(NodeKind::Element) => {}
            Some(_) => return Err(DomError::NotAContainer(parent)),
        }

        for &child in children {
            if inner.slot(child).is_none() {
                return Err(DomError::UnknownNode(child));
            }
            if inner.is_ancestor(child, parent) {
                return Err(DomError::WouldCycle { parent, child });
            }
        }

        for &child in children {
            detach(&mut inner, child);
            if let Some(slot) = inner.slot_mut(child) {
                slot.parent = Some(parent);
            }
            if let Some(slot) = inner.slot_mut(parent) {
                slot.children.push(child);
            }
        }

        if inner.is_connected(parent) && !children.is_empty() {
            inner.emit(DocumentEvent::Mutations(MutationBatch::new(children.to_vec())));
        }
        Ok(())
    }

    /// Detaches a node (and its subtree) from its parent
    pub fn remove(&self, id: NodeId) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        if inner.slot(id).is_none() {
            return Err(DomError::UnknownNode(id));
        }
        detach(&mut inner, id);
        Ok(())
    }

    /// Replaces the content of a text node
    ///
    /// Character data changes are not structural and notify nobody.
    pub fn set_text(&self, id: NodeId, text: &str) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        match inner.slot_mut(id) {
            Some(NodeSlot {
                data: NodeData::Text(content),
                ..
            }) => {
                *content = text.to_string();
                Ok(())
            }
            Some(_) => Err(DomError::NotAContainer(id)),
            None => Err(DomError::UnknownNode(id)),
        }
    }

    /// Completes loading of a pending image and fires its load event
    pub fn finish_loading(&self, id: NodeId, raster: RgbaImage) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        match inner.slot_mut(id) {
            Some(NodeSlot {
                data: NodeData::Image(image),
                ..
            }) => {
                image.spec.complete = true;
                image.spec.natural_width = raster.width();
                image.spec.natural_height = raster.height();
                image.spec.raster = Some(Arc::new(raster));
            }
            Some(_) => return Err(DomError::NotAnImage(id)),
            None => return Err(DomError::UnknownNode(id)),
        }
        inner.emit(DocumentEvent::ImageLoaded(id));
        Ok(())
    }

    /// Number of currently registered observers
    pub fn observer_count(&self) -> usize {
        self.inner.read().observers.len()
    }
}

fn detach(inner: &mut TreeInner, id: NodeId) {
    let Some(parent) = inner.slot(id).and_then(|s| s.parent) else {
        return;
    };
    if let Some(slot) = inner.slot_mut(parent) {
        slot.children.retain(|&c| c != id);
    }
    if let Some(slot) = inner.slot_mut(id) {
        slot.parent = None;
    }
}

impl Document for DomTree {
    fn images(&self) -> Vec<NodeId> {
        let inner = self.inner.read();
        let mut found = Vec::new();
        inner.walk(inner.body, false, |id, slot| {
            if slot.kind() == NodeKind::Image {
                found.push(id);
            }
        });
        found
    }

    fn descendant_images(&self, id: NodeId) -> Vec<NodeId> {
        let inner = self.inner.read();
        let mut found = Vec::new();
        inner.walk(id, false, |node, slot| {
            if slot.kind() == NodeKind::Image {
                found.push(node);
            }
        });
        found
    }

    fn node_kind(&self, id: NodeId) -> Option<NodeKind> {
        self.inner.read().slot(id).map(NodeSlot::kind)
    }

    fn image_state(&self, id: NodeId) -> Option<ImageState> {
        let inner = self.inner.read();
        match &inner.slot(id)?.data {
            NodeData::Image(image) => Some(ImageState {
                src: image.spec.src.clone(),
                complete: image.spec.complete,
                natural_width: image.spec.natural_width,
                natural_height: image.spec.natural_height,
            }),
            _ => None,
        }
    }

    fn query_tags(&self, selector: &TagSelector) -> Vec<NodeId> {
        let inner = self.inner.read();
        let mut found = Vec::new();
        inner.walk(inner.body, false, |id, slot| {
            if slot.tag().is_some_and(|t| selector.matches(t)) {
                found.push(id);
            }
        });
        found
    }

    fn has_descendant_matching(&self, id: NodeId, selector: &TagSelector) -> bool {
        let inner = self.inner.read();
        let mut hit = false;
        inner.walk(id, false, |_, slot| {
            hit |= slot.tag().is_some_and(|t| selector.matches(t));
        });
        hit
    }

    fn text_content(&self, id: NodeId) -> Option<String> {
        let inner = self.inner.read();
        inner.slot(id)?;
        let mut text = String::new();
        inner.walk(id, true, |_, slot| {
            if let NodeData::Text(content) = &slot.data {
                text.push_str(content);
            }
        });
        Some(text)
    }

    fn draw_image(&self, id: NodeId, width: u32, height: u32) -> Result<PixelBuffer, DrawError> {
        let raster = {
            let inner = self.inner.read();
            let image = match inner.slot(id).map(|s| &s.data) {
                Some(NodeData::Image(image)) => image,
                _ => return Err(DrawError::NotAnImage(id)),
            };
            if !image.spec.complete {
                return Err(DrawError::NotAnImage(id));
            }
            if image.spec.cross_origin {
                return Err(DrawError::Tainted);
            }
            match &image.spec.raster {
                Some(raster) => Arc::clone(raster),
                None => return Err(DrawError::ZeroSize),
            }
        };

        if width == 0 || height == 0 || raster.width() == 0 || raster.height() == 0 {
            return Err(DrawError::ZeroSize);
        }

        if (raster.width(), raster.height()) == (width, height) {
            Ok(PixelBuffer::new(raster.as_ref().clone()))
        } else {
            Ok(PixelBuffer::new(imageops::resize(
                raster.as_ref(),
                width,
                height,
                FilterType::Triangle,
            )))
        }
    }

    fn observe(&self, sink: EventSink) -> ObserverId {
        let mut inner = self.inner.write();
        let id = ObserverId(inner.next_observer);
        inner.next_observer += 1;
        inner.observers.push((id, sink));
        id
    }

    fn disconnect(&self, observer: ObserverId) {
        self.inner
            .write()
            .observers
            .retain(|(id, _)| *id != observer);
    }
}
