//! Tab registry
//!
//! Tracks which scan contexts exist and which tab is active, so the control
//! surface can address "the current tab" at call time.

use crate::domain::entities::TabId;
use crate::domain::repositories::MessagePort;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct Tabs {
    ports: HashMap<TabId, Arc<dyn MessagePort>>,
    active: Option<TabId>,
}

/// Registry of scan-context ports keyed by tab
#[derive(Default)]
pub struct TabRegistry {
    inner: RwLock<Tabs>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the scan context hosted in `tab`, replacing any previous one
    pub fn register(&self, tab: TabId, port: Arc<dyn MessagePort>) {
        self.inner.write().ports.insert(tab, port);
    }

    /// Forgets a closed tab
    pub fn unregister(&self, tab: TabId) {
        let mut inner = self.inner.write();
        inner.ports.remove(&tab);
        if inner.active == Some(tab) {
            inner.active = None;
        }
    }

    /// Marks `tab` as the focused one; `None` when no tab has focus
    pub fn activate(&self, tab: Option<TabId>) {
        self.inner.write().active = tab;
    }

    /// Port of the active tab, if there is one
    pub fn active(&self) -> Option<(TabId, Arc<dyn MessagePort>)> {
        let inner = self.inner.read();
        let tab = inner.active?;
        let port = inner.ports.get(&tab)?;
        Some((tab, Arc::clone(port)))
    }

    pub fn len(&self) -> usize {
        self.inner.read().ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().ports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::messaging::channel;

    #[test]
    fn test_active_requires_registration() {
        let registry = TabRegistry::new();
        registry.activate(Some(TabId(1)));
        assert!(registry.active().is_none());

        let (endpoint, _mailbox) = channel();
        registry.register(TabId(1), Arc::new(endpoint));
        assert_eq!(registry.active().map(|(t, _)| t), Some(TabId(1)));
    }

    #[test]
    fn test_unregister_clears_focus() {
        let registry = TabRegistry::new();
        let (endpoint, _mailbox) = channel();
        registry.register(TabId(2), Arc::new(endpoint));
        registry.activate(Some(TabId(2)));
        registry.unregister(TabId(2));
        assert!(registry.active().is_none());
        assert!(registry.is_empty());
    }
}
