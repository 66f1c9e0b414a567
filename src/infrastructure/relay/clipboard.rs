//! In-memory clipboard

use crate::domain::repositories::{Clipboard, ClipboardError};
use parking_lot::Mutex;

/// Clipboard that holds the last written text
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    content: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> Option<String> {
        self.content.lock().clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        *self.content.lock() = Some(text.to_string());
        Ok(())
    }
}
