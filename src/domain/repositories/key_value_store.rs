//! Key-value store trait
//!
//! Local device storage for the cached credential and the auto-scan flag.

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when accessing local storage
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Other(String),
}

/// Local key-value storage
///
/// Values are JSON documents. `set` overwrites, it never merges.
pub trait KeyValueStore: Send + Sync {
    /// Reads a value, `None` when absent
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Writes a value, replacing any previous one
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Deletes a value, no-op when absent
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Reads a boolean flag, treating anything else as `false`
    fn get_flag(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .get(key)?
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }
}
