//! Key lifecycle use case
//!
//! One cached secret in a singleton storage slot with a sliding 30-minute
//! expiry. `load` is the authoritative expiry check: an expired credential
//! is cleared and never returned, whatever the countdown says.

use crate::application::dto::KeyCacheOptions;
use crate::domain::entities::{StoredCredential, remaining_until};
use crate::domain::repositories::{Clock, KeyValueStore, StoreError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Errors that can occur while managing the cached key
#[derive(Error, Debug)]
pub enum KeyStoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Cannot cache an empty key")]
    EmptySecret,
}

/// Owner of the cached credential slot
pub struct KeyLifecycleManager {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    storage_key: String,
    /// Serializes read-check-clear sequences on the slot
    guard: Mutex<()>,
}

impl KeyLifecycleManager {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, options: &KeyCacheOptions) -> Self {
        Self {
            store,
            clock,
            ttl: options.ttl(),
            storage_key: options.storage_key.clone(),
            guard: Mutex::new(()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Caches `secret`, replacing any previous one, and returns its expiry
    pub fn save(&self, secret: &str) -> Result<i64, KeyStoreError> {
        if secret.is_empty() {
            return Err(KeyStoreError::EmptySecret);
        }

        let credential = StoredCredential::new(secret, self.clock.now_ms(), self.ttl);
        let expires_at = credential.expires_at_epoch_ms;
        let value = serde_json::to_value(&credential).map_err(StoreError::from)?;

        let _guard = self.guard.lock();
        self.store.set(&self.storage_key, value)?;
        tracing::info!("key cached for {}s", self.ttl.as_secs());
        Ok(expires_at)
    }

    /// Returns the cached secret, clearing it first if it has expired
    pub fn load(&self) -> Result<Option<String>, KeyStoreError> {
        let _guard = self.guard.lock();
        let Some(credential) = self.read_slot()? else {
            return Ok(None);
        };

        if credential.is_expired(self.clock.now_ms()) {
            self.store.remove(&self.storage_key)?;
            tracing::info!("cached key expired");
            return Ok(None);
        }
        Ok(Some(credential.secret))
    }

    /// Expiry of a still-valid credential; never clears
    pub fn expiry(&self) -> Result<Option<i64>, KeyStoreError> {
        let _guard = self.guard.lock();
        let now = self.clock.now_ms();
        Ok(self
            .read_slot()?
            .filter(|c| !c.is_expired(now))
            .map(|c| c.expires_at_epoch_ms))
    }

    /// Deletes the credential, no-op when there is none
    pub fn clear(&self) -> Result<(), KeyStoreError> {
        let _guard = self.guard.lock();
        self.store.remove(&self.storage_key)?;
        Ok(())
    }

    /// Deletes the credential unless a different one has replaced it
    ///
    /// Returns `false` only when the slot holds a credential expiring at some
    /// other instant than `expires_at_ms`; that credential is left in place.
    pub fn clear_if_expires_at(&self, expires_at_ms: i64) -> Result<bool, KeyStoreError> {
        let _guard = self.guard.lock();
        let replaced = self
            .read_slot()?
            .is_some_and(|current| current.expires_at_epoch_ms != expires_at_ms);
        if replaced {
            return Ok(false);
        }
        self.store.remove(&self.storage_key)?;
        Ok(true)
    }

    /// Time left until `expires_at_ms`, zero once passed
    pub fn remaining_ttl(&self, expires_at_ms: i64) -> Duration {
        remaining_until(expires_at_ms, self.clock.now_ms())
    }

    fn read_slot(&self) -> Result<Option<StoredCredential>, KeyStoreError> {
        let Some(raw) = self.store.get(&self.storage_key)? else {
            return Ok(None);
        };
        match serde_json::from_value::<StoredCredential>(raw) {
            Ok(credential) => Ok(Some(credential)),
            Err(e) => {
                tracing::warn!("ignoring unreadable credential slot: {e}");
                Ok(None)
            }
        }
    }
}

/// What a running countdown reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// Time left on the credential
    Tick(Duration),
    /// The credential was cleared; drop any in-memory copy
    Expired,
}

/// Callback invoked on every countdown event
pub type CountdownCallback = Box<dyn Fn(CountdownEvent) + Send + Sync>;

/// Handle to a running countdown; dropping it cancels the countdown
#[derive(Debug)]
pub struct CountdownHandle {
    task: JoinHandle<()>,
}

impl CountdownHandle {
    pub fn cancel(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Polls the remaining lifetime of a credential once per `period`
///
/// When the time runs out the credential is cleared proactively and
/// [`CountdownEvent::Expired`] is reported once. If the slot was re-saved in
/// the meantime the newer credential is left alone and the countdown stops
/// without reporting.
pub fn start_countdown(
    manager: Arc<KeyLifecycleManager>,
    expires_at_ms: i64,
    period: Duration,
    on_event: CountdownCallback,
) -> CountdownHandle {
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let remaining = manager.remaining_ttl(expires_at_ms);
            if remaining.is_zero() {
                match manager.clear_if_expires_at(expires_at_ms) {
                    Ok(true) => on_event(CountdownEvent::Expired),
                    Ok(false) => tracing::debug!("key was replaced, countdown stopped"),
                    Err(e) => tracing::warn!("failed to clear expired key: {e}"),
                }
                break;
            }
            on_event(CountdownEvent::Tick(remaining));
        }
    });
    CountdownHandle { task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ManualClock;
    use crate::infrastructure::storage::MemoryStore;
    use serde_json::json;

    fn manager() -> (KeyLifecycleManager, Arc<ManualClock>, Arc<MemoryStore>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let store = Arc::new(MemoryStore::new());
        let manager = KeyLifecycleManager::new(
            store.clone(),
            clock.clone(),
            &KeyCacheOptions::default(),
        );
        (manager, clock, store)
    }

    #[test]
    fn test_save_overwrites_slot() {
        let (manager, clock, store) = manager();
        manager.save("first").unwrap();
        clock.advance(Duration::from_secs(60));
        let expiry = manager.save("second").unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(manager.load().unwrap().as_deref(), Some("second"));
        assert_eq!(expiry, 1_000_000 + 60_000 + 30 * 60 * 1000);
    }

    #[test]
    fn test_expiry_boundary() {
        let (manager, clock, _) = manager();
        let expiry = manager.save("k").unwrap();

        clock.set(expiry);
        assert_eq!(manager.load().unwrap().as_deref(), Some("k"));

        clock.set(expiry + 1);
        assert_eq!(manager.expiry().unwrap(), None);
        assert_eq!(manager.load().unwrap(), None);
    }

    #[test]
    fn test_corrupt_slot_reads_as_absent() {
        let (manager, _, store) = manager();
        store.set("ov_enc_key", json!({"nonsense": 1})).unwrap();
        assert_eq!(manager.load().unwrap(), None);
        assert_eq!(manager.expiry().unwrap(), None);
    }

    #[test]
    fn test_empty_secret_rejected() {
        let (manager, _, _) = manager();
        assert!(matches!(manager.save(""), Err(KeyStoreError::EmptySecret)));
    }

    #[test]
    fn test_clear_if_expires_at_spares_newer_key() {
        let (manager, clock, _) = manager();
        let first = manager.save("first").unwrap();
        clock.advance(Duration::from_secs(1));
        manager.save("second").unwrap();

        assert!(!manager.clear_if_expires_at(first).unwrap());
        assert_eq!(manager.load().unwrap().as_deref(), Some("second"));

        let current = manager.expiry().unwrap().unwrap();
        assert!(manager.clear_if_expires_at(current).unwrap());
        assert_eq!(manager.load().unwrap(), None);
        assert!(manager.clear_if_expires_at(current).unwrap());
    }

    #[test]
    fn test_remaining_ttl_saturates() {
        let (manager, clock, _) = manager();
        let expiry = manager.save("k").unwrap();
        assert_eq!(manager.remaining_ttl(expiry), Duration::from_secs(30 * 60));
        clock.advance(Duration::from_secs(31 * 60));
        assert_eq!(manager.remaining_ttl(expiry), Duration::ZERO);
    }
}
