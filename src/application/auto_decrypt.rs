//! Crypto panel and auto-decrypt orchestration
//!
//! Backs the encrypt/decrypt surface. Besides explicit submits it decrypts
//! on its own when:
//!
//! - the panel is in decrypt mode, a cached key exists, and the input looks
//!   like ciphertext and differs from the last auto-decrypted text; or
//! - the panel was opened with handed-off text while a key was cached. This
//!   trigger fires at most once.
//!
//! Attempts are never cancelled. Each one carries a generation number and
//! only the newest generation may write the output.

use crate::application::dto::KeyCacheOptions;
use crate::application::key_lifecycle::{
    CountdownEvent, CountdownHandle, KeyLifecycleManager, KeyStoreError, start_countdown,
};
use crate::domain::repositories::{Clipboard, ClipboardError, PasswordCipher};
use crate::domain::services::TextClassifier;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const MISSING_KEY: &str = "Please enter an encryption key";
pub const DECRYPT_FAILED: &str = "Decryption failed. Check your key and ciphertext.";
pub const ENCRYPT_FAILED: &str = "Encryption failed. Please try again.";

/// Direction of the panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Encrypt,
    Decrypt,
}

impl Mode {
    pub fn verb(self) -> &'static str {
        match self {
            Mode::Encrypt => "encrypt",
            Mode::Decrypt => "decrypt",
        }
    }
}

/// Everything the surface renders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelView {
    pub mode: Mode,
    pub key: String,
    pub key_revealed: bool,
    pub input: String,
    pub output: String,
    pub error: Option<String>,
    pub processing: bool,
    /// Whether the key is held in the cache
    pub key_cached: bool,
    /// Time left on the cached key, refreshed by the countdown
    pub key_remaining: Option<Duration>,
}

struct PanelState {
    view: PanelView,
    generation: u64,
    last_auto_decrypted: Option<String>,
    countdown: Option<CountdownHandle>,
    attempts: Vec<JoinHandle<()>>,
}

struct PanelInner {
    cipher: Arc<dyn PasswordCipher>,
    keys: Arc<KeyLifecycleManager>,
    clipboard: Arc<dyn Clipboard>,
    classifier: TextClassifier,
    countdown_period: Duration,
    state: Mutex<PanelState>,
}

/// Encrypt/decrypt surface state machine
pub struct CryptoPanel {
    inner: Arc<PanelInner>,
}

impl CryptoPanel {
    /// Opens the panel, optionally with ciphertext handed off from a finding
    ///
    /// `classifier` gates the auto-decrypt trigger; build it from the same
    /// [`ScanOptions`](crate::application::dto::ScanOptions) as the scanner so
    /// both agree on what looks encrypted. Must be called from within a tokio
    /// runtime.
    pub fn open(
        cipher: Arc<dyn PasswordCipher>,
        keys: Arc<KeyLifecycleManager>,
        clipboard: Arc<dyn Clipboard>,
        options: &KeyCacheOptions,
        classifier: TextClassifier,
        handoff: Option<String>,
    ) -> Self {
        let panel = Self {
            inner: Arc::new(PanelInner {
                cipher,
                keys,
                clipboard,
                classifier,
                countdown_period: options.countdown_period(),
                state: Mutex::new(PanelState {
                    view: PanelView::default(),
                    generation: 0,
                    last_auto_decrypted: None,
                    countdown: None,
                    attempts: Vec::new(),
                }),
            }),
        };

        let cached = panel.cached_key();
        if let Some(secret) = &cached {
            let mut state = panel.inner.state.lock();
            state.view.key = secret.clone();
            state.view.key_cached = true;
        }
        if cached.is_some() {
            panel.restart_countdown();
        }

        if let Some(text) = handoff {
            let mut state = panel.inner.state.lock();
            state.view.mode = Mode::Decrypt;
            state.view.input = text.clone();
            if let Some(secret) = cached {
                let trimmed = text.trim().to_string();
                state.last_auto_decrypted = Some(trimmed.clone());
                launch(&panel.inner, &mut state, Mode::Decrypt, trimmed, secret);
            }
        }

        panel
    }

    pub fn view(&self) -> PanelView {
        self.inner.state.lock().view.clone()
    }

    /// Replaces the input text and re-evaluates the auto-decrypt trigger
    pub fn set_input(&self, text: &str) {
        {
            let mut state = self.inner.state.lock();
            state.view.input = text.to_string();
            state.view.error = None;
        }
        self.maybe_auto_decrypt();
    }

    /// Replaces the key being edited; does not touch the cache
    pub fn set_key(&self, key: &str) {
        let mut state = self.inner.state.lock();
        state.view.key = key.to_string();
        state.view.error = None;
    }

    pub fn toggle_key_visibility(&self) {
        let mut state = self.inner.state.lock();
        state.view.key_revealed = !state.view.key_revealed;
    }

    /// Switches direction, clearing input, output and error
    ///
    /// Results of attempts started before the switch are discarded.
    pub fn set_mode(&self, mode: Mode) {
        let mut state = self.inner.state.lock();
        state.generation += 1;
        state.view.mode = mode;
        state.view.input.clear();
        state.view.output.clear();
        state.view.error = None;
        state.view.processing = false;
        state.last_auto_decrypted = None;
    }

    /// Fills the key field with a fresh random key and reveals it
    pub fn generate_key(&self) -> String {
        let key = self.inner.cipher.generate_key();
        let mut state = self.inner.state.lock();
        state.view.key = key.clone();
        state.view.key_revealed = true;
        state.view.error = None;
        key
    }

    /// Runs the current mode on the input; returns whether an attempt started
    pub fn submit(&self) -> bool {
        let mut state = self.inner.state.lock();
        let key = state.view.key.clone();
        let input = state.view.input.trim().to_string();
        let mode = state.view.mode;

        if key.trim().is_empty() {
            state.view.error = Some(MISSING_KEY.to_string());
            return false;
        }
        if input.is_empty() {
            state.view.error = Some(format!("Please enter text to {}", mode.verb()));
            return false;
        }

        launch(&self.inner, &mut state, mode, input, key);
        true
    }

    /// Caches the current key and restarts the countdown
    pub fn save_key(&self) -> Result<(), KeyStoreError> {
        let key = self.inner.state.lock().view.key.clone();
        if key.trim().is_empty() {
            self.inner.state.lock().view.error = Some(MISSING_KEY.to_string());
            return Err(KeyStoreError::EmptySecret);
        }

        self.inner.keys.save(&key)?;
        self.inner.state.lock().view.key_cached = true;
        self.restart_countdown();
        self.maybe_auto_decrypt();
        Ok(())
    }

    /// Drops the cached key and blanks the key field
    pub fn clear_key(&self) -> Result<(), KeyStoreError> {
        self.inner.keys.clear()?;
        let mut state = self.inner.state.lock();
        state.countdown = None;
        state.view.key.clear();
        state.view.key_cached = false;
        state.view.key_remaining = None;
        Ok(())
    }

    /// Copies the key; `false` when there is nothing to copy
    pub fn copy_key(&self) -> Result<bool, ClipboardError> {
        let key = self.inner.state.lock().view.key.clone();
        self.copy(&key)
    }

    /// Copies the output; `false` when there is nothing to copy
    pub fn copy_output(&self) -> Result<bool, ClipboardError> {
        let output = self.inner.state.lock().view.output.clone();
        self.copy(&output)
    }

    /// Waits for every attempt started so far
    pub async fn settle(&self) {
        loop {
            let attempts = std::mem::take(&mut self.inner.state.lock().attempts);
            if attempts.is_empty() {
                return;
            }
            for attempt in attempts {
                if let Err(e) = attempt.await {
                    tracing::debug!("cipher task failed: {e}");
                }
            }
        }
    }

    fn copy(&self, text: &str) -> Result<bool, ClipboardError> {
        if text.is_empty() {
            return Ok(false);
        }
        self.inner.clipboard.write_text(text)?;
        Ok(true)
    }

    fn cached_key(&self) -> Option<String> {
        match self.inner.keys.load() {
            Ok(secret) => secret.filter(|s| !s.is_empty()),
            Err(e) => {
                tracing::warn!("cannot read cached key: {e}");
                None
            }
        }
    }

    fn maybe_auto_decrypt(&self) {
        let candidate = {
            let state = self.inner.state.lock();
            let input = state.view.input.trim();
            let eligible = state.view.mode == Mode::Decrypt
                && self.inner.classifier.looks_like_ciphertext(input)
                && state.last_auto_decrypted.as_deref() != Some(input);
            eligible.then(|| input.to_string())
        };
        let Some(input) = candidate else {
            return;
        };
        let Some(secret) = self.cached_key() else {
            return;
        };

        let mut state = self.inner.state.lock();
        if state.view.mode != Mode::Decrypt || state.view.input.trim() != input {
            return;
        }
        state.last_auto_decrypted = Some(input.clone());
        launch(&self.inner, &mut state, Mode::Decrypt, input, secret);
    }

    fn restart_countdown(&self) {
        let expiry = match self.inner.keys.expiry() {
            Ok(Some(expiry)) => expiry,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!("cannot read key expiry: {e}");
                return;
            }
        };

        let weak = Arc::downgrade(&self.inner);
        let handle = start_countdown(
            Arc::clone(&self.inner.keys),
            expiry,
            self.inner.countdown_period,
            Box::new(move |event| on_countdown(&weak, event)),
        );
        self.inner.state.lock().countdown = Some(handle);
    }
}

fn on_countdown(panel: &Weak<PanelInner>, event: CountdownEvent) {
    let Some(inner) = panel.upgrade() else {
        return;
    };
    let mut state = inner.state.lock();
    match event {
        CountdownEvent::Tick(remaining) => state.view.key_remaining = Some(remaining),
        CountdownEvent::Expired => {
            state.view.key.clear();
            state.view.key_cached = false;
            state.view.key_remaining = None;
        }
    }
}

/// Starts a cipher attempt that supersedes every earlier one
fn launch(inner: &Arc<PanelInner>, state: &mut PanelState, mode: Mode, text: String, secret: String) {
    state.generation += 1;
    let generation = state.generation;
    state.view.processing = true;
    state.view.output.clear();
    state.view.error = None;

    let cipher = Arc::clone(&inner.cipher);
    let panel = Arc::downgrade(inner);
    let attempt = tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || match mode {
            Mode::Encrypt => cipher.encrypt(&text, &secret),
            Mode::Decrypt => cipher.decrypt(&text, &secret),
        })
        .await;

        let Some(inner) = panel.upgrade() else {
            return;
        };
        let mut state = inner.state.lock();
        if state.generation != generation {
            return;
        }
        state.view.processing = false;
        match result {
            Ok(Ok(output)) => state.view.output = output,
            Ok(Err(e)) => {
                tracing::debug!("{} failed: {e}", mode.verb());
                state.view.error = Some(failure_message(mode).to_string());
            }
            Err(e) => {
                tracing::warn!("cipher task failed: {e}");
                state.view.error = Some(failure_message(mode).to_string());
            }
        }
    });

    state.attempts.retain(|h| !h.is_finished());
    state.attempts.push(attempt);
}

fn failure_message(mode: Mode) -> &'static str {
    match mode {
        Mode::Encrypt => ENCRYPT_FAILED,
        Mode::Decrypt => DECRYPT_FAILED,
    }
}
