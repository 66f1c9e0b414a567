//! Lookout
//!
//! Scans a live, mutating document for QR payloads and ciphertext-looking
//! text, and backs a password-based encrypt/decrypt panel with a time-boxed
//! key cache.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod presentation;

pub use application::{CryptoPanel, KeyLifecycleManager, ScanContext, ScanEngine};
pub use config::{ConfigError, LookoutConfig};
pub use domain::entities::{QrFinding, ScanSnapshot, TextFinding};
