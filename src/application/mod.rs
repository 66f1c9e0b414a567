//! Application layer
//!
//! Use cases and application services that orchestrate domain logic.

pub mod auto_decrypt;
pub mod dto;
pub mod key_lifecycle;
mod raster_extractor;
mod relay_service;
mod scan_context;
mod scan_engine;

pub use auto_decrypt::{CryptoPanel, Mode, PanelView};
pub use key_lifecycle::{
    CountdownEvent, CountdownHandle, KeyLifecycleManager, KeyStoreError, start_countdown,
};
pub use raster_extractor::RasterExtractor;
pub use relay_service::PrivilegedRelay;
pub use scan_context::{AUTO_SCAN_FLAG, ScanContext};
pub use scan_engine::{EnginePhase, ScanEngine};
