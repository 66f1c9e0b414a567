//! Data Transfer Objects

mod key_cache_options;
mod relay_options;
mod scan_options;

pub use key_cache_options::{DEFAULT_STORAGE_KEY, KeyCacheOptions};
pub use relay_options::RelayOptions;
pub use scan_options::{DEFAULT_TEXT_SELECTOR, ScanOptions};
