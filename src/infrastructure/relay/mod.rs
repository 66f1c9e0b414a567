//! Relay-side and host collaborators
//!
//! Network fetching for the privileged relay plus the overlay and
//! clipboard sinks used by the page and the control surface.

mod clipboard;
mod http_fetcher;
mod overlay_recorder;

pub use clipboard::MemoryClipboard;
pub use http_fetcher::HttpImageFetcher;
pub use overlay_recorder::OverlayRecorder;
