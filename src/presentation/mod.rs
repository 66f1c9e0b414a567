//! Presentation layer
//!
//! Surface-facing state for the popup: the scanner view and finding hints.
//! The crypto panel lives in the application layer.

mod control_surface;
mod finding_view;

pub use control_surface::{ControlSurface, POLL_PERIOD};
pub use finding_view::{FindingView, is_url, looks_encrypted};
