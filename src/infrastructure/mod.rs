//! Infrastructure layer
//!
//! Concrete implementations of the domain repositories: the document arena,
//! storage, messaging, the cipher and relay-side collaborators.

pub mod cipher;
pub mod clock;
pub mod dom;
pub mod messaging;
pub mod relay;
pub mod storage;

pub use clock::{ManualClock, SystemClock};
