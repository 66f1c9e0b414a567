//! Domain entities
//!
//! Core objects of the scanning and key-caching domain.

mod credential;
mod finding;
mod message;
mod pixels;
mod snapshot;

pub use credential::{StoredCredential, remaining_until};
pub use finding::{QrFinding, TextFinding, fingerprint};
pub use message::{FetchImageReply, Reply, ReplyMode, Request, TabId};
pub use pixels::PixelBuffer;
pub use snapshot::ScanSnapshot;
