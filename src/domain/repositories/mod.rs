//! Repository traits (interfaces)
//!
//! These traits define the contracts for external collaborators: the live
//! document, storage, the privileged relay, overlays and the cipher.

mod cipher;
mod clipboard;
mod clock;
mod document;
mod image_fetcher;
mod key_value_store;
mod message_port;
mod overlay;
mod relay;

pub use cipher::{CipherError, PasswordCipher};
pub use clipboard::{Clipboard, ClipboardError};
pub use clock::Clock;
pub use document::{
    Document, DocumentEvent, DrawError, EventSink, EventStream, ImageState, MutationBatch,
    NodeId, NodeKind, ObserverId, TagSelector,
};
pub use image_fetcher::{FetchError, FetchedImage, ImageFetcher};
pub use key_value_store::{KeyValueStore, StoreError};
pub use message_port::{
    BusError, MessagePort, RequestHandler, post_or_swallow, request, request_or_swallow,
};
pub use overlay::OverlaySink;
pub use relay::RelayClient;
