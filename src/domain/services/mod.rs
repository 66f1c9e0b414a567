//! Domain services
//!
//! Pure detection logic: the ciphertext classifier, the QR decode pipeline
//! and raster conversion.

pub mod classifier;
pub mod data_url;
pub mod qr_decoder;
pub mod raster;

pub use classifier::{TextClassifier, looks_like_ciphertext};
pub use qr_decoder::{Inversion, decode as decode_qr};
pub use raster::{MAX_DIMENSION, clamp_dimensions};
