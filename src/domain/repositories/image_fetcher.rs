//! Image fetcher trait
//!
//! Used by the privileged relay to retrieve image bytes that the page
//! itself may not read.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur when fetching an image
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Raw image bytes as served
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Bytes,
    /// `Content-Type` header, if the server sent one
    pub content_type: Option<String>,
}

/// Retrieves image bytes over the network
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError>;
}
