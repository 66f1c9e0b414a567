//! Raster extraction use case
//!
//! Turns a live image element into pixels for the decoder.
//! Every failure is a skip (`None`), never an error: the caller moves on and
//! does not retry within the same pass.

use crate::domain::entities::PixelBuffer;
use crate::domain::repositories::{Document, NodeId, RelayClient};
use crate::domain::services::raster::extract_from_data_url;
use crate::domain::services::clamp_dimensions;
use std::sync::Arc;

/// Pixel extraction with a relay fallback for tainted images
pub struct RasterExtractor {
    document: Arc<dyn Document>,
    relay: Arc<dyn RelayClient>,
    max_dimension: u32,
}

impl RasterExtractor {
    pub fn new(document: Arc<dyn Document>, relay: Arc<dyn RelayClient>, max_dimension: u32) -> Self {
        Self {
            document,
            relay,
            max_dimension,
        }
    }

    /// Reads the pixels of a live image element
    ///
    /// Draws in-page first. When that fails for a network image, the relay
    /// fetches the bytes out-of-band and the local copy is decoded instead.
    pub async fn extract_element(&self, id: NodeId) -> Option<PixelBuffer> {
        let state = self.document.image_state(id)?;
        if state.natural_width == 0 || state.natural_height == 0 {
            tracing::debug!("skipping {id}: zero-size image");
            return None;
        }

        let (width, height) =
            clamp_dimensions(state.natural_width, state.natural_height, self.max_dimension);

        let document = Arc::clone(&self.document);
        let drawn = tokio::task::spawn_blocking(move || document.draw_image(id, width, height))
            .await
            .ok()?;

        match drawn {
            Ok(pixels) => Some(pixels),
            Err(e) if state.is_network_source() => {
                tracing::debug!("in-page draw of {id} failed ({e}), asking relay");
                self.extract_via_relay(&state.src).await
            }
            Err(e) => {
                tracing::debug!("skipping {id}: {e}");
                None
            }
        }
    }

    async fn extract_via_relay(&self, src: &str) -> Option<PixelBuffer> {
        let data_url = self.relay.fetch_image(src).await?;
        let max = self.max_dimension;
        tokio::task::spawn_blocking(move || extract_from_data_url(&data_url, max))
            .await
            .ok()
            .flatten()
    }
}
