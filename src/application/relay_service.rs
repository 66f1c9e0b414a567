//! Privileged relay service
//!
//! Answers `FETCH_IMAGE` with the image as a data URL and keeps the per-tab
//! badge text from `UPDATE_BADGE`.

use crate::application::dto::RelayOptions;
use crate::domain::entities::{FetchImageReply, Reply, Request, TabId};
use crate::domain::repositories::{ImageFetcher, RequestHandler};
use crate::domain::services::data_url;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// The extension's background context
pub struct PrivilegedRelay {
    fetcher: Arc<dyn ImageFetcher>,
    default_content_type: String,
    badges: Mutex<HashMap<TabId, String>>,
}

impl PrivilegedRelay {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, options: &RelayOptions) -> Self {
        Self {
            fetcher,
            default_content_type: options.default_content_type.clone(),
            badges: Mutex::new(HashMap::new()),
        }
    }

    /// Fetches `url` and packs it into a data URL; `None` on any failure
    pub async fn fetch_as_data_url(&self, url: &str) -> Option<String> {
        match self.fetcher.fetch(url).await {
            Ok(image) => {
                let content_type = image
                    .content_type
                    .filter(|ct| !ct.trim().is_empty())
                    .unwrap_or_else(|| self.default_content_type.clone());
                Some(data_url::encode(&content_type, &image.bytes))
            }
            Err(e) => {
                tracing::debug!("relay fetch failed: {e}");
                None
            }
        }
    }

    /// Sets the badge for `tab`; a zero count clears it
    pub fn set_badge(&self, tab: TabId, count: usize) {
        let text = if count > 0 {
            count.to_string()
        } else {
            String::new()
        };
        self.badges.lock().insert(tab, text);
    }

    /// Text currently shown on the badge of `tab`
    pub fn badge_text(&self, tab: TabId) -> String {
        self.badges.lock().get(&tab).cloned().unwrap_or_default()
    }

    /// A tab started loading a new page
    pub fn on_navigation_started(&self, tab: TabId) {
        self.badges.lock().insert(tab, String::new());
    }
}

#[async_trait]
impl RequestHandler for PrivilegedRelay {
    async fn handle(&self, request: Request, sender: Option<TabId>) -> Option<Reply> {
        match request {
            Request::FetchImage { url } => {
                let data_url = self.fetch_as_data_url(&url).await;
                Some(Reply::Image(FetchImageReply { data_url }))
            }
            Request::UpdateBadge { count } => {
                match sender {
                    Some(tab) => self.set_badge(tab, count),
                    None => tracing::debug!("badge update without a sender tab"),
                }
                None
            }
            Request::ToggleScanning { .. } | Request::GetResults => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{FetchError, FetchedImage};
    use bytes::Bytes;

    struct StaticFetcher {
        status: Option<u16>,
        content_type: Option<&'static str>,
    }

    #[async_trait]
    impl ImageFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<FetchedImage, FetchError> {
            if let Some(status) = self.status {
                return Err(FetchError::Status(status));
            }
            Ok(FetchedImage {
                bytes: Bytes::from_static(b"abc"),
                content_type: self.content_type.map(str::to_string),
            })
        }
    }

    fn relay(status: Option<u16>, content_type: Option<&'static str>) -> PrivilegedRelay {
        PrivilegedRelay::new(
            Arc::new(StaticFetcher {
                status,
                content_type,
            }),
            &RelayOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_content_type_defaults_to_png() {
        let relay = relay(None, None);
        assert_eq!(
            relay.fetch_as_data_url("https://x/q").await.as_deref(),
            Some("data:image/png;base64,YWJj")
        );
    }

    #[tokio::test]
    async fn test_served_content_type_kept() {
        let relay = relay(None, Some("image/jpeg"));
        assert_eq!(
            relay.fetch_as_data_url("https://x/q").await.as_deref(),
            Some("data:image/jpeg;base64,YWJj")
        );
    }

    #[tokio::test]
    async fn test_http_error_yields_null_reply() {
        let relay = relay(Some(404), None);
        let reply = relay
            .handle(Request::FetchImage { url: "https://x/q".into() }, None)
            .await;
        assert_eq!(reply, Some(Reply::Image(FetchImageReply { data_url: None })));
    }

    #[tokio::test]
    async fn test_badge_text_and_navigation() {
        let relay = relay(None, None);
        let tab = TabId(9);

        assert_eq!(relay.handle(Request::UpdateBadge { count: 3 }, Some(tab)).await, None);
        assert_eq!(relay.badge_text(tab), "3");

        relay.set_badge(tab, 0);
        assert_eq!(relay.badge_text(tab), "");

        relay.set_badge(tab, 2);
        relay.on_navigation_started(tab);
        assert_eq!(relay.badge_text(tab), "");
    }
}
