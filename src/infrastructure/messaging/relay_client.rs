//! Relay client over a message port

use crate::domain::entities::{FetchImageReply, Request};
use crate::domain::repositories::{MessagePort, RelayClient, post_or_swallow, request_or_swallow};
use async_trait::async_trait;
use std::sync::Arc;

/// Talks to the privileged relay through the bus
pub struct BusRelayClient {
    port: Arc<dyn MessagePort>,
}

impl BusRelayClient {
    pub fn new(port: Arc<dyn MessagePort>) -> Self {
        Self { port }
    }
}

#[async_trait]
impl RelayClient for BusRelayClient {
    async fn fetch_image(&self, url: &str) -> Option<String> {
        let request = Request::FetchImage {
            url: url.to_string(),
        };
        let reply: FetchImageReply = request_or_swallow(self.port.as_ref(), &request).await?;
        reply.data_url
    }

    fn update_badge(&self, count: usize) {
        post_or_swallow(self.port.as_ref(), &Request::UpdateBadge { count });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::messaging::channel;

    #[tokio::test]
    async fn test_gone_relay_yields_none() {
        let (endpoint, mailbox) = channel();
        drop(mailbox);
        let client = BusRelayClient::new(Arc::new(endpoint));
        assert_eq!(client.fetch_image("https://x/y.png").await, None);
        client.update_badge(3);
    }

    #[tokio::test]
    async fn test_badge_is_posted() {
        let (endpoint, mut mailbox) = channel();
        let client = BusRelayClient::new(Arc::new(endpoint));
        client.update_badge(5);
        let incoming = mailbox.recv().await.unwrap();
        assert_eq!(incoming.request, Request::UpdateBadge { count: 5 });
    }
}
