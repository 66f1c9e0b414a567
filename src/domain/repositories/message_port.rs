//! Message port traits
//!
//! A port sends [`Request`]s to another execution context; a handler
//! answers them on the receiving side. Delivery is best-effort: the other
//! context may vanish at any time (navigation, tab close).

use crate::domain::entities::{Reply, Request, TabId};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors that can occur on a cross-context call
#[derive(Error, Debug)]
pub enum BusError {
    #[error("Receiving end does not exist")]
    ReceiverGone,

    #[error("Receiver closed the channel without replying")]
    NoReply,

    #[error("{0} does not take a reply")]
    NoReplyExpected(&'static str),

    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Sending side of a cross-context channel
#[async_trait]
pub trait MessagePort: Send + Sync {
    /// Sends a request and waits for the raw JSON reply
    async fn call(&self, request: &Request) -> Result<String, BusError>;

    /// Sends a request without keeping the channel open
    fn post(&self, request: &Request) -> Result<(), BusError>;
}

/// Receiving side of a cross-context channel
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handles one request; `None` means no reply is sent
    async fn handle(&self, request: Request, sender: Option<TabId>) -> Option<Reply>;
}

/// Sends a request and decodes the reply as `T`
pub async fn request<T, P>(port: &P, request: &Request) -> Result<T, BusError>
where
    T: DeserializeOwned,
    P: MessagePort + ?Sized,
{
    let raw = port.call(request).await?;
    Ok(serde_json::from_str(&raw)?)
}

/// Like [`request`], but a failed delivery is logged and swallowed
pub async fn request_or_swallow<T, P>(port: &P, req: &Request) -> Option<T>
where
    T: DeserializeOwned,
    P: MessagePort + ?Sized,
{
    match request(port, req).await {
        Ok(reply) => Some(reply),
        Err(e) => {
            tracing::debug!("{} swallowed: {e}", req.kind());
            None
        }
    }
}

/// Posts a request, logging and swallowing delivery failures
pub fn post_or_swallow<P>(port: &P, req: &Request)
where
    P: MessagePort + ?Sized,
{
    if let Err(e) = port.post(req) {
        tracing::debug!("{} swallowed: {e}", req.kind());
    }
}
