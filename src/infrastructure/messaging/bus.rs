//! In-process message bus
//!
//! Each execution context owns a [`Mailbox`]; other contexts hold
//! [`Endpoint`]s to it. Requests and replies travel as JSON text so both
//! ends only share the wire format.

use crate::domain::entities::{ReplyMode, Request, TabId};
use crate::domain::repositories::{BusError, MessagePort, RequestHandler};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

#[derive(Debug)]
struct Envelope {
    body: String,
    sender: Option<TabId>,
    reply: Option<oneshot::Sender<String>>,
}

/// Sending handle to a mailbox
#[derive(Debug, Clone)]
pub struct Endpoint {
    tx: mpsc::UnboundedSender<Envelope>,
    sender: Option<TabId>,
}

/// Receiving side of a context
#[derive(Debug)]
pub struct Mailbox {
    rx: mpsc::UnboundedReceiver<Envelope>,
}

/// Creates a mailbox and an anonymous endpoint addressing it
pub fn channel() -> (Endpoint, Mailbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Endpoint { tx, sender: None }, Mailbox { rx })
}

impl Endpoint {
    /// Same mailbox, with requests stamped as coming from `tab`
    pub fn from_tab(&self, tab: TabId) -> Endpoint {
        Endpoint {
            tx: self.tx.clone(),
            sender: Some(tab),
        }
    }

    /// Whether the receiving context still exists
    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }

    fn send(&self, request: &Request, reply: Option<oneshot::Sender<String>>) -> Result<(), BusError> {
        let envelope = Envelope {
            body: serde_json::to_string(request)?,
            sender: self.sender,
            reply,
        };
        self.tx.send(envelope).map_err(|_| BusError::ReceiverGone)
    }
}

#[async_trait]
impl MessagePort for Endpoint {
    async fn call(&self, request: &Request) -> Result<String, BusError> {
        if request.reply_mode() == ReplyMode::FireAndForget {
            return Err(BusError::NoReplyExpected(request.kind()));
        }
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(request, Some(reply_tx))?;
        reply_rx.await.map_err(|_| BusError::NoReply)
    }

    fn post(&self, request: &Request) -> Result<(), BusError> {
        self.send(request, None)
    }
}

/// A decoded request waiting for its answer
#[derive(Debug)]
pub struct Incoming {
    pub request: Request,
    pub sender: Option<TabId>,
    reply: Option<oneshot::Sender<String>>,
}

impl Incoming {
    /// Whether the sender is waiting for a reply
    pub fn expects_reply(&self) -> bool {
        self.reply.is_some()
    }

    /// Sends the reply; a vanished requester is not an error
    pub fn respond(self, body: &impl serde::Serialize) -> Result<(), BusError> {
        let Some(reply) = self.reply else {
            return Ok(());
        };
        let raw = serde_json::to_string(body)?;
        if reply.send(raw).is_err() {
            tracing::debug!("{} requester went away", self.request.kind());
        }
        Ok(())
    }
}

impl Mailbox {
    /// Waits for the next well-formed request
    ///
    /// Malformed bodies are dropped, which closes their reply channel.
    pub async fn recv(&mut self) -> Option<Incoming> {
        loop {
            let envelope = self.rx.recv().await?;
            match serde_json::from_str::<Request>(&envelope.body) {
                Ok(request) => {
                    return Some(Incoming {
                        request,
                        sender: envelope.sender,
                        reply: envelope.reply,
                    });
                }
                Err(e) => tracing::debug!("dropping malformed message: {e}"),
            }
        }
    }

    /// Closes the mailbox; pending and future sends fail
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// Serves every request in `mailbox` with `handler`
///
/// Each request runs on its own task, so a slow `TOGGLE_SCANNING` never
/// holds up a `GET_RESULTS`. Ends when every endpoint is dropped.
pub fn serve(mut mailbox: Mailbox, handler: Arc<dyn RequestHandler>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(incoming) = mailbox.recv().await {
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                let kind = incoming.request.kind();
                let answer = handler
                    .handle(incoming.request.clone(), incoming.sender)
                    .await;
                let Some(answer) = answer else {
                    return;
                };
                if let Err(e) = incoming.respond(&answer) {
                    tracing::debug!("{kind} reply failed: {e}");
                }
            });
        }
    })
}
