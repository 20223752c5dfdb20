//! Message Bus
//!
//! Point-to-point command delivery with a single acknowledgement per message.
//!
//! ```text
//! sender ── Messenger::send(target, cmd) ──▶ Mailbox(target) ──▶ handler
//!    ▲                                                            │
//!    └──────────────────── Ack (exactly once) ◀── Responder ◀─────┘
//! ```
//!
//! `Responder` is consumed by `send`; dropping it unanswered still sends an
//! empty `Ack`, so a sender can never wait on a message that was handled
//! (or discarded) without a reply.

use crate::messages::{Ack, Command, Envelope};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Errors surfaced to a sender
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Unknown target instance: {0}")]
    Unreachable(String),

    #[error("Target {0} closed before acknowledging")]
    Closed(String),

    #[error("Timed out waiting for acknowledgement from {0}")]
    Timeout(String),

    #[error("Frame error: {0}")]
    Frame(#[from] crate::framing::FrameError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outbound side of a transport
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Id of the instance this messenger sends as
    fn instance_id(&self) -> &str;

    /// Send a command and wait for its acknowledgement
    async fn send(&self, target: &str, command: Command) -> Result<Ack, TransportError>;
}

/// One-shot acknowledgement handle for an inbound message
#[derive(Debug)]
pub struct Responder {
    tx: Option<oneshot::Sender<Ack>>,
}

impl Responder {
    /// Create a responder and the receiver its acknowledgement arrives on
    pub fn new() -> (Self, oneshot::Receiver<Ack>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Send the acknowledgement, consuming the responder
    pub fn send(mut self, ack: Ack) {
        if let Some(tx) = self.tx.take() {
            // sender may have given up; nothing to do then
            let _ = tx.send(ack);
        }
    }

    /// Send an empty acknowledgement
    pub fn ack(self) {
        self.send(Ack::default());
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Ack::default());
        }
    }
}

/// A message delivered to an instance together with its reply handle
#[derive(Debug)]
pub struct Inbound {
    /// The routed command
    pub envelope: Envelope,
    /// Must be answered (or dropped) exactly once
    pub responder: Responder,
}

/// Sending half feeding a `Mailbox`
pub type InboxSender = mpsc::UnboundedSender<Inbound>;

/// Receiving side of an instance's inbound messages
#[derive(Debug)]
pub struct Mailbox {
    rx: mpsc::UnboundedReceiver<Inbound>,
}

impl Mailbox {
    /// Create a mailbox and the sender that feeds it
    pub fn channel() -> (InboxSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// Next inbound message, `None` once every sender is gone
    pub async fn recv(&mut self) -> Option<Inbound> {
        self.rx.recv().await
    }
}

/// In-process bus connecting any number of instances
#[derive(Debug, Clone, Default)]
pub struct LocalBus {
    routes: Arc<Mutex<HashMap<String, InboxSender>>>,
}

impl LocalBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an instance, returning its outbound endpoint and mailbox.
    ///
    /// Re-attaching an id replaces the previous route.
    pub fn endpoint(&self, instance_id: impl Into<String>) -> (LocalEndpoint, Mailbox) {
        let instance_id = instance_id.into();
        let (tx, mailbox) = Mailbox::channel();
        self.routes.lock().insert(instance_id.clone(), tx);
        (
            LocalEndpoint {
                instance_id,
                bus: self.clone(),
            },
            mailbox,
        )
    }

    /// Detach an instance; later sends to it fail with `Unreachable`
    pub fn detach(&self, instance_id: &str) {
        self.routes.lock().remove(instance_id);
    }

    fn route(&self, target: &str) -> Option<InboxSender> {
        self.routes.lock().get(target).cloned()
    }
}

/// Outbound handle of one instance on a `LocalBus`
#[derive(Debug, Clone)]
pub struct LocalEndpoint {
    instance_id: String,
    bus: LocalBus,
}

#[async_trait]
impl Messenger for LocalEndpoint {
    fn instance_id(&self) -> &str {
        &self.instance_id
    }

    async fn send(&self, target: &str, command: Command) -> Result<Ack, TransportError> {
        let route = self
            .bus
            .route(target)
            .ok_or_else(|| TransportError::Unreachable(target.to_string()))?;

        debug!(from = %self.instance_id, to = target, command = command.name(), "sending");

        let (responder, reply) = Responder::new();
        let envelope = Envelope::new(self.instance_id.clone(), target, command);
        route
            .send(Inbound {
                envelope,
                responder,
            })
            .map_err(|_| TransportError::Closed(target.to_string()))?;

        reply
            .await
            .map_err(|_| TransportError::Closed(target.to_string()))
    }
}
