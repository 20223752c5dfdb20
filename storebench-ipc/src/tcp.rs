//! TCP Transport
//!
//! One connection per message: the sender writes an `Envelope` frame and reads
//! back a single `Ack` frame. Lets primary and secondaries run as separate
//! processes or on separate hosts.

use crate::bus::{Inbound, InboxSender, Messenger, Responder, TransportError};
use crate::framing::{read_frame, write_frame};
use crate::messages::{Ack, Command, Envelope};
use async_trait::async_trait;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};

/// Outbound TCP messenger with a static address book
#[derive(Debug, Clone)]
pub struct TcpMessenger {
    instance_id: String,
    peers: HashMap<String, SocketAddr>,
    reply_timeout: Option<Duration>,
}

impl TcpMessenger {
    /// Create a messenger sending as `instance_id`
    pub fn new(instance_id: impl Into<String>, peers: HashMap<String, SocketAddr>) -> Self {
        Self {
            instance_id: instance_id.into(),
            peers,
            reply_timeout: None,
        }
    }

    /// Give up on an acknowledgement after `timeout`
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = Some(timeout);
        self
    }

    async fn exchange(&self, addr: SocketAddr, envelope: &Envelope) -> Result<Ack, TransportError> {
        let mut stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        write_frame(&mut stream, envelope).await?;
        Ok(read_frame::<_, Ack>(&mut stream).await?)
    }
}

#[async_trait]
impl Messenger for TcpMessenger {
    fn instance_id(&self) -> &str {
        &self.instance_id
    }

    async fn send(&self, target: &str, command: Command) -> Result<Ack, TransportError> {
        let addr = *self
            .peers
            .get(target)
            .ok_or_else(|| TransportError::Unreachable(target.to_string()))?;

        debug!(from = %self.instance_id, to = target, %addr, command = command.name(), "sending");
        let envelope = Envelope::new(self.instance_id.clone(), target, command);

        match self.reply_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.exchange(addr, &envelope))
                .await
                .map_err(|_| TransportError::Timeout(target.to_string()))?,
            None => self.exchange(addr, &envelope).await,
        }
    }
}

/// Accept connections forever, feeding every received envelope into `inbox`.
///
/// Each connection carries one envelope; the `Ack` produced by the handler is
/// written back before the connection closes. Envelopes with a different
/// protocol version are acknowledged with an error and never delivered.
pub async fn serve_tcp(listener: TcpListener, inbox: InboxSender) -> std::io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let inbox = inbox.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, inbox).await {
                warn!(%peer, error = %e, "connection failed");
            }
        });
    }
}

async fn handle_connection(mut stream: TcpStream, inbox: InboxSender) -> Result<(), TransportError> {
    let envelope: Envelope = read_frame(&mut stream).await?;

    if envelope.protocol_version != crate::PROTOCOL_VERSION {
        warn!(
            from = %envelope.from,
            got = envelope.protocol_version,
            expected = crate::PROTOCOL_VERSION,
            "protocol version mismatch"
        );
        let ack = Ack::error(format!(
            "protocol version {} not supported (expected {})",
            envelope.protocol_version,
            crate::PROTOCOL_VERSION
        ));
        write_frame(&mut stream, &ack).await?;
        return Ok(());
    }

    let (responder, reply) = Responder::new();
    let target = envelope.to.clone();
    inbox
        .send(Inbound {
            envelope,
            responder,
        })
        .map_err(|_| TransportError::Closed(target.clone()))?;

    let ack = reply.await.map_err(|_| TransportError::Closed(target))?;
    write_frame(&mut stream, &ack).await?;
    Ok(())
}
