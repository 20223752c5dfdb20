#![warn(missing_docs)]
//! StoreBench IPC Protocol
//!
//! Typed command messages exchanged between primary and secondary instances.
//! Uses rkyv for binary serialization on the wire and provides two transports:
//! an in-process bus and a TCP transport with length-prefixed frames.
//!
//! Delivery is best-effort. The only hard rule is that every inbound message
//! is acknowledged exactly once, which `Responder` enforces.

mod bus;
mod framing;
mod messages;
mod tcp;

pub use bus::{
    Inbound, InboxSender, LocalBus, LocalEndpoint, Mailbox, Messenger, Responder, TransportError,
};
pub use framing::{FrameError, MAX_FRAME_SIZE, read_frame, write_frame};
pub use messages::{Ack, Command, Envelope, LoadAction, LoadRequest, MonitoringReport};
pub use tcp::{TcpMessenger, serve_tcp};

/// Protocol version for compatibility checking
pub const PROTOCOL_VERSION: u32 = 1;

/// Reserved series key for ad-hoc sampling sessions requested by a primary
pub const REQUESTED_MONITORING: &str = "requestedMonitoring";
