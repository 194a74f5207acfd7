use thiserror::Error;

use crate::types::{Channel, ConnectionId};

/// Errors a `Transport` implementation reports back when handed a batch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection is unknown to the transport, or already closed
    #[error("Transport has no open connection for {connection_id}")]
    UnknownConnection { connection_id: ConnectionId },

    /// Batch is larger than the transport can deliver on this channel
    #[error("Batch of {size} bytes exceeds the transport limit of {max} bytes on {channel:?} channel")]
    PacketTooLarge {
        size: usize,
        max: usize,
        channel: Channel,
    },

    /// Transport-specific failure
    #[error("Transport send failed: {reason}")]
    SendFailed { reason: String },
}
