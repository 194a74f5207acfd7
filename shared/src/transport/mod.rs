mod error;

pub use error::TransportError;

use crate::types::{Channel, ConnectionId};

/// Something that happened at the transport level, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A peer finished connecting
    Connected(ConnectionId),
    /// One batch arrived from a peer
    Data {
        connection_id: ConnectionId,
        bytes: Vec<u8>,
        channel: Channel,
    },
    /// A peer is gone, whether it left or was kicked
    Disconnected(ConnectionId),
}

/// The physical packet layer, injected by the application.
///
/// Implementations deliver whole byte buffers per channel. The core only
/// ever hands over complete batches, at most `batch_threshold` bytes unless
/// a single oversized message had to go out alone.
pub trait Transport {
    fn send(
        &mut self,
        connection_id: ConnectionId,
        bytes: &[u8],
        channel: Channel,
    ) -> Result<(), TransportError>;

    /// Largest buffer the transport can deliver on `channel`
    fn max_packet_size(&self, channel: Channel) -> usize;

    /// Preferred batch size on `channel`. Smaller than `max_packet_size` for
    /// transports that want to stay under an MTU for unreliable traffic.
    fn batch_threshold(&self, channel: Channel) -> usize {
        self.max_packet_size(channel)
    }

    /// Requests that the connection be closed. Completion is reported later
    /// through a `TransportEvent::Disconnected`.
    fn disconnect(&mut self, connection_id: ConnectionId);

    /// Next pending event, if any
    fn poll(&mut self) -> Option<TransportEvent>;
}
