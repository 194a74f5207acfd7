use std::collections::VecDeque;

use tern_shared::{Channel, ConnectionId, Transport, TransportError, TransportEvent};

/// Largest batch exchanged with the in-process client
pub const HOST_MAX_PACKET_SIZE: usize = 64 * 1024;

/// Transport for the host connection. Nothing leaves the process: batches
/// are kept until the in-process client picks them up.
pub(crate) struct HostLoopback {
    outgoing: VecDeque<(Channel, Vec<u8>)>,
    events: VecDeque<TransportEvent>,
}

impl HostLoopback {
    pub fn new() -> Self {
        Self {
            outgoing: VecDeque::new(),
            events: VecDeque::new(),
        }
    }

    pub fn take_outgoing(&mut self) -> Vec<(Channel, Vec<u8>)> {
        self.outgoing.drain(..).collect()
    }
}

impl Transport for HostLoopback {
    fn send(
        &mut self,
        connection_id: ConnectionId,
        bytes: &[u8],
        channel: Channel,
    ) -> Result<(), TransportError> {
        if connection_id != ConnectionId::LOCAL {
            return Err(TransportError::UnknownConnection { connection_id });
        }
        self.outgoing.push_back((channel, bytes.to_vec()));
        Ok(())
    }

    fn max_packet_size(&self, _channel: Channel) -> usize {
        HOST_MAX_PACKET_SIZE
    }

    fn disconnect(&mut self, connection_id: ConnectionId) {
        if connection_id == ConnectionId::LOCAL {
            self.outgoing.clear();
            self.events
                .push_back(TransportEvent::Disconnected(ConnectionId::LOCAL));
        }
    }

    fn poll(&mut self) -> Option<TransportEvent> {
        self.events.pop_front()
    }
}
