/// Lifecycle of a connection. Only ever moves forward, except for the ready
/// flag which may toggle while connected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Created, waiting for the transport to confirm
    Connecting,
    /// Connected. `ready` means the peer finished loading and receives
    /// entity state.
    Connected { ready: bool },
    /// Disconnect requested, waiting for the transport to confirm
    Disconnecting,
    /// Torn down
    Disconnected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected { .. })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ConnectionState::Connected { ready: true })
    }
}
