use tern_shared::ConnectionQuality;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientEvent {
    /// The transport finished connecting to the server
    Connected,
    /// The connection is gone and has been cleaned up
    Disconnected,
    /// The server asked the client to stop expecting entity state
    NotReady,
    QualityChanged {
        previous: ConnectionQuality,
        current: ConnectionQuality,
    },
}
