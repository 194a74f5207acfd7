use tern_shared::{ConnectionId, NetworkId};

/// Something the application should react to, in the order it happened
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerEvent {
    /// A client connected
    Connected(ConnectionId),
    /// A client is gone and has been cleaned up
    Disconnected(ConnectionId),
    /// A client finished loading and started observing entities
    Ready(ConnectionId),
    /// `connection` started observing `entity`: send it the entity's state
    Spawn {
        connection: ConnectionId,
        entity: NetworkId,
    },
    /// `connection` stopped observing `entity`
    Despawn {
        connection: ConnectionId,
        entity: NetworkId,
    },
    /// Host mode: show or hide `entity` for the in-process client, without
    /// despawning it
    HostVisibility { entity: NetworkId, visible: bool },
}
