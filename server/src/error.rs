use thiserror::Error;

use tern_shared::{ConnectionError, ConnectionId, MessageError, NetworkId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    #[error("No connection with id {connection_id}")]
    UnknownConnection { connection_id: ConnectionId },

    #[error("No spawned entity with id {entity}")]
    UnknownEntity { entity: NetworkId },

    #[error("Entity {entity} is already spawned")]
    EntityAlreadySpawned { entity: NetworkId },

    /// The transport reported a connection under the id reserved for the
    /// host connection
    #[error("Connection id {connection_id} is reserved for the host connection")]
    ReservedConnectionId { connection_id: ConnectionId },

    #[error("A host connection is already active")]
    HostAlreadyActive,

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Message(#[from] MessageError),
}
