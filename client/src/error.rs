use thiserror::Error;

use tern_shared::{ConnectionError, MessageError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("The client is not connected to a server")]
    NotConnected,

    #[error("The client is already connecting or connected")]
    AlreadyConnected,

    #[error("The client already reported ready")]
    AlreadyReady,

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Message(#[from] MessageError),
}
