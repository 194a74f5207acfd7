use thiserror::Error;

use crate::{
    connection::ConnectionState,
    types::{Channel, ConnectionId},
};

/// Errors that can occur when sending through a connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// Packed message can never fit into a batch on this channel
    #[error("Message {message} is {size} bytes, the limit on the {channel:?} channel is {max} bytes. Split it up or send it on a channel with larger packets")]
    MessageTooLarge {
        message: &'static str,
        size: usize,
        max: usize,
        channel: Channel,
    },

    /// Connection isn't connected
    #[error("Cannot send {message} through {connection_id} in state {state:?}")]
    NotConnected {
        message: &'static str,
        connection_id: ConnectionId,
        state: ConnectionState,
    },
}
