use tern_serde::SerdeErr;
use thiserror::Error;

use crate::types::ConnectionId;

/// Errors that can occur while registering message handlers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// Two different message names hash to the same id
    #[error("Message {name} has id {id}, which is already used by {existing}. Rename one of the messages")]
    IdCollision {
        id: u16,
        name: &'static str,
        existing: &'static str,
    },
}

/// Why an inbound message was rejected. Every variant costs the sending
/// connection its connection; none of them reach past the dispatch call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Message is too short to hold an id
    #[error("Message of {length} bytes is too short for the message id header")]
    MissingMessageId { length: usize },

    /// No handler registered for the id
    #[error("No handler registered for message id {id}")]
    UnknownMessageId { id: u16 },

    /// Handler requires an authenticated connection
    #[error("{connection_id} sent {message} before authenticating")]
    Unauthenticated {
        message: &'static str,
        connection_id: ConnectionId,
    },

    /// Message body failed to deserialize
    #[error("Failed to deserialize {message}: {error}")]
    Malformed {
        message: &'static str,
        error: SerdeErr,
    },

    /// Handler returned an error
    #[error("Handler for {message} failed: {reason}")]
    HandlerFailed {
        message: &'static str,
        reason: String,
    },

    /// Handler panicked
    #[error("Handler for {message} panicked: {reason}")]
    HandlerPanicked {
        message: &'static str,
        reason: String,
    },
}
