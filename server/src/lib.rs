//! # Tern Server
//! A server that batches messages to connected clients, reconstructs each
//! client's timeline from the time snapshots it sends, and decides which
//! clients observe which entities.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use tern_shared::{
        Channel, ConnectionId, ConnectionQuality, HandlerResult, Message, NetworkId,
        NetworkReader, NetworkWriter, Serde, SerdeErr, Transport, TransportError, TransportEvent,
    };
}

mod error;
mod events;
mod interest;
mod server;

pub use error::ServerError;
pub use events::ServerEvent;
pub use interest::{
    diff_observers, AllVisible, InterestManagement, ObserverDiff, PredicateInterest, Visibility,
};
pub use server::{Server, ServerConfig, HOST_MAX_PACKET_SIZE};
