//! # Tern Client
//! A client that batches messages to a server, follows the server's
//! timeline through a jitter buffer, and reports its connection quality.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use tern_shared::{
        Channel, ConnectionId, ConnectionQuality, ConnectionQualityMethod, HandlerResult, Message,
        NetworkReader, NetworkWriter, Serde, SerdeErr, Transport, TransportError, TransportEvent,
    };
}

mod client;
mod error;
mod events;

pub use client::{Client, ClientConfig};
pub use error::ClientError;
pub use events::ClientEvent;
