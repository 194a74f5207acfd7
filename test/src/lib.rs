pub mod helpers;
pub mod local_transport;

pub use helpers::*;
pub use local_transport::{
    LinkConditioner, LocalClientTransport, LocalNetwork, LocalServerTransport,
    RELIABLE_MAX_PACKET_SIZE, UNRELIABLE_MAX_PACKET_SIZE,
};
pub use test_protocol::{ChatMessage, PanicMessage, PositionMessage};
