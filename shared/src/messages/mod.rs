mod diagnostics;
mod dispatch;
mod error;
mod handlers;
mod message;
mod system;

pub use diagnostics::{MessageDiagnostics, MessageStats};
pub use dispatch::dispatch_batch;
pub use error::{DispatchError, MessageError};
pub use handlers::{HandlerResult, MessageHandlers};
pub use message::{pack, stable_hash, stable_id, unpack, unpack_id, Message, ID_SIZE};
pub use system::{
    NetworkPingMessage, NetworkPongMessage, NotReadyMessage, ReadyMessage, TimeSnapshotMessage,
};
