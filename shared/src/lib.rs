//! # Tern Shared
//! Common functionality shared between tern-server & tern-client crates:
//! batching, message framing and dispatch, connections, snapshot
//! interpolation and the timing utilities they are built on.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use tern_serde::{
    var_uint_size, NetworkReader, NetworkWriter, PooledWriter, Serde, SerdeErr, WriterPool,
};

mod accurate_interval;
mod batching;
mod connection;
mod connection_quality;
mod ema;
mod messages;
mod network_time;
mod snapshot_interpolation;
mod transport;
mod types;

pub use accurate_interval::AccurateInterval;
pub use batching::{BatchError, Batcher, UnbatchedMessage, Unbatcher, TIMESTAMP_SIZE};
pub use connection::{
    Connection, ConnectionConfig, ConnectionError, ConnectionState, ConnectionTeardown,
};
pub use connection_quality::{ConnectionQuality, ConnectionQualityMethod};
pub use ema::ExponentialMovingAverage;
pub use messages::{
    dispatch_batch, pack, stable_hash, stable_id, unpack, unpack_id, DispatchError,
    HandlerResult, Message, MessageDiagnostics, MessageError, MessageHandlers, MessageStats,
    NetworkPingMessage, NetworkPongMessage, NotReadyMessage, ReadyMessage, TimeSnapshotMessage,
    ID_SIZE,
};
pub use network_time::NetworkTime;
pub use snapshot_interpolation::{
    dynamic_adjustment, insert_and_adjust, insert_if_not_exists, inverse_lerp, sample, step,
    step_interpolation, step_time, timeline_clamp, timescale, Interpolated, Snapshot,
    SnapshotBuffer, SnapshotInterpolationSettings, SnapshotTimeline, TimeSnapshot,
};
pub use transport::{Transport, TransportError, TransportEvent};
pub use types::{Channel, ConnectionId, HostType, NetworkId};
