use std::collections::HashSet;

use log::{error, info, trace, warn};
use tern_serde::WriterPool;

use crate::{
    batching::{BatchError, Batcher, UnbatchedMessage, Unbatcher},
    connection::{ConnectionConfig, ConnectionError, ConnectionState},
    messages::{pack, Message, MessageDiagnostics},
    network_time::NetworkTime,
    snapshot_interpolation::{SnapshotTimeline, TimeSnapshot},
    transport::Transport,
    types::{Channel, ConnectionId, HostType, NetworkId},
};

/// Entity sets handed back when a connection is torn down
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ConnectionTeardown {
    pub observing: HashSet<NetworkId>,
    pub owned: HashSet<NetworkId>,
}

/// Represents a connection to a remote host, and provides functionality to
/// manage the connection and the communications to it.
///
/// Sending never touches the transport: messages are batched per channel and
/// only handed over in `update`, once per tick. Disconnecting is two-phase:
/// `disconnect` only raises a request, teardown happens in `cleanup` once the
/// transport reports the connection closed.
pub struct Connection {
    id: ConnectionId,
    host_type: HostType,
    state: ConnectionState,
    is_authenticated: bool,
    local_time: f64,
    last_message_time: f64,
    remote_time_stamp: f64,
    owned: HashSet<NetworkId>,
    observing: HashSet<NetworkId>,
    // indexed by Channel::id
    batchers: [Batcher; 2],
    max_message_sizes: [usize; 2],
    unbatcher: Unbatcher,
    timeline: SnapshotTimeline,
    network_time: NetworkTime,
    diagnostics: MessageDiagnostics,
    writer_pool: WriterPool,
    disconnect_requested: bool,
}

impl Connection {
    /// Creates a new Connection in the `Connecting` state. Batch sizes are
    /// taken from the transport's limits.
    pub fn new(
        id: ConnectionId,
        host_type: HostType,
        config: &ConnectionConfig,
        timeline: SnapshotTimeline,
        transport: &dyn Transport,
        now: f64,
    ) -> Self {
        let batcher = |channel| Batcher::new(transport.batch_threshold(channel));
        let max_message_size = |channel| {
            let max_packet_size = transport.max_packet_size(channel);
            max_packet_size.saturating_sub(Batcher::max_message_overhead(max_packet_size))
        };

        Self {
            id,
            host_type,
            state: ConnectionState::Connecting,
            is_authenticated: false,
            local_time: now,
            last_message_time: now,
            remote_time_stamp: 0.0,
            owned: HashSet::new(),
            observing: HashSet::new(),
            batchers: [batcher(Channel::Reliable), batcher(Channel::Unreliable)],
            max_message_sizes: [
                max_message_size(Channel::Reliable),
                max_message_size(Channel::Unreliable),
            ],
            unbatcher: Unbatcher::new(),
            timeline,
            network_time: NetworkTime::new(config.ping_interval, config.ping_window_size),
            diagnostics: MessageDiagnostics::new(),
            writer_pool: WriterPool::new(),
            disconnect_requested: false,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn host_type(&self) -> HostType {
        self.host_type
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    /// The transport confirmed the connection
    pub fn on_connected(&mut self) {
        if self.state == ConnectionState::Connecting {
            info!("{} connected", self.id);
            self.state = ConnectionState::Connected { ready: false };
        }
    }

    /// Toggles readiness. Only has an effect while connected. Returns true if
    /// the state changed.
    pub fn set_ready(&mut self, ready: bool) -> bool {
        match self.state {
            ConnectionState::Connected { ready: current } if current != ready => {
                self.state = ConnectionState::Connected { ready };
                true
            }
            _ => false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn set_authenticated(&mut self, authenticated: bool) {
        self.is_authenticated = authenticated;
    }

    /// Local time of the current tick, used to stamp outgoing batches
    pub fn local_time(&self) -> f64 {
        self.local_time
    }

    pub fn set_local_time(&mut self, now: f64) {
        self.local_time = now;
    }

    /// Largest packed message (id included) that fits into a batch
    pub fn max_message_size(&self, channel: Channel) -> usize {
        self.max_message_sizes[channel.id() as usize]
    }

    /// Packs `message` and queues it on `channel`. Oversized messages are
    /// rejected whole, nothing of them is queued.
    pub fn send<M: Message>(&mut self, message: &M, channel: Channel) -> Result<(), ConnectionError> {
        if !self.state.is_connected() {
            return Err(ConnectionError::NotConnected {
                message: M::NAME,
                connection_id: self.id,
                state: self.state,
            });
        }

        let max = self.max_message_size(channel);
        let mut writer = self.writer_pool.scoped();
        pack(message, &mut writer);

        let size = writer.len();
        if size > max {
            error!(
                "{} tried to send {} of {} bytes on {:?} channel, limit is {} bytes",
                self.id,
                M::NAME,
                size,
                channel,
                max
            );
            return Err(ConnectionError::MessageTooLarge {
                message: M::NAME,
                size,
                max,
                channel,
            });
        }

        self.diagnostics.on_send(M::ID, size);
        self.batchers[channel.id() as usize].add_message(writer.as_slice(), self.local_time);
        Ok(())
    }

    pub fn has_pending(&self) -> bool {
        self.batchers.iter().any(|batcher| batcher.has_pending())
    }

    /// Hands every pending batch to the transport, channel by channel, in
    /// the order the messages were sent
    pub fn update(&mut self, transport: &mut dyn Transport, now: f64) {
        self.local_time = now;
        if self.state == ConnectionState::Disconnected {
            return;
        }

        let mut writer = self.writer_pool.scoped();
        for channel in Channel::ALL {
            let batcher = &mut self.batchers[channel.id() as usize];
            while batcher.get_batch(&mut writer) {
                trace!("{} flushing {} bytes on {:?}", self.id, writer.len(), channel);
                if let Err(send_error) = transport.send(self.id, writer.as_slice(), channel) {
                    warn!("{} failed to send batch: {}", self.id, send_error);
                }
            }
        }
    }

    /// True if data arrived within the last `timeout` seconds
    pub fn is_alive(&self, now: f64, timeout: f64) -> bool {
        now - self.last_message_time < timeout
    }

    pub fn last_message_time(&self) -> f64 {
        self.last_message_time
    }

    /// Remote time of the batch the current message came from
    pub fn remote_time_stamp(&self) -> f64 {
        self.remote_time_stamp
    }

    /// Requests a disconnect. The owner forwards the request to the
    /// transport; teardown waits for the transport's confirmation.
    pub fn disconnect(&mut self) {
        match self.state {
            ConnectionState::Disconnecting | ConnectionState::Disconnected => {}
            ConnectionState::Connecting | ConnectionState::Connected { .. } => {
                info!("{} disconnect requested", self.id);
                self.state = ConnectionState::Disconnecting;
                self.disconnect_requested = true;
            }
        }
    }

    pub fn is_disconnect_requested(&self) -> bool {
        self.state == ConnectionState::Disconnecting
    }

    /// Returns true once per `disconnect` call that still has to be
    /// forwarded to the transport
    pub fn take_disconnect_request(&mut self) -> bool {
        std::mem::take(&mut self.disconnect_requested)
    }

    /// Tears the connection down. The first call returns everything the
    /// connection owned and observed, later calls return None.
    pub fn cleanup(&mut self) -> Option<ConnectionTeardown> {
        if self.state == ConnectionState::Disconnected {
            return None;
        }
        info!("{} disconnected", self.id);

        self.state = ConnectionState::Disconnected;
        self.disconnect_requested = false;
        for batcher in &mut self.batchers {
            batcher.clear();
        }
        self.unbatcher.clear();
        self.timeline.reset();

        Some(ConnectionTeardown {
            observing: std::mem::take(&mut self.observing),
            owned: std::mem::take(&mut self.owned),
        })
    }

    /// Queues one received batch
    pub fn receive_batch(&mut self, bytes: &[u8], now: f64) -> Result<(), BatchError> {
        self.last_message_time = now;
        self.local_time = now;
        self.unbatcher.add_batch(bytes)
    }

    /// Received batches not fully dispatched yet
    pub fn queued_batches(&self) -> usize {
        self.unbatcher.batches_count()
    }

    /// Next message out of the received batches. Updates the remote time
    /// stamp to the message's batch.
    pub fn next_message(&mut self) -> Result<Option<UnbatchedMessage>, BatchError> {
        let message = self.unbatcher.next_message()?;
        if let Some(message) = &message {
            self.remote_time_stamp = message.remote_time;
        }
        Ok(message)
    }

    /// Records the current batch's remote time against the local time
    pub fn on_time_snapshot(&mut self) -> bool {
        let snapshot = TimeSnapshot::new(self.remote_time_stamp, self.local_time);
        self.timeline.on_time_snapshot(snapshot)
    }

    pub fn timeline(&self) -> &SnapshotTimeline {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut SnapshotTimeline {
        &mut self.timeline
    }

    pub fn network_time(&self) -> &NetworkTime {
        &self.network_time
    }

    pub fn network_time_mut(&mut self) -> &mut NetworkTime {
        &mut self.network_time
    }

    pub fn diagnostics(&self) -> &MessageDiagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut MessageDiagnostics {
        &mut self.diagnostics
    }

    // Owned entities

    pub fn owned(&self) -> &HashSet<NetworkId> {
        &self.owned
    }

    pub fn add_owned(&mut self, entity: NetworkId) {
        self.owned.insert(entity);
    }

    pub fn remove_owned(&mut self, entity: &NetworkId) -> bool {
        self.owned.remove(entity)
    }

    // Observed entities

    pub fn observing(&self) -> &HashSet<NetworkId> {
        &self.observing
    }

    pub fn is_observing(&self, entity: &NetworkId) -> bool {
        self.observing.contains(entity)
    }

    pub fn add_observing(&mut self, entity: NetworkId) -> bool {
        self.observing.insert(entity)
    }

    pub fn remove_observing(&mut self, entity: &NetworkId) -> bool {
        self.observing.remove(entity)
    }
}
