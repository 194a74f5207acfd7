/// In-memory transport for end to end testing.
/// Routes batches between one server and any number of clients without
/// network I/O, optionally degrading the unreliable channel.
use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tern_shared::{Channel, ConnectionId, Transport, TransportError, TransportEvent};

pub const UNRELIABLE_MAX_PACKET_SIZE: usize = 1200;
pub const RELIABLE_MAX_PACKET_SIZE: usize = 16 * 1024;

/// Drops and delays unreliable batches. Reliable batches are never touched.
#[derive(Clone, Copy, Debug)]
pub struct LinkConditioner {
    /// Probability in `[0, 1]` that an unreliable batch is lost
    pub loss: f64,
    /// Unreliable batches are held back between 0 and this many ticks
    pub max_delay_ticks: u32,
    pub seed: u64,
}

impl LinkConditioner {
    pub fn jitter(max_delay_ticks: u32, seed: u64) -> Self {
        Self {
            loss: 0.0,
            max_delay_ticks,
            seed,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Server,
    Client(ConnectionId),
}

struct Delayed {
    release_tick: u64,
    to: Endpoint,
    event: TransportEvent,
}

struct NetworkState {
    next_id: u64,
    connected: HashSet<ConnectionId>,
    server_inbox: VecDeque<TransportEvent>,
    client_inboxes: HashMap<ConnectionId, VecDeque<TransportEvent>>,
    conditioner: Option<(LinkConditioner, fastrand::Rng)>,
    delayed: Vec<Delayed>,
    tick: u64,
    dropped: usize,
}

impl NetworkState {
    fn inbox(&mut self, to: Endpoint) -> Option<&mut VecDeque<TransportEvent>> {
        match to {
            Endpoint::Server => Some(&mut self.server_inbox),
            Endpoint::Client(id) => self.client_inboxes.get_mut(&id),
        }
    }

    fn deliver(&mut self, to: Endpoint, event: TransportEvent, channel: Channel) {
        if channel == Channel::Unreliable {
            if let Some((conditioner, rng)) = self.conditioner.as_mut() {
                if rng.f64() < conditioner.loss {
                    self.dropped += 1;
                    return;
                }
                let delay = rng.u32(0..=conditioner.max_delay_ticks);
                if delay > 0 {
                    self.delayed.push(Delayed {
                        release_tick: self.tick + u64::from(delay),
                        to,
                        event,
                    });
                    return;
                }
            }
        }
        if let Some(inbox) = self.inbox(to) {
            inbox.push_back(event);
        }
    }

    fn disconnect(&mut self, connection_id: ConnectionId) {
        if !self.connected.remove(&connection_id) {
            return;
        }
        self.server_inbox
            .push_back(TransportEvent::Disconnected(connection_id));
        if let Some(inbox) = self.client_inboxes.get_mut(&connection_id) {
            inbox.push_back(TransportEvent::Disconnected(ConnectionId::SERVER));
        }
    }
}

/// One server and its clients, sharing in-memory queues
#[derive(Clone)]
pub struct LocalNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl LocalNetwork {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(NetworkState {
                // 0 is the host connection
                next_id: 1,
                connected: HashSet::new(),
                server_inbox: VecDeque::new(),
                client_inboxes: HashMap::new(),
                conditioner: None,
                delayed: Vec::new(),
                tick: 0,
                dropped: 0,
            })),
        }
    }

    pub fn with_conditioner(conditioner: LinkConditioner) -> Self {
        let network = Self::new();
        network.lock().conditioner =
            Some((conditioner, fastrand::Rng::with_seed(conditioner.seed)));
        network
    }

    pub fn server_transport(&self) -> LocalServerTransport {
        LocalServerTransport {
            network: self.clone(),
        }
    }

    /// Opens a connection for a new client. Both sides see `Connected` on
    /// their next poll.
    pub fn connect_client(&self) -> LocalClientTransport {
        let mut state = self.lock();
        let id = ConnectionId(state.next_id);
        state.next_id += 1;

        state.connected.insert(id);
        state
            .server_inbox
            .push_back(TransportEvent::Connected(id));
        state.client_inboxes.insert(
            id,
            VecDeque::from([TransportEvent::Connected(ConnectionId::SERVER)]),
        );

        LocalClientTransport {
            network: self.clone(),
            id,
        }
    }

    /// Cuts a connection from outside, as if the link went down
    pub fn sever(&self, connection_id: ConnectionId) {
        self.lock().disconnect(connection_id);
    }

    /// Advances one tick and releases the delayed batches that are due
    pub fn tick(&self) {
        let mut state = self.lock();
        state.tick += 1;

        let tick = state.tick;
        let (due, pending): (Vec<Delayed>, Vec<Delayed>) = state
            .delayed
            .drain(..)
            .partition(|delayed| delayed.release_tick <= tick);
        state.delayed = pending;

        for delayed in due {
            let still_connected = match delayed.to {
                Endpoint::Server => true,
                Endpoint::Client(id) => state.connected.contains(&id),
            };
            if !still_connected {
                continue;
            }
            if let Some(inbox) = state.inbox(delayed.to) {
                inbox.push_back(delayed.event);
            }
        }
    }

    pub fn is_connected(&self, connection_id: ConnectionId) -> bool {
        self.lock().connected.contains(&connection_id)
    }

    /// Unreliable batches lost to the link conditioner so far
    pub fn dropped(&self) -> usize {
        self.lock().dropped
    }

    fn lock(&self) -> MutexGuard<'_, NetworkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LocalNetwork {
    fn default() -> Self {
        Self::new()
    }
}

fn check_size(bytes: &[u8], channel: Channel) -> Result<(), TransportError> {
    let max = max_packet_size(channel);
    if bytes.len() > max {
        return Err(TransportError::PacketTooLarge {
            size: bytes.len(),
            max,
            channel,
        });
    }
    Ok(())
}

fn max_packet_size(channel: Channel) -> usize {
    match channel {
        Channel::Reliable => RELIABLE_MAX_PACKET_SIZE,
        Channel::Unreliable => UNRELIABLE_MAX_PACKET_SIZE,
    }
}

// Server Transport

pub struct LocalServerTransport {
    network: LocalNetwork,
}

impl Transport for LocalServerTransport {
    fn send(
        &mut self,
        connection_id: ConnectionId,
        bytes: &[u8],
        channel: Channel,
    ) -> Result<(), TransportError> {
        check_size(bytes, channel)?;

        let mut state = self.network.lock();
        if !state.connected.contains(&connection_id) {
            return Err(TransportError::UnknownConnection { connection_id });
        }
        state.deliver(
            Endpoint::Client(connection_id),
            TransportEvent::Data {
                connection_id: ConnectionId::SERVER,
                bytes: bytes.to_vec(),
                channel,
            },
            channel,
        );
        Ok(())
    }

    fn max_packet_size(&self, channel: Channel) -> usize {
        max_packet_size(channel)
    }

    fn disconnect(&mut self, connection_id: ConnectionId) {
        self.network.lock().disconnect(connection_id);
    }

    fn poll(&mut self) -> Option<TransportEvent> {
        self.network.lock().server_inbox.pop_front()
    }
}

// Client Transport

pub struct LocalClientTransport {
    network: LocalNetwork,
    id: ConnectionId,
}

impl LocalClientTransport {
    /// The id the server knows this client by
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Transport for LocalClientTransport {
    fn send(
        &mut self,
        _connection_id: ConnectionId,
        bytes: &[u8],
        channel: Channel,
    ) -> Result<(), TransportError> {
        check_size(bytes, channel)?;

        let mut state = self.network.lock();
        if !state.connected.contains(&self.id) {
            return Err(TransportError::UnknownConnection {
                connection_id: self.id,
            });
        }
        state.deliver(
            Endpoint::Server,
            TransportEvent::Data {
                connection_id: self.id,
                bytes: bytes.to_vec(),
                channel,
            },
            channel,
        );
        Ok(())
    }

    fn max_packet_size(&self, channel: Channel) -> usize {
        max_packet_size(channel)
    }

    fn disconnect(&mut self, _connection_id: ConnectionId) {
        self.network.lock().disconnect(self.id);
    }

    fn poll(&mut self) -> Option<TransportEvent> {
        self.network
            .lock()
            .client_inboxes
            .get_mut(&self.id)
            .and_then(|inbox| inbox.pop_front())
    }
}
