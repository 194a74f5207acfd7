use std::{
    collections::{HashMap, HashSet},
    mem,
};

use log::{debug, info, warn};

use tern_shared::{
    dispatch_batch, AccurateInterval, Channel, Connection, ConnectionId, HandlerResult, HostType,
    Message, MessageError, MessageHandlers, NetworkId, NetworkPingMessage, NetworkPongMessage,
    NetworkTime, NotReadyMessage, ReadyMessage, SnapshotTimeline, TimeSnapshotMessage, Transport,
    TransportEvent,
};

use crate::{
    error::ServerError,
    events::ServerEvent,
    interest::{diff_observers, AllVisible, InterestManagement, Visibility},
    server::{host_loopback::HostLoopback, server_config::ServerConfig},
};

/// State the built-in message handlers work with
pub(crate) struct SystemContext {
    now: f64,
    became_ready: Vec<ConnectionId>,
}

struct EntityRecord {
    owner: Option<ConnectionId>,
    visibility: Visibility,
    observers: HashSet<ConnectionId>,
}

/// A server that batches messages to connected clients, reconstructs each
/// client's timeline, and decides which clients observe which entities.
///
/// Drive it with two calls per tick: `receive` before game logic and `send`
/// after, so whatever the logic produces in reaction to received data goes
/// out in the same tick.
pub struct Server<T: Transport, C> {
    config: ServerConfig,
    transport: T,
    host: Option<HostLoopback>,
    connections: HashMap<ConnectionId, Connection>,
    entities: HashMap<NetworkId, EntityRecord>,
    interest: Box<dyn InterestManagement>,
    handlers: MessageHandlers<C>,
    system_handlers: MessageHandlers<SystemContext>,
    events: Vec<ServerEvent>,
    last_send_time: f64,
    last_rebuild_time: f64,
    last_receive_time: Option<f64>,
}

impl<T: Transport, C: 'static> Server<T, C> {
    /// Create a new Server. Every entity is visible to every ready client
    /// until another interest management is set.
    pub fn new(config: ServerConfig, transport: T) -> Result<Self, ServerError> {
        Ok(Self {
            config,
            transport,
            host: None,
            connections: HashMap::new(),
            entities: HashMap::new(),
            interest: Box::new(AllVisible),
            handlers: MessageHandlers::new(),
            system_handlers: system_handlers()?,
            events: Vec::new(),
            last_send_time: 0.0,
            last_rebuild_time: 0.0,
            last_receive_time: None,
        })
    }

    pub fn set_interest_management<I: InterestManagement + 'static>(&mut self, interest: I) {
        self.interest = Box::new(interest);
    }

    /// Registers a handler for messages of type `M` sent by clients. With
    /// `require_authentication`, unauthenticated senders are disconnected.
    pub fn register_handler<M, F>(
        &mut self,
        require_authentication: bool,
        handler: F,
    ) -> Result<(), ServerError>
    where
        M: Message,
        F: FnMut(&mut C, &mut Connection, M, Channel) -> HandlerResult + 'static,
    {
        if let Some(existing) = self.system_handlers.name(M::ID) {
            return Err(MessageError::IdCollision {
                id: M::ID,
                name: M::NAME,
                existing,
            }
            .into());
        }
        self.handlers
            .register::<M, F>(require_authentication, handler)?;
        Ok(())
    }

    pub fn unregister_handler<M: Message>(&mut self) -> bool {
        self.handlers.unregister::<M>()
    }

    // Tick

    /// Early tick phase: processes everything the transport received, then
    /// steps every client timeline to `now`
    pub fn receive(&mut self, context: &mut C, now: f64) {
        while let Some(event) = self.poll_event() {
            match event {
                TransportEvent::Connected(connection_id) => self.on_connected(connection_id, now),
                TransportEvent::Data {
                    connection_id,
                    bytes,
                    channel,
                } => self.on_data(context, connection_id, &bytes, channel, now),
                TransportEvent::Disconnected(connection_id) => self.on_disconnected(connection_id),
            }
        }

        let delta_time = self
            .last_receive_time
            .map_or(0.0, |last_time| (now - last_time).max(0.0));
        self.last_receive_time = Some(now);

        for connection in self.connections.values_mut() {
            connection.set_local_time(now);
            connection.timeline_mut().update(delta_time);
        }
    }

    /// Late tick phase: pings, time snapshots, periodic observer rebuilds and
    /// the inactivity sweep, then flushes every connection to the transport
    pub fn send(&mut self, now: f64) {
        let send_time_snapshot = AccurateInterval::elapsed(
            now,
            self.config.send_interval(),
            &mut self.last_send_time,
        );

        for connection in self.connections.values_mut() {
            connection.set_local_time(now);
            if !connection.is_connected() {
                continue;
            }

            if connection.id() != ConnectionId::LOCAL {
                if let Some(ping) = connection.network_time_mut().ping(now) {
                    if let Err(send_error) = connection.send(&ping, Channel::Unreliable) {
                        warn!("{}", send_error);
                    }
                }
            }

            if send_time_snapshot && connection.is_ready() {
                if let Err(send_error) = connection.send(&TimeSnapshotMessage, Channel::Unreliable) {
                    warn!("{}", send_error);
                }
            }
        }

        if AccurateInterval::elapsed(
            now,
            self.config.rebuild_interval,
            &mut self.last_rebuild_time,
        ) {
            self.rebuild_all();
        }

        if self.config.disconnect_inactive_connections {
            self.disconnect_inactive(now);
        }

        for connection in self.connections.values_mut() {
            let transport: &mut dyn Transport = match self.host.as_mut() {
                Some(host) if connection.id() == ConnectionId::LOCAL => host,
                _ => &mut self.transport,
            };

            connection.update(transport, now);
            if connection.take_disconnect_request() {
                transport.disconnect(connection.id());
            }
        }
    }

    /// Events since the last call
    pub fn take_events(&mut self) -> Vec<ServerEvent> {
        mem::take(&mut self.events)
    }

    // Connections

    pub fn connection(&self, connection_id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(connection_id)
    }

    pub fn connection_mut(&mut self, connection_id: &ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(connection_id)
    }

    /// Ids of every connection, sorted
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<ConnectionId> = self.connections.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn connections_count(&self) -> usize {
        self.connections.len()
    }

    /// Marks a connection authenticated after an external authentication step
    pub fn authenticate(&mut self, connection_id: &ConnectionId) -> Result<(), ServerError> {
        self.connection_or_err(connection_id)?.set_authenticated(true);
        Ok(())
    }

    /// Requests a disconnect. The client is cleaned up once the transport
    /// confirms, which may take until a later tick.
    pub fn disconnect(&mut self, connection_id: &ConnectionId) -> Result<(), ServerError> {
        self.connection_or_err(connection_id)?.disconnect();
        Ok(())
    }

    /// Stops sending entity state to a client until it reports ready again
    pub fn set_client_not_ready(&mut self, connection_id: &ConnectionId) -> Result<(), ServerError> {
        let connection = self
            .connections
            .get_mut(connection_id)
            .ok_or(ServerError::UnknownConnection {
                connection_id: *connection_id,
            })?;

        if !connection.set_ready(false) {
            return Ok(());
        }
        debug!("{} set not ready", connection_id);

        let observing: Vec<NetworkId> = connection.observing().iter().copied().collect();
        for entity in observing {
            connection.remove_observing(&entity);
            if let Some(record) = self.entities.get_mut(&entity) {
                record.observers.remove(connection_id);
            }
        }

        connection.send(&NotReadyMessage, Channel::Reliable)?;
        Ok(())
    }

    pub fn send_to<M: Message>(
        &mut self,
        connection_id: &ConnectionId,
        message: &M,
        channel: Channel,
    ) -> Result<(), ServerError> {
        self.connection_or_err(connection_id)?
            .send(message, channel)?;
        Ok(())
    }

    /// Sends `message` to every ready client. Returns how many it was
    /// queued for.
    pub fn broadcast<M: Message>(&mut self, message: &M, channel: Channel) -> usize {
        let mut count = 0;
        for connection in self.connections.values_mut() {
            if connection.is_ready() && connection.send(message, channel).is_ok() {
                count += 1;
            }
        }
        count
    }

    // Entities

    /// Registers an entity and computes its first observers. `owner` always
    /// observes its own entities once ready.
    pub fn spawn(
        &mut self,
        entity: NetworkId,
        owner: Option<ConnectionId>,
    ) -> Result<(), ServerError> {
        if self.entities.contains_key(&entity) {
            return Err(ServerError::EntityAlreadySpawned { entity });
        }
        if let Some(owner) = owner {
            self.connection_or_err(&owner)?.add_owned(entity);
        }

        self.entities.insert(
            entity,
            EntityRecord {
                owner,
                visibility: Visibility::Default,
                observers: HashSet::new(),
            },
        );
        self.rebuild_observers(&entity, true)?;
        Ok(())
    }

    /// Unregisters an entity. Every observer gets a despawn.
    pub fn destroy(&mut self, entity: &NetworkId) -> Result<(), ServerError> {
        let record = self
            .entities
            .remove(entity)
            .ok_or(ServerError::UnknownEntity { entity: *entity })?;

        let mut observers: Vec<ConnectionId> = record.observers.into_iter().collect();
        observers.sort();
        for connection_id in observers {
            if let Some(connection) = self.connections.get_mut(&connection_id) {
                connection.remove_observing(entity);
            }
            self.events.push(ServerEvent::Despawn {
                connection: connection_id,
                entity: *entity,
            });
        }

        if let Some(owner) = record.owner {
            if let Some(connection) = self.connections.get_mut(&owner) {
                connection.remove_owned(entity);
            }
        }
        Ok(())
    }

    /// Overrides the interest management for one entity and rebuilds its
    /// observers
    pub fn set_visibility(
        &mut self,
        entity: &NetworkId,
        visibility: Visibility,
    ) -> Result<(), ServerError> {
        self.entities
            .get_mut(entity)
            .ok_or(ServerError::UnknownEntity { entity: *entity })?
            .visibility = visibility;
        self.rebuild_observers(entity, false)?;
        Ok(())
    }

    /// Recomputes which ready clients observe `entity`. Returns true if the
    /// observer set changed.
    pub fn rebuild_observers(
        &mut self,
        entity: &NetworkId,
        initialize: bool,
    ) -> Result<bool, ServerError> {
        let record = self
            .entities
            .get(entity)
            .ok_or(ServerError::UnknownEntity { entity: *entity })?;

        let candidates = self.ready_connections();
        let mut new_observers = HashSet::new();
        match record.visibility {
            Visibility::ForceHidden => {}
            Visibility::ForceShown => new_observers.extend(candidates.iter().copied()),
            Visibility::Default => {
                self.interest
                    .on_rebuild_observers(*entity, &candidates, &mut new_observers)
            }
        }
        // the owner always observes, whatever the interest management says
        if let Some(owner) = record.owner {
            new_observers.insert(owner);
        }

        let connections = &self.connections;
        let diff = diff_observers(
            &record.observers,
            &new_observers,
            |connection_id| {
                connections
                    .get(&connection_id)
                    .is_some_and(|connection| connection.is_ready())
            },
            initialize,
        );

        for connection_id in &diff.added {
            self.add_observer(entity, connection_id);
        }
        for connection_id in &diff.removed {
            self.remove_observer(entity, connection_id);
        }

        // host mode: entities the host client can't see are hidden for it,
        // never despawned
        if initialize
            && self.host.is_some()
            && !new_observers.contains(&ConnectionId::LOCAL)
        {
            self.set_host_visibility(entity, false);
        }

        let changed = diff.changed;
        if let Some(record) = self.entities.get_mut(entity) {
            record.observers = diff.observers;
        }
        Ok(changed)
    }

    /// Rebuilds every entity's observers
    pub fn rebuild_all(&mut self) {
        let mut entities: Vec<NetworkId> = self.entities.keys().copied().collect();
        entities.sort();
        for entity in entities {
            if let Err(rebuild_error) = self.rebuild_observers(&entity, false) {
                debug!("{}", rebuild_error);
            }
        }
    }

    pub fn observers(&self, entity: &NetworkId) -> Option<&HashSet<ConnectionId>> {
        self.entities.get(entity).map(|record| &record.observers)
    }

    pub fn owner(&self, entity: &NetworkId) -> Option<ConnectionId> {
        self.entities.get(entity).and_then(|record| record.owner)
    }

    pub fn visibility(&self, entity: &NetworkId) -> Option<Visibility> {
        self.entities.get(entity).map(|record| record.visibility)
    }

    pub fn has_entity(&self, entity: &NetworkId) -> bool {
        self.entities.contains_key(entity)
    }

    pub fn entities_count(&self) -> usize {
        self.entities.len()
    }

    // Host mode

    /// Adds the in-process client's connection. It is connected and
    /// authenticated right away; its batches are kept for
    /// `take_host_batches` instead of going through the transport.
    pub fn add_host_connection(&mut self, now: f64) -> Result<(), ServerError> {
        if self.host.is_some() || self.connections.contains_key(&ConnectionId::LOCAL) {
            return Err(ServerError::HostAlreadyActive);
        }
        self.host = Some(HostLoopback::new());

        let mut connection = self.create_connection(ConnectionId::LOCAL, now);
        connection.on_connected();
        connection.set_authenticated(true);
        self.connections.insert(ConnectionId::LOCAL, connection);

        info!("Host connection added");
        self.events.push(ServerEvent::Connected(ConnectionId::LOCAL));
        Ok(())
    }

    pub fn is_host_active(&self) -> bool {
        self.host.is_some()
    }

    /// Batches flushed to the in-process client since the last call
    pub fn take_host_batches(&mut self) -> Vec<(Channel, Vec<u8>)> {
        self.host
            .as_mut()
            .map(|host| host.take_outgoing())
            .unwrap_or_default()
    }

    /// Delivers a batch from the in-process client
    pub fn receive_host_batch(&mut self, context: &mut C, bytes: &[u8], channel: Channel, now: f64) {
        if self.host.is_none() {
            warn!("Received a host batch without a host connection");
            return;
        }
        self.on_data(context, ConnectionId::LOCAL, bytes, channel, now);
    }

    // Accessors

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // Private

    fn poll_event(&mut self) -> Option<TransportEvent> {
        if let Some(event) = self.host.as_mut().and_then(|host| host.poll()) {
            return Some(event);
        }
        self.transport.poll()
    }

    fn create_connection(&self, connection_id: ConnectionId, now: f64) -> Connection {
        let timeline = SnapshotTimeline::new(self.config.snapshot.clone(), self.config.send_rate);
        let transport: &dyn Transport = match &self.host {
            Some(host) if connection_id == ConnectionId::LOCAL => host,
            _ => &self.transport,
        };
        Connection::new(
            connection_id,
            HostType::Server,
            &self.config.connection,
            timeline,
            transport,
            now,
        )
    }

    fn connection_or_err(
        &mut self,
        connection_id: &ConnectionId,
    ) -> Result<&mut Connection, ServerError> {
        self.connections
            .get_mut(connection_id)
            .ok_or(ServerError::UnknownConnection {
                connection_id: *connection_id,
            })
    }

    fn ready_connections(&self) -> Vec<ConnectionId> {
        let mut ready: Vec<ConnectionId> = self
            .connections
            .values()
            .filter(|connection| connection.is_ready())
            .map(|connection| connection.id())
            .collect();
        ready.sort();
        ready
    }

    fn on_connected(&mut self, connection_id: ConnectionId, now: f64) {
        if connection_id == ConnectionId::LOCAL {
            warn!(
                "{}",
                ServerError::ReservedConnectionId { connection_id }
            );
            self.transport.disconnect(connection_id);
            return;
        }
        if self.connections.contains_key(&connection_id) {
            warn!("{} connected twice, ignoring", connection_id);
            return;
        }

        let mut connection = self.create_connection(connection_id, now);
        connection.on_connected();
        if self.config.auto_authenticate {
            connection.set_authenticated(true);
        }
        self.connections.insert(connection_id, connection);
        self.events.push(ServerEvent::Connected(connection_id));
    }

    fn on_data(
        &mut self,
        context: &mut C,
        connection_id: ConnectionId,
        bytes: &[u8],
        channel: Channel,
        now: f64,
    ) {
        let Some(connection) = self.connections.get_mut(&connection_id) else {
            warn!("Received data from unknown {}", connection_id);
            return;
        };

        let mut system = SystemContext {
            now,
            became_ready: Vec::new(),
        };
        dispatch_batch(
            connection,
            bytes,
            channel,
            now,
            &mut self.system_handlers,
            &mut system,
            &mut self.handlers,
            context,
        );

        for connection_id in system.became_ready {
            info!("{} is ready", connection_id);
            self.events.push(ServerEvent::Ready(connection_id));
            self.spawn_observers_for(connection_id);
        }
    }

    /// Runs the disconnect teardown, exactly once per connection
    fn on_disconnected(&mut self, connection_id: ConnectionId) {
        let Some(mut connection) = self.connections.remove(&connection_id) else {
            debug!("Ignoring disconnect of unknown {}", connection_id);
            return;
        };
        if connection_id == ConnectionId::LOCAL {
            self.host = None;
        }
        let Some(teardown) = connection.cleanup() else {
            return;
        };

        for entity in &teardown.observing {
            if let Some(record) = self.entities.get_mut(entity) {
                record.observers.remove(&connection_id);
            }
        }

        let mut owned: Vec<NetworkId> = teardown.owned.into_iter().collect();
        owned.sort();
        for entity in owned {
            if self.config.destroy_owned_on_disconnect {
                if let Err(destroy_error) = self.destroy(&entity) {
                    debug!("{}", destroy_error);
                }
            } else if let Some(record) = self.entities.get_mut(&entity) {
                record.owner = None;
            }
        }

        self.events.push(ServerEvent::Disconnected(connection_id));
    }

    /// A connection just became ready: decide which existing entities it
    /// starts observing
    fn spawn_observers_for(&mut self, connection_id: ConnectionId) {
        let mut entities: Vec<NetworkId> = self.entities.keys().copied().collect();
        entities.sort();

        for entity in entities {
            let Some(record) = self.entities.get(&entity) else {
                continue;
            };
            let observe = record.owner == Some(connection_id)
                || match record.visibility {
                    Visibility::ForceShown => true,
                    Visibility::ForceHidden => false,
                    Visibility::Default => self.interest.on_check_observer(entity, connection_id),
                };
            if observe {
                self.add_observer(&entity, &connection_id);
            }
        }
    }

    fn add_observer(&mut self, entity: &NetworkId, connection_id: &ConnectionId) {
        let Some(record) = self.entities.get_mut(entity) else {
            return;
        };
        if !record.observers.insert(*connection_id) {
            return;
        }
        if let Some(connection) = self.connections.get_mut(connection_id) {
            connection.add_observing(*entity);
        }
        self.events.push(ServerEvent::Spawn {
            connection: *connection_id,
            entity: *entity,
        });
        if *connection_id == ConnectionId::LOCAL {
            self.set_host_visibility(entity, true);
        }
    }

    fn remove_observer(&mut self, entity: &NetworkId, connection_id: &ConnectionId) {
        let Some(record) = self.entities.get_mut(entity) else {
            return;
        };
        if !record.observers.remove(connection_id) {
            return;
        }
        if let Some(connection) = self.connections.get_mut(connection_id) {
            connection.remove_observing(entity);
        }
        self.events.push(ServerEvent::Despawn {
            connection: *connection_id,
            entity: *entity,
        });
        if *connection_id == ConnectionId::LOCAL {
            self.set_host_visibility(entity, false);
        }
    }

    fn set_host_visibility(&mut self, entity: &NetworkId, visible: bool) {
        self.interest.set_host_visibility(*entity, visible);
        self.events.push(ServerEvent::HostVisibility {
            entity: *entity,
            visible,
        });
    }

    fn disconnect_inactive(&mut self, now: f64) {
        let timeout = self.config.connection.disconnect_inactive_timeout;
        for connection in self.connections.values_mut() {
            if connection.id() == ConnectionId::LOCAL || connection.is_disconnect_requested() {
                continue;
            }
            if !connection.is_alive(now, timeout) {
                warn!("Disconnecting {} for inactivity", connection.id());
                connection.disconnect();
            }
        }
    }
}

fn system_handlers() -> Result<MessageHandlers<SystemContext>, MessageError> {
    let mut handlers: MessageHandlers<SystemContext> = MessageHandlers::new();

    handlers.register::<ReadyMessage, _>(true, |system, connection, _, _| {
        if connection.set_ready(true) {
            system.became_ready.push(connection.id());
        }
        Ok(())
    })?;

    handlers.register::<TimeSnapshotMessage, _>(false, |_, connection, _, _| {
        connection.on_time_snapshot();
        Ok(())
    })?;

    handlers.register::<NetworkPingMessage, _>(false, |_, connection, ping, _| {
        connection.send(&NetworkTime::pong_for(&ping), Channel::Unreliable)?;
        Ok(())
    })?;

    handlers.register::<NetworkPongMessage, _>(false, |system, connection, pong, _| {
        connection.network_time_mut().on_pong(system.now, &pong);
        Ok(())
    })?;

    Ok(handlers)
}
