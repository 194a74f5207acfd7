use std::mem;

use log::{info, warn};

use tern_shared::{
    dispatch_batch, AccurateInterval, Channel, Connection, ConnectionId, ConnectionQuality,
    ConnectionQualityMethod, HandlerResult, HostType, Message, MessageError, MessageHandlers,
    NetworkPingMessage, NetworkPongMessage, NetworkTime, NotReadyMessage, ReadyMessage,
    SnapshotTimeline, TimeSnapshotMessage, Transport, TransportEvent,
};

use crate::{client::client_config::ClientConfig, error::ClientError, events::ClientEvent};

/// State the built-in message handlers work with
pub(crate) struct SystemContext {
    now: f64,
    not_ready: bool,
}

/// Client that talks to a single server through a `Transport`.
///
/// Like the server, it is driven twice per tick: `receive` before game
/// logic, `send_updates` after.
pub struct Client<T: Transport, C> {
    config: ClientConfig,
    transport: T,
    connection: Option<Connection>,
    handlers: MessageHandlers<C>,
    system_handlers: MessageHandlers<SystemContext>,
    events: Vec<ClientEvent>,
    quality: ConnectionQuality,
    last_send_time: f64,
    last_quality_time: f64,
    last_receive_time: Option<f64>,
}

impl<T: Transport, C: 'static> Client<T, C> {
    pub fn new(config: ClientConfig, transport: T) -> Result<Self, ClientError> {
        Ok(Self {
            config,
            transport,
            connection: None,
            handlers: MessageHandlers::new(),
            system_handlers: system_handlers()?,
            events: Vec::new(),
            quality: ConnectionQuality::Estimating,
            last_send_time: 0.0,
            last_quality_time: 0.0,
            last_receive_time: None,
        })
    }

    /// Registers a handler for messages of type `M` sent by the server
    pub fn register_handler<M, F>(
        &mut self,
        require_authentication: bool,
        handler: F,
    ) -> Result<(), ClientError>
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

    // Connection

    /// Starts connecting. The transport is expected to already be opening
    /// its side; the connection is usable once it reports `Connected`.
    pub fn connect(&mut self, now: f64) -> Result<(), ClientError> {
        if self.connection.is_some() {
            return Err(ClientError::AlreadyConnected);
        }

        let timeline = SnapshotTimeline::new(self.config.snapshot.clone(), self.config.send_rate);
        self.connection = Some(Connection::new(
            ConnectionId::SERVER,
            HostType::Client,
            &self.config.connection,
            timeline,
            &self.transport,
            now,
        ));
        self.quality = ConnectionQuality::Estimating;
        self.last_receive_time = None;
        Ok(())
    }

    /// Requests a disconnect, completed once the transport confirms
    pub fn disconnect(&mut self) {
        if let Some(connection) = self.connection.as_mut() {
            connection.disconnect();
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|connection| connection.is_connected())
    }

    pub fn is_connecting(&self) -> bool {
        self.connection.is_some() && !self.is_connected()
    }

    pub fn is_ready(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|connection| connection.is_ready())
    }

    /// Tells the server the client finished loading and wants entity state
    pub fn ready(&mut self) -> Result<(), ClientError> {
        let connection = self.connected_mut()?;
        if connection.is_ready() {
            return Err(ClientError::AlreadyReady);
        }
        connection.send(&ReadyMessage, Channel::Reliable)?;
        connection.set_ready(true);
        Ok(())
    }

    pub fn send<M: Message>(&mut self, message: &M, channel: Channel) -> Result<(), ClientError> {
        self.connected_mut()?.send(message, channel)?;
        Ok(())
    }

    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    pub fn connection_mut(&mut self) -> Option<&mut Connection> {
        self.connection.as_mut()
    }

    // Tick

    /// Early tick phase: processes everything the transport received, then
    /// steps the server timeline to `now`
    pub fn receive(&mut self, context: &mut C, now: f64) {
        while let Some(event) = self.transport.poll() {
            match event {
                TransportEvent::Connected(_) => self.on_connected(),
                TransportEvent::Data { bytes, channel, .. } => {
                    self.on_data(context, &bytes, channel, now)
                }
                TransportEvent::Disconnected(_) => self.on_disconnected(),
            }
        }

        let delta_time = self
            .last_receive_time
            .map_or(0.0, |last_time| (now - last_time).max(0.0));
        self.last_receive_time = Some(now);

        if let Some(connection) = self.connection.as_mut() {
            connection.set_local_time(now);
            connection.timeline_mut().update(delta_time);
        }
    }

    /// Late tick phase: pings, time snapshots once ready, connection quality
    /// sampling, then flushes to the transport
    pub fn send_updates(&mut self, now: f64) {
        let Some(connection) = self.connection.as_mut() else {
            return;
        };
        connection.set_local_time(now);

        if connection.is_connected() {
            if let Some(ping) = connection.network_time_mut().ping(now) {
                if let Err(send_error) = connection.send(&ping, Channel::Unreliable) {
                    warn!("{}", send_error);
                }
            }

            if AccurateInterval::elapsed(
                now,
                self.config.send_interval(),
                &mut self.last_send_time,
            ) && connection.is_ready()
            {
                if let Err(send_error) = connection.send(&TimeSnapshotMessage, Channel::Unreliable) {
                    warn!("{}", send_error);
                }
            }

            if AccurateInterval::elapsed(
                now,
                self.config.connection_quality_interval,
                &mut self.last_quality_time,
            ) {
                let current = sample_quality(connection, self.config.connection_quality_method);
                if current != self.quality {
                    info!("Connection quality changed to {:?}", current);
                    self.events.push(ClientEvent::QualityChanged {
                        previous: self.quality,
                        current,
                    });
                    self.quality = current;
                }
            }
        }

        connection.update(&mut self.transport, now);
        if connection.take_disconnect_request() {
            self.transport.disconnect(connection.id());
        }
    }

    /// Events since the last call
    pub fn take_events(&mut self) -> Vec<ClientEvent> {
        mem::take(&mut self.events)
    }

    // Timeline

    /// Current position on the server's timeline, in server seconds
    pub fn local_timeline(&self) -> f64 {
        self.connection
            .as_ref()
            .map_or(0.0, |connection| connection.timeline().local_timeline())
    }

    pub fn local_timescale(&self) -> f64 {
        self.connection
            .as_ref()
            .map_or(1.0, |connection| connection.timeline().local_timescale())
    }

    pub fn buffer_time(&self) -> f64 {
        self.connection
            .as_ref()
            .map_or(0.0, |connection| connection.timeline().buffer_time())
    }

    /// Smoothed round trip time in seconds
    pub fn rtt(&self) -> f64 {
        self.connection
            .as_ref()
            .map_or(0.0, |connection| connection.network_time().rtt())
    }

    pub fn quality(&self) -> ConnectionQuality {
        self.quality
    }

    // Accessors

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // Private

    fn connected_mut(&mut self) -> Result<&mut Connection, ClientError> {
        match self.connection.as_mut() {
            Some(connection) if connection.is_connected() => Ok(connection),
            _ => Err(ClientError::NotConnected),
        }
    }

    fn on_connected(&mut self) {
        let Some(connection) = self.connection.as_mut() else {
            warn!("Transport connected without a pending connection");
            return;
        };
        connection.on_connected();
        // the server is trusted: whatever it sends is accepted
        connection.set_authenticated(true);
        info!("Connected to server");
        self.events.push(ClientEvent::Connected);
    }

    fn on_data(&mut self, context: &mut C, bytes: &[u8], channel: Channel, now: f64) {
        let Some(connection) = self.connection.as_mut() else {
            warn!("Received data without a connection");
            return;
        };

        let mut system = SystemContext {
            now,
            not_ready: false,
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

        if system.not_ready {
            self.events.push(ClientEvent::NotReady);
        }
    }

    fn on_disconnected(&mut self) {
        let Some(mut connection) = self.connection.take() else {
            return;
        };
        if connection.cleanup().is_some() {
            info!("Disconnected from server");
            self.events.push(ClientEvent::Disconnected);
        }
    }
}

fn sample_quality(connection: &Connection, method: ConnectionQualityMethod) -> ConnectionQuality {
    let network_time = connection.network_time();
    if !network_time.has_samples() {
        return ConnectionQuality::Estimating;
    }
    match method {
        ConnectionQualityMethod::Simple => {
            ConnectionQuality::simple(network_time.rtt(), network_time.rtt_variance())
        }
        ConnectionQualityMethod::Pragmatic => {
            let timeline = connection.timeline();
            ConnectionQuality::pragmatic(timeline.initial_buffer_time(), timeline.buffer_time())
        }
    }
}

fn system_handlers() -> Result<MessageHandlers<SystemContext>, MessageError> {
    let mut handlers: MessageHandlers<SystemContext> = MessageHandlers::new();

    handlers.register::<NotReadyMessage, _>(false, |system, connection, _, _| {
        if connection.set_ready(false) {
            system.not_ready = true;
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
