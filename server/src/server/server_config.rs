use std::default::Default;

use tern_shared::{ConnectionConfig, SnapshotInterpolationSettings};

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Used to configure the connections with Clients
    pub connection: ConnectionConfig,
    /// Jitter buffer tuning for each client's timeline
    pub snapshot: SnapshotInterpolationSettings,
    /// Time snapshots sent per second. Also the rate clients are expected
    /// to send at.
    pub send_rate: u32,
    /// Mark new connections authenticated right away. Turn off to run an
    /// authentication step and call `Server::authenticate` afterwards.
    pub auto_authenticate: bool,
    /// Disconnect clients that sent nothing for
    /// `connection.disconnect_inactive_timeout` seconds
    pub disconnect_inactive_connections: bool,
    /// Destroy a client's entities when it disconnects. Otherwise they stay
    /// spawned without an owner.
    pub destroy_owned_on_disconnect: bool,
    /// Seconds between two rebuilds of every entity's observers
    pub rebuild_interval: f64,
}

impl ServerConfig {
    pub fn send_interval(&self) -> f64 {
        1.0 / self.send_rate.max(1) as f64
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            snapshot: SnapshotInterpolationSettings::default(),
            send_rate: 60,
            auto_authenticate: true,
            disconnect_inactive_connections: true,
            destroy_owned_on_disconnect: true,
            rebuild_interval: 1.0,
        }
    }
}
