use std::default::Default;

use tern_shared::{ConnectionConfig, ConnectionQualityMethod, SnapshotInterpolationSettings};

/// Contains Config properties which will be used by the Client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Used to configure the connection with the Server
    pub connection: ConnectionConfig,
    /// Jitter buffer tuning for the server's timeline
    pub snapshot: SnapshotInterpolationSettings,
    /// Time snapshots sent per second. Also the rate the server is expected
    /// to send at.
    pub send_rate: u32,
    /// Seconds between two connection quality samples
    pub connection_quality_interval: f64,
    pub connection_quality_method: ConnectionQualityMethod,
}

impl ClientConfig {
    pub fn send_interval(&self) -> f64 {
        1.0 / self.send_rate.max(1) as f64
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            snapshot: SnapshotInterpolationSettings::default(),
            send_rate: 60,
            connection_quality_interval: 3.0,
            connection_quality_method: ConnectionQualityMethod::Simple,
        }
    }
}
