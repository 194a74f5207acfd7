use std::default::Default;

/// Contains Config properties which will be used by a Server or Client
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Seconds without any received data after which a connection is
    /// considered dead
    pub disconnect_inactive_timeout: f64,
    /// Seconds between two pings
    pub ping_interval: f64,
    /// Number of round trip samples the RTT average covers
    pub ping_window_size: usize,
}

impl ConnectionConfig {
    /// Creates a new ConnectionConfig, used to initialize a Connection
    pub fn new(
        disconnect_inactive_timeout: f64,
        ping_interval: f64,
        ping_window_size: usize,
    ) -> Self {
        ConnectionConfig {
            disconnect_inactive_timeout,
            ping_interval,
            ping_window_size,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            disconnect_inactive_timeout: 60.0,
            ping_interval: 0.1,
            ping_window_size: 50,
        }
    }
}
