/// Coarse connection health, for UI and telemetry only
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ConnectionQuality {
    /// Not enough data yet
    #[default]
    Estimating,
    Poor,
    Fair,
    Good,
    Excellent,
}

/// Which heuristic a client samples
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ConnectionQualityMethod {
    /// Classify by round trip time and its variance
    #[default]
    Simple,
    /// Classify by how far the jitter buffer had to grow
    Pragmatic,
}

impl ConnectionQuality {
    /// `rtt` and `jitter` in seconds
    pub fn simple(rtt: f64, jitter: f64) -> Self {
        if rtt <= 0.100 && jitter <= 0.10 {
            return ConnectionQuality::Excellent;
        }
        if rtt <= 0.200 && jitter <= 0.20 {
            return ConnectionQuality::Good;
        }
        if rtt <= 0.400 && jitter <= 0.50 {
            return ConnectionQuality::Fair;
        }
        ConnectionQuality::Poor
    }

    /// Compares the dynamically adjusted buffer time against the configured
    /// one. A connection that needs a lot more buffering than configured is
    /// jittery, regardless of its raw latency.
    pub fn pragmatic(target_buffer_time: f64, current_buffer_time: f64) -> Self {
        let multiplier = current_buffer_time / target_buffer_time;

        if multiplier <= 1.15 {
            return ConnectionQuality::Excellent;
        }
        if multiplier <= 1.25 {
            return ConnectionQuality::Good;
        }
        if multiplier <= 1.50 {
            return ConnectionQuality::Fair;
        }
        ConnectionQuality::Poor
    }
}
