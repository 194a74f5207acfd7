use log::{debug, trace};

use crate::{
    accurate_interval::AccurateInterval,
    ema::ExponentialMovingAverage,
    messages::{NetworkPingMessage, NetworkPongMessage},
};

/// Round trip time measurement for one connection.
///
/// Pings carry the sender's local time and are echoed back unchanged, so the
/// round trip is measured against the sender's own clock only. The remote
/// clock never enters the calculation.
pub struct NetworkTime {
    ping_interval: f64,
    last_ping_time: f64,
    rtt: ExponentialMovingAverage,
}

impl NetworkTime {
    pub fn new(ping_interval: f64, ping_window_size: usize) -> Self {
        Self {
            ping_interval,
            last_ping_time: 0.0,
            rtt: ExponentialMovingAverage::new(ping_window_size.max(1)),
        }
    }

    /// Returns a ping to send if `ping_interval` elapsed
    pub fn ping(&mut self, now: f64) -> Option<NetworkPingMessage> {
        if AccurateInterval::elapsed(now, self.ping_interval, &mut self.last_ping_time) {
            trace!("ping at {:.3}", now);
            return Some(NetworkPingMessage { local_time: now });
        }
        None
    }

    /// The answer to a ping received from the remote side
    pub fn pong_for(ping: &NetworkPingMessage) -> NetworkPongMessage {
        NetworkPongMessage {
            local_time: ping.local_time,
        }
    }

    /// Records the round trip of one of our own pings
    pub fn on_pong(&mut self, now: f64, pong: &NetworkPongMessage) {
        let rtt = now - pong.local_time;
        if !rtt.is_finite() || rtt < 0.0 {
            debug!("Ignoring pong with impossible round trip time {}", rtt);
            return;
        }
        self.rtt.add(rtt);
    }

    /// Smoothed round trip time in seconds, 0 until the first pong
    pub fn rtt(&self) -> f64 {
        self.rtt.value()
    }

    pub fn rtt_variance(&self) -> f64 {
        self.rtt.variance()
    }

    pub fn has_samples(&self) -> bool {
        self.rtt.is_initialized()
    }

    pub fn ping_interval(&self) -> f64 {
        self.ping_interval
    }
}
