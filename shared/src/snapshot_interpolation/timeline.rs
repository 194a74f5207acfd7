use crate::ema::ExponentialMovingAverage;

use super::{
    interpolation::{dynamic_adjustment, insert_and_adjust, step_interpolation, step_time},
    settings::SnapshotInterpolationSettings,
    snapshot::TimeSnapshot,
    snapshot_buffer::SnapshotBuffer,
};

/// One direction's reconstructed view of the remote clock.
///
/// Fed with a `TimeSnapshot` per received time snapshot message, stepped
/// once per local frame. `local_timeline()` is the remote time to sample
/// interpolated state at.
pub struct SnapshotTimeline {
    settings: SnapshotInterpolationSettings,
    send_interval: f64,
    snapshots: SnapshotBuffer<TimeSnapshot>,
    local_timeline: f64,
    local_timescale: f64,
    buffer_time_multiplier: f64,
    drift_ema: ExponentialMovingAverage,
    delivery_time_ema: ExponentialMovingAverage,
}

impl SnapshotTimeline {
    /// `remote_send_rate` is how many time snapshots per second the remote
    /// side sends
    pub fn new(settings: SnapshotInterpolationSettings, remote_send_rate: u32) -> Self {
        let send_rate = remote_send_rate.max(1);
        let drift_window = ema_window(send_rate, settings.drift_ema_duration);
        let delivery_window = ema_window(send_rate, settings.delivery_time_ema_duration);

        Self {
            send_interval: 1.0 / send_rate as f64,
            snapshots: SnapshotBuffer::new(),
            local_timeline: 0.0,
            local_timescale: 1.0,
            buffer_time_multiplier: settings.buffer_time_multiplier,
            drift_ema: ExponentialMovingAverage::new(drift_window),
            delivery_time_ema: ExponentialMovingAverage::new(delivery_window),
            settings,
        }
    }

    /// Records a snapshot. Returns false if it was dropped because the
    /// buffer is full or the remote time was already buffered.
    pub fn on_time_snapshot(&mut self, snapshot: TimeSnapshot) -> bool {
        if self.settings.dynamic_adjustment {
            self.buffer_time_multiplier = dynamic_adjustment(
                self.send_interval,
                self.delivery_time_ema.standard_deviation(),
                self.settings.dynamic_adjustment_tolerance,
            );
        }

        let buffer_time = self.buffer_time();
        insert_and_adjust(
            &mut self.snapshots,
            self.settings.buffer_limit,
            snapshot,
            &mut self.local_timeline,
            &mut self.local_timescale,
            self.send_interval,
            buffer_time,
            self.settings.catchup_speed,
            self.settings.slowdown_speed,
            &self.drift_ema,
            self.settings.catchup_negative_threshold,
            self.settings.catchup_positive_threshold,
            &self.delivery_time_ema,
        )
    }

    /// Steps the timeline by the local frame's delta time. Does nothing
    /// until the first snapshot arrived.
    pub fn update(&mut self, delta_time: f64) {
        if self.snapshots.is_empty() {
            return;
        }
        step_time(delta_time, &mut self.local_timeline, self.local_timescale);
        step_interpolation(&mut self.snapshots, self.local_timeline);
    }

    pub fn reset(&mut self) {
        self.snapshots.clear();
        self.local_timeline = 0.0;
        self.local_timescale = 1.0;
        self.buffer_time_multiplier = self.settings.buffer_time_multiplier;
        self.drift_ema = ExponentialMovingAverage::new(self.drift_ema.window());
        self.delivery_time_ema = ExponentialMovingAverage::new(self.delivery_time_ema.window());
    }

    pub fn local_timeline(&self) -> f64 {
        self.local_timeline
    }

    pub fn local_timescale(&self) -> f64 {
        self.local_timescale
    }

    pub fn buffer_time_multiplier(&self) -> f64 {
        self.buffer_time_multiplier
    }

    /// Current latency cushion in seconds
    pub fn buffer_time(&self) -> f64 {
        self.send_interval * self.buffer_time_multiplier
    }

    /// Latency cushion the settings asked for, before dynamic adjustment
    pub fn initial_buffer_time(&self) -> f64 {
        self.send_interval * self.settings.buffer_time_multiplier
    }

    pub fn send_interval(&self) -> f64 {
        self.send_interval
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    pub fn snapshots(&self) -> &SnapshotBuffer<TimeSnapshot> {
        &self.snapshots
    }

    pub fn drift_ema(&self) -> &ExponentialMovingAverage {
        &self.drift_ema
    }

    pub fn delivery_time_ema(&self) -> &ExponentialMovingAverage {
        &self.delivery_time_ema
    }

    pub fn settings(&self) -> &SnapshotInterpolationSettings {
        &self.settings
    }
}

fn ema_window(send_rate: u32, duration: f64) -> usize {
    ((send_rate as f64 * duration) as usize).max(1)
}
