/// Tuning for one direction's jitter buffer and drift correction
#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotInterpolationSettings {
    /// Target buffer time, in multiples of the sender's send interval.
    /// Replaced continuously when `dynamic_adjustment` is on.
    pub buffer_time_multiplier: f64,
    /// Hard cap on buffered snapshots. Inserts past this are dropped.
    pub buffer_limit: usize,
    /// Drift below this many send intervals slows playback down
    pub catchup_negative_threshold: f64,
    /// Drift above this many send intervals speeds playback up
    pub catchup_positive_threshold: f64,
    /// Timescale bonus while catching up, e.g. 0.02 plays at 102%
    pub catchup_speed: f64,
    /// Timescale penalty while slowing down, e.g. 0.04 plays at 96%
    pub slowdown_speed: f64,
    /// Seconds of history the drift average covers
    pub drift_ema_duration: f64,
    /// Size the buffer from measured jitter instead of the fixed multiplier
    pub dynamic_adjustment: bool,
    /// Extra send intervals kept on top of the measured jitter
    pub dynamic_adjustment_tolerance: f64,
    /// Seconds of history the delivery time average covers
    pub delivery_time_ema_duration: f64,
}

impl Default for SnapshotInterpolationSettings {
    fn default() -> Self {
        Self {
            buffer_time_multiplier: 2.0,
            buffer_limit: 32,
            catchup_negative_threshold: -1.0,
            catchup_positive_threshold: 1.0,
            catchup_speed: 0.02,
            slowdown_speed: 0.04,
            drift_ema_duration: 1.0,
            dynamic_adjustment: true,
            dynamic_adjustment_tolerance: 1.0,
            delivery_time_ema_duration: 2.0,
        }
    }
}
