/// Drift-free interval checks for periodic work (pings, broadcasts,
/// quality sampling).
///
/// Setting `last_time = time` would forgive any backlog, and
/// `last_time += interval` would pay it back one interval per call and never
/// catch up under sustained load. Instead `last_time` snaps to the closest
/// multiple of `interval` at or below `time`, so a single slow frame produces
/// exactly one elapsed result instead of a burst.
pub struct AccurateInterval;

impl AccurateInterval {
    /// Returns true if at least `interval` has passed since `last_time`.
    /// `interval` must be > 0.
    pub fn elapsed(time: f64, interval: f64, last_time: &mut f64) -> bool {
        if time < *last_time + interval {
            return false;
        }

        let multiples = (time / interval).floor();
        *last_time = multiples * interval;
        true
    }
}
