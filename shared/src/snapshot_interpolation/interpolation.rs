//! Snapshot interpolation: turns irregularly arriving remote timestamps into
//! a smooth local timeline.
//!
//! The timeline only ever advances in `step_time`, by local delta time scaled
//! by the timescale. Drift is corrected by nudging the timescale a few percent
//! up or down, never by jumping, so a backlog drains gradually instead of
//! replaying in a burst.

use crate::ema::ExponentialMovingAverage;

use super::{snapshot::Snapshot, snapshot_buffer::SnapshotBuffer};

/// Two bracketing snapshots and the fraction between them
#[derive(Clone, Debug, PartialEq)]
pub struct Interpolated<T> {
    pub from: T,
    pub to: T,
    pub t: f64,
}

/// Playback speed for the given drift. Thresholds are absolute seconds.
pub fn timescale(
    drift: f64,
    catchup_speed: f64,
    slowdown_speed: f64,
    absolute_catchup_negative_threshold: f64,
    absolute_catchup_positive_threshold: f64,
) -> f64 {
    // too far behind the newest snapshot: play faster to drain the backlog
    if drift > absolute_catchup_positive_threshold {
        return 1.0 + catchup_speed;
    }

    // too close to the newest snapshot: play slower to rebuild a cushion
    if drift < absolute_catchup_negative_threshold {
        return 1.0 - slowdown_speed;
    }

    1.0
}

/// Buffer time multiplier sized to the measured jitter plus a tolerance.
/// Stable connections get a small buffer, jittery ones a larger one.
pub fn dynamic_adjustment(
    send_interval: f64,
    jitter_standard_deviation: f64,
    dynamic_adjustment_tolerance: f64,
) -> f64 {
    let interval_with_jitter = send_interval + jitter_standard_deviation;
    let multiples = interval_with_jitter / send_interval;
    multiples + dynamic_adjustment_tolerance
}

/// Inserts unless the buffer already holds `buffer_limit` snapshots.
/// Returns true if a new remote time was added.
pub fn insert_if_not_exists<T: Snapshot>(
    buffer: &mut SnapshotBuffer<T>,
    buffer_limit: usize,
    snapshot: T,
) -> bool {
    // rejected, not evicted: a flooding peer can't push real data out
    if buffer.len() >= buffer_limit {
        return false;
    }
    buffer.insert(snapshot)
}

/// Keeps the timeline within one buffer time of its target, so a long stall
/// can't leave it arbitrarily far behind or ahead
pub fn timeline_clamp(local_timeline: f64, buffer_time: f64, latest_remote_time: f64) -> f64 {
    let target_time = latest_remote_time - buffer_time;
    let lower_bound = target_time - buffer_time;
    let upper_bound = target_time + buffer_time;
    // max/min instead of clamp: NaN bounds must not panic
    local_timeline.max(lower_bound).min(upper_bound)
}

/// Inserts a snapshot and adjusts the timescale based on drift.
/// Returns true if the snapshot was inserted. Snapshots with a non-finite
/// remote or local time are rejected and leave every state untouched.
#[allow(clippy::too_many_arguments)]
pub fn insert_and_adjust<T: Snapshot>(
    buffer: &mut SnapshotBuffer<T>,
    buffer_limit: usize,
    snapshot: T,
    local_timeline: &mut f64,
    local_timescale: &mut f64,
    send_interval: f64,
    buffer_time: f64,
    catchup_speed: f64,
    slowdown_speed: f64,
    drift_ema: &ExponentialMovingAverage,
    catchup_negative_threshold: f64,
    catchup_positive_threshold: f64,
    delivery_time_ema: &ExponentialMovingAverage,
) -> bool {
    if buffer.len() >= buffer_limit {
        return false;
    }

    if !snapshot.remote_time().is_finite() || !snapshot.local_time().is_finite() {
        return false;
    }

    // first snapshot: start playback one buffer time behind it
    if buffer.is_empty() {
        *local_timeline = snapshot.remote_time() - buffer_time;
    }

    let remote_time = snapshot.remote_time();
    if !insert_if_not_exists(buffer, buffer_limit, snapshot) {
        return false;
    }

    // a late, reordered snapshot must not drag the timeline back
    let latest_remote_time = buffer
        .last()
        .map_or(remote_time, |latest| latest.remote_time());

    // local arrival spacing of the two newest snapshots
    let count = buffer.len();
    if count >= 2 {
        if let (Some(previous), Some(latest)) = (buffer.get(count - 2), buffer.get(count - 1)) {
            delivery_time_ema.add(latest.local_time() - previous.local_time());
        }
    }

    *local_timeline = timeline_clamp(*local_timeline, buffer_time, latest_remote_time);

    // how far behind the newest snapshot we play, compared to the target
    let time_diff = latest_remote_time - *local_timeline;
    drift_ema.add(time_diff);
    let drift = drift_ema.value() - buffer_time;

    let absolute_negative_threshold = send_interval * catchup_negative_threshold;
    let absolute_positive_threshold = send_interval * catchup_positive_threshold;

    *local_timescale = timescale(
        drift,
        catchup_speed,
        slowdown_speed,
        absolute_negative_threshold,
        absolute_positive_threshold,
    );

    true
}

pub fn inverse_lerp(a: f64, b: f64, value: f64) -> f64 {
    if a != b {
        ((value - a) / (b - a)).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Finds the snapshots bracketing `local_timeline`.
/// Returns `(from, to, t)` indices, or None for an empty buffer. Before the
/// first snapshot this holds at the first; past the last it holds at the last.
pub fn sample<T: Snapshot>(
    buffer: &SnapshotBuffer<T>,
    local_timeline: f64,
) -> Option<(usize, usize, f64)> {
    let count = buffer.len();
    let first = buffer.first()?;

    for index in 0..count.saturating_sub(1) {
        let (Some(from), Some(to)) = (buffer.get(index), buffer.get(index + 1)) else {
            break;
        };
        if local_timeline >= from.remote_time() && local_timeline <= to.remote_time() {
            let t = inverse_lerp(from.remote_time(), to.remote_time(), local_timeline);
            return Some((index, index + 1, t));
        }
    }

    if first.remote_time() > local_timeline {
        Some((0, 0, 0.0))
    } else {
        Some((count - 1, count - 1, 0.0))
    }
}

/// Advances the timeline. The only place the reconstructed clock moves.
pub fn step_time(delta_time: f64, local_timeline: &mut f64, local_timescale: f64) {
    *local_timeline += delta_time * local_timescale;
}

/// Samples the buffer and drops every snapshot older than the `from`
/// snapshot, which keeps the buffer small during steady playback
pub fn step_interpolation<T: Snapshot + Clone>(
    buffer: &mut SnapshotBuffer<T>,
    local_timeline: f64,
) -> Option<Interpolated<T>> {
    let (from_index, to_index, t) = sample(buffer, local_timeline)?;
    let from = buffer.get(from_index)?.clone();
    let to = buffer.get(to_index)?.clone();

    buffer.remove_front(from_index);

    Some(Interpolated { from, to, t })
}

/// `step_time` followed by `step_interpolation`
pub fn step<T: Snapshot + Clone>(
    buffer: &mut SnapshotBuffer<T>,
    delta_time: f64,
    local_timeline: &mut f64,
    local_timescale: f64,
) -> Option<Interpolated<T>> {
    step_time(delta_time, local_timeline, local_timescale);
    step_interpolation(buffer, *local_timeline)
}
