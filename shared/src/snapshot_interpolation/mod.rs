mod interpolation;
mod settings;
mod snapshot;
mod snapshot_buffer;
mod timeline;

pub use interpolation::{
    dynamic_adjustment, insert_and_adjust, insert_if_not_exists, inverse_lerp, sample, step,
    step_interpolation, step_time, timeline_clamp, timescale, Interpolated,
};
pub use settings::SnapshotInterpolationSettings;
pub use snapshot::{Snapshot, TimeSnapshot};
pub use snapshot_buffer::SnapshotBuffer;
pub use timeline::SnapshotTimeline;
