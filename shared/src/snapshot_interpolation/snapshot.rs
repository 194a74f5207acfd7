/// Anything that was produced remotely at `remote_time` and arrived locally
/// at `local_time` can be buffered and interpolated
pub trait Snapshot {
    fn remote_time(&self) -> f64;
    fn local_time(&self) -> f64;
}

/// A bare timestamp pair, recorded once per received time snapshot
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeSnapshot {
    pub remote_time: f64,
    pub local_time: f64,
}

impl TimeSnapshot {
    pub fn new(remote_time: f64, local_time: f64) -> Self {
        Self {
            remote_time,
            local_time,
        }
    }
}

impl Snapshot for TimeSnapshot {
    fn remote_time(&self) -> f64 {
        self.remote_time
    }

    fn local_time(&self) -> f64 {
        self.local_time
    }
}
