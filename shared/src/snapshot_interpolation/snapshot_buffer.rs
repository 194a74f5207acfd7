use super::snapshot::Snapshot;

/// Snapshots ordered by remote time, one per remote time.
///
/// Kept as a sorted Vec: the buffer is small and the interpolation step
/// needs positional access to neighbours.
#[derive(Clone, Debug)]
pub struct SnapshotBuffer<T> {
    snapshots: Vec<T>,
}

impl<T: Snapshot> SnapshotBuffer<T> {
    pub fn new() -> Self {
        Self {
            snapshots: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.snapshots.get(index)
    }

    pub fn first(&self) -> Option<&T> {
        self.snapshots.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.snapshots.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.snapshots.iter()
    }

    /// Inserts in remote time order. A snapshot with an already buffered
    /// remote time replaces the old one. Returns true if the buffer grew.
    pub fn insert(&mut self, snapshot: T) -> bool {
        let remote_time = snapshot.remote_time();
        match self
            .snapshots
            .binary_search_by(|existing| existing.remote_time().total_cmp(&remote_time))
        {
            Ok(index) => {
                self.snapshots[index] = snapshot;
                false
            }
            Err(index) => {
                self.snapshots.insert(index, snapshot);
                true
            }
        }
    }

    /// Removes the first `count` snapshots
    pub fn remove_front(&mut self, count: usize) {
        let count = count.min(self.snapshots.len());
        self.snapshots.drain(..count);
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

impl<T: Snapshot> Default for SnapshotBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}
