use std::collections::VecDeque;

use tern_serde::{var_uint_size, NetworkWriter, WriterPool};

/// Every batch starts with the sender's local time as a little-endian f64
pub const TIMESTAMP_SIZE: usize = 8;

/// Packs messages into batches of at most `threshold` bytes:
///
/// `[timestamp: f64][size: var-uint][message bytes][size][message bytes]...`
///
/// Each message carries a var-uint size prefix ahead of its `[u16 id][body]`
/// bytes, so a receiver can skip a message it fails to decode. Transports
/// must treat the whole batch as opaque.
///
/// Batches are filled greedily. When the next message would push the open
/// batch over the threshold, the batch is sealed and a new one is started.
/// A single message larger than the threshold still goes out, alone in its
/// own batch.
pub struct Batcher {
    threshold: usize,
    // sealed batches, oldest first
    batches: VecDeque<NetworkWriter>,
    batch: Option<NetworkWriter>,
    pool: WriterPool,
}

impl Batcher {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            batches: VecDeque::new(),
            batch: None,
            pool: WriterPool::new(),
        }
    }

    /// Header bytes a message of `message_size` bytes costs inside a batch
    pub fn max_message_overhead(message_size: usize) -> usize {
        TIMESTAMP_SIZE + var_uint_size(message_size as u64)
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Queues a message. `timestamp` is the sender's local time; the batch
    /// header carries the most recent timestamp added before it was sealed.
    pub fn add_message(&mut self, message: &[u8], timestamp: f64) {
        let needed = var_uint_size(message.len() as u64) + message.len();

        if let Some(batch) = &self.batch {
            if batch.len() + needed > self.threshold {
                if let Some(full) = self.batch.take() {
                    self.batches.push_back(full);
                }
            }
        }

        let batch = self.batch.get_or_insert_with(|| {
            let mut writer = self.pool.take();
            writer.write_f64(timestamp);
            writer
        });

        batch.write_var_uint(message.len() as u64);
        batch.write_bytes(message);
        batch.overwrite(0, &timestamp.to_le_bytes());
    }

    /// Moves the next batch into `writer` (which is cleared first).
    /// Returns false once nothing is pending. Call repeatedly to flush a
    /// backlog that spans several batches.
    pub fn get_batch(&mut self, writer: &mut NetworkWriter) -> bool {
        let next = match self.batches.pop_front() {
            Some(batch) => batch,
            None => match self.batch.take() {
                Some(batch) => batch,
                None => return false,
            },
        };

        writer.clear();
        writer.write_bytes(next.as_slice());
        self.pool.give(next);
        true
    }

    pub fn has_pending(&self) -> bool {
        !self.batches.is_empty() || self.batch.is_some()
    }

    /// Drops everything that was queued but not yet flushed
    pub fn clear(&mut self) {
        while let Some(batch) = self.batches.pop_front() {
            self.pool.give(batch);
        }
        if let Some(batch) = self.batch.take() {
            self.pool.give(batch);
        }
    }
}
