use std::collections::VecDeque;

use tern_serde::NetworkReader;

use super::{batcher::TIMESTAMP_SIZE, error::BatchError};

/// One message taken out of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct UnbatchedMessage {
    pub payload: Vec<u8>,
    /// The sender's local time when the containing batch was produced
    pub remote_time: f64,
}

/// Receive-side inverse of `Batcher`: queues raw batches, then yields their
/// messages one by one with the batch timestamp attached
pub struct Unbatcher {
    batches: VecDeque<Vec<u8>>,
    // read position inside the front batch, 0 until its header is read
    position: usize,
    remote_time: f64,
}

impl Unbatcher {
    pub fn new() -> Self {
        Self {
            batches: VecDeque::new(),
            position: 0,
            remote_time: 0.0,
        }
    }

    /// Queues a received batch. Anything shorter than the timestamp header,
    /// or with a NaN or infinite timestamp, is rejected right away.
    pub fn add_batch(&mut self, batch: &[u8]) -> Result<(), BatchError> {
        if batch.len() < TIMESTAMP_SIZE {
            return Err(BatchError::TruncatedHeader {
                length: batch.len(),
                header: TIMESTAMP_SIZE,
            });
        }
        let timestamp = NetworkReader::new(batch).read_f64()?;
        if !timestamp.is_finite() {
            return Err(BatchError::InvalidTimestamp(timestamp));
        }
        self.batches.push_back(batch.to_vec());
        Ok(())
    }

    /// Returns the next message, or None once every queued batch is consumed.
    /// A malformed message discards the rest of its batch.
    pub fn next_message(&mut self) -> Result<Option<UnbatchedMessage>, BatchError> {
        loop {
            let Some(batch) = self.batches.front() else {
                return Ok(None);
            };

            if self.position == 0 {
                let mut reader = NetworkReader::new(batch);
                self.remote_time = reader.read_f64()?;
                self.position = reader.position();
            }

            if self.position >= batch.len() {
                self.batches.pop_front();
                self.position = 0;
                continue;
            }

            let mut reader = NetworkReader::new(&batch[self.position..]);
            let read = reader
                .read_length()
                .and_then(|size| reader.read_bytes(size).map(|bytes| bytes.to_vec()));

            match read {
                Ok(payload) => {
                    self.position += reader.position();
                    return Ok(Some(UnbatchedMessage {
                        payload,
                        remote_time: self.remote_time,
                    }));
                }
                Err(error) => {
                    self.batches.pop_front();
                    self.position = 0;
                    return Err(BatchError::MalformedMessage(error));
                }
            }
        }
    }

    /// Number of batches not fully consumed yet
    pub fn batches_count(&self) -> usize {
        self.batches.len()
    }

    pub fn clear(&mut self) {
        self.batches.clear();
        self.position = 0;
    }
}

impl Default for Unbatcher {
    fn default() -> Self {
        Self::new()
    }
}
