use std::{
    cell::RefCell,
    ops::{Deref, DerefMut},
};

use crate::writer::NetworkWriter;

const DEFAULT_POOL_CAPACITY: usize = 64;

/// Recycles `NetworkWriter` allocations. A writer taken from the pool is
/// exclusively owned until it is given back; it is cleared on return.
pub struct WriterPool {
    writers: RefCell<Vec<NetworkWriter>>,
    max_pooled: usize,
}

impl WriterPool {
    pub fn new() -> Self {
        Self::with_max_pooled(DEFAULT_POOL_CAPACITY)
    }

    /// Writers given back beyond `max_pooled` are dropped instead of kept
    pub fn with_max_pooled(max_pooled: usize) -> Self {
        Self {
            writers: RefCell::new(Vec::new()),
            max_pooled,
        }
    }

    pub fn take(&self) -> NetworkWriter {
        self.writers.borrow_mut().pop().unwrap_or_default()
    }

    pub fn give(&self, mut writer: NetworkWriter) {
        writer.clear();
        let mut writers = self.writers.borrow_mut();
        if writers.len() < self.max_pooled {
            writers.push(writer);
        }
    }

    /// Takes a writer that goes back into the pool when the guard is dropped,
    /// on every exit path
    pub fn scoped(&self) -> PooledWriter<'_> {
        PooledWriter {
            pool: self,
            writer: Some(self.take()),
        }
    }

    pub fn pooled_count(&self) -> usize {
        self.writers.borrow().len()
    }
}

impl Default for WriterPool {
    fn default() -> Self {
        Self::new()
    }
}

pub struct PooledWriter<'p> {
    pool: &'p WriterPool,
    writer: Option<NetworkWriter>,
}

impl Deref for PooledWriter<'_> {
    type Target = NetworkWriter;

    fn deref(&self) -> &Self::Target {
        // only None during drop
        self.writer.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl DerefMut for PooledWriter<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.writer.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledWriter<'_> {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            self.pool.give(writer);
        }
    }
}
