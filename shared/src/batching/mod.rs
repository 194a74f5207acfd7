mod batcher;
mod error;
mod unbatcher;

pub use batcher::{Batcher, TIMESTAMP_SIZE};
pub use error::BatchError;
pub use unbatcher::{UnbatchedMessage, Unbatcher};
