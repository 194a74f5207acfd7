use tern_serde::SerdeErr;
use thiserror::Error;

/// Errors that can occur while splitting a received batch into messages
///
/// SECURITY: batches come straight off the wire, so these are raised by
/// truncated or malicious packets and must only ever cost the sender its
/// connection
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchError {
    /// Batch is too short to even contain its timestamp header
    #[error("Received batch of {length} bytes, which is smaller than the {header} byte timestamp header")]
    TruncatedHeader { length: usize, header: usize },

    /// Batch timestamp is NaN or infinite
    #[error("Received batch with non-finite timestamp {0}")]
    InvalidTimestamp(f64),

    /// A message size prefix or body runs past the end of the batch
    #[error("Malformed message inside batch: {0}")]
    MalformedMessage(#[from] SerdeErr),
}
