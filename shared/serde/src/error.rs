use thiserror::Error;

/// Errors that can occur while reading values out of a received buffer
///
/// SECURITY: every variant can be triggered by a remote peer sending
/// malformed bytes, so none of them should ever be treated as fatal to the
/// process
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// Attempted to read past the end of the buffer
    #[error("Attempted to read {needed} bytes but only {remaining} remain in the buffer. The data is truncated or malformed")]
    UnexpectedEnd { needed: usize, remaining: usize },

    /// A variable-length integer used more bytes than the target type allows
    #[error("Variable-length integer exceeds {max_bytes} bytes. The data is malformed or malicious")]
    VarUIntOverflow { max_bytes: usize },

    /// A length prefix did not fit into the platform's usize
    #[error("Length prefix {length} is too large to address on this platform")]
    LengthTooLarge { length: u64 },

    /// A bool was encoded with a byte other than 0 or 1
    #[error("Invalid bool byte {byte}. Expected 0 or 1")]
    InvalidBool { byte: u8 },

    /// An Option tag was neither 0 (None) nor 1 (Some)
    #[error("Invalid Option tag {tag}. Expected 0 or 1")]
    InvalidOptionTag { tag: u8 },

    /// A String did not contain valid UTF-8
    #[error("String of {length} bytes is not valid UTF-8")]
    InvalidUtf8 { length: usize },
}
