//! # Tern Serde
//! Byte-level serialization primitives shared by the tern networking crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod error;
mod pool;
mod reader;
mod serde;
mod var_uint;
mod writer;

pub use error::SerdeErr;
pub use pool::{PooledWriter, WriterPool};
pub use reader::NetworkReader;
pub use serde::Serde;
pub use var_uint::{var_uint_size, MAX_VAR_UINT_BYTES};
pub use writer::NetworkWriter;
