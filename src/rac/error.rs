//! Custom error types for the rac-reader crate.

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// The primary error type for all operations in this crate.
///
/// The reader latches the first error it encounters and returns it from
/// every subsequent call, so the enum is `Clone`; the I/O cause is shared
/// behind an `Arc`.
#[derive(Debug, Clone, Error)]
pub enum RacError {
    /// An error originating from the underlying byte source.
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    /// The compressed size given at construction cannot hold any index node.
    #[error("invalid compressed size: {0} bytes (the smallest index node is 32)")]
    InvalidCompressedSize(u64),

    /// Neither end of the container holds a valid index root node.
    #[error("invalid RAC container: missing index root node")]
    MissingRootNode,

    /// An index node failed structural validation, or a child node is
    /// inconsistent with what its parent declared about it.
    #[error("invalid index node")]
    InvalidIndexNode,

    /// The container declares a version this reader does not understand.
    #[error("unsupported RAC version: {0} (only version 1 is supported)")]
    UnsupportedVersion(u8),
}

impl From<io::Error> for RacError {
    fn from(err: io::Error) -> Self {
        RacError::Io(Arc::new(err))
    }
}

/// A convenience `Result` type alias using the crate's `RacError` type.
pub type Result<T> = std::result::Result<T, RacError>;
