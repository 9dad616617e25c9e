//! Error types for hearth-storage

use thiserror::Error;

/// Storage errors. Only startup can fail; runtime write errors are
/// absorbed by the worker loop.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
