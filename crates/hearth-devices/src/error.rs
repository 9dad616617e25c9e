//! Error types for hearth-devices

use thiserror::Error;

/// Device construction errors.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Unknown device kind: {0}")]
    UnknownKind(String),
}

/// Result type alias for device operations
pub type Result<T> = std::result::Result<T, DeviceError>;
