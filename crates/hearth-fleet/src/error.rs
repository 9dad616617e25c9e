//! Error types for hearth-fleet

use thiserror::Error;

/// Fleet orchestration errors.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("No such device: {0}")]
    DeviceNotFound(String),
}

/// Result type alias for fleet operations
pub type Result<T> = std::result::Result<T, FleetError>;
