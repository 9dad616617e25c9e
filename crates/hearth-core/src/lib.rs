//! Hearth Core - Shared vocabulary for the smart-home fleet engine
//!
//! This crate provides the fundamental data types used throughout Hearth:
//! - `DeviceKind`: The closed set of simulated device types
//! - `DeviceStatus`: Connection/health state reported in telemetry
//! - `IssueKind`: Enumerated anomalous conditions a device can report
//! - `Reading`: One immutable telemetry snapshot produced per tick
//! - `Payload`: The free-form measurement map carried by a reading

pub mod types;

pub use types::*;
