//! Hearth Fleet - Concurrent device orchestration
//!
//! The fleet controller owns the device registry and runs the simulation:
//! one cooperative update loop per connected device feeding a bounded
//! readings buffer, the telemetry sink, and subscriber callbacks, plus a
//! monitor loop that scans recent readings and autonomously remediates
//! detected issues (subject to a per-device cooldown).

pub mod controller;
pub mod error;
pub mod remediation;
pub mod tracker;

mod monitor;

pub use controller::{ControllerConfig, FleetController};
pub use error::{FleetError, Result};
pub use remediation::{remediate, RemediationOutcome};
pub use tracker::{IssueSummary, IssueTracker};
