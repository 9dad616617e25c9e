//! Smart-home fleet simulator for the Hearth engine.
//!
//! Stands in for the external collaborators: loads a device roster, wires
//! the telemetry sink and fleet controller together, runs the simulation
//! for a fixed duration, and prints a session report.
//!
//! # Usage
//! ```bash
//! # Run the built-in demo fleet for 30 seconds
//! hearth-sim --duration 30
//!
//! # Custom roster, accelerated clock, pinned entropy
//! hearth-sim --roster fleet.json --time-multiplier 10 --seed 42
//! ```

pub mod config;
pub mod report;

pub use config::{default_roster, load_roster, SimSettings};
pub use report::SessionReport;
