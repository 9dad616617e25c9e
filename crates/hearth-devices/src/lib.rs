//! Hearth Devices - Per-type device state and stochastic simulation
//!
//! This crate models the closed set of smart-home device types:
//! - `Bulb`: dimmable light with power-draw and flicker behavior
//! - `Thermostat`: temperature/humidity sensing with sensor drift
//! - `Camera`: battery-powered motion camera with on-board storage
//! - `WaterMeter`: per-source water consumption tracking
//!
//! Each device combines shared link state (connection, signal, firmware,
//! reported status) with kind-specific measurement state behind the sealed
//! [`Model`] enum. All randomness flows through an injectable [`Entropy`]
//! source so tests can pin sequences and assert exact transitions.

pub mod command;
pub mod device;
pub mod entropy;
pub mod error;
pub mod factory;

mod bulb;
mod camera;
mod thermostat;
mod water_meter;

pub use bulb::Bulb;
pub use camera::Camera;
pub use command::{CommandArgs, CommandOutcome};
pub use device::{Device, DeviceSnapshot, Link, Model};
pub use entropy::Entropy;
pub use error::{DeviceError, Result};
pub use factory::{build_device, create, DeviceSpec};
pub use thermostat::{HvacMode, Thermostat};
pub use water_meter::{WaterMeter, WaterSource};
