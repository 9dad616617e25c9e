//! Simulator configuration and roster loading.

use anyhow::Context;
use hearth_devices::DeviceSpec;
use hearth_fleet::ControllerConfig;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level simulator settings.
#[derive(Debug, Clone)]
pub struct SimSettings {
    /// How long to run the simulation.
    pub duration: Duration,
    /// Path of the append-only telemetry log.
    pub log_path: PathBuf,
    /// Sink flush interval.
    pub flush_interval: Duration,
    /// Optional roster file; the built-in demo fleet is used otherwise.
    pub roster_path: Option<PathBuf>,
    /// Controller tuning.
    pub controller: ControllerConfig,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(30),
            log_path: PathBuf::from("history.log"),
            flush_interval: Duration::from_millis(500),
            roster_path: None,
            controller: ControllerConfig::default(),
        }
    }
}

/// Loads a JSON device roster from disk.
pub fn load_roster(path: impl AsRef<Path>) -> anyhow::Result<Vec<DeviceSpec>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading roster {}", path.display()))?;
    let specs: Vec<DeviceSpec> = serde_json::from_str(&content)
        .with_context(|| format!("parsing roster {}", path.display()))?;
    Ok(specs)
}

/// The built-in demo fleet: a mix of healthy and misbehaving devices so a
/// short run already exercises detection and remediation.
pub fn default_roster() -> Vec<DeviceSpec> {
    let spec = |id: &str, kind: &str, name: &str, location: &str, properties: serde_json::Value| {
        DeviceSpec {
            id: id.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            location: location.to_string(),
            properties: properties.as_object().cloned().unwrap_or_default(),
        }
    };

    vec![
        spec(
            "bulb_01",
            "BULB",
            "Reading Lamp",
            "Living Room",
            json!({ "brightness": 100, "is_on": false }),
        ),
        spec(
            "bulb_02",
            "BULB",
            "Night Light",
            "Bedroom",
            json!({ "brightness": 50, "is_on": true }),
        ),
        spec(
            "thermo_01",
            "THERMOSTAT",
            "Hallway Thermostat",
            "Hallway",
            json!({ "target_temp": 24, "current_temp": 23, "humidity": 45 }),
        ),
        spec(
            "thermo_02",
            "THERMOSTAT",
            "Bedroom Thermostat",
            "Bedroom",
            json!({ "target_temp": 22, "current_temp": 28, "humidity": 78 }),
        ),
        spec(
            "cam_01",
            "CAMERA",
            "Porch Camera",
            "Front Door",
            json!({ "battery_level": 25 }),
        ),
        spec(
            "cam_02",
            "CAMERA",
            "Yard Camera",
            "Backyard",
            json!({ "battery_level": 85, "storage_used_mb": 30000 }),
        ),
        spec(
            "water_01",
            "WATER_METER",
            "Bathroom Meter",
            "Bathroom",
            json!({ "water_source": "bathroom" }),
        ),
    ]
}
