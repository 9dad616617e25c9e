//! Device factory: configuration entries in, devices out.

use crate::bulb::Bulb;
use crate::camera::Camera;
use crate::command::CommandArgs;
use crate::device::{Device, Model};
use crate::entropy::Entropy;
use crate::error::{DeviceError, Result};
use crate::thermostat::Thermostat;
use crate::water_meter::{WaterMeter, WaterSource};
use hearth_core::DeviceKind;
use serde::{Deserialize, Serialize};

/// One entry of the externally-supplied device roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSpec {
    pub id: String,
    pub kind: String,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub properties: CommandArgs,
}

/// Builds a device from a roster entry.
pub fn build_device(spec: &DeviceSpec, entropy: &mut Entropy) -> Result<Device> {
    create(
        &spec.kind,
        &spec.id,
        &spec.name,
        &spec.location,
        &spec.properties,
        entropy,
    )
}

/// Creates a device by kind string, applying optional initial properties.
///
/// Unrecognized kinds are the only construction failure; out-of-range
/// property values go through the clamping setters instead of erroring.
pub fn create(
    kind: &str,
    id: &str,
    name: &str,
    location: &str,
    properties: &CommandArgs,
    entropy: &mut Entropy,
) -> Result<Device> {
    let parsed =
        DeviceKind::parse(kind).ok_or_else(|| DeviceError::UnknownKind(kind.to_string()))?;

    let model = match parsed {
        DeviceKind::Bulb => {
            let mut bulb = Bulb::new();
            if let Some(level) = properties.get("brightness").and_then(|v| v.as_i64()) {
                bulb.set_brightness(level);
            }
            if let Some(on) = properties.get("is_on").and_then(|v| v.as_bool()) {
                bulb.set_on(on);
            }
            Model::Bulb(bulb)
        }
        DeviceKind::Thermostat => {
            let mut thermostat = Thermostat::new();
            if let Some(temp) = properties.get("target_temp").and_then(|v| v.as_f64()) {
                thermostat.set_target_temp(temp);
            }
            if let Some(temp) = properties.get("current_temp").and_then(|v| v.as_f64()) {
                thermostat.set_current_temp(temp);
            }
            if let Some(humidity) = properties.get("humidity").and_then(|v| v.as_f64()) {
                thermostat.set_humidity(humidity);
            }
            Model::Thermostat(thermostat)
        }
        DeviceKind::Camera => {
            let mut camera = Camera::new(entropy);
            if let Some(level) = properties.get("battery_level").and_then(|v| v.as_f64()) {
                camera.set_battery_level(level);
            }
            if let Some(used) = properties.get("storage_used_mb").and_then(|v| v.as_f64()) {
                camera.set_storage_used_mb(used);
            }
            Model::Camera(camera)
        }
        DeviceKind::WaterMeter => {
            let source = properties
                .get("water_source")
                .and_then(|v| v.as_str())
                .map(WaterSource::parse)
                .unwrap_or(WaterSource::Main);
            Model::WaterMeter(WaterMeter::new(source, entropy))
        }
    };

    Ok(Device::new(id, name, location, model))
}
