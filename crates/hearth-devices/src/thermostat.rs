//! Thermostat with drifting sensors and HVAC control.

use crate::command::{arg_f64, CommandArgs, CommandOutcome};
use crate::device::Link;
use crate::entropy::Entropy;
use hearth_core::{DeviceStatus, IssueKind, Payload};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Reported temperature above this is flagged as HIGH_TEMP (°C).
const HIGH_TEMP_C: f64 = 30.0;
/// Reported temperature below this is flagged as LOW_TEMP (°C).
const LOW_TEMP_C: f64 = 15.0;
/// Humidity above this is a mold risk (%).
const HIGH_HUMIDITY_PCT: f64 = 75.0;
/// Absolute sensor drift beyond this means the sensor needs calibration (°C).
const MAX_DRIFT_C: f64 = 3.0;

/// HVAC operating modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacMode {
    Auto,
    Heat,
    Cool,
    Off,
}

impl HvacMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HvacMode::Auto => "auto",
            HvacMode::Heat => "heat",
            HvacMode::Cool => "cool",
            HvacMode::Off => "off",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Thermostat {
    current_temp: f64,
    target_temp: f64,
    humidity: f64,
    hvac_mode: HvacMode,
    sensor_drift: f64,
    calibration_needed: bool,
}

impl Default for Thermostat {
    fn default() -> Self {
        Self::new()
    }
}

impl Thermostat {
    pub fn new() -> Self {
        Self {
            current_temp: 22.0,
            target_temp: 24.0,
            humidity: 50.0,
            hvac_mode: HvacMode::Auto,
            sensor_drift: 0.0,
            calibration_needed: false,
        }
    }

    pub fn current_temp(&self) -> f64 {
        self.current_temp
    }

    pub fn target_temp(&self) -> f64 {
        self.target_temp
    }

    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn hvac_mode(&self) -> HvacMode {
        self.hvac_mode
    }

    pub fn set_current_temp(&mut self, v: f64) {
        self.current_temp = v;
    }

    /// Setpoints outside the supported band are clamped, not rejected.
    pub fn set_target_temp(&mut self, v: f64) {
        self.target_temp = v.clamp(-10.0, 50.0);
    }

    pub fn set_humidity(&mut self, v: f64) {
        self.humidity = v.clamp(0.0, 100.0);
    }

    /// Temperature as the (possibly drifted) sensor reports it.
    pub fn reported_temp(&self) -> f64 {
        self.current_temp + self.sensor_drift
    }

    pub(crate) fn issue(&mut self, link: &mut Link, _entropy: &mut Entropy) -> Option<IssueKind> {
        let reported = self.reported_temp();

        if reported > HIGH_TEMP_C {
            link.flag(IssueKind::HighTemp, DeviceStatus::Warning);
            return Some(IssueKind::HighTemp);
        }

        if reported < LOW_TEMP_C {
            link.flag(IssueKind::LowTemp, DeviceStatus::Warning);
            return Some(IssueKind::LowTemp);
        }

        if self.humidity > HIGH_HUMIDITY_PCT {
            link.flag(IssueKind::HighHumidity, DeviceStatus::Warning);
            return Some(IssueKind::HighHumidity);
        }

        if self.sensor_drift.abs() > MAX_DRIFT_C {
            self.calibration_needed = true;
            link.flag(IssueKind::SensorMalfunction, DeviceStatus::Error);
            return Some(IssueKind::SensorMalfunction);
        }

        None
    }

    pub(crate) fn payload(&mut self, entropy: &mut Entropy) -> Payload {
        // Wiggle the measurements to simulate a real sensor
        self.current_temp += entropy.uniform(-2.0, 2.0);
        self.humidity = (self.humidity + entropy.uniform(-5.0, 5.0)).clamp(0.0, 100.0);

        // Drift accumulates slowly over time
        if entropy.chance(0.03) {
            self.sensor_drift += entropy.uniform(-0.5, 0.5);
        }

        self.peek_payload()
    }

    pub(crate) fn peek_payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert("current_temp".into(), json!(self.reported_temp()));
        payload.insert("target_temp".into(), json!(self.target_temp));
        payload.insert("humidity".into(), json!(self.humidity));
        payload.insert("hvac_mode".into(), json!(self.hvac_mode.as_str()));
        payload.insert("sensor_drift".into(), json!(self.sensor_drift.abs()));
        payload
    }

    /// Zeroes the sensor drift after a recalibration pass.
    pub fn calibrate(&mut self, link: &mut Link) -> bool {
        self.sensor_drift = 0.0;
        self.calibration_needed = false;
        link.clear_issue();
        true
    }

    /// Pulls humidity down; clears the issue once below the mold threshold.
    pub fn dehumidify(&mut self, link: &mut Link) -> f64 {
        self.humidity = (self.humidity - 15.0).max(40.0);
        if self.humidity <= HIGH_HUMIDITY_PCT {
            link.clear_issue();
        }
        self.humidity
    }

    pub(crate) fn apply_command(
        &mut self,
        link: &mut Link,
        command: &str,
        args: &CommandArgs,
    ) -> CommandOutcome {
        match command {
            "set_target" => {
                self.set_target_temp(arg_f64(args, "temp", 24.0));
                CommandOutcome::applied(format!("target={}", self.target_temp))
            }
            "cool" => {
                self.current_temp -= 2.0;
                self.hvac_mode = HvacMode::Cool;
                CommandOutcome::applied("cooling")
            }
            "heat" => {
                self.current_temp += 2.0;
                self.hvac_mode = HvacMode::Heat;
                CommandOutcome::applied("heating")
            }
            "calibrate" => {
                self.calibrate(link);
                CommandOutcome::applied("calibrated")
            }
            "dehumidify" => {
                let humidity = self.dehumidify(link);
                CommandOutcome::applied(format!("humidity now {humidity:.1}%"))
            }
            _ => CommandOutcome::Unrecognized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_temp_clamps() {
        let mut t = Thermostat::new();
        t.set_target_temp(90.0);
        assert_eq!(t.target_temp(), 50.0);
        t.set_target_temp(-40.0);
        assert_eq!(t.target_temp(), -10.0);
    }

    #[test]
    fn test_hot_room_reports_high_temp() {
        let mut link = Link::default();
        let mut entropy = Entropy::seeded(5);
        let mut t = Thermostat::new();
        t.set_current_temp(32.0);

        assert_eq!(t.issue(&mut link, &mut entropy), Some(IssueKind::HighTemp));
        assert_eq!(link.status(), DeviceStatus::Warning);
    }

    #[test]
    fn test_cold_room_reports_low_temp() {
        let mut link = Link::default();
        let mut entropy = Entropy::seeded(5);
        let mut t = Thermostat::new();
        t.set_current_temp(10.0);

        assert_eq!(t.issue(&mut link, &mut entropy), Some(IssueKind::LowTemp));
    }

    #[test]
    fn test_drift_beyond_band_flags_malfunction() {
        let mut link = Link::default();
        let mut entropy = Entropy::seeded(5);
        let mut t = Thermostat::new();
        t.sensor_drift = -3.5;

        assert_eq!(
            t.issue(&mut link, &mut entropy),
            Some(IssueKind::SensorMalfunction)
        );
        assert!(t.calibration_needed);
        assert_eq!(link.status(), DeviceStatus::Error);
    }

    #[test]
    fn test_cool_command_drops_exactly_two_degrees() {
        let mut t = Thermostat::new();
        t.set_current_temp(32.0);
        let mut link = Link::default();

        let outcome = t.apply_command(&mut link, "cool", &CommandArgs::new());
        assert_eq!(outcome, CommandOutcome::applied("cooling"));
        assert_eq!(t.current_temp(), 30.0);
        assert_eq!(t.hvac_mode(), HvacMode::Cool);
    }

    #[test]
    fn test_dehumidify_clears_issue_below_threshold() {
        let mut link = Link::default();
        let mut entropy = Entropy::seeded(5);
        let mut t = Thermostat::new();
        t.set_humidity(80.0);

        assert_eq!(t.issue(&mut link, &mut entropy), Some(IssueKind::HighHumidity));
        let humidity = t.dehumidify(&mut link);
        assert_eq!(humidity, 65.0);
        assert_eq!(link.current_issue(), IssueKind::None);
    }

    #[test]
    fn test_calibrate_zeroes_drift() {
        let mut link = Link::default();
        let mut t = Thermostat::new();
        t.sensor_drift = 4.2;
        assert!(t.calibrate(&mut link));
        assert_eq!(t.sensor_drift, 0.0);
    }
}
