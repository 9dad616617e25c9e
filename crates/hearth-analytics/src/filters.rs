//! Reading predicates and the critical-event filter.

use hearth_core::{DeviceKind, IssueKind, Reading};

/// Thermostat readings above this temperature are critical (°C).
const CRITICAL_TEMP_C: f64 = 30.0;
/// Camera readings below this battery level are critical (%).
const CRITICAL_BATTERY_PCT: f64 = 10.0;

/// A thermostat reporting above the critical temperature.
pub fn is_high_temp(reading: &Reading) -> bool {
    reading.device_type == DeviceKind::Thermostat
        && reading.payload_f64("current_temp").unwrap_or(0.0) > CRITICAL_TEMP_C
}

/// A camera running critically low on battery.
pub fn is_low_battery(reading: &Reading) -> bool {
    reading.device_type == DeviceKind::Camera
        && reading.payload_f64("battery_level").unwrap_or(100.0) < CRITICAL_BATTERY_PCT
}

/// A camera that currently sees motion.
pub fn has_motion(reading: &Reading) -> bool {
    reading.device_type == DeviceKind::Camera
        && reading.payload_bool("motion_detected").unwrap_or(false)
}

/// Any non-healthy reading.
pub fn has_issue(reading: &Reading) -> bool {
    reading.issue != IssueKind::None
}

/// Filters the readings that warrant immediate attention.
pub fn critical_readings(readings: &[Reading]) -> Vec<Reading> {
    readings
        .iter()
        .filter(|r| is_high_temp(r) || is_low_battery(r) || has_motion(r))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hearth_core::{DeviceStatus, Payload};

    fn reading(kind: DeviceKind, pairs: &[(&str, serde_json::Value)]) -> Reading {
        let payload: Payload = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Reading {
            device_id: "dev".to_string(),
            device_type: kind,
            timestamp: Utc::now(),
            payload,
            signal_strength: 90,
            status: DeviceStatus::Online,
            issue: IssueKind::None,
            response_time_ms: 50,
        }
    }

    #[test]
    fn test_high_temp_only_applies_to_thermostats() {
        let hot = reading(DeviceKind::Thermostat, &[("current_temp", serde_json::json!(33.0))]);
        let hot_bulb = reading(DeviceKind::Bulb, &[("current_temp", serde_json::json!(33.0))]);
        assert!(is_high_temp(&hot));
        assert!(!is_high_temp(&hot_bulb));
    }

    #[test]
    fn test_low_battery_threshold() {
        let low = reading(DeviceKind::Camera, &[("battery_level", serde_json::json!(8.0))]);
        let fine = reading(DeviceKind::Camera, &[("battery_level", serde_json::json!(55.0))]);
        assert!(is_low_battery(&low));
        assert!(!is_low_battery(&fine));
    }

    #[test]
    fn test_critical_filter_catches_each_condition() {
        let readings = vec![
            reading(DeviceKind::Thermostat, &[("current_temp", serde_json::json!(35.0))]),
            reading(DeviceKind::Camera, &[("battery_level", serde_json::json!(5.0))]),
            reading(DeviceKind::Camera, &[("motion_detected", serde_json::json!(true))]),
            reading(DeviceKind::Bulb, &[("is_on", serde_json::json!(true))]),
        ];

        assert_eq!(critical_readings(&readings).len(), 3);
    }
}
