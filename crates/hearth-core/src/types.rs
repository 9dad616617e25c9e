//! Core data types for the Hearth fleet engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-form measurement map carried by a [`Reading`].
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// The closed set of device types in the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceKind {
    Bulb,
    Thermostat,
    Camera,
    WaterMeter,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Bulb => "BULB",
            DeviceKind::Thermostat => "THERMOSTAT",
            DeviceKind::Camera => "CAMERA",
            DeviceKind::WaterMeter => "WATER_METER",
        }
    }

    /// Parses a kind string (case-insensitive). Returns `None` for
    /// unrecognized kinds; construction-time rejection is the factory's job.
    pub fn parse(s: &str) -> Option<DeviceKind> {
        match s.to_ascii_uppercase().as_str() {
            "BULB" => Some(DeviceKind::Bulb),
            "THERMOSTAT" => Some(DeviceKind::Thermostat),
            "CAMERA" => Some(DeviceKind::Camera),
            "WATER_METER" => Some(DeviceKind::WaterMeter),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection/health state a device reports in its telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
    Warning,
    Error,
    Updating,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Online => "online",
            DeviceStatus::Offline => "offline",
            DeviceStatus::Warning => "warning",
            DeviceStatus::Error => "error",
            DeviceStatus::Updating => "updating",
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anomalous conditions a device can report. `None` means healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    None,
    HighTemp,
    LowTemp,
    HighHumidity,
    LowBattery,
    CriticalBattery,
    ConnectionLost,
    WeakSignal,
    FirmwareUpdate,
    SensorMalfunction,
    StorageFull,
    MotionAlert,
    BulbFlickering,
    Unresponsive,
    Overload,
    LeakDetected,
    HighFlow,
    AbnormalUsage,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::None => "none",
            IssueKind::HighTemp => "high_temp",
            IssueKind::LowTemp => "low_temp",
            IssueKind::HighHumidity => "high_humidity",
            IssueKind::LowBattery => "low_battery",
            IssueKind::CriticalBattery => "critical_battery",
            IssueKind::ConnectionLost => "connection_lost",
            IssueKind::WeakSignal => "weak_signal",
            IssueKind::FirmwareUpdate => "firmware_update",
            IssueKind::SensorMalfunction => "sensor_malfunction",
            IssueKind::StorageFull => "storage_full",
            IssueKind::MotionAlert => "motion_alert",
            IssueKind::BulbFlickering => "bulb_flickering",
            IssueKind::Unresponsive => "unresponsive",
            IssueKind::Overload => "overload",
            IssueKind::LeakDetected => "leak_detected",
            IssueKind::HighFlow => "high_flow",
            IssueKind::AbnormalUsage => "abnormal_usage",
        }
    }

    /// Parses an issue string as it appears in persisted records. Unknown
    /// strings map to `None` so that version skew degrades to "skip".
    pub fn parse(s: &str) -> Option<IssueKind> {
        match s {
            "none" => Some(IssueKind::None),
            "high_temp" => Some(IssueKind::HighTemp),
            "low_temp" => Some(IssueKind::LowTemp),
            "high_humidity" => Some(IssueKind::HighHumidity),
            "low_battery" => Some(IssueKind::LowBattery),
            "critical_battery" => Some(IssueKind::CriticalBattery),
            "connection_lost" => Some(IssueKind::ConnectionLost),
            "weak_signal" => Some(IssueKind::WeakSignal),
            "firmware_update" => Some(IssueKind::FirmwareUpdate),
            "sensor_malfunction" => Some(IssueKind::SensorMalfunction),
            "storage_full" => Some(IssueKind::StorageFull),
            "motion_alert" => Some(IssueKind::MotionAlert),
            "bulb_flickering" => Some(IssueKind::BulbFlickering),
            "unresponsive" => Some(IssueKind::Unresponsive),
            "overload" => Some(IssueKind::Overload),
            "leak_detected" => Some(IssueKind::LeakDetected),
            "high_flow" => Some(IssueKind::HighFlow),
            "abnormal_usage" => Some(IssueKind::AbnormalUsage),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, IssueKind::None)
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One telemetry snapshot produced by a device tick.
///
/// Readings are append-only: once produced they are never mutated, so they
/// can be shared freely between the controller, the sink, and analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub device_id: String,
    pub device_type: DeviceKind,
    pub timestamp: DateTime<Utc>,
    pub payload: Payload,
    pub signal_strength: u8,
    pub status: DeviceStatus,
    pub issue: IssueKind,
    pub response_time_ms: u32,
}

impl Reading {
    /// Numeric payload field, if present and numeric.
    pub fn payload_f64(&self, key: &str) -> Option<f64> {
        self.payload.get(key).and_then(|v| v.as_f64())
    }

    /// Boolean payload field, if present and boolean.
    pub fn payload_bool(&self, key: &str) -> Option<bool> {
        self.payload.get(key).and_then(|v| v.as_bool())
    }

    /// String payload field, if present and a string.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_is_case_insensitive() {
        assert_eq!(DeviceKind::parse("bulb"), Some(DeviceKind::Bulb));
        assert_eq!(DeviceKind::parse("Water_Meter"), Some(DeviceKind::WaterMeter));
        assert_eq!(DeviceKind::parse("toaster"), None);
    }

    #[test]
    fn test_issue_parse_rejects_unknown() {
        assert_eq!(IssueKind::parse("leak_detected"), Some(IssueKind::LeakDetected));
        assert_eq!(IssueKind::parse("quantum_flux"), None);
    }

    #[test]
    fn test_payload_accessors() {
        let mut payload = Payload::new();
        payload.insert("current_temp".into(), serde_json::json!(21.5));
        payload.insert("is_on".into(), serde_json::json!(true));

        let reading = Reading {
            device_id: "bulb_01".to_string(),
            device_type: DeviceKind::Bulb,
            timestamp: Utc::now(),
            payload,
            signal_strength: 80,
            status: DeviceStatus::Online,
            issue: IssueKind::None,
            response_time_ms: 50,
        };

        assert_eq!(reading.payload_f64("current_temp"), Some(21.5));
        assert_eq!(reading.payload_bool("is_on"), Some(true));
        assert_eq!(reading.payload_f64("missing"), None);
    }
}
