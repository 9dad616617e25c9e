//! Maps detected issues to corrective actions.

use hearth_core::{IssueKind, Reading};
use hearth_devices::{CommandArgs, Device, Entropy};
use tracing::info;

/// What the policy did about one detected issue.
#[derive(Debug, Clone)]
pub struct RemediationOutcome {
    /// Human-readable issue label; `None` means the kind has no mapping
    /// and was skipped (version-skew defense).
    pub label: Option<&'static str>,
    /// Description of the corrective action, when one exists.
    pub action: Option<&'static str>,
    /// Context pulled from the reading payload (temperature, battery, ...).
    pub context: String,
    /// Result message of the corrective action.
    pub result: Option<String>,
    /// Whether the action counts as resolving the issue.
    pub resolved: bool,
}

impl RemediationOutcome {
    fn skipped() -> Self {
        Self {
            label: None,
            action: None,
            context: String::new(),
            result: None,
            resolved: false,
        }
    }

    fn advisory(label: &'static str, context: String) -> Self {
        Self {
            label: Some(label),
            action: None,
            context,
            result: None,
            resolved: false,
        }
    }

    fn acted(
        label: &'static str,
        action: &'static str,
        context: String,
        result: String,
        resolved: bool,
    ) -> Self {
        Self {
            label: Some(label),
            action: Some(action),
            context,
            result: Some(result),
            resolved,
        }
    }

    pub fn was_skipped(&self) -> bool {
        self.label.is_none()
    }
}

fn payload_value(reading: &Reading, key: &str) -> f64 {
    reading.payload_f64(key).unwrap_or(0.0)
}

/// Applies the corrective action for `issue` against its device.
///
/// Pure mapping from issue kind to label + optional command; kinds without
/// a mapping (and `None`) are skipped. Issues without a command are
/// advisory: detected, logged, but not resolved here.
pub async fn remediate(
    device: &mut Device,
    issue: IssueKind,
    reading: &Reading,
    entropy: &mut Entropy,
) -> RemediationOutcome {
    let no_args = CommandArgs::new();
    let command = |device: &mut Device, name: &str| {
        let outcome = device.apply_command(name, &no_args);
        let resolved = outcome.is_applied();
        (outcome.to_string(), resolved)
    };

    match issue {
        IssueKind::HighTemp => {
            let context = format!("{:.1}C", payload_value(reading, "current_temp"));
            let (result, resolved) = command(device, "cool");
            RemediationOutcome::acted("High Temperature", "Activating cooling", context, result, resolved)
        }
        IssueKind::LowTemp => {
            let context = format!("{:.1}C", payload_value(reading, "current_temp"));
            let (result, resolved) = command(device, "heat");
            RemediationOutcome::acted("Low Temperature", "Activating heating", context, result, resolved)
        }
        IssueKind::HighHumidity => {
            let context = format!("{:.1}%", payload_value(reading, "humidity"));
            let (result, resolved) = command(device, "dehumidify");
            RemediationOutcome::acted("High Humidity", "Running dehumidifier", context, result, resolved)
        }
        IssueKind::SensorMalfunction => {
            let context = format!("drift {:.1}C", payload_value(reading, "sensor_drift"));
            let (result, resolved) = command(device, "calibrate");
            RemediationOutcome::acted("Sensor Drift", "Recalibrating", context, result, resolved)
        }
        IssueKind::LowBattery => {
            // Low battery only warns; charging is the owner's call
            let context = format!("{:.1}%", payload_value(reading, "battery_level"));
            RemediationOutcome::advisory("Low Battery", context)
        }
        IssueKind::CriticalBattery => {
            let context = format!("{:.1}%", payload_value(reading, "battery_level"));
            let (result, resolved) = command(device, "charge");
            RemediationOutcome::acted("Critical Battery", "Starting charge", context, result, resolved)
        }
        IssueKind::StorageFull => {
            let context = format!("{:.1}%", payload_value(reading, "storage_percent"));
            let (result, resolved) = command(device, "clear_storage");
            RemediationOutcome::acted("Storage Full", "Clearing old files", context, result, resolved)
        }
        IssueKind::ConnectionLost => {
            device.reconnect(entropy).await;
            let result = format!("reconnected ({}%)", device.signal_strength());
            RemediationOutcome::acted(
                "Connection Lost",
                "Reconnecting",
                "signal lost".to_string(),
                result,
                true,
            )
        }
        IssueKind::WeakSignal => {
            let context = format!("{}%", reading.signal_strength);
            let boosted = device.boost_signal();
            RemediationOutcome::acted(
                "Weak Signal",
                "Boosting signal",
                context,
                format!("boosted to {boosted}%"),
                true,
            )
        }
        IssueKind::FirmwareUpdate => {
            let context = format!("v{}", device.firmware_version());
            let version = device.update_firmware().to_string();
            RemediationOutcome::acted(
                "Firmware Update",
                "Installing update",
                context,
                format!("updated to v{version}"),
                true,
            )
        }
        IssueKind::BulbFlickering => {
            let context = format!("{}% brightness", payload_value(reading, "brightness"));
            let (result, resolved) = command(device, "fix_flicker");
            RemediationOutcome::acted("Bulb Flickering", "Resetting bulb", context, result, resolved)
        }
        IssueKind::Overload => {
            let context = format!("{:.1}W", payload_value(reading, "power_draw"));
            let (result, resolved) = command(device, "reduce_load");
            RemediationOutcome::acted("Overload Warning", "Reducing load", context, result, resolved)
        }
        IssueKind::Unresponsive => {
            let context = format!("{}ms latency", reading.response_time_ms);
            device.reconnect(entropy).await;
            RemediationOutcome::acted(
                "Unresponsive",
                "Restarting device",
                context,
                "restarted".to_string(),
                true,
            )
        }
        IssueKind::MotionAlert => {
            info!(
                device = %device.name(),
                location = %device.location(),
                "motion detected"
            );
            RemediationOutcome::advisory("Motion Detected", String::new())
        }
        // No automatic fix exists for these; the next monitor pass will
        // see them again once the cooldown lapses
        IssueKind::None
        | IssueKind::LeakDetected
        | IssueKind::HighFlow
        | IssueKind::AbnormalUsage => RemediationOutcome::skipped(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hearth_core::{DeviceStatus, Payload};
    use hearth_devices::{create, Model};

    fn reading_for(device: &Device, issue: IssueKind, pairs: &[(&str, f64)]) -> Reading {
        let mut payload = Payload::new();
        for (k, v) in pairs {
            payload.insert(k.to_string(), serde_json::json!(v));
        }
        Reading {
            device_id: device.id().to_string(),
            device_type: device.kind(),
            timestamp: Utc::now(),
            payload,
            signal_strength: device.signal_strength(),
            status: DeviceStatus::Warning,
            issue,
            response_time_ms: 60,
        }
    }

    fn device(kind: &str, entropy: &mut Entropy) -> Device {
        let mut dev = create(kind, "dev_01", "Device", "Lab", &CommandArgs::new(), entropy).unwrap();
        dev.force_online(80);
        dev
    }

    #[tokio::test]
    async fn test_high_temp_triggers_cooling() {
        let mut entropy = Entropy::seeded(50);
        let mut dev = device("THERMOSTAT", &mut entropy);
        let reading = reading_for(&dev, IssueKind::HighTemp, &[("current_temp", 33.2)]);

        let outcome = remediate(&mut dev, IssueKind::HighTemp, &reading, &mut entropy).await;
        assert!(outcome.resolved);
        assert_eq!(outcome.context, "33.2C");
        assert_eq!(outcome.result.as_deref(), Some("cooling"));

        match dev.model() {
            Model::Thermostat(t) => assert_eq!(t.hvac_mode().as_str(), "cool"),
            other => panic!("unexpected model: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_critical_battery_starts_charging() {
        let mut entropy = Entropy::seeded(51);
        let mut dev = device("CAMERA", &mut entropy);
        let reading = reading_for(&dev, IssueKind::CriticalBattery, &[("battery_level", 3.0)]);

        let outcome =
            remediate(&mut dev, IssueKind::CriticalBattery, &reading, &mut entropy).await;
        assert!(outcome.resolved);

        match dev.model() {
            Model::Camera(c) => assert!(c.is_charging()),
            other => panic!("unexpected model: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_low_battery_is_advisory_only() {
        let mut entropy = Entropy::seeded(52);
        let mut dev = device("CAMERA", &mut entropy);
        let reading = reading_for(&dev, IssueKind::LowBattery, &[("battery_level", 15.0)]);

        let outcome = remediate(&mut dev, IssueKind::LowBattery, &reading, &mut entropy).await;
        assert!(!outcome.resolved);
        assert!(outcome.action.is_none());

        match dev.model() {
            Model::Camera(c) => assert!(!c.is_charging()),
            other => panic!("unexpected model: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_motion_alert_takes_no_action() {
        let mut entropy = Entropy::seeded(53);
        let mut dev = device("CAMERA", &mut entropy);
        let reading = reading_for(&dev, IssueKind::MotionAlert, &[]);

        let outcome = remediate(&mut dev, IssueKind::MotionAlert, &reading, &mut entropy).await;
        assert!(!outcome.resolved);
        assert!(outcome.action.is_none());
        assert!(!outcome.was_skipped());
    }

    #[tokio::test]
    async fn test_unmapped_kinds_are_skipped() {
        let mut entropy = Entropy::seeded(54);
        let mut dev = device("WATER_METER", &mut entropy);
        let reading = reading_for(&dev, IssueKind::LeakDetected, &[]);

        let outcome = remediate(&mut dev, IssueKind::LeakDetected, &reading, &mut entropy).await;
        assert!(outcome.was_skipped());
        assert!(!outcome.resolved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_lost_reconnects() {
        let mut entropy = Entropy::seeded(55);
        let mut dev = device("BULB", &mut entropy);
        dev.disconnect();
        let reading = reading_for(&dev, IssueKind::ConnectionLost, &[]);

        let outcome =
            remediate(&mut dev, IssueKind::ConnectionLost, &reading, &mut entropy).await;
        assert!(outcome.resolved);
        assert!(dev.is_connected());
        assert!((70..=100).contains(&dev.signal_strength()));
    }

    #[tokio::test]
    async fn test_weak_signal_boosts() {
        let mut entropy = Entropy::seeded(56);
        let mut dev = device("BULB", &mut entropy);
        dev.force_online(25);
        let reading = reading_for(&dev, IssueKind::WeakSignal, &[]);

        let outcome = remediate(&mut dev, IssueKind::WeakSignal, &reading, &mut entropy).await;
        assert!(outcome.resolved);
        assert_eq!(dev.signal_strength(), 65);
        assert_eq!(outcome.result.as_deref(), Some("boosted to 65%"));
    }
}
