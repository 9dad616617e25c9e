//! Battery-powered motion camera with on-board storage.

use crate::command::{CommandArgs, CommandOutcome};
use crate::device::Link;
use crate::entropy::Entropy;
use chrono::{DateTime, Utc};
use hearth_core::{DeviceStatus, IssueKind, Payload};
use serde_json::json;

/// On-board storage capacity (MB).
const STORAGE_CAPACITY_MB: f64 = 32_000.0;
/// Battery below this is critical (%).
const CRITICAL_BATTERY_PCT: f64 = 5.0;
/// Battery below this is low (%).
const LOW_BATTERY_PCT: f64 = 20.0;
/// Storage above this needs clearing (%).
const STORAGE_FULL_PCT: f64 = 90.0;

#[derive(Debug, Clone)]
pub struct Camera {
    motion_detected: bool,
    battery_level: f64,
    last_snapshot: DateTime<Utc>,
    storage_used_mb: f64,
    night_vision: bool,
    recording: bool,
    charging: bool,
}

impl Camera {
    /// Cameras start with some storage already used, so entropy is needed
    /// at construction time.
    pub fn new(entropy: &mut Entropy) -> Self {
        Self {
            motion_detected: false,
            battery_level: 100.0,
            last_snapshot: Utc::now(),
            storage_used_mb: entropy.uniform(5_000.0, 20_000.0),
            night_vision: true,
            recording: false,
            charging: false,
        }
    }

    pub fn battery_level(&self) -> f64 {
        self.battery_level
    }

    pub fn is_charging(&self) -> bool {
        self.charging
    }

    pub fn motion_detected(&self) -> bool {
        self.motion_detected
    }

    pub fn set_battery_level(&mut self, v: f64) {
        self.battery_level = v.clamp(0.0, 100.0);
    }

    pub fn set_motion_detected(&mut self, v: bool) {
        self.motion_detected = v;
    }

    pub fn set_storage_used_mb(&mut self, v: f64) {
        self.storage_used_mb = v.clamp(0.0, STORAGE_CAPACITY_MB);
    }

    pub fn storage_percent(&self) -> f64 {
        (self.storage_used_mb / STORAGE_CAPACITY_MB) * 100.0
    }

    /// Takes a still: costs a little battery and storage.
    pub fn take_snapshot(&mut self, entropy: &mut Entropy) {
        self.last_snapshot = Utc::now();
        self.battery_level = (self.battery_level - 0.5).max(0.0);
        self.storage_used_mb += entropy.uniform(1.0, 5.0);
    }

    pub(crate) fn issue(&mut self, link: &mut Link, _entropy: &mut Entropy) -> Option<IssueKind> {
        if self.battery_level < CRITICAL_BATTERY_PCT {
            link.flag(IssueKind::CriticalBattery, DeviceStatus::Error);
            return Some(IssueKind::CriticalBattery);
        }

        if self.battery_level < LOW_BATTERY_PCT {
            link.flag(IssueKind::LowBattery, DeviceStatus::Warning);
            return Some(IssueKind::LowBattery);
        }

        if self.storage_percent() > STORAGE_FULL_PCT {
            link.flag(IssueKind::StorageFull, DeviceStatus::Warning);
            return Some(IssueKind::StorageFull);
        }

        // Motion is noteworthy but not a fault; status is left alone
        if self.motion_detected {
            link.flag_issue(IssueKind::MotionAlert);
            return Some(IssueKind::MotionAlert);
        }

        None
    }

    pub(crate) fn payload(&mut self, entropy: &mut Entropy) -> Payload {
        self.motion_detected = entropy.chance(0.3);

        if self.charging {
            self.battery_level = (self.battery_level + entropy.uniform(0.5, 1.0)).min(100.0);
        } else {
            self.battery_level = (self.battery_level - entropy.uniform(0.1, 0.5)).max(0.0);
        }

        if self.motion_detected {
            self.take_snapshot(entropy);
            self.recording = true;
            // Recording eats storage much faster than stills
            self.storage_used_mb += entropy.uniform(10.0, 50.0);
        } else {
            self.recording = false;
        }

        self.peek_payload()
    }

    pub(crate) fn peek_payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert("motion_detected".into(), json!(self.motion_detected));
        payload.insert(
            "last_snapshot".into(),
            json!(self.last_snapshot.timestamp_millis() as f64 / 1000.0),
        );
        payload.insert("battery_level".into(), json!(self.battery_level));
        payload.insert(
            "storage_percent".into(),
            json!((self.storage_percent() * 10.0).round() / 10.0),
        );
        payload.insert("night_vision".into(), json!(self.night_vision));
        payload.insert("recording".into(), json!(self.recording));
        payload.insert("charging".into(), json!(self.charging));
        payload
    }

    /// Starts charging the battery.
    pub fn start_charging(&mut self, link: &mut Link) -> bool {
        self.charging = true;
        link.clear_issue();
        true
    }

    /// Deletes old recordings, keeping 30% of capacity in use.
    pub fn clear_storage(&mut self, link: &mut Link) -> f64 {
        self.storage_used_mb = STORAGE_CAPACITY_MB * 0.3;
        if self.storage_percent() <= STORAGE_FULL_PCT {
            link.clear_issue();
        }
        (self.storage_percent() * 10.0).round() / 10.0
    }

    pub(crate) fn apply_command(
        &mut self,
        link: &mut Link,
        command: &str,
        _args: &CommandArgs,
    ) -> CommandOutcome {
        match command {
            "snapshot" => {
                // Commands have no entropy of their own; a fixed-cost still
                self.last_snapshot = Utc::now();
                self.battery_level = (self.battery_level - 0.5).max(0.0);
                self.storage_used_mb += 3.0;
                CommandOutcome::applied("snap")
            }
            "arm" => CommandOutcome::applied("armed"),
            "disarm" => {
                self.motion_detected = false;
                CommandOutcome::applied("disarmed")
            }
            "charge" => {
                self.start_charging(link);
                CommandOutcome::applied("charging")
            }
            "clear_storage" => {
                let pct = self.clear_storage(link);
                CommandOutcome::applied(format!("storage at {pct}%"))
            }
            _ => CommandOutcome::Unrecognized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_camera(entropy: &mut Entropy) -> Camera {
        Camera::new(entropy)
    }

    #[test]
    fn test_battery_clamps() {
        let mut entropy = Entropy::seeded(20);
        let mut cam = test_camera(&mut entropy);
        cam.set_battery_level(130.0);
        assert_eq!(cam.battery_level(), 100.0);
        cam.set_battery_level(-4.0);
        assert_eq!(cam.battery_level(), 0.0);
    }

    #[test]
    fn test_critical_battery_outranks_low_battery() {
        let mut entropy = Entropy::seeded(21);
        let mut link = Link::default();
        let mut cam = test_camera(&mut entropy);
        cam.set_battery_level(3.0);

        assert_eq!(
            cam.issue(&mut link, &mut entropy),
            Some(IssueKind::CriticalBattery)
        );
        assert_eq!(link.status(), DeviceStatus::Error);
    }

    #[test]
    fn test_low_battery_band() {
        let mut entropy = Entropy::seeded(22);
        let mut link = Link::default();
        let mut cam = test_camera(&mut entropy);
        cam.set_battery_level(12.0);

        assert_eq!(cam.issue(&mut link, &mut entropy), Some(IssueKind::LowBattery));
    }

    #[test]
    fn test_motion_alert_leaves_status_alone() {
        let mut entropy = Entropy::seeded(23);
        let mut link = Link::default();
        let mut cam = test_camera(&mut entropy);
        cam.set_storage_used_mb(10_000.0);
        cam.set_motion_detected(true);

        let before = link.status();
        assert_eq!(cam.issue(&mut link, &mut entropy), Some(IssueKind::MotionAlert));
        assert_eq!(link.status(), before);
        assert_eq!(link.current_issue(), IssueKind::MotionAlert);
    }

    #[test]
    fn test_charging_recovers_battery() {
        let mut entropy = Entropy::seeded(24);
        let mut link = Link::default();
        let mut cam = test_camera(&mut entropy);
        cam.set_battery_level(10.0);
        cam.start_charging(&mut link);

        let before = cam.battery_level();
        cam.payload(&mut entropy);
        assert!(cam.battery_level() > before);
    }

    #[test]
    fn test_clear_storage_keeps_thirty_percent() {
        let mut entropy = Entropy::seeded(25);
        let mut link = Link::default();
        let mut cam = test_camera(&mut entropy);
        cam.set_storage_used_mb(31_000.0);

        let pct = cam.clear_storage(&mut link);
        assert_eq!(pct, 30.0);
        assert_eq!(link.current_issue(), IssueKind::None);
    }

    #[test]
    fn test_battery_never_escapes_bounds_under_ticking() {
        let mut entropy = Entropy::seeded(26);
        let mut link = Link::default();
        let mut cam = test_camera(&mut entropy);

        for _ in 0..2000 {
            cam.issue(&mut link, &mut entropy);
            cam.payload(&mut entropy);
            assert!((0.0..=100.0).contains(&cam.battery_level()));
        }
    }
}
