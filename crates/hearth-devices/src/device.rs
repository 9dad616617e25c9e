//! Device core: shared link state, the sealed model set, and the tick cycle.

use crate::bulb::Bulb;
use crate::camera::Camera;
use crate::command::{CommandArgs, CommandOutcome};
use crate::entropy::Entropy;
use crate::thermostat::Thermostat;
use crate::water_meter::WaterMeter;
use chrono::Utc;
use hearth_core::{DeviceKind, DeviceStatus, IssueKind, Payload, Reading};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Shared connection state carried by every device regardless of kind.
#[derive(Debug, Clone)]
pub struct Link {
    connected: bool,
    signal: u8,
    firmware_version: String,
    needs_update: bool,
    status: DeviceStatus,
    current_issue: IssueKind,
    response_time_ms: u32,
}

impl Default for Link {
    fn default() -> Self {
        Self {
            connected: false,
            signal: 100,
            firmware_version: "1.0.0".to_string(),
            needs_update: false,
            status: DeviceStatus::Offline,
            current_issue: IssueKind::None,
            response_time_ms: 50,
        }
    }
}

impl Link {
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn signal_strength(&self) -> u8 {
        self.signal
    }

    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    pub fn current_issue(&self) -> IssueKind {
        self.current_issue
    }

    pub fn firmware_version(&self) -> &str {
        &self.firmware_version
    }

    pub fn response_time_ms(&self) -> u32 {
        self.response_time_ms
    }

    /// Records an issue together with the status it implies.
    pub(crate) fn flag(&mut self, issue: IssueKind, status: DeviceStatus) {
        self.current_issue = issue;
        self.status = status;
    }

    /// Records an issue without touching the reported status (motion alerts).
    pub(crate) fn flag_issue(&mut self, issue: IssueKind) {
        self.current_issue = issue;
    }

    /// Clears the active issue and returns the device to `Online`.
    pub(crate) fn clear_issue(&mut self) {
        self.current_issue = IssueKind::None;
        self.status = DeviceStatus::Online;
    }

    fn shift_signal(&mut self, delta: i64, floor: u8, ceil: u8) {
        let next = (self.signal as i64 + delta).clamp(floor as i64, ceil as i64);
        self.signal = next as u8;
    }

    /// One pass of the generic link behavior shared by every device kind.
    ///
    /// Side effects here (signal walk, forced disconnect, status changes)
    /// happen before the kind-specific rule runs and are never rolled back,
    /// even when the kind-specific issue ends up being the one reported.
    pub(crate) fn simulate(&mut self, entropy: &mut Entropy) -> Option<IssueKind> {
        // Signal fluctuation, slightly biased toward decrease
        if entropy.chance(0.15) {
            let change = entropy.int_between(-8, 5);
            self.shift_signal(change, 20, 100);
        }

        // Occasional recovery when the link is weak
        if self.signal < 60 && entropy.chance(0.1) {
            let boost = entropy.int_between(5, 15);
            self.shift_signal(boost, 0, 100);
        }

        // Connection drops only when the signal is critically low
        if entropy.chance(0.01) && self.signal < 25 {
            self.connected = false;
            self.flag(IssueKind::ConnectionLost, DeviceStatus::Offline);
            return Some(IssueKind::ConnectionLost);
        }

        if self.signal < 30 {
            self.flag(IssueKind::WeakSignal, DeviceStatus::Warning);
            return Some(IssueKind::WeakSignal);
        }

        if self.needs_update && entropy.chance(0.02) {
            self.flag(IssueKind::FirmwareUpdate, DeviceStatus::Warning);
            return Some(IssueKind::FirmwareUpdate);
        }

        if entropy.chance(0.01) {
            self.response_time_ms = entropy.int_between(2000, 5000) as u32;
            self.flag(IssueKind::Unresponsive, DeviceStatus::Error);
            return Some(IssueKind::Unresponsive);
        }

        // Normal operation: transient link issues clear themselves
        if matches!(
            self.current_issue,
            IssueKind::WeakSignal | IssueKind::Unresponsive
        ) {
            self.clear_issue();
        }

        self.response_time_ms = entropy.int_between(20, 150) as u32;
        None
    }
}

/// Kind-specific measurement state. The set is closed: new device types are
/// rare and known in advance, so a sealed enum replaces deep inheritance.
#[derive(Debug, Clone)]
pub enum Model {
    Bulb(Bulb),
    Thermostat(Thermostat),
    Camera(Camera),
    WaterMeter(WaterMeter),
}

impl Model {
    pub fn kind(&self) -> DeviceKind {
        match self {
            Model::Bulb(_) => DeviceKind::Bulb,
            Model::Thermostat(_) => DeviceKind::Thermostat,
            Model::Camera(_) => DeviceKind::Camera,
            Model::WaterMeter(_) => DeviceKind::WaterMeter,
        }
    }

    fn issue(&mut self, link: &mut Link, entropy: &mut Entropy) -> Option<IssueKind> {
        match self {
            Model::Bulb(b) => b.issue(link, entropy),
            Model::Thermostat(t) => t.issue(link, entropy),
            Model::Camera(c) => c.issue(link, entropy),
            Model::WaterMeter(w) => w.issue(link, entropy),
        }
    }

    fn payload(&mut self, entropy: &mut Entropy) -> Payload {
        match self {
            Model::Bulb(b) => b.payload(),
            Model::Thermostat(t) => t.payload(entropy),
            Model::Camera(c) => c.payload(entropy),
            Model::WaterMeter(w) => w.payload(entropy),
        }
    }

    fn peek_payload(&self) -> Payload {
        match self {
            Model::Bulb(b) => b.peek_payload(),
            Model::Thermostat(t) => t.peek_payload(),
            Model::Camera(c) => c.peek_payload(),
            Model::WaterMeter(w) => w.peek_payload(),
        }
    }

    fn apply_command(
        &mut self,
        link: &mut Link,
        command: &str,
        args: &CommandArgs,
    ) -> CommandOutcome {
        match self {
            Model::Bulb(b) => b.apply_command(link, command, args),
            Model::Thermostat(t) => t.apply_command(link, command, args),
            Model::Camera(c) => c.apply_command(link, command, args),
            Model::WaterMeter(w) => w.apply_command(link, command, args),
        }
    }
}

/// Side-effect-free view of a device, for pull-style consumers.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSnapshot {
    pub device_id: String,
    pub name: String,
    pub location: String,
    pub device_type: DeviceKind,
    pub connected: bool,
    pub signal_strength: u8,
    pub status: DeviceStatus,
    pub issue: IssueKind,
    pub payload: Payload,
}

/// A simulated smart-home device.
#[derive(Debug, Clone)]
pub struct Device {
    id: String,
    name: String,
    location: String,
    link: Link,
    model: Model,
}

impl Device {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        location: impl Into<String>,
        model: Model,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: location.into(),
            link: Link::default(),
            model,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn kind(&self) -> DeviceKind {
        self.model.kind()
    }

    pub fn is_connected(&self) -> bool {
        self.link.connected
    }

    pub fn signal_strength(&self) -> u8 {
        self.link.signal
    }

    pub fn status(&self) -> DeviceStatus {
        self.link.status
    }

    pub fn current_issue(&self) -> IssueKind {
        self.link.current_issue
    }

    pub fn firmware_version(&self) -> &str {
        &self.link.firmware_version
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Brings the device online after a simulated pairing latency.
    pub async fn connect(&mut self, entropy: &mut Entropy) {
        let delay = entropy.uniform(0.5, 2.0);
        debug!(device = %self.id, "connecting");
        tokio::time::sleep(Duration::from_secs_f64(delay)).await;

        self.link.connected = true;
        self.link.status = DeviceStatus::Online;
        self.link.signal = entropy.int_between(60, 100) as u8;
        self.link.needs_update = entropy.chance(0.15);
        debug!(device = %self.id, delay_s = delay, "connected");
    }

    pub fn disconnect(&mut self) {
        self.link.connected = false;
        self.link.status = DeviceStatus::Offline;
        debug!(device = %self.id, "disconnected");
    }

    /// Drops and re-establishes the connection, clearing the active issue.
    pub async fn reconnect(&mut self, entropy: &mut Entropy) -> bool {
        self.link.connected = false;
        self.link.status = DeviceStatus::Offline;
        let delay = entropy.uniform(0.5, 1.5);
        tokio::time::sleep(Duration::from_secs_f64(delay)).await;

        self.link.connected = true;
        self.link.status = DeviceStatus::Online;
        self.link.signal = entropy.int_between(70, 100) as u8;
        self.link.current_issue = IssueKind::None;
        true
    }

    /// Simulates a firmware install; clears the pending-update flag.
    pub fn update_firmware(&mut self) -> &str {
        self.link.firmware_version = "1.1.0".to_string();
        self.link.needs_update = false;
        self.link.current_issue = IssueKind::None;
        &self.link.firmware_version
    }

    /// Boosts signal strength, as if moved closer to the router.
    pub fn boost_signal(&mut self) -> u8 {
        self.link.signal = self.link.signal.saturating_add(40).min(100);
        self.link.current_issue = IssueKind::None;
        self.link.status = DeviceStatus::Online;
        self.link.signal
    }

    /// Advances the simulation by one step and produces a [`Reading`].
    ///
    /// Returns `None` while disconnected. Evaluation order is load-bearing:
    /// the generic link rule runs first (its side effects stick), then the
    /// kind-specific rule, then payload generation advances measurement
    /// state. The kind-specific issue takes precedence in the reported
    /// reading when both fire.
    pub fn tick(&mut self, entropy: &mut Entropy) -> Option<Reading> {
        if !self.link.connected {
            return None;
        }

        let generic = self.link.simulate(entropy);
        let specific = self.model.issue(&mut self.link, entropy);
        let payload = self.model.payload(entropy);

        Some(Reading {
            device_id: self.id.clone(),
            device_type: self.model.kind(),
            timestamp: Utc::now(),
            payload,
            signal_strength: self.link.signal,
            status: self.link.status,
            issue: specific.or(generic).unwrap_or(IssueKind::None),
            response_time_ms: self.link.response_time_ms,
        })
    }

    /// Applies a named command. Unknown commands degrade to
    /// [`CommandOutcome::Unrecognized`]; they never fail the process.
    pub fn apply_command(&mut self, command: &str, args: &CommandArgs) -> CommandOutcome {
        self.model.apply_command(&mut self.link, command, args)
    }

    /// Current state without advancing the simulation.
    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            device_id: self.id.clone(),
            name: self.name.clone(),
            location: self.location.clone(),
            device_type: self.model.kind(),
            connected: self.link.connected,
            signal_strength: self.link.signal,
            status: self.link.status,
            issue: self.link.current_issue,
            payload: self.model.peek_payload(),
        }
    }

    /// Marks the device online without the pairing latency. Test-only.
    #[doc(hidden)]
    pub fn force_online(&mut self, signal: u8) {
        self.link.connected = true;
        self.link.status = DeviceStatus::Online;
        self.link.signal = signal.min(100);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_bulb() -> Device {
        Device::new("bulb_01", "Test Bulb", "Lab", Model::Bulb(Bulb::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_sets_link_state() {
        let mut entropy = Entropy::seeded(1);
        let mut dev = test_bulb();
        assert!(!dev.is_connected());

        dev.connect(&mut entropy).await;
        assert!(dev.is_connected());
        assert_eq!(dev.status(), DeviceStatus::Online);
        assert!((60..=100).contains(&dev.signal_strength()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_clears_issue() {
        let mut entropy = Entropy::seeded(2);
        let mut dev = test_bulb();
        dev.force_online(22);
        dev.link.flag(IssueKind::WeakSignal, DeviceStatus::Warning);

        assert!(dev.reconnect(&mut entropy).await);
        assert!(dev.is_connected());
        assert_eq!(dev.current_issue(), IssueKind::None);
        assert!((70..=100).contains(&dev.signal_strength()));
    }

    #[test]
    fn test_tick_returns_none_when_disconnected() {
        let mut entropy = Entropy::seeded(3);
        let mut dev = test_bulb();
        assert!(dev.tick(&mut entropy).is_none());
    }

    #[test]
    fn test_signal_stays_in_bounds_under_sustained_ticking() {
        let mut entropy = Entropy::seeded(4);
        let mut dev = test_bulb();
        dev.force_online(90);

        for _ in 0..5000 {
            if let Some(reading) = dev.tick(&mut entropy) {
                assert!(reading.signal_strength <= 100);
                assert!(reading.response_time_ms >= 20);
            } else {
                // Forced disconnect after a critical-signal drop is legal
                dev.force_online(80);
            }
        }
    }

    #[test]
    fn test_boost_signal_caps_at_hundred() {
        let mut dev = test_bulb();
        dev.force_online(85);
        assert_eq!(dev.boost_signal(), 100);
        assert_eq!(dev.status(), DeviceStatus::Online);
    }

    #[test]
    fn test_update_firmware_clears_pending_flag() {
        let mut dev = test_bulb();
        dev.link.needs_update = true;
        assert_eq!(dev.update_firmware(), "1.1.0");
        assert!(!dev.link.needs_update);
    }

    #[test]
    fn test_unknown_command_is_not_fatal() {
        let mut dev = test_bulb();
        let outcome = dev.apply_command("levitate", &CommandArgs::new());
        assert_eq!(outcome, CommandOutcome::Unrecognized);
    }

    #[test]
    fn test_snapshot_does_not_advance_state() {
        let mut dev = test_bulb();
        dev.force_online(75);
        let a = dev.snapshot();
        let b = dev.snapshot();
        assert_eq!(a.payload, b.payload);
        assert_eq!(a.signal_strength, b.signal_strength);
    }
}
