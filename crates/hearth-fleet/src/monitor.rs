//! Monitor loop: scans recent readings and dispatches remediation.

use crate::controller::Inner;
use crate::remediation::remediate;
use hearth_core::{IssueKind, Reading};
use hearth_devices::Entropy;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Pause between handled issues within one scan pass. Serializes the
/// monitor's own work; device update loops keep running meanwhile.
const REMEDIATION_PAUSE: Duration = Duration::from_millis(300);

/// Per-device cooldown bookkeeping for the monitor.
///
/// Once a device's issue has been handled, further readings from that
/// device are ignored until the window lapses, so a persistent issue is
/// retried rather than hammered.
#[derive(Debug)]
pub(crate) struct CooldownGate {
    window: Duration,
    handled: HashMap<String, Instant>,
}

impl CooldownGate {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            handled: HashMap::new(),
        }
    }

    pub(crate) fn permits(&self, device_id: &str) -> bool {
        self.permits_at(device_id, Instant::now())
    }

    pub(crate) fn record(&mut self, device_id: &str) {
        self.record_at(device_id, Instant::now());
    }

    fn permits_at(&self, device_id: &str, now: Instant) -> bool {
        match self.handled.get(device_id) {
            Some(last) => now.duration_since(*last) >= self.window,
            None => true,
        }
    }

    fn record_at(&mut self, device_id: &str, now: Instant) {
        self.handled.insert(device_id.to_string(), now);
    }
}

/// Runs until the controller stops. One pass per interval: sample the most
/// recent `2 × device_count` readings and handle each eligible issue.
pub(crate) async fn run_monitor(inner: Arc<Inner>, mut entropy: Entropy) {
    let mut gate = CooldownGate::new(inner.config.cooldown);

    while inner.running.load(Ordering::SeqCst) {
        tokio::time::sleep(inner.config.monitor_interval).await;
        if !inner.running.load(Ordering::SeqCst) {
            break;
        }

        // The window is a fixed-size sample: an issue that appears and
        // resolves entirely between two passes is simply missed.
        let window: Vec<Reading> = {
            let buffer = inner.readings.lock();
            let count = inner.devices.read().len() * 2;
            let skip = buffer.len().saturating_sub(count);
            buffer.iter().skip(skip).cloned().collect()
        };

        for reading in window {
            if !inner.running.load(Ordering::SeqCst) {
                return;
            }
            if reading.issue.is_none() {
                continue;
            }
            if !gate.permits(&reading.device_id) {
                continue;
            }

            let Some(slot) = inner.devices.read().get(&reading.device_id).cloned() else {
                continue;
            };

            // Motion alerts are informational: no cooldown, no counters
            if reading.issue != IssueKind::MotionAlert {
                gate.record(&reading.device_id);
                inner
                    .tracker
                    .lock()
                    .record_detection(&reading.device_id, reading.issue);
            }

            let outcome = {
                let mut device = slot.lock().await;
                remediate(&mut device, reading.issue, &reading, &mut entropy).await
            };

            if outcome.was_skipped() {
                continue;
            }

            if let Some(label) = outcome.label {
                info!(
                    device = %reading.device_id,
                    context = %outcome.context,
                    "{label}"
                );
            }
            if let (Some(action), Some(result)) = (outcome.action, &outcome.result) {
                info!(device = %reading.device_id, "{action}: {result}");
            }

            if outcome.resolved {
                inner
                    .tracker
                    .lock()
                    .record_resolution(&reading.device_id, reading.issue);
            }

            if reading.issue != IssueKind::MotionAlert {
                tokio::time::sleep(REMEDIATION_PAUSE).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_permits_unknown_devices() {
        let gate = CooldownGate::new(Duration::from_secs(5));
        assert!(gate.permits_at("cam_01", Instant::now()));
    }

    #[test]
    fn test_gate_blocks_within_window() {
        let mut gate = CooldownGate::new(Duration::from_secs(5));
        let t0 = Instant::now();
        gate.record_at("cam_01", t0);

        assert!(!gate.permits_at("cam_01", t0 + Duration::from_secs(3)));
        assert!(gate.permits_at("cam_01", t0 + Duration::from_secs(5)));
        assert!(gate.permits_at("cam_01", t0 + Duration::from_secs(9)));
    }

    #[test]
    fn test_gate_tracks_devices_independently() {
        let mut gate = CooldownGate::new(Duration::from_secs(5));
        let t0 = Instant::now();
        gate.record_at("cam_01", t0);

        assert!(!gate.permits_at("cam_01", t0 + Duration::from_secs(1)));
        assert!(gate.permits_at("thermo_01", t0 + Duration::from_secs(1)));
    }

    #[test]
    fn test_gate_reopens_after_re_record() {
        let mut gate = CooldownGate::new(Duration::from_secs(5));
        let t0 = Instant::now();
        gate.record_at("cam_01", t0);
        gate.record_at("cam_01", t0 + Duration::from_secs(6));

        // The second handling restarts the window
        assert!(!gate.permits_at("cam_01", t0 + Duration::from_secs(8)));
        assert!(gate.permits_at("cam_01", t0 + Duration::from_secs(11)));
    }
}
