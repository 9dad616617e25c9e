//! Issue bookkeeping: detections, resolutions, and the active-issue map.

use hearth_core::IssueKind;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Counts issues by kind and tracks which device currently has which issue.
///
/// Invariant: a device id appears in the active map iff its most recently
/// recorded issue is non-`None` and has not been resolved.
#[derive(Debug, Default)]
pub struct IssueTracker {
    detected: HashMap<IssueKind, u64>,
    resolved: HashMap<IssueKind, u64>,
    active: HashMap<String, IssueKind>,
}

/// Serializable view of the tracker for pull-style consumers.
#[derive(Debug, Clone, Serialize)]
pub struct IssueSummary {
    pub detected: BTreeMap<String, u64>,
    pub resolved: BTreeMap<String, u64>,
    pub active: usize,
}

impl IssueSummary {
    pub fn total_detected(&self) -> u64 {
        self.detected.values().sum()
    }

    pub fn total_resolved(&self) -> u64 {
        self.resolved.values().sum()
    }
}

impl IssueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_detection(&mut self, device_id: &str, issue: IssueKind) {
        *self.detected.entry(issue).or_insert(0) += 1;
        self.active.insert(device_id.to_string(), issue);
    }

    pub fn record_resolution(&mut self, device_id: &str, issue: IssueKind) {
        *self.resolved.entry(issue).or_insert(0) += 1;
        self.active.remove(device_id);
    }

    pub fn active_issue(&self, device_id: &str) -> Option<IssueKind> {
        self.active.get(device_id).copied()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn clear(&mut self) {
        self.detected.clear();
        self.resolved.clear();
        self.active.clear();
    }

    pub fn summary(&self) -> IssueSummary {
        let to_named = |m: &HashMap<IssueKind, u64>| {
            m.iter()
                .map(|(k, v)| (k.as_str().to_string(), *v))
                .collect::<BTreeMap<_, _>>()
        };

        IssueSummary {
            detected: to_named(&self.detected),
            resolved: to_named(&self.resolved),
            active: self.active.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_populates_active_map() {
        let mut tracker = IssueTracker::new();
        tracker.record_detection("cam_01", IssueKind::LowBattery);

        assert_eq!(tracker.active_issue("cam_01"), Some(IssueKind::LowBattery));
        assert_eq!(tracker.active_count(), 1);
    }

    #[test]
    fn test_resolution_clears_active_entry() {
        let mut tracker = IssueTracker::new();
        tracker.record_detection("cam_01", IssueKind::CriticalBattery);
        tracker.record_resolution("cam_01", IssueKind::CriticalBattery);

        assert_eq!(tracker.active_issue("cam_01"), None);
        assert_eq!(tracker.active_count(), 0);

        let summary = tracker.summary();
        assert_eq!(summary.total_detected(), 1);
        assert_eq!(summary.total_resolved(), 1);
    }

    #[test]
    fn test_redetection_overwrites_active_issue() {
        let mut tracker = IssueTracker::new();
        tracker.record_detection("t1", IssueKind::HighTemp);
        tracker.record_detection("t1", IssueKind::SensorMalfunction);

        // One device, latest issue wins; both detections counted
        assert_eq!(tracker.active_issue("t1"), Some(IssueKind::SensorMalfunction));
        assert_eq!(tracker.active_count(), 1);
        assert_eq!(tracker.summary().total_detected(), 2);
    }

    #[test]
    fn test_summary_uses_wire_names() {
        let mut tracker = IssueTracker::new();
        tracker.record_detection("w1", IssueKind::LeakDetected);

        let summary = tracker.summary();
        assert_eq!(summary.detected.get("leak_detected"), Some(&1));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut tracker = IssueTracker::new();
        tracker.record_detection("a", IssueKind::Overload);
        tracker.clear();

        assert_eq!(tracker.active_count(), 0);
        assert_eq!(tracker.summary().total_detected(), 0);
    }
}
