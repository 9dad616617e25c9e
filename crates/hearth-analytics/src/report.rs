//! Fleet metric aggregation and the composed report.

use crate::filters::{critical_readings, has_issue};
use hearth_core::{DeviceKind, Reading};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Watts drawn by a bulb at full brightness.
const BULB_MAX_WATTS: f64 = 10.0;

/// One aggregated value plus the number of readings that produced it.
/// `value` is `None` when no reading qualified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub value: Option<f64>,
    pub samples: usize,
}

impl Aggregate {
    fn empty() -> Self {
        Self::default()
    }

    fn of(value: f64, samples: usize) -> Self {
        Self {
            value: Some(value),
            samples,
        }
    }
}

/// Numeric fleet-wide metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetMetrics {
    pub average_temperature: Aggregate,
    pub total_energy_w: Aggregate,
    pub average_battery: Aggregate,
    pub active_devices: usize,
    pub average_signal: Aggregate,
    pub average_response_ms: Aggregate,
    pub health_score: Aggregate,
}

/// Composed analytics output for one reading snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetReport {
    pub total_readings: usize,
    pub critical_count: usize,
    pub issue_count: usize,
    pub metrics: FleetMetrics,
    pub issue_breakdown: BTreeMap<String, usize>,
    pub critical: Vec<Reading>,
}

/// Average reported temperature across thermostat readings.
pub fn average_temperature(readings: &[Reading]) -> Aggregate {
    let temps: Vec<f64> = readings
        .iter()
        .filter(|r| r.device_type == DeviceKind::Thermostat)
        .filter_map(|r| r.payload_f64("current_temp"))
        .collect();

    if temps.is_empty() {
        return Aggregate::empty();
    }
    Aggregate::of(temps.iter().sum::<f64>() / temps.len() as f64, temps.len())
}

/// Total draw of bulbs that are currently on, scaled by brightness.
pub fn total_energy_w(readings: &[Reading]) -> Aggregate {
    let lit: Vec<&Reading> = readings
        .iter()
        .filter(|r| {
            r.device_type == DeviceKind::Bulb && r.payload_bool("is_on").unwrap_or(false)
        })
        .collect();

    let watts = lit
        .iter()
        .map(|r| (r.payload_f64("brightness").unwrap_or(0.0) / 100.0) * BULB_MAX_WATTS)
        .sum::<f64>();

    Aggregate::of(watts, lit.len())
}

/// Average battery level across camera readings.
pub fn average_battery(readings: &[Reading]) -> Aggregate {
    let levels: Vec<f64> = readings
        .iter()
        .filter(|r| r.device_type == DeviceKind::Camera)
        .filter_map(|r| r.payload_f64("battery_level"))
        .collect();

    if levels.is_empty() {
        return Aggregate::empty();
    }
    Aggregate::of(
        levels.iter().sum::<f64>() / levels.len() as f64,
        levels.len(),
    )
}

/// Number of distinct devices that produced at least one reading.
pub fn active_devices(readings: &[Reading]) -> usize {
    readings
        .iter()
        .map(|r| r.device_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Average signal strength across all readings.
pub fn average_signal(readings: &[Reading]) -> Aggregate {
    if readings.is_empty() {
        return Aggregate::empty();
    }
    let total: u64 = readings.iter().map(|r| r.signal_strength as u64).sum();
    Aggregate::of(total as f64 / readings.len() as f64, readings.len())
}

/// Average device response time across all readings.
pub fn average_response_ms(readings: &[Reading]) -> Aggregate {
    if readings.is_empty() {
        return Aggregate::empty();
    }
    let total: u64 = readings.iter().map(|r| r.response_time_ms as u64).sum();
    Aggregate::of(total as f64 / readings.len() as f64, readings.len())
}

/// Fleet health score in [0, 100].
///
/// Per reading: start at 100, deduct the shortfall below 50% signal, a flat
/// 20 for any active issue, and up to 30 for response times beyond 500 ms;
/// individual scores floor at 0 before averaging.
pub fn health_score(readings: &[Reading]) -> Aggregate {
    if readings.is_empty() {
        return Aggregate::empty();
    }

    let total: i64 = readings
        .iter()
        .map(|r| {
            let mut score: i64 = 100;
            if r.signal_strength < 50 {
                score -= 50 - r.signal_strength as i64;
            }
            if has_issue(r) {
                score -= 20;
            }
            if r.response_time_ms > 500 {
                score -= ((r.response_time_ms as i64 - 500) / 100).min(30);
            }
            score.max(0)
        })
        .sum();

    Aggregate::of(total as f64 / readings.len() as f64, readings.len())
}

/// Histogram of active issues by kind; healthy readings are excluded.
pub fn issue_breakdown(readings: &[Reading]) -> BTreeMap<String, usize> {
    let mut histogram = BTreeMap::new();
    for reading in readings.iter().filter(|r| has_issue(r)) {
        *histogram
            .entry(reading.issue.as_str().to_string())
            .or_insert(0) += 1;
    }
    histogram
}

/// Derives the full fleet report from one snapshot of readings.
///
/// Pure: identical input always yields an identical report.
pub fn process(readings: &[Reading]) -> FleetReport {
    let critical = critical_readings(readings);
    let issue_count = readings.iter().filter(|r| has_issue(r)).count();

    FleetReport {
        total_readings: readings.len(),
        critical_count: critical.len(),
        issue_count,
        metrics: FleetMetrics {
            average_temperature: average_temperature(readings),
            total_energy_w: total_energy_w(readings),
            average_battery: average_battery(readings),
            active_devices: active_devices(readings),
            average_signal: average_signal(readings),
            average_response_ms: average_response_ms(readings),
            health_score: health_score(readings),
        },
        issue_breakdown: issue_breakdown(readings),
        critical,
    }
}
