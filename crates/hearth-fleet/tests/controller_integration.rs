//! End-to-end fleet test: update loops, monitor remediation, sink hand-off.

use hearth_devices::{create, CommandArgs, Device, Entropy};
use hearth_fleet::{ControllerConfig, FleetController};
use hearth_storage::{SinkConfig, TelemetrySink};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn props(pairs: &[(&str, serde_json::Value)]) -> CommandArgs {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn fast_config() -> ControllerConfig {
    ControllerConfig {
        tick_interval: (Duration::from_millis(10), Duration::from_millis(25)),
        monitor_interval: Duration::from_millis(50),
        cooldown: Duration::from_millis(200),
        buffer_capacity: 200,
        time_multiplier: 1.0,
        seed: Some(7),
    }
}

fn demo_fleet(entropy: &mut Entropy) -> Vec<Device> {
    vec![
        create(
            "THERMOSTAT",
            "thermo_01",
            "Hot Thermostat",
            "Attic",
            &props(&[("current_temp", json!(40.0)), ("target_temp", json!(24.0))]),
            entropy,
        )
        .unwrap(),
        create(
            "CAMERA",
            "cam_01",
            "Door Camera",
            "Front Door",
            &props(&[("battery_level", json!(3.0))]),
            entropy,
        )
        .unwrap(),
        create(
            "BULB",
            "bulb_01",
            "Desk Lamp",
            "Office",
            &props(&[("is_on", json!(true)), ("brightness", json!(80))]),
            entropy,
        )
        .unwrap(),
    ]
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_fleet_end_to_end() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("history.log");
    let sink = Arc::new(
        TelemetrySink::start(
            SinkConfig::new(&log_path).with_flush_interval(Duration::from_millis(50)),
        )
        .unwrap(),
    );

    let controller = FleetController::new(fast_config(), Some(Arc::clone(&sink)));
    let mut entropy = Entropy::seeded(7);
    for device in demo_fleet(&mut entropy) {
        controller.add_device(device);
    }

    let fanout = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&fanout);
    controller.subscribe(move |_reading| {
        seen.fetch_add(1, Ordering::Relaxed);
    });

    controller.connect_all().await;
    controller.run_for(Duration::from_millis(1200)).await;

    // Loops produced telemetry and fanned it out
    let updates = controller.update_count();
    assert!(updates > 0, "no updates produced");
    assert_eq!(fanout.load(Ordering::Relaxed) as u64, updates);

    // Per-device streams are time-ordered; the buffer respects its cap
    let readings = controller.readings();
    assert!(!readings.is_empty());
    assert!(readings.len() <= 200);
    let mut last_seen: HashMap<&str, chrono::DateTime<chrono::Utc>> = HashMap::new();
    for reading in &readings {
        if let Some(previous) = last_seen.get(reading.device_id.as_str()) {
            assert!(
                reading.timestamp >= *previous,
                "out-of-order readings for {}",
                reading.device_id
            );
        }
        last_seen.insert(reading.device_id.as_str(), reading.timestamp);
    }

    // The hot thermostat kept reporting above 30 °C, so the monitor must
    // have both detected and remediated at least once
    let summary = controller.issue_summary();
    assert!(summary.total_detected() >= 1, "no issues detected");
    assert!(summary.total_resolved() >= 1, "no issues resolved");

    // Stopping again is a no-op
    controller.stop().await;
    assert!(!controller.is_running());

    // Device snapshots stay available after the run
    let snapshots = controller.snapshots().await;
    assert_eq!(snapshots.len(), 3);
    assert!(snapshots.iter().any(|s| s.device_id == "thermo_01"));

    // Everything the loops enqueued reaches the log
    sink.stop(Duration::from_secs(5));
    assert_eq!(sink.records_written(), updates);
    let content = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(content.lines().count() as u64, updates);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_device_removal_while_running() {
    let controller = FleetController::new(fast_config(), None);
    let mut entropy = Entropy::seeded(8);
    for device in demo_fleet(&mut entropy) {
        controller.add_device(device);
    }

    controller.connect_all().await;
    controller.start();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(controller.remove_device("bulb_01"));
    let count_at_removal = controller
        .readings()
        .iter()
        .filter(|r| r.device_id == "bulb_01")
        .count();

    // Give the orphaned loop time to observe the miss and exit, then make
    // sure the removed device went quiet
    tokio::time::sleep(Duration::from_millis(300)).await;
    let count_after = controller
        .readings()
        .iter()
        .filter(|r| r.device_id == "bulb_01")
        .count();
    assert!(count_after <= count_at_removal + 1);

    controller.stop().await;
}
