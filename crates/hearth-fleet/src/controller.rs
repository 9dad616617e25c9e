//! Fleet controller: device registry, update loops, and lifecycle.

use crate::error::{FleetError, Result};
use crate::monitor::run_monitor;
use crate::tracker::{IssueSummary, IssueTracker};
use hearth_core::Reading;
use hearth_devices::{CommandArgs, CommandOutcome, Device, DeviceSnapshot, Entropy};
use hearth_storage::TelemetrySink;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{info, warn};

/// Per-reading callback invoked on every produced reading.
pub type Subscriber = Box<dyn Fn(&Reading) + Send + Sync + 'static>;

/// Tuning knobs for the controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Randomized delay between ticks of one device, before scaling.
    pub tick_interval: (Duration, Duration),
    /// Fixed cadence of the issue-monitor loop.
    pub monitor_interval: Duration,
    /// Minimum interval between remediations of the same device.
    pub cooldown: Duration,
    /// Readings kept in memory; the oldest are evicted beyond this.
    pub buffer_capacity: usize,
    /// Speeds up (or slows down) the simulation clock for tick delays.
    pub time_multiplier: f64,
    /// Pin the entropy sequence for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_interval: (Duration::from_secs(1), Duration::from_secs(3)),
            monitor_interval: Duration::from_secs(2),
            cooldown: Duration::from_secs(5),
            buffer_capacity: 10_000,
            time_multiplier: 1.0,
            seed: None,
        }
    }
}

pub(crate) struct Inner {
    pub(crate) config: ControllerConfig,
    pub(crate) devices: RwLock<HashMap<String, Arc<AsyncMutex<Device>>>>,
    pub(crate) readings: Mutex<VecDeque<Reading>>,
    pub(crate) tracker: Mutex<IssueTracker>,
    pub(crate) subscribers: RwLock<Vec<Subscriber>>,
    pub(crate) sink: Option<Arc<TelemetrySink>>,
    pub(crate) running: AtomicBool,
    pub(crate) updates: AtomicU64,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    spawn_seq: AtomicU64,
}

impl Inner {
    /// Entropy for a newly spawned task. With a pinned seed every task gets
    /// a distinct but reproducible stream.
    fn task_entropy(&self) -> Entropy {
        let seq = self.spawn_seq.fetch_add(1, Ordering::Relaxed);
        match self.config.seed {
            Some(seed) => Entropy::seeded(seed.wrapping_add(seq.wrapping_mul(0x9E37_79B9_7F4A_7C15))),
            None => Entropy::from_os(),
        }
    }

    fn push_reading(&self, reading: &Reading) {
        let mut buffer = self.readings.lock();
        while buffer.len() >= self.config.buffer_capacity.max(1) {
            buffer.pop_front();
        }
        buffer.push_back(reading.clone());
    }
}

/// Orchestrates the device fleet: one cooperative update loop per device,
/// one monitor loop, subscriber fan-out, and sink hand-off.
pub struct FleetController {
    inner: Arc<Inner>,
}

impl FleetController {
    pub fn new(config: ControllerConfig, sink: Option<Arc<TelemetrySink>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                devices: RwLock::new(HashMap::new()),
                readings: Mutex::new(VecDeque::new()),
                tracker: Mutex::new(IssueTracker::new()),
                subscribers: RwLock::new(Vec::new()),
                sink,
                running: AtomicBool::new(false),
                updates: AtomicU64::new(0),
                tasks: Mutex::new(Vec::new()),
                spawn_seq: AtomicU64::new(0),
            }),
        }
    }

    /// Registers a device. Safe while running: the device gets its own
    /// update loop immediately (it stays quiet until connected).
    pub fn add_device(&self, device: Device) {
        let id = device.id().to_string();
        let slot = Arc::new(AsyncMutex::new(device));
        self.inner.devices.write().insert(id.clone(), slot);

        if self.inner.running.load(Ordering::SeqCst) {
            self.spawn_device_loop(id);
        }
    }

    /// Removes a device. Safe while running: its loop exits on the next
    /// lookup miss.
    pub fn remove_device(&self, device_id: &str) -> bool {
        self.inner.devices.write().remove(device_id).is_some()
    }

    pub fn device_count(&self) -> usize {
        self.inner.devices.read().len()
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Registers a callback invoked once per produced reading.
    pub fn subscribe(&self, callback: impl Fn(&Reading) + Send + Sync + 'static) {
        self.inner.subscribers.write().push(Box::new(callback));
    }

    /// Connects every registered device concurrently. Idempotent: devices
    /// that are already connected are skipped, so callers may re-run this
    /// after `add_device`.
    pub async fn connect_all(&self) {
        let slots: Vec<Arc<AsyncMutex<Device>>> =
            self.inner.devices.read().values().cloned().collect();

        let mut join_set = JoinSet::new();
        for slot in slots {
            let mut entropy = self.inner.task_entropy();
            join_set.spawn(async move {
                let mut device = slot.lock().await;
                if !device.is_connected() {
                    device.connect(&mut entropy).await;
                }
            });
        }
        while join_set.join_next().await.is_some() {}

        info!(devices = self.device_count(), "fleet connected");
    }

    /// Starts the update and monitor loops. Idempotent.
    pub fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let ids: Vec<String> = self.inner.devices.read().keys().cloned().collect();
        for id in ids {
            self.spawn_device_loop(id);
        }

        let monitor = tokio::spawn(run_monitor(
            Arc::clone(&self.inner),
            self.inner.task_entropy(),
        ));
        self.inner.tasks.lock().push(monitor);

        info!(devices = self.device_count(), "fleet controller started");
    }

    /// Runs for `duration`, then stops.
    pub async fn run_for(&self, duration: Duration) {
        self.start();
        tokio::time::sleep(duration).await;
        self.stop().await;
    }

    /// Stops all loops and waits for them to wind down. Idempotent; the
    /// final counters are reported once.
    pub async fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return;
        }

        let tasks: Vec<JoinHandle<()>> = self.inner.tasks.lock().drain(..).collect();
        for task in &tasks {
            task.abort();
        }
        for task in tasks {
            match task.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => warn!("fleet task ended abnormally: {e}"),
            }
        }

        info!(
            updates = self.update_count(),
            active_issues = self.inner.tracker.lock().active_count(),
            "fleet controller stopped"
        );
    }

    /// Applies a command to one device by id.
    pub async fn apply_command(
        &self,
        device_id: &str,
        command: &str,
        args: &CommandArgs,
    ) -> Result<CommandOutcome> {
        let slot = self
            .inner
            .devices
            .read()
            .get(device_id)
            .cloned()
            .ok_or_else(|| FleetError::DeviceNotFound(device_id.to_string()))?;

        let mut device = slot.lock().await;
        Ok(device.apply_command(command, args))
    }

    /// Copy of the current readings buffer, oldest first.
    pub fn readings(&self) -> Vec<Reading> {
        self.inner.readings.lock().iter().cloned().collect()
    }

    pub fn issue_summary(&self) -> IssueSummary {
        self.inner.tracker.lock().summary()
    }

    pub fn update_count(&self) -> u64 {
        self.inner.updates.load(Ordering::Relaxed)
    }

    /// Point-in-time view of every registered device.
    pub async fn snapshots(&self) -> Vec<DeviceSnapshot> {
        let slots: Vec<Arc<AsyncMutex<Device>>> =
            self.inner.devices.read().values().cloned().collect();

        let mut snapshots = Vec::with_capacity(slots.len());
        for slot in slots {
            snapshots.push(slot.lock().await.snapshot());
        }
        snapshots
    }

    /// Clears accumulated readings, issue bookkeeping, and the update
    /// counter. Devices themselves are left untouched.
    pub fn reset(&self) {
        self.inner.readings.lock().clear();
        self.inner.tracker.lock().clear();
        self.inner.updates.store(0, Ordering::Relaxed);
    }

    fn spawn_device_loop(&self, device_id: String) {
        let inner = Arc::clone(&self.inner);
        let entropy = inner.task_entropy();
        let handle = tokio::spawn(run_device_loop(inner, device_id, entropy));
        self.inner.tasks.lock().push(handle);
    }
}

/// One device's update loop: sleep a randomized interval, tick, publish.
async fn run_device_loop(inner: Arc<Inner>, device_id: String, mut entropy: Entropy) {
    let (lo, hi) = inner.config.tick_interval;
    let scale = inner.config.time_multiplier.max(f64::MIN_POSITIVE);

    while inner.running.load(Ordering::SeqCst) {
        let wait = entropy.uniform(lo.as_secs_f64(), hi.as_secs_f64()) / scale;
        tokio::time::sleep(Duration::from_secs_f64(wait)).await;
        if !inner.running.load(Ordering::SeqCst) {
            break;
        }

        let Some(slot) = inner.devices.read().get(&device_id).cloned() else {
            // Device was removed; this loop is done
            break;
        };

        let reading = {
            let mut device = slot.lock().await;
            device.tick(&mut entropy)
        };
        let Some(reading) = reading else {
            continue;
        };

        inner.updates.fetch_add(1, Ordering::Relaxed);
        inner.push_reading(&reading);

        if let Some(sink) = &inner.sink {
            sink.enqueue(reading.clone());
        }

        for subscriber in inner.subscribers.read().iter() {
            subscriber(&reading);
        }
    }
}
