//! Telemetry sink implementation.
//!
//! Design points:
//! - Dedicated OS thread so disk I/O never runs on the simulation runtime
//! - Non-blocking `enqueue`; records are silently dropped once stopped
//! - Periodic flush bounds both I/O cost and the data-loss window
//! - A sentinel message drains the queue before the worker exits, so every
//!   record enqueued before `stop` reaches the log

use crate::error::Result;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use hearth_core::Reading;
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Sink configuration.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Path of the append-only log file.
    pub path: PathBuf,
    /// How often buffered records are flushed to disk.
    pub flush_interval: Duration,
}

impl SinkConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            flush_interval: Duration::from_millis(500),
        }
    }

    /// Create with a custom flush interval.
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }
}

/// Point-in-time view of sink throughput.
#[derive(Debug, Clone)]
pub struct SinkStats {
    pub records_written: u64,
    pub queue_depth: u64,
    pub elapsed: Duration,
    pub rate_per_sec: f64,
}

enum SinkMessage {
    Record(Reading),
    Shutdown,
}

/// Durable, asynchronous telemetry writer.
pub struct TelemetrySink {
    tx: Sender<SinkMessage>,
    running: AtomicBool,
    written: Arc<AtomicU64>,
    depth: Arc<AtomicU64>,
    worker: Mutex<Option<JoinHandle<()>>>,
    started: Instant,
}

impl TelemetrySink {
    /// Opens the log for appending and starts the worker thread.
    pub fn start(config: SinkConfig) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)?;

        let written = Arc::new(AtomicU64::new(0));
        let depth = Arc::new(AtomicU64::new(0));
        let (tx, rx) = unbounded();

        let worker_written = Arc::clone(&written);
        let worker_depth = Arc::clone(&depth);
        let flush_interval = config.flush_interval;
        let worker = std::thread::Builder::new()
            .name("hearth-sink".into())
            .spawn(move || {
                run_worker(rx, file, flush_interval, worker_written, worker_depth);
            })?;

        info!(path = %config.path.display(), "telemetry sink started");

        Ok(Self {
            tx,
            running: AtomicBool::new(true),
            written,
            depth,
            worker: Mutex::new(Some(worker)),
            started: Instant::now(),
        })
    }

    /// Hands a reading to the worker. Never blocks; silently drops the
    /// record when the sink is not running.
    pub fn enqueue(&self, reading: Reading) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }

        self.depth.fetch_add(1, Ordering::Relaxed);
        if self.tx.send(SinkMessage::Record(reading)).is_err() {
            self.depth.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Number of records the worker has written so far. Monotonically
    /// non-decreasing; after a clean stop it equals the number of records
    /// enqueued before the shutdown sentinel.
    pub fn records_written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// Records enqueued but not yet dequeued by the worker.
    pub fn queue_depth(&self) -> u64 {
        self.depth.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> SinkStats {
        let elapsed = self.started.elapsed();
        let records_written = self.records_written();
        let rate_per_sec = if elapsed.as_secs_f64() > 0.0 {
            records_written as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        SinkStats {
            records_written,
            queue_depth: self.queue_depth(),
            elapsed,
            rate_per_sec,
        }
    }

    /// Stops the sink: sends the shutdown sentinel and waits for the worker
    /// to drain the queue. Idempotent. A worker that fails to exit within
    /// the timeout is reported, not treated as fatal.
    pub fn stop(&self, timeout: Duration) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        let _ = self.tx.send(SinkMessage::Shutdown);

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            let deadline = Instant::now() + timeout;
            while !handle.is_finished() && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(10));
            }

            if handle.is_finished() {
                let _ = handle.join();
                info!(
                    records = self.records_written(),
                    "telemetry sink stopped"
                );
            } else {
                warn!(?timeout, "telemetry sink worker did not exit in time");
            }
        }
    }
}

fn run_worker(
    rx: Receiver<SinkMessage>,
    file: std::fs::File,
    flush_interval: Duration,
    written: Arc<AtomicU64>,
    depth: Arc<AtomicU64>,
) {
    let mut out = BufWriter::new(file);
    let mut last_flush = Instant::now();

    loop {
        match rx.recv_timeout(flush_interval) {
            Ok(SinkMessage::Record(reading)) => {
                depth.fetch_sub(1, Ordering::Relaxed);

                // One bad record must not stop the consumer loop
                match serde_json::to_string(&reading) {
                    Ok(line) => {
                        if let Err(e) = writeln!(out, "{line}") {
                            warn!("telemetry write failed: {e}");
                        } else {
                            written.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    Err(e) => warn!("telemetry record serialization failed: {e}"),
                }

                if last_flush.elapsed() >= flush_interval {
                    flush(&mut out);
                    last_flush = Instant::now();
                }
            }
            Ok(SinkMessage::Shutdown) => break,
            Err(RecvTimeoutError::Timeout) => {
                if last_flush.elapsed() >= flush_interval {
                    flush(&mut out);
                    last_flush = Instant::now();
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    flush(&mut out);
    debug!("telemetry sink worker exiting");
}

fn flush(out: &mut BufWriter<std::fs::File>) {
    if let Err(e) = out.flush() {
        warn!("telemetry flush failed: {e}");
    }
}
