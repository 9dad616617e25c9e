//! CLI entry point for the Hearth smart-home fleet simulator.

use anyhow::{Context, Result};
use clap::Parser;
use hearth_devices::{build_device, Entropy};
use hearth_fleet::{ControllerConfig, FleetController};
use hearth_sim::config::{default_roster, load_roster, SimSettings};
use hearth_sim::report::SessionReport;
use hearth_storage::{SinkConfig, TelemetrySink};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "hearth-sim")]
#[command(about = "Smart-home IoT fleet simulator with autonomous remediation")]
#[command(version)]
struct Cli {
    /// Seconds to run the simulation
    #[arg(short, long, default_value = "30")]
    duration: f64,

    /// Path of the append-only telemetry log
    #[arg(short, long, default_value = "history.log")]
    log_file: PathBuf,

    /// JSON device roster (built-in demo fleet when omitted)
    #[arg(short, long)]
    roster: Option<PathBuf>,

    /// Simulation clock multiplier (10 = ticks arrive 10x faster)
    #[arg(short, long, default_value = "1.0")]
    time_multiplier: f64,

    /// Pin the entropy seed for a reproducible run
    #[arg(short, long)]
    seed: Option<u64>,

    /// In-memory readings kept before the oldest are evicted
    #[arg(long, default_value = "10000")]
    buffer_capacity: usize,

    /// Sink flush interval in milliseconds
    #[arg(long, default_value = "500")]
    flush_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let settings = SimSettings {
        duration: Duration::from_secs_f64(cli.duration.max(0.0)),
        log_path: cli.log_file,
        flush_interval: Duration::from_millis(cli.flush_ms),
        roster_path: cli.roster,
        controller: ControllerConfig {
            buffer_capacity: cli.buffer_capacity,
            time_multiplier: cli.time_multiplier,
            seed: cli.seed,
            ..ControllerConfig::default()
        },
    };

    let specs = match &settings.roster_path {
        Some(path) => load_roster(path)?,
        None => default_roster(),
    };

    let sink = Arc::new(
        TelemetrySink::start(
            SinkConfig::new(&settings.log_path).with_flush_interval(settings.flush_interval),
        )
        .context("starting telemetry sink")?,
    );

    let controller = FleetController::new(settings.controller.clone(), Some(Arc::clone(&sink)));

    let mut entropy = match settings.controller.seed {
        Some(seed) => Entropy::seeded(seed),
        None => Entropy::from_os(),
    };
    for spec in &specs {
        let device = build_device(spec, &mut entropy)
            .with_context(|| format!("building device {}", spec.id))?;
        info!(
            id = %device.id(),
            kind = %device.kind(),
            location = %device.location(),
            "registered {}",
            device.name()
        );
        controller.add_device(device);
    }

    controller.connect_all().await;

    info!(
        duration_s = settings.duration.as_secs_f64(),
        multiplier = settings.controller.time_multiplier,
        "monitoring fleet"
    );
    controller.start();
    tokio::select! {
        _ = tokio::time::sleep(settings.duration) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, shutting down");
        }
    }
    controller.stop().await;

    // Drain the sink first so the report sees the final written count
    sink.stop(Duration::from_secs(5));

    let readings = controller.readings();
    let report = SessionReport::new(
        hearth_analytics::process(&readings),
        controller.issue_summary(),
        sink.stats(),
    );
    report.print_summary();

    Ok(())
}
