//! Session report printed at the end of a run.

use hearth_analytics::{Aggregate, FleetReport};
use hearth_fleet::IssueSummary;
use hearth_storage::SinkStats;

/// Everything worth showing after a simulation run.
#[derive(Debug)]
pub struct SessionReport {
    pub fleet: FleetReport,
    pub issues: IssueSummary,
    pub sink: SinkStats,
}

fn format_aggregate(aggregate: &Aggregate, unit: &str) -> String {
    match aggregate.value {
        Some(v) => format!("{v:.1}{unit} (from {} readings)", aggregate.samples),
        None => "N/A".to_string(),
    }
}

impl SessionReport {
    pub fn new(fleet: FleetReport, issues: IssueSummary, sink: SinkStats) -> Self {
        Self {
            fleet,
            issues,
            sink,
        }
    }

    /// Prints a console summary of the session.
    pub fn print_summary(&self) {
        println!();
        println!("=== Session Report ===");

        println!();
        println!("Metrics:");
        let metrics = &self.fleet.metrics;
        println!(
            "  Average temperature:  {}",
            format_aggregate(&metrics.average_temperature, " C")
        );
        println!(
            "  Lit-bulb energy:      {}",
            format_aggregate(&metrics.total_energy_w, " W")
        );
        println!(
            "  Average battery:      {}",
            format_aggregate(&metrics.average_battery, "%")
        );
        println!("  Active devices:       {}", metrics.active_devices);
        println!(
            "  Average signal:       {}",
            format_aggregate(&metrics.average_signal, "%")
        );
        println!(
            "  Average response:     {}",
            format_aggregate(&metrics.average_response_ms, " ms")
        );
        println!(
            "  Health score:         {}",
            format_aggregate(&metrics.health_score, "/100")
        );

        println!();
        println!("Issues:");
        println!("  Detected: {}", self.issues.total_detected());
        println!("  Resolved: {}", self.issues.total_resolved());
        println!("  Active:   {}", self.issues.active);
        if !self.fleet.issue_breakdown.is_empty() {
            println!("  Breakdown:");
            let mut entries: Vec<_> = self.fleet.issue_breakdown.iter().collect();
            entries.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            for (issue, count) in entries {
                println!("    {issue}: {count}");
            }
        }

        println!();
        println!("Data:");
        println!("  Readings: {}", self.fleet.total_readings);
        println!("  Critical: {}", self.fleet.critical_count);
        println!("  Written:  {}", self.sink.records_written);
        println!("  Rate:     {:.1}/s", self.sink.rate_per_sec);
        println!("  Duration: {:.1}s", self.sink.elapsed.as_secs_f64());
    }
}
