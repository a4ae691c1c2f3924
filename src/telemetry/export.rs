//! Metrics export functionality for various formats.

use super::metrics::MetricsSnapshot;
use crate::error::{Error, Result};

/// Trait for exporting metrics to different formats
pub trait MetricsExporter: Send + Sync {
    fn export(&self, snapshot: &MetricsSnapshot) -> Result<()>;
}

/// Export metrics to a JSON file
#[derive(Debug)]
pub struct JsonExporter {
    output_path: std::path::PathBuf,
}

impl JsonExporter {
    pub fn new(output_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    /// Render a snapshot without writing it anywhere.
    pub fn to_json(snapshot: &MetricsSnapshot) -> Result<String> {
        serde_json::to_string_pretty(&SerializableSnapshot::from(snapshot))
            .map_err(|e| Error::telemetry(format!("JSON serialization failed: {}", e)))
    }
}

impl MetricsExporter for JsonExporter {
    fn export(&self, snapshot: &MetricsSnapshot) -> Result<()> {
        let json = Self::to_json(snapshot)?;
        std::fs::write(&self.output_path, json)?;
        Ok(())
    }
}

#[derive(Debug, Clone, serde::Serialize)]
struct SerializableSnapshot {
    uptime_secs: f64,
    plans_created: u64,
    plans_destroyed: u64,
    plans_configured: u64,
    live_plans: u64,
    executions: u64,
    failures: u64,
    avg_enqueue_us: f64,
    p50_enqueue_us: f64,
    p99_enqueue_us: f64,
    max_enqueue_us: f64,
    executions_per_second: f64,
}

impl From<&MetricsSnapshot> for SerializableSnapshot {
    fn from(snapshot: &MetricsSnapshot) -> Self {
        Self {
            uptime_secs: snapshot.uptime.as_secs_f64(),
            plans_created: snapshot.plans_created,
            plans_destroyed: snapshot.plans_destroyed,
            plans_configured: snapshot.plans_configured,
            live_plans: snapshot.live_plans(),
            executions: snapshot.executions,
            failures: snapshot.failures,
            avg_enqueue_us: snapshot.avg_enqueue_ns as f64 / 1_000.0,
            p50_enqueue_us: snapshot.p50_enqueue_ns as f64 / 1_000.0,
            p99_enqueue_us: snapshot.p99_enqueue_ns as f64 / 1_000.0,
            max_enqueue_us: snapshot.max_enqueue_ns as f64 / 1_000.0,
            executions_per_second: snapshot.executions_per_second(),
        }
    }
}

/// Export metrics to stdout
#[derive(Debug)]
pub struct ConsoleExporter {
    verbose: bool,
}

impl ConsoleExporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl MetricsExporter for ConsoleExporter {
    fn export(&self, snapshot: &MetricsSnapshot) -> Result<()> {
        println!("=== hipFFT Adapter Metrics ===");
        println!("Uptime: {:.2}s", snapshot.uptime.as_secs_f64());
        println!("Plans created: {}", snapshot.plans_created);
        println!("Plans destroyed: {}", snapshot.plans_destroyed);
        println!("Live plans: {}", snapshot.live_plans());
        println!("Executions: {}", snapshot.executions);
        println!("Failures: {}", snapshot.failures);

        if self.verbose {
            println!("\nEnqueue latency:");
            println!("  Average: {:.2}μs", snapshot.avg_enqueue_ns as f64 / 1_000.0);
            println!("  P50: {:.2}μs", snapshot.p50_enqueue_ns as f64 / 1_000.0);
            println!("  P99: {:.2}μs", snapshot.p99_enqueue_ns as f64 / 1_000.0);
            println!("  Max: {:.2}μs", snapshot.max_enqueue_ns as f64 / 1_000.0);
        }

        println!("=============================");

        Ok(())
    }
}

impl Default for ConsoleExporter {
    fn default() -> Self {
        Self::new(false)
    }
}
