//! Counters and latency distribution for adapter calls.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use hdrhistogram::Histogram;
use parking_lot::RwLock;

/// Adapter metrics collector
#[derive(Debug)]
pub struct Metrics {
    // Plan lifecycle
    plans_created: AtomicU64,
    plans_destroyed: AtomicU64,
    plans_configured: AtomicU64,

    executions: AtomicU64,
    failures: AtomicU64,

    // Time spent inside exec calls, i.e. enqueue cost, not transform cost
    enqueue_histogram: RwLock<Histogram<u64>>,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        // 3 significant figures, max of 1 hour in nanoseconds
        let histogram = Histogram::new_with_max(3_600_000_000_000, 3)
            .expect("constant histogram bounds are valid");

        Self {
            plans_created: AtomicU64::new(0),
            plans_destroyed: AtomicU64::new(0),
            plans_configured: AtomicU64::new(0),
            executions: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            enqueue_histogram: RwLock::new(histogram),
            start_time: Instant::now(),
        }
    }

    pub fn record_plan_created(&self) {
        self.plans_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_plan_destroyed(&self) {
        self.plans_destroyed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_plan_configured(&self) {
        self.plans_configured.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an enqueued transform and how long the enqueue took
    pub fn record_execution(&self, duration_ns: u64) {
        self.executions.fetch_add(1, Ordering::Relaxed);

        if let Some(mut hist) = self.enqueue_histogram.try_write() {
            let _ = hist.record(duration_ns);
        }
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let histogram = self.enqueue_histogram.read();

        MetricsSnapshot {
            timestamp: Instant::now(),
            uptime: self.start_time.elapsed(),
            plans_created: self.plans_created.load(Ordering::Relaxed),
            plans_destroyed: self.plans_destroyed.load(Ordering::Relaxed),
            plans_configured: self.plans_configured.load(Ordering::Relaxed),
            executions: self.executions.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            avg_enqueue_ns: if histogram.len() > 0 {
                histogram.mean() as u64
            } else {
                0
            },
            p50_enqueue_ns: histogram.value_at_quantile(0.50),
            p99_enqueue_ns: histogram.value_at_quantile(0.99),
            max_enqueue_ns: histogram.max(),
        }
    }

    pub fn reset(&self) {
        self.plans_created.store(0, Ordering::Relaxed);
        self.plans_destroyed.store(0, Ordering::Relaxed);
        self.plans_configured.store(0, Ordering::Relaxed);
        self.executions.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);

        if let Some(mut hist) = self.enqueue_histogram.try_write() {
            hist.reset();
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub timestamp: Instant,
    pub uptime: Duration,
    pub plans_created: u64,
    pub plans_destroyed: u64,
    pub plans_configured: u64,
    pub executions: u64,
    pub failures: u64,
    pub avg_enqueue_ns: u64,
    pub p50_enqueue_ns: u64,
    pub p99_enqueue_ns: u64,
    pub max_enqueue_ns: u64,
}

impl MetricsSnapshot {
    /// Plans created through the adapter and not yet destroyed.
    pub fn live_plans(&self) -> u64 {
        self.plans_created.saturating_sub(self.plans_destroyed)
    }

    pub fn executions_per_second(&self) -> f64 {
        let seconds = self.uptime.as_secs_f64();
        if seconds == 0.0 {
            return 0.0;
        }
        self.executions as f64 / seconds
    }
}
