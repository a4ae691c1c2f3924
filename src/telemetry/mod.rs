//! Telemetry for the adapter.
//!
//! Provides call tracing, metrics collection, and export of metrics
//! snapshots. With the `telemetry` feature off, the same types exist as
//! no-ops so call sites need no conditional compilation.

#[cfg(feature = "telemetry")]
pub mod metrics;

#[cfg(feature = "telemetry")]
pub mod trace;

#[cfg(feature = "telemetry")]
pub mod export;

#[cfg(feature = "telemetry")]
pub use metrics::{Metrics, MetricsSnapshot};

#[cfg(feature = "telemetry")]
pub use trace::{CallGuard, CallId, CallLog, CallOutcome, CallRecord};

#[cfg(feature = "telemetry")]
pub use export::{ConsoleExporter, JsonExporter, MetricsExporter};

// Stub implementations when telemetry is disabled
#[cfg(not(feature = "telemetry"))]
pub mod metrics {
    #[derive(Debug, Clone, Default)]
    pub struct Metrics;

    impl Metrics {
        pub fn new() -> Self {
            Self
        }
        pub fn record_plan_created(&self) {}
        pub fn record_plan_destroyed(&self) {}
        pub fn record_plan_configured(&self) {}
        pub fn record_execution(&self, _: u64) {}
        pub fn record_failure(&self) {}
        pub fn snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot::default()
        }
    }

    #[derive(Debug, Clone, Default)]
    pub struct MetricsSnapshot {
        pub plans_created: u64,
        pub plans_destroyed: u64,
        pub executions: u64,
        pub failures: u64,
    }

    impl MetricsSnapshot {
        pub fn live_plans(&self) -> u64 {
            0
        }
    }
}

#[cfg(not(feature = "telemetry"))]
pub mod trace {
    use std::marker::PhantomData;

    use crate::library::RawFftHandle;

    #[derive(Debug, Default)]
    pub struct CallLog;

    impl CallLog {
        pub fn new(_: bool) -> Self {
            Self
        }
        pub fn is_enabled(&self) -> bool {
            false
        }
        pub fn enter(&self, _: &'static str, _: Option<RawFftHandle>) -> CallGuard<'_> {
            CallGuard(PhantomData)
        }
    }

    #[derive(Debug)]
    pub struct CallGuard<'a>(PhantomData<&'a CallLog>);

    impl<'a> CallGuard<'a> {
        pub fn field(&mut self, _: &'static str, _: impl std::fmt::Display) {}
        pub fn set_handle(&mut self, _: RawFftHandle) {}
        pub fn finish<T, E>(&mut self, _: &std::result::Result<T, E>) {}
    }
}

#[cfg(not(feature = "telemetry"))]
pub use metrics::{Metrics, MetricsSnapshot};

#[cfg(not(feature = "telemetry"))]
pub use trace::{CallGuard, CallLog};
