//! Per-call tracing of adapter entry points.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::library::RawFftHandle;

/// Unique identifier for a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(u64);

impl CallId {
    fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// The guard was dropped without a result, e.g. on unwind.
    Abandoned,
    Ok,
    Failed(String),
}

impl CallOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, CallOutcome::Ok)
    }
}

/// One completed adapter call.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub id: CallId,
    pub operation: &'static str,
    pub handle: Option<RawFftHandle>,
    pub fields: Vec<(&'static str, String)>,
    pub start: Instant,
    pub duration: Duration,
    pub outcome: CallOutcome,
}

impl CallRecord {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for CallRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.operation)?;
        if let Some(handle) = self.handle {
            write!(f, "[{handle}]")?;
        }
        for (key, value) in &self.fields {
            write!(f, " {key}={value}")?;
        }
        match &self.outcome {
            CallOutcome::Ok => write!(f, " ok in {:?}", self.duration),
            CallOutcome::Failed(err) => write!(f, " failed in {:?}: {err}", self.duration),
            CallOutcome::Abandoned => write!(f, " abandoned"),
        }
    }
}

/// Bounded log of recent adapter calls.
pub struct CallLog {
    records: RwLock<VecDeque<CallRecord>>,
    capacity: usize,
    enabled: bool,
}

impl CallLog {
    pub const DEFAULT_CAPACITY: usize = 4096;

    pub fn new(enabled: bool) -> Self {
        Self::with_capacity(enabled, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(enabled: bool, capacity: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start tracing a call. The record is stored when the guard drops.
    pub fn enter(&self, operation: &'static str, handle: Option<RawFftHandle>) -> CallGuard<'_> {
        let record = self.enabled.then(|| CallRecord {
            id: CallId::new(),
            operation,
            handle,
            fields: Vec::new(),
            start: Instant::now(),
            duration: Duration::ZERO,
            outcome: CallOutcome::Abandoned,
        });

        CallGuard { record, log: self }
    }

    fn push(&self, record: CallRecord) {
        let mut records = self.records.write();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Oldest first.
    pub fn records(&self) -> Vec<CallRecord> {
        self.records.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn clear(&self) {
        self.records.write().clear();
    }
}

impl Default for CallLog {
    fn default() -> Self {
        Self::new(true)
    }
}

impl fmt::Debug for CallLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallLog")
            .field("enabled", &self.enabled)
            .field("len", &self.len())
            .finish()
    }
}

/// Guard that stores the call record when dropped
#[derive(Debug)]
pub struct CallGuard<'a> {
    record: Option<CallRecord>,
    log: &'a CallLog,
}

impl<'a> CallGuard<'a> {
    pub fn id(&self) -> Option<CallId> {
        self.record.as_ref().map(|r| r.id)
    }

    pub fn field(&mut self, key: &'static str, value: impl fmt::Display) {
        if let Some(record) = &mut self.record {
            record.fields.push((key, value.to_string()));
        }
    }

    pub fn set_handle(&mut self, handle: RawFftHandle) {
        if let Some(record) = &mut self.record {
            record.handle = Some(handle);
        }
    }

    /// Record the outcome of the call.
    pub fn finish<T, E: fmt::Display>(&mut self, result: &std::result::Result<T, E>) {
        if let Some(record) = &mut self.record {
            record.outcome = match result {
                Ok(_) => CallOutcome::Ok,
                Err(err) => CallOutcome::Failed(err.to_string()),
            };
        }
    }
}

impl<'a> Drop for CallGuard<'a> {
    fn drop(&mut self) {
        if let Some(mut record) = self.record.take() {
            record.duration = record.start.elapsed();
            log::trace!("{record}");
            self.log.push(record);
        }
    }
}
