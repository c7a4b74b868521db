//! Process-wide counters for validation runs.
//!
//! Reset when a run starts and incremented at the call site;
//! [`Metrics::flush`] emits the current values as one `tracing::info!` event
//! at the end of the run.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    cases_evaluated: AtomicU64,
    datasets_loaded: AtomicU64,
    datasets_missing: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            cases_evaluated: AtomicU64::new(0),
            datasets_loaded: AtomicU64::new(0),
            datasets_missing: AtomicU64::new(0),
        }
    }

    pub fn inc_cases_evaluated(&self) {
        self.cases_evaluated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_datasets_loaded(&self) {
        self.datasets_loaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_datasets_missing(&self) {
        self.datasets_missing.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cases_evaluated(&self) -> u64 {
        self.cases_evaluated.load(Ordering::Relaxed)
    }

    pub fn datasets_loaded(&self) -> u64 {
        self.datasets_loaded.load(Ordering::Relaxed)
    }

    pub fn datasets_missing(&self) -> u64 {
        self.datasets_missing.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.cases_evaluated.store(0, Ordering::Relaxed);
        self.datasets_loaded.store(0, Ordering::Relaxed);
        self.datasets_missing.store(0, Ordering::Relaxed);
    }

    /// Emit all counters as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            cases_evaluated = self.cases_evaluated(),
            datasets_loaded = self.datasets_loaded(),
            datasets_missing = self.datasets_missing(),
        );
    }
}
