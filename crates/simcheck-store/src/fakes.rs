//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryDatasetStore`, `MemoryAutotestSource` and
//! `MemoryReportSink` that satisfy the trait contracts without touching disk.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use simcheck_core::{AutotestSuite, Dataset, DatasetHandle, ResultFile, ValidationReport};

use crate::error::{StoreError, StoreResult};
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryDatasetStore
// ---------------------------------------------------------------------------

/// Datasets keyed by `(execution_id, experiment_id)`.
#[derive(Debug, Default)]
pub struct MemoryDatasetStore {
    datasets: Mutex<HashMap<(String, String), Dataset>>,
    loads: AtomicUsize,
}

impl MemoryDatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, execution_id: &str, experiment_id: &str, dataset: Dataset) {
        let mut datasets = self.datasets.lock().unwrap_or_else(|e| e.into_inner());
        datasets.insert((execution_id.to_string(), experiment_id.to_string()), dataset);
    }

    /// Synthetic result files, one per stored dataset, sorted by name.
    pub fn universe(&self) -> Vec<ResultFile> {
        let datasets = self.datasets.lock().unwrap_or_else(|e| e.into_inner());
        let mut files: Vec<ResultFile> = datasets
            .keys()
            .map(|(exec, exp)| ResultFile::new(format!("experiments/results_{exec}_{exp}.csv")))
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// Number of successful `load` calls so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatasetStore for MemoryDatasetStore {
    async fn load(&self, handle: &DatasetHandle) -> StoreResult<Dataset> {
        let datasets = self.datasets.lock().unwrap_or_else(|e| e.into_inner());
        let key = (handle.execution_id.clone(), handle.experiment_id.clone());
        let dataset = datasets
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::DatasetNotFound(handle.location.clone()))?;
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(dataset)
    }
}

// ---------------------------------------------------------------------------
// MemoryAutotestSource
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryAutotestSource {
    suite: AutotestSuite,
}

impl MemoryAutotestSource {
    pub fn new(suite: AutotestSuite) -> Self {
        Self { suite }
    }
}

#[async_trait]
impl AutotestSource for MemoryAutotestSource {
    async fn load_suite(&self) -> StoreResult<AutotestSuite> {
        Ok(self.suite.clone())
    }
}

// ---------------------------------------------------------------------------
// MemoryReportSink
// ---------------------------------------------------------------------------

/// Collects every written report in order.
#[derive(Debug, Default)]
pub struct MemoryReportSink {
    reports: Mutex<Vec<ValidationReport>>,
}

impl MemoryReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<ValidationReport> {
        self.reports
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ReportSink for MemoryReportSink {
    async fn write(&self, _suite: &AutotestSuite, report: &ValidationReport) -> StoreResult<()> {
        let mut reports = self.reports.lock().unwrap_or_else(|e| e.into_inner());
        reports.push(report.clone());
        Ok(())
    }
}
