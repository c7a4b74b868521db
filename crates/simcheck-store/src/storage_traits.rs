//! Storage trait definitions for simcheck
//!
//! These traits are the engine's only view of tabular I/O:
//! - `DatasetStore`: reads the rows of a resolved result file
//! - `AutotestSource`: yields typed test definitions
//! - `ReportSink`: persists a finished run
//!
//! All traits are async and backend-agnostic. In-memory fakes live in the
//! `fakes` module, the CSV/JSON backend in `fs`.

use async_trait::async_trait;
use simcheck_core::{AutotestSuite, Dataset, DatasetHandle, ValidationReport};

use crate::error::StoreResult;

/// Read access to result datasets.
///
/// Implementations are shared read-only between the two test families.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// Load every row of the dataset behind `handle`.
    async fn load(&self, handle: &DatasetHandle) -> StoreResult<Dataset>;
}

/// Source of autotest definitions.
#[async_trait]
pub trait AutotestSource: Send + Sync {
    /// Load and validate both test families.
    async fn load_suite(&self) -> StoreResult<AutotestSuite>;
}

/// Destination for a finished run.
///
/// Called once per run, after both families completed, by a single writer.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn write(&self, suite: &AutotestSuite, report: &ValidationReport) -> StoreResult<()>;
}
