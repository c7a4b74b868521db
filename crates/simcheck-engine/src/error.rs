//! Evaluation and run-level errors.

use simcheck_core::{ConfigError, TestKind};
use simcheck_store::StoreError;
use thiserror::Error;

/// Errors raised while evaluating a single case.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A year required by a condition is absent from a series.
    #[error("year {year} missing from {series} series")]
    MissingYear { year: i32, series: &'static str },

    /// A year of interest has no expected effect in the definition.
    #[error("experiment {experiment_id} has no expected effect for {year}")]
    MissingExpectedEffect { experiment_id: String, year: i32 },

    #[error("unsupported linkage comparator '{0}'")]
    UnsupportedComparator(char),
}

/// Errors that abort a validation run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{kind} case {experiment_id}: {source}")]
    Eval {
        kind: TestKind,
        experiment_id: String,
        #[source]
        source: EvalError,
    },

    /// No base result file (experiment `0`) for an execution.
    #[error("base dataset for execution {execution_id} not found")]
    BaseDatasetMissing { execution_id: String },

    #[error("{kind} family task failed: {message}")]
    Join { kind: TestKind, message: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;
