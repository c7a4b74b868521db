//! Error types for simcheck-store

use simcheck_core::FormatError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by dataset, definition and report storage.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The results directory does not exist
    #[error("results directory {0:?} not found")]
    ResultsDirMissing(PathBuf),

    /// The results directory holds no result files
    #[error("no result files found in {0:?}")]
    NoResultFiles(PathBuf),

    /// A resolved dataset could not be read back
    #[error("dataset not found: {0:?}")]
    DatasetNotFound(PathBuf),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A required column is absent from a file's header
    #[error("{path:?} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },

    /// A cell could not be parsed
    #[error("{path:?} line {line}: invalid {column} value '{value}'")]
    InvalidValue {
        path: PathBuf,
        line: usize,
        column: String,
        value: String,
    },

    /// A definition row could not be turned into a typed case
    #[error("invalid test definition in {path:?}: {source}")]
    Definition {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    /// Verdicts do not line up with the definitions they are written back to
    #[error("{family} report has {verdicts} verdicts for {cases} cases")]
    ReportMismatch {
        family: &'static str,
        cases: usize,
        verdicts: usize,
    },

    #[error("report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        StoreError::Csv {
            path: path.into(),
            source,
        }
    }
}

/// Result type for storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
