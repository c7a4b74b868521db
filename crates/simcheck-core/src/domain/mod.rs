//! Domain models for simcheck.
//!
//! Canonical definitions for the core entities:
//! - `Dataset` / `TimeSeries`: result rows and their yearly view
//! - `QualitativeCase` / `QuantitativeCase`: typed autotest definitions
//! - `QualitativeVerdict` / `QuantitativeVerdict`: per-case outcomes
//! - `ValidationReport`: everything one run produced

pub mod case;
pub mod error;
pub mod series;
pub mod trend_spec;
pub mod verdict;

pub use case::{
    is_blank, is_identifier, AutotestSuite, LinkageSpec, QualitativeCase, QuantitativeCase,
};
pub use error::{FormatError, Result};
pub use series::{Dataset, DatasetHandle, DatasetRow, ResultFile, TimeSeries, BASE_EXPERIMENT_ID};
pub use trend_spec::{parse_trend_spec, Trend, TrendCondition};
pub use verdict::{
    QualitativeVerdict, QuantitativeVerdict, StatisticsSummary, TrendCheck, ValidationReport,
    YearError,
};
