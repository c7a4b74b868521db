//! simcheck Core Library
//!
//! Domain model, configuration and observability shared by the store, the
//! validation engine and the CLI.

pub mod config;
pub mod domain;
pub mod metrics;
pub mod obs;
pub mod reporting;
pub mod telemetry;

pub use config::{
    ConfigError, EngineConfig, PathsConfig, TestKind, DEFAULT_RELATIVE_ERROR,
    DEFAULT_TREND_PERMISSIBLE_ERROR,
};

pub use domain::{
    is_blank, is_identifier, parse_trend_spec, AutotestSuite, Dataset, DatasetHandle, DatasetRow,
    FormatError, LinkageSpec, QualitativeCase, QualitativeVerdict, QuantitativeCase,
    QuantitativeVerdict, ResultFile, StatisticsSummary, TimeSeries, Trend, TrendCheck,
    TrendCondition, ValidationReport, YearError, BASE_EXPERIMENT_ID,
};

pub use metrics::METRICS;
pub use obs::{
    emit_case_evaluated, emit_dataset_missing, emit_family_finished, emit_family_started,
    emit_run_finished, emit_run_started, emit_statistics, run_span,
};
pub use reporting::{format_check, format_percent, render_report_json, render_statistics_md};
pub use telemetry::{init_tracing, LogFormat};

/// simcheck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
