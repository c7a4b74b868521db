//! simcheck engine - validation of simulation experiment results
//!
//! Provides:
//! - Result file resolution by execution and experiment id
//! - Trend, linkage and relative-error evaluators
//! - A two-family validation pipeline and its run statistics

pub mod error;
pub mod linkage;
pub mod locator;
pub mod pipeline;
pub mod quantity;
pub mod statistics;
pub mod suite;
pub mod trend;

// Re-export key types
pub use error::{EngineError, EvalError, Result};
pub use linkage::Comparator;
pub use locator::{parse_result_file_name, ResultSetLocator};
pub use pipeline::ValidationPipeline;
pub use quantity::{relative_error, QuantityOutcome};
pub use statistics::summarize;
pub use suite::suite_digest;
pub use trend::{evaluate_flat, TrendOutcome};
