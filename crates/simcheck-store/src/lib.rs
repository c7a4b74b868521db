//! simcheck-store: tabular I/O for the validation engine
//!
//! Everything the engine reads or writes goes through the traits in
//! `storage_traits`, so evaluation logic never touches a file format.
//!
//! ## Key Components
//!
//! - `FsDatasetStore`: reads `results_<execution>_<experiment>.csv` files
//! - `FsAutotestSource`: reads `qualitative.csv` and `quantitative.csv`
//! - `FsReportSink`: writes the JSON report, the statistics summary and the
//!   written-back definition tables
//! - `fakes`: in-memory implementations for tests

mod error;
pub mod fakes;
pub mod fs;
pub mod storage_traits;

pub use error::{StoreError, StoreResult};
pub use fs::{
    discover_result_files, parse_date, read_dataset, FsAutotestSource, FsDatasetStore,
    FsReportSink,
};
pub use storage_traits::{AutotestSource, DatasetStore, ReportSink};
