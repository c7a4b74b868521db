//! Result datasets and the yearly series derived from them.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Experiment id of the un-perturbed reference run of an execution.
pub const BASE_EXPERIMENT_ID: &str = "0";

/// Yearly values keyed by calendar year, in ascending year order.
///
/// Each year holds exactly one value. When the source contains the same year
/// more than once, the first value inserted is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    points: BTreeMap<i32, f64>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value unless the year is already present.
    ///
    /// Returns `false` when the year was already taken and the value dropped.
    pub fn insert_first(&mut self, year: i32, value: f64) -> bool {
        match self.points.entry(year) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Value recorded for `year`, if any.
    pub fn value(&self, year: i32) -> Option<f64> {
        self.points.get(&year).copied()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.points.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<(i32, f64)> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = (i32, f64)>>(iter: I) -> Self {
        let mut series = TimeSeries::new();
        for (year, value) in iter {
            series.insert_first(year, value);
        }
        series
    }
}

/// One `(date, value)` row of a result file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub date: NaiveDate,
    pub value: f64,
}

/// The rows of a single result file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    rows: Vec<DatasetRow>,
}

impl Dataset {
    pub fn new(rows: Vec<DatasetRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    /// Sum of the value column over every row.
    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.value).sum()
    }

    /// Truncate dates to calendar years. First row of a year wins.
    pub fn series(&self) -> TimeSeries {
        self.rows
            .iter()
            .map(|r| (r.date.year(), r.value))
            .collect()
    }
}

/// A file found in the results directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultFile {
    pub path: PathBuf,
}

impl ResultFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Bare file name, or an empty string for paths without one.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// A result file resolved for an `(execution_id, experiment_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHandle {
    pub execution_id: String,
    pub experiment_id: String,
    pub location: PathBuf,
}

impl DatasetHandle {
    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn is_base(&self) -> bool {
        self.experiment_id == BASE_EXPERIMENT_ID
    }
}
