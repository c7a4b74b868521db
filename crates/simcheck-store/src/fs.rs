//! Filesystem backend: CSV result files and definitions, JSON/CSV/Markdown reports.
//!
//! Layout:
//! - `<experiments_dir>/results_<execution>_<experiment>.csv` with `dt` and `sum` columns
//! - `<resources_dir>/qualitative.csv` with `test_id`, `linkage`, `trend`
//! - `<resources_dir>/quantitative.csv` with `test_id` and `effect_<year>` columns
//! - `<output_dir>/results.json`, `summary.md`, `qualitative_results.csv`,
//!   `quantitative_results.csv`
//!
//! Definition columns the engine does not interpret are carried through to
//! the written-back rows unchanged.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use simcheck_core::{
    format_check, render_report_json, render_statistics_md, AutotestSuite, Dataset,
    DatasetHandle, DatasetRow, FormatError, QualitativeCase, QuantitativeCase, ResultFile,
    ValidationReport,
};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::storage_traits::{AutotestSource, DatasetStore, ReportSink};

pub const RESULT_FILE_PREFIX: &str = "results_";
pub const RESULT_FILE_EXTENSION: &str = "csv";
pub const DATE_COLUMN: &str = "dt";
pub const VALUE_COLUMN: &str = "sum";

pub const QUALITATIVE_FILE: &str = "qualitative.csv";
pub const QUANTITATIVE_FILE: &str = "quantitative.csv";
pub const TEST_ID_COLUMN: &str = "test_id";
pub const LINKAGE_COLUMN: &str = "linkage";
pub const TREND_COLUMN: &str = "trend";
pub const EFFECT_COLUMN_PREFIX: &str = "effect_";

pub const REPORT_JSON_FILE: &str = "results.json";
pub const SUMMARY_FILE: &str = "summary.md";
pub const QUALITATIVE_RESULTS_FILE: &str = "qualitative_results.csv";
pub const QUANTITATIVE_RESULTS_FILE: &str = "quantitative_results.csv";

const ML_EFFECT_COLUMN_PREFIX: &str = "ml_effect_";
const ERROR_COLUMN_PREFIX: &str = "error_";

/// Columns produced by a previous run; dropped when definitions are re-read.
fn is_result_column(name: &str) -> bool {
    matches!(name, "trend_result" | "linkage_result" | "result" | "mean_error")
        || name.starts_with(ML_EFFECT_COLUMN_PREFIX)
        || name.starts_with(ERROR_COLUMN_PREFIX)
}

// ---------------------------------------------------------------------------
// Result files
// ---------------------------------------------------------------------------

/// List result files in `dir`, sorted by file name.
///
/// Fails when the directory is missing or holds no `results_*.csv` file.
pub fn discover_result_files(dir: &Path) -> StoreResult<Vec<ResultFile>> {
    if !dir.is_dir() {
        return Err(StoreError::ResultsDirMissing(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| StoreError::io(dir, e))? {
        let entry = entry.map_err(|e| StoreError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let file = ResultFile::new(path);
        let has_extension = file
            .path
            .extension()
            .is_some_and(|ext| ext == RESULT_FILE_EXTENSION);
        if file.file_name().starts_with(RESULT_FILE_PREFIX) && has_extension {
            files.push(file);
        }
    }

    if files.is_empty() {
        return Err(StoreError::NoResultFiles(dir.to_path_buf()));
    }
    files.sort_by(|a, b| a.file_name().cmp(b.file_name()));
    debug!(dir = ?dir, count = files.len(), "discovered result files");
    Ok(files)
}

/// Parse a date cell; a bare year maps to January 1st.
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    if let Ok(date) = NaiveDate::parse_from_str(cell, "%Y-%m-%d") {
        return Some(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(cell, format) {
            return Some(datetime.date());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(cell, "%d.%m.%Y") {
        return Some(date);
    }
    cell.parse::<i32>()
        .ok()
        .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
}

fn open_csv(path: &Path) -> StoreResult<(csv::Reader<fs::File>, StringRecord)> {
    let file = fs::File::open(path).map_err(|e| StoreError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);
    let headers = reader
        .headers()
        .map_err(|e| StoreError::csv(path, e))?
        .clone();
    Ok((reader, headers))
}

fn column_index(path: &Path, headers: &StringRecord, column: &str) -> StoreResult<usize> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| StoreError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        })
}

/// Read the `dt` / `sum` rows of a result file.
pub fn read_dataset(path: &Path) -> StoreResult<Dataset> {
    let (mut reader, headers) = open_csv(path)?;
    let date_idx = column_index(path, &headers, DATE_COLUMN)?;
    let value_idx = column_index(path, &headers, VALUE_COLUMN)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| StoreError::csv(path, e))?;
        let line = i + 2;
        let invalid = |column: &str, value: &str| StoreError::InvalidValue {
            path: path.to_path_buf(),
            line,
            column: column.to_string(),
            value: value.to_string(),
        };

        let date_cell = record.get(date_idx).unwrap_or_default();
        let value_cell = record.get(value_idx).unwrap_or_default();
        let date = parse_date(date_cell).ok_or_else(|| invalid(DATE_COLUMN, date_cell))?;
        let value = value_cell
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(VALUE_COLUMN, value_cell))?;
        rows.push(DatasetRow { date, value });
    }
    Ok(Dataset::new(rows))
}

/// Reads datasets straight from the resolved result file.
#[derive(Debug, Default, Clone)]
pub struct FsDatasetStore;

impl FsDatasetStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DatasetStore for FsDatasetStore {
    async fn load(&self, handle: &DatasetHandle) -> StoreResult<Dataset> {
        if !handle.location().is_file() {
            return Err(StoreError::DatasetNotFound(handle.location.clone()));
        }
        let dataset = read_dataset(handle.location())?;
        debug!(
            execution_id = %handle.execution_id,
            experiment_id = %handle.experiment_id,
            rows = dataset.rows().len(),
            "loaded dataset"
        );
        Ok(dataset)
    }
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Reads `qualitative.csv` and `quantitative.csv` from a resources directory.
#[derive(Debug, Clone)]
pub struct FsAutotestSource {
    resources_dir: PathBuf,
}

impl FsAutotestSource {
    pub fn new(resources_dir: impl Into<PathBuf>) -> Self {
        Self {
            resources_dir: resources_dir.into(),
        }
    }

    pub fn read_qualitative(&self) -> StoreResult<Vec<QualitativeCase>> {
        let path = self.resources_dir.join(QUALITATIVE_FILE);
        let (mut reader, headers) = open_csv(&path)?;
        let id_idx = column_index(&path, &headers, TEST_ID_COLUMN)?;
        let trend_idx = column_index(&path, &headers, TREND_COLUMN)?;
        let linkage_idx = headers.iter().position(|h| h == LINKAGE_COLUMN);

        let mut cases = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| StoreError::csv(&path, e))?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            let cell = |idx: usize| record.get(idx).unwrap_or_default();
            let linkage = linkage_idx.map(cell).unwrap_or_default();

            let case = QualitativeCase::parse(cell(id_idx), linkage, cell(trend_idx))
                .map_err(|e| definition_error(&path, i + 2, e))?
                .with_extra_columns(extra_columns(&headers, &record, |name| {
                    name == TEST_ID_COLUMN || name == TREND_COLUMN || name == LINKAGE_COLUMN
                }));
            cases.push(case);
        }
        Ok(cases)
    }

    pub fn read_quantitative(&self) -> StoreResult<Vec<QuantitativeCase>> {
        let path = self.resources_dir.join(QUANTITATIVE_FILE);
        let (mut reader, headers) = open_csv(&path)?;
        let id_idx = column_index(&path, &headers, TEST_ID_COLUMN)?;
        let effect_columns: Vec<(usize, i32)> = headers
            .iter()
            .enumerate()
            .filter_map(|(idx, name)| effect_year(name).map(|year| (idx, year)))
            .collect();

        let mut cases = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| StoreError::csv(&path, e))?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            let effects = effect_columns
                .iter()
                .map(|&(idx, year)| (year, record.get(idx).unwrap_or_default()));

            let case = QuantitativeCase::parse(record.get(id_idx).unwrap_or_default(), effects)
                .map_err(|e| definition_error(&path, i + 2, e))?
                .with_extra_columns(extra_columns(&headers, &record, |name| {
                    name == TEST_ID_COLUMN || effect_year(name).is_some()
                }));
            cases.push(case);
        }
        Ok(cases)
    }
}

#[async_trait]
impl AutotestSource for FsAutotestSource {
    async fn load_suite(&self) -> StoreResult<AutotestSuite> {
        let suite = AutotestSuite::new(self.read_qualitative()?, self.read_quantitative()?);
        info!(
            resources_dir = ?self.resources_dir,
            qualitative = suite.qualitative.len(),
            quantitative = suite.quantitative.len(),
            "loaded autotest definitions"
        );
        Ok(suite)
    }
}

fn effect_year(column: &str) -> Option<i32> {
    column.strip_prefix(EFFECT_COLUMN_PREFIX)?.parse().ok()
}

fn extra_columns(
    headers: &StringRecord,
    record: &StringRecord,
    known: impl Fn(&str) -> bool,
) -> Vec<(String, String)> {
    headers
        .iter()
        .enumerate()
        .filter(|&(_, name)| !name.is_empty() && !known(name) && !is_result_column(name))
        .map(|(idx, name)| (name.to_string(), record.get(idx).unwrap_or_default().to_string()))
        .collect()
}

fn definition_error(path: &Path, line: usize, source: FormatError) -> StoreError {
    StoreError::Definition {
        path: path.to_path_buf(),
        source: FormatError::InvalidRow {
            row: line,
            message: source.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Writes the report files into an output directory.
///
/// Each file is written to a temporary file first and renamed into place.
#[derive(Debug, Clone)]
pub struct FsReportSink {
    output_dir: PathBuf,
}

impl FsReportSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write_atomic(&self, name: &str, content: &[u8]) -> StoreResult<PathBuf> {
        let path = self.output_dir.join(name);
        let mut tmp =
            NamedTempFile::new_in(&self.output_dir).map_err(|e| StoreError::io(&path, e))?;
        tmp.write_all(content).map_err(|e| StoreError::io(&path, e))?;
        tmp.persist(&path)
            .map_err(|e| StoreError::io(&path, e.error))?;
        Ok(path)
    }
}

#[async_trait]
impl ReportSink for FsReportSink {
    async fn write(&self, suite: &AutotestSuite, report: &ValidationReport) -> StoreResult<()> {
        fs::create_dir_all(&self.output_dir).map_err(|e| StoreError::io(&self.output_dir, e))?;

        // Render every output before replacing any of them.
        let qualitative_path = self.output_dir.join(QUALITATIVE_RESULTS_FILE);
        let quantitative_path = self.output_dir.join(QUANTITATIVE_RESULTS_FILE);
        let outputs: [(&str, Vec<u8>); 4] = [
            (REPORT_JSON_FILE, render_report_json(report)?.into_bytes()),
            (SUMMARY_FILE, render_statistics_md(report).into_bytes()),
            (
                QUALITATIVE_RESULTS_FILE,
                qualitative_rows(&qualitative_path, suite, report)?,
            ),
            (
                QUANTITATIVE_RESULTS_FILE,
                quantitative_rows(&quantitative_path, suite, report)?,
            ),
        ];
        for (name, content) in &outputs {
            self.write_atomic(name, content)?;
        }

        info!(output_dir = ?self.output_dir, run_id = %report.run_id, "report written");
        Ok(())
    }
}

/// Header names of the extra columns, in first-seen order.
fn extra_headers<'a>(columns: impl Iterator<Item = &'a Vec<(String, String)>>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for row in columns {
        for (name, _) in row {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    }
    names
}

fn extra_values(names: &[String], row: &[(String, String)]) -> Vec<String> {
    names
        .iter()
        .map(|name| {
            row.iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        })
        .collect()
}

fn check_lengths(family: &'static str, cases: usize, verdicts: usize) -> StoreResult<()> {
    if cases == verdicts {
        Ok(())
    } else {
        Err(StoreError::ReportMismatch {
            family,
            cases,
            verdicts,
        })
    }
}

fn finish_csv(path: &Path, writer: csv::Writer<Vec<u8>>) -> StoreResult<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| StoreError::io(path, e.into_error()))
}

fn qualitative_rows(path: &Path, suite: &AutotestSuite, report: &ValidationReport) -> StoreResult<Vec<u8>> {
    check_lengths("qualitative", suite.qualitative.len(), report.qualitative.len())?;
    let extras = extra_headers(suite.qualitative.iter().map(|c| &c.extra_columns));

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header: Vec<String> = vec![
        TEST_ID_COLUMN.to_string(),
        LINKAGE_COLUMN.to_string(),
        TREND_COLUMN.to_string(),
    ];
    header.extend(extras.iter().cloned());
    header.extend(["trend_result", "linkage_result", "result"].map(String::from));
    writer
        .write_record(&header)
        .map_err(|e| StoreError::csv(path, e))?;

    for (case, verdict) in suite.qualitative.iter().zip(&report.qualitative) {
        let mut row = vec![
            case.experiment_id.clone(),
            case.linkage_spec.clone(),
            case.trend_spec.clone(),
        ];
        row.extend(extra_values(&extras, &case.extra_columns));
        row.push(format_check(verdict.trend_passed));
        row.push(format_check(verdict.linkage_passed));
        row.push(verdict.passed.to_string());
        writer.write_record(&row).map_err(|e| StoreError::csv(path, e))?;
    }
    finish_csv(path, writer)
}

fn quantitative_rows(path: &Path, suite: &AutotestSuite, report: &ValidationReport) -> StoreResult<Vec<u8>> {
    check_lengths("quantitative", suite.quantitative.len(), report.quantitative.len())?;
    let extras = extra_headers(suite.quantitative.iter().map(|c| &c.extra_columns));
    let effect_years: BTreeSet<i32> = suite
        .quantitative
        .iter()
        .flat_map(|c| c.expected_effects.keys().copied())
        .collect();
    let checked_years: BTreeSet<i32> = report
        .quantitative
        .iter()
        .flat_map(|v| v.year_errors.iter().map(|e| e.year))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec![TEST_ID_COLUMN.to_string()];
    header.extend(effect_years.iter().map(|y| format!("{EFFECT_COLUMN_PREFIX}{y}")));
    header.extend(extras.iter().cloned());
    for year in &checked_years {
        header.push(format!("{ML_EFFECT_COLUMN_PREFIX}{year}"));
        header.push(format!("{ERROR_COLUMN_PREFIX}{year}"));
    }
    header.extend(["mean_error", "result"].map(String::from));
    writer
        .write_record(&header)
        .map_err(|e| StoreError::csv(path, e))?;

    for (case, verdict) in suite.quantitative.iter().zip(&report.quantitative) {
        let mut row = vec![case.experiment_id.clone()];
        row.extend(effect_years.iter().map(|&y| {
            case.expected_effect(y)
                .map(|v| v.to_string())
                .unwrap_or_default()
        }));
        row.extend(extra_values(&extras, &case.extra_columns));
        for &year in &checked_years {
            match verdict.year_errors.iter().find(|e| e.year == year) {
                Some(e) => {
                    row.push(e.computed_effect.to_string());
                    row.push(format!("{:.2}", e.relative_error));
                }
                None => row.extend([String::new(), String::new()]),
            }
        }
        row.push(
            verdict
                .mean_relative_error
                .map(|m| format!("{:.2}", m))
                .unwrap_or_default(),
        );
        row.push(verdict.passed.to_string());
        writer.write_record(&row).map_err(|e| StoreError::csv(path, e))?;
    }
    finish_csv(path, writer)
}
