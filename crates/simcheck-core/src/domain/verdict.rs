//! Per-case verdicts, run statistics and the report that carries them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::trend_spec::Trend;

/// Diagnostics for one evaluated trend condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendCheck {
    pub year: i32,
    pub expected: Trend,
    pub observed: Trend,
    pub base_value: f64,
    pub compare_value: f64,
    /// Absolute percentage difference; only computed for flat expectations.
    pub percent_diff: Option<f64>,
    pub passed: bool,
}

/// Outcome of one qualitative test case.
///
/// `trend_passed` and `linkage_passed` are `None` when the experiment's
/// result file was not found and no sub-check ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitativeVerdict {
    pub execution_id: String,
    pub experiment_id: String,
    pub passed: bool,
    pub trend_passed: Option<bool>,
    pub linkage_passed: Option<bool>,
    pub trend_checks: Vec<TrendCheck>,
}

impl QualitativeVerdict {
    pub fn dataset_missing(execution_id: &str, experiment_id: &str) -> Self {
        Self {
            execution_id: execution_id.to_string(),
            experiment_id: experiment_id.to_string(),
            passed: false,
            trend_passed: None,
            linkage_passed: None,
            trend_checks: Vec::new(),
        }
    }
}

/// Computed effect and relative error for one year of interest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearError {
    pub year: i32,
    pub expected_effect: f64,
    pub computed_effect: f64,
    pub relative_error: f64,
}

/// Outcome of one quantitative test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitativeVerdict {
    pub execution_id: String,
    pub experiment_id: String,
    pub passed: bool,
    pub year_errors: Vec<YearError>,
    /// `None` when the experiment's result file was not found.
    pub mean_relative_error: Option<f64>,
}

impl QuantitativeVerdict {
    pub fn dataset_missing(execution_id: &str, experiment_id: &str) -> Self {
        Self {
            execution_id: execution_id.to_string(),
            experiment_id: experiment_id.to_string(),
            passed: false,
            year_errors: Vec::new(),
            mean_relative_error: None,
        }
    }
}

/// Aggregate statistics over one run's verdicts.
///
/// Rates are percentages (0–100) of the qualitative case count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub qualitative_total: usize,
    pub trend_passed: usize,
    pub trend_failed: usize,
    pub linkage_passed: usize,
    pub linkage_failed: usize,
    pub trend_pass_rate: f64,
    pub linkage_pass_rate: f64,
    pub trend_fail_rate: f64,
    pub linkage_fail_rate: f64,
    /// Quantitative cases that recorded a mean error.
    pub quantitative_total: usize,
    pub mean_relative_error: f64,
}

/// Everything a run produced, written once after both families finish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub run_id: Uuid,
    pub suite_digest: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub qualitative: Vec<QualitativeVerdict>,
    pub quantitative: Vec<QuantitativeVerdict>,
    pub statistics: StatisticsSummary,
}

impl ValidationReport {
    pub fn total_cases(&self) -> usize {
        self.qualitative.len() + self.quantitative.len()
    }

    pub fn passed_count(&self) -> usize {
        self.qualitative.iter().filter(|v| v.passed).count()
            + self.quantitative.iter().filter(|v| v.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.total_cases() - self.passed_count()
    }

    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }

    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(qualitative: Vec<QualitativeVerdict>, quantitative: Vec<QuantitativeVerdict>) -> ValidationReport {
        let now = Utc::now();
        ValidationReport {
            run_id: Uuid::new_v4(),
            suite_digest: "abc".to_string(),
            started_at: now,
            finished_at: now,
            qualitative,
            quantitative,
            statistics: StatisticsSummary::default(),
        }
    }

    #[test]
    fn test_report_counts() {
        let mut passing = QualitativeVerdict::dataset_missing("E", "1");
        passing.passed = true;
        let report = report(
            vec![passing, QualitativeVerdict::dataset_missing("E", "2")],
            vec![QuantitativeVerdict::dataset_missing("E", "3")],
        );

        assert_eq!(report.total_cases(), 3);
        assert_eq!(report.passed_count(), 1);
        assert_eq!(report.failed_count(), 2);
        assert!(!report.all_passed());
    }

    #[test]
    fn test_empty_report_passes() {
        assert!(report(vec![], vec![]).all_passed());
    }

    #[test]
    fn test_missing_dataset_verdicts_have_no_sub_checks() {
        let verdict = QualitativeVerdict::dataset_missing("E", "9");
        assert!(!verdict.passed);
        assert_eq!(verdict.trend_passed, None);
        assert_eq!(verdict.linkage_passed, None);

        let verdict = QuantitativeVerdict::dataset_missing("E", "9");
        assert_eq!(verdict.mean_relative_error, None);
    }

    #[test]
    fn test_report_serde_roundtrip() {
        let report = report(vec![QualitativeVerdict::dataset_missing("E", "2")], vec![]);
        let json = serde_json::to_string(&report).expect("serialize");
        let back: ValidationReport = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(report, back);
    }
}
