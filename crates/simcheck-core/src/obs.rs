//! Structured lifecycle events for validation runs.
//!
//! Every event carries an `event` field so log collectors can filter on it:
//! `run.started`, `family.started`, `case.evaluated`, `dataset.missing`,
//! `family.finished`, `statistics.computed`, `run.finished`.

use tracing::{info, warn};

use crate::config::TestKind;
use crate::domain::StatisticsSummary;

/// The `simcheck.run` span; instrument a run's future with it.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("simcheck.run", run_id = %run_id)
}

pub fn emit_run_started(run_id: &str, suite_digest: &str, qualitative: usize, quantitative: usize) {
    info!(
        event = "run.started",
        run_id = %run_id,
        suite_digest = %suite_digest,
        qualitative_cases = qualitative,
        quantitative_cases = quantitative,
    );
}

pub fn emit_family_started(kind: TestKind, execution_id: &str, cases: usize) {
    info!(event = "family.started", kind = %kind, execution_id = %execution_id, cases = cases);
}

/// One case finished with a verdict.
pub fn emit_case_evaluated(kind: TestKind, experiment_id: &str, passed: bool) {
    info!(
        event = "case.evaluated",
        kind = %kind,
        experiment_id = %experiment_id,
        passed = passed,
    );
}

/// A result file needed by a case is not in the results directory.
pub fn emit_dataset_missing(kind: TestKind, execution_id: &str, experiment_id: &str) {
    warn!(
        event = "dataset.missing",
        kind = %kind,
        execution_id = %execution_id,
        experiment_id = %experiment_id,
        "no result file for experiment"
    );
}

pub fn emit_family_finished(kind: TestKind, cases: usize, passed: usize) {
    info!(event = "family.finished", kind = %kind, cases = cases, passed = passed);
}

pub fn emit_statistics(summary: &StatisticsSummary) {
    info!(
        event = "statistics.computed",
        trend_pass_rate = summary.trend_pass_rate,
        linkage_pass_rate = summary.linkage_pass_rate,
        trend_fail_rate = summary.trend_fail_rate,
        linkage_fail_rate = summary.linkage_fail_rate,
        mean_relative_error = summary.mean_relative_error,
    );
}

pub fn emit_run_finished(run_id: &str, duration_ms: u64, passed: usize, failed: usize) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        passed = passed,
        failed = failed,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_span_create() {
        let span = run_span("test-run-id");
        let _guard = span.enter();
        emit_case_evaluated(TestKind::Quality, "3", true);
    }
}
