//! Aggregate statistics over a run's verdicts.

use simcheck_core::{QualitativeVerdict, QuantitativeVerdict, StatisticsSummary};

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Reduce verdicts to pass/fail rates and the mean relative error.
///
/// A sub-check that never ran counts as failed. The mean error only covers
/// quantitative verdicts that recorded one.
pub fn summarize(
    qualitative: &[QualitativeVerdict],
    quantitative: &[QuantitativeVerdict],
) -> StatisticsSummary {
    let total = qualitative.len();
    let trend_passed = qualitative
        .iter()
        .filter(|v| v.trend_passed == Some(true))
        .count();
    let linkage_passed = qualitative
        .iter()
        .filter(|v| v.linkage_passed == Some(true))
        .count();
    let trend_failed = total - trend_passed;
    let linkage_failed = total - linkage_passed;

    let errors: Vec<f64> = quantitative
        .iter()
        .filter_map(|v| v.mean_relative_error)
        .collect();
    let mean_relative_error = if errors.is_empty() {
        0.0
    } else {
        errors.iter().sum::<f64>() / errors.len() as f64
    };

    StatisticsSummary {
        qualitative_total: total,
        trend_passed,
        trend_failed,
        linkage_passed,
        linkage_failed,
        trend_pass_rate: percent(trend_passed, total),
        linkage_pass_rate: percent(linkage_passed, total),
        trend_fail_rate: percent(trend_failed, total),
        linkage_fail_rate: percent(linkage_failed, total),
        quantitative_total: errors.len(),
        mean_relative_error,
    }
}
