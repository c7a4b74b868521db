//! Trend evaluation of an experiment series against its base series.

use simcheck_core::{TimeSeries, Trend, TrendCheck, TrendCondition};
use tracing::{debug, warn};

use crate::error::EvalError;

/// Result of evaluating a trend spec.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendOutcome {
    pub passed: bool,
    /// One check per evaluated condition; nothing past the first failure.
    pub checks: Vec<TrendCheck>,
}

/// Absolute difference of `compare` from `base` as a percentage of `base`.
///
/// With a zero base, equal values differ by 0 % and anything else by an
/// infinite amount.
pub fn percent_diff(base: f64, compare: f64) -> f64 {
    if base == 0.0 {
        if compare == 0.0 {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        (base - compare).abs() / base * 100.0
    }
}

/// Whether `compare` stays within `tolerance` percent of `base`.
pub fn evaluate_flat(base: f64, compare: f64, tolerance: f64) -> bool {
    percent_diff(base, compare) <= tolerance
}

fn lookup(series: &TimeSeries, year: i32, name: &'static str) -> Result<f64, EvalError> {
    series
        .value(year)
        .ok_or(EvalError::MissingYear { year, series: name })
}

/// Check one condition.
pub fn check_condition(
    base: &TimeSeries,
    experiment: &TimeSeries,
    condition: &TrendCondition,
    tolerance: f64,
) -> Result<TrendCheck, EvalError> {
    let year = condition.year;
    let base_value = lookup(base, year, "base")?;
    let compare_value = lookup(experiment, year, "experiment")?;
    let observed = Trend::of_change(base_value, compare_value);

    let (passed, percent_diff) = match condition.expected {
        Trend::Flat => {
            let diff = percent_diff(base_value, compare_value);
            if diff.is_infinite() {
                warn!(year, compare_value, "zero base value, flat trend cannot hold");
            }
            (diff <= tolerance, Some(diff))
        }
        expected => (observed == expected, None),
    };

    Ok(TrendCheck {
        year,
        expected: condition.expected,
        observed,
        base_value,
        compare_value,
        percent_diff,
        passed,
    })
}

/// Evaluate conditions in order, stopping at the first failing one.
pub fn evaluate(
    base: &TimeSeries,
    experiment: &TimeSeries,
    conditions: &[TrendCondition],
    tolerance: f64,
) -> Result<TrendOutcome, EvalError> {
    let mut checks = Vec::with_capacity(conditions.len());
    for condition in conditions {
        let check = check_condition(base, experiment, condition, tolerance)?;
        let passed = check.passed;
        debug!(
            year = check.year,
            expected = %check.expected,
            observed = %check.observed,
            passed,
            "trend condition checked"
        );
        checks.push(check);
        if !passed {
            return Ok(TrendOutcome {
                passed: false,
                checks,
            });
        }
    }
    Ok(TrendOutcome {
        passed: true,
        checks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: &[(i32, f64)]) -> TimeSeries {
        points.iter().copied().collect()
    }

    fn cond(year: i32, expected: Trend) -> TrendCondition {
        TrendCondition::new(year, expected)
    }

    #[test]
    fn test_flat_within_tolerance() {
        for base in [1.0, 50.0, 1234.5] {
            for t in [0.0, 5.0, 12.5] {
                assert!(evaluate_flat(base, base, t));
                assert!(!evaluate_flat(base, base * (1.0 + (t + 1.0) / 100.0), t));
            }
        }
    }

    #[test]
    fn test_flat_at_tolerance_passes() {
        assert_eq!(percent_diff(100.0, 105.0), 5.0);
        assert!(evaluate_flat(100.0, 105.0, 5.0));
        assert!(evaluate_flat(100.0, 95.0, 5.0));
        assert!(!evaluate_flat(100.0, 105.5, 5.0));
    }

    #[test]
    fn test_flat_zero_base() {
        assert_eq!(percent_diff(0.0, 0.0), 0.0);
        assert!(percent_diff(0.0, 3.0).is_infinite());
        assert!(evaluate_flat(0.0, 0.0, 5.0));
        assert!(!evaluate_flat(0.0, 3.0, 5.0));
    }

    #[test]
    fn test_sign_trends() {
        let base = series(&[(2025, 100.0)]);
        let up = series(&[(2025, 120.0)]);

        let increase = evaluate(&base, &up, &[cond(2025, Trend::Increase)], 5.0).unwrap();
        assert!(increase.passed);

        let decrease = evaluate(&base, &up, &[cond(2025, Trend::Decrease)], 5.0).unwrap();
        assert!(!decrease.passed);
        assert_eq!(decrease.checks[0].observed, Trend::Increase);
        assert_eq!(decrease.checks[0].percent_diff, None);
    }

    #[test]
    fn test_equal_values_are_not_a_change() {
        let base = series(&[(2025, 100.0)]);
        let outcome = evaluate(&base, &base, &[cond(2025, Trend::Increase)], 5.0).unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.checks[0].observed, Trend::Flat);
    }

    #[test]
    fn test_short_circuit_on_first_failure() {
        let base = series(&[(2025, 100.0), (2026, 100.0), (2027, 100.0)]);
        let experiment = series(&[(2025, 101.0), (2026, 90.0), (2027, 100.0)]);
        let conditions = [
            cond(2025, Trend::Flat),
            cond(2026, Trend::Increase),
            cond(2027, Trend::Flat),
        ];

        let outcome = evaluate(&base, &experiment, &conditions, 5.0).unwrap();

        assert!(!outcome.passed);
        let years: Vec<i32> = outcome.checks.iter().map(|c| c.year).collect();
        assert_eq!(years, vec![2025, 2026]);
    }

    #[test]
    fn test_base_and_experiment_scenario() {
        let base = series(&[(2025, 100.0), (2026, 90.0)]);
        let experiment = series(&[(2025, 100.0), (2026, 80.0)]);

        let first = evaluate(&base, &experiment, &[cond(2025, Trend::Flat)], 5.0).unwrap();
        assert!(first.passed);
        assert_eq!(first.checks[0].percent_diff, Some(0.0));

        let second = evaluate(&base, &experiment, &[cond(2026, Trend::Flat)], 5.0).unwrap();
        assert!(!second.passed);
        let diff = second.checks[0].percent_diff.unwrap();
        assert!((diff - 11.11).abs() < 0.01);
    }

    #[test]
    fn test_missing_year_is_an_error() {
        let base = series(&[(2025, 100.0)]);
        let experiment = series(&[(2026, 100.0)]);

        let err = evaluate(&base, &experiment, &[cond(2026, Trend::Flat)], 5.0).unwrap_err();
        assert_eq!(
            err,
            EvalError::MissingYear {
                year: 2026,
                series: "base"
            }
        );

        let err = evaluate(&base, &experiment, &[cond(2025, Trend::Flat)], 5.0).unwrap_err();
        assert_eq!(
            err,
            EvalError::MissingYear {
                year: 2025,
                series: "experiment"
            }
        );
    }

    #[test]
    fn test_empty_conditions_pass() {
        let outcome = evaluate(&TimeSeries::new(), &TimeSeries::new(), &[], 5.0).unwrap();
        assert!(outcome.passed);
        assert!(outcome.checks.is_empty());
    }
}
