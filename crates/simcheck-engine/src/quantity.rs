//! Relative error between expected and computed effects.

use simcheck_core::{QuantitativeCase, TimeSeries, YearError};

use crate::error::EvalError;

/// Round half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Signed relative error in percent, rounded to two decimals.
///
/// An expected effect of zero yields 100 unless the computed effect is also
/// zero.
pub fn relative_error(expected: f64, computed: f64) -> f64 {
    if expected == 0.0 {
        if computed == 0.0 {
            0.0
        } else {
            100.0
        }
    } else {
        round2((expected - computed) / expected * 100.0)
    }
}

/// Per-year errors of one case and their mean.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityOutcome {
    pub year_errors: Vec<YearError>,
    pub mean_relative_error: f64,
    pub passed: bool,
}

fn lookup(series: &TimeSeries, year: i32, name: &'static str) -> Result<f64, EvalError> {
    series
        .value(year)
        .ok_or(EvalError::MissingYear { year, series: name })
}

/// Evaluate a case over `years`; passes when `|mean| <= limit`.
pub fn evaluate(
    base: &TimeSeries,
    experiment: &TimeSeries,
    case: &QuantitativeCase,
    years: &[i32],
    limit: f64,
) -> Result<QuantityOutcome, EvalError> {
    let mut year_errors = Vec::with_capacity(years.len());
    for &year in years {
        let expected_effect =
            case.expected_effect(year)
                .ok_or_else(|| EvalError::MissingExpectedEffect {
                    experiment_id: case.experiment_id.clone(),
                    year,
                })?;
        let computed_effect = lookup(experiment, year, "experiment")? - lookup(base, year, "base")?;
        year_errors.push(YearError {
            year,
            expected_effect,
            computed_effect,
            relative_error: relative_error(expected_effect, computed_effect),
        });
    }

    let mean_relative_error = if year_errors.is_empty() {
        0.0
    } else {
        year_errors.iter().map(|e| e.relative_error).sum::<f64>() / year_errors.len() as f64
    };

    Ok(QuantityOutcome {
        passed: mean_relative_error.abs() <= limit,
        year_errors,
        mean_relative_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn case(effects: &[(i32, f64)]) -> QuantitativeCase {
        QuantitativeCase::new("5", effects.iter().copied().collect::<BTreeMap<_, _>>()).unwrap()
    }

    fn series(points: &[(i32, f64)]) -> TimeSeries {
        points.iter().copied().collect()
    }

    #[test]
    fn test_relative_error_zero_expected() {
        assert_eq!(relative_error(0.0, 5.0), 100.0);
        assert_eq!(relative_error(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_relative_error_rounded() {
        assert_eq!(relative_error(100.0, 90.0), 10.0);
        assert_eq!(relative_error(3.0, 2.0), 33.33);
        assert_eq!(relative_error(-3.0, -4.0), -33.33);
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(2.0), 2.0);
    }

    #[test]
    fn test_mean_and_pass() {
        let base = series(&[(2025, 100.0), (2026, 100.0)]);
        let experiment = series(&[(2025, 190.0), (2026, 210.0)]);
        let outcome = evaluate(
            &base,
            &experiment,
            &case(&[(2025, 100.0), (2026, 100.0)]),
            &[2025, 2026],
            10.0,
        )
        .unwrap();

        assert_eq!(outcome.year_errors[0].computed_effect, 90.0);
        assert_eq!(outcome.year_errors[0].relative_error, 10.0);
        assert_eq!(outcome.year_errors[1].relative_error, -10.0);
        assert_eq!(outcome.mean_relative_error, 0.0);
        assert!(outcome.passed);
    }

    #[test]
    fn test_fails_over_limit() {
        let base = series(&[(2025, 0.0)]);
        let experiment = series(&[(2025, 5.0)]);
        let outcome = evaluate(&base, &experiment, &case(&[(2025, 0.0)]), &[2025], 10.0).unwrap();

        assert_eq!(outcome.mean_relative_error, 100.0);
        assert!(!outcome.passed);
    }

    #[test]
    fn test_mean_at_limit_passes() {
        let base = series(&[(2025, 0.0)]);
        for (computed, error) in [(9.0, 10.0), (11.0, -10.0)] {
            let experiment = series(&[(2025, computed)]);
            let outcome =
                evaluate(&base, &experiment, &case(&[(2025, 10.0)]), &[2025], 10.0).unwrap();

            assert_eq!(outcome.mean_relative_error, error);
            assert!(outcome.passed);
        }
    }

    #[test]
    fn test_missing_expected_effect() {
        let base = series(&[(2025, 1.0), (2026, 1.0)]);
        let err = evaluate(&base, &base, &case(&[(2025, 1.0)]), &[2025, 2026], 10.0).unwrap_err();

        assert_eq!(
            err,
            EvalError::MissingExpectedEffect {
                experiment_id: "5".to_string(),
                year: 2026
            }
        );
    }

    #[test]
    fn test_missing_year_in_series() {
        let base = series(&[(2025, 1.0)]);
        let experiment = series(&[(2026, 1.0)]);
        let err = evaluate(&base, &experiment, &case(&[(2025, 1.0)]), &[2025], 10.0).unwrap_err();

        assert!(matches!(err, EvalError::MissingYear { year: 2025, series: "experiment" }));
    }
}
