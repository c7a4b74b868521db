//! Trend specifications: the `(2025-2026:0);(2030:1)` grammar.
//!
//! A spec is a `;`-separated list of clauses. Each clause is
//! `<years>:<trend>` wrapped in optional parentheses, where `<years>` is a
//! single year or an inclusive `START-END` range and `<trend>` is one of
//! `-1` (decrease), `0` (flat) or `1` (increase). Ranges are expanded to one
//! [`TrendCondition`] per year, keeping clause order.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::{FormatError, Result};

/// Direction of change between a base value and an experiment value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Trend {
    Decrease,
    Flat,
    Increase,
}

impl Trend {
    /// Numeric code used in trend specs.
    pub fn code(self) -> i8 {
        match self {
            Trend::Decrease => -1,
            Trend::Flat => 0,
            Trend::Increase => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(Trend::Decrease),
            0 => Some(Trend::Flat),
            1 => Some(Trend::Increase),
            _ => None,
        }
    }

    /// Sign of `compare - base`; equal values are `Flat`.
    pub fn of_change(base: f64, compare: f64) -> Self {
        if compare > base {
            Trend::Increase
        } else if compare < base {
            Trend::Decrease
        } else {
            Trend::Flat
        }
    }
}

impl From<Trend> for i8 {
    fn from(trend: Trend) -> Self {
        trend.code()
    }
}

impl TryFrom<i8> for Trend {
    type Error = String;

    fn try_from(code: i8) -> std::result::Result<Self, Self::Error> {
        Trend::from_code(code as i64).ok_or_else(|| format!("invalid trend code {code}"))
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Trend::Decrease => "decrease",
            Trend::Flat => "flat",
            Trend::Increase => "increase",
        };
        write!(f, "{name}")
    }
}

/// Expected trend for one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendCondition {
    pub year: i32,
    pub expected: Trend,
}

impl TrendCondition {
    pub fn new(year: i32, expected: Trend) -> Self {
        Self { year, expected }
    }
}

impl fmt::Display for TrendCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{})", self.year, self.expected.code())
    }
}

/// Widest year range a single clause may expand to.
pub const MAX_RANGE_YEARS: i64 = 1000;

/// Parse a trend spec into a flat, ordered list of conditions.
pub fn parse_trend_spec(spec: &str) -> Result<Vec<TrendCondition>> {
    if spec.trim().is_empty() {
        return Err(FormatError::EmptyTrendSpec);
    }

    let mut conditions = Vec::new();
    for raw in spec.split(';') {
        let clause = raw.trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace());

        let parts: Vec<&str> = clause.split(':').collect();
        let [years, code] = parts.as_slice() else {
            return Err(FormatError::MalformedClause {
                clause: raw.trim().to_string(),
            });
        };

        let (start, end) = parse_year_range(clause, years.trim())?;
        let expected = code
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(Trend::from_code)
            .ok_or_else(|| FormatError::InvalidTrendCode {
                clause: clause.to_string(),
                code: code.trim().to_string(),
            })?;

        conditions.extend((start..=end).map(|year| TrendCondition::new(year, expected)));
    }

    Ok(conditions)
}

fn parse_year_range(clause: &str, years: &str) -> Result<(i32, i32)> {
    let invalid = || FormatError::InvalidYearRange {
        clause: clause.to_string(),
        years: years.to_string(),
    };

    let (start, end) = match years.split_once('-') {
        Some((start, end)) => (
            start.trim().parse::<i32>().map_err(|_| invalid())?,
            end.trim().parse::<i32>().map_err(|_| invalid())?,
        ),
        None => {
            let year = years.parse::<i32>().map_err(|_| invalid())?;
            (year, year)
        }
    };

    if start > end {
        return Err(FormatError::ReversedYearRange {
            clause: clause.to_string(),
            start,
            end,
        });
    }
    if i64::from(end) - i64::from(start) + 1 > MAX_RANGE_YEARS {
        return Err(FormatError::YearRangeTooWide {
            clause: clause.to_string(),
            start,
            end,
            max: MAX_RANGE_YEARS,
        });
    }
    Ok((start, end))
}
