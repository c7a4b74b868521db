//! Typed test cases built from autotest definition rows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::error::{FormatError, Result};
use super::trend_spec::{parse_trend_spec, TrendCondition};

/// Whether `s` is a valid execution or experiment identifier.
pub fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn identifier(s: &str) -> Result<String> {
    let s = s.trim();
    if is_identifier(s) {
        Ok(s.to_string())
    } else {
        Err(FormatError::InvalidIdentifier(s.to_string()))
    }
}

/// Whether a definition cell holds no value.
pub fn is_blank(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || cell.eq_ignore_ascii_case("nan")
}

/// Required relationship between two experiments' totals, e.g. `>|(id=14)|`.
///
/// The comparator symbol is kept as written; unknown symbols are reported
/// when the linkage is evaluated, not when it is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkageSpec {
    pub comparator: char,
    pub linked_experiment_id: String,
}

impl LinkageSpec {
    /// Parse a linkage cell. Blank cells carry no linkage.
    pub fn parse(field: &str) -> Result<Option<Self>> {
        if is_blank(field) {
            return Ok(None);
        }

        let spec = field.trim();
        let malformed = || FormatError::MalformedLinkage {
            spec: spec.to_string(),
        };

        let comparator = spec.chars().next().ok_or_else(malformed)?;
        let (_, rest) = spec.split_once("id=").ok_or_else(malformed)?;
        let linked = rest.split(')').next().unwrap_or_default().trim();
        if linked.is_empty() {
            return Err(malformed());
        }

        Ok(Some(Self {
            comparator,
            linked_experiment_id: identifier(linked)?,
        }))
    }
}

impl fmt::Display for LinkageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|(id={})|", self.comparator, self.linked_experiment_id)
    }
}

/// A qualitative test: trend expectations plus an optional linkage check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitativeCase {
    pub experiment_id: String,
    pub linkage: Option<LinkageSpec>,
    /// Linkage cell as written in the definition.
    #[serde(default)]
    pub linkage_spec: String,
    /// Trend spec as written in the definition.
    pub trend_spec: String,
    pub conditions: Vec<TrendCondition>,
    /// Definition columns carried through to the written-back rows.
    #[serde(default)]
    pub extra_columns: Vec<(String, String)>,
}

impl QualitativeCase {
    /// Build a case from its raw definition cells.
    pub fn parse(experiment_id: &str, linkage: &str, trend: &str) -> Result<Self> {
        Ok(Self {
            experiment_id: identifier(experiment_id)?,
            linkage: LinkageSpec::parse(linkage)?,
            linkage_spec: if is_blank(linkage) {
                String::new()
            } else {
                linkage.trim().to_string()
            },
            trend_spec: trend.trim().to_string(),
            conditions: parse_trend_spec(trend)?,
            extra_columns: Vec::new(),
        })
    }

    pub fn with_extra_columns(mut self, columns: Vec<(String, String)>) -> Self {
        self.extra_columns = columns;
        self
    }
}

/// A quantitative test: reference effects per year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitativeCase {
    pub experiment_id: String,
    pub expected_effects: BTreeMap<i32, f64>,
    #[serde(default)]
    pub extra_columns: Vec<(String, String)>,
}

impl QuantitativeCase {
    pub fn new(experiment_id: &str, expected_effects: BTreeMap<i32, f64>) -> Result<Self> {
        Ok(Self {
            experiment_id: identifier(experiment_id)?,
            expected_effects,
            extra_columns: Vec::new(),
        })
    }

    /// Build a case from `(year, cell)` pairs; blank cells are skipped.
    pub fn parse<'a, I>(experiment_id: &str, effects: I) -> Result<Self>
    where
        I: IntoIterator<Item = (i32, &'a str)>,
    {
        let mut expected_effects = BTreeMap::new();
        for (year, cell) in effects {
            if is_blank(cell) {
                continue;
            }
            let value = cell
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| FormatError::InvalidEffect {
                    year,
                    value: cell.trim().to_string(),
                })?;
            expected_effects.insert(year, value);
        }
        Self::new(experiment_id, expected_effects)
    }

    pub fn expected_effect(&self, year: i32) -> Option<f64> {
        self.expected_effects.get(&year).copied()
    }

    pub fn with_extra_columns(mut self, columns: Vec<(String, String)>) -> Self {
        self.extra_columns = columns;
        self
    }
}

/// Both test families of one autotest definition set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutotestSuite {
    pub qualitative: Vec<QualitativeCase>,
    pub quantitative: Vec<QuantitativeCase>,
}

impl AutotestSuite {
    pub fn new(qualitative: Vec<QualitativeCase>, quantitative: Vec<QuantitativeCase>) -> Self {
        Self {
            qualitative,
            quantitative,
        }
    }

    pub fn len(&self) -> usize {
        self.qualitative.len() + self.quantitative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trend_spec::Trend;

    #[test]
    fn test_linkage_parse() {
        let linkage = LinkageSpec::parse(">|(id=14)|").expect("parse").expect("present");
        assert_eq!(linkage.comparator, '>');
        assert_eq!(linkage.linked_experiment_id, "14");
        assert_eq!(linkage.to_string(), ">|(id=14)|");
    }

    #[test]
    fn test_linkage_blank_is_absent() {
        assert_eq!(LinkageSpec::parse("").expect("parse"), None);
        assert_eq!(LinkageSpec::parse("  NaN ").expect("parse"), None);
    }

    #[test]
    fn test_linkage_unknown_comparator_still_parses() {
        let linkage = LinkageSpec::parse("=|(id=7)|").expect("parse").expect("present");
        assert_eq!(linkage.comparator, '=');
    }

    #[test]
    fn test_linkage_without_id_is_malformed() {
        assert!(matches!(
            LinkageSpec::parse(">|(14)|").unwrap_err(),
            FormatError::MalformedLinkage { .. }
        ));
        assert!(matches!(
            LinkageSpec::parse(">|(id=)|").unwrap_err(),
            FormatError::MalformedLinkage { .. }
        ));
    }

    #[test]
    fn test_qualitative_case_parse() {
        let case = QualitativeCase::parse("3", "<|(id=2)|", "(2025-2026:0);(2030:1)").expect("parse");
        assert_eq!(case.experiment_id, "3");
        assert_eq!(case.conditions.len(), 3);
        assert_eq!(case.conditions[2].expected, Trend::Increase);
        assert!(case.linkage.is_some());
        assert_eq!(case.linkage_spec, "<|(id=2)|");
    }

    #[test]
    fn test_qualitative_case_keeps_raw_linkage_text() {
        let case = QualitativeCase::parse("3", " >|(id=14)| check totals ", "(2025:1)").expect("parse");
        assert_eq!(case.linkage_spec, ">|(id=14)| check totals");
        assert_eq!(case.linkage.expect("present").linked_experiment_id, "14");

        let blank = QualitativeCase::parse("4", "nan", "(2025:1)").expect("parse");
        assert_eq!(blank.linkage_spec, "");
    }

    #[test]
    fn test_qualitative_case_rejects_bad_identifier() {
        let err = QualitativeCase::parse("3_a", "", "(2025:0)").unwrap_err();
        assert_eq!(err, FormatError::InvalidIdentifier("3_a".to_string()));
    }

    #[test]
    fn test_quantitative_case_parse_skips_blank_cells() {
        let case = QuantitativeCase::parse("5", vec![(2025, "100"), (2026, ""), (2027, "-12.5")])
            .expect("parse");
        assert_eq!(case.expected_effect(2025), Some(100.0));
        assert_eq!(case.expected_effect(2026), None);
        assert_eq!(case.expected_effect(2027), Some(-12.5));
    }

    #[test]
    fn test_quantitative_case_rejects_non_numeric_effect() {
        let err = QuantitativeCase::parse("5", vec![(2025, "lots")]).unwrap_err();
        assert!(matches!(err, FormatError::InvalidEffect { year: 2025, .. }));
    }
}
