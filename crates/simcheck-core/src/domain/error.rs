//! Format errors raised while turning test-definition text into typed cases.

/// A test definition that cannot be parsed into a typed case.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("trend spec must not be empty")]
    EmptyTrendSpec,

    #[error("trend clause '{clause}' must be '<years>:<trend>'")]
    MalformedClause { clause: String },

    #[error("trend clause '{clause}' has invalid year range '{years}'")]
    InvalidYearRange { clause: String, years: String },

    #[error("trend clause '{clause}' has reversed year range {start}-{end}")]
    ReversedYearRange { clause: String, start: i32, end: i32 },

    #[error("trend clause '{clause}' spans {start}-{end}, more than {max} years")]
    YearRangeTooWide {
        clause: String,
        start: i32,
        end: i32,
        max: i64,
    },

    #[error("trend clause '{clause}' has invalid trend code '{code}' (expected -1, 0 or 1)")]
    InvalidTrendCode { clause: String, code: String },

    #[error("linkage spec '{spec}' does not reference an experiment (expected e.g. '>|(id=14)|')")]
    MalformedLinkage { spec: String },

    #[error("invalid identifier '{0}': only letters, digits and '-' are allowed")]
    InvalidIdentifier(String),

    #[error("invalid expected effect for year {year}: '{value}'")]
    InvalidEffect { year: i32, value: String },

    #[error("row {row}: {message}")]
    InvalidRow { row: usize, message: String },
}

/// Result type for definition parsing.
pub type Result<T> = std::result::Result<T, FormatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_display() {
        let err = FormatError::MalformedClause {
            clause: "2025".to_string(),
        };
        assert!(err.to_string().contains("'2025'"));

        let err = FormatError::InvalidRow {
            row: 3,
            message: "missing test_id".to_string(),
        };
        assert_eq!(err.to_string(), "row 3: missing test_id");
    }
}
