//! Linkage checks between the totals of two experiments.

use std::fmt;

use crate::error::EvalError;

/// Supported linkage comparators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Greater,
    Less,
}

impl Comparator {
    pub fn from_symbol(symbol: char) -> Result<Self, EvalError> {
        match symbol {
            '>' => Ok(Comparator::Greater),
            '<' => Ok(Comparator::Less),
            other => Err(EvalError::UnsupportedComparator(other)),
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Comparator::Greater => '>',
            Comparator::Less => '<',
        }
    }

    pub fn holds(&self, current: f64, linked: f64) -> bool {
        match self {
            Comparator::Greater => current > linked,
            Comparator::Less => current < linked,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Compare the current experiment's total with the linked one.
pub fn evaluate(current_sum: f64, linked_sum: f64, symbol: char) -> Result<bool, EvalError> {
    Ok(Comparator::from_symbol(symbol)?.holds(current_sum, linked_sum))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greater() {
        assert_eq!(evaluate(120.0, 100.0, '>'), Ok(true));
        assert_eq!(evaluate(100.0, 100.0, '>'), Ok(false));
    }

    #[test]
    fn test_less() {
        assert_eq!(evaluate(120.0, 100.0, '<'), Ok(false));
        assert_eq!(evaluate(80.0, 100.0, '<'), Ok(true));
    }

    #[test]
    fn test_unsupported_comparator() {
        assert_eq!(
            evaluate(120.0, 100.0, '='),
            Err(EvalError::UnsupportedComparator('='))
        );
    }

    #[test]
    fn test_symbol_round_trip() {
        for c in [Comparator::Greater, Comparator::Less] {
            assert_eq!(Comparator::from_symbol(c.symbol()), Ok(c));
        }
    }
}
