//! Comparison operators and the values they compare.
//!
//! A failed function evaluation is carried as [`Evaluated::Error`]. Every
//! predicate returns `false` when either side is an error, in both argument
//! positions and for `!=` as well, so a bad indicator can only fail the
//! criterion it appears in.

use crate::domain::error::ScreenerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Tolerance for the equality family of operators.
pub const EPSILON: f64 = 1e-9;

/// The result of evaluating one side of a criterion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluated {
    Value(f64),
    Error,
}

impl Evaluated {
    pub fn value(self) -> Option<f64> {
        match self {
            Evaluated::Value(v) if v.is_finite() => Some(v),
            _ => None,
        }
    }

    pub fn is_error(self) -> bool {
        self.value().is_none()
    }
}

impl From<f64> for Evaluated {
    fn from(v: f64) -> Self {
        Evaluated::Value(v)
    }
}

impl<E> From<Result<f64, E>> for Evaluated {
    fn from(result: Result<f64, E>) -> Self {
        result.map_or(Evaluated::Error, Evaluated::Value)
    }
}

impl fmt::Display for Evaluated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(v) => write!(f, "{v}"),
            None => f.write_str("Error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ComparisonOperator {
    GreaterThan,
    LessThan,
    Equals,
    NotEquals,
    GreaterOrEquals,
    LessOrEquals,
}

impl ComparisonOperator {
    pub const ALL: [ComparisonOperator; 6] = [
        ComparisonOperator::GreaterThan,
        ComparisonOperator::LessThan,
        ComparisonOperator::Equals,
        ComparisonOperator::NotEquals,
        ComparisonOperator::GreaterOrEquals,
        ComparisonOperator::LessOrEquals,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::Equals => "==",
            ComparisonOperator::NotEquals => "!=",
            ComparisonOperator::GreaterOrEquals => ">=",
            ComparisonOperator::LessOrEquals => "<=",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ComparisonOperator::GreaterThan => "GreaterThan",
            ComparisonOperator::LessThan => "LessThan",
            ComparisonOperator::Equals => "Equals",
            ComparisonOperator::NotEquals => "NotEquals",
            ComparisonOperator::GreaterOrEquals => "GreaterOrEquals",
            ComparisonOperator::LessOrEquals => "LessOrEquals",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for ComparisonOperator {
    type Err = ScreenerError;

    /// Accepts either the symbol or the label, labels case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ComparisonOperator::ALL
            .into_iter()
            .find(|op| op.symbol() == s || op.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| ScreenerError::InvalidCriteria {
                reason: format!("unknown comparison operator {s:?}"),
            })
    }
}

impl TryFrom<String> for ComparisonOperator {
    type Error = ScreenerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ComparisonOperator> for String {
    fn from(op: ComparisonOperator) -> Self {
        op.symbol().to_string()
    }
}

/// Binary predicate bound to an operator.
pub type ComparisonExecutor = fn(Evaluated, Evaluated) -> bool;

fn both(a: Evaluated, b: Evaluated) -> Option<(f64, f64)> {
    Some((a.value()?, b.value()?))
}

fn approx_eq(x: f64, y: f64) -> bool {
    (x - y).abs() < EPSILON
}

fn greater_than(a: Evaluated, b: Evaluated) -> bool {
    both(a, b).is_some_and(|(x, y)| x > y && !approx_eq(x, y))
}

fn less_than(a: Evaluated, b: Evaluated) -> bool {
    both(a, b).is_some_and(|(x, y)| x < y && !approx_eq(x, y))
}

fn equals(a: Evaluated, b: Evaluated) -> bool {
    both(a, b).is_some_and(|(x, y)| approx_eq(x, y))
}

fn not_equals(a: Evaluated, b: Evaluated) -> bool {
    both(a, b).is_some_and(|(x, y)| !approx_eq(x, y))
}

fn greater_or_equals(a: Evaluated, b: Evaluated) -> bool {
    both(a, b).is_some_and(|(x, y)| x > y || approx_eq(x, y))
}

fn less_or_equals(a: Evaluated, b: Evaluated) -> bool {
    both(a, b).is_some_and(|(x, y)| x < y || approx_eq(x, y))
}

static EXECUTORS: [(ComparisonOperator, ComparisonExecutor); 6] = [
    (ComparisonOperator::GreaterThan, greater_than),
    (ComparisonOperator::LessThan, less_than),
    (ComparisonOperator::Equals, equals),
    (ComparisonOperator::NotEquals, not_equals),
    (ComparisonOperator::GreaterOrEquals, greater_or_equals),
    (ComparisonOperator::LessOrEquals, less_or_equals),
];

pub fn get_comparison_executor(op: ComparisonOperator) -> Result<ComparisonExecutor, ScreenerError> {
    EXECUTORS
        .iter()
        .find(|(registered, _)| *registered == op)
        .map(|(_, executor)| *executor)
        .ok_or_else(|| ScreenerError::ComparisonExecutorNotFound {
            operator: op.label().to_string(),
        })
}

/// Operator label to symbol, for rule-authoring clients.
pub fn list_operators() -> BTreeMap<&'static str, &'static str> {
    ComparisonOperator::ALL
        .into_iter()
        .map(|op| (op.label(), op.symbol()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compare(op: ComparisonOperator, a: Evaluated, b: Evaluated) -> bool {
        get_comparison_executor(op).unwrap()(a, b)
    }

    #[test]
    fn ordering_on_values() {
        use ComparisonOperator::*;
        let (one, two) = (Evaluated::Value(1.0), Evaluated::Value(2.0));
        assert!(compare(LessThan, one, two));
        assert!(!compare(GreaterThan, one, two));
        assert!(compare(GreaterThan, two, one));
        assert!(compare(NotEquals, one, two));
        assert!(compare(GreaterOrEquals, two, two));
        assert!(compare(LessOrEquals, one, one));
        assert!(!compare(GreaterOrEquals, one, two));
    }

    #[test]
    fn equality_uses_epsilon() {
        let a = Evaluated::Value(0.1 + 0.2);
        let b = Evaluated::Value(0.3);
        assert!(compare(ComparisonOperator::Equals, a, b));
        assert!(!compare(ComparisonOperator::NotEquals, a, b));
        assert!(!compare(ComparisonOperator::GreaterThan, a, b));
        assert!(!compare(ComparisonOperator::LessThan, a, b));
    }

    #[test]
    fn error_fails_every_operator_in_both_positions() {
        let value = Evaluated::Value(1.0);
        for op in ComparisonOperator::ALL {
            assert!(!compare(op, Evaluated::Error, value), "Error {op} 1");
            assert!(!compare(op, value, Evaluated::Error), "1 {op} Error");
            assert!(!compare(op, Evaluated::Error, Evaluated::Error), "Error {op} Error");
        }
    }

    #[test]
    fn non_finite_values_behave_as_errors() {
        let nan = Evaluated::Value(f64::NAN);
        assert!(nan.is_error());
        for op in ComparisonOperator::ALL {
            assert!(!compare(op, nan, Evaluated::Value(0.0)));
        }
    }

    #[test]
    fn every_operator_has_an_executor() {
        for op in ComparisonOperator::ALL {
            assert!(get_comparison_executor(op).is_ok());
        }
    }

    #[test]
    fn operators_parse_from_symbol_or_label() {
        assert_eq!(">=".parse::<ComparisonOperator>().unwrap(), ComparisonOperator::GreaterOrEquals);
        assert_eq!("lessthan".parse::<ComparisonOperator>().unwrap(), ComparisonOperator::LessThan);
        assert!("=>".parse::<ComparisonOperator>().is_err());
    }

    #[test]
    fn serde_uses_symbols() {
        let json = serde_json::to_string(&ComparisonOperator::NotEquals).unwrap();
        assert_eq!(json, "\"!=\"");
        let op: ComparisonOperator = serde_json::from_str("\"Equals\"").unwrap();
        assert_eq!(op, ComparisonOperator::Equals);
    }

    #[test]
    fn operator_listing() {
        let ops = list_operators();
        assert_eq!(ops.len(), 6);
        assert_eq!(ops["GreaterThan"], ">");
        assert_eq!(ops["LessOrEquals"], "<=");
    }
}
