//! Criteria evaluation engine.
//!
//! # Evaluation Semantics
//!
//! - Both sides of a criterion are evaluated against the latest observation
//! - A numeric failure on either side becomes the Error sentinel, so the
//!   criterion fails without aborting the run
//! - An unsupported function is an error unless `ignore_unsupported_func`
//!   is set, in which case the criterion fails
//! - Criteria for one instrument run sequentially, in set order

use crate::domain::comparison::{Evaluated, get_comparison_executor};
use crate::domain::criteria::Criteria;
use crate::domain::criterion::{Criterion, CriterionStatus};
use crate::domain::error::ScreenerError;
use crate::domain::function_spec::FunctionSpec;
use crate::domain::instrument::Instrument;
use crate::domain::profile::ranking_score;
use crate::domain::registry::FunctionRegistry;
use std::collections::HashSet;
use tracing::{debug, warn};
use uuid::Uuid;

enum Side {
    Value(Evaluated),
    Unsupported(String),
}

fn evaluate_side(registry: &FunctionRegistry, spec: &FunctionSpec, instrument: &Instrument) -> Side {
    match registry.evaluate(spec, instrument) {
        Ok(value) => Side::Value(Evaluated::from(value)),
        Err(ScreenerError::UnsupportedFunction { name }) => Side::Unsupported(name),
        Err(e) => {
            warn!(
                code = %instrument.code,
                function = %spec,
                error = %e,
                "evaluation failed; comparing as Error"
            );
            Side::Value(Evaluated::Error)
        }
    }
}

pub fn evaluate_criterion(
    instrument: &Instrument,
    criterion: &Criterion,
    ignore_unsupported_func: bool,
) -> Result<CriterionStatus, ScreenerError> {
    let registry = FunctionRegistry::global();
    let lhs = evaluate_side(registry, criterion.func1(), instrument);
    let rhs = evaluate_side(registry, criterion.func2(), instrument);

    let (a, b) = match (lhs, rhs) {
        (Side::Value(a), Side::Value(b)) => (a, b),
        (Side::Unsupported(name), _) | (_, Side::Unsupported(name)) => {
            if !ignore_unsupported_func {
                return Err(ScreenerError::UnsupportedFunction { name });
            }
            warn!(code = %instrument.code, criterion = %criterion, function = %name, "unsupported function; criterion failed");
            return Ok(CriterionStatus::Failed);
        }
    };

    let executor = get_comparison_executor(criterion.op())?;
    let status = CriterionStatus::from(executor(a, b));
    debug!(code = %instrument.code, criterion = %criterion, lhs = %a, rhs = %b, %status);
    Ok(status)
}

/// One criterion's outcome within a [`CriteriaEvaluation`].
#[derive(Debug, Clone, PartialEq)]
pub struct CriterionResult {
    pub id: Uuid,
    pub label: String,
    pub status: CriterionStatus,
}

/// Results for one instrument, in criteria order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CriteriaEvaluation {
    results: Vec<CriterionResult>,
}

impl CriteriaEvaluation {
    pub fn iter(&self) -> std::slice::Iter<'_, CriterionResult> {
        self.results.iter()
    }

    /// Status of the first criterion displayed as `label`.
    pub fn get(&self, label: &str) -> Option<CriterionStatus> {
        self.results.iter().find(|r| r.label == label).map(|r| r.status)
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_passed()).count()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Label to pass/fail, in criteria order. Labels are unique.
    pub fn to_bool_map(&self) -> Vec<(String, bool)> {
        self.results
            .iter()
            .map(|r| (r.label.clone(), r.status.is_passed()))
            .collect()
    }

    /// Percentage of criteria passed; `None` when nothing was evaluated.
    pub fn ranking_score(&self) -> Option<u32> {
        let passed: u32 = self.results.iter().map(|r| r.status.value()).sum();
        ranking_score(passed as usize, self.results.len())
    }
}

/// Display labels for `criteria`, in order. A criterion whose label is
/// already taken gets a `#<id prefix>` suffix, or its full id if that is
/// taken too.
pub fn criteria_labels(criteria: &Criteria) -> Vec<String> {
    let mut seen = HashSet::new();
    criteria
        .iter()
        .map(|criterion| {
            let base = criterion.to_string();
            let simple = criterion.id().simple().to_string();
            let label = [
                base.clone(),
                format!("{base} #{}", &simple[..8]),
                format!("{base} #{}", criterion.id()),
            ]
            .into_iter()
            .find(|candidate| !seen.contains(candidate))
            .unwrap_or_else(|| format!("{base} #{simple}"));
            seen.insert(label.clone());
            label
        })
        .collect()
}

pub fn evaluate_criteria(
    instrument: &Instrument,
    criteria: &Criteria,
    ignore_unsupported_func: bool,
) -> Result<CriteriaEvaluation, ScreenerError> {
    let results = criteria
        .iter()
        .zip(criteria_labels(criteria))
        .map(|(criterion, label)| {
            evaluate_criterion(instrument, criterion, ignore_unsupported_func).map(|status| CriterionResult {
                id: criterion.id(),
                label,
                status,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CriteriaEvaluation { results })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::comparison::ComparisonOperator;
    use crate::domain::criterion::make_criterion;
    use crate::domain::function_spec::RawFunctionSpec;
    use crate::domain::ohlcv::OhlcvBar;
    use chrono::NaiveDate;

    fn instrument(closes: impl IntoIterator<Item = f64>) -> Instrument {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .into_iter()
            .enumerate()
            .map(|(i, close)| OhlcvBar {
                code: "BHP".into(),
                exchange: "ASX".into(),
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000,
            })
            .collect();
        Instrument::new("BHP".into(), "ASX".into(), bars)
    }

    fn sma(period: i64) -> RawFunctionSpec {
        RawFunctionSpec::new("SMA").with_kwarg("timeperiod", period)
    }

    fn constant(value: f64) -> RawFunctionSpec {
        RawFunctionSpec::new("CONSTANT").with_kwarg("value", value)
    }

    fn criterion(a: RawFunctionSpec, op: ComparisonOperator, b: RawFunctionSpec) -> Criterion {
        make_criterion(&a, &b, op, None, true).unwrap()
    }

    #[test]
    fn golden_cross_on_rising_and_falling_series() {
        let rule = criterion(sma(5), ComparisonOperator::GreaterThan, sma(20));
        let rising = instrument((1..=30).map(f64::from));
        let falling = instrument((1..=30).rev().map(f64::from));
        assert_eq!(evaluate_criterion(&rising, &rule, false).unwrap(), CriterionStatus::Passed);
        assert_eq!(evaluate_criterion(&falling, &rule, false).unwrap(), CriterionStatus::Failed);
    }

    #[test]
    fn numeric_failure_fails_regardless_of_flag() {
        let rule = criterion(sma(50), ComparisonOperator::LessThan, constant(1e9));
        let short = instrument((1..=10).map(f64::from));
        assert_eq!(evaluate_criterion(&short, &rule, false).unwrap(), CriterionStatus::Failed);
        assert_eq!(evaluate_criterion(&short, &rule, true).unwrap(), CriterionStatus::Failed);
        let inverse = criterion(sma(50), ComparisonOperator::GreaterOrEquals, constant(1e9));
        assert_eq!(evaluate_criterion(&short, &inverse, false).unwrap(), CriterionStatus::Failed);
    }

    #[test]
    fn unsupported_function_errors_unless_ignored() {
        let rule = criterion(RawFunctionSpec::new("GONE"), ComparisonOperator::GreaterThan, constant(0.0));
        let inst = instrument((1..=30).map(f64::from));
        assert!(matches!(
            evaluate_criterion(&inst, &rule, false),
            Err(ScreenerError::UnsupportedFunction { .. })
        ));
        assert_eq!(evaluate_criterion(&inst, &rule, true).unwrap(), CriterionStatus::Failed);
    }

    #[test]
    fn criteria_results_keep_order_and_score() {
        let inst = instrument((1..=30).map(f64::from));
        let criteria: Criteria = [
            criterion(RawFunctionSpec::new("CLOSE"), ComparisonOperator::GreaterThan, constant(10.0)),
            criterion(RawFunctionSpec::new("CLOSE"), ComparisonOperator::GreaterThan, constant(20.0)),
            criterion(RawFunctionSpec::new("CLOSE"), ComparisonOperator::Equals, constant(30.0)),
            criterion(RawFunctionSpec::new("CLOSE"), ComparisonOperator::LessThan, constant(5.0)),
        ]
        .into_iter()
        .collect();
        let evaluation = evaluate_criteria(&inst, &criteria, false).unwrap();
        assert_eq!(evaluation.len(), 4);
        assert_eq!(evaluation.passed(), 3);
        assert_eq!(evaluation.ranking_score(), Some(75));
        assert_eq!(evaluation.get("CLOSE < CONSTANT(value=5)"), Some(CriterionStatus::Failed));
        let map = evaluation.to_bool_map();
        assert_eq!(map[0], ("CLOSE > CONSTANT(value=10)".to_string(), true));
        assert!(!map[3].1);
    }

    #[test]
    fn identical_criteria_get_distinct_labels() {
        let inst = instrument((1..=30).map(f64::from));
        let first = criterion(RawFunctionSpec::new("CLOSE"), ComparisonOperator::GreaterThan, constant(10.0));
        let second = criterion(RawFunctionSpec::new("CLOSE"), ComparisonOperator::GreaterThan, constant(10.0));
        let third = criterion(RawFunctionSpec::new("CLOSE"), ComparisonOperator::LessThan, constant(10.0));
        let criteria: Criteria = [first, second.clone(), third].into_iter().collect();

        let evaluation = evaluate_criteria(&inst, &criteria, false).unwrap();
        let map = evaluation.to_bool_map();
        assert_eq!(map.len(), 3);
        assert_eq!(map[0].0, "CLOSE > CONSTANT(value=10)");
        let suffix = &second.id().simple().to_string()[..8];
        assert_eq!(map[1].0, format!("CLOSE > CONSTANT(value=10) #{suffix}"));
        assert_eq!(map[2].0, "CLOSE < CONSTANT(value=10)");

        let unique: HashSet<&String> = map.iter().map(|(label, _)| label).collect();
        assert_eq!(unique.len(), 3);
        assert_eq!(evaluation.ranking_score(), Some(67));
    }

    #[test]
    fn empty_criteria_has_no_score() {
        let inst = instrument([1.0, 2.0]);
        let evaluation = evaluate_criteria(&inst, &Criteria::new(), false).unwrap();
        assert!(evaluation.is_empty());
        assert_eq!(evaluation.ranking_score(), None);
    }
}
