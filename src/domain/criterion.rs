//! A single screening rule: two function specs joined by an operator.

use crate::domain::comparison::ComparisonOperator;
use crate::domain::error::ScreenerError;
use crate::domain::function_spec::{FunctionSpec, RawFunctionSpec};
use crate::domain::registry::FunctionRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::warn;
use uuid::Uuid;

/// Outcome of one criterion. The integer form lets scores be summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CriterionStatus {
    Passed = 1,
    Failed = 0,
}

impl CriterionStatus {
    pub fn value(self) -> u32 {
        self as u32
    }

    pub fn is_passed(self) -> bool {
        self == CriterionStatus::Passed
    }
}

impl From<bool> for CriterionStatus {
    fn from(passed: bool) -> Self {
        if passed {
            CriterionStatus::Passed
        } else {
            CriterionStatus::Failed
        }
    }
}

impl fmt::Display for CriterionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CriterionStatus::Passed => "passed",
            CriterionStatus::Failed => "failed",
        })
    }
}

/// Immutable rule. Equality and hashing go by `id` alone.
#[derive(Debug, Clone)]
pub struct Criterion {
    id: Uuid,
    func1: FunctionSpec,
    func2: FunctionSpec,
    op: ComparisonOperator,
}

impl Criterion {
    /// Builds a criterion from specs the registry has already produced.
    pub fn new(func1: FunctionSpec, func2: FunctionSpec, op: ComparisonOperator) -> Self {
        Self::with_id(Uuid::new_v4(), func1, func2, op)
    }

    pub fn with_id(id: Uuid, func1: FunctionSpec, func2: FunctionSpec, op: ComparisonOperator) -> Self {
        Self { id, func1, func2, op }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn func1(&self) -> &FunctionSpec {
        &self.func1
    }

    pub fn func2(&self) -> &FunctionSpec {
        &self.func2
    }

    pub fn op(&self) -> ComparisonOperator {
        self.op
    }

    /// True when both sides name functions the registry knows.
    pub fn is_supported(&self) -> bool {
        self.func1.is_supported() && self.func2.is_supported()
    }

    /// Same id, same functions, same operator.
    pub fn same_contents(&self, other: &Criterion) -> bool {
        self.id == other.id && self.func1 == other.func1 && self.func2 == other.func2 && self.op == other.op
    }

    pub fn to_record(&self) -> CriterionRecord {
        CriterionRecord {
            id: Some(self.id.to_string()),
            func1: self.func1.to_raw(),
            func2: self.func2.to_raw(),
            op: self.op.symbol().to_string(),
        }
    }

    pub fn from_record(record: &CriterionRecord, ignore_unsupported_func: bool) -> Result<Self, ScreenerError> {
        let id = match record.id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(Uuid::parse_str(raw).map_err(|e| ScreenerError::InvalidCriteria {
                reason: format!("invalid criterion id {raw:?}: {e}"),
            })?),
        };
        let op: ComparisonOperator = record.op.parse()?;
        make_criterion(&record.func1, &record.func2, op, id, ignore_unsupported_func)
    }
}

impl PartialEq for Criterion {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Criterion {}

impl Hash for Criterion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.func1, self.op, self.func2)
    }
}

/// Persistence form: `{id, func1: {name, kwargs}, func2: {name, kwargs}, op}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub func1: RawFunctionSpec,
    pub func2: RawFunctionSpec,
    pub op: String,
}

fn build_spec(
    registry: &FunctionRegistry,
    raw: &RawFunctionSpec,
    ignore_unsupported_func: bool,
) -> Result<FunctionSpec, ScreenerError> {
    match registry.make_raw_spec(raw) {
        Err(ScreenerError::UnsupportedFunction { name }) if ignore_unsupported_func => {
            warn!(function = %name, "unsupported function tolerated; criterion will fail");
            Ok(FunctionSpec::unsupported(raw))
        }
        other => other,
    }
}

/// Validates both sides through the global registry and builds a criterion.
///
/// With `ignore_unsupported_func`, an unknown function name still yields a
/// criterion; it evaluates as failed. Invalid kwargs are always an error.
pub fn make_criterion(
    func1: &RawFunctionSpec,
    func2: &RawFunctionSpec,
    op: ComparisonOperator,
    id: Option<Uuid>,
    ignore_unsupported_func: bool,
) -> Result<Criterion, ScreenerError> {
    let registry = FunctionRegistry::global();
    let func1 = build_spec(registry, func1, ignore_unsupported_func)?;
    let func2 = build_spec(registry, func2, ignore_unsupported_func)?;
    Ok(Criterion::with_id(id.unwrap_or_else(Uuid::new_v4), func1, func2, op))
}

/// Changes to apply to an existing criterion.
#[derive(Debug, Clone)]
pub struct CriterionUpdate {
    func1: Option<RawFunctionSpec>,
    func2: Option<RawFunctionSpec>,
    op: Option<ComparisonOperator>,
    id: Option<Uuid>,
    ignore_unsupported_func: bool,
}

impl Default for CriterionUpdate {
    fn default() -> Self {
        Self {
            func1: None,
            func2: None,
            op: None,
            id: None,
            ignore_unsupported_func: true,
        }
    }
}

impl CriterionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn func1(mut self, spec: RawFunctionSpec) -> Self {
        self.func1 = Some(spec);
        self
    }

    pub fn func2(mut self, spec: RawFunctionSpec) -> Self {
        self.func2 = Some(spec);
        self
    }

    pub fn op(mut self, op: ComparisonOperator) -> Self {
        self.op = Some(op);
        self
    }

    /// Keep this id instead of generating a fresh one.
    pub fn pin_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn ignore_unsupported_func(mut self, ignore: bool) -> Self {
        self.ignore_unsupported_func = ignore;
        self
    }
}

/// A new criterion with `update` merged over `criterion`.
///
/// Unchanged sides are re-validated too. The id is regenerated unless the
/// update pins one.
pub fn update_criterion(criterion: &Criterion, update: CriterionUpdate) -> Result<Criterion, ScreenerError> {
    let func1 = update.func1.unwrap_or_else(|| criterion.func1.to_raw());
    let func2 = update.func2.unwrap_or_else(|| criterion.func2.to_raw());
    let op = update.op.unwrap_or(criterion.op);
    make_criterion(&func1, &func2, op, update.id, update.ignore_unsupported_func)
}
