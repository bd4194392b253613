//! Keyword-argument schemas for registry functions.
//!
//! Every function that takes parameters declares a [`KwargsSchema`]: an
//! ordered list of typed fields with optional defaults. Raw JSON-ish input
//! is validated against it into normalised [`Kwargs`], in which every field
//! is present (defaults filled in) and every value has its declared type.

use crate::domain::error::{KwargError, KwargProblem, ScreenerError};
use crate::domain::ta::{MaType, TaError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kwargs as received from a caller, before validation.
pub type RawKwargs = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KwargValue {
    Int(i64),
    Float(f64),
}

impl KwargValue {
    pub fn as_f64(self) -> f64 {
        match self {
            KwargValue::Int(v) => v as f64,
            KwargValue::Float(v) => v,
        }
    }

    fn to_json(self) -> serde_json::Value {
        match self {
            KwargValue::Int(v) => serde_json::Value::from(v),
            KwargValue::Float(v) => serde_json::Value::from(v),
        }
    }
}

impl fmt::Display for KwargValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KwargValue::Int(v) => write!(f, "{v}"),
            KwargValue::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Validated, normalised kwargs. Keys are kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kwargs(BTreeMap<String, KwargValue>);

impl Kwargs {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, name: &str) -> Option<KwargValue> {
        self.0.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, KwargValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Non-negative integer parameter, e.g. a period.
    pub fn period(&self, name: &'static str) -> Result<usize, TaError> {
        match self.get(name) {
            Some(KwargValue::Int(v)) if v >= 0 => Ok(v as usize),
            Some(other) => Err(TaError::InvalidParameter {
                name,
                reason: format!("must be a non-negative integer, got {other}"),
            }),
            None => Err(missing(name)),
        }
    }

    pub fn float(&self, name: &'static str) -> Result<f64, TaError> {
        self.get(name).map(KwargValue::as_f64).ok_or_else(|| missing(name))
    }

    pub fn ma_type(&self, name: &'static str) -> Result<MaType, TaError> {
        match self.get(name) {
            Some(KwargValue::Int(code)) => {
                MaType::from_code(code).ok_or_else(|| TaError::InvalidParameter {
                    name,
                    reason: format!("unknown moving average type {code}"),
                })
            }
            Some(other) => Err(TaError::InvalidParameter {
                name,
                reason: format!("unknown moving average type {other}"),
            }),
            None => Err(missing(name)),
        }
    }

    /// Back to the raw representation used for persistence.
    pub fn to_raw(&self) -> RawKwargs {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}

fn missing(name: &'static str) -> TaError {
    TaError::InvalidParameter {
        name,
        reason: "not supplied".into(),
    }
}

impl fmt::Display for Kwargs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}={v}")).collect();
        f.write_str(&parts.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Float,
    MaType,
}

impl FieldKind {
    pub fn type_name(self) -> &'static str {
        match self {
            FieldKind::Int => "integer",
            FieldKind::Float => "float",
            FieldKind::MaType => "ma_type",
        }
    }

    /// Hint for rule-authoring forms.
    pub fn input_type(self) -> &'static str {
        match self {
            FieldKind::Int | FieldKind::Float => "number",
            FieldKind::MaType => "select",
        }
    }

    fn coerce(self, value: &serde_json::Value) -> Option<KwargValue> {
        use serde_json::Value;
        match (self, value) {
            (FieldKind::Int, _) => coerce_int(value).map(KwargValue::Int),
            (FieldKind::Float, Value::Number(n)) => n.as_f64().map(KwargValue::Float),
            (FieldKind::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(KwargValue::Float),
            (FieldKind::Float, _) => None,
            (FieldKind::MaType, Value::String(s)) => MaType::from_label(s)
                .or_else(|| s.trim().parse::<i64>().ok().and_then(MaType::from_code))
                .map(|m| KwargValue::Int(m.code())),
            (FieldKind::MaType, _) => coerce_int(value)
                .and_then(MaType::from_code)
                .map(|m| KwargValue::Int(m.code())),
        }
    }
}

/// Integers, integral floats and numeric strings.
fn coerce_int(value: &serde_json::Value) -> Option<i64> {
    let integral = |f: f64| (f.is_finite() && f.fract() == 0.0).then_some(f as i64);
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

/// One declared keyword argument. A field without a default is required.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: Option<KwargValue>,
}

impl FieldSpec {
    pub fn int(name: &'static str, default: i64) -> Self {
        Self {
            name,
            kind: FieldKind::Int,
            default: Some(KwargValue::Int(default)),
        }
    }

    pub fn float(name: &'static str, default: f64) -> Self {
        Self {
            name,
            kind: FieldKind::Float,
            default: Some(KwargValue::Float(default)),
        }
    }

    pub fn ma_type(name: &'static str, default: MaType) -> Self {
        Self {
            name,
            kind: FieldKind::MaType,
            default: Some(KwargValue::Int(default.code())),
        }
    }

    pub fn required_float(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Float,
            default: None,
        }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// UI/API-facing description of one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub type_name: &'static str,
    pub input_type: &'static str,
    pub default: Option<serde_json::Value>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<&'static str>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KwargsSchema {
    fields: Vec<FieldSpec>,
}

impl KwargsSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        let mut schema = Self::default();
        for field in fields {
            schema.insert(field);
        }
        schema
    }

    fn insert(&mut self, field: FieldSpec) {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Field union; on a name collision `other`'s field wins.
    pub fn merge(&self, other: &KwargsSchema) -> KwargsSchema {
        let mut merged = self.clone();
        for field in &other.fields {
            merged.insert(field.clone());
        }
        merged
    }

    /// Validates `raw`, reporting every offending field at once.
    pub fn validate(&self, function: &str, raw: &RawKwargs) -> Result<Kwargs, ScreenerError> {
        let mut errors = Vec::new();
        for key in raw.keys() {
            if !self.fields.iter().any(|f| f.name == key) {
                errors.push(KwargError {
                    field: key.clone(),
                    problem: KwargProblem::Unknown,
                });
            }
        }

        let mut values = BTreeMap::new();
        for field in &self.fields {
            match raw.get(field.name) {
                Some(value) => match field.kind.coerce(value) {
                    Some(coerced) => {
                        values.insert(field.name.to_string(), coerced);
                    }
                    None => errors.push(KwargError {
                        field: field.name.to_string(),
                        problem: KwargProblem::Type {
                            expected: field.kind.type_name(),
                            found: value.to_string(),
                        },
                    }),
                },
                None => match field.default {
                    Some(default) => {
                        values.insert(field.name.to_string(), default);
                    }
                    None => errors.push(KwargError {
                        field: field.name.to_string(),
                        problem: KwargProblem::Missing,
                    }),
                },
            }
        }

        if errors.is_empty() {
            Ok(Kwargs(values))
        } else {
            Err(ScreenerError::InvalidKwargs {
                function: function.to_string(),
                errors,
            })
        }
    }

    pub fn descriptor(&self) -> Vec<FieldDescriptor> {
        self.fields
            .iter()
            .map(|field| FieldDescriptor {
                name: field.name,
                type_name: field.kind.type_name(),
                input_type: field.kind.input_type(),
                default: field.default.map(|d| match (field.kind, d) {
                    (FieldKind::MaType, KwargValue::Int(code)) => MaType::from_code(code)
                        .map(|m| serde_json::Value::from(m.label()))
                        .unwrap_or_else(|| d.to_json()),
                    _ => d.to_json(),
                }),
                required: field.is_required(),
                options: (field.kind == FieldKind::MaType)
                    .then(|| MaType::ALL.iter().map(|m| m.label()).collect()),
            })
            .collect()
    }
}
