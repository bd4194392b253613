//! Validated references to registry functions.

use crate::domain::kwargs::{Kwargs, RawKwargs};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A function reference as authored or persisted: a name plus raw kwargs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawFunctionSpec {
    pub name: String,
    #[serde(default)]
    pub kwargs: RawKwargs,
}

impl RawFunctionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kwargs: RawKwargs::new(),
        }
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }
}

/// A function name known to the registry plus its normalised kwargs.
///
/// Only the registry builds these, so holding one means the kwargs were
/// validated. The exception is a spec for an unsupported function created
/// under `ignore_unsupported_func`: it keeps the raw kwargs and fails at
/// evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSpec {
    name: String,
    kwargs: Kwargs,
    unsupported: Option<RawKwargs>,
}

impl FunctionSpec {
    pub(crate) fn new(name: impl Into<String>, kwargs: Kwargs) -> Self {
        Self {
            name: name.into(),
            kwargs,
            unsupported: None,
        }
    }

    pub(crate) fn unsupported(raw: &RawFunctionSpec) -> Self {
        Self {
            name: raw.name.clone(),
            kwargs: Kwargs::default(),
            unsupported: Some(raw.kwargs.clone()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kwargs(&self) -> &Kwargs {
        &self.kwargs
    }

    pub fn is_supported(&self) -> bool {
        self.unsupported.is_none()
    }

    pub fn to_raw(&self) -> RawFunctionSpec {
        RawFunctionSpec {
            name: self.name.clone(),
            kwargs: match &self.unsupported {
                Some(raw) => raw.clone(),
                None => self.kwargs.to_raw(),
            },
        }
    }
}

impl fmt::Display for FunctionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unsupported {
            None if self.kwargs.is_empty() => f.write_str(&self.name),
            None => write!(f, "{}({})", self.name, self.kwargs),
            Some(raw) if raw.is_empty() => f.write_str(&self.name),
            Some(raw) => {
                let parts: Vec<String> = raw.iter().map(|(k, v)| format!("{k}={v}")).collect();
                write!(f, "{}({})", self.name, parts.join(", "))
            }
        }
    }
}
