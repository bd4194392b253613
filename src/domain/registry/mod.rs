//! Function registry: the process-wide table of evaluable functions.
//!
//! Built once from the static [`catalog`] and read-only afterwards, so any
//! number of workers can look functions up without locking.

pub mod catalog;
pub mod evaluator;
pub mod schemas;

use crate::domain::error::ScreenerError;
use crate::domain::function_spec::{FunctionSpec, RawFunctionSpec};
use crate::domain::instrument::Instrument;
use crate::domain::kwargs::{FieldDescriptor, Kwargs, KwargsSchema, RawKwargs};
use evaluator::Evaluator;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FunctionGroup {
    #[serde(rename = "Price")]
    Price,
    #[serde(rename = "Price Transform")]
    PriceTransform,
    #[serde(rename = "Overlap Studies")]
    OverlapStudies,
    #[serde(rename = "Momentum Indicators")]
    MomentumIndicators,
    #[serde(rename = "Volume Indicators")]
    VolumeIndicators,
    #[serde(rename = "Volatility Indicators")]
    VolatilityIndicators,
    #[serde(rename = "Math Operators")]
    MathOperators,
    #[serde(rename = "Math Transform")]
    MathTransform,
    #[serde(rename = "Statistic Functions")]
    StatisticFunctions,
    #[serde(rename = "Pattern Recognition")]
    PatternRecognition,
}

impl FunctionGroup {
    pub fn label(self) -> &'static str {
        match self {
            FunctionGroup::Price => "Price",
            FunctionGroup::PriceTransform => "Price Transform",
            FunctionGroup::OverlapStudies => "Overlap Studies",
            FunctionGroup::MomentumIndicators => "Momentum Indicators",
            FunctionGroup::VolumeIndicators => "Volume Indicators",
            FunctionGroup::VolatilityIndicators => "Volatility Indicators",
            FunctionGroup::MathOperators => "Math Operators",
            FunctionGroup::MathTransform => "Math Transform",
            FunctionGroup::StatisticFunctions => "Statistic Functions",
            FunctionGroup::PatternRecognition => "Pattern Recognition",
        }
    }
}

impl fmt::Display for FunctionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug)]
pub struct FunctionEntry {
    pub name: &'static str,
    pub aliases: Vec<&'static str>,
    pub description: &'static str,
    pub group: FunctionGroup,
    /// `None` for functions that take no kwargs at all.
    pub schema: Option<KwargsSchema>,
    pub evaluator: Evaluator,
}

impl FunctionEntry {
    pub fn new(
        name: &'static str,
        group: FunctionGroup,
        description: &'static str,
        schema: Option<KwargsSchema>,
        evaluator: Evaluator,
    ) -> Self {
        Self {
            name,
            aliases: Vec::new(),
            description,
            group,
            schema,
            evaluator,
        }
    }

    pub fn alias(mut self, alias: &'static str) -> Self {
        self.aliases.push(alias);
        self
    }

    pub fn schema_descriptor(&self) -> FunctionSchema {
        FunctionSchema {
            name: self.name,
            description: self.description,
            group: self.group,
            aliases: self.aliases.clone(),
            kwargs: self
                .schema
                .as_ref()
                .map(KwargsSchema::descriptor)
                .unwrap_or_default(),
        }
    }
}

/// Catalog entry as exposed to rule-authoring clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub group: FunctionGroup,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<&'static str>,
    pub kwargs: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FunctionsSchema {
    Flat(Vec<FunctionSchema>),
    Grouped(BTreeMap<FunctionGroup, Vec<FunctionSchema>>),
}

#[derive(Debug)]
pub struct FunctionRegistry {
    entries: Vec<FunctionEntry>,
    index: HashMap<String, usize>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry {
    /// A fresh registry holding the full catalog.
    pub fn new() -> Self {
        Self::from_entries(catalog::catalog())
    }

    pub fn from_entries(entries: Vec<FunctionEntry>) -> Self {
        let mut index = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            index.insert(entry.name.to_ascii_uppercase(), i);
            for alias in &entry.aliases {
                index.insert(alias.to_ascii_uppercase(), i);
            }
        }
        Self { entries, index }
    }

    /// The shared process-wide registry, built on first use.
    pub fn global() -> &'static FunctionRegistry {
        static REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();
        REGISTRY.get_or_init(FunctionRegistry::new)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive lookup by canonical name or alias.
    pub fn get(&self, name: &str) -> Option<&FunctionEntry> {
        self.index
            .get(&name.trim().to_ascii_uppercase())
            .map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn entries(&self) -> impl Iterator<Item = &FunctionEntry> {
        self.entries.iter()
    }

    /// Validates `kwargs` against the function's schema and returns a spec
    /// under the canonical name.
    pub fn make_function_spec(&self, name: &str, kwargs: &RawKwargs) -> Result<FunctionSpec, ScreenerError> {
        let entry = self
            .get(name)
            .ok_or_else(|| ScreenerError::UnsupportedFunction {
                name: name.to_string(),
            })?;
        let normalised = match &entry.schema {
            Some(schema) => schema.validate(entry.name, kwargs)?,
            None if kwargs.is_empty() => Kwargs::default(),
            None => {
                let keys: Vec<&str> = kwargs.keys().map(String::as_str).collect();
                return Err(ScreenerError::FunctionSpecValidation {
                    function: entry.name.to_string(),
                    reason: format!("takes no arguments, got {}", keys.join(", ")),
                });
            }
        };
        Ok(FunctionSpec::new(entry.name, normalised))
    }

    pub fn make_raw_spec(&self, raw: &RawFunctionSpec) -> Result<FunctionSpec, ScreenerError> {
        self.make_function_spec(&raw.name, &raw.kwargs)
    }

    /// Evaluates `spec` against `instrument`.
    pub fn evaluate(&self, spec: &FunctionSpec, instrument: &Instrument) -> Result<f64, ScreenerError> {
        let entry = self
            .get(spec.name())
            .filter(|_| spec.is_supported())
            .ok_or_else(|| ScreenerError::UnsupportedFunction {
                name: spec.name().to_string(),
            })?;
        entry.evaluator.evaluate(entry.name, instrument, spec.kwargs())
    }

    pub fn generate_function_schema(&self, name: &str) -> Result<FunctionSchema, ScreenerError> {
        self.get(name)
            .map(FunctionEntry::schema_descriptor)
            .ok_or_else(|| ScreenerError::UnsupportedFunction {
                name: name.to_string(),
            })
    }

    pub fn generate_functions_schema(&self, grouped: bool) -> FunctionsSchema {
        let all = self.entries.iter().map(FunctionEntry::schema_descriptor);
        if grouped {
            let mut groups: BTreeMap<FunctionGroup, Vec<FunctionSchema>> = BTreeMap::new();
            for schema in all {
                groups.entry(schema.group).or_default().push(schema);
            }
            FunctionsSchema::Grouped(groups)
        } else {
            FunctionsSchema::Flat(all.collect())
        }
    }
}

/// [`FunctionRegistry::make_function_spec`] on the global registry.
pub fn make_function_spec(name: &str, kwargs: &RawKwargs) -> Result<FunctionSpec, ScreenerError> {
    FunctionRegistry::global().make_function_spec(name, kwargs)
}
