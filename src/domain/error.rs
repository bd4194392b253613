//! Domain error types.

use std::fmt;

/// A single offending keyword argument found while validating kwargs.
#[derive(Debug, Clone, PartialEq)]
pub struct KwargError {
    pub field: String,
    pub problem: KwargProblem,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KwargProblem {
    Unknown,
    Missing,
    Type {
        expected: &'static str,
        found: String,
    },
}

impl fmt::Display for KwargError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            KwargProblem::Unknown => write!(f, "{}: unknown argument", self.field),
            KwargProblem::Missing => write!(f, "{}: required argument missing", self.field),
            KwargProblem::Type { expected, found } => {
                write!(f, "{}: expected {}, found {}", self.field, expected, found)
            }
        }
    }
}

fn join_kwarg_errors(errors: &[KwargError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Top-level error type for screener.
#[derive(Debug, thiserror::Error)]
pub enum ScreenerError {
    #[error("unsupported function: {name}")]
    UnsupportedFunction { name: String },

    #[error("invalid function spec for {function}: {reason}")]
    FunctionSpecValidation { function: String, reason: String },

    #[error("invalid kwargs for {function}: {}", join_kwarg_errors(.errors))]
    InvalidKwargs {
        function: String,
        errors: Vec<KwargError>,
    },

    #[error("no comparison executor registered for operator {operator}")]
    ComparisonExecutorNotFound { operator: String },

    #[error("evaluation of {function} failed: {reason}")]
    FunctionEvaluation { function: String, reason: String },

    #[error("invalid criteria: {reason}")]
    InvalidCriteria { reason: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {code} on {exchange}")]
    NoData { code: String, exchange: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScreenerError {
    /// True for errors raised while authoring rules (bad names, bad kwargs).
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            ScreenerError::UnsupportedFunction { .. }
                | ScreenerError::FunctionSpecValidation { .. }
                | ScreenerError::InvalidKwargs { .. }
                | ScreenerError::InvalidCriteria { .. }
        )
    }
}

impl From<&ScreenerError> for std::process::ExitCode {
    fn from(err: &ScreenerError) -> Self {
        let code: u8 = match err {
            ScreenerError::Io(_) | ScreenerError::Json(_) => 1,
            ScreenerError::ConfigParse { .. }
            | ScreenerError::ConfigMissing { .. }
            | ScreenerError::ConfigInvalid { .. } => 2,
            ScreenerError::Database { .. } | ScreenerError::DatabaseQuery { .. } => 3,
            ScreenerError::UnsupportedFunction { .. }
            | ScreenerError::FunctionSpecValidation { .. }
            | ScreenerError::InvalidKwargs { .. }
            | ScreenerError::InvalidCriteria { .. }
            | ScreenerError::ComparisonExecutorNotFound { .. } => 4,
            ScreenerError::NoData { .. } | ScreenerError::FunctionEvaluation { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
