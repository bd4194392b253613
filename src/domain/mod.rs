//! Core domain types and logic.

pub mod ohlcv;
pub mod instrument;
pub mod ta;
pub mod kwargs;
pub mod function_spec;
pub mod extractor;
pub mod registry;
pub mod comparison;
pub mod criterion;
pub mod criteria;
pub mod rule_eval;
pub mod universe;
pub mod profile;
pub mod config_validation;
pub mod error;
