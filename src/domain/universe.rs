//! Stockset resolution.
//!
//! A stockset names a collection of instruments: a fixed list from
//! configuration (typically an index membership), one of a user's holding
//! lists, or every symbol the data source knows on the exchange.

use crate::domain::error::ScreenerError;
use crate::ports::data_port::DataPort;
use crate::ports::stockset_port::StocksetPort;
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};

const HOLDINGS_PREFIX: &str = "holdings:";
const ALL: &str = "ALL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stockset {
    Named(String),
    /// A holding list of the context's owner, by opaque id.
    Holdings(String),
    /// Every symbol on the context's exchange.
    All,
}

impl Stockset {
    /// `ALL`, `holdings:<id>`, or a named set.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.eq_ignore_ascii_case(ALL) {
            Stockset::All
        } else if let Some(id) = input.strip_prefix(HOLDINGS_PREFIX) {
            Stockset::Holdings(id.trim().to_string())
        } else {
            Stockset::Named(input.to_string())
        }
    }
}

impl fmt::Display for Stockset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stockset::Named(name) => f.write_str(name),
            Stockset::Holdings(id) => write!(f, "{HOLDINGS_PREFIX}{id}"),
            Stockset::All => f.write_str(ALL),
        }
    }
}

/// Who is asking and where: needed for holdings and for `ALL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StocksetContext {
    pub exchange: String,
    pub owner: Option<String>,
}

impl StocksetContext {
    pub fn new(exchange: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            owner: None,
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

/// Comma-separated codes, upper-cased, order kept.
pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

/// Codes in `stockset`, in stockset order.
///
/// A name nobody recognises resolves to an empty list. Only failures of the
/// underlying sources are errors.
pub fn resolve_stockset(
    stocksets: &dyn StocksetPort,
    data: &dyn DataPort,
    stockset: &Stockset,
    context: &StocksetContext,
) -> Result<Vec<String>, ScreenerError> {
    let codes = match stockset {
        Stockset::Named(name) => stocksets.named_stockset(name)?,
        Stockset::Holdings(id) => match &context.owner {
            Some(owner) => stocksets.holdings(owner, id)?,
            None => {
                warn!(stockset = %stockset, "holdings requested without an owner");
                None
            }
        },
        Stockset::All => Some(data.list_symbols(&context.exchange)?),
    };
    let codes = codes.unwrap_or_else(|| {
        warn!(stockset = %stockset, "unknown stockset; resolving to nothing");
        Vec::new()
    });
    info!(stockset = %stockset, exchange = %context.exchange, count = codes.len(), "resolved stockset");
    Ok(codes)
}
