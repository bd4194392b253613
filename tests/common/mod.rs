#![allow(dead_code)]

use chrono::NaiveDate;
use screener::domain::comparison::ComparisonOperator;
use screener::domain::criterion::{make_criterion, Criterion};
use screener::domain::error::ScreenerError;
use screener::domain::function_spec::RawFunctionSpec;
use screener::domain::instrument::Instrument;
pub use screener::domain::ohlcv::OhlcvBar;
use screener::ports::data_port::DataPort;
use screener::ports::stockset_port::StocksetPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    pub stocksets: HashMap<String, Vec<String>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            stocksets: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }

    pub fn with_stockset(mut self, name: &str, codes: &[&str]) -> Self {
        self.stocksets.insert(
            name.to_uppercase(),
            codes.iter().map(|c| c.to_string()).collect(),
        );
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        _exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenerError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(ScreenerError::Database {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self, _exchange: &str) -> Result<Vec<String>, ScreenerError> {
        let mut codes: Vec<String> = self.data.keys().cloned().collect();
        codes.sort();
        Ok(codes)
    }
}

impl StocksetPort for MockDataPort {
    fn named_stockset(&self, name: &str) -> Result<Option<Vec<String>>, ScreenerError> {
        Ok(self.stocksets.get(&name.to_uppercase()).cloned())
    }

    fn holdings(&self, _owner: &str, _id: &str) -> Result<Option<Vec<String>>, ScreenerError> {
        Ok(None)
    }

    fn list_stocksets(&self, _owner: Option<&str>) -> Vec<String> {
        self.stocksets.keys().cloned().collect()
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(code: &str, date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        code: code.to_string(),
        exchange: "ASX".to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000,
    }
}

/// Daily bars whose close moves by `step` each day.
pub fn generate_bars(
    code: &str,
    start_date: &str,
    count: usize,
    start_price: f64,
    step: f64,
) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| {
            let close = start_price + step * i as f64;
            OhlcvBar {
                code: code.to_string(),
                exchange: "ASX".to_string(),
                date: start + chrono::TimeDelta::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000 + i as i64,
            }
        })
        .collect()
}

pub fn instrument(code: &str, bars: Vec<OhlcvBar>) -> Instrument {
    Instrument::new(code.to_string(), "ASX".to_string(), bars)
}

pub fn spec(name: &str) -> RawFunctionSpec {
    RawFunctionSpec::new(name)
}

pub fn sma(period: i64) -> RawFunctionSpec {
    RawFunctionSpec::new("SMA").with_kwarg("timeperiod", period)
}

pub fn constant(value: f64) -> RawFunctionSpec {
    RawFunctionSpec::new("CONSTANT").with_kwarg("value", value)
}

pub fn criterion(func1: RawFunctionSpec, op: ComparisonOperator, func2: RawFunctionSpec) -> Criterion {
    make_criterion(&func1, &func2, op, None, false).unwrap()
}

pub fn golden_cross() -> Criterion {
    criterion(sma(5), ComparisonOperator::GreaterThan, sma(20))
}
