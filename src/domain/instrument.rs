//! Per-instrument OHLCV history with the lookups the engine needs.
//!
//! An `Instrument` is read-only once built: extractors and the profiler only
//! borrow it, so the same instrument can be evaluated from several worker
//! threads at once.

use crate::domain::ohlcv::{OhlcvBar, PriceField};
use chrono::NaiveDate;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Instrument {
    pub code: String,
    pub exchange: String,
    ohlcv: Vec<OhlcvBar>,
    benchmark: Option<Arc<Instrument>>,
}

impl Instrument {
    /// Builds an instrument, ordering the bars by date.
    pub fn new(code: String, exchange: String, mut ohlcv: Vec<OhlcvBar>) -> Self {
        ohlcv.sort_by_key(|bar| bar.date);
        Self {
            code,
            exchange,
            ohlcv,
            benchmark: None,
        }
    }

    /// Attaches the reference index used by cross-instrument functions.
    pub fn with_benchmark(mut self, benchmark: Arc<Instrument>) -> Self {
        self.benchmark = Some(benchmark);
        self
    }

    pub fn benchmark(&self) -> Option<&Instrument> {
        self.benchmark.as_deref()
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.ohlcv
    }

    pub fn bar_count(&self) -> usize {
        self.ohlcv.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ohlcv.is_empty()
    }

    pub fn latest(&self) -> Option<&OhlcvBar> {
        self.ohlcv.last()
    }

    /// One OHLCV column, optionally limited to the trailing `window` observations.
    pub fn series(&self, field: PriceField, window: Option<usize>) -> Vec<f64> {
        let start = match window {
            Some(n) => self.ohlcv.len().saturating_sub(n),
            None => 0,
        };
        self.ohlcv[start..].iter().map(|bar| bar.field(field)).collect()
    }

    /// Close on `date`, or the nearest close within `tolerance_days`.
    ///
    /// Takes the nearest earlier bar unless `forward` is set, in which case
    /// it takes the nearest later one instead.
    pub fn price_on_date(&self, date: NaiveDate, tolerance_days: u32, forward: bool) -> Option<f64> {
        let bar = if forward {
            let i = self.ohlcv.partition_point(|bar| bar.date < date);
            self.ohlcv.get(i)?
        } else {
            let i = self.ohlcv.partition_point(|bar| bar.date <= date);
            self.ohlcv.get(i.checked_sub(1)?)?
        };
        let distance = bar.date.signed_duration_since(date).num_days().abs();
        (distance <= i64::from(tolerance_days)).then_some(bar.close)
    }

    /// Benchmark closes aligned to this instrument's dates.
    ///
    /// Dates the benchmark did not trade carry its previous close forward;
    /// dates before the benchmark's first bar take its first close.
    pub fn benchmark_closes(&self, window: Option<usize>) -> Option<Vec<f64>> {
        let benchmark = self.benchmark()?;
        let first = benchmark.ohlcv.first()?.close;
        let mut cursor = 0;
        let mut last = first;
        let mut aligned = Vec::with_capacity(self.ohlcv.len());
        for bar in &self.ohlcv {
            while cursor < benchmark.ohlcv.len() && benchmark.ohlcv[cursor].date <= bar.date {
                last = benchmark.ohlcv[cursor].close;
                cursor += 1;
            }
            aligned.push(last);
        }
        let start = match window {
            Some(n) => aligned.len().saturating_sub(n),
            None => 0,
        };
        Some(aligned.split_off(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bar(code: &str, date: &str, close: f64) -> OhlcvBar {
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

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> Instrument {
        Instrument::new(
            "BHP".into(),
            "ASX".into(),
            vec![
                make_bar("BHP", "2024-01-03", 102.0),
                make_bar("BHP", "2024-01-01", 100.0),
                make_bar("BHP", "2024-01-02", 101.0),
                make_bar("BHP", "2024-01-08", 108.0),
            ],
        )
    }

    #[test]
    fn new_orders_bars_by_date() {
        let inst = sample();
        let dates: Vec<NaiveDate> = inst.bars().iter().map(|b| b.date).collect();
        assert_eq!(
            dates,
            vec![
                day("2024-01-01"),
                day("2024-01-02"),
                day("2024-01-03"),
                day("2024-01-08")
            ]
        );
        assert_eq!(inst.latest().unwrap().close, 108.0);
    }

    #[test]
    fn series_full_and_windowed() {
        let inst = sample();
        assert_eq!(
            inst.series(PriceField::Close, None),
            vec![100.0, 101.0, 102.0, 108.0]
        );
        assert_eq!(inst.series(PriceField::Close, Some(2)), vec![102.0, 108.0]);
        assert_eq!(inst.series(PriceField::Close, Some(10)).len(), 4);
        assert_eq!(inst.series(PriceField::High, Some(1)), vec![109.0]);
    }

    #[test]
    fn price_on_exact_date() {
        let inst = sample();
        assert_eq!(inst.price_on_date(day("2024-01-02"), 5, false), Some(101.0));
    }

    #[test]
    fn price_on_missing_date_walks_backward() {
        let inst = sample();
        // 2024-01-06 missing, closest prior is 2024-01-03
        assert_eq!(inst.price_on_date(day("2024-01-06"), 5, false), Some(102.0));
    }

    #[test]
    fn price_on_missing_date_walks_forward() {
        let inst = sample();
        assert_eq!(inst.price_on_date(day("2024-01-06"), 5, true), Some(108.0));
    }

    #[test]
    fn price_outside_tolerance_is_none() {
        let inst = sample();
        assert_eq!(inst.price_on_date(day("2024-01-20"), 5, false), None);
        assert_eq!(inst.price_on_date(day("2024-01-06"), 2, false), None);
    }

    #[test]
    fn price_lookup_near_calendar_limits() {
        let edge = Instrument::new(
            "EDGE".into(),
            "ASX".into(),
            vec![OhlcvBar {
                date: NaiveDate::MAX,
                ..make_bar("EDGE", "2024-01-01", 50.0)
            }],
        );
        assert_eq!(edge.price_on_date(NaiveDate::MAX, u32::MAX, true), Some(50.0));
        assert_eq!(edge.price_on_date(NaiveDate::MIN, u32::MAX, false), None);
        assert_eq!(sample().price_on_date(NaiveDate::MAX, u32::MAX, false), Some(108.0));
        assert_eq!(sample().price_on_date(NaiveDate::MIN, u32::MAX, true), Some(100.0));
        assert_eq!(sample().price_on_date(NaiveDate::MIN, 5, true), None);
    }

    #[test]
    fn benchmark_closes_forward_fill() {
        let index = Instrument::new(
            "XJO".into(),
            "ASX".into(),
            vec![
                make_bar("XJO", "2024-01-02", 7000.0),
                make_bar("XJO", "2024-01-03", 7010.0),
            ],
        );
        let inst = sample().with_benchmark(Arc::new(index));
        assert_eq!(
            inst.benchmark_closes(None).unwrap(),
            vec![7000.0, 7000.0, 7010.0, 7010.0]
        );
        assert_eq!(inst.benchmark_closes(Some(1)).unwrap(), vec![7010.0]);
    }

    #[test]
    fn benchmark_closes_none_without_benchmark() {
        assert!(sample().benchmark_closes(None).is_none());
    }
}
