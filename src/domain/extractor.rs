//! Argument extractors: pull dense numeric series off an instrument.
//!
//! Extractors only borrow the instrument and keep no state, so one instrument
//! can be read by several evaluators, and different instruments by several
//! workers, at the same time.

use crate::domain::error::ScreenerError;
use crate::domain::instrument::Instrument;
use crate::domain::ohlcv::PriceField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    Open,
    High,
    Low,
    Close,
    Volume,
    /// Close of the instrument's benchmark, aligned to the instrument's dates.
    IndexClose,
}

impl Extractor {
    /// Extracts the series, limited to the trailing `window` observations
    /// when given.
    pub fn extract(self, instrument: &Instrument, window: Option<usize>) -> Result<Vec<f64>, ScreenerError> {
        let series = match self {
            Extractor::Open => instrument.series(PriceField::Open, window),
            Extractor::High => instrument.series(PriceField::High, window),
            Extractor::Low => instrument.series(PriceField::Low, window),
            Extractor::Close => instrument.series(PriceField::Close, window),
            Extractor::Volume => instrument.series(PriceField::Volume, window),
            Extractor::IndexClose => instrument
                .benchmark_closes(window)
                .ok_or_else(|| no_data(instrument))?,
        };
        if series.is_empty() || series.iter().any(|v| !v.is_finite()) {
            return Err(no_data(instrument));
        }
        Ok(series)
    }
}

fn no_data(instrument: &Instrument) -> ScreenerError {
    ScreenerError::NoData {
        code: instrument.code.clone(),
        exchange: instrument.exchange.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn instrument(code: &str, closes: &[f64]) -> Instrument {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                code: code.into(),
                exchange: "ASX".into(),
                date: start + chrono::Duration::days(i as i64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 100 * (i as i64 + 1),
            })
            .collect();
        Instrument::new(code.into(), "ASX".into(), bars)
    }

    #[test]
    fn extracts_windowed_columns() {
        let inst = instrument("BHP", &[10.0, 11.0, 12.0]);
        assert_eq!(Extractor::Close.extract(&inst, None).unwrap(), vec![10.0, 11.0, 12.0]);
        assert_eq!(Extractor::Close.extract(&inst, Some(2)).unwrap(), vec![11.0, 12.0]);
        assert_eq!(Extractor::Volume.extract(&inst, Some(1)).unwrap(), vec![300.0]);
        assert_eq!(Extractor::Open.extract(&inst, Some(1)).unwrap(), vec![11.5]);
    }

    #[test]
    fn index_close_requires_benchmark() {
        let inst = instrument("BHP", &[10.0, 11.0]);
        assert!(matches!(
            Extractor::IndexClose.extract(&inst, None),
            Err(ScreenerError::NoData { .. })
        ));
        let inst = inst.with_benchmark(Arc::new(instrument("XJO", &[7000.0, 7100.0])));
        assert_eq!(
            Extractor::IndexClose.extract(&inst, None).unwrap(),
            vec![7000.0, 7100.0]
        );
    }

    #[test]
    fn empty_history_is_no_data() {
        let inst = Instrument::new("NEW".into(), "ASX".into(), vec![]);
        assert!(Extractor::Close.extract(&inst, None).is_err());
    }
}
