//! Evaluators: turn an instrument plus kwargs into one comparable number.

use crate::domain::error::ScreenerError;
use crate::domain::extractor::Extractor;
use crate::domain::instrument::Instrument;
use crate::domain::kwargs::Kwargs;
use crate::domain::ohlcv::PriceField;
use crate::domain::ta::candles::{self, Pattern};
use crate::domain::ta::{self, TaError};
use std::fmt;

/// Numeric computation over the extracted inputs, in extractor order.
pub type Compute = fn(&[Vec<f64>], &Kwargs) -> Result<Vec<f64>, TaError>;

/// Reduces a computed series to the value that gets compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultHandler {
    /// Most recent value; it must be finite.
    Latest,
    /// Most recent value rounded to an integer (index-returning operators).
    LatestInt,
}

impl ResultHandler {
    fn apply(self, series: &[f64]) -> Result<f64, TaError> {
        let value = ta::latest(series)?;
        Ok(match self {
            ResultHandler::Latest => value,
            ResultHandler::LatestInt => value.round(),
        })
    }
}

pub enum Evaluator {
    /// One field of the latest bar.
    LatestBar(PriceField),
    /// The `value` kwarg.
    Constant,
    /// Latest close of the benchmark instrument.
    IndexClose,
    /// Extract inputs, compute, reduce.
    Generic {
        inputs: &'static [Extractor],
        compute: Compute,
        handler: ResultHandler,
        /// Trim inputs to the trailing `timeperiod` observations.
        windowed: bool,
    },
    Pattern(Pattern),
}

impl Evaluator {
    pub fn generic(inputs: &'static [Extractor], compute: Compute) -> Self {
        Evaluator::Generic {
            inputs,
            compute,
            handler: ResultHandler::Latest,
            windowed: false,
        }
    }

    pub fn windowed(inputs: &'static [Extractor], compute: Compute) -> Self {
        Evaluator::Generic {
            inputs,
            compute,
            handler: ResultHandler::Latest,
            windowed: true,
        }
    }

    pub fn with_handler(self, handler: ResultHandler) -> Self {
        match self {
            Evaluator::Generic {
                inputs,
                compute,
                windowed,
                ..
            } => Evaluator::Generic {
                inputs,
                compute,
                handler,
                windowed,
            },
            other => other,
        }
    }

    /// Evaluates `function` against `instrument`. Every failure comes back
    /// as `FunctionEvaluation` or `NoData`; nothing panics on bad data.
    pub fn evaluate(&self, function: &str, instrument: &Instrument, kwargs: &Kwargs) -> Result<f64, ScreenerError> {
        let failed = |err: TaError| ScreenerError::FunctionEvaluation {
            function: function.to_string(),
            reason: err.to_string(),
        };
        match self {
            Evaluator::LatestBar(field) => instrument
                .latest()
                .map(|bar| bar.field(*field))
                .ok_or_else(|| ScreenerError::NoData {
                    code: instrument.code.clone(),
                    exchange: instrument.exchange.clone(),
                }),
            Evaluator::Constant => kwargs.float("value").map_err(failed),
            Evaluator::IndexClose => instrument
                .benchmark()
                .and_then(|b| b.latest())
                .map(|bar| bar.close)
                .ok_or_else(|| ScreenerError::NoData {
                    code: instrument.code.clone(),
                    exchange: instrument.exchange.clone(),
                }),
            Evaluator::Generic {
                inputs,
                compute,
                handler,
                windowed,
            } => {
                let window = if *windowed {
                    Some(kwargs.period("timeperiod").map_err(failed)?)
                } else {
                    None
                };
                let series = inputs
                    .iter()
                    .map(|extractor| extractor.extract(instrument, window))
                    .collect::<Result<Vec<_>, _>>()?;
                let output = compute(&series, kwargs).map_err(failed)?;
                handler.apply(&output).map_err(failed)
            }
            Evaluator::Pattern(pattern) => {
                let open = Extractor::Open.extract(instrument, None)?;
                let high = Extractor::High.extract(instrument, None)?;
                let low = Extractor::Low.extract(instrument, None)?;
                let close = Extractor::Close.extract(instrument, None)?;
                let penetration = kwargs.get("penetration").map(|v| v.as_f64());
                let scores = candles::recognize(*pattern, &open, &high, &low, &close, penetration)
                    .map_err(failed)?;
                ResultHandler::Latest.apply(&scores).map_err(failed)
            }
        }
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluator::LatestBar(field) => write!(f, "LatestBar({field})"),
            Evaluator::Constant => f.write_str("Constant"),
            Evaluator::IndexClose => f.write_str("IndexClose"),
            Evaluator::Generic {
                inputs,
                handler,
                windowed,
                ..
            } => f
                .debug_struct("Generic")
                .field("inputs", inputs)
                .field("handler", handler)
                .field("windowed", windowed)
                .finish(),
            Evaluator::Pattern(pattern) => write!(f, "Pattern({})", pattern.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::kwargs::{FieldSpec, KwargsSchema, RawKwargs};
    use crate::domain::ohlcv::OhlcvBar;
    use chrono::NaiveDate;

    fn instrument(closes: &[f64]) -> Instrument {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                code: "BHP".into(),
                exchange: "ASX".into(),
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000,
            })
            .collect();
        Instrument::new("BHP".into(), "ASX".into(), bars)
    }

    fn period(p: i64) -> Kwargs {
        KwargsSchema::new(vec![FieldSpec::int("timeperiod", p)])
            .validate("T", &RawKwargs::new())
            .unwrap()
    }

    fn sma(inputs: &[Vec<f64>], kwargs: &Kwargs) -> Result<Vec<f64>, TaError> {
        ta::overlap::sma(&inputs[0], kwargs.period("timeperiod")?)
    }

    #[test]
    fn latest_bar_reads_last_close() {
        let inst = instrument(&[1.0, 2.0, 3.0]);
        let value = Evaluator::LatestBar(PriceField::Close)
            .evaluate("CLOSE", &inst, &Kwargs::default())
            .unwrap();
        assert_eq!(value, 3.0);
    }

    #[test]
    fn generic_takes_latest_value() {
        const INPUTS: &[Extractor] = &[Extractor::Close];
        let inst = instrument(&[1.0, 2.0, 3.0, 4.0]);
        let value = Evaluator::generic(INPUTS, sma)
            .evaluate("SMA", &inst, &period(2))
            .unwrap();
        assert_eq!(value, 3.5);
        let windowed = Evaluator::windowed(INPUTS, sma)
            .evaluate("SMA", &inst, &period(2))
            .unwrap();
        assert_eq!(windowed, 3.5);
    }

    #[test]
    fn numeric_failure_is_function_evaluation_error() {
        const INPUTS: &[Extractor] = &[Extractor::Close];
        let inst = instrument(&[1.0, 2.0]);
        let err = Evaluator::generic(INPUTS, sma)
            .evaluate("SMA", &inst, &period(20))
            .unwrap_err();
        assert!(matches!(err, ScreenerError::FunctionEvaluation { ref function, .. } if function == "SMA"));
    }

    #[test]
    fn latest_int_rounds() {
        const INPUTS: &[Extractor] = &[Extractor::Close];
        fn identity(inputs: &[Vec<f64>], _: &Kwargs) -> Result<Vec<f64>, TaError> {
            Ok(inputs[0].clone())
        }
        let inst = instrument(&[1.0, 2.6]);
        let value = Evaluator::generic(INPUTS, identity)
            .with_handler(ResultHandler::LatestInt)
            .evaluate("X", &inst, &Kwargs::default())
            .unwrap();
        assert_eq!(value, 3.0);
    }

    #[test]
    fn index_close_without_benchmark_is_no_data() {
        let inst = instrument(&[1.0]);
        assert!(matches!(
            Evaluator::IndexClose.evaluate("INDEX_CLOSE", &inst, &Kwargs::default()),
            Err(ScreenerError::NoData { .. })
        ));
    }
}
