//! Numeric technical-analysis library.
//!
//! Every function takes dense input slices and returns a series of the same
//! length as its (first) input. Bars inside the look-back carry `NaN`.
//! Parameter problems and short input are reported as [`TaError`] instead of
//! producing garbage, so callers can decide how a failed computation counts.

pub mod candles;
pub mod math;
pub mod momentum;
pub mod overlap;
pub mod price;
pub mod statistics;
pub mod volatility;
pub mod volume;

use std::fmt;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaError {
    #[error("insufficient data: need {needed} observations, have {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("input series lengths differ")]
    LengthMismatch,

    #[error("computation produced no finite value")]
    NoValue,
}

/// Moving-average flavour selector shared by several functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaType {
    Sma,
    Ema,
    Wma,
    Dema,
    Tema,
    Trima,
    Kama,
    T3,
}

impl MaType {
    pub const ALL: [MaType; 8] = [
        MaType::Sma,
        MaType::Ema,
        MaType::Wma,
        MaType::Dema,
        MaType::Tema,
        MaType::Trima,
        MaType::Kama,
        MaType::T3,
    ];

    /// Integer code (7 is reserved for MAMA, which is not provided).
    pub fn code(self) -> i64 {
        match self {
            MaType::Sma => 0,
            MaType::Ema => 1,
            MaType::Wma => 2,
            MaType::Dema => 3,
            MaType::Tema => 4,
            MaType::Trima => 5,
            MaType::Kama => 6,
            MaType::T3 => 8,
        }
    }

    pub fn from_code(code: i64) -> Option<MaType> {
        MaType::ALL.into_iter().find(|m| m.code() == code)
    }

    pub fn label(self) -> &'static str {
        match self {
            MaType::Sma => "SMA",
            MaType::Ema => "EMA",
            MaType::Wma => "WMA",
            MaType::Dema => "DEMA",
            MaType::Tema => "TEMA",
            MaType::Trima => "TRIMA",
            MaType::Kama => "KAMA",
            MaType::T3 => "T3",
        }
    }

    pub fn from_label(label: &str) -> Option<MaType> {
        MaType::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(label.trim()))
    }
}

impl fmt::Display for MaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub(crate) fn check_period(name: &'static str, period: usize, min: usize) -> Result<(), TaError> {
    if period < min {
        return Err(TaError::InvalidParameter {
            name,
            reason: format!("must be at least {min}, got {period}"),
        });
    }
    Ok(())
}

pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<(), TaError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(TaError::InvalidParameter {
            name,
            reason: format!("must be positive, got {value}"),
        });
    }
    Ok(())
}

pub(crate) fn require_len(available: usize, needed: usize) -> Result<(), TaError> {
    if available < needed {
        return Err(TaError::InsufficientData { needed, available });
    }
    Ok(())
}

pub(crate) fn same_len(lengths: &[usize]) -> Result<usize, TaError> {
    let first = lengths.first().copied().unwrap_or(0);
    if lengths.iter().any(|&l| l != first) {
        return Err(TaError::LengthMismatch);
    }
    Ok(first)
}

/// Index of the first finite value, i.e. the end of a series' look-back.
pub(crate) fn first_valid(series: &[f64]) -> Option<usize> {
    series.iter().position(|v| v.is_finite())
}

/// Runs `f` over the valid tail of `series` and re-pads the result with `NaN`.
///
/// Used to chain computations (an EMA of an EMA, a signal line of MACD).
pub(crate) fn on_valid<F>(series: &[f64], f: F) -> Result<Vec<f64>, TaError>
where
    F: FnOnce(&[f64]) -> Result<Vec<f64>, TaError>,
{
    let start = first_valid(series).ok_or(TaError::InsufficientData {
        needed: 1,
        available: 0,
    })?;
    let tail = f(&series[start..])?;
    let mut out = vec![f64::NAN; start];
    out.extend(tail);
    Ok(out)
}

/// Most recent value of a series; `NoValue` when it is not finite.
pub fn latest(series: &[f64]) -> Result<f64, TaError> {
    match series.last() {
        Some(v) if v.is_finite() => Ok(*v),
        Some(_) => Err(TaError::NoValue),
        None => Err(TaError::InsufficientData {
            needed: 1,
            available: 0,
        }),
    }
}

/// Highest value in `series[start..=end]` and its index.
pub(crate) fn highest(series: &[f64], start: usize, end: usize) -> (f64, usize) {
    let mut best = (series[start], start);
    for (i, &v) in series.iter().enumerate().take(end + 1).skip(start + 1) {
        if v >= best.0 {
            best = (v, i);
        }
    }
    best
}

/// Lowest value in `series[start..=end]` and its index.
pub(crate) fn lowest(series: &[f64], start: usize, end: usize) -> (f64, usize) {
    let mut best = (series[start], start);
    for (i, &v) in series.iter().enumerate().take(end + 1).skip(start + 1) {
        if v <= best.0 {
            best = (v, i);
        }
    }
    best
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ma_type_codes_round_trip() {
        for m in MaType::ALL {
            assert_eq!(MaType::from_code(m.code()), Some(m));
            assert_eq!(MaType::from_label(m.label()), Some(m));
        }
        assert_eq!(MaType::from_code(7), None);
        assert_eq!(MaType::from_label(" ema "), Some(MaType::Ema));
    }

    #[test]
    fn latest_rejects_nan() {
        assert_eq!(latest(&[1.0, 2.0]), Ok(2.0));
        assert_eq!(latest(&[1.0, f64::NAN]), Err(TaError::NoValue));
        assert!(matches!(
            latest(&[]),
            Err(TaError::InsufficientData { .. })
        ));
    }

    #[test]
    fn on_valid_repads() {
        let series = [f64::NAN, f64::NAN, 1.0, 2.0, 3.0];
        let out = on_valid(&series, |tail| Ok(tail.iter().map(|v| v * 2.0).collect())).unwrap();
        test_util::assert_series_eq(&out, &[f64::NAN, f64::NAN, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn same_len_detects_mismatch() {
        assert_eq!(same_len(&[3, 3, 3]), Ok(3));
        assert_eq!(same_len(&[3, 2]), Err(TaError::LengthMismatch));
    }

    #[test]
    fn highest_lowest_prefer_latest_tie() {
        let s = [1.0, 5.0, 3.0, 5.0, 0.0];
        assert_eq!(highest(&s, 0, 4), (5.0, 3));
        assert_eq!(lowest(&s, 0, 3), (1.0, 0));
    }
}
