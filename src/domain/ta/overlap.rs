//! Overlap studies: moving averages and price bands.

use super::statistics::stddev;
use super::{
    MaType, TaError, check_period, check_positive, highest, lowest, on_valid, require_len,
    same_len,
};

/// Vector factor used by `MaType::T3` when no explicit factor is given.
pub const DEFAULT_T3_VFACTOR: f64 = 0.7;

pub fn sma(values: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    check_period("timeperiod", period, 1)?;
    require_len(values.len(), period)?;
    let mut out = vec![f64::NAN; values.len()];
    let mut sum: f64 = values[..period].iter().sum();
    out[period - 1] = sum / period as f64;
    for i in period..values.len() {
        sum += values[i] - values[i - period];
        out[i] = sum / period as f64;
    }
    Ok(out)
}

/// k = 2/(n+1), seeded with the SMA of the first n values.
pub fn ema(values: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    check_period("timeperiod", period, 1)?;
    require_len(values.len(), period)?;
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = vec![f64::NAN; values.len()];
    let mut ema = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = ema;
    for i in period..values.len() {
        ema = values[i] * k + ema * (1.0 - k);
        out[i] = ema;
    }
    Ok(out)
}

/// Linearly weighted: the newest value has weight n, the oldest weight 1.
pub fn wma(values: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    check_period("timeperiod", period, 1)?;
    require_len(values.len(), period)?;
    let divisor = (period * (period + 1)) as f64 / 2.0;
    let mut out = vec![f64::NAN; values.len()];
    for (i, slot) in out.iter_mut().enumerate().skip(period - 1) {
        let window = &values[i + 1 - period..=i];
        let weighted: f64 = window
            .iter()
            .enumerate()
            .map(|(j, v)| v * (j + 1) as f64)
            .sum();
        *slot = weighted / divisor;
    }
    Ok(out)
}

pub fn dema(values: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let e1 = ema(values, period)?;
    let e2 = on_valid(&e1, |tail| ema(tail, period))?;
    Ok(e1.iter().zip(&e2).map(|(a, b)| 2.0 * a - b).collect())
}

pub fn tema(values: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let e1 = ema(values, period)?;
    let e2 = on_valid(&e1, |tail| ema(tail, period))?;
    let e3 = on_valid(&e2, |tail| ema(tail, period))?;
    Ok((0..values.len())
        .map(|i| 3.0 * e1[i] - 3.0 * e2[i] + e3[i])
        .collect())
}

/// Triangular MA: an SMA of an SMA, total look-back n-1.
pub fn trima(values: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    check_period("timeperiod", period, 1)?;
    let (first, second) = if period % 2 == 1 {
        ((period + 1) / 2, (period + 1) / 2)
    } else {
        (period / 2, period / 2 + 1)
    };
    let s1 = sma(values, first)?;
    on_valid(&s1, |tail| sma(tail, second))
}

/// Kaufman adaptive MA with fast=2 and slow=30 smoothing constants.
pub fn kama(values: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    check_period("timeperiod", period, 1)?;
    require_len(values.len(), period + 1)?;
    let fast = 2.0 / 3.0;
    let slow = 2.0 / 31.0;
    let mut out = vec![f64::NAN; values.len()];
    let mut prev = values[period - 1];
    for i in period..values.len() {
        let change = (values[i] - values[i - period]).abs();
        let volatility: f64 = (i + 1 - period..=i)
            .map(|j| (values[j] - values[j - 1]).abs())
            .sum();
        let er = if volatility > 0.0 {
            change / volatility
        } else {
            1.0
        };
        let sc = (er * (fast - slow) + slow).powi(2);
        prev += sc * (values[i] - prev);
        out[i] = prev;
    }
    Ok(out)
}

fn generalized_dema(values: &[f64], period: usize, vfactor: f64) -> Result<Vec<f64>, TaError> {
    on_valid(values, |tail| {
        let e1 = ema(tail, period)?;
        let e2 = on_valid(&e1, |inner| ema(inner, period))?;
        Ok(e1
            .iter()
            .zip(&e2)
            .map(|(a, b)| a * (1.0 + vfactor) - b * vfactor)
            .collect())
    })
}

/// Tillson T3: three chained generalized DEMAs.
pub fn t3(values: &[f64], period: usize, vfactor: f64) -> Result<Vec<f64>, TaError> {
    check_period("timeperiod", period, 1)?;
    if !(0.0..=1.0).contains(&vfactor) {
        return Err(TaError::InvalidParameter {
            name: "vfactor",
            reason: format!("must be within [0, 1], got {vfactor}"),
        });
    }
    let g1 = generalized_dema(values, period, vfactor)?;
    let g2 = generalized_dema(&g1, period, vfactor)?;
    generalized_dema(&g2, period, vfactor)
}

pub fn ma(values: &[f64], period: usize, ma_type: MaType) -> Result<Vec<f64>, TaError> {
    if period == 1 {
        return Ok(values.to_vec());
    }
    match ma_type {
        MaType::Sma => sma(values, period),
        MaType::Ema => ema(values, period),
        MaType::Wma => wma(values, period),
        MaType::Dema => dema(values, period),
        MaType::Tema => tema(values, period),
        MaType::Trima => trima(values, period),
        MaType::Kama => kama(values, period),
        MaType::T3 => t3(values, period, DEFAULT_T3_VFACTOR),
    }
}

pub struct Bands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Bollinger bands: `ma ± nbdev * population stddev`.
pub fn bbands(
    values: &[f64],
    period: usize,
    nbdevup: f64,
    nbdevdn: f64,
    ma_type: MaType,
) -> Result<Bands, TaError> {
    check_period("timeperiod", period, 2)?;
    let middle = ma(values, period, ma_type)?;
    let deviation = stddev(values, period, 1.0)?;
    let upper = middle
        .iter()
        .zip(&deviation)
        .map(|(m, d)| m + nbdevup * d)
        .collect();
    let lower = middle
        .iter()
        .zip(&deviation)
        .map(|(m, d)| m - nbdevdn * d)
        .collect();
    Ok(Bands {
        upper,
        middle,
        lower,
    })
}

/// Acceleration bands around SMA(close).
pub fn accbands(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Result<Bands, TaError> {
    same_len(&[high.len(), low.len(), close.len()])?;
    check_period("timeperiod", period, 2)?;
    let mut upper_raw = Vec::with_capacity(high.len());
    let mut lower_raw = Vec::with_capacity(high.len());
    for (&h, &l) in high.iter().zip(low) {
        let width = if h + l != 0.0 {
            4.0 * (h - l) / (h + l)
        } else {
            0.0
        };
        upper_raw.push(h * (1.0 + width));
        lower_raw.push(l * (1.0 - width));
    }
    Ok(Bands {
        upper: sma(&upper_raw, period)?,
        middle: sma(close, period)?,
        lower: sma(&lower_raw, period)?,
    })
}

/// (highest + lowest) / 2 over the period.
pub fn midpoint(values: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    check_period("timeperiod", period, 2)?;
    require_len(values.len(), period)?;
    let mut out = vec![f64::NAN; values.len()];
    for (i, slot) in out.iter_mut().enumerate().skip(period - 1) {
        let start = i + 1 - period;
        *slot = (highest(values, start, i).0 + lowest(values, start, i).0) / 2.0;
    }
    Ok(out)
}

/// (highest high + lowest low) / 2 over the period.
pub fn midprice(high: &[f64], low: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let len = same_len(&[high.len(), low.len()])?;
    check_period("timeperiod", period, 2)?;
    require_len(len, period)?;
    let mut out = vec![f64::NAN; len];
    for (i, slot) in out.iter_mut().enumerate().skip(period - 1) {
        let start = i + 1 - period;
        *slot = (highest(high, start, i).0 + lowest(low, start, i).0) / 2.0;
    }
    Ok(out)
}

/// Wilder's parabolic stop-and-reverse.
pub fn sar(high: &[f64], low: &[f64], acceleration: f64, maximum: f64) -> Result<Vec<f64>, TaError> {
    let len = same_len(&[high.len(), low.len()])?;
    check_positive("acceleration", acceleration)?;
    if maximum < acceleration {
        return Err(TaError::InvalidParameter {
            name: "maximum",
            reason: format!("must be at least acceleration ({acceleration}), got {maximum}"),
        });
    }
    require_len(len, 2)?;

    let mut out = vec![f64::NAN; len];
    let mut long = high[1] - high[0] >= low[0] - low[1];
    let mut af = acceleration;
    let (mut sar, mut ep) = if long {
        (low[0], high[1])
    } else {
        (high[0], low[1])
    };
    out[1] = sar;

    for i in 2..len {
        sar += af * (ep - sar);
        if long {
            sar = sar.min(low[i - 1]).min(low[i - 2]);
            if low[i] < sar {
                long = false;
                sar = ep;
                ep = low[i];
                af = acceleration;
            } else if high[i] > ep {
                ep = high[i];
                af = (af + acceleration).min(maximum);
            }
        } else {
            sar = sar.max(high[i - 1]).max(high[i - 2]);
            if high[i] > sar {
                long = true;
                sar = ep;
                ep = high[i];
                af = acceleration;
            } else if low[i] < ep {
                ep = low[i];
                af = (af + acceleration).min(maximum);
            }
        }
        out[i] = sar;
    }
    Ok(out)
}
