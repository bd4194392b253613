//! Volatility indicators built on the true range.

use super::{TaError, check_period, require_len, same_len};

/// True range per bar. The first bar has no previous close and uses high - low.
pub fn trange(high: &[f64], low: &[f64], close: &[f64]) -> Result<Vec<f64>, TaError> {
    let len = same_len(&[high.len(), low.len(), close.len()])?;
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let hl = high[i] - low[i];
        if i == 0 {
            out.push(hl);
        } else {
            let prev = close[i - 1];
            out.push(hl.max((high[i] - prev).abs()).max((low[i] - prev).abs()));
        }
    }
    Ok(out)
}

/// Wilder smoothing: seeded with the mean of the first `period` values, then
/// `(prev * (n - 1) + x) / n`.
pub(crate) fn wilder_smooth(values: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    check_period("timeperiod", period, 1)?;
    require_len(values.len(), period)?;
    let n = period as f64;
    let mut out = vec![f64::NAN; values.len()];
    let mut prev = values[..period].iter().sum::<f64>() / n;
    out[period - 1] = prev;
    for i in period..values.len() {
        prev = (prev * (n - 1.0) + values[i]) / n;
        out[i] = prev;
    }
    Ok(out)
}

pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let tr = trange(high, low, close)?;
    wilder_smooth(&tr, period)
}

/// ATR as a percentage of the close.
pub fn natr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let atr = atr(high, low, close, period)?;
    Ok(atr
        .iter()
        .zip(close)
        .map(|(a, c)| if *c != 0.0 { a / c * 100.0 } else { f64::NAN })
        .collect())
}
