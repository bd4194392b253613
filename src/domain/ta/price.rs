//! Price transforms: per-bar combinations of OHLC.

use super::{TaError, same_len};

pub fn avgprice(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Result<Vec<f64>, TaError> {
    same_len(&[open.len(), high.len(), low.len(), close.len()])?;
    Ok((0..open.len())
        .map(|i| (open[i] + high[i] + low[i] + close[i]) / 4.0)
        .collect())
}

pub fn medprice(high: &[f64], low: &[f64]) -> Result<Vec<f64>, TaError> {
    same_len(&[high.len(), low.len()])?;
    Ok(high.iter().zip(low).map(|(h, l)| (h + l) / 2.0).collect())
}

pub fn typprice(high: &[f64], low: &[f64], close: &[f64]) -> Result<Vec<f64>, TaError> {
    same_len(&[high.len(), low.len(), close.len()])?;
    Ok((0..high.len())
        .map(|i| (high[i] + low[i] + close[i]) / 3.0)
        .collect())
}

/// Weighted close: (high + low + 2 * close) / 4.
pub fn wclprice(high: &[f64], low: &[f64], close: &[f64]) -> Result<Vec<f64>, TaError> {
    same_len(&[high.len(), low.len(), close.len()])?;
    Ok((0..high.len())
        .map(|i| (high[i] + low[i] + 2.0 * close[i]) / 4.0)
        .collect())
}
