//! Rolling statistics and linear regression.

use super::{TaError, check_period, require_len, same_len};

/// Population variance over a rolling window.
pub fn var(values: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    check_period("timeperiod", period, 1)?;
    require_len(values.len(), period)?;
    let mut out = vec![f64::NAN; values.len()];
    for (i, slot) in out.iter_mut().enumerate().skip(period - 1) {
        let window = &values[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        *slot = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
    }
    Ok(out)
}

/// Population standard deviation scaled by `nbdev`.
pub fn stddev(values: &[f64], period: usize, nbdev: f64) -> Result<Vec<f64>, TaError> {
    check_period("timeperiod", period, 2)?;
    Ok(var(values, period)?
        .into_iter()
        .map(|v| v.max(0.0).sqrt() * nbdev)
        .collect())
}

/// Pearson correlation of two series over a rolling window.
pub fn correl(a: &[f64], b: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let len = same_len(&[a.len(), b.len()])?;
    check_period("timeperiod", period, 2)?;
    require_len(len, period)?;
    let mut out = vec![f64::NAN; len];
    for (i, slot) in out.iter_mut().enumerate().skip(period - 1) {
        let xs = &a[i + 1 - period..=i];
        let ys = &b[i + 1 - period..=i];
        let n = period as f64;
        let mx = xs.iter().sum::<f64>() / n;
        let my = ys.iter().sum::<f64>() / n;
        let mut cov = 0.0;
        let mut vx = 0.0;
        let mut vy = 0.0;
        for (x, y) in xs.iter().zip(ys) {
            cov += (x - mx) * (y - my);
            vx += (x - mx).powi(2);
            vy += (y - my).powi(2);
        }
        let denom = (vx * vy).sqrt();
        *slot = if denom > 0.0 { cov / denom } else { f64::NAN };
    }
    Ok(out)
}

/// Beta of `a` against `b`, computed from one-bar percentage returns.
///
/// Needs `period` returns, so the first value appears at index `period`.
pub fn beta(a: &[f64], b: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let len = same_len(&[a.len(), b.len()])?;
    check_period("timeperiod", period, 1)?;
    require_len(len, period + 1)?;
    let returns = |s: &[f64]| -> Vec<f64> {
        std::iter::once(f64::NAN)
            .chain(s.windows(2).map(|w| {
                if w[0] != 0.0 {
                    (w[1] - w[0]) / w[0]
                } else {
                    0.0
                }
            }))
            .collect()
    };
    let ra = returns(a);
    let rb = returns(b);
    let mut out = vec![f64::NAN; len];
    for (i, slot) in out.iter_mut().enumerate().skip(period) {
        let xs = &rb[i + 1 - period..=i];
        let ys = &ra[i + 1 - period..=i];
        let n = period as f64;
        let mx = xs.iter().sum::<f64>() / n;
        let my = ys.iter().sum::<f64>() / n;
        let cov: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
        let var: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
        *slot = if var > 0.0 { cov / var } else { f64::NAN };
    }
    Ok(out)
}

/// Least-squares fit of one window against x = 0..n-1, as (intercept, slope).
fn fit(window: &[f64]) -> (f64, f64) {
    let n = window.len() as f64;
    let sum_x = n * (n - 1.0) / 2.0;
    let sum_xx = n * (n - 1.0) * (2.0 * n - 1.0) / 6.0;
    let sum_y: f64 = window.iter().sum();
    let sum_xy: f64 = window.iter().enumerate().map(|(x, y)| x as f64 * y).sum();
    let denom = n * sum_xx - sum_x * sum_x;
    let slope = if denom != 0.0 {
        (n * sum_xy - sum_x * sum_y) / denom
    } else {
        0.0
    };
    let intercept = (sum_y - slope * sum_x) / n;
    (intercept, slope)
}

fn rolling_fit<F>(values: &[f64], period: usize, project: F) -> Result<Vec<f64>, TaError>
where
    F: Fn(f64, f64, f64) -> f64,
{
    check_period("timeperiod", period, 2)?;
    require_len(values.len(), period)?;
    let mut out = vec![f64::NAN; values.len()];
    for (i, slot) in out.iter_mut().enumerate().skip(period - 1) {
        let (intercept, slope) = fit(&values[i + 1 - period..=i]);
        *slot = project(intercept, slope, period as f64);
    }
    Ok(out)
}

/// Fitted value at the last bar of each window.
pub fn linearreg(values: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    rolling_fit(values, period, |a, b, n| a + b * (n - 1.0))
}

pub fn linearreg_slope(values: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    rolling_fit(values, period, |_, b, _| b)
}

pub fn linearreg_intercept(values: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    rolling_fit(values, period, |a, _, _| a)
}

/// Slope angle in degrees.
pub fn linearreg_angle(values: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    rolling_fit(values, period, |_, b, _| b.atan().to_degrees())
}

/// Time series forecast: the fit projected one bar past the window.
pub fn tsf(values: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    rolling_fit(values, period, |a, b, n| a + b * n)
}
