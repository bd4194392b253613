//! Element-wise arithmetic and rolling extremes.

use super::{TaError, check_period, highest, lowest, require_len, same_len};

fn zip_with<F>(a: &[f64], b: &[f64], f: F) -> Result<Vec<f64>, TaError>
where
    F: Fn(f64, f64) -> f64,
{
    same_len(&[a.len(), b.len()])?;
    Ok(a.iter().zip(b).map(|(x, y)| f(*x, *y)).collect())
}

pub fn add(a: &[f64], b: &[f64]) -> Result<Vec<f64>, TaError> {
    zip_with(a, b, |x, y| x + y)
}

pub fn sub(a: &[f64], b: &[f64]) -> Result<Vec<f64>, TaError> {
    zip_with(a, b, |x, y| x - y)
}

pub fn mult(a: &[f64], b: &[f64]) -> Result<Vec<f64>, TaError> {
    zip_with(a, b, |x, y| x * y)
}

/// Division by zero yields `NaN` rather than infinity.
pub fn div(a: &[f64], b: &[f64]) -> Result<Vec<f64>, TaError> {
    zip_with(a, b, |x, y| if y != 0.0 { x / y } else { f64::NAN })
}

fn rolling<F>(values: &[f64], period: usize, f: F) -> Result<Vec<f64>, TaError>
where
    F: Fn(usize, usize) -> f64,
{
    check_period("timeperiod", period, 2)?;
    require_len(values.len(), period)?;
    let mut out = vec![f64::NAN; values.len()];
    for (i, slot) in out.iter_mut().enumerate().skip(period - 1) {
        *slot = f(i + 1 - period, i);
    }
    Ok(out)
}

pub fn max(values: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    rolling(values, period, |start, end| highest(values, start, end).0)
}

pub fn min(values: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    rolling(values, period, |start, end| lowest(values, start, end).0)
}

/// Absolute index of the window's highest value.
pub fn maxindex(values: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    rolling(values, period, |start, end| highest(values, start, end).1 as f64)
}

/// Absolute index of the window's lowest value.
pub fn minindex(values: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    rolling(values, period, |start, end| lowest(values, start, end).1 as f64)
}

pub fn sum(values: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    check_period("timeperiod", period, 1)?;
    require_len(values.len(), period)?;
    let mut out = vec![f64::NAN; values.len()];
    for (i, slot) in out.iter_mut().enumerate().skip(period - 1) {
        *slot = values[i + 1 - period..=i].iter().sum();
    }
    Ok(out)
}

/// Applies `f` to every element. Out-of-domain inputs give `NaN`.
pub fn transform(values: &[f64], f: fn(f64) -> f64) -> Vec<f64> {
    values.iter().map(|v| f(*v)).collect()
}
