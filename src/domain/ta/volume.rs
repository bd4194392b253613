//! Volume indicators.

use super::overlap::ema;
use super::{TaError, check_period, same_len};

/// Chaikin accumulation/distribution line.
pub fn ad(high: &[f64], low: &[f64], close: &[f64], volume: &[f64]) -> Result<Vec<f64>, TaError> {
    let len = same_len(&[high.len(), low.len(), close.len(), volume.len()])?;
    let mut out = Vec::with_capacity(len);
    let mut total = 0.0;
    for i in 0..len {
        let range = high[i] - low[i];
        if range > 0.0 {
            let clv = ((close[i] - low[i]) - (high[i] - close[i])) / range;
            total += clv * volume[i];
        }
        out.push(total);
    }
    Ok(out)
}

/// Chaikin oscillator: EMA(AD, fast) - EMA(AD, slow).
pub fn adosc(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    volume: &[f64],
    fast: usize,
    slow: usize,
) -> Result<Vec<f64>, TaError> {
    check_period("fastperiod", fast, 2)?;
    check_period("slowperiod", slow, 2)?;
    let line = ad(high, low, close, volume)?;
    let fast_ema = ema(&line, fast)?;
    let slow_ema = ema(&line, slow)?;
    Ok(fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect())
}

/// On-balance volume, starting from the first bar's volume.
pub fn obv(close: &[f64], volume: &[f64]) -> Result<Vec<f64>, TaError> {
    let len = same_len(&[close.len(), volume.len()])?;
    let mut out = Vec::with_capacity(len);
    let mut total = 0.0;
    for i in 0..len {
        if i == 0 {
            total = volume[0];
        } else if close[i] > close[i - 1] {
            total += volume[i];
        } else if close[i] < close[i - 1] {
            total -= volume[i];
        }
        out.push(total);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ad_accumulates_close_location() {
        // close at high adds full volume, close at low subtracts it
        let out = ad(&[10.0, 10.0, 10.0], &[8.0, 8.0, 10.0], &[10.0, 8.0, 10.0], &[100.0, 50.0, 70.0])
            .unwrap();
        assert_eq!(out, vec![100.0, 50.0, 50.0]);
    }

    #[test]
    fn obv_follows_direction() {
        let out = obv(&[10.0, 11.0, 10.5, 10.5], &[100.0, 200.0, 50.0, 80.0]).unwrap();
        assert_eq!(out, vec![100.0, 300.0, 250.0, 250.0]);
    }

    #[test]
    fn adosc_lookback_follows_slow_period() {
        let n = 15;
        let high: Vec<f64> = (0..n).map(|i| 11.0 + i as f64).collect();
        let low: Vec<f64> = (0..n).map(|i| 9.0 + i as f64).collect();
        let close: Vec<f64> = (0..n).map(|i| 10.5 + i as f64).collect();
        let volume = vec![1000.0; n];
        let out = adosc(&high, &low, &close, &volume, 3, 10).unwrap();
        assert!(out[8].is_nan());
        assert!(out[9].is_finite());
    }

    #[test]
    fn adosc_rejects_short_periods() {
        assert!(adosc(&[1.0], &[1.0], &[1.0], &[1.0], 1, 10).is_err());
    }
}
