//! Momentum indicators: oscillators, directional movement and rate of change.

use super::overlap::{ema, ma};
use super::volatility::{trange, wilder_smooth};
use super::{MaType, TaError, check_period, highest, lowest, on_valid, require_len, same_len};

pub struct MacdLines {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub hist: Vec<f64>,
}

pub struct StochLines {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

pub struct AroonLines {
    pub down: Vec<f64>,
    pub up: Vec<f64>,
}

/// Wilder-averaged gains and losses of one-bar changes; index `period` is
/// the first defined value.
fn gain_loss(close: &[f64], period: usize) -> Result<(Vec<f64>, Vec<f64>), TaError> {
    check_period("timeperiod", period, 2)?;
    require_len(close.len(), period + 1)?;
    let mut gains = Vec::with_capacity(close.len() - 1);
    let mut losses = Vec::with_capacity(close.len() - 1);
    for w in close.windows(2) {
        let change = w[1] - w[0];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }
    let pad = |smoothed: Vec<f64>| {
        let mut out = vec![f64::NAN];
        out.extend(smoothed);
        out
    };
    Ok((
        pad(wilder_smooth(&gains, period)?),
        pad(wilder_smooth(&losses, period)?),
    ))
}

pub fn rsi(close: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let (gain, loss) = gain_loss(close, period)?;
    Ok(gain
        .iter()
        .zip(&loss)
        .map(|(g, l)| {
            let total = g + l;
            if total > 0.0 { 100.0 * g / total } else { 0.0 }
        })
        .collect())
}

/// Chande momentum oscillator on the same averages as RSI.
pub fn cmo(close: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let (gain, loss) = gain_loss(close, period)?;
    Ok(gain
        .iter()
        .zip(&loss)
        .map(|(g, l)| {
            let total = g + l;
            if total > 0.0 { 100.0 * (g - l) / total } else { 0.0 }
        })
        .collect())
}

fn lagged<F>(close: &[f64], period: usize, f: F) -> Result<Vec<f64>, TaError>
where
    F: Fn(f64, f64) -> f64,
{
    check_period("timeperiod", period, 1)?;
    require_len(close.len(), period + 1)?;
    let mut out = vec![f64::NAN; close.len()];
    for (i, slot) in out.iter_mut().enumerate().skip(period) {
        *slot = f(close[i], close[i - period]);
    }
    Ok(out)
}

fn ratio_or_nan(now: f64, prev: f64, f: impl Fn(f64, f64) -> f64) -> f64 {
    if prev != 0.0 { f(now, prev) } else { f64::NAN }
}

pub fn mom(close: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    lagged(close, period, |now, prev| now - prev)
}

pub fn roc(close: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    lagged(close, period, |now, prev| {
        ratio_or_nan(now, prev, |n, p| (n / p - 1.0) * 100.0)
    })
}

pub fn rocp(close: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    lagged(close, period, |now, prev| ratio_or_nan(now, prev, |n, p| (n - p) / p))
}

pub fn rocr(close: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    lagged(close, period, |now, prev| ratio_or_nan(now, prev, |n, p| n / p))
}

pub fn rocr100(close: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    lagged(close, period, |now, prev| ratio_or_nan(now, prev, |n, p| n / p * 100.0))
}

/// MACD with EMA smoothing. Periods are swapped if fast exceeds slow.
pub fn macd(close: &[f64], fast: usize, slow: usize, signal: usize) -> Result<MacdLines, TaError> {
    check_period("fastperiod", fast, 2)?;
    check_period("slowperiod", slow, 2)?;
    check_period("signalperiod", signal, 1)?;
    let (fast, slow) = if fast > slow { (slow, fast) } else { (fast, slow) };
    let fast_ema = ema(close, fast)?;
    let slow_ema = ema(close, slow)?;
    let line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal_line = on_valid(&line, |tail| ema(tail, signal))?;
    let hist = line.iter().zip(&signal_line).map(|(m, s)| m - s).collect();
    Ok(MacdLines {
        macd: line,
        signal: signal_line,
        hist,
    })
}

fn fast_slow_ma(
    close: &[f64],
    fast: usize,
    slow: usize,
    ma_type: MaType,
) -> Result<(Vec<f64>, Vec<f64>), TaError> {
    check_period("fastperiod", fast, 2)?;
    check_period("slowperiod", slow, 2)?;
    let (fast, slow) = if fast > slow { (slow, fast) } else { (fast, slow) };
    Ok((ma(close, fast, ma_type)?, ma(close, slow, ma_type)?))
}

/// Absolute price oscillator: fast MA - slow MA.
pub fn apo(close: &[f64], fast: usize, slow: usize, ma_type: MaType) -> Result<Vec<f64>, TaError> {
    let (f, s) = fast_slow_ma(close, fast, slow, ma_type)?;
    Ok(f.iter().zip(&s).map(|(f, s)| f - s).collect())
}

/// Percentage price oscillator.
pub fn ppo(close: &[f64], fast: usize, slow: usize, ma_type: MaType) -> Result<Vec<f64>, TaError> {
    let (f, s) = fast_slow_ma(close, fast, slow, ma_type)?;
    Ok(f
        .iter()
        .zip(&s)
        .map(|(f, s)| if *s != 0.0 { (f - s) / s * 100.0 } else { f64::NAN })
        .collect())
}

/// Raw one-bar directional movement as (plus, minus); index 0 is zero.
fn raw_dm(high: &[f64], low: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut plus = vec![0.0; high.len()];
    let mut minus = vec![0.0; high.len()];
    for i in 1..high.len() {
        let up = high[i] - high[i - 1];
        let down = low[i - 1] - low[i];
        if up > down && up > 0.0 {
            plus[i] = up;
        } else if down > up && down > 0.0 {
            minus[i] = down;
        }
    }
    (plus, minus)
}

/// Wilder running sum over `raw[1..]`: index `period` holds the first
/// `period` values, later bars use `prev - prev / n + x`.
fn wilder_sum(raw: &[f64], period: usize) -> Vec<f64> {
    let n = period as f64;
    let mut out = vec![f64::NAN; raw.len()];
    let mut total: f64 = raw[1..=period].iter().sum();
    out[period] = total;
    for i in period + 1..raw.len() {
        total = total - total / n + raw[i];
        out[i] = total;
    }
    out
}

struct Directional {
    plus_dm: Vec<f64>,
    minus_dm: Vec<f64>,
    tr: Vec<f64>,
}

fn directional(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Result<Directional, TaError> {
    let len = same_len(&[high.len(), low.len(), close.len()])?;
    check_period("timeperiod", period, 1)?;
    require_len(len, period + 1)?;
    let (plus, minus) = raw_dm(high, low);
    let tr = trange(high, low, close)?;
    Ok(Directional {
        plus_dm: wilder_sum(&plus, period),
        minus_dm: wilder_sum(&minus, period),
        tr: wilder_sum(&tr, period),
    })
}

fn percent_of(part: &[f64], whole: &[f64]) -> Vec<f64> {
    part.iter()
        .zip(whole)
        .map(|(p, w)| if *w != 0.0 { 100.0 * p / w } else { 0.0 })
        .map(|v| if v.is_finite() { v } else { f64::NAN })
        .collect()
}

pub fn plus_dm(high: &[f64], low: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let len = same_len(&[high.len(), low.len()])?;
    check_period("timeperiod", period, 1)?;
    require_len(len, period + 1)?;
    Ok(wilder_sum(&raw_dm(high, low).0, period))
}

pub fn minus_dm(high: &[f64], low: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let len = same_len(&[high.len(), low.len()])?;
    check_period("timeperiod", period, 1)?;
    require_len(len, period + 1)?;
    Ok(wilder_sum(&raw_dm(high, low).1, period))
}

pub fn plus_di(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let d = directional(high, low, close, period)?;
    Ok(percent_of(&d.plus_dm, &d.tr))
}

pub fn minus_di(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let d = directional(high, low, close, period)?;
    Ok(percent_of(&d.minus_dm, &d.tr))
}

pub fn dx(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let d = directional(high, low, close, period)?;
    let plus = percent_of(&d.plus_dm, &d.tr);
    let minus = percent_of(&d.minus_dm, &d.tr);
    Ok(plus
        .iter()
        .zip(&minus)
        .map(|(p, m)| {
            let total = p + m;
            if total > 0.0 {
                100.0 * (p - m).abs() / total
            } else if total.is_nan() {
                f64::NAN
            } else {
                0.0
            }
        })
        .collect())
}

/// Average directional index: Wilder average of DX, first value at 2n-1.
pub fn adx(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let dx = dx(high, low, close, period)?;
    on_valid(&dx, |tail| wilder_smooth(tail, period))
}

pub fn adxr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let adx = adx(high, low, close, period)?;
    let lag = period - 1;
    let mut out = vec![f64::NAN; adx.len()];
    for (i, slot) in out.iter_mut().enumerate().skip(lag) {
        *slot = (adx[i] + adx[i - lag]) / 2.0;
    }
    if out.iter().all(|v| v.is_nan()) {
        return Err(TaError::InsufficientData {
            needed: 3 * period - 1,
            available: adx.len(),
        });
    }
    Ok(out)
}

/// Aroon over `period + 1` bars: time since the highest high / lowest low.
pub fn aroon(high: &[f64], low: &[f64], period: usize) -> Result<AroonLines, TaError> {
    let len = same_len(&[high.len(), low.len()])?;
    check_period("timeperiod", period, 2)?;
    require_len(len, period + 1)?;
    let p = period as f64;
    let mut up = vec![f64::NAN; len];
    let mut down = vec![f64::NAN; len];
    for i in period..len {
        let start = i - period;
        let hi = highest(high, start, i).1;
        let lo = lowest(low, start, i).1;
        up[i] = 100.0 * (p - (i - hi) as f64) / p;
        down[i] = 100.0 * (p - (i - lo) as f64) / p;
    }
    Ok(AroonLines { down, up })
}

pub fn aroonosc(high: &[f64], low: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let lines = aroon(high, low, period)?;
    Ok(lines.up.iter().zip(&lines.down).map(|(u, d)| u - d).collect())
}

/// Balance of power: (close - open) / (high - low).
pub fn bop(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Result<Vec<f64>, TaError> {
    let len = same_len(&[open.len(), high.len(), low.len(), close.len()])?;
    Ok((0..len)
        .map(|i| {
            let range = high[i] - low[i];
            if range > 0.0 { (close[i] - open[i]) / range } else { 0.0 }
        })
        .collect())
}

/// Commodity channel index with the 0.015 constant.
pub fn cci(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let len = same_len(&[high.len(), low.len(), close.len()])?;
    check_period("timeperiod", period, 2)?;
    require_len(len, period)?;
    let tp: Vec<f64> = (0..len).map(|i| (high[i] + low[i] + close[i]) / 3.0).collect();
    let mut out = vec![f64::NAN; len];
    for (i, slot) in out.iter_mut().enumerate().skip(period - 1) {
        let window = &tp[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let deviation = window.iter().map(|v| (v - mean).abs()).sum::<f64>() / period as f64;
        *slot = if deviation > 0.0 {
            (tp[i] - mean) / (0.015 * deviation)
        } else {
            0.0
        };
    }
    Ok(out)
}

/// Money flow index over `period` typical-price changes.
pub fn mfi(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    volume: &[f64],
    period: usize,
) -> Result<Vec<f64>, TaError> {
    let len = same_len(&[high.len(), low.len(), close.len(), volume.len()])?;
    check_period("timeperiod", period, 2)?;
    require_len(len, period + 1)?;
    let tp: Vec<f64> = (0..len).map(|i| (high[i] + low[i] + close[i]) / 3.0).collect();
    let mut out = vec![f64::NAN; len];
    for (i, slot) in out.iter_mut().enumerate().skip(period) {
        let mut positive = 0.0;
        let mut negative = 0.0;
        for j in i + 1 - period..=i {
            let flow = tp[j] * volume[j];
            if tp[j] > tp[j - 1] {
                positive += flow;
            } else if tp[j] < tp[j - 1] {
                negative += flow;
            }
        }
        let total = positive + negative;
        *slot = if total > 0.0 { 100.0 * positive / total } else { 0.0 };
    }
    Ok(out)
}

/// Raw %K: where the close sits in the high/low range of the window.
fn stoch_k(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let len = same_len(&[high.len(), low.len(), close.len()])?;
    check_period("fastk_period", period, 1)?;
    require_len(len, period)?;
    let mut out = vec![f64::NAN; len];
    for (i, slot) in out.iter_mut().enumerate().skip(period - 1) {
        let start = i + 1 - period;
        let hh = highest(high, start, i).0;
        let ll = lowest(low, start, i).0;
        *slot = if hh > ll {
            100.0 * (close[i] - ll) / (hh - ll)
        } else {
            0.0
        };
    }
    Ok(out)
}

/// Fast stochastic: raw %K and its moving average.
pub fn stochf(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    fastk_period: usize,
    fastd_period: usize,
    fastd_ma: MaType,
) -> Result<StochLines, TaError> {
    let k = stoch_k(high, low, close, fastk_period)?;
    let d = on_valid(&k, |tail| ma(tail, fastd_period, fastd_ma))?;
    Ok(StochLines { k, d })
}

/// Slow stochastic: %K smoothed once for slow %K, twice for slow %D.
#[allow(clippy::too_many_arguments)]
pub fn stoch(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    fastk_period: usize,
    slowk_period: usize,
    slowk_ma: MaType,
    slowd_period: usize,
    slowd_ma: MaType,
) -> Result<StochLines, TaError> {
    let fast_k = stoch_k(high, low, close, fastk_period)?;
    let k = on_valid(&fast_k, |tail| ma(tail, slowk_period, slowk_ma))?;
    let d = on_valid(&k, |tail| ma(tail, slowd_period, slowd_ma))?;
    Ok(StochLines { k, d })
}

/// Fast stochastic applied to RSI.
pub fn stochrsi(
    close: &[f64],
    period: usize,
    fastk_period: usize,
    fastd_period: usize,
    fastd_ma: MaType,
) -> Result<StochLines, TaError> {
    let rsi = rsi(close, period)?;
    let k = on_valid(&rsi, |tail| stoch_k(tail, tail, tail, fastk_period))?;
    let d = on_valid(&k, |tail| ma(tail, fastd_period, fastd_ma))?;
    Ok(StochLines { k, d })
}

/// One-bar percentage change of a triple EMA.
pub fn trix(close: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let e1 = ema(close, period)?;
    let e2 = on_valid(&e1, |tail| ema(tail, period))?;
    let e3 = on_valid(&e2, |tail| ema(tail, period))?;
    let mut out = vec![f64::NAN; close.len()];
    for i in 1..close.len() {
        if e3[i - 1] != 0.0 {
            out[i] = (e3[i] - e3[i - 1]) / e3[i - 1] * 100.0;
        }
    }
    if out.iter().all(|v| v.is_nan()) {
        return Err(TaError::InsufficientData {
            needed: 3 * period - 1,
            available: close.len(),
        });
    }
    Ok(out)
}

/// Ultimate oscillator weighting three buying-pressure averages 4:2:1.
pub fn ultosc(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period1: usize,
    period2: usize,
    period3: usize,
) -> Result<Vec<f64>, TaError> {
    let len = same_len(&[high.len(), low.len(), close.len()])?;
    check_period("timeperiod1", period1, 1)?;
    check_period("timeperiod2", period2, 1)?;
    check_period("timeperiod3", period3, 1)?;
    let longest = period1.max(period2).max(period3);
    require_len(len, longest + 1)?;

    let mut pressure = vec![0.0; len];
    let mut range = vec![0.0; len];
    for i in 1..len {
        let true_low = low[i].min(close[i - 1]);
        let true_high = high[i].max(close[i - 1]);
        pressure[i] = close[i] - true_low;
        range[i] = true_high - true_low;
    }
    let average = |i: usize, n: usize| {
        let bp: f64 = pressure[i + 1 - n..=i].iter().sum();
        let tr: f64 = range[i + 1 - n..=i].iter().sum();
        if tr > 0.0 { bp / tr } else { 0.0 }
    };
    let mut out = vec![f64::NAN; len];
    for (i, slot) in out.iter_mut().enumerate().skip(longest) {
        *slot = 100.0 * (4.0 * average(i, period1) + 2.0 * average(i, period2) + average(i, period3))
            / 7.0;
    }
    Ok(out)
}

/// Williams %R, from 0 (at the high) to -100 (at the low).
pub fn willr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Result<Vec<f64>, TaError> {
    let len = same_len(&[high.len(), low.len(), close.len()])?;
    check_period("timeperiod", period, 2)?;
    require_len(len, period)?;
    let mut out = vec![f64::NAN; len];
    for (i, slot) in out.iter_mut().enumerate().skip(period - 1) {
        let start = i + 1 - period;
        let hh = highest(high, start, i).0;
        let ll = lowest(low, start, i).0;
        *slot = if hh > ll {
            -100.0 * (hh - close[i]) / (hh - ll)
        } else {
            0.0
        };
    }
    Ok(out)
}
