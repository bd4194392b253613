//! The static function catalog.

use super::evaluator::{Evaluator, ResultHandler};
use super::schemas;
use super::{FunctionEntry, FunctionGroup};
use crate::domain::extractor::Extractor;
use crate::domain::kwargs::KwargsSchema;
use crate::domain::ohlcv::PriceField;
use crate::domain::ta::candles::Pattern;
use crate::domain::ta::{math, momentum, overlap, price, statistics, volatility, volume};

const C: &[Extractor] = &[Extractor::Close];
const HL: &[Extractor] = &[Extractor::High, Extractor::Low];
const HLC: &[Extractor] = &[Extractor::High, Extractor::Low, Extractor::Close];
const OHLC: &[Extractor] = &[
    Extractor::Open,
    Extractor::High,
    Extractor::Low,
    Extractor::Close,
];
const HLCV: &[Extractor] = &[
    Extractor::High,
    Extractor::Low,
    Extractor::Close,
    Extractor::Volume,
];
const CV: &[Extractor] = &[Extractor::Close, Extractor::Volume];
const C_INDEX: &[Extractor] = &[Extractor::Close, Extractor::IndexClose];

fn entry(
    name: &'static str,
    group: FunctionGroup,
    description: &'static str,
    schema: Option<KwargsSchema>,
    evaluator: Evaluator,
) -> FunctionEntry {
    FunctionEntry::new(name, group, description, schema, evaluator)
}

pub fn catalog() -> Vec<FunctionEntry> {
    let mut entries = Vec::with_capacity(170);
    entries.extend(price_functions());
    entries.extend(overlap_studies());
    entries.extend(momentum_indicators());
    entries.extend(volume_and_volatility());
    entries.extend(math_functions());
    entries.extend(statistic_functions());
    entries.extend(Pattern::ALL.iter().map(|&pattern| {
        entry(
            pattern.name(),
            FunctionGroup::PatternRecognition,
            pattern.description(),
            pattern.default_penetration().map(schemas::penetration),
            Evaluator::Pattern(pattern),
        )
    }));
    entries
}

fn price_functions() -> Vec<FunctionEntry> {
    use FunctionGroup::{Price, PriceTransform};
    vec![
        entry("OPEN", Price, "Latest open", None, Evaluator::LatestBar(PriceField::Open)),
        entry("HIGH", Price, "Latest high", None, Evaluator::LatestBar(PriceField::High)),
        entry("LOW", Price, "Latest low", None, Evaluator::LatestBar(PriceField::Low)),
        entry("CLOSE", Price, "Latest close", None, Evaluator::LatestBar(PriceField::Close))
            .alias("PRICE"),
        entry("VOLUME", Price, "Latest volume", None, Evaluator::LatestBar(PriceField::Volume)),
        entry(
            "CONSTANT",
            Price,
            "A fixed number",
            Some(schemas::constant()),
            Evaluator::Constant,
        ),
        entry(
            "INDEX_CLOSE",
            Price,
            "Latest close of the benchmark index",
            None,
            Evaluator::IndexClose,
        ),
        entry(
            "AVGPRICE",
            PriceTransform,
            "Average Price",
            None,
            Evaluator::generic(OHLC, |s, _| price::avgprice(&s[0], &s[1], &s[2], &s[3])),
        ),
        entry(
            "MEDPRICE",
            PriceTransform,
            "Median Price",
            None,
            Evaluator::generic(HL, |s, _| price::medprice(&s[0], &s[1])),
        ),
        entry(
            "TYPPRICE",
            PriceTransform,
            "Typical Price",
            None,
            Evaluator::generic(HLC, |s, _| price::typprice(&s[0], &s[1], &s[2])),
        ),
        entry(
            "WCLPRICE",
            PriceTransform,
            "Weighted Close Price",
            None,
            Evaluator::generic(HLC, |s, _| price::wclprice(&s[0], &s[1], &s[2])),
        ),
    ]
}

fn overlap_studies() -> Vec<FunctionEntry> {
    use FunctionGroup::OverlapStudies as G;
    vec![
        entry(
            "SMA",
            G,
            "Simple Moving Average",
            Some(schemas::timeperiod(30)),
            Evaluator::windowed(C, |s, kw| overlap::sma(&s[0], kw.period("timeperiod")?)),
        ),
        entry(
            "EMA",
            G,
            "Exponential Moving Average",
            Some(schemas::timeperiod(30)),
            Evaluator::generic(C, |s, kw| overlap::ema(&s[0], kw.period("timeperiod")?)),
        ),
        entry(
            "WMA",
            G,
            "Weighted Moving Average",
            Some(schemas::timeperiod(30)),
            Evaluator::windowed(C, |s, kw| overlap::wma(&s[0], kw.period("timeperiod")?)),
        ),
        entry(
            "DEMA",
            G,
            "Double Exponential Moving Average",
            Some(schemas::timeperiod(30)),
            Evaluator::generic(C, |s, kw| overlap::dema(&s[0], kw.period("timeperiod")?)),
        ),
        entry(
            "TEMA",
            G,
            "Triple Exponential Moving Average",
            Some(schemas::timeperiod(30)),
            Evaluator::generic(C, |s, kw| overlap::tema(&s[0], kw.period("timeperiod")?)),
        ),
        entry(
            "TRIMA",
            G,
            "Triangular Moving Average",
            Some(schemas::timeperiod(30)),
            Evaluator::windowed(C, |s, kw| overlap::trima(&s[0], kw.period("timeperiod")?)),
        ),
        entry(
            "KAMA",
            G,
            "Kaufman Adaptive Moving Average",
            Some(schemas::timeperiod(30)),
            Evaluator::generic(C, |s, kw| overlap::kama(&s[0], kw.period("timeperiod")?)),
        ),
        entry(
            "T3",
            G,
            "Triple Exponential Moving Average (T3)",
            Some(schemas::t3()),
            Evaluator::generic(C, |s, kw| {
                overlap::t3(&s[0], kw.period("timeperiod")?, kw.float("vfactor")?)
            }),
        ),
        entry(
            "MA",
            G,
            "Moving average",
            Some(schemas::moving_average(30)),
            Evaluator::generic(C, |s, kw| {
                overlap::ma(&s[0], kw.period("timeperiod")?, kw.ma_type("matype")?)
            }),
        ),
        entry(
            "BBANDS_UPPER",
            G,
            "Bollinger Bands (upper band)",
            Some(schemas::bbands()),
            Evaluator::generic(C, |s, kw| Ok(bbands(&s[0], kw)?.upper)),
        )
        .alias("BOLLINGER_UPPER"),
        entry(
            "BBANDS_MIDDLE",
            G,
            "Bollinger Bands (middle band)",
            Some(schemas::bbands()),
            Evaluator::generic(C, |s, kw| Ok(bbands(&s[0], kw)?.middle)),
        )
        .alias("BOLLINGER_MIDDLE"),
        entry(
            "BBANDS_LOWER",
            G,
            "Bollinger Bands (lower band)",
            Some(schemas::bbands()),
            Evaluator::generic(C, |s, kw| Ok(bbands(&s[0], kw)?.lower)),
        )
        .alias("BOLLINGER_LOWER"),
        entry(
            "MIDPOINT",
            G,
            "MidPoint over period",
            Some(schemas::timeperiod(14)),
            Evaluator::windowed(C, |s, kw| overlap::midpoint(&s[0], kw.period("timeperiod")?)),
        ),
        entry(
            "MIDPRICE",
            G,
            "Midpoint Price over period",
            Some(schemas::timeperiod(14)),
            Evaluator::windowed(HL, |s, kw| {
                overlap::midprice(&s[0], &s[1], kw.period("timeperiod")?)
            }),
        ),
        entry(
            "SAR",
            G,
            "Parabolic SAR",
            Some(schemas::sar()),
            Evaluator::generic(HL, |s, kw| {
                overlap::sar(&s[0], &s[1], kw.float("acceleration")?, kw.float("maximum")?)
            }),
        ),
        entry(
            "ACCBANDS_UPPER",
            G,
            "Acceleration Bands (upper band)",
            Some(schemas::timeperiod(20)),
            Evaluator::generic(HLC, |s, kw| Ok(accbands(s, kw)?.upper)),
        ),
        entry(
            "ACCBANDS_MIDDLE",
            G,
            "Acceleration Bands (middle band)",
            Some(schemas::timeperiod(20)),
            Evaluator::generic(HLC, |s, kw| Ok(accbands(s, kw)?.middle)),
        ),
        entry(
            "ACCBANDS_LOWER",
            G,
            "Acceleration Bands (lower band)",
            Some(schemas::timeperiod(20)),
            Evaluator::generic(HLC, |s, kw| Ok(accbands(s, kw)?.lower)),
        ),
    ]
}

fn bbands(
    close: &[f64],
    kw: &crate::domain::kwargs::Kwargs,
) -> Result<overlap::Bands, crate::domain::ta::TaError> {
    overlap::bbands(
        close,
        kw.period("timeperiod")?,
        kw.float("nbdevup")?,
        kw.float("nbdevdn")?,
        kw.ma_type("matype")?,
    )
}

fn accbands(
    s: &[Vec<f64>],
    kw: &crate::domain::kwargs::Kwargs,
) -> Result<overlap::Bands, crate::domain::ta::TaError> {
    overlap::accbands(&s[0], &s[1], &s[2], kw.period("timeperiod")?)
}

fn momentum_indicators() -> Vec<FunctionEntry> {
    use FunctionGroup::MomentumIndicators as G;
    vec![
        entry(
            "ADX",
            G,
            "Average Directional Movement Index",
            Some(schemas::timeperiod(14)),
            Evaluator::generic(HLC, |s, kw| {
                momentum::adx(&s[0], &s[1], &s[2], kw.period("timeperiod")?)
            }),
        ),
        entry(
            "ADXR",
            G,
            "Average Directional Movement Index Rating",
            Some(schemas::timeperiod(14)),
            Evaluator::generic(HLC, |s, kw| {
                momentum::adxr(&s[0], &s[1], &s[2], kw.period("timeperiod")?)
            }),
        ),
        entry(
            "APO",
            G,
            "Absolute Price Oscillator",
            Some(schemas::price_oscillator()),
            Evaluator::generic(C, |s, kw| {
                momentum::apo(
                    &s[0],
                    kw.period("fastperiod")?,
                    kw.period("slowperiod")?,
                    kw.ma_type("matype")?,
                )
            }),
        ),
        entry(
            "AROON_DOWN",
            G,
            "Aroon (down line)",
            Some(schemas::timeperiod(14)),
            Evaluator::generic(HL, |s, kw| {
                Ok(momentum::aroon(&s[0], &s[1], kw.period("timeperiod")?)?.down)
            }),
        ),
        entry(
            "AROON_UP",
            G,
            "Aroon (up line)",
            Some(schemas::timeperiod(14)),
            Evaluator::generic(HL, |s, kw| {
                Ok(momentum::aroon(&s[0], &s[1], kw.period("timeperiod")?)?.up)
            }),
        ),
        entry(
            "AROONOSC",
            G,
            "Aroon Oscillator",
            Some(schemas::timeperiod(14)),
            Evaluator::generic(HL, |s, kw| {
                momentum::aroonosc(&s[0], &s[1], kw.period("timeperiod")?)
            }),
        ),
        entry(
            "BOP",
            G,
            "Balance Of Power",
            None,
            Evaluator::generic(OHLC, |s, _| momentum::bop(&s[0], &s[1], &s[2], &s[3])),
        ),
        entry(
            "CCI",
            G,
            "Commodity Channel Index",
            Some(schemas::timeperiod(14)),
            Evaluator::windowed(HLC, |s, kw| {
                momentum::cci(&s[0], &s[1], &s[2], kw.period("timeperiod")?)
            }),
        ),
        entry(
            "CMO",
            G,
            "Chande Momentum Oscillator",
            Some(schemas::timeperiod(14)),
            Evaluator::generic(C, |s, kw| momentum::cmo(&s[0], kw.period("timeperiod")?)),
        ),
        entry(
            "DX",
            G,
            "Directional Movement Index",
            Some(schemas::timeperiod(14)),
            Evaluator::generic(HLC, |s, kw| {
                momentum::dx(&s[0], &s[1], &s[2], kw.period("timeperiod")?)
            }),
        ),
        entry(
            "MACD",
            G,
            "Moving Average Convergence/Divergence",
            Some(schemas::macd()),
            Evaluator::generic(C, |s, kw| Ok(macd(&s[0], kw)?.macd)),
        ),
        entry(
            "MACD_SIGNAL",
            G,
            "Moving Average Convergence/Divergence (signal line)",
            Some(schemas::macd()),
            Evaluator::generic(C, |s, kw| Ok(macd(&s[0], kw)?.signal)),
        ),
        entry(
            "MACD_HIST",
            G,
            "Moving Average Convergence/Divergence (histogram)",
            Some(schemas::macd()),
            Evaluator::generic(C, |s, kw| Ok(macd(&s[0], kw)?.hist)),
        ),
        entry(
            "MFI",
            G,
            "Money Flow Index",
            Some(schemas::timeperiod(14)),
            Evaluator::generic(HLCV, |s, kw| {
                momentum::mfi(&s[0], &s[1], &s[2], &s[3], kw.period("timeperiod")?)
            }),
        ),
        entry(
            "MINUS_DI",
            G,
            "Minus Directional Indicator",
            Some(schemas::timeperiod(14)),
            Evaluator::generic(HLC, |s, kw| {
                momentum::minus_di(&s[0], &s[1], &s[2], kw.period("timeperiod")?)
            }),
        ),
        entry(
            "MINUS_DM",
            G,
            "Minus Directional Movement",
            Some(schemas::timeperiod(14)),
            Evaluator::generic(HL, |s, kw| {
                momentum::minus_dm(&s[0], &s[1], kw.period("timeperiod")?)
            }),
        ),
        entry(
            "MOM",
            G,
            "Momentum",
            Some(schemas::timeperiod(10)),
            Evaluator::generic(C, |s, kw| momentum::mom(&s[0], kw.period("timeperiod")?)),
        ),
        entry(
            "PLUS_DI",
            G,
            "Plus Directional Indicator",
            Some(schemas::timeperiod(14)),
            Evaluator::generic(HLC, |s, kw| {
                momentum::plus_di(&s[0], &s[1], &s[2], kw.period("timeperiod")?)
            }),
        ),
        entry(
            "PLUS_DM",
            G,
            "Plus Directional Movement",
            Some(schemas::timeperiod(14)),
            Evaluator::generic(HL, |s, kw| {
                momentum::plus_dm(&s[0], &s[1], kw.period("timeperiod")?)
            }),
        ),
        entry(
            "PPO",
            G,
            "Percentage Price Oscillator",
            Some(schemas::price_oscillator()),
            Evaluator::generic(C, |s, kw| {
                momentum::ppo(
                    &s[0],
                    kw.period("fastperiod")?,
                    kw.period("slowperiod")?,
                    kw.ma_type("matype")?,
                )
            }),
        ),
        entry(
            "ROC",
            G,
            "Rate of change: ((price/prevPrice)-1)*100",
            Some(schemas::timeperiod(10)),
            Evaluator::generic(C, |s, kw| momentum::roc(&s[0], kw.period("timeperiod")?)),
        ),
        entry(
            "ROCP",
            G,
            "Rate of change Percentage: (price-prevPrice)/prevPrice",
            Some(schemas::timeperiod(10)),
            Evaluator::generic(C, |s, kw| momentum::rocp(&s[0], kw.period("timeperiod")?)),
        ),
        entry(
            "ROCR",
            G,
            "Rate of change ratio: (price/prevPrice)",
            Some(schemas::timeperiod(10)),
            Evaluator::generic(C, |s, kw| momentum::rocr(&s[0], kw.period("timeperiod")?)),
        ),
        entry(
            "ROCR100",
            G,
            "Rate of change ratio 100 scale: (price/prevPrice)*100",
            Some(schemas::timeperiod(10)),
            Evaluator::generic(C, |s, kw| momentum::rocr100(&s[0], kw.period("timeperiod")?)),
        ),
        entry(
            "RSI",
            G,
            "Relative Strength Index",
            Some(schemas::timeperiod(14)),
            Evaluator::generic(C, |s, kw| momentum::rsi(&s[0], kw.period("timeperiod")?)),
        ),
        entry(
            "STOCH_SLOWK",
            G,
            "Stochastic (slow %K)",
            Some(schemas::stoch()),
            Evaluator::generic(HLC, |s, kw| Ok(stoch(s, kw)?.k)),
        ),
        entry(
            "STOCH_SLOWD",
            G,
            "Stochastic (slow %D)",
            Some(schemas::stoch()),
            Evaluator::generic(HLC, |s, kw| Ok(stoch(s, kw)?.d)),
        ),
        entry(
            "STOCHF_FASTK",
            G,
            "Stochastic Fast (%K)",
            Some(schemas::stochf()),
            Evaluator::generic(HLC, |s, kw| Ok(stochf(s, kw)?.k)),
        ),
        entry(
            "STOCHF_FASTD",
            G,
            "Stochastic Fast (%D)",
            Some(schemas::stochf()),
            Evaluator::generic(HLC, |s, kw| Ok(stochf(s, kw)?.d)),
        ),
        entry(
            "STOCHRSI_FASTK",
            G,
            "Stochastic Relative Strength Index (%K)",
            Some(schemas::stochrsi()),
            Evaluator::generic(C, |s, kw| Ok(stochrsi(&s[0], kw)?.k)),
        ),
        entry(
            "STOCHRSI_FASTD",
            G,
            "Stochastic Relative Strength Index (%D)",
            Some(schemas::stochrsi()),
            Evaluator::generic(C, |s, kw| Ok(stochrsi(&s[0], kw)?.d)),
        ),
        entry(
            "TRIX",
            G,
            "1-day Rate-Of-Change (ROC) of a Triple Smooth EMA",
            Some(schemas::timeperiod(30)),
            Evaluator::generic(C, |s, kw| momentum::trix(&s[0], kw.period("timeperiod")?)),
        ),
        entry(
            "ULTOSC",
            G,
            "Ultimate Oscillator",
            Some(schemas::ultosc()),
            Evaluator::generic(HLC, |s, kw| {
                momentum::ultosc(
                    &s[0],
                    &s[1],
                    &s[2],
                    kw.period("timeperiod1")?,
                    kw.period("timeperiod2")?,
                    kw.period("timeperiod3")?,
                )
            }),
        ),
        entry(
            "WILLR",
            G,
            "Williams' %R",
            Some(schemas::timeperiod(14)),
            Evaluator::windowed(HLC, |s, kw| {
                momentum::willr(&s[0], &s[1], &s[2], kw.period("timeperiod")?)
            }),
        ),
    ]
}

type Kw = crate::domain::kwargs::Kwargs;
type TaResult<T> = Result<T, crate::domain::ta::TaError>;

fn macd(close: &[f64], kw: &Kw) -> TaResult<momentum::MacdLines> {
    momentum::macd(
        close,
        kw.period("fastperiod")?,
        kw.period("slowperiod")?,
        kw.period("signalperiod")?,
    )
}

fn stoch(s: &[Vec<f64>], kw: &Kw) -> TaResult<momentum::StochLines> {
    momentum::stoch(
        &s[0],
        &s[1],
        &s[2],
        kw.period("fastk_period")?,
        kw.period("slowk_period")?,
        kw.ma_type("slowk_matype")?,
        kw.period("slowd_period")?,
        kw.ma_type("slowd_matype")?,
    )
}

fn stochf(s: &[Vec<f64>], kw: &Kw) -> TaResult<momentum::StochLines> {
    momentum::stochf(
        &s[0],
        &s[1],
        &s[2],
        kw.period("fastk_period")?,
        kw.period("fastd_period")?,
        kw.ma_type("fastd_matype")?,
    )
}

fn stochrsi(close: &[f64], kw: &Kw) -> TaResult<momentum::StochLines> {
    momentum::stochrsi(
        close,
        kw.period("timeperiod")?,
        kw.period("fastk_period")?,
        kw.period("fastd_period")?,
        kw.ma_type("fastd_matype")?,
    )
}

fn volume_and_volatility() -> Vec<FunctionEntry> {
    use FunctionGroup::{VolatilityIndicators, VolumeIndicators};
    vec![
        entry(
            "AD",
            VolumeIndicators,
            "Chaikin A/D Line",
            None,
            Evaluator::generic(HLCV, |s, _| volume::ad(&s[0], &s[1], &s[2], &s[3])),
        ),
        entry(
            "ADOSC",
            VolumeIndicators,
            "Chaikin A/D Oscillator",
            Some(schemas::fast_slow(3, 10)),
            Evaluator::generic(HLCV, |s, kw| {
                volume::adosc(
                    &s[0],
                    &s[1],
                    &s[2],
                    &s[3],
                    kw.period("fastperiod")?,
                    kw.period("slowperiod")?,
                )
            }),
        ),
        entry(
            "OBV",
            VolumeIndicators,
            "On Balance Volume",
            None,
            Evaluator::generic(CV, |s, _| volume::obv(&s[0], &s[1])),
        ),
        entry(
            "ATR",
            VolatilityIndicators,
            "Average True Range",
            Some(schemas::timeperiod(14)),
            Evaluator::generic(HLC, |s, kw| {
                volatility::atr(&s[0], &s[1], &s[2], kw.period("timeperiod")?)
            }),
        ),
        entry(
            "NATR",
            VolatilityIndicators,
            "Normalized Average True Range",
            Some(schemas::timeperiod(14)),
            Evaluator::generic(HLC, |s, kw| {
                volatility::natr(&s[0], &s[1], &s[2], kw.period("timeperiod")?)
            }),
        ),
        entry(
            "TRANGE",
            VolatilityIndicators,
            "True Range",
            None,
            Evaluator::generic(HLC, |s, _| volatility::trange(&s[0], &s[1], &s[2])),
        ),
    ]
}

fn math_functions() -> Vec<FunctionEntry> {
    use FunctionGroup::{MathOperators as G, MathTransform as T};
    let mut entries = vec![
        entry(
            "ADD",
            G,
            "Vector Arithmetic Add (high + low)",
            None,
            Evaluator::generic(HL, |s, _| math::add(&s[0], &s[1])),
        ),
        entry(
            "SUB",
            G,
            "Vector Arithmetic Subtraction (high - low)",
            None,
            Evaluator::generic(HL, |s, _| math::sub(&s[0], &s[1])),
        ),
        entry(
            "MULT",
            G,
            "Vector Arithmetic Mult (high * low)",
            None,
            Evaluator::generic(HL, |s, _| math::mult(&s[0], &s[1])),
        ),
        entry(
            "DIV",
            G,
            "Vector Arithmetic Div (high / low)",
            None,
            Evaluator::generic(HL, |s, _| math::div(&s[0], &s[1])),
        ),
        entry(
            "MAX",
            G,
            "Highest value over a specified period",
            Some(schemas::timeperiod(30)),
            Evaluator::windowed(C, |s, kw| math::max(&s[0], kw.period("timeperiod")?)),
        ),
        entry(
            "MAXINDEX",
            G,
            "Index of highest value over a specified period",
            Some(schemas::timeperiod(30)),
            Evaluator::generic(C, |s, kw| math::maxindex(&s[0], kw.period("timeperiod")?))
                .with_handler(ResultHandler::LatestInt),
        ),
        entry(
            "MIN",
            G,
            "Lowest value over a specified period",
            Some(schemas::timeperiod(30)),
            Evaluator::windowed(C, |s, kw| math::min(&s[0], kw.period("timeperiod")?)),
        ),
        entry(
            "MININDEX",
            G,
            "Index of lowest value over a specified period",
            Some(schemas::timeperiod(30)),
            Evaluator::generic(C, |s, kw| math::minindex(&s[0], kw.period("timeperiod")?))
                .with_handler(ResultHandler::LatestInt),
        ),
        entry(
            "SUM",
            G,
            "Summation",
            Some(schemas::timeperiod(30)),
            Evaluator::windowed(C, |s, kw| math::sum(&s[0], kw.period("timeperiod")?)),
        ),
    ];
    entries.extend([
        entry("ACOS", T, "Vector Trigonometric ACos", None, Evaluator::generic(C, |s, _| Ok(math::transform(&s[0], f64::acos)))),
        entry("ASIN", T, "Vector Trigonometric ASin", None, Evaluator::generic(C, |s, _| Ok(math::transform(&s[0], f64::asin)))),
        entry("ATAN", T, "Vector Trigonometric ATan", None, Evaluator::generic(C, |s, _| Ok(math::transform(&s[0], f64::atan)))),
        entry("CEIL", T, "Vector Ceil", None, Evaluator::generic(C, |s, _| Ok(math::transform(&s[0], f64::ceil)))),
        entry("COS", T, "Vector Trigonometric Cos", None, Evaluator::generic(C, |s, _| Ok(math::transform(&s[0], f64::cos)))),
        entry("COSH", T, "Vector Trigonometric Cosh", None, Evaluator::generic(C, |s, _| Ok(math::transform(&s[0], f64::cosh)))),
        entry("EXP", T, "Vector Arithmetic Exp", None, Evaluator::generic(C, |s, _| Ok(math::transform(&s[0], f64::exp)))),
        entry("FLOOR", T, "Vector Floor", None, Evaluator::generic(C, |s, _| Ok(math::transform(&s[0], f64::floor)))),
        entry("LN", T, "Vector Log Natural", None, Evaluator::generic(C, |s, _| Ok(math::transform(&s[0], f64::ln)))),
        entry("LOG10", T, "Vector Log10", None, Evaluator::generic(C, |s, _| Ok(math::transform(&s[0], f64::log10)))),
        entry("SIN", T, "Vector Trigonometric Sin", None, Evaluator::generic(C, |s, _| Ok(math::transform(&s[0], f64::sin)))),
        entry("SINH", T, "Vector Trigonometric Sinh", None, Evaluator::generic(C, |s, _| Ok(math::transform(&s[0], f64::sinh)))),
        entry("SQRT", T, "Vector Square Root", None, Evaluator::generic(C, |s, _| Ok(math::transform(&s[0], f64::sqrt)))),
        entry("TAN", T, "Vector Trigonometric Tan", None, Evaluator::generic(C, |s, _| Ok(math::transform(&s[0], f64::tan)))),
        entry("TANH", T, "Vector Trigonometric Tanh", None, Evaluator::generic(C, |s, _| Ok(math::transform(&s[0], f64::tanh)))),
    ]);
    entries
}

fn statistic_functions() -> Vec<FunctionEntry> {
    use FunctionGroup::StatisticFunctions as G;
    vec![
        entry(
            "BETA",
            G,
            "Beta against the benchmark index",
            Some(schemas::timeperiod(5)),
            Evaluator::generic(C_INDEX, |s, kw| {
                statistics::beta(&s[0], &s[1], kw.period("timeperiod")?)
            }),
        ),
        entry(
            "CORREL",
            G,
            "Pearson's Correlation Coefficient with the benchmark index",
            Some(schemas::timeperiod(30)),
            Evaluator::windowed(C_INDEX, |s, kw| {
                statistics::correl(&s[0], &s[1], kw.period("timeperiod")?)
            }),
        ),
        entry(
            "LINEARREG",
            G,
            "Linear Regression",
            Some(schemas::timeperiod(14)),
            Evaluator::windowed(C, |s, kw| statistics::linearreg(&s[0], kw.period("timeperiod")?)),
        ),
        entry(
            "LINEARREG_ANGLE",
            G,
            "Linear Regression Angle",
            Some(schemas::timeperiod(14)),
            Evaluator::windowed(C, |s, kw| {
                statistics::linearreg_angle(&s[0], kw.period("timeperiod")?)
            }),
        ),
        entry(
            "LINEARREG_INTERCEPT",
            G,
            "Linear Regression Intercept",
            Some(schemas::timeperiod(14)),
            Evaluator::windowed(C, |s, kw| {
                statistics::linearreg_intercept(&s[0], kw.period("timeperiod")?)
            }),
        ),
        entry(
            "LINEARREG_SLOPE",
            G,
            "Linear Regression Slope",
            Some(schemas::timeperiod(14)),
            Evaluator::windowed(C, |s, kw| {
                statistics::linearreg_slope(&s[0], kw.period("timeperiod")?)
            }),
        ),
        entry(
            "STDDEV",
            G,
            "Standard Deviation",
            Some(schemas::stddev()),
            Evaluator::windowed(C, |s, kw| {
                statistics::stddev(&s[0], kw.period("timeperiod")?, kw.float("nbdev")?)
            }),
        ),
        entry(
            "TSF",
            G,
            "Time Series Forecast",
            Some(schemas::timeperiod(14)),
            Evaluator::windowed(C, |s, kw| statistics::tsf(&s[0], kw.period("timeperiod")?)),
        ),
        entry(
            "VAR",
            G,
            "Variance",
            Some(schemas::timeperiod(5)),
            Evaluator::windowed(C, |s, kw| statistics::var(&s[0], kw.period("timeperiod")?)),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instrument::Instrument;
    use crate::domain::kwargs::RawKwargs;
    use crate::domain::ohlcv::OhlcvBar;
    use crate::domain::registry::FunctionRegistry;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn instrument(code: &str, n: usize, phase: f64) -> Instrument {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let bars = (0..n)
            .map(|i| {
                let t = i as f64;
                let close = 50.0 + t * 0.2 + (t * 0.45 + phase).sin() * 3.0;
                OhlcvBar {
                    code: code.into(),
                    exchange: "ASX".into(),
                    date: start + chrono::Duration::days(i as i64),
                    open: close - (t * 0.3).cos(),
                    high: close + 1.5,
                    low: close - 1.5,
                    close,
                    volume: 10_000 + (i as i64 % 7) * 1_000,
                }
            })
            .collect();
        Instrument::new(code.into(), "ASX".into(), bars)
    }

    #[test]
    fn indicators_evaluate_on_long_history() {
        let registry = FunctionRegistry::new();
        let index = Arc::new(instrument("XJO", 300, 1.3));
        let inst = instrument("BHP", 300, 0.0).with_benchmark(index);
        let domain_limited = ["ACOS", "ASIN", "COSH", "EXP", "SINH"];
        for entry in registry
            .entries()
            .filter(|e| e.group != FunctionGroup::PatternRecognition)
            .filter(|e| !domain_limited.contains(&e.name))
        {
            let spec = registry.make_function_spec(entry.name, &RawKwargs::new()).unwrap();
            let value = registry.evaluate(&spec, &inst);
            assert!(
                value.as_ref().is_ok_and(|v| v.is_finite()),
                "{} -> {value:?}",
                entry.name
            );
        }
    }

    #[test]
    fn patterns_evaluate_to_signal_values() {
        let registry = FunctionRegistry::new();
        let inst = instrument("BHP", 120, 0.0);
        for pattern in Pattern::ALL {
            let spec = registry.make_function_spec(pattern.name(), &RawKwargs::new()).unwrap();
            let value = registry.evaluate(&spec, &inst).unwrap();
            assert!([-100.0, 0.0, 100.0].contains(&value), "{}", pattern.name());
        }
    }

    #[test]
    fn windowed_and_full_history_agree() {
        let registry = FunctionRegistry::new();
        let inst = instrument("BHP", 200, 0.0);
        let spec = registry.make_function_spec("SMA", &RawKwargs::new()).unwrap();
        let windowed = registry.evaluate(&spec, &inst).unwrap();
        let closes = inst.series(PriceField::Close, None);
        let full = *overlap::sma(&closes, 30).unwrap().last().unwrap();
        assert!((windowed - full).abs() < 1e-9);
    }

    #[test]
    fn maxindex_is_an_integer() {
        let registry = FunctionRegistry::new();
        let inst = instrument("BHP", 100, 0.0);
        let spec = registry.make_function_spec("MAXINDEX", &RawKwargs::new()).unwrap();
        let value = registry.evaluate(&spec, &inst).unwrap();
        assert_eq!(value.fract(), 0.0);
        assert!((70.0..100.0).contains(&value));
    }
}
