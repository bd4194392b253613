//! Reusable kwargs schemas. Most functions share one of a handful of shapes,
//! so they are built from these pieces and combined with `merge`.

use crate::domain::kwargs::{FieldSpec, KwargsSchema};
use crate::domain::ta::MaType;

pub fn timeperiod(default: i64) -> KwargsSchema {
    KwargsSchema::new(vec![FieldSpec::int("timeperiod", default)])
}

pub fn matype(name: &'static str) -> KwargsSchema {
    KwargsSchema::new(vec![FieldSpec::ma_type(name, MaType::Sma)])
}

pub fn moving_average(default_period: i64) -> KwargsSchema {
    timeperiod(default_period).merge(&matype("matype"))
}

pub fn t3() -> KwargsSchema {
    timeperiod(5).merge(&KwargsSchema::new(vec![FieldSpec::float("vfactor", 0.7)]))
}

pub fn bbands() -> KwargsSchema {
    timeperiod(5)
        .merge(&KwargsSchema::new(vec![
            FieldSpec::float("nbdevup", 2.0),
            FieldSpec::float("nbdevdn", 2.0),
        ]))
        .merge(&matype("matype"))
}

pub fn fast_slow(fast: i64, slow: i64) -> KwargsSchema {
    KwargsSchema::new(vec![
        FieldSpec::int("fastperiod", fast),
        FieldSpec::int("slowperiod", slow),
    ])
}

pub fn price_oscillator() -> KwargsSchema {
    fast_slow(12, 26).merge(&matype("matype"))
}

pub fn macd() -> KwargsSchema {
    fast_slow(12, 26).merge(&KwargsSchema::new(vec![FieldSpec::int("signalperiod", 9)]))
}

pub fn sar() -> KwargsSchema {
    KwargsSchema::new(vec![
        FieldSpec::float("acceleration", 0.02),
        FieldSpec::float("maximum", 0.2),
    ])
}

pub fn stoch() -> KwargsSchema {
    KwargsSchema::new(vec![
        FieldSpec::int("fastk_period", 5),
        FieldSpec::int("slowk_period", 3),
        FieldSpec::ma_type("slowk_matype", MaType::Sma),
        FieldSpec::int("slowd_period", 3),
        FieldSpec::ma_type("slowd_matype", MaType::Sma),
    ])
}

fn fast_d() -> KwargsSchema {
    KwargsSchema::new(vec![
        FieldSpec::int("fastk_period", 5),
        FieldSpec::int("fastd_period", 3),
        FieldSpec::ma_type("fastd_matype", MaType::Sma),
    ])
}

pub fn stochf() -> KwargsSchema {
    fast_d()
}

pub fn stochrsi() -> KwargsSchema {
    timeperiod(14).merge(&fast_d())
}

pub fn ultosc() -> KwargsSchema {
    KwargsSchema::new(vec![
        FieldSpec::int("timeperiod1", 7),
        FieldSpec::int("timeperiod2", 14),
        FieldSpec::int("timeperiod3", 28),
    ])
}

pub fn stddev() -> KwargsSchema {
    timeperiod(5).merge(&KwargsSchema::new(vec![FieldSpec::float("nbdev", 1.0)]))
}

pub fn penetration(default: f64) -> KwargsSchema {
    KwargsSchema::new(vec![FieldSpec::float("penetration", default)])
}

pub fn constant() -> KwargsSchema {
    KwargsSchema::new(vec![FieldSpec::float("value", 0.0)])
}
