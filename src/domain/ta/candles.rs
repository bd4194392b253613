//! Candlestick pattern recognition.
//!
//! Each pattern is scored per bar: `100` bullish, `-100` bearish, `0` absent.
//! "Long", "short" and "near" are judged against rolling averages of the
//! preceding candles, so a pattern needs `AVERAGE_PERIOD` bars of history
//! before its first candle.

use super::{TaError, require_len, same_len};

/// Bars averaged to decide what counts as a long body, a short shadow, etc.
const AVERAGE_PERIOD: usize = 10;

#[derive(Debug, Clone, Copy)]
enum RangeKind {
    RealBody,
    HighLow,
    Shadows,
}

#[derive(Debug, Clone, Copy)]
struct Setting {
    kind: RangeKind,
    period: usize,
    factor: f64,
}

const BODY_LONG: Setting = Setting { kind: RangeKind::RealBody, period: 10, factor: 1.0 };
const BODY_SHORT: Setting = Setting { kind: RangeKind::RealBody, period: 10, factor: 1.0 };
const BODY_DOJI: Setting = Setting { kind: RangeKind::HighLow, period: 10, factor: 0.1 };
const SHADOW_LONG: Setting = Setting { kind: RangeKind::RealBody, period: 0, factor: 1.0 };
const SHADOW_VERY_LONG: Setting = Setting { kind: RangeKind::RealBody, period: 0, factor: 2.0 };
const SHADOW_SHORT: Setting = Setting { kind: RangeKind::Shadows, period: 10, factor: 1.0 };
const SHADOW_VERY_SHORT: Setting = Setting { kind: RangeKind::HighLow, period: 10, factor: 0.1 };
const NEAR: Setting = Setting { kind: RangeKind::HighLow, period: 5, factor: 0.2 };
const EQUAL: Setting = Setting { kind: RangeKind::HighLow, period: 5, factor: 0.05 };

macro_rules! patterns {
    ($($variant:ident => ($name:literal, $label:literal, $candles:literal, $penetration:expr)),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Pattern {
            $($variant),+
        }

        impl Pattern {
            pub const ALL: &'static [Pattern] = &[$(Pattern::$variant),+];

            /// Registry name, e.g. `CDLENGULFING`.
            pub fn name(self) -> &'static str {
                match self {
                    $(Pattern::$variant => $name),+
                }
            }

            pub fn description(self) -> &'static str {
                match self {
                    $(Pattern::$variant => $label),+
                }
            }

            /// Number of candles the pattern spans.
            pub fn candles(self) -> usize {
                match self {
                    $(Pattern::$variant => $candles),+
                }
            }

            /// Default `penetration` for patterns that take one.
            pub fn default_penetration(self) -> Option<f64> {
                match self {
                    $(Pattern::$variant => $penetration),+
                }
            }
        }
    };
}

patterns! {
    TwoCrows => ("CDL2CROWS", "Two Crows", 3, None),
    ThreeBlackCrows => ("CDL3BLACKCROWS", "Three Black Crows", 4, None),
    ThreeInside => ("CDL3INSIDE", "Three Inside Up/Down", 3, None),
    ThreeLineStrike => ("CDL3LINESTRIKE", "Three-Line Strike", 4, None),
    ThreeOutside => ("CDL3OUTSIDE", "Three Outside Up/Down", 3, None),
    ThreeStarsInSouth => ("CDL3STARSINSOUTH", "Three Stars In The South", 3, None),
    ThreeWhiteSoldiers => ("CDL3WHITESOLDIERS", "Three Advancing White Soldiers", 3, None),
    AbandonedBaby => ("CDLABANDONEDBABY", "Abandoned Baby", 3, Some(0.3)),
    AdvanceBlock => ("CDLADVANCEBLOCK", "Advance Block", 3, None),
    BeltHold => ("CDLBELTHOLD", "Belt-hold", 1, None),
    Breakaway => ("CDLBREAKAWAY", "Breakaway", 5, None),
    ClosingMarubozu => ("CDLCLOSINGMARUBOZU", "Closing Marubozu", 1, None),
    ConcealBabySwallow => ("CDLCONCEALBABYSWALL", "Concealing Baby Swallow", 4, None),
    Counterattack => ("CDLCOUNTERATTACK", "Counterattack", 2, None),
    DarkCloudCover => ("CDLDARKCLOUDCOVER", "Dark Cloud Cover", 2, Some(0.5)),
    Doji => ("CDLDOJI", "Doji", 1, None),
    DojiStar => ("CDLDOJISTAR", "Doji Star", 2, None),
    DragonflyDoji => ("CDLDRAGONFLYDOJI", "Dragonfly Doji", 1, None),
    Engulfing => ("CDLENGULFING", "Engulfing Pattern", 2, None),
    EveningDojiStar => ("CDLEVENINGDOJISTAR", "Evening Doji Star", 3, Some(0.3)),
    EveningStar => ("CDLEVENINGSTAR", "Evening Star", 3, Some(0.3)),
    GapSideSideWhite => ("CDLGAPSIDESIDEWHITE", "Up/Down-gap side-by-side white lines", 3, None),
    GravestoneDoji => ("CDLGRAVESTONEDOJI", "Gravestone Doji", 1, None),
    Hammer => ("CDLHAMMER", "Hammer", 2, None),
    HangingMan => ("CDLHANGINGMAN", "Hanging Man", 2, None),
    Harami => ("CDLHARAMI", "Harami Pattern", 2, None),
    HaramiCross => ("CDLHARAMICROSS", "Harami Cross Pattern", 2, None),
    HighWave => ("CDLHIGHWAVE", "High-Wave Candle", 1, None),
    Hikkake => ("CDLHIKKAKE", "Hikkake Pattern", 3, None),
    HikkakeMod => ("CDLHIKKAKEMOD", "Modified Hikkake Pattern", 4, None),
    HomingPigeon => ("CDLHOMINGPIGEON", "Homing Pigeon", 2, None),
    IdenticalThreeCrows => ("CDLIDENTICAL3CROWS", "Identical Three Crows", 3, None),
    InNeck => ("CDLINNECK", "In-Neck Pattern", 2, None),
    InvertedHammer => ("CDLINVERTEDHAMMER", "Inverted Hammer", 2, None),
    Kicking => ("CDLKICKING", "Kicking", 2, None),
    KickingByLength => ("CDLKICKINGBYLENGTH", "Kicking - bull/bear determined by the longer marubozu", 2, None),
    LadderBottom => ("CDLLADDERBOTTOM", "Ladder Bottom", 5, None),
    LongLeggedDoji => ("CDLLONGLEGGEDDOJI", "Long Legged Doji", 1, None),
    LongLine => ("CDLLONGLINE", "Long Line Candle", 1, None),
    Marubozu => ("CDLMARUBOZU", "Marubozu", 1, None),
    MatchingLow => ("CDLMATCHINGLOW", "Matching Low", 2, None),
    MatHold => ("CDLMATHOLD", "Mat Hold", 5, Some(0.5)),
    MorningDojiStar => ("CDLMORNINGDOJISTAR", "Morning Doji Star", 3, Some(0.3)),
    MorningStar => ("CDLMORNINGSTAR", "Morning Star", 3, Some(0.3)),
    OnNeck => ("CDLONNECK", "On-Neck Pattern", 2, None),
    Piercing => ("CDLPIERCING", "Piercing Pattern", 2, None),
    RickshawMan => ("CDLRICKSHAWMAN", "Rickshaw Man", 1, None),
    RiseFallThreeMethods => ("CDLRISEFALL3METHODS", "Rising/Falling Three Methods", 5, None),
    SeparatingLines => ("CDLSEPARATINGLINES", "Separating Lines", 2, None),
    ShootingStar => ("CDLSHOOTINGSTAR", "Shooting Star", 2, None),
    ShortLine => ("CDLSHORTLINE", "Short Line Candle", 1, None),
    SpinningTop => ("CDLSPINNINGTOP", "Spinning Top", 1, None),
    StalledPattern => ("CDLSTALLEDPATTERN", "Stalled Pattern", 3, None),
    StickSandwich => ("CDLSTICKSANDWICH", "Stick Sandwich", 3, None),
    Takuri => ("CDLTAKURI", "Takuri (Dragonfly Doji with very long lower shadow)", 1, None),
    TasukiGap => ("CDLTASUKIGAP", "Tasuki Gap", 3, None),
    Thrusting => ("CDLTHRUSTING", "Thrusting Pattern", 2, None),
    Tristar => ("CDLTRISTAR", "Tristar Pattern", 3, None),
    UniqueThreeRiver => ("CDLUNIQUE3RIVER", "Unique 3 River", 3, None),
    UpsideGapTwoCrows => ("CDLUPSIDEGAP2CROWS", "Upside Gap Two Crows", 3, None),
    XSideGapThreeMethods => ("CDLXSIDEGAP3METHODS", "Upside/Downside Gap Three Methods", 3, None),
}

impl Pattern {
    /// Bars before the first scored bar.
    pub fn lookback(self) -> usize {
        AVERAGE_PERIOD + self.candles() - 1
    }
}

struct Candles<'a> {
    open: &'a [f64],
    high: &'a [f64],
    low: &'a [f64],
    close: &'a [f64],
}

impl Candles<'_> {
    fn body(&self, j: usize) -> f64 {
        (self.close[j] - self.open[j]).abs()
    }

    fn top(&self, j: usize) -> f64 {
        self.open[j].max(self.close[j])
    }

    fn bottom(&self, j: usize) -> f64 {
        self.open[j].min(self.close[j])
    }

    fn upper(&self, j: usize) -> f64 {
        self.high[j] - self.top(j)
    }

    fn lower(&self, j: usize) -> f64 {
        self.bottom(j) - self.low[j]
    }

    fn range(&self, j: usize) -> f64 {
        self.high[j] - self.low[j]
    }

    fn white(&self, j: usize) -> bool {
        self.close[j] >= self.open[j]
    }

    fn black(&self, j: usize) -> bool {
        !self.white(j)
    }

    fn color(&self, j: usize) -> i32 {
        if self.white(j) { 100 } else { -100 }
    }

    fn measure(&self, kind: RangeKind, j: usize) -> f64 {
        match kind {
            RangeKind::RealBody => self.body(j),
            RangeKind::HighLow => self.range(j),
            RangeKind::Shadows => (self.upper(j) + self.lower(j)) / 2.0,
        }
    }

    /// Setting threshold for candle `j`, averaged over the candles before it.
    fn average(&self, setting: Setting, j: usize) -> f64 {
        let start = j.saturating_sub(setting.period);
        if setting.period == 0 || start == j {
            return setting.factor * self.measure(setting.kind, j);
        }
        let total: f64 = (start..j).map(|k| self.measure(setting.kind, k)).sum();
        setting.factor * total / (j - start) as f64
    }

    fn long_body(&self, j: usize) -> bool {
        self.body(j) > self.average(BODY_LONG, j)
    }

    fn short_body(&self, j: usize) -> bool {
        self.body(j) < self.average(BODY_SHORT, j)
    }

    fn doji(&self, j: usize) -> bool {
        self.body(j) <= self.average(BODY_DOJI, j)
    }

    fn long_shadow(&self, shadow: f64, j: usize) -> bool {
        shadow > self.average(SHADOW_LONG, j)
    }

    fn very_long_shadow(&self, shadow: f64, j: usize) -> bool {
        shadow > self.average(SHADOW_VERY_LONG, j)
    }

    fn short_shadow(&self, shadow: f64, j: usize) -> bool {
        shadow < self.average(SHADOW_SHORT, j)
    }

    fn very_short_shadow(&self, shadow: f64, j: usize) -> bool {
        shadow < self.average(SHADOW_VERY_SHORT, j)
    }

    fn near(&self, j: usize) -> f64 {
        self.average(NEAR, j)
    }

    fn equal(&self, j: usize) -> f64 {
        self.average(EQUAL, j)
    }

    fn marubozu(&self, j: usize) -> bool {
        self.long_body(j)
            && self.very_short_shadow(self.upper(j), j)
            && self.very_short_shadow(self.lower(j), j)
    }

    /// Body of `later` entirely above the body of `earlier`.
    fn body_gap_up(&self, later: usize, earlier: usize) -> bool {
        self.bottom(later) > self.top(earlier)
    }

    fn body_gap_down(&self, later: usize, earlier: usize) -> bool {
        self.top(later) < self.bottom(earlier)
    }

    fn candle_gap_up(&self, later: usize, earlier: usize) -> bool {
        self.low[later] > self.high[earlier]
    }

    fn candle_gap_down(&self, later: usize, earlier: usize) -> bool {
        self.high[later] < self.low[earlier]
    }

    /// Body of `inner` strictly contained in the body of `outer`.
    fn body_inside(&self, inner: usize, outer: usize) -> bool {
        self.top(inner) < self.top(outer) && self.bottom(inner) > self.bottom(outer)
    }

    /// Full range of `inner` strictly inside the range of `outer`.
    fn inside_bar(&self, inner: usize, outer: usize) -> bool {
        self.high[inner] < self.high[outer] && self.low[inner] > self.low[outer]
    }

    fn opens_within_body(&self, j: usize, of: usize) -> bool {
        self.open[j] <= self.top(of) && self.open[j] >= self.bottom(of)
    }
}

fn signal(bullish: bool, bearish: bool) -> i32 {
    if bullish {
        100
    } else if bearish {
        -100
    } else {
        0
    }
}

/// Scores every bar of the series for `pattern`. Bars inside the look-back
/// are `NaN`.
pub fn recognize(
    pattern: Pattern,
    open: &[f64],
    high: &[f64],
    low: &[f64],
    close: &[f64],
    penetration: Option<f64>,
) -> Result<Vec<f64>, TaError> {
    let len = same_len(&[open.len(), high.len(), low.len(), close.len()])?;
    let penetration = penetration.or(pattern.default_penetration()).unwrap_or(0.0);
    if !(0.0..=1.0).contains(&penetration) {
        return Err(TaError::InvalidParameter {
            name: "penetration",
            reason: format!("must be within [0, 1], got {penetration}"),
        });
    }
    let lookback = pattern.lookback();
    require_len(len, lookback + 1)?;

    let candles = Candles {
        open,
        high,
        low,
        close,
    };
    let mut out = vec![f64::NAN; len];
    for (i, slot) in out.iter_mut().enumerate().skip(lookback) {
        *slot = f64::from(detect(pattern, &candles, i, penetration));
    }
    Ok(out)
}

fn detect(pattern: Pattern, k: &Candles<'_>, i: usize, pen: f64) -> i32 {
    let (o, h, l, c) = (k.open, k.high, k.low, k.close);
    match pattern {
        Pattern::TwoCrows => {
            let (a, b) = (i - 2, i - 1);
            let hit = k.white(a)
                && k.long_body(a)
                && k.black(b)
                && k.body_gap_up(b, a)
                && k.black(i)
                && o[i] < o[b]
                && o[i] > c[b]
                && c[i] > o[a]
                && c[i] < c[a];
            signal(false, hit)
        }
        Pattern::ThreeBlackCrows => {
            let (w, a, b) = (i - 3, i - 2, i - 1);
            let hit = k.white(w)
                && [a, b, i].iter().all(|&j| k.black(j) && k.very_short_shadow(k.lower(j), j))
                && k.opens_within_body(b, a)
                && k.opens_within_body(i, b)
                && c[a] > c[b]
                && c[b] > c[i]
                && h[w] > c[a];
            signal(false, hit)
        }
        Pattern::ThreeInside => {
            let (a, b) = (i - 2, i - 1);
            if !(k.long_body(a) && k.short_body(b) && k.body_inside(b, a)) {
                return 0;
            }
            signal(
                k.black(a) && k.white(i) && c[i] > o[a],
                k.white(a) && k.black(i) && c[i] < o[a],
            )
        }
        Pattern::ThreeLineStrike => {
            let (a, b, d) = (i - 3, i - 2, i - 1);
            let same = k.white(a) == k.white(b) && k.white(b) == k.white(d);
            if !same || k.white(i) == k.white(d) {
                return 0;
            }
            let bull = k.white(d) && c[b] > c[a] && c[d] > c[b] && o[i] > c[d] && c[i] < o[a];
            let bear = k.black(d) && c[b] < c[a] && c[d] < c[b] && o[i] < c[d] && c[i] > o[a];
            signal(bull, bear)
        }
        Pattern::ThreeOutside => {
            let (a, b) = (i - 2, i - 1);
            let bull = k.black(a) && k.white(b) && c[b] > o[a] && o[b] < c[a] && c[i] > c[b];
            let bear = k.white(a) && k.black(b) && o[b] > c[a] && c[b] < o[a] && c[i] < c[b];
            signal(bull, bear)
        }
        Pattern::ThreeStarsInSouth => {
            let (a, b) = (i - 2, i - 1);
            let hit = [a, b, i].iter().all(|&j| k.black(j))
                && k.long_body(a)
                && k.long_shadow(k.lower(a), a)
                && k.body(b) < k.body(a)
                && o[b] > c[a]
                && o[b] <= h[a]
                && l[b] > l[a]
                && k.short_body(i)
                && k.very_short_shadow(k.upper(i), i)
                && k.very_short_shadow(k.lower(i), i)
                && k.inside_bar(i, b);
            signal(hit, false)
        }
        Pattern::ThreeWhiteSoldiers => {
            let (a, b) = (i - 2, i - 1);
            let hit = [a, b, i]
                .iter()
                .all(|&j| k.white(j) && k.very_short_shadow(k.upper(j), j) && !k.short_body(j))
                && c[b] > c[a]
                && c[i] > c[b]
                && o[b] > o[a]
                && o[b] <= c[a] + k.near(a)
                && o[i] > o[b]
                && o[i] <= c[b] + k.near(b);
            signal(hit, false)
        }
        Pattern::AbandonedBaby => {
            let (a, b) = (i - 2, i - 1);
            if !(k.long_body(a) && k.doji(b) && k.body(i) > k.average(BODY_SHORT, i)) {
                return 0;
            }
            let bull = k.black(a)
                && k.white(i)
                && k.candle_gap_down(b, a)
                && k.candle_gap_up(i, b)
                && c[i] > c[a] + k.body(a) * pen;
            let bear = k.white(a)
                && k.black(i)
                && k.candle_gap_up(b, a)
                && k.candle_gap_down(i, b)
                && c[i] < c[a] - k.body(a) * pen;
            signal(bull, bear)
        }
        Pattern::AdvanceBlock => {
            let (a, b) = (i - 2, i - 1);
            let hit = [a, b, i].iter().all(|&j| k.white(j))
                && c[b] > c[a]
                && c[i] > c[b]
                && k.opens_within_body(b, a)
                && k.opens_within_body(i, b)
                && k.long_body(a)
                && k.short_shadow(k.upper(a), a)
                && (k.body(i) < k.body(b) && k.body(b) < k.body(a)
                    || k.upper(i) > k.upper(b) && k.upper(b) > k.upper(a));
            signal(false, hit)
        }
        Pattern::BeltHold => {
            if !k.long_body(i) {
                return 0;
            }
            signal(
                k.white(i) && k.very_short_shadow(k.lower(i), i),
                k.black(i) && k.very_short_shadow(k.upper(i), i),
            )
        }
        Pattern::Breakaway => {
            let (a, b, d, e) = (i - 4, i - 3, i - 2, i - 1);
            if !(k.long_body(a) && k.white(a) != k.white(i) && k.white(a) == k.white(b)) {
                return 0;
            }
            let bull = k.black(a)
                && k.black(e)
                && k.body_gap_down(b, a)
                && h[d] < h[b]
                && l[d] < l[b]
                && h[e] < h[d]
                && l[e] < l[d]
                && c[i] > o[b]
                && c[i] < c[a];
            let bear = k.white(a)
                && k.white(e)
                && k.body_gap_up(b, a)
                && h[d] > h[b]
                && l[d] > l[b]
                && h[e] > h[d]
                && l[e] > l[d]
                && c[i] < o[b]
                && c[i] > c[a];
            signal(bull, bear)
        }
        Pattern::ClosingMarubozu => {
            if !k.long_body(i) {
                return 0;
            }
            signal(
                k.white(i) && k.very_short_shadow(k.upper(i), i),
                k.black(i) && k.very_short_shadow(k.lower(i), i),
            )
        }
        Pattern::ConcealBabySwallow => {
            let (a, b, d) = (i - 3, i - 2, i - 1);
            let hit = [a, b, d, i].iter().all(|&j| k.black(j))
                && k.marubozu(a)
                && k.marubozu(b)
                && k.body_gap_down(d, b)
                && h[d] > c[b]
                && h[i] > h[d]
                && l[i] < l[d];
            signal(hit, false)
        }
        Pattern::Counterattack => {
            let b = i - 1;
            let hit = k.white(b) != k.white(i)
                && k.long_body(b)
                && k.long_body(i)
                && (c[i] - c[b]).abs() <= k.equal(b);
            if hit { k.color(i) } else { 0 }
        }
        Pattern::DarkCloudCover => {
            let b = i - 1;
            let hit = k.white(b)
                && k.long_body(b)
                && k.black(i)
                && o[i] > h[b]
                && c[i] > o[b]
                && c[i] < c[b] - k.body(b) * pen;
            signal(false, hit)
        }
        Pattern::Doji => signal(k.doji(i), false),
        Pattern::DojiStar => {
            let b = i - 1;
            if !(k.long_body(b) && k.doji(i)) {
                return 0;
            }
            signal(
                k.black(b) && k.body_gap_down(i, b),
                k.white(b) && k.body_gap_up(i, b),
            )
        }
        Pattern::DragonflyDoji => signal(
            k.doji(i)
                && k.very_short_shadow(k.upper(i), i)
                && !k.very_short_shadow(k.lower(i), i),
            false,
        ),
        Pattern::Engulfing => {
            let b = i - 1;
            signal(
                k.black(b) && k.white(i) && c[i] > o[b] && o[i] < c[b],
                k.white(b) && k.black(i) && o[i] > c[b] && c[i] < o[b],
            )
        }
        Pattern::EveningDojiStar | Pattern::EveningStar => {
            let (a, b) = (i - 2, i - 1);
            let star = if pattern == Pattern::EveningDojiStar {
                k.doji(b)
            } else {
                k.short_body(b)
            };
            let hit = k.white(a)
                && k.long_body(a)
                && star
                && k.body_gap_up(b, a)
                && k.black(i)
                && k.body(i) > k.average(BODY_SHORT, i)
                && c[i] < c[a] - k.body(a) * pen;
            signal(false, hit)
        }
        Pattern::MorningDojiStar | Pattern::MorningStar => {
            let (a, b) = (i - 2, i - 1);
            let star = if pattern == Pattern::MorningDojiStar {
                k.doji(b)
            } else {
                k.short_body(b)
            };
            let hit = k.black(a)
                && k.long_body(a)
                && star
                && k.body_gap_down(b, a)
                && k.white(i)
                && k.body(i) > k.average(BODY_SHORT, i)
                && c[i] > c[a] + k.body(a) * pen;
            signal(hit, false)
        }
        Pattern::GapSideSideWhite => {
            let (a, b) = (i - 2, i - 1);
            let pair = k.white(b)
                && k.white(i)
                && (k.body(i) - k.body(b)).abs() < k.near(b)
                && (o[i] - o[b]).abs() < k.equal(b);
            if !pair {
                return 0;
            }
            signal(
                k.body_gap_up(b, a) && k.body_gap_up(i, a),
                k.body_gap_down(b, a) && k.body_gap_down(i, a),
            )
        }
        Pattern::GravestoneDoji => signal(
            k.doji(i)
                && k.very_short_shadow(k.lower(i), i)
                && !k.very_short_shadow(k.upper(i), i),
            false,
        ),
        Pattern::Hammer | Pattern::HangingMan => {
            let b = i - 1;
            let shape = k.short_body(i)
                && k.long_shadow(k.lower(i), i)
                && k.very_short_shadow(k.upper(i), i);
            if !shape {
                return 0;
            }
            if pattern == Pattern::Hammer {
                signal(k.bottom(i) <= l[b] + k.near(b), false)
            } else {
                signal(false, k.bottom(i) >= h[b] - k.near(b))
            }
        }
        Pattern::Harami | Pattern::HaramiCross => {
            let b = i - 1;
            let inner = if pattern == Pattern::Harami {
                k.short_body(i)
            } else {
                k.doji(i)
            };
            if !(k.long_body(b) && inner && k.body_inside(i, b)) {
                return 0;
            }
            signal(k.black(b), k.white(b))
        }
        Pattern::HighWave => {
            let hit = k.short_body(i)
                && k.very_long_shadow(k.upper(i), i)
                && k.very_long_shadow(k.lower(i), i);
            if hit { k.color(i) } else { 0 }
        }
        Pattern::Hikkake => {
            let (a, b) = (i - 2, i - 1);
            if !k.inside_bar(b, a) {
                return 0;
            }
            signal(
                h[i] < h[b] && l[i] < l[b],
                h[i] > h[b] && l[i] > l[b],
            )
        }
        Pattern::HikkakeMod => {
            let (a, b, d) = (i - 3, i - 2, i - 1);
            if !(k.inside_bar(b, a) && k.inside_bar(d, b)) {
                return 0;
            }
            let bull = h[i] < h[d] && l[i] < l[d] && c[d] <= l[d] + k.range(d) * 0.2;
            let bear = h[i] > h[d] && l[i] > l[d] && c[d] >= h[d] - k.range(d) * 0.2;
            signal(bull, bear)
        }
        Pattern::HomingPigeon => {
            let b = i - 1;
            let hit = k.black(b)
                && k.long_body(b)
                && k.black(i)
                && k.short_body(i)
                && k.body_inside(i, b);
            signal(hit, false)
        }
        Pattern::IdenticalThreeCrows => {
            let (a, b) = (i - 2, i - 1);
            let hit = [a, b, i]
                .iter()
                .all(|&j| k.black(j) && k.very_short_shadow(k.lower(j), j))
                && c[a] > c[b]
                && c[b] > c[i]
                && (o[b] - c[a]).abs() <= k.equal(a)
                && (o[i] - c[b]).abs() <= k.equal(b);
            signal(false, hit)
        }
        Pattern::InNeck | Pattern::OnNeck | Pattern::Thrusting => {
            let b = i - 1;
            if !(k.black(b) && k.long_body(b) && k.white(i) && o[i] < l[b]) {
                return 0;
            }
            let hit = match pattern {
                Pattern::InNeck => c[i] <= c[b] + k.equal(b) && c[i] >= c[b],
                Pattern::OnNeck => (c[i] - l[b]).abs() <= k.equal(b),
                _ => c[i] > c[b] + k.equal(b) && c[i] <= c[b] + k.body(b) * 0.5,
            };
            signal(false, hit)
        }
        Pattern::InvertedHammer | Pattern::ShootingStar => {
            let b = i - 1;
            let shape = k.short_body(i)
                && k.long_shadow(k.upper(i), i)
                && k.very_short_shadow(k.lower(i), i);
            if !shape {
                return 0;
            }
            if pattern == Pattern::InvertedHammer {
                signal(k.body_gap_down(i, b), false)
            } else {
                signal(false, k.body_gap_up(i, b))
            }
        }
        Pattern::Kicking | Pattern::KickingByLength => {
            let b = i - 1;
            if !(k.marubozu(b) && k.marubozu(i) && k.white(b) != k.white(i)) {
                return 0;
            }
            let gapped = if k.white(i) {
                k.candle_gap_up(i, b)
            } else {
                k.candle_gap_down(i, b)
            };
            if !gapped {
                return 0;
            }
            if pattern == Pattern::Kicking {
                k.color(i)
            } else if k.body(i) >= k.body(b) {
                k.color(i)
            } else {
                k.color(b)
            }
        }
        Pattern::LadderBottom => {
            let (a, b, d, e) = (i - 4, i - 3, i - 2, i - 1);
            let hit = [a, b, d, e].iter().all(|&j| k.black(j))
                && o[b] < o[a]
                && o[d] < o[b]
                && c[b] < c[a]
                && c[d] < c[b]
                && !k.very_short_shadow(k.upper(e), e)
                && k.white(i)
                && o[i] > o[e]
                && c[i] > h[e];
            signal(hit, false)
        }
        Pattern::LongLeggedDoji => signal(
            k.doji(i)
                && (k.long_shadow(k.lower(i), i) || k.long_shadow(k.upper(i), i)),
            false,
        ),
        Pattern::LongLine => {
            let hit = k.long_body(i)
                && k.short_shadow(k.upper(i), i)
                && k.short_shadow(k.lower(i), i);
            if hit { k.color(i) } else { 0 }
        }
        Pattern::Marubozu => {
            if k.marubozu(i) { k.color(i) } else { 0 }
        }
        Pattern::MatchingLow => {
            let b = i - 1;
            signal(
                k.black(b) && k.black(i) && (c[i] - c[b]).abs() <= k.equal(b),
                false,
            )
        }
        Pattern::MatHold => {
            let (a, b, d, e) = (i - 4, i - 3, i - 2, i - 1);
            let floor = c[a] - k.body(a) * pen;
            let hit = k.white(a)
                && k.long_body(a)
                && k.short_body(b)
                && k.black(b)
                && k.body_gap_up(b, a)
                && k.short_body(d)
                && k.short_body(e)
                && k.bottom(d) > floor
                && k.bottom(e) > floor
                && c[d] < c[b]
                && c[e] < c[d]
                && k.white(i)
                && o[i] > c[e]
                && c[i] > h[b].max(h[d]).max(h[e]);
            signal(hit, false)
        }
        Pattern::Piercing => {
            let b = i - 1;
            let hit = k.black(b)
                && k.long_body(b)
                && k.white(i)
                && k.long_body(i)
                && o[i] < l[b]
                && c[i] < o[b]
                && c[i] > c[b] + k.body(b) * 0.5;
            signal(hit, false)
        }
        Pattern::RickshawMan => {
            let middle = l[i] + k.range(i) / 2.0;
            let hit = k.doji(i)
                && k.long_shadow(k.lower(i), i)
                && k.long_shadow(k.upper(i), i)
                && k.bottom(i) <= middle + k.near(i)
                && k.top(i) >= middle - k.near(i);
            signal(hit, false)
        }
        Pattern::RiseFallThreeMethods => {
            let (a, b, d, e) = (i - 4, i - 3, i - 2, i - 1);
            let small = [b, d, e].iter().all(|&j| k.short_body(j));
            if !(k.long_body(a) && k.long_body(i) && small && k.white(a) == k.white(i)) {
                return 0;
            }
            let rising = k.white(a)
                && [b, d, e].iter().all(|&j| k.top(j) < h[a] && k.bottom(j) > l[a])
                && c[d] < c[b]
                && c[e] < c[d]
                && o[i] > c[e]
                && c[i] > c[a];
            let falling = k.black(a)
                && [b, d, e].iter().all(|&j| k.top(j) < h[a] && k.bottom(j) > l[a])
                && c[d] > c[b]
                && c[e] > c[d]
                && o[i] < c[e]
                && c[i] < c[a];
            signal(rising, falling)
        }
        Pattern::SeparatingLines => {
            let b = i - 1;
            if !(k.white(b) != k.white(i) && (o[i] - o[b]).abs() <= k.equal(b) && k.long_body(i)) {
                return 0;
            }
            signal(
                k.white(i) && k.very_short_shadow(k.lower(i), i),
                k.black(i) && k.very_short_shadow(k.upper(i), i),
            )
        }
        Pattern::ShortLine => {
            let hit = k.short_body(i)
                && k.short_shadow(k.upper(i), i)
                && k.short_shadow(k.lower(i), i);
            if hit { k.color(i) } else { 0 }
        }
        Pattern::SpinningTop => {
            let hit = k.short_body(i) && k.upper(i) > k.body(i) && k.lower(i) > k.body(i);
            if hit { k.color(i) } else { 0 }
        }
        Pattern::StalledPattern => {
            let (a, b) = (i - 2, i - 1);
            let hit = [a, b, i].iter().all(|&j| k.white(j))
                && c[b] > c[a]
                && c[i] > c[b]
                && k.long_body(a)
                && k.long_body(b)
                && k.very_short_shadow(k.upper(b), b)
                && o[b] > o[a]
                && o[b] <= c[a] + k.near(a)
                && k.short_body(i)
                && o[i] >= c[b] - k.body(i) - k.near(b);
            signal(false, hit)
        }
        Pattern::StickSandwich => {
            let (a, b) = (i - 2, i - 1);
            let hit = k.black(a)
                && k.white(b)
                && k.black(i)
                && l[b] > c[a]
                && (c[i] - c[a]).abs() <= k.equal(a);
            signal(hit, false)
        }
        Pattern::Takuri => signal(
            k.doji(i)
                && k.very_short_shadow(k.upper(i), i)
                && k.very_long_shadow(k.lower(i), i),
            false,
        ),
        Pattern::TasukiGap => {
            let (a, b) = (i - 2, i - 1);
            let similar = (k.body(b) - k.body(i)).abs() < k.near(b);
            let up = k.body_gap_up(b, a)
                && k.white(b)
                && k.black(i)
                && o[i] < c[b]
                && o[i] > o[b]
                && c[i] < o[b]
                && c[i] > k.top(a)
                && similar;
            let down = k.body_gap_down(b, a)
                && k.black(b)
                && k.white(i)
                && o[i] < o[b]
                && o[i] > c[b]
                && c[i] > o[b]
                && c[i] < k.bottom(a)
                && similar;
            signal(up, down)
        }
        Pattern::Tristar => {
            let (a, b) = (i - 2, i - 1);
            if !(k.doji(a) && k.doji(b) && k.doji(i)) {
                return 0;
            }
            signal(
                k.body_gap_down(b, a) && k.bottom(i) > k.bottom(b),
                k.body_gap_up(b, a) && k.top(i) < k.top(b),
            )
        }
        Pattern::UniqueThreeRiver => {
            let (a, b) = (i - 2, i - 1);
            let hit = k.black(a)
                && k.long_body(a)
                && k.black(b)
                && c[b] > c[a]
                && o[b] <= o[a]
                && l[b] < l[a]
                && k.white(i)
                && k.short_body(i)
                && o[i] > l[b]
                && c[i] < c[b];
            signal(hit, false)
        }
        Pattern::UpsideGapTwoCrows => {
            let (a, b) = (i - 2, i - 1);
            let hit = k.white(a)
                && k.long_body(a)
                && k.black(b)
                && k.short_body(b)
                && k.body_gap_up(b, a)
                && k.black(i)
                && o[i] > o[b]
                && c[i] < c[b]
                && c[i] > c[a];
            signal(false, hit)
        }
        Pattern::XSideGapThreeMethods => {
            let (a, b) = (i - 2, i - 1);
            let up = k.white(a)
                && k.white(b)
                && k.black(i)
                && k.body_gap_up(b, a)
                && o[i] < c[b]
                && o[i] > o[b]
                && c[i] < c[a]
                && c[i] > o[a];
            let down = k.black(a)
                && k.black(b)
                && k.white(i)
                && k.body_gap_down(b, a)
                && o[i] > c[b]
                && o[i] < o[b]
                && c[i] > c[a]
                && c[i] < o[a];
            signal(up, down)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Series {
        open: Vec<f64>,
        high: Vec<f64>,
        low: Vec<f64>,
        close: Vec<f64>,
    }

    impl Series {
        /// Twelve quiet white candles: body 1.0, range 2.0.
        fn background() -> Self {
            let mut s = Series {
                open: vec![],
                high: vec![],
                low: vec![],
                close: vec![],
            };
            for _ in 0..12 {
                s.push(10.0, 11.5, 9.5, 11.0);
            }
            s
        }

        fn push(&mut self, o: f64, h: f64, l: f64, c: f64) -> &mut Self {
            self.open.push(o);
            self.high.push(h);
            self.low.push(l);
            self.close.push(c);
            self
        }

        fn last(&self, pattern: Pattern) -> f64 {
            let out = recognize(pattern, &self.open, &self.high, &self.low, &self.close, None)
                .unwrap();
            *out.last().unwrap()
        }
    }

    #[test]
    fn catalogue_has_61_unique_names() {
        let mut names: Vec<&str> = Pattern::ALL.iter().map(|p| p.name()).collect();
        assert_eq!(names.len(), 61);
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 61);
        assert!(names.iter().all(|n| n.starts_with("CDL")));
    }

    #[test]
    fn penetration_defaults() {
        assert_eq!(Pattern::MorningStar.default_penetration(), Some(0.3));
        assert_eq!(Pattern::DarkCloudCover.default_penetration(), Some(0.5));
        assert_eq!(Pattern::Doji.default_penetration(), None);
    }

    #[test]
    fn doji_detected() {
        let mut s = Series::background();
        s.push(10.0, 11.0, 9.0, 10.01);
        assert_eq!(s.last(Pattern::Doji), 100.0);
    }

    #[test]
    fn ordinary_candle_is_not_doji() {
        let s = Series::background();
        assert_eq!(s.last(Pattern::Doji), 0.0);
    }

    #[test]
    fn bullish_engulfing() {
        let mut s = Series::background();
        s.push(11.0, 11.2, 9.9, 10.0).push(9.8, 11.6, 9.7, 11.5);
        assert_eq!(s.last(Pattern::Engulfing), 100.0);
    }

    #[test]
    fn bearish_engulfing() {
        let mut s = Series::background();
        s.push(10.0, 11.1, 9.9, 11.0).push(11.2, 11.3, 9.6, 9.7);
        assert_eq!(s.last(Pattern::Engulfing), -100.0);
    }

    #[test]
    fn white_marubozu() {
        let mut s = Series::background();
        s.push(10.0, 13.02, 9.99, 13.0);
        assert_eq!(s.last(Pattern::Marubozu), 100.0);
        assert_eq!(s.last(Pattern::ClosingMarubozu), 100.0);
    }

    #[test]
    fn hammer_at_prior_low() {
        let mut s = Series::background();
        s.push(9.6, 9.85, 8.0, 9.8);
        assert_eq!(s.last(Pattern::Hammer), 100.0);
        assert_eq!(s.last(Pattern::HangingMan), 0.0);
    }

    #[test]
    fn morning_star() {
        let mut s = Series::background();
        s.push(12.0, 12.1, 8.9, 9.0)
            .push(8.5, 8.7, 8.4, 8.6)
            .push(8.8, 11.6, 8.7, 11.5);
        assert_eq!(s.last(Pattern::MorningStar), 100.0);
        assert_eq!(s.last(Pattern::EveningStar), 0.0);
    }

    #[test]
    fn every_pattern_scores_within_range() {
        let mut s = Series::background();
        for i in 0..40 {
            let base = 10.0 + (i as f64 * 0.9).sin() * 2.0;
            let drift = (i as f64 * 0.37).cos();
            s.push(base, base + 1.0 + drift.abs(), base - 1.0, base + drift);
        }
        for &pattern in Pattern::ALL {
            let out = recognize(pattern, &s.open, &s.high, &s.low, &s.close, None).unwrap();
            assert_eq!(out.len(), s.open.len());
            for v in out.iter().skip(pattern.lookback()) {
                assert!(
                    *v == 0.0 || *v == 100.0 || *v == -100.0,
                    "{} produced {v}",
                    pattern.name()
                );
            }
        }
    }

    #[test]
    fn short_history_is_an_error() {
        let v = [1.0; 5];
        assert!(matches!(
            recognize(Pattern::Doji, &v, &v, &v, &v, None),
            Err(TaError::InsufficientData { .. })
        ));
    }

    #[test]
    fn penetration_out_of_range() {
        let s = Series::background();
        assert!(matches!(
            recognize(Pattern::MorningStar, &s.open, &s.high, &s.low, &s.close, Some(1.5)),
            Err(TaError::InvalidParameter { name: "penetration", .. })
        ));
    }
}
