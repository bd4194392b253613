//! Stock profiling: windowed returns, criteria results and a ranking score
//! for every instrument in a stockset.
//!
//! Instruments are the only unit of parallelism. Each one is loaded,
//! evaluated and scored on a worker of a private thread pool; criteria for a
//! single instrument run sequentially.

use crate::domain::criteria::Criteria;
use crate::domain::error::ScreenerError;
use crate::domain::instrument::Instrument;
use crate::domain::rule_eval::evaluate_criteria;
use crate::domain::universe::{Stockset, StocksetContext, resolve_stockset};
use crate::ports::data_port::DataPort;
use crate::ports::stockset_port::StocksetPort;
use chrono::{Days, NaiveDate};
use rayon::prelude::*;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Longest return window, about 100 years.
pub const MAX_WINDOW_DAYS: u32 = 36_600;

/// A trailing period over which a percentage return is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnWindow {
    pub label: String,
    pub days: u32,
}

impl ReturnWindow {
    pub fn new(label: impl Into<String>, days: u32) -> Self {
        Self {
            label: label.into(),
            days,
        }
    }

    /// Output column name.
    pub fn key(&self) -> String {
        format!("return_{}", self.label)
    }

    /// Parses `LABEL:DAYS,LABEL:DAYS,...`. Days must be in
    /// `1..=MAX_WINDOW_DAYS` and labels unique.
    pub fn parse_list(input: &str) -> Result<Vec<ReturnWindow>, String> {
        let mut windows: Vec<ReturnWindow> = Vec::new();
        for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (label, days) = token
                .split_once(':')
                .ok_or_else(|| format!("expected LABEL:DAYS, got {token:?}"))?;
            let label = label.trim();
            if label.is_empty() {
                return Err(format!("empty label in {token:?}"));
            }
            let days: u32 = days
                .trim()
                .parse()
                .map_err(|_| format!("invalid day count in {token:?}"))?;
            if days == 0 || days > MAX_WINDOW_DAYS {
                return Err(format!("day count must be between 1 and {MAX_WINDOW_DAYS} in {token:?}"));
            }
            if windows.iter().any(|w| w.label == label) {
                return Err(format!("duplicate label {label}"));
            }
            windows.push(ReturnWindow::new(label, days));
        }
        Ok(windows)
    }
}

pub fn default_return_windows() -> Vec<ReturnWindow> {
    vec![
        ReturnWindow::new("1W", 7),
        ReturnWindow::new("1M", 30),
        ReturnWindow::new("3M", 91),
        ReturnWindow::new("6M", 182),
        ReturnWindow::new("1Y", 365),
    ]
}

#[derive(Debug, Clone)]
pub struct ProfileOptions {
    /// Size of the worker pool.
    pub workers: usize,
    pub price_tolerance_days: u32,
    /// Look for the nearest later price instead of the nearest earlier one.
    pub search_forward: bool,
    pub return_windows: Vec<ReturnWindow>,
    pub exchange: String,
    /// Calendar days of history loaded per instrument.
    pub history_days: u32,
    /// Last date loaded; today when `None`.
    pub end_date: Option<NaiveDate>,
    /// Reference index attached to every instrument.
    pub benchmark: Option<String>,
    /// Remaining instruments are abandoned once this much time has passed.
    pub timeout: Option<Duration>,
    pub cancel: Arc<AtomicBool>,
    pub ignore_unsupported_func: bool,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            workers: 2,
            price_tolerance_days: 5,
            search_forward: false,
            return_windows: default_return_windows(),
            exchange: "ASX".to_string(),
            history_days: 730,
            end_date: None,
            benchmark: None,
            timeout: None,
            cancel: Arc::new(AtomicBool::new(false)),
            ignore_unsupported_func: true,
        }
    }
}

/// `((end - start) / start) * 100` over `days` ending at `end`.
///
/// Missing prices are looked up within the tolerance; when either price
/// cannot be found, the window starts before the calendar does, or the start
/// price is zero, the return is zero.
pub fn calculate_return(
    instrument: &Instrument,
    end: NaiveDate,
    days: u32,
    tolerance_days: u32,
    search_forward: bool,
) -> f64 {
    let Some(start) = end.checked_sub_days(Days::new(u64::from(days))) else {
        return 0.0;
    };
    let prices = (
        instrument.price_on_date(start, tolerance_days, search_forward),
        instrument.price_on_date(end, tolerance_days, search_forward),
    );
    match prices {
        (Some(from), Some(to)) if from != 0.0 => (to - from) / from * 100.0,
        _ => 0.0,
    }
}

/// Percentage of `passed` out of `total`, rounded; `None` when `total` is 0.
pub fn ranking_score(passed: usize, total: usize) -> Option<u32> {
    if total == 0 {
        return None;
    }
    Some((passed as f64 / total as f64 * 100.0).round() as u32)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One instrument's row in a profiling run.
///
/// Serialises as a flat object: identity, latest close, one `return_*` key
/// per window, one boolean per criterion and `score` when there is one.
#[derive(Debug, Clone, PartialEq)]
pub struct StockProfile {
    pub code: String,
    pub exchange: String,
    pub date: NaiveDate,
    pub close: f64,
    pub returns: Vec<(String, f64)>,
    pub criteria: Vec<(String, bool)>,
    pub score: Option<u32>,
}

impl Serialize for StockProfile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = 4 + self.returns.len() + self.criteria.len() + usize::from(self.score.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("code", &self.code)?;
        map.serialize_entry("exchange", &self.exchange)?;
        map.serialize_entry("date", &self.date)?;
        map.serialize_entry("close", &self.close)?;
        for (key, value) in &self.returns {
            map.serialize_entry(key, value)?;
        }
        for (label, passed) in &self.criteria {
            map.serialize_entry(label, passed)?;
        }
        if let Some(score) = self.score {
            map.serialize_entry("score", &score)?;
        }
        map.end()
    }
}

pub fn profile_instrument(
    instrument: &Instrument,
    criteria: &Criteria,
    options: &ProfileOptions,
) -> Result<StockProfile, ScreenerError> {
    let latest = instrument.latest().ok_or_else(|| ScreenerError::NoData {
        code: instrument.code.clone(),
        exchange: instrument.exchange.clone(),
    })?;
    let returns = options
        .return_windows
        .iter()
        .map(|window| {
            let value = calculate_return(
                instrument,
                latest.date,
                window.days,
                options.price_tolerance_days,
                options.search_forward,
            );
            (window.key(), round2(value))
        })
        .collect();
    let evaluation = evaluate_criteria(instrument, criteria, options.ignore_unsupported_func)?;
    Ok(StockProfile {
        code: instrument.code.clone(),
        exchange: instrument.exchange.clone(),
        date: latest.date,
        close: latest.close,
        returns,
        criteria: evaluation.to_bool_map(),
        score: evaluation.ranking_score(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    LoadFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoData => f.write_str("no data"),
            SkipReason::LoadFailed(reason) => f.write_str(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCode {
    pub code: String,
    pub reason: SkipReason,
}

/// Result of profiling a stockset. Profiles follow stockset order.
#[derive(Debug, Clone, Default)]
pub struct ProfileRun {
    pub profiles: Vec<StockProfile>,
    pub skipped: Vec<SkippedCode>,
    /// Set when cancellation or the timeout cut the run short.
    pub truncated: bool,
}

enum Outcome {
    Profiled(StockProfile),
    Skipped(SkippedCode),
    Abandoned,
}

struct Job<'a> {
    data: &'a dyn DataPort,
    criteria: &'a Criteria,
    options: &'a ProfileOptions,
    start: NaiveDate,
    end: NaiveDate,
    benchmark: Option<Arc<Instrument>>,
    deadline: Option<Instant>,
}

impl Job<'_> {
    fn stopped(&self) -> bool {
        self.options.cancel.load(Ordering::Relaxed) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn load(&self, code: &str) -> Result<Instrument, SkipReason> {
        let exchange = &self.options.exchange;
        let bars = self
            .data
            .fetch_ohlcv(code, exchange, self.start, self.end)
            .map_err(|e| SkipReason::LoadFailed(e.to_string()))?;
        if bars.is_empty() {
            return Err(SkipReason::NoData);
        }
        let instrument = Instrument::new(code.to_string(), exchange.clone(), bars);
        Ok(match &self.benchmark {
            Some(index) => instrument.with_benchmark(Arc::clone(index)),
            None => instrument,
        })
    }

    fn run(&self, code: &str) -> Result<Outcome, ScreenerError> {
        if self.stopped() {
            return Ok(Outcome::Abandoned);
        }
        let instrument = match self.load(code) {
            Ok(instrument) => instrument,
            Err(reason) => {
                warn!(code, exchange = %self.options.exchange, %reason, "skipping instrument");
                return Ok(Outcome::Skipped(SkippedCode {
                    code: code.to_string(),
                    reason,
                }));
            }
        };
        profile_instrument(&instrument, self.criteria, self.options).map(Outcome::Profiled)
    }
}

fn load_benchmark(
    data: &dyn DataPort,
    options: &ProfileOptions,
    start: NaiveDate,
    end: NaiveDate,
) -> Option<Arc<Instrument>> {
    let code = options.benchmark.as_deref()?;
    match data.fetch_ohlcv(code, &options.exchange, start, end) {
        Ok(bars) if !bars.is_empty() => Some(Arc::new(Instrument::new(
            code.to_string(),
            options.exchange.clone(),
            bars,
        ))),
        Ok(_) => {
            warn!(benchmark = code, "benchmark has no data; index functions will fail");
            None
        }
        Err(e) => {
            warn!(benchmark = code, error = %e, "benchmark failed to load; index functions will fail");
            None
        }
    }
}

/// Date range fetched per instrument: `history_days` ending at the configured
/// end date, or today. The start clamps to the earliest representable date.
pub fn history_window(options: &ProfileOptions) -> (NaiveDate, NaiveDate) {
    let end = options
        .end_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let start = end
        .checked_sub_days(Days::new(u64::from(options.history_days)))
        .unwrap_or(NaiveDate::MIN);
    (start, end)
}

/// Loads a single instrument over the history window, benchmark attached.
pub fn load_instrument(
    data: &dyn DataPort,
    code: &str,
    options: &ProfileOptions,
) -> Result<Instrument, ScreenerError> {
    let (start, end) = history_window(options);
    let bars = data.fetch_ohlcv(code, &options.exchange, start, end)?;
    if bars.is_empty() {
        return Err(ScreenerError::NoData {
            code: code.to_string(),
            exchange: options.exchange.clone(),
        });
    }
    let instrument = Instrument::new(code.to_string(), options.exchange.clone(), bars);
    Ok(match load_benchmark(data, options, start, end) {
        Some(index) => instrument.with_benchmark(index),
        None => instrument,
    })
}

/// Profiles every instrument in `stockset` against `criteria`.
pub fn profile_stockset(
    data: &dyn DataPort,
    stocksets: &dyn StocksetPort,
    stockset: &Stockset,
    context: &StocksetContext,
    criteria: &Criteria,
    options: &ProfileOptions,
) -> Result<ProfileRun, ScreenerError> {
    let started = Instant::now();
    let codes = resolve_stockset(stocksets, data, stockset, context)?;
    let (start, end) = history_window(options);

    let job = Job {
        data,
        criteria,
        options,
        start,
        end,
        benchmark: load_benchmark(data, options, start, end),
        deadline: options.timeout.map(|t| started + t),
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers.max(1))
        .build()
        .map_err(|e| ScreenerError::ConfigInvalid {
            section: "profile".into(),
            key: "workers".into(),
            reason: e.to_string(),
        })?;

    let outcomes = pool.install(|| {
        codes
            .par_iter()
            .map(|code| job.run(code))
            .collect::<Result<Vec<_>, _>>()
    })?;

    let mut run = ProfileRun::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Profiled(profile) => run.profiles.push(profile),
            Outcome::Skipped(skipped) => run.skipped.push(skipped),
            Outcome::Abandoned => run.truncated = true,
        }
    }

    if run.truncated {
        warn!(
            stockset = %stockset,
            profiled = run.profiles.len(),
            total = codes.len(),
            "profiling cut short; returning partial results"
        );
    }
    info!(
        stockset = %stockset,
        profiled = run.profiles.len(),
        skipped = run.skipped.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "profiling complete"
    );
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::comparison::ComparisonOperator;
    use crate::domain::criterion::make_criterion;
    use crate::domain::function_spec::RawFunctionSpec;
    use crate::domain::ohlcv::OhlcvBar;
    use std::collections::HashMap;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn bars(code: &str, start: &str, closes: &[f64]) -> Vec<OhlcvBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                code: code.into(),
                exchange: "ASX".into(),
                date: day(start) + chrono::TimeDelta::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000,
            })
            .collect()
    }

    fn above(value: f64) -> Criteria {
        [make_criterion(
            &RawFunctionSpec::new("CLOSE"),
            &RawFunctionSpec::new("CONSTANT").with_kwarg("value", value),
            ComparisonOperator::GreaterThan,
            None,
            false,
        )
        .unwrap()]
        .into_iter()
        .collect()
    }

    struct Data(HashMap<String, Vec<OhlcvBar>>);

    impl DataPort for Data {
        fn fetch_ohlcv(
            &self,
            code: &str,
            _exchange: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<OhlcvBar>, ScreenerError> {
            match code {
                "BROKEN" => Err(ScreenerError::Database {
                    reason: "corrupt".into(),
                }),
                _ => Ok(self.0.get(code).cloned().unwrap_or_default()),
            }
        }

        fn list_symbols(&self, _exchange: &str) -> Result<Vec<String>, ScreenerError> {
            Ok(self.0.keys().cloned().collect())
        }
    }

    struct OneSet(Vec<String>);

    impl StocksetPort for OneSet {
        fn named_stockset(&self, name: &str) -> Result<Option<Vec<String>>, ScreenerError> {
            Ok((name == "SET").then(|| self.0.clone()))
        }

        fn holdings(&self, _owner: &str, _id: &str) -> Result<Option<Vec<String>>, ScreenerError> {
            Ok(None)
        }

        fn list_stocksets(&self, _owner: Option<&str>) -> Vec<String> {
            vec!["SET".into()]
        }
    }

    fn fixture() -> (Data, OneSet) {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let data = Data(HashMap::from([
            ("BHP".to_string(), bars("BHP", "2024-01-01", &closes)),
            ("CBA".to_string(), bars("CBA", "2024-01-01", &[50.0; 40])),
        ]));
        let set = OneSet(vec!["CBA".into(), "BROKEN".into(), "BHP".into(), "EMPTY".into()]);
        (data, set)
    }

    fn options() -> ProfileOptions {
        ProfileOptions {
            end_date: Some(day("2024-02-09")),
            return_windows: vec![ReturnWindow::new("1W", 7)],
            ..ProfileOptions::default()
        }
    }

    #[test]
    fn return_with_tolerance() {
        let inst = Instrument::new("BHP".into(), "ASX".into(), bars("BHP", "2024-01-01", &[100.0, 110.0]));
        // 2024-01-02 back 3 days is 2023-12-30; no price within 1 day
        assert_eq!(calculate_return(&inst, day("2024-01-02"), 3, 1, false), 0.0);
        // forward search from 2023-12-30 reaches 2024-01-01 within 2 days
        let r = calculate_return(&inst, day("2024-01-02"), 3, 2, true);
        assert!((r - 10.0).abs() < 1e-9);
        // walking back from 2024-01-05 finds 2024-01-02
        let r = calculate_return(&inst, day("2024-01-05"), 4, 5, false);
        assert!((r - 10.0).abs() < 1e-9);
    }

    #[test]
    fn return_window_past_calendar_start_is_zero() {
        let inst = Instrument::new("BHP".into(), "ASX".into(), bars("BHP", "2024-01-01", &[100.0, 110.0]));
        assert_eq!(calculate_return(&inst, day("2024-01-02"), u32::MAX, 0, false), 0.0);
        assert_eq!(calculate_return(&inst, day("2024-01-02"), u32::MAX, u32::MAX, true), 0.0);
    }

    #[test]
    fn ranking_score_rounds() {
        assert_eq!(ranking_score(3, 4), Some(75));
        assert_eq!(ranking_score(2, 3), Some(67));
        assert_eq!(ranking_score(0, 5), Some(0));
        assert_eq!(ranking_score(0, 0), None);
    }

    #[test]
    fn parse_return_windows() {
        let windows = ReturnWindow::parse_list("1W:7, 1M:30").unwrap();
        assert_eq!(windows, vec![ReturnWindow::new("1W", 7), ReturnWindow::new("1M", 30)]);
        assert!(ReturnWindow::parse_list("1W").is_err());
        assert!(ReturnWindow::parse_list("1W:0").is_err());
        assert!(ReturnWindow::parse_list("1W:7,1W:8").is_err());
        assert!(ReturnWindow::parse_list("10Y:3660").is_ok());
        assert!(ReturnWindow::parse_list("BIG:4294967295").is_err());
    }

    #[test]
    fn profile_serialises_flat() {
        let inst = Instrument::new("BHP".into(), "ASX".into(), bars("BHP", "2024-01-01", &[100.0, 101.0, 102.0, 103.0, 104.0, 105.0, 106.0, 107.0]));
        let profile = profile_instrument(&inst, &above(100.0), &options()).unwrap();
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["code"], "BHP");
        assert_eq!(json["date"], "2024-01-08");
        assert_eq!(json["close"], 107.0);
        assert_eq!(json["return_1W"], 7.0);
        assert_eq!(json["CLOSE > CONSTANT(value=100)"], true);
        assert_eq!(json["score"], 100);
    }

    #[test]
    fn score_omitted_without_criteria() {
        let inst = Instrument::new("BHP".into(), "ASX".into(), bars("BHP", "2024-01-01", &[1.0]));
        let profile = profile_instrument(&inst, &Criteria::new(), &options()).unwrap();
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("score").is_none());
    }

    #[test]
    fn stockset_profiles_in_order_with_skips() {
        let (data, set) = fixture();
        let run = profile_stockset(
            &data,
            &set,
            &Stockset::parse("SET"),
            &StocksetContext::new("ASX"),
            &above(60.0),
            &options(),
        )
        .unwrap();
        let codes: Vec<&str> = run.profiles.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["CBA", "BHP"]);
        assert_eq!(run.profiles[0].score, Some(0));
        assert_eq!(run.profiles[1].score, Some(100));
        assert_eq!(run.skipped.len(), 2);
        assert_eq!(run.skipped[0].code, "BROKEN");
        assert_eq!(run.skipped[1].reason, SkipReason::NoData);
        assert!(!run.truncated);
    }

    #[test]
    fn cancelled_run_is_truncated() {
        let (data, set) = fixture();
        let opts = options();
        opts.cancel.store(true, Ordering::Relaxed);
        let run = profile_stockset(&data, &set, &Stockset::parse("SET"), &StocksetContext::new("ASX"), &above(0.0), &opts).unwrap();
        assert!(run.truncated);
        assert!(run.profiles.is_empty());
    }

    #[test]
    fn expired_deadline_is_truncated() {
        let (data, set) = fixture();
        let opts = ProfileOptions {
            timeout: Some(Duration::ZERO),
            ..options()
        };
        let run = profile_stockset(&data, &set, &Stockset::parse("SET"), &StocksetContext::new("ASX"), &above(0.0), &opts).unwrap();
        assert!(run.truncated);
    }

    #[test]
    fn unknown_stockset_profiles_nothing() {
        let (data, set) = fixture();
        let run = profile_stockset(&data, &set, &Stockset::parse("NOPE"), &StocksetContext::new("ASX"), &above(0.0), &options()).unwrap();
        assert!(run.profiles.is_empty());
        assert!(!run.truncated);
    }

    #[test]
    fn duplicate_criteria_keep_separate_columns() {
        let inst = Instrument::new("BHP".into(), "ASX".into(), bars("BHP", "2024-01-01", &[100.0, 101.0, 102.0]));
        let criteria = above(50.0).merge(&above(50.0));
        let profile = profile_instrument(&inst, &criteria, &options()).unwrap();
        assert_eq!(profile.criteria.len(), 2);
        assert_ne!(profile.criteria[0].0, profile.criteria[1].0);

        let json = serde_json::to_value(&profile).unwrap();
        let object = json.as_object().unwrap();
        let criterion_keys = object.keys().filter(|k| k.starts_with("CLOSE > CONSTANT(value=50)")).count();
        assert_eq!(criterion_keys, 2);
        assert_eq!(json["score"], 100);
    }

    #[test]
    fn history_window_ends_at_end_date() {
        let opts = ProfileOptions {
            history_days: 30,
            ..options()
        };
        assert_eq!(history_window(&opts), (day("2024-01-10"), day("2024-02-09")));
    }

    #[test]
    fn history_window_clamps_at_calendar_start() {
        let opts = ProfileOptions {
            history_days: u32::MAX,
            ..options()
        };
        assert_eq!(history_window(&opts), (NaiveDate::MIN, day("2024-02-09")));
    }

    #[test]
    fn load_instrument_attaches_benchmark() {
        let (data, _) = fixture();
        let opts = ProfileOptions {
            benchmark: Some("CBA".into()),
            ..options()
        };
        let inst = load_instrument(&data, "BHP", &opts).unwrap();
        assert_eq!(inst.bar_count(), 40);
        assert_eq!(inst.benchmark().map(|b| b.code.as_str()), Some("CBA"));

        assert!(matches!(
            load_instrument(&data, "EMPTY", &opts),
            Err(ScreenerError::NoData { .. })
        ));
    }
}
