//! Technical indicator engine.
//!
//! [`IndicatorEngine::compute`] is a pure function over an ordered daily
//! price series, emitting one [`IndicatorSnapshot`] per input row using only
//! trailing data. Windows shrink to the available history instead of going
//! absent; where an input genuinely does not exist yet (a deviation over one
//! sample, a return at index 0) the output is `None` rather than a silent
//! zero, with RSI's neutral-50 default as the sole exception.

pub mod rolling;
pub mod rsi;
pub mod macd;
pub mod bollinger;
pub mod volatility;
pub mod crossover;

use chrono::NaiveDate;

use crate::domain::market::PriceObservation;
pub use crate::domain::indicator::crossover::CrossoverSignal;

/// Window configuration for the engine.
#[derive(Debug, Clone)]
pub struct IndicatorParams {
    pub ma_short: usize,
    pub ma_long: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_std: f64,
    pub volatility_window: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ma_short: 20,
            ma_long: 50,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_std: 2.0,
            volatility_window: 30,
        }
    }
}

/// Derived indicators for one symbol on one calculation date.
///
/// Recomputed deterministically from the trailing price window; never
/// hand-edited.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub symbol: String,
    pub calc_date: NaiveDate,
    pub ma_short: f64,
    pub ma_long: f64,
    pub rsi: f64,
    pub macd_line: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub bb_upper: Option<f64>,
    pub bb_middle: f64,
    pub bb_lower: Option<f64>,
    pub volatility: Option<f64>,
    pub crossover: Option<CrossoverSignal>,
}

pub struct IndicatorEngine {
    params: IndicatorParams,
}

impl IndicatorEngine {
    pub fn new(params: IndicatorParams) -> Self {
        Self { params }
    }

    /// Compute snapshots for one symbol's price series, one per input row.
    ///
    /// The series is sorted by trade date before computation; the caller does
    /// not have to pre-sort.
    pub fn compute(&self, series: &[PriceObservation]) -> Vec<IndicatorSnapshot> {
        if series.is_empty() {
            return Vec::new();
        }

        let mut ordered: Vec<&PriceObservation> = series.iter().collect();
        ordered.sort_by_key(|obs| obs.trade_date);

        let closes: Vec<f64> = ordered.iter().map(|obs| obs.close).collect();
        let p = &self.params;

        let ma_short = rolling::sma(&closes, p.ma_short);
        let ma_long = rolling::sma(&closes, p.ma_long);
        let rsi = rsi::rsi(&closes, p.rsi_period);
        let macd = macd::macd(&closes, p.macd_fast, p.macd_slow, p.macd_signal);
        let bands = bollinger::bollinger(&closes, p.bollinger_period, p.bollinger_std);
        let volatility = volatility::annualized_volatility(&closes, p.volatility_window);
        let crossovers = crossover::detect_crossovers(&ma_short, &ma_long);

        ordered
            .iter()
            .enumerate()
            .map(|(i, obs)| IndicatorSnapshot {
                symbol: obs.symbol.clone(),
                calc_date: obs.trade_date,
                ma_short: ma_short[i],
                ma_long: ma_long[i],
                rsi: rsi[i],
                macd_line: macd[i].line,
                macd_signal: macd[i].signal,
                macd_histogram: macd[i].histogram,
                bb_upper: bands[i].upper,
                bb_middle: bands[i].middle,
                bb_lower: bands[i].lower,
                volatility: volatility[i],
                crossover: crossovers[i],
            })
            .collect()
    }
}
