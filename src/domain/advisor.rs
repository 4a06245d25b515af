//! Recommendation generation.
//!
//! Combines the latest indicator snapshot and price into [`ScoreInputs`],
//! runs the scorer and the signal generator, and emits a
//! [`Recommendation`] only when both the score and the signal confidence
//! clear the configured floors. Symbols that fall short are skipped, not
//! errors.

use chrono::{Duration, NaiveDate};
use log::{debug, info, warn};

use crate::domain::error::SentryError;
use crate::domain::indicator::{IndicatorSnapshot, volatility::TRADING_DAYS_PER_YEAR};
use crate::domain::market::PriceObservation;
use crate::domain::scoring::{ScoreCategory, ScoreInputs, SignalScore, SignalScorer};
use crate::domain::signals::{SignalGenerator, SignalKind, TechnicalSignal};
use crate::ports::store_port::{IndicatorStore, PriceStore, SymbolStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }

    pub fn parse(s: &str) -> Option<RiskLevel> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Some(RiskLevel::Low),
            "MEDIUM" => Some(RiskLevel::Medium),
            "HIGH" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub symbol: String,
    pub rec_date: NaiveDate,
    pub signal: SignalKind,
    pub confidence: f64,
    pub score: f64,
    pub category: ScoreCategory,
    pub current_price: f64,
    pub target_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub risk: RiskLevel,
    pub reasons: Vec<String>,
}

pub struct Advisor<'a> {
    symbols: &'a dyn SymbolStore,
    prices: &'a dyn PriceStore,
    indicators: &'a dyn IndicatorStore,
    scorer: SignalScorer,
    generator: SignalGenerator,
    min_score: f64,
    min_confidence: f64,
}

impl<'a> Advisor<'a> {
    pub fn new(
        symbols: &'a dyn SymbolStore,
        prices: &'a dyn PriceStore,
        indicators: &'a dyn IndicatorStore,
        min_score: f64,
        min_confidence: f64,
    ) -> Self {
        Self {
            symbols,
            prices,
            indicators,
            scorer: SignalScorer::default(),
            generator: SignalGenerator::default(),
            min_score,
            min_confidence,
        }
    }

    /// Generate recommendations for active symbols, sorted by score
    /// descending (symbol as tie-break for determinism). A non-empty
    /// `filter` narrows analysis to those symbols.
    pub fn generate(
        &self,
        as_of: NaiveDate,
        filter: &[String],
    ) -> Result<Vec<Recommendation>, SentryError> {
        let symbols = self.symbols.get_active_symbols()?;
        let mut recs = Vec::new();

        for record in symbols
            .iter()
            .filter(|s| filter.is_empty() || filter.contains(&s.symbol))
        {
            match self.analyze(&record.symbol, as_of) {
                Ok(Some(rec)) => recs.push(rec),
                Ok(None) => {}
                Err(e) => warn!("analysis failed for {}: {e}", record.symbol),
            }
        }

        recs.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        info!("generated {} recommendations for {as_of}", recs.len());
        Ok(recs)
    }

    /// Analyze one symbol. `Ok(None)` means no data or below thresholds.
    pub fn analyze(
        &self,
        symbol: &str,
        as_of: NaiveDate,
    ) -> Result<Option<Recommendation>, SentryError> {
        let Some(snapshot) = self.indicators.get_latest_indicators(symbol, as_of)? else {
            debug!("no indicators for {symbol}");
            return Ok(None);
        };
        let Some(price) = self.prices.get_latest_price(symbol, as_of)? else {
            debug!("no price for {symbol}");
            return Ok(None);
        };

        let volume_ratio = self.volume_ratio(symbol, &price, as_of)?;
        let inputs = build_inputs(&snapshot, &price, volume_ratio);

        let score = self.scorer.score(&inputs);
        let signal = self.generator.generate(&inputs);

        if score.total_score < self.min_score {
            debug!(
                "{symbol} score {:.1} below floor {}",
                score.total_score, self.min_score
            );
            return Ok(None);
        }
        if signal.confidence < self.min_confidence {
            debug!(
                "{symbol} confidence {:.2} below floor {}",
                signal.confidence, self.min_confidence
            );
            return Ok(None);
        }

        let (target_price, stop_loss) = price_targets(price.close, signal.kind);
        let risk = assess_risk(&inputs, &signal, &score);
        let reasons = build_reasons(&signal, &score);

        Ok(Some(Recommendation {
            symbol: symbol.to_string(),
            rec_date: as_of,
            signal: signal.kind,
            confidence: signal.confidence,
            score: score.total_score,
            category: score.category,
            current_price: price.close,
            target_price,
            stop_loss,
            risk,
            reasons,
        }))
    }

    /// Latest volume over the trailing 30-day average, excluding today.
    fn volume_ratio(
        &self,
        symbol: &str,
        latest: &PriceObservation,
        as_of: NaiveDate,
    ) -> Result<Option<f64>, SentryError> {
        let Some(volume) = latest.volume else {
            return Ok(None);
        };
        let history =
            self.prices
                .get_price_history(symbol, as_of - Duration::days(30), as_of)?;
        let trailing: Vec<i64> = history
            .iter()
            .filter(|p| p.trade_date < latest.trade_date)
            .filter_map(|p| p.volume)
            .collect();
        if trailing.is_empty() {
            return Ok(None);
        }
        let avg = trailing.iter().sum::<i64>() as f64 / trailing.len() as f64;
        if avg <= 0.0 {
            return Ok(None);
        }
        Ok(Some(volume as f64 / avg))
    }
}

fn build_inputs(
    snapshot: &IndicatorSnapshot,
    price: &PriceObservation,
    volume_ratio: Option<f64>,
) -> ScoreInputs {
    ScoreInputs {
        rsi: Some(snapshot.rsi),
        macd: Some(snapshot.macd_line),
        macd_signal: Some(snapshot.macd_signal),
        ma_short: Some(snapshot.ma_short),
        ma_long: Some(snapshot.ma_long),
        current_price: Some(price.close),
        price_change_pct: price.change_1d_pct.or_else(|| {
            // Fall back to distance from the short MA when no daily change
            // was ingested.
            (snapshot.ma_short > 0.0)
                .then(|| (price.close - snapshot.ma_short) / snapshot.ma_short * 100.0)
        }),
        // The scorer's volatility table is calibrated to daily percentages;
        // the engine stores an annualized fraction.
        volatility_pct: snapshot
            .volatility
            .map(|v| v / TRADING_DAYS_PER_YEAR.sqrt() * 100.0),
        volume_ratio,
    }
}

/// Percentage offsets from the current price by signal strength.
fn price_targets(current: f64, signal: SignalKind) -> (Option<f64>, Option<f64>) {
    let (target_mult, stop_mult) = match signal {
        SignalKind::StrongBuy => (1.15, 0.93),
        SignalKind::Buy => (1.10, 0.95),
        SignalKind::Sell => (0.90, 1.03),
        SignalKind::StrongSell => (0.85, 1.05),
        SignalKind::Hold => return (None, None),
    };
    (Some(current * target_mult), Some(current * stop_mult))
}

fn assess_risk(inputs: &ScoreInputs, signal: &TechnicalSignal, score: &SignalScore) -> RiskLevel {
    let volatility = inputs.volatility_pct.unwrap_or(3.0);
    let high_volatility = volatility > 5.0;

    let mut factors = 0usize;
    if high_volatility || volatility < 2.5 {
        factors += 1;
    }
    if signal.confidence < 0.6 {
        factors += 1;
    }
    if score.total_score < 50.0 {
        factors += 1;
    }
    if let Some(rsi) = inputs.rsi {
        if rsi < 25.0 || rsi > 75.0 {
            factors += 1;
        }
    }

    if factors >= 3 || high_volatility {
        RiskLevel::High
    } else if factors >= 1 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn build_reasons(signal: &TechnicalSignal, score: &SignalScore) -> Vec<String> {
    let mut reasons = signal.reasons.clone();

    match score.category {
        ScoreCategory::Excellent => {
            reasons.push(format!("excellent overall score ({:.0}/100)", score.total_score));
        }
        ScoreCategory::Good => {
            reasons.push(format!("good overall score ({:.0}/100)", score.total_score));
        }
        _ => {}
    }
    if score.momentum_score >= 80.0 {
        reasons.push("strong price momentum".to_string());
    }
    if score.volatility_score >= 85.0 {
        reasons.push("low volatility".to_string());
    }
    if score.trend_score >= 80.0 {
        reasons.push("strong upward trend".to_string());
    }
    if score.volume_score >= 80.0 {
        reasons.push("healthy volume support".to_string());
    }

    reasons
}
