//! Alert rule evaluation.
//!
//! Every active rule is checked against every active symbol. A check that
//! already produced an alert for (symbol, rule, date) is skipped, so
//! re-running evaluation for the same day never duplicates alerts. Errors
//! scoped to one (rule, symbol) pair are logged and skipped without aborting
//! the batch.

use chrono::{Duration, NaiveDate};
use log::{debug, error, info, warn};

use crate::domain::alert::{AlertEvent, AlertRule, RsiSide, RuleKind};
use crate::domain::error::SentryError;
use crate::domain::indicator::CrossoverSignal;
use crate::ports::store_port::{AlertStore, IndicatorStore, PriceStore, RuleStore, SymbolStore};

#[derive(Debug, Default)]
pub struct AlertEvaluationResult {
    pub alerts: Vec<AlertEvent>,
    pub rules_evaluated: usize,
    pub symbols_checked: usize,
}

pub struct AlertEvaluator<'a> {
    symbols: &'a dyn SymbolStore,
    prices: &'a dyn PriceStore,
    indicators: &'a dyn IndicatorStore,
    rules: &'a dyn RuleStore,
    alerts: &'a dyn AlertStore,
}

impl<'a> AlertEvaluator<'a> {
    pub fn new(
        symbols: &'a dyn SymbolStore,
        prices: &'a dyn PriceStore,
        indicators: &'a dyn IndicatorStore,
        rules: &'a dyn RuleStore,
        alerts: &'a dyn AlertStore,
    ) -> Self {
        Self {
            symbols,
            prices,
            indicators,
            rules,
            alerts,
        }
    }

    /// Evaluate all active rules against all active symbols for one day.
    ///
    /// Generated alerts are returned, not persisted; the caller decides when
    /// to write them.
    pub fn evaluate(&self, as_of: NaiveDate) -> Result<AlertEvaluationResult, SentryError> {
        let rules = self.rules.get_active_rules()?;
        if rules.is_empty() {
            warn!("no active alert rules");
            return Ok(AlertEvaluationResult::default());
        }

        let symbols = self.symbols.get_active_symbols()?;
        if symbols.is_empty() {
            warn!("no active symbols to evaluate");
            return Ok(AlertEvaluationResult {
                rules_evaluated: rules.len(),
                ..AlertEvaluationResult::default()
            });
        }

        info!(
            "evaluating {} rules against {} symbols for {as_of}",
            rules.len(),
            symbols.len()
        );

        let mut generated = Vec::new();
        for rule in &rules {
            let mut rule_hits = 0usize;
            for symbol in &symbols {
                match self.check_rule(rule, &symbol.symbol, as_of) {
                    Ok(Some(alert)) => {
                        generated.push(alert);
                        rule_hits += 1;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        error!(
                            "rule '{}' failed for {}: {e}",
                            rule.name, symbol.symbol
                        );
                    }
                }
            }
            if rule_hits > 0 {
                info!("rule '{}' generated {rule_hits} alerts", rule.name);
            }
        }

        Ok(AlertEvaluationResult {
            alerts: generated,
            rules_evaluated: rules.len(),
            symbols_checked: symbols.len(),
        })
    }

    fn check_rule(
        &self,
        rule: &AlertRule,
        symbol: &str,
        as_of: NaiveDate,
    ) -> Result<Option<AlertEvent>, SentryError> {
        if self.alerts.alert_exists(symbol, rule.rule_id, as_of)? {
            debug!("alert already exists for {symbol}/{} on {as_of}", rule.name);
            return Ok(None);
        }

        match &rule.kind {
            RuleKind::PriceMovement { threshold_pct } => {
                self.check_price_movement(rule, symbol, as_of, *threshold_pct)
            }
            RuleKind::MaCrossover { direction } => {
                self.check_ma_crossover(rule, symbol, as_of, *direction)
            }
            RuleKind::Rsi { side, threshold } => {
                self.check_rsi(rule, symbol, as_of, *side, *threshold)
            }
            RuleKind::Volatility { threshold } => {
                self.check_volatility(rule, symbol, as_of, *threshold)
            }
            RuleKind::VolumeSpike {
                multiplier,
                lookback_days,
            } => self.check_volume_spike(rule, symbol, as_of, *multiplier, *lookback_days),
        }
    }

    fn check_price_movement(
        &self,
        rule: &AlertRule,
        symbol: &str,
        as_of: NaiveDate,
        threshold_pct: f64,
    ) -> Result<Option<AlertEvent>, SentryError> {
        let Some(latest) = self.prices.get_latest_price(symbol, as_of)? else {
            return Ok(None);
        };

        let change_pct = match latest.change_1d_pct {
            Some(c) => c,
            // Fall back to deriving the change from the previous close.
            None => {
                let history =
                    self.prices
                        .get_price_history(symbol, as_of - Duration::days(7), as_of)?;
                let Some(prev) = history
                    .iter()
                    .rev()
                    .find(|p| p.trade_date < latest.trade_date)
                else {
                    return Ok(None);
                };
                if prev.close == 0.0 {
                    return Ok(None);
                }
                (latest.close - prev.close) / prev.close * 100.0
            }
        };

        if change_pct.abs() < threshold_pct {
            return Ok(None);
        }

        let direction = if change_pct > 0.0 { "up" } else { "down" };
        Ok(Some(self.alert(
            rule,
            symbol,
            as_of,
            format!(
                "{symbol} moved {direction} {:.2}% (threshold {threshold_pct}%)",
                change_pct.abs()
            ),
            change_pct.abs(),
        )))
    }

    fn check_ma_crossover(
        &self,
        rule: &AlertRule,
        symbol: &str,
        as_of: NaiveDate,
        direction: CrossoverSignal,
    ) -> Result<Option<AlertEvent>, SentryError> {
        let Some(snap) = self.indicators.get_latest_indicators(symbol, as_of)? else {
            return Ok(None);
        };
        if snap.crossover != Some(direction) {
            return Ok(None);
        }

        let label = match direction {
            CrossoverSignal::Bullish => "bullish crossover (golden cross)",
            CrossoverSignal::Bearish => "bearish crossover (death cross)",
        };
        Ok(Some(self.alert(
            rule,
            symbol,
            as_of,
            format!(
                "{symbol}: {label}, short MA {:.2} vs long MA {:.2}",
                snap.ma_short, snap.ma_long
            ),
            snap.ma_short,
        )))
    }

    fn check_rsi(
        &self,
        rule: &AlertRule,
        symbol: &str,
        as_of: NaiveDate,
        side: RsiSide,
        threshold: f64,
    ) -> Result<Option<AlertEvent>, SentryError> {
        let Some(snap) = self.indicators.get_latest_indicators(symbol, as_of)? else {
            return Ok(None);
        };

        let (triggered, label) = match side {
            RsiSide::Oversold => (snap.rsi <= threshold, "oversold"),
            RsiSide::Overbought => (snap.rsi >= threshold, "overbought"),
        };
        if !triggered {
            return Ok(None);
        }

        Ok(Some(self.alert(
            rule,
            symbol,
            as_of,
            format!(
                "{symbol}: RSI {label} at {:.2} (threshold {threshold})",
                snap.rsi
            ),
            snap.rsi,
        )))
    }

    fn check_volatility(
        &self,
        rule: &AlertRule,
        symbol: &str,
        as_of: NaiveDate,
        threshold: f64,
    ) -> Result<Option<AlertEvent>, SentryError> {
        let Some(snap) = self.indicators.get_latest_indicators(symbol, as_of)? else {
            return Ok(None);
        };
        let Some(volatility) = snap.volatility else {
            return Ok(None);
        };
        if volatility < threshold {
            return Ok(None);
        }

        Ok(Some(self.alert(
            rule,
            symbol,
            as_of,
            format!(
                "{symbol}: high volatility at {:.2}% (threshold {:.2}%)",
                volatility * 100.0,
                threshold * 100.0
            ),
            volatility,
        )))
    }

    fn check_volume_spike(
        &self,
        rule: &AlertRule,
        symbol: &str,
        as_of: NaiveDate,
        multiplier: f64,
        lookback_days: i64,
    ) -> Result<Option<AlertEvent>, SentryError> {
        let history = self.prices.get_price_history(
            symbol,
            as_of - Duration::days(lookback_days),
            as_of,
        )?;
        let Some((latest, trailing)) = history.split_last() else {
            return Ok(None);
        };
        let Some(latest_volume) = latest.volume else {
            return Ok(None);
        };

        let trailing_volumes: Vec<i64> = trailing.iter().filter_map(|p| p.volume).collect();
        // Not enough history to call anything a spike. Skip, not an error.
        if trailing_volumes.len() < 5 {
            return Ok(None);
        }

        let avg = trailing_volumes.iter().sum::<i64>() as f64 / trailing_volumes.len() as f64;
        if avg <= 0.0 || (latest_volume as f64) < avg * multiplier {
            return Ok(None);
        }

        let ratio = latest_volume as f64 / avg;
        Ok(Some(self.alert(
            rule,
            symbol,
            as_of,
            format!("{symbol}: volume spike, {latest_volume} is {ratio:.1}x the trailing average (threshold {multiplier}x)"),
            ratio,
        )))
    }

    fn alert(
        &self,
        rule: &AlertRule,
        symbol: &str,
        as_of: NaiveDate,
        message: String,
        trigger_value: f64,
    ) -> AlertEvent {
        AlertEvent {
            symbol: symbol.to_string(),
            rule_id: rule.rule_id,
            alert_date: as_of,
            severity: rule.severity,
            message,
            trigger_value,
            resolved: false,
            notified: false,
        }
    }
}
