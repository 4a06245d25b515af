//! Pipeline orchestration.
//!
//! One [`Orchestrator::run`] walks the daily batch through fetch, validate,
//! transform, load, indicator computation, alert evaluation and
//! recommendation generation. Expected failures never escape `run`; they
//! land in the result's error and warning lists, and `success` holds exactly
//! when the error list is empty.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{Duration, NaiveDate};
use log::{error, info, warn};

use crate::domain::alert::Severity;
use crate::domain::alert_eval::AlertEvaluator;
use crate::domain::advisor::Advisor;
use crate::domain::error::SentryError;
use crate::domain::indicator::{IndicatorEngine, IndicatorParams};
use crate::domain::market::{PriceObservation, RawPriceRow, SymbolRecord};
use crate::domain::retry::RetryPolicy;
use crate::domain::transform::{extract_symbols, to_observations};
use crate::domain::validate::{CheckedRow, Validator};
use crate::ports::config_port::ConfigPort;
use crate::ports::notifier_port::{Channel, NotifierPort};
use crate::ports::source_port::SourcePort;
use crate::ports::store_port::{
    AlertStore, IndicatorStore, PriceStore, RecommendationStore, RuleStore, SymbolStore,
};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub fetch: bool,
    pub validate: bool,
    pub load_symbols: bool,
    pub load_prices: bool,
    pub compute_indicators: bool,
    pub evaluate_alerts: bool,
    pub generate_recommendations: bool,
    pub batch_size: usize,
    /// Days of price history pulled for indicator computation.
    pub history_days: i64,
    pub min_score: f64,
    pub min_confidence: f64,
    pub valid_exchanges: Vec<String>,
    pub valid_sectors: Vec<String>,
    pub channels: Vec<Channel>,
    pub retry: RetryPolicy,
    pub indicator_params: IndicatorParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch: true,
            validate: true,
            load_symbols: true,
            load_prices: true,
            compute_indicators: true,
            evaluate_alerts: true,
            generate_recommendations: true,
            batch_size: 50,
            history_days: 100,
            min_score: 40.0,
            min_confidence: 0.5,
            valid_exchanges: Vec::new(),
            valid_sectors: Vec::new(),
            channels: vec![Channel::Log],
            retry: RetryPolicy::default(),
            indicator_params: IndicatorParams::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_config(cfg: &dyn ConfigPort) -> Self {
        let defaults = PipelineConfig::default();

        let list = |section: &str, key: &str| -> Vec<String> {
            cfg.get_string(section, key)
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default()
        };

        let channels = cfg
            .get_string("notifications", "channels")
            .map(|raw| {
                raw.split(',')
                    .filter_map(Channel::parse)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_else(|| defaults.channels.clone());

        Self {
            fetch: cfg.get_bool("pipeline", "fetch", defaults.fetch),
            validate: cfg.get_bool("pipeline", "validate", defaults.validate),
            load_symbols: cfg.get_bool("pipeline", "load_symbols", defaults.load_symbols),
            load_prices: cfg.get_bool("pipeline", "load_prices", defaults.load_prices),
            compute_indicators: cfg.get_bool(
                "pipeline",
                "compute_indicators",
                defaults.compute_indicators,
            ),
            evaluate_alerts: cfg.get_bool("pipeline", "evaluate_alerts", defaults.evaluate_alerts),
            generate_recommendations: cfg.get_bool(
                "pipeline",
                "generate_recommendations",
                defaults.generate_recommendations,
            ),
            batch_size: cfg.get_int("pipeline", "batch_size", defaults.batch_size as i64) as usize,
            history_days: cfg.get_int("pipeline", "history_days", defaults.history_days),
            min_score: cfg.get_double("advisor", "min_score", defaults.min_score),
            min_confidence: cfg.get_double("advisor", "min_confidence", defaults.min_confidence),
            valid_exchanges: list("validation", "valid_exchanges"),
            valid_sectors: list("validation", "valid_sectors"),
            channels,
            retry: RetryPolicy {
                max_attempts: cfg.get_int("fetch", "max_attempts", 3) as u32,
                base_delay: std::time::Duration::from_secs_f64(
                    cfg.get_double("fetch", "base_delay_secs", 1.0),
                ),
                multiplier: cfg.get_double("fetch", "backoff_multiplier", 2.0),
            },
            indicator_params: indicator_params_from(cfg, defaults.indicator_params),
        }
    }
}

fn indicator_params_from(cfg: &dyn ConfigPort, defaults: IndicatorParams) -> IndicatorParams {
    let window = |key: &str, default: usize| -> usize {
        cfg.get_int("indicators", key, default as i64).max(1) as usize
    };
    IndicatorParams {
        ma_short: window("ma_short", defaults.ma_short),
        ma_long: window("ma_long", defaults.ma_long),
        rsi_period: window("rsi_period", defaults.rsi_period),
        macd_fast: window("macd_fast", defaults.macd_fast),
        macd_slow: window("macd_slow", defaults.macd_slow),
        macd_signal: window("macd_signal", defaults.macd_signal),
        bollinger_period: window("bollinger_period", defaults.bollinger_period),
        bollinger_std: cfg.get_double("indicators", "bollinger_std", defaults.bollinger_std),
        volatility_window: window("volatility_window", defaults.volatility_window),
    }
}

/// Execution summary, the sole output contract of a run.
#[derive(Debug, Clone, Default)]
pub struct PipelineRunResult {
    pub success: bool,
    pub execution_time: f64,
    pub stocks_processed: usize,
    pub prices_loaded: usize,
    pub indicators_calculated: usize,
    pub alerts_generated: usize,
    pub recommendations_generated: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stage_times: HashMap<String, f64>,
}

pub struct Orchestrator<'a, S> {
    config: PipelineConfig,
    source: &'a dyn SourcePort,
    store: &'a S,
    notifier: &'a dyn NotifierPort,
    errors: Vec<String>,
    warnings: Vec<String>,
    stage_times: HashMap<String, f64>,
}

impl<'a, S> Orchestrator<'a, S>
where
    S: SymbolStore
        + PriceStore
        + IndicatorStore
        + RuleStore
        + AlertStore
        + RecommendationStore,
{
    pub fn new(
        config: PipelineConfig,
        source: &'a dyn SourcePort,
        store: &'a S,
        notifier: &'a dyn NotifierPort,
    ) -> Self {
        Self {
            config,
            source,
            store,
            notifier,
            errors: Vec::new(),
            warnings: Vec::new(),
            stage_times: HashMap::new(),
        }
    }

    /// Run the full pipeline for one trading day.
    ///
    /// `symbols` narrows ingestion and analysis when non-empty. Expected
    /// failures are reported through the result, never as a panic or `Err`.
    pub fn run(&mut self, as_of: NaiveDate, symbols: &[String]) -> PipelineRunResult {
        let start = Instant::now();
        self.errors.clear();
        self.warnings.clear();
        self.stage_times.clear();

        info!("starting pipeline run for {as_of}");

        let mut stocks_processed = 0;
        let mut prices_loaded = 0;
        let mut indicators_calculated = 0;
        let mut alerts_generated = 0;
        let mut recommendations_generated = 0;

        if self.config.fetch {
            let raw = self.stage_fetch(as_of, symbols);
            if raw.is_empty() {
                self.errors.push("no data fetched from source".to_string());
                return self.build_result(start, stocks_processed, 0, 0, 0, 0);
            }

            let checked = self.stage_validate(raw);
            if checked.is_empty() {
                self.errors.push("all rows failed validation".to_string());
                return self.build_result(start, stocks_processed, 0, 0, 0, 0);
            }

            let (observations, symbol_records) = self.stage_transform(checked);

            if self.config.load_symbols {
                stocks_processed = self.stage_load_symbols(&symbol_records);
            }
            if self.config.load_prices {
                prices_loaded = self.stage_load_prices(&observations);
            }
        } else {
            info!("fetch disabled, analyzing stored data");
        }
        if self.config.compute_indicators {
            indicators_calculated = self.stage_compute_indicators(as_of, symbols);
        }
        if self.config.evaluate_alerts {
            alerts_generated = self.stage_evaluate_alerts(as_of);
        }
        if self.config.generate_recommendations {
            recommendations_generated = self.stage_generate_recommendations(as_of, symbols);
        }

        let result = self.build_result(
            start,
            stocks_processed,
            prices_loaded,
            indicators_calculated,
            alerts_generated,
            recommendations_generated,
        );
        log_summary(&result);
        result
    }

    fn stage_fetch(&mut self, as_of: NaiveDate, symbols: &[String]) -> Vec<RawPriceRow> {
        let stage = Instant::now();
        info!("stage fetch: pulling rows from {}", self.source.source_name());

        let rows = match self
            .config
            .retry
            .clone()
            .run("fetch", || self.source.fetch(as_of, symbols))
        {
            Ok(rows) => rows,
            Err(e) => {
                self.errors.push(format!("fetch failed: {e}"));
                Vec::new()
            }
        };

        info!("fetched {} rows", rows.len());
        self.record_stage("fetch", stage);
        rows
    }

    fn stage_validate(&mut self, raw: Vec<RawPriceRow>) -> Vec<CheckedRow> {
        let stage = Instant::now();

        let checked = if self.config.validate {
            let validator = Validator::new(
                self.config.valid_exchanges.clone(),
                self.config.valid_sectors.clone(),
            );
            let (checked, report) = validator.validate(&raw);
            info!(
                "stage validate: {} valid, {} suspicious, {} dropped",
                report.valid_count, report.suspicious_count, report.invalid_count
            );
            // Row-scoped rejections are warnings at run level; only a fully
            // empty outcome is fatal.
            for e in report.errors {
                self.warnings.push(format!("validation: {e}"));
            }
            self.warnings.extend(report.warnings);
            checked
        } else {
            info!("stage validate: skipped by config");
            raw.into_iter()
                .map(|row| CheckedRow {
                    row,
                    suspicious: false,
                })
                .collect()
        };

        self.record_stage("validate", stage);
        checked
    }

    fn stage_transform(
        &mut self,
        checked: Vec<CheckedRow>,
    ) -> (Vec<PriceObservation>, Vec<SymbolRecord>) {
        let stage = Instant::now();
        let observations = to_observations(&checked);
        let symbols = extract_symbols(&checked);
        info!(
            "stage transform: {} observations, {} symbols",
            observations.len(),
            symbols.len()
        );
        self.record_stage("transform", stage);
        (observations, symbols)
    }

    fn stage_load_symbols(&mut self, symbols: &[SymbolRecord]) -> usize {
        let stage = Instant::now();
        let count = match self.store.upsert_symbols(symbols) {
            Ok(count) => count,
            Err(e) => {
                error!("symbol load failed: {e}");
                self.errors.push(format!("symbol load failed: {e}"));
                0
            }
        };
        info!("stage load_symbols: {count} symbols upserted");
        self.record_stage("load_symbols", stage);
        count
    }

    fn stage_load_prices(&mut self, observations: &[PriceObservation]) -> usize {
        let stage = Instant::now();
        let mut loaded = 0;

        // Each batch commits independently; one bad batch does not undo the
        // rest of the day's load.
        for (i, batch) in observations.chunks(self.config.batch_size.max(1)).enumerate() {
            match self.store.upsert_prices(batch) {
                Ok(count) => loaded += count,
                Err(e) => {
                    error!("price batch {} failed: {e}", i + 1);
                    self.errors.push(format!("price batch {} failed: {e}", i + 1));
                }
            }
        }

        info!("stage load_prices: {loaded} prices upserted");
        self.record_stage("load_prices", stage);
        loaded
    }

    fn stage_compute_indicators(&mut self, as_of: NaiveDate, filter: &[String]) -> usize {
        let stage = Instant::now();
        let engine = IndicatorEngine::new(self.config.indicator_params.clone());
        let mut calculated = 0;

        let active = match self.store.get_active_symbols() {
            Ok(active) => active,
            Err(e) => {
                self.errors.push(format!("indicator stage failed: {e}"));
                self.record_stage("compute_indicators", stage);
                return 0;
            }
        };
        let targets: Vec<&SymbolRecord> = active
            .iter()
            .filter(|s| filter.is_empty() || filter.contains(&s.symbol))
            .collect();
        info!("stage compute_indicators: {} symbols", targets.len());

        for record in targets {
            match self.compute_for_symbol(&engine, &record.symbol, as_of) {
                Ok(count) => calculated += count,
                Err(e) => {
                    let msg = format!("indicator calculation failed for {}: {e}", record.symbol);
                    warn!("{msg}");
                    self.warnings.push(msg);
                }
            }
        }

        info!("stage compute_indicators: {calculated} snapshots upserted");
        self.record_stage("compute_indicators", stage);
        calculated
    }

    fn compute_for_symbol(
        &self,
        engine: &IndicatorEngine,
        symbol: &str,
        as_of: NaiveDate,
    ) -> Result<usize, SentryError> {
        let start = as_of - Duration::days(self.config.history_days);
        let history = self.store.get_price_history(symbol, start, as_of)?;
        if history.len() < 2 {
            return Ok(0);
        }
        let snapshots = engine.compute(&history);
        self.store.upsert_indicators(&snapshots)
    }

    fn stage_evaluate_alerts(&mut self, as_of: NaiveDate) -> usize {
        let stage = Instant::now();

        let evaluator = AlertEvaluator::new(
            self.store,
            self.store,
            self.store,
            self.store,
            self.store,
        );
        let generated = match evaluator
            .evaluate(as_of)
            .and_then(|result| {
                let saved = self.store.insert_alerts(&result.alerts)?;
                Ok((result, saved))
            }) {
            Ok((result, saved)) => {
                info!(
                    "stage evaluate_alerts: {saved} alerts from {} rules x {} symbols",
                    result.rules_evaluated, result.symbols_checked
                );
                self.send_notifications(&result.alerts, as_of);
                saved
            }
            Err(e) => {
                error!("alert evaluation failed: {e}");
                self.errors.push(format!("alert evaluation failed: {e}"));
                0
            }
        };

        self.record_stage("evaluate_alerts", stage);
        generated
    }

    /// Notification failures never fail the run; they become warnings.
    fn send_notifications(&mut self, alerts: &[crate::domain::alert::AlertEvent], as_of: NaiveDate) {
        if alerts.is_empty() || self.config.channels.is_empty() {
            return;
        }

        for alert in alerts.iter().filter(|a| a.severity == Severity::Critical) {
            let outcome = self.notifier.notify(alert, &self.config.channels);
            if !outcome.sent {
                self.warnings.push(format!(
                    "notification failed for {} ({}): {}",
                    alert.symbol,
                    alert.alert_date,
                    outcome.errors.join("; ")
                ));
            }
        }

        if alerts.iter().any(|a| a.severity == Severity::Warning) {
            let outcome = self.notifier.notify_digest(alerts, as_of);
            if !outcome.sent {
                self.warnings
                    .push(format!("digest failed: {}", outcome.errors.join("; ")));
            }
        }
    }

    fn stage_generate_recommendations(&mut self, as_of: NaiveDate, filter: &[String]) -> usize {
        let stage = Instant::now();

        let advisor = Advisor::new(
            self.store,
            self.store,
            self.store,
            self.config.min_score,
            self.config.min_confidence,
        );
        let count = match advisor
            .generate(as_of, filter)
            .and_then(|recs| self.store.upsert_recommendations(&recs))
        {
            Ok(count) => count,
            Err(e) => {
                error!("recommendation generation failed: {e}");
                self.errors
                    .push(format!("recommendation generation failed: {e}"));
                0
            }
        };

        info!("stage generate_recommendations: {count} recommendations");
        self.record_stage("generate_recommendations", stage);
        count
    }

    fn record_stage(&mut self, name: &str, started: Instant) {
        self.stage_times
            .insert(name.to_string(), started.elapsed().as_secs_f64());
    }

    fn build_result(
        &mut self,
        started: Instant,
        stocks_processed: usize,
        prices_loaded: usize,
        indicators_calculated: usize,
        alerts_generated: usize,
        recommendations_generated: usize,
    ) -> PipelineRunResult {
        PipelineRunResult {
            success: self.errors.is_empty(),
            execution_time: started.elapsed().as_secs_f64(),
            stocks_processed,
            prices_loaded,
            indicators_calculated,
            alerts_generated,
            recommendations_generated,
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
            stage_times: std::mem::take(&mut self.stage_times),
        }
    }
}


fn log_summary(result: &PipelineRunResult) {
    info!(
        "pipeline {} in {:.2}s: {} stocks, {} prices, {} indicators, {} alerts, {} recommendations",
        if result.success { "succeeded" } else { "failed" },
        result.execution_time,
        result.stocks_processed,
        result.prices_loaded,
        result.indicators_calculated,
        result.alerts_generated,
        result.recommendations_generated,
    );
    for (stage, secs) in &result.stage_times {
        info!("  {stage}: {secs:.3}s");
    }
    for warning in &result.warnings {
        warn!("{warning}");
    }
    for e in &result.errors {
        error!("{e}");
    }
}
