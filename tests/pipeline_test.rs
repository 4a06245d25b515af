mod common;

use std::time::Duration;

use common::{MockNotifier, MockSource, day, memory_store, raw_row};
use marketsentry::domain::indicator::IndicatorSnapshot;
use marketsentry::domain::market::{PriceObservation, QualityFlag, SymbolRecord};
use marketsentry::domain::pipeline::{Orchestrator, PipelineConfig};
use marketsentry::domain::retry::RetryPolicy;
use marketsentry::ports::store_port::{AlertStore, IndicatorStore, PriceStore, SymbolStore};

fn quick_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        multiplier: 1.0,
    }
}

fn config() -> PipelineConfig {
    PipelineConfig {
        retry: quick_retry(),
        ..PipelineConfig::default()
    }
}

fn active_symbol(name: &str) -> SymbolRecord {
    SymbolRecord {
        symbol: name.to_string(),
        company_name: format!("{name} Plc"),
        sector: "Banking".to_string(),
        exchange: "NGX".to_string(),
        active: true,
    }
}

fn neutral_snapshot(name: &str, calc_date: chrono::NaiveDate, close: f64) -> IndicatorSnapshot {
    IndicatorSnapshot {
        symbol: name.to_string(),
        calc_date,
        ma_short: close,
        ma_long: close,
        rsi: 50.0,
        macd_line: 0.0,
        macd_signal: 0.0,
        macd_histogram: 0.0,
        bb_upper: None,
        bb_middle: close,
        bb_lower: None,
        volatility: None,
        crossover: None,
    }
}

fn seed_history(store: &common::SqliteStore, symbol: &str, closes: &[f64]) {
    let observations: Vec<PriceObservation> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceObservation {
            symbol: symbol.to_string(),
            trade_date: day(2024, 3, 1) + chrono::Duration::days(i as i64),
            close,
            open: None,
            high: None,
            low: None,
            volume: Some(100_000),
            change_1d_pct: None,
            change_ytd_pct: None,
            market_cap: None,
            source: "seed".to_string(),
            quality: QualityFlag::Good,
        })
        .collect();
    store.upsert_prices(&observations).unwrap();
}

#[test]
fn successful_run_populates_stores() {
    let store = memory_store();
    seed_history(&store, "GTCO", &[100.0, 101.0, 102.0, 101.5, 103.0]);

    let as_of = day(2024, 3, 6);
    let source = MockSource::new(vec![
        raw_row("GTCO", as_of, 104.0),
        raw_row("ZENITH", as_of, 30.0),
    ]);
    let notifier = MockNotifier::default();

    let mut orchestrator = Orchestrator::new(config(), &source, &store, &notifier);
    let result = orchestrator.run(as_of, &[]);

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.stocks_processed, 2);
    assert_eq!(result.prices_loaded, 2);
    // GTCO has six days of history; ZENITH has one and is skipped.
    assert_eq!(result.indicators_calculated, 6);
    assert!(result.stage_times.contains_key("fetch"));
    assert!(result.stage_times.contains_key("generate_recommendations"));

    let symbols = store.get_active_symbols().unwrap();
    assert_eq!(symbols.len(), 2);
    let latest = store.get_latest_price("GTCO", as_of).unwrap().unwrap();
    assert_eq!(latest.close, 104.0);
}

#[test]
fn empty_fetch_is_a_failed_run() {
    let store = memory_store();
    let source = MockSource::new(Vec::new());
    let notifier = MockNotifier::default();

    let mut orchestrator = Orchestrator::new(config(), &source, &store, &notifier);
    let result = orchestrator.run(day(2024, 3, 6), &[]);

    assert!(!result.success);
    assert!(!result.errors.is_empty());
    assert_eq!(result.success, result.errors.is_empty());
    assert_eq!(result.prices_loaded, 0);
}

#[test]
fn fetch_retries_transient_failures() {
    let store = memory_store();
    let as_of = day(2024, 3, 6);
    let source = MockSource::new(vec![raw_row("GTCO", as_of, 104.0)]).failing(2);
    let notifier = MockNotifier::default();

    let mut orchestrator = Orchestrator::new(config(), &source, &store, &notifier);
    let result = orchestrator.run(as_of, &[]);

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.prices_loaded, 1);
}

#[test]
fn fetch_exhaustion_fails_the_run() {
    let store = memory_store();
    let as_of = day(2024, 3, 6);
    let source = MockSource::new(vec![raw_row("GTCO", as_of, 104.0)]).failing(5);
    let notifier = MockNotifier::default();

    let mut orchestrator = Orchestrator::new(config(), &source, &store, &notifier);
    let result = orchestrator.run(as_of, &[]);

    assert!(!result.success);
    assert!(result.errors.iter().any(|e| e.contains("fetch failed")));
}

#[test]
fn invalid_rows_are_dropped_with_warnings() {
    let store = memory_store();
    let as_of = day(2024, 3, 6);

    let bad = raw_row("BAD", as_of, -5.0);
    let source = MockSource::new(vec![raw_row("GTCO", as_of, 104.0), bad]);
    let notifier = MockNotifier::default();

    let mut orchestrator = Orchestrator::new(config(), &source, &store, &notifier);
    let result = orchestrator.run(as_of, &[]);

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.prices_loaded, 1);
    assert!(result.warnings.iter().any(|w| w.contains("BAD")));
}

#[test]
fn notifier_failure_is_a_warning_not_an_error() {
    let store = memory_store();
    store.seed_default_rules().unwrap();
    seed_history(&store, "GTCO", &[100.0]);

    // 12% jump trips the critical price-movement rule.
    let as_of = day(2024, 3, 2);
    let mut row = raw_row("GTCO", as_of, 112.0);
    row.change_1d_pct = Some(12.0);
    let source = MockSource::new(vec![row]);
    let notifier = MockNotifier::failing();

    let mut orchestrator = Orchestrator::new(config(), &source, &store, &notifier);
    let result = orchestrator.run(as_of, &[]);

    assert!(result.success, "errors: {:?}", result.errors);
    assert!(result.alerts_generated >= 1);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("notification failed")));
    assert!(store
        .get_alerts_for_date(as_of)
        .unwrap()
        .iter()
        .any(|a| a.symbol == "GTCO"));
}

#[test]
fn rerun_generates_no_duplicate_alerts() {
    let store = memory_store();
    store.seed_default_rules().unwrap();
    seed_history(&store, "GTCO", &[100.0]);

    let as_of = day(2024, 3, 2);
    let mut row = raw_row("GTCO", as_of, 106.0);
    row.change_1d_pct = Some(6.0);
    let source = MockSource::new(vec![row]);
    let notifier = MockNotifier::default();

    let mut orchestrator = Orchestrator::new(config(), &source, &store, &notifier);
    let first = orchestrator.run(as_of, &[]);
    assert!(first.alerts_generated >= 1);

    let second = orchestrator.run(as_of, &[]);
    assert_eq!(second.alerts_generated, 0);
    assert!(second.success, "errors: {:?}", second.errors);
}

#[test]
fn symbol_filter_narrows_the_run() {
    let store = memory_store();
    let as_of = day(2024, 3, 6);

    // ZENITH is already active with a price and indicators that would pass
    // the advisor's floors; a GTCO-narrowed run must not analyze it.
    store.upsert_symbols(&[active_symbol("ZENITH")]).unwrap();
    seed_history(&store, "ZENITH", &[30.0]);
    store
        .upsert_indicators(&[neutral_snapshot("ZENITH", day(2024, 3, 1), 30.0)])
        .unwrap();

    let source = MockSource::new(vec![
        raw_row("GTCO", as_of, 104.0),
        raw_row("ZENITH", as_of, 30.0),
    ]);
    let notifier = MockNotifier::default();

    let mut orchestrator = Orchestrator::new(config(), &source, &store, &notifier);
    let result = orchestrator.run(as_of, &["GTCO".to_string()]);

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.prices_loaded, 1);
    assert_eq!(result.recommendations_generated, 0);
    let symbols = store.get_active_symbols().unwrap();
    assert!(symbols.iter().any(|s| s.symbol == "GTCO"));
    // ZENITH's price was filtered out at the source.
    assert!(store.get_latest_price("ZENITH", as_of).unwrap().unwrap().trade_date < as_of);
}

#[test]
fn disabled_fetch_analyzes_stored_data() {
    let store = memory_store();
    store.upsert_symbols(&[active_symbol("GTCO")]).unwrap();
    seed_history(&store, "GTCO", &[100.0, 101.0, 102.0, 101.5, 103.0]);

    // An empty source would normally be fatal; with fetch disabled it is
    // never consulted.
    let source = MockSource::new(Vec::new());
    let notifier = MockNotifier::default();
    let config = PipelineConfig {
        fetch: false,
        ..config()
    };

    let mut orchestrator = Orchestrator::new(config, &source, &store, &notifier);
    let result = orchestrator.run(day(2024, 3, 5), &[]);

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.stocks_processed, 0);
    assert_eq!(result.prices_loaded, 0);
    assert_eq!(result.indicators_calculated, 5);
    assert!(!result.stage_times.contains_key("fetch"));
    assert!(result.stage_times.contains_key("compute_indicators"));
}
