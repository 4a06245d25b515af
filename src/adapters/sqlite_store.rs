//! SQLite persistence adapter.
//!
//! One pooled adapter implements every store trait. Each trait call checks a
//! connection out of the pool and commits on its own; there is no cross-call
//! transaction.

use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params};

use crate::domain::advisor::Recommendation;
use crate::domain::alert::{AlertEvent, AlertRule, RuleKind, RsiSide, Severity};
use crate::domain::error::SentryError;
use crate::domain::indicator::{CrossoverSignal, IndicatorSnapshot};
use crate::domain::market::{PriceObservation, QualityFlag, SymbolRecord};
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::{
    AlertStore, IndicatorStore, PriceStore, RecommendationStore, RuleStore, SymbolStore,
};

const DATE_FMT: &str = "%Y-%m-%d";

pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SentryError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| SentryError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;
        let pool_size = config.get_int("sqlite", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| SentryError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, SentryError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| SentryError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, SentryError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| SentryError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), SentryError> {
        let conn = self.conn()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS symbols (
                symbol TEXT PRIMARY KEY,
                company_name TEXT NOT NULL,
                sector TEXT NOT NULL,
                exchange TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1
            );
            CREATE TABLE IF NOT EXISTS prices (
                symbol TEXT NOT NULL,
                trade_date TEXT NOT NULL,
                close REAL NOT NULL,
                open REAL,
                high REAL,
                low REAL,
                volume INTEGER,
                change_1d_pct REAL,
                change_ytd_pct REAL,
                market_cap REAL,
                source TEXT NOT NULL,
                quality TEXT NOT NULL,
                PRIMARY KEY (symbol, trade_date)
            );
            CREATE INDEX IF NOT EXISTS idx_prices_date ON prices(trade_date);
            CREATE TABLE IF NOT EXISTS indicators (
                symbol TEXT NOT NULL,
                calc_date TEXT NOT NULL,
                ma_short REAL NOT NULL,
                ma_long REAL NOT NULL,
                rsi REAL NOT NULL,
                macd_line REAL NOT NULL,
                macd_signal REAL NOT NULL,
                macd_histogram REAL NOT NULL,
                bb_upper REAL,
                bb_middle REAL NOT NULL,
                bb_lower REAL,
                volatility REAL,
                crossover TEXT,
                PRIMARY KEY (symbol, calc_date)
            );
            CREATE TABLE IF NOT EXISTS alert_rules (
                rule_id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                rule_type TEXT NOT NULL,
                parameters TEXT NOT NULL,
                severity TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1
            );
            CREATE TABLE IF NOT EXISTS alerts (
                symbol TEXT NOT NULL,
                rule_id INTEGER NOT NULL,
                alert_date TEXT NOT NULL,
                severity TEXT NOT NULL,
                message TEXT NOT NULL,
                trigger_value REAL NOT NULL,
                resolved INTEGER NOT NULL DEFAULT 0,
                notified INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (symbol, rule_id, alert_date)
            );
            CREATE INDEX IF NOT EXISTS idx_alerts_date ON alerts(alert_date);
            CREATE TABLE IF NOT EXISTS recommendations (
                symbol TEXT NOT NULL,
                rec_date TEXT NOT NULL,
                signal TEXT NOT NULL,
                confidence REAL NOT NULL,
                score REAL NOT NULL,
                category TEXT NOT NULL,
                current_price REAL NOT NULL,
                target_price REAL,
                stop_loss REAL,
                risk TEXT NOT NULL,
                reasons TEXT NOT NULL,
                PRIMARY KEY (symbol, rec_date)
            );",
        )
        .map_err(query_err)?;

        Ok(())
    }

    /// Seed the standard rule set. Skipped when any rules already exist so
    /// operator edits survive re-runs of `init-db`.
    pub fn seed_default_rules(&self) -> Result<usize, SentryError> {
        let existing: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM alert_rules", [], |row| row.get(0))
            .map_err(query_err)?;
        if existing > 0 {
            return Ok(0);
        }

        let defaults = [
            (
                "Large daily price move",
                RuleKind::PriceMovement { threshold_pct: 5.0 },
                Severity::Warning,
            ),
            (
                "Extreme daily price move",
                RuleKind::PriceMovement {
                    threshold_pct: 10.0,
                },
                Severity::Critical,
            ),
            (
                "RSI oversold",
                RuleKind::Rsi {
                    side: RsiSide::Oversold,
                    threshold: 30.0,
                },
                Severity::Info,
            ),
            (
                "RSI overbought",
                RuleKind::Rsi {
                    side: RsiSide::Overbought,
                    threshold: 70.0,
                },
                Severity::Info,
            ),
            (
                "Bullish MA crossover",
                RuleKind::MaCrossover {
                    direction: CrossoverSignal::Bullish,
                },
                Severity::Info,
            ),
            (
                "Bearish MA crossover",
                RuleKind::MaCrossover {
                    direction: CrossoverSignal::Bearish,
                },
                Severity::Warning,
            ),
            (
                "High volatility",
                RuleKind::Volatility { threshold: 0.6 },
                Severity::Warning,
            ),
            (
                "Volume spike",
                RuleKind::VolumeSpike {
                    multiplier: 2.0,
                    lookback_days: 30,
                },
                Severity::Info,
            ),
        ];

        for (name, kind, severity) in &defaults {
            self.insert_rule(&AlertRule {
                rule_id: 0,
                name: name.to_string(),
                kind: kind.clone(),
                severity: *severity,
                active: true,
            })?;
        }
        Ok(defaults.len())
    }
}

fn query_err(e: rusqlite::Error) -> SentryError {
    SentryError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(raw, DATE_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            raw.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

fn price_from_row(row: &rusqlite::Row<'_>) -> Result<PriceObservation, rusqlite::Error> {
    let date_str: String = row.get(1)?;
    let quality_str: String = row.get(11)?;
    Ok(PriceObservation {
        symbol: row.get(0)?,
        trade_date: parse_date(&date_str)?,
        close: row.get(2)?,
        open: row.get(3)?,
        high: row.get(4)?,
        low: row.get(5)?,
        volume: row.get(6)?,
        change_1d_pct: row.get(7)?,
        change_ytd_pct: row.get(8)?,
        market_cap: row.get(9)?,
        source: row.get(10)?,
        quality: QualityFlag::parse(&quality_str).unwrap_or(QualityFlag::Incomplete),
    })
}

const PRICE_COLUMNS: &str = "symbol, trade_date, close, open, high, low, volume, \
     change_1d_pct, change_ytd_pct, market_cap, source, quality";

fn snapshot_from_row(row: &rusqlite::Row<'_>) -> Result<IndicatorSnapshot, rusqlite::Error> {
    let date_str: String = row.get(1)?;
    let crossover_str: Option<String> = row.get(12)?;
    Ok(IndicatorSnapshot {
        symbol: row.get(0)?,
        calc_date: parse_date(&date_str)?,
        ma_short: row.get(2)?,
        ma_long: row.get(3)?,
        rsi: row.get(4)?,
        macd_line: row.get(5)?,
        macd_signal: row.get(6)?,
        macd_histogram: row.get(7)?,
        bb_upper: row.get(8)?,
        bb_middle: row.get(9)?,
        bb_lower: row.get(10)?,
        volatility: row.get(11)?,
        crossover: crossover_str.as_deref().and_then(CrossoverSignal::parse),
    })
}

const SNAPSHOT_COLUMNS: &str = "symbol, calc_date, ma_short, ma_long, rsi, macd_line, \
     macd_signal, macd_histogram, bb_upper, bb_middle, bb_lower, volatility, crossover";

impl SymbolStore for SqliteStore {
    fn upsert_symbols(&self, symbols: &[SymbolRecord]) -> Result<usize, SentryError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        for record in symbols {
            tx.execute(
                "INSERT INTO symbols (symbol, company_name, sector, exchange, active)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(symbol) DO UPDATE SET
                     company_name = excluded.company_name,
                     sector = excluded.sector,
                     exchange = excluded.exchange,
                     active = excluded.active",
                params![
                    record.symbol,
                    record.company_name,
                    record.sector,
                    record.exchange,
                    record.active as i64
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        Ok(symbols.len())
    }

    fn get_active_symbols(&self) -> Result<Vec<SymbolRecord>, SentryError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT symbol, company_name, sector, exchange, active
                 FROM symbols WHERE active = 1 ORDER BY symbol",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(SymbolRecord {
                    symbol: row.get(0)?,
                    company_name: row.get(1)?,
                    sector: row.get(2)?,
                    exchange: row.get(3)?,
                    active: row.get::<_, i64>(4)? != 0,
                })
            })
            .map_err(query_err)?;

        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(row.map_err(query_err)?);
        }
        Ok(symbols)
    }
}

impl PriceStore for SqliteStore {
    fn upsert_prices(&self, prices: &[PriceObservation]) -> Result<usize, SentryError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        for obs in prices {
            tx.execute(
                "INSERT OR REPLACE INTO prices
                 (symbol, trade_date, close, open, high, low, volume,
                  change_1d_pct, change_ytd_pct, market_cap, source, quality)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    obs.symbol,
                    obs.trade_date.format(DATE_FMT).to_string(),
                    obs.close,
                    obs.open,
                    obs.high,
                    obs.low,
                    obs.volume,
                    obs.change_1d_pct,
                    obs.change_ytd_pct,
                    obs.market_cap,
                    obs.source,
                    obs.quality.as_str()
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        Ok(prices.len())
    }

    fn get_latest_price(
        &self,
        symbol: &str,
        as_of: NaiveDate,
    ) -> Result<Option<PriceObservation>, SentryError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT {PRICE_COLUMNS} FROM prices
                 WHERE symbol = ?1 AND trade_date <= ?2
                 ORDER BY trade_date DESC LIMIT 1"
            ),
            params![symbol, as_of.format(DATE_FMT).to_string()],
            price_from_row,
        )
        .optional()
        .map_err(query_err)
    }

    fn get_price_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceObservation>, SentryError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {PRICE_COLUMNS} FROM prices
                 WHERE symbol = ?1 AND trade_date >= ?2 AND trade_date <= ?3
                 ORDER BY trade_date ASC"
            ))
            .map_err(query_err)?;

        let rows = stmt
            .query_map(
                params![
                    symbol,
                    start.format(DATE_FMT).to_string(),
                    end.format(DATE_FMT).to_string()
                ],
                price_from_row,
            )
            .map_err(query_err)?;

        let mut prices = Vec::new();
        for row in rows {
            prices.push(row.map_err(query_err)?);
        }
        Ok(prices)
    }
}

impl IndicatorStore for SqliteStore {
    fn upsert_indicators(&self, snapshots: &[IndicatorSnapshot]) -> Result<usize, SentryError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        for snap in snapshots {
            tx.execute(
                "INSERT OR REPLACE INTO indicators
                 (symbol, calc_date, ma_short, ma_long, rsi, macd_line, macd_signal,
                  macd_histogram, bb_upper, bb_middle, bb_lower, volatility, crossover)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    snap.symbol,
                    snap.calc_date.format(DATE_FMT).to_string(),
                    snap.ma_short,
                    snap.ma_long,
                    snap.rsi,
                    snap.macd_line,
                    snap.macd_signal,
                    snap.macd_histogram,
                    snap.bb_upper,
                    snap.bb_middle,
                    snap.bb_lower,
                    snap.volatility,
                    snap.crossover.map(|c| c.as_str())
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        Ok(snapshots.len())
    }

    fn get_latest_indicators(
        &self,
        symbol: &str,
        as_of: NaiveDate,
    ) -> Result<Option<IndicatorSnapshot>, SentryError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT {SNAPSHOT_COLUMNS} FROM indicators
                 WHERE symbol = ?1 AND calc_date <= ?2
                 ORDER BY calc_date DESC LIMIT 1"
            ),
            params![symbol, as_of.format(DATE_FMT).to_string()],
            snapshot_from_row,
        )
        .optional()
        .map_err(query_err)
    }
}

impl RuleStore for SqliteStore {
    fn get_active_rules(&self) -> Result<Vec<AlertRule>, SentryError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT rule_id, name, rule_type, parameters, severity, active
                 FROM alert_rules WHERE active = 1 ORDER BY rule_id",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)? != 0,
                ))
            })
            .map_err(query_err)?;

        // Unknown types and malformed parameters are rejected here, at the
        // storage boundary, instead of failing mid-evaluation.
        let mut rules = Vec::new();
        for row in rows {
            let (rule_id, name, rule_type, parameters, severity, active) =
                row.map_err(query_err)?;
            let kind = RuleKind::from_stored(rule_id, &rule_type, &parameters)?;
            let severity =
                Severity::parse(&severity).ok_or_else(|| SentryError::RuleInvalid {
                    rule_id,
                    reason: format!("unknown severity '{severity}'"),
                })?;
            rules.push(AlertRule {
                rule_id,
                name,
                kind,
                severity,
                active,
            });
        }
        Ok(rules)
    }

    fn insert_rule(&self, rule: &AlertRule) -> Result<i64, SentryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO alert_rules (name, rule_type, parameters, severity, active)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                rule.name,
                rule.kind.type_tag(),
                rule.kind.params_string(),
                rule.severity.as_str(),
                rule.active as i64
            ],
        )
        .map_err(query_err)?;
        Ok(conn.last_insert_rowid())
    }
}

impl AlertStore for SqliteStore {
    fn alert_exists(
        &self,
        symbol: &str,
        rule_id: i64,
        alert_date: NaiveDate,
    ) -> Result<bool, SentryError> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM alerts
                 WHERE symbol = ?1 AND rule_id = ?2 AND alert_date = ?3",
                params![symbol, rule_id, alert_date.format(DATE_FMT).to_string()],
                |row| row.get(0),
            )
            .map_err(query_err)?;
        Ok(count > 0)
    }

    fn insert_alerts(&self, alerts: &[AlertEvent]) -> Result<usize, SentryError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        let mut inserted = 0;
        for alert in alerts {
            inserted += tx.execute(
                "INSERT OR IGNORE INTO alerts
                 (symbol, rule_id, alert_date, severity, message, trigger_value,
                  resolved, notified)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    alert.symbol,
                    alert.rule_id,
                    alert.alert_date.format(DATE_FMT).to_string(),
                    alert.severity.as_str(),
                    alert.message,
                    alert.trigger_value,
                    alert.resolved as i64,
                    alert.notified as i64
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        Ok(inserted)
    }

    fn get_alerts_for_date(&self, alert_date: NaiveDate) -> Result<Vec<AlertEvent>, SentryError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT symbol, rule_id, alert_date, severity, message, trigger_value,
                        resolved, notified
                 FROM alerts WHERE alert_date = ?1 ORDER BY severity, symbol",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![alert_date.format(DATE_FMT).to_string()], |row| {
                let date_str: String = row.get(2)?;
                let severity_str: String = row.get(3)?;
                Ok(AlertEvent {
                    symbol: row.get(0)?,
                    rule_id: row.get(1)?,
                    alert_date: parse_date(&date_str)?,
                    severity: Severity::parse(&severity_str).unwrap_or(Severity::Info),
                    message: row.get(4)?,
                    trigger_value: row.get(5)?,
                    resolved: row.get::<_, i64>(6)? != 0,
                    notified: row.get::<_, i64>(7)? != 0,
                })
            })
            .map_err(query_err)?;

        let mut alerts = Vec::new();
        for row in rows {
            alerts.push(row.map_err(query_err)?);
        }
        Ok(alerts)
    }
}

impl RecommendationStore for SqliteStore {
    fn upsert_recommendations(&self, recs: &[Recommendation]) -> Result<usize, SentryError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        for rec in recs {
            tx.execute(
                "INSERT OR REPLACE INTO recommendations
                 (symbol, rec_date, signal, confidence, score, category,
                  current_price, target_price, stop_loss, risk, reasons)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    rec.symbol,
                    rec.rec_date.format(DATE_FMT).to_string(),
                    rec.signal.as_str(),
                    rec.confidence,
                    rec.score,
                    rec.category.as_str(),
                    rec.current_price,
                    rec.target_price,
                    rec.stop_loss,
                    rec.risk.as_str(),
                    rec.reasons.join("\n")
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        Ok(recs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::advisor::RiskLevel;
    use crate::domain::scoring::ScoreCategory;
    use crate::domain::signals::SignalKind;

    fn store() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize_schema().unwrap();
        store
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn obs(symbol: &str, date: NaiveDate, close: f64) -> PriceObservation {
        PriceObservation {
            symbol: symbol.into(),
            trade_date: date,
            close,
            open: None,
            high: None,
            low: None,
            volume: Some(1_000),
            change_1d_pct: Some(0.5),
            change_ytd_pct: None,
            market_cap: None,
            source: "test".into(),
            quality: QualityFlag::Good,
        }
    }

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    #[test]
    fn from_config_missing_path() {
        match SqliteStore::from_config(&EmptyConfig) {
            Err(SentryError::ConfigMissing { section, key }) => {
                assert_eq!(section, "sqlite");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn symbol_upsert_and_fetch() {
        let store = store();
        let records = vec![
            SymbolRecord {
                symbol: "GTCO".into(),
                company_name: "Guaranty Trust".into(),
                sector: "Banking".into(),
                exchange: "NGX".into(),
                active: true,
            },
            SymbolRecord {
                symbol: "DELISTED".into(),
                company_name: "Gone Plc".into(),
                sector: "Unknown".into(),
                exchange: "NGX".into(),
                active: false,
            },
        ];
        assert_eq!(store.upsert_symbols(&records).unwrap(), 2);

        let active = store.get_active_symbols().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].symbol, "GTCO");
    }

    #[test]
    fn price_history_ordered_and_latest() {
        let store = store();
        store
            .upsert_prices(&[
                obs("GTCO", day(3), 101.0),
                obs("GTCO", day(1), 100.0),
                obs("GTCO", day(2), 99.5),
            ])
            .unwrap();

        let history = store.get_price_history("GTCO", day(1), day(3)).unwrap();
        assert_eq!(history.len(), 3);
        assert!(history.windows(2).all(|w| w[0].trade_date < w[1].trade_date));

        let latest = store.get_latest_price("GTCO", day(2)).unwrap().unwrap();
        assert_eq!(latest.trade_date, day(2));
        assert!(store.get_latest_price("ZZZ", day(2)).unwrap().is_none());
    }

    #[test]
    fn price_upsert_replaces_same_day_row() {
        let store = store();
        store.upsert_prices(&[obs("GTCO", day(1), 100.0)]).unwrap();
        store.upsert_prices(&[obs("GTCO", day(1), 105.0)]).unwrap();

        let history = store.get_price_history("GTCO", day(1), day(1)).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].close, 105.0);
    }

    #[test]
    fn indicator_round_trip_preserves_absent_fields() {
        let store = store();
        let snap = IndicatorSnapshot {
            symbol: "GTCO".into(),
            calc_date: day(1),
            ma_short: 100.0,
            ma_long: 98.0,
            rsi: 55.0,
            macd_line: 0.4,
            macd_signal: 0.3,
            macd_histogram: 0.1,
            bb_upper: None,
            bb_middle: 100.0,
            bb_lower: None,
            volatility: None,
            crossover: Some(CrossoverSignal::Bullish),
        };
        store.upsert_indicators(std::slice::from_ref(&snap)).unwrap();

        let loaded = store.get_latest_indicators("GTCO", day(5)).unwrap().unwrap();
        assert_eq!(loaded, snap);
    }

    #[test]
    fn seeded_rules_parse_into_typed_kinds() {
        let store = store();
        let seeded = store.seed_default_rules().unwrap();
        assert_eq!(seeded, 8);
        // Second seed is a no-op.
        assert_eq!(store.seed_default_rules().unwrap(), 0);

        let rules = store.get_active_rules().unwrap();
        assert_eq!(rules.len(), 8);
        assert!(rules
            .iter()
            .any(|r| matches!(r.kind, RuleKind::VolumeSpike { .. })));
    }

    #[test]
    fn alert_dedup_via_primary_key() {
        let store = store();
        let alert = AlertEvent {
            symbol: "GTCO".into(),
            rule_id: 1,
            alert_date: day(1),
            severity: Severity::Warning,
            message: "test".into(),
            trigger_value: 6.0,
            resolved: false,
            notified: false,
        };

        assert!(!store.alert_exists("GTCO", 1, day(1)).unwrap());
        store.insert_alerts(std::slice::from_ref(&alert)).unwrap();
        assert!(store.alert_exists("GTCO", 1, day(1)).unwrap());

        // Re-inserting the same key is ignored.
        store.insert_alerts(std::slice::from_ref(&alert)).unwrap();
        assert_eq!(store.get_alerts_for_date(day(1)).unwrap().len(), 1);
    }

    #[test]
    fn recommendation_upsert() {
        let store = store();
        let rec = Recommendation {
            symbol: "GTCO".into(),
            rec_date: day(1),
            signal: SignalKind::StrongBuy,
            confidence: 0.9,
            score: 82.0,
            category: ScoreCategory::Excellent,
            current_price: 100.0,
            target_price: Some(115.0),
            stop_loss: Some(93.0),
            risk: RiskLevel::Medium,
            reasons: vec!["a".into(), "b".into()],
        };
        assert_eq!(store.upsert_recommendations(&[rec]).unwrap(), 1);
    }
}
