//! Persistence port traits, one per aggregate.
//!
//! Every call is transactional on its own: a bulk upsert either lands fully
//! or not at all. "Not found" is `Ok(None)` or an empty vec, never an error.

use chrono::NaiveDate;

use crate::domain::advisor::Recommendation;
use crate::domain::alert::{AlertEvent, AlertRule};
use crate::domain::error::SentryError;
use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::market::{PriceObservation, SymbolRecord};

pub trait SymbolStore {
    fn upsert_symbols(&self, symbols: &[SymbolRecord]) -> Result<usize, SentryError>;
    fn get_active_symbols(&self) -> Result<Vec<SymbolRecord>, SentryError>;
}

pub trait PriceStore {
    fn upsert_prices(&self, prices: &[PriceObservation]) -> Result<usize, SentryError>;

    /// Latest observation on or before `as_of`.
    fn get_latest_price(
        &self,
        symbol: &str,
        as_of: NaiveDate,
    ) -> Result<Option<PriceObservation>, SentryError>;

    /// Observations in `[start, end]`, ascending by trade date.
    fn get_price_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceObservation>, SentryError>;
}

pub trait IndicatorStore {
    fn upsert_indicators(&self, snapshots: &[IndicatorSnapshot]) -> Result<usize, SentryError>;

    /// Latest snapshot on or before `as_of`.
    fn get_latest_indicators(
        &self,
        symbol: &str,
        as_of: NaiveDate,
    ) -> Result<Option<IndicatorSnapshot>, SentryError>;
}

pub trait RuleStore {
    fn get_active_rules(&self) -> Result<Vec<AlertRule>, SentryError>;
    fn insert_rule(&self, rule: &AlertRule) -> Result<i64, SentryError>;
}

pub trait AlertStore {
    /// Dedup check backing the one-alert-per-(symbol, rule, date) invariant.
    fn alert_exists(
        &self,
        symbol: &str,
        rule_id: i64,
        alert_date: NaiveDate,
    ) -> Result<bool, SentryError>;

    fn insert_alerts(&self, alerts: &[AlertEvent]) -> Result<usize, SentryError>;

    fn get_alerts_for_date(&self, alert_date: NaiveDate) -> Result<Vec<AlertEvent>, SentryError>;
}

pub trait RecommendationStore {
    fn upsert_recommendations(&self, recs: &[Recommendation]) -> Result<usize, SentryError>;
}
