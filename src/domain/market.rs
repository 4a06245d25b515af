//! Market data records: symbols, raw source rows, and persisted observations.

use chrono::NaiveDate;

/// A listed symbol and its descriptive attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolRecord {
    pub symbol: String,
    pub company_name: String,
    pub sector: String,
    pub exchange: String,
    pub active: bool,
}

/// One row as fetched from an ingestion source, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPriceRow {
    pub symbol: String,
    pub company_name: String,
    pub sector: Option<String>,
    pub exchange: String,
    pub trade_date: NaiveDate,
    pub close: f64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<i64>,
    pub change_1d_pct: Option<f64>,
    pub change_ytd_pct: Option<f64>,
    pub market_cap: Option<f64>,
    pub source: String,
}

/// Completeness flag attached to a persisted observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityFlag {
    /// Close plus both change fields and market cap present.
    Good,
    /// Close present but ancillary fields missing.
    Incomplete,
    /// Flagged suspicious by validation but retained.
    Suspicious,
}

impl QualityFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityFlag::Good => "GOOD",
            QualityFlag::Incomplete => "INCOMPLETE",
            QualityFlag::Suspicious => "SUSPICIOUS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GOOD" => Some(QualityFlag::Good),
            "INCOMPLETE" => Some(QualityFlag::Incomplete),
            "SUSPICIOUS" => Some(QualityFlag::Suspicious),
            _ => None,
        }
    }
}

/// A validated, persisted daily price observation.
///
/// At most one observation exists per (symbol, trade_date); immutable once
/// stored apart from quality-flag updates.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceObservation {
    pub symbol: String,
    pub trade_date: NaiveDate,
    pub close: f64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<i64>,
    pub change_1d_pct: Option<f64>,
    pub change_ytd_pct: Option<f64>,
    pub market_cap: Option<f64>,
    pub source: String,
    pub quality: QualityFlag,
}
