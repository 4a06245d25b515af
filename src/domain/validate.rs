//! Row-level validation of fetched price data.
//!
//! Hard violations (unusable rows) are dropped and recorded as errors;
//! anomalies that are plausible but unusual are kept, flagged suspicious, and
//! recorded as warnings. Duplicate (symbol, trade_date) pairs are warnings —
//! the transform stage deduplicates them.

use std::collections::HashSet;

use crate::domain::market::RawPriceRow;

pub const MIN_PRICE: f64 = 0.01;
pub const MAX_PRICE: f64 = 1_000_000.0;
/// Daily moves beyond this are flagged suspicious, not rejected.
pub const MAX_DAILY_CHANGE_PCT: f64 = 50.0;

/// A raw row that survived validation, with its anomaly flag.
#[derive(Debug, Clone)]
pub struct CheckedRow {
    pub row: RawPriceRow,
    pub suspicious: bool,
}

/// Summary of one validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub valid_count: usize,
    pub suspicious_count: usize,
    pub invalid_count: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// True when no rows were rejected outright.
    pub fn is_valid(&self) -> bool {
        self.invalid_count == 0
    }

    pub fn total_count(&self) -> usize {
        self.valid_count + self.suspicious_count + self.invalid_count
    }
}

pub struct Validator {
    valid_exchanges: HashSet<String>,
    valid_sectors: HashSet<String>,
}

impl Validator {
    pub fn new(
        valid_exchanges: impl IntoIterator<Item = String>,
        valid_sectors: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            valid_exchanges: valid_exchanges.into_iter().collect(),
            valid_sectors: valid_sectors.into_iter().collect(),
        }
    }

    /// Validate a batch of raw rows, returning the surviving rows (in input
    /// order) plus a report. Surviving rows carry a `suspicious` flag that the
    /// transform stage folds into the stored quality flag.
    pub fn validate(&self, rows: &[RawPriceRow]) -> (Vec<CheckedRow>, ValidationReport) {
        let mut report = ValidationReport::default();
        let mut kept = Vec::with_capacity(rows.len());
        let mut seen: HashSet<(String, chrono::NaiveDate)> = HashSet::new();

        for row in rows {
            if let Some(err) = self.hard_violation(row) {
                report.errors.push(err);
                report.invalid_count += 1;
                continue;
            }

            let mut suspicious = false;

            if row.close < MIN_PRICE || row.close > MAX_PRICE {
                report.warnings.push(format!(
                    "{}: price outside normal range: {}",
                    row.symbol, row.close
                ));
                suspicious = true;
            }

            if let Some(change) = row.change_1d_pct {
                if change.abs() > MAX_DAILY_CHANGE_PCT {
                    report.warnings.push(format!(
                        "{}: extreme daily change: {:.2}%",
                        row.symbol, change
                    ));
                    suspicious = true;
                }
            }

            if !self.ohlc_consistent(row) {
                report
                    .warnings
                    .push(format!("{}: OHLC consistency violated", row.symbol));
                suspicious = true;
            }

            if let Some(sector) = &row.sector {
                if !self.valid_sectors.is_empty() && !self.valid_sectors.contains(sector) {
                    // Might be a genuinely new sector; warn without flagging.
                    report
                        .warnings
                        .push(format!("{}: unknown sector: {}", row.symbol, sector));
                }
            }

            if !seen.insert((row.symbol.clone(), row.trade_date)) {
                report.warnings.push(format!(
                    "Duplicate {} on {} (deduplicated downstream)",
                    row.symbol, row.trade_date
                ));
            }

            if suspicious {
                report.suspicious_count += 1;
            } else {
                report.valid_count += 1;
            }
            kept.push(CheckedRow {
                row: row.clone(),
                suspicious,
            });
        }

        (kept, report)
    }

    fn hard_violation(&self, row: &RawPriceRow) -> Option<String> {
        if row.symbol.trim().is_empty() {
            return Some(format!("missing symbol on {}", row.trade_date));
        }
        if !row.close.is_finite() || row.close <= 0.0 {
            return Some(format!(
                "{}: nonpositive close price: {}",
                row.symbol, row.close
            ));
        }
        if !self.valid_exchanges.is_empty() && !self.valid_exchanges.contains(&row.exchange) {
            return Some(format!(
                "{}: invalid exchange: {}",
                row.symbol, row.exchange
            ));
        }
        None
    }

    fn ohlc_consistent(&self, row: &RawPriceRow) -> bool {
        match (row.open, row.high, row.low) {
            (Some(_), Some(high), Some(low)) => {
                high >= low && high >= row.close && low <= row.close
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn validator() -> Validator {
        Validator::new(
            vec!["NGX".to_string()],
            vec!["Industrial".to_string(), "Banking".to_string()],
        )
    }

    fn raw(symbol: &str, day: u32, close: f64) -> RawPriceRow {
        RawPriceRow {
            symbol: symbol.into(),
            company_name: "Test Plc".into(),
            sector: Some("Banking".into()),
            exchange: "NGX".into(),
            trade_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            close,
            open: None,
            high: None,
            low: None,
            volume: Some(1000),
            change_1d_pct: Some(1.0),
            change_ytd_pct: None,
            market_cap: None,
            source: "test".into(),
        }
    }

    #[test]
    fn clean_rows_pass() {
        let rows = vec![raw("GTCO", 1, 45.0), raw("ZENITH", 1, 38.5)];
        let (kept, report) = validator().validate(&rows);
        assert_eq!(kept.len(), 2);
        assert_eq!(report.valid_count, 2);
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn nonpositive_close_is_dropped() {
        let rows = vec![raw("GTCO", 1, 0.0), raw("ZENITH", 1, 38.5)];
        let (kept, report) = validator().validate(&rows);
        assert_eq!(kept.len(), 1);
        assert_eq!(report.invalid_count, 1);
        assert!(!report.is_valid());
    }

    #[test]
    fn invalid_exchange_is_dropped() {
        let mut row = raw("GTCO", 1, 45.0);
        row.exchange = "NASDAQ".into();
        let (kept, report) = validator().validate(&[row]);
        assert!(kept.is_empty());
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn extreme_change_is_suspicious_but_kept() {
        let mut row = raw("GTCO", 1, 45.0);
        row.change_1d_pct = Some(-62.0);
        let (kept, report) = validator().validate(&[row]);
        assert_eq!(kept.len(), 1);
        assert!(kept[0].suspicious);
        assert_eq!(report.suspicious_count, 1);
        assert!(report.is_valid());
    }

    #[test]
    fn ohlc_violation_flags_suspicious() {
        let mut row = raw("GTCO", 1, 45.0);
        row.open = Some(44.0);
        row.high = Some(44.5); // below close
        row.low = Some(43.0);
        let (kept, _) = validator().validate(&[row]);
        assert!(kept[0].suspicious);
    }

    #[test]
    fn duplicate_is_a_warning_not_an_error() {
        let rows = vec![raw("GTCO", 1, 45.0), raw("GTCO", 1, 45.2)];
        let (kept, report) = validator().validate(&rows);
        assert_eq!(kept.len(), 2);
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.contains("Duplicate")));
    }

    #[test]
    fn unknown_sector_warns_without_flagging() {
        let mut row = raw("GTCO", 1, 45.0);
        row.sector = Some("Quantum".into());
        let (kept, report) = validator().validate(&[row]);
        assert!(!kept[0].suspicious);
        assert_eq!(report.warnings.len(), 1);
    }
}
