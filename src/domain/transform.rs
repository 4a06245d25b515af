//! Transformation of validated rows into persistable records.
//!
//! Each step is a pure function from one sequence of records to a new one:
//! symbol/name normalisation, quality-flag derivation, last-wins
//! deduplication, and symbol-dimension extraction.

use std::collections::HashMap;

use crate::domain::market::{PriceObservation, QualityFlag, RawPriceRow, SymbolRecord};
use crate::domain::validate::CheckedRow;

/// Normalise a ticker symbol: trim, uppercase, keep only A-Z, 0-9 and '.'.
pub fn clean_symbol(raw: &str) -> String {
    raw.trim()
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Normalise a company name: collapse whitespace, title-case each word.
pub fn clean_company_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn quality_for(row: &RawPriceRow, suspicious: bool) -> QualityFlag {
    if suspicious {
        QualityFlag::Suspicious
    } else if row.change_1d_pct.is_some()
        && row.change_ytd_pct.is_some()
        && row.market_cap.is_some()
    {
        QualityFlag::Good
    } else {
        QualityFlag::Incomplete
    }
}

/// Transform checked rows into observations: normalise, flag, and
/// deduplicate keeping the last row per (symbol, trade_date).
pub fn to_observations(rows: &[CheckedRow]) -> Vec<PriceObservation> {
    let mut by_key: HashMap<(String, chrono::NaiveDate), usize> = HashMap::new();
    let mut out: Vec<PriceObservation> = Vec::with_capacity(rows.len());

    for checked in rows {
        let row = &checked.row;
        let obs = PriceObservation {
            symbol: clean_symbol(&row.symbol),
            trade_date: row.trade_date,
            close: row.close,
            open: row.open,
            high: row.high,
            low: row.low,
            volume: row.volume,
            change_1d_pct: row.change_1d_pct,
            change_ytd_pct: row.change_ytd_pct,
            market_cap: row.market_cap,
            source: row.source.clone(),
            quality: quality_for(row, checked.suspicious),
        };

        let key = (obs.symbol.clone(), obs.trade_date);
        match by_key.get(&key) {
            Some(&idx) => out[idx] = obs, // last wins
            None => {
                by_key.insert(key, out.len());
                out.push(obs);
            }
        }
    }

    out
}

/// Extract the distinct symbol dimension from checked rows (last row wins for
/// descriptive fields; missing sector becomes "Unknown").
pub fn extract_symbols(rows: &[CheckedRow]) -> Vec<SymbolRecord> {
    let mut by_symbol: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<SymbolRecord> = Vec::new();

    for checked in rows {
        let row = &checked.row;
        let record = SymbolRecord {
            symbol: clean_symbol(&row.symbol),
            company_name: clean_company_name(&row.company_name),
            sector: row.sector.clone().unwrap_or_else(|| "Unknown".to_string()),
            exchange: row.exchange.clone(),
            active: true,
        };
        match by_symbol.get(&record.symbol) {
            Some(&idx) => out[idx] = record,
            None => {
                by_symbol.insert(record.symbol.clone(), out.len());
                out.push(record);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn checked(symbol: &str, day: u32, close: f64, suspicious: bool) -> CheckedRow {
        CheckedRow {
            row: RawPriceRow {
                symbol: symbol.into(),
                company_name: "guaranty  trust holding".into(),
                sector: Some("Banking".into()),
                exchange: "NGX".into(),
                trade_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
                close,
                open: None,
                high: None,
                low: None,
                volume: Some(1000),
                change_1d_pct: Some(1.0),
                change_ytd_pct: Some(5.0),
                market_cap: Some(1.0e9),
                source: "test".into(),
            },
            suspicious,
        }
    }

    #[test]
    fn symbol_is_normalised() {
        assert_eq!(clean_symbol("  gtco "), "GTCO");
        assert_eq!(clean_symbol("brent-oil!"), "BRENTOIL");
        assert_eq!(clean_symbol("bhp.ax"), "BHP.AX");
    }

    #[test]
    fn company_name_is_title_cased() {
        assert_eq!(
            clean_company_name("guaranty  trust holding"),
            "Guaranty Trust Holding"
        );
    }

    #[test]
    fn dedup_keeps_last() {
        let rows = vec![
            checked("GTCO", 1, 45.0, false),
            checked("GTCO", 1, 45.5, false),
        ];
        let obs = to_observations(&rows);
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].close, 45.5);
    }

    #[test]
    fn quality_flags() {
        let complete = checked("GTCO", 1, 45.0, false);
        let mut incomplete = checked("ZENITH", 1, 38.0, false);
        incomplete.row.market_cap = None;
        let flagged = checked("UBA", 1, 20.0, true);

        let obs = to_observations(&[complete, incomplete, flagged]);
        assert_eq!(obs[0].quality, QualityFlag::Good);
        assert_eq!(obs[1].quality, QualityFlag::Incomplete);
        assert_eq!(obs[2].quality, QualityFlag::Suspicious);
    }

    #[test]
    fn symbols_are_distinct() {
        let rows = vec![
            checked("GTCO", 1, 45.0, false),
            checked("GTCO", 2, 45.5, false),
            checked("ZENITH", 1, 38.0, false),
        ];
        let symbols = extract_symbols(&rows);
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].symbol, "GTCO");
        assert_eq!(symbols[0].company_name, "Guaranty Trust Holding");
        assert!(symbols[0].active);
    }

    #[test]
    fn missing_sector_defaults_to_unknown() {
        let mut row = checked("GTCO", 1, 45.0, false);
        row.row.sector = None;
        let symbols = extract_symbols(&[row]);
        assert_eq!(symbols[0].sector, "Unknown");
    }
}
