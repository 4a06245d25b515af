//! CSV ingestion adapter.
//!
//! Reads one file per trading day, `<dir>/<YYYY-MM-DD>.csv`, with columns
//! `symbol,company_name,sector,exchange,close,open,high,low,volume,
//! change_1d_pct,change_ytd_pct,market_cap`. A missing file is an empty
//! fetch, not an error; a malformed file is a fetch error.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::error::SentryError;
use crate::domain::market::RawPriceRow;
use crate::ports::source_port::SourcePort;

pub struct CsvSource {
    base_path: PathBuf,
}

impl CsvSource {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, as_of: NaiveDate) -> PathBuf {
        self.base_path.join(format!("{}.csv", as_of.format("%Y-%m-%d")))
    }

    fn fetch_err(&self, reason: String) -> SentryError {
        SentryError::Fetch {
            source_name: self.source_name().to_string(),
            reason,
        }
    }
}

fn opt_f64(field: Option<&str>) -> Result<Option<f64>, String> {
    match field.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<f64>()
            .map(Some)
            .map_err(|e| format!("invalid number '{raw}': {e}")),
    }
}

fn opt_i64(field: Option<&str>) -> Result<Option<i64>, String> {
    match field.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|e| format!("invalid integer '{raw}': {e}")),
    }
}

impl SourcePort for CsvSource {
    fn fetch(
        &self,
        as_of: NaiveDate,
        symbols: &[String],
    ) -> Result<Vec<RawPriceRow>, SentryError> {
        let path = self.csv_path(as_of);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| self.fetch_err(format!("failed to read {}: {e}", path.display())))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut rows = Vec::new();

        for (line, result) in rdr.records().enumerate() {
            let record = result
                .map_err(|e| self.fetch_err(format!("CSV parse error at row {}: {e}", line + 1)))?;

            let field = |i: usize| record.get(i).map(str::trim).filter(|s| !s.is_empty());

            let symbol = field(0)
                .ok_or_else(|| self.fetch_err(format!("row {}: missing symbol", line + 1)))?
                .to_string();
            if !symbols.is_empty() && !symbols.contains(&symbol) {
                continue;
            }

            let close: f64 = field(4)
                .ok_or_else(|| self.fetch_err(format!("row {}: missing close", line + 1)))?
                .parse()
                .map_err(|e| self.fetch_err(format!("row {}: invalid close: {e}", line + 1)))?;

            let row_err =
                |e: String| self.fetch_err(format!("row {} ({symbol}): {e}", line + 1));

            let open = opt_f64(record.get(5)).map_err(&row_err)?;
            let high = opt_f64(record.get(6)).map_err(&row_err)?;
            let low = opt_f64(record.get(7)).map_err(&row_err)?;
            let volume = opt_i64(record.get(8)).map_err(&row_err)?;
            let change_1d_pct = opt_f64(record.get(9)).map_err(&row_err)?;
            let change_ytd_pct = opt_f64(record.get(10)).map_err(&row_err)?;
            let market_cap = opt_f64(record.get(11)).map_err(&row_err)?;

            rows.push(RawPriceRow {
                company_name: field(1).unwrap_or_default().to_string(),
                sector: field(2).map(str::to_string),
                exchange: field(3).unwrap_or_default().to_string(),
                trade_date: as_of,
                close,
                open,
                high,
                low,
                volume,
                change_1d_pct,
                change_ytd_pct,
                market_cap,
                source: self.source_name().to_string(),
                symbol,
            });
        }

        Ok(rows)
    }

    fn source_name(&self) -> &str {
        "csv"
    }
}
