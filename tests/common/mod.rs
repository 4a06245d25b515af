#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use chrono::NaiveDate;
use marketsentry::domain::error::SentryError;
use marketsentry::domain::market::RawPriceRow;
use marketsentry::ports::notifier_port::{Channel, NotifierPort, NotifyOutcome};
use marketsentry::ports::source_port::SourcePort;
pub use marketsentry::adapters::sqlite_store::SqliteStore;
pub use marketsentry::domain::alert::AlertEvent;

pub struct MockSource {
    pub rows: Vec<RawPriceRow>,
    pub fail_times: Cell<u32>,
}

impl MockSource {
    pub fn new(rows: Vec<RawPriceRow>) -> Self {
        Self {
            rows,
            fail_times: Cell::new(0),
        }
    }

    /// Fail the first `n` fetch calls before succeeding.
    pub fn failing(mut self, n: u32) -> Self {
        self.fail_times = Cell::new(n);
        self
    }
}

impl SourcePort for MockSource {
    fn fetch(
        &self,
        _as_of: NaiveDate,
        symbols: &[String],
    ) -> Result<Vec<RawPriceRow>, SentryError> {
        let remaining = self.fail_times.get();
        if remaining > 0 {
            self.fail_times.set(remaining - 1);
            return Err(SentryError::Fetch {
                source_name: "mock".into(),
                reason: "transient failure".into(),
            });
        }
        Ok(self
            .rows
            .iter()
            .filter(|r| symbols.is_empty() || symbols.contains(&r.symbol))
            .cloned()
            .collect())
    }

    fn source_name(&self) -> &str {
        "mock"
    }
}

#[derive(Default)]
pub struct MockNotifier {
    pub sent: RefCell<Vec<String>>,
    pub digests: RefCell<usize>,
    pub fail: bool,
}

impl MockNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl NotifierPort for MockNotifier {
    fn notify(&self, alert: &AlertEvent, _channels: &[Channel]) -> NotifyOutcome {
        if self.fail {
            return NotifyOutcome {
                sent: false,
                failed_channels: vec![Channel::Log],
                errors: vec!["mock notifier down".into()],
            };
        }
        self.sent.borrow_mut().push(alert.message.clone());
        NotifyOutcome {
            sent: true,
            ..NotifyOutcome::default()
        }
    }

    fn notify_digest(&self, _alerts: &[AlertEvent], _date: NaiveDate) -> NotifyOutcome {
        if self.fail {
            return NotifyOutcome {
                sent: false,
                failed_channels: vec![Channel::Log],
                errors: vec!["mock notifier down".into()],
            };
        }
        *self.digests.borrow_mut() += 1;
        NotifyOutcome {
            sent: true,
            ..NotifyOutcome::default()
        }
    }
}

pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn raw_row(symbol: &str, date: NaiveDate, close: f64) -> RawPriceRow {
    RawPriceRow {
        symbol: symbol.to_string(),
        company_name: format!("{symbol} Plc"),
        sector: Some("Banking".to_string()),
        exchange: "NGX".to_string(),
        trade_date: date,
        close,
        open: Some(close * 0.99),
        high: Some(close * 1.01),
        low: Some(close * 0.98),
        volume: Some(100_000),
        change_1d_pct: None,
        change_ytd_pct: Some(4.0),
        market_cap: Some(1.0e9),
        source: "mock".to_string(),
    }
}

pub fn memory_store() -> SqliteStore {
    let store = SqliteStore::in_memory().expect("in-memory store");
    store.initialize_schema().expect("schema");
    store
}
