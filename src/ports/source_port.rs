//! Market data ingestion port trait.

use chrono::NaiveDate;

use crate::domain::error::SentryError;
use crate::domain::market::RawPriceRow;

pub trait SourcePort {
    /// Fetch raw rows for one trading day. `symbols` narrows the pull when
    /// non-empty. An empty result is a valid outcome, not an error.
    fn fetch(
        &self,
        as_of: NaiveDate,
        symbols: &[String],
    ) -> Result<Vec<RawPriceRow>, SentryError>;

    /// Short name used in log lines and fetch errors.
    fn source_name(&self) -> &str;
}
