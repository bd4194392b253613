//! OHLCV data access port trait.

use crate::domain::error::ScreenerError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Implementations must be shareable across profiling workers.
pub trait DataPort: Sync {
    /// Bars for `code` between the two dates inclusive, oldest first.
    fn fetch_ohlcv(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenerError>;

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, ScreenerError>;
}
