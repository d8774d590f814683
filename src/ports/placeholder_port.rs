//! Synthetic fallback data port trait.

use crate::domain::fundamentals::FundamentalsRow;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Stand-in data for tickers the provider could not deliver.
///
/// Output must depend only on the arguments so repeated runs agree.
pub trait PlaceholderPolicy {
    fn placeholder_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Vec<OhlcvBar>;

    fn placeholder_fundamentals(&self, ticker: &str) -> FundamentalsRow;
}
