//! Market-data provider port trait.

use crate::domain::error::ScreenError;
use crate::domain::fundamentals::FundamentalsRow;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// A source of price history and fundamentals.
///
/// Implementations report transient outages as
/// [`ScreenError::ProviderUnavailable`] so callers can retry. An empty
/// result means the provider has nothing for the ticker.
pub trait MarketDataPort {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenError>;

    fn fetch_fundamentals(&self, ticker: &str) -> Result<Option<FundamentalsRow>, ScreenError>;
}
