//! OHLCV bars and the per-ticker price series container.

use crate::domain::error::ScreenError;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Ticker to date-ascending bars, in universe insertion order.
#[derive(Debug, Clone, Default)]
pub struct PriceSeries {
    entries: Vec<(String, Vec<OhlcvBar>)>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a ticker's bars after sorting by date and checking the
    /// series invariants. Replaces any existing entry for the ticker.
    pub fn insert(&mut self, ticker: &str, mut bars: Vec<OhlcvBar>) -> Result<(), ScreenError> {
        bars.sort_by_key(|b| b.date);
        validate_bars(ticker, &bars)?;

        match self.entries.iter_mut().find(|(t, _)| t == ticker) {
            Some(entry) => entry.1 = bars,
            None => self.entries.push((ticker.to_string(), bars)),
        }
        Ok(())
    }

    pub fn get(&self, ticker: &str) -> Option<&[OhlcvBar]> {
        self.entries
            .iter()
            .find(|(t, _)| t == ticker)
            .map(|(_, bars)| bars.as_slice())
    }

    pub fn remove(&mut self, ticker: &str) -> Option<Vec<OhlcvBar>> {
        let idx = self.entries.iter().position(|(t, _)| t == ticker)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_bars(ticker: &str, bars: &[OhlcvBar]) -> Result<(), ScreenError> {
    let invalid = |reason: String| ScreenError::InvalidSeries {
        ticker: ticker.to_string(),
        reason,
    };

    for bar in bars {
        let prices = [bar.open, bar.high, bar.low, bar.close];
        if prices.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(invalid(format!("negative or non-finite price on {}", bar.date)));
        }
        if bar.volume < 0 {
            return Err(invalid(format!("negative volume on {}", bar.date)));
        }
    }

    if let Some(w) = bars.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(invalid(format!("duplicate date {}", w[1].date)));
    }
    Ok(())
}

/// Simple daily returns `close[i] / close[i-1] - 1`, paired with the later
/// bar's date. Returns from a zero close are skipped.
pub fn daily_returns(bars: &[OhlcvBar]) -> Vec<(NaiveDate, f64)> {
    bars.windows(2)
        .filter(|w| w[0].close > 0.0)
        .map(|w| (w[1].date, w[1].close / w[0].close - 1.0))
        .collect()
}
