#![allow(dead_code)]

use chrono::NaiveDate;
use quantscreen::domain::error::ScreenError;
use quantscreen::domain::fundamentals::FundamentalsRow;
pub use quantscreen::domain::ohlcv::OhlcvBar;
use quantscreen::domain::screen::ScreenConfig;
use quantscreen::ports::data_port::MarketDataPort;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

pub struct MockDataPort {
    pub prices: HashMap<String, Vec<OhlcvBar>>,
    pub fundamentals: HashMap<String, FundamentalsRow>,
    pub errors: HashMap<String, String>,
    pub price_calls: RefCell<HashMap<String, usize>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            prices: HashMap::new(),
            fundamentals: HashMap::new(),
            errors: HashMap::new(),
            price_calls: RefCell::new(HashMap::new()),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.prices.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_fundamentals(mut self, row: FundamentalsRow) -> Self {
        self.fundamentals.insert(row.ticker.clone(), row);
        self
    }

    /// Every call for `ticker` fails with a transient provider error.
    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    pub fn price_calls(&self, ticker: &str) -> usize {
        self.price_calls.borrow().get(ticker).copied().unwrap_or(0)
    }
}

impl MarketDataPort for MockDataPort {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenError> {
        *self
            .price_calls
            .borrow_mut()
            .entry(ticker.to_string())
            .or_default() += 1;
        if let Some(reason) = self.errors.get(ticker) {
            return Err(ScreenError::ProviderUnavailable {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self
            .prices
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn fetch_fundamentals(&self, ticker: &str) -> Result<Option<FundamentalsRow>, ScreenError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(ScreenError::ProviderUnavailable {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.fundamentals.get(ticker).cloned())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn tickers(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub fn make_bar(date: NaiveDate, close: f64) -> OhlcvBar {
    OhlcvBar {
        date,
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume: 1000,
    }
}

/// Daily bars whose returns alternate between `drift + swing` and
/// `drift - swing`, so both trend and volatility are controlled.
pub fn generate_bars(start: NaiveDate, count: usize, drift: f64, swing: f64) -> Vec<OhlcvBar> {
    let mut close = 100.0;
    (0..count)
        .map(|i| {
            if i > 0 {
                let shock = if i % 2 == 0 { swing } else { -swing };
                close *= 1.0 + drift + shock;
            }
            make_bar(start + chrono::Duration::days(i as i64), close)
        })
        .collect()
}

/// A fully populated row; `value` is (P/E, P/B, EV/EBITDA) and `quality`
/// is (ROE, net margin, debt/equity).
pub fn fundamentals(ticker: &str, value: [f64; 3], quality: [f64; 3]) -> FundamentalsRow {
    let [pe, pb, ev_ebitda] = value;
    let [roe, net_margin, debt_to_equity] = quality;
    FundamentalsRow {
        ticker: ticker.to_string(),
        pe: Some(pe),
        pb: Some(pb),
        ev_ebitda: Some(ev_ebitda),
        roe: Some(roe),
        net_margin: Some(net_margin),
        debt_to_equity: Some(debt_to_equity),
    }
}

/// Four fully populated tickers with 200 bars each from 2024-01-01.
/// The fundamental ratios do not move together, so each factor mixes
/// genuinely different components.
pub fn sample_port() -> MockDataPort {
    let start = date(2024, 1, 1);
    MockDataPort::new()
        .with_bars("AAA", generate_bars(start, 200, 0.0020, 0.005))
        .with_bars("BBB", generate_bars(start, 200, 0.0010, 0.010))
        .with_bars("CCC", generate_bars(start, 200, -0.0005, 0.004))
        .with_bars("DDD", generate_bars(start, 200, 0.0005, 0.020))
        .with_fundamentals(fundamentals("AAA", [12.0, 1.5, 7.0], [0.25, 0.18, 0.4]))
        .with_fundamentals(fundamentals("BBB", [20.0, 3.2, 9.0], [0.15, 0.08, 0.8]))
        .with_fundamentals(fundamentals("CCC", [30.0, 2.4, 15.0], [0.05, 0.11, 1.5]))
        .with_fundamentals(fundamentals("DDD", [16.0, 4.0, 11.0], [0.10, 0.20, 1.0]))
}

pub fn sample_config() -> ScreenConfig {
    let mut config = ScreenConfig::new(date(2024, 1, 1), date(2024, 12, 31));
    config.top_n = 2;
    config.data_access.retry_delay = Duration::ZERO;
    config
}
