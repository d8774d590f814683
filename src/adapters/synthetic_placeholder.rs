//! Seeded random-walk placeholder data.
//!
//! Each ticker gets its own RNG stream derived from the configured seed and
//! the ticker symbol, so a given (seed, ticker, date range) always yields
//! the same series.

use crate::domain::fundamentals::FundamentalsRow;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::placeholder_port::PlaceholderPolicy;
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct SeededRandomWalk {
    pub seed: u64,
    pub start_price: f64,
    pub daily_drift: f64,
    pub daily_volatility: f64,
}

impl SeededRandomWalk {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            start_price: 100.0,
            daily_drift: 0.0003,
            daily_volatility: 0.015,
        }
    }

    fn rng_for(&self, ticker: &str, stream: u64) -> StdRng {
        // FNV-1a over the ticker bytes
        let hash = ticker.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
            (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
        });
        StdRng::seed_from_u64(self.seed ^ hash ^ stream)
    }
}

fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

impl PlaceholderPolicy for SeededRandomWalk {
    fn placeholder_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Vec<OhlcvBar> {
        let mut rng = self.rng_for(ticker, 0);
        // uniform on [-1, 1) has variance 1/3
        let scale = self.daily_volatility * 3f64.sqrt();
        let mut close = self.start_price;
        let mut bars = Vec::new();

        for date in start_date.iter_days().take_while(|d| *d <= end_date) {
            if !is_trading_day(date) {
                continue;
            }
            let open = close;
            let shock: f64 = rng.gen_range(-1.0..1.0);
            close = (open * (1.0 + self.daily_drift + scale * shock)).max(0.01);
            let wick: f64 = rng.gen_range(0.0..0.005);

            bars.push(OhlcvBar {
                date,
                open,
                high: open.max(close) * (1.0 + wick),
                low: open.min(close) * (1.0 - wick),
                close,
                volume: rng.gen_range(100_000..1_000_000),
            });
        }

        bars
    }

    fn placeholder_fundamentals(&self, ticker: &str) -> FundamentalsRow {
        let mut rng = self.rng_for(ticker, 1);
        FundamentalsRow {
            ticker: ticker.to_string(),
            pe: Some(rng.gen_range(8.0..35.0)),
            pb: Some(rng.gen_range(0.8..8.0)),
            ev_ebitda: Some(rng.gen_range(5.0..20.0)),
            roe: Some(rng.gen_range(0.02..0.30)),
            net_margin: Some(rng.gen_range(0.01..0.25)),
            debt_to_equity: Some(rng.gen_range(0.1..2.0)),
        }
    }
}
