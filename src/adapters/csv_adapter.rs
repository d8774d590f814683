//! CSV file market-data adapter.
//!
//! Layout under `base_path`:
//! - `<TICKER>.csv` with columns `date,open,high,low,close,volume`
//! - `fundamentals.csv` with a `ticker` column plus any of `pe`, `pb`,
//!   `ev_ebitda`, `roe`, `net_margin`, `debt_to_equity`; blank cells are
//!   missing values. The file is parsed once, on the first fundamentals
//!   request, and served from memory afterwards.

use crate::domain::error::ScreenError;
use crate::domain::fundamentals::FundamentalsRow;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::MarketDataPort;
use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const FUNDAMENTALS_FILE: &str = "fundamentals.csv";

pub struct CsvMarketDataAdapter {
    base_path: PathBuf,
    /// Upper-cased ticker to row; `None` until the file has been read.
    fundamentals: RefCell<Option<HashMap<String, FundamentalsRow>>>,
}

impl CsvMarketDataAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            fundamentals: RefCell::new(None),
        }
    }

    fn price_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    /// File contents, `None` when the file does not exist. Other I/O
    /// failures are reported as a provider outage.
    fn read_optional(&self, ticker: &str, path: &Path) -> Result<Option<String>, ScreenError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ScreenError::ProviderUnavailable {
                ticker: ticker.to_string(),
                reason: format!("failed to read {}: {}", path.display(), e),
            }),
        }
    }

    /// Parse the whole fundamentals file. A missing file yields no rows;
    /// the first row wins when a ticker repeats.
    fn load_fundamentals(
        &self,
        ticker: &str,
    ) -> Result<HashMap<String, FundamentalsRow>, ScreenError> {
        let path = self.base_path.join(FUNDAMENTALS_FILE);
        let mut rows = HashMap::new();
        let Some(content) = self.read_optional(ticker, &path)? else {
            return Ok(rows);
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| bad_fundamentals(ticker, format!("CSV header error: {}", e)))?
            .clone();
        let column = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
        let ticker_col = column("ticker")
            .ok_or_else(|| bad_fundamentals(ticker, "fundamentals.csv has no ticker column".into()))?;

        for result in rdr.records() {
            let record = result.map_err(|e| bad_fundamentals(ticker, format!("CSV parse error: {}", e)))?;
            let Some(key) = record
                .get(ticker_col)
                .map(|t| t.trim().to_ascii_uppercase())
                .filter(|t| !t.is_empty())
            else {
                continue;
            };

            let value = |name: &str| parse_optional(column(name).and_then(|i| record.get(i)));
            let row = FundamentalsRow {
                ticker: key.clone(),
                pe: value("pe"),
                pb: value("pb"),
                ev_ebitda: value("ev_ebitda"),
                roe: value("roe"),
                net_margin: value("net_margin"),
                debt_to_equity: value("debt_to_equity"),
            };
            rows.entry(key).or_insert(row);
        }

        Ok(rows)
    }
}

fn malformed(ticker: &str, reason: String) -> ScreenError {
    ScreenError::InvalidSeries {
        ticker: ticker.to_string(),
        reason,
    }
}

fn bad_fundamentals(ticker: &str, reason: String) -> ScreenError {
    ScreenError::InvalidFundamentals {
        ticker: ticker.to_string(),
        reason,
    }
}

fn parse_field<T: std::str::FromStr>(
    ticker: &str,
    record: &csv::StringRecord,
    idx: usize,
    name: &str,
) -> Result<T, ScreenError>
where
    T::Err: std::fmt::Display,
{
    record
        .get(idx)
        .ok_or_else(|| malformed(ticker, format!("missing {} column", name)))?
        .trim()
        .parse()
        .map_err(|e| malformed(ticker, format!("invalid {} value: {}", name, e)))
}

fn parse_optional(value: Option<&str>) -> Option<f64> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

impl MarketDataPort for CsvMarketDataAdapter {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenError> {
        let path = self.price_path(ticker);
        let Some(content) = self.read_optional(ticker, &path)? else {
            return Ok(Vec::new());
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| malformed(ticker, format!("CSV parse error: {}", e)))?;

            let date_str = record
                .get(0)
                .ok_or_else(|| malformed(ticker, "missing date column".into()))?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
                .map_err(|e| malformed(ticker, format!("invalid date format: {}", e)))?;

            if date < start_date || date > end_date {
                continue;
            }

            bars.push(OhlcvBar {
                date,
                open: parse_field(ticker, &record, 1, "open")?,
                high: parse_field(ticker, &record, 2, "high")?,
                low: parse_field(ticker, &record, 3, "low")?,
                close: parse_field(ticker, &record, 4, "close")?,
                volume: parse_field(ticker, &record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn fetch_fundamentals(&self, ticker: &str) -> Result<Option<FundamentalsRow>, ScreenError> {
        // failed reads are not cached so a retry reads the file again
        if self.fundamentals.borrow().is_none() {
            let rows = self.load_fundamentals(ticker)?;
            *self.fundamentals.borrow_mut() = Some(rows);
        }

        let cache = self.fundamentals.borrow();
        Ok(cache
            .as_ref()
            .and_then(|rows| rows.get(&ticker.to_ascii_uppercase()))
            .map(|row| FundamentalsRow {
                ticker: ticker.to_string(),
                ..row.clone()
            }))
    }
}
