//! Data access with bounded retries and placeholder fallback.
//!
//! Every provider call is retried on transient failure up to
//! `max_attempts` times with a fixed pause. Tickers the provider cannot
//! deliver are substituted from the injected [`PlaceholderPolicy`] when one
//! is present, and reported either way. A deadline covers the whole phase.

use crate::domain::error::ScreenError;
use crate::domain::fundamentals::FundamentalsRow;
use crate::domain::ohlcv::PriceSeries;
use crate::ports::data_port::MarketDataPort;
use crate::ports::placeholder_port::PlaceholderPolicy;
use chrono::NaiveDate;
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct DataAccessConfig {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub timeout: Option<Duration>,
}

impl Default for DataAccessConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_millis(500),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchFailure {
    /// Provider answered with nothing for the ticker.
    NoData,
    /// Provider errored on every attempt (or on a non-retryable error).
    Provider(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::NoData => f.write_str("no data returned"),
            FetchFailure::Provider(reason) => write!(f, "provider error: {reason}"),
        }
    }
}

/// A ticker the provider did not deliver.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedTicker {
    pub ticker: String,
    pub failure: FetchFailure,
    /// Whether placeholder data was substituted.
    pub defaulted: bool,
}

#[derive(Debug, Default)]
pub struct PriceFetch {
    pub prices: PriceSeries,
    pub failures: Vec<FailedTicker>,
}

#[derive(Debug, Default)]
pub struct FundamentalsFetch {
    pub rows: Vec<FundamentalsRow>,
    pub failures: Vec<FailedTicker>,
}

pub struct DataAccess<'a> {
    port: &'a dyn MarketDataPort,
    placeholder: Option<&'a dyn PlaceholderPolicy>,
    config: DataAccessConfig,
    started: Instant,
}

impl<'a> DataAccess<'a> {
    /// The deadline clock starts here.
    pub fn new(
        port: &'a dyn MarketDataPort,
        placeholder: Option<&'a dyn PlaceholderPolicy>,
        config: DataAccessConfig,
    ) -> Self {
        Self {
            port,
            placeholder,
            config,
            started: Instant::now(),
        }
    }

    pub fn get_prices(
        &self,
        tickers: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceFetch, ScreenError> {
        let mut fetch = PriceFetch::default();

        for ticker in tickers {
            let outcome = self
                .with_retry(ticker, || self.port.fetch_prices(ticker, start_date, end_date))?
                .and_then(|bars| {
                    if bars.is_empty() {
                        return Err(FetchFailure::NoData);
                    }
                    fetch
                        .prices
                        .insert(ticker, bars)
                        .map_err(|e| FetchFailure::Provider(e.to_string()))
                });

            let Err(failure) = outcome else {
                continue;
            };

            let defaulted = match self.placeholder {
                Some(policy) => {
                    let bars = policy.placeholder_prices(ticker, start_date, end_date);
                    fetch.prices.insert(ticker, bars).is_ok()
                }
                None => false,
            };
            warn!(%ticker, %failure, defaulted, "price fetch failed");
            fetch.failures.push(FailedTicker {
                ticker: ticker.clone(),
                failure,
                defaulted,
            });
        }

        Ok(fetch)
    }

    pub fn get_fundamentals(&self, tickers: &[String]) -> Result<FundamentalsFetch, ScreenError> {
        let mut fetch = FundamentalsFetch::default();

        for ticker in tickers {
            let outcome = self
                .with_retry(ticker, || self.port.fetch_fundamentals(ticker))?
                .and_then(|row| {
                    // a row with no usable ratio is as good as no row
                    row.map(FundamentalsRow::normalized)
                        .filter(|row| !row.is_empty())
                        .ok_or(FetchFailure::NoData)
                });

            match outcome {
                Ok(row) => fetch.rows.push(row),
                Err(failure) => {
                    let placeholder = self.placeholder.map(|p| p.placeholder_fundamentals(ticker));
                    let defaulted = placeholder.is_some();
                    if let Some(row) = placeholder {
                        fetch.rows.push(row.normalized());
                    }
                    warn!(%ticker, %failure, defaulted, "fundamentals fetch failed");
                    fetch.failures.push(FailedTicker {
                        ticker: ticker.clone(),
                        failure,
                        defaulted,
                    });
                }
            }
        }

        Ok(fetch)
    }

    /// Run `call` until it succeeds, fails permanently, or attempts run out.
    /// Only the deadline produces an outer `Err`.
    fn with_retry<T>(
        &self,
        ticker: &str,
        mut call: impl FnMut() -> Result<T, ScreenError>,
    ) -> Result<Result<T, FetchFailure>, ScreenError> {
        let attempts = self.config.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            self.check_deadline()?;
            match call() {
                Ok(value) => return Ok(Ok(value)),
                Err(e) if e.is_transient() => {
                    debug!(%ticker, attempt, error = %e, "transient provider error");
                    last_error = e.to_string();
                    if attempt < attempts {
                        thread::sleep(self.config.retry_delay);
                    }
                }
                Err(e) => return Ok(Err(FetchFailure::Provider(e.to_string()))),
            }
        }

        Ok(Err(FetchFailure::Provider(last_error)))
    }

    fn check_deadline(&self) -> Result<(), ScreenError> {
        match self.config.timeout {
            Some(limit) if self.started.elapsed() >= limit => Err(ScreenError::DataAccessTimeout {
                elapsed_ms: self.started.elapsed().as_millis(),
            }),
            _ => Ok(()),
        }
    }
}
