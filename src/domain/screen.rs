//! Screening pipeline: data access, universe filter, factor scoring,
//! composite ranking, top-N backtest and performance metrics.
//!
//! Per-ticker problems never abort the run; they are collected as
//! [`ScreenWarning`]s next to the partial result. Only an empty universe,
//! a data-access timeout or a backtest with no usable tickers are fatal.

use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use crate::domain::composite::{self, FactorWeights, Ranking};
use crate::domain::data_access::{DataAccess, DataAccessConfig, FailedTicker, FetchFailure};
use crate::domain::error::ScreenError;
use crate::domain::factor::{compute_all, FactorConfig, FactorInput, FactorKind, FactorTable};
use crate::domain::metrics::PerformanceSummary;
use crate::domain::universe::{apply_history_floor, DropReason, DEFAULT_MIN_HISTORY};
use crate::ports::data_port::MarketDataPort;
use crate::ports::placeholder_port::PlaceholderPolicy;
use chrono::NaiveDate;
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ScreenConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub min_history: usize,
    pub data_access: DataAccessConfig,
    pub factors: FactorConfig,
    pub weights: FactorWeights,
    pub top_n: usize,
    pub benchmark: Option<String>,
    pub periods_per_year: f64,
}

impl ScreenConfig {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            min_history: DEFAULT_MIN_HISTORY,
            data_access: DataAccessConfig::default(),
            factors: FactorConfig::default(),
            weights: FactorWeights::default(),
            top_n: 10,
            benchmark: None,
            periods_per_year: 252.0,
        }
    }

    fn backtest_config(&self) -> BacktestConfig {
        BacktestConfig {
            start_date: self.start_date,
            benchmark: self.benchmark.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Prices,
    Fundamentals,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::Prices => f.write_str("prices"),
            Dataset::Fundamentals => f.write_str("fundamentals"),
        }
    }
}

/// One degraded or dropped input.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenWarning {
    PlaceholderUsed {
        ticker: String,
        dataset: Dataset,
        failure: FetchFailure,
    },
    DataUnavailable {
        ticker: String,
        dataset: Dataset,
        failure: FetchFailure,
    },
    DroppedFromUniverse {
        ticker: String,
        reason: DropReason,
    },
    FactorUnavailable {
        ticker: String,
        factor: FactorKind,
        reason: String,
    },
    /// The factor input was replaced by the cross-sectional median.
    MedianSubstituted {
        ticker: String,
        factor: FactorKind,
    },
    ExcludedFromRanking {
        ticker: String,
        missing: Vec<FactorKind>,
    },
    NotBacktested {
        ticker: String,
    },
    BenchmarkUnavailable {
        ticker: String,
    },
}

impl ScreenWarning {
    pub fn ticker(&self) -> &str {
        match self {
            ScreenWarning::PlaceholderUsed { ticker, .. }
            | ScreenWarning::DataUnavailable { ticker, .. }
            | ScreenWarning::DroppedFromUniverse { ticker, .. }
            | ScreenWarning::FactorUnavailable { ticker, .. }
            | ScreenWarning::MedianSubstituted { ticker, .. }
            | ScreenWarning::ExcludedFromRanking { ticker, .. }
            | ScreenWarning::NotBacktested { ticker }
            | ScreenWarning::BenchmarkUnavailable { ticker } => ticker,
        }
    }
}

impl fmt::Display for ScreenWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenWarning::PlaceholderUsed {
                ticker,
                dataset,
                failure,
            } => write!(f, "{ticker}: placeholder {dataset} used ({failure})"),
            ScreenWarning::DataUnavailable {
                ticker,
                dataset,
                failure,
            } => write!(f, "{ticker}: {dataset} unavailable ({failure})"),
            ScreenWarning::DroppedFromUniverse { ticker, reason } => match reason {
                DropReason::NoData => write!(f, "{ticker}: dropped, no price data"),
                DropReason::InsufficientBars { bars, minimum } => write!(
                    f,
                    "{ticker}: dropped, only {bars} bars (minimum {minimum})"
                ),
            },
            ScreenWarning::FactorUnavailable {
                ticker,
                factor,
                reason,
            } => write!(f, "{ticker}: no {factor} score ({reason})"),
            ScreenWarning::MedianSubstituted { ticker, factor } => write!(
                f,
                "{ticker}: {factor} input unusable, cross-sectional median substituted"
            ),
            ScreenWarning::ExcludedFromRanking { ticker, missing } => {
                let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
                write!(f, "{ticker}: not ranked, missing {}", names.join(", "))
            }
            ScreenWarning::NotBacktested { ticker } => {
                write!(f, "{ticker}: selected but has no return data in the backtest window")
            }
            ScreenWarning::BenchmarkUnavailable { ticker } => {
                write!(f, "{ticker}: benchmark data unavailable")
            }
        }
    }
}

#[derive(Debug)]
pub struct ScreenReport {
    pub factors: FactorTable,
    pub ranking: Ranking,
    pub selected: Vec<String>,
    pub backtest: BacktestResult,
    pub portfolio_metrics: PerformanceSummary,
    pub benchmark_metrics: Option<PerformanceSummary>,
    pub warnings: Vec<ScreenWarning>,
}

fn fetch_warnings(failures: Vec<FailedTicker>, dataset: Dataset) -> impl Iterator<Item = ScreenWarning> {
    failures.into_iter().map(move |f| {
        if f.defaulted {
            ScreenWarning::PlaceholderUsed {
                ticker: f.ticker,
                dataset,
                failure: f.failure,
            }
        } else {
            ScreenWarning::DataUnavailable {
                ticker: f.ticker,
                dataset,
                failure: f.failure,
            }
        }
    })
}

pub fn run_screen(
    port: &dyn MarketDataPort,
    placeholder: Option<&dyn PlaceholderPolicy>,
    tickers: &[String],
    config: &ScreenConfig,
) -> Result<ScreenReport, ScreenError> {
    config.weights.validate()?;
    let access = DataAccess::new(port, placeholder, config.data_access.clone());
    let mut warnings = Vec::new();

    // Stage 1: prices for the universe plus the benchmark
    let mut request = tickers.to_vec();
    if let Some(b) = &config.benchmark {
        if !request.contains(b) {
            request.push(b.clone());
        }
    }
    info!(tickers = request.len(), start = %config.start_date, end = %config.end_date, "fetching prices");
    let price_fetch = access.get_prices(&request, config.start_date, config.end_date)?;
    warnings.extend(fetch_warnings(price_fetch.failures, Dataset::Prices));
    let mut prices = price_fetch.prices;

    // Stage 2: history floor
    let filtered = apply_history_floor(&mut prices, tickers, config.min_history)?;
    warnings.extend(filtered.dropped.into_iter().map(|d| ScreenWarning::DroppedFromUniverse {
        ticker: d.ticker,
        reason: d.reason,
    }));
    let universe = filtered.tickers;

    // Stage 3: fundamentals
    info!(tickers = universe.len(), "fetching fundamentals");
    let fundamentals_fetch = access.get_fundamentals(&universe)?;
    warnings.extend(fetch_warnings(fundamentals_fetch.failures, Dataset::Fundamentals));

    // Stage 4: factors
    let input = FactorInput {
        tickers: &universe,
        prices: &prices,
        fundamentals: &fundamentals_fetch.rows,
    };
    let factors = compute_all(&input, &config.factors);
    warnings.extend(factors.issues().map(|(factor, issue)| ScreenWarning::FactorUnavailable {
        ticker: issue.ticker.clone(),
        factor,
        reason: issue.error.to_string(),
    }));
    warnings.extend(factors.columns.iter().flat_map(|column| {
        column.imputed.iter().map(|ticker| ScreenWarning::MedianSubstituted {
            ticker: ticker.clone(),
            factor: column.kind,
        })
    }));

    // Stage 5: composite ranking
    let ranking = composite::score(&factors, &config.weights)?;
    warnings.extend(
        ranking
            .excluded
            .iter()
            .map(|(ticker, missing)| ScreenWarning::ExcludedFromRanking {
                ticker: ticker.clone(),
                missing: missing.clone(),
            }),
    );
    if ranking.is_empty() {
        return Err(ScreenError::EmptyUniverse);
    }
    info!(ranked = ranking.len(), excluded = ranking.excluded.len(), "composite ranking built");

    // Stage 6: backtest the top N
    let selected = ranking.top(config.top_n);
    let backtest = run_backtest(&prices, &selected, &config.backtest_config())?;
    warnings.extend(
        backtest
            .skipped
            .iter()
            .map(|t| ScreenWarning::NotBacktested { ticker: t.clone() }),
    );
    if let Some(b) = &config.benchmark {
        if backtest.benchmark.is_none() {
            warnings.push(ScreenWarning::BenchmarkUnavailable { ticker: b.clone() });
        }
    }

    // Stage 7: metrics
    let portfolio_metrics = PerformanceSummary::compute(&backtest.portfolio, config.periods_per_year);
    let benchmark_metrics = backtest
        .benchmark
        .as_ref()
        .map(|curve| PerformanceSummary::compute(curve, config.periods_per_year));

    if !warnings.is_empty() {
        warn!(count = warnings.len(), "screen completed with warnings");
    }

    Ok(ScreenReport {
        factors,
        ranking,
        selected,
        backtest,
        portfolio_metrics,
        benchmark_metrics,
        warnings,
    })
}
