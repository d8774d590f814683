//! Equal-weighted backtest engine.
//!
//! Each day the portfolio return is the mean of the simple returns of the
//! held tickers that traded that day. Growth starts at 1.0 on the first
//! date with price data and compounds (1 + r).

use crate::domain::error::ScreenError;
use crate::domain::ohlcv::{daily_returns, OhlcvBar, PriceSeries};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub benchmark: Option<String>,
}

impl BacktestConfig {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            benchmark: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub growth: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquityCurve {
    pub points: Vec<EquityPoint>,
    /// Daily returns that produced `points[1..]`.
    pub returns: Vec<f64>,
}

impl EquityCurve {
    /// Compound a dated return series starting from 1.0 on `origin`.
    pub fn compound(origin: NaiveDate, returns: &[(NaiveDate, f64)]) -> Self {
        let mut points = Vec::with_capacity(returns.len() + 1);
        let mut growth = 1.0;
        points.push(EquityPoint { date: origin, growth });
        for &(date, r) in returns {
            growth *= 1.0 + r;
            points.push(EquityPoint { date, growth });
        }
        Self {
            points,
            returns: returns.iter().map(|&(_, r)| r).collect(),
        }
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.growth).collect()
    }

    pub fn final_growth(&self) -> f64 {
        self.points.last().map_or(1.0, |p| p.growth)
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub portfolio: EquityCurve,
    pub benchmark: Option<EquityCurve>,
    pub tickers: Vec<String>,
    /// Requested tickers that had no return data.
    pub skipped: Vec<String>,
}

fn bars_from(bars: &[OhlcvBar], start: NaiveDate) -> &[OhlcvBar] {
    let first = bars.partition_point(|b| b.date < start);
    &bars[first..]
}

pub fn run_backtest(
    prices: &PriceSeries,
    tickers: &[String],
    config: &BacktestConfig,
) -> Result<BacktestResult, ScreenError> {
    let mut per_ticker: Vec<BTreeMap<NaiveDate, f64>> = Vec::new();
    let mut used = Vec::new();
    let mut skipped = Vec::new();
    let mut origin: Option<NaiveDate> = None;

    for ticker in tickers {
        let bars = prices.get(ticker).map(|b| bars_from(b, config.start_date)).unwrap_or(&[]);
        let returns = daily_returns(bars);
        if returns.is_empty() {
            skipped.push(ticker.clone());
            continue;
        }
        origin = Some(origin.map_or(bars[0].date, |o| o.min(bars[0].date)));
        per_ticker.push(returns.into_iter().collect());
        used.push(ticker.clone());
    }

    let Some(origin) = origin else {
        return Err(ScreenError::Backtest {
            reason: format!("none of {} requested tickers has return data", tickers.len()),
        });
    };

    let timeline: BTreeSet<NaiveDate> = per_ticker.iter().flat_map(|m| m.keys().copied()).collect();

    let portfolio_returns: Vec<(NaiveDate, f64)> = timeline
        .into_iter()
        .filter_map(|date| {
            let day: Vec<f64> = per_ticker.iter().filter_map(|m| m.get(&date).copied()).collect();
            if day.is_empty() {
                None
            } else {
                Some((date, day.iter().sum::<f64>() / day.len() as f64))
            }
        })
        .collect();

    debug!(
        tickers = used.len(),
        days = portfolio_returns.len(),
        "portfolio returns assembled"
    );

    let benchmark = config.benchmark.as_deref().and_then(|b| {
        let bars = bars_from(prices.get(b)?, config.start_date);
        let returns = daily_returns(bars);
        if returns.is_empty() {
            return None;
        }
        Some(EquityCurve::compound(bars[0].date, &returns))
    });

    Ok(BacktestResult {
        portfolio: EquityCurve::compound(origin, &portfolio_returns),
        benchmark,
        tickers: used,
        skipped,
    })
}
