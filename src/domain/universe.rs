//! Universe module.
//!
//! Parses ticker lists from configuration and drops tickers without enough
//! price history for scoring.

use crate::domain::error::ScreenError;
use crate::domain::ohlcv::PriceSeries;
use std::collections::HashSet;
use tracing::{info, warn};

pub const DEFAULT_MIN_HISTORY: usize = 130;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DroppedTicker {
    pub ticker: String,
    pub reason: DropReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    NoData,
    InsufficientBars { bars: usize, minimum: usize },
}

pub struct UniverseFilterResult {
    /// Surviving tickers in their original order.
    pub tickers: Vec<String>,
    pub dropped: Vec<DroppedTicker>,
}

/// Remove tickers with fewer than `min_history` bars from `prices` and
/// report each one. Fails only if nothing survives.
pub fn apply_history_floor(
    prices: &mut PriceSeries,
    tickers: &[String],
    min_history: usize,
) -> Result<UniverseFilterResult, ScreenError> {
    let mut kept = Vec::new();
    let mut dropped = Vec::new();

    for ticker in tickers {
        let bars = prices.get(ticker).map_or(0, <[_]>::len);

        let reason = if bars == 0 {
            Some(DropReason::NoData)
        } else if bars < min_history {
            Some(DropReason::InsufficientBars {
                bars,
                minimum: min_history,
            })
        } else {
            None
        };

        match reason {
            Some(reason) => {
                warn!(%ticker, ?reason, "dropping ticker from universe");
                prices.remove(ticker);
                dropped.push(DroppedTicker {
                    ticker: ticker.clone(),
                    reason,
                });
            }
            None => kept.push(ticker.clone()),
        }
    }

    if kept.is_empty() {
        return Err(ScreenError::EmptyUniverse);
    }

    if !dropped.is_empty() {
        info!(
            kept = kept.len(),
            total = tickers.len(),
            "universe filtered by history floor"
        );
    }

    Ok(UniverseFilterResult {
        tickers: kept,
        dropped,
    })
}
