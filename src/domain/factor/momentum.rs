//! Momentum factor.
//!
//! MOM(n) = C[last] / C[last - n + 1] - 1, where n is the lookback in bars.
//! Shorter histories use every available bar as long as at least
//! `MIN_FACTOR_HISTORY` bars exist.

use crate::domain::error::ScreenError;
use crate::domain::factor::{FactorInput, FactorIssue, FactorKind, FactorScores, MIN_FACTOR_HISTORY};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::stats::standardize;

pub fn trailing_return(ticker: &str, bars: &[OhlcvBar], lookback: usize) -> Result<f64, ScreenError> {
    if bars.len() < MIN_FACTOR_HISTORY {
        return Err(ScreenError::InsufficientHistory {
            ticker: ticker.to_string(),
            bars: bars.len(),
            minimum: MIN_FACTOR_HISTORY,
        });
    }

    let window = lookback.max(2).min(bars.len());
    let first = bars[bars.len() - window].close;
    let last = bars[bars.len() - 1].close;

    if first <= 0.0 {
        return Err(ScreenError::InvalidSeries {
            ticker: ticker.to_string(),
            reason: "zero close at start of momentum window".to_string(),
        });
    }
    Ok(last / first - 1.0)
}

pub fn compute(input: &FactorInput<'_>, lookback: usize) -> FactorScores {
    let mut issues = Vec::new();
    let raw: Vec<Option<f64>> = input
        .tickers
        .iter()
        .map(|ticker| {
            let bars = input.prices.get(ticker).unwrap_or(&[]);
            match trailing_return(ticker, bars, lookback) {
                Ok(r) => Some(r),
                Err(error) => {
                    issues.push(FactorIssue {
                        ticker: ticker.clone(),
                        error,
                    });
                    None
                }
            }
        })
        .collect();

    FactorScores {
        kind: FactorKind::Momentum,
        tickers: input.tickers.to_vec(),
        scores: standardize(&raw),
        issues,
        imputed: Vec::new(),
    }
}
