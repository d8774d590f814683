//! Low-volatility factor.
//!
//! VOL = population STDDEV of the trailing min(window, n) daily returns when
//! n >= min_window, otherwise of all n returns. Fewer than
//! `MIN_FACTOR_HISTORY` returns cannot be scored.
//! Zero or non-finite VOL is replaced by the cross-sectional median of the
//! valid values and the ticker is listed in `imputed`, then
//! LOWVOL = z(1 / VOL).

use crate::domain::error::ScreenError;
use crate::domain::factor::{FactorInput, FactorIssue, FactorKind, FactorScores, MIN_FACTOR_HISTORY};
use crate::domain::ohlcv::{daily_returns, OhlcvBar};
use crate::domain::stats::{median, population_std, standardize};
use tracing::warn;

pub fn trailing_volatility(
    ticker: &str,
    bars: &[OhlcvBar],
    window: usize,
    min_window: usize,
) -> Result<f64, ScreenError> {
    let returns: Vec<f64> = daily_returns(bars).into_iter().map(|(_, r)| r).collect();
    if returns.len() < MIN_FACTOR_HISTORY {
        return Err(ScreenError::InsufficientHistory {
            ticker: ticker.to_string(),
            bars: returns.len(),
            minimum: MIN_FACTOR_HISTORY,
        });
    }

    let sample = if returns.len() >= min_window {
        let take = window.min(returns.len());
        &returns[returns.len() - take..]
    } else {
        &returns[..]
    };

    Ok(population_std(sample).unwrap_or(f64::NAN))
}

pub fn compute(input: &FactorInput<'_>, window: usize, min_window: usize) -> FactorScores {
    let mut issues = Vec::new();
    let vols: Vec<Option<f64>> = input
        .tickers
        .iter()
        .map(|ticker| {
            let bars = input.prices.get(ticker).unwrap_or(&[]);
            match trailing_volatility(ticker, bars, window, min_window) {
                Ok(v) => Some(v),
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

    let valid: Vec<f64> = vols
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect();
    let fill = median(&valid);

    let mut imputed = Vec::new();
    let inverse: Vec<Option<f64>> = input
        .tickers
        .iter()
        .zip(&vols)
        .map(|(ticker, v)| {
            let vol = (*v)?;
            if vol.is_finite() && vol > 0.0 {
                return Some(1.0 / vol);
            }
            match fill {
                Some(median_vol) => {
                    warn!(%ticker, vol, median_vol, "volatility replaced by cross-sectional median");
                    imputed.push(ticker.clone());
                    Some(1.0 / median_vol)
                }
                None => {
                    issues.push(FactorIssue {
                        ticker: ticker.clone(),
                        error: ScreenError::InvalidSeries {
                            ticker: ticker.clone(),
                            reason: "zero volatility and no peer median to substitute".into(),
                        },
                    });
                    None
                }
            }
        })
        .collect();

    FactorScores {
        kind: FactorKind::Volatility,
        tickers: input.tickers.to_vec(),
        scores: standardize(&inverse),
        issues,
        imputed,
    }
}
