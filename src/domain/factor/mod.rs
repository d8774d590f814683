//! Factor engines.
//!
//! Each engine consumes a [`FactorInput`] and yields cross-sectionally
//! standardized [`FactorScores`] aligned with the input universe:
//! - `value`: cheap on P/E, P/B, EV/EBITDA
//! - `quality`: high ROE and net margin, low leverage
//! - `momentum`: trailing total return
//! - `volatility`: inverse trailing volatility (low-vol)

pub mod momentum;
pub mod quality;
pub mod value;
pub mod volatility;

use crate::domain::error::ScreenError;
use crate::domain::fundamentals::FundamentalsRow;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::stats::{row_mean, standardize};
use std::fmt;

/// Minimum history, in bars or returns, any price-based factor accepts.
pub const MIN_FACTOR_HISTORY: usize = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactorKind {
    Value,
    Quality,
    Momentum,
    Volatility,
}

impl FactorKind {
    pub const ALL: [FactorKind; 4] = [
        FactorKind::Value,
        FactorKind::Quality,
        FactorKind::Momentum,
        FactorKind::Volatility,
    ];
}

impl fmt::Display for FactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FactorKind::Value => "value",
            FactorKind::Quality => "quality",
            FactorKind::Momentum => "momentum",
            FactorKind::Volatility => "volatility",
        };
        f.write_str(name)
    }
}

/// Snapshot a screening run scores against.
#[derive(Debug, Clone, Copy)]
pub struct FactorInput<'a> {
    pub tickers: &'a [String],
    pub prices: &'a PriceSeries,
    pub fundamentals: &'a [FundamentalsRow],
}

impl<'a> FactorInput<'a> {
    pub fn fundamentals_for(&self, ticker: &str) -> Option<&'a FundamentalsRow> {
        self.fundamentals.iter().find(|row| row.ticker == ticker)
    }
}

/// A ticker the engine could not score, with the cause.
#[derive(Debug)]
pub struct FactorIssue {
    pub ticker: String,
    pub error: ScreenError,
}

#[derive(Debug)]
pub struct FactorScores {
    pub kind: FactorKind,
    pub tickers: Vec<String>,
    pub scores: Vec<Option<f64>>,
    pub issues: Vec<FactorIssue>,
    /// Tickers scored from the cross-sectional median instead of their own input.
    pub imputed: Vec<String>,
}

impl FactorScores {
    pub fn get(&self, ticker: &str) -> Option<f64> {
        self.tickers
            .iter()
            .position(|t| t == ticker)
            .and_then(|i| self.scores[i])
    }
}

/// Combine raw component columns into one standardized factor column.
///
/// Each component is z-scored, multiplied by its sign, averaged per row and
/// z-scored again. Only rows with every component present enter any of the
/// statistics; the rest score `None`.
pub(crate) fn combine_components(raw: &[Vec<Option<f64>>], signs: &[f64]) -> Vec<Option<f64>> {
    let rows = raw.first().map_or(0, Vec::len);
    let complete: Vec<bool> = (0..rows)
        .map(|i| raw.iter().all(|column| column[i].is_some()))
        .collect();

    let components: Vec<Vec<Option<f64>>> = raw
        .iter()
        .zip(signs)
        .map(|(column, &sign)| {
            let masked: Vec<Option<f64>> = column
                .iter()
                .zip(&complete)
                .map(|(v, &ok)| v.filter(|_| ok))
                .collect();
            standardize(&masked)
                .into_iter()
                .map(|z| z.map(|x| sign * x))
                .collect()
        })
        .collect();

    standardize(&row_mean(&components))
}

/// The four factor columns over a common universe.
#[derive(Debug)]
pub struct FactorTable {
    pub tickers: Vec<String>,
    pub columns: Vec<FactorScores>,
}

impl FactorTable {
    /// Build a table from columns already aligned with `tickers`.
    pub fn new(tickers: Vec<String>, columns: Vec<FactorScores>) -> Self {
        debug_assert!(columns.iter().all(|c| c.tickers == tickers));
        Self { tickers, columns }
    }

    pub fn column(&self, kind: FactorKind) -> Option<&FactorScores> {
        self.columns.iter().find(|c| c.kind == kind)
    }

    pub fn issues(&self) -> impl Iterator<Item = (FactorKind, &FactorIssue)> {
        self.columns
            .iter()
            .flat_map(|c| c.issues.iter().map(move |issue| (c.kind, issue)))
    }
}

/// Momentum and volatility window settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorConfig {
    pub momentum_lookback: usize,
    pub volatility_window: usize,
    pub volatility_min_window: usize,
}

impl Default for FactorConfig {
    fn default() -> Self {
        Self {
            momentum_lookback: 126,
            volatility_window: 252,
            volatility_min_window: 126,
        }
    }
}

/// Run all four engines over the same input.
pub fn compute_all(input: &FactorInput<'_>, config: &FactorConfig) -> FactorTable {
    let columns = vec![
        value::compute(input),
        quality::compute(input),
        momentum::compute(input, config.momentum_lookback),
        volatility::compute(
            input,
            config.volatility_window,
            config.volatility_min_window,
        ),
    ];
    FactorTable::new(input.tickers.to_vec(), columns)
}
