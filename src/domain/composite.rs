//! Composite scoring and ranking.
//!
//! COMPOSITE = sum(w_k * z_k) over the four factors, computed only for
//! tickers with every factor present. A zero weight removes the factor from
//! the sum but still requires it to be present.

use crate::domain::error::ScreenError;
use crate::domain::factor::{FactorKind, FactorTable};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorWeights {
    pub value: f64,
    pub quality: f64,
    pub momentum: f64,
    pub volatility: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            value: 0.25,
            quality: 0.25,
            momentum: 0.25,
            volatility: 0.25,
        }
    }
}

impl FactorWeights {
    pub fn get(&self, kind: FactorKind) -> f64 {
        match kind {
            FactorKind::Value => self.value,
            FactorKind::Quality => self.quality,
            FactorKind::Momentum => self.momentum,
            FactorKind::Volatility => self.volatility,
        }
    }

    pub fn validate(&self) -> Result<(), ScreenError> {
        for kind in FactorKind::ALL {
            let w = self.get(kind);
            if !w.is_finite() || w < 0.0 {
                return Err(ScreenError::InvalidWeights {
                    reason: format!("{kind} weight must be finite and non-negative, got {w}"),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedTicker {
    pub ticker: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Ranking {
    pub entries: Vec<RankedTicker>,
    /// Tickers left out because at least one factor was missing, with the
    /// factors they lacked.
    pub excluded: Vec<(String, Vec<FactorKind>)>,
}

impl Ranking {
    pub fn top(&self, n: usize) -> Vec<String> {
        self.entries.iter().take(n).map(|e| e.ticker.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn score(table: &FactorTable, weights: &FactorWeights) -> Result<Ranking, ScreenError> {
    weights.validate()?;

    let mut ranking = Ranking::default();

    for ticker in &table.tickers {
        let mut missing = Vec::new();
        let mut total = 0.0;

        for kind in FactorKind::ALL {
            match table.column(kind).and_then(|c| c.get(ticker)) {
                Some(z) => total += weights.get(kind) * z,
                None => missing.push(kind),
            }
        }

        if missing.is_empty() {
            ranking.entries.push(RankedTicker {
                ticker: ticker.clone(),
                score: total,
            });
        } else {
            ranking.excluded.push((ticker.clone(), missing));
        }
    }

    // sort_by is stable: equal scores keep universe order
    ranking
        .entries
        .sort_by(|a, b| b.score.total_cmp(&a.score));

    Ok(ranking)
}
