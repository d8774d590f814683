//! Quality factor.
//!
//! QUALITY = z(mean(z(ROE), z(net margin), -z(debt/equity)))

use crate::domain::error::ScreenError;
use crate::domain::factor::{combine_components, FactorInput, FactorIssue, FactorKind, FactorScores};
use crate::domain::fundamentals::FundamentalsRow;

fn fields(row: &FundamentalsRow) -> [(&'static str, Option<f64>); 3] {
    [
        ("ROE", row.roe),
        ("net margin", row.net_margin),
        ("debt/equity", row.debt_to_equity),
    ]
}

pub fn compute(input: &FactorInput<'_>) -> FactorScores {
    let mut raw: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(input.tickers.len()); 3];
    let mut issues = Vec::new();

    for ticker in input.tickers {
        let Some(values) = input.fundamentals_for(ticker).map(fields) else {
            raw.iter_mut().for_each(|column| column.push(None));
            continue;
        };

        let missing: Vec<&str> = values
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            issues.push(FactorIssue {
                ticker: ticker.clone(),
                error: ScreenError::InvalidFundamentals {
                    ticker: ticker.clone(),
                    reason: format!("missing {}", missing.join(", ")),
                },
            });
        }

        for (column, (_, value)) in raw.iter_mut().zip(values) {
            column.push(value);
        }
    }

    FactorScores {
        kind: FactorKind::Quality,
        tickers: input.tickers.to_vec(),
        scores: combine_components(&raw, &[1.0, 1.0, -1.0]),
        issues,
        imputed: Vec::new(),
    }
}
