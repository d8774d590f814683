//! Value factor.
//!
//! VALUE = z(mean(-z(P/E), -z(P/B), -z(EV/EBITDA)))
//! Non-positive ratios carry no cheapness information: the ticker gets no
//! value score and an issue naming the offending ratios.

use crate::domain::error::ScreenError;
use crate::domain::factor::{combine_components, FactorInput, FactorIssue, FactorKind, FactorScores};
use crate::domain::fundamentals::FundamentalsRow;

fn ratios(row: &FundamentalsRow) -> [(&'static str, Option<f64>); 3] {
    [("P/E", row.pe), ("P/B", row.pb), ("EV/EBITDA", row.ev_ebitda)]
}

pub fn compute(input: &FactorInput<'_>) -> FactorScores {
    let mut raw: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(input.tickers.len()); 3];
    let mut issues = Vec::new();

    for ticker in input.tickers {
        // no row at all is reported by data access
        let Some(values) = input.fundamentals_for(ticker).map(ratios) else {
            raw.iter_mut().for_each(|column| column.push(None));
            continue;
        };

        let mut problems = Vec::new();
        for (column, (name, value)) in raw.iter_mut().zip(values) {
            match value {
                Some(v) if v > 0.0 => column.push(Some(v)),
                Some(_) => {
                    problems.push(format!("non-positive {name}"));
                    column.push(None);
                }
                None => {
                    problems.push(format!("missing {name}"));
                    column.push(None);
                }
            }
        }

        if !problems.is_empty() {
            issues.push(FactorIssue {
                ticker: ticker.clone(),
                error: ScreenError::InvalidFundamentals {
                    ticker: ticker.clone(),
                    reason: problems.join(", "),
                },
            });
        }
    }

    FactorScores {
        kind: FactorKind::Value,
        tickers: input.tickers.to_vec(),
        scores: combine_components(&raw, &[-1.0; 3]),
        issues,
        imputed: Vec::new(),
    }
}
