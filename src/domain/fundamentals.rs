//! Per-ticker fundamental ratios.

/// Named valuation and profitability ratios. Absent values are `None`,
/// never zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FundamentalsRow {
    pub ticker: String,
    pub pe: Option<f64>,
    pub pb: Option<f64>,
    pub ev_ebitda: Option<f64>,
    pub roe: Option<f64>,
    pub net_margin: Option<f64>,
    pub debt_to_equity: Option<f64>,
}

impl FundamentalsRow {
    pub fn empty(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            ..Self::default()
        }
    }

    /// Replace NaN and infinities with `None`.
    pub fn normalized(self) -> Self {
        let clean = |v: Option<f64>| v.filter(|x| x.is_finite());
        Self {
            pe: clean(self.pe),
            pb: clean(self.pb),
            ev_ebitda: clean(self.ev_ebitda),
            roe: clean(self.roe),
            net_margin: clean(self.net_margin),
            debt_to_equity: clean(self.debt_to_equity),
            ticker: self.ticker,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pe.is_none()
            && self.pb.is_none()
            && self.ev_ebitda.is_none()
            && self.roe.is_none()
            && self.net_margin.is_none()
            && self.debt_to_equity.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_drops_non_finite() {
        let row = FundamentalsRow {
            ticker: "AAPL".into(),
            pe: Some(f64::NAN),
            pb: Some(f64::INFINITY),
            ev_ebitda: Some(12.0),
            ..FundamentalsRow::default()
        }
        .normalized();
        assert_eq!(row.pe, None);
        assert_eq!(row.pb, None);
        assert_eq!(row.ev_ebitda, Some(12.0));
    }

    #[test]
    fn empty_row_reports_empty() {
        assert!(FundamentalsRow::empty("AAPL").is_empty());
        let row = FundamentalsRow {
            roe: Some(0.0),
            ..FundamentalsRow::empty("AAPL")
        };
        assert!(!row.is_empty());
    }
}
