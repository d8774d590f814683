//! Performance metrics over equity curves and return series.

use crate::domain::backtest::{EquityCurve, EquityPoint};
use crate::domain::stats::{is_negligible_dispersion, mean, population_std};
use chrono::Datelike;
use std::collections::BTreeMap;
use std::fmt;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// A ratio that may be undefined (zero dispersion, empty input).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Value(f64),
    Undefined,
}

impl Metric {
    pub fn value(self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(v),
            Metric::Undefined => None,
        }
    }

    pub fn is_undefined(self) -> bool {
        matches!(self, Metric::Undefined)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Value(v) => write!(f, "{v:.2}"),
            Metric::Undefined => f.write_str("n/a"),
        }
    }
}

/// sqrt(periods) * mean / std with a zero risk-free rate.
///
/// Undefined when the returns have no dispersion beyond rounding noise, so a
/// constant series is undefined at every length.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> Metric {
    let (Some(m), Some(sd)) = (mean(returns), population_std(returns)) else {
        return Metric::Undefined;
    };
    if is_negligible_dispersion(sd, m) {
        return Metric::Undefined;
    }
    Metric::Value(periods_per_year.sqrt() * m / sd)
}

/// Like Sharpe, but dispersion counts only negative returns.
pub fn sortino_ratio(returns: &[f64], periods_per_year: f64) -> Metric {
    let Some(m) = mean(returns) else {
        return Metric::Undefined;
    };
    let downside = returns
        .iter()
        .filter(|&&r| r < 0.0)
        .map(|r| r * r)
        .sum::<f64>()
        / returns.len() as f64;
    let downside_std = downside.sqrt();
    if is_negligible_dispersion(downside_std, m) {
        return Metric::Undefined;
    }
    Metric::Value(periods_per_year.sqrt() * m / downside_std)
}

/// min((equity - running_max) / running_max); 0 for a non-decreasing curve.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    drawdown_stats(equity).0
}

/// Deepest drawdown and the longest run of bars spent below a prior peak.
fn drawdown_stats(equity: &[f64]) -> (f64, usize) {
    let Some(&first) = equity.first() else {
        return (0.0, 0);
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    let mut current_duration = 0usize;
    let mut max_duration = 0usize;

    for &value in equity {
        if value >= peak {
            peak = value;
            current_duration = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.min((value - peak) / peak);
            current_duration += 1;
            max_duration = max_duration.max(current_duration);
        }
    }

    (max_dd, max_duration)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: Metric,
    pub sortino_ratio: Metric,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
}

impl PerformanceSummary {
    pub fn compute(curve: &EquityCurve, periods_per_year: f64) -> Self {
        let values = curve.values();
        let total_return = curve.final_growth() - 1.0;

        let years = curve.returns.len() as f64 / periods_per_year;
        let annualized_return = if years > 0.0 && total_return > -1.0 {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = drawdown_stats(&values);

        PerformanceSummary {
            total_return,
            annualized_return,
            sharpe_ratio: sharpe_ratio(&curve.returns, periods_per_year),
            sortino_ratio: sortino_ratio(&curve.returns, periods_per_year),
            max_drawdown,
            max_drawdown_duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyReturn {
    pub year: i32,
    pub month: u32,
    pub return_pct: f64,
}

/// Month-over-month growth, each month measured from the previous month's
/// last point (the first month from the curve's first point).
pub fn monthly_returns(points: &[EquityPoint]) -> Vec<MonthlyReturn> {
    let Some(first) = points.first() else {
        return Vec::new();
    };

    let mut month_end: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for point in points {
        month_end.insert((point.date.year(), point.date.month()), point.growth);
    }

    let mut prev = first.growth;
    month_end
        .into_iter()
        .map(|((year, month), end)| {
            let return_pct = if prev > 0.0 { end / prev - 1.0 } else { 0.0 };
            prev = end;
            MonthlyReturn {
                year,
                month,
                return_pct,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    #[test]
    fn max_drawdown_monotonic_is_zero() {
        assert_eq!(max_drawdown(&[1.0, 1.1, 1.25, 1.4]), 0.0);
    }

    #[test]
    fn max_drawdown_negative_fraction() {
        assert_abs_diff_eq!(max_drawdown(&[1.0, 0.8, 0.9]), -0.2, epsilon = 1e-12);
    }

    #[test]
    fn max_drawdown_uses_running_peak() {
        let dd = max_drawdown(&[100.0, 110.0, 90.0, 95.0, 80.0, 100.0]);
        assert_abs_diff_eq!(dd, (80.0 - 110.0) / 110.0, epsilon = 1e-12);
    }

    #[test]
    fn max_drawdown_empty() {
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn drawdown_duration_counts_bars_under_peak() {
        let (_, duration) = drawdown_stats(&[100.0, 110.0, 100.0, 90.0, 85.0, 95.0, 111.0]);
        assert_eq!(duration, 4);
    }

    #[test]
    fn sharpe_positive_for_positive_drift() {
        let returns: Vec<f64> = (0..252).map(|i| if i % 2 == 0 { 0.001 } else { 0.002 }).collect();
        let sharpe = sharpe_ratio(&returns, 252.0);
        assert!(sharpe.value().unwrap() > 0.0);
    }

    #[test]
    fn sharpe_matches_formula() {
        let returns = [0.01, -0.01, 0.02, 0.0];
        // mean 0.005, population std sqrt(0.000125)
        let expected = 252f64.sqrt() * 0.005 / 0.000125f64.sqrt();
        assert_abs_diff_eq!(sharpe_ratio(&returns, 252.0).value().unwrap(), expected, epsilon = 1e-9);
    }

    #[test]
    fn sharpe_zero_variance_is_undefined() {
        assert!(sharpe_ratio(&[0.0, 0.0, 0.0], 252.0).is_undefined());
        assert!(sharpe_ratio(&[0.5, 0.5, 0.5, 0.5], 252.0).is_undefined());
        assert!(sharpe_ratio(&[], 252.0).is_undefined());
    }

    #[test]
    fn sharpe_constant_inexact_return_is_undefined_at_any_length() {
        for n in [2, 3, 10, 252, 1000] {
            let metric = sharpe_ratio(&vec![0.001; n], 252.0);
            assert!(metric.is_undefined(), "n={n}: {metric:?}");
        }
        assert!(sortino_ratio(&vec![-0.001; 252], 252.0).value().is_some());
    }

    #[test]
    fn sharpe_small_but_real_dispersion_is_defined() {
        let returns: Vec<f64> = (0..252)
            .map(|i| if i % 2 == 0 { 0.0011 } else { 0.0009 })
            .collect();
        let sharpe = sharpe_ratio(&returns, 252.0).value().unwrap();
        // mean 0.001, std 0.0001
        assert_abs_diff_eq!(sharpe, 252.0_f64.sqrt() * 10.0, epsilon = 1e-6);
    }

    #[test]
    fn sortino_undefined_without_losses() {
        assert!(sortino_ratio(&[0.01, 0.02], 252.0).is_undefined());
        assert!(sortino_ratio(&[0.01, -0.02], 252.0).value().is_some());
    }

    #[test]
    fn summary_from_curve() {
        let origin = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let returns: Vec<(NaiveDate, f64)> = [0.10, -0.20, 0.05]
            .iter()
            .enumerate()
            .map(|(i, &r)| (origin + chrono::Duration::days(i as i64 + 1), r))
            .collect();
        let curve = EquityCurve::compound(origin, &returns);

        let summary = PerformanceSummary::compute(&curve, TRADING_DAYS_PER_YEAR);
        assert_abs_diff_eq!(summary.total_return, 1.1 * 0.8 * 1.05 - 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(summary.max_drawdown, -0.2, epsilon = 1e-12);
        assert_eq!(summary.max_drawdown_duration, 2);
        assert!(summary.sharpe_ratio.value().is_some());
    }

    #[test]
    fn monthly_returns_chain_month_ends() {
        let point = |m: u32, d: u32, growth: f64| EquityPoint {
            date: NaiveDate::from_ymd_opt(2024, m, d).unwrap(),
            growth,
        };
        let points = vec![
            point(1, 2, 1.0),
            point(1, 31, 1.1),
            point(2, 15, 1.0),
            point(2, 29, 1.21),
            point(3, 1, 1.21),
        ];
        let months = monthly_returns(&points);
        assert_eq!(months.len(), 3);
        assert_abs_diff_eq!(months[0].return_pct, 0.10, epsilon = 1e-12);
        assert_abs_diff_eq!(months[1].return_pct, 0.10, epsilon = 1e-12);
        assert_abs_diff_eq!(months[2].return_pct, 0.0, epsilon = 1e-12);
        assert_eq!((months[1].year, months[1].month), (2024, 2));
    }

    #[test]
    fn monthly_returns_empty() {
        assert!(monthly_returns(&[]).is_empty());
    }
}
