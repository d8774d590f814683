//! CSV report adapter.
//!
//! Writes one file per table into the output directory:
//! `factors.csv`, `ranking.csv`, `equity_curve.csv`, `monthly_returns.csv`,
//! `summary.csv` and `warnings.csv`.

use crate::domain::error::ScreenError;
use crate::domain::factor::FactorKind;
use crate::domain::metrics::{monthly_returns, PerformanceSummary};
use crate::domain::screen::ScreenReport;
use crate::ports::report_port::ReportPort;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

pub const FACTORS_FILE: &str = "factors.csv";
pub const RANKING_FILE: &str = "ranking.csv";
pub const EQUITY_FILE: &str = "equity_curve.csv";
pub const MONTHLY_FILE: &str = "monthly_returns.csv";
pub const SUMMARY_FILE: &str = "summary.csv";
pub const WARNINGS_FILE: &str = "warnings.csv";

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn io_err(e: csv::Error) -> ScreenError {
    ScreenError::Io(e.into())
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

fn writer(dir: &Path, name: &str) -> Result<csv::Writer<fs::File>, ScreenError> {
    csv::Writer::from_path(dir.join(name)).map_err(io_err)
}

fn write_factors(report: &ScreenReport, dir: &Path) -> Result<(), ScreenError> {
    let mut w = writer(dir, FACTORS_FILE)?;
    let mut header = vec!["ticker".to_string()];
    header.extend(FactorKind::ALL.iter().map(|k| k.to_string()));
    w.write_record(&header).map_err(io_err)?;

    for ticker in &report.factors.tickers {
        let mut row = vec![ticker.clone()];
        for kind in FactorKind::ALL {
            let score = report.factors.column(kind).and_then(|c| c.get(ticker));
            row.push(fmt_opt(score));
        }
        w.write_record(&row).map_err(io_err)?;
    }
    w.flush()?;
    Ok(())
}

fn write_ranking(report: &ScreenReport, dir: &Path) -> Result<(), ScreenError> {
    let mut w = writer(dir, RANKING_FILE)?;
    w.write_record(["rank", "ticker", "composite", "selected"])
        .map_err(io_err)?;
    for (i, entry) in report.ranking.entries.iter().enumerate() {
        let selected = report.selected.contains(&entry.ticker);
        w.write_record([
            (i + 1).to_string(),
            entry.ticker.clone(),
            format!("{:.6}", entry.score),
            selected.to_string(),
        ])
        .map_err(io_err)?;
    }
    w.flush()?;
    Ok(())
}

/// Portfolio and benchmark growth on the union of their dates.
fn write_equity(report: &ScreenReport, dir: &Path) -> Result<(), ScreenError> {
    let mut rows: BTreeMap<_, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for p in &report.backtest.portfolio.points {
        rows.entry(p.date).or_default().0 = Some(p.growth);
    }
    if let Some(bench) = &report.backtest.benchmark {
        for p in &bench.points {
            rows.entry(p.date).or_default().1 = Some(p.growth);
        }
    }

    let mut w = writer(dir, EQUITY_FILE)?;
    w.write_record(["date", "portfolio", "benchmark"])
        .map_err(io_err)?;
    for (date, (portfolio, benchmark)) in rows {
        w.write_record([
            date.format("%Y-%m-%d").to_string(),
            fmt_opt(portfolio),
            fmt_opt(benchmark),
        ])
        .map_err(io_err)?;
    }
    w.flush()?;
    Ok(())
}

fn write_monthly(report: &ScreenReport, dir: &Path) -> Result<(), ScreenError> {
    let mut w = writer(dir, MONTHLY_FILE)?;
    w.write_record(["year", "month", "return_pct"])
        .map_err(io_err)?;
    for m in monthly_returns(&report.backtest.portfolio.points) {
        w.write_record([
            m.year.to_string(),
            m.month.to_string(),
            format!("{:.4}", m.return_pct * 100.0),
        ])
        .map_err(io_err)?;
    }
    w.flush()?;
    Ok(())
}

fn summary_rows(name: &str, s: &PerformanceSummary) -> Vec<[String; 3]> {
    let metric = |m: crate::domain::metrics::Metric| fmt_opt(m.value());
    vec![
        [name.into(), "total_return".into(), format!("{:.6}", s.total_return)],
        [name.into(), "annualized_return".into(), format!("{:.6}", s.annualized_return)],
        [name.into(), "sharpe_ratio".into(), metric(s.sharpe_ratio)],
        [name.into(), "sortino_ratio".into(), metric(s.sortino_ratio)],
        [name.into(), "max_drawdown".into(), format!("{:.6}", s.max_drawdown)],
        [
            name.into(),
            "max_drawdown_duration".into(),
            s.max_drawdown_duration.to_string(),
        ],
    ]
}

fn write_summary(report: &ScreenReport, dir: &Path) -> Result<(), ScreenError> {
    let mut w = writer(dir, SUMMARY_FILE)?;
    w.write_record(["series", "metric", "value"]).map_err(io_err)?;
    let mut rows = summary_rows("portfolio", &report.portfolio_metrics);
    if let Some(bench) = &report.benchmark_metrics {
        rows.extend(summary_rows("benchmark", bench));
    }
    for row in rows {
        w.write_record(&row).map_err(io_err)?;
    }
    w.flush()?;
    Ok(())
}

fn write_warnings(report: &ScreenReport, dir: &Path) -> Result<(), ScreenError> {
    let mut w = writer(dir, WARNINGS_FILE)?;
    w.write_record(["ticker", "message"]).map_err(io_err)?;
    for warning in &report.warnings {
        w.write_record([warning.ticker().to_string(), warning.to_string()])
            .map_err(io_err)?;
    }
    w.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write_screen(&self, report: &ScreenReport, output_dir: &Path) -> Result<(), ScreenError> {
        fs::create_dir_all(output_dir)?;
        write_factors(report, output_dir)?;
        write_ranking(report, output_dir)?;
        write_equity(report, output_dir)?;
        write_monthly(report, output_dir)?;
        write_summary(report, output_dir)?;
        write_warnings(report, output_dir)?;
        info!(dir = %output_dir.display(), "report written");
        Ok(())
    }
}
