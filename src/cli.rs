//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

use crate::adapters::csv_adapter::CsvMarketDataAdapter;
use crate::adapters::csv_report::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::synthetic_placeholder::SeededRandomWalk;
use crate::domain::composite::FactorWeights;
use crate::domain::config_validation::{parse_date, validate_data_config, validate_screen_config};
use crate::domain::data_access::DataAccessConfig;
use crate::domain::error::ScreenError;
use crate::domain::factor::FactorConfig;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::screen::{run_screen, ScreenConfig, ScreenReport};
use crate::domain::universe::{parse_tickers, DEFAULT_MIN_HISTORY};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;
use crate::ports::placeholder_port::PlaceholderPolicy;
use crate::ports::report_port::ReportPort;

const DEFAULT_OUTPUT_DIR: &str = "report";

#[derive(Parser, Debug)]
#[command(name = "quantscreen", about = "Multi-factor equity screener and backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score the universe, rank it and backtest the top names
    Screen {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated tickers overriding [screen] tickers
        #[arg(long)]
        tickers: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Screen {
            config,
            tickers,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, tickers.as_deref())
            } else {
                run_screen_command(&config, tickers.as_deref(), output.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: &ScreenError) -> ExitCode {
    error!("{err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ScreenError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

/// `tickers_override` stands in for `[screen] tickers` when present.
fn load_and_validate(
    path: &Path,
    tickers_override: Option<&str>,
) -> Result<FileConfigAdapter, ScreenError> {
    let adapter = load_config(path)?;
    validate_data_config(&adapter)?;
    validate_screen_config(&adapter, tickers_override.is_none())?;
    Ok(adapter)
}

fn run_screen_command(
    config_path: &Path,
    tickers_override: Option<&str>,
    output_override: Option<&Path>,
) -> ExitCode {
    let result = load_and_validate(config_path, tickers_override).and_then(|adapter| {
        let screen_config = build_screen_config(&adapter)?;
        let tickers = resolve_tickers(tickers_override, &adapter)?;
        let output_dir = resolve_output_dir(output_override, &adapter);
        let data_dir = adapter
            .get_string("data", "dir")
            .map(PathBuf::from)
            .unwrap_or_default();

        let port = CsvMarketDataAdapter::new(data_dir);
        let placeholder = build_placeholder(&adapter);
        let placeholder_ref = placeholder.as_ref().map(|p| p as &dyn PlaceholderPolicy);

        run_screen_pipeline(
            &port,
            placeholder_ref,
            &tickers,
            &screen_config,
            &CsvReportAdapter::new(),
            &output_dir,
        )
    });

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

pub fn build_data_access_config(config: &dyn ConfigPort) -> DataAccessConfig {
    let defaults = DataAccessConfig::default();
    let timeout_ms = config.get_int("data", "timeout_ms", 0);
    DataAccessConfig {
        max_attempts: config
            .get_int("data", "max_attempts", i64::from(defaults.max_attempts))
            .clamp(1, i64::from(u32::MAX)) as u32,
        retry_delay: Duration::from_millis(
            config.get_usize("data", "retry_delay_ms", defaults.retry_delay.as_millis() as usize) as u64,
        ),
        timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms as u64)),
    }
}

fn composite_weights(config: &dyn ConfigPort) -> FactorWeights {
    let d = FactorWeights::default();
    FactorWeights {
        value: config.get_double("screen", "weight_value", d.value),
        quality: config.get_double("screen", "weight_quality", d.quality),
        momentum: config.get_double("screen", "weight_momentum", d.momentum),
        volatility: config.get_double("screen", "weight_volatility", d.volatility),
    }
}

pub fn build_screen_config(config: &dyn ConfigPort) -> Result<ScreenConfig, ScreenError> {
    let start_date = parse_date(config.get_string("data", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string("data", "end_date").as_deref(), "end_date")?;

    let factor_defaults = FactorConfig::default();
    let mut screen = ScreenConfig::new(start_date, end_date);
    screen.min_history = config.get_usize("data", "min_history", DEFAULT_MIN_HISTORY);
    screen.data_access = build_data_access_config(config);
    screen.factors = FactorConfig {
        momentum_lookback: config.get_usize(
            "screen",
            "momentum_lookback",
            factor_defaults.momentum_lookback,
        ),
        volatility_window: config.get_usize(
            "screen",
            "volatility_window",
            factor_defaults.volatility_window,
        ),
        volatility_min_window: config.get_usize(
            "screen",
            "volatility_min_window",
            factor_defaults.volatility_min_window,
        ),
    };
    screen.weights = composite_weights(config);
    screen.weights.validate()?;
    screen.top_n = config.get_usize("screen", "top_n", screen.top_n);
    screen.benchmark = config
        .get_string("screen", "benchmark")
        .map(|b| b.trim().to_uppercase())
        .filter(|b| !b.is_empty());
    Ok(screen)
}

/// `--tickers` wins over `[screen] tickers`.
pub fn resolve_tickers(
    tickers_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, ScreenError> {
    let raw = match tickers_override {
        Some(t) => t.to_string(),
        None => config
            .get_string("screen", "tickers")
            .ok_or_else(|| ScreenError::ConfigMissing {
                section: "screen".into(),
                key: "tickers".into(),
            })?,
    };
    parse_tickers(&raw).map_err(|e| ScreenError::ConfigInvalid {
        section: "screen".into(),
        key: "tickers".into(),
        reason: e.to_string(),
    })
}

pub fn resolve_output_dir(output_override: Option<&Path>, config: &dyn ConfigPort) -> PathBuf {
    output_override
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("report", "output_dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

/// Seeded random walk when `[data] placeholders` is on, `None` otherwise.
pub fn build_placeholder(config: &dyn ConfigPort) -> Option<SeededRandomWalk> {
    if !config.get_bool("data", "placeholders", false) {
        return None;
    }
    let seed = config.get_int("data", "placeholder_seed", 42) as u64;
    Some(SeededRandomWalk::new(seed))
}

pub fn run_screen_pipeline(
    port: &dyn MarketDataPort,
    placeholder: Option<&dyn PlaceholderPolicy>,
    tickers: &[String],
    config: &ScreenConfig,
    reporter: &dyn ReportPort,
    output_dir: &Path,
) -> Result<ScreenReport, ScreenError> {
    info!(
        tickers = tickers.len(),
        top_n = config.top_n,
        placeholders = placeholder.is_some(),
        "running screen"
    );
    let report = run_screen(port, placeholder, tickers, config)?;
    print_summary(&report);
    reporter.write_screen(&report, output_dir)?;
    println!("\nReport written to: {}", output_dir.display());
    Ok(report)
}

fn print_performance(label: &str, s: &PerformanceSummary) {
    println!("\n=== {label} ===");
    println!("Total Return:     {:.2}%", s.total_return * 100.0);
    println!("Annualized:       {:.2}%", s.annualized_return * 100.0);
    println!("Sharpe Ratio:     {}", s.sharpe_ratio);
    println!("Sortino Ratio:    {}", s.sortino_ratio);
    println!("Max Drawdown:     {:.1}%", s.max_drawdown * 100.0);
    println!("Drawdown Bars:    {}", s.max_drawdown_duration);
}

fn print_summary(report: &ScreenReport) {
    println!("=== Composite Ranking ===");
    for (i, entry) in report.ranking.entries.iter().enumerate() {
        let marker = if report.selected.contains(&entry.ticker) {
            "*"
        } else {
            " "
        };
        println!("{:>3}. {} {:<8} {:>8.3}", i + 1, marker, entry.ticker, entry.score);
    }

    print_performance("Portfolio", &report.portfolio_metrics);
    if let Some(bench) = &report.benchmark_metrics {
        print_performance("Benchmark", bench);
    }

    if !report.warnings.is_empty() {
        println!("\n=== Warnings ({}) ===", report.warnings.len());
        for w in &report.warnings {
            println!("  {w}");
        }
    }
}

pub fn run_dry_run(config_path: &Path, tickers_override: Option<&str>) -> ExitCode {
    let result = load_and_validate(config_path, tickers_override).and_then(|adapter| {
        let screen = build_screen_config(&adapter)?;
        let tickers = resolve_tickers(tickers_override, &adapter)?;
        Ok((screen, tickers, build_placeholder(&adapter).is_some()))
    });

    match result {
        Ok((screen, tickers, placeholders)) => {
            println!("Config validated successfully");
            println!("\nUniverse ({}): {}", tickers.len(), tickers.join(", "));
            println!("Window:     {} to {}", screen.start_date, screen.end_date);
            println!("Min bars:   {}", screen.min_history);
            println!("Top N:      {}", screen.top_n);
            println!(
                "Weights:    value={} quality={} momentum={} volatility={}",
                screen.weights.value,
                screen.weights.quality,
                screen.weights.momentum,
                screen.weights.volatility
            );
            println!(
                "Benchmark:  {}",
                screen.benchmark.as_deref().unwrap_or("none")
            );
            println!("Placeholders: {}", if placeholders { "on" } else { "off" });
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    match load_and_validate(config_path, None).and_then(|adapter| build_screen_config(&adapter)) {
        Ok(_) => {
            println!("Config is valid");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
