//! End-to-end tests of the screening pipeline over an in-memory data port.

mod common;

use approx::assert_abs_diff_eq;
use common::*;
use quantscreen::adapters::synthetic_placeholder::SeededRandomWalk;
use quantscreen::domain::backtest::{run_backtest, BacktestConfig};
use quantscreen::domain::data_access::FetchFailure;
use quantscreen::domain::error::ScreenError;
use quantscreen::domain::factor::FactorKind;
use quantscreen::domain::ohlcv::PriceSeries;
use quantscreen::domain::screen::{run_screen, Dataset, ScreenWarning};
use quantscreen::domain::universe::DropReason;
use std::time::Duration;

const UNIVERSE: [&str; 4] = ["AAA", "BBB", "CCC", "DDD"];

#[test]
fn full_pipeline_ranks_and_backtests_top_n() {
    let port = sample_port();
    let config = sample_config();

    let report = run_screen(&port, None, &tickers(&UNIVERSE), &config).unwrap();

    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert_eq!(report.ranking.len(), 4);
    assert!(report
        .ranking
        .entries
        .windows(2)
        .all(|w| w[0].score >= w[1].score));
    assert_eq!(report.ranking.entries[0].ticker, "AAA");

    assert_eq!(report.selected.len(), 2);
    assert_eq!(report.selected, report.ranking.top(2));
    assert_eq!(report.backtest.tickers, report.selected);

    let curve = &report.backtest.portfolio;
    assert_eq!(curve.points[0].growth, 1.0);
    assert_eq!(curve.points.len(), 200);
    assert!(report.portfolio_metrics.sharpe_ratio.value().is_some());
    assert!(report.portfolio_metrics.max_drawdown <= 0.0);
    assert!(report.benchmark_metrics.is_none());
}

#[test]
fn every_factor_column_is_standardized() {
    let port = sample_port();
    let report = run_screen(&port, None, &tickers(&UNIVERSE), &sample_config()).unwrap();

    for kind in FactorKind::ALL {
        let column = report.factors.column(kind).unwrap();
        let values: Vec<f64> = column.scores.iter().flatten().copied().collect();
        assert_eq!(values.len(), 4, "{kind}");
        let mean = values.iter().sum::<f64>() / 4.0;
        let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 4.0).sqrt();
        assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(std, 1.0, epsilon = 1e-9);
    }
}

#[test]
fn flat_price_ticker_gets_median_volatility_with_warning() {
    let port = sample_port()
        .with_bars("FLT", generate_bars(date(2024, 1, 1), 200, 0.0, 0.0))
        .with_fundamentals(fundamentals("FLT", [18.0, 2.0, 10.0], [0.12, 0.10, 0.9]));
    let universe = tickers(&["AAA", "BBB", "CCC", "DDD", "FLT"]);

    let report = run_screen(&port, None, &universe, &sample_config()).unwrap();

    let volatility = report.factors.column(FactorKind::Volatility).unwrap();
    assert!(volatility.get("FLT").is_some());
    assert!(report.warnings.contains(&ScreenWarning::MedianSubstituted {
        ticker: "FLT".into(),
        factor: FactorKind::Volatility,
    }));
    assert_eq!(report.ranking.len(), 5);
}

#[test]
fn non_positive_ratio_is_itemized() {
    let port = sample_port()
        .with_bars("NEG", generate_bars(date(2024, 1, 1), 200, 0.001, 0.006))
        .with_fundamentals(fundamentals("NEG", [-4.0, 1.1, 6.0], [0.12, 0.10, 0.9]));
    let universe = tickers(&["AAA", "BBB", "CCC", "DDD", "NEG"]);

    let report = run_screen(&port, None, &universe, &sample_config()).unwrap();

    assert!(report.warnings.iter().any(|w| matches!(
        w,
        ScreenWarning::FactorUnavailable { ticker, factor: FactorKind::Value, reason }
            if ticker == "NEG" && reason.contains("non-positive P/E")
    )));
    assert!(report.ranking.entries.iter().all(|e| e.ticker != "NEG"));
}

#[test]
fn placeholder_fills_missing_ticker_and_is_reported() {
    let port = sample_port();
    let placeholder = SeededRandomWalk::new(7);
    let universe = tickers(&["AAA", "BBB", "CCC", "DDD", "EEE"]);

    let report = run_screen(&port, Some(&placeholder), &universe, &sample_config()).unwrap();

    assert_eq!(report.ranking.len(), 5);
    assert!(report.warnings.contains(&ScreenWarning::PlaceholderUsed {
        ticker: "EEE".into(),
        dataset: Dataset::Prices,
        failure: FetchFailure::NoData,
    }));
    assert!(report.warnings.contains(&ScreenWarning::PlaceholderUsed {
        ticker: "EEE".into(),
        dataset: Dataset::Fundamentals,
        failure: FetchFailure::NoData,
    }));
    assert!(report.warnings.iter().all(|w| w.ticker() == "EEE"));
}

#[test]
fn provider_outage_is_retried_then_dropped() {
    let port = sample_port().with_error("ERR", "connection reset");
    let universe = tickers(&["AAA", "BBB", "CCC", "DDD", "ERR"]);

    let report = run_screen(&port, None, &universe, &sample_config()).unwrap();

    assert_eq!(port.price_calls("ERR"), 3);
    assert_eq!(port.price_calls("AAA"), 1);
    assert_eq!(report.ranking.len(), 4);
    assert!(report.warnings.iter().any(|w| matches!(
        w,
        ScreenWarning::DataUnavailable {
            ticker,
            dataset: Dataset::Prices,
            failure: FetchFailure::Provider(_),
        } if ticker == "ERR"
    )));
    assert!(report.warnings.contains(&ScreenWarning::DroppedFromUniverse {
        ticker: "ERR".into(),
        reason: DropReason::NoData,
    }));
}

#[test]
fn expired_deadline_aborts_the_run() {
    let port = sample_port();
    let mut config = sample_config();
    config.data_access.timeout = Some(Duration::ZERO);

    let result = run_screen(&port, None, &tickers(&UNIVERSE), &config);
    assert!(matches!(result, Err(ScreenError::DataAccessTimeout { .. })));
}

#[test]
fn short_history_is_dropped_before_scoring() {
    let port = sample_port().with_bars("FFF", generate_bars(date(2024, 1, 1), 100, 0.01, 0.0));
    let universe = tickers(&["AAA", "BBB", "CCC", "DDD", "FFF"]);

    let report = run_screen(&port, None, &universe, &sample_config()).unwrap();

    assert!(report.warnings.contains(&ScreenWarning::DroppedFromUniverse {
        ticker: "FFF".into(),
        reason: DropReason::InsufficientBars {
            bars: 100,
            minimum: 130,
        },
    }));
    assert!(!report.factors.tickers.contains(&"FFF".to_string()));
    assert!(report.ranking.entries.iter().all(|e| e.ticker != "FFF"));
}

#[test]
fn missing_fundamentals_exclude_only_that_ticker() {
    let port = sample_port().with_bars("GGG", generate_bars(date(2024, 1, 1), 200, 0.001, 0.006));
    let universe = tickers(&["AAA", "BBB", "CCC", "DDD", "GGG"]);

    let report = run_screen(&port, None, &universe, &sample_config()).unwrap();

    assert_eq!(report.ranking.len(), 4);
    assert!(report.ranking.entries.iter().all(|e| e.ticker != "GGG"));

    let (_, missing) = report
        .ranking
        .excluded
        .iter()
        .find(|(t, _)| t == "GGG")
        .unwrap();
    assert!(missing.contains(&FactorKind::Value));
    assert!(missing.contains(&FactorKind::Quality));
    assert!(!missing.contains(&FactorKind::Momentum));

    // price factors are still computed for GGG
    let momentum = report.factors.column(FactorKind::Momentum).unwrap();
    assert!(momentum.get("GGG").is_some());

    assert!(report.warnings.contains(&ScreenWarning::DataUnavailable {
        ticker: "GGG".into(),
        dataset: Dataset::Fundamentals,
        failure: FetchFailure::NoData,
    }));
}

#[test]
fn benchmark_is_tracked_but_not_ranked() {
    let port = sample_port().with_bars("SPY", generate_bars(date(2024, 1, 1), 200, 0.0008, 0.003));
    let mut config = sample_config();
    config.benchmark = Some("SPY".into());

    let report = run_screen(&port, None, &tickers(&UNIVERSE), &config).unwrap();

    assert!(report.benchmark_metrics.is_some());
    assert!(report.backtest.benchmark.is_some());
    assert!(report.ranking.entries.iter().all(|e| e.ticker != "SPY"));
}

#[test]
fn missing_benchmark_is_a_warning() {
    let port = sample_port();
    let mut config = sample_config();
    config.benchmark = Some("SPY".into());

    let report = run_screen(&port, None, &tickers(&UNIVERSE), &config).unwrap();

    assert!(report.benchmark_metrics.is_none());
    assert!(report
        .warnings
        .contains(&ScreenWarning::BenchmarkUnavailable { ticker: "SPY".into() }));
}

#[test]
fn universe_without_enough_history_is_fatal() {
    let start = date(2024, 1, 1);
    let port = MockDataPort::new()
        .with_bars("AAA", generate_bars(start, 50, 0.001, 0.01))
        .with_bars("BBB", generate_bars(start, 60, 0.001, 0.01));

    let result = run_screen(&port, None, &tickers(&["AAA", "BBB"]), &sample_config());
    assert!(matches!(result, Err(ScreenError::EmptyUniverse)));
}

#[test]
fn negative_weight_is_rejected() {
    let port = sample_port();
    let mut config = sample_config();
    config.weights.value = -0.5;

    let result = run_screen(&port, None, &tickers(&UNIVERSE), &config);
    assert!(matches!(result, Err(ScreenError::InvalidWeights { .. })));
}

#[test]
fn repeated_runs_are_identical() {
    let placeholder = SeededRandomWalk::new(11);
    let universe = tickers(&["AAA", "BBB", "CCC", "DDD", "EEE"]);
    let config = sample_config();

    let first = run_screen(&sample_port(), Some(&placeholder), &universe, &config).unwrap();
    let second = run_screen(&sample_port(), Some(&placeholder), &universe, &config).unwrap();

    assert_eq!(first.ranking.entries, second.ranking.entries);
    assert_eq!(first.selected, second.selected);
    assert_eq!(first.backtest.portfolio, second.backtest.portfolio);
    assert_eq!(first.warnings, second.warnings);
}

#[test]
fn equal_weight_backtest_example() {
    let mut prices = PriceSeries::new();
    let d = |day| date(2024, 1, day);
    prices
        .insert("A", vec![make_bar(d(1), 100.0), make_bar(d(2), 101.0), make_bar(d(3), 103.02)])
        .unwrap();
    prices
        .insert("B", vec![make_bar(d(1), 100.0), make_bar(d(2), 103.0), make_bar(d(3), 101.97)])
        .unwrap();

    let result = run_backtest(&prices, &tickers(&["A", "B"]), &BacktestConfig::new(d(1))).unwrap();
    let growth = result.portfolio.values();
    assert_abs_diff_eq!(growth[0], 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(growth[1], 1.02, epsilon = 1e-9);
    assert_abs_diff_eq!(growth[2], 1.0251, epsilon = 1e-9);
}
