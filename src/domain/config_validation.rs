//! Configuration validation.
//!
//! Validates all config fields before a screening run starts.

use crate::domain::error::ScreenError;
use crate::domain::factor::MIN_FACTOR_HISTORY;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), ScreenError> {
    validate_data_dir(config)?;
    validate_dates(config)?;
    validate_min_history(config)?;
    validate_retry(config)?;
    Ok(())
}

/// `[screen] tickers` is only required when no ticker list is supplied
/// from elsewhere.
pub fn validate_screen_config(
    config: &dyn ConfigPort,
    tickers_required: bool,
) -> Result<(), ScreenError> {
    if tickers_required {
        validate_tickers(config)?;
    }
    validate_top_n(config)?;
    validate_weights(config)?;
    validate_windows(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> ScreenError {
    ScreenError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn missing(section: &str, key: &str) -> ScreenError {
    ScreenError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), ScreenError> {
    match config.get_string("data", "dir") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(missing("data", "dir")),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), ScreenError> {
    let start_str = config.get_string("data", "start_date");
    let end_str = config.get_string("data", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid("data", "start_date", "start_date must be before end_date"));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, ScreenError> {
    match value {
        None => Err(missing("data", field)),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "data",
                field,
                &format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_min_history(config: &dyn ConfigPort) -> Result<(), ScreenError> {
    let value = config.get_int("data", "min_history", 130);
    if value < MIN_FACTOR_HISTORY as i64 + 1 {
        return Err(invalid(
            "data",
            "min_history",
            &format!("min_history must be at least {}", MIN_FACTOR_HISTORY + 1),
        ));
    }
    Ok(())
}

fn validate_retry(config: &dyn ConfigPort) -> Result<(), ScreenError> {
    if config.get_int("data", "max_attempts", 3) < 1 {
        return Err(invalid("data", "max_attempts", "max_attempts must be at least 1"));
    }
    if config.get_int("data", "retry_delay_ms", 500) < 0 {
        return Err(invalid("data", "retry_delay_ms", "retry_delay_ms must be non-negative"));
    }
    if config.get_int("data", "timeout_ms", 0) < 0 {
        return Err(invalid("data", "timeout_ms", "timeout_ms must be non-negative"));
    }
    Ok(())
}

fn validate_tickers(config: &dyn ConfigPort) -> Result<(), ScreenError> {
    match config.get_string("screen", "tickers") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(missing("screen", "tickers")),
    }
}

fn validate_top_n(config: &dyn ConfigPort) -> Result<(), ScreenError> {
    if config.get_int("screen", "top_n", 10) < 1 {
        return Err(invalid("screen", "top_n", "top_n must be at least 1"));
    }
    Ok(())
}

fn validate_weights(config: &dyn ConfigPort) -> Result<(), ScreenError> {
    for key in [
        "weight_value",
        "weight_quality",
        "weight_momentum",
        "weight_volatility",
    ] {
        let value = config.get_double("screen", key, 0.25);
        if !value.is_finite() || value < 0.0 {
            return Err(invalid("screen", key, "weights must be non-negative"));
        }
    }
    Ok(())
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), ScreenError> {
    let lookback = config.get_int("screen", "momentum_lookback", 126);
    if lookback < 2 {
        return Err(invalid("screen", "momentum_lookback", "momentum_lookback must be at least 2"));
    }

    let window = config.get_int("screen", "volatility_window", 252);
    let min_window = config.get_int("screen", "volatility_min_window", 126);
    if min_window < 2 {
        return Err(invalid(
            "screen",
            "volatility_min_window",
            "volatility_min_window must be at least 2",
        ));
    }
    if window < min_window {
        return Err(invalid(
            "screen",
            "volatility_window",
            "volatility_window must not be shorter than volatility_min_window",
        ));
    }
    Ok(())
}
