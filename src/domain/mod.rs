//! Core domain types and logic.

pub mod backtest;
pub mod composite;
pub mod config_validation;
pub mod data_access;
pub mod error;
pub mod factor;
pub mod fundamentals;
pub mod metrics;
pub mod ohlcv;
pub mod screen;
pub mod stats;
pub mod universe;
