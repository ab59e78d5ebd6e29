//! Configuration validation.
//!
//! Validates every config field before any bars are read. Absent optional keys
//! are checked at their default values.

use crate::domain::error::BarsimError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;
pub const DEFAULT_COMMISSION: f64 = 0.001;
pub const DEFAULT_LOT_SIZE: i64 = 1;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;
pub const DEFAULT_SHORT_WINDOW: i64 = 20;
pub const DEFAULT_LONG_WINDOW: i64 = 50;
pub const DEFAULT_STRATEGY: &str = "ma_cross";

pub const STRATEGY_NAMES: [&str; 2] = ["ma_cross", "macd"];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), BarsimError> {
    validate_initial_capital(config)?;
    validate_commission(config)?;
    validate_lot_size(config)?;
    validate_risk_free_rate(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), BarsimError> {
    let name = config
        .get_string("strategy", "name")
        .unwrap_or_else(|| DEFAULT_STRATEGY.to_string());
    match name.trim() {
        "ma_cross" => validate_windows(config),
        "macd" => validate_macd_periods(config),
        other => Err(invalid(
            "strategy",
            "name",
            format!(
                "unknown strategy '{}', expected one of {}",
                other,
                STRATEGY_NAMES.join(", ")
            ),
        )),
    }
}

/// `symbols` must list at least one non-empty symbol.
pub fn validate_symbols(config: &dyn ConfigPort) -> Result<(), BarsimError> {
    match config.get_string("backtest", "symbols") {
        Some(s) if s.split(',').any(|sym| !sym.trim().is_empty()) => Ok(()),
        _ => Err(BarsimError::ConfigMissing {
            section: "backtest".to_string(),
            key: "symbols".to_string(),
        }),
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> BarsimError {
    BarsimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), BarsimError> {
    let value = config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL);
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_commission(config: &dyn ConfigPort) -> Result<(), BarsimError> {
    let value = config.get_double("backtest", "commission", DEFAULT_COMMISSION);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "commission",
            "commission must be in [0, 1)",
        ));
    }
    Ok(())
}

fn validate_lot_size(config: &dyn ConfigPort) -> Result<(), BarsimError> {
    let value = config.get_int("backtest", "lot_size", DEFAULT_LOT_SIZE);
    if value < 1 {
        return Err(invalid(
            "backtest",
            "lot_size",
            "lot_size must be at least 1",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), BarsimError> {
    let value = config.get_double("backtest", "risk_free_rate", DEFAULT_RISK_FREE_RATE);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), BarsimError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, BarsimError> {
    match value {
        None => Err(BarsimError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "backtest",
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn positive_int(config: &dyn ConfigPort, key: &str, default: i64) -> Result<i64, BarsimError> {
    let value = config.get_int("strategy", key, default);
    if value < 1 {
        return Err(invalid(
            "strategy",
            key,
            format!("{} must be at least 1", key),
        ));
    }
    Ok(value)
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), BarsimError> {
    let short = positive_int(config, "short_window", DEFAULT_SHORT_WINDOW)?;
    let long = positive_int(config, "long_window", DEFAULT_LONG_WINDOW)?;
    if short >= long {
        return Err(invalid(
            "strategy",
            "short_window",
            "short_window must be less than long_window",
        ));
    }
    Ok(())
}

fn validate_macd_periods(config: &dyn ConfigPort) -> Result<(), BarsimError> {
    use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};

    let fast = positive_int(config, "fast_period", DEFAULT_FAST as i64)?;
    let slow = positive_int(config, "slow_period", DEFAULT_SLOW as i64)?;
    positive_int(config, "signal_period", DEFAULT_SIGNAL as i64)?;
    if fast >= slow {
        return Err(invalid(
            "strategy",
            "fast_period",
            "fast_period must be less than slow_period",
        ));
    }
    Ok(())
}
