//! Configuration validation.
//!
//! Every key is optional; a present key must parse and be in range.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::StratlabError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::str::FromStr;

/// Checks every key a run reads.
pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), StratlabError> {
    load_backtest_config(config)?;
    date_range(config)?;
    Ok(())
}

/// Builds the run configuration, defaulting missing keys.
pub fn load_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, StratlabError> {
    let defaults = BacktestConfig::default();

    let initial_equity = parse_or(config, "backtest", "initial_equity", defaults.initial_equity)?;
    require(
        initial_equity > 0.0 && initial_equity.is_finite(),
        "backtest",
        "initial_equity",
        "initial_equity must be positive",
    )?;

    let quantity = parse_or(config, "backtest", "quantity", defaults.quantity)?;
    require(
        quantity > 0.0 && quantity.is_finite(),
        "backtest",
        "quantity",
        "quantity must be positive",
    )?;

    let annualization_factor = parse_or(
        config,
        "backtest",
        "annualization_factor",
        defaults.annualization_factor,
    )?;
    require(
        annualization_factor > 0.0 && annualization_factor.is_finite(),
        "backtest",
        "annualization_factor",
        "annualization_factor must be positive",
    )?;

    let pivot_block = parse_or(config, "indicators", "pivot_block", defaults.pivot_block)?;
    require(pivot_block >= 1, "indicators", "pivot_block", "pivot_block must be at least 1")?;

    Ok(BacktestConfig {
        initial_equity,
        quantity,
        annualization_factor,
        pivot_block,
    })
}

/// Optional inclusive date filter from `[backtest] start_date` / `end_date`.
pub fn date_range(
    config: &dyn ConfigPort,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), StratlabError> {
    let start = parse_date(config, "start_date")?;
    let end = parse_date(config, "end_date")?;

    if let (Some(s), Some(e)) = (start, end) {
        require(s < e, "backtest", "start_date", "start_date must be before end_date")?;
    }
    Ok((start, end))
}

fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, StratlabError> {
    let Some(raw) = present(config, "backtest", key) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| StratlabError::ConfigInvalid {
            section: "backtest".to_string(),
            key: key.to_string(),
            reason: format!("invalid {} format, expected YYYY-MM-DD", key),
        })
}

fn present(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_or<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, StratlabError> {
    match present(config, section, key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| StratlabError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("'{}' is not a valid {}", raw, key),
        }),
    }
}

fn require(ok: bool, section: &str, key: &str, reason: &str) -> Result<(), StratlabError> {
    if ok {
        return Ok(());
    }
    Err(StratlabError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    })
}
