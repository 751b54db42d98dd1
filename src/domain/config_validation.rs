//! Configuration validation.
//!
//! Validates every config field before a command runs.

use crate::domain::error::MarketlensError;
use crate::domain::indicator::IndicatorKind;
use crate::domain::tickers::normalize_ticker;
use crate::ports::config_port::ConfigPort;

pub fn validate_storage_config(config: &dyn ConfigPort) -> Result<(), MarketlensError> {
    let pool_size = config.get_int("sqlite", "pool_size", 4);
    if pool_size < 1 {
        return Err(invalid("sqlite", "pool_size", "pool_size must be at least 1"));
    }
    Ok(())
}

pub fn validate_indicator_config(config: &dyn ConfigPort) -> Result<(), MarketlensError> {
    validate_positive(config, "indicators", "days", 365)?;
    validate_positive(config, "indicators", "workers", 4)?;
    validate_indicator_types(config)?;
    Ok(())
}

pub fn validate_analytics_config(config: &dyn ConfigPort) -> Result<(), MarketlensError> {
    validate_market_ticker(config)?;
    validate_risk_free_rate(config)?;
    validate_positive(config, "analytics", "beta_days", 252)?;
    validate_positive(config, "analytics", "correlation_days", 90)?;
    validate_positive(config, "analytics", "volatility_days", 90)?;
    validate_min_observations(config)?;
    Ok(())
}

/// Comma-separated indicator codes from `[indicators] types`; empty when unset.
pub fn parse_indicator_types(value: &str) -> Result<Vec<IndicatorKind>, MarketlensError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

fn invalid(section: &str, key: &str, reason: &str) -> MarketlensError {
    MarketlensError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<(), MarketlensError> {
    if config.get_int(section, key, default) <= 0 {
        return Err(invalid(section, key, &format!("{key} must be positive")));
    }
    Ok(())
}

fn validate_indicator_types(config: &dyn ConfigPort) -> Result<(), MarketlensError> {
    let Some(types) = config.get_string("indicators", "types") else {
        return Ok(());
    };
    parse_indicator_types(&types).map_err(|e| invalid("indicators", "types", &e.to_string()))?;
    Ok(())
}

fn validate_market_ticker(config: &dyn ConfigPort) -> Result<(), MarketlensError> {
    match config.get_string("analytics", "market_ticker") {
        Some(s) if normalize_ticker(&s).is_none() => Err(invalid(
            "analytics",
            "market_ticker",
            "market_ticker is not a valid ticker",
        )),
        _ => Ok(()),
    }
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), MarketlensError> {
    let value = config.get_double("analytics", "risk_free_rate", 2.0);
    if !(0.0..100.0).contains(&value) {
        return Err(invalid(
            "analytics",
            "risk_free_rate",
            "risk_free_rate must be a percentage between 0 and 100",
        ));
    }
    Ok(())
}

fn validate_min_observations(config: &dyn ConfigPort) -> Result<(), MarketlensError> {
    if config.get_int("analytics", "min_observations", 30) < 2 {
        return Err(invalid(
            "analytics",
            "min_observations",
            "min_observations must be at least 2",
        ));
    }
    Ok(())
}
