//! Risk and fundamental analytics over price series and instrument profiles.
//!
//! Each submodule exposes a pure function over already-fetched data plus a thin
//! service wrapper that fetches through the ports and delegates to it.

pub mod beta;
pub mod correlation;
pub mod fundamental;
pub mod portfolio;
pub mod sector;

use chrono::{Duration, NaiveDate};

pub const DEFAULT_MARKET_TICKER: &str = "SPY";
pub const DEFAULT_RISK_FREE_RATE: f64 = 2.0;
pub const DEFAULT_MIN_OBSERVATIONS: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsConfig {
    /// Instrument used as the market proxy for beta.
    pub market_ticker: String,
    /// Risk-free rate in percent, subtracted from the mean daily percent return.
    pub risk_free_rate: f64,
    pub beta_days: i64,
    pub correlation_days: i64,
    pub volatility_days: i64,
    pub min_observations: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            market_ticker: DEFAULT_MARKET_TICKER.to_string(),
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            beta_days: 252,
            correlation_days: 90,
            volatility_days: 90,
            min_observations: DEFAULT_MIN_OBSERVATIONS,
        }
    }
}

/// Inclusive calendar window ending at `as_of`.
pub fn lookback(as_of: NaiveDate, days: i64) -> (NaiveDate, NaiveDate) {
    (as_of - Duration::days(days), as_of)
}
