//! Beta of an instrument against the market proxy.

use crate::domain::analytics::{AnalyticsConfig, lookback};
use crate::domain::error::MarketlensError;
use crate::domain::price::PriceSeries;
use crate::domain::returns::{align_on_dates, daily_returns};
use crate::domain::stats::ols_slope;
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;

/// OLS slope of instrument returns on market returns, over the dates both
/// series share. Returns are taken between consecutive shared dates.
pub fn beta(
    instrument: &PriceSeries,
    market: &PriceSeries,
    min_observations: usize,
) -> Result<f64, MarketlensError> {
    let aligned = align_on_dates(instrument, market);
    let stock_closes: Vec<f64> = aligned.iter().map(|(_, s, _)| *s).collect();
    let market_closes: Vec<f64> = aligned.iter().map(|(_, _, m)| *m).collect();

    let pairs: (Vec<f64>, Vec<f64>) = daily_returns(&stock_closes)
        .into_iter()
        .zip(daily_returns(&market_closes))
        .filter(|(s, m)| s.is_finite() && m.is_finite())
        .unzip();
    let (stock_returns, market_returns) = pairs;

    let subject = format!("beta of {}", instrument.ticker());
    if stock_returns.len() < min_observations.max(2) {
        return Err(MarketlensError::InsufficientData {
            subject,
            have: stock_returns.len(),
            need: min_observations.max(2),
        });
    }

    ols_slope(&market_returns, &stock_returns).ok_or_else(|| MarketlensError::DegenerateData {
        subject,
        reason: format!("{} returns have zero variance", market.ticker()),
    })
}

/// Beta of `ticker` over the configured window ending at `as_of`.
pub fn beta_for_ticker(
    data: &dyn PriceDataPort,
    ticker: &str,
    config: &AnalyticsConfig,
    as_of: NaiveDate,
) -> Result<f64, MarketlensError> {
    let (start, end) = lookback(as_of, config.beta_days);
    let instrument = data.fetch_series(ticker, start, end)?;
    let market = data.fetch_series(&config.market_ticker, start, end)?;
    beta(&instrument, &market, config.min_observations)
}
