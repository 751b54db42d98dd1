//! Portfolio valuation and risk metrics.
//!
//! Weights are computed after the total value is known. Volatility, VaR and
//! drawdown use a pooled approximation: per-holding volatilities are combined
//! without cross terms, and VaR/drawdown run over all holdings' percent returns
//! concatenated into one list.

use crate::domain::analytics::beta::beta_for_ticker;
use crate::domain::analytics::{AnalyticsConfig, lookback};
use crate::domain::error::MarketlensError;
use crate::domain::returns::percent_returns;
use crate::domain::stats::{max_drawdown_percent, mean, percentile, population_std};
use crate::domain::tickers::normalize_ticker;
use crate::ports::data_port::PriceDataPort;
use crate::ports::stock_port::StockInfoPort;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

const VAR_PERCENTILE: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub ticker: String,
    pub quantity: f64,
    /// Defaults to the current price (zero assumed gain) when absent.
    pub buy_price: Option<f64>,
}

/// A holding with everything the metrics need already looked up.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingInput {
    pub ticker: String,
    pub quantity: f64,
    pub current_price: f64,
    pub buy_price: Option<f64>,
    pub beta: Option<f64>,
    /// Trailing daily returns in percent; `None` when history was too short.
    pub percent_returns: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingSnapshot {
    pub ticker: String,
    pub quantity: f64,
    pub current_price: f64,
    pub current_value: f64,
    pub cost_basis: f64,
    pub weight: f64,
    pub beta: Option<f64>,
    pub volatility: Option<f64>,
}

/// Risk snapshot. Statistics are `None` when no holding had the data for them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskMetrics {
    pub total_value: f64,
    pub total_cost: f64,
    pub unrealized_gain: f64,
    pub unrealized_gain_percent: Option<f64>,
    pub beta: Option<f64>,
    pub volatility: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub var_95: Option<f64>,
    pub holdings: Vec<HoldingSnapshot>,
}

/// Parses `TICKER:QTY[:BUY_PRICE]` entries separated by commas. Each ticker may
/// appear once.
pub fn parse_holdings(input: &str) -> Result<Vec<Holding>, MarketlensError> {
    let invalid = |entry: &str, why: &str| MarketlensError::InvalidArgument {
        reason: format!("invalid holding '{entry}': {why}"),
    };

    let mut holdings = Vec::new();
    let mut seen = HashSet::new();
    for entry in input.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(invalid(entry, "expected TICKER:QTY[:BUY_PRICE]"));
        }
        let ticker = normalize_ticker(parts[0]).ok_or_else(|| invalid(entry, "bad ticker"))?;
        if !seen.insert(ticker.clone()) {
            return Err(invalid(entry, "duplicate ticker"));
        }
        let quantity: f64 = parts[1]
            .parse()
            .map_err(|_| invalid(entry, "quantity is not a number"))?;
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(invalid(entry, "quantity must be positive"));
        }
        let buy_price = match parts.get(2) {
            Some(p) => {
                let price: f64 = p
                    .parse()
                    .map_err(|_| invalid(entry, "buy price is not a number"))?;
                if !price.is_finite() || price <= 0.0 {
                    return Err(invalid(entry, "buy price must be positive"));
                }
                Some(price)
            }
            None => None,
        };
        holdings.push(Holding {
            ticker,
            quantity,
            buy_price,
        });
    }

    if holdings.is_empty() {
        return Err(MarketlensError::InvalidArgument {
            reason: "no holdings given".to_string(),
        });
    }
    Ok(holdings)
}

pub fn compute_risk_metrics(inputs: &[HoldingInput], risk_free_rate: f64) -> RiskMetrics {
    let values: Vec<f64> = inputs
        .iter()
        .map(|h| h.quantity * h.current_price)
        .collect();
    let total_value: f64 = values.iter().sum();
    let total_cost: f64 = inputs
        .iter()
        .map(|h| h.quantity * h.buy_price.unwrap_or(h.current_price))
        .sum();

    let holdings: Vec<HoldingSnapshot> = inputs
        .iter()
        .zip(&values)
        .map(|(h, &current_value)| HoldingSnapshot {
            ticker: h.ticker.clone(),
            quantity: h.quantity,
            current_price: h.current_price,
            current_value,
            cost_basis: h.quantity * h.buy_price.unwrap_or(h.current_price),
            weight: if total_value > 0.0 {
                current_value / total_value
            } else {
                0.0
            },
            beta: h.beta,
            volatility: h.percent_returns.as_deref().and_then(population_std),
        })
        .collect();

    let weighted_betas: Vec<f64> = holdings
        .iter()
        .filter_map(|h| h.beta.map(|b| b * h.weight))
        .collect();
    let beta = (!weighted_betas.is_empty()).then(|| weighted_betas.iter().sum::<f64>());

    let with_returns: Vec<(&HoldingSnapshot, &[f64])> = holdings
        .iter()
        .zip(inputs)
        .filter_map(|(snap, h)| h.percent_returns.as_deref().map(|r| (snap, r)))
        .filter(|(_, r)| !r.is_empty())
        .collect();

    let (volatility, sharpe_ratio, var_95, max_drawdown) = if with_returns.is_empty() {
        (None, None, None, None)
    } else {
        let variance: f64 = with_returns
            .iter()
            .map(|(snap, _)| snap.weight.powi(2) * snap.volatility.unwrap_or(0.0).powi(2))
            .sum();
        let vol = variance.sqrt();

        let means: Vec<f64> = with_returns.iter().filter_map(|(_, r)| mean(r)).collect();
        let sharpe = match mean(&means) {
            Some(avg) if vol > 0.0 => (avg - risk_free_rate) / vol,
            _ => 0.0,
        };

        let pooled: Vec<f64> = with_returns
            .iter()
            .flat_map(|(_, r)| r.iter().copied())
            .collect();
        (
            Some(vol),
            Some(sharpe),
            percentile(&pooled, VAR_PERCENTILE),
            max_drawdown_percent(&pooled),
        )
    };

    let unrealized_gain = total_value - total_cost;
    RiskMetrics {
        total_value,
        total_cost,
        unrealized_gain,
        unrealized_gain_percent: (total_cost > 0.0).then(|| unrealized_gain / total_cost * 100.0),
        beta,
        volatility,
        sharpe_ratio,
        max_drawdown,
        var_95,
        holdings,
    }
}

/// Looks up prices, betas and trailing returns for each holding, then computes
/// the portfolio metrics. Holdings without a current price are skipped; a
/// missing or too-short market history leaves that holding's beta unset.
pub fn portfolio_metrics(
    data: &dyn PriceDataPort,
    stocks: &dyn StockInfoPort,
    holdings: &[Holding],
    config: &AnalyticsConfig,
    as_of: NaiveDate,
) -> Result<RiskMetrics, MarketlensError> {
    let mut inputs = Vec::with_capacity(holdings.len());
    for holding in holdings {
        let profile = stocks.stock_profile(&holding.ticker)?;
        let Some(current_price) = profile.current_price.filter(|p| *p > 0.0) else {
            warn!(ticker = %holding.ticker, "holding has no current price, skipping");
            continue;
        };

        let beta = match beta_for_ticker(data, &holding.ticker, config, as_of) {
            Ok(b) => Some(b),
            Err(e) if e.is_no_data() || matches!(e, MarketlensError::NotFound { .. }) => {
                debug!(ticker = %holding.ticker, error = %e, "beta unavailable");
                None
            }
            Err(e) => return Err(e),
        };

        let (start, end) = lookback(as_of, config.volatility_days);
        let series = data.fetch_series(&holding.ticker, start, end)?;
        let percent_returns = if series.len() > config.min_observations {
            Some(percent_returns(&series.closes()))
        } else {
            debug!(ticker = %holding.ticker, bars = series.len(), "too few bars for volatility");
            None
        };

        inputs.push(HoldingInput {
            ticker: holding.ticker.clone(),
            quantity: holding.quantity,
            current_price,
            buy_price: holding.buy_price,
            beta,
            percent_returns,
        });
    }

    Ok(compute_risk_metrics(&inputs, config.risk_free_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(ticker: &str, qty: f64, price: f64, buy: Option<f64>) -> HoldingInput {
        HoldingInput {
            ticker: ticker.to_string(),
            quantity: qty,
            current_price: price,
            buy_price: buy,
            beta: None,
            percent_returns: None,
        }
    }

    #[test]
    fn totals_and_missing_buy_price() {
        let m = compute_risk_metrics(
            &[
                input("AAPL", 10.0, 150.0, Some(100.0)),
                input("MSFT", 5.0, 200.0, None),
            ],
            2.0,
        );
        assert_eq!(m.total_value, 2_500.0);
        assert_eq!(m.total_cost, 2_000.0);
        assert_eq!(m.unrealized_gain, 500.0);
        assert!((m.unrealized_gain_percent.unwrap() - 25.0).abs() < 1e-12);
    }

    #[test]
    fn weights_do_not_depend_on_order() {
        let a = input("A", 1.0, 100.0, None);
        let b = input("B", 3.0, 100.0, None);
        let forward = compute_risk_metrics(&[a.clone(), b.clone()], 2.0);
        let backward = compute_risk_metrics(&[b, a], 2.0);
        assert_eq!(forward.holdings[0].weight, 0.25);
        assert_eq!(forward.holdings[1].weight, 0.75);
        assert_eq!(backward.holdings[0].weight, 0.75);
        assert_eq!(backward.holdings[1].weight, 0.25);
    }

    #[test]
    fn beta_excludes_undefined_holdings() {
        let mut a = input("A", 1.0, 100.0, None);
        a.beta = Some(1.2);
        let b = input("B", 1.0, 100.0, None);
        let m = compute_risk_metrics(&[a, b], 2.0);
        assert!((m.beta.unwrap() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn no_data_stays_distinct_from_zero() {
        let m = compute_risk_metrics(&[input("A", 1.0, 100.0, None)], 2.0);
        assert_eq!(m.beta, None);
        assert_eq!(m.volatility, None);
        assert_eq!(m.sharpe_ratio, None);
        assert_eq!(m.var_95, None);
        assert_eq!(m.max_drawdown, None);
    }

    #[test]
    fn volatility_combines_weighted_variances() {
        let mut a = input("A", 1.0, 100.0, None);
        a.percent_returns = Some(vec![1.0, -1.0, 1.0, -1.0]);
        let mut b = input("B", 1.0, 100.0, None);
        b.percent_returns = Some(vec![2.0, -2.0, 2.0, -2.0]);
        let m = compute_risk_metrics(&[a, b], 0.0);
        // sqrt(0.25 * 1 + 0.25 * 4)
        assert!((m.volatility.unwrap() - 1.25_f64.sqrt()).abs() < 1e-12);
        assert!(m.sharpe_ratio.unwrap().abs() < 1e-12);
    }

    #[test]
    fn sharpe_zero_when_volatility_zero() {
        let mut a = input("A", 1.0, 100.0, None);
        a.percent_returns = Some(vec![0.5, 0.5, 0.5]);
        let m = compute_risk_metrics(&[a], 2.0);
        assert_eq!(m.volatility, Some(0.0));
        assert_eq!(m.sharpe_ratio, Some(0.0));
    }

    #[test]
    fn sharpe_subtracts_rate_from_mean_daily_return() {
        let mut a = input("A", 1.0, 100.0, None);
        a.percent_returns = Some(vec![1.0, -0.5, 0.8, -0.2]);
        let m = compute_risk_metrics(&[a], 2.0);
        // mean 0.275, population std sqrt(0.406875)
        let vol = 0.406875_f64.sqrt();
        assert!((m.volatility.unwrap() - vol).abs() < 1e-12);
        assert!((m.sharpe_ratio.unwrap() - (0.275 - 2.0) / vol).abs() < 1e-9);
        assert!((m.sharpe_ratio.unwrap() + 2.7043).abs() < 1e-3);
    }

    #[test]
    fn var_and_drawdown_use_pooled_returns() {
        let mut a = input("A", 1.0, 100.0, None);
        a.percent_returns = Some(vec![10.0, -20.0]);
        let mut b = input("B", 1.0, 100.0, None);
        b.percent_returns = Some(vec![10.0]);
        let m = compute_risk_metrics(&[a, b], 2.0);
        // pooled [10, -20, 10]
        assert!((m.max_drawdown.unwrap() + 20.0).abs() < 1e-9);
        // sorted [-20, 10, 10], rank 0.1
        assert!((m.var_95.unwrap() - (-20.0 + 30.0 * 0.1)).abs() < 1e-9);
    }

    #[test]
    fn parse_holdings_formats() {
        let h = parse_holdings("aapl:10:150, MSFT:5").unwrap();
        assert_eq!(h.len(), 2);
        assert_eq!(h[0].ticker, "AAPL");
        assert_eq!(h[0].quantity, 10.0);
        assert_eq!(h[0].buy_price, Some(150.0));
        assert_eq!(h[1].buy_price, None);
    }

    #[test]
    fn parse_holdings_rejects_bad_entries() {
        assert!(parse_holdings("AAPL").is_err());
        assert!(parse_holdings("AAPL:ten").is_err());
        assert!(parse_holdings("AAPL:-1").is_err());
        assert!(parse_holdings("AAPL:1:0").is_err());
        assert!(parse_holdings(" , ").is_err());
    }

    #[test]
    fn parse_holdings_rejects_repeated_ticker() {
        let err = parse_holdings("AAPL:1, aapl:2").unwrap_err();
        assert!(
            matches!(err, MarketlensError::InvalidArgument { ref reason } if reason.contains("duplicate")),
            "{err}"
        );
    }
}
