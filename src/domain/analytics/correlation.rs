//! Pairwise return correlation across several instruments.

use crate::domain::analytics::{AnalyticsConfig, lookback};
use crate::domain::error::MarketlensError;
use crate::domain::price::PriceSeries;
use crate::domain::returns::returns_by_date;
use crate::domain::stats::pearson;
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub tickers: Vec<String>,
    /// Number of common return dates the coefficients were computed over.
    pub observations: usize,
    /// `values[i][j]` is the coefficient between `tickers[i]` and `tickers[j]`;
    /// `None` off the diagonal when either return series is constant.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.tickers.iter().position(|t| t == a)?;
        let j = self.tickers.iter().position(|t| t == b)?;
        self.values[i][j]
    }
}

/// Pearson correlation of daily returns restricted to the dates present in
/// every instrument's return series.
pub fn correlation_matrix(
    series: &[PriceSeries],
    min_observations: usize,
) -> Result<CorrelationMatrix, MarketlensError> {
    if series.is_empty() {
        return Err(MarketlensError::InvalidArgument {
            reason: "correlation needs at least one ticker".to_string(),
        });
    }

    let returns: Vec<_> = series.iter().map(returns_by_date).collect();
    let mut common: BTreeSet<NaiveDate> = returns[0].keys().copied().collect();
    for r in &returns[1..] {
        common.retain(|d| r.contains_key(d));
    }

    let need = min_observations.max(2);
    if common.len() < need {
        return Err(MarketlensError::InsufficientData {
            subject: "correlation matrix".to_string(),
            have: common.len(),
            need,
        });
    }

    let columns: Vec<Vec<f64>> = returns
        .iter()
        .map(|r| common.iter().filter_map(|d| r.get(d).copied()).collect())
        .collect();

    let n = columns.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        values[i][i] = Some(1.0);
        for j in (i + 1)..n {
            let c = pearson(&columns[i], &columns[j]);
            values[i][j] = c;
            values[j][i] = c;
        }
    }

    Ok(CorrelationMatrix {
        tickers: series.iter().map(|s| s.ticker().to_string()).collect(),
        observations: common.len(),
        values,
    })
}

/// Correlation matrix over the configured window ending at `as_of`.
/// Repeated tickers are collapsed, keeping first-seen order.
pub fn correlation_for_tickers(
    data: &dyn PriceDataPort,
    tickers: &[String],
    config: &AnalyticsConfig,
    as_of: NaiveDate,
) -> Result<CorrelationMatrix, MarketlensError> {
    let (start, end) = lookback(as_of, config.correlation_days);
    let mut seen = BTreeSet::new();
    let mut series = Vec::new();
    for ticker in tickers {
        if seen.insert(ticker.as_str()) {
            series.push(data.fetch_series(ticker, start, end)?);
        }
    }
    correlation_matrix(&series, config.min_observations)
}
