//! Indicator calculation jobs for one instrument or every active instrument.

use crate::domain::analytics::lookback;
use crate::domain::error::MarketlensError;
use crate::domain::indicator::persist::persist_series;
use crate::domain::indicator::plan::compute_indicator;
use crate::domain::indicator::{IndicatorKind, IndicatorType};
use crate::ports::data_port::PriceDataPort;
use crate::ports::indicator_store_port::IndicatorStorePort;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorCount {
    pub indicator: String,
    pub kind: IndicatorKind,
    pub period: u32,
    pub points: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerReport {
    pub ticker: String,
    pub bars: usize,
    pub indicators: Vec<IndicatorCount>,
}

impl TickerReport {
    pub fn total_points(&self) -> usize {
        self.indicators.iter().map(|c| c.points).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerFailure {
    pub ticker: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub as_of: NaiveDate,
    pub succeeded: Vec<TickerReport>,
    pub failed: Vec<TickerFailure>,
}

/// Computes every planned indicator over `days` ending at `as_of` and persists
/// each one as its own atomic batch.
pub fn calculate_for_ticker(
    data: &dyn PriceDataPort,
    store: &dyn IndicatorStorePort,
    ticker: &str,
    as_of: NaiveDate,
    days: i64,
    plan: &[IndicatorType],
) -> Result<TickerReport, MarketlensError> {
    let (start, end) = lookback(as_of, days);
    let series = data.fetch_series(ticker, start, end)?;
    if series.is_empty() {
        warn!(ticker, %start, %end, "no price data in window");
    }

    let mut indicators = Vec::with_capacity(plan.len());
    for indicator_type in plan {
        let computed = compute_indicator(&series, indicator_type);
        let points = persist_series(store, ticker, &computed)?;
        indicators.push(IndicatorCount {
            indicator: indicator_type.to_string(),
            kind: indicator_type.kind(),
            period: indicator_type.period() as u32,
            points,
        });
    }

    let report = TickerReport {
        ticker: ticker.to_string(),
        bars: series.len(),
        indicators,
    };
    info!(
        ticker,
        bars = report.bars,
        points = report.total_points(),
        "indicators saved"
    );
    Ok(report)
}

/// Runs [`calculate_for_ticker`] for every active instrument on a pool of
/// `workers` threads. A failing instrument is recorded and does not stop the others.
pub fn calculate_for_all(
    data: &dyn PriceDataPort,
    store: &dyn IndicatorStorePort,
    as_of: NaiveDate,
    days: i64,
    plan: &[IndicatorType],
    workers: usize,
) -> Result<BatchSummary, MarketlensError> {
    let tickers = data.list_tickers()?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| MarketlensError::InvalidArgument {
            reason: format!("cannot start {workers} workers: {e}"),
        })?;

    info!(tickers = tickers.len(), workers, %as_of, "starting indicator batch");
    let started = Instant::now();

    let results: Vec<(String, Result<TickerReport, MarketlensError>)> = pool.install(|| {
        tickers
            .par_iter()
            .map(|ticker| {
                let result = calculate_for_ticker(data, store, ticker, as_of, days, plan);
                (ticker.clone(), result)
            })
            .collect()
    });

    let mut succeeded = Vec::new();
    let mut failed = Vec::new();
    for (ticker, result) in results {
        match result {
            Ok(report) => succeeded.push(report),
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "indicator calculation failed");
                failed.push(TickerFailure {
                    ticker,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        succeeded = succeeded.len(),
        failed = failed.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "indicator batch finished"
    );

    Ok(BatchSummary {
        as_of,
        succeeded,
        failed,
    })
}
