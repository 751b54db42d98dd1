//! Conversion of computed series into storable rows, and the idempotent write.

use crate::domain::error::MarketlensError;
use crate::domain::indicator::{IndicatorKind, IndicatorSeries};
use crate::ports::indicator_store_port::IndicatorStorePort;
use chrono::NaiveDate;
use serde::Serialize;

/// One stored indicator value. Unique per (ticker, kind, date, period).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorPoint {
    pub ticker: String,
    pub kind: IndicatorKind,
    pub date: NaiveDate,
    pub period: u32,
    pub value: f64,
    pub value2: Option<f64>,
    pub value3: Option<f64>,
}

impl IndicatorPoint {
    pub fn key(&self) -> (&str, IndicatorKind, NaiveDate, u32) {
        (&self.ticker, self.kind, self.date, self.period)
    }
}

/// Rows for every defined, finite point of the series.
pub fn to_indicator_points(ticker: &str, series: &IndicatorSeries) -> Vec<IndicatorPoint> {
    let kind = series.indicator_type.kind();
    let period = series.indicator_type.period() as u32;
    series
        .points
        .iter()
        .filter_map(|p| {
            let value = p.value.as_ref().filter(|v| v.is_finite())?;
            let (value, value2, value3) = value.components();
            Some(IndicatorPoint {
                ticker: ticker.to_string(),
                kind,
                date: p.date,
                period,
                value,
                value2,
                value3,
            })
        })
        .collect()
}

/// Upserts the defined points of `series` as one batch. Returns the number of rows written.
pub fn persist_series(
    store: &dyn IndicatorStorePort,
    ticker: &str,
    series: &IndicatorSeries,
) -> Result<usize, MarketlensError> {
    let points = to_indicator_points(ticker, series);
    if points.is_empty() {
        return Ok(0);
    }
    store.upsert_indicator_points(&points)
}
