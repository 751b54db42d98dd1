//! Daily price bars and the ordered series built from them.

use crate::domain::error::MarketlensError;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: f64,
    pub volume: i64,
}

impl PriceBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Bars for one instrument, strictly increasing by date.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Builds a series from bars already sorted ascending by date.
    ///
    /// Returns `InvalidSeries` when two bars share a date or appear out of order.
    pub fn new(ticker: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, MarketlensError> {
        let ticker = ticker.into();
        if let Some(w) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
            let reason = if w[1].date == w[0].date {
                format!("duplicate bar for {}", w[1].date)
            } else {
                format!("bar for {} follows {}", w[1].date, w[0].date)
            };
            return Err(MarketlensError::InvalidSeries { ticker, reason });
        }
        Ok(Self { ticker, bars })
    }

    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            bars: Vec::new(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&PriceBar> {
        self.bars
            .binary_search_by_key(&date, |b| b.date)
            .ok()
            .map(|i| &self.bars[i])
    }

    /// Bars with `start <= date <= end`, as a new series.
    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        PriceSeries {
            ticker: self.ticker.clone(),
            bars: self
                .bars
                .iter()
                .filter(|b| b.date >= start && b.date <= end)
                .cloned()
                .collect(),
        }
    }
}
