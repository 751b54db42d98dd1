#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use marketlens::domain::error::MarketlensError;
use marketlens::domain::indicator::IndicatorKind;
use marketlens::domain::indicator::persist::IndicatorPoint;
pub use marketlens::domain::price::{PriceBar, PriceSeries};
use marketlens::domain::stock::StockProfile;
use marketlens::ports::data_port::PriceDataPort;
use marketlens::ports::indicator_store_port::IndicatorStorePort;
use marketlens::ports::stock_port::StockInfoPort;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn make_bar(date: NaiveDate, close: f64) -> PriceBar {
    PriceBar {
        date,
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        adjusted_close: close,
        volume: 10_000,
    }
}

/// Consecutive daily bars starting at `start`.
pub fn bars_from_closes(start: NaiveDate, closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(start + Duration::days(i as i64), c))
        .collect()
}

pub fn make_series(ticker: &str, start: NaiveDate, closes: &[f64]) -> PriceSeries {
    PriceSeries::new(ticker, bars_from_closes(start, closes)).unwrap()
}

/// A deterministic zig-zag path around an upward drift.
pub fn wavy_closes(n: usize, base: f64, amplitude: f64) -> Vec<f64> {
    (0..n)
        .map(|i| base + i as f64 * 0.3 + amplitude * ((i as f64) * 0.7).sin())
        .collect()
}

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl PriceDataPort for MockDataPort {
    fn fetch_series(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, MarketlensError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(MarketlensError::Database {
                reason: reason.clone(),
            });
        }
        let bars = self.data.get(ticker).ok_or_else(|| MarketlensError::NotFound {
            ticker: ticker.to_string(),
        })?;
        let bars = bars
            .iter()
            .filter(|b| b.date >= start_date && b.date <= end_date)
            .cloned()
            .collect();
        PriceSeries::new(ticker, bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, MarketlensError> {
        let mut tickers: Vec<String> = self
            .data
            .keys()
            .chain(self.errors.keys())
            .cloned()
            .collect();
        tickers.sort();
        tickers.dedup();
        Ok(tickers)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MarketlensError> {
        match self.data.get(ticker) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub struct MockStockPort {
    pub profiles: Vec<StockProfile>,
}

impl MockStockPort {
    pub fn new(profiles: Vec<StockProfile>) -> Self {
        Self { profiles }
    }
}

impl StockInfoPort for MockStockPort {
    fn stock_profile(&self, ticker: &str) -> Result<StockProfile, MarketlensError> {
        self.profiles
            .iter()
            .find(|p| p.ticker == ticker)
            .cloned()
            .ok_or_else(|| MarketlensError::NotFound {
                ticker: ticker.to_string(),
            })
    }

    fn sector_peers(
        &self,
        sector: &str,
        ticker: &str,
    ) -> Result<Vec<StockProfile>, MarketlensError> {
        Ok(self
            .profiles
            .iter()
            .filter(|p| p.is_active && p.ticker != ticker && p.sector.as_deref() == Some(sector))
            .cloned()
            .collect())
    }
}

type PointKey = (String, IndicatorKind, NaiveDate, u32);

/// Indicator store keyed like the database primary key.
pub struct MemoryIndicatorStore {
    pub points: Mutex<BTreeMap<PointKey, IndicatorPoint>>,
    pub batches: Mutex<usize>,
}

impl MemoryIndicatorStore {
    pub fn new() -> Self {
        Self {
            points: Mutex::new(BTreeMap::new()),
            batches: Mutex::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.points.lock().unwrap().len()
    }

    pub fn batch_count(&self) -> usize {
        *self.batches.lock().unwrap()
    }

    pub fn count_for(&self, ticker: &str, kind: IndicatorKind) -> usize {
        self.points
            .lock()
            .unwrap()
            .keys()
            .filter(|(t, k, _, _)| t == ticker && *k == kind)
            .count()
    }
}

impl IndicatorStorePort for MemoryIndicatorStore {
    fn upsert_indicator_points(&self, points: &[IndicatorPoint]) -> Result<usize, MarketlensError> {
        let mut map = self.points.lock().unwrap();
        for p in points {
            let (ticker, kind, date, period) = p.key();
            map.insert((ticker.to_string(), kind, date, period), p.clone());
        }
        *self.batches.lock().unwrap() += 1;
        Ok(points.len())
    }

    fn fetch_indicator_points(
        &self,
        ticker: &str,
        kind: IndicatorKind,
        period: u32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<IndicatorPoint>, MarketlensError> {
        Ok(self
            .points
            .lock()
            .unwrap()
            .values()
            .filter(|p| {
                p.ticker == ticker
                    && p.kind == kind
                    && p.period == period
                    && p.date >= start_date
                    && p.date <= end_date
            })
            .cloned()
            .collect())
    }

    fn latest_indicator(
        &self,
        ticker: &str,
        kind: IndicatorKind,
        period: u32,
    ) -> Result<Option<IndicatorPoint>, MarketlensError> {
        Ok(self
            .points
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.ticker == ticker && p.kind == kind && p.period == period)
            .max_by_key(|p| p.date)
            .cloned())
    }
}

pub fn profile(ticker: &str, sector: Option<&str>) -> StockProfile {
    StockProfile {
        sector: sector.map(str::to_string),
        ..StockProfile::new(ticker, ticker)
    }
}
