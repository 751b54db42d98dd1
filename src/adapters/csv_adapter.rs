//! CSV price file adapter.
//!
//! One file per instrument, `<TICKER>.csv`, with the header
//! `date,open,high,low,close,adj_close,volume`. `adj_close` may be left
//! blank, in which case the close is used.
//!
//! Instrument reference data comes from a separate profiles file with the
//! header `ticker,company_name,sector,current_price,previous_close,market_cap,
//! pe_ratio,dividend_yield,is_active`; every column after `company_name` is optional.

use crate::domain::error::MarketlensError;
use crate::domain::price::{PriceBar, PriceSeries};
use crate::domain::stock::StockProfile;
use crate::domain::tickers::normalize_ticker;
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    adj_close: Option<f64>,
    volume: i64,
}

impl CsvRow {
    fn into_bar(self) -> Result<PriceBar, String> {
        let adjusted_close = self.adj_close.unwrap_or(self.close);
        for (name, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("adj_close", adjusted_close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{}: {name} must be positive, got {value}", self.date));
            }
        }
        if self.volume < 0 {
            return Err(format!("{}: negative volume {}", self.date, self.volume));
        }
        Ok(PriceBar {
            date: self.date,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            adjusted_close,
            volume: self.volume,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    ticker: String,
    company_name: String,
    #[serde(default)]
    sector: Option<String>,
    #[serde(default)]
    current_price: Option<f64>,
    #[serde(default)]
    previous_close: Option<f64>,
    #[serde(default)]
    market_cap: Option<i64>,
    #[serde(default)]
    pe_ratio: Option<f64>,
    #[serde(default)]
    dividend_yield: Option<f64>,
    #[serde(default)]
    is_active: Option<bool>,
}

/// Reads instrument profiles, normalising tickers.
pub fn read_profiles(path: &Path) -> Result<Vec<StockProfile>, MarketlensError> {
    let content = fs::read_to_string(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut profiles = Vec::new();
    for row in rdr.deserialize::<ProfileRow>() {
        let row = row.map_err(|e| MarketlensError::InvalidArgument {
            reason: format!("{}: {e}", path.display()),
        })?;
        let ticker =
            normalize_ticker(&row.ticker).ok_or_else(|| MarketlensError::InvalidArgument {
                reason: format!("{}: invalid ticker '{}'", path.display(), row.ticker),
            })?;
        profiles.push(StockProfile {
            ticker,
            company_name: row.company_name,
            sector: row.sector.filter(|s| !s.is_empty()),
            current_price: row.current_price,
            previous_close: row.previous_close,
            market_cap: row.market_cap,
            pe_ratio: row.pe_ratio,
            dividend_yield: row.dividend_yield,
            is_active: row.is_active.unwrap_or(true),
        });
    }
    Ok(profiles)
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{ticker}.csv"))
    }

    /// Every bar in the instrument's file, sorted by date.
    pub fn read_series(&self, ticker: &str) -> Result<PriceSeries, MarketlensError> {
        let path = self.csv_path(ticker);
        if !path.is_file() {
            return Err(MarketlensError::NotFound {
                ticker: ticker.to_string(),
            });
        }
        let content = fs::read_to_string(&path)?;
        let invalid = |reason: String| MarketlensError::InvalidSeries {
            ticker: ticker.to_string(),
            reason,
        };

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();
        for row in rdr.deserialize::<CsvRow>() {
            let row = row.map_err(|e| invalid(format!("{}: {e}", path.display())))?;
            bars.push(row.into_bar().map_err(invalid)?);
        }

        bars.sort_by_key(|b| b.date);
        PriceSeries::new(ticker, bars)
    }
}

impl PriceDataPort for CsvAdapter {
    fn fetch_series(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, MarketlensError> {
        Ok(self.read_series(ticker)?.window(start_date, end_date))
    }

    fn list_tickers(&self) -> Result<Vec<String>, MarketlensError> {
        let mut tickers = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    tickers.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        tickers.sort();
        Ok(tickers)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MarketlensError> {
        let series = match self.read_series(ticker) {
            Ok(s) => s,
            Err(MarketlensError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(match (series.first(), series.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, series.len())),
            _ => None,
        })
    }
}
