//! Price data access port trait.

use crate::domain::error::MarketlensError;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;

pub trait PriceDataPort: Send + Sync {
    /// Bars for `ticker` with `start_date <= date <= end_date`, ascending.
    /// Fails with `NotFound` when the instrument is unknown.
    fn fetch_series(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, MarketlensError>;

    /// Tickers of all active instruments, sorted.
    fn list_tickers(&self) -> Result<Vec<String>, MarketlensError>;

    /// First date, last date and bar count, or `None` when no bars are stored.
    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MarketlensError>;
}
