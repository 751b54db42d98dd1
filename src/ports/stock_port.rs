//! Instrument profile port trait.

use crate::domain::error::MarketlensError;
use crate::domain::stock::StockProfile;

pub trait StockInfoPort: Send + Sync {
    /// Fails with `NotFound` when the instrument is unknown.
    fn stock_profile(&self, ticker: &str) -> Result<StockProfile, MarketlensError>;

    /// Active instruments in `sector`, excluding `ticker`.
    fn sector_peers(&self, sector: &str, ticker: &str)
    -> Result<Vec<StockProfile>, MarketlensError>;
}
