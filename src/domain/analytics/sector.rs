//! Price performance and comparison against sector peers.

use crate::domain::analytics::lookback;
use crate::domain::error::MarketlensError;
use crate::domain::price::PriceSeries;
use crate::domain::stats::mean;
use crate::domain::stock::StockProfile;
use crate::ports::data_port::PriceDataPort;
use crate::ports::stock_port::StockInfoPort;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

pub const PERFORMANCE_WINDOW_DAYS: i64 = 30;

/// Percent change from the first to the last close; `None` with fewer than two bars.
pub fn price_performance(series: &PriceSeries) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    let first = series.first()?.close;
    let last = series.last()?.close;
    if first == 0.0 {
        return None;
    }
    Some((last - first) / first * 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorComparison {
    pub ticker: String,
    pub sector: String,
    pub peer_count: usize,
    /// P/E minus the mean peer P/E.
    pub pe_vs_sector: Option<f64>,
    /// +1 when larger than the mean peer market cap, -1 otherwise.
    pub size_vs_sector: Option<i8>,
    /// Performance minus mean peer performance, in percentage points.
    pub performance_vs_sector: Option<f64>,
}

/// Compares `stock` against `peers`, each paired with its performance over the
/// same window.
pub fn compare_to_sector(
    stock: &StockProfile,
    sector: &str,
    performance: Option<f64>,
    peers: &[(StockProfile, Option<f64>)],
) -> SectorComparison {
    let peer_pes: Vec<f64> = peers.iter().filter_map(|(p, _)| p.pe_ratio).collect();
    let pe_vs_sector = match (stock.pe_ratio, mean(&peer_pes)) {
        (Some(pe), Some(avg)) if pe != 0.0 && avg != 0.0 => Some(pe - avg),
        _ => None,
    };

    let peer_caps: Vec<f64> = peers
        .iter()
        .filter_map(|(p, _)| p.market_cap.map(|mc| mc as f64))
        .collect();
    let size_vs_sector = match (stock.market_cap, mean(&peer_caps)) {
        (Some(mc), Some(avg)) if mc != 0 && avg != 0.0 => {
            Some(if mc as f64 > avg { 1 } else { -1 })
        }
        _ => None,
    };

    let peer_perf: Vec<f64> = peers.iter().filter_map(|(_, perf)| *perf).collect();
    let performance_vs_sector = match (performance, mean(&peer_perf)) {
        (Some(perf), Some(avg)) => Some(perf - avg),
        _ => None,
    };

    SectorComparison {
        ticker: stock.ticker.clone(),
        sector: sector.to_string(),
        peer_count: peers.len(),
        pe_vs_sector,
        size_vs_sector,
        performance_vs_sector,
    }
}

/// Sector comparison over the 30 days ending at `as_of`. `Ok(None)` when the
/// instrument has no sector.
pub fn sector_comparison(
    data: &dyn PriceDataPort,
    stocks: &dyn StockInfoPort,
    ticker: &str,
    as_of: NaiveDate,
) -> Result<Option<SectorComparison>, MarketlensError> {
    let stock = stocks.stock_profile(ticker)?;
    let Some(sector) = stock.sector.clone().filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let (start, end) = lookback(as_of, PERFORMANCE_WINDOW_DAYS);
    let performance = price_performance(&data.fetch_series(ticker, start, end)?);

    let mut peers = Vec::new();
    for peer in stocks.sector_peers(&sector, ticker)? {
        let perf = match data.fetch_series(&peer.ticker, start, end) {
            Ok(series) => price_performance(&series),
            Err(MarketlensError::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };
        debug!(peer = %peer.ticker, performance = ?perf, "peer performance");
        peers.push((peer, perf));
    }

    Ok(Some(compare_to_sector(&stock, &sector, performance, &peers)))
}
