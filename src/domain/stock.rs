//! Instrument reference data.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockProfile {
    pub ticker: String,
    pub company_name: String,
    pub sector: Option<String>,
    pub current_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub market_cap: Option<i64>,
    pub pe_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub is_active: bool,
}

impl StockProfile {
    /// A bare active profile with no quote or fundamentals.
    pub fn new(ticker: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            company_name: company_name.into(),
            sector: None,
            current_price: None,
            previous_close: None,
            market_cap: None,
            pe_ratio: None,
            dividend_yield: None,
            is_active: true,
        }
    }

    pub fn price_change(&self) -> Option<f64> {
        let (current, previous) = self.quote()?;
        Some(current - previous)
    }

    pub fn price_change_percent(&self) -> Option<f64> {
        let (current, previous) = self.quote()?;
        if previous <= 0.0 {
            return None;
        }
        Some((current - previous) / previous * 100.0)
    }

    /// Current and previous close, both present and non-zero.
    fn quote(&self) -> Option<(f64, f64)> {
        let current = self.current_price.filter(|p| *p != 0.0)?;
        let previous = self.previous_close.filter(|p| *p != 0.0)?;
        Some((current, previous))
    }
}
