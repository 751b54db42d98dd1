//! Indicator storage port trait.

use crate::domain::error::MarketlensError;
use crate::domain::indicator::IndicatorKind;
use crate::domain::indicator::persist::IndicatorPoint;
use chrono::NaiveDate;

pub trait IndicatorStorePort: Send + Sync {
    /// Insert-or-replace keyed by (ticker, kind, date, period). The whole slice is
    /// written atomically; on error nothing from it is visible.
    fn upsert_indicator_points(&self, points: &[IndicatorPoint]) -> Result<usize, MarketlensError>;

    fn fetch_indicator_points(
        &self,
        ticker: &str,
        kind: IndicatorKind,
        period: u32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<IndicatorPoint>, MarketlensError>;

    /// The point with the most recent date.
    fn latest_indicator(
        &self,
        ticker: &str,
        kind: IndicatorKind,
        period: u32,
    ) -> Result<Option<IndicatorPoint>, MarketlensError>;
}
