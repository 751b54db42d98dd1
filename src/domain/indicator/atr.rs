//! Average True Range.
//!
//! TR[0] = High - Low; afterwards TR = max(H-L, |H-prevC|, |L-prevC|).
//! ATR = SMA(TR, n), so the first (n-1) bars are undefined.

use crate::domain::indicator::rolling::rolling_mean;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue, MIN_BARS};
use crate::domain::price::PriceSeries;

pub const DEFAULT_PERIOD: usize = 14;

/// True range per bar, aligned to the series.
pub fn true_ranges(series: &PriceSeries) -> Vec<f64> {
    let bars = series.bars();
    let mut out = Vec::with_capacity(bars.len());
    if let Some(first) = bars.first() {
        out.push(first.high - first.low);
    }
    for w in bars.windows(2) {
        out.push(w[1].true_range(w[0].close));
    }
    out
}

pub fn calculate_atr(series: &PriceSeries, period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Atr(period);
    if period == 0 || series.len() < MIN_BARS {
        return IndicatorSeries::undefined(indicator_type, series);
    }

    let values = rolling_mean(&true_ranges(series), period)
        .into_iter()
        .map(|v| v.map(IndicatorValue::Simple))
        .collect();

    IndicatorSeries::from_values(indicator_type, series, values)
}
