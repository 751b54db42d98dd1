//! Stochastic oscillator.
//!
//! %K = 100 * (C - LowestLow(n)) / (HighestHigh(n) - LowestLow(n))
//! %D = SMA(%K, 3)
//!
//! %K is undefined when the window has zero range. A point is defined whenever %K is;
//! %D stays `None` until three consecutive %K values exist.

use crate::domain::indicator::rolling::{rolling_max, rolling_mean_defined, rolling_min};
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue, MIN_BARS};
use crate::domain::price::PriceSeries;

pub const DEFAULT_K_PERIOD: usize = 14;
pub const DEFAULT_D_PERIOD: usize = 3;

pub fn calculate_stochastic(
    series: &PriceSeries,
    k_period: usize,
    d_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Stochastic { k_period, d_period };
    if k_period == 0 || d_period == 0 || series.len() < MIN_BARS {
        return IndicatorSeries::undefined(indicator_type, series);
    }

    let lowest = rolling_min(&series.lows(), k_period);
    let highest = rolling_max(&series.highs(), k_period);

    let k: Vec<Option<f64>> = series
        .bars()
        .iter()
        .zip(lowest.iter().zip(&highest))
        .map(|(bar, (low, high))| match (low, high) {
            (Some(low), Some(high)) if high > low => {
                Some(100.0 * (bar.close - low) / (high - low))
            }
            _ => None,
        })
        .collect();
    let d = rolling_mean_defined(&k, d_period);

    let values = k
        .into_iter()
        .zip(d)
        .map(|(k, d)| k.map(|k| IndicatorValue::Stochastic { k, d }))
        .collect();

    IndicatorSeries::from_values(indicator_type, series, values)
}
