//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! No warmup: defined for every bar once the series has at least two bars.

use crate::domain::indicator::rolling::ema;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue, MIN_BARS};
use crate::domain::price::PriceSeries;

pub fn calculate_ema(series: &PriceSeries, period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Ema(period);
    if period == 0 || series.len() < MIN_BARS {
        return IndicatorSeries::undefined(indicator_type, series);
    }

    let values = ema(&series.closes(), period)
        .into_iter()
        .map(|v| Some(IndicatorValue::Simple(v)))
        .collect();

    IndicatorSeries::from_values(indicator_type, series, values)
}
