//! RSI (Relative Strength Index) indicator.
//!
//! Uses simple trailing means of gains and losses over n price changes:
//! - change[0] = 0 (the first bar has no prior close)
//! - change[i] = C[i] - C[i-1]
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100 (this includes a completely flat window).
//!
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::rolling::rolling_mean;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue, MIN_BARS};
use crate::domain::price::PriceSeries;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_rsi(series: &PriceSeries, period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Rsi(period);
    if period == 0 || series.len() < MIN_BARS {
        return IndicatorSeries::undefined(indicator_type, series);
    }

    let closes = series.closes();
    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    gains.push(0.0);
    losses.push(0.0);
    for w in closes.windows(2) {
        let change = w[1] - w[0];
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let values = rolling_mean(&gains, period)
        .into_iter()
        .zip(rolling_mean(&losses, period))
        .map(|(gain, loss)| match (gain, loss) {
            (Some(g), Some(l)) => Some(IndicatorValue::Simple(rsi_from_averages(g, l))),
            _ => None,
        })
        .collect();

    IndicatorSeries::from_values(indicator_type, series, values)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
