//! Average Directional Index.
//!
//! up = H[i] - H[i-1], down = L[i-1] - L[i]
//! +DM = up if up > down and up > 0, else 0 (and symmetrically for -DM); DM[0] = 0.
//! +DI = 100 * SMA(+DM, n) / ATR(n), 0 when ATR is 0.
//! DX = 100 * |+DI - -DI| / (+DI + -DI), 0 when both DIs are 0.
//! ADX = SMA(DX, n), first defined at index 2n-2.

use crate::domain::indicator::atr::true_ranges;
use crate::domain::indicator::rolling::{rolling_mean, rolling_mean_defined};
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue, MIN_BARS};
use crate::domain::price::PriceSeries;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_adx(series: &PriceSeries, period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Adx(period);
    if period == 0 || series.len() < MIN_BARS {
        return IndicatorSeries::undefined(indicator_type, series);
    }

    let bars = series.bars();
    let mut plus_dm = Vec::with_capacity(bars.len());
    let mut minus_dm = Vec::with_capacity(bars.len());
    plus_dm.push(0.0);
    minus_dm.push(0.0);
    for w in bars.windows(2) {
        let up = w[1].high - w[0].high;
        let down = w[0].low - w[1].low;
        plus_dm.push(if up > down && up > 0.0 { up } else { 0.0 });
        minus_dm.push(if down > up && down > 0.0 { down } else { 0.0 });
    }

    let atr = rolling_mean(&true_ranges(series), period);
    let plus_avg = rolling_mean(&plus_dm, period);
    let minus_avg = rolling_mean(&minus_dm, period);

    let dx: Vec<Option<f64>> = atr
        .iter()
        .zip(plus_avg.iter().zip(&minus_avg))
        .map(|(atr, (plus, minus))| {
            let (atr, plus, minus) = ((*atr)?, (*plus)?, (*minus)?);
            let plus_di = directional_index(plus, atr);
            let minus_di = directional_index(minus, atr);
            let sum = plus_di + minus_di;
            Some(if sum == 0.0 {
                0.0
            } else {
                100.0 * (plus_di - minus_di).abs() / sum
            })
        })
        .collect();

    let values = rolling_mean_defined(&dx, period)
        .into_iter()
        .map(|v| v.map(IndicatorValue::Simple))
        .collect();

    IndicatorSeries::from_values(indicator_type, series, values)
}

fn directional_index(avg_dm: f64, atr: f64) -> f64 {
    if atr == 0.0 { 0.0 } else { 100.0 * avg_dm / atr }
}
