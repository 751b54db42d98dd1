//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are undefined.

use crate::domain::indicator::rolling::{rolling_mean, rolling_population_std};
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue, MIN_BARS};
use crate::domain::price::PriceSeries;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_STDDEV_MULT_X100: u32 = 200;

pub fn calculate_bollinger(
    series: &PriceSeries,
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Bollinger {
        period,
        stddev_mult_x100,
    };
    if period == 0 || series.len() < MIN_BARS {
        return IndicatorSeries::undefined(indicator_type, series);
    }

    let mult = stddev_mult_x100 as f64 / 100.0;
    let closes = series.closes();

    let values = rolling_mean(&closes, period)
        .into_iter()
        .zip(rolling_population_std(&closes, period))
        .map(|(middle, stddev)| match (middle, stddev) {
            (Some(middle), Some(stddev)) => Some(IndicatorValue::Bollinger {
                upper: middle + mult * stddev,
                middle,
                lower: middle - mult * stddev,
            }),
            _ => None,
        })
        .collect();

    IndicatorSeries::from_values(indicator_type, series, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PriceBar;
    use chrono::NaiveDate;

    fn make_series(prices: &[f64]) -> PriceSeries {
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                adjusted_close: close,
                volume: 1000,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    fn bands(series: &IndicatorSeries, i: usize) -> (f64, f64, f64) {
        match series.points[i].value {
            Some(IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            }) => (upper, middle, lower),
            ref other => panic!("expected Bollinger value at {i}, got {other:?}"),
        }
    }

    #[test]
    fn bollinger_warmup() {
        let out = calculate_bollinger(&make_series(&[10.0, 20.0, 30.0, 40.0, 50.0]), 3, 200);
        assert!(out.points[0].value.is_none());
        assert!(out.points[1].value.is_none());
        assert_eq!(out.defined_count(), 3);
    }

    #[test]
    fn bollinger_constant_values() {
        let out = calculate_bollinger(&make_series(&[100.0; 5]), 3, 200);
        let (upper, middle, lower) = bands(&out, 2);
        assert!((middle - 100.0).abs() < f64::EPSILON);
        assert!((upper - 100.0).abs() < f64::EPSILON);
        assert!((lower - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bollinger_basic_calculation() {
        let out = calculate_bollinger(&make_series(&[10.0, 20.0, 30.0]), 3, 200);
        let (upper, middle, lower) = bands(&out, 2);

        let stddev = (200.0_f64 / 3.0).sqrt();
        assert!((middle - 20.0).abs() < 1e-10);
        assert!((upper - (20.0 + 2.0 * stddev)).abs() < 1e-10);
        assert!((lower - (20.0 - 2.0 * stddev)).abs() < 1e-10);
    }

    #[test]
    fn bollinger_multiplier_variations() {
        let out = calculate_bollinger(&make_series(&[10.0, 20.0, 30.0]), 3, 150);
        let (upper, middle, _) = bands(&out, 2);
        let stddev = (200.0_f64 / 3.0).sqrt();
        assert!((upper - middle - 1.5 * stddev).abs() < 1e-10);
    }

    #[test]
    fn bollinger_symmetry() {
        let out = calculate_bollinger(&make_series(&[10.0, 12.0, 9.0, 14.0, 13.0]), 3, 200);
        for i in 2..5 {
            let (upper, middle, lower) = bands(&out, i);
            assert!(((upper - middle) - (middle - lower)).abs() < 1e-10);
        }
    }

    #[test]
    fn bollinger_indicator_type() {
        let out = calculate_bollinger(&make_series(&[10.0, 20.0]), 20, 200);
        assert_eq!(
            out.indicator_type,
            IndicatorType::Bollinger {
                period: 20,
                stddev_mult_x100: 200
            }
        );
        assert_eq!(out.defined_count(), 0);
    }
}
