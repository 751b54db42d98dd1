//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! All three EMAs are seeded on the first value, so every bar is defined.

use crate::domain::indicator::rolling::ema;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue, MIN_BARS};
use crate::domain::price::PriceSeries;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    series: &PriceSeries,
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    if series.len() < MIN_BARS || fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries::undefined(indicator_type, series);
    }

    let closes = series.closes();
    let ema_fast = ema(&closes, fast);
    let ema_slow = ema(&closes, slow);
    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&macd_line, signal_period);

    let values = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(&line, &signal)| {
            Some(IndicatorValue::Macd {
                line,
                signal,
                histogram: line - signal,
            })
        })
        .collect();

    IndicatorSeries::from_values(indicator_type, series, values)
}

pub fn calculate_macd_default(series: &PriceSeries) -> IndicatorSeries {
    calculate_macd(series, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::calculate_ema;
    use crate::domain::price::PriceBar;
    use chrono::NaiveDate;

    fn make_series(prices: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start + chrono::Duration::days(i as i64),
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

    fn trending(n: usize) -> PriceSeries {
        let prices: Vec<f64> = (0..n)
            .map(|i| 100.0 + i as f64 + (i as f64 * 0.7).sin() * 3.0)
            .collect();
        make_series(&prices)
    }

    #[test]
    fn macd_defined_everywhere() {
        let out = calculate_macd_default(&trending(40));
        assert_eq!(out.defined_count(), 40);
    }

    #[test]
    fn macd_histogram_equals_line_minus_signal() {
        let out = calculate_macd_default(&trending(60));
        for point in &out.points {
            if let Some(IndicatorValue::Macd {
                line,
                signal,
                histogram,
            }) = point.value
            {
                assert!((histogram - (line - signal)).abs() < 1e-12);
            } else {
                panic!("expected MACD value");
            }
        }
    }

    #[test]
    fn macd_line_is_ema_fast_minus_ema_slow() {
        let series = make_series(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0]);
        let out = calculate_macd(&series, 3, 5, 2);
        let fast = calculate_ema(&series, 3).primary_values();
        let slow = calculate_ema(&series, 5).primary_values();

        for (i, point) in out.points.iter().enumerate() {
            if let Some(IndicatorValue::Macd { line, .. }) = point.value {
                let expected = fast[i].unwrap() - slow[i].unwrap();
                assert!((line - expected).abs() < 1e-12, "line mismatch at {i}");
            }
        }
    }

    #[test]
    fn macd_first_bar_is_zero() {
        let out = calculate_macd_default(&trending(10));
        match out.points[0].value {
            Some(IndicatorValue::Macd {
                line,
                signal,
                histogram,
            }) => {
                assert_eq!(line, 0.0);
                assert_eq!(signal, 0.0);
                assert_eq!(histogram, 0.0);
            }
            ref other => panic!("expected MACD value, got {other:?}"),
        }
    }

    #[test]
    fn macd_zero_period() {
        let series = make_series(&[100.0, 101.0, 102.0]);
        assert_eq!(calculate_macd(&series, 0, 26, 9).defined_count(), 0);
        assert_eq!(calculate_macd(&series, 12, 0, 9).defined_count(), 0);
        assert_eq!(calculate_macd(&series, 12, 26, 0).defined_count(), 0);
    }

    #[test]
    fn macd_indicator_type() {
        let out = calculate_macd(&make_series(&[1.0, 2.0]), 5, 10, 3);
        assert_eq!(
            out.indicator_type,
            IndicatorType::Macd {
                fast: 5,
                slow: 10,
                signal: 3
            }
        );
    }
}
