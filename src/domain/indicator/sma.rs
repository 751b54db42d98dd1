//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]).
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::rolling::rolling_mean;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue, MIN_BARS};
use crate::domain::price::PriceSeries;

pub fn calculate_sma(series: &PriceSeries, period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Sma(period);
    if period == 0 || series.len() < MIN_BARS {
        return IndicatorSeries::undefined(indicator_type, series);
    }

    let values = rolling_mean(&series.closes(), period)
        .into_iter()
        .map(|v| v.map(IndicatorValue::Simple))
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

    #[test]
    fn sma_three_period_known_values() {
        let series = make_series(&[100.0, 102.0, 101.0, 105.0, 107.0]);
        let sma = calculate_sma(&series, 3);

        assert_eq!(sma.len(), 5);
        assert!(sma.points[0].value.is_none());
        assert!(sma.points[1].value.is_none());

        let expected = [101.0, 308.0 / 3.0, 313.0 / 3.0];
        for (i, e) in expected.iter().enumerate() {
            match sma.points[i + 2].value {
                Some(IndicatorValue::Simple(v)) => assert!((v - e).abs() < 1e-9),
                ref other => panic!("expected Simple at {}, got {:?}", i + 2, other),
            }
        }
    }

    #[test]
    fn sma_period_longer_than_series() {
        let series = make_series(&[1.0, 2.0, 3.0]);
        let sma = calculate_sma(&series, 5);
        assert_eq!(sma.len(), 3);
        assert_eq!(sma.defined_count(), 0);
    }

    #[test]
    fn sma_single_bar_is_undefined() {
        let series = make_series(&[1.0]);
        let sma = calculate_sma(&series, 1);
        assert_eq!(sma.len(), 1);
        assert_eq!(sma.defined_count(), 0);
    }

    #[test]
    fn sma_zero_period() {
        let series = make_series(&[1.0, 2.0]);
        assert_eq!(calculate_sma(&series, 0).defined_count(), 0);
    }

    #[test]
    fn sma_indicator_type() {
        let series = make_series(&[1.0, 2.0]);
        assert_eq!(calculate_sma(&series, 20).indicator_type, IndicatorType::Sma(20));
    }
}
