//! The set of indicators computed per instrument and dispatch to their calculators.

use crate::domain::indicator::{
    IndicatorKind, IndicatorSeries, IndicatorType, adx, atr, bollinger, calculate_adx,
    calculate_atr, calculate_bollinger, calculate_ema, calculate_macd, calculate_rsi,
    calculate_sma, calculate_stochastic, macd, rsi, stochastic,
};
use crate::domain::price::PriceSeries;

/// SMA 20/50/200, EMA 12/26, RSI 14, MACD(12,26,9), BB(20,2), STOCH(14,3), ADX 14, ATR 14.
pub fn default_plan() -> Vec<IndicatorType> {
    vec![
        IndicatorType::Sma(20),
        IndicatorType::Sma(50),
        IndicatorType::Sma(200),
        IndicatorType::Ema(12),
        IndicatorType::Ema(26),
        IndicatorType::Rsi(rsi::DEFAULT_PERIOD),
        IndicatorType::Macd {
            fast: macd::DEFAULT_FAST,
            slow: macd::DEFAULT_SLOW,
            signal: macd::DEFAULT_SIGNAL,
        },
        IndicatorType::Bollinger {
            period: bollinger::DEFAULT_PERIOD,
            stddev_mult_x100: bollinger::DEFAULT_STDDEV_MULT_X100,
        },
        IndicatorType::Stochastic {
            k_period: stochastic::DEFAULT_K_PERIOD,
            d_period: stochastic::DEFAULT_D_PERIOD,
        },
        IndicatorType::Adx(adx::DEFAULT_PERIOD),
        IndicatorType::Atr(atr::DEFAULT_PERIOD),
    ]
}

/// Keeps only the entries whose kind is listed. An empty filter keeps everything.
pub fn filter_plan(plan: Vec<IndicatorType>, kinds: &[IndicatorKind]) -> Vec<IndicatorType> {
    if kinds.is_empty() {
        return plan;
    }
    plan.into_iter()
        .filter(|t| kinds.contains(&t.kind()))
        .collect()
}

pub fn compute_indicator(series: &PriceSeries, indicator_type: &IndicatorType) -> IndicatorSeries {
    match *indicator_type {
        IndicatorType::Sma(period) => calculate_sma(series, period),
        IndicatorType::Ema(period) => calculate_ema(series, period),
        IndicatorType::Rsi(period) => calculate_rsi(series, period),
        IndicatorType::Atr(period) => calculate_atr(series, period),
        IndicatorType::Adx(period) => calculate_adx(series, period),
        IndicatorType::Macd { fast, slow, signal } => calculate_macd(series, fast, slow, signal),
        IndicatorType::Stochastic { k_period, d_period } => {
            calculate_stochastic(series, k_period, d_period)
        }
        IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        } => calculate_bollinger(series, period, stddev_mult_x100),
    }
}
