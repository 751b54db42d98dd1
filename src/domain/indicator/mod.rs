//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `SeriesPoint`: A single date in an indicator time series, `None` while undefined
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorKind`: The stored indicator code (SMA, EMA, RSI, MACD, BB, STOCH, ADX, ATR)
//! - `IndicatorSeries`: A time series of indicator values aligned to the input bars

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod persist;
pub mod plan;
pub mod rolling;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use adx::calculate_adx;
pub use atr::calculate_atr;
pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stochastic::calculate_stochastic;

use crate::domain::error::MarketlensError;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Every windowed indicator needs at least this many bars to produce anything.
pub const MIN_BARS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: Option<IndicatorValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Stochastic {
        k: f64,
        d: Option<f64>,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

impl IndicatorValue {
    /// The first output of the indicator (stored as `value`).
    pub fn primary(&self) -> f64 {
        match self {
            IndicatorValue::Simple(v) => *v,
            IndicatorValue::Macd { line, .. } => *line,
            IndicatorValue::Stochastic { k, .. } => *k,
            IndicatorValue::Bollinger { upper, .. } => *upper,
        }
    }

    /// `(value, value2, value3)` in storage column order.
    pub fn components(&self) -> (f64, Option<f64>, Option<f64>) {
        match self {
            IndicatorValue::Simple(v) => (*v, None, None),
            IndicatorValue::Macd {
                line,
                signal,
                histogram,
            } => (*line, Some(*signal), Some(*histogram)),
            IndicatorValue::Stochastic { k, d } => (*k, *d, None),
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } => (*upper, Some(*middle), Some(*lower)),
        }
    }

    pub fn is_finite(&self) -> bool {
        let (a, b, c) = self.components();
        a.is_finite() && b.is_none_or(f64::is_finite) && c.is_none_or(f64::is_finite)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum IndicatorKind {
    #[serde(rename = "SMA")]
    Sma,
    #[serde(rename = "EMA")]
    Ema,
    #[serde(rename = "RSI")]
    Rsi,
    #[serde(rename = "MACD")]
    Macd,
    #[serde(rename = "BB")]
    Bollinger,
    #[serde(rename = "STOCH")]
    Stochastic,
    #[serde(rename = "ADX")]
    Adx,
    #[serde(rename = "ATR")]
    Atr,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 8] = [
        IndicatorKind::Sma,
        IndicatorKind::Ema,
        IndicatorKind::Rsi,
        IndicatorKind::Macd,
        IndicatorKind::Bollinger,
        IndicatorKind::Stochastic,
        IndicatorKind::Adx,
        IndicatorKind::Atr,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            IndicatorKind::Sma => "SMA",
            IndicatorKind::Ema => "EMA",
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::Macd => "MACD",
            IndicatorKind::Bollinger => "BB",
            IndicatorKind::Stochastic => "STOCH",
            IndicatorKind::Adx => "ADX",
            IndicatorKind::Atr => "ATR",
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for IndicatorKind {
    type Err = MarketlensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        IndicatorKind::ALL
            .into_iter()
            .find(|k| k.code() == code)
            .ok_or_else(|| MarketlensError::InvalidArgument {
                reason: format!("unknown indicator type: {}", s.trim()),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Adx(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

impl IndicatorType {
    pub fn kind(&self) -> IndicatorKind {
        match self {
            IndicatorType::Sma(_) => IndicatorKind::Sma,
            IndicatorType::Ema(_) => IndicatorKind::Ema,
            IndicatorType::Rsi(_) => IndicatorKind::Rsi,
            IndicatorType::Atr(_) => IndicatorKind::Atr,
            IndicatorType::Adx(_) => IndicatorKind::Adx,
            IndicatorType::Macd { .. } => IndicatorKind::Macd,
            IndicatorType::Stochastic { .. } => IndicatorKind::Stochastic,
            IndicatorType::Bollinger { .. } => IndicatorKind::Bollinger,
        }
    }

    /// The period stored alongside each point. MACD is keyed by its slow period.
    pub fn period(&self) -> usize {
        match self {
            IndicatorType::Sma(p)
            | IndicatorType::Ema(p)
            | IndicatorType::Rsi(p)
            | IndicatorType::Atr(p)
            | IndicatorType::Adx(p) => *p,
            IndicatorType::Macd { slow, .. } => *slow,
            IndicatorType::Stochastic { k_period, .. } => *k_period,
            IndicatorType::Bollinger { period, .. } => *period,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Stochastic { k_period, d_period } => {
                write!(f, "STOCH({},{})", k_period, d_period)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BB({},{})", period, mult)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub points: Vec<SeriesPoint>,
}

impl IndicatorSeries {
    /// One undefined point per input bar.
    pub(crate) fn undefined(indicator_type: IndicatorType, series: &PriceSeries) -> Self {
        Self {
            indicator_type,
            points: series
                .bars()
                .iter()
                .map(|b| SeriesPoint {
                    date: b.date,
                    value: None,
                })
                .collect(),
        }
    }

    /// Zips computed values onto the input dates. `values` must be aligned to the bars.
    pub(crate) fn from_values(
        indicator_type: IndicatorType,
        series: &PriceSeries,
        values: Vec<Option<IndicatorValue>>,
    ) -> Self {
        debug_assert_eq!(values.len(), series.len());
        Self {
            indicator_type,
            points: series
                .bars()
                .iter()
                .zip(values)
                .map(|(b, value)| SeriesPoint {
                    date: b.date,
                    value,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn defined_count(&self) -> usize {
        self.points.iter().filter(|p| p.value.is_some()).count()
    }

    /// Index of the first defined point, if any.
    pub fn first_defined(&self) -> Option<usize> {
        self.points.iter().position(|p| p.value.is_some())
    }

    pub fn value_at(&self, date: NaiveDate) -> Option<&IndicatorValue> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .and_then(|i| self.points[i].value.as_ref())
    }

    /// Primary values, `None` where undefined.
    pub fn primary_values(&self) -> Vec<Option<f64>> {
        self.points
            .iter()
            .map(|p| p.value.as_ref().map(IndicatorValue::primary))
            .collect()
    }

    pub fn latest(&self) -> Option<(NaiveDate, &IndicatorValue)> {
        self.points
            .iter()
            .rev()
            .find_map(|p| p.value.as_ref().map(|v| (p.date, v)))
    }
}
