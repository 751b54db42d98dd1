//! Rule-table fundamental scoring.
//!
//! | input          | condition | score | label          |
//! |----------------|-----------|-------|----------------|
//! | P/E            | < 15      | +2    | Undervalued    |
//! | P/E            | < 25      | +1    | Fairly Valued  |
//! | P/E            | otherwise | -1    | Overvalued     |
//! | dividend yield | > 4       | +1    | High Yield     |
//! | dividend yield | > 2       | 0     | Moderate Yield |
//! | dividend yield | otherwise | 0     | Low Yield      |
//! | latest RSI     | < 30      | +1    | Oversold       |
//! | latest RSI     | > 70      | -1    | Overbought     |
//! | latest RSI     | otherwise | 0     | Neutral        |
//!
//! Score >= 2 is BUY, <= -2 is SELL, anything else HOLD. Missing inputs (and
//! zero P/E, yield or market cap) contribute nothing.

use crate::domain::error::MarketlensError;
use crate::domain::indicator::{IndicatorKind, rsi};
use crate::domain::stock::StockProfile;
use crate::ports::indicator_store_port::IndicatorStorePort;
use crate::ports::stock_port::StockInfoPort;
use serde::Serialize;

const LARGE_CAP: i64 = 10_000_000_000;
const MID_CAP: i64 = 2_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Buy,
    Hold,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PeRating {
    Undervalued,
    #[serde(rename = "Fairly Valued")]
    FairlyValued,
    Overvalued,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SizeClass {
    #[serde(rename = "Large Cap")]
    LargeCap,
    #[serde(rename = "Mid Cap")]
    MidCap,
    #[serde(rename = "Small Cap")]
    SmallCap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DividendRating {
    #[serde(rename = "High Yield")]
    HighYield,
    #[serde(rename = "Moderate Yield")]
    ModerateYield,
    #[serde(rename = "Low Yield")]
    LowYield,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TechnicalSignal {
    Oversold,
    Overbought,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundamentalAnalysis {
    pub ticker: String,
    pub pe_rating: Option<PeRating>,
    pub size: Option<SizeClass>,
    pub dividend_rating: Option<DividendRating>,
    pub technical_signal: Option<TechnicalSignal>,
    pub latest_rsi: Option<f64>,
    pub score: i32,
    pub recommendation: Recommendation,
}

pub fn fundamental_score(stock: &StockProfile, latest_rsi: Option<f64>) -> FundamentalAnalysis {
    let mut score = 0;

    let pe_rating = stock.pe_ratio.filter(|pe| *pe != 0.0).map(|pe| {
        if pe < 15.0 {
            score += 2;
            PeRating::Undervalued
        } else if pe < 25.0 {
            score += 1;
            PeRating::FairlyValued
        } else {
            score -= 1;
            PeRating::Overvalued
        }
    });

    let size = stock.market_cap.filter(|mc| *mc != 0).map(|mc| {
        if mc > LARGE_CAP {
            SizeClass::LargeCap
        } else if mc > MID_CAP {
            SizeClass::MidCap
        } else {
            SizeClass::SmallCap
        }
    });

    let dividend_rating = stock.dividend_yield.filter(|y| *y != 0.0).map(|y| {
        if y > 4.0 {
            score += 1;
            DividendRating::HighYield
        } else if y > 2.0 {
            DividendRating::ModerateYield
        } else {
            DividendRating::LowYield
        }
    });

    let technical_signal = latest_rsi.map(|rsi| {
        if rsi < 30.0 {
            score += 1;
            TechnicalSignal::Oversold
        } else if rsi > 70.0 {
            score -= 1;
            TechnicalSignal::Overbought
        } else {
            TechnicalSignal::Neutral
        }
    });

    let recommendation = if score >= 2 {
        Recommendation::Buy
    } else if score <= -2 {
        Recommendation::Sell
    } else {
        Recommendation::Hold
    };

    FundamentalAnalysis {
        ticker: stock.ticker.clone(),
        pe_rating,
        size,
        dividend_rating,
        technical_signal,
        latest_rsi,
        score,
        recommendation,
    }
}

/// Scores `ticker` using its stored profile and most recent RSI(14).
pub fn fundamental_analysis(
    stocks: &dyn StockInfoPort,
    store: &dyn IndicatorStorePort,
    ticker: &str,
) -> Result<FundamentalAnalysis, MarketlensError> {
    let stock = stocks.stock_profile(ticker)?;
    let latest_rsi = store
        .latest_indicator(ticker, IndicatorKind::Rsi, rsi::DEFAULT_PERIOD as u32)?
        .map(|p| p.value);
    Ok(fundamental_score(&stock, latest_rsi))
}
