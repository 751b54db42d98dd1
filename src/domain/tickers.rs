//! Ticker normalisation and comma-separated ticker lists.

use crate::domain::error::MarketlensError;
use std::collections::HashSet;

/// Trimmed, uppercased ticker, or `None` if it is empty or contains characters
/// other than ASCII alphanumerics, `.`, `-` and `^`.
pub fn normalize_ticker(raw: &str) -> Option<String> {
    let t = raw.trim();
    if t.is_empty()
        || !t
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^'))
    {
        return None;
    }
    Some(t.to_ascii_uppercase())
}

pub fn parse_tickers(input: &str) -> Result<Vec<String>, MarketlensError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(MarketlensError::InvalidArgument {
                reason: "empty token in ticker list".to_string(),
            });
        }
        let ticker = normalize_ticker(trimmed).ok_or_else(|| MarketlensError::InvalidArgument {
            reason: format!("invalid ticker: {trimmed}"),
        })?;
        if !seen.insert(ticker.clone()) {
            return Err(MarketlensError::InvalidArgument {
                reason: format!("duplicate ticker: {ticker}"),
            });
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}
