//! Price alerts evaluated against an instrument profile.

use crate::domain::error::MarketlensError;
use crate::domain::stock::StockProfile;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    /// Current price at or above the threshold.
    Above,
    /// Current price at or below the threshold.
    Below,
    /// Daily percent change at or above the threshold.
    ChangeUp,
    /// Daily percent change at or below minus the threshold.
    ChangeDown,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertKind::Above => "ABOVE",
            AlertKind::Below => "BELOW",
            AlertKind::ChangeUp => "CHANGE_UP",
            AlertKind::ChangeDown => "CHANGE_DOWN",
        };
        f.write_str(s)
    }
}

impl FromStr for AlertKind {
    type Err = MarketlensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "ABOVE" => Ok(AlertKind::Above),
            "BELOW" => Ok(AlertKind::Below),
            "CHANGE_UP" => Ok(AlertKind::ChangeUp),
            "CHANGE_DOWN" => Ok(AlertKind::ChangeDown),
            other => Err(MarketlensError::InvalidArgument {
                reason: format!("unknown alert type: {other}"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    Active,
    Triggered,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceAlert {
    pub ticker: String,
    pub kind: AlertKind,
    pub threshold: f64,
    pub status: AlertStatus,
}

impl PriceAlert {
    pub fn new(ticker: impl Into<String>, kind: AlertKind, threshold: f64) -> Self {
        Self {
            ticker: ticker.into(),
            kind,
            threshold,
            status: AlertStatus::Active,
        }
    }

    /// Whether the alert condition holds for `stock`. Only active alerts on a
    /// quoted instrument can trigger.
    pub fn is_triggered(&self, stock: &StockProfile) -> bool {
        if self.status != AlertStatus::Active {
            return false;
        }
        let Some(price) = stock.current_price.filter(|p| *p != 0.0) else {
            return false;
        };
        match self.kind {
            AlertKind::Above => price >= self.threshold,
            AlertKind::Below => price <= self.threshold,
            AlertKind::ChangeUp => stock
                .price_change_percent()
                .is_some_and(|pct| pct >= self.threshold),
            AlertKind::ChangeDown => stock
                .price_change_percent()
                .is_some_and(|pct| pct <= -self.threshold),
        }
    }

    /// Evaluates the alert and moves it to `Triggered` when it fires.
    pub fn check(&mut self, stock: &StockProfile) -> bool {
        let fired = self.is_triggered(stock);
        if fired {
            self.status = AlertStatus::Triggered;
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(current: Option<f64>, previous: Option<f64>) -> StockProfile {
        StockProfile {
            current_price: current,
            previous_close: previous,
            ..StockProfile::new("AAPL", "Apple Inc.")
        }
    }

    #[test]
    fn above_and_below_thresholds_are_inclusive() {
        let s = stock(Some(150.0), Some(149.0));
        assert!(PriceAlert::new("AAPL", AlertKind::Above, 150.0).is_triggered(&s));
        assert!(PriceAlert::new("AAPL", AlertKind::Below, 150.0).is_triggered(&s));
        assert!(!PriceAlert::new("AAPL", AlertKind::Above, 150.01).is_triggered(&s));
    }

    #[test]
    fn change_alerts_use_daily_percent() {
        let up = stock(Some(105.0), Some(100.0));
        let down = stock(Some(95.0), Some(100.0));
        assert!(PriceAlert::new("AAPL", AlertKind::ChangeUp, 5.0).is_triggered(&up));
        assert!(!PriceAlert::new("AAPL", AlertKind::ChangeUp, 5.0).is_triggered(&down));
        assert!(PriceAlert::new("AAPL", AlertKind::ChangeDown, 5.0).is_triggered(&down));
        assert!(!PriceAlert::new("AAPL", AlertKind::ChangeDown, 6.0).is_triggered(&down));
    }

    #[test]
    fn unquoted_stock_never_triggers() {
        let s = stock(None, Some(100.0));
        assert!(!PriceAlert::new("AAPL", AlertKind::Below, 1_000.0).is_triggered(&s));
    }

    #[test]
    fn change_alert_without_previous_close_does_not_trigger() {
        let s = stock(Some(100.0), None);
        assert!(!PriceAlert::new("AAPL", AlertKind::ChangeUp, 0.0).is_triggered(&s));
    }

    #[test]
    fn check_moves_to_triggered_once() {
        let s = stock(Some(200.0), Some(190.0));
        let mut alert = PriceAlert::new("AAPL", AlertKind::Above, 180.0);
        assert!(alert.check(&s));
        assert_eq!(alert.status, AlertStatus::Triggered);
        assert!(!alert.check(&s));
    }

    #[test]
    fn disabled_alert_is_ignored() {
        let s = stock(Some(200.0), Some(190.0));
        let mut alert = PriceAlert::new("AAPL", AlertKind::Above, 180.0);
        alert.status = AlertStatus::Disabled;
        assert!(!alert.is_triggered(&s));
    }

    #[test]
    fn parse_alert_kind() {
        assert_eq!("change-up".parse::<AlertKind>().unwrap(), AlertKind::ChangeUp);
        assert_eq!("BELOW".parse::<AlertKind>().unwrap(), AlertKind::Below);
        assert!("sideways".parse::<AlertKind>().is_err());
    }
}
