//! Core domain types and logic.

pub mod alert;
pub mod analytics;
pub mod batch;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod price;
pub mod returns;
pub mod stats;
pub mod stock;
pub mod tickers;
