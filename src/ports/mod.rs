//! Port traits the domain depends on.

pub mod config_port;
pub mod data_port;
pub mod indicator_store_port;
pub mod stock_port;
