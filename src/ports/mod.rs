//! Port traits the domain drives: market data, calendar, execution, config.

pub mod calendar_port;
pub mod config_port;
pub mod execution_port;
pub mod market_data_port;
