//! Core domain types and logic.

pub mod config_validation;
pub mod cycle;
pub mod decision;
pub mod direction;
pub mod error;
pub mod event;
pub mod indicator;
pub mod indicator_helpers;
pub mod instrument;
pub mod market_state;
pub mod ohlcv;
