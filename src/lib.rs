//! newstrader: economic-news driven trading signals.
//!
//! Technical indicators classify each instrument's market state, economic
//! releases are scored into a directional impact per instrument, and the two
//! are fused into a risk-sized order or a typed no-trade verdict.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
