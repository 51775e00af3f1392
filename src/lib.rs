//! faatrader: flexible asset allocation scoring and backtesting.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command-line entry point in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
