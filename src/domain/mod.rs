//! Core domain types and logic.

pub mod price_series;
pub mod returns;
pub mod scoring;
pub mod allocation;
pub mod schedule;
pub mod portfolio;
pub mod backtest;
pub mod benchmark;
pub mod metrics;
pub mod universe;
pub mod request;
pub mod settings;
pub mod pipeline;
pub mod error;
