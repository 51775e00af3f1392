//! Request orchestration: one price fetch per request, then the pure core.

use chrono::{Duration, NaiveDate};

use crate::domain::allocation::{Allocation, allocate};
use crate::domain::backtest::{BacktestConfig, BacktestResult, run_backtest};
use crate::domain::error::FaaError;
use crate::domain::price_series::PriceSnapshot;
use crate::domain::request::{BacktestRequest, ScoreRequest};
use crate::domain::scoring::{Scorecard, score_universe};
use crate::domain::settings::Settings;
use crate::ports::price_port::PriceHistoryProvider;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    pub scorecard: Scorecard,
    pub allocation: Option<Allocation>,
}

pub fn execute_score(
    provider: &dyn PriceHistoryProvider,
    request: &ScoreRequest,
    settings: &Settings,
) -> Result<ScoreOutcome, FaaError> {
    if let Some(amount) = request.amount.filter(|a| !a.is_finite() || *a <= 0.0) {
        return Err(FaaError::InvalidAmount { amount });
    }

    let symbols = fetch_symbols(&request.tickers, &[&settings.scoring.cash_proxy]);
    let start = request.as_of - Duration::days(settings.score.history_days);
    let snapshot = fetch(provider, &symbols, start, request.as_of)?;

    let scorecard = score_universe(&request.tickers, &snapshot, request.as_of, &settings.scoring)?;
    let allocation = request
        .amount
        .map(|amount| allocate(&scorecard, amount))
        .transpose()?;

    tracing::info!(
        as_of = %request.as_of,
        selected = ?scorecard.selected_symbols(),
        allocated = allocation.is_some(),
        "score complete"
    );

    Ok(ScoreOutcome {
        scorecard,
        allocation,
    })
}

pub fn execute_backtest(
    provider: &dyn PriceHistoryProvider,
    request: &BacktestRequest,
    settings: &Settings,
) -> Result<BacktestResult, FaaError> {
    let symbols = fetch_symbols(
        &request.tickers,
        &[&settings.scoring.cash_proxy, &settings.backtest.benchmark],
    );
    let start = request.start_date - Duration::days(settings.backtest.history_buffer_days);
    let snapshot = fetch(provider, &symbols, start, request.end_date)?;

    let config = BacktestConfig {
        start_date: request.start_date,
        initial_capital: settings.backtest.initial_capital,
        benchmark: settings.backtest.benchmark.clone(),
        scoring: settings.scoring.clone(),
    };
    run_backtest(&request.tickers, &snapshot, &config)
}

/// The universe followed by any extra symbols not already in it.
fn fetch_symbols(universe: &[String], extra: &[&String]) -> Vec<String> {
    let mut symbols = universe.to_vec();
    for symbol in extra {
        if !symbols.contains(*symbol) {
            symbols.push((*symbol).clone());
        }
    }
    symbols
}

fn fetch(
    provider: &dyn PriceHistoryProvider,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSnapshot, FaaError> {
    tracing::info!(symbols = symbols.len(), %start, %end, "fetching price history");
    let snapshot = provider.fetch_closes(symbols, start, end)?;
    for symbol in symbols.iter().filter(|s| !snapshot.contains(s)) {
        tracing::debug!(%symbol, "no price history returned");
    }
    Ok(snapshot)
}
