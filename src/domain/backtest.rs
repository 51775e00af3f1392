//! Monthly-rebalanced backtest over one pre-fetched price snapshot.
//!
//! At each rebalance date the universe is rescored with history truncated to
//! that date. A scoring failure skips the month: holdings carry forward and
//! no equity points are emitted until the next successful rebalance.

use chrono::NaiveDate;

use crate::domain::benchmark::buy_and_hold;
use crate::domain::error::FaaError;
use crate::domain::metrics::Metrics;
use crate::domain::portfolio::{EquityPoint, Portfolio};
use crate::domain::price_series::PriceSnapshot;
use crate::domain::schedule::monthly_rebalance_dates;
use crate::domain::scoring::{ScoringParams, score_universe};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;
pub const DEFAULT_BENCHMARK: &str = "SPY";

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub initial_capital: f64,
    pub benchmark: String,
    pub scoring: ScoringParams,
}

impl BacktestConfig {
    pub fn new(start_date: NaiveDate) -> Self {
        BacktestConfig {
            start_date,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            benchmark: DEFAULT_BENCHMARK.to_string(),
            scoring: ScoringParams::default(),
        }
    }
}

/// A rebalance date whose scoring failed.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRebalance {
    pub date: NaiveDate,
    pub reason: FaaError,
}

/// Output of the strategy simulation alone.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRun {
    pub rebalance_dates: Vec<NaiveDate>,
    pub equity_curve: Vec<EquityPoint>,
    pub skipped: Vec<SkippedRebalance>,
    pub final_portfolio: Portfolio,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub equity_curve: Vec<EquityPoint>,
    pub metrics: Metrics,
    pub benchmark_curve: Vec<EquityPoint>,
    pub skipped: Vec<SkippedRebalance>,
}

/// Runs the strategy, the buy-and-hold benchmark and the strategy's metrics.
///
/// The benchmark is bought on the first rebalance date that scored, not the
/// first scheduled one. Months skipped at the start of the run are therefore
/// left out of both curves, so they cover the same window.
pub fn run_backtest(
    universe: &[String],
    snapshot: &PriceSnapshot,
    config: &BacktestConfig,
) -> Result<BacktestResult, FaaError> {
    let benchmark = snapshot
        .get(&config.benchmark)
        .ok_or_else(|| FaaError::MissingSymbolData {
            symbol: config.benchmark.clone(),
        })?;

    let run = simulate(universe, snapshot, config)?;
    let metrics = Metrics::compute(&run.equity_curve);

    let benchmark_curve = match run.rebalance_dates.first() {
        Some(&first) => buy_and_hold(benchmark, first, config.initial_capital),
        None => Vec::new(),
    };
    if benchmark_curve.is_empty() {
        tracing::warn!(
            benchmark = %config.benchmark,
            "benchmark has no closes in the backtest window"
        );
    }

    tracing::info!(
        points = run.equity_curve.len(),
        rebalances = run.rebalance_dates.len(),
        skipped = run.skipped.len(),
        cagr = metrics.cagr,
        mdd = metrics.mdd,
        sharpe = metrics.sharpe,
        "backtest complete"
    );

    Ok(BacktestResult {
        equity_curve: run.equity_curve,
        metrics,
        benchmark_curve,
        skipped: run.skipped,
    })
}

/// Simulates the strategy over `snapshot`.
///
/// Fails before simulating when the universe is too small, a universe symbol
/// is absent, or there is nothing to schedule. Fails afterwards only when
/// every rebalance was skipped.
pub fn simulate(
    universe: &[String],
    snapshot: &PriceSnapshot,
    config: &BacktestConfig,
) -> Result<BacktestRun, FaaError> {
    if !config.initial_capital.is_finite() || config.initial_capital <= 0.0 {
        return Err(FaaError::InvalidAmount {
            amount: config.initial_capital,
        });
    }

    let minimum = config.scoring.min_universe();
    if universe.len() < minimum {
        return Err(FaaError::InsufficientUniverse {
            size: universe.len(),
            minimum,
        });
    }
    if let Some(symbol) = universe.iter().find(|s| !snapshot.contains(s)) {
        return Err(FaaError::MissingSymbolData {
            symbol: symbol.clone(),
        });
    }

    let timeline = snapshot.timeline_for(universe);
    let Some(&last_day) = timeline.last() else {
        return Err(FaaError::InsufficientData {
            reason: "price history is empty".to_string(),
        });
    };

    let schedule = monthly_rebalance_dates(&timeline, config.start_date);
    if schedule.is_empty() {
        return Err(FaaError::InsufficientData {
            reason: format!("no trading days on or after {}", config.start_date),
        });
    }

    let initial = config.initial_capital;
    let mut portfolio = Portfolio::all_cash(initial);
    let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(timeline.len());
    let mut skipped: Vec<SkippedRebalance> = Vec::new();
    let mut rebalance_dates: Vec<NaiveDate> = Vec::with_capacity(schedule.len());

    for (i, &date) in schedule.iter().enumerate() {
        let scorecard = match score_universe(universe, snapshot, date, &config.scoring) {
            Ok(card) => card,
            Err(reason) => {
                tracing::warn!(%date, %reason, "skipping rebalance");
                skipped.push(SkippedRebalance { date, reason });
                continue;
            }
        };

        let value = portfolio.value_at(snapshot, date);
        equity_curve.push(EquityPoint::new(date, value, initial));
        portfolio = portfolio.rebalanced(&scorecard, snapshot, date);
        rebalance_dates.push(date);

        tracing::debug!(
            %date,
            value,
            selected = ?scorecard.selected_symbols(),
            "rebalanced"
        );

        let Some(&next) = schedule.get(i + 1) else {
            continue;
        };
        let from = timeline.partition_point(|d| *d <= date);
        let to = timeline.partition_point(|d| *d < next);
        for &day in &timeline[from..to] {
            let value = portfolio.value_at(snapshot, day);
            equity_curve.push(EquityPoint::new(day, value, initial));
        }
    }

    if rebalance_dates.is_empty() {
        return Err(FaaError::InsufficientData {
            reason: format!(
                "all {} rebalance dates failed to score",
                schedule.len()
            ),
        });
    }

    if equity_curve.last().is_some_and(|p| p.date < last_day) {
        let value = portfolio.value_at(snapshot, last_day);
        equity_curve.push(EquityPoint::new(last_day, value, initial));
    }

    Ok(BacktestRun {
        rebalance_dates,
        equity_curve,
        skipped,
        final_portfolio: portfolio,
    })
}
