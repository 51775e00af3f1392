//! Multi-factor scoring and selection (flexible asset allocation).
//!
//! For each universe symbol over the trailing lookback window:
//!   momentum    = last / first - 1
//!   volatility  = sample stddev of daily returns
//!   correlation = sum of Pearson correlations of daily returns against every
//!                 other universe symbol (self excluded), on the trailing
//!                 dates where every universe symbol has a close
//!
//! Ranks: momentum descending, volatility and correlation ascending, ties in
//! universe order. integrated = wM * rankM + wV * rankV + wC * rankC, lower is
//! better. The `select_count` lowest scores are selected; a selected symbol
//! with negative momentum is replaced by the cash proxy, and when the cash
//! proxy itself has negative momentum those slots hold literal cash.

use chrono::NaiveDate;
use std::cmp::Ordering;

use crate::domain::error::FaaError;
use crate::domain::price_series::{PriceSeries, PriceSnapshot};
use crate::domain::returns::{momentum, pct_changes, pearson, sample_stddev, window_returns};

pub const DEFAULT_LOOKBACK_DAYS: usize = 80;
pub const DEFAULT_SELECT_COUNT: usize = 3;
pub const MIN_UNIVERSE_SIZE: usize = 3;
pub const DEFAULT_CASH_PROXY: &str = "SHY";

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringParams {
    pub lookback_days: usize,
    pub select_count: usize,
    pub momentum_weight: f64,
    pub volatility_weight: f64,
    pub correlation_weight: f64,
    pub cash_proxy: String,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            select_count: DEFAULT_SELECT_COUNT,
            momentum_weight: 1.0,
            volatility_weight: 0.5,
            correlation_weight: 0.5,
            cash_proxy: DEFAULT_CASH_PROXY.to_string(),
        }
    }
}

impl ScoringParams {
    pub fn min_universe(&self) -> usize {
        MIN_UNIVERSE_SIZE.max(self.select_count)
    }
}

/// Unranked per-symbol measurements.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMetrics {
    pub symbol: String,
    pub momentum: f64,
    pub current_price: f64,
    pub volatility: f64,
    pub correlation: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub symbol: String,
    pub momentum: f64,
    pub current_price: f64,
    pub volatility: f64,
    pub correlation: f64,
    pub momentum_rank: usize,
    pub volatility_rank: usize,
    pub correlation_rank: usize,
    pub integrated_score: f64,
    pub selected: bool,
    pub cash_replacement: bool,
    pub hold_cash: bool,
}

/// Outcome of the cash-proxy momentum check.
#[derive(Debug, Clone, PartialEq)]
pub enum CashProxyCheck {
    /// No selected symbol needed a cash replacement.
    NotNeeded,
    /// The check ran; `hold_cash` was set iff `momentum < 0`.
    Evaluated { momentum: f64 },
    /// The proxy's data could not support the check; no slot was upgraded
    /// to literal cash.
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scorecard {
    pub as_of: NaiveDate,
    pub cash_proxy: String,
    /// One record per universe symbol, in universe order.
    pub records: Vec<MetricRecord>,
    pub cash_proxy_check: CashProxyCheck,
}

impl Scorecard {
    pub fn get(&self, symbol: &str) -> Option<&MetricRecord> {
        self.records.iter().find(|r| r.symbol == symbol)
    }

    pub fn selected(&self) -> impl Iterator<Item = &MetricRecord> {
        self.records.iter().filter(|r| r.selected)
    }

    pub fn selected_symbols(&self) -> Vec<&str> {
        self.selected().map(|r| r.symbol.as_str()).collect()
    }

    /// Records ordered by integrated score, ties in universe order.
    pub fn ranked(&self) -> Vec<&MetricRecord> {
        let mut ranked: Vec<&MetricRecord> = self.records.iter().collect();
        ranked.sort_by(|a, b| a.integrated_score.total_cmp(&b.integrated_score));
        ranked
    }
}

/// Scores `universe` as of `as_of` using only observations dated on or
/// before it. Fails without partial results when the universe is too small
/// or any symbol lacks data.
pub fn score_universe(
    universe: &[String],
    snapshot: &PriceSnapshot,
    as_of: NaiveDate,
    params: &ScoringParams,
) -> Result<Scorecard, FaaError> {
    let minimum = params.min_universe();
    if universe.len() < minimum {
        return Err(FaaError::InsufficientUniverse {
            size: universe.len(),
            minimum,
        });
    }

    let lookback = params.lookback_days;
    let mut raw = Vec::with_capacity(universe.len());
    let mut held = Vec::with_capacity(universe.len());

    for symbol in universe {
        let series = snapshot
            .get(symbol)
            .ok_or_else(|| FaaError::MissingSymbolData {
                symbol: symbol.clone(),
            })?;
        let window =
            series
                .trailing(as_of, lookback)
                .ok_or_else(|| FaaError::InsufficientHistory {
                    symbol: symbol.clone(),
                    as_of,
                    observations: series.observations_through(as_of),
                    required: lookback,
                })?;

        let daily = window_returns(window);
        let current_price = window.last().map(|p| p.close).unwrap_or_default();
        raw.push(RawMetrics {
            symbol: symbol.clone(),
            momentum: momentum(window),
            current_price,
            volatility: sample_stddev(&daily).unwrap_or(0.0),
            correlation: 0.0,
        });
        held.push(series);
    }

    let returns = aligned_returns(&held, as_of, lookback);
    for (i, metrics) in raw.iter_mut().enumerate() {
        metrics.correlation = correlation_sum(&returns, i);
    }

    let mut records = rank_and_select(raw, params);

    let cash_proxy_check = if records.iter().any(|r| r.cash_replacement) {
        check_cash_proxy(snapshot, as_of, params)
    } else {
        CashProxyCheck::NotNeeded
    };
    apply_cash_proxy_check(&mut records, &cash_proxy_check);

    tracing::debug!(
        %as_of,
        selected = ?records.iter().filter(|r| r.selected).map(|r| r.symbol.as_str()).collect::<Vec<_>>(),
        "universe scored"
    );

    Ok(Scorecard {
        as_of,
        cash_proxy: params.cash_proxy.clone(),
        records,
        cash_proxy_check,
    })
}

/// Daily returns per series over the trailing `lookback` dates on or before
/// `as_of` where every series has a close, so that index `i` of each vector
/// is the same trading day.
fn aligned_returns(series: &[&PriceSeries], as_of: NaiveDate, lookback: usize) -> Vec<Vec<f64>> {
    let Some((first, rest)) = series.split_first() else {
        return Vec::new();
    };
    let through = first.observations_through(as_of);
    let shared: Vec<NaiveDate> = first.points()[..through]
        .iter()
        .map(|p| p.date)
        .filter(|d| rest.iter().all(|s| s.close_on(*d).is_some()))
        .collect();
    let dates = &shared[shared.len().saturating_sub(lookback)..];

    series
        .iter()
        .map(|s| {
            let closes: Vec<f64> = dates.iter().filter_map(|d| s.close_on(*d)).collect();
            pct_changes(&closes)
        })
        .collect()
}

/// Signed sum of correlations between series `index` and every other series.
/// An undefined pair (zero variance) contributes 0.
fn correlation_sum(returns: &[Vec<f64>], index: usize) -> f64 {
    returns
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != index)
        .map(|(_, other)| pearson(&returns[index], other).unwrap_or(0.0))
        .sum()
}

/// Ranks, integrates and selects, then flags selected symbols with negative
/// momentum for cash replacement. `hold_cash` is left false.
pub fn rank_and_select(raw: Vec<RawMetrics>, params: &ScoringParams) -> Vec<MetricRecord> {
    let momenta: Vec<f64> = raw.iter().map(|m| m.momentum).collect();
    let vols: Vec<f64> = raw.iter().map(|m| m.volatility).collect();
    let corrs: Vec<f64> = raw.iter().map(|m| m.correlation).collect();

    let momentum_ranks = assign_ranks(&momenta, |a, b| b.total_cmp(a));
    let volatility_ranks = assign_ranks(&vols, |a, b| a.total_cmp(b));
    let correlation_ranks = assign_ranks(&corrs, |a, b| a.total_cmp(b));

    let mut records: Vec<MetricRecord> = raw
        .into_iter()
        .enumerate()
        .map(|(i, m)| {
            let integrated_score = momentum_ranks[i] as f64 * params.momentum_weight
                + volatility_ranks[i] as f64 * params.volatility_weight
                + correlation_ranks[i] as f64 * params.correlation_weight;
            MetricRecord {
                symbol: m.symbol,
                momentum: m.momentum,
                current_price: m.current_price,
                volatility: m.volatility,
                correlation: m.correlation,
                momentum_rank: momentum_ranks[i],
                volatility_rank: volatility_ranks[i],
                correlation_rank: correlation_ranks[i],
                integrated_score,
                selected: false,
                cash_replacement: false,
                hold_cash: false,
            }
        })
        .collect();

    let mut by_score: Vec<usize> = (0..records.len()).collect();
    by_score.sort_by(|&a, &b| {
        records[a]
            .integrated_score
            .total_cmp(&records[b].integrated_score)
    });

    for &i in by_score.iter().take(params.select_count) {
        let record = &mut records[i];
        record.selected = true;
        record.cash_replacement = record.momentum < 0.0;
    }

    records
}

/// 1-based ranks under `cmp`; the stable sort keeps equal values in input
/// order so the first-seen symbol gets the lower rank.
fn assign_ranks<F>(values: &[f64], cmp: F) -> Vec<usize>
where
    F: Fn(&f64, &f64) -> Ordering,
{
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| cmp(&values[a], &values[b]));

    let mut ranks = vec![0; values.len()];
    for (position, &index) in order.iter().enumerate() {
        ranks[index] = position + 1;
    }
    ranks
}

pub fn check_cash_proxy(
    snapshot: &PriceSnapshot,
    as_of: NaiveDate,
    params: &ScoringParams,
) -> CashProxyCheck {
    let proxy = &params.cash_proxy;
    let check = match snapshot.get(proxy) {
        None => CashProxyCheck::Unavailable {
            reason: format!("no price data for {proxy}"),
        },
        Some(series) => match series.trailing(as_of, params.lookback_days) {
            Some(window) => CashProxyCheck::Evaluated {
                momentum: momentum(window),
            },
            None => CashProxyCheck::Unavailable {
                reason: format!(
                    "{proxy} has {} observations as of {as_of}, need {}",
                    series.observations_through(as_of),
                    params.lookback_days
                ),
            },
        },
    };

    if let CashProxyCheck::Unavailable { reason } = &check {
        tracing::warn!(%as_of, cash_proxy = %proxy, %reason, "cash proxy check skipped");
    }
    check
}

fn apply_cash_proxy_check(records: &mut [MetricRecord], check: &CashProxyCheck) {
    let proxy_negative = matches!(check, CashProxyCheck::Evaluated { momentum } if *momentum < 0.0);
    if proxy_negative {
        for record in records.iter_mut().filter(|r| r.cash_replacement) {
            record.hold_cash = true;
        }
    }
}
