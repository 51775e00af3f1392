//! Performance metrics over an equity curve.
//!
//! CAGR   = (final / first)^(365.25 / elapsed_days) - 1
//! MDD    = -(largest peak-to-trough decline), a non-positive fraction
//! Sharpe = mean(daily returns) / stddev(daily returns) * sqrt(252)

use super::portfolio::EquityPoint;
use super::returns::{mean, pct_changes, population_stddev};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Metrics {
    pub cagr: f64,
    pub mdd: f64,
    pub sharpe: f64,
}

impl Metrics {
    pub fn compute(equity_curve: &[EquityPoint]) -> Self {
        if equity_curve.len() < 2 {
            return Metrics::default();
        }

        let values: Vec<f64> = equity_curve.iter().map(|p| p.value).collect();

        Metrics {
            cagr: compute_cagr(equity_curve),
            mdd: compute_max_drawdown(&values),
            sharpe: compute_sharpe(&values),
        }
    }
}

fn compute_cagr(equity_curve: &[EquityPoint]) -> f64 {
    let (Some(first), Some(last)) = (equity_curve.first(), equity_curve.last()) else {
        return 0.0;
    };

    let elapsed_days = (last.date - first.date).num_days();
    if elapsed_days <= 0 || first.value <= 0.0 {
        return 0.0;
    }

    let years = elapsed_days as f64 / DAYS_PER_YEAR;
    let cagr = (last.value / first.value).powf(1.0 / years) - 1.0;
    if cagr.is_finite() { cagr } else { 0.0 }
}

fn compute_max_drawdown(values: &[f64]) -> f64 {
    let Some(&first) = values.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &value in values {
        if value > peak {
            peak = value;
        } else if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    -max_dd
}

fn compute_sharpe(values: &[f64]) -> f64 {
    let returns = pct_changes(values);
    let (Some(mean_return), Some(stddev)) = (mean(&returns), population_stddev(&returns)) else {
        return 0.0;
    };

    if stddev > 0.0 {
        mean_return / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
