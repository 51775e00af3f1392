//! Portfolio state for the backtest: share holdings plus literal cash.
//!
//! A `Portfolio` is never mutated in place by the simulator. Revaluation reads
//! it against a day's closes; a rebalance produces the next `Portfolio`.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::domain::allocation::{Placement, placements};
use crate::domain::price_series::PriceSnapshot;
use crate::domain::scoring::Scorecard;

/// One point of an equity curve. `cumulative_return` is relative to the
/// curve's initial value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub cumulative_return: f64,
}

impl EquityPoint {
    pub fn new(date: NaiveDate, value: f64, initial_value: f64) -> Self {
        let cumulative_return = if initial_value > 0.0 {
            value / initial_value - 1.0
        } else {
            0.0
        };
        EquityPoint {
            date,
            value,
            cumulative_return,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    holdings: BTreeMap<String, f64>,
    cash: f64,
}

impl Portfolio {
    pub fn all_cash(amount: f64) -> Self {
        Portfolio {
            holdings: BTreeMap::new(),
            cash: amount,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn holdings(&self) -> &BTreeMap<String, f64> {
        &self.holdings
    }

    pub fn shares(&self, symbol: &str) -> f64 {
        self.holdings.get(symbol).copied().unwrap_or(0.0)
    }

    /// Marks the holdings to market at `date`. A symbol without a close on
    /// that date is valued at its last earlier close; one with no close at
    /// all contributes nothing.
    pub fn value_at(&self, snapshot: &PriceSnapshot, date: NaiveDate) -> f64 {
        let position_value: f64 = self
            .holdings
            .iter()
            .map(|(symbol, &shares)| {
                snapshot
                    .get(symbol)
                    .and_then(|s| s.close_on_or_before(date))
                    .map(|price| shares * price)
                    .unwrap_or(0.0)
            })
            .sum();
        self.cash + position_value
    }

    /// The portfolio after rebalancing into `scorecard` at `date`'s closes.
    ///
    /// The current value is split equally across the selected slots. Literal
    /// cash slots stay as cash; every other slot buys its instrument (the
    /// symbol or the cash proxy) at the close. A slot whose instrument has no
    /// price is held as cash. Total value is unchanged.
    pub fn rebalanced(
        &self,
        scorecard: &Scorecard,
        snapshot: &PriceSnapshot,
        date: NaiveDate,
    ) -> Portfolio {
        let value = self.value_at(snapshot, date);
        let slots = placements(scorecard);
        if slots.is_empty() {
            return Portfolio::all_cash(value);
        }

        let per_slot = value / slots.len() as f64;
        let mut holdings: BTreeMap<String, f64> = BTreeMap::new();
        let mut cash = 0.0;

        for placement in &slots {
            let price = placement
                .instrument()
                .and_then(|symbol| snapshot.get(symbol))
                .and_then(|s| s.close_on_or_before(date));

            match (placement, price) {
                (Placement::Cash, _) => cash += per_slot,
                (_, Some(price)) => {
                    let symbol = placement.key().to_string();
                    *holdings.entry(symbol).or_insert(0.0) += per_slot / price;
                }
                (_, None) => {
                    tracing::warn!(
                        %date,
                        instrument = placement.key(),
                        "no close for rebalance instrument, holding slot as cash"
                    );
                    cash += per_slot;
                }
            }
        }

        Portfolio { holdings, cash }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price_series::PriceSeries;
    use crate::domain::scoring::{CashProxyCheck, MetricRecord};
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(symbol: &str, cash_replacement: bool, hold_cash: bool) -> MetricRecord {
        MetricRecord {
            symbol: symbol.to_string(),
            momentum: 0.0,
            current_price: 0.0,
            volatility: 0.0,
            correlation: 0.0,
            momentum_rank: 1,
            volatility_rank: 1,
            correlation_rank: 1,
            integrated_score: 2.0,
            selected: true,
            cash_replacement,
            hold_cash,
        }
    }

    fn scorecard(records: Vec<MetricRecord>) -> Scorecard {
        Scorecard {
            as_of: date(2024, 2, 1),
            cash_proxy: "SHY".into(),
            records,
            cash_proxy_check: CashProxyCheck::NotNeeded,
        }
    }

    fn snapshot() -> PriceSnapshot {
        PriceSnapshot::new()
            .with_series(PriceSeries::from_closes(
                "VTI",
                &[(date(2024, 2, 1), 100.0), (date(2024, 2, 2), 110.0)],
            ))
            .with_series(PriceSeries::from_closes(
                "VEA",
                &[(date(2024, 2, 1), 50.0), (date(2024, 2, 2), 45.0)],
            ))
            .with_series(PriceSeries::from_closes(
                "SHY",
                &[(date(2024, 2, 1), 80.0), (date(2024, 2, 2), 80.0)],
            ))
    }

    #[test]
    fn equity_point_return_is_relative_to_initial() {
        let point = EquityPoint::new(date(2024, 2, 1), 11_000.0, 10_000.0);
        assert_relative_eq!(point.cumulative_return, 0.10, epsilon = 1e-12);
        let degenerate = EquityPoint::new(date(2024, 2, 1), 5.0, 0.0);
        assert_eq!(degenerate.cumulative_return, 0.0);
    }

    #[test]
    fn all_cash_values_flat() {
        let portfolio = Portfolio::all_cash(10_000.0);
        assert_relative_eq!(portfolio.value_at(&snapshot(), date(2024, 2, 2)), 10_000.0);
        assert!(portfolio.holdings().is_empty());
    }

    #[test]
    fn rebalance_buys_equal_dollar_slots() {
        let card = scorecard(vec![
            record("VTI", false, false),
            record("VEA", false, false),
            record("BND", true, false),
        ]);
        let snap = snapshot();
        let next = Portfolio::all_cash(9_000.0).rebalanced(&card, &snap, date(2024, 2, 1));

        assert_relative_eq!(next.shares("VTI"), 30.0);
        assert_relative_eq!(next.shares("VEA"), 60.0);
        assert_relative_eq!(next.shares("SHY"), 37.5);
        assert_relative_eq!(next.cash(), 0.0);
        assert_relative_eq!(next.value_at(&snap, date(2024, 2, 1)), 9_000.0, epsilon = 1e-9);
    }

    #[test]
    fn revaluation_tracks_prices_and_cash() {
        let card = scorecard(vec![
            record("VTI", false, false),
            record("VEA", true, true),
            record("GSG", true, true),
        ]);
        let snap = snapshot();
        let next = Portfolio::all_cash(9_000.0).rebalanced(&card, &snap, date(2024, 2, 1));

        assert_relative_eq!(next.cash(), 6_000.0);
        // 30 VTI shares move from 100 to 110
        assert_relative_eq!(next.value_at(&snap, date(2024, 2, 2)), 9_300.0, epsilon = 1e-9);
    }

    #[test]
    fn missing_instrument_price_falls_back_to_cash() {
        let card = scorecard(vec![
            record("VTI", false, false),
            record("XYZ", false, false),
            record("VEA", false, false),
        ]);
        let snap = snapshot();
        let next = Portfolio::all_cash(3_000.0).rebalanced(&card, &snap, date(2024, 2, 1));

        assert_relative_eq!(next.cash(), 1_000.0);
        assert_eq!(next.shares("XYZ"), 0.0);
        assert_relative_eq!(next.value_at(&snap, date(2024, 2, 1)), 3_000.0, epsilon = 1e-9);
    }

    #[test]
    fn rebalance_preserves_value_of_existing_holdings() {
        let card = scorecard(vec![
            record("VTI", false, false),
            record("VEA", false, false),
            record("SHY", false, false),
        ]);
        let snap = snapshot();
        let first = Portfolio::all_cash(9_000.0).rebalanced(&card, &snap, date(2024, 2, 1));
        let value_day2 = first.value_at(&snap, date(2024, 2, 2));
        let second = first.rebalanced(&card, &snap, date(2024, 2, 2));

        assert_relative_eq!(second.value_at(&snap, date(2024, 2, 2)), value_day2, epsilon = 1e-9);
        assert_relative_eq!(second.shares("VTI"), value_day2 / 3.0 / 110.0, epsilon = 1e-9);
        assert_relative_eq!(first.shares("VTI"), 30.0);
    }

    #[test]
    fn value_uses_last_close_when_date_missing() {
        let card = scorecard(vec![record("VTI", false, false)]);
        let snap = snapshot();
        let next = Portfolio::all_cash(1_000.0).rebalanced(&card, &snap, date(2024, 2, 1));
        assert_relative_eq!(next.value_at(&snap, date(2024, 2, 10)), 1_100.0, epsilon = 1e-9);
    }
}
