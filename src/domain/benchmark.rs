//! Buy-and-hold benchmark curve.

use chrono::NaiveDate;

use crate::domain::portfolio::EquityPoint;
use crate::domain::price_series::PriceSeries;

/// Buys `series` with `amount` at its first close on or after `start` and
/// holds. One point per trading day of the series from that date onward;
/// empty when the series has no close in range or `amount` is not positive.
pub fn buy_and_hold(series: &PriceSeries, start: NaiveDate, amount: f64) -> Vec<EquityPoint> {
    let held = series.since(start);
    let Some(entry) = held.first() else {
        return Vec::new();
    };
    if amount <= 0.0 {
        return Vec::new();
    }

    let shares = amount / entry.close;
    held.iter()
        .map(|p| EquityPoint::new(p.date, shares * p.close, amount))
        .collect()
}
