//! Monthly rebalance schedule.

use chrono::{Datelike, NaiveDate};

/// First trading day of each calendar month on or after `start`, taken from
/// a sorted trading calendar. Strictly increasing, one date per month.
pub fn monthly_rebalance_dates(timeline: &[NaiveDate], start: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current_month: Option<(i32, u32)> = None;

    for &date in timeline.iter().filter(|&&d| d >= start) {
        let month = (date.year(), date.month());
        if current_month != Some(month) {
            dates.push(date);
            current_month = Some(month);
        }
    }

    dates
}
