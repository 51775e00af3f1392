//! Price history port trait.

use crate::domain::error::FaaError;
use crate::domain::price_series::PriceSnapshot;
use chrono::NaiveDate;

/// Source of daily closing prices.
///
/// Implementations return one series per symbol they hold data for, limited
/// to `[start, end]`. Symbols without data are left out of the snapshot
/// rather than reported as errors; an `Err` means the source itself failed.
pub trait PriceHistoryProvider {
    fn fetch_closes(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSnapshot, FaaError>;
}
