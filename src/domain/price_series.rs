//! Close-price series, price snapshots and the unified trading calendar.

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Ordered close prices for one symbol. Dates are strictly increasing and
/// every close is finite and positive.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub symbol: String,
    points: Vec<PricePoint>,
    date_index: HashMap<NaiveDate, usize>,
}

impl PriceSeries {
    /// Builds a series from raw points. Non-finite or non-positive closes are
    /// dropped, points are sorted by date and a repeated date keeps the last
    /// value supplied for it.
    pub fn new(symbol: impl Into<String>, raw: Vec<PricePoint>) -> Self {
        let mut points: Vec<PricePoint> = raw
            .into_iter()
            .filter(|p| p.close.is_finite() && p.close > 0.0)
            .collect();
        points.sort_by_key(|p| p.date);

        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }

        let date_index = deduped
            .iter()
            .enumerate()
            .map(|(i, p)| (p.date, i))
            .collect();

        Self {
            symbol: symbol.into(),
            points: deduped,
            date_index,
        }
    }

    pub fn from_closes(symbol: impl Into<String>, closes: &[(NaiveDate, f64)]) -> Self {
        let raw = closes
            .iter()
            .map(|&(date, close)| PricePoint { date, close })
            .collect();
        Self::new(symbol, raw)
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.date_index.get(&date).map(|&i| self.points[i].close)
    }

    /// Last close on or before `date`.
    pub fn close_on_or_before(&self, date: NaiveDate) -> Option<f64> {
        let end = self.points.partition_point(|p| p.date <= date);
        end.checked_sub(1).map(|i| self.points[i].close)
    }

    /// Number of observations dated on or before `as_of`.
    pub fn observations_through(&self, as_of: NaiveDate) -> usize {
        self.points.partition_point(|p| p.date <= as_of)
    }

    /// The last `count` observations dated on or before `as_of`, or `None`
    /// when fewer than `count` exist.
    pub fn trailing(&self, as_of: NaiveDate, count: usize) -> Option<&[PricePoint]> {
        let end = self.observations_through(as_of);
        if count == 0 || end < count {
            return None;
        }
        Some(&self.points[end - count..end])
    }

    /// Observations dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> &[PricePoint] {
        let begin = self.points.partition_point(|p| p.date < start);
        &self.points[begin..]
    }
}

/// A consistent set of price series fetched once from the provider.
#[derive(Debug, Clone, Default)]
pub struct PriceSnapshot {
    series: HashMap<String, PriceSeries>,
}

impl PriceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.symbol.clone(), series);
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.insert(series);
        self
    }

    pub fn get(&self, symbol: &str) -> Option<&PriceSeries> {
        self.series.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.series.contains_key(symbol)
    }

    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.series.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }

    pub fn is_empty(&self) -> bool {
        self.series.values().all(PriceSeries::is_empty)
    }

    /// Sorted union of every trading date in the snapshot.
    pub fn timeline(&self) -> Vec<NaiveDate> {
        let unique_dates: BTreeSet<NaiveDate> = self
            .series
            .values()
            .flat_map(|s| s.points.iter().map(|p| p.date))
            .collect();
        unique_dates.into_iter().collect()
    }

    /// Sorted union of the trading dates of the given symbols only.
    pub fn timeline_for(&self, symbols: &[String]) -> Vec<NaiveDate> {
        let unique_dates: BTreeSet<NaiveDate> = symbols
            .iter()
            .filter_map(|s| self.series.get(s))
            .flat_map(|s| s.points.iter().map(|p| p.date))
            .collect();
        unique_dates.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_sorts_and_drops_invalid_closes() {
        let series = PriceSeries::from_closes(
            "VTI",
            &[
                (date(2024, 1, 3), 102.0),
                (date(2024, 1, 1), 100.0),
                (date(2024, 1, 2), f64::NAN),
                (date(2024, 1, 4), 0.0),
                (date(2024, 1, 5), -3.0),
            ],
        );

        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0].date, date(2024, 1, 1));
        assert_eq!(series.points()[1].date, date(2024, 1, 3));
    }

    #[test]
    fn repeated_date_keeps_last_value() {
        let series = PriceSeries::from_closes(
            "VTI",
            &[(date(2024, 1, 1), 100.0), (date(2024, 1, 1), 101.0)],
        );
        assert_eq!(series.len(), 1);
        assert_eq!(series.close_on(date(2024, 1, 1)), Some(101.0));
    }

    #[test]
    fn close_on_or_before_falls_back() {
        let series = PriceSeries::from_closes(
            "VTI",
            &[(date(2024, 1, 1), 100.0), (date(2024, 1, 3), 103.0)],
        );

        assert_eq!(series.close_on(date(2024, 1, 2)), None);
        assert_eq!(series.close_on_or_before(date(2024, 1, 2)), Some(100.0));
        assert_eq!(series.close_on_or_before(date(2024, 1, 9)), Some(103.0));
        assert_eq!(series.close_on_or_before(date(2023, 12, 31)), None);
    }

    #[test]
    fn trailing_window_ends_at_as_of() {
        let closes: Vec<(NaiveDate, f64)> = (0..10)
            .map(|i| (date(2024, 1, 1) + chrono::Duration::days(i), 100.0 + i as f64))
            .collect();
        let series = PriceSeries::from_closes("VTI", &closes);

        let window = series.trailing(date(2024, 1, 5), 3).unwrap();
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].close, 102.0);
        assert_eq!(window[2].close, 104.0);

        assert!(series.trailing(date(2024, 1, 2), 3).is_none());
        assert!(series.trailing(date(2024, 1, 5), 0).is_none());
        assert_eq!(series.observations_through(date(2024, 1, 5)), 5);
    }

    #[test]
    fn since_skips_earlier_points() {
        let series = PriceSeries::from_closes(
            "SPY",
            &[
                (date(2024, 1, 1), 1.0),
                (date(2024, 1, 3), 2.0),
                (date(2024, 1, 5), 3.0),
            ],
        );
        let tail = series.since(date(2024, 1, 2));
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].date, date(2024, 1, 3));
        assert!(series.since(date(2024, 2, 1)).is_empty());
    }

    #[test]
    fn timeline_merges_and_sorts() {
        let snapshot = PriceSnapshot::new()
            .with_series(PriceSeries::from_closes(
                "VTI",
                &[(date(2024, 1, 2), 100.0), (date(2024, 1, 5), 101.0)],
            ))
            .with_series(PriceSeries::from_closes(
                "BND",
                &[(date(2024, 1, 1), 50.0), (date(2024, 1, 2), 51.0)],
            ));

        let timeline = snapshot.timeline();
        assert_eq!(
            timeline,
            vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 5)]
        );

        let only_vti = snapshot.timeline_for(&["VTI".to_string()]);
        assert_eq!(only_vti, vec![date(2024, 1, 2), date(2024, 1, 5)]);
        assert_eq!(snapshot.symbols(), vec!["BND", "VTI"]);
    }

    #[test]
    fn empty_snapshot() {
        let snapshot = PriceSnapshot::new();
        assert!(snapshot.is_empty());
        assert!(snapshot.timeline().is_empty());

        let snapshot = snapshot.with_series(PriceSeries::new("VTI", vec![]));
        assert!(snapshot.contains("VTI"));
        assert!(snapshot.is_empty());
    }
}
