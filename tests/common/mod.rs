#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, Weekday};
use faatrader::domain::error::FaaError;
use faatrader::domain::price_series::{PriceSeries, PriceSnapshot};
use faatrader::ports::price_port::PriceHistoryProvider;
use std::collections::HashMap;

/// In-memory price provider. Returns every configured series that was asked
/// for, clipped to the requested range.
pub struct MockPriceProvider {
    pub series: HashMap<String, PriceSeries>,
    pub error: Option<String>,
}

impl MockPriceProvider {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            error: None,
        }
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.series.insert(series.symbol.clone(), series);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl PriceHistoryProvider for MockPriceProvider {
    fn fetch_closes(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSnapshot, FaaError> {
        if let Some(reason) = &self.error {
            return Err(FaaError::Data {
                reason: reason.clone(),
            });
        }
        let mut snapshot = PriceSnapshot::new();
        for symbol in symbols {
            if let Some(series) = self.series.get(symbol) {
                let closes: Vec<(NaiveDate, f64)> = series
                    .points()
                    .iter()
                    .filter(|p| p.date >= start && p.date <= end)
                    .map(|p| (p.date, p.close))
                    .collect();
                snapshot.insert(PriceSeries::from_closes(symbol.clone(), &closes));
            }
        }
        Ok(snapshot)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn weekdays(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|d| *d <= to)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

/// Geometric drift per trading day with a phase-shifted wobble so that no
/// two symbols are perfectly correlated.
pub fn drifting(symbol: &str, days: &[NaiveDate], drift: f64, phase: f64) -> PriceSeries {
    let closes: Vec<(NaiveDate, f64)> = days
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            let t = i as f64;
            (
                d,
                100.0 * (1.0 + drift).powf(t) * (1.0 + 0.01 * (t * 0.7 + phase).sin()),
            )
        })
        .collect();
    PriceSeries::from_closes(symbol, &closes)
}

pub fn tickers(symbols: &[&str]) -> Vec<String> {
    symbols.iter().map(|s| s.to_string()).collect()
}

/// Provider holding one drifting series per `(symbol, drift)` pair.
pub fn market(days: &[NaiveDate], drifts: &[(&str, f64)]) -> MockPriceProvider {
    drifts
        .iter()
        .enumerate()
        .fold(MockPriceProvider::new(), |provider, (i, (symbol, drift))| {
            provider.with_series(drifting(symbol, days, *drift, i as f64 * 1.3))
        })
}

/// A seven-symbol universe with mixed trends plus SHY and SPY.
pub fn seven_symbol_market(days: &[NaiveDate]) -> MockPriceProvider {
    market(
        days,
        &[
            ("VTI", 0.0012),
            ("VEA", 0.0006),
            ("VWO", 0.0009),
            ("BND", -0.0002),
            ("GLD", 0.0004),
            ("DBC", -0.0008),
            ("VNQ", 0.0003),
            ("SHY", 0.0001),
            ("SPY", 0.0010),
        ],
    )
}

pub fn seven_tickers() -> Vec<String> {
    tickers(&["VTI", "VEA", "VWO", "BND", "GLD", "DBC", "VNQ"])
}
