//! CSV file price adapter.
//!
//! One file per symbol, `<base_path>/<SYMBOL>.csv`, with a header row. The
//! first column is the date; the close column is found by header name.

use crate::domain::error::FaaError;
use crate::domain::price_series::{PricePoint, PriceSeries, PriceSnapshot};
use crate::ports::price_port::PriceHistoryProvider;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

const CLOSE_HEADERS: [&str; 2] = ["close", "adj_close"];

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    /// Reads one symbol's closes within `[start, end]`. `Ok(None)` when the
    /// file does not exist.
    fn read_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<PriceSeries>, FaaError> {
        let path = self.csv_path(symbol);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(FaaError::Data {
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| FaaError::Data {
            reason: format!("{}: CSV header error: {}", path.display(), e),
        })?;
        let close_idx = close_column(headers).ok_or_else(|| FaaError::Data {
            reason: format!("{}: no close column in header", path.display()),
        })?;

        let mut points = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| FaaError::Data {
                reason: format!("{}: CSV parse error: {}", path.display(), e),
            })?;

            let date_str = record.get(0).ok_or_else(|| FaaError::Data {
                reason: format!("{}: row {}: missing date column", path.display(), line + 1),
            })?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                FaaError::Data {
                    reason: format!(
                        "{}: row {}: invalid date '{}': {}",
                        path.display(),
                        line + 1,
                        date_str,
                        e
                    ),
                }
            })?;

            if date < start || date > end {
                continue;
            }

            let close: f64 = record
                .get(close_idx)
                .ok_or_else(|| FaaError::Data {
                    reason: format!("{}: row {}: missing close column", path.display(), line + 1),
                })?
                .trim()
                .parse()
                .map_err(|e| FaaError::Data {
                    reason: format!("{}: row {}: invalid close value: {}", path.display(), line + 1, e),
                })?;

            points.push(PricePoint { date, close });
        }

        Ok(Some(PriceSeries::new(symbol, points)))
    }
}

fn close_column(headers: &csv::StringRecord) -> Option<usize> {
    CLOSE_HEADERS.iter().find_map(|wanted| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(wanted))
    })
}

impl PriceHistoryProvider for CsvPriceAdapter {
    fn fetch_closes(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSnapshot, FaaError> {
        let mut snapshot = PriceSnapshot::new();
        for symbol in symbols {
            match self.read_series(symbol, start, end)? {
                Some(series) => {
                    tracing::debug!(%symbol, closes = series.len(), "loaded price history");
                    snapshot.insert(series);
                }
                None => {
                    tracing::warn!(
                        %symbol,
                        path = %self.csv_path(symbol).display(),
                        "no price file for symbol"
                    );
                }
            }
        }
        Ok(snapshot)
    }
}
