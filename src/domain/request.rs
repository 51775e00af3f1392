//! Request-level validation for score and backtest requests.
//!
//! Everything here is checked before any price data is fetched. Failures are
//! `RequestError`s, distinct from the calculation errors in `FaaError`.

use chrono::NaiveDate;

use crate::domain::universe::{UniverseError, normalize_tickers};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
    #[error("missing '{0}' field in request")]
    MissingField(&'static str),

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error("exactly {expected} tickers are required, got {actual}")]
    WrongUniverseSize { expected: usize, actual: usize },

    #[error("invalid {field} '{value}', expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("{field} {date} is in the future")]
    FutureDate { field: &'static str, date: NaiveDate },

    #[error("end_date {end} must be after start_date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("amount must be a number")]
    AmountNotNumber,

    #[error("invalid request body: {0}")]
    Body(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRequest {
    pub tickers: Vec<String>,
    pub as_of: NaiveDate,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRequest {
    pub tickers: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Validates a score request. `date` defaults to `today`; `universe_size` of
/// 0 accepts any ticker count.
pub fn validate_score_request(
    tickers: &[String],
    date: Option<&str>,
    amount: Option<f64>,
    universe_size: usize,
    today: NaiveDate,
) -> Result<ScoreRequest, RequestError> {
    let tickers = validate_tickers(tickers)?;
    if universe_size > 0 && tickers.len() != universe_size {
        return Err(RequestError::WrongUniverseSize {
            expected: universe_size,
            actual: tickers.len(),
        });
    }

    let as_of = match date {
        Some(value) => not_in_future("date", parse_date("date", value)?, today)?,
        None => today,
    };

    Ok(ScoreRequest {
        tickers,
        as_of,
        amount,
    })
}

/// Validates a backtest request. `end_date` defaults to `today`.
pub fn validate_backtest_request(
    tickers: &[String],
    start_date: Option<&str>,
    end_date: Option<&str>,
    today: NaiveDate,
) -> Result<BacktestRequest, RequestError> {
    let tickers = validate_tickers(tickers)?;

    let start_date = start_date.ok_or(RequestError::MissingField("start_date"))?;
    let start_date = not_in_future("start_date", parse_date("start_date", start_date)?, today)?;

    let end_date = match end_date {
        Some(value) => parse_date("end_date", value)?,
        None => today,
    };
    if end_date <= start_date {
        return Err(RequestError::EndBeforeStart {
            start: start_date,
            end: end_date,
        });
    }

    Ok(BacktestRequest {
        tickers,
        start_date,
        end_date,
    })
}

pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, RequestError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| RequestError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

fn validate_tickers(tickers: &[String]) -> Result<Vec<String>, RequestError> {
    if tickers.is_empty() {
        return Err(RequestError::MissingField("tickers"));
    }
    Ok(normalize_tickers(tickers)?)
}

fn not_in_future(
    field: &'static str,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<NaiveDate, RequestError> {
    if date > today {
        Err(RequestError::FutureDate { field, date })
    } else {
        Ok(date)
    }
}
