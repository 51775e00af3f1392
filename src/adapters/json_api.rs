//! JSON request bodies and response envelopes.
//!
//! Internal values are full precision; rounding to 2 decimals (currency) and
//! 4 decimals (ratios and returns) happens only when building responses.

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::backtest::{BacktestResult, SkippedRebalance};
use crate::domain::metrics::Metrics;
use crate::domain::pipeline::ScoreOutcome;
use crate::domain::portfolio::EquityPoint;
use crate::domain::request::{
    BacktestRequest, RequestError, ScoreRequest, validate_backtest_request,
    validate_score_request,
};
use crate::domain::scoring::MetricRecord;

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoreRequestBody {
    #[serde(default)]
    pub tickers: Vec<String>,
    /// Evaluation date; `date` is accepted as well.
    #[serde(default, alias = "date")]
    pub start_date: Option<String>,
    #[serde(default)]
    pub amount: Option<Value>,
}

impl ScoreRequestBody {
    pub fn into_request(
        self,
        universe_size: usize,
        today: NaiveDate,
    ) -> Result<ScoreRequest, RequestError> {
        let amount = parse_amount(self.amount.as_ref())?;
        validate_score_request(
            &self.tickers,
            self.start_date.as_deref(),
            amount,
            universe_size,
            today,
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BacktestRequestBody {
    #[serde(default)]
    pub tickers: Vec<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl BacktestRequestBody {
    pub fn into_request(self, today: NaiveDate) -> Result<BacktestRequest, RequestError> {
        validate_backtest_request(
            &self.tickers,
            self.start_date.as_deref(),
            self.end_date.as_deref(),
            today,
        )
    }
}

/// Parses a JSON request body. An empty body is an error.
pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, RequestError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(RequestError::Body("missing request body".to_string()));
    }
    serde_json::from_slice(body).map_err(|e| RequestError::Body(e.to_string()))
}

fn parse_amount(value: Option<&Value>) -> Result<Option<f64>, RequestError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or(RequestError::AmountNotNumber),
        Some(_) => Err(RequestError::AmountNotNumber),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecordDto {
    pub momentum: f64,
    pub current_price: f64,
    pub momentum_rank: usize,
    pub volatility: f64,
    pub volatility_rank: usize,
    pub correlation: f64,
    pub correlation_rank: usize,
    pub integrated_score: f64,
    pub selected: bool,
    pub cash_replacement: bool,
    pub hold_cash: bool,
}

impl From<&MetricRecord> for MetricRecordDto {
    fn from(r: &MetricRecord) -> Self {
        MetricRecordDto {
            momentum: round_to(r.momentum, 4),
            current_price: round_to(r.current_price, 2),
            momentum_rank: r.momentum_rank,
            volatility: round_to(r.volatility, 4),
            volatility_rank: r.volatility_rank,
            correlation: round_to(r.correlation, 4),
            correlation_rank: r.correlation_rank,
            integrated_score: round_to(r.integrated_score, 4),
            selected: r.selected,
            cash_replacement: r.cash_replacement,
            hold_cash: r.hold_cash,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResponse {
    pub success: bool,
    pub scores: BTreeMap<String, MetricRecordDto>,
    pub allocation: Option<BTreeMap<String, f64>>,
    pub timestamp: String,
}

impl ScoreResponse {
    pub fn new<Tz>(outcome: &ScoreOutcome, timestamp: DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let scores = outcome
            .scorecard
            .records
            .iter()
            .map(|r| (r.symbol.clone(), MetricRecordDto::from(r)))
            .collect();
        let allocation = outcome.allocation.as_ref().map(|a| {
            a.lines
                .iter()
                .map(|line| (line.key.clone(), round_to(line.amount, 2)))
                .collect()
        });

        ScoreResponse {
            success: true,
            scores,
            allocation,
            timestamp: timestamp.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPointDto {
    pub date: String,
    pub value: f64,
    #[serde(rename = "return")]
    pub cumulative_return: f64,
}

impl From<&EquityPoint> for EquityPointDto {
    fn from(p: &EquityPoint) -> Self {
        EquityPointDto {
            date: format_date(p.date),
            value: round_to(p.value, 2),
            cumulative_return: round_to(p.cumulative_return, 4),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsDto {
    pub cagr: f64,
    pub mdd: f64,
    pub sharpe: f64,
}

impl From<&Metrics> for MetricsDto {
    fn from(m: &Metrics) -> Self {
        MetricsDto {
            cagr: round_to(m.cagr, 4),
            mdd: round_to(m.mdd, 4),
            sharpe: round_to(m.sharpe, 4),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRebalanceDto {
    pub date: String,
    pub reason: String,
}

impl From<&SkippedRebalance> for SkippedRebalanceDto {
    fn from(s: &SkippedRebalance) -> Self {
        SkippedRebalanceDto {
            date: format_date(s.date),
            reason: s.reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResponse {
    pub success: bool,
    pub equity_curve: Vec<EquityPointDto>,
    pub metrics: MetricsDto,
    pub spy_benchmark: Vec<EquityPointDto>,
    pub skipped_rebalances: Vec<SkippedRebalanceDto>,
}

impl From<&BacktestResult> for BacktestResponse {
    fn from(result: &BacktestResult) -> Self {
        BacktestResponse {
            success: true,
            equity_curve: result.equity_curve.iter().map(EquityPointDto::from).collect(),
            metrics: MetricsDto::from(&result.metrics),
            spy_benchmark: result.benchmark_curve.iter().map(EquityPointDto::from).collect(),
            skipped_rebalances: result.skipped.iter().map(SkippedRebalanceDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        ErrorResponse {
            success: false,
            error: error.into(),
        }
    }
}
