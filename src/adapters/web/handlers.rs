//! HTTP request handlers for the JSON API.

use axum::{Json, body::Bytes, extract::State};
use chrono::Local;
use std::sync::Arc;

use crate::adapters::json_api::{
    BacktestRequestBody, BacktestResponse, ScoreRequestBody, ScoreResponse, parse_body,
};
use crate::domain::pipeline::{execute_backtest, execute_score};

use super::{AppState, WebError};

pub async fn score(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ScoreResponse>, WebError> {
    let today = Local::now().date_naive();
    let request = parse_body::<ScoreRequestBody>(&body)?
        .into_request(state.settings.score.universe_size, today)?;

    let outcome = tokio::task::spawn_blocking(move || {
        execute_score(&*state.provider, &request, &state.settings)
    })
    .await
    .map_err(|e| WebError::internal(format!("score task failed: {e}")))??;

    Ok(Json(ScoreResponse::new(&outcome, Local::now())))
}

pub async fn backtest(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<BacktestResponse>, WebError> {
    let today = Local::now().date_naive();
    let request = parse_body::<BacktestRequestBody>(&body)?.into_request(today)?;

    let result = tokio::task::spawn_blocking(move || {
        execute_backtest(&*state.provider, &request, &state.settings)
    })
    .await
    .map_err(|e| WebError::internal(format!("backtest task failed: {e}")))??;

    Ok(Json(BacktestResponse::from(&result)))
}

pub async fn not_found() -> WebError {
    WebError::not_found("Not found")
}
