//! Web server adapter.
//!
//! JSON API over axum: `POST /api/score` and `POST /api/backtest`, with
//! permissive CORS for browser clients.

mod error;
mod handlers;

pub use error::{WebError, status_from_error};
pub use handlers::*;

use axum::{
    Router,
    http::{Method, header},
    routing::post,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::domain::error::FaaError;
use crate::domain::settings::Settings;
use crate::ports::price_port::PriceHistoryProvider;

pub struct AppState {
    pub provider: Arc<dyn PriceHistoryProvider + Send + Sync>,
    pub settings: Arc<Settings>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/score", post(handlers::score))
        .route("/api/backtest", post(handlers::backtest))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Binds `listen` and serves until the process is stopped.
pub async fn serve(state: AppState, listen: &str) -> Result<(), FaaError> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!("listening on http://{}", listen);
    axum::serve(listener, app).await?;
    Ok(())
}
