#![cfg(feature = "web")]
//! Web handler integration tests.
//!
//! Tests cover:
//! - Score endpoint: success envelope, bad requests (400), calculation errors (422)
//! - Backtest endpoint: success envelope and date validation
//! - Collaborator failures surfacing as 500
//! - Unknown routes and CORS preflight

mod common;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use common::*;
use faatrader::adapters::web::{AppState, build_router};
use faatrader::domain::settings::Settings;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn create_app_with(provider: MockPriceProvider) -> Router {
    let state = AppState {
        provider: Arc::new(provider),
        settings: Arc::new(Settings::default()),
    };
    build_router(state)
}

fn create_test_app() -> Router {
    create_app_with(seven_symbol_market(&weekdays(
        date(2024, 1, 1),
        date(2024, 12, 31),
    )))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn seven() -> Value {
    json!(["VTI", "VEA", "VWO", "BND", "GLD", "DBC", "VNQ"])
}

mod score_tests {
    use super::*;

    #[tokio::test]
    async fn score_returns_scores_and_allocation() {
        let (status, body) = send(
            create_test_app(),
            post_json(
                "/api/score",
                json!({"tickers": seven(), "start_date": "2024-10-01", "amount": 10000}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let scores = body["scores"].as_object().unwrap();
        assert_eq!(scores.len(), 7);
        let selected = scores
            .values()
            .filter(|s| s["selected"] == true)
            .count();
        assert_eq!(selected, 3);
        assert!(scores["VTI"]["momentum_rank"].is_u64());

        let total: f64 = body["allocation"]
            .as_object()
            .unwrap()
            .values()
            .map(|v| v.as_f64().unwrap())
            .sum();
        assert!((total - 10_000.0).abs() <= 0.02);
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn score_without_amount_has_null_allocation() {
        let (status, body) = send(
            create_test_app(),
            post_json("/api/score", json!({"tickers": seven(), "start_date": "2024-10-01"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["allocation"].is_null());
    }

    #[tokio::test]
    async fn wrong_ticker_count_is_bad_request() {
        let (status, body) = send(
            create_test_app(),
            post_json("/api/score", json!({"tickers": ["VTI", "VEA", "VWO"]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("exactly 7"));
    }

    #[tokio::test]
    async fn string_amount_is_bad_request() {
        let (status, _) = send(
            create_test_app(),
            post_json(
                "/api/score",
                json!({"tickers": seven(), "start_date": "2024-10-01", "amount": "lots"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_body_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/score")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(create_test_app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn negative_amount_is_unprocessable() {
        let (status, body) = send(
            create_test_app(),
            post_json(
                "/api/score",
                json!({"tickers": seven(), "start_date": "2024-10-01", "amount": -5}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn unknown_ticker_is_unprocessable() {
        let (status, body) = send(
            create_test_app(),
            post_json(
                "/api/score",
                json!({
                    "tickers": ["VTI", "VEA", "VWO", "BND", "GLD", "DBC", "XYZ"],
                    "start_date": "2024-10-01"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("XYZ"));
    }

    #[tokio::test]
    async fn provider_failure_is_internal_error() {
        let app = create_app_with(MockPriceProvider::new().with_error("disk unavailable"));
        let (status, body) = send(
            app,
            post_json("/api/score", json!({"tickers": seven(), "start_date": "2024-10-01"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Internal server error")
        );
    }
}

mod backtest_tests {
    use super::*;

    #[tokio::test]
    async fn backtest_returns_curves_and_metrics() {
        let (status, body) = send(
            create_test_app(),
            post_json(
                "/api/backtest",
                json!({"tickers": seven(), "start_date": "2024-06-01", "end_date": "2024-12-31"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let curve = body["equity_curve"].as_array().unwrap();
        assert_eq!(curve[0]["date"], "2024-06-03");
        assert_eq!(curve[0]["value"], 10000.0);
        assert_eq!(curve[0]["return"], 0.0);

        let bench = body["spy_benchmark"].as_array().unwrap();
        assert_eq!(bench[0]["date"], "2024-06-03");

        for key in ["cagr", "mdd", "sharpe"] {
            assert!(body["metrics"][key].is_number(), "missing metric {key}");
        }
        assert!(body["skipped_rebalances"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_start_date_is_bad_request() {
        let (status, body) = send(
            create_test_app(),
            post_json("/api/backtest", json!({"tickers": seven()})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("start_date"));
    }

    #[tokio::test]
    async fn future_start_date_is_bad_request() {
        let (status, _) = send(
            create_test_app(),
            post_json(
                "/api/backtest",
                json!({"tickers": seven(), "start_date": "2999-01-01"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn end_before_start_is_bad_request() {
        let (status, _) = send(
            create_test_app(),
            post_json(
                "/api/backtest",
                json!({"tickers": seven(), "start_date": "2024-06-01", "end_date": "2024-05-01"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

mod routing_tests {
    use super::*;

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let request = Request::builder()
            .uri("/api/missing")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(create_test_app(), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn cors_preflight_allows_any_origin() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/score")
            .header(header::ORIGIN, "http://example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();
        let response = create_test_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
