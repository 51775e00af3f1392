//! HTTP error responses for the web adapter.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::adapters::json_api::ErrorResponse;
use crate::domain::error::FaaError;
use crate::domain::request::RequestError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<RequestError> for WebError {
    fn from(err: RequestError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err.to_string())
    }
}

impl From<FaaError> for WebError {
    fn from(err: FaaError) -> Self {
        let status = status_from_error(&err);
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
            return Self::new(status, format!("Internal server error: {err}"));
        }
        Self::new(status, err.to_string())
    }
}

pub fn status_from_error(err: &FaaError) -> StatusCode {
    if err.is_calculation() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}
