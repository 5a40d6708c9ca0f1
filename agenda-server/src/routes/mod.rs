pub mod api;
pub mod health;
pub mod pages;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An internal failure, reported to clients only as a fixed message.
///
/// The underlying error is logged, never sent.
pub struct AppError {
    message: &'static str,
    source: anyhow::Error,
}

impl AppError {
    pub fn new(message: &'static str, source: impl Into<anyhow::Error>) -> Self {
        AppError {
            message,
            source: source.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = ?self.source, "{}", self.message);
        let body = Json(ErrorResponse {
            error: self.message.to_string(),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
