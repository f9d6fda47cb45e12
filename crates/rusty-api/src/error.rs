//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("rate limit too low: {remaining} requests remaining")]
  RateLimited { remaining: u32 },

  #[error("{error}: {message}")]
  Unavailable { error: &'static str, message: &'static str },

  #[error("{error}")]
  Upstream { error: &'static str, message: Option<String> },
}

impl ApiError {
  /// A 500 carrying the upstream failure as its `message`.
  pub fn upstream(error: &'static str, source: impl std::fmt::Display) -> Self {
    Self::Upstream { error, message: Some(source.to_string()) }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::RateLimited { remaining } => (
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": "Rate limit too low", "remaining": remaining }),
      ),
      ApiError::Unavailable { error, message } => (
        StatusCode::SERVICE_UNAVAILABLE,
        json!({ "error": error, "message": message }),
      ),
      ApiError::Upstream { error, message: Some(message) } => (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": error, "message": message }),
      ),
      ApiError::Upstream { error, message: None } => {
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": error }))
      }
    };
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(body)).into_response()
  }
}
