//! OAuth callback stub.
//!
//! The code is logged and echoed back; it is never exchanged for a token.

use axum::{
  Json,
  extract::Query,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
  pub code:  Option<String>,
  pub state: Option<String>,
  pub error: Option<String>,
}

/// `GET /auth/callback?code=<code>&state=<state>[&error=<error>]`
pub async fn callback(Query(params): Query<CallbackParams>) -> impl IntoResponse {
  if let Some(error) = params.error {
    tracing::warn!(%error, "oauth provider returned an error");
    return (
      StatusCode::BAD_REQUEST,
      Json(json!({ "error": "Authentication failed", "details": error })),
    );
  }

  match (params.code, params.state) {
    (Some(code), Some(state)) => {
      tracing::info!(%code, %state, "oauth callback received");
      (
        StatusCode::OK,
        Json(json!({
          "success": true,
          "message": "OAuth callback received successfully",
          "code": code,
          "state": state,
        })),
      )
    }
    _ => (
      StatusCode::BAD_REQUEST,
      Json(json!({ "error": "Missing required parameters" })),
    ),
  }
}

/// `POST /auth/callback`
pub async fn callback_post() -> Json<serde_json::Value> {
  Json(json!({ "message": "POST method not implemented yet" }))
}
