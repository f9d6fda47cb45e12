//! Handler for `GET /twitch/streams`.

use axum::{
  Json,
  extract::{Query, State},
};
use rusty_core::{
  source::{CodeHost, StreamHost},
  twitch::ChannelActivity,
};
use serde::Deserialize;

use crate::{ApiState, Cached, Served, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct StreamParams {
  /// Channel login; defaults to the configured channel.
  pub username: Option<String>,
}

impl StreamParams {
  pub fn username_or<'a>(&'a self, fallback: &'a str) -> &'a str {
    self.username.as_deref().map(str::trim).filter(|u| !u.is_empty()).unwrap_or(fallback)
  }
}

/// `GET /twitch/streams[?username=<login>]`
pub async fn streams<G, T>(
  State(state): State<ApiState<G, T>>,
  Query(params): Query<StreamParams>,
) -> Result<Json<Served<ChannelActivity>>, ApiError>
where
  G: CodeHost,
  T: StreamHost,
{
  let username = params.username_or(&state.settings.twitch_username);
  Ok(Json(load_streams(&state, username).await?.into()))
}

/// Channel activity for `username` through the stream cache.
pub(crate) async fn load_streams<G, T>(
  state: &ApiState<G, T>,
  username: &str,
) -> Result<Cached<ChannelActivity>, ApiError>
where
  G: CodeHost,
  T: StreamHost,
{
  let twitch = state.twitch.as_deref().ok_or(ApiError::Unavailable {
    error:   "Twitch API credentials not configured",
    message: "Set twitch_client_id and twitch_client_secret to enable stream data",
  })?;

  state
    .caches
    .streams
    .get_or_fetch(username.to_lowercase(), || async {
      twitch.channel_activity(username).await.map_err(|e| {
        tracing::error!(username, error = %e, "twitch request failed");
        ApiError::Upstream { error: "Failed to fetch Twitch data", message: None }
      })
    })
    .await
}
