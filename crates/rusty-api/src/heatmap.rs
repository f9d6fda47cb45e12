//! Server-side heat-maps.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/heatmap/github` | `?repo=` required |
//! | `GET`  | `/heatmap/twitch` | `?username=` optional |
//!
//! Both accept `weeks`, `width` and `compact`. An explicit `weeks` wins;
//! otherwise the count comes from [`select_week_count`], which yields a full
//! year when no width is given.

use axum::{
  Json,
  extract::{Query, State},
};
use rusty_core::{
  Heatmap,
  github::{self, CommitCount},
  heatmap::today,
  layout::{MAX_WEEKS, select_week_count},
  source::{CodeHost, StreamHost},
  twitch::{self, StreamRecord},
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct HeatmapParams {
  pub repo:     Option<String>,
  pub username: Option<String>,
  pub weeks:    Option<i64>,
  pub width:    Option<f64>,
  #[serde(default)]
  pub compact:  bool,
}

impl HeatmapParams {
  pub fn week_count(&self) -> usize {
    match self.weeks {
      Some(weeks) => weeks.clamp(1, MAX_WEEKS as i64) as usize,
      None => select_week_count(self.width.unwrap_or(f64::MAX), self.compact),
    }
  }
}

#[derive(Debug, Serialize)]
pub struct HeatmapBody<P> {
  #[serde(flatten)]
  pub heatmap:  Heatmap<P>,
  pub subtitle: String,
}

/// `GET /heatmap/github?repo=<name>`
pub async fn github<G, T>(
  State(state): State<ApiState<G, T>>,
  Query(params): Query<HeatmapParams>,
) -> Result<Json<HeatmapBody<CommitCount>>, ApiError>
where
  G: CodeHost,
  T: StreamHost,
{
  let repo = params
    .repo
    .as_deref()
    .filter(|r| !r.trim().is_empty())
    .ok_or_else(|| ApiError::BadRequest("Repository name is required".to_string()))?;

  let series = crate::github::load_activity(&state, repo).await?.value.unwrap_or_default();
  let heatmap = rusty_core::compute_heatmap(&github::to_events(&series), params.week_count(), today());

  Ok(Json(HeatmapBody { heatmap, subtitle: github::subtitle(&series) }))
}

/// `GET /heatmap/twitch[?username=<login>]`
pub async fn twitch<G, T>(
  State(state): State<ApiState<G, T>>,
  Query(params): Query<HeatmapParams>,
) -> Result<Json<HeatmapBody<StreamRecord>>, ApiError>
where
  G: CodeHost,
  T: StreamHost,
{
  let username = params
    .username
    .as_deref()
    .map(str::trim)
    .filter(|u| !u.is_empty())
    .unwrap_or(state.settings.twitch_username.as_str());

  let activity = crate::twitch::load_streams(&state, username).await?.value;
  let events = twitch::to_events(&activity.streaming_activity);
  let heatmap = rusty_core::compute_heatmap(&events, params.week_count(), today());

  Ok(Json(HeatmapBody { heatmap, subtitle: twitch::subtitle(Some(&activity)) }))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn explicit_weeks_win_and_are_clamped() {
    let params = HeatmapParams { weeks: Some(80), width: Some(100.0), ..Default::default() };
    assert_eq!(params.week_count(), 52);
    let params = HeatmapParams { weeks: Some(0), ..Default::default() };
    assert_eq!(params.week_count(), 1);
    let params = HeatmapParams { weeks: Some(-3), ..Default::default() };
    assert_eq!(params.week_count(), 1);
  }

  #[test]
  fn width_and_compact_pick_the_count() {
    let narrow = HeatmapParams { width: Some(500.0), ..Default::default() };
    assert_eq!(narrow.week_count(), 26);
    let compact = HeatmapParams { width: Some(2_000.0), compact: true, ..Default::default() };
    assert_eq!(compact.week_count(), 12);
    assert_eq!(HeatmapParams::default().week_count(), 52);
  }
}
