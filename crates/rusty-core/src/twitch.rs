//! Twitch stream types and the streaming-activity adapter.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{DatedEvent, display_date};

/// Stream length in hours that maps to full intensity.
pub const HOURS_FOR_FULL_INTENSITY: f64 = 8.0;

// ─── Streams ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
  /// Currently broadcasting.
  Live,
  /// An archived past broadcast.
  Vod,
}

/// A live broadcast or archived VOD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRecord {
  pub id:         String,
  pub title:      String,
  /// When the broadcast started.
  pub date:       DateTime<Utc>,
  /// Length in hours.
  pub duration:   f64,
  pub view_count: u64,
  pub url:        String,
  pub thumbnail:  String,
  #[serde(rename = "type")]
  pub kind:       StreamKind,
}

/// Channel metadata from Helix `/channels`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
  pub broadcaster_id:       String,
  pub broadcaster_login:    String,
  pub broadcaster_name:     String,
  #[serde(default)]
  pub broadcaster_language: String,
  #[serde(default)]
  pub game_name:            String,
  #[serde(default)]
  pub title:                String,
  #[serde(default)]
  pub tags:                 Vec<String>,
}

/// An in-progress broadcast from Helix `/streams`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentStream {
  pub id:            String,
  pub user_login:    String,
  pub title:         String,
  #[serde(default)]
  pub viewer_count:  u64,
  pub started_at:    DateTime<Utc>,
  #[serde(default)]
  pub game_name:     String,
  /// Template URL containing `{width}` and `{height}` placeholders.
  pub thumbnail_url: String,
}

/// Everything the site shows about a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelActivity {
  pub is_live:            bool,
  pub current_stream:     Option<CurrentStream>,
  pub channel:            Option<Channel>,
  /// Newest first; a live broadcast, if any, comes first.
  pub streaming_activity: Vec<StreamRecord>,
  /// Archived broadcasts only.
  pub total_streams:      usize,
  pub last_updated:       DateTime<Utc>,
}

// ─── Adapter ─────────────────────────────────────────────────────────────────

/// One event per stream; intensity is the stream length against an 8-hour
/// day.
///
/// Streams sharing a date are all emitted. The heat-map's duplicate policy
/// decides which one a cell shows.
pub fn to_events(streams: &[StreamRecord]) -> Vec<DatedEvent<StreamRecord>> {
  streams
    .iter()
    .map(|stream| {
      DatedEvent::new(
        stream.date.date_naive(),
        stream.duration / HOURS_FOR_FULL_INTENSITY,
        stream.clone(),
      )
    })
    .collect()
}

/// What a click on a stream cell hands to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamClick {
  pub id:        String,
  pub title:     String,
  /// Display form, `m/d/yyyy`.
  pub date:      String,
  /// Whole hours.
  pub duration:  u32,
  pub viewers:   u64,
  pub url:       String,
  pub thumbnail: String,
  #[serde(rename = "type")]
  pub kind:      StreamKind,
}

impl From<&StreamRecord> for StreamClick {
  fn from(stream: &StreamRecord) -> Self {
    Self {
      id:        stream.id.clone(),
      title:     stream.title.clone(),
      date:      display_date(stream.date.date_naive()),
      duration:  rounded_hours(stream.duration),
      viewers:   stream.view_count,
      url:       stream.url.clone(),
      thumbnail: stream.thumbnail.clone(),
      kind:      stream.kind,
    }
  }
}

/// Tooltip lines for a stream cell.
pub fn tooltip(stream: &StreamRecord, date: NaiveDate) -> Vec<String> {
  let mut lines = vec![
    stream.title.clone(),
    format!(
      "{} • {}h • {} views",
      display_date(date),
      rounded_hours(stream.duration),
      stream.view_count
    ),
  ];
  if stream.kind == StreamKind::Live {
    lines.push("● LIVE NOW".to_string());
  }
  lines
}

/// Heat-map subtitle for a channel.
pub fn subtitle(activity: Option<&ChannelActivity>) -> String {
  format!("{} streams", activity.map_or(0, |a| a.total_streams))
}

fn rounded_hours(hours: f64) -> u32 {
  if hours.is_finite() { hours.round().clamp(0.0, f64::from(u32::MAX)) as u32 } else { 0 }
}
