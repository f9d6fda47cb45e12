//! Twitch Helix client with app-access-token caching.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, header};
use rusty_core::{
  source::StreamHost,
  twitch::{Channel, ChannelActivity, CurrentStream, StreamKind, StreamRecord},
};
use serde::{Deserialize, de::DeserializeOwned};
use tokio::{sync::Mutex, time::Instant};

use crate::{Error, Result, USER_AGENT};

/// Tokens are refreshed this long before Twitch says they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// How many archived broadcasts to request.
const VIDEO_PAGE_SIZE: u32 = 100;

/// Connection settings for the Twitch API.
#[derive(Debug, Clone)]
pub struct TwitchConfig {
  pub client_id:     String,
  pub client_secret: String,
  pub api_base:      String,
  pub auth_base:     String,
}

impl TwitchConfig {
  pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
    Self {
      client_id:     client_id.into(),
      client_secret: client_secret.into(),
      api_base:      "https://api.twitch.tv/helix".to_string(),
      auth_base:     "https://id.twitch.tv".to_string(),
    }
  }
}

struct AppToken {
  access_token: String,
  expires_at:   Instant,
}

pub struct TwitchClient {
  client: Client,
  config: TwitchConfig,
  token:  Mutex<Option<AppToken>>,
}

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TokenResponse {
  access_token: String,
  expires_in:   u64,
}

#[derive(Deserialize)]
struct Envelope<T> {
  data: Vec<T>,
}

#[derive(Deserialize)]
struct HelixUser {
  id: String,
}

#[derive(Debug, Deserialize)]
struct HelixVideo {
  id:            String,
  title:         String,
  created_at:    DateTime<Utc>,
  duration:      String,
  #[serde(default)]
  view_count:    u64,
  url:           String,
  #[serde(default)]
  thumbnail_url: String,
}

// ─── Client ───────────────────────────────────────────────────────────────────

impl TwitchClient {
  pub fn new(config: TwitchConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .user_agent(USER_AGENT)
      .build()?;
    Ok(Self { client, config, token: Mutex::new(None) })
  }

  /// Return the cached app token, requesting a new one when it is missing or
  /// about to expire.
  async fn access_token(&self) -> Result<String> {
    let mut guard = self.token.lock().await;
    if let Some(token) = guard.as_ref()
      && Instant::now() < token.expires_at
    {
      return Ok(token.access_token.clone());
    }

    let url = format!("{}/oauth2/token", self.config.auth_base.trim_end_matches('/'));
    let resp = self
      .client
      .post(&url)
      .form(&[
        ("client_id", self.config.client_id.as_str()),
        ("client_secret", self.config.client_secret.as_str()),
        ("grant_type", "client_credentials"),
      ])
      .send()
      .await?;
    if !resp.status().is_success() {
      return Err(Error::Status { status: resp.status(), url });
    }

    let body: TokenResponse = resp.json().await?;
    let lifetime = Duration::from_secs(body.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
    tracing::debug!(expires_in = body.expires_in, "fetched twitch app token");

    *guard = Some(AppToken {
      access_token: body.access_token.clone(),
      expires_at:   Instant::now() + lifetime,
    });
    Ok(body.access_token)
  }

  async fn helix<T: DeserializeOwned>(
    &self,
    token: &str,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<Vec<T>> {
    let url = format!("{}{}", self.config.api_base.trim_end_matches('/'), path);
    let resp = self
      .client
      .get(&url)
      .query(query)
      .bearer_auth(token)
      .header("Client-Id", &self.config.client_id)
      .header(header::ACCEPT, "application/json")
      .send()
      .await?;
    if !resp.status().is_success() {
      return Err(Error::Status { status: resp.status(), url });
    }
    let envelope: Envelope<T> = resp.json().await?;
    Ok(envelope.data)
  }
}

impl StreamHost for TwitchClient {
  type Error = Error;

  async fn channel_activity(&self, username: &str) -> Result<ChannelActivity> {
    let token = self.access_token().await?;

    let users: Vec<HelixUser> = self
      .helix(&token, "/users", &[("login", username.to_string())])
      .await?;
    let user_id = users
      .into_iter()
      .next()
      .map(|u| u.id)
      .ok_or_else(|| Error::UserNotFound(username.to_string()))?;

    let videos: Vec<HelixVideo> = self
      .helix(&token, "/videos", &[
        ("user_id", user_id.clone()),
        ("type", "archive".to_string()),
        ("first", VIDEO_PAGE_SIZE.to_string()),
      ])
      .await?;
    let streams: Vec<CurrentStream> = self
      .helix(&token, "/streams", &[("user_login", username.to_string())])
      .await?;
    let channels: Vec<Channel> = self
      .helix(&token, "/channels", &[("broadcaster_id", user_id)])
      .await?;

    let now = Utc::now();
    let total_streams = videos.len();
    let current_stream = streams.into_iter().next();

    let mut streaming_activity: Vec<StreamRecord> =
      videos.into_iter().map(vod_record).collect();
    if let Some(live) = &current_stream {
      streaming_activity.insert(0, live_record(username, live, now));
    }

    tracing::info!(
      username,
      is_live = current_stream.is_some(),
      total_streams,
      "fetched twitch activity"
    );

    Ok(ChannelActivity {
      is_live: current_stream.is_some(),
      current_stream,
      channel: channels.into_iter().next(),
      streaming_activity,
      total_streams,
      last_updated: now,
    })
  }
}

// ─── Mapping ──────────────────────────────────────────────────────────────────

fn vod_record(video: HelixVideo) -> StreamRecord {
  StreamRecord {
    id:         video.id,
    title:      video.title,
    date:       video.created_at,
    duration:   parse_duration(&video.duration),
    view_count: video.view_count,
    url:        video.url,
    thumbnail:  video.thumbnail_url,
    kind:       StreamKind::Vod,
  }
}

/// A synthetic record for the broadcast in progress. Its duration is the
/// number of whole hours elapsed so far.
fn live_record(username: &str, live: &CurrentStream, now: DateTime<Utc>) -> StreamRecord {
  let elapsed = (now - live.started_at).num_hours().max(0);
  StreamRecord {
    id:         "live".to_string(),
    title:      live.title.clone(),
    date:       live.started_at,
    duration:   elapsed as f64,
    view_count: live.viewer_count,
    url:        format!("https://twitch.tv/{username}"),
    thumbnail:  live
      .thumbnail_url
      .replace("{width}", "320")
      .replace("{height}", "180"),
    kind:       StreamKind::Live,
  }
}

/// Parse a Helix duration such as `2h30m15s` into hours.
///
/// Units must appear in `h`, `m`, `s` order; parsing stops at the first token
/// that breaks the pattern. Anything unparseable counts as zero.
pub fn parse_duration(duration: &str) -> f64 {
  let mut hours = 0.0;
  let mut digits = String::new();
  let mut next_unit = 0;

  for ch in duration.chars() {
    if ch.is_ascii_digit() {
      digits.push(ch);
      continue;
    }
    let (rank, scale) = match ch {
      'h' => (0, 1.0),
      'm' => (1, 1.0 / 60.0),
      's' => (2, 1.0 / 3600.0),
      _ => break,
    };
    if rank < next_unit || digits.is_empty() {
      break;
    }
    let Ok(value) = digits.parse::<u64>() else { break };
    hours += value as f64 * scale;
    digits.clear();
    next_unit = rank + 1;
  }

  hours
}
