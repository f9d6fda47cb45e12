//! HTTP server for the Rusty Butter site.
//!
//! Mounts the [`rusty_api`] router under `/api`, adds a health check and
//! request tracing, and maps [`ServerConfig`] onto the upstream clients.

use std::time::Duration;

use axum::{Router, routing::get};
use rusty_api::{ApiSettings, ApiState, api_router};
use rusty_core::source::{CodeHost, StreamHost};
use rusty_upstream::{GitHubConfig, TwitchConfig};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `RUSTY_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  pub github_username:      String,
  pub github_token:         Option<String>,
  pub twitch_username:      String,
  pub twitch_client_id:     Option<String>,
  pub twitch_client_secret: Option<String>,
  pub repo_cache_secs:      u64,
  pub activity_cache_secs:  u64,
  pub stream_cache_secs:    u64,
  pub featured_repos:       usize,
  pub activity_repos:       usize,
  pub request_delay_ms:     u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let api = ApiSettings::default();
    Self {
      host:                 "127.0.0.1".to_string(),
      port:                 3000,
      github_username:      "mrrustybutter".to_string(),
      github_token:         None,
      twitch_username:      api.twitch_username,
      twitch_client_id:     None,
      twitch_client_secret: None,
      repo_cache_secs:      api.repo_cache_ttl.as_secs(),
      activity_cache_secs:  api.activity_cache_ttl.as_secs(),
      stream_cache_secs:    api.stream_cache_ttl.as_secs(),
      featured_repos:       api.featured_repos,
      activity_repos:       api.activity_repos,
      request_delay_ms:     api.request_delay.as_millis() as u64,
    }
  }
}

fn non_empty(value: &Option<String>) -> Option<String> {
  value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn github_config(&self) -> GitHubConfig {
    GitHubConfig::new(&self.github_username, non_empty(&self.github_token))
  }

  /// `None` unless both the client id and secret are set.
  pub fn twitch_config(&self) -> Option<TwitchConfig> {
    let id = non_empty(&self.twitch_client_id)?;
    let secret = non_empty(&self.twitch_client_secret)?;
    Some(TwitchConfig::new(id, secret))
  }

  pub fn api_settings(&self) -> ApiSettings {
    ApiSettings {
      twitch_username:    self.twitch_username.clone(),
      featured_repos:     self.featured_repos,
      activity_repos:     self.activity_repos.min(self.featured_repos),
      request_delay:      Duration::from_millis(self.request_delay_ms),
      repo_cache_ttl:     Duration::from_secs(self.repo_cache_secs),
      activity_cache_ttl: Duration::from_secs(self.activity_cache_secs),
      stream_cache_ttl:   Duration::from_secs(self.stream_cache_secs),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: `/api/*`, `/health`, request tracing.
pub fn app<G, T>(state: ApiState<G, T>) -> Router
where
  G: CodeHost + 'static,
  T: StreamHost + 'static,
{
  Router::new()
    .route("/health", get(health))
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str { "ok" }

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use rusty_upstream::{GitHubClient, TwitchClient};
  use tower::ServiceExt as _;

  use super::*;

  fn offline_app() -> Router {
    let config = ServerConfig::default();
    let github = GitHubClient::new(config.github_config()).unwrap();
    let state: ApiState<GitHubClient, TwitchClient> =
      ApiState::new(github, None, config.api_settings());
    app(state)
  }

  async fn send(app: Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
  }

  #[tokio::test]
  async fn health_is_ok() {
    let (status, body) = send(offline_app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
  }

  #[tokio::test]
  async fn api_is_nested() {
    let (status, body) = send(offline_app(), "/api/auth/callback?code=a&state=b").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"success\":true"));

    let (status, _) = send(offline_app(), "/auth/callback").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn streams_without_credentials_are_unavailable() {
    let (status, body) = send(offline_app(), "/api/twitch/streams").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.contains("Twitch API credentials not configured"));
  }

  #[test]
  fn twitch_needs_both_credentials() {
    let mut config = ServerConfig {
      twitch_client_id: Some("id".to_string()),
      ..ServerConfig::default()
    };
    assert!(config.twitch_config().is_none());
    config.twitch_client_secret = Some("  ".to_string());
    assert!(config.twitch_config().is_none());
    config.twitch_client_secret = Some("secret".to_string());
    assert_eq!(config.twitch_config().unwrap().client_id, "id");
  }

  #[test]
  fn config_layers_file_and_defaults() {
    let settings = config::Config::builder()
      .add_source(config::File::from_str(
        "port = 8080\ngithub_token = \"\"\nrepo_cache_secs = 60\n",
        config::FileFormat::Toml,
      ))
      .build()
      .unwrap();
    let config: ServerConfig = settings.try_deserialize().unwrap();

    assert_eq!(config.port, 8080);
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.github_config().token, None);

    let api = config.api_settings();
    assert_eq!(api.repo_cache_ttl, Duration::from_secs(60));
    assert_eq!(api.stream_cache_ttl, Duration::from_secs(300));
    assert_eq!(api.activity_repos, 3);
  }
}
