//! Async HTTP client wrapping the site's JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use rusty_core::{
  github::{RepoActivity, RepoListing},
  twitch::ChannelActivity,
};
use serde::de::DeserializeOwned;

/// Repositories requested for the list pane.
const LIST_PAGE_SIZE: u32 = 100;

/// Connection settings for the site API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// Async HTTP client for the site API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  async fn get_json<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<T> {
    let resp = self
      .client
      .get(self.url(path))
      .query(query)
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;

    let status = resp.status();
    if !status.is_success() {
      let detail = resp
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| body.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_default();
      return Err(anyhow!("GET {path} → {status} {detail}"));
    }
    resp.json().await.with_context(|| format!("deserialising {path}"))
  }

  // ── GitHub ────────────────────────────────────────────────────────────────

  /// `GET /api/github/repos?page=<page>&per_page=100`
  pub async fn list_repos(&self, page: u32) -> Result<RepoListing> {
    self
      .get_json("/github/repos", &[
        ("page", page.to_string()),
        ("per_page", LIST_PAGE_SIZE.to_string()),
      ])
      .await
  }

  /// `GET /api/github-repo-activity?repo=<name>`
  pub async fn repo_activity(&self, repo: &str) -> Result<RepoActivity> {
    self
      .get_json("/github-repo-activity", &[("repo", repo.to_string())])
      .await
  }

  // ── Twitch ────────────────────────────────────────────────────────────────

  /// `GET /api/twitch/streams[?username=<login>]`
  pub async fn streams(&self, username: Option<&str>) -> Result<ChannelActivity> {
    let query: Vec<(&str, String)> =
      username.map(|u| ("username", u.to_string())).into_iter().collect();
    self.get_json("/twitch/streams", &query).await
  }
}
