//! GitHub REST client.

use std::{collections::BTreeMap, time::Duration};

use reqwest::{Client, Response, StatusCode, header};
use rusty_core::{
  github::{CommitWeek, GitHubUser, RateLimit, RepoPage, RepoQuery, Repository},
  source::CodeHost,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{Error, Result, USER_AGENT};

const API_VERSION: &str = "2022-11-28";

/// Connection settings for the GitHub API.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
  pub api_base: String,
  /// The account whose repositories are shown.
  pub username: String,
  /// Optional personal access token; raises the hourly quota from 60 to 5000.
  pub token:    Option<String>,
}

impl GitHubConfig {
  pub fn new(username: impl Into<String>, token: Option<String>) -> Self {
    Self {
      api_base: "https://api.github.com".to_string(),
      username: username.into(),
      token,
    }
  }
}

#[derive(Clone)]
pub struct GitHubClient {
  client: Client,
  config: GitHubConfig,
}

impl GitHubClient {
  pub fn new(config: GitHubConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .user_agent(USER_AGENT)
      .build()?;
    Ok(Self { client, config })
  }

  pub fn username(&self) -> &str { &self.config.username }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
  }

  /// GET `path` with GitHub's headers; non-2xx becomes [`Error::Status`].
  async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Response> {
    let url = self.url(path);
    let mut req = self
      .client
      .get(&url)
      .query(query)
      .header(header::ACCEPT, "application/vnd.github+json")
      .header("X-GitHub-Api-Version", API_VERSION);
    if let Some(token) = &self.config.token {
      req = req.bearer_auth(token);
    }

    let resp = req.send().await?;
    if !resp.status().is_success() {
      return Err(Error::Status { status: resp.status(), url });
    }
    Ok(resp)
  }
}

#[derive(Deserialize)]
struct RateLimitEnvelope {
  rate: RateLimit,
}

impl CodeHost for GitHubClient {
  type Error = Error;

  async fn rate_limit(&self) -> Result<RateLimit> {
    let envelope: RateLimitEnvelope = self.get("/rate_limit", &[]).await?.json().await?;
    tracing::debug!(
      remaining = envelope.rate.remaining,
      limit = envelope.rate.limit,
      "github rate limit"
    );
    Ok(envelope.rate)
  }

  async fn list_repos(&self, query: &RepoQuery) -> Result<RepoPage> {
    let path = format!("/users/{}/repos", self.config.username);
    let resp = self
      .get(&path, &[
        ("sort", query.sort.as_str().to_string()),
        ("direction", "desc".to_string()),
        ("per_page", query.per_page.to_string()),
        ("page", query.page.to_string()),
        ("type", "owner".to_string()),
      ])
      .await?;

    let total_pages = resp
      .headers()
      .get(header::LINK)
      .and_then(|v| v.to_str().ok())
      .and_then(parse_last_page)
      .unwrap_or(1);
    let repos: Vec<Repository> = resp.json().await?;

    Ok(RepoPage { repos, total_pages })
  }

  async fn commit_activity(&self, repo: &str) -> Result<Option<Vec<CommitWeek>>> {
    let path = format!("/repos/{}/{repo}/stats/commit_activity", self.config.username);
    let resp = self.get(&path, &[]).await?;

    // 202 means GitHub is still computing the statistics.
    if matches!(resp.status(), StatusCode::ACCEPTED | StatusCode::NO_CONTENT) {
      tracing::info!(repo, "commit activity not ready yet");
      return Ok(None);
    }

    let body: Value = resp.json().await?;
    let activity = normalize_activity(body)?;
    match &activity {
      Some(weeks) => tracing::info!(
        repo,
        commits = rusty_core::github::total_commits(weeks),
        "commits in the last year"
      ),
      None => tracing::info!(repo, "no commit activity data"),
    }
    Ok(activity)
  }

  async fn languages(&self, repo: &str) -> Result<BTreeMap<String, u64>> {
    let path = format!("/repos/{}/{repo}/languages", self.config.username);
    Ok(self.get(&path, &[]).await?.json().await?)
  }

  async fn user(&self) -> Result<Option<GitHubUser>> {
    let path = format!("/users/{}", self.config.username);
    match self.get(&path, &[]).await {
      Ok(resp) => Ok(Some(resp.json().await?)),
      Err(Error::Status { status, .. }) => {
        tracing::warn!(%status, "github user lookup failed");
        Ok(None)
      }
      Err(e) => Err(e),
    }
  }
}

/// Turn a commit-activity body into weeks, or `None` for anything other than
/// a non-empty array. Weeks without a `days` array get seven zeros.
pub fn normalize_activity(body: Value) -> Result<Option<Vec<CommitWeek>>> {
  match body {
    Value::Array(items) if !items.is_empty() => {
      let mut weeks: Vec<CommitWeek> = serde_json::from_value(Value::Array(items))?;
      for week in &mut weeks {
        if week.days.is_empty() {
          week.days = vec![0; 7];
        }
      }
      Ok(Some(weeks))
    }
    _ => Ok(None),
  }
}

/// Extract the `page` number of the `rel="last"` entry of a `Link` header.
pub fn parse_last_page(link: &str) -> Option<u32> {
  link
    .split(',')
    .find(|part| part.contains(r#"rel="last""#))
    .and_then(|part| {
      let start = part.find('<')? + 1;
      let end = part.find('>')?;
      part.get(start..end)
    })
    .and_then(|url| url.split_once('?').map(|(_, query)| query))
    .and_then(|query| {
      query
        .split('&')
        .find_map(|pair| pair.strip_prefix("page="))
        .and_then(|page| page.parse().ok())
    })
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn last_page_is_read_from_link_header() {
    let link = concat!(
      r#"<https://api.github.com/user/1/repos?sort=updated&per_page=20&page=2>; rel="next", "#,
      r#"<https://api.github.com/user/1/repos?sort=updated&per_page=20&page=5>; rel="last""#,
    );
    assert_eq!(parse_last_page(link), Some(5));
  }

  #[test]
  fn link_without_last_gives_none() {
    let link = r#"<https://api.github.com/user/1/repos?page=1>; rel="prev""#;
    assert_eq!(parse_last_page(link), None);
    assert_eq!(parse_last_page(""), None);
  }

  #[test]
  fn activity_body_shapes() {
    assert_eq!(normalize_activity(json!({})).unwrap(), None);
    assert_eq!(normalize_activity(json!([])).unwrap(), None);

    let weeks = normalize_activity(json!([
      { "week": 1704585600, "days": [0, 3, 0, 0, 5, 0, 0], "total": 8 },
      { "week": 1705190400 }
    ]))
    .unwrap()
    .unwrap();
    assert_eq!(weeks.len(), 2);
    assert_eq!(weeks[0].total, 8);
    assert_eq!(weeks[1].days, vec![0; 7]);
    assert_eq!(weeks[1].total, 0);
  }

  #[test]
  fn default_config_targets_public_api() {
    let config = GitHubConfig::new("mrrustybutter", None);
    let client = GitHubClient::new(config).unwrap();
    assert_eq!(
      client.url("/users/mrrustybutter"),
      "https://api.github.com/users/mrrustybutter"
    );
  }
}
