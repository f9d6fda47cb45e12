//! JSON API for the Rusty Butter site.
//!
//! Exposes an axum [`Router`] backed by any [`CodeHost`] and, optionally, any
//! [`StreamHost`]. Responses from the hosts are cached in [`TtlCache`]s held in
//! the router state.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", rusty_api::api_router(state))
//! ```

pub mod auth;
pub mod cache;
pub mod error;
pub mod github;
pub mod heatmap;
pub mod twitch;

use std::{sync::Arc, time::Duration};

use axum::{Router, routing::get};
use rusty_core::{
  github::{CommitWeek, RepoListing},
  source::{CodeHost, StreamHost},
  twitch::ChannelActivity,
};
use serde::Serialize;

pub use cache::{Cached, TtlCache};
pub use error::ApiError;

use github::GitHubOverview;

// ─── Settings ─────────────────────────────────────────────────────────────────

/// Tunables for the API handlers.
#[derive(Debug, Clone)]
pub struct ApiSettings {
  /// Channel shown when `/twitch/streams` is called without `username`.
  pub twitch_username:    String,
  /// Repositories kept by `/github-data`.
  pub featured_repos:     usize,
  /// Of those, how many get commit activity.
  pub activity_repos:     usize,
  /// Pause between consecutive commit-activity calls.
  pub request_delay:      Duration,
  pub repo_cache_ttl:     Duration,
  pub activity_cache_ttl: Duration,
  pub stream_cache_ttl:   Duration,
}

impl Default for ApiSettings {
  fn default() -> Self {
    Self {
      twitch_username:    "mrrustybutter".to_string(),
      featured_repos:     6,
      activity_repos:     3,
      request_delay:      Duration::from_millis(100),
      repo_cache_ttl:     Duration::from_secs(10 * 60),
      activity_cache_ttl: Duration::from_secs(5 * 60),
      stream_cache_ttl:   Duration::from_secs(5 * 60),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

pub struct Caches {
  pub overview: TtlCache<(), GitHubOverview>,
  pub repos:    TtlCache<String, RepoListing>,
  pub activity: TtlCache<String, Option<Vec<CommitWeek>>>,
  pub streams:  TtlCache<String, ChannelActivity>,
}

impl Caches {
  pub fn new(settings: &ApiSettings) -> Self {
    Self {
      overview: TtlCache::new(settings.activity_cache_ttl),
      repos:    TtlCache::new(settings.repo_cache_ttl),
      activity: TtlCache::new(settings.activity_cache_ttl),
      streams:  TtlCache::new(settings.stream_cache_ttl),
    }
  }
}

/// Shared state threaded through all handlers.
pub struct ApiState<G, T> {
  pub github:   Arc<G>,
  /// `None` when no Twitch credentials are configured.
  pub twitch:   Option<Arc<T>>,
  pub settings: Arc<ApiSettings>,
  pub caches:   Arc<Caches>,
}

impl<G, T> Clone for ApiState<G, T> {
  fn clone(&self) -> Self {
    Self {
      github:   self.github.clone(),
      twitch:   self.twitch.clone(),
      settings: self.settings.clone(),
      caches:   self.caches.clone(),
    }
  }
}

impl<G, T> ApiState<G, T> {
  pub fn new(github: G, twitch: Option<T>, settings: ApiSettings) -> Self {
    let caches = Caches::new(&settings);
    Self {
      github:   Arc::new(github),
      twitch:   twitch.map(Arc::new),
      settings: Arc::new(settings),
      caches:   Arc::new(caches),
    }
  }
}

/// A response body plus the flags set when it came from an expired entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Served<B> {
  #[serde(flatten)]
  pub body:          B,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub from_cache:    bool,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub cache_expired: bool,
}

impl<B> From<Cached<B>> for Served<B> {
  fn from(cached: Cached<B>) -> Self {
    Self { body: cached.value, from_cache: cached.stale, cache_expired: cached.stale }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<G, T>(state: ApiState<G, T>) -> Router<()>
where
  G: CodeHost + 'static,
  T: StreamHost + 'static,
{
  Router::new()
    // GitHub
    .route("/github-data", get(github::overview::<G, T>))
    .route("/github-repo-activity", get(github::repo_activity::<G, T>))
    .route("/github/repos", get(github::repos::<G, T>))
    // Twitch
    .route("/twitch/streams", get(twitch::streams::<G, T>))
    // Heat-maps
    .route("/heatmap/github", get(heatmap::github::<G, T>))
    .route("/heatmap/twitch", get(heatmap::twitch::<G, T>))
    // Auth
    .route("/auth/callback", get(auth::callback).post(auth::callback_post))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::{
    collections::BTreeMap,
    sync::{
      Mutex,
      atomic::{AtomicBool, AtomicUsize, Ordering},
    },
  };

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use chrono::{DateTime, Datelike, Days, TimeZone, Utc};
  use rusty_core::{
    github::{GitHubUser, RateLimit, RepoPage, RepoQuery, Repository},
    heatmap::today,
    twitch::{StreamKind, StreamRecord},
  };
  use serde_json::Value;
  use tower::ServiceExt as _;

  use super::*;

  #[derive(Debug, thiserror::Error)]
  #[error("fake upstream failure")]
  struct FakeError;

  // ── Fakes ───────────────────────────────────────────────────────────────────

  struct FakeGitHub {
    repos:          Vec<Repository>,
    remaining:      u32,
    fail:           AtomicBool,
    list_calls:     AtomicUsize,
    activity_calls: Mutex<Vec<String>>,
  }

  impl FakeGitHub {
    fn new(repos: Vec<Repository>) -> Self {
      Self {
        repos,
        remaining: 4_000,
        fail: AtomicBool::new(false),
        list_calls: AtomicUsize::new(0),
        activity_calls: Mutex::new(Vec::new()),
      }
    }

    fn check(&self) -> Result<(), FakeError> {
      if self.fail.load(Ordering::SeqCst) { Err(FakeError) } else { Ok(()) }
    }
  }

  /// The week starting the Sunday before this one, with commits every day.
  fn recent_week() -> CommitWeek {
    let today = today();
    let back = u64::from(today.weekday().num_days_from_sunday()) + 7;
    let sunday = today - Days::new(back);
    let week = Utc
      .from_utc_datetime(&sunday.and_hms_opt(0, 0, 0).unwrap())
      .timestamp();
    CommitWeek { week, days: vec![1, 2, 3, 4, 5, 6, 7], total: 28 }
  }

  impl CodeHost for FakeGitHub {
    type Error = FakeError;

    async fn rate_limit(&self) -> Result<RateLimit, FakeError> {
      Ok(RateLimit { limit: 5_000, remaining: self.remaining })
    }

    async fn list_repos(&self, query: &RepoQuery) -> Result<RepoPage, FakeError> {
      self.check()?;
      self.list_calls.fetch_add(1, Ordering::SeqCst);
      Ok(RepoPage { repos: self.repos.clone(), total_pages: query.page + 1 })
    }

    async fn commit_activity(&self, repo: &str) -> Result<Option<Vec<CommitWeek>>, FakeError> {
      self.check()?;
      self.activity_calls.lock().unwrap().push(repo.to_string());
      if repo == "quiet" { Ok(None) } else { Ok(Some(vec![recent_week()])) }
    }

    async fn languages(&self, _repo: &str) -> Result<BTreeMap<String, u64>, FakeError> {
      Ok(BTreeMap::from([("Rust".to_string(), 1_000), ("Nix".to_string(), 10)]))
    }

    async fn user(&self) -> Result<Option<GitHubUser>, FakeError> {
      Ok(Some(GitHubUser {
        login:        "mrrustybutter".to_string(),
        name:         Some("Rusty Butter".to_string()),
        avatar_url:   String::new(),
        bio:          None,
        public_repos: 8,
        followers:    100,
        following:    1,
      }))
    }
  }

  struct FakeTwitch;

  impl StreamHost for FakeTwitch {
    type Error = FakeError;

    async fn channel_activity(&self, username: &str) -> Result<ChannelActivity, FakeError> {
      if username == "nobody" {
        return Err(FakeError);
      }
      let now = Utc::now();
      Ok(ChannelActivity {
        is_live:            false,
        current_stream:     None,
        channel:            None,
        streaming_activity: vec![StreamRecord {
          id:         "v1".to_string(),
          title:      format!("{username} builds things"),
          date:       now - chrono::Duration::days(1),
          duration:   4.0,
          view_count: 10,
          url:        "https://www.twitch.tv/videos/v1".to_string(),
          thumbnail:  String::new(),
          kind:       StreamKind::Vod,
        }],
        total_streams:      1,
        last_updated:       now,
      })
    }
  }

  fn repo(name: &str, stars: u32, updated: DateTime<Utc>, fork: bool) -> Repository {
    Repository {
      id: 1,
      name: name.to_string(),
      full_name: format!("mrrustybutter/{name}"),
      description: Some(format!("{name} description")),
      html_url: format!("https://github.com/mrrustybutter/{name}"),
      language: Some("Rust".to_string()),
      stargazers_count: stars,
      forks_count: 0,
      open_issues_count: 0,
      created_at: updated,
      updated_at: updated,
      pushed_at: Some(updated),
      topics: vec![],
      homepage: None,
      private: false,
      fork,
    }
  }

  fn sample_repos() -> Vec<Repository> {
    let at = |d| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap();
    vec![
      repo("forked", 99, at(1), true),
      repo("quiet", 1, at(2), false),
      repo("site", 10, at(3), false),
      repo("bot", 10, at(4), false),
      repo("tools", 5, at(5), false),
      repo("notes", 4, at(6), false),
      repo("dots", 3, at(7), false),
      repo("extra", 2, at(8), false),
    ]
  }

  fn settings() -> ApiSettings {
    ApiSettings { request_delay: Duration::ZERO, ..ApiSettings::default() }
  }

  type State = ApiState<FakeGitHub, FakeTwitch>;

  fn state_with(github: FakeGitHub, settings: ApiSettings) -> State {
    ApiState::new(github, Some(FakeTwitch), settings)
  }

  async fn get_json(state: State, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = api_router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  // ── /github-data ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn overview_ranks_and_enriches_top_repos() {
    let state = state_with(FakeGitHub::new(sample_repos()), settings());
    let (status, body) = get_json(state.clone(), "/github-data").await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["repos"]
      .as_array()
      .unwrap()
      .iter()
      .map(|r| r["name"].as_str().unwrap())
      .collect();
    assert_eq!(names, ["bot", "site", "tools", "notes", "dots", "extra"]);
    assert_eq!(body["source"], "github-api-live");
    assert_eq!(body["pagination"]["totalRepos"], 6);
    assert!(body["repos"][0]["commitActivity"].is_array());
    assert!(body["repos"][3].get("commitActivity").is_none());

    let calls = state.github.activity_calls.lock().unwrap().clone();
    assert_eq!(calls, ["bot", "site", "tools"]);
  }

  #[tokio::test]
  async fn overview_refuses_when_quota_is_low() {
    let mut github = FakeGitHub::new(sample_repos());
    github.remaining = 9;
    let (status, body) = get_json(state_with(github, settings()), "/github-data").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Rate limit too low");
    assert_eq!(body["remaining"], 9);
  }

  #[tokio::test]
  async fn overview_failure_is_a_500() {
    let github = FakeGitHub::new(sample_repos());
    github.fail.store(true, Ordering::SeqCst);
    let (status, body) = get_json(state_with(github, settings()), "/github-data").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch GitHub data");
    assert_eq!(body["message"], "fake upstream failure");
  }

  // ── /github-repo-activity ───────────────────────────────────────────────────

  #[tokio::test]
  async fn repo_activity_requires_a_repo() {
    let state = state_with(FakeGitHub::new(vec![]), settings());
    let (status, body) = get_json(state, "/github-repo-activity").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Repository name is required");
  }

  #[tokio::test]
  async fn repo_activity_reports_totals_or_null() {
    let state = state_with(FakeGitHub::new(vec![]), settings());

    let (status, body) = get_json(state.clone(), "/github-repo-activity?repo=site").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["repoName"], "site");
    assert_eq!(body["totalCommits"], 28);

    let (status, body) = get_json(state, "/github-repo-activity?repo=quiet").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["commitActivity"].is_null());
    assert!(body["message"].is_string());
  }

  #[tokio::test]
  async fn repo_activity_has_a_lower_quota_floor() {
    let mut github = FakeGitHub::new(vec![]);
    github.remaining = 7;
    let state = state_with(github, settings());
    let (status, _) = get_json(state.clone(), "/github-repo-activity?repo=site").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get_json(state, "/github-data").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
  }

  // ── /github/repos ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn repos_listing_is_cached_per_key() {
    let state = state_with(FakeGitHub::new(sample_repos()), settings());

    let (status, body) = get_json(state.clone(), "/github/repos?page=2&per_page=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cacheKey"], "updated-2-5-false");
    assert_eq!(body["pagination"]["page"], 2);
    assert_eq!(body["pagination"]["totalPages"], 3);
    assert_eq!(body["pagination"]["hasMore"], true);
    assert_eq!(body["repos"].as_array().unwrap().len(), 7);
    assert_eq!(body["user"]["name"], "Rusty Butter");
    assert!(body.get("fromCache").is_none());

    get_json(state.clone(), "/github/repos?page=2&per_page=5").await;
    assert_eq!(state.github.list_calls.load(Ordering::SeqCst), 1);

    get_json(state.clone(), "/github/repos?page=1&per_page=5").await;
    assert_eq!(state.github.list_calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn repos_details_add_languages_and_activity() {
    let state = state_with(FakeGitHub::new(sample_repos()), settings());
    let (_, body) = get_json(state, "/github/repos?details=true&sort=pushed").await;
    assert_eq!(body["cacheKey"], "pushed-1-20-true");
    let first = &body["repos"][0];
    assert_eq!(first["language"], "Rust");
    assert_eq!(first["languageColor"], "#dea584");
    assert_eq!(first["languages"]["Rust"], 1000);
    assert_eq!(first["commitActivity"].as_array().unwrap().len(), 0);
    assert_eq!(body["repos"][1]["commitActivity"].as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn repos_fall_back_to_expired_entries() {
    let expired = ApiSettings { repo_cache_ttl: Duration::ZERO, ..settings() };
    let state = state_with(FakeGitHub::new(sample_repos()), expired);

    let (status, _) = get_json(state.clone(), "/github/repos").await;
    assert_eq!(status, StatusCode::OK);

    state.github.fail.store(true, Ordering::SeqCst);
    let (status, body) = get_json(state.clone(), "/github/repos").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fromCache"], true);
    assert_eq!(body["cacheExpired"], true);

    let (status, body) = get_json(state, "/github/repos?page=9").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch GitHub data");
    assert!(body.get("message").is_none());
  }

  // ── /twitch/streams ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn streams_need_credentials() {
    let state: State = ApiState::new(FakeGitHub::new(vec![]), None, settings());
    let (status, body) = get_json(state, "/twitch/streams").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Twitch API credentials not configured");
  }

  #[tokio::test]
  async fn streams_default_to_configured_channel() {
    let state = state_with(FakeGitHub::new(vec![]), settings());
    let (status, body) = get_json(state.clone(), "/twitch/streams").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isLive"], false);
    assert_eq!(body["totalStreams"], 1);
    assert_eq!(body["streamingActivity"][0]["title"], "mrrustybutter builds things");

    let (status, body) = get_json(state, "/twitch/streams?username=nobody").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch Twitch data");
  }

  // ── /heatmap ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn github_heatmap_follows_requested_weeks() {
    let state = state_with(FakeGitHub::new(vec![]), settings());
    let (status, body) = get_json(state, "/heatmap/github?repo=site&weeks=4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["weeks"].as_array().unwrap().len(), 4);
    assert_eq!(body["subtitle"], "28 commits in the last year");
    let filled = body["weeks"]
      .as_array()
      .unwrap()
      .iter()
      .flat_map(|w| w["days"].as_array().unwrap().iter())
      .filter(|d| !d["payload"].is_null())
      .count();
    assert_eq!(filled, 7);
  }

  #[tokio::test]
  async fn out_of_range_weeks_are_clamped() {
    let state = state_with(FakeGitHub::new(vec![]), settings());
    let (status, body) = get_json(state.clone(), "/heatmap/github?repo=site&weeks=-3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["weeks"].as_array().unwrap().len(), 1);

    let (status, body) = get_json(state, "/heatmap/twitch?weeks=400").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["weeks"].as_array().unwrap().len(), 52);
  }

  #[tokio::test]
  async fn heatmap_week_count_from_width() {
    let state = state_with(FakeGitHub::new(vec![]), settings());
    let (_, body) = get_json(state.clone(), "/heatmap/twitch?width=200").await;
    assert_eq!(body["weeks"].as_array().unwrap().len(), 12);
    assert_eq!(body["subtitle"], "1 streams");

    let (_, body) = get_json(state.clone(), "/heatmap/twitch?compact=true").await;
    assert_eq!(body["weeks"].as_array().unwrap().len(), 12);

    let (_, body) = get_json(state, "/heatmap/github?repo=quiet").await;
    assert_eq!(body["weeks"].as_array().unwrap().len(), 52);
    assert_eq!(body["subtitle"], "0 commits in the last year");
  }

  // ── /auth/callback ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn auth_callback_variants() {
    let state = state_with(FakeGitHub::new(vec![]), settings());

    let (status, body) = get_json(state.clone(), "/auth/callback?error=access_denied").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "access_denied");

    let (status, body) = get_json(state.clone(), "/auth/callback?code=abc&state=xyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["code"], "abc");

    let (status, body) = get_json(state.clone(), "/auth/callback?code=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required parameters");

    let req = Request::builder()
      .method("POST")
      .uri("/auth/callback")
      .body(Body::empty())
      .unwrap();
    let resp = api_router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }
}
