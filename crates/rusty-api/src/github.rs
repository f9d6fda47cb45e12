//! Handlers for the GitHub endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/github-data` | Top repositories, activity for the first few |
//! | `GET`  | `/github-repo-activity` | `?repo=`; 400 without it |
//! | `GET`  | `/github/repos` | `?page&per_page&sort&details`; cached per query |

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::{DateTime, Utc};
use rusty_core::{
  github::{
    CommitWeek, ListingPage, RepoActivity, RepoCard, RepoListing, RepoQuery,
    RepoSort, Repository, UserCard, rank_repositories,
  },
  source::{CodeHost, StreamHost},
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, Cached, Served, error::ApiError};

/// `/github-data` refuses to run below this many remaining requests.
pub const OVERVIEW_MIN_REMAINING: u32 = 10;
/// `/github-repo-activity` refuses to run below this many remaining requests.
pub const ACTIVITY_MIN_REMAINING: u32 = 5;

/// Repositories requested for the overview before ranking.
const OVERVIEW_PAGE_SIZE: u32 = 50;

/// Fail with 429 when the quota is below `floor`. A failed quota check is
/// logged and otherwise ignored.
async fn ensure_quota<G: CodeHost>(github: &G, floor: u32) -> Result<(), ApiError> {
  match github.rate_limit().await {
    Ok(rate) if rate.remaining < floor => {
      tracing::warn!(remaining = rate.remaining, floor, "github quota too low");
      Err(ApiError::RateLimited { remaining: rate.remaining })
    }
    Ok(_) => Ok(()),
    Err(e) => {
      tracing::warn!(error = %e, "could not check github rate limit, continuing");
      Ok(())
    }
  }
}

// ─── Overview ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveRepository {
  #[serde(flatten)]
  pub repo:            Repository,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub commit_activity: Option<Vec<CommitWeek>>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewPage {
  pub current_page: u32,
  pub total_pages:  u32,
  pub has_more:     bool,
  pub total_repos:  usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubOverview {
  pub repos:        Vec<ActiveRepository>,
  pub pagination:   OverviewPage,
  pub last_updated: DateTime<Utc>,
  pub source:       &'static str,
}

/// `GET /github-data`
pub async fn overview<G, T>(
  State(state): State<ApiState<G, T>>,
) -> Result<Json<Served<GitHubOverview>>, ApiError>
where
  G: CodeHost,
  T: StreamHost,
{
  let served = state
    .caches
    .overview
    .get_or_fetch((), || fetch_overview(&state))
    .await?;
  Ok(Json(served.into()))
}

async fn fetch_overview<G, T>(state: &ApiState<G, T>) -> Result<GitHubOverview, ApiError>
where
  G: CodeHost,
  T: StreamHost,
{
  const FAILED: &str = "Failed to fetch GitHub data";
  let settings = &state.settings;

  ensure_quota(&*state.github, OVERVIEW_MIN_REMAINING).await?;

  let query = RepoQuery { sort: RepoSort::Updated, page: 1, per_page: OVERVIEW_PAGE_SIZE };
  let page = state
    .github
    .list_repos(&query)
    .await
    .map_err(|e| ApiError::upstream(FAILED, e))?;

  let mut repos: Vec<Repository> = page.repos.into_iter().filter(|r| !r.fork).collect();
  rank_repositories(&mut repos);
  repos.truncate(settings.featured_repos);

  let mut enriched = Vec::with_capacity(repos.len());
  for (i, repo) in repos.into_iter().enumerate() {
    let commit_activity = if i < settings.activity_repos {
      if i > 0 && !settings.request_delay.is_zero() {
        tokio::time::sleep(settings.request_delay).await;
      }
      match state.github.commit_activity(&repo.name).await {
        Ok(activity) => activity,
        Err(e) => {
          tracing::warn!(repo = %repo.name, error = %e, "commit activity unavailable");
          None
        }
      }
    } else {
      None
    };
    enriched.push(ActiveRepository { repo, commit_activity });
  }

  tracing::info!(repos = enriched.len(), "fetched github overview");

  Ok(GitHubOverview {
    pagination: OverviewPage {
      current_page: 1,
      total_pages:  1,
      has_more:     false,
      total_repos:  enriched.len(),
    },
    repos: enriched,
    last_updated: Utc::now(),
    source: "github-api-live",
  })
}

// ─── Repository activity ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ActivityParams {
  pub repo: Option<String>,
}

/// `GET /github-repo-activity?repo=<name>`
pub async fn repo_activity<G, T>(
  State(state): State<ApiState<G, T>>,
  Query(params): Query<ActivityParams>,
) -> Result<Json<Served<RepoActivity>>, ApiError>
where
  G: CodeHost,
  T: StreamHost,
{
  let repo = params
    .repo
    .filter(|r| !r.trim().is_empty())
    .ok_or_else(|| ApiError::BadRequest("Repository name is required".to_string()))?;

  let cached = load_activity(&state, &repo).await?;
  Ok(Json(Served {
    from_cache: cached.stale,
    cache_expired: cached.stale,
    body: RepoActivity::new(repo, cached.value),
  }))
}

/// Commit activity for `repo` through the activity cache.
pub(crate) async fn load_activity<G, T>(
  state: &ApiState<G, T>,
  repo: &str,
) -> Result<Cached<Option<Vec<CommitWeek>>>, ApiError>
where
  G: CodeHost,
  T: StreamHost,
{
  state
    .caches
    .activity
    .get_or_fetch(repo.to_string(), || async {
      ensure_quota(&*state.github, ACTIVITY_MIN_REMAINING).await?;
      state
        .github
        .commit_activity(repo)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch commit activity", e))
    })
    .await
}

// ─── Repository listing ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default = "default_page")]
  pub page:     u32,
  #[serde(default = "default_per_page")]
  pub per_page: u32,
  #[serde(default)]
  pub sort:     RepoSort,
  #[serde(default)]
  pub details:  bool,
}

fn default_page() -> u32 { 1 }

fn default_per_page() -> u32 { 20 }

impl ListParams {
  pub fn cache_key(&self) -> String {
    format!("{}-{}-{}-{}", self.sort.as_str(), self.page, self.per_page, self.details)
  }
}

/// `GET /github/repos[?page=1][&per_page=20][&sort=updated][&details=false]`
pub async fn repos<G, T>(
  State(state): State<ApiState<G, T>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Served<RepoListing>>, ApiError>
where
  G: CodeHost,
  T: StreamHost,
{
  let key = params.cache_key();
  let served = state
    .caches
    .repos
    .get_or_fetch(key.clone(), || fetch_listing(&*state.github, &params, key))
    .await?;
  Ok(Json(served.into()))
}

async fn fetch_listing<G: CodeHost>(
  github: &G,
  params: &ListParams,
  cache_key: String,
) -> Result<RepoListing, ApiError> {
  let query = RepoQuery {
    sort:     params.sort,
    page:     params.page.max(1),
    per_page: params.per_page.clamp(1, 100),
  };
  let page = github
    .list_repos(&query)
    .await
    .map_err(|e| {
      tracing::error!(page = query.page, error = %e, "listing repositories failed");
      ApiError::Upstream { error: "Failed to fetch GitHub data", message: None }
    })?;

  let mut cards = Vec::with_capacity(page.repos.len());
  for repo in page.repos.into_iter().filter(|r| !r.fork) {
    let card = if params.details {
      let (languages, activity) =
        tokio::join!(github.languages(&repo.name), github.commit_activity(&repo.name));
      let languages = languages.unwrap_or_else(|e| {
        tracing::warn!(repo = %repo.name, error = %e, "languages unavailable");
        Default::default()
      });
      let activity = activity.unwrap_or_else(|e| {
        tracing::warn!(repo = %repo.name, error = %e, "commit activity unavailable");
        None
      });
      RepoCard::new(repo, languages, activity.unwrap_or_default())
    } else {
      RepoCard::new(repo, Default::default(), Vec::new())
    };
    cards.push(card);
  }

  let user = match github.user().await {
    Ok(user) => user.map(UserCard::from),
    Err(e) => {
      tracing::warn!(error = %e, "github user unavailable");
      None
    }
  };

  tracing::info!(repos = cards.len(), cache_key = %cache_key, "fetched repository page");

  Ok(RepoListing {
    repos: cards,
    user,
    pagination: ListingPage::new(query.page, query.per_page, page.total_pages),
    last_updated: Utc::now(),
    cache_key,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cache_key_reflects_every_parameter() {
    let params: ListParams =
      serde_json::from_value(serde_json::json!({ "sort": "full_name", "details": true }))
        .unwrap();
    assert_eq!(params.cache_key(), "full_name-1-20-true");
  }
}
