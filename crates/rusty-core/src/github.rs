//! GitHub repository types and the commit-activity adapter.
//!
//! Upstream shapes keep GitHub's own field names so they round-trip through
//! the API unchanged; the adapter turns a commit-activity series into sparse
//! [`DatedEvent`]s for the heat-map.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::event::{DatedEvent, display_date};

/// Commits per day that map to full intensity.
pub const COMMITS_FOR_FULL_INTENSITY: f64 = 10.0;

// ─── Commit activity ─────────────────────────────────────────────────────────

/// One weekly bucket from `/repos/{owner}/{repo}/stats/commit_activity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitWeek {
  /// Unix seconds of the Sunday that starts the week.
  pub week:  i64,
  /// Seven daily counts, Sunday first. Anything else is treated as no data.
  #[serde(default, deserialize_with = "null_as_default")]
  pub days:  Vec<u32>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub total: u32,
}

impl CommitWeek {
  /// The UTC calendar date of the week's Sunday, if the timestamp is valid.
  pub fn week_start(&self) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(self.week, 0).map(|dt| dt.date_naive())
  }
}

/// Heat-map payload for a day with commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitCount {
  pub commits: u32,
}

/// Convert a commit-activity series into one event per day with commits.
///
/// Weeks with a missing or wrongly-sized `days` array, or an unrepresentable
/// timestamp, contribute nothing.
pub fn to_events(series: &[CommitWeek]) -> Vec<DatedEvent<CommitCount>> {
  series
    .iter()
    .filter(|week| week.days.len() == 7)
    .filter_map(|week| week.week_start().map(|start| (start, &week.days)))
    .flat_map(|(start, days)| {
      days.iter().enumerate().filter_map(move |(offset, &commits)| {
        if commits == 0 {
          return None;
        }
        let date = start.checked_add_days(Days::new(offset as u64))?;
        Some(DatedEvent::new(
          date,
          f64::from(commits) / COMMITS_FOR_FULL_INTENSITY,
          CommitCount { commits },
        ))
      })
    })
    .collect()
}

/// Sum of the weekly totals.
pub fn total_commits(series: &[CommitWeek]) -> u64 {
  series.iter().map(|w| u64::from(w.total)).sum()
}

/// Tooltip text for a commit cell.
pub fn tooltip(payload: &CommitCount, date: NaiveDate) -> String {
  format!("{} commits on {}", payload.commits, display_date(date))
}

/// Heat-map subtitle for a repository.
pub fn subtitle(series: &[CommitWeek]) -> String {
  format!("{} commits in the last year", total_commits(series))
}

// ─── Repositories ────────────────────────────────────────────────────────────

/// A repository as returned by `/users/{user}/repos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
  pub id:                u64,
  pub name:              String,
  pub full_name:         String,
  pub description:       Option<String>,
  pub html_url:          String,
  pub language:          Option<String>,
  #[serde(default)]
  pub stargazers_count:  u32,
  #[serde(default)]
  pub forks_count:       u32,
  #[serde(default)]
  pub open_issues_count: u32,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
  pub pushed_at:         Option<DateTime<Utc>>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub topics:            Vec<String>,
  pub homepage:          Option<String>,
  #[serde(default)]
  pub private:           bool,
  #[serde(default)]
  pub fork:              bool,
}

/// A GitHub account profile as returned by `/users/{user}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubUser {
  pub login:        String,
  pub name:         Option<String>,
  pub avatar_url:   String,
  pub bio:          Option<String>,
  #[serde(default)]
  pub public_repos: u32,
  #[serde(default)]
  pub followers:    u32,
  #[serde(default)]
  pub following:    u32,
}

/// Core rate-limit bucket from `/rate_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
  pub limit:     u32,
  pub remaining: u32,
}

/// Sort key accepted by the repository listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoSort {
  Created,
  #[default]
  Updated,
  Pushed,
  FullName,
}

impl RepoSort {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Created => "created",
      Self::Updated => "updated",
      Self::Pushed => "pushed",
      Self::FullName => "full_name",
    }
  }
}

/// Parameters for [`CodeHost::list_repos`](crate::source::CodeHost::list_repos).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepoQuery {
  pub sort:     RepoSort,
  pub page:     u32,
  pub per_page: u32,
}

impl Default for RepoQuery {
  fn default() -> Self { Self { sort: RepoSort::Updated, page: 1, per_page: 20 } }
}

/// One page of repositories plus the page count advertised by the host.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepoPage {
  pub repos:       Vec<Repository>,
  pub total_pages: u32,
}

/// Order repositories by stars, most recently updated first among equals.
pub fn rank_repositories(repos: &mut [Repository]) {
  repos.sort_by(|a, b| {
    b.stargazers_count
      .cmp(&a.stargazers_count)
      .then_with(|| b.updated_at.cmp(&a.updated_at))
  });
}

// ─── Languages ───────────────────────────────────────────────────────────────

pub const UNKNOWN_LANGUAGE: &str = "Unknown";
pub const FALLBACK_LANGUAGE_COLOR: &str = "#858585";

/// Display colour for a language name.
pub fn language_color(language: &str) -> &'static str {
  match language {
    "TypeScript" => "#3178c6",
    "JavaScript" => "#f1e05a",
    "Python" => "#3572A5",
    "Rust" => "#dea584",
    "Go" => "#00ADD8",
    "Java" => "#b07219",
    "Ruby" => "#701516",
    "PHP" => "#4F5D95",
    "C++" => "#f34b7d",
    "C" => "#555555",
    "C#" => "#178600",
    "Swift" => "#FA7343",
    "Kotlin" => "#A97BFF",
    "Dart" => "#00B4AB",
    "HTML" => "#e34c26",
    "CSS" => "#563d7c",
    "Vue" => "#41b883",
    _ => FALLBACK_LANGUAGE_COLOR,
  }
}

/// The language with the most bytes, or `fallback` when no breakdown exists.
pub fn primary_language(
  languages: &BTreeMap<String, u64>,
  fallback: Option<&str>,
) -> String {
  languages
    .iter()
    .max_by_key(|(_, bytes)| **bytes)
    .map(|(name, _)| name.clone())
    .or_else(|| fallback.map(str::to_string))
    .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string())
}

// ─── Site views ──────────────────────────────────────────────────────────────

pub const NO_DESCRIPTION: &str = "No description provided";

/// A repository as the site lists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoCard {
  pub id:              u64,
  pub name:            String,
  pub full_name:       String,
  pub description:     String,
  pub url:             String,
  pub language:        String,
  pub language_color:  String,
  pub stars:           u32,
  pub forks:           u32,
  pub issues:          u32,
  pub topics:          Vec<String>,
  pub homepage:        Option<String>,
  pub private:         bool,
  /// Last push, or last metadata update for repositories never pushed to.
  pub last_updated:    DateTime<Utc>,
  pub created_at:      DateTime<Utc>,
  #[serde(default)]
  pub languages:       BTreeMap<String, u64>,
  #[serde(default)]
  pub commit_activity: Vec<CommitWeek>,
}

impl RepoCard {
  pub fn new(
    repo: Repository,
    languages: BTreeMap<String, u64>,
    commit_activity: Vec<CommitWeek>,
  ) -> Self {
    let language = primary_language(&languages, repo.language.as_deref());
    let language_color = language_color(&language).to_string();
    Self {
      id: repo.id,
      name: repo.name,
      full_name: repo.full_name,
      description: repo
        .description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
      url: repo.html_url,
      language,
      language_color,
      stars: repo.stargazers_count,
      forks: repo.forks_count,
      issues: repo.open_issues_count,
      topics: repo.topics,
      homepage: repo.homepage.filter(|h| !h.is_empty()),
      private: repo.private,
      last_updated: repo.pushed_at.unwrap_or(repo.updated_at),
      created_at: repo.created_at,
      languages,
      commit_activity,
    }
  }
}

/// The account profile as the site shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCard {
  pub login:        String,
  /// Display name, falling back to the login.
  pub name:         String,
  pub avatar_url:   String,
  pub bio:          Option<String>,
  pub public_repos: u32,
  pub followers:    u32,
  pub following:    u32,
}

impl From<GitHubUser> for UserCard {
  fn from(user: GitHubUser) -> Self {
    Self {
      name: user.name.filter(|n| !n.is_empty()).unwrap_or_else(|| user.login.clone()),
      login: user.login,
      avatar_url: user.avatar_url,
      bio: user.bio,
      public_repos: user.public_repos,
      followers: user.followers,
      following: user.following,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
  pub page:        u32,
  pub per_page:    u32,
  pub total_pages: u32,
  pub has_more:    bool,
}

impl ListingPage {
  pub fn new(page: u32, per_page: u32, total_pages: u32) -> Self {
    Self { page, per_page, total_pages, has_more: page < total_pages }
  }
}

/// One page of the repository listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoListing {
  pub repos:        Vec<RepoCard>,
  pub user:         Option<UserCard>,
  pub pagination:   ListingPage,
  pub last_updated: DateTime<Utc>,
  pub cache_key:    String,
}

/// Commit activity for a single repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoActivity {
  pub repo_name:       String,
  /// `null` when the host has no statistics for the repository.
  pub commit_activity: Option<Vec<CommitWeek>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub total_commits:   Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_updated:    Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub message:         Option<String>,
}

impl RepoActivity {
  pub fn new(repo_name: impl Into<String>, activity: Option<Vec<CommitWeek>>) -> Self {
    let repo_name = repo_name.into();
    match activity {
      Some(weeks) => Self {
        repo_name,
        total_commits: Some(total_commits(&weeks)),
        commit_activity: Some(weeks),
        last_updated: Some(Utc::now()),
        message: None,
      },
      None => Self {
        repo_name,
        commit_activity: None,
        total_commits: None,
        last_updated: None,
        message: Some("No commit activity data available for this repository".to_string()),
      },
    }
  }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
