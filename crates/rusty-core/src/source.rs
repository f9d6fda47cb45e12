//! The `CodeHost` and `StreamHost` traits.
//!
//! Implemented by `rusty-upstream` against the real GitHub and Twitch APIs,
//! and by in-memory fakes in tests. `rusty-api` depends on these
//! abstractions, not on any concrete client.

use std::{collections::BTreeMap, future::Future};

use crate::{
  github::{CommitWeek, GitHubUser, RateLimit, RepoPage, RepoQuery},
  twitch::ChannelActivity,
};

/// A source-control host for one configured account.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CodeHost: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Current API quota for the configured credentials.
  fn rate_limit(
    &self,
  ) -> impl Future<Output = Result<RateLimit, Self::Error>> + Send + '_;

  /// One page of the account's own repositories.
  fn list_repos<'a>(
    &'a self,
    query: &'a RepoQuery,
  ) -> impl Future<Output = Result<RepoPage, Self::Error>> + Send + 'a;

  /// Weekly commit counts for the last year. `None` when the host has no
  /// statistics for the repository (yet).
  fn commit_activity<'a>(
    &'a self,
    repo: &'a str,
  ) -> impl Future<Output = Result<Option<Vec<CommitWeek>>, Self::Error>> + Send + 'a;

  /// Bytes of code per language.
  fn languages<'a>(
    &'a self,
    repo: &'a str,
  ) -> impl Future<Output = Result<BTreeMap<String, u64>, Self::Error>> + Send + 'a;

  /// The account profile, if the host returns one.
  fn user(
    &self,
  ) -> impl Future<Output = Result<Option<GitHubUser>, Self::Error>> + Send + '_;
}

/// A livestreaming platform.
pub trait StreamHost: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Live status, channel metadata and recent broadcasts for `username`.
  fn channel_activity<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<ChannelActivity, Self::Error>> + Send + 'a;
}
