//! Error types for `rusty-upstream`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{url} returned {status}")]
  Status { status: StatusCode, url: String },

  #[error("unexpected response body: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("twitch user not found: {0}")]
  UserNotFound(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
