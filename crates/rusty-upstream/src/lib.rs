//! HTTP clients for the GitHub REST API and the Twitch Helix API.
//!
//! [`GitHubClient`] implements [`rusty_core::source::CodeHost`] and
//! [`TwitchClient`] implements [`rusty_core::source::StreamHost`]. The Twitch
//! client holds its app token behind a lock, so share it through an `Arc`.

pub mod error;
pub mod github;
pub mod twitch;

pub use error::{Error, Result};
pub use github::{GitHubClient, GitHubConfig};
pub use twitch::{TwitchClient, TwitchConfig};

/// Sent as `User-Agent` on every upstream request.
pub const USER_AGENT: &str = "rusty-butter-website";
