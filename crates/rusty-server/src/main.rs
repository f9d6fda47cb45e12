//! rusty-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), layers
//! `RUSTY_*` environment variables on top, and serves the site API over HTTP.
//!
//! ```
//! RUSTY_GITHUB_TOKEN=ghp_... cargo run -p rusty-server --bin server
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use rusty_api::ApiState;
use rusty_server::ServerConfig;
use rusty_upstream::{GitHubClient, TwitchClient};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Rusty Butter site API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("RUSTY"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Upstream clients.
  let github_cfg = server_cfg.github_config();
  if github_cfg.token.is_none() {
    tracing::warn!("no GitHub token configured; requests are limited to 60 per hour");
  }
  let github = GitHubClient::new(github_cfg).context("failed to build GitHub client")?;

  let twitch = match server_cfg.twitch_config() {
    Some(cfg) => Some(TwitchClient::new(cfg).context("failed to build Twitch client")?),
    None => {
      tracing::warn!("Twitch credentials missing; /api/twitch/streams will return 503");
      None
    }
  };

  let state = ApiState::new(github, twitch, server_cfg.api_settings());
  let app = rusty_server::app(state);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
