//! `rusty`: terminal activity graphs for the Rusty Butter site.
//!
//! # Usage
//!
//! ```
//! rusty --url http://localhost:3000
//! rusty --config ~/.config/rusty/config.toml --twitch mrrustybutter --compact
//! ```

mod app;
mod client;
mod ui;

use std::{
  io,
  path::{Path, PathBuf},
  sync::{Arc, Mutex},
  time::Duration,
};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use client::{ApiClient, ApiConfig};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use rusty_core::Viewport;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:3000";
const POLL_INTERVAL: Duration = Duration::from_millis(50);

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rusty", about = "Terminal activity graphs for the Rusty Butter site")]
struct Args {
  /// TOML file with `url`, `twitch_username` and `compact` keys.
  #[arg(short = 'c', long = "config", value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the site server (default: http://localhost:3000).
  #[arg(long, env = "RUSTY_URL")]
  url: Option<String>,

  /// Twitch channel to show instead of the server default.
  #[arg(long, env = "RUSTY_TWITCH_USER")]
  twitch: Option<String>,

  /// Always show a quarter of weeks.
  #[arg(long)]
  compact: bool,

  /// Write logs to this file; the terminal is taken by the UI.
  #[arg(long, value_name = "FILE", env = "RUSTY_LOG_FILE")]
  log: Option<PathBuf>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

#[derive(Default, Deserialize)]
struct ConfigFile {
  #[serde(default)]
  url:             String,
  #[serde(default)]
  twitch_username: String,
  #[serde(default)]
  compact:         bool,
}

fn non_empty(value: &str) -> Option<String> {
  (!value.is_empty()).then(|| value.to_string())
}

fn init_logging(path: &Path) -> Result<()> {
  let file = std::fs::File::create(path)
    .with_context(|| format!("creating log file {}", path.display()))?;
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_ansi(false)
    .with_writer(Mutex::new(file))
    .init();
  Ok(())
}

/// Flags and config file merged; flags win.
struct Settings {
  api:             ApiConfig,
  twitch_username: Option<String>,
  compact:         bool,
}

impl Settings {
  fn resolve(args: Args) -> Result<Self> {
    let file = match &args.config {
      Some(path) => {
        let raw = std::fs::read_to_string(path)
          .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str::<ConfigFile>(&raw)
          .with_context(|| format!("parsing {}", path.display()))?
      }
      None => ConfigFile::default(),
    };

    let base_url = args
      .url
      .or_else(|| non_empty(&file.url))
      .unwrap_or_else(|| DEFAULT_URL.to_string());

    Ok(Self {
      api:             ApiConfig { base_url },
      twitch_username: args.twitch.or_else(|| non_empty(&file.twitch_username)),
      compact:         args.compact || file.compact,
    })
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

fn enter_tui() -> Result<Tui> {
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  Terminal::new(CrosstermBackend::new(stdout)).context("creating terminal")
}

fn leave_tui(terminal: &mut Tui) {
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();
}

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  if let Some(path) = &args.log {
    init_logging(path)?;
  }
  let settings = Settings::resolve(args)?;

  let (columns, _) = crossterm::terminal::size().context("reading terminal size")?;
  let viewport = Arc::new(Viewport::new(0.0, settings.compact));
  viewport.notify_columns(ui::heatmap_columns(columns));

  let client = ApiClient::new(settings.api)?;
  let mut app = App::new(client, viewport, settings.twitch_username);

  let mut terminal = enter_tui()?;
  let result = match app.load_repos().await {
    Ok(()) => run_event_loop(&mut terminal, &mut app).await,
    Err(e) => Err(e),
  };
  leave_tui(&mut terminal);

  result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(terminal: &mut Tui, app: &mut App) -> Result<()> {
  // Streams and the first repository's activity load after the list so the
  // first frame is not held up.
  terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;
  app.load_streams().await;
  if let Some(name) = app.cursor_repo().map(|r| r.name.clone()) {
    app.ensure_activity(&name).await;
  }

  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    let next = tokio::task::block_in_place(|| -> io::Result<Option<Event>> {
      match event::poll(POLL_INTERVAL)? {
        true => event::read().map(Some),
        false => Ok(None),
      }
    })?;

    match next {
      Some(Event::Key(key)) => {
        if !app.handle_key(key).await? {
          break;
        }
      }
      Some(Event::Resize(columns, _)) => {
        app.viewport.notify_columns(ui::heatmap_columns(columns));
      }
      _ => {}
    }
  }

  Ok(())
}
