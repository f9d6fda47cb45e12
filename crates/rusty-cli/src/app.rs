//! Application state machine and event dispatcher.

use std::{collections::HashMap, sync::Arc};

use chrono::Datelike;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use rusty_core::{
  Heatmap, Viewport, compute_heatmap,
  github::{self, CommitCount, CommitWeek, ListingPage, RepoCard, RepoListing, UserCard},
  heatmap::{DAYS_PER_WEEK, today},
  twitch::{self, ChannelActivity, StreamClick, StreamRecord},
};

use crate::client::ApiClient;

// ─── Focus ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
  /// Repository list; left/right walk the commit grid day by day.
  Repos,
  /// Stream grid; arrows move the cell cursor.
  Streams,
}

// ─── Grid cursor ──────────────────────────────────────────────────────────────

/// A cell position counted back from the newest column, so it stays on the
/// same date when the week count changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCursor {
  /// `0` is the newest column.
  pub weeks_back: usize,
  /// `0` is Sunday.
  pub day:        usize,
}

impl GridCursor {
  /// The cell holding today.
  pub fn today() -> Self {
    Self { weeks_back: 0, day: today().weekday().num_days_from_sunday() as usize }
  }

  /// `(week, day)` grid coordinates for a grid `week_count` columns wide.
  pub fn position(self, week_count: usize) -> (usize, usize) {
    let last = week_count.saturating_sub(1);
    (last - self.weeks_back.min(last), self.day.min(DAYS_PER_WEEK - 1))
  }

  pub fn left(&mut self, week_count: usize) {
    if self.weeks_back + 1 < week_count {
      self.weeks_back += 1;
    }
  }

  pub fn right(&mut self) { self.weeks_back = self.weeks_back.saturating_sub(1); }

  pub fn up(&mut self) { self.day = self.day.saturating_sub(1); }

  pub fn down(&mut self) { self.day = (self.day + 1).min(DAYS_PER_WEEK - 1); }

  /// One day earlier, wrapping into the previous column.
  pub fn previous_day(&mut self, week_count: usize) {
    if self.day > 0 {
      self.day -= 1;
    } else if self.weeks_back + 1 < week_count {
      self.weeks_back += 1;
      self.day = DAYS_PER_WEEK - 1;
    }
  }

  /// One day later, wrapping into the next column.
  pub fn next_day(&mut self) {
    if self.day + 1 < DAYS_PER_WEEK {
      self.day += 1;
    } else if self.weeks_back > 0 {
      self.weeks_back -= 1;
      self.day = 0;
    }
  }
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  pub focus: Focus,

  /// Repositories from every listing page fetched so far.
  pub repos: Vec<RepoCard>,

  pub user: Option<UserCard>,

  /// Paging state of the most recent listing page.
  pub pagination: Option<ListingPage>,

  /// Commit activity per repository, fetched on first selection. `None`
  /// means the host had no statistics.
  pub activity: HashMap<String, Option<Vec<CommitWeek>>>,

  /// Channel activity; `None` until loaded or when unavailable.
  pub streams: Option<ChannelActivity>,

  /// Channel to show; the server default when `None`.
  pub twitch_username: Option<String>,

  /// Current fuzzy-filter string.
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Cursor position within the *filtered* repository list.
  pub list_cursor: usize,

  pub commit_cursor: GridCursor,
  pub stream_cursor: GridCursor,

  /// Stream detail popup, open when `Some`.
  pub popup: Option<StreamClick>,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// Width of the heat-map pane, published on every resize.
  pub viewport: Arc<Viewport>,

  pub client: Arc<ApiClient>,
}

impl App {
  pub fn new(client: ApiClient, viewport: Arc<Viewport>, twitch_username: Option<String>) -> Self {
    Self {
      focus: Focus::Repos,
      repos: Vec::new(),
      user: None,
      pagination: None,
      activity: HashMap::new(),
      streams: None,
      twitch_username,
      filter: String::new(),
      filter_active: false,
      list_cursor: 0,
      commit_cursor: GridCursor::today(),
      stream_cursor: GridCursor::today(),
      popup: None,
      status_msg: String::new(),
      viewport,
      client: Arc::new(client),
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Fetch the first listing page, replacing `self.repos`.
  pub async fn load_repos(&mut self) -> anyhow::Result<()> {
    self.status_msg = "Loading repositories…".into();
    match self.client.list_repos(1).await {
      Ok(listing) => {
        tracing::info!(repos = listing.repos.len(), "loaded repositories");
        self.repos.clear();
        self.list_cursor = 0;
        self.append_listing(listing);
        self.status_msg = String::new();
        Ok(())
      }
      Err(e) => {
        self.status_msg = format!("Error: {e}");
        Err(e)
      }
    }
  }

  /// The listing page to request next, if the server reported more.
  pub fn next_page(&self) -> Option<u32> {
    self.pagination.filter(|p| p.has_more).map(|p| p.page + 1)
  }

  /// Append a listing page to the repositories already shown.
  pub fn append_listing(&mut self, listing: RepoListing) {
    self.repos.extend(listing.repos);
    if listing.user.is_some() {
      self.user = listing.user;
    }
    self.pagination = Some(listing.pagination);
  }

  /// Fetch and append the next listing page. Does nothing on the last page.
  pub async fn load_more_repos(&mut self) {
    let Some(page) = self.next_page() else {
      return;
    };
    self.status_msg = "Loading more repositories…".into();
    match self.client.list_repos(page).await {
      Ok(listing) => {
        tracing::info!(page, repos = listing.repos.len(), "loaded more repositories");
        self.append_listing(listing);
        self.status_msg.clear();
      }
      Err(e) => {
        tracing::warn!(page, error = %e, "loading more repositories failed");
        self.status_msg = format!("Error: {e}");
      }
    }
  }

  /// Fetch channel activity. Failure leaves the stream grid empty.
  pub async fn load_streams(&mut self) {
    match self.client.streams(self.twitch_username.as_deref()).await {
      Ok(activity) => self.streams = Some(activity),
      Err(e) => {
        tracing::warn!(error = %e, "stream data unavailable");
        self.status_msg = format!("Streams unavailable: {e}");
      }
    }
  }

  /// Load commit activity for `repo` unless already memoized.
  pub async fn ensure_activity(&mut self, repo: &str) {
    if self.activity.contains_key(repo) {
      return;
    }
    match self.client.repo_activity(repo).await {
      Ok(activity) => {
        self.activity.insert(repo.to_string(), activity.commit_activity);
      }
      Err(e) => {
        tracing::warn!(repo, error = %e, "commit activity unavailable");
        self.status_msg = format!("Error: {e}");
      }
    }
  }

  async fn ensure_cursor_activity(&mut self) {
    if let Some(name) = self.cursor_repo().map(|r| r.name.clone()) {
      self.ensure_activity(&name).await;
    }
  }

  // ── Filtered list ─────────────────────────────────────────────────────────

  /// Repositories that match the current filter query.
  pub fn filtered_repos(&self) -> Vec<&RepoCard> {
    if self.filter.is_empty() {
      return self.repos.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .repos
      .iter()
      .filter(|r| {
        matcher.fuzzy_match(&r.name, &self.filter).is_some()
          || matcher.fuzzy_match(&r.description, &self.filter).is_some()
      })
      .collect()
  }

  /// The repository under the list cursor in the filtered view, if any.
  pub fn cursor_repo(&self) -> Option<&RepoCard> {
    self.filtered_repos().get(self.list_cursor).copied()
  }

  // ── Heat-maps ─────────────────────────────────────────────────────────────

  pub fn week_count(&self) -> usize { self.viewport.week_count() }

  /// Commit grid for the selected repository, once its activity is loaded.
  pub fn commit_heatmap(&self) -> Option<(Heatmap<CommitCount>, String)> {
    let repo = self.cursor_repo()?;
    let series = self.activity.get(&repo.name)?.as_deref().unwrap_or_default();
    let map = compute_heatmap(&github::to_events(series), self.week_count(), today());
    Some((map, github::subtitle(series)))
  }

  pub fn stream_heatmap(&self) -> (Heatmap<StreamRecord>, String) {
    let records = self
      .streams
      .as_ref()
      .map(|s| s.streaming_activity.as_slice())
      .unwrap_or_default();
    let map = compute_heatmap(&twitch::to_events(records), self.week_count(), today());
    (map, twitch::subtitle(self.streams.as_ref()))
  }

  /// Tooltip for the cursor cell of the focused grid.
  pub fn tooltip(&self) -> Option<String> {
    let weeks = self.week_count();
    match self.focus {
      Focus::Repos => {
        let (map, _) = self.commit_heatmap()?;
        let (week, day) = self.commit_cursor.position(weeks);
        map.tooltip(week, day, github::tooltip)
      }
      Focus::Streams => {
        let (map, _) = self.stream_heatmap();
        let (week, day) = self.stream_cursor.position(weeks);
        map.tooltip(week, day, twitch::tooltip).map(|lines| lines.join("  "))
      }
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    if self.popup.is_some() {
      return Ok(self.handle_popup_key(key));
    }

    if self.filter_active {
      return self.handle_filter_key(key).await;
    }

    match key.code {
      KeyCode::Char('q') => return Ok(false),
      KeyCode::Tab | KeyCode::BackTab => {
        self.focus = match self.focus {
          Focus::Repos => Focus::Streams,
          Focus::Streams => Focus::Repos,
        };
        return Ok(true);
      }
      _ => {}
    }

    match self.focus {
      Focus::Repos => self.handle_repo_key(key).await,
      Focus::Streams => Ok(self.handle_stream_key(key)),
    }
  }

  fn handle_popup_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return false,
      KeyCode::Esc | KeyCode::Enter => self.popup = None,
      _ => {}
    }
    true
  }

  async fn handle_filter_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Enter => {
        self.filter_active = false;
        self.list_cursor = 0;
        self.ensure_cursor_activity().await;
      }
      KeyCode::Backspace => {
        self.filter.pop();
        self.list_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.list_cursor = 0;
      }
      _ => {}
    }
    Ok(true)
  }

  async fn handle_repo_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    let weeks = self.week_count();
    match key.code {
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.filtered_repos().len();
        if len > 0 && self.list_cursor + 1 < len {
          self.list_cursor += 1;
          self.status_msg.clear();
          self.ensure_cursor_activity().await;
        } else if self.filter.is_empty() && self.next_page().is_some() {
          self.load_more_repos().await;
        }
      }
      KeyCode::Char('m') => self.load_more_repos().await,
      KeyCode::Up | KeyCode::Char('k') => {
        if self.list_cursor > 0 {
          self.list_cursor -= 1;
          self.status_msg.clear();
          self.ensure_cursor_activity().await;
        }
      }
      KeyCode::Left | KeyCode::Char('h') => self.commit_cursor.previous_day(weeks),
      KeyCode::Right | KeyCode::Char('l') => self.commit_cursor.next_day(),
      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Char('r') => {
        if let Some(name) = self.cursor_repo().map(|r| r.name.clone()) {
          self.activity.remove(&name);
          self.ensure_activity(&name).await;
        }
      }
      _ => {}
    }
    Ok(true)
  }

  fn handle_stream_key(&mut self, key: KeyEvent) -> bool {
    let weeks = self.week_count();
    match key.code {
      KeyCode::Left | KeyCode::Char('h') => self.stream_cursor.left(weeks),
      KeyCode::Right | KeyCode::Char('l') => self.stream_cursor.right(),
      KeyCode::Up | KeyCode::Char('k') => self.stream_cursor.up(),
      KeyCode::Down | KeyCode::Char('j') => self.stream_cursor.down(),
      KeyCode::Enter => {
        let (map, _) = self.stream_heatmap();
        let (week, day) = self.stream_cursor.position(weeks);
        self.popup = map.click(week, day, |stream| StreamClick::from(stream));
      }
      _ => {}
    }
    true
  }
}
