//! TUI rendering; orchestrates all panes.

pub mod heatmap;
pub mod repo_list;
pub mod stream_detail;

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};
use rusty_core::heatmap::today;

use crate::app::{App, Focus};
use heatmap::{COMMITS, GRID_ROWS, GridView, STREAMS};

/// Share of the body given to the repository list.
const LIST_PERCENT: u16 = 30;

/// Inner width of the heat-map panes for a terminal `terminal_width` columns
/// wide.
pub fn heatmap_columns(terminal_width: u16) -> u16 {
  let right = u32::from(terminal_width) * u32::from(100 - LIST_PERCENT) / 100;
  (right as u16).saturating_sub(2)
}

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let area = f.area();

  // Vertical stack: header, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  draw_body(f, rows[1], app);
  draw_status(f, rows[2], app);

  if let Some(stream) = &app.popup {
    stream_detail::draw(f, area, stream);
  }
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let who = app
    .user
    .as_ref()
    .map(|u| format!("{} ", u.name))
    .unwrap_or_default();
  let date = today().format("%Y-%m-%d").to_string();

  let left = Span::styled(
    " rusty  [/] search  [Tab] focus  [q] quit",
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(format!("{who}{date} "), Style::default().fg(Color::Gray));

  let pad = area
    .width
    .saturating_sub(left.width() as u16)
    .saturating_sub(right.width() as u16);

  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::DarkGray)),
    area,
  );
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body(f: &mut Frame, area: Rect, app: &App) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([
      Constraint::Percentage(LIST_PERCENT),
      Constraint::Percentage(100 - LIST_PERCENT),
    ])
    .split(area);

  repo_list::draw(f, cols[0], app);

  let grid_height = GRID_ROWS + 2;
  let panes = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(grid_height), // commits
      Constraint::Length(grid_height), // streams
      Constraint::Min(0),              // repository summary
    ])
    .split(cols[1]);

  draw_commits(f, panes[0], app);
  draw_streams(f, panes[1], app);
  draw_summary(f, panes[2], app);
}

fn draw_commits(f: &mut Frame, area: Rect, app: &App) {
  let focused = app.focus == Focus::Repos;
  let Some(repo) = app.cursor_repo() else {
    heatmap::draw_message(f, area, "Commits", "No repositories.", focused);
    return;
  };
  let Some((map, subtitle)) = app.commit_heatmap() else {
    heatmap::draw_message(f, area, &repo.name, "Loading commit activity…", focused);
    return;
  };

  heatmap::draw(f, area, GridView {
    title: &repo.name,
    subtitle: &subtitle,
    heatmap: &map,
    palette: &COMMITS,
    cursor: focused.then(|| app.commit_cursor.position(map.week_count())),
    focused,
  });
}

fn draw_streams(f: &mut Frame, area: Rect, app: &App) {
  let focused = app.focus == Focus::Streams;
  let (map, subtitle) = app.stream_heatmap();
  let title = match app.streams.as_ref().and_then(|s| s.channel.as_ref()) {
    Some(channel) => format!("twitch.tv/{}", channel.broadcaster_login),
    None => "Streams".to_string(),
  };
  let live = app.streams.as_ref().is_some_and(|s| s.is_live);
  let subtitle = if live { format!("{subtitle} · ● LIVE") } else { subtitle };

  heatmap::draw(f, area, GridView {
    title: &title,
    subtitle: &subtitle,
    heatmap: &map,
    palette: &STREAMS,
    cursor: focused.then(|| app.stream_cursor.position(map.week_count())),
    focused,
  });
}

fn draw_summary(f: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .title(" Repository ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let Some(repo) = app.cursor_repo() else {
    f.render_widget(block, area);
    return;
  };

  let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
  let mut lines = vec![
    Line::from(Span::styled(repo.full_name.clone(), Style::default().add_modifier(Modifier::BOLD))),
    Line::from(repo.description.clone()),
    Line::from(""),
    Line::from(vec![
      Span::styled(format!("{:<10}", "language"), label),
      Span::styled(
        repo.language.clone(),
        Style::default().fg(repo_list::hex_color(&repo.language_color).unwrap_or(Color::Gray)),
      ),
    ]),
    Line::from(vec![
      Span::styled(format!("{:<10}", "stats"), label),
      Span::raw(format!("★ {}  forks {}  issues {}", repo.stars, repo.forks, repo.issues)),
    ]),
    Line::from(vec![
      Span::styled(format!("{:<10}", "updated"), label),
      Span::raw(repo.last_updated.format("%Y-%m-%d").to_string()),
    ]),
    Line::from(vec![Span::styled(format!("{:<10}", "url"), label), Span::raw(repo.url.clone())]),
  ];
  if !repo.topics.is_empty() {
    lines.push(Line::from(vec![
      Span::styled(format!("{:<10}", "topics"), label),
      Span::styled(repo.topics.join(", "), Style::default().fg(Color::DarkGray)),
    ]));
  }

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }).block(block), area);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = match app.focus {
    _ if app.popup.is_some() => ("STREAM", "Esc close  q quit"),
    Focus::Repos if app.filter_active => ("SEARCH", "Type to filter  Esc cancel  Enter select"),
    Focus::Repos => ("REPOS", "↑↓/jk select  ←→/hl day  / search  m more  r reload  Tab streams  q quit"),
    Focus::Streams => ("STREAMS", "←→↑↓ move  Enter details  Tab repos  q quit"),
  };

  let status = if !app.status_msg.is_empty() {
    app.status_msg.clone()
  } else {
    app.tooltip().unwrap_or_else(|| hints.to_string())
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(format!("  {status}"), Style::default().fg(Color::Gray));

  f.render_widget(
    Paragraph::new(Line::from(vec![mode_span, hint_span])).style(Style::default().bg(Color::Black)),
    area,
  );
}
