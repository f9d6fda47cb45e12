//! Calendar heat-map pane.
//!
//! Each week is a two-column cell (`■ `) under a row of month labels, with
//! alternate weekday labels down the left edge.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};
use rusty_core::{
  Heatmap,
  heatmap::{CellVisual, DAYS_PER_WEEK, IntensityLevel, WEEKDAY_LABELS},
};

/// Columns taken by the weekday labels.
pub const DAY_LABEL_COLUMNS: usize = 4;
/// Columns taken by one week.
pub const CELL_COLUMNS: usize = 2;

/// Rows a grid needs inside its border: month labels, seven days, legend.
pub const GRID_ROWS: u16 = 1 + DAYS_PER_WEEK as u16 + 1;

// ─── Palettes ─────────────────────────────────────────────────────────────────

/// One colour per [`IntensityLevel`], lightest first.
pub struct Palette([Color; 5]);

impl Palette {
  pub fn color(&self, level: IntensityLevel) -> Color {
    let index = match level {
      IntensityLevel::Empty => 0,
      IntensityLevel::Faint => 1,
      IntensityLevel::Light => 2,
      IntensityLevel::Medium => 3,
      IntensityLevel::Strong => 4,
    };
    self.0[index]
  }
}

pub const COMMITS: Palette = Palette([
  Color::Rgb(48, 54, 61),
  Color::Rgb(14, 68, 41),
  Color::Rgb(0, 109, 50),
  Color::Rgb(38, 166, 65),
  Color::Rgb(57, 211, 83),
]);

pub const STREAMS: Palette = Palette([
  Color::Rgb(48, 54, 61),
  Color::Rgb(61, 40, 102),
  Color::Rgb(94, 57, 168),
  Color::Rgb(130, 86, 222),
  Color::Rgb(169, 112, 255),
]);

// ─── Drawing ──────────────────────────────────────────────────────────────────

pub struct GridView<'a, P> {
  pub title:    &'a str,
  pub subtitle: &'a str,
  pub heatmap:  &'a Heatmap<P>,
  pub palette:  &'a Palette,
  /// `(week, day)` of the highlighted cell.
  pub cursor:   Option<(usize, usize)>,
  pub focused:  bool,
}

/// Render a heat-map grid into `area`.
pub fn draw<P>(f: &mut Frame, area: Rect, view: GridView<'_, P>) {
  let border = if view.focused { Color::Cyan } else { Color::DarkGray };
  let block = Block::default()
    .title(format!(" {} · {} ", view.title, view.subtitle))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  let mut lines = Vec::with_capacity(GRID_ROWS as usize);
  lines.push(Line::from(Span::styled(
    month_line(view.heatmap),
    Style::default().fg(Color::DarkGray),
  )));
  for day in 0..DAYS_PER_WEEK {
    lines.push(day_row(view.heatmap, day, view.palette, view.cursor));
  }
  lines.push(legend(view.palette));

  f.render_widget(Paragraph::new(lines).block(block), area);
}

/// A placeholder pane with a single dimmed message.
pub fn draw_message(f: &mut Frame, area: Rect, title: &str, message: &str, focused: bool) {
  let border = if focused { Color::Cyan } else { Color::DarkGray };
  let block = Block::default()
    .title(format!(" {title} "))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));
  f.render_widget(
    Paragraph::new(message.to_string())
      .style(Style::default().fg(Color::DarkGray))
      .block(block),
    area,
  );
}

/// Month labels placed over the column where each month starts. A label that
/// would overlap the previous one is dropped.
pub fn month_line<P>(heatmap: &Heatmap<P>) -> String {
  let width = DAY_LABEL_COLUMNS + heatmap.week_count() * CELL_COLUMNS;
  let mut row = vec![' '; width];
  let mut next_free = 0;

  for label in &heatmap.month_labels {
    let start = DAY_LABEL_COLUMNS + label.week_index * CELL_COLUMNS;
    if start < next_free {
      continue;
    }
    for (offset, ch) in label.text.chars().enumerate() {
      if let Some(slot) = row.get_mut(start + offset) {
        *slot = ch;
      }
    }
    next_free = start + label.text.chars().count() + 1;
  }

  row.into_iter().collect::<String>().trim_end().to_string()
}

fn day_row<P>(
  heatmap: &Heatmap<P>,
  day: usize,
  palette: &Palette,
  cursor: Option<(usize, usize)>,
) -> Line<'static> {
  let mut spans = Vec::with_capacity(heatmap.week_count() + 1);
  spans.push(Span::styled(
    format!("{:<width$}", WEEKDAY_LABELS[day], width = DAY_LABEL_COLUMNS),
    Style::default().fg(Color::DarkGray),
  ));

  for (week_index, week) in heatmap.weeks.iter().enumerate() {
    let is_cursor = cursor == Some((week_index, day));
    let span = match (week.days[day].visual(), is_cursor) {
      (CellVisual::Hidden, false) => Span::raw("  "),
      (CellVisual::Hidden, true) => Span::styled("□ ", Style::default().fg(Color::White)),
      (CellVisual::Shown(level), false) => {
        Span::styled("■ ", Style::default().fg(palette.color(level)))
      }
      (CellVisual::Shown(level), true) => Span::styled(
        "▣ ",
        Style::default()
          .fg(palette.color(level))
          .bg(Color::White)
          .add_modifier(Modifier::BOLD),
      ),
    };
    spans.push(span);
  }

  Line::from(spans)
}

fn legend(palette: &Palette) -> Line<'static> {
  let dim = Style::default().fg(Color::DarkGray);
  let mut spans = vec![Span::styled(" ".repeat(DAY_LABEL_COLUMNS) + "Less ", dim)];
  for level in [
    IntensityLevel::Empty,
    IntensityLevel::Faint,
    IntensityLevel::Light,
    IntensityLevel::Medium,
    IntensityLevel::Strong,
  ] {
    spans.push(Span::styled("■ ", Style::default().fg(palette.color(level))));
  }
  spans.push(Span::styled("More", dim));
  Line::from(spans)
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use rusty_core::compute_heatmap;

  use super::*;

  #[test]
  fn month_labels_sit_over_their_first_column() {
    let today = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
    let map = compute_heatmap::<()>(&[], 12, today);
    let line = month_line(&map);

    let mut shown = 0;
    for label in &map.month_labels {
      let start = DAY_LABEL_COLUMNS + label.week_index * CELL_COLUMNS;
      if line.get(start..start + label.text.len()) == Some(label.text.as_str()) {
        shown += 1;
      }
    }
    assert!(shown >= 2, "{line:?}");
    assert!(line.len() <= DAY_LABEL_COLUMNS + 12 * CELL_COLUMNS);
  }

  #[test]
  fn palette_darkest_for_empty() {
    assert_eq!(COMMITS.color(IntensityLevel::Empty), Color::Rgb(48, 54, 61));
    assert_eq!(STREAMS.color(IntensityLevel::Strong), Color::Rgb(169, 112, 255));
  }
}
