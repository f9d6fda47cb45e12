//! Repository list pane (left panel).

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::{App, Focus};

/// Parse a `#rrggbb` colour.
pub fn hex_color(hex: &str) -> Option<Color> {
  let digits = hex.strip_prefix('#')?;
  if digits.len() != 6 {
    return None;
  }
  let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
  Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Render the repository list into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let filtered = app.filtered_repos();
  let total = app.repos.len();

  let more = if app.next_page().is_some() { "+" } else { "" };
  let title = if app.filter_active || !app.filter.is_empty() {
    format!(" Repositories ({}/{total}{more}) ", filtered.len())
  } else {
    format!(" Repositories ({total}{more}) ")
  };

  let border = if app.focus == Focus::Repos { Color::Cyan } else { Color::DarkGray };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  let items: Vec<ListItem> = filtered
    .iter()
    .map(|repo| {
      let dot = hex_color(&repo.language_color).unwrap_or(Color::Gray);
      ListItem::new(Line::from(vec![
        Span::styled("● ", Style::default().fg(dot)),
        Span::raw(repo.name.clone()),
        Span::styled(format!("  ★{}", repo.stars), Style::default().fg(Color::DarkGray)),
      ]))
    })
    .collect();

  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  // Filter bar on the last inner row.
  if (app.filter_active || !app.filter.is_empty()) && inner_area.height > 2 {
    let filter_area = Rect {
      x:      inner_area.x,
      y:      inner_area.y + inner_area.height - 1,
      width:  inner_area.width,
      height: 1,
    };
    inner_area.height = inner_area.height.saturating_sub(1);

    let filter_text = if app.filter_active {
      format!("/{}_", app.filter)
    } else {
      format!("/{}", app.filter)
    };
    f.render_widget(
      Paragraph::new(filter_text).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  let mut state = ListState::default();
  state.select(if filtered.is_empty() { None } else { Some(app.list_cursor) });

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner_area,
    &mut state,
  );
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_language_colours() {
    assert_eq!(hex_color("#dea584"), Some(Color::Rgb(0xde, 0xa5, 0x84)));
    assert_eq!(hex_color("dea584"), None);
    assert_eq!(hex_color("#zzzzzz"), None);
    assert_eq!(hex_color("#fff"), None);
  }
}
