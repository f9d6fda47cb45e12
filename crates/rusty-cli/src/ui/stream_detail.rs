//! Stream detail popup, opened with Enter on a stream cell.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use rusty_core::twitch::{StreamClick, StreamKind};

/// A rectangle `width` × `height` centred in `area`, clipped to it.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  Rect {
    x: area.x + (area.width - width) / 2,
    y: area.y + (area.height - height) / 2,
    width,
    height,
  }
}

pub fn draw(f: &mut Frame, area: Rect, stream: &StreamClick) {
  let popup = centered(area, 64, 11);

  let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
  let kind = match stream.kind {
    StreamKind::Live => Span::styled("● LIVE", Style::default().fg(Color::Red)),
    StreamKind::Vod => Span::raw("VOD"),
  };

  let lines = vec![
    Line::from(Span::styled(
      stream.title.clone(),
      Style::default().add_modifier(Modifier::BOLD),
    )),
    Line::from(""),
    Line::from(vec![Span::styled(format!("{:<10}", "date"), label), Span::raw(stream.date.clone())]),
    Line::from(vec![
      Span::styled(format!("{:<10}", "duration"), label),
      Span::raw(format!("{}h", stream.duration)),
    ]),
    Line::from(vec![
      Span::styled(format!("{:<10}", "viewers"), label),
      Span::raw(stream.viewers.to_string()),
    ]),
    Line::from(vec![Span::styled(format!("{:<10}", "type"), label), kind]),
    Line::from(vec![Span::styled(format!("{:<10}", "url"), label), Span::raw(stream.url.clone())]),
    Line::from(""),
    Line::from(Span::styled("Esc close", Style::default().fg(Color::DarkGray))),
  ];

  let block = Block::default()
    .title(" Stream ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Magenta));

  f.render_widget(Clear, popup);
  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }).block(block), popup);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn popup_is_centred_and_clipped() {
    let area = Rect::new(0, 0, 100, 40);
    assert_eq!(centered(area, 64, 11), Rect::new(18, 14, 64, 11));
    assert_eq!(centered(Rect::new(10, 2, 100, 40), 64, 11), Rect::new(28, 16, 64, 11));

    let small = Rect::new(0, 0, 30, 5);
    assert_eq!(centered(small, 64, 11), small);
  }
}
