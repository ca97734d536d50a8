use crate::ui::view::Shortcut;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, backend, signed-in user and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  backend_url: &str,
  user: Option<&str>,
  shortcuts: &[Shortcut],
) {
  let mut spans = vec![
    Span::styled(" market-admin ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", extract_domain(backend_url)),
      Style::default().fg(Color::White),
    ),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
  ];

  match user {
    Some(user) => spans.push(Span::styled(
      format!(" {} ", user),
      Style::default().fg(Color::Yellow).bold(),
    )),
    None => spans.push(Span::styled(
      " not signed in ",
      Style::default().fg(Color::DarkGray),
    )),
  }
  spans.push(Span::raw(" "));

  // Keys highlighted, descriptions dimmed
  for shortcut in shortcuts {
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

fn extract_domain(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}
