use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use std::time::{Duration, Instant};

const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
  Info,
  Error,
}

/// Short-lived message shown at the right of the footer.
#[derive(Debug, Clone)]
pub struct Toast {
  pub message: String,
  pub kind: ToastKind,
  shown_at: Instant,
}

impl Toast {
  pub fn info(message: impl Into<String>) -> Self {
    Self::new(message, ToastKind::Info)
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self::new(message, ToastKind::Error)
  }

  fn new(message: impl Into<String>, kind: ToastKind) -> Self {
    Self {
      message: message.into(),
      kind,
      shown_at: Instant::now(),
    }
  }

  pub fn is_expired(&self) -> bool {
    self.shown_at.elapsed() > TOAST_TTL
  }
}

/// Draw the footer bar with view breadcrumb and the current toast, if any
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[String], toast: Option<&Toast>) {
  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i + 1 == breadcrumb.len() {
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };
    spans.push(Span::styled(part.clone(), style));
  }

  let chunks = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Min(1), Constraint::Percentage(60)])
    .split(area);

  let background = Style::default().bg(Color::Black);
  frame.render_widget(Paragraph::new(Line::from(spans)).style(background), chunks[0]);

  if let Some(toast) = toast {
    let color = match toast.kind {
      ToastKind::Info => Color::Green,
      ToastKind::Error => Color::Red,
    };
    let line = Line::from(Span::styled(
      format!("{} ", toast.message),
      Style::default().fg(color),
    ));
    frame.render_widget(
      Paragraph::new(line).alignment(Alignment::Right).style(background),
      chunks[1],
    );
  } else {
    frame.render_widget(Paragraph::new("").style(background), chunks[1]);
  }
}
