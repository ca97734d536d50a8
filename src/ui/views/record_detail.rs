use crate::api::{Record, Resource};
use crate::ui::renderfns::format_timestamp;
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use serde_json::Value;

/// Read-only view of every field of one record
pub struct RecordDetailView {
  resource: Resource,
  record: Record,
  scroll: u16,
}

impl RecordDetailView {
  pub fn new(resource: Resource, record: Record) -> Self {
    Self {
      resource,
      record,
      scroll: 0,
    }
  }

  fn field_lines(&self) -> Vec<Line<'static>> {
    let label = |name: &str| Span::styled(format!("{:<22}", name), Style::default().fg(Color::DarkGray));

    let mut lines = vec![Line::from(vec![
      label("id"),
      Span::styled(self.record.id.clone(), Style::default().fg(Color::Cyan)),
    ])];

    for (name, value) in [
      ("createdAt", &self.record.created_at),
      ("updatedAt", &self.record.updated_at),
    ] {
      if let Some(value) = value {
        lines.push(Line::from(vec![label(name), Span::raw(format_timestamp(value))]));
      }
    }

    for (name, value) in &self.record.fields {
      let text = match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
      };
      lines.push(Line::from(vec![label(name), Span::raw(text)]));
    }
    lines
  }
}

impl View for RecordDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.scroll = self.scroll.saturating_add(1);
        ViewAction::None
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.scroll = self.scroll.saturating_sub(1);
        ViewAction::None
      }
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" {} / {} ", self.resource, self.record.label()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let paragraph = Paragraph::new(self.field_lines())
      .block(block)
      .wrap(Wrap { trim: false })
      .scroll((self.scroll, 0));
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    self.record.id.clone()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![Shortcut::new("j/k", "scroll"), Shortcut::new("q", "back")]
  }
}
