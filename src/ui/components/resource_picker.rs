use crate::api::resource::{get_suggestions, ResourceInfo};
use crate::api::Resource;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

const MAX_SUGGESTIONS: usize = 8;

/// Outcome of offering a key to the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerKey {
  /// Picker is closed and the key is not `:`
  Ignored,
  Consumed,
  /// A resource was chosen and the picker closed
  Open(Resource),
}

/// Resource switcher opened with `:`, with prefix/alias completion.
#[derive(Debug, Clone, Default)]
pub struct ResourcePicker {
  buffer: String,
  active: bool,
  selected: usize,
}

impl ResourcePicker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn value(&self) -> &str {
    &self.buffer
  }

  fn suggestions(&self) -> Vec<&'static ResourceInfo> {
    get_suggestions(&self.buffer)
  }

  fn close(&mut self) {
    self.active = false;
    self.buffer.clear();
    self.selected = 0;
  }

  /// Call regardless of active state; `:` opens the picker.
  pub fn handle_key(&mut self, key: KeyEvent) -> PickerKey {
    if !self.active {
      if key.code == KeyCode::Char(':') {
        self.active = true;
        return PickerKey::Consumed;
      }
      return PickerKey::Ignored;
    }

    let count = self.suggestions().len();
    match key.code {
      KeyCode::Esc => self.close(),
      KeyCode::Enter => {
        let picked = self.suggestions().get(self.selected).map(|info| info.resource);
        self.close();
        if let Some(resource) = picked {
          return PickerKey::Open(resource);
        }
      }
      KeyCode::Tab | KeyCode::Down if count > 0 => {
        self.selected = (self.selected + 1) % count;
      }
      KeyCode::BackTab | KeyCode::Up if count > 0 => {
        self.selected = (self.selected + count - 1) % count;
      }
      KeyCode::Backspace => {
        self.buffer.pop();
        self.selected = 0;
      }
      KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.buffer.clear();
        self.selected = 0;
      }
      KeyCode::Char(c) => {
        self.buffer.push(c);
        self.selected = 0;
      }
      _ => {}
    }
    PickerKey::Consumed
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let suggestions = self.suggestions();
    let shown = suggestions.len().min(MAX_SUGGESTIONS);
    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
    let height = (3 + shown as u16).min(area.height);
    let overlay = Rect::new(area.x + 1, area.y + 1, width, height).intersection(area);

    frame.render_widget(Clear, overlay);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Resource ");
    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);

    if inner.height == 0 {
      return;
    }

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(1), Constraint::Min(0)])
      .split(inner);

    let input = Line::from(vec![
      Span::styled(":", Style::default().fg(Color::Yellow)),
      Span::raw(self.buffer.as_str()),
      Span::styled("_", Style::default().fg(Color::Yellow)),
    ]);
    frame.render_widget(Paragraph::new(input), chunks[0]);

    if suggestions.is_empty() || chunks[1].height == 0 {
      return;
    }

    let items: Vec<ListItem> = suggestions
      .iter()
      .take(MAX_SUGGESTIONS)
      .map(|info| {
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<20}", info.name), Style::default().fg(Color::Cyan)),
          Span::styled(info.description, Style::default().fg(Color::DarkGray)),
        ]))
      })
      .collect();

    let list =
      List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));
    let mut state = ListState::default();
    state.select(Some(self.selected));
    frame.render_stateful_widget(list, chunks[1], &mut state);
  }
}
