use crossterm::event::KeyEvent;
use ratatui::prelude::*;

use super::components::Toast;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortcut {
  pub key: &'static str,
  pub label: &'static str,
}

impl Shortcut {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self { key, label }
  }
}

/// Actions that a view can request in response to user input
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
}

/// Trait for view behavior
///
/// Views own their data through `Query<T>` and poll it in `tick()`. The App
/// routes keys to the top view and executes the returned action.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Called on each tick, for every view on the stack
  fn tick(&mut self) {}

  /// Message the view wants shown in the footer, if any
  fn take_toast(&mut self) -> Option<Toast> {
    None
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![Shortcut::new(":", "resource"), Shortcut::new("q", "back")]
  }
}
