pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::TableState;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Footer
    ])
    .split(frame.area());

  let shortcuts = app.shortcuts();
  renderfns::draw_header(
    frame,
    chunks[0],
    app.backend_url(),
    app.user_email(),
    &shortcuts,
  );

  if let Some(view) = app.current_view_mut() {
    view.render(frame, chunks[1]);
  }
  app.picker().render_overlay(frame, chunks[1]);

  let breadcrumb = app.view_breadcrumb();
  components::draw_footer(frame, chunks[2], &breadcrumb, app.toast());
}

/// Keep the selection inside `0..len`, selecting the first row when there is
/// none.
pub fn ensure_valid_selection(state: &mut TableState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }
  match state.selected() {
    Some(idx) if idx < len => {}
    Some(_) => state.select(Some(len - 1)),
    None => state.select(Some(0)),
  }
}
