use crate::api::Resource;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::store::ResourceStore;
use crate::ui;
use crate::ui::components::{PickerKey, ResourcePicker, Toast};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::ResourceListView;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::info;

/// Main application state
pub struct App {
  /// Navigation stack; the root is always a resource list
  view_stack: Vec<Box<dyn View>>,

  picker: ResourcePicker,

  /// Resource shown by the root view
  resource: Resource,

  store: ResourceStore,

  config: Config,

  /// Email of the signed-in admin, for the header
  user_email: Option<String>,

  toast: Option<Toast>,

  should_quit: bool,
}

impl App {
  pub fn new(
    config: Config,
    store: ResourceStore,
    resource: Resource,
    user_email: Option<String>,
  ) -> Self {
    let root = ResourceListView::new(store.clone(), resource, config.page_size);
    Self {
      view_stack: vec![Box::new(root)],
      picker: ResourcePicker::new(),
      resource,
      store,
      config,
      user_email,
      toast: None,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Restore the terminal even if the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
  ) -> Result<()> {
    let mut events = EventHandler::new(Duration::from_millis(100));

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => self.tick(),
        Some(Event::Resize) => {}
        None => break,
      }
    }
    Ok(())
  }

  fn tick(&mut self) {
    for view in &mut self.view_stack {
      view.tick();
      if let Some(toast) = view.take_toast() {
        self.toast = Some(toast);
      }
    }

    if self.toast.as_ref().is_some_and(Toast::is_expired) {
      self.toast = None;
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match self.picker.handle_key(key) {
      PickerKey::Open(resource) => {
        self.open_resource(resource);
        return;
      }
      PickerKey::Consumed => return,
      PickerKey::Ignored => {}
    }

    if key.code == KeyCode::Tab {
      self.open_resource(self.resource.next());
      return;
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::Pop,
    };

    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  /// Replace the whole stack with a list of `resource`.
  fn open_resource(&mut self, resource: Resource) {
    info!(%resource, "opening resource");
    let view = ResourceListView::new(self.store.clone(), resource, self.config.page_size);
    self.view_stack = vec![Box::new(view)];
    self.resource = resource;
  }

  // Accessors for UI rendering

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn picker(&self) -> &ResourcePicker {
    &self.picker
  }

  pub fn toast(&self) -> Option<&Toast> {
    self.toast.as_ref()
  }

  pub fn backend_url(&self) -> &str {
    &self.config.backend.url
  }

  pub fn user_email(&self) -> Option<&str> {
    self.user_email.as_deref()
  }

  pub fn shortcuts(&self) -> Vec<Shortcut> {
    self
      .view_stack
      .last()
      .map(|view| view.shortcuts())
      .unwrap_or_default()
  }

  pub fn view_breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect()
  }
}
