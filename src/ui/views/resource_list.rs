use crate::api::{Page, Record, Resource};
use crate::cache::{Filters, QueryKey};
use crate::error::{ErrorKind, StoreResult};
use crate::paginator::Paginator;
use crate::query::{Query, QueryState};
use crate::store::ResourceStore;
use crate::ui::components::Toast;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{format_timestamp, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::RecordDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use futures::future::{BoxFuture, FutureExt};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

fn page_fetcher(
  store: ResourceStore,
  resource: Resource,
  page: u32,
  page_size: u32,
) -> impl Fn() -> BoxFuture<'static, StoreResult<Page>> + Send + Sync + 'static {
  move || {
    let store = store.clone();
    async move {
      store
        .fetch_page(resource, page, page_size, &Filters::new())
        .await
    }
    .boxed()
  }
}

/// One page of a resource as a table, with paging and optimistic delete.
pub struct ResourceListView {
  store: ResourceStore,
  resource: Resource,
  page_size: u32,
  paginator: Paginator,
  query: Query<Page>,
  table_state: TableState,
  /// Record awaiting y/n confirmation
  confirm_delete: Option<Record>,
  /// In-flight deletes, each resolving to the deleted id
  deletes: Vec<Query<String>>,
  toast: Option<Toast>,
}

impl ResourceListView {
  pub fn new(store: ResourceStore, resource: Resource, page_size: u32) -> Self {
    let mut query = Query::new(page_fetcher(store.clone(), resource, 1, page_size));
    query.fetch();

    Self {
      store,
      resource,
      page_size,
      paginator: Paginator::default(),
      query,
      table_state: TableState::default(),
      confirm_delete: None,
      deletes: Vec::new(),
      toast: None,
    }
  }

  fn key(&self) -> QueryKey {
    QueryKey::new(self.resource, self.paginator.current(), self.page_size)
  }

  /// The store's copy of the page, so optimistic removals and rollbacks show
  /// up immediately. Falls back to the query's last value.
  fn page(&self) -> Option<Page> {
    self
      .store
      .cached_page(&self.key())
      .or_else(|| self.query.data().cloned())
  }

  fn load_page(&mut self) {
    self.table_state.select(Some(0));
    self.query.refetch_with(page_fetcher(
      self.store.clone(),
      self.resource,
      self.paginator.current(),
      self.page_size,
    ));
  }

  fn refresh(&mut self) {
    self.store.invalidate(&self.key());
    self.query.refetch();
  }

  fn selected_record(&self) -> Option<Record> {
    let idx = self.table_state.selected()?;
    self.page()?.records.get(idx).cloned()
  }

  fn start_delete(&mut self, record: Record) {
    let store = self.store.clone();
    let resource = self.resource;
    let id = record.id;

    let mut query = Query::new(move || {
      let store = store.clone();
      let id = id.clone();
      async move { store.delete_record(resource, &id).await.map(|_| id) }
    });
    query.fetch();
    self.deletes.push(query);
  }

  fn poll_deletes(&mut self) {
    let mut finished = Vec::new();
    for (idx, delete) in self.deletes.iter_mut().enumerate() {
      if delete.poll() {
        finished.push(idx);
        self.toast = match delete.state() {
          QueryState::Success(id) => Some(Toast::info(format!("Deleted {}", id))),
          QueryState::Error(e) if e.kind() == ErrorKind::Auth => {
            Some(Toast::error(format!("{} (run `market-admin login`)", e)))
          }
          QueryState::Error(e) => Some(Toast::error(e.to_string())),
          _ => None,
        };
      }
    }
    for idx in finished.into_iter().rev() {
      self.deletes.remove(idx);
    }
  }

  fn handle_confirm(&mut self, key: KeyEvent) -> Option<ViewAction> {
    let record = self.confirm_delete.take()?;
    if let KeyCode::Char('y') | KeyCode::Char('Y') = key.code {
      self.start_delete(record);
    }
    Some(ViewAction::None)
  }

  fn handle_navigation(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.table_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.table_state.select_previous(),
      KeyCode::Char('n') | KeyCode::Char('l') | KeyCode::Right => {
        if self.paginator.next() {
          self.load_page();
        }
      }
      KeyCode::Char('p') | KeyCode::Char('h') | KeyCode::Left => {
        if self.paginator.prev() {
          self.load_page();
        }
      }
      _ => return None,
    }
    Some(ViewAction::None)
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('r') => {
        self.refresh();
        Some(ViewAction::None)
      }
      KeyCode::Char('d') => {
        self.confirm_delete = self.selected_record();
        Some(ViewAction::None)
      }
      KeyCode::Enter => self
        .selected_record()
        .map(|record| ViewAction::Push(Box::new(RecordDetailView::new(self.resource, record)))),
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }

  fn title(&self, page: Option<&Page>) -> String {
    let position = format!(
      "{}{}{}",
      if self.paginator.has_prev() { "‹ " } else { "" },
      self.paginator.label(),
      if self.paginator.has_next() { " ›" } else { "" },
    );
    match self.query.state() {
      QueryState::Loading => format!(" {} [{}] (loading...) ", self.resource, position),
      QueryState::Error(e) => format!(" {} [{}] (error: {}) ", self.resource, position, e),
      _ => {
        let total = page.map(|p| p.meta.total_items).unwrap_or(0);
        format!(" {} [{}] ({} items) ", self.resource, position, total)
      }
    }
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect) {
    let page = self.page();
    let records = page.as_ref().map(|p| p.records.as_slice()).unwrap_or(&[]);
    ensure_valid_selection(&mut self.table_state, records.len());

    let block = Block::default()
      .title(self.title(page.as_ref()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if records.is_empty() {
      let content = if self.query.is_loading() {
        "Loading..."
      } else if self.query.is_error() {
        "Failed to load. Press 'r' to retry."
      } else {
        "No records found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let rows: Vec<Row> = records
      .iter()
      .map(|record| {
        Row::new(vec![
          Cell::from(record.id.clone()).style(Style::default().fg(Color::Cyan)),
          Cell::from(truncate(record.label(), 60)),
          Cell::from(
            record
              .created_at
              .as_deref()
              .map(format_timestamp)
              .unwrap_or_default(),
          )
          .style(Style::default().fg(Color::DarkGray)),
        ])
      })
      .collect();

    let header = Row::new(vec!["ID", "NAME", "CREATED"])
      .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let table = Table::new(
      rows,
      [
        Constraint::Length(26),
        Constraint::Min(20),
        Constraint::Length(17),
      ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.table_state);
  }

  fn render_confirm(&self, frame: &mut Frame, area: Rect) {
    let Some(record) = &self.confirm_delete else {
      return;
    };
    if area.height < 3 {
      return;
    }

    let line_area = Rect::new(area.x + 1, area.bottom() - 2, area.width.saturating_sub(2), 1);
    let prompt = Line::from(vec![
      Span::styled(
        format!(" Delete {} ({})? ", truncate(record.label(), 40), record.id),
        Style::default().fg(Color::White).bold(),
      ),
      Span::styled("y/n ", Style::default().fg(Color::Yellow)),
    ]);
    frame.render_widget(
      Paragraph::new(prompt).style(Style::default().bg(Color::Red)),
      line_area,
    );
  }
}

impl View for ResourceListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_confirm(key)
      .or_else(|| self.handle_navigation(key))
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_table(frame, area);
    self.render_confirm(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    self.resource.to_string()
  }

  fn tick(&mut self) {
    self.query.poll();
    self.poll_deletes();

    if let Some(page) = self.page() {
      self.paginator.set_total_pages(page.meta.total_pages);
    }
  }

  fn take_toast(&mut self) -> Option<Toast> {
    self.toast.take()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "resource"),
      Shortcut::new("n/p", "page"),
      Shortcut::new("d", "delete"),
      Shortcut::new("r", "refresh"),
      Shortcut::new("tab", "next"),
      Shortcut::new("q", "quit"),
    ]
  }
}
