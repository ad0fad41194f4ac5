use crate::api::{ApiError, CustomerRecord};
use crate::store::{LoadOutcome, PageRequest, PagedCustomerStore};
use crate::task::{Debouncer, Pending, TaskPoll};
use crate::ui::components::{Alert, KeyResult, SearchEvent, SearchInput};
use crate::ui::renderfns::{or_na, record_status_color, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::CustomerDetailView;
use crate::ui::{end_reached, ensure_valid_selection};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use std::time::Duration;
use tracing::error;

/// Quiet period before a search keystroke filters the list
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Load more once fewer than this many viewports of rows remain below
pub const END_REACHED_THRESHOLD: f32 = 0.5;

const REJECTED_ALERT: &str = "Something went wrong";

type PageResult = Result<Vec<CustomerRecord>, ApiError>;

/// Scrollable customer list with infinite paging and name search
pub struct CustomerListView {
  store: PagedCustomerStore,
  fetch: Option<(PageRequest, Pending<PageResult>)>,
  debouncer: Debouncer<String>,
  list_state: ListState,
  search: SearchInput,
  alert: Option<Alert>,
  /// Rows visible in the last render
  viewport_rows: usize,
  /// Set by scrolling and by growth of the list; cleared once checked
  check_end: bool,
  status: Option<String>,
}

impl CustomerListView {
  pub fn new(store: PagedCustomerStore) -> Self {
    let mut view = Self {
      store,
      fetch: None,
      debouncer: Debouncer::new(SEARCH_DEBOUNCE),
      list_state: ListState::default(),
      search: SearchInput::new(),
      alert: None,
      viewport_rows: 0,
      check_end: false,
      status: None,
    };
    view.activate();
    view
  }

  /// Show the cached listing, or start fetching the first page.
  fn activate(&mut self) {
    if let Some(request) = self.store.activate() {
      self.spawn_fetch(request);
      return;
    }
    self.status = self
      .store
      .cached_at()
      .map(|at| format!("offline copy from {}", at.format("%Y-%m-%d %H:%M")));
    self.check_end = true;
  }

  fn spawn_fetch(&mut self, request: PageRequest) {
    let source = self.store.source();
    let task_request = request.clone();
    let task = Pending::spawn(async move { task_request.execute(source.as_ref()).await });
    self.fetch = Some((request, task));
  }

  fn poll_fetch(&mut self) {
    let Some((request, mut task)) = self.fetch.take() else {
      return;
    };

    let result = match task.poll() {
      TaskPoll::Pending => {
        self.fetch = Some((request, task));
        return;
      }
      TaskPoll::Ready(result) => result,
      TaskPoll::Lost => Err(ApiError::Network(
        "page fetch ended without a result".to_string(),
      )),
    };

    self.finish_fetch(&request, result);
  }

  fn finish_fetch(&mut self, request: &PageRequest, result: PageResult) {
    match self.store.complete_page_fetch(request, result) {
      Ok(LoadOutcome::Loaded { count, .. }) => {
        self.status = None;
        // More rows may still leave the viewport unfilled. An empty page
        // waits for the user to scroll again.
        self.check_end = count > 0;
      }
      Ok(LoadOutcome::Failed(err)) => {
        if err.is_server_rejection() {
          self.alert = Some(Alert::new("Error", REJECTED_ALERT));
        }
        self.status = Some(err.to_string());
      }
      Ok(_) => {}
      Err(e) => {
        error!(error = %e, "customer page was fetched but not saved");
        self.status = Some(e.to_string());
      }
    }
  }

  fn poll_search(&mut self) {
    if let Some(query) = self.debouncer.poll() {
      self.apply_search(&query);
    }
  }

  /// Filter the list, keeping the selected customer selected when it is
  /// still shown.
  fn apply_search(&mut self, query: &str) {
    let selected = self
      .list_state
      .selected()
      .and_then(|idx| self.store.displayed().get(idx))
      .map(|customer| {
        let (id, external_id) = customer.list_key();
        (id.to_string(), external_id)
      });

    self.store.search(query);

    let displayed = self.store.displayed();
    let idx = selected
      .and_then(|(id, external_id)| {
        displayed
          .iter()
          .position(|customer| customer.list_key() == (id.as_str(), external_id))
      })
      .or(if displayed.is_empty() { None } else { Some(0) });
    self.list_state.select(idx);
  }

  fn maybe_load_more(&mut self) {
    if !self.check_end || self.viewport_rows == 0 {
      return;
    }
    self.check_end = false;

    let near_end = end_reached(
      self.list_state.offset(),
      self.viewport_rows,
      self.store.displayed().len(),
      END_REACHED_THRESHOLD,
    );
    if !near_end {
      return;
    }

    if let Some(request) = self.store.end_reached_request() {
      self.spawn_fetch(request);
    }
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.store.displayed().len();
    ensure_valid_selection(&mut self.list_state, len);
    self.viewport_rows = area.height.saturating_sub(2) as usize;

    let mut title = if self.store.is_searching() {
      format!(
        " Customers /{} ({} of {}) ",
        self.store.search_text(),
        len,
        self.store.full().len()
      )
    } else {
      format!(" Customers ({}) ", len)
    };
    if self.store.is_loading() {
      title.push_str("(loading...) ");
    }

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 {
      let content = if self.store.is_loading() {
        "Loading customers..."
      } else if self.store.is_searching() {
        "No customers match the search."
      } else if self.status.is_some() {
        "Failed to load customers. Press 'r' to try again."
      } else {
        "No customers found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let mut items: Vec<ListItem> = self
      .store
      .displayed()
      .iter()
      .map(|customer| {
        let phone = customer.phone();
        let line = Line::from(vec![
          Span::styled("● ", Style::default().fg(record_status_color(customer.record_status))),
          Span::styled(
            format!("{:<32}", truncate(or_na(customer.name.as_deref()), 32)),
            Style::default().fg(Color::White).bold(),
          ),
          Span::raw(" "),
          Span::styled(
            format!("Mobile No: {}", or_na(phone.as_deref())),
            Style::default().fg(Color::Cyan),
          ),
        ]);
        ListItem::new(line)
      })
      .collect();

    if self.store.is_loading() {
      items.push(ListItem::new(Line::from(Span::styled(
        "  Loading more customers...",
        Style::default().fg(Color::DarkGray),
      ))));
    }

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  // Key handling helpers for or_else chain pattern
  fn handle_overlays(&mut self, key: KeyEvent) -> Option<ViewAction> {
    if let Some(alert) = &self.alert {
      if let KeyResult::Event(()) = alert.handle_key(key) {
        self.alert = None;
      }
      return Some(ViewAction::None);
    }

    match self.search.handle_key(key) {
      KeyResult::Handled => Some(ViewAction::None),
      KeyResult::Event(SearchEvent::Changed(query)) => {
        self.debouncer.schedule(query);
        Some(ViewAction::None)
      }
      KeyResult::Event(SearchEvent::Submitted(query)) => {
        self.debouncer.cancel();
        self.apply_search(&query);
        Some(ViewAction::None)
      }
      KeyResult::Event(SearchEvent::Cleared) => {
        self.debouncer.cancel();
        self.apply_search("");
        Some(ViewAction::None)
      }
      KeyResult::NotHandled => None,
    }
  }

  fn handle_navigation(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::PageDown => self.list_state.scroll_down_by(self.viewport_rows.max(1) as u16),
      KeyCode::PageUp => self.list_state.scroll_up_by(self.viewport_rows.max(1) as u16),
      KeyCode::Char('g') | KeyCode::Home => self.list_state.select_first(),
      KeyCode::Char('G') | KeyCode::End => self.list_state.select_last(),
      _ => return None,
    }
    self.check_end = true;
    Some(ViewAction::None)
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('r') => {
        if self.store.full().is_empty() {
          if let Some(request) = self.store.begin_page_fetch() {
            self.spawn_fetch(request);
          }
        } else {
          // Same gating as scrolling
          self.check_end = true;
        }
        Some(ViewAction::None)
      }
      KeyCode::Enter => {
        let idx = self.list_state.selected()?;
        let customer = self.store.displayed().get(idx)?;
        Some(ViewAction::Push(Box::new(CustomerDetailView::new(
          customer.clone(),
        ))))
      }
      KeyCode::Esc if self.store.is_searching() => {
        self.search.clear();
        self.debouncer.cancel();
        self.apply_search("");
        Some(ViewAction::None)
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }
}

impl View for CustomerListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_overlays(key)
      .or_else(|| self.handle_navigation(key))
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
    self.search.render_overlay(frame, area);
    if let Some(alert) = &self.alert {
      alert.render(frame, area);
    }
  }

  fn breadcrumb_label(&self) -> String {
    "Customers".to_string()
  }

  fn context(&self) -> Option<String> {
    Some(format!(
      "{} loaded, next page {}",
      self.store.full().len(),
      self.store.current_page()
    ))
  }

  fn status(&self) -> Option<String> {
    self.status.clone()
  }

  fn tick(&mut self) {
    self.poll_fetch();
    self.poll_search();
    self.maybe_load_more();
  }

  fn resized(&mut self) {
    self.check_end = true;
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("/", "search").with_priority(10),
      Shortcut::new("enter", "details").with_priority(20),
      Shortcut::new("r", "load more").with_priority(25),
      Shortcut::new("q", "quit").with_priority(30),
    ]
  }
}
