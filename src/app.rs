use crate::event::{Event, EventHandler};
use crate::ui;
use crate::ui::renderfns::extract_domain;
use crate::ui::view::{View, ViewAction};
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

const TICK_RATE: Duration = Duration::from_millis(250);

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Header title
  title: String,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  /// `title` falls back to the API host when not configured.
  pub fn new(root: Box<dyn View>, title: Option<String>, base_url: &str) -> Self {
    Self {
      view_stack: vec![root],
      title: title.unwrap_or_else(|| extract_domain(base_url).to_string()),
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let result = self.event_loop().await;

    // Cleanup terminal, even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut events = EventHandler::new(TICK_RATE);

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    info!("exiting");
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Resize => {
        for view in &mut self.view_stack {
          view.resized();
        }
        self.tick();
      }
      Event::Tick => self.tick(),
    }
  }

  /// Views below the top keep collecting their async results
  fn tick(&mut self) {
    for view in &mut self.view_stack {
      view.tick();
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let Some(view) = self.view_stack.last_mut() else {
      self.should_quit = true;
      return;
    };

    match view.handle_key(key) {
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

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn view_breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|view| view.breadcrumb_label())
      .collect()
  }

  pub fn should_quit(&self) -> bool {
    self.should_quit
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ui::view::Shortcut;

  struct Stub {
    label: &'static str,
    push_on_enter: bool,
  }

  impl View for Stub {
    fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
      match key.code {
        KeyCode::Enter if self.push_on_enter => ViewAction::Push(Box::new(Stub {
          label: "child",
          push_on_enter: false,
        })),
        KeyCode::Char('q') => ViewAction::Pop,
        _ => ViewAction::None,
      }
    }

    fn render(&mut self, _frame: &mut Frame, _area: Rect) {}

    fn breadcrumb_label(&self) -> String {
      self.label.to_string()
    }

    fn shortcuts(&self) -> Vec<Shortcut> {
      Vec::new()
    }
  }

  fn app() -> App {
    let root = Stub {
      label: "root",
      push_on_enter: true,
    };
    App::new(Box::new(root), None, "https://api.example.com/v1")
  }

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_title_defaults_to_api_host() {
    assert_eq!(app().title(), "api.example.com");
  }

  #[test]
  fn test_push_and_pop() {
    let mut app = app();
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.view_breadcrumb(), vec!["root", "child"]);

    app.handle_key(key(KeyCode::Char('q')));
    assert_eq!(app.view_breadcrumb(), vec!["root"]);
    assert!(!app.should_quit());

    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit());
  }

  #[test]
  fn test_ctrl_c_quits_from_any_view() {
    let mut app = app();
    app.handle_key(key(KeyCode::Enter));
    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit());
  }
}
