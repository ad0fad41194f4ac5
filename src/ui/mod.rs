pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::ListState;

/// Clamp the selection into `0..len`, selecting the first row when nothing is
/// selected, and clearing it for an empty list.
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }
  match state.selected() {
    Some(i) if i >= len => state.select(Some(len - 1)),
    Some(_) => {}
    None => state.select(Some(0)),
  }
}

/// True when the rows left below the viewport are fewer than `threshold`
/// viewports. A list shorter than the viewport is always at its end.
pub fn end_reached(offset: usize, viewport_rows: usize, total_rows: usize, threshold: f32) -> bool {
  if viewport_rows == 0 {
    return false;
  }
  let below = total_rows.saturating_sub(offset + viewport_rows);
  (below as f32) < threshold * viewport_rows as f32
}

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

  let breadcrumb = app.view_breadcrumb();
  let title = app.title().to_string();

  if let Some(view) = app.current_view_mut() {
    let context = view.context();
    renderfns::draw_header(
      frame,
      chunks[0],
      &title,
      context.as_deref(),
      &view.shortcuts(),
    );
    view.render(frame, chunks[1]);
    renderfns::draw_footer(frame, chunks[2], &breadcrumb, view.status().as_deref());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_selection_is_clamped() {
    let mut state = ListState::default();
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(0));

    state.select(Some(10));
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(2));

    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);
  }

  #[test]
  fn test_end_reached_within_half_a_viewport() {
    // 100 rows, 20 visible: rows below = 100 - (offset + 20)
    assert!(!end_reached(0, 20, 100, 0.5));
    assert!(!end_reached(70, 20, 100, 0.5)); // 10 below, not fewer than 10
    assert!(end_reached(71, 20, 100, 0.5));
    assert!(end_reached(80, 20, 100, 0.5));
  }

  #[test]
  fn test_short_list_is_at_end() {
    assert!(end_reached(0, 20, 5, 0.5));
  }

  #[test]
  fn test_no_viewport_never_reaches_end() {
    assert!(!end_reached(0, 0, 5, 0.5));
  }
}
