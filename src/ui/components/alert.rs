use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Modal message box. While shown it takes every key; Enter or Esc closes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
  title: String,
  message: String,
}

impl Alert {
  pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      message: message.into(),
    }
  }

  /// `Event(())` means the alert was dismissed
  pub fn handle_key(&self, key: KeyEvent) -> KeyResult<()> {
    match key.code {
      KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => KeyResult::Event(()),
      _ => KeyResult::Handled,
    }
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let width = (self.message.chars().count() as u16 + 6)
      .clamp(24, 60)
      .min(area.width);
    let height = 5.min(area.height);
    let popup = Rect::new(
      area.x + area.width.saturating_sub(width) / 2,
      area.y + area.height.saturating_sub(height) / 2,
      width,
      height,
    );

    frame.render_widget(Clear, popup);

    let block = Block::default()
      .title(format!(" {} ", self.title))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red));

    let body = vec![
      Line::from(self.message.as_str()),
      Line::from(Span::styled(
        "[Enter] OK",
        Style::default().fg(Color::DarkGray),
      )),
    ];
    let paragraph = Paragraph::new(body)
      .block(block)
      .alignment(Alignment::Center)
      .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, popup);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  #[test]
  fn test_only_confirm_keys_dismiss() {
    let alert = Alert::new("Error", "Something went wrong");
    let key = |code| KeyEvent::new(code, KeyModifiers::NONE);

    assert_eq!(alert.handle_key(key(KeyCode::Char('j'))), KeyResult::Handled);
    assert_eq!(alert.handle_key(key(KeyCode::Enter)), KeyResult::Event(()));
    assert_eq!(alert.handle_key(key(KeyCode::Esc)), KeyResult::Event(()));
  }
}
