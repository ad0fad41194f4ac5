use crate::api::CustomerRecord;
use crate::ui::renderfns::{or_na, record_status_color};
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

pub struct CustomerDetailView {
  customer: CustomerRecord,
  scroll: u16,
}

impl CustomerDetailView {
  pub fn new(customer: CustomerRecord) -> Self {
    Self {
      customer,
      scroll: 0,
    }
  }

  fn lines(&self) -> Vec<Line<'static>> {
    let c = &self.customer;
    let status = match c.record_status {
      Some(true) => "Active",
      Some(false) => "Inactive",
      None => "NA",
    };
    let external_id = c.external_id.map(|id| id.to_string());
    let phone = c.phone();

    vec![
      field("Name", or_na(c.name.as_deref())),
      field("ID", &c.id),
      field("External ID", or_na(external_id.as_deref())),
      field("Mobile No", or_na(phone.as_deref())),
      Line::from(vec![
        Span::styled(format!("{:<14}", "Status"), Style::default().fg(Color::DarkGray)),
        Span::styled(
          status.to_string(),
          Style::default().fg(record_status_color(c.record_status)).bold(),
        ),
      ]),
      field("Created", or_na(c.created_at.as_deref())),
      field("Updated", or_na(c.updated_at.as_deref())),
    ]
  }
}

fn field(label: &str, value: &str) -> Line<'static> {
  Line::from(vec![
    Span::styled(format!("{:<14}", label), Style::default().fg(Color::DarkGray)),
    Span::styled(value.to_string(), Style::default().fg(Color::White)),
  ])
}

impl View for CustomerDetailView {
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
    let title = format!(" {} ", or_na(self.customer.name.as_deref()));
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let paragraph = Paragraph::new(self.lines())
      .block(block)
      .wrap(Wrap { trim: false })
      .scroll((self.scroll, 0));
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    self
      .customer
      .name
      .clone()
      .unwrap_or_else(|| self.customer.id.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::customer;
  use crossterm::event::KeyModifiers;

  #[test]
  fn test_missing_fields_show_na() {
    let view = CustomerDetailView::new(customer("c-1", None));
    let text: Vec<String> = view
      .lines()
      .iter()
      .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
      .collect();

    assert!(text[0].ends_with("NA"));
    assert!(text[1].ends_with("c-1"));
    assert!(text[3].ends_with("NA"));
  }

  #[test]
  fn test_breadcrumb_falls_back_to_id() {
    assert_eq!(
      CustomerDetailView::new(customer("c-1", None)).breadcrumb_label(),
      "c-1"
    );
    assert_eq!(
      CustomerDetailView::new(customer("c-1", Some("Asha"))).breadcrumb_label(),
      "Asha"
    );
  }

  #[test]
  fn test_escape_pops() {
    let mut view = CustomerDetailView::new(customer("c-1", None));
    let action = view.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
    assert!(matches!(action, ViewAction::Pop));
  }
}
