use ratatui::prelude::Color;

/// Truncate to at most `max_len` characters, ending in "..." when cut
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Placeholder for fields the API left out
pub fn or_na(value: Option<&str>) -> &str {
  match value {
    Some(v) if !v.trim().is_empty() => v,
    _ => "NA",
  }
}

/// Display color for a customer's record status flag
pub fn record_status_color(status: Option<bool>) -> Color {
  match status {
    Some(true) => Color::Green,
    Some(false) => Color::Red,
    None => Color::DarkGray,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_counts_characters() {
    assert_eq!(truncate("Ñandú Pérez", 8), "Ñandú...");
  }

  #[test]
  fn test_or_na() {
    assert_eq!(or_na(Some("Asha")), "Asha");
    assert_eq!(or_na(Some("  ")), "NA");
    assert_eq!(or_na(None), "NA");
  }

  #[test]
  fn test_record_status_color() {
    assert_eq!(record_status_color(Some(true)), Color::Green);
    assert_eq!(record_status_color(Some(false)), Color::Red);
    assert_eq!(record_status_color(None), Color::DarkGray);
  }
}
