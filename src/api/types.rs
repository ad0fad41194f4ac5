use serde::{Deserialize, Serialize};

/// A customer as returned by one page fetch.
///
/// Only `id` is guaranteed; every other field may be missing upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
  pub id: String,
  pub external_id: Option<i64>,
  pub name: Option<String>,
  pub dial_code: Option<String>,
  pub mobile: Option<String>,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
  pub record_status: Option<bool>,
}

impl CustomerRecord {
  /// Identity of a row, kept stable across filtering.
  pub fn list_key(&self) -> (&str, Option<i64>) {
    (&self.id, self.external_id)
  }

  /// Case-insensitive substring match on `name`. `needle` must already be lowercase.
  pub fn name_contains(&self, needle: &str) -> bool {
    self
      .name
      .as_deref()
      .is_some_and(|name| name.to_lowercase().contains(needle))
  }

  /// Dial code and mobile number joined, if either is present.
  pub fn phone(&self) -> Option<String> {
    match (self.dial_code.as_deref(), self.mobile.as_deref()) {
      (None, None) => None,
      (dial, mobile) => Some(format!(
        "{}{}",
        dial.unwrap_or_default(),
        mobile.unwrap_or_default()
      )),
    }
  }
}

#[cfg(test)]
pub(crate) fn customer(id: &str, name: Option<&str>) -> CustomerRecord {
  CustomerRecord {
    id: id.to_string(),
    external_id: None,
    name: name.map(String::from),
    dial_code: None,
    mobile: None,
    created_at: None,
    updated_at: None,
    record_status: None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_name_contains_ignores_case() {
    let record = customer("1", Some("John Doe"));
    assert!(record.name_contains("john"));
    assert!(record.name_contains("doe"));
    assert!(!record.name_contains("jane"));
  }

  #[test]
  fn test_missing_name_never_matches() {
    let record = customer("1", None);
    assert!(!record.name_contains("a"));
  }

  #[test]
  fn test_list_key_pairs_id_and_external_id() {
    let mut record = customer("abc", None);
    record.external_id = Some(42);
    assert_eq!(record.list_key(), ("abc", Some(42)));
  }

  #[test]
  fn test_phone_joins_parts() {
    let mut record = customer("1", None);
    assert_eq!(record.phone(), None);

    record.dial_code = Some("+91".to_string());
    record.mobile = Some("9876543210".to_string());
    assert_eq!(record.phone().as_deref(), Some("+919876543210"));

    record.dial_code = None;
    assert_eq!(record.phone().as_deref(), Some("9876543210"));
  }
}
