//! Serde types matching the customer API responses.
//!
//! Kept apart from `CustomerRecord` so that loosely shaped upstream payloads
//! are validated here and never leak into the rest of the program.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::error::ApiError;
use super::types::CustomerRecord;

const REJECTED_MESSAGE: &str = "Something went wrong";

/// `{ success, data: { customers: [...] } }`
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
  #[serde(default)]
  pub success: bool,
  pub message: Option<String>,
  pub data: Option<ApiCustomerPage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiCustomerPage {
  // Raw values so one malformed customer does not sink the page
  #[serde(default)]
  pub customers: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCustomer {
  pub id: Option<String>,
  pub cg_id: Option<i64>,
  pub name: Option<String>,
  pub dial_code: Option<String>,
  pub mobile: Option<String>,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
  pub record_status: Option<bool>,
}

impl ApiCustomer {
  fn into_record(self) -> Option<CustomerRecord> {
    let id = self.id.filter(|id| !id.is_empty())?;
    Some(CustomerRecord {
      id,
      external_id: self.cg_id,
      name: self.name,
      dial_code: self.dial_code,
      mobile: self.mobile,
      created_at: self.created_at,
      updated_at: self.updated_at,
      record_status: self.record_status,
    })
  }
}

impl ApiEnvelope {
  /// Validate the envelope and convert its customers, in server order.
  pub fn into_records(self) -> Result<Vec<CustomerRecord>, ApiError> {
    if !self.success {
      return Err(ApiError::Server {
        status: None,
        message: self
          .message
          .unwrap_or_else(|| REJECTED_MESSAGE.to_string()),
      });
    }

    let customers = self.data.unwrap_or_default().customers;
    let mut records = Vec::with_capacity(customers.len());
    for (index, raw) in customers.into_iter().enumerate() {
      match serde_json::from_value::<ApiCustomer>(raw) {
        Ok(customer) => match customer.into_record() {
          Some(record) => records.push(record),
          None => warn!(index, "skipping customer without an id"),
        },
        Err(e) => warn!(index, error = %e, "skipping malformed customer"),
      }
    }
    Ok(records)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn envelope(value: Value) -> ApiEnvelope {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn test_partial_fields_are_tolerated() {
    let records = envelope(json!({
      "success": true,
      "data": { "customers": [
        { "id": "a", "cgId": 7, "name": "Asha", "dialCode": "+91", "mobile": "99", "recordStatus": true },
        { "id": "b" }
      ]}
    }))
    .into_records()
    .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].external_id, Some(7));
    assert_eq!(records[0].dial_code.as_deref(), Some("+91"));
    assert_eq!(records[0].record_status, Some(true));
    assert_eq!(records[1].id, "b");
    assert_eq!(records[1].name, None);
  }

  #[test]
  fn test_customers_without_id_are_dropped() {
    let records = envelope(json!({
      "success": true,
      "data": { "customers": [
        { "name": "no id" },
        { "id": "", "name": "empty id" },
        { "id": "ok", "name": 12 },
        { "id": "kept" }
      ]}
    }))
    .into_records()
    .unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["kept"]);
  }

  #[test]
  fn test_unsuccessful_envelope_is_server_error() {
    let err = envelope(json!({ "success": false })).into_records().unwrap_err();
    match err {
      ApiError::Server { status, message } => {
        assert_eq!(status, None);
        assert_eq!(message, REJECTED_MESSAGE);
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn test_missing_data_is_an_empty_page() {
    let records = envelope(json!({ "success": true })).into_records().unwrap();
    assert!(records.is_empty());
  }
}
