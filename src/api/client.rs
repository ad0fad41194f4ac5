use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use crate::config::ApiConfig;

use super::api_types::ApiEnvelope;
use super::auth::TokenProvider;
use super::error::ApiError;
use super::types::CustomerRecord;

/// Path of the paginated customer listing, relative to the API base URL.
pub const CUSTOMER_FILTER_PATH: &str = "api/V1/customer/filter";

/// Anything that can hand out pages of customers.
#[async_trait]
pub trait CustomerSource: Send + Sync {
  /// Fetch one page. Pages are numbered from 1.
  async fn fetch_page(
    &self,
    page_no: u32,
    page_size: u32,
    filters: &BTreeMap<String, String>,
  ) -> Result<Vec<CustomerRecord>, ApiError>;
}

/// HTTP client for the customer API
#[derive(Clone)]
pub struct CustomerClient {
  http: reqwest::Client,
  endpoint: Url,
  auth: Arc<dyn TokenProvider>,
}

impl CustomerClient {
  pub fn new(config: &ApiConfig, auth: Arc<dyn TokenProvider>) -> Result<Self, ApiError> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.request_timeout_secs))
      .build()?;

    Ok(Self {
      http,
      endpoint: endpoint_url(&config.base_url)?,
      auth,
    })
  }

  pub fn endpoint(&self) -> &Url {
    &self.endpoint
  }
}

/// Join the listing path onto the base URL, keeping any path prefix.
fn endpoint_url(base_url: &str) -> Result<Url, ApiError> {
  let mut base = base_url.trim().to_string();
  if !base.ends_with('/') {
    base.push('/');
  }

  Url::parse(&base)
    .and_then(|url| url.join(CUSTOMER_FILTER_PATH))
    .map_err(|e| ApiError::Config(format!("bad base_url '{}': {}", base_url, e)))
}

#[async_trait]
impl CustomerSource for CustomerClient {
  async fn fetch_page(
    &self,
    page_no: u32,
    page_size: u32,
    filters: &BTreeMap<String, String>,
  ) -> Result<Vec<CustomerRecord>, ApiError> {
    let token = self.auth.bearer_token()?;

    let mut query: Vec<(&str, String)> = vec![
      ("paginated", "true".to_string()),
      ("pageNo", page_no.to_string()),
      ("pageSize", page_size.to_string()),
    ];
    query.extend(filters.iter().map(|(k, v)| (k.as_str(), v.clone())));

    debug!(page_no, page_size, filters = filters.len(), "fetching customer page");

    let response = self
      .http
      .get(self.endpoint.clone())
      .bearer_auth(token)
      .query(&query)
      .send()
      .await?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
      return Err(ApiError::Auth(format!(
        "server rejected credentials ({})",
        status
      )));
    }
    if !status.is_success() {
      return Err(ApiError::Server {
        status: Some(status.as_u16()),
        message: format!("unexpected status {}", status),
      });
    }

    let body = response.bytes().await?;
    let envelope: ApiEnvelope = serde_json::from_slice(&body)?;
    let records = envelope.into_records()?;

    debug!(page_no, count = records.len(), "customer page received");
    Ok(records)
  }
}
