//! Core types for the listing cache.

use chrono::{DateTime, Utc};

use crate::api::CustomerRecord;

/// The whole paginated listing, persisted as one record under a fixed key.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedListing {
  /// Next page to request; 1 + pages merged so far
  pub next_page_number: u32,
  /// Every record fetched so far, in server order across pages
  pub records: Vec<CustomerRecord>,
  /// When the listing was last written (filled in on read)
  pub cached_at: Option<DateTime<Utc>>,
}

impl CachedListing {
  pub fn new(next_page_number: u32, records: Vec<CustomerRecord>) -> Self {
    Self {
      next_page_number,
      records,
      cached_at: None,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
  #[error("SQLite error: {0}")]
  Sqlite(#[from] rusqlite::Error),
  #[error("Serialization error: {0}")]
  Serde(#[from] serde_json::Error),
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
  #[error("Lock poisoned")]
  LockPoisoned,
  #[error("Could not determine data directory")]
  NoDataDir,
  #[error("Bad timestamp '{0}'")]
  Timestamp(String),
}

/// Key-value store holding singleton listings.
pub trait ListingCache: Send + Sync {
  /// Read the listing stored under `key`, if any.
  fn read_singleton(&self, key: &str) -> Result<Option<CachedListing>, PersistenceError>;

  /// Create the listing under `key`, or update the fields that changed.
  /// The write is all-or-nothing.
  fn upsert_singleton(&self, key: &str, listing: &CachedListing) -> Result<(), PersistenceError>;
}
