//! Paged customer store.
//!
//! Owns the in-memory customer list and keeps it in step with the listing
//! cache: hydrate from cache when possible, otherwise fetch page by page,
//! appending each page to memory and persisting the accumulated listing.
//! Search filters the in-memory list only.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::api::{ApiError, CustomerRecord, CustomerSource};
use crate::cache::{CachedListing, ListingCache, PersistenceError};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_CACHE_KEY: &str = "user_realm_id";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("failed to persist customer listing: {0}")]
  Persistence(#[from] PersistenceError),
}

/// Settings fixed for the lifetime of a store.
#[derive(Debug, Clone)]
pub struct StoreOptions {
  pub cache_key: String,
  pub page_size: u32,
  pub filters: BTreeMap<String, String>,
}

impl Default for StoreOptions {
  fn default() -> Self {
    Self {
      cache_key: DEFAULT_CACHE_KEY.to_string(),
      page_size: DEFAULT_PAGE_SIZE,
      filters: BTreeMap::new(),
    }
  }
}

/// A page fetch that has been started and not yet merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
  pub page_no: u32,
  pub page_size: u32,
  pub filters: BTreeMap<String, String>,
}

impl PageRequest {
  pub async fn execute(&self, source: &dyn CustomerSource) -> Result<Vec<CustomerRecord>, ApiError> {
    source
      .fetch_page(self.page_no, self.page_size, &self.filters)
      .await
  }
}

/// What a load attempt did.
#[derive(Debug)]
pub enum LoadOutcome {
  /// Listing came from the cache; nothing was fetched
  Hydrated { records: usize, next_page: u32 },
  /// A page was fetched, merged and persisted
  Loaded { page_no: u32, count: usize },
  /// Another fetch is in flight
  AlreadyLoading,
  /// End-of-list ignored: search active or list empty
  Suspended,
  /// Result arrived for a request that is no longer in flight
  Discarded,
  /// The fetch failed; state is unchanged
  Failed(ApiError),
}

pub struct PagedCustomerStore {
  source: Arc<dyn CustomerSource>,
  cache: Box<dyn ListingCache>,
  options: StoreOptions,

  /// Currently rendered rows, possibly filtered
  displayed: Vec<CustomerRecord>,
  /// Every record merged so far
  full: Vec<CustomerRecord>,
  current_page: u32,
  in_flight: Option<PageRequest>,
  search_text: String,
  cached_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl PagedCustomerStore {
  pub fn new(
    source: Arc<dyn CustomerSource>,
    cache: Box<dyn ListingCache>,
    options: StoreOptions,
  ) -> Self {
    Self {
      source,
      cache,
      options,
      displayed: Vec::new(),
      full: Vec::new(),
      current_page: 1,
      in_flight: None,
      search_text: String::new(),
      cached_at: None,
    }
  }

  /// Hydrate from the cache, or fetch the first page when the cache is empty.
  ///
  /// The async operations here compose the synchronous halves
  /// (`activate`, `begin_page_fetch`, `complete_page_fetch`) for callers
  /// that can await the fetch in place. The list view runs those halves
  /// itself so the fetch does not block the event loop.
  pub async fn initialize(&mut self) -> Result<LoadOutcome, StoreError> {
    match self.activate() {
      Some(request) => self.run(request).await,
      None if self.is_loading() => Ok(LoadOutcome::AlreadyLoading),
      None => Ok(LoadOutcome::Hydrated {
        records: self.full.len(),
        next_page: self.current_page,
      }),
    }
  }

  /// Synchronous half of `initialize`: hydrate from the cache, or return the
  /// first page request to run. `None` means the cache was used, or a fetch
  /// is already in flight.
  pub fn activate(&mut self) -> Option<PageRequest> {
    if self.hydrate_from_cache() {
      return None;
    }
    self.begin_page_fetch()
  }

  async fn run(&mut self, request: PageRequest) -> Result<LoadOutcome, StoreError> {
    let result = request.execute(self.source.as_ref()).await;
    self.complete_page_fetch(&request, result)
  }

  /// Load the cached listing into memory. Returns false when there is
  /// nothing cached; a failed read counts as nothing cached.
  pub fn hydrate_from_cache(&mut self) -> bool {
    let listing = match self.cache.read_singleton(&self.options.cache_key) {
      Ok(Some(listing)) if !listing.is_empty() => listing,
      Ok(_) => {
        debug!(key = %self.options.cache_key, "no cached customers");
        return false;
      }
      Err(e) => {
        warn!(error = %e, "failed to read customer cache, falling back to network");
        return false;
      }
    };

    info!(
      records = listing.records.len(),
      next_page = listing.next_page_number,
      "hydrated customers from cache"
    );
    self.current_page = listing.next_page_number.max(1);
    self.cached_at = listing.cached_at;
    self.full = listing.records;
    self.displayed = self.filter(&self.search_text);
    true
  }

  /// Fetch the next page and merge it.
  pub async fn load_next_page(&mut self) -> Result<LoadOutcome, StoreError> {
    match self.begin_page_fetch() {
      Some(request) => self.run(request).await,
      None => Ok(LoadOutcome::AlreadyLoading),
    }
  }

  /// End of the displayed list was reached.
  pub async fn on_end_reached(&mut self) -> Result<LoadOutcome, StoreError> {
    if !self.wants_more() {
      return Ok(LoadOutcome::Suspended);
    }
    self.load_next_page().await
  }

  /// Synchronous half of `on_end_reached`, for callers that run the fetch themselves.
  pub fn end_reached_request(&mut self) -> Option<PageRequest> {
    if !self.wants_more() {
      return None;
    }
    self.begin_page_fetch()
  }

  fn wants_more(&self) -> bool {
    !self.full.is_empty() && !self.is_searching()
  }

  /// Mark a fetch for the current page as in flight.
  ///
  /// Returns `None` while another fetch is outstanding.
  pub fn begin_page_fetch(&mut self) -> Option<PageRequest> {
    if let Some(pending) = &self.in_flight {
      debug!(page = pending.page_no, "page fetch already in flight");
      return None;
    }

    let request = PageRequest {
      page_no: self.current_page,
      page_size: self.options.page_size,
      filters: self.options.filters.clone(),
    };
    self.in_flight = Some(request.clone());
    Some(request)
  }

  /// Merge the result of a fetch started with `begin_page_fetch`.
  ///
  /// Fetch errors are logged and reported as `LoadOutcome::Failed`. Only a
  /// failed cache write is returned as an error, and memory is then left as
  /// it was so that it never runs ahead of the cache.
  ///
  /// The write runs on the calling task and serializes the whole accumulated
  /// listing, so each page costs O(total records). Rows whose bytes are
  /// unchanged are not rewritten.
  pub fn complete_page_fetch(
    &mut self,
    request: &PageRequest,
    result: Result<Vec<CustomerRecord>, ApiError>,
  ) -> Result<LoadOutcome, StoreError> {
    if self.in_flight.as_ref() != Some(request) {
      warn!(page = request.page_no, "ignoring result of a page fetch that is not in flight");
      return Ok(LoadOutcome::Discarded);
    }
    self.in_flight = None;

    let page = match result {
      Ok(page) => page,
      Err(e) => {
        warn!(page = request.page_no, error = %e, "failed to load customers");
        return Ok(LoadOutcome::Failed(e));
      }
    };

    let mut records = Vec::with_capacity(self.full.len() + page.len());
    records.extend_from_slice(&self.full);
    records.extend_from_slice(&page);
    let listing = CachedListing::new(request.page_no + 1, records);

    if let Err(e) = self
      .cache
      .upsert_singleton(&self.options.cache_key, &listing)
    {
      error!(page = request.page_no, error = %e, "failed to persist customers");
      return Err(e.into());
    }

    let count = page.len();
    let needle = self.search_text.to_lowercase();
    self.displayed.extend(
      page
        .into_iter()
        .filter(|record| needle.is_empty() || record.name_contains(&needle)),
    );
    self.full = listing.records;
    self.current_page = listing.next_page_number;

    info!(
      page = request.page_no,
      count,
      total = self.full.len(),
      "merged customer page"
    );
    Ok(LoadOutcome::Loaded {
      page_no: request.page_no,
      count,
    })
  }

  /// Filter the loaded customers by name. Empty text shows everything.
  pub fn search(&mut self, text: &str) {
    self.search_text = text.to_string();
    self.displayed = self.filter(text);
    debug!(query = text, matches = self.displayed.len(), "search applied");
  }

  fn filter(&self, text: &str) -> Vec<CustomerRecord> {
    if text.is_empty() {
      return self.full.clone();
    }

    let needle = text.to_lowercase();
    self
      .full
      .iter()
      .filter(|record| record.name_contains(&needle))
      .cloned()
      .collect()
  }

  pub fn source(&self) -> Arc<dyn CustomerSource> {
    Arc::clone(&self.source)
  }

  pub fn displayed(&self) -> &[CustomerRecord] {
    &self.displayed
  }

  pub fn full(&self) -> &[CustomerRecord] {
    &self.full
  }

  pub fn current_page(&self) -> u32 {
    self.current_page
  }

  pub fn is_loading(&self) -> bool {
    self.in_flight.is_some()
  }

  pub fn search_text(&self) -> &str {
    &self.search_text
  }

  pub fn is_searching(&self) -> bool {
    !self.search_text.is_empty()
  }

  /// When the hydrated listing was written, if it came from the cache.
  pub fn cached_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
    self.cached_at
  }
}
