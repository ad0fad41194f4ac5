//! Local persistence for the customer listing.
//!
//! The listing is stored as a single record under a fixed key so a restart
//! resumes from the last merged page instead of refetching from page 1.

mod storage;
mod traits;

pub use storage::{NoopStorage, SqliteStorage};
pub use traits::{CachedListing, ListingCache, PersistenceError};
