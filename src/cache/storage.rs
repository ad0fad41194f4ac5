//! SQLite-backed listing cache, plus a no-op backend for running uncached.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::traits::{CachedListing, ListingCache, PersistenceError};

/// Bumped whenever the tables below change shape. A database written with
/// another version is dropped and rebuilt rather than migrated.
const SCHEMA_VERSION: i64 = 1;

const CACHE_SCHEMA: &str = r#"
-- One row per singleton listing
CREATE TABLE IF NOT EXISTS listing (
    listing_key TEXT PRIMARY KEY,
    next_page_number INTEGER NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Listing members in server order (serialized JSON)
CREATE TABLE IF NOT EXISTS listing_records (
    listing_key TEXT NOT NULL,
    position INTEGER NOT NULL,
    record_id TEXT NOT NULL,
    data BLOB NOT NULL,
    PRIMARY KEY (listing_key, position),
    FOREIGN KEY (listing_key) REFERENCES listing(listing_key) ON DELETE CASCADE
);
"#;

const DROP_SCHEMA: &str = r#"
DROP TABLE IF EXISTS listing_records;
DROP TABLE IF EXISTS listing;
"#;

/// Storage that never holds anything. Used when caching is disabled.
pub struct NoopStorage;

impl ListingCache for NoopStorage {
  fn read_singleton(&self, _key: &str) -> Result<Option<CachedListing>, PersistenceError> {
    Ok(None) // Always miss
  }

  fn upsert_singleton(&self, _key: &str, _listing: &CachedListing) -> Result<(), PersistenceError> {
    Ok(()) // Discard
  }
}

/// SQLite-based listing storage.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open or create the cache database at `path`.
  pub fn open(path: &Path) -> Result<Self, PersistenceError> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    debug!(path = %path.display(), "opened listing cache");
    Self::with_connection(conn)
  }

  /// Purely in-memory database; contents vanish on drop.
  pub fn open_in_memory() -> Result<Self, PersistenceError> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  /// `<data_dir>/custlist/cache.db`
  pub fn default_path() -> Result<PathBuf, PersistenceError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or(PersistenceError::NoDataDir)?;

    Ok(data_dir.join("custlist").join("cache.db"))
  }

  fn with_connection(conn: Connection) -> Result<Self, PersistenceError> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  fn run_migrations(&self) -> Result<(), PersistenceError> {
    let conn = self.lock()?;

    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version != 0 && version != SCHEMA_VERSION {
      info!(
        found = version,
        expected = SCHEMA_VERSION,
        "cache schema changed, discarding cached listings"
      );
      conn.execute_batch(DROP_SCHEMA)?;
    }

    conn.execute_batch(CACHE_SCHEMA)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>, PersistenceError> {
    self.conn.lock().map_err(|_| PersistenceError::LockPoisoned)
  }
}

impl ListingCache for SqliteStorage {
  fn read_singleton(&self, key: &str) -> Result<Option<CachedListing>, PersistenceError> {
    let conn = self.lock()?;

    let header: Option<(u32, String)> = conn
      .query_row(
        "SELECT next_page_number, updated_at FROM listing WHERE listing_key = ?",
        params![key],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()?;

    let (next_page_number, updated_at) = match header {
      Some(header) => header,
      None => return Ok(None),
    };

    let mut stmt = conn.prepare(
      "SELECT position, data FROM listing_records
       WHERE listing_key = ?
       ORDER BY position",
    )?;

    let rows = stmt.query_map(params![key], |row| {
      Ok((row.get::<_, i64>(0)?, row.get::<_, Vec<u8>>(1)?))
    })?;

    let mut records = Vec::new();
    for row in rows {
      let (position, data) = row?;
      match serde_json::from_slice(&data) {
        Ok(record) => records.push(record),
        Err(e) => warn!(position, error = %e, "skipping unreadable cached customer"),
      }
    }

    Ok(Some(CachedListing {
      next_page_number,
      records,
      cached_at: Some(parse_datetime(&updated_at)?),
    }))
  }

  fn upsert_singleton(&self, key: &str, listing: &CachedListing) -> Result<(), PersistenceError> {
    let mut conn = self.lock()?;
    let tx = conn.transaction()?;

    tx.execute(
      "INSERT INTO listing (listing_key, next_page_number, updated_at)
       VALUES (?, ?, datetime('now'))
       ON CONFLICT(listing_key) DO UPDATE SET
         next_page_number = excluded.next_page_number,
         updated_at = excluded.updated_at",
      params![key, listing.next_page_number],
    )?;

    {
      // Rows whose payload is unchanged are left alone
      let mut upsert = tx.prepare(
        "INSERT INTO listing_records (listing_key, position, record_id, data)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(listing_key, position) DO UPDATE SET
           record_id = excluded.record_id,
           data = excluded.data
         WHERE listing_records.data IS NOT excluded.data",
      )?;

      for (position, record) in listing.records.iter().enumerate() {
        let data = serde_json::to_vec(record)?;
        upsert.execute(params![key, position as i64, record.id, data])?;
      }
    }

    tx.execute(
      "DELETE FROM listing_records WHERE listing_key = ? AND position >= ?",
      params![key, listing.records.len() as i64],
    )?;

    tx.commit()?;
    Ok(())
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, PersistenceError> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|_| PersistenceError::Timestamp(s.to_string()))
}
