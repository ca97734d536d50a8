//! Page storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::key::QueryKey;
use crate::api::{Page, Resource};

/// A persisted page and when it was written.
#[derive(Debug, Clone)]
pub struct StoredPage {
  pub page: Page,
  pub cached_at: DateTime<Utc>,
}

/// Trait for persistent page storage backends.
pub trait PageStorage: Send + Sync {
  /// Get the persisted page for a query.
  fn load(&self, key: &QueryKey) -> Result<Option<StoredPage>>;

  /// Persist a page for a query, replacing any previous one.
  fn save(&self, key: &QueryKey, page: &Page) -> Result<()>;

  /// Drop every persisted page of a resource.
  fn remove_resource(&self, resource: Resource) -> Result<()>;
}

/// Storage implementation that doesn't persist anything.
/// Used when persistence is disabled - all operations are no-ops.
pub struct NoopStorage;

impl PageStorage for NoopStorage {
  fn load(&self, _key: &QueryKey) -> Result<Option<StoredPage>> {
    Ok(None) // Always miss
  }

  fn save(&self, _key: &QueryKey, _page: &Page) -> Result<()> {
    Ok(()) // Discard
  }

  fn remove_resource(&self, _resource: Resource) -> Result<()> {
    Ok(())
  }
}

/// SQLite-based page storage.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open storage at `path`, or at the default location.
  pub fn open(path: Option<&Path>) -> Result<Self> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// Storage that lives only as long as the process.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("market-admin").join("cache.db"))
  }
}

/// Schema for the page cache.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS page_cache (
    query_hash TEXT PRIMARY KEY,
    resource TEXT NOT NULL,
    query_description TEXT NOT NULL,
    data BLOB NOT NULL,
    item_count INTEGER NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_page_cache_resource ON page_cache(resource);
"#;

impl PageStorage for SqliteStorage {
  fn load(&self, key: &QueryKey) -> Result<Option<StoredPage>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let row: Option<(Vec<u8>, String)> = conn
      .query_row(
        "SELECT data, cached_at FROM page_cache WHERE query_hash = ?",
        params![key.cache_hash()],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()
      .map_err(|e| eyre!("Failed to query page cache: {}", e))?;

    match row {
      Some((data, cached_at)) => {
        let page: Page =
          serde_json::from_slice(&data).map_err(|e| eyre!("Failed to deserialize page: {}", e))?;
        Ok(Some(StoredPage {
          page,
          cached_at: parse_datetime(&cached_at)?,
        }))
      }
      None => Ok(None),
    }
  }

  fn save(&self, key: &QueryKey, page: &Page) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let data = serde_json::to_vec(page).map_err(|e| eyre!("Failed to serialize page: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO page_cache (query_hash, resource, query_description, data, item_count, cached_at)
         VALUES (?, ?, ?, ?, ?, datetime('now'))",
        params![
          key.cache_hash(),
          key.resource.name(),
          key.description(),
          data,
          page.records.len()
        ],
      )
      .map_err(|e| eyre!("Failed to store page: {}", e))?;

    Ok(())
  }

  fn remove_resource(&self, resource: Resource) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "DELETE FROM page_cache WHERE resource = ?",
        params![resource.name()],
      )
      .map_err(|e| eyre!("Failed to clear cached pages: {}", e))?;

    Ok(())
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}
