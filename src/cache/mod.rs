//! Query cache building blocks.
//!
//! This module provides the pieces the resource store is assembled from:
//! - Composite query keys (resource + page + page size + filters)
//! - Cache entries with status and last-known-good page
//! - Optional persistence of good pages so a restart can serve stale data

mod entry;
mod key;
mod storage;

pub use entry::{CacheEntry, QueryStatus};
pub use key::{Filters, QueryKey};
pub use storage::{NoopStorage, PageStorage, SqliteStorage, StoredPage};
