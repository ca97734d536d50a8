use chrono::{DateTime, Duration, Utc};

use crate::api::Page;

/// Fetch status of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
  #[default]
  Idle,
  Loading,
  Success,
  Error,
}

/// Last-known-good page for one query key, plus where its fetch stands.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CacheEntry {
  /// Last page that was fetched successfully. Kept through errors.
  pub page: Option<Page>,
  pub status: QueryStatus,
  /// Message of the most recent failed fetch
  pub error: Option<String>,
  pub fetched_at: Option<DateTime<Utc>>,
  /// Set by invalidation; the next access refetches
  pub stale: bool,
}

impl CacheEntry {
  pub fn success(page: Page, fetched_at: DateTime<Utc>) -> Self {
    Self {
      page: Some(page),
      status: QueryStatus::Success,
      error: None,
      fetched_at: Some(fetched_at),
      stale: false,
    }
  }

  /// Whether the page can be served without a network round trip.
  pub fn is_fresh(&self, stale_after: Duration, now: DateTime<Utc>) -> bool {
    if self.stale || self.status != QueryStatus::Success || self.page.is_none() {
      return false;
    }
    self
      .fetched_at
      .is_some_and(|fetched_at| now - fetched_at <= stale_after)
  }
}
