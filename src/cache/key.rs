//! Composite cache keys.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::api::Resource;

/// Extra query parameters, e.g. `industry=cbd`.
pub type Filters = BTreeMap<String, String>;

/// Identifies one cached page: the resource plus every query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
  pub resource: Resource,
  pub page: u32,
  pub page_size: u32,
  pub filters: Filters,
}

impl QueryKey {
  pub fn new(resource: Resource, page: u32, page_size: u32) -> Self {
    Self {
      resource,
      page,
      page_size,
      filters: Filters::new(),
    }
  }

  /// Add filters, dropping blank ones and trimming the rest so that
  /// equivalent queries share a key.
  pub fn with_filters(mut self, filters: &Filters) -> Self {
    for (name, value) in filters {
      let (name, value) = (name.trim(), value.trim());
      if !name.is_empty() && !value.is_empty() {
        self.filters.insert(name.to_string(), value.to_string());
      }
    }
    self
  }

  /// Stable, fixed-length key for persistent storage.
  pub fn cache_hash(&self) -> String {
    let filters: Vec<String> = self
      .filters
      .iter()
      .map(|(name, value)| format!("{}={}", name, value))
      .collect();
    let input = format!(
      "{}:{}:{}:{}",
      self.resource.name(),
      self.page,
      self.page_size,
      filters.join("&")
    );

    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }

  pub fn description(&self) -> String {
    let mut description = format!(
      "{} page {} (limit {})",
      self.resource, self.page, self.page_size
    );
    for (name, value) in &self.filters {
      description.push_str(&format!(" {}={}", name, value));
    }
    description
  }
}
