//! Serde-deserializable envelopes matching backend responses.
//!
//! These are kept separate from the domain types so that the store can work
//! with plain [`Record`]s and [`Page`]s.

use serde::Deserialize;
use serde_json::Value;

use super::types::{Page, PageMeta, Record};

fn default_status() -> bool {
  true
}

// ============================================================================
// List endpoints
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiListResponse {
  #[serde(default = "default_status")]
  pub status: bool,
  #[serde(default)]
  pub message: String,
  #[serde(default)]
  pub data: Vec<Record>,
  /// Some endpoints call this `pagination`
  #[serde(default, alias = "pagination")]
  pub meta: Option<PageMeta>,
}

impl ApiListResponse {
  /// Convert into a page. Responses without pagination metadata carry the
  /// whole collection and are sliced client-side.
  pub fn into_page(self, page: u32, page_size: u32) -> Page {
    match self.meta {
      Some(meta) => Page::new(self.data, meta, page, page_size),
      None => Page::paginate(self.data, page, page_size),
    }
  }
}

// ============================================================================
// Write and detail endpoints
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiRecordResponse {
  #[serde(default = "default_status")]
  pub status: bool,
  #[serde(default)]
  pub message: String,
  #[serde(default)]
  pub data: Option<Value>,
}

impl ApiRecordResponse {
  /// The returned record, if `data` holds one.
  pub fn record(&self) -> Option<Record> {
    self
      .data
      .clone()
      .and_then(|data| serde_json::from_value(data).ok())
  }
}

/// Body of a non-2xx response.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
  #[serde(default)]
  pub message: Option<String>,
}

// ============================================================================
// Login endpoint
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiLoginResponse {
  #[serde(default)]
  pub status: bool,
  #[serde(default)]
  pub message: String,
  #[serde(rename = "userData")]
  pub user_data: Option<ApiLoginUser>,
  pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiLoginUser {
  #[serde(default)]
  pub id: String,
  #[serde(default)]
  pub email: String,
  #[serde(rename = "fullName")]
  pub full_name: Option<String>,
  pub industry: Option<String>,
  pub profession: Option<String>,
}
