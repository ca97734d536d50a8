use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Field names tried in order when a record needs a human-readable label.
const LABEL_FIELDS: &[&str] = &[
  "categoryName",
  "subCategoryName",
  "planType",
  "planTitle",
  "planName",
  "emailSubject",
  "fullName",
  "email",
];

/// One domain entity as returned by the backend.
///
/// Identity is the `_id` field; everything else is opaque and kept as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  #[serde(rename = "_id", alias = "id")]
  pub id: String,
  #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
  pub created_at: Option<String>,
  #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
  pub updated_at: Option<String>,
  #[serde(flatten)]
  pub fields: BTreeMap<String, Value>,
}

impl Record {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      created_at: None,
      updated_at: None,
      fields: BTreeMap::new(),
    }
  }

  pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
    self.fields.insert(name.to_string(), value.into());
    self
  }

  pub fn field(&self, name: &str) -> Option<&Value> {
    self.fields.get(name)
  }

  pub fn text(&self, name: &str) -> Option<&str> {
    self.field(name).and_then(Value::as_str)
  }

  /// Best label for list views, falling back to the id.
  pub fn label(&self) -> &str {
    LABEL_FIELDS
      .iter()
      .find_map(|name| self.text(name).filter(|s| !s.is_empty()))
      .unwrap_or(&self.id)
  }
}

/// Pagination metadata attached to a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
  #[serde(default)]
  pub current_page: u32,
  #[serde(default)]
  pub total_pages: u32,
  #[serde(default)]
  pub total_items: u32,
  #[serde(default)]
  pub items_per_page: u32,
}

impl PageMeta {
  /// Repair metadata so that `current_page` lies in `1..=total_pages` whenever
  /// there are items, and `total_pages` is zero exactly when there are none.
  fn normalize(mut self, requested_page: u32, page_size: u32, record_count: u32) -> Self {
    if self.items_per_page == 0 {
      self.items_per_page = page_size;
    }
    if self.current_page == 0 {
      self.current_page = requested_page;
    }
    self.total_items = self.total_items.max(record_count);

    if self.total_items == 0 {
      self.total_pages = 0;
      self.current_page = requested_page.max(1);
      return self;
    }

    if self.total_pages == 0 {
      self.total_pages = self.total_items.div_ceil(self.items_per_page.max(1));
    }
    self.current_page = self.current_page.clamp(1, self.total_pages);
    self
  }
}

/// One fetched slice of a resource collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
  pub records: Vec<Record>,
  pub meta: PageMeta,
}

impl Page {
  /// Build a page from server data, truncating to `page_size` and repairing
  /// the metadata.
  pub fn new(mut records: Vec<Record>, meta: PageMeta, page: u32, page_size: u32) -> Self {
    records.truncate(page_size as usize);
    let meta = meta.normalize(page, page_size, records.len() as u32);
    Self { records, meta }
  }

  /// Slice an unpaginated collection into the requested page.
  pub fn paginate(all: Vec<Record>, page: u32, page_size: u32) -> Self {
    let total_items = all.len() as u32;
    let start = (page.saturating_sub(1) as usize).saturating_mul(page_size as usize);
    let records: Vec<Record> = all
      .into_iter()
      .skip(start)
      .take(page_size as usize)
      .collect();

    let meta = PageMeta {
      current_page: page,
      total_pages: total_items.div_ceil(page_size.max(1)),
      total_items,
      items_per_page: page_size,
    };
    Self::new(records, meta, page, page_size)
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn contains(&self, id: &str) -> bool {
    self.records.iter().any(|r| r.id == id)
  }

  /// Drop the record with `id`, adjusting counts. Returns whether it was present.
  pub fn remove(&mut self, id: &str) -> bool {
    let before = self.records.len();
    self.records.retain(|r| r.id != id);
    if self.records.len() == before {
      return false;
    }

    self.meta.total_items = self.meta.total_items.saturating_sub(1);
    if self.meta.total_items == 0 {
      self.meta.total_pages = 0;
    }
    true
  }
}
