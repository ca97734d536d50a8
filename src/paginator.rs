//! Bounded page navigation for list views.

use crate::api::PageMeta;

/// Current page within a known page count. Navigation never leaves
/// `1..=total_pages`; an empty collection stays on page 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
  current: u32,
  total_pages: u32,
}

impl Default for Paginator {
  fn default() -> Self {
    Self {
      current: 1,
      total_pages: 0,
    }
  }
}

impl Paginator {
  pub fn new(current: u32, total_pages: u32) -> Self {
    let mut paginator = Self {
      current,
      total_pages,
    };
    paginator.clamp();
    paginator
  }

  pub fn from_meta(meta: &PageMeta) -> Self {
    Self::new(meta.current_page, meta.total_pages)
  }

  fn last(&self) -> u32 {
    self.total_pages.max(1)
  }

  fn clamp(&mut self) {
    self.current = self.current.clamp(1, self.last());
  }

  pub fn current(&self) -> u32 {
    self.current
  }

  pub fn total_pages(&self) -> u32 {
    self.total_pages
  }

  /// Take a fresh page count, e.g. after a refetch or a delete.
  pub fn set_total_pages(&mut self, total_pages: u32) {
    self.total_pages = total_pages;
    self.clamp();
  }

  pub fn has_prev(&self) -> bool {
    self.current > 1
  }

  pub fn has_next(&self) -> bool {
    self.current < self.total_pages
  }

  pub fn next(&mut self) -> bool {
    self.go_to(self.current.saturating_add(1))
  }

  pub fn prev(&mut self) -> bool {
    self.go_to(self.current.saturating_sub(1))
  }

  /// Move to `page` if it exists. Returns whether the page changed.
  pub fn go_to(&mut self, page: u32) -> bool {
    if page < 1 || page > self.last() || page == self.current {
      return false;
    }
    self.current = page;
    true
  }

  /// Every page that can be navigated to.
  pub fn pages(&self) -> std::ops::RangeInclusive<u32> {
    1..=self.last()
  }

  /// "Page 2/3", or "Page 1/1" for an empty collection.
  pub fn label(&self) -> String {
    format!("Page {}/{}", self.current, self.last())
  }
}
