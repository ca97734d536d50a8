//! Cached access to paginated backend resources.
//!
//! [`ResourceStore`] owns the query cache. Reads are cache-first with
//! stale-while-error semantics; creates and updates invalidate the affected
//! resource; deletes are applied optimistically and rolled back verbatim if
//! the backend refuses them.

use chrono::{Duration, Utc};
use color_eyre::Result;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::api::api_types::{ApiErrorBody, ApiListResponse, ApiRecordResponse};
use crate::api::{ApiRequest, ApiResponse, Page, Record, Resource, TokenProvider, Transport};
use crate::cache::{
  CacheEntry, Filters, NoopStorage, PageStorage, QueryKey, QueryStatus, SqliteStorage,
};
use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::forms::{FormMode, RecordForm};

#[cfg(test)]
mod tests;

/// Cache entries of one resource, as captured before an optimistic change.
pub type CacheSnapshot = BTreeMap<QueryKey, CacheEntry>;

/// An optimistic delete waiting for the backend's answer.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMutation {
  pub id: u64,
  pub resource: Resource,
  pub target: String,
  /// Everything cached for the resource before the record was removed
  pub snapshot: CacheSnapshot,
}

#[derive(Debug, Clone)]
pub struct StoreOptions {
  /// How long a fetched page is served without refetching
  pub stale_after: Duration,
  /// Refetch cached pages after a delete settles
  pub background_refetch: bool,
}

impl Default for StoreOptions {
  fn default() -> Self {
    Self {
      stale_after: Duration::minutes(5),
      background_refetch: true,
    }
  }
}

#[derive(Default)]
struct StoreState {
  entries: BTreeMap<QueryKey, CacheEntry>,
  pending: HashMap<Resource, PendingMutation>,
  next_mutation_id: u64,
  /// Bumped whenever a delete rewrites a resource's cached pages. A fetch
  /// that started under an older generation must not write its page.
  generations: HashMap<Resource, u64>,
}

impl StoreState {
  fn resource_entries_mut(
    &mut self,
    resource: Resource,
  ) -> impl Iterator<Item = (&QueryKey, &mut CacheEntry)> {
    self
      .entries
      .iter_mut()
      .filter(move |(key, _)| key.resource == resource)
  }

  fn snapshot(&self, resource: Resource) -> CacheSnapshot {
    self
      .entries
      .iter()
      .filter(|(key, _)| key.resource == resource)
      .map(|(key, entry)| (key.clone(), entry.clone()))
      .collect()
  }

  fn generation(&self, resource: Resource) -> u64 {
    self.generations.get(&resource).copied().unwrap_or(0)
  }

  /// Replace everything cached for `resource` with `snapshot`.
  fn restore(&mut self, resource: Resource, snapshot: CacheSnapshot) {
    self.entries.retain(|key, _| key.resource != resource);
    self.entries.extend(snapshot);
  }
}

struct Inner {
  transport: Arc<dyn Transport>,
  tokens: Arc<dyn TokenProvider>,
  storage: Box<dyn PageStorage>,
  options: StoreOptions,
  state: Mutex<StoreState>,
  /// Serializes optimistic mutations per resource
  mutation_locks: Mutex<HashMap<Resource, Arc<tokio::sync::Mutex<()>>>>,
}

/// Shared, cloneable handle to the resource cache.
#[derive(Clone)]
pub struct ResourceStore {
  inner: Arc<Inner>,
}

impl ResourceStore {
  pub fn new(
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenProvider>,
    storage: Box<dyn PageStorage>,
    options: StoreOptions,
  ) -> Self {
    Self {
      inner: Arc::new(Inner {
        transport,
        tokens,
        storage,
        options,
        state: Mutex::new(StoreState::default()),
        mutation_locks: Mutex::new(HashMap::new()),
      }),
    }
  }

  /// Build a store for the configured backend.
  ///
  /// A cache database that cannot be opened only disables persistence.
  pub fn from_config(
    config: &Config,
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenProvider>,
  ) -> Self {
    let storage: Box<dyn PageStorage> = if config.cache.persist {
      match SqliteStorage::open(config.cache.path.as_deref()) {
        Ok(storage) => Box::new(storage),
        Err(e) => {
          warn!(error = %e, "page persistence disabled");
          Box::new(NoopStorage)
        }
      }
    } else {
      Box::new(NoopStorage)
    };

    let options = StoreOptions {
      stale_after: Duration::seconds(config.cache.stale_after_secs),
      background_refetch: config.cache.background_refetch,
    };

    Self::new(transport, tokens, storage, options)
  }

  pub fn transport(&self) -> &dyn Transport {
    self.inner.transport.as_ref()
  }

  fn state(&self) -> MutexGuard<'_, StoreState> {
    self
      .inner
      .state
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn mutation_lock(&self, resource: Resource) -> Arc<tokio::sync::Mutex<()>> {
    let mut locks = self
      .inner
      .mutation_locks
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    locks.entry(resource).or_default().clone()
  }

  fn require_token(&self, resource: Resource) -> StoreResult<String> {
    self.inner.tokens.token().ok_or_else(|| {
      StoreError::Auth(format!("You must be logged in to modify {}", resource))
    })
  }

  async fn send(&self, request: ApiRequest) -> StoreResult<ApiResponse> {
    Ok(self.inner.transport.send(request).await?)
  }

  // ==========================================================================
  // Reads
  // ==========================================================================

  /// Fetch one page of a resource, serving a fresh cache entry if there is one.
  ///
  /// On failure the previous entry keeps its page (loaded from persistent
  /// storage if memory had none) and only its status changes to error.
  pub async fn fetch_page(
    &self,
    resource: Resource,
    page: u32,
    page_size: u32,
    filters: &Filters,
  ) -> StoreResult<Page> {
    if page == 0 {
      return Err(StoreError::validation("Page must be at least 1"));
    }
    if page_size == 0 {
      return Err(StoreError::validation("Page size must be at least 1"));
    }

    let key = QueryKey::new(resource, page, page_size).with_filters(filters);
    self.fetch_key(key).await
  }

  async fn fetch_key(&self, key: QueryKey) -> StoreResult<Page> {
    let resource = key.resource;
    let bearer = self.inner.tokens.token();
    if resource.info().read_requires_auth && bearer.is_none() {
      return Err(StoreError::Auth(format!(
        "You must be logged in to view {}",
        resource
      )));
    }

    let generation = {
      let mut state = self.state();
      let generation = state.generation(resource);
      let entry = state.entries.entry(key.clone()).or_default();
      if entry.is_fresh(self.inner.options.stale_after, Utc::now()) {
        if let Some(page) = &entry.page {
          debug!(query = %key.description(), "cache hit");
          return Ok(page.clone());
        }
      }
      entry.status = QueryStatus::Loading;
      generation
    };

    let mut request = ApiRequest::get(resource.list_path())
      .with_query("page", key.page)
      .with_query("limit", key.page_size)
      .with_bearer(bearer);
    for (name, value) in &key.filters {
      request = request.with_query(name, value);
    }

    let result = match self.send(request).await {
      Ok(response) => decode_page(response, key.page, key.page_size),
      Err(e) => Err(e),
    };

    match result {
      Ok(page) => {
        debug!(query = %key.description(), items = page.records.len(), "fetched page");
        let (page, written) = self.store_fetched(&key, generation, page);
        if written {
          if let Err(e) = self.inner.storage.save(&key, &page) {
            warn!(error = %e, "failed to persist page");
          }
        }
        Ok(page)
      }
      Err(err) => {
        warn!(query = %key.description(), status = ?err.status(), error = %err, "fetch failed");
        let stored = match self.inner.storage.load(&key) {
          Ok(stored) => stored,
          Err(e) => {
            warn!(error = %e, "failed to load persisted page");
            None
          }
        };

        let mut state = self.state();
        let entry = state.entries.entry(key).or_default();
        if entry.page.is_none() {
          if let Some(stored) = stored {
            entry.page = Some(stored.page);
            entry.fetched_at = Some(stored.cached_at);
          }
        }
        entry.status = QueryStatus::Error;
        entry.error = Some(err.to_string());
        Err(err)
      }
    }
  }

  /// Write a fetched page into the cache, unless a delete rewrote the
  /// resource after the fetch started. Returns the page callers should see
  /// and whether it was written.
  ///
  /// A page fetched while a delete is pending has the pending record taken
  /// out, so the optimistic removal survives the write. A discarded page
  /// yields the cached one instead, when there is one.
  fn store_fetched(&self, key: &QueryKey, generation: u64, mut page: Page) -> (Page, bool) {
    let mut state = self.state();
    if state.generation(key.resource) != generation {
      debug!(query = %key.description(), "discarding page fetched before a delete");
      let Some(entry) = state.entries.get_mut(key) else {
        return (page, false);
      };
      entry.stale = true;
      entry.status = if entry.page.is_some() {
        QueryStatus::Success
      } else {
        QueryStatus::Idle
      };
      return (entry.page.clone().unwrap_or(page), false);
    }

    if let Some(pending) = state.pending.get(&key.resource) {
      page.remove(&pending.target);
    }
    state
      .entries
      .insert(key.clone(), CacheEntry::success(page.clone(), Utc::now()));
    (page, true)
  }

  /// Fetch a single record. Not cached.
  pub async fn fetch_record(&self, resource: Resource, id: &str) -> StoreResult<Record> {
    check_record_id(id)?;

    let request = ApiRequest::get(resource.record_path(id)).with_bearer(self.inner.tokens.token());
    let response = self.send(request).await?;
    let status = response.status;
    decode_record(response, None)?.ok_or_else(|| StoreError::Server {
      status,
      message: format!("No {} record returned for {}", resource, id),
    })
  }

  // ==========================================================================
  // Mutations
  // ==========================================================================

  /// Create a record and invalidate every cached page of its resource.
  pub async fn create_record(&self, resource: Resource, form: RecordForm) -> StoreResult<Record> {
    check_form_resource(resource, &form)?;
    let path = resource.create_path().ok_or_else(|| {
      StoreError::validation(format!("{} records cannot be created", resource))
    })?;
    form.validate(FormMode::Create)?;
    let token = self.require_token(resource)?;

    let body = form.to_body();
    let response = self
      .send(ApiRequest::post(path, body.clone()).with_bearer(Some(token)))
      .await?;
    let record = decode_record(response, None)?.unwrap_or_else(|| record_from_body("", &body));

    info!(%resource, id = %record.id, "created record");
    self.invalidate_resource(resource);
    Ok(record)
  }

  /// Update a record and invalidate every cached page of its resource.
  pub async fn update_record(
    &self,
    resource: Resource,
    id: &str,
    form: RecordForm,
  ) -> StoreResult<Record> {
    check_record_id(id)?;
    check_form_resource(resource, &form)?;
    form.validate(FormMode::Update)?;
    let token = self.require_token(resource)?;

    let body = form.to_body();
    let response = self
      .send(ApiRequest::put(resource.update_path(id), body.clone()).with_bearer(Some(token)))
      .await?;
    let record = decode_record(response, Some(id))?.unwrap_or_else(|| record_from_body(id, &body));

    info!(%resource, %id, "updated record");
    self.invalidate_resource(resource);
    Ok(record)
  }

  /// Delete a record, removing it from the cache before the backend answers.
  ///
  /// Deletes on the same resource run one at a time. If the backend refuses,
  /// everything cached for the resource is put back exactly as it was.
  pub async fn delete_record(&self, resource: Resource, id: &str) -> StoreResult<()> {
    check_record_id(id)?;
    let token = self.require_token(resource)?;

    let lock = self.mutation_lock(resource);
    let _guard = lock.lock().await;

    let pending = {
      let mut state = self.state();
      let snapshot = state.snapshot(resource);
      *state.generations.entry(resource).or_default() += 1;

      let mut removed = 0;
      for (_, entry) in state.resource_entries_mut(resource) {
        if let Some(page) = entry.page.as_mut() {
          if page.remove(id) {
            removed += 1;
          }
        }
      }

      state.next_mutation_id += 1;
      let mutation_id = state.next_mutation_id;
      state.pending.insert(
        resource,
        PendingMutation {
          id: mutation_id,
          resource,
          target: id.to_string(),
          snapshot,
        },
      );
      debug!(%resource, %id, pages = removed, "optimistically removed record");
      PendingGuard {
        store: self,
        resource,
        mutation_id,
        settled: false,
      }
    };

    let result = match self
      .send(ApiRequest::delete(resource.delete_path(id)).with_bearer(Some(token)))
      .await
    {
      Ok(response) => check_envelope(&response),
      Err(e) => Err(e),
    };

    if let Err(err) = result {
      warn!(%resource, %id, error = %err, "delete failed, rolling back");
      pending.rollback();
      return Err(err);
    }
    pending.commit();

    info!(%resource, %id, "deleted record");
    self.persist_resource(resource);
    self.reconcile(resource);
    Ok(())
  }

  /// Save the current pages of a resource to persistent storage.
  fn persist_resource(&self, resource: Resource) {
    let pages: Vec<(QueryKey, Page)> = self
      .state()
      .entries
      .iter()
      .filter(|(key, _)| key.resource == resource)
      .filter_map(|(key, entry)| entry.page.clone().map(|page| (key.clone(), page)))
      .collect();

    for (key, page) in pages {
      if let Err(e) = self.inner.storage.save(&key, &page) {
        warn!(error = %e, "failed to persist page");
      }
    }
  }

  /// Invalidate a resource after a delete and, if enabled, refetch its
  /// cached pages in the background so counts catch up with the backend.
  fn reconcile(&self, resource: Resource) {
    let keys = self.invalidate_resource(resource);
    if !self.inner.options.background_refetch || keys.is_empty() {
      return;
    }

    let store = self.clone();
    tokio::spawn(async move {
      for key in keys {
        if let Err(e) = store.fetch_key(key).await {
          debug!(error = %e, "background refetch failed");
        }
      }
    });
  }

  // ==========================================================================
  // Invalidation and snapshots
  // ==========================================================================

  /// Mark one query stale so the next access refetches it.
  pub fn invalidate(&self, key: &QueryKey) {
    if let Some(entry) = self.state().entries.get_mut(key) {
      entry.stale = true;
    }
  }

  /// Mark every cached query of a resource stale. Returns the affected keys.
  pub fn invalidate_resource(&self, resource: Resource) -> Vec<QueryKey> {
    let mut state = self.state();
    let mut keys = Vec::new();
    for (key, entry) in state.resource_entries_mut(resource) {
      entry.stale = true;
      keys.push(key.clone());
    }
    debug!(%resource, queries = keys.len(), "invalidated");
    keys
  }

  /// Drop everything cached for a resource, in memory and on disk.
  pub fn clear_resource(&self, resource: Resource) -> Result<()> {
    self
      .state()
      .entries
      .retain(|key, _| key.resource != resource);
    self.inner.storage.remove_resource(resource)
  }

  pub fn cache_entry(&self, key: &QueryKey) -> Option<CacheEntry> {
    self.state().entries.get(key).cloned()
  }

  /// Last good page for a query, even if its latest fetch failed.
  pub fn cached_page(&self, key: &QueryKey) -> Option<Page> {
    self
      .state()
      .entries
      .get(key)
      .and_then(|entry| entry.page.clone())
  }

  pub fn snapshot(&self, resource: Resource) -> CacheSnapshot {
    self.state().snapshot(resource)
  }

  pub fn pending_mutation(&self, resource: Resource) -> Option<PendingMutation> {
    self.state().pending.get(&resource).cloned()
  }
}

/// Holds an optimistic delete open. Dropping it without [`commit`] puts the
/// snapshot back, so an abandoned `delete_record` leaves the cache as it was.
///
/// [`commit`]: PendingGuard::commit
struct PendingGuard<'a> {
  store: &'a ResourceStore,
  resource: Resource,
  mutation_id: u64,
  settled: bool,
}

impl PendingGuard<'_> {
  fn settle(&mut self, restore: bool) {
    self.settled = true;
    let mut state = self.store.state();
    let ours = state
      .pending
      .get(&self.resource)
      .is_some_and(|p| p.id == self.mutation_id);
    if !ours {
      return;
    }
    if let Some(pending) = state.pending.remove(&self.resource) {
      if restore {
        state.restore(self.resource, pending.snapshot);
      }
    }
  }

  fn commit(mut self) {
    self.settle(false);
  }

  fn rollback(mut self) {
    self.settle(true);
  }
}

impl Drop for PendingGuard<'_> {
  fn drop(&mut self) {
    if !self.settled {
      debug!(resource = %self.resource, "delete abandoned, restoring cache");
      self.settle(true);
    }
  }
}

/// Ids are percent-encoded into the path, but dot segments would still be
/// resolved against the endpoint, so they are refused outright.
fn check_record_id(id: &str) -> StoreResult<()> {
  match id.trim() {
    "" => Err(StoreError::validation("Record id is required")),
    "." | ".." => Err(StoreError::validation(format!("Invalid record id '{}'", id))),
    _ => Ok(()),
  }
}

fn check_form_resource(resource: Resource, form: &RecordForm) -> StoreResult<()> {
  if form.resource() != resource {
    return Err(StoreError::validation(format!(
      "{} form cannot be used for {}",
      form.name(),
      resource
    )));
  }
  Ok(())
}

// ============================================================================
// Response decoding
// ============================================================================

/// Message for a failed response: the body's `message` verbatim if present.
fn error_message(response: &ApiResponse) -> String {
  let message = match &response.body {
    Value::String(text) => Some(text.clone()),
    body => serde_json::from_value::<ApiErrorBody>(body.clone())
      .ok()
      .and_then(|b| b.message),
  };

  message
    .filter(|m| !m.trim().is_empty())
    .unwrap_or_else(|| format!("Request failed with status {}", response.status))
}

fn server_error(response: &ApiResponse) -> StoreError {
  StoreError::Server {
    status: response.status,
    message: error_message(response),
  }
}

fn malformed(response: &ApiResponse, err: serde_json::Error) -> StoreError {
  StoreError::Server {
    status: response.status,
    message: format!("Malformed response: {}", err),
  }
}

/// Fail on non-2xx statuses and on envelopes with `status: false`.
fn check_envelope(response: &ApiResponse) -> StoreResult<()> {
  if !response.is_success() {
    return Err(server_error(response));
  }
  if response.body.get("status").and_then(Value::as_bool) == Some(false) {
    return Err(server_error(response));
  }
  Ok(())
}

fn decode_page(response: ApiResponse, page: u32, page_size: u32) -> StoreResult<Page> {
  check_envelope(&response)?;
  let parsed: ApiListResponse =
    serde_json::from_value(response.body.clone()).map_err(|e| malformed(&response, e))?;
  Ok(parsed.into_page(page, page_size))
}

/// Decode a write or detail response. `Ok(None)` when the backend confirmed
/// without returning a record.
fn decode_record(response: ApiResponse, id: Option<&str>) -> StoreResult<Option<Record>> {
  check_envelope(&response)?;
  if response.body.is_null() {
    return Ok(None);
  }

  let parsed: ApiRecordResponse =
    serde_json::from_value(response.body.clone()).map_err(|e| malformed(&response, e))?;
  let record = parsed.record().map(|mut record| {
    if record.id.is_empty() {
      if let Some(id) = id {
        record.id = id.to_string();
      }
    }
    record
  });
  Ok(record)
}

/// Stand-in record built from the submitted body.
fn record_from_body(id: &str, body: &Value) -> Record {
  let mut record = Record::new(id);
  if let Value::Object(fields) = body {
    record
      .fields
      .extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
  }
  record
}
