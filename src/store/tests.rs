use super::*;
use crate::api::mock::MockTransport;
use crate::api::transport::Method;
use crate::api::{PageMeta, StaticToken};
use crate::cache::SqliteStorage;
use crate::error::ErrorKind;
use crate::forms::{CategoryForm, Industry, NewsletterForm, SubcategoryForm};
use crate::paginator::Paginator;
use serde_json::json;

fn options() -> StoreOptions {
  StoreOptions {
    stale_after: Duration::minutes(5),
    background_refetch: false,
  }
}

fn store(mock: &Arc<MockTransport>, token: Option<&str>) -> ResourceStore {
  ResourceStore::new(
    mock.clone(),
    Arc::new(StaticToken(token.map(String::from))),
    Box::new(NoopStorage),
    options(),
  )
}

fn list_body(ids: &[&str], page: u32, total_pages: u32, total_items: u32) -> Value {
  let data: Vec<Value> = ids
    .iter()
    .map(|id| json!({ "_id": id, "subCategoryName": format!("Sub {}", id) }))
    .collect();
  json!({
    "status": true,
    "message": "Fetched",
    "data": data,
    "meta": {
      "currentPage": page,
      "totalPages": total_pages,
      "totalItems": total_items,
      "itemsPerPage": 8
    }
  })
}

fn key(resource: Resource, page: u32) -> QueryKey {
  QueryKey::new(resource, page, 8)
}

async fn wait_for_pending(store: &ResourceStore, resource: Resource) {
  while store.pending_mutation(resource).is_none() {
    tokio::task::yield_now().await;
  }
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_page_never_exceeds_page_size() {
  let mock = MockTransport::new();
  let ids: Vec<String> = (0..12).map(|i| format!("r{}", i)).collect();
  let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
  mock.reply(Method::Get, "categories", 200, list_body(&ids, 1, 2, 12));

  let page = store(&mock, None)
    .fetch_page(Resource::Categories, 1, 8, &Filters::new())
    .await
    .unwrap();

  assert_eq!(page.records.len(), 8);
  assert_eq!(page.meta.total_items, 12);
}

#[tokio::test]
async fn test_unpaginated_response_sliced_locally() {
  let mock = MockTransport::new();
  let data: Vec<Value> = (0..12).map(|i| json!({ "_id": format!("m{}", i) })).collect();
  mock.reply(
    Method::Get,
    "memberships",
    200,
    json!({ "status": true, "data": data }),
  );

  let page = store(&mock, None)
    .fetch_page(Resource::Memberships, 2, 8, &Filters::new())
    .await
    .unwrap();

  assert_eq!(page.records.len(), 4);
  assert_eq!(page.records[0].id, "m8");
  assert_eq!(page.meta.current_page, 2);
  assert_eq!(page.meta.total_pages, 2);
}

#[tokio::test]
async fn test_request_carries_page_limit_and_filters() {
  let mock = MockTransport::new();
  mock.reply(Method::Get, "categories", 200, list_body(&["a"], 1, 1, 1));

  let filters: Filters = [("industry".to_string(), "cbd".to_string())].into();
  store(&mock, Some("tok"))
    .fetch_page(Resource::Categories, 1, 8, &filters)
    .await
    .unwrap();

  let request = &mock.requests()[0];
  assert_eq!(
    request.query,
    vec![
      ("page".to_string(), "1".to_string()),
      ("limit".to_string(), "8".to_string()),
      ("industry".to_string(), "cbd".to_string()),
    ]
  );
  assert_eq!(request.bearer.as_deref(), Some("tok"));
}

#[tokio::test]
async fn test_zero_page_rejected() {
  let mock = MockTransport::new();
  let err = store(&mock, None)
    .fetch_page(Resource::Categories, 0, 8, &Filters::new())
    .await
    .unwrap_err();
  assert_eq!(err, StoreError::validation("Page must be at least 1"));
  assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_fresh_cache_served_without_request() {
  let mock = MockTransport::new();
  mock.reply(Method::Get, "categories", 200, list_body(&["a"], 1, 1, 1));
  let store = store(&mock, None);

  let first = store
    .fetch_page(Resource::Categories, 1, 8, &Filters::new())
    .await
    .unwrap();
  let second = store
    .fetch_page(Resource::Categories, 1, 8, &Filters::new())
    .await
    .unwrap();

  assert_eq!(first, second);
  assert_eq!(mock.count(Method::Get, "categories"), 1);
}

#[tokio::test]
async fn test_double_invalidation_refetches_once() {
  let mock = MockTransport::new();
  mock.reply(Method::Get, "categories", 200, list_body(&["a"], 1, 1, 1));
  mock.reply(Method::Get, "categories", 200, list_body(&["a", "b"], 1, 1, 2));
  let store = store(&mock, None);

  store
    .fetch_page(Resource::Categories, 1, 8, &Filters::new())
    .await
    .unwrap();
  store.invalidate(&key(Resource::Categories, 1));
  store.invalidate(&key(Resource::Categories, 1));

  for _ in 0..2 {
    let page = store
      .fetch_page(Resource::Categories, 1, 8, &Filters::new())
      .await
      .unwrap();
    assert_eq!(page.records.len(), 2);
  }
  assert_eq!(mock.count(Method::Get, "categories"), 2);
}

#[tokio::test]
async fn test_failed_refetch_keeps_last_good_page() {
  let mock = MockTransport::new();
  mock.reply(Method::Get, "categories", 200, list_body(&["a", "b"], 1, 1, 2));
  mock.fail(Method::Get, "categories", "connection refused");
  let store = store(&mock, None);

  let good = store
    .fetch_page(Resource::Categories, 1, 8, &Filters::new())
    .await
    .unwrap();
  store.invalidate_resource(Resource::Categories);

  let err = store
    .fetch_page(Resource::Categories, 1, 8, &Filters::new())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NetworkFailure);

  let entry = store.cache_entry(&key(Resource::Categories, 1)).unwrap();
  assert_eq!(entry.status, QueryStatus::Error);
  assert_eq!(entry.page, Some(good));
  assert_eq!(entry.error.as_deref(), Some("network error: connection refused"));
}

#[tokio::test]
async fn test_persisted_page_seeds_failed_fetch() {
  let mock = MockTransport::new();
  mock.reply(Method::Get, "newsletter", 503, json!({ "message": "Maintenance" }));

  let stored = Page::new(vec![Record::new("n1")], PageMeta::default(), 1, 8);
  let storage = SqliteStorage::open_in_memory().unwrap();
  storage.save(&key(Resource::Newsletter, 1), &stored).unwrap();

  let store = ResourceStore::new(
    mock.clone(),
    Arc::new(StaticToken(None)),
    Box::new(storage),
    options(),
  );

  let err = store
    .fetch_page(Resource::Newsletter, 1, 8, &Filters::new())
    .await
    .unwrap_err();
  assert_eq!(err.to_string(), "Maintenance");
  assert_eq!(store.cached_page(&key(Resource::Newsletter, 1)), Some(stored));
}

#[tokio::test]
async fn test_auth_required_read_without_token() {
  let mock = MockTransport::new();
  let err = store(&mock, None)
    .fetch_page(Resource::SponsoredListings, 1, 8, &Filters::new())
    .await
    .unwrap_err();

  assert_eq!(err.kind(), ErrorKind::Auth);
  assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_failed_envelope_is_server_error() {
  let mock = MockTransport::new();
  mock.reply(
    Method::Get,
    "categories",
    200,
    json!({ "status": false, "message": "Something went wrong" }),
  );

  let err = store(&mock, None)
    .fetch_page(Resource::Categories, 1, 8, &Filters::new())
    .await
    .unwrap_err();
  assert_eq!(
    err,
    StoreError::Server {
      status: 200,
      message: "Something went wrong".into()
    }
  );
}

#[tokio::test]
async fn test_newsletter_pagination_bounded_to_three_pages() {
  let mock = MockTransport::new();
  mock.reply(
    Method::Get,
    "newsletter",
    200,
    list_body(&["a", "b", "c", "d", "e", "f", "g", "h"], 1, 3, 20),
  );

  let page = store(&mock, None)
    .fetch_page(Resource::Newsletter, 1, 8, &Filters::new())
    .await
    .unwrap();
  assert_eq!(page.meta.total_pages, 3);

  let mut paginator = Paginator::from_meta(&page.meta);
  assert_eq!(paginator.pages().collect::<Vec<_>>(), vec![1, 2, 3]);
  assert!(paginator.go_to(3));
  assert!(!paginator.next());
  assert!(!paginator.go_to(4));
  assert_eq!(paginator.current(), 3);
}

#[tokio::test]
async fn test_fetch_record_uses_detail_path() {
  let mock = MockTransport::new();
  mock.reply(
    Method::Get,
    "membership/details/r1",
    200,
    json!({ "status": true, "data": { "_id": "r1", "status": "pending" } }),
  );

  let record = store(&mock, Some("tok"))
    .fetch_record(Resource::MembershipRequests, "r1")
    .await
    .unwrap();
  assert_eq!(record.id, "r1");
  assert_eq!(record.text("status"), Some("pending"));
}

// ============================================================================
// Create and update
// ============================================================================

#[tokio::test]
async fn test_empty_category_name_rejected_without_request() {
  let mock = MockTransport::new();
  let form = RecordForm::Category(CategoryForm {
    category_name: String::new(),
    short_description: String::new(),
    industry: Some(Industry::Cbd),
  });

  let err = store(&mock, Some("tok"))
    .create_record(Resource::Categories, form)
    .await
    .unwrap_err();

  assert_eq!(err, StoreError::validation("Category name is required"));
  assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_form_for_other_resource_rejected() {
  let mock = MockTransport::new();
  let form = RecordForm::Newsletter(NewsletterForm {
    email: "a@b.co".into(),
  });

  let err = store(&mock, Some("tok"))
    .create_record(Resource::Subcategories, form)
    .await
    .unwrap_err();
  assert_eq!(
    err.to_string(),
    "newsletter form cannot be used for subcategories"
  );
}

#[tokio::test]
async fn test_create_without_token_is_auth_error() {
  let mock = MockTransport::new();
  let form = RecordForm::Newsletter(NewsletterForm {
    email: "a@b.co".into(),
  });

  let err = store(&mock, None)
    .create_record(Resource::Newsletter, form)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Auth);
  assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_create_invalidates_resource() {
  let mock = MockTransport::new();
  mock.reply(Method::Get, "subcategories", 200, list_body(&["a"], 1, 1, 1));
  mock.reply(
    Method::Post,
    "subcategories",
    201,
    json!({ "status": true, "data": { "_id": "new1", "subCategoryName": "Seeds" } }),
  );
  mock.reply(Method::Get, "subcategories", 200, list_body(&["a", "new1"], 1, 1, 2));
  let store = store(&mock, Some("tok"));

  store
    .fetch_page(Resource::Subcategories, 1, 8, &Filters::new())
    .await
    .unwrap();

  let form = RecordForm::Subcategory(SubcategoryForm {
    sub_category_name: "Seeds".into(),
    short_description: String::new(),
    category_id: "cat1".into(),
    industry: None,
  });
  let record = store
    .create_record(Resource::Subcategories, form)
    .await
    .unwrap();
  assert_eq!(record.id, "new1");
  assert!(store.cache_entry(&key(Resource::Subcategories, 1)).unwrap().stale);

  let page = store
    .fetch_page(Resource::Subcategories, 1, 8, &Filters::new())
    .await
    .unwrap();
  assert!(page.contains("new1"));
  assert_eq!(mock.count(Method::Get, "subcategories"), 2);
}

#[tokio::test]
async fn test_update_without_returned_record_uses_body() {
  let mock = MockTransport::new();
  mock.reply(
    Method::Put,
    "newsletter/n1",
    200,
    json!({ "status": true, "message": "Updated" }),
  );

  let form = RecordForm::Newsletter(NewsletterForm {
    email: "new@example.com".into(),
  });
  let record = store(&mock, Some("tok"))
    .update_record(Resource::Newsletter, "n1", form)
    .await
    .unwrap();

  assert_eq!(record.id, "n1");
  assert_eq!(record.text("email"), Some("new@example.com"));
}

#[tokio::test]
async fn test_update_server_message_verbatim() {
  let mock = MockTransport::new();
  mock.reply(
    Method::Put,
    "admin/sponsoredlisting/edit/s1",
    409,
    json!({ "message": "Plan title already exists" }),
  );

  let form = RecordForm::from_json(
    Resource::SponsoredListings,
    json!({ "planTitle": "Gold", "description": "Top", "price": 10.0, "numberOfListing": 3 }),
  )
  .unwrap();
  let err = store(&mock, Some("tok"))
    .update_record(Resource::SponsoredListings, "s1", form)
    .await
    .unwrap_err();

  assert_eq!(err.to_string(), "Plan title already exists");
  assert_eq!(err.status(), Some(409));
}

#[tokio::test]
async fn test_update_requires_id() {
  let mock = MockTransport::new();
  let form = RecordForm::Newsletter(NewsletterForm {
    email: "a@b.co".into(),
  });
  let err = store(&mock, Some("tok"))
    .update_record(Resource::Newsletter, " ", form)
    .await
    .unwrap_err();
  assert_eq!(err, StoreError::validation("Record id is required"));
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_removes_then_restores_on_server_error() {
  let mock = MockTransport::new();
  mock.reply(
    Method::Get,
    "subcategories",
    200,
    list_body(&["abc123", "def456"], 1, 1, 2),
  );
  let release = mock.defer(Method::Delete, "subcategories/abc123");
  let store = store(&mock, Some("tok"));

  store
    .fetch_page(Resource::Subcategories, 1, 8, &Filters::new())
    .await
    .unwrap();
  let before = store.snapshot(Resource::Subcategories);

  let task = {
    let store = store.clone();
    tokio::spawn(async move { store.delete_record(Resource::Subcategories, "abc123").await })
  };
  wait_for_pending(&store, Resource::Subcategories).await;

  let optimistic = store.cached_page(&key(Resource::Subcategories, 1)).unwrap();
  assert!(!optimistic.contains("abc123"));
  assert_eq!(optimistic.meta.total_items, 1);
  let pending = store.pending_mutation(Resource::Subcategories).unwrap();
  assert_eq!(pending.target, "abc123");
  assert_eq!(pending.snapshot, before);

  release.send(Ok(ApiResponse::new(500, json!({})))).unwrap();
  let err = task.await.unwrap().unwrap_err();

  assert_eq!(err.kind(), ErrorKind::ServerError);
  assert_eq!(err.to_string(), "Request failed with status 500");
  assert!(store
    .cached_page(&key(Resource::Subcategories, 1))
    .unwrap()
    .contains("abc123"));
  assert!(store.pending_mutation(Resource::Subcategories).is_none());
}

#[tokio::test]
async fn test_fetch_in_flight_across_delete_does_not_bring_record_back() {
  let mock = MockTransport::new();
  let page = list_body(&["abc123", "def456"], 1, 1, 2);
  mock.reply(Method::Get, "subcategories", 200, page.clone());
  let release_get = mock.defer(Method::Get, "subcategories");
  let release_delete = mock.defer(Method::Delete, "subcategories/abc123");
  let store = store(&mock, Some("tok"));
  let key = key(Resource::Subcategories, 1);

  store
    .fetch_page(Resource::Subcategories, 1, 8, &Filters::new())
    .await
    .unwrap();
  store.invalidate(&key);

  let fetch = {
    let store = store.clone();
    tokio::spawn(async move {
      store
        .fetch_page(Resource::Subcategories, 1, 8, &Filters::new())
        .await
    })
  };
  while mock.count(Method::Get, "subcategories") < 2 {
    tokio::task::yield_now().await;
  }

  let delete = {
    let store = store.clone();
    tokio::spawn(async move { store.delete_record(Resource::Subcategories, "abc123").await })
  };
  wait_for_pending(&store, Resource::Subcategories).await;

  release_get.send(Ok(ApiResponse::new(200, page))).unwrap();
  let fetched = fetch.await.unwrap().unwrap();
  assert!(!fetched.contains("abc123"));
  assert!(!store.cached_page(&key).unwrap().contains("abc123"));

  release_delete
    .send(Ok(ApiResponse::new(200, json!({ "status": true }))))
    .unwrap();
  delete.await.unwrap().unwrap();

  let entry = store.cache_entry(&key).unwrap();
  assert!(!entry.page.unwrap().contains("abc123"));
  assert!(entry.stale);
}

#[tokio::test]
async fn test_fetch_during_pending_delete_keeps_removal() {
  let mock = MockTransport::new();
  let page = list_body(&["abc123", "def456"], 1, 1, 2);
  mock.reply(Method::Get, "subcategories", 200, page.clone());
  mock.reply(Method::Get, "subcategories", 200, page);
  let release = mock.defer(Method::Delete, "subcategories/abc123");
  let store = store(&mock, Some("tok"));
  let key = key(Resource::Subcategories, 1);

  store
    .fetch_page(Resource::Subcategories, 1, 8, &Filters::new())
    .await
    .unwrap();

  let delete = {
    let store = store.clone();
    tokio::spawn(async move { store.delete_record(Resource::Subcategories, "abc123").await })
  };
  wait_for_pending(&store, Resource::Subcategories).await;

  store.invalidate(&key);
  let fetched = store
    .fetch_page(Resource::Subcategories, 1, 8, &Filters::new())
    .await
    .unwrap();
  assert!(!fetched.contains("abc123"));
  assert_eq!(fetched.meta.total_items, 1);
  assert!(!store.cached_page(&key).unwrap().contains("abc123"));

  release.send(Ok(ApiResponse::new(500, json!({})))).unwrap();
  delete.await.unwrap().unwrap_err();
  assert!(store.cached_page(&key).unwrap().contains("abc123"));
}

#[tokio::test]
async fn test_abandoned_delete_restores_cache() {
  let mock = MockTransport::new();
  mock.reply(
    Method::Get,
    "subcategories",
    200,
    list_body(&["abc123", "def456"], 1, 1, 2),
  );
  let _release = mock.defer(Method::Delete, "subcategories/abc123");
  mock.reply(Method::Delete, "subcategories/def456", 200, json!({ "status": true }));
  let store = store(&mock, Some("tok"));

  store
    .fetch_page(Resource::Subcategories, 1, 8, &Filters::new())
    .await
    .unwrap();
  let before = store.snapshot(Resource::Subcategories);

  let outcome = tokio::time::timeout(
    std::time::Duration::from_millis(20),
    store.delete_record(Resource::Subcategories, "abc123"),
  )
  .await;

  assert!(outcome.is_err());
  assert!(store.pending_mutation(Resource::Subcategories).is_none());
  assert_eq!(store.snapshot(Resource::Subcategories), before);

  // The per-resource lock was released with the abandoned call
  store
    .delete_record(Resource::Subcategories, "def456")
    .await
    .unwrap();
  let page = store.cached_page(&key(Resource::Subcategories, 1)).unwrap();
  assert!(page.contains("abc123"));
  assert!(!page.contains("def456"));
}

#[tokio::test]
async fn test_dot_ids_are_refused() {
  let mock = MockTransport::new();
  let err = store(&mock, Some("tok"))
    .delete_record(Resource::Categories, "..")
    .await
    .unwrap_err();

  assert_eq!(err, StoreError::validation("Invalid record id '..'"));
  assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_failed_delete_restores_every_page_exactly() {
  let mock = MockTransport::new();
  mock.reply(Method::Get, "subcategories", 200, list_body(&["a", "b"], 1, 2, 10));
  mock.reply(Method::Get, "subcategories", 200, list_body(&["c", "d"], 2, 2, 10));
  mock.reply(
    Method::Delete,
    "subcategories/a",
    400,
    json!({ "status": false, "message": "Subcategory has products" }),
  );
  let store = store(&mock, Some("tok"));

  for page in 1..=2 {
    store
      .fetch_page(Resource::Subcategories, page, 8, &Filters::new())
      .await
      .unwrap();
  }
  let before = store.snapshot(Resource::Subcategories);

  let err = store
    .delete_record(Resource::Subcategories, "a")
    .await
    .unwrap_err();

  assert_eq!(err.to_string(), "Subcategory has products");
  assert_eq!(store.snapshot(Resource::Subcategories), before);
}

#[tokio::test]
async fn test_network_failure_on_delete_rolls_back() {
  let mock = MockTransport::new();
  mock.reply(Method::Get, "categories", 200, list_body(&["a"], 1, 1, 1));
  mock.fail(Method::Delete, "categories/a", "timed out");
  let store = store(&mock, Some("tok"));

  store
    .fetch_page(Resource::Categories, 1, 8, &Filters::new())
    .await
    .unwrap();
  let before = store.snapshot(Resource::Categories);

  let err = store
    .delete_record(Resource::Categories, "a")
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NetworkFailure);
  assert_eq!(store.snapshot(Resource::Categories), before);
}

#[tokio::test]
async fn test_successful_delete_keeps_record_removed() {
  let mock = MockTransport::new();
  mock.reply(Method::Get, "newsletter", 200, list_body(&["a", "b"], 1, 1, 2));
  mock.reply(
    Method::Delete,
    "newsletter/a",
    200,
    json!({ "status": true, "message": "Deleted" }),
  );
  let store = store(&mock, Some("tok"));

  store
    .fetch_page(Resource::Newsletter, 1, 8, &Filters::new())
    .await
    .unwrap();
  store
    .delete_record(Resource::Newsletter, "a")
    .await
    .unwrap();

  let entry = store.cache_entry(&key(Resource::Newsletter, 1)).unwrap();
  let page = entry.page.unwrap();
  assert!(!page.contains("a"));
  assert_eq!(page.meta.total_items, 1);
  assert!(entry.stale);
  assert!(store.pending_mutation(Resource::Newsletter).is_none());
}

#[tokio::test]
async fn test_delete_of_uncached_record_leaves_cache_alone() {
  let mock = MockTransport::new();
  mock.reply(Method::Get, "categories", 200, list_body(&["a"], 1, 1, 1));
  mock.reply(Method::Delete, "categories/zzz", 200, json!({ "status": true }));
  let store = store(&mock, Some("tok"));

  store
    .fetch_page(Resource::Categories, 1, 8, &Filters::new())
    .await
    .unwrap();
  let before = store.cached_page(&key(Resource::Categories, 1));

  store
    .delete_record(Resource::Categories, "zzz")
    .await
    .unwrap();

  assert_eq!(mock.count(Method::Delete, "categories/zzz"), 1);
  assert_eq!(store.cached_page(&key(Resource::Categories, 1)), before);
}

#[tokio::test]
async fn test_delete_without_token_makes_no_request() {
  let mock = MockTransport::new();
  let err = store(&mock, None)
    .delete_record(Resource::Categories, "a")
    .await
    .unwrap_err();

  assert_eq!(
    err,
    StoreError::Auth("You must be logged in to modify categories".into())
  );
  assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_deletes_on_one_resource_are_serialized() {
  let mock = MockTransport::new();
  let release = mock.defer(Method::Delete, "categories/a");
  mock.reply(Method::Delete, "categories/b", 200, json!({ "status": true }));
  let store = store(&mock, Some("tok"));

  let first = {
    let store = store.clone();
    tokio::spawn(async move { store.delete_record(Resource::Categories, "a").await })
  };
  wait_for_pending(&store, Resource::Categories).await;

  let second = {
    let store = store.clone();
    tokio::spawn(async move { store.delete_record(Resource::Categories, "b").await })
  };
  for _ in 0..10 {
    tokio::task::yield_now().await;
  }
  assert_eq!(mock.count(Method::Delete, "categories/b"), 0);

  release
    .send(Ok(ApiResponse::new(200, json!({ "status": true }))))
    .unwrap();
  first.await.unwrap().unwrap();
  second.await.unwrap().unwrap();
  assert_eq!(mock.count(Method::Delete, "categories/b"), 1);
}

#[tokio::test]
async fn test_background_refetch_after_delete() {
  let mock = MockTransport::new();
  mock.reply(Method::Get, "categories", 200, list_body(&["a", "b"], 1, 1, 2));
  mock.reply(Method::Delete, "categories/a", 200, json!({ "status": true }));
  mock.reply(Method::Get, "categories", 200, list_body(&["b", "c"], 1, 1, 2));
  let store = ResourceStore::new(
    mock.clone(),
    Arc::new(StaticToken(Some("tok".into()))),
    Box::new(NoopStorage),
    StoreOptions {
      background_refetch: true,
      ..options()
    },
  );

  store
    .fetch_page(Resource::Categories, 1, 8, &Filters::new())
    .await
    .unwrap();
  store
    .delete_record(Resource::Categories, "a")
    .await
    .unwrap();

  tokio::time::timeout(std::time::Duration::from_secs(5), async {
    loop {
      let entry = store.cache_entry(&key(Resource::Categories, 1)).unwrap();
      if !entry.stale && entry.status == QueryStatus::Success {
        break;
      }
      tokio::task::yield_now().await;
    }
  })
  .await
  .unwrap();

  let page = store.cached_page(&key(Resource::Categories, 1)).unwrap();
  assert!(page.contains("c"));
  assert_eq!(mock.count(Method::Get, "categories"), 2);
}

#[tokio::test]
async fn test_clear_resource_drops_entries() {
  let mock = MockTransport::new();
  mock.reply(Method::Get, "categories", 200, list_body(&["a"], 1, 1, 1));
  let store = store(&mock, None);

  store
    .fetch_page(Resource::Categories, 1, 8, &Filters::new())
    .await
    .unwrap();
  store.clear_resource(Resource::Categories).unwrap();
  assert!(store.snapshot(Resource::Categories).is_empty());
}
