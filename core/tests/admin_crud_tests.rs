// tests/admin_crud_tests.rs
mod common;

use common::*;
use serial_test::serial;
use std::sync::Arc;
use storefront_core::api::Categories;
use storefront_core::model::{CategoryUpdate, NewCategory};
use storefront_core::{CrudOperations, NoticeLevel, NoticeLog, QueryCache, StoreError};
use uuid::Uuid;

struct Fixture {
  crud: CrudOperations<Categories, MemoryCategories>,
  cache: Arc<QueryCache>,
  notices: Arc<NoticeLog>,
}

fn fixture() -> Fixture {
  let cache = Arc::new(QueryCache::default());
  let notices = Arc::new(NoticeLog::new());
  let crud = CrudOperations::new(MemoryCategories::default(), cache.clone(), notices.clone());
  Fixture { crud, cache, notices }
}

fn new_category(name: &str, slug: &str) -> NewCategory {
  NewCategory {
    name: name.to_string(),
    slug: slug.to_string(),
    description: None,
    image_url: None,
  }
}

#[tokio::test]
#[serial]
async fn test_list_is_served_from_cache_until_a_mutation() {
  setup_tracing();
  let f = fixture();
  f.crud.create(&new_category("Seeds", "seeds")).await.unwrap();

  assert_eq!(f.crud.list().await.len(), 1);
  assert_eq!(f.crud.list().await.len(), 1);
  assert_eq!(f.crud.api().list_calls(), 1);

  f.crud.create(&new_category("Pots", "pots")).await.unwrap();
  let names: Vec<String> = f.crud.list().await.into_iter().map(|c| c.name).collect();
  assert_eq!(names, vec!["Pots".to_string(), "Seeds".to_string()]);
  assert_eq!(f.crud.api().list_calls(), 2);
}

#[tokio::test]
#[serial]
async fn test_category_change_invalidates_products() {
  setup_tracing();
  let f = fixture();
  f.cache.put("products", &vec!["cached listing"]);
  f.cache.put("categories-archive", &1);

  let created = f.crud.create(&new_category("Seeds", "seeds")).await.unwrap();

  assert!(f.cache.is_stale("products"));
  assert!(!f.cache.is_stale("categories-archive"));
  let notices = f.notices.drain();
  assert_eq!(notices.len(), 1);
  assert_eq!(notices[0].level, NoticeLevel::Success);
  assert_eq!(notices[0].message, "Category created.");

  let renamed = f
    .crud
    .update(
      created.id,
      &CategoryUpdate {
        name: Some("Vegetable seeds".into()),
        ..Default::default()
      },
    )
    .await
    .unwrap()
    .unwrap();
  assert_eq!(renamed.name, "Vegetable seeds");
  assert_eq!(f.crud.get(created.id).await.unwrap().name, "Vegetable seeds");
}

#[tokio::test]
#[serial]
async fn test_invalid_payload_never_reaches_the_server() {
  setup_tracing();
  let f = fixture();

  let err = f.crud.create(&new_category("", "Bad Slug")).await.unwrap_err();

  match err {
    StoreError::Validation(fields) => {
      assert!(fields.get("name").is_some());
      assert!(fields.get("slug").is_some());
    }
    other => panic!("expected validation error, got {:?}", other),
  }
  assert_eq!(f.crud.api().len(), 0);
  assert_eq!(f.notices.errors().len(), 1);
}

#[tokio::test]
#[serial]
async fn test_server_error_is_reported_and_cache_kept() {
  setup_tracing();
  let f = fixture();
  f.crud.create(&new_category("Seeds", "seeds")).await.unwrap();
  f.crud.list().await;
  f.notices.drain();

  let err = f.crud.create(&new_category("Seeds again", "seeds")).await.unwrap_err();

  assert!(matches!(err, StoreError::Conflict(_)));
  assert!(!f.cache.is_stale("categories"));
  let errors = f.notices.errors();
  assert_eq!(errors.len(), 1);
  assert!(errors[0].message.contains("already exists"));
  assert!(!errors[0].retryable);
}

#[tokio::test]
#[serial]
async fn test_missing_entities_are_absent_not_errors() {
  setup_tracing();
  let f = fixture();
  let id = Uuid::new_v4();

  assert!(f.crud.get(id).await.is_none());
  assert!(f.crud.update(id, &CategoryUpdate::default()).await.unwrap().is_none());
  assert!(!f.crud.delete(id).await.unwrap());
}

#[tokio::test]
#[serial]
async fn test_delete_removes_and_invalidates_detail() {
  setup_tracing();
  let f = fixture();
  let created = f.crud.create(&new_category("Seeds", "seeds")).await.unwrap();
  assert!(f.crud.get(created.id).await.is_some());

  assert!(f.crud.delete(created.id).await.unwrap());

  assert!(f.crud.get(created.id).await.is_none());
  assert!(f.crud.list().await.is_empty());
}

#[tokio::test]
#[serial]
async fn test_transport_failure_is_retryable_notice() {
  setup_tracing();
  let f = fixture();
  f.crud.api().fail_next(StoreError::from_status(503, "maintenance"));

  assert!(f.crud.create(&new_category("Seeds", "seeds")).await.is_err());

  let errors = f.notices.errors();
  assert!(errors[0].retryable);
  assert!(errors[0].message.starts_with("Could not create category"));
}

#[tokio::test]
#[serial]
async fn test_failed_reads_degrade_to_empty_with_a_notice() {
  setup_tracing();
  let f = fixture();
  let created = f.crud.create(&new_category("Seeds", "seeds")).await.unwrap();
  f.notices.drain();

  f.crud.api().fail_next(StoreError::from_status(503, "maintenance"));
  assert!(f.crud.list().await.is_empty());
  f.crud.api().fail_next(StoreError::from_status(503, "maintenance"));
  assert!(f.crud.get(created.id).await.is_none());

  let errors = f.notices.errors();
  assert_eq!(errors.len(), 2);
  assert!(errors[0].message.starts_with("Could not load category"));
  assert!(errors[0].retryable);

  // Failures are not cached: the next read sees the row.
  assert_eq!(f.crud.list().await.len(), 1);
}

#[tokio::test]
#[serial]
async fn test_strict_reads_return_the_error() {
  setup_tracing();
  let f = fixture();
  f.crud.api().fail_next(StoreError::from_status(503, "maintenance"));

  let err = f.crud.try_list().await.unwrap_err();

  assert_eq!(err.status(), Some(503));
  assert!(f.notices.errors().is_empty());
}
