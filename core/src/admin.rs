// core/src/admin.rs

//! Back-office create/update/delete, generic over the entity type.

use std::marker::PhantomData;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::api::{Resource, ResourceApi};
use crate::cache::QueryCache;
use crate::error::{or_empty, StoreResult};
use crate::notify::{Notice, Notifier};

/// CRUD for one resource with cache invalidation and notices.
///
/// Reads go through the shared [`QueryCache`] and degrade to empty with an
/// error notice; `try_list` and `try_get` return the error. Every successful mutation
/// drops the resource's cache family (and its dependents) and emits a
/// success notice; a failure emits an error notice carrying the server's
/// message and leaves the cache alone.
pub struct CrudOperations<R: Resource, A: ResourceApi<R>> {
  api: A,
  cache: Arc<QueryCache>,
  notifier: Arc<dyn Notifier>,
  _resource: PhantomData<fn() -> R>,
}

impl<R: Resource, A: ResourceApi<R>> CrudOperations<R, A> {
  pub fn new(api: A, cache: Arc<QueryCache>, notifier: Arc<dyn Notifier>) -> Self {
    Self {
      api,
      cache,
      notifier,
      _resource: PhantomData,
    }
  }

  pub fn api(&self) -> &A {
    &self.api
  }

  fn invalidate(&self) {
    self.cache.invalidate_prefix(R::CACHE_KEY);
    for family in R::dependents() {
      self.cache.invalidate_prefix(family);
    }
  }

  fn report<T>(&self, action: &str, result: &StoreResult<T>) {
    match result {
      Ok(_) => self.notifier.notify(Notice::success(format!("{} {}.", R::NAME, action))),
      Err(e) => {
        tracing::warn!(resource = R::NAME, action, error = %e, "Back-office change failed.");
        let context = format!("Could not {} {}", action_verb(action), R::NAME.to_lowercase());
        self.notifier.notify(Notice::from_error(&context, e));
      }
    }
  }

  /// Every entity; empty, with an error notice, when the list cannot be
  /// read.
  fn report_failed_read<T>(&self, result: &StoreResult<T>) {
    if let Err(e) = result {
      let context = format!("Could not load {}", R::NAME.to_lowercase());
      self.notifier.notify(Notice::from_error(&context, e));
    }
  }

  pub async fn list(&self) -> Vec<R::Entity> {
    let result = self.try_list().await;
    self.report_failed_read(&result);
    or_empty(R::NAME, result)
  }

  pub async fn try_list(&self) -> StoreResult<Vec<R::Entity>> {
    self.cache.get_or_fetch(&R::list_key(), || self.api.list()).await
  }

  /// The entity with `id`; `None` when it is unknown or cannot be read.
  pub async fn get(&self, id: Uuid) -> Option<R::Entity> {
    let result = self.try_get(id).await;
    self.report_failed_read(&result);
    or_empty(R::NAME, result)
  }

  pub async fn try_get(&self, id: Uuid) -> StoreResult<Option<R::Entity>> {
    let key = R::detail_key(id);
    if let Some(hit) = self.cache.get(&key) {
      return Ok(Some(hit));
    }
    let found = self.api.get(id).await?;
    if let Some(entity) = &found {
      self.cache.put(key, entity);
    }
    Ok(found)
  }

  #[instrument(name = "admin::create", skip(self, payload), fields(resource = R::NAME))]
  pub async fn create(&self, payload: &R::Create) -> StoreResult<R::Entity> {
    let result = match R::validate_create(payload) {
      Ok(()) => self.api.create(payload).await,
      Err(e) => Err(e),
    };
    if result.is_ok() {
      self.invalidate();
    }
    self.report("created", &result);
    result
  }

  /// `Ok(None)` when the entity no longer exists.
  #[instrument(name = "admin::update", skip(self, patch), fields(resource = R::NAME))]
  pub async fn update(&self, id: Uuid, patch: &R::Update) -> StoreResult<Option<R::Entity>> {
    let result = match R::validate_update(patch) {
      Ok(()) => self.api.update(id, patch).await,
      Err(e) => Err(e),
    };
    match &result {
      Ok(Some(_)) => {
        self.invalidate();
        self.report("updated", &result);
      }
      Ok(None) => {
        self.invalidate();
        self.notifier.notify(Notice::error(format!("{} no longer exists.", R::NAME)));
      }
      Err(_) => self.report("updated", &result),
    }
    result
  }

  /// `Ok(false)` when there was nothing to delete.
  #[instrument(name = "admin::delete", skip(self), fields(resource = R::NAME))]
  pub async fn delete(&self, id: Uuid) -> StoreResult<bool> {
    let result = self.api.delete(id).await;
    if result.is_ok() {
      self.invalidate();
    }
    self.report("deleted", &result);
    result
  }
}

fn action_verb(past: &str) -> &str {
  match past {
    "created" => "create",
    "updated" => "update",
    "deleted" => "delete",
    other => other,
  }
}
