// core/src/cache.rs

//! A small keyed cache for read queries.
//!
//! Values are stored as JSON so one cache can hold any response type. Keys
//! are `:`-separated paths (`"products"`, `"products:<id>"`), which lets a
//! mutation drop a whole family with [`QueryCache::invalidate_prefix`].

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::StoreResult;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct Entry {
  value: serde_json::Value,
  stored_at: Instant,
}

#[derive(Debug)]
pub struct QueryCache {
  ttl: Duration,
  entries: RwLock<HashMap<String, Entry>>,
}

impl Default for QueryCache {
  fn default() -> Self {
    Self::new(DEFAULT_TTL)
  }
}

impl QueryCache {
  pub fn new(ttl: Duration) -> Self {
    Self {
      ttl,
      entries: RwLock::new(HashMap::new()),
    }
  }

  /// The fresh value stored under `key`, if any.
  pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    let entries = self.entries.read();
    let entry = entries.get(key)?;
    if entry.stored_at.elapsed() > self.ttl {
      return None;
    }
    match serde_json::from_value(entry.value.clone()) {
      Ok(value) => Some(value),
      Err(e) => {
        tracing::debug!(key, error = %e, "Cached value has a different shape; treating as a miss.");
        None
      }
    }
  }

  pub fn put<T: Serialize>(&self, key: impl Into<String>, value: &T) {
    let key = key.into();
    match serde_json::to_value(value) {
      Ok(value) => {
        self.entries.write().insert(
          key,
          Entry {
            value,
            stored_at: Instant::now(),
          },
        );
      }
      Err(e) => tracing::warn!(key = %key, error = %e, "Value could not be cached."),
    }
  }

  pub fn is_stale(&self, key: &str) -> bool {
    self
      .entries
      .read()
      .get(key)
      .map_or(true, |entry| entry.stored_at.elapsed() > self.ttl)
  }

  pub fn invalidate(&self, key: &str) {
    self.entries.write().remove(key);
  }

  /// Drops `prefix` itself and every key below it (`prefix:...`).
  pub fn invalidate_prefix(&self, prefix: &str) {
    let nested = format!("{}:", prefix);
    self
      .entries
      .write()
      .retain(|key, _| key != prefix && !key.starts_with(&nested));
  }

  pub fn clear(&self) {
    self.entries.write().clear();
  }

  pub fn len(&self) -> usize {
    self.entries.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.read().is_empty()
  }

  /// Returns the cached value or runs `fetch` and caches its result.
  /// Errors are not cached.
  pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, fetch: F) -> StoreResult<T>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
  {
    if let Some(hit) = self.get(key) {
      return Ok(hit);
    }
    let value = fetch().await?;
    self.put(key, &value);
    Ok(value)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn prefix_invalidation_spares_siblings() {
    let cache = QueryCache::default();
    cache.put("products", &vec![1, 2]);
    cache.put("products:abc", &"detail");
    cache.put("products-archive", &0);
    cache.put("categories", &vec!["seeds"]);

    cache.invalidate_prefix("products");

    assert!(cache.get::<Vec<i32>>("products").is_none());
    assert!(cache.get::<String>("products:abc").is_none());
    assert_eq!(cache.get::<i32>("products-archive"), Some(0));
    assert_eq!(cache.get::<Vec<String>>("categories"), Some(vec!["seeds".to_string()]));
  }

  #[test]
  fn zero_ttl_is_always_stale() {
    let cache = QueryCache::new(Duration::ZERO);
    cache.put("k", &1);
    std::thread::sleep(Duration::from_millis(2));
    assert!(cache.is_stale("k"));
    assert!(cache.get::<i32>("k").is_none());
  }

  #[tokio::test]
  async fn fetch_errors_are_not_cached() {
    let cache = QueryCache::default();
    let err: StoreResult<i32> = cache
      .get_or_fetch("k", || async { Err(crate::StoreError::Internal("down".into())) })
      .await;
    assert!(err.is_err());
    assert!(cache.is_empty());

    let v = cache.get_or_fetch("k", || async { Ok(7) }).await.unwrap();
    assert_eq!(v, 7);
    let again = cache.get_or_fetch("k", || async { Ok(8) }).await.unwrap();
    assert_eq!(again, 7);
  }
}
