// core/src/cart/store.rs

//! Persistence of the guest cart.
//!
//! The guest cart lives under a single key as a JSON array of lines. A
//! missing or unreadable entry is treated as an empty cart; only writes can
//! fail.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreResult;
use crate::model::CartLine;

use super::local::LocalCart;

/// Key the guest cart is stored under.
pub const ANONYMOUS_CART_KEY: &str = "anonymousCart";

pub trait CartStore: Send + Sync {
  fn load(&self) -> LocalCart;
  fn save(&self, cart: &LocalCart) -> StoreResult<()>;
  fn clear(&self) -> StoreResult<()>;
}

fn decode(raw: &str, origin: &str) -> LocalCart {
  match serde_json::from_str::<Vec<CartLine>>(raw) {
    Ok(lines) => LocalCart::from_lines(lines),
    Err(e) => {
      tracing::warn!(origin, error = %e, "Discarding unreadable guest cart.");
      LocalCart::new()
    }
  }
}

/// Key/value storage held in memory, shaped like browser local storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// The raw stored value, if any.
  pub fn raw(&self) -> Option<String> {
    self.entries.lock().get(ANONYMOUS_CART_KEY).cloned()
  }

  /// Stores a raw value, bypassing serialization.
  pub fn put_raw(&self, value: impl Into<String>) {
    self.entries.lock().insert(ANONYMOUS_CART_KEY.to_string(), value.into());
  }
}

impl CartStore for MemoryStore {
  fn load(&self) -> LocalCart {
    match self.raw() {
      Some(raw) => decode(&raw, "memory"),
      None => LocalCart::new(),
    }
  }

  fn save(&self, cart: &LocalCart) -> StoreResult<()> {
    let raw = serde_json::to_string(cart.lines())?;
    self.put_raw(raw);
    Ok(())
  }

  fn clear(&self) -> StoreResult<()> {
    self.entries.lock().remove(ANONYMOUS_CART_KEY);
    Ok(())
  }
}

/// Stores the guest cart as `<dir>/anonymousCart.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
  path: PathBuf,
}

impl FileStore {
  pub fn new(dir: impl AsRef<Path>) -> Self {
    Self {
      path: dir.as_ref().join(format!("{}.json", ANONYMOUS_CART_KEY)),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl CartStore for FileStore {
  fn load(&self) -> LocalCart {
    match fs::read_to_string(&self.path) {
      Ok(raw) => decode(&raw, "file"),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => LocalCart::new(),
      Err(e) => {
        tracing::warn!(path = %self.path.display(), error = %e, "Guest cart file could not be read.");
        LocalCart::new()
      }
    }
  }

  fn save(&self, cart: &LocalCart) -> StoreResult<()> {
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(cart.lines())?;
    // Write-then-rename keeps a crash from leaving half a cart behind.
    let tmp = self.path.with_extension("json.tmp");
    fs::write(&tmp, raw)?;
    fs::rename(&tmp, &self.path)?;
    Ok(())
  }

  fn clear(&self) -> StoreResult<()> {
    match fs::remove_file(&self.path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::ProductSnapshot;
  use uuid::Uuid;

  fn sample_cart() -> LocalCart {
    let mut cart = LocalCart::new();
    let product = ProductSnapshot {
      product_id: Uuid::new_v4(),
      name: "Watering can".into(),
      price: "450.00".parse().unwrap(),
      image_url: None,
    };
    cart.add(&product, 2).unwrap();
    cart
  }

  #[test]
  fn memory_store_uses_anonymous_cart_key() {
    let store = MemoryStore::new();
    let cart = sample_cart();
    store.save(&cart).unwrap();
    let raw = store.raw().unwrap();
    assert!(raw.contains("\"priceSnapshot\""));
    assert_eq!(store.load(), cart);
    store.clear().unwrap();
    assert!(store.load().is_empty());
  }

  #[test]
  fn corrupt_entry_loads_as_empty() {
    let store = MemoryStore::new();
    store.put_raw("{not json");
    assert!(store.load().is_empty());
  }

  #[test]
  fn file_store_persists_between_instances() {
    let dir = tempfile::tempdir().unwrap();
    let cart = sample_cart();
    FileStore::new(dir.path()).save(&cart).unwrap();

    let reopened = FileStore::new(dir.path());
    assert!(reopened.path().ends_with("anonymousCart.json"));
    assert_eq!(reopened.load(), cart);

    reopened.clear().unwrap();
    reopened.clear().unwrap();
    assert!(reopened.load().is_empty());
  }
}
