// tests/common/mod.rs
#![allow(dead_code)] // Not every test file uses every fixture

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use storefront_core::api::Categories;
use storefront_core::cart::{CartEngine, MemoryRemoteCart, MemoryStore};
use storefront_core::model::{
  AuthToken, CartLine, Category, CategoryUpdate, NewCategory, ProductSnapshot, SignIn, SignUp, UserProfile,
};
use storefront_core::{IdentityProvider, NoticeLog, ResourceApi, StoreError, StoreResult};
use tracing::Level;
use uuid::Uuid;

// --- Catalog fixtures ---
pub fn dec(s: &str) -> Decimal {
  s.parse().expect("decimal literal")
}

pub fn product(name: &str, price: &str) -> ProductSnapshot {
  ProductSnapshot {
    product_id: Uuid::new_v4(),
    name: name.to_string(),
    price: dec(price),
    image_url: Some(format!("/images/{}.jpg", name.to_lowercase().replace(' ', "_"))),
  }
}

pub fn seeds() -> ProductSnapshot {
  product("Tomato seeds", "150.00")
}

pub fn watering_can() -> ProductSnapshot {
  product("Watering can", "450.00")
}

pub fn gloves() -> ProductSnapshot {
  product("Garden gloves", "120.50")
}

pub fn server_line(product: &ProductSnapshot, quantity: u32) -> CartLine {
  let mut line = CartLine::from_snapshot(product, quantity);
  line.id = Some(Uuid::new_v4());
  line
}

pub fn customer(email: &str) -> UserProfile {
  UserProfile {
    id: Uuid::new_v4(),
    email: email.to_string(),
    full_name: Some("Ivan Petrov".to_string()),
    is_admin: false,
  }
}

// --- Cart engine harness ---
pub type TestEngine = CartEngine<MemoryStore, MemoryRemoteCart>;

pub struct CartHarness {
  pub engine: Arc<TestEngine>,
  pub remote: MemoryRemoteCart,
  pub notices: Arc<NoticeLog>,
}

impl CartHarness {
  /// A guest-mode engine whose remote knows `catalog`.
  pub fn new(catalog: &[ProductSnapshot]) -> Self {
    let remote = MemoryRemoteCart::with_catalog(catalog.iter().cloned());
    let notices = Arc::new(NoticeLog::new());
    let engine = CartEngine::with_notifier(MemoryStore::new(), remote.clone(), notices.clone());
    Self {
      engine: Arc::new(engine),
      remote,
      notices,
    }
  }

  pub fn store(&self) -> &MemoryStore {
    self.engine.store()
  }

  pub fn quantity(&self, product_id: Uuid) -> Option<u32> {
    self.engine.line(product_id).map(|l| l.quantity)
  }

  pub fn stored_quantity(&self, product_id: Uuid) -> Option<u32> {
    use storefront_core::CartStore;
    self.store().load().get(product_id).map(|l| l.quantity)
  }
}

/// Polls `check` until it holds or a second has passed.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
  F: FnMut() -> Fut,
  Fut: Future<Output = bool>,
{
  for _ in 0..100 {
    if check().await {
      return true;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  false
}

// --- Identity provider double ---
#[derive(Default)]
pub struct StaticIdentity {
  accounts: Mutex<HashMap<String, (String, UserProfile)>>,
  signed_in: Mutex<Option<UserProfile>>,
  fail_sign_out: Mutex<bool>,
}

impl StaticIdentity {
  pub fn with_account(email: &str, password: &str) -> (Self, UserProfile) {
    let identity = Self::default();
    let profile = customer(email);
    identity
      .accounts
      .lock()
      .insert(email.to_string(), (password.to_string(), profile.clone()));
    (identity, profile)
  }

  pub fn fail_sign_out(&self) {
    *self.fail_sign_out.lock() = true;
  }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
  async fn sign_in(&self, credentials: &SignIn) -> StoreResult<AuthToken> {
    let accounts = self.accounts.lock();
    match accounts.get(&credentials.email) {
      Some((password, profile)) if *password == credentials.password => {
        *self.signed_in.lock() = Some(profile.clone());
        Ok(AuthToken {
          access_token: format!("token-{}", profile.id),
          token_type: "bearer".to_string(),
          user: profile.clone(),
        })
      }
      _ => Err(StoreError::Unauthorized("Invalid email or password".into())),
    }
  }

  async fn sign_up(&self, form: &SignUp) -> StoreResult<UserProfile> {
    let mut accounts = self.accounts.lock();
    if accounts.contains_key(&form.email) {
      return Err(StoreError::Conflict("Email already registered".into()));
    }
    let profile = customer(&form.email);
    accounts.insert(form.email.clone(), (form.password.clone(), profile.clone()));
    Ok(profile)
  }

  async fn sign_out(&self) -> StoreResult<()> {
    *self.signed_in.lock() = None;
    if *self.fail_sign_out.lock() {
      return Err(StoreError::from_status(503, "identity provider unavailable"));
    }
    Ok(())
  }

  async fn current_user(&self) -> StoreResult<Option<UserProfile>> {
    Ok(self.signed_in.lock().clone())
  }
}

// --- Category API double for back-office tests ---
#[derive(Default)]
pub struct MemoryCategories {
  rows: Mutex<HashMap<Uuid, Category>>,
  failures: Mutex<VecDeque<StoreError>>,
  list_calls: Mutex<usize>,
}

impl MemoryCategories {
  pub fn fail_next(&self, err: StoreError) {
    self.failures.lock().push_back(err);
  }

  pub fn list_calls(&self) -> usize {
    *self.list_calls.lock()
  }

  pub fn len(&self) -> usize {
    self.rows.lock().len()
  }

  fn injected(&self) -> StoreResult<()> {
    match self.failures.lock().pop_front() {
      Some(err) => Err(err),
      None => Ok(()),
    }
  }
}

#[async_trait]
impl ResourceApi<Categories> for MemoryCategories {
  async fn list(&self) -> StoreResult<Vec<Category>> {
    *self.list_calls.lock() += 1;
    self.injected()?;
    let mut rows: Vec<Category> = self.rows.lock().values().cloned().collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(rows)
  }

  async fn get(&self, id: Uuid) -> StoreResult<Option<Category>> {
    self.injected()?;
    Ok(self.rows.lock().get(&id).cloned())
  }

  async fn create(&self, payload: &NewCategory) -> StoreResult<Category> {
    self.injected()?;
    let mut rows = self.rows.lock();
    if rows.values().any(|c| c.slug == payload.slug) {
      return Err(StoreError::Conflict("Category with this slug already exists".into()));
    }
    let category = Category {
      id: Uuid::new_v4(),
      slug: payload.slug.clone(),
      name: payload.name.clone(),
      description: payload.description.clone(),
      image_url: payload.image_url.clone(),
    };
    rows.insert(category.id, category.clone());
    Ok(category)
  }

  async fn update(&self, id: Uuid, patch: &CategoryUpdate) -> StoreResult<Option<Category>> {
    self.injected()?;
    let mut rows = self.rows.lock();
    let Some(category) = rows.get_mut(&id) else {
      return Ok(None);
    };
    if let Some(name) = &patch.name {
      category.name = name.clone();
    }
    if let Some(slug) = &patch.slug {
      category.slug = slug.clone();
    }
    if let Some(description) = &patch.description {
      category.description = Some(description.clone());
    }
    if let Some(image_url) = &patch.image_url {
      category.image_url = Some(image_url.clone());
    }
    Ok(Some(category.clone()))
  }

  async fn delete(&self, id: Uuid) -> StoreResult<bool> {
    self.injected()?;
    Ok(self.rows.lock().remove(&id).is_some())
  }
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
