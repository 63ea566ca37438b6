// core/src/api/resource.rs

//! Typed CRUD over the administrable entities.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::client::ApiClient;
use crate::error::{StoreError, StoreResult};
use crate::model::{
  AdminUser, Category, CategoryUpdate, NewCategory, NewOrder, NewProduct, NewUser, Order, OrderEdit, OrderStatusUpdate,
  Product, ProductOfflineUpdate, ProductUpdate, UserUpdate,
};

/// An entity type together with its payloads and where it lives.
pub trait Resource: Send + Sync + 'static {
  type Entity: Serialize + DeserializeOwned + Clone + Send + Sync;
  type Create: Serialize + Send + Sync;
  type Update: Serialize + Send + Sync;

  /// Human-readable singular name, used in notices.
  const NAME: &'static str;
  /// Collection path; items live at `{COLLECTION}/{id}`.
  const COLLECTION: &'static str;
  /// Cache key family holding lists and details of this entity.
  const CACHE_KEY: &'static str;

  /// Where new entities are posted.
  fn create_path() -> &'static str {
    Self::COLLECTION
  }

  /// Other cache families a change to this entity makes stale.
  fn dependents() -> &'static [&'static str] {
    &[]
  }

  fn validate_create(payload: &Self::Create) -> StoreResult<()>;
  fn validate_update(patch: &Self::Update) -> StoreResult<()>;

  fn item_path(id: Uuid) -> String {
    format!("{}/{}", Self::COLLECTION, id)
  }

  fn list_key() -> String {
    Self::CACHE_KEY.to_string()
  }

  fn detail_key(id: Uuid) -> String {
    format!("{}:{}", Self::CACHE_KEY, id)
  }
}

pub struct Categories;
pub struct Products;
pub struct Users;
pub struct Orders;

impl Resource for Categories {
  type Entity = Category;
  type Create = NewCategory;
  type Update = CategoryUpdate;

  const NAME: &'static str = "Category";
  const COLLECTION: &'static str = "/api/admin/categories";
  const CACHE_KEY: &'static str = "categories";

  /// Products embed their category.
  fn dependents() -> &'static [&'static str] {
    &["products"]
  }

  fn validate_create(payload: &NewCategory) -> StoreResult<()> {
    payload.validate()
  }

  fn validate_update(patch: &CategoryUpdate) -> StoreResult<()> {
    patch.validate()
  }
}

impl Resource for Products {
  type Entity = Product;
  type Create = NewProduct;
  type Update = ProductUpdate;

  const NAME: &'static str = "Product";
  const COLLECTION: &'static str = "/api/admin/products";
  const CACHE_KEY: &'static str = "products";

  fn validate_create(payload: &NewProduct) -> StoreResult<()> {
    payload.validate()
  }

  fn validate_update(patch: &ProductUpdate) -> StoreResult<()> {
    patch.validate()
  }
}

impl Resource for Users {
  type Entity = AdminUser;
  type Create = NewUser;
  type Update = UserUpdate;

  const NAME: &'static str = "User";
  const COLLECTION: &'static str = "/api/admin/users";
  const CACHE_KEY: &'static str = "users";

  /// Deleting a user cascades to their orders.
  fn dependents() -> &'static [&'static str] {
    &["orders"]
  }

  fn validate_create(payload: &NewUser) -> StoreResult<()> {
    payload.validate()
  }

  fn validate_update(patch: &UserUpdate) -> StoreResult<()> {
    patch.validate()
  }
}

impl Resource for Orders {
  type Entity = Order;
  type Create = NewOrder;
  type Update = OrderStatusUpdate;

  const NAME: &'static str = "Order";
  const COLLECTION: &'static str = "/api/admin/orders";
  const CACHE_KEY: &'static str = "orders";

  /// User listings carry order counts.
  fn dependents() -> &'static [&'static str] {
    &["users"]
  }

  /// Orders are placed by customers, not through the back-office.
  fn create_path() -> &'static str {
    "/api/orders"
  }

  fn validate_create(payload: &NewOrder) -> StoreResult<()> {
    payload.validate()
  }

  fn validate_update(_patch: &OrderStatusUpdate) -> StoreResult<()> {
    Ok(())
  }
}

/// Typed access to one resource. Absent entities are `None`/`false`, not
/// errors.
#[async_trait]
pub trait ResourceApi<R: Resource>: Send + Sync {
  async fn list(&self) -> StoreResult<Vec<R::Entity>>;
  async fn get(&self, id: Uuid) -> StoreResult<Option<R::Entity>>;
  async fn create(&self, payload: &R::Create) -> StoreResult<R::Entity>;
  async fn update(&self, id: Uuid, patch: &R::Update) -> StoreResult<Option<R::Entity>>;
  /// `false` when there was nothing to delete.
  async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
impl<R: Resource> ResourceApi<R> for ApiClient {
  async fn list(&self) -> StoreResult<Vec<R::Entity>> {
    ApiClient::get(self, R::COLLECTION).await
  }

  async fn get(&self, id: Uuid) -> StoreResult<Option<R::Entity>> {
    self.get_optional(&R::item_path(id)).await
  }

  async fn create(&self, payload: &R::Create) -> StoreResult<R::Entity> {
    self.post(R::create_path(), payload).await
  }

  async fn update(&self, id: Uuid, patch: &R::Update) -> StoreResult<Option<R::Entity>> {
    match self.patch(&R::item_path(id), patch).await {
      Ok(entity) => Ok(Some(entity)),
      Err(StoreError::NotFound(_)) => Ok(None),
      Err(e) => Err(e),
    }
  }

  async fn delete(&self, id: Uuid) -> StoreResult<bool> {
    match ApiClient::delete(self, &R::item_path(id)).await {
      Ok(()) => Ok(true),
      Err(StoreError::NotFound(_)) => Ok(false),
      Err(e) => Err(e),
    }
  }
}

/// Back-office changes that sit outside plain CRUD.
impl ApiClient {
  /// Replaces an order's items and total. `Ok(None)` when the order is gone.
  pub async fn edit_order(&self, id: Uuid, edit: &OrderEdit) -> StoreResult<Option<Order>> {
    edit.validate()?;
    match self.patch(&format!("{}/edit", Orders::item_path(id)), edit).await {
      Ok(order) => Ok(Some(order)),
      Err(StoreError::NotFound(_)) => Ok(None),
      Err(e) => Err(e),
    }
  }

  /// Records in-shop sales of a product. `Ok(None)` when the product is gone.
  pub async fn set_offline_purchases(&self, id: Uuid, update: &ProductOfflineUpdate) -> StoreResult<Option<Product>> {
    update.validate()?;
    match self.patch(&format!("{}/offline", Products::item_path(id)), update).await {
      Ok(product) => Ok(Some(product)),
      Err(StoreError::NotFound(_)) => Ok(None),
      Err(e) => Err(e),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn paths_and_cache_keys() {
    let id = Uuid::nil();
    assert_eq!(Products::item_path(id), format!("/api/admin/products/{}", id));
    assert_eq!(Products::detail_key(id), format!("products:{}", id));
    assert_eq!(Categories::list_key(), "categories");
    assert_eq!(Orders::create_path(), "/api/orders");
    assert_eq!(Users::create_path(), "/api/admin/users");
  }
}
