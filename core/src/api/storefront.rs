// core/src/api/storefront.rs

//! Customer-facing reads and account actions.
//!
//! Plain reads degrade: a failure is logged and comes back as an empty list
//! or `None`. Each has a `try_` twin that returns the error instead.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::client::ApiClient;
use crate::error::{or_empty, StoreResult};
use crate::model::{
  Category, Favourite, NewOrder, Notification, NotificationUpdate, Order, OrderDelete, Product, ProductQuery,
  UnreadCount,
};
use crate::pagination::InfiniteList;
use crate::stats::OrderStats;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SlugFilter<'a> {
  slug: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LimitFilter {
  limit: u32,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFilter {
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub unread_only: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FavouriteRequest {
  product_id: Uuid,
}

impl ApiClient {
  /// Every category; empty when the catalog cannot be reached.
  pub async fn categories(&self) -> Vec<Category> {
    or_empty("categories", self.try_categories().await)
  }

  pub async fn try_categories(&self) -> StoreResult<Vec<Category>> {
    self.get("/api/categories").await
  }

  /// The category with `slug`; `None` when unknown or unreachable.
  pub async fn category_by_slug(&self, slug: &str) -> Option<Category> {
    or_empty("category_by_slug", self.try_category_by_slug(slug).await)
  }

  pub async fn try_category_by_slug(&self, slug: &str) -> StoreResult<Option<Category>> {
    let found: Vec<Category> = self.get_with_query("/api/categories", &SlugFilter { slug }).await?;
    Ok(found.into_iter().find(|c| c.slug == slug))
  }

  pub async fn product(&self, id: Uuid) -> Option<Product> {
    or_empty("product", self.try_product(id).await)
  }

  pub async fn try_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
    self.get_optional(&format!("/api/products/{}", id)).await
  }

  pub async fn product_by_slug(&self, slug: &str) -> Option<Product> {
    or_empty("product_by_slug", self.try_product_by_slug(slug).await)
  }

  pub async fn try_product_by_slug(&self, slug: &str) -> StoreResult<Option<Product>> {
    self.get_optional(&format!("/api/products/slug/{}", slug)).await
  }

  /// Products of a category (`"all"` spans every category) with filters.
  pub async fn products_in_category(&self, slug: &str, query: &ProductQuery) -> Vec<Product> {
    or_empty("products_in_category", self.try_products_in_category(slug, query).await)
  }

  pub async fn try_products_in_category(&self, slug: &str, query: &ProductQuery) -> StoreResult<Vec<Product>> {
    query.validate()?;
    self
      .get_with_query(&format!("/api/products/category/{}", slug), query)
      .await
  }

  /// Appends the next page of a category listing to `list`. A failed page
  /// leaves the list as it was so the same page can be asked for again.
  pub async fn load_more_products(
    &self,
    list: &mut InfiniteList<Product>,
    slug: &str,
    query: &ProductQuery,
  ) -> StoreResult<usize> {
    list
      .load_more(|offset, limit| async move {
        let window = query.with_window(offset, limit);
        self.try_products_in_category(slug, &window).await
      })
      .await
  }

  pub async fn bestsellers(&self, limit: u32) -> Vec<Product> {
    or_empty("bestsellers", self.try_bestsellers(limit).await)
  }

  pub async fn try_bestsellers(&self, limit: u32) -> StoreResult<Vec<Product>> {
    self
      .get_with_query("/api/products/bestsellers", &LimitFilter { limit })
      .await
  }

  /// The signed-in user's orders, newest first.
  pub async fn orders(&self) -> Vec<Order> {
    or_empty("orders", self.try_orders().await)
  }

  pub async fn try_orders(&self) -> StoreResult<Vec<Order>> {
    self.get("/api/orders").await
  }

  pub async fn order(&self, id: Uuid) -> Option<Order> {
    or_empty("order", self.try_order(id).await)
  }

  pub async fn try_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
    self.get_optional(&format!("/api/orders/{}", id)).await
  }

  pub async fn place_order(&self, order: &NewOrder) -> StoreResult<Order> {
    order.validate()?;
    self.post("/api/orders", order).await
  }

  pub async fn delete_order(&self, order_id: Uuid) -> StoreResult<()> {
    self.delete_with_body("/api/orders", &OrderDelete { order_id }).await
  }

  /// Purchase analytics over the signed-in user's orders. `None` without
  /// orders, including when they could not be read.
  pub async fn order_stats(&self) -> Option<OrderStats> {
    OrderStats::compute(&self.orders().await, Utc::now())
  }

  pub async fn favourites(&self) -> Vec<Favourite> {
    or_empty("favourites", self.try_favourites().await)
  }

  pub async fn try_favourites(&self) -> StoreResult<Vec<Favourite>> {
    self.get("/api/favourites").await
  }

  /// Fails with a conflict when the product is already a favourite.
  pub async fn add_favourite(&self, product_id: Uuid) -> StoreResult<Favourite> {
    self.post("/api/favourites", &FavouriteRequest { product_id }).await
  }

  pub async fn remove_favourite(&self, product_id: Uuid) -> StoreResult<()> {
    self.delete(&format!("/api/favourites/{}", product_id)).await
  }

  pub async fn notifications(&self, filter: &NotificationFilter) -> Vec<Notification> {
    or_empty("notifications", self.try_notifications(filter).await)
  }

  pub async fn try_notifications(&self, filter: &NotificationFilter) -> StoreResult<Vec<Notification>> {
    self.get_with_query("/api/notifications", filter).await
  }

  /// Unread notifications for the badge; zero when unreachable.
  pub async fn unread_notification_count(&self) -> i64 {
    or_empty("unread_notification_count", self.try_unread_notification_count().await)
  }

  pub async fn try_unread_notification_count(&self) -> StoreResult<i64> {
    let count: UnreadCount = self.get("/api/notifications/unread-count").await?;
    Ok(count.unread_count)
  }

  pub async fn mark_notification(&self, id: Uuid, is_read: bool) -> StoreResult<Option<Notification>> {
    let path = format!("/api/notifications/{}", id);
    match self.patch(&path, &NotificationUpdate { is_read }).await {
      Ok(n) => Ok(Some(n)),
      Err(crate::StoreError::NotFound(_)) => Ok(None),
      Err(e) => Err(e),
    }
  }

  pub async fn mark_all_notifications_read(&self) -> StoreResult<()> {
    self.post_unit("/api/notifications/read-all", &serde_json::json!({})).await
  }
}
