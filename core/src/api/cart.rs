// core/src/api/cart.rs

use async_trait::async_trait;
use uuid::Uuid;

use super::client::ApiClient;
use crate::cart::RemoteCart;
use crate::error::StoreResult;
use crate::model::{AddToCartRequest, CartLine, CartMergeRequest, LocalCartItem, UpdateQuantityRequest};

fn wire_quantity(quantity: u32) -> i32 {
  i32::try_from(quantity).unwrap_or(i32::MAX)
}

/// The signed-in user's cart behind `/api/cart`.
#[async_trait]
impl RemoteCart for ApiClient {
  async fn fetch(&self) -> StoreResult<Vec<CartLine>> {
    self.get("/api/cart").await
  }

  async fn add(&self, product_id: Uuid, quantity: u32) -> StoreResult<CartLine> {
    let body = AddToCartRequest {
      product_id,
      quantity: wire_quantity(quantity),
    };
    self.post("/api/cart/add", &body).await
  }

  async fn set_quantity(&self, product_id: Uuid, quantity: u32) -> StoreResult<Option<CartLine>> {
    let body = UpdateQuantityRequest {
      quantity: wire_quantity(quantity),
    };
    self.patch_optional(&format!("/api/cart/{}", product_id), &body).await
  }

  async fn remove(&self, product_id: Uuid) -> StoreResult<()> {
    self.delete(&format!("/api/cart/{}", product_id)).await
  }

  async fn clear(&self) -> StoreResult<()> {
    self.delete("/api/cart").await
  }

  async fn merge(&self, items: &[LocalCartItem]) -> StoreResult<Vec<CartLine>> {
    let body = CartMergeRequest {
      local_cart: items.to_vec(),
    };
    self.post("/api/cart/merge", &body).await
  }
}
