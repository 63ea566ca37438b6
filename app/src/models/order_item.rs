// app/src/models/order_item.rs

use rust_decimal::Decimal;
use sqlx::FromRow;
use storefront_core::model::OrderItem;
use uuid::Uuid;

pub const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, price_snapshot, name, image_url";

/// Order lines snapshot the product; `product_id` is not a foreign key.
#[derive(Debug, Clone, FromRow)]
pub struct OrderItemRow {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub price_snapshot: Decimal,
  pub name: String,
  pub image_url: Option<String>,
}

impl From<OrderItemRow> for OrderItem {
  fn from(row: OrderItemRow) -> Self {
    OrderItem {
      id: row.id,
      order_id: row.order_id,
      product_id: row.product_id,
      quantity: row.quantity,
      price_snapshot: row.price_snapshot,
      name: row.name,
      image_url: row.image_url,
    }
  }
}
