// app/src/models/cart_item.rs

use rust_decimal::Decimal;
use sqlx::FromRow;
use storefront_core::model::CartLine;
use uuid::Uuid;

/// Cart line joined with the product's display fields.
pub const CART_SELECT: &str = r#"
  SELECT ci.id, ci.product_id, ci.quantity, ci.price_snapshot, p.name, p.image_url
  FROM cart_items ci
  JOIN products p ON p.id = ci.product_id
"#;

#[derive(Debug, Clone, FromRow)]
pub struct CartItemRow {
  pub id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub price_snapshot: Decimal,
  pub name: String,
  pub image_url: Option<String>,
}

impl From<CartItemRow> for CartLine {
  fn from(row: CartItemRow) -> Self {
    CartLine {
      id: Some(row.id),
      product_id: row.product_id,
      // The table's CHECK keeps quantities positive.
      quantity: u32::try_from(row.quantity).unwrap_or(0),
      price_snapshot: row.price_snapshot,
      name: row.name,
      image_url: row.image_url,
    }
  }
}
