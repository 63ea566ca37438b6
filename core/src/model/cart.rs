// core/src/model/cart.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One product in a cart.
///
/// `quantity` is always at least 1; a line whose quantity would drop to zero
/// is removed instead. `id` is the server row id and is absent for lines that
/// only live in the guest's local storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<Uuid>,
  pub product_id: Uuid,
  pub quantity: u32,
  pub price_snapshot: Decimal,
  pub name: String,
  #[serde(default)]
  pub image_url: Option<String>,
}

impl CartLine {
  pub fn from_snapshot(product: &ProductSnapshot, quantity: u32) -> Self {
    Self {
      id: None,
      product_id: product.product_id,
      quantity,
      price_snapshot: product.price,
      name: product.name.clone(),
      image_url: product.image_url.clone(),
    }
  }

  pub fn subtotal(&self) -> Decimal {
    self.price_snapshot * Decimal::from(self.quantity)
  }

  pub fn to_local_item(&self) -> LocalCartItem {
    LocalCartItem {
      product_id: self.product_id,
      quantity: self.quantity,
      price_snapshot: self.price_snapshot,
    }
  }
}

/// What the cart needs to know about a product at the moment it is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
  pub product_id: Uuid,
  pub name: String,
  pub price: Decimal,
  #[serde(default)]
  pub image_url: Option<String>,
}

/// A guest cart line as sent to `POST /api/cart/merge`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalCartItem {
  pub product_id: Uuid,
  pub quantity: u32,
  pub price_snapshot: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMergeRequest {
  pub local_cart: Vec<LocalCartItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
  pub product_id: Uuid,
  pub quantity: i32,
}

/// `quantity <= 0` asks the server to drop the line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
  pub quantity: i32,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn dec(s: &str) -> Decimal {
    s.parse().expect("decimal literal")
  }

  #[test]
  fn merge_payload_uses_camel_case() {
    let request = CartMergeRequest {
      local_cart: vec![LocalCartItem {
        product_id: Uuid::nil(),
        quantity: 2,
        price_snapshot: dec("150.00"),
      }],
    };
    let json = serde_json::to_value(&request).unwrap();
    assert!(json["localCart"][0].get("productId").is_some());
    assert!(json["localCart"][0].get("priceSnapshot").is_some());
  }

  #[test]
  fn price_snapshot_accepts_json_numbers() {
    let raw = r#"{"productId":"00000000-0000-0000-0000-000000000000","quantity":1,"priceSnapshot":120.5}"#;
    let item: LocalCartItem = serde_json::from_str(raw).unwrap();
    assert_eq!(item.price_snapshot, dec("120.5"));
  }

  #[test]
  fn subtotal_multiplies_snapshot() {
    let line = CartLine {
      id: None,
      product_id: Uuid::new_v4(),
      quantity: 3,
      price_snapshot: dec("19.99"),
      name: "Seeds".to_string(),
      image_url: None,
    };
    assert_eq!(line.subtotal(), dec("59.97"));
  }
}
