// core/src/model/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::cart::CartLine;
use super::{looks_like_email, round_money};
use crate::error::{FieldErrors, StoreError, StoreResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  #[default]
  Pending,
  Confirmed,
  Shipped,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Confirmed => "confirmed",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
    }
  }

  /// Message shown to the customer when an order moves into this status.
  pub fn customer_message(self) -> &'static str {
    match self {
      OrderStatus::Pending => "Your order has been received and is awaiting processing.",
      OrderStatus::Confirmed => "Your order has been confirmed.",
      OrderStatus::Shipped => "Your order has been shipped.",
      OrderStatus::Delivered => "Your order has been delivered.",
      OrderStatus::Cancelled => "Your order has been cancelled.",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = StoreError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| StoreError::Validation(FieldErrors::single("status", format!("Unknown order status '{}'.", s))))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub price_snapshot: Decimal,
  pub name: String,
  #[serde(default)]
  pub image_url: Option<String>,
}

impl OrderItem {
  pub fn subtotal(&self) -> Decimal {
    self.price_snapshot * Decimal::from(self.quantity)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub total_amount: Decimal,
  pub status: OrderStatus,
  pub created_at: DateTime<Utc>,
  pub full_name: String,
  pub email: String,
  pub address: String,
  pub city: String,
  pub postal_code: String,
  pub phone: String,
  #[serde(default)]
  pub order_items: Vec<OrderItem>,
}

/// Delivery details collected by the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderContact {
  pub full_name: String,
  pub email: String,
  pub address: String,
  pub city: String,
  pub postal_code: String,
  pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
  pub product_id: Uuid,
  pub quantity: i32,
  pub price_snapshot: Decimal,
  pub name: String,
  #[serde(default)]
  pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
  #[serde(flatten)]
  pub contact: OrderContact,
  pub total_amount: Decimal,
  pub order_items: Vec<NewOrderItem>,
}

impl NewOrder {
  /// Builds a checkout payload from the current cart lines.
  pub fn from_cart(contact: OrderContact, lines: &[CartLine]) -> Self {
    let order_items: Vec<NewOrderItem> = lines
      .iter()
      .map(|line| NewOrderItem {
        product_id: line.product_id,
        quantity: line.quantity as i32,
        price_snapshot: line.price_snapshot,
        name: line.name.clone(),
        image_url: line.image_url.clone(),
      })
      .collect();
    let total_amount = round_money(lines.iter().map(CartLine::subtotal).sum());
    Self {
      contact,
      total_amount,
      order_items,
    }
  }

  pub fn items_total(&self) -> Decimal {
    items_total(&self.order_items)
  }

  pub fn validate(&self) -> StoreResult<()> {
    let mut errors = FieldErrors::new();
    let contact = &self.contact;
    for (field, value) in [
      ("fullName", &contact.full_name),
      ("address", &contact.address),
      ("city", &contact.city),
      ("postalCode", &contact.postal_code),
      ("phone", &contact.phone),
    ] {
      if value.trim().is_empty() {
        errors.add(field, "This field is required.");
      }
    }
    if !looks_like_email(contact.email.trim()) {
      errors.add("email", "Enter a valid email address.");
    }
    let digits = contact.phone.chars().filter(char::is_ascii_digit).count();
    if !contact.phone.trim().is_empty() && digits < 7 {
      errors.add("phone", "Phone number is too short.");
    }
    validate_items(&mut errors, &self.order_items, self.total_amount);
    errors.into_result()
  }
}

fn items_total(items: &[NewOrderItem]) -> Decimal {
  round_money(
    items
      .iter()
      .map(|item| item.price_snapshot * Decimal::from(item.quantity))
      .sum(),
  )
}

fn validate_items(errors: &mut FieldErrors, items: &[NewOrderItem], total_amount: Decimal) {
  if items.is_empty() {
    errors.add("orderItems", "The order has no items.");
  }
  if items.iter().any(|item| item.quantity < 1) {
    errors.add("orderItems", "Every item needs a quantity of at least 1.");
  }
  if items.iter().any(|item| item.price_snapshot < Decimal::ZERO) {
    errors.add("orderItems", "Item prices cannot be negative.");
  }
  let tolerance = Decimal::new(1, 2);
  if (round_money(total_amount) - items_total(items)).abs() > tolerance {
    errors.add("totalAmount", "Total does not match the order items.");
  }
}

/// Back-office replacement of an order's items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEdit {
  pub order_items: Vec<NewOrderItem>,
  pub total_amount: Decimal,
}

impl OrderEdit {
  pub fn validate(&self) -> StoreResult<()> {
    let mut errors = FieldErrors::new();
    validate_items(&mut errors, &self.order_items, self.total_amount);
    errors.into_result()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDelete {
  pub order_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusUpdate {
  pub status: OrderStatus,
}
