// app/src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, Type as SqlxType};
use storefront_core::model::{Order, OrderItem, OrderStatus};
use uuid::Uuid;

use super::order_item::OrderItemRow;

pub const ORDER_COLUMNS: &str =
  "id, user_id, total_amount, status, created_at, full_name, email, address, city, postal_code, phone";

/// Mirror of [`OrderStatus`] bound to the `order_status_enum` column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, SqlxType)]
#[sqlx(type_name = "order_status_enum", rename_all = "lowercase")]
pub enum DbOrderStatus {
  Pending,
  Confirmed,
  Shipped,
  Delivered,
  Cancelled,
}

impl From<DbOrderStatus> for OrderStatus {
  fn from(status: DbOrderStatus) -> Self {
    match status {
      DbOrderStatus::Pending => OrderStatus::Pending,
      DbOrderStatus::Confirmed => OrderStatus::Confirmed,
      DbOrderStatus::Shipped => OrderStatus::Shipped,
      DbOrderStatus::Delivered => OrderStatus::Delivered,
      DbOrderStatus::Cancelled => OrderStatus::Cancelled,
    }
  }
}

impl From<OrderStatus> for DbOrderStatus {
  fn from(status: OrderStatus) -> Self {
    match status {
      OrderStatus::Pending => DbOrderStatus::Pending,
      OrderStatus::Confirmed => DbOrderStatus::Confirmed,
      OrderStatus::Shipped => DbOrderStatus::Shipped,
      OrderStatus::Delivered => DbOrderStatus::Delivered,
      OrderStatus::Cancelled => DbOrderStatus::Cancelled,
    }
  }
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
  pub id: Uuid,
  pub user_id: Uuid,
  pub total_amount: Decimal,
  pub status: DbOrderStatus,
  pub created_at: DateTime<Utc>,
  pub full_name: String,
  pub email: String,
  pub address: String,
  pub city: String,
  pub postal_code: String,
  pub phone: String,
}

impl OrderRow {
  /// Attaches the rows of `items` that belong to this order.
  pub fn into_order(self, items: &[OrderItemRow]) -> Order {
    let order_items: Vec<OrderItem> = items
      .iter()
      .filter(|item| item.order_id == self.id)
      .cloned()
      .map(OrderItem::from)
      .collect();
    Order {
      id: self.id,
      user_id: self.user_id,
      total_amount: self.total_amount,
      status: self.status.into(),
      created_at: self.created_at,
      full_name: self.full_name,
      email: self.email,
      address: self.address,
      city: self.city,
      postal_code: self.postal_code,
      phone: self.phone,
      order_items,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_mirror_is_lossless() {
    for status in OrderStatus::ALL {
      assert_eq!(OrderStatus::from(DbOrderStatus::from(status)), status);
    }
  }

  #[test]
  fn order_only_takes_its_own_items() {
    let order_id = Uuid::new_v4();
    let item = |order_id| OrderItemRow {
      id: Uuid::new_v4(),
      order_id,
      product_id: Uuid::new_v4(),
      quantity: 1,
      price_snapshot: Decimal::from(10),
      name: "Pot".into(),
      image_url: None,
    };
    let row = OrderRow {
      id: order_id,
      user_id: Uuid::new_v4(),
      total_amount: Decimal::from(10),
      status: DbOrderStatus::Shipped,
      created_at: Utc::now(),
      full_name: "Ivan Petrov".into(),
      email: "ivan@example.com".into(),
      address: "1 Garden Lane".into(),
      city: "Tver".into(),
      postal_code: "170000".into(),
      phone: "+79001234567".into(),
    };
    let order = row.into_order(&[item(order_id), item(Uuid::new_v4())]);
    assert_eq!(order.order_items.len(), 1);
    assert_eq!(order.status, OrderStatus::Shipped);
  }
}
