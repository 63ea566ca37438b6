// core/src/stats.rs

//! Purchase analytics over a user's order history.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::model::{round_money, Order, OrderStatus};

pub const TOP_PRODUCTS: usize = 5;
pub const RECENT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
  pub count: u64,
  pub spent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTally {
  pub name: String,
  pub count: u64,
  pub spent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
  pub total_orders: u64,
  pub total_spent: Decimal,
  pub avg_order_value: Decimal,
  pub status_counts: BTreeMap<OrderStatus, u64>,
  /// Keyed by `YYYY-MM`.
  pub monthly: BTreeMap<String, Tally>,
  /// Up to five products by amount spent, highest first.
  pub top_products: Vec<ProductTally>,
  pub recent_orders: u64,
  /// `None` with fewer than two orders.
  pub avg_days_between_orders: Option<f64>,
}

impl OrderStats {
  /// Aggregates `orders` as seen at `now`; `None` without any orders.
  pub fn compute(orders: &[Order], now: DateTime<Utc>) -> Option<Self> {
    if orders.is_empty() {
      return None;
    }
    let total_orders = orders.len() as u64;
    let total_spent: Decimal = orders.iter().map(|o| o.total_amount).sum();

    let mut status_counts = BTreeMap::new();
    let mut monthly: BTreeMap<String, Tally> = BTreeMap::new();
    let mut products: HashMap<&str, (u64, Decimal)> = HashMap::new();
    for order in orders {
      *status_counts.entry(order.status).or_insert(0) += 1;

      let month = monthly.entry(order.created_at.format("%Y-%m").to_string()).or_default();
      month.count += 1;
      month.spent += order.total_amount;

      for item in &order.order_items {
        let entry = products.entry(item.name.as_str()).or_insert((0, Decimal::ZERO));
        entry.0 += u64::try_from(item.quantity).unwrap_or(0);
        entry.1 += item.subtotal();
      }
    }
    for tally in monthly.values_mut() {
      tally.spent = round_money(tally.spent);
    }

    let mut top_products: Vec<ProductTally> = products
      .into_iter()
      .map(|(name, (count, spent))| ProductTally {
        name: name.to_string(),
        count,
        spent: round_money(spent),
      })
      .collect();
    top_products.sort_by(|a, b| b.spent.cmp(&a.spent).then_with(|| a.name.cmp(&b.name)));
    top_products.truncate(TOP_PRODUCTS);

    let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
    let recent_orders = orders.iter().filter(|o| o.created_at >= cutoff).count() as u64;

    Some(Self {
      total_orders,
      total_spent: round_money(total_spent),
      avg_order_value: round_money(total_spent / Decimal::from(total_orders)),
      status_counts,
      monthly,
      top_products,
      recent_orders,
      avg_days_between_orders: average_gap_days(orders),
    })
  }
}

fn average_gap_days(orders: &[Order]) -> Option<f64> {
  if orders.len() < 2 {
    return None;
  }
  let mut dates: Vec<DateTime<Utc>> = orders.iter().map(|o| o.created_at).collect();
  dates.sort();
  // Sum of consecutive gaps is just last - first.
  let span = *dates.last()? - *dates.first()?;
  let gaps = (dates.len() - 1) as f64;
  Some(span.num_seconds() as f64 / 86_400.0 / gaps)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::OrderItem;
  use chrono::TimeZone;
  use uuid::Uuid;

  fn order(day: (i32, u32, u32), total: &str, status: OrderStatus, items: &[(&str, i32, &str)]) -> Order {
    let id = Uuid::new_v4();
    Order {
      id,
      user_id: Uuid::nil(),
      total_amount: total.parse().unwrap(),
      status,
      created_at: Utc.with_ymd_and_hms(day.0, day.1, day.2, 12, 0, 0).unwrap(),
      full_name: "Ivan Petrov".into(),
      email: "ivan@example.com".into(),
      address: "1 Garden Lane".into(),
      city: "Tver".into(),
      postal_code: "170000".into(),
      phone: "+79001234567".into(),
      order_items: items
        .iter()
        .map(|(name, qty, price)| OrderItem {
          id: Uuid::new_v4(),
          order_id: id,
          product_id: Uuid::new_v4(),
          quantity: *qty,
          price_snapshot: price.parse().unwrap(),
          name: name.to_string(),
          image_url: None,
        })
        .collect(),
    }
  }

  #[test]
  fn no_orders_no_stats() {
    assert!(OrderStats::compute(&[], Utc::now()).is_none());
  }

  #[test]
  fn aggregates_history() {
    let orders = vec![
      order((2025, 1, 10), "300.00", OrderStatus::Delivered, &[("Seeds", 2, "150.00")]),
      order((2025, 1, 20), "450.00", OrderStatus::Delivered, &[("Watering can", 1, "450.00")]),
      order(
        (2025, 2, 9),
        "270.50",
        OrderStatus::Pending,
        &[("Seeds", 1, "150.00"), ("Gloves", 1, "120.50")],
      ),
    ];
    let now = Utc.with_ymd_and_hms(2025, 2, 15, 0, 0, 0).unwrap();
    let stats = OrderStats::compute(&orders, now).unwrap();

    assert_eq!(stats.total_orders, 3);
    assert_eq!(stats.total_spent, "1020.50".parse::<Decimal>().unwrap());
    assert_eq!(stats.avg_order_value, "340.17".parse::<Decimal>().unwrap());
    assert_eq!(stats.status_counts[&OrderStatus::Delivered], 2);
    assert_eq!(stats.status_counts[&OrderStatus::Pending], 1);
    assert_eq!(stats.monthly["2025-01"].count, 2);
    assert_eq!(stats.monthly["2025-02"].spent, "270.50".parse::<Decimal>().unwrap());

    assert_eq!(stats.top_products[0].name, "Seeds");
    assert_eq!(stats.top_products[0].count, 3);
    assert_eq!(stats.top_products[1].name, "Watering can");
    assert_eq!(stats.top_products.len(), 3);

    // Jan 20 and Feb 9 fall inside the 30-day window ending Feb 15.
    assert_eq!(stats.recent_orders, 2);
    // 30 days from Jan 10 to Feb 9 over two gaps.
    assert_eq!(stats.avg_days_between_orders, Some(15.0));
  }

  #[test]
  fn single_order_has_no_gap() {
    let orders = vec![order((2025, 3, 1), "10.00", OrderStatus::Confirmed, &[])];
    let stats = OrderStats::compute(&orders, Utc::now()).unwrap();
    assert_eq!(stats.avg_days_between_orders, None);
    assert!(stats.top_products.is_empty());
  }
}
