// app/src/services/order_service.rs

//! Checkout and order history.

use sqlx::PgPool;
use std::collections::HashSet;
use storefront_core::model::{round_money, NewOrder, Order, OrderEdit, OrderStatus};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::order::ORDER_COLUMNS;
use crate::models::order_item::ORDER_ITEM_COLUMNS;
use crate::models::{DbOrderStatus, OrderItemRow, OrderRow};
use crate::services::notification_service;

async fn attach_items(pool: &PgPool, orders: Vec<OrderRow>) -> Result<Vec<Order>> {
  if orders.is_empty() {
    return Ok(Vec::new());
  }
  let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
  let items = sqlx::query_as::<_, OrderItemRow>(&format!(
    "SELECT {} FROM order_items WHERE order_id = ANY($1) ORDER BY name, id",
    ORDER_ITEM_COLUMNS
  ))
  .bind(&ids)
  .fetch_all(pool)
  .await?;
  Ok(orders.into_iter().map(|o| o.into_order(&items)).collect())
}

/// The user's orders, newest first.
#[instrument(name = "order_service::list_for_user", skip(pool))]
pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Order>> {
  let rows = sqlx::query_as::<_, OrderRow>(&format!(
    "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id",
    ORDER_COLUMNS
  ))
  .bind(user_id)
  .fetch_all(pool)
  .await?;
  attach_items(pool, rows).await
}

/// Someone else's order reads as absent.
pub async fn get_for_user(pool: &PgPool, user_id: Uuid, order_id: Uuid) -> Result<Option<Order>> {
  let row = sqlx::query_as::<_, OrderRow>(&format!(
    "SELECT {} FROM orders WHERE id = $1 AND user_id = $2",
    ORDER_COLUMNS
  ))
  .bind(order_id)
  .bind(user_id)
  .fetch_optional(pool)
  .await?;
  Ok(attach_items(pool, row.into_iter().collect()).await?.pop())
}

/// Records the order and its lines, bumps each product's order counter and
/// takes the ordered products out of the server cart, all or nothing.
#[instrument(name = "order_service::place", skip(pool, order), fields(items = order.order_items.len()))]
pub async fn place(pool: &PgPool, user_id: Uuid, order: &NewOrder) -> Result<Order> {
  order.validate()?;

  let mut tx = pool.begin().await?;
  let product_ids: Vec<Uuid> = order.order_items.iter().map(|i| i.product_id).collect();
  let known: HashSet<Uuid> = sqlx::query_scalar::<_, Uuid>("SELECT id FROM products WHERE id = ANY($1)")
    .bind(&product_ids)
    .fetch_all(&mut *tx)
    .await?
    .into_iter()
    .collect();
  if let Some(missing) = product_ids.iter().find(|id| !known.contains(id)) {
    return Err(AppError::NotFound(format!("Product {} not found", missing)));
  }

  let contact = &order.contact;
  let order_row = sqlx::query_as::<_, OrderRow>(&format!(
    r#"
    INSERT INTO orders (id, user_id, total_amount, status, full_name, email, address, city, postal_code, phone)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
    RETURNING {}
    "#,
    ORDER_COLUMNS
  ))
  .bind(Uuid::new_v4())
  .bind(user_id)
  .bind(round_money(order.total_amount))
  .bind(DbOrderStatus::Pending)
  .bind(contact.full_name.trim())
  .bind(contact.email.trim())
  .bind(contact.address.trim())
  .bind(contact.city.trim())
  .bind(contact.postal_code.trim())
  .bind(contact.phone.trim())
  .fetch_one(&mut *tx)
  .await?;

  let mut items = Vec::with_capacity(order.order_items.len());
  for item in &order.order_items {
    let row = sqlx::query_as::<_, OrderItemRow>(&format!(
      "INSERT INTO order_items (id, order_id, product_id, quantity, price_snapshot, name, image_url) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
      ORDER_ITEM_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(order_row.id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.price_snapshot)
    .bind(&item.name)
    .bind(&item.image_url)
    .fetch_one(&mut *tx)
    .await?;
    items.push(row);

    sqlx::query("UPDATE products SET times_ordered = times_ordered + $2 WHERE id = $1")
      .bind(item.product_id)
      .bind(item.quantity)
      .execute(&mut *tx)
      .await?;
  }

  sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = ANY($2)")
    .bind(user_id)
    .bind(&product_ids)
    .execute(&mut *tx)
    .await?;
  tx.commit().await?;

  info!(order_id = %order_row.id, total = %order_row.total_amount, "Order placed.");
  Ok(order_row.into_order(&items))
}

/// 404 when absent, 403 when the order belongs to someone else.
#[instrument(name = "order_service::delete_for_user", skip(pool))]
pub async fn delete_for_user(pool: &PgPool, user_id: Uuid, order_id: Uuid) -> Result<()> {
  let owner: Option<Uuid> = sqlx::query_scalar("SELECT user_id FROM orders WHERE id = $1")
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
  match owner {
    None => Err(AppError::NotFound("Order not found".to_string())),
    Some(owner) if owner != user_id => Err(AppError::Forbidden("Not authorized to delete this order".to_string())),
    Some(_) => {
      sqlx::query("DELETE FROM orders WHERE id = $1").bind(order_id).execute(pool).await?;
      Ok(())
    }
  }
}

// --- Back-office ---

pub async fn list_all(pool: &PgPool) -> Result<Vec<Order>> {
  let rows = sqlx::query_as::<_, OrderRow>(&format!("SELECT {} FROM orders ORDER BY created_at DESC, id", ORDER_COLUMNS))
    .fetch_all(pool)
    .await?;
  attach_items(pool, rows).await
}

pub async fn get_any(pool: &PgPool, order_id: Uuid) -> Result<Option<Order>> {
  let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
  Ok(attach_items(pool, row.into_iter().collect()).await?.pop())
}

/// Moves an order to `status`; an actual change notifies the owner in the
/// same transaction.
#[instrument(name = "order_service::update_status", skip(pool))]
pub async fn update_status(pool: &PgPool, order_id: Uuid, status: OrderStatus) -> Result<Option<Order>> {
  let mut tx = pool.begin().await?;
  let current: Option<(Uuid, DbOrderStatus)> =
    sqlx::query_as("SELECT user_id, status FROM orders WHERE id = $1 FOR UPDATE")
      .bind(order_id)
      .fetch_optional(&mut *tx)
      .await?;
  let Some((owner, old_status)) = current else {
    return Ok(None);
  };

  let old_status = OrderStatus::from(old_status);
  if old_status != status {
    sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
      .bind(order_id)
      .bind(DbOrderStatus::from(status))
      .execute(&mut *tx)
      .await?;
    notification_service::order_status_changed(&mut *tx, owner, order_id, old_status, status).await?;
    info!(%order_id, from = %old_status, to = %status, "Order status changed.");
  }
  tx.commit().await?;

  get_any(pool, order_id).await
}

/// Replaces the order's items and total and tells the owner, all in one
/// transaction. `Ok(None)` when the order does not exist.
#[instrument(name = "order_service::edit", skip(pool, edit), fields(items = edit.order_items.len()))]
pub async fn edit(pool: &PgPool, order_id: Uuid, edit: &OrderEdit) -> Result<Option<Order>> {
  edit.validate()?;

  let mut tx = pool.begin().await?;
  let owner: Option<Uuid> = sqlx::query_scalar("SELECT user_id FROM orders WHERE id = $1 FOR UPDATE")
    .bind(order_id)
    .fetch_optional(&mut *tx)
    .await?;
  let Some(owner) = owner else {
    return Ok(None);
  };

  sqlx::query("DELETE FROM order_items WHERE order_id = $1")
    .bind(order_id)
    .execute(&mut *tx)
    .await?;
  for item in &edit.order_items {
    sqlx::query(
      "INSERT INTO order_items (id, order_id, product_id, quantity, price_snapshot, name, image_url) VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(Uuid::new_v4())
    .bind(order_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.price_snapshot)
    .bind(&item.name)
    .bind(&item.image_url)
    .execute(&mut *tx)
    .await?;
  }
  sqlx::query("UPDATE orders SET total_amount = $2 WHERE id = $1")
    .bind(order_id)
    .bind(round_money(edit.total_amount))
    .execute(&mut *tx)
    .await?;
  notification_service::order_edited(&mut *tx, owner, order_id).await?;
  tx.commit().await?;

  info!(%order_id, "Order items edited.");
  get_any(pool, order_id).await
}

pub async fn delete_any(pool: &PgPool, order_id: Uuid) -> Result<bool> {
  let result = sqlx::query("DELETE FROM orders WHERE id = $1").bind(order_id).execute(pool).await?;
  Ok(result.rows_affected() > 0)
}
