// app/src/services/notification_service.rs

use sqlx::{PgExecutor, PgPool};
use storefront_core::model::{Notification, OrderStatus};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::notification::NOTIFICATION_COLUMNS;
use crate::models::NotificationRow;

pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 200;
pub const ORDER_STATUS_KIND: &str = "order_status";

/// Stores a notification for `user_id`; runs inside the caller's transaction
/// when given one.
pub async fn create<'e, E>(
  executor: E,
  user_id: Uuid,
  title: &str,
  message: &str,
  kind: &str,
  data: serde_json::Value,
) -> Result<Notification>
where
  E: PgExecutor<'e>,
{
  let row = sqlx::query_as::<_, NotificationRow>(&format!(
    "INSERT INTO notifications (id, user_id, title, message, kind, notification_data) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
    NOTIFICATION_COLUMNS
  ))
  .bind(Uuid::new_v4())
  .bind(user_id)
  .bind(title)
  .bind(message)
  .bind(kind)
  .bind(data)
  .fetch_one(executor)
  .await?;
  Ok(row.into())
}

/// Tells an order's owner that its status moved.
pub async fn order_status_changed<'e, E>(
  executor: E,
  user_id: Uuid,
  order_id: Uuid,
  old_status: OrderStatus,
  new_status: OrderStatus,
) -> Result<Notification>
where
  E: PgExecutor<'e>,
{
  create(
    executor,
    user_id,
    "Order status update",
    new_status.customer_message(),
    ORDER_STATUS_KIND,
    serde_json::json!({
      "orderId": order_id,
      "oldStatus": old_status,
      "newStatus": new_status,
    }),
  )
  .await
}

/// Tells an order's owner that the back-office changed its items.
pub async fn order_edited<'e, E>(executor: E, user_id: Uuid, order_id: Uuid) -> Result<Notification>
where
  E: PgExecutor<'e>,
{
  create(
    executor,
    user_id,
    "Order updated",
    "The items in your order were changed by the shop.",
    ORDER_STATUS_KIND,
    serde_json::json!({ "orderId": order_id, "action": "order_edited" }),
  )
  .await
}

/// Creates the same notification for every administrator.
pub async fn notify_admins(
  conn: &mut sqlx::PgConnection,
  title: &str,
  message: &str,
  kind: &str,
  data: serde_json::Value,
) -> Result<usize> {
  let admins: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM profiles WHERE is_admin")
    .fetch_all(&mut *conn)
    .await?;
  for admin in &admins {
    create(&mut *conn, *admin, title, message, kind, data.clone()).await?;
  }
  Ok(admins.len())
}

#[instrument(name = "notification_service::list", skip(pool))]
pub async fn list(pool: &PgPool, user_id: Uuid, unread_only: bool, limit: Option<u32>) -> Result<Vec<Notification>> {
  let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
  let rows = sqlx::query_as::<_, NotificationRow>(&format!(
    "SELECT {} FROM notifications WHERE user_id = $1 AND (NOT $2 OR NOT is_read) ORDER BY created_at DESC LIMIT $3",
    NOTIFICATION_COLUMNS
  ))
  .bind(user_id)
  .bind(unread_only)
  .bind(i64::from(limit))
  .fetch_all(pool)
  .await?;
  Ok(rows.into_iter().map(Notification::from).collect())
}

/// `Ok(None)` when the notification is absent or belongs to someone else.
pub async fn mark(pool: &PgPool, user_id: Uuid, id: Uuid, is_read: bool) -> Result<Option<Notification>> {
  let row = sqlx::query_as::<_, NotificationRow>(&format!(
    "UPDATE notifications SET is_read = $3 WHERE id = $1 AND user_id = $2 RETURNING {}",
    NOTIFICATION_COLUMNS
  ))
  .bind(id)
  .bind(user_id)
  .bind(is_read)
  .fetch_optional(pool)
  .await?;
  Ok(row.map(Notification::from))
}

pub async fn mark_all_read(pool: &PgPool, user_id: Uuid) -> Result<u64> {
  let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read")
    .bind(user_id)
    .execute(pool)
    .await?;
  Ok(result.rows_affected())
}

pub async fn unread_count(pool: &PgPool, user_id: Uuid) -> Result<i64> {
  let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read")
    .bind(user_id)
    .fetch_one(pool)
    .await?;
  Ok(count)
}
