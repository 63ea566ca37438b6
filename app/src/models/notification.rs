// app/src/models/notification.rs

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use storefront_core::model::Notification;
use uuid::Uuid;

pub const NOTIFICATION_COLUMNS: &str = "id, user_id, title, message, kind, is_read, created_at, notification_data";

#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
  pub id: Uuid,
  pub user_id: Uuid,
  pub title: String,
  pub message: String,
  pub kind: String,
  pub is_read: bool,
  pub created_at: DateTime<Utc>,
  pub notification_data: serde_json::Value,
}

impl From<NotificationRow> for Notification {
  fn from(row: NotificationRow) -> Self {
    Notification {
      id: row.id,
      user_id: row.user_id,
      title: row.title,
      message: row.message,
      kind: row.kind,
      is_read: row.is_read,
      created_at: row.created_at,
      notification_data: row.notification_data,
    }
  }
}
