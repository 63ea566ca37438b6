// app/src/services/chat_service.rs

//! Support chat. Each customer has at most one active chat; admins read and
//! answer all of them. Every message leaves a notification for the other
//! side, which clients pick up by polling.

use sqlx::PgPool;
use std::collections::HashMap;
use storefront_core::model::{Chat, ChatMessage, ChatMessageSend};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::chat::{CHAT_COLUMNS, CHAT_JOIN, MESSAGE_COLUMNS, MESSAGE_JOIN};
use crate::models::{ChatMessageRow, ChatRow};
use crate::services::notification_service;

pub const CHAT_MESSAGE_KIND: &str = "chat_message";
const PREVIEW_CHARS: usize = 50;

/// Who is reading or writing.
#[derive(Debug, Clone, Copy)]
pub struct Participant {
  pub user_id: Uuid,
  pub is_admin: bool,
}

impl Participant {
  /// Owners and admins see a chat; everyone else gets a 404.
  fn can_see(&self, chat_owner: Uuid) -> bool {
    self.is_admin || self.user_id == chat_owner
  }
}

/// The first few characters of a message, for notification text.
fn preview(message: &str) -> String {
  let mut chars = message.chars();
  let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
  if chars.next().is_some() {
    format!("{}...", head)
  } else {
    head
  }
}

fn chat_not_found(chat_id: Uuid) -> AppError {
  AppError::NotFound(format!("Chat {} not found", chat_id))
}

/// The newest message of each chat.
async fn last_messages(pool: &PgPool, chat_ids: &[Uuid]) -> Result<HashMap<Uuid, ChatMessage>> {
  if chat_ids.is_empty() {
    return Ok(HashMap::new());
  }
  let rows = sqlx::query_as::<_, ChatMessageRow>(&format!(
    "SELECT DISTINCT ON (m.chat_id) {} FROM {} WHERE m.chat_id = ANY($1) ORDER BY m.chat_id, m.created_at DESC, m.id DESC",
    MESSAGE_COLUMNS, MESSAGE_JOIN
  ))
  .bind(chat_ids)
  .fetch_all(pool)
  .await?;
  Ok(rows.into_iter().map(|r| (r.chat_id, ChatMessage::from(r))).collect())
}

async fn with_last_messages(pool: &PgPool, rows: Vec<ChatRow>) -> Result<Vec<Chat>> {
  let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
  let mut last = last_messages(pool, &ids).await?;
  Ok(
    rows
      .into_iter()
      .map(|row| {
        let latest = last.remove(&row.id);
        row.into_chat(latest, Vec::new())
      })
      .collect(),
  )
}

async fn chat_row(pool: &PgPool, chat_id: Uuid) -> Result<Option<ChatRow>> {
  let row = sqlx::query_as::<_, ChatRow>(&format!("SELECT {} FROM {} WHERE c.id = $1", CHAT_COLUMNS, CHAT_JOIN))
    .bind(chat_id)
    .fetch_optional(pool)
    .await?;
  Ok(row)
}

/// The user's chats, most recent activity first.
#[instrument(name = "chat_service::list_for_user", skip(pool))]
pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Chat>> {
  let rows = sqlx::query_as::<_, ChatRow>(&format!(
    "SELECT {} FROM {} WHERE c.user_id = $1 ORDER BY c.last_message_at DESC, c.id",
    CHAT_COLUMNS, CHAT_JOIN
  ))
  .bind(user_id)
  .fetch_all(pool)
  .await?;
  with_last_messages(pool, rows).await
}

/// Every active chat, for the back-office inbox.
#[instrument(name = "chat_service::list_active", skip(pool))]
pub async fn list_active(pool: &PgPool) -> Result<Vec<Chat>> {
  let rows = sqlx::query_as::<_, ChatRow>(&format!(
    "SELECT {} FROM {} WHERE c.is_active ORDER BY c.last_message_at DESC, c.id",
    CHAT_COLUMNS, CHAT_JOIN
  ))
  .fetch_all(pool)
  .await?;
  with_last_messages(pool, rows).await
}

/// The user's active chat, started when there is none.
#[instrument(name = "chat_service::open", skip(pool))]
pub async fn open(pool: &PgPool, user_id: Uuid) -> Result<Chat> {
  let inserted = sqlx::query(
    "INSERT INTO chats (id, user_id) VALUES ($1, $2) ON CONFLICT (user_id) WHERE is_active DO NOTHING",
  )
  .bind(Uuid::new_v4())
  .bind(user_id)
  .execute(pool)
  .await?;
  if inserted.rows_affected() > 0 {
    info!(%user_id, "Support chat started.");
  }

  let row = sqlx::query_as::<_, ChatRow>(&format!(
    "SELECT {} FROM {} WHERE c.user_id = $1 AND c.is_active",
    CHAT_COLUMNS, CHAT_JOIN
  ))
  .bind(user_id)
  .fetch_one(pool)
  .await?;
  let latest = last_messages(pool, &[row.id]).await?.remove(&row.id);
  Ok(row.into_chat(latest, Vec::new()))
}

/// A chat with all its messages, oldest first. A customer reading their own
/// chat marks the admins' replies read.
#[instrument(name = "chat_service::get", skip(pool))]
pub async fn get(pool: &PgPool, viewer: Participant, chat_id: Uuid) -> Result<Option<Chat>> {
  let Some(mut row) = chat_row(pool, chat_id).await? else {
    return Ok(None);
  };
  if !viewer.can_see(row.user_id) {
    return Ok(None);
  }

  if !viewer.is_admin {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE chat_messages SET is_read = TRUE WHERE chat_id = $1 AND is_from_admin AND NOT is_read")
      .bind(chat_id)
      .execute(&mut *tx)
      .await?;
    sqlx::query("UPDATE chats SET unread_count = 0 WHERE id = $1")
      .bind(chat_id)
      .execute(&mut *tx)
      .await?;
    tx.commit().await?;
    row.unread_count = 0;
  }

  let messages: Vec<ChatMessage> = sqlx::query_as::<_, ChatMessageRow>(&format!(
    "SELECT {} FROM {} WHERE m.chat_id = $1 ORDER BY m.created_at, m.id",
    MESSAGE_COLUMNS, MESSAGE_JOIN
  ))
  .bind(chat_id)
  .fetch_all(pool)
  .await?
  .into_iter()
  .map(ChatMessage::from)
  .collect();
  let last = messages.last().cloned();
  Ok(Some(row.into_chat(last, messages)))
}

/// Posts a message and notifies the other side in the same transaction:
/// the customer when an admin answers, every admin when the customer writes.
#[instrument(name = "chat_service::send", skip(pool, payload))]
pub async fn send(pool: &PgPool, sender: Participant, chat_id: Uuid, payload: &ChatMessageSend) -> Result<ChatMessage> {
  payload.validate()?;
  let text = payload.message.trim();

  let mut tx = pool.begin().await?;
  let owner: Option<Uuid> = sqlx::query_scalar("SELECT user_id FROM chats WHERE id = $1 FOR UPDATE")
    .bind(chat_id)
    .fetch_optional(&mut *tx)
    .await?;
  let owner = owner
    .filter(|owner| sender.can_see(*owner))
    .ok_or_else(|| chat_not_found(chat_id))?;

  let message_id = Uuid::new_v4();
  sqlx::query("INSERT INTO chat_messages (id, chat_id, sender_id, message, is_from_admin) VALUES ($1, $2, $3, $4, $5)")
    .bind(message_id)
    .bind(chat_id)
    .bind(sender.user_id)
    .bind(text)
    .bind(sender.is_admin)
    .execute(&mut *tx)
    .await?;
  sqlx::query(
    "UPDATE chats SET last_message_at = NOW(), unread_count = unread_count + CASE WHEN $2 THEN 1 ELSE 0 END WHERE id = $1",
  )
  .bind(chat_id)
  .bind(sender.is_admin)
  .execute(&mut *tx)
  .await?;

  let message: ChatMessage = sqlx::query_as::<_, ChatMessageRow>(&format!(
    "SELECT {} FROM {} WHERE m.id = $1",
    MESSAGE_COLUMNS, MESSAGE_JOIN
  ))
  .bind(message_id)
  .fetch_one(&mut *tx)
  .await?
  .into();

  let sender_name = message
    .sender_name
    .clone()
    .or_else(|| message.sender_email.clone())
    .unwrap_or_default();
  let data = serde_json::json!({
    "chatId": chat_id,
    "messageId": message_id,
    "senderName": sender_name,
  });
  if sender.is_admin {
    notification_service::create(
      &mut *tx,
      owner,
      "New message from support",
      &format!("Support replied in your chat: {}", preview(text)),
      CHAT_MESSAGE_KIND,
      data,
    )
    .await?;
  } else {
    notification_service::notify_admins(
      &mut *tx,
      "New message from a customer",
      &format!("{} wrote: {}", sender_name, preview(text)),
      CHAT_MESSAGE_KIND,
      data,
    )
    .await?;
  }
  tx.commit().await?;

  info!(%chat_id, from_admin = sender.is_admin, "Chat message sent.");
  Ok(message)
}
