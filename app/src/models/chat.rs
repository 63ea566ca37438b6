// app/src/models/chat.rs

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use storefront_core::model::{Chat, ChatMessage};
use uuid::Uuid;

/// Chat columns plus the owner's name and email, read from [`CHAT_JOIN`].
pub const CHAT_COLUMNS: &str = r#"
  c.id, c.user_id, c.is_active, c.unread_count, c.last_message_at, c.created_at,
  u.full_name AS user_name, u.email AS user_email
"#;

pub const CHAT_JOIN: &str = "chats c JOIN profiles u ON u.id = c.user_id";

/// Message columns plus the sender's name and email, read from
/// [`MESSAGE_JOIN`].
pub const MESSAGE_COLUMNS: &str = r#"
  m.id, m.chat_id, m.sender_id, m.message, m.is_from_admin, m.is_read, m.created_at,
  s.full_name AS sender_name, s.email AS sender_email
"#;

pub const MESSAGE_JOIN: &str = "chat_messages m JOIN profiles s ON s.id = m.sender_id";

#[derive(Debug, Clone, FromRow)]
pub struct ChatRow {
  pub id: Uuid,
  pub user_id: Uuid,
  pub is_active: bool,
  pub unread_count: i32,
  pub last_message_at: DateTime<Utc>,
  pub created_at: DateTime<Utc>,
  pub user_name: Option<String>,
  pub user_email: Option<String>,
}

impl ChatRow {
  pub fn into_chat(self, last_message: Option<ChatMessage>, messages: Vec<ChatMessage>) -> Chat {
    Chat {
      id: self.id,
      user_id: self.user_id,
      is_active: self.is_active,
      unread_count: self.unread_count,
      last_message_at: self.last_message_at,
      created_at: self.created_at,
      user_name: self.user_name,
      user_email: self.user_email,
      last_message,
      messages,
    }
  }
}

#[derive(Debug, Clone, FromRow)]
pub struct ChatMessageRow {
  pub id: Uuid,
  pub chat_id: Uuid,
  pub sender_id: Uuid,
  pub message: String,
  pub is_from_admin: bool,
  pub is_read: bool,
  pub created_at: DateTime<Utc>,
  pub sender_name: Option<String>,
  pub sender_email: Option<String>,
}

impl From<ChatMessageRow> for ChatMessage {
  fn from(row: ChatMessageRow) -> Self {
    ChatMessage {
      id: row.id,
      chat_id: row.chat_id,
      sender_id: row.sender_id,
      message: row.message,
      is_from_admin: row.is_from_admin,
      is_read: row.is_read,
      created_at: row.created_at,
      sender_name: row.sender_name,
      sender_email: row.sender_email,
    }
  }
}
