// core/src/model/chat.rs

//! Support chat between a customer and the shop's administrators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FieldErrors, StoreResult};

pub const MAX_MESSAGE_LEN: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
  pub id: Uuid,
  pub chat_id: Uuid,
  pub sender_id: Uuid,
  pub message: String,
  pub is_from_admin: bool,
  pub is_read: bool,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub sender_name: Option<String>,
  #[serde(default)]
  pub sender_email: Option<String>,
}

/// One customer's conversation. Lists carry only `last_message`; a single
/// chat carries every message, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
  pub id: Uuid,
  pub user_id: Uuid,
  pub is_active: bool,
  /// Admin messages the customer has not seen yet.
  pub unread_count: i32,
  pub last_message_at: DateTime<Utc>,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub user_name: Option<String>,
  #[serde(default)]
  pub user_email: Option<String>,
  #[serde(default)]
  pub last_message: Option<ChatMessage>,
  #[serde(default)]
  pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageSend {
  pub message: String,
}

impl ChatMessageSend {
  pub fn validate(&self) -> StoreResult<()> {
    let mut errors = FieldErrors::new();
    let len = self.message.trim().chars().count();
    if len == 0 {
      errors.add("message", "Message cannot be empty.");
    } else if len > MAX_MESSAGE_LEN {
      errors.add("message", format!("Message must be at most {} characters.", MAX_MESSAGE_LEN));
    }
    errors.into_result()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_and_oversized_messages_are_rejected() {
    let blank = ChatMessageSend { message: "   ".into() };
    assert!(blank.validate().is_err());
    let long = ChatMessageSend {
      message: "a".repeat(MAX_MESSAGE_LEN + 1),
    };
    assert!(long.validate().is_err());
    let ok = ChatMessageSend {
      message: "Do you ship to Tver?".into(),
    };
    assert!(ok.validate().is_ok());
  }

  #[test]
  fn chat_reads_without_messages() {
    let json = serde_json::json!({
      "id": Uuid::nil(),
      "userId": Uuid::nil(),
      "isActive": true,
      "unreadCount": 2,
      "lastMessageAt": "2026-05-01T10:00:00Z",
      "createdAt": "2026-05-01T09:00:00Z",
    });
    let chat: Chat = serde_json::from_value(json).unwrap();
    assert_eq!(chat.unread_count, 2);
    assert!(chat.messages.is_empty());
    assert!(chat.last_message.is_none());
  }
}
