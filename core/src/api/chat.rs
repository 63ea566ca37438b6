// core/src/api/chat.rs

//! Support chat. New messages are picked up by polling [`ApiClient::chat`].

use uuid::Uuid;

use super::client::ApiClient;
use crate::error::{or_empty, StoreResult};
use crate::model::{Chat, ChatMessage, ChatMessageSend};

impl ApiClient {
  /// The signed-in user's chats, most recent activity first.
  pub async fn chats(&self) -> Vec<Chat> {
    or_empty("chats", self.try_chats().await)
  }

  pub async fn try_chats(&self) -> StoreResult<Vec<Chat>> {
    self.get("/api/chats").await
  }

  /// The user's active chat, started if there is none yet.
  pub async fn open_chat(&self) -> StoreResult<Chat> {
    self.post("/api/chats", &serde_json::json!({})).await
  }

  /// A chat with all of its messages. Reading it as the customer marks the
  /// shop's replies read.
  pub async fn chat(&self, id: Uuid) -> Option<Chat> {
    or_empty("chat", self.try_chat(id).await)
  }

  pub async fn try_chat(&self, id: Uuid) -> StoreResult<Option<Chat>> {
    self.get_optional(&format!("/api/chats/{}", id)).await
  }

  pub async fn send_chat_message(&self, chat_id: Uuid, message: &str) -> StoreResult<ChatMessage> {
    let body = ChatMessageSend {
      message: message.to_string(),
    };
    body.validate()?;
    self.post(&format!("/api/chats/{}/messages", chat_id), &body).await
  }

  /// Every active chat, for the back-office inbox.
  pub async fn admin_chats(&self) -> Vec<Chat> {
    or_empty("admin_chats", self.try_admin_chats().await)
  }

  pub async fn try_admin_chats(&self) -> StoreResult<Vec<Chat>> {
    self.get("/api/admin/chats").await
  }
}
