// app/src/web/handlers/chat_handlers.rs

use actix_web::{web, HttpResponse};
use storefront_core::model::ChatMessageSend;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::chat_service::{self, Participant};
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser};

fn participant(user: &AuthenticatedUser) -> Participant {
  Participant {
    user_id: user.user_id,
    is_admin: user.is_admin,
  }
}

#[instrument(name = "handler::list_chats", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_chats_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let chats = chat_service::list_for_user(&app_state.db_pool, auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(chats))
}

#[instrument(name = "handler::open_chat", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn open_chat_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let chat = chat_service::open(&app_state.db_pool, auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(chat))
}

#[instrument(name = "handler::get_chat", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_chat_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let chat_id = path.into_inner();
  chat_service::get(&app_state.db_pool, participant(&auth_user), chat_id)
    .await?
    .map(|chat| HttpResponse::Ok().json(chat))
    .ok_or_else(|| AppError::NotFound(format!("Chat {} not found", chat_id)))
}

#[instrument(name = "handler::send_chat_message", skip(app_state, req_payload, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn send_message_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<ChatMessageSend>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let message = chat_service::send(&app_state.db_pool, participant(&auth_user), path.into_inner(), &req_payload).await?;
  Ok(HttpResponse::Created().json(message))
}

#[instrument(name = "handler::admin::list_chats", skip(app_state, _admin))]
pub async fn admin_list_chats_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(chat_service::list_active(&app_state.db_pool).await?))
}
