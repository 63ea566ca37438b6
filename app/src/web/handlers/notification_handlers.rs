// app/src/web/handlers/notification_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use storefront_core::model::{NotificationUpdate, UnreadCount};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::notification_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
  #[serde(default)]
  pub unread_only: bool,
  pub limit: Option<u32>,
}

#[instrument(name = "handler::list_notifications", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_notifications_handler(
  app_state: web::Data<AppState>,
  query: web::Query<NotificationQuery>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let notifications =
    notification_service::list(&app_state.db_pool, auth_user.user_id, query.unread_only, query.limit).await?;
  Ok(HttpResponse::Ok().json(notifications))
}

#[instrument(name = "handler::mark_notification", skip(app_state, req_payload, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn mark_notification_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<NotificationUpdate>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  notification_service::mark(&app_state.db_pool, auth_user.user_id, path.into_inner(), req_payload.is_read)
    .await?
    .map(|n| HttpResponse::Ok().json(n))
    .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))
}

#[instrument(name = "handler::mark_all_notifications", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn mark_all_read_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let updated = notification_service::mark_all_read(&app_state.db_pool, auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "updated": updated })))
}

#[instrument(name = "handler::unread_notifications", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn unread_count_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let unread_count = notification_service::unread_count(&app_state.db_pool, auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(UnreadCount { unread_count }))
}
