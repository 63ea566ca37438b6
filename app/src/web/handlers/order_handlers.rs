// app/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use storefront_core::model::{NewOrder, OrderDelete};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::order_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::list_orders", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = order_service::list_for_user(&app_state.db_pool, auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::get_order", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  order_service::get_for_user(&app_state.db_pool, auth_user.user_id, path.into_inner())
    .await?
    .map(|o| HttpResponse::Ok().json(o))
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

#[instrument(name = "handler::place_order", skip(app_state, req_payload, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<NewOrder>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order = order_service::place(&app_state.db_pool, auth_user.user_id, &req_payload).await?;
  Ok(HttpResponse::Created().json(order))
}

#[instrument(
  name = "handler::delete_order",
  skip(app_state, req_payload, auth_user),
  fields(user_id = %auth_user.user_id, order_id = %req_payload.order_id)
)]
pub async fn delete_order_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<OrderDelete>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  order_service::delete_for_user(&app_state.db_pool, auth_user.user_id, req_payload.order_id).await?;
  Ok(HttpResponse::NoContent().finish())
}
