// app/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use storefront_core::model::{AddToCartRequest, CartMergeRequest, UpdateQuantityRequest};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::cart_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::get_cart", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let lines = cart_service::fetch(&app_state.db_pool, auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(lines))
}

#[instrument(
  name = "handler::add_to_cart",
  skip(app_state, req_payload, auth_user),
  fields(user_id = %auth_user.user_id, product_id = %req_payload.product_id, quantity = %req_payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<AddToCartRequest>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let line = cart_service::add(
    &app_state.db_pool,
    auth_user.user_id,
    req_payload.product_id,
    req_payload.quantity,
  )
  .await?;
  info!(quantity = line.quantity, "Cart line upserted.");
  Ok(HttpResponse::Created().json(line))
}

/// A quantity of zero or less removes the line and answers 204.
#[instrument(name = "handler::update_cart_item", skip(app_state, req_payload, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn update_cart_item_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<UpdateQuantityRequest>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let line = cart_service::set_quantity(
    &app_state.db_pool,
    auth_user.user_id,
    path.into_inner(),
    req_payload.quantity,
  )
  .await?;
  Ok(match line {
    Some(line) => HttpResponse::Ok().json(line),
    None => HttpResponse::NoContent().finish(),
  })
}

#[instrument(name = "handler::remove_cart_item", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn remove_cart_item_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  cart_service::remove(&app_state.db_pool, auth_user.user_id, path.into_inner()).await?;
  Ok(HttpResponse::NoContent().finish())
}

#[instrument(name = "handler::clear_cart", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn clear_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let removed = cart_service::clear(&app_state.db_pool, auth_user.user_id).await?;
  info!(removed, "Cart cleared.");
  Ok(HttpResponse::NoContent().finish())
}

#[instrument(
  name = "handler::merge_cart",
  skip(app_state, req_payload, auth_user),
  fields(user_id = %auth_user.user_id, items = req_payload.local_cart.len())
)]
pub async fn merge_cart_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<CartMergeRequest>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let lines = cart_service::merge(&app_state.db_pool, auth_user.user_id, &req_payload.local_cart).await?;
  Ok(HttpResponse::Ok().json(lines))
}
