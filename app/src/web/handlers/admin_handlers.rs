// app/src/web/handlers/admin_handlers.rs

//! Back-office collections under `/api/admin`. Reads and deletes of absent
//! rows answer 404.

use actix_web::{web, HttpResponse};
use serde::Serialize;
use storefront_core::model::{
  CategoryUpdate, NewCategory, NewProduct, NewUser, OrderEdit, OrderStatusUpdate, ProductOfflineUpdate, ProductUpdate,
  UserUpdate,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::{catalog_service, order_service, user_service};
use crate::state::AppState;
use crate::web::extractors::AdminUser;

fn found<T: Serialize>(entity: Option<T>, what: &str, id: Uuid) -> Result<HttpResponse, AppError> {
  entity
    .map(|e| HttpResponse::Ok().json(e))
    .ok_or_else(|| AppError::NotFound(format!("{} {} not found", what, id)))
}

fn deleted(removed: bool, what: &str, id: Uuid) -> Result<HttpResponse, AppError> {
  if removed {
    info!(%id, "{} deleted.", what);
    Ok(HttpResponse::NoContent().finish())
  } else {
    Err(AppError::NotFound(format!("{} {} not found", what, id)))
  }
}

// --- Categories ---

#[instrument(name = "handler::admin::list_categories", skip(app_state, _admin))]
pub async fn list_categories_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(catalog_service::categories(&app_state.db_pool, None).await?))
}

#[instrument(name = "handler::admin::get_category", skip(app_state, _admin))]
pub async fn get_category_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  found(catalog_service::category(&app_state.db_pool, id).await?, "Category", id)
}

#[instrument(name = "handler::admin::create_category", skip(app_state, req_payload, _admin))]
pub async fn create_category_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<NewCategory>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let category = catalog_service::create_category(&app_state.db_pool, &req_payload).await?;
  Ok(HttpResponse::Created().json(category))
}

#[instrument(name = "handler::admin::update_category", skip(app_state, req_payload, _admin))]
pub async fn update_category_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<CategoryUpdate>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  found(
    catalog_service::update_category(&app_state.db_pool, id, &req_payload).await?,
    "Category",
    id,
  )
}

#[instrument(name = "handler::admin::delete_category", skip(app_state, _admin))]
pub async fn delete_category_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  deleted(catalog_service::delete_category(&app_state.db_pool, id).await?, "Category", id)
}

// --- Products ---

#[instrument(name = "handler::admin::list_products", skip(app_state, _admin))]
pub async fn list_products_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(catalog_service::all_products(&app_state.db_pool).await?))
}

#[instrument(name = "handler::admin::get_product", skip(app_state, _admin))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  found(catalog_service::product(&app_state.db_pool, id).await?, "Product", id)
}

#[instrument(name = "handler::admin::create_product", skip(app_state, req_payload, _admin))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<NewProduct>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let product = catalog_service::create_product(&app_state.db_pool, &req_payload).await?;
  Ok(HttpResponse::Created().json(product))
}

#[instrument(name = "handler::admin::update_product", skip(app_state, req_payload, _admin))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<ProductUpdate>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  found(
    catalog_service::update_product(&app_state.db_pool, id, &req_payload).await?,
    "Product",
    id,
  )
}

#[instrument(name = "handler::admin::set_offline_purchases", skip(app_state, req_payload, _admin))]
pub async fn set_offline_purchases_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<ProductOfflineUpdate>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  found(
    catalog_service::set_offline_purchases(&app_state.db_pool, id, &req_payload).await?,
    "Product",
    id,
  )
}

#[instrument(name = "handler::admin::delete_product", skip(app_state, _admin))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  deleted(catalog_service::delete_product(&app_state.db_pool, id).await?, "Product", id)
}

// --- Users ---

#[instrument(name = "handler::admin::list_users", skip(app_state, _admin))]
pub async fn list_users_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(user_service::list(&app_state.db_pool).await?))
}

#[instrument(name = "handler::admin::get_user", skip(app_state, _admin))]
pub async fn get_user_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  found(user_service::get(&app_state.db_pool, id).await?, "User", id)
}

#[instrument(name = "handler::admin::create_user", skip(app_state, req_payload, _admin))]
pub async fn create_user_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<NewUser>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let user = user_service::create(&app_state.db_pool, &req_payload).await?;
  Ok(HttpResponse::Created().json(user))
}

#[instrument(name = "handler::admin::update_user", skip(app_state, req_payload, _admin))]
pub async fn update_user_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<UserUpdate>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  found(user_service::update(&app_state.db_pool, id, &req_payload).await?, "User", id)
}

#[instrument(name = "handler::admin::delete_user", skip(app_state, admin), fields(admin_id = %admin.user_id))]
pub async fn delete_user_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  deleted(user_service::delete(&app_state.db_pool, admin.user_id, id).await?, "User", id)
}

// --- Orders ---

#[instrument(name = "handler::admin::list_orders", skip(app_state, _admin))]
pub async fn list_orders_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(order_service::list_all(&app_state.db_pool).await?))
}

#[instrument(name = "handler::admin::get_order", skip(app_state, _admin))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  found(order_service::get_any(&app_state.db_pool, id).await?, "Order", id)
}

#[instrument(
  name = "handler::admin::update_order_status",
  skip(app_state, req_payload, _admin),
  fields(status = %req_payload.status)
)]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<OrderStatusUpdate>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  found(
    order_service::update_status(&app_state.db_pool, id, req_payload.status).await?,
    "Order",
    id,
  )
}

#[instrument(name = "handler::admin::edit_order", skip(app_state, req_payload, _admin))]
pub async fn edit_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<OrderEdit>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  found(order_service::edit(&app_state.db_pool, id, &req_payload).await?, "Order", id)
}

#[instrument(name = "handler::admin::delete_order", skip(app_state, _admin))]
pub async fn delete_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  deleted(order_service::delete_any(&app_state.db_pool, id).await?, "Order", id)
}
