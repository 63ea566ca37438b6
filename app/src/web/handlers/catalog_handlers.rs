// app/src/web/handlers/catalog_handlers.rs

//! Public catalog reads plus admin-only category creation.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use storefront_core::model::{NewCategory, ProductQuery};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::catalog_service;
use crate::state::AppState;
use crate::web::extractors::AdminUser;

#[derive(Debug, Deserialize)]
pub struct CategoryFilter {
  pub slug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
  pub limit: Option<u32>,
}

#[instrument(name = "handler::list_categories", skip(app_state))]
pub async fn list_categories_handler(
  app_state: web::Data<AppState>,
  filter: web::Query<CategoryFilter>,
) -> Result<HttpResponse, AppError> {
  let categories = catalog_service::categories(&app_state.db_pool, filter.slug.as_deref()).await?;
  Ok(HttpResponse::Ok().json(categories))
}

#[instrument(name = "handler::create_category", skip(app_state, req_payload, admin), fields(admin_id = %admin.user_id))]
pub async fn create_category_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<NewCategory>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let category = catalog_service::create_category(&app_state.db_pool, &req_payload).await?;
  Ok(HttpResponse::Created().json(category))
}

#[instrument(name = "handler::bestsellers", skip(app_state))]
pub async fn bestsellers_handler(
  app_state: web::Data<AppState>,
  query: web::Query<LimitQuery>,
) -> Result<HttpResponse, AppError> {
  let products = catalog_service::bestsellers(&app_state.db_pool, query.limit).await?;
  Ok(HttpResponse::Ok().json(products))
}

#[instrument(name = "handler::get_product", skip(app_state))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  catalog_service::product(&app_state.db_pool, product_id)
    .await?
    .map(|p| HttpResponse::Ok().json(p))
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))
}

#[instrument(name = "handler::get_product_by_slug", skip(app_state))]
pub async fn get_product_by_slug_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let slug = path.into_inner();
  catalog_service::product_by_slug(&app_state.db_pool, &slug)
    .await?
    .map(|p| HttpResponse::Ok().json(p))
    .ok_or_else(|| AppError::NotFound(format!("Product '{}' not found", slug)))
}

#[instrument(name = "handler::products_in_category", skip(app_state, query))]
pub async fn products_in_category_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  query: web::Query<ProductQuery>,
) -> Result<HttpResponse, AppError> {
  let products = catalog_service::products_in_category(&app_state.db_pool, &path, &query).await?;
  Ok(HttpResponse::Ok().json(products))
}
