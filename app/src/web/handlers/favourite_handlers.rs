// app/src/web/handlers/favourite_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::favourite_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavouritePayload {
  pub product_id: Uuid,
}

#[instrument(name = "handler::list_favourites", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_favourites_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let favourites = favourite_service::list(&app_state.db_pool, auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(favourites))
}

#[instrument(
  name = "handler::add_favourite",
  skip(app_state, req_payload, auth_user),
  fields(user_id = %auth_user.user_id, product_id = %req_payload.product_id)
)]
pub async fn add_favourite_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<FavouritePayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let favourite = favourite_service::add(&app_state.db_pool, auth_user.user_id, req_payload.product_id).await?;
  Ok(HttpResponse::Created().json(favourite))
}

#[instrument(name = "handler::remove_favourite", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn remove_favourite_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  favourite_service::remove(&app_state.db_pool, auth_user.user_id, path.into_inner()).await?;
  Ok(HttpResponse::NoContent().finish())
}
