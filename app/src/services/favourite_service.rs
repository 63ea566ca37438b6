// app/src/services/favourite_service.rs

use sqlx::PgPool;
use storefront_core::model::Favourite;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::product::{PRODUCT_COLUMNS, PRODUCT_JOIN};
use crate::models::FavouriteRow;

fn select_favourites(filter: &str) -> String {
  format!(
    "SELECT f.id AS favourite_id, f.user_id, {} FROM favourites f JOIN {} ON p.id = f.product_id {}",
    PRODUCT_COLUMNS, PRODUCT_JOIN, filter
  )
}

#[instrument(name = "favourite_service::list", skip(pool))]
pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<Favourite>> {
  let rows = sqlx::query_as::<_, FavouriteRow>(&select_favourites("WHERE f.user_id = $1 ORDER BY f.created_at DESC"))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
  Ok(rows.into_iter().map(Favourite::from).collect())
}

/// Conflict when the product is already a favourite.
#[instrument(name = "favourite_service::add", skip(pool))]
pub async fn add(pool: &PgPool, user_id: Uuid, product_id: Uuid) -> Result<Favourite> {
  let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
    .bind(product_id)
    .fetch_one(pool)
    .await?;
  if !exists {
    return Err(AppError::NotFound("Product not found".to_string()));
  }

  let id: Uuid = sqlx::query_scalar("INSERT INTO favourites (id, user_id, product_id) VALUES ($1, $2, $3) RETURNING id")
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(product_id)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::unique_or(e, "Product already in favourites"))?;

  let row = sqlx::query_as::<_, FavouriteRow>(&select_favourites("WHERE f.id = $1"))
    .bind(id)
    .fetch_one(pool)
    .await?;
  Ok(row.into())
}

#[instrument(name = "favourite_service::remove", skip(pool))]
pub async fn remove(pool: &PgPool, user_id: Uuid, product_id: Uuid) -> Result<()> {
  let result = sqlx::query("DELETE FROM favourites WHERE user_id = $1 AND product_id = $2")
    .bind(user_id)
    .bind(product_id)
    .execute(pool)
    .await?;
  if result.rows_affected() == 0 {
    return Err(AppError::NotFound("Product not found in favourites".to_string()));
  }
  Ok(())
}
