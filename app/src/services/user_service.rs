// app/src/services/user_service.rs

//! Back-office user management.

use sqlx::PgPool;
use storefront_core::model::{AdminUser, NewUser, UserUpdate};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::user::ADMIN_USER_SELECT;
use crate::models::AdminUserRow;
use crate::services::auth_service::{self, normalize_email};

pub async fn list(pool: &PgPool) -> Result<Vec<AdminUser>> {
  let rows = sqlx::query_as::<_, AdminUserRow>(&format!("{} ORDER BY u.created_at DESC, u.id", ADMIN_USER_SELECT))
    .fetch_all(pool)
    .await?;
  Ok(rows.into_iter().map(AdminUser::from).collect())
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<AdminUser>> {
  let row = sqlx::query_as::<_, AdminUserRow>(&format!("{} WHERE u.id = $1", ADMIN_USER_SELECT))
    .bind(id)
    .fetch_optional(pool)
    .await?;
  Ok(row.map(AdminUser::from))
}

#[instrument(name = "user_service::create", skip(pool, payload), fields(email = %payload.email))]
pub async fn create(pool: &PgPool, payload: &NewUser) -> Result<AdminUser> {
  payload.validate()?;
  let row = auth_service::create_profile(
    pool,
    &payload.email,
    &payload.password,
    payload.full_name.as_deref(),
    payload.is_admin,
  )
  .await?;
  info!(user_id = %row.id, is_admin = row.is_admin, "User created from back-office.");
  get(pool, row.id)
    .await?
    .ok_or_else(|| AppError::Internal(format!("User {} vanished after insert", row.id)))
}

#[instrument(name = "user_service::update", skip(pool, patch))]
pub async fn update(pool: &PgPool, id: Uuid, patch: &UserUpdate) -> Result<Option<AdminUser>> {
  patch.validate()?;
  let password_hash = patch
    .password
    .as_deref()
    .map(auth_service::hash_password)
    .transpose()?;
  let updated: Option<Uuid> = sqlx::query_scalar(
    r#"
    UPDATE profiles
    SET email = COALESCE($2, email),
        full_name = COALESCE($3, full_name),
        is_admin = COALESCE($4, is_admin),
        password_hash = COALESCE($5, password_hash)
    WHERE id = $1
    RETURNING id
    "#,
  )
  .bind(id)
  .bind(patch.email.as_deref().map(normalize_email))
  .bind(&patch.full_name)
  .bind(patch.is_admin)
  .bind(password_hash)
  .fetch_optional(pool)
  .await
  .map_err(|e| AppError::unique_or(e, "Email already registered"))?;
  match updated {
    Some(id) => get(pool, id).await,
    None => Ok(None),
  }
}

/// An admin cannot delete their own account.
#[instrument(name = "user_service::delete", skip(pool))]
pub async fn delete(pool: &PgPool, acting_admin: Uuid, id: Uuid) -> Result<bool> {
  if acting_admin == id {
    return Err(AppError::invalid("id", "You cannot delete your own account."));
  }
  let result = sqlx::query("DELETE FROM profiles WHERE id = $1").bind(id).execute(pool).await?;
  Ok(result.rows_affected() > 0)
}
