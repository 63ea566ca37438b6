// app/src/services/auth_service.rs

//! Accounts: password hashing, sign-up, sign-in and password changes.

use crate::errors::{AppError, Result};
use crate::models::user::ProfileRow;
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use sqlx::PgPool;
use storefront_core::model::{PasswordReset, PasswordUpdate, SignIn, SignUp, UserProfile};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::services::token_service::{hash_fingerprint, TokenKeys};

/// Hashes a plain-text password using Argon2 with a fresh random salt.
#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String> {
  if password.is_empty() {
    return Err(AppError::invalid("password", "Password cannot be empty."));
  }

  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|argon_err| {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      AppError::Internal(format!("Password hashing process failed: {}", argon_err))
    })
}

/// `Ok(false)` on a mismatch; a malformed stored hash is an internal error.
#[instrument(name = "auth_service::verify_password", skip(stored_hash, provided_password), err(Display))]
pub fn verify_password(stored_hash: &str, provided_password: &str) -> Result<bool> {
  if provided_password.is_empty() {
    return Ok(false);
  }
  let parsed_hash = PasswordHash::new(stored_hash).map_err(|parse_err| {
    error!(error = %parse_err, "Failed to parse stored password hash string.");
    AppError::Internal(format!("Invalid stored password hash format: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password verification failed: Passwords do not match.");
      Ok(false)
    }
    Err(other) => {
      error!(error = %other, "Argon2 password verification process encountered an error.");
      Err(AppError::Internal(format!("Password verification process failed: {}", other)))
    }
  }
}

pub(crate) fn normalize_email(email: &str) -> String {
  email.trim().to_lowercase()
}

/// Inserts a profile row. A taken email is a conflict.
pub async fn create_profile(
  pool: &PgPool,
  email: &str,
  password: &str,
  full_name: Option<&str>,
  is_admin: bool,
) -> Result<ProfileRow> {
  let password_hash = hash_password(password)?;
  sqlx::query_as::<_, ProfileRow>(
    r#"
    INSERT INTO profiles (id, email, password_hash, full_name, is_admin)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, email, password_hash, full_name, is_admin, created_at
    "#,
  )
  .bind(Uuid::new_v4())
  .bind(normalize_email(email))
  .bind(password_hash)
  .bind(full_name.map(str::trim).filter(|n| !n.is_empty()))
  .bind(is_admin)
  .fetch_one(pool)
  .await
  .map_err(|e| AppError::unique_or(e, "Email already registered"))
}

#[instrument(name = "auth_service::sign_up", skip(pool, form), fields(email = %form.email))]
pub async fn sign_up(pool: &PgPool, form: &SignUp) -> Result<UserProfile> {
  form.validate()?;
  let row = create_profile(pool, &form.email, &form.password, form.full_name.as_deref(), false).await?;
  info!(user_id = %row.id, "New account created.");
  Ok(row.into_profile())
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<ProfileRow>> {
  let row = sqlx::query_as::<_, ProfileRow>(
    "SELECT id, email, password_hash, full_name, is_admin, created_at FROM profiles WHERE email = $1",
  )
  .bind(normalize_email(email))
  .fetch_optional(pool)
  .await?;
  Ok(row)
}

pub async fn find_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<ProfileRow>> {
  let row = sqlx::query_as::<_, ProfileRow>(
    "SELECT id, email, password_hash, full_name, is_admin, created_at FROM profiles WHERE id = $1",
  )
  .bind(user_id)
  .fetch_optional(pool)
  .await?;
  Ok(row)
}

/// Unknown email and wrong password answer the same way.
#[instrument(name = "auth_service::sign_in", skip(pool, credentials), fields(email = %credentials.email))]
pub async fn sign_in(pool: &PgPool, credentials: &SignIn) -> Result<UserProfile> {
  let rejected = || AppError::Auth("Invalid email or password".to_string());
  let Some(row) = find_by_email(pool, &credentials.email).await? else {
    warn!("Sign-in for unknown email.");
    return Err(rejected());
  };
  if !verify_password(&row.password_hash, &credentials.password)? {
    warn!(user_id = %row.id, "Sign-in with wrong password.");
    return Err(rejected());
  }
  Ok(row.into_profile())
}

async fn store_password(pool: &PgPool, user_id: Uuid, password: &str) -> Result<()> {
  let password_hash = hash_password(password)?;
  sqlx::query("UPDATE profiles SET password_hash = $2 WHERE id = $1")
    .bind(user_id)
    .bind(password_hash)
    .execute(pool)
    .await?;
  Ok(())
}

/// Changes a signed-in user's password after checking the current one.
#[instrument(name = "auth_service::update_password", skip(pool, form))]
pub async fn update_password(pool: &PgPool, user_id: Uuid, form: &PasswordUpdate) -> Result<()> {
  form.validate()?;
  let row = find_by_id(pool, user_id)
    .await?
    .ok_or_else(|| AppError::Auth("Account no longer exists".to_string()))?;
  if !verify_password(&row.password_hash, &form.current_password)? {
    warn!(%user_id, "Password change with wrong current password.");
    return Err(AppError::invalid("currentPassword", "Current password is incorrect."));
  }
  store_password(pool, user_id, &form.password).await?;
  info!(%user_id, "Password changed.");
  Ok(())
}

/// Issues a reset link for `email`. Unknown addresses get `Ok(None)` so the
/// caller can answer the same way for both.
#[instrument(name = "auth_service::request_password_reset", skip(pool, tokens))]
pub async fn request_password_reset(pool: &PgPool, tokens: &TokenKeys, email: &str) -> Result<Option<String>> {
  let Some(row) = find_by_email(pool, email).await? else {
    debug!("Password reset for unknown email.");
    return Ok(None);
  };
  tokens.issue_reset(row.id, &row.password_hash).map(Some)
}

/// Sets a new password from a reset link. A link works once: the new hash
/// no longer matches the one it was issued against.
#[instrument(name = "auth_service::reset_password", skip(pool, tokens, form))]
pub async fn reset_password(pool: &PgPool, tokens: &TokenKeys, form: &PasswordReset) -> Result<()> {
  form.validate()?;
  let claims = tokens.verify_reset(&form.token)?;
  let stale = || AppError::invalid("token", "The reset link is invalid or has expired.");
  let row = find_by_id(pool, claims.sub).await?.ok_or_else(stale)?;
  if hash_fingerprint(&row.password_hash) != claims.pwd {
    warn!(user_id = %row.id, "Reset link reused after a password change.");
    return Err(stale());
  }
  store_password(pool, row.id, &form.password).await?;
  info!(user_id = %row.id, "Password reset.");
  Ok(())
}
