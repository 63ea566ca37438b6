// app/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use storefront_core::{FieldErrors, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(FieldErrors),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// A validation failure on a single field.
  pub fn invalid(field: &str, message: impl Into<String>) -> Self {
    AppError::Validation(FieldErrors::single(field, message))
  }

  /// A unique-constraint violation becomes a conflict carrying `message`.
  pub fn unique_or(err: sqlx::Error, message: &str) -> Self {
    match err {
      sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(message.to_string()),
      other => AppError::Sqlx(other),
    }
  }

  fn is_unique_violation(&self) -> bool {
    matches!(self, AppError::Sqlx(sqlx::Error::Database(db)) if db.is_unique_violation())
  }

  fn is_foreign_key_violation(&self) -> bool {
    matches!(self, AppError::Sqlx(sqlx::Error::Database(db)) if db.is_foreign_key_violation())
  }
}

impl From<StoreError> for AppError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::Validation(fields) => AppError::Validation(fields),
      StoreError::NotFound(m) => AppError::NotFound(m),
      StoreError::Unauthorized(m) => AppError::Auth(m),
      StoreError::Forbidden(m) => AppError::Forbidden(m),
      StoreError::Conflict(m) => AppError::Conflict(m),
      other => AppError::Internal(other.to_string()),
    }
  }
}

// Startup helpers (seeding, migrations) work with anyhow; keep database
// failures recognisable when they surface here.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(err) => AppError::Internal(format!("{:#}", err)),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Sqlx(_) if self.is_unique_violation() || self.is_foreign_key_violation() => StatusCode::CONFLICT,
      AppError::Sqlx(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Request rejected");
    }
    let body = match self {
      AppError::Validation(fields) => json!({"error": "Validation failed", "fields": fields}),
      AppError::Auth(m) | AppError::Forbidden(m) | AppError::NotFound(m) | AppError::Conflict(m) => json!({"error": m}),
      AppError::Sqlx(_) if self.is_unique_violation() => json!({"error": "Resource already exists"}),
      AppError::Sqlx(_) if self.is_foreign_key_violation() => {
        json!({"error": "Resource is still referenced by other records"})
      }
      AppError::Sqlx(sqlx::Error::RowNotFound) => json!({"error": "Resource not found"}),
      AppError::Sqlx(_) => json!({"error": "Database operation failed"}),
      AppError::Config(_) => json!({"error": "Configuration issue"}),
      AppError::Internal(_) => json!({"error": "An internal error occurred"}),
    };
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::body::to_bytes;

  async fn body_of(err: AppError) -> serde_json::Value {
    let response = err.error_response();
    let bytes = to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  #[test]
  fn store_errors_keep_their_status() {
    let cases = [
      (StoreError::NotFound("x".into()), StatusCode::NOT_FOUND),
      (StoreError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
      (StoreError::Forbidden("x".into()), StatusCode::FORBIDDEN),
      (StoreError::Conflict("x".into()), StatusCode::CONFLICT),
      (StoreError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (store_err, expected) in cases {
      assert_eq!(AppError::from(store_err).status_code(), expected);
    }
  }

  #[test]
  fn missing_row_is_not_found() {
    assert_eq!(AppError::Sqlx(sqlx::Error::RowNotFound).status_code(), StatusCode::NOT_FOUND);
  }

  #[test]
  fn anyhow_wrapping_sqlx_is_unwrapped() {
    let err = AppError::from(anyhow::Error::new(sqlx::Error::RowNotFound));
    assert!(matches!(err, AppError::Sqlx(sqlx::Error::RowNotFound)));
    let err = AppError::from(anyhow::anyhow!("seed file unreadable"));
    assert!(matches!(err, AppError::Internal(_)));
  }

  #[actix_web::test]
  async fn validation_body_carries_field_map() {
    let body = body_of(AppError::invalid("quantity", "Quantity must be at least 1.")).await;
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["fields"]["quantity"], "Quantity must be at least 1.");
  }

  #[actix_web::test]
  async fn internal_details_are_not_leaked() {
    let body = body_of(AppError::Internal("connection string postgres://secret".into())).await;
    assert_eq!(body["error"], "An internal error occurred");
    assert!(body.get("detail").is_none());
  }
}
