// core/src/model/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::Product;
use super::looks_like_email;
use crate::error::{FieldErrors, StoreResult};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  pub id: Uuid,
  pub email: String,
  #[serde(default)]
  pub full_name: Option<String>,
  #[serde(default)]
  pub is_admin: bool,
}

/// A user as listed in the back-office, with activity counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
  pub id: Uuid,
  pub email: String,
  #[serde(default)]
  pub full_name: Option<String>,
  pub is_admin: bool,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub orders_count: i64,
  #[serde(default)]
  pub favorites_count: i64,
  #[serde(default)]
  pub cart_items_count: i64,
}

fn validate_password(errors: &mut FieldErrors, password: &str) {
  let len = password.chars().count();
  if len < MIN_PASSWORD_LEN {
    errors.add("password", format!("Password must be at least {} characters.", MIN_PASSWORD_LEN));
  } else if len > MAX_PASSWORD_LEN {
    errors.add("password", format!("Password must be at most {} characters.", MAX_PASSWORD_LEN));
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
  pub email: String,
  pub password: String,
  #[serde(default)]
  pub full_name: Option<String>,
  #[serde(default)]
  pub is_admin: bool,
}

impl NewUser {
  pub fn validate(&self) -> StoreResult<()> {
    let mut errors = FieldErrors::new();
    if !looks_like_email(self.email.trim()) {
      errors.add("email", "Enter a valid email address.");
    }
    validate_password(&mut errors, &self.password);
    errors.into_result()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub full_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub is_admin: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub password: Option<String>,
}

impl UserUpdate {
  pub fn validate(&self) -> StoreResult<()> {
    let mut errors = FieldErrors::new();
    if matches!(&self.email, Some(email) if !looks_like_email(email.trim())) {
      errors.add("email", "Enter a valid email address.");
    }
    if let Some(password) = &self.password {
      validate_password(&mut errors, password);
    }
    errors.into_result()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUp {
  pub email: String,
  pub password: String,
  pub confirm_password: String,
  #[serde(default)]
  pub full_name: Option<String>,
}

impl SignUp {
  pub fn validate(&self) -> StoreResult<()> {
    let mut errors = FieldErrors::new();
    if !looks_like_email(self.email.trim()) {
      errors.add("email", "Enter a valid email address.");
    }
    validate_password(&mut errors, &self.password);
    if self.password != self.confirm_password {
      errors.add("confirmPassword", "Passwords do not match.");
    }
    errors.into_result()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignIn {
  pub email: String,
  pub password: String,
}

/// Change of password by a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordUpdate {
  pub current_password: String,
  pub password: String,
}

impl PasswordUpdate {
  pub fn validate(&self) -> StoreResult<()> {
    let mut errors = FieldErrors::new();
    if self.current_password.is_empty() {
      errors.add("currentPassword", "Enter your current password.");
    }
    validate_password(&mut errors, &self.password);
    errors.into_result()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
  pub email: String,
}

/// Sets a new password with a reset token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordReset {
  pub token: String,
  pub password: String,
}

impl PasswordReset {
  pub fn validate(&self) -> StoreResult<()> {
    let mut errors = FieldErrors::new();
    if self.token.trim().is_empty() {
      errors.add("token", "The reset link is incomplete.");
    }
    validate_password(&mut errors, &self.password);
    errors.into_result()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
  pub access_token: String,
  pub token_type: String,
  pub user: UserProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favourite {
  pub id: Uuid,
  pub user_id: Uuid,
  pub product_id: Uuid,
  #[serde(default)]
  pub product: Option<Product>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub id: Uuid,
  pub user_id: Uuid,
  pub title: String,
  pub message: String,
  #[serde(rename = "type")]
  pub kind: String,
  pub is_read: bool,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub notification_data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationUpdate {
  pub is_read: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
  pub unread_count: i64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn signup_checks_confirmation_and_length() {
    let form = SignUp {
      email: "new@example.com".into(),
      password: "abc".into(),
      confirm_password: "abd".into(),
      full_name: None,
    };
    match form.validate().unwrap_err() {
      crate::StoreError::Validation(fields) => {
        assert!(fields.get("password").is_some());
        assert!(fields.get("confirmPassword").is_some());
        assert!(fields.get("email").is_none());
      }
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn notification_kind_serializes_as_type() {
    let n = Notification {
      id: Uuid::nil(),
      user_id: Uuid::nil(),
      title: "Order status".into(),
      message: "Shipped".into(),
      kind: "order_status".into(),
      is_read: false,
      created_at: Utc::now(),
      notification_data: serde_json::json!({}),
    };
    let json = serde_json::to_value(&n).unwrap();
    assert_eq!(json["type"], "order_status");
    assert_eq!(json["isRead"], false);
  }

  #[test]
  fn password_update_needs_the_current_password() {
    let form = PasswordUpdate {
      current_password: String::new(),
      password: "short".into(),
    };
    match form.validate().unwrap_err() {
      crate::StoreError::Validation(fields) => {
        assert!(fields.get("currentPassword").is_some());
        assert!(fields.get("password").is_some());
      }
      other => panic!("unexpected {:?}", other),
    }
    let reset = PasswordReset {
      token: "t".into(),
      password: "garden123".into(),
    };
    assert!(reset.validate().is_ok());
  }
}
