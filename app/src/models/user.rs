// app/src/models/user.rs

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use storefront_core::model::{AdminUser, UserProfile};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
  pub id: Uuid,
  pub email: String,
  pub password_hash: String,
  pub full_name: Option<String>,
  pub is_admin: bool,
  pub created_at: DateTime<Utc>,
}

impl ProfileRow {
  /// Drops the password hash.
  pub fn into_profile(self) -> UserProfile {
    UserProfile {
      id: self.id,
      email: self.email,
      full_name: self.full_name,
      is_admin: self.is_admin,
    }
  }
}

/// Profile with activity counters, for the back-office user list.
pub const ADMIN_USER_SELECT: &str = r#"
  SELECT u.id, u.email, u.full_name, u.is_admin, u.created_at,
         (SELECT COUNT(*) FROM orders o WHERE o.user_id = u.id) AS orders_count,
         (SELECT COUNT(*) FROM favourites f WHERE f.user_id = u.id) AS favorites_count,
         (SELECT COUNT(*) FROM cart_items ci WHERE ci.user_id = u.id) AS cart_items_count
  FROM profiles u
"#;

#[derive(Debug, Clone, FromRow)]
pub struct AdminUserRow {
  pub id: Uuid,
  pub email: String,
  pub full_name: Option<String>,
  pub is_admin: bool,
  pub created_at: DateTime<Utc>,
  pub orders_count: i64,
  pub favorites_count: i64,
  pub cart_items_count: i64,
}

impl From<AdminUserRow> for AdminUser {
  fn from(row: AdminUserRow) -> Self {
    AdminUser {
      id: row.id,
      email: row.email,
      full_name: row.full_name,
      is_admin: row.is_admin,
      created_at: Some(row.created_at),
      orders_count: row.orders_count,
      favorites_count: row.favorites_count,
      cart_items_count: row.cart_items_count,
    }
  }
}
