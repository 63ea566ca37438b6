// core/src/model/mod.rs

//! Wire types shared by the storefront server and its clients.
//!
//! Every type serializes with camelCase field names, matching the JSON the
//! storefront pages exchange with the API.

pub mod cart;
pub mod catalog;
pub mod chat;
pub mod order;
pub mod user;

pub use cart::{AddToCartRequest, CartLine, CartMergeRequest, LocalCartItem, ProductSnapshot, UpdateQuantityRequest};
pub use catalog::{
  Category, CategoryUpdate, NewCategory, NewProduct, Product, ProductOfflineUpdate, ProductQuery, ProductUpdate,
  SortField, SortOrder,
};
pub use chat::{Chat, ChatMessage, ChatMessageSend};
pub use order::{
  NewOrder, NewOrderItem, Order, OrderContact, OrderDelete, OrderEdit, OrderItem, OrderStatus, OrderStatusUpdate,
};
pub use user::{
  AdminUser, AuthToken, Favourite, NewUser, Notification, NotificationUpdate, PasswordReset, PasswordResetRequest,
  PasswordUpdate, SignIn, SignUp, UnreadCount, UserProfile, UserUpdate,
};

use rust_decimal::{Decimal, RoundingStrategy};

/// Slugs are lowercase ASCII words joined by single hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
  !slug.is_empty()
    && !slug.starts_with('-')
    && !slug.ends_with('-')
    && !slug.contains("--")
    && slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// A deliberately loose shape check; the identity provider owns real
/// address verification.
pub fn looks_like_email(email: &str) -> bool {
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Money is kept to two decimal places everywhere it is displayed or stored,
/// rounding half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
  amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slug_rules() {
    assert!(is_valid_slug("ceramic-pot-20cm"));
    assert!(is_valid_slug("seeds"));
    assert!(!is_valid_slug(""));
    assert!(!is_valid_slug("Seeds"));
    assert!(!is_valid_slug("-seeds"));
    assert!(!is_valid_slug("a--b"));
    assert!(!is_valid_slug("pots and pans"));
  }

  #[test]
  fn money_rounds_half_up() {
    assert_eq!(round_money("1.005".parse().unwrap()), "1.01".parse::<Decimal>().unwrap());
    assert_eq!(round_money("2.344".parse().unwrap()), "2.34".parse::<Decimal>().unwrap());
  }

  #[test]
  fn email_shape() {
    assert!(looks_like_email("admin@example.com"));
    assert!(!looks_like_email("admin.example.com"));
    assert!(!looks_like_email("@example.com"));
    assert!(!looks_like_email("admin@localhost"));
  }
}
