// app/src/services/cart_service.rs

//! The signed-in user's server cart. `(user_id, product_id)` is unique, so
//! every write is an upsert keyed on the product.

use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use storefront_core::model::{CartLine, LocalCartItem};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::cart_item::CART_SELECT;
use crate::models::CartItemRow;

/// Upsert that adds to an existing line. A sum past `INTEGER` leaves the
/// line alone and returns no row.
const UPSERT_SUM: &str = r#"
  INSERT INTO cart_items (id, user_id, product_id, quantity, price_snapshot)
  VALUES ($1, $2, $3, $4, $5)
  ON CONFLICT (user_id, product_id) DO UPDATE
  SET quantity = cart_items.quantity + EXCLUDED.quantity,
      price_snapshot = EXCLUDED.price_snapshot
  WHERE cart_items.quantity::bigint + EXCLUDED.quantity <= 2147483647
"#;

fn upsert_add() -> String {
  format!(
    r#"
    WITH upserted AS (
      {} RETURNING id, product_id, quantity, price_snapshot
    )
    SELECT u.id, u.product_id, u.quantity, u.price_snapshot, p.name, p.image_url
    FROM upserted u
    JOIN products p ON p.id = u.product_id
    "#,
    UPSERT_SUM
  )
}

fn positive_quantity(quantity: i64) -> Result<i32> {
  if quantity < 1 {
    return Err(AppError::invalid("quantity", "Quantity must be at least 1."));
  }
  i32::try_from(quantity).map_err(|_| too_large())
}

fn too_large() -> AppError {
  AppError::invalid("quantity", "Quantity is too large.")
}

/// What a line holds after `added` is summed into `existing`.
fn summed_quantity(existing: i32, added: i32) -> Result<i32> {
  existing.checked_add(added).ok_or_else(too_large)
}

async fn line_quantity(pool: &PgPool, user_id: Uuid, product_id: Uuid) -> Result<i32> {
  let quantity: Option<i32> =
    sqlx::query_scalar("SELECT quantity FROM cart_items WHERE user_id = $1 AND product_id = $2")
      .bind(user_id)
      .bind(product_id)
      .fetch_optional(pool)
      .await?;
  Ok(quantity.unwrap_or(0))
}

#[instrument(name = "cart_service::fetch", skip(pool))]
pub async fn fetch(pool: &PgPool, user_id: Uuid) -> Result<Vec<CartLine>> {
  let rows = sqlx::query_as::<_, CartItemRow>(&format!(
    "{} WHERE ci.user_id = $1 ORDER BY ci.added_at, ci.id",
    CART_SELECT
  ))
  .bind(user_id)
  .fetch_all(pool)
  .await?;
  Ok(rows.into_iter().map(CartLine::from).collect())
}

/// Adds to the line for `product_id`, creating it when absent. The line's
/// snapshot moves to the product's current price.
#[instrument(name = "cart_service::add", skip(pool))]
pub async fn add(pool: &PgPool, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartLine> {
  let quantity = positive_quantity(i64::from(quantity))?;
  let price: Option<Decimal> = sqlx::query_scalar("SELECT price FROM products WHERE id = $1")
    .bind(product_id)
    .fetch_optional(pool)
    .await?;
  let Some(price) = price else {
    return Err(AppError::NotFound("Product not found".to_string()));
  };

  summed_quantity(line_quantity(pool, user_id, product_id).await?, quantity)?;

  // The guard in the upsert covers a concurrent add landing in between.
  let row = sqlx::query_as::<_, CartItemRow>(&upsert_add())
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .bind(price)
    .fetch_optional(pool)
    .await?;
  row.map(CartLine::from).ok_or_else(too_large)
}

/// `Ok(None)` when `quantity <= 0` removed the line.
#[instrument(name = "cart_service::set_quantity", skip(pool))]
pub async fn set_quantity(pool: &PgPool, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<Option<CartLine>> {
  if quantity <= 0 {
    remove(pool, user_id, product_id).await?;
    return Ok(None);
  }
  let row = sqlx::query_as::<_, CartItemRow>(
    r#"
    WITH updated AS (
      UPDATE cart_items SET quantity = $3
      WHERE user_id = $1 AND product_id = $2
      RETURNING id, product_id, quantity, price_snapshot
    )
    SELECT u.id, u.product_id, u.quantity, u.price_snapshot, p.name, p.image_url
    FROM updated u
    JOIN products p ON p.id = u.product_id
    "#,
  )
  .bind(user_id)
  .bind(product_id)
  .bind(quantity)
  .fetch_optional(pool)
  .await?;
  row
    .map(|r| Some(r.into()))
    .ok_or_else(|| AppError::NotFound("Cart item not found".to_string()))
}

/// Removing a line that is not there is not an error.
#[instrument(name = "cart_service::remove", skip(pool))]
pub async fn remove(pool: &PgPool, user_id: Uuid, product_id: Uuid) -> Result<()> {
  sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
    .bind(user_id)
    .bind(product_id)
    .execute(pool)
    .await?;
  Ok(())
}

#[instrument(name = "cart_service::clear", skip(pool))]
pub async fn clear(pool: &PgPool, user_id: Uuid) -> Result<u64> {
  let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
    .bind(user_id)
    .execute(pool)
    .await?;
  Ok(result.rows_affected())
}

/// Folds repeated products into one item, keeping the latest snapshot.
pub fn fold_local_items(items: &[LocalCartItem]) -> Result<Vec<LocalCartItem>> {
  let mut folded: Vec<LocalCartItem> = Vec::with_capacity(items.len());
  for item in items {
    if item.quantity == 0 {
      return Err(AppError::invalid("localCart", "Every item needs a quantity of at least 1."));
    }
    match folded.iter_mut().find(|f| f.product_id == item.product_id) {
      Some(existing) => {
        existing.quantity = existing.quantity.saturating_add(item.quantity);
        existing.price_snapshot = item.price_snapshot;
      }
      None => folded.push(item.clone()),
    }
  }
  Ok(folded)
}

/// Sums the guest cart into the user's cart in one transaction and returns
/// the merged cart. Products the catalog no longer has are skipped.
#[instrument(name = "cart_service::merge", skip(pool, items), fields(items = items.len()))]
pub async fn merge(pool: &PgPool, user_id: Uuid, items: &[LocalCartItem]) -> Result<Vec<CartLine>> {
  let items = fold_local_items(items)?;
  if items.is_empty() {
    return fetch(pool, user_id).await;
  }

  let mut tx = pool.begin().await?;
  let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
  let known: HashSet<Uuid> = sqlx::query_scalar::<_, Uuid>("SELECT id FROM products WHERE id = ANY($1)")
    .bind(&ids)
    .fetch_all(&mut *tx)
    .await?
    .into_iter()
    .collect();
  let existing: HashMap<Uuid, i32> = sqlx::query_as::<_, (Uuid, i32)>(
    "SELECT product_id, quantity FROM cart_items WHERE user_id = $1 AND product_id = ANY($2)",
  )
  .bind(user_id)
  .bind(&ids)
  .fetch_all(&mut *tx)
  .await?
  .into_iter()
  .collect();

  let mut merged = 0usize;
  for item in &items {
    if !known.contains(&item.product_id) {
      warn!(product_id = %item.product_id, "Skipping guest cart line for unknown product.");
      continue;
    }
    let quantity = positive_quantity(i64::from(item.quantity))?;
    summed_quantity(existing.get(&item.product_id).copied().unwrap_or(0), quantity)?;
    let written = sqlx::query(UPSERT_SUM)
      .bind(Uuid::new_v4())
      .bind(user_id)
      .bind(item.product_id)
      .bind(quantity)
      .bind(item.price_snapshot)
      .execute(&mut *tx)
      .await?;
    if written.rows_affected() == 0 {
      return Err(too_large());
    }
    merged += 1;
  }
  tx.commit().await?;
  info!(merged, skipped = items.len() - merged, "Guest cart merged.");

  fetch(pool, user_id).await
}

#[cfg(test)]
mod tests {
  use super::*;

  fn item(product_id: Uuid, quantity: u32, price: &str) -> LocalCartItem {
    LocalCartItem {
      product_id,
      quantity,
      price_snapshot: price.parse().unwrap(),
    }
  }

  #[test]
  fn repeated_products_are_summed() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let folded = fold_local_items(&[item(a, 2, "150.00"), item(b, 1, "450.00"), item(a, 3, "140.00")]).unwrap();
    assert_eq!(folded.len(), 2);
    assert_eq!(folded[0].quantity, 5);
    assert_eq!(folded[0].price_snapshot, "140.00".parse::<Decimal>().unwrap());
  }

  #[test]
  fn zero_quantity_is_rejected() {
    assert!(matches!(
      fold_local_items(&[item(Uuid::new_v4(), 0, "1.00")]),
      Err(AppError::Validation(_))
    ));
  }

  #[test]
  fn quantity_bounds() {
    assert!(positive_quantity(0).is_err());
    assert!(positive_quantity(-3).is_err());
    assert!(positive_quantity(i64::from(u32::MAX)).is_err());
    assert_eq!(positive_quantity(7).unwrap(), 7);
  }

  #[test]
  fn summed_quantity_stays_within_integer() {
    assert_eq!(summed_quantity(3, 4).unwrap(), 7);
    assert_eq!(summed_quantity(i32::MAX - 1, 1).unwrap(), i32::MAX);
    assert!(matches!(summed_quantity(i32::MAX, 1), Err(AppError::Validation(_))));
    assert!(matches!(summed_quantity(2_000_000_000, 200_000_000), Err(AppError::Validation(_))));
  }
}
