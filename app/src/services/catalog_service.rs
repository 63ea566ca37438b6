// app/src/services/catalog_service.rs

//! Categories and products: storefront reads and back-office writes.

use sqlx::{PgPool, Postgres, QueryBuilder};
use storefront_core::model::{
  Category, CategoryUpdate, NewCategory, NewProduct, Product, ProductOfflineUpdate, ProductQuery, ProductUpdate,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::category::CATEGORY_COLUMNS;
use crate::models::product::select_products;
use crate::models::{CategoryRow, ProductRow};

pub const DEFAULT_BESTSELLERS: u32 = 10;
pub const MAX_BESTSELLERS: u32 = 50;

/// The slug that spans every category.
pub const ALL_CATEGORIES: &str = "all";

// --- Categories ---

/// Every category, or only the one whose slug matches.
#[instrument(name = "catalog_service::categories", skip(pool))]
pub async fn categories(pool: &PgPool, slug: Option<&str>) -> Result<Vec<Category>> {
  let rows = match slug.filter(|s| *s != ALL_CATEGORIES) {
    Some(slug) => {
      sqlx::query_as::<_, CategoryRow>(&format!("SELECT {} FROM categories WHERE slug = $1", CATEGORY_COLUMNS))
        .bind(slug)
        .fetch_all(pool)
        .await?
    }
    None => {
      sqlx::query_as::<_, CategoryRow>(&format!("SELECT {} FROM categories ORDER BY name", CATEGORY_COLUMNS))
        .fetch_all(pool)
        .await?
    }
  };
  Ok(rows.into_iter().map(Category::from).collect())
}

pub async fn category(pool: &PgPool, id: Uuid) -> Result<Option<Category>> {
  let row = sqlx::query_as::<_, CategoryRow>(&format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS))
    .bind(id)
    .fetch_optional(pool)
    .await?;
  Ok(row.map(Category::from))
}

#[instrument(name = "catalog_service::create_category", skip(pool, payload), fields(slug = %payload.slug))]
pub async fn create_category(pool: &PgPool, payload: &NewCategory) -> Result<Category> {
  payload.validate()?;
  let row = sqlx::query_as::<_, CategoryRow>(&format!(
    "INSERT INTO categories (id, slug, name, description, image_url) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
    CATEGORY_COLUMNS
  ))
  .bind(Uuid::new_v4())
  .bind(&payload.slug)
  .bind(payload.name.trim())
  .bind(&payload.description)
  .bind(&payload.image_url)
  .fetch_one(pool)
  .await
  .map_err(|e| AppError::unique_or(e, "Category with this slug already exists"))?;
  info!(category_id = %row.id, "Category created.");
  Ok(row.into())
}

pub async fn update_category(pool: &PgPool, id: Uuid, patch: &CategoryUpdate) -> Result<Option<Category>> {
  patch.validate()?;
  let row = sqlx::query_as::<_, CategoryRow>(&format!(
    r#"
    UPDATE categories
    SET name = COALESCE($2, name),
        slug = COALESCE($3, slug),
        description = COALESCE($4, description),
        image_url = COALESCE($5, image_url)
    WHERE id = $1
    RETURNING {}
    "#,
    CATEGORY_COLUMNS
  ))
  .bind(id)
  .bind(patch.name.as_deref().map(str::trim))
  .bind(&patch.slug)
  .bind(&patch.description)
  .bind(&patch.image_url)
  .fetch_optional(pool)
  .await
  .map_err(|e| AppError::unique_or(e, "Category with this slug already exists"))?;
  Ok(row.map(Category::from))
}

/// `false` when absent. A category that still has products cannot go.
pub async fn delete_category(pool: &PgPool, id: Uuid) -> Result<bool> {
  let result = sqlx::query("DELETE FROM categories WHERE id = $1")
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| match e {
      sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
        AppError::Conflict("Category still has products".to_string())
      }
      other => AppError::Sqlx(other),
    })?;
  Ok(result.rows_affected() > 0)
}

// --- Products ---

pub async fn product(pool: &PgPool, id: Uuid) -> Result<Option<Product>> {
  let row = sqlx::query_as::<_, ProductRow>(&select_products("WHERE p.id = $1"))
    .bind(id)
    .fetch_optional(pool)
    .await?;
  Ok(row.map(Product::from))
}

pub async fn product_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Product>> {
  let row = sqlx::query_as::<_, ProductRow>(&select_products("WHERE p.slug = $1"))
    .bind(slug)
    .fetch_optional(pool)
    .await?;
  Ok(row.map(Product::from))
}

/// Every product, newest first, for the back-office.
pub async fn all_products(pool: &PgPool) -> Result<Vec<Product>> {
  let rows = sqlx::query_as::<_, ProductRow>(&select_products("ORDER BY p.created_at DESC, p.id"))
    .fetch_all(pool)
    .await?;
  Ok(rows.into_iter().map(Product::from).collect())
}

fn escape_like(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len());
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped
}

/// Builds the filtered listing for `GET /api/products/category/{slug}`.
pub fn listing_query(category_slug: &str, query: &ProductQuery) -> QueryBuilder<'static, Postgres> {
  let mut qb = QueryBuilder::new(select_products("WHERE TRUE"));

  if category_slug != ALL_CATEGORIES {
    qb.push(" AND c.slug = ").push_bind(category_slug.to_string());
  }
  let extra_slugs = query.category_slugs();
  if !extra_slugs.is_empty() {
    qb.push(" AND c.slug = ANY(").push_bind(extra_slugs).push(")");
  }
  if let Some(text) = query.search_text() {
    let pattern = format!("%{}%", escape_like(text));
    qb.push(" AND (p.name ILIKE ")
      .push_bind(pattern.clone())
      .push(" OR p.description ILIKE ")
      .push_bind(pattern)
      .push(")");
  }
  if let Some(min) = query.min_price {
    qb.push(" AND p.price >= ").push_bind(min);
  }
  if let Some(max) = query.max_price {
    qb.push(" AND p.price <= ").push_bind(max);
  }
  if query.in_stock == Some(true) {
    qb.push(" AND p.stock_quantity > 0");
  }
  if query.has_discount == Some(true) {
    qb.push(" AND p.discount IS NOT NULL AND p.discount > 0");
  }

  let sort = query.sort_by.unwrap_or_default();
  let order = query.sort_order.unwrap_or_default();
  qb.push(format!(" ORDER BY p.{} {}, p.id", sort.column(), order.keyword()));
  qb.push(" LIMIT ").push_bind(i64::from(query.effective_limit()));
  qb.push(" OFFSET ").push_bind(i64::from(query.effective_offset()));
  qb
}

/// An unknown slug yields an empty page.
#[instrument(name = "catalog_service::products_in_category", skip(pool, query))]
pub async fn products_in_category(pool: &PgPool, category_slug: &str, query: &ProductQuery) -> Result<Vec<Product>> {
  query.validate()?;
  let rows = listing_query(category_slug, query)
    .build_query_as::<ProductRow>()
    .fetch_all(pool)
    .await?;
  Ok(rows.into_iter().map(Product::from).collect())
}

pub async fn bestsellers(pool: &PgPool, limit: Option<u32>) -> Result<Vec<Product>> {
  let limit = limit.unwrap_or(DEFAULT_BESTSELLERS).clamp(1, MAX_BESTSELLERS);
  let rows = sqlx::query_as::<_, ProductRow>(&select_products("ORDER BY p.times_ordered DESC, p.name LIMIT $1"))
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;
  Ok(rows.into_iter().map(Product::from).collect())
}

async fn ensure_category_exists(pool: &PgPool, category_id: Uuid) -> Result<()> {
  let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
    .bind(category_id)
    .fetch_one(pool)
    .await?;
  if exists {
    Ok(())
  } else {
    Err(AppError::invalid("categoryId", "Category does not exist."))
  }
}

#[instrument(name = "catalog_service::create_product", skip(pool, payload), fields(slug = %payload.slug))]
pub async fn create_product(pool: &PgPool, payload: &NewProduct) -> Result<Product> {
  payload.validate()?;
  ensure_category_exists(pool, payload.category_id).await?;
  let id: Uuid = sqlx::query_scalar(
    r#"
    INSERT INTO products (id, slug, name, description, price, discount, characteristics, image_url, category_id, stock_quantity)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
    RETURNING id
    "#,
  )
  .bind(Uuid::new_v4())
  .bind(&payload.slug)
  .bind(payload.name.trim())
  .bind(&payload.description)
  .bind(payload.price)
  .bind(payload.discount)
  .bind(&payload.characteristics)
  .bind(&payload.image_url)
  .bind(payload.category_id)
  .bind(payload.stock_quantity)
  .fetch_one(pool)
  .await
  .map_err(|e| AppError::unique_or(e, "Product with this slug already exists"))?;
  info!(product_id = %id, "Product created.");
  product(pool, id)
    .await?
    .ok_or_else(|| AppError::Internal(format!("Product {} vanished after insert", id)))
}

pub async fn update_product(pool: &PgPool, id: Uuid, patch: &ProductUpdate) -> Result<Option<Product>> {
  patch.validate()?;
  if let Some(category_id) = patch.category_id {
    ensure_category_exists(pool, category_id).await?;
  }
  let updated: Option<Uuid> = sqlx::query_scalar(
    r#"
    UPDATE products
    SET name = COALESCE($2, name),
        slug = COALESCE($3, slug),
        description = COALESCE($4, description),
        price = COALESCE($5, price),
        discount = COALESCE($6, discount),
        characteristics = COALESCE($7, characteristics),
        image_url = COALESCE($8, image_url),
        category_id = COALESCE($9, category_id),
        stock_quantity = COALESCE($10, stock_quantity),
        updated_at = NOW()
    WHERE id = $1
    RETURNING id
    "#,
  )
  .bind(id)
  .bind(patch.name.as_deref().map(str::trim))
  .bind(&patch.slug)
  .bind(&patch.description)
  .bind(patch.price)
  .bind(patch.discount)
  .bind(&patch.characteristics)
  .bind(&patch.image_url)
  .bind(patch.category_id)
  .bind(patch.stock_quantity)
  .fetch_optional(pool)
  .await
  .map_err(|e| AppError::unique_or(e, "Product with this slug already exists"))?;
  match updated {
    Some(id) => product(pool, id).await,
    None => Ok(None),
  }
}

/// Records in-shop sales; `times_ordered` is only touched when given.
#[instrument(name = "catalog_service::set_offline_purchases", skip(pool))]
pub async fn set_offline_purchases(pool: &PgPool, id: Uuid, update: &ProductOfflineUpdate) -> Result<Option<Product>> {
  update.validate()?;
  let updated: Option<Uuid> = sqlx::query_scalar(
    r#"
    UPDATE products
    SET offline_purchases = $2,
        times_ordered = COALESCE($3, times_ordered),
        updated_at = NOW()
    WHERE id = $1
    RETURNING id
    "#,
  )
  .bind(id)
  .bind(update.offline_purchases)
  .bind(update.times_ordered)
  .fetch_optional(pool)
  .await?;
  match updated {
    Some(id) => product(pool, id).await,
    None => Ok(None),
  }
}

pub async fn delete_product(pool: &PgPool, id: Uuid) -> Result<bool> {
  let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(pool).await?;
  Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal::Decimal;
  use storefront_core::model::{SortField, SortOrder};

  #[test]
  fn plain_listing_is_windowed_and_sorted_by_name() {
    let qb = listing_query("seeds", &ProductQuery::default());
    let sql = qb.sql();
    assert!(sql.contains("AND c.slug = $1"));
    assert!(sql.contains("ORDER BY p.name ASC, p.id"));
    assert!(sql.contains("LIMIT $2 OFFSET $3"));
  }

  #[test]
  fn all_slug_spans_categories() {
    let qb = listing_query(ALL_CATEGORIES, &ProductQuery::default());
    assert!(!qb.sql().contains("c.slug ="));
  }

  #[test]
  fn every_filter_adds_its_clause() {
    let query = ProductQuery {
      search_query: Some("  pot ".into()),
      sort_by: Some(SortField::Price),
      sort_order: Some(SortOrder::Desc),
      min_price: Some(Decimal::from(100)),
      max_price: Some(Decimal::from(500)),
      category_filter: Some("pots,seeds".into()),
      in_stock: Some(true),
      has_discount: Some(true),
      ..ProductQuery::page(24, 12)
    };
    let qb = listing_query(ALL_CATEGORIES, &query);
    let sql = qb.sql();
    assert!(sql.contains("c.slug = ANY($1)"));
    assert!(sql.contains("p.name ILIKE $2 OR p.description ILIKE $3"));
    assert!(sql.contains("p.price >= $4"));
    assert!(sql.contains("p.price <= $5"));
    assert!(sql.contains("p.stock_quantity > 0"));
    assert!(sql.contains("p.discount > 0"));
    assert!(sql.contains("ORDER BY p.price DESC"));
    assert!(sql.contains("LIMIT $6 OFFSET $7"));
  }

  #[test]
  fn false_flags_do_not_filter() {
    let query = ProductQuery {
      in_stock: Some(false),
      has_discount: Some(false),
      search_query: Some("   ".into()),
      ..Default::default()
    };
    let qb = listing_query("pots", &query);
    let sql = qb.sql();
    assert!(!sql.contains("stock_quantity > 0"));
    assert!(!sql.contains("discount IS NOT NULL"));
    assert!(!sql.contains("ILIKE"));
  }

  #[test]
  fn like_wildcards_are_escaped() {
    assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
  }
}
