// app/src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use storefront_core::model::{Category, Product};
use uuid::Uuid;

/// Product columns plus its category's, read from [`PRODUCT_JOIN`].
pub const PRODUCT_COLUMNS: &str = r#"
  p.id, p.slug, p.name, p.description, p.price, p.discount, p.characteristics,
  p.image_url, p.category_id, p.stock_quantity, p.created_at, p.updated_at, p.times_ordered, p.offline_purchases,
  c.slug AS category_slug, c.name AS category_name,
  c.description AS category_description, c.image_url AS category_image_url
"#;

pub const PRODUCT_JOIN: &str = "products p JOIN categories c ON c.id = p.category_id";

/// `SELECT <product columns> FROM <join> <tail>`.
pub fn select_products(tail: &str) -> String {
  format!("SELECT {} FROM {} {}", PRODUCT_COLUMNS, PRODUCT_JOIN, tail)
}

#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
  pub id: Uuid,
  pub slug: String,
  pub name: String,
  pub description: Option<String>,
  pub price: Decimal,
  pub discount: Option<Decimal>,
  pub characteristics: Option<serde_json::Value>,
  pub image_url: Option<String>,
  pub category_id: Uuid,
  pub stock_quantity: i32,
  pub created_at: DateTime<Utc>,
  pub updated_at: Option<DateTime<Utc>>,
  pub times_ordered: i32,
  pub offline_purchases: i32,
  pub category_slug: String,
  pub category_name: String,
  pub category_description: Option<String>,
  pub category_image_url: Option<String>,
}

impl From<ProductRow> for Product {
  fn from(row: ProductRow) -> Self {
    let category = Category {
      id: row.category_id,
      slug: row.category_slug,
      name: row.category_name,
      description: row.category_description,
      image_url: row.category_image_url,
    };
    Product {
      id: row.id,
      slug: row.slug,
      name: row.name,
      description: row.description,
      price: row.price,
      discount: row.discount,
      characteristics: row.characteristics,
      image_url: row.image_url,
      category_id: row.category_id,
      stock_quantity: row.stock_quantity,
      created_at: row.created_at,
      updated_at: row.updated_at,
      times_ordered: row.times_ordered,
      offline_purchases: row.offline_purchases,
      category: Some(category),
    }
  }
}
