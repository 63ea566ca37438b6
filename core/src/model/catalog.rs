// core/src/model/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cart::ProductSnapshot;
use super::is_valid_slug;
use crate::error::{FieldErrors, StoreResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
  pub id: Uuid,
  pub slug: String,
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
  pub name: String,
  pub slug: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub image_url: Option<String>,
}

impl NewCategory {
  pub fn validate(&self) -> StoreResult<()> {
    let mut errors = FieldErrors::new();
    if self.name.trim().is_empty() {
      errors.add("name", "Name is required.");
    }
    if !is_valid_slug(&self.slug) {
      errors.add("slug", "Slug may only contain lowercase letters, digits and single hyphens.");
    }
    errors.into_result()
  }
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub slug: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
}

impl CategoryUpdate {
  pub fn validate(&self) -> StoreResult<()> {
    let mut errors = FieldErrors::new();
    if matches!(&self.name, Some(name) if name.trim().is_empty()) {
      errors.add("name", "Name cannot be blank.");
    }
    if matches!(&self.slug, Some(slug) if !is_valid_slug(slug)) {
      errors.add("slug", "Slug may only contain lowercase letters, digits and single hyphens.");
    }
    errors.into_result()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: Uuid,
  pub slug: String,
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  pub price: Decimal,
  #[serde(default)]
  pub discount: Option<Decimal>,
  #[serde(default)]
  pub characteristics: Option<serde_json::Value>,
  #[serde(default)]
  pub image_url: Option<String>,
  pub category_id: Uuid,
  #[serde(default)]
  pub stock_quantity: i32,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub times_ordered: i32,
  /// Purchases made in the physical shop, entered by hand.
  #[serde(default)]
  pub offline_purchases: i32,
  #[serde(default)]
  pub category: Option<Category>,
}

impl Product {
  /// The price a line added right now would capture.
  pub fn snapshot(&self) -> ProductSnapshot {
    ProductSnapshot {
      product_id: self.id,
      name: self.name.clone(),
      price: self.price,
      image_url: self.image_url.clone(),
    }
  }

  pub fn in_stock(&self) -> bool {
    self.stock_quantity > 0
  }

  pub fn has_discount(&self) -> bool {
    matches!(self.discount, Some(d) if d > Decimal::ZERO)
  }
}

/// Back-office correction of a product's sales counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOfflineUpdate {
  pub offline_purchases: i32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub times_ordered: Option<i32>,
}

impl ProductOfflineUpdate {
  pub fn validate(&self) -> StoreResult<()> {
    let mut errors = FieldErrors::new();
    if self.offline_purchases < 0 {
      errors.add("offlinePurchases", "Offline purchases cannot be negative.");
    }
    if matches!(self.times_ordered, Some(n) if n < 0) {
      errors.add("timesOrdered", "Order count cannot be negative.");
    }
    errors.into_result()
  }
}

fn validate_pricing(errors: &mut FieldErrors, price: Option<Decimal>, discount: Option<Decimal>) {
  if let Some(price) = price {
    if price < Decimal::ZERO {
      errors.add("price", "Price cannot be negative.");
    }
    if price.scale() > 2 {
      errors.add("price", "Price has at most two decimal places.");
    }
  }
  if let Some(discount) = discount {
    if discount < Decimal::ZERO {
      errors.add("discount", "Discount cannot be negative.");
    }
    if matches!(price, Some(price) if discount > price) {
      errors.add("discount", "Discount cannot exceed the price.");
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
  pub name: String,
  pub slug: String,
  #[serde(default)]
  pub description: Option<String>,
  pub price: Decimal,
  #[serde(default)]
  pub discount: Option<Decimal>,
  #[serde(default)]
  pub characteristics: Option<serde_json::Value>,
  #[serde(default)]
  pub image_url: Option<String>,
  pub category_id: Uuid,
  #[serde(default)]
  pub stock_quantity: i32,
}

impl NewProduct {
  pub fn validate(&self) -> StoreResult<()> {
    let mut errors = FieldErrors::new();
    if self.name.trim().is_empty() {
      errors.add("name", "Name is required.");
    }
    if !is_valid_slug(&self.slug) {
      errors.add("slug", "Slug may only contain lowercase letters, digits and single hyphens.");
    }
    validate_pricing(&mut errors, Some(self.price), self.discount);
    if self.stock_quantity < 0 {
      errors.add("stockQuantity", "Stock cannot be negative.");
    }
    if matches!(&self.characteristics, Some(c) if !c.is_object()) {
      errors.add("characteristics", "Characteristics must be a JSON object.");
    }
    errors.into_result()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub slug: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub price: Option<Decimal>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub discount: Option<Decimal>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub characteristics: Option<serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category_id: Option<Uuid>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub stock_quantity: Option<i32>,
}

impl ProductUpdate {
  pub fn validate(&self) -> StoreResult<()> {
    let mut errors = FieldErrors::new();
    if matches!(&self.name, Some(name) if name.trim().is_empty()) {
      errors.add("name", "Name cannot be blank.");
    }
    if matches!(&self.slug, Some(slug) if !is_valid_slug(slug)) {
      errors.add("slug", "Slug may only contain lowercase letters, digits and single hyphens.");
    }
    validate_pricing(&mut errors, self.price, self.discount);
    if matches!(self.stock_quantity, Some(q) if q < 0) {
      errors.add("stockQuantity", "Stock cannot be negative.");
    }
    errors.into_result()
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
  #[default]
  Name,
  Price,
  CreatedAt,
  TimesOrdered,
}

impl SortField {
  /// Column the listing orders by. Only these literals ever reach SQL.
  pub fn column(self) -> &'static str {
    match self {
      SortField::Name => "name",
      SortField::Price => "price",
      SortField::CreatedAt => "created_at",
      SortField::TimesOrdered => "times_ordered",
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  #[default]
  Asc,
  Desc,
}

impl SortOrder {
  pub fn keyword(self) -> &'static str {
    match self {
      SortOrder::Asc => "ASC",
      SortOrder::Desc => "DESC",
    }
  }
}

/// Query parameters of `GET /api/products/category/{slug}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub limit: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub offset: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub search_query: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sort_by: Option<SortField>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sort_order: Option<SortOrder>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub min_price: Option<Decimal>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_price: Option<Decimal>,
  /// Comma-separated category slugs, applied on top of the path slug.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category_filter: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub in_stock: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub has_discount: Option<bool>,
}

impl ProductQuery {
  pub const DEFAULT_LIMIT: u32 = 12;
  pub const MAX_LIMIT: u32 = 100;

  pub fn page(offset: u32, limit: u32) -> Self {
    Self {
      offset: Some(offset),
      limit: Some(limit),
      ..Self::default()
    }
  }

  /// Same filters, different window.
  pub fn with_window(&self, offset: u32, limit: u32) -> Self {
    Self {
      offset: Some(offset),
      limit: Some(limit),
      ..self.clone()
    }
  }

  pub fn effective_limit(&self) -> u32 {
    self.limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT)
  }

  pub fn effective_offset(&self) -> u32 {
    self.offset.unwrap_or(0)
  }

  /// Trimmed search text, `None` when blank.
  pub fn search_text(&self) -> Option<&str> {
    self.search_query.as_deref().map(str::trim).filter(|s| !s.is_empty())
  }

  pub fn category_slugs(&self) -> Vec<String> {
    self
      .category_filter
      .as_deref()
      .unwrap_or_default()
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty() && *s != "all")
      .map(str::to_string)
      .collect()
  }

  pub fn validate(&self) -> StoreResult<()> {
    let mut errors = FieldErrors::new();
    if matches!(self.min_price, Some(p) if p < Decimal::ZERO) {
      errors.add("minPrice", "Minimum price cannot be negative.");
    }
    if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
      if min > max {
        errors.add("maxPrice", "Maximum price must not be below the minimum price.");
      }
    }
    errors.into_result()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn query_defaults_and_clamping() {
    let q = ProductQuery::default();
    assert_eq!(q.effective_limit(), ProductQuery::DEFAULT_LIMIT);
    assert_eq!(q.effective_offset(), 0);
    let q = ProductQuery {
      limit: Some(10_000),
      ..Default::default()
    };
    assert_eq!(q.effective_limit(), ProductQuery::MAX_LIMIT);
  }

  #[test]
  fn category_filter_splits_and_skips_all() {
    let q = ProductQuery {
      category_filter: Some("seeds, pots,,all".to_string()),
      ..Default::default()
    };
    assert_eq!(q.category_slugs(), vec!["seeds".to_string(), "pots".to_string()]);
  }

  #[test]
  fn inverted_price_range_is_rejected() {
    let q = ProductQuery {
      min_price: Some(Decimal::from(500)),
      max_price: Some(Decimal::from(100)),
      ..Default::default()
    };
    assert!(q.validate().is_err());
  }

  #[test]
  fn discount_above_price_is_rejected() {
    let p = NewProduct {
      name: "Shovel".into(),
      slug: "shovel".into(),
      description: None,
      price: Decimal::from(100),
      discount: Some(Decimal::from(150)),
      characteristics: None,
      image_url: None,
      category_id: Uuid::new_v4(),
      stock_quantity: 1,
    };
    let err = p.validate().unwrap_err();
    match err {
      crate::StoreError::Validation(fields) => assert!(fields.get("discount").is_some()),
      other => panic!("expected validation error, got {:?}", other),
    }
  }

  #[test]
  fn sort_field_parses_camel_case() {
    let f: SortField = serde_json::from_str("\"timesOrdered\"").unwrap();
    assert_eq!(f.column(), "times_ordered");
    let o: SortOrder = serde_json::from_str("\"desc\"").unwrap();
    assert_eq!(o.keyword(), "DESC");
  }

  #[test]
  fn offline_counters_cannot_go_negative() {
    let ok = ProductOfflineUpdate {
      offline_purchases: 12,
      times_ordered: None,
    };
    assert!(ok.validate().is_ok());
    let bad = ProductOfflineUpdate {
      offline_purchases: -1,
      times_ordered: Some(-3),
    };
    match bad.validate().unwrap_err() {
      crate::StoreError::Validation(fields) => {
        assert!(fields.get("offlinePurchases").is_some());
        assert!(fields.get("timesOrdered").is_some());
      }
      other => panic!("unexpected {:?}", other),
    }
  }
}
