// app/src/models/category.rs

use sqlx::FromRow;
use storefront_core::model::Category;
use uuid::Uuid;

pub const CATEGORY_COLUMNS: &str = "id, slug, name, description, image_url";

#[derive(Debug, Clone, FromRow)]
pub struct CategoryRow {
  pub id: Uuid,
  pub slug: String,
  pub name: String,
  pub description: Option<String>,
  pub image_url: Option<String>,
}

impl From<CategoryRow> for Category {
  fn from(row: CategoryRow) -> Self {
    Category {
      id: row.id,
      slug: row.slug,
      name: row.name,
      description: row.description,
      image_url: row.image_url,
    }
  }
}
