// app/src/models/favourite.rs

use sqlx::FromRow;
use storefront_core::model::Favourite;
use uuid::Uuid;

use super::product::ProductRow;

#[derive(Debug, Clone, FromRow)]
pub struct FavouriteRow {
  pub favourite_id: Uuid,
  pub user_id: Uuid,
  #[sqlx(flatten)]
  pub product: ProductRow,
}

impl From<FavouriteRow> for Favourite {
  fn from(row: FavouriteRow) -> Self {
    Favourite {
      id: row.favourite_id,
      user_id: row.user_id,
      product_id: row.product.id,
      product: Some(row.product.into()),
    }
  }
}
