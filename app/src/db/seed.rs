// app/src/db/seed.rs

//! Demo catalog: three categories and six products.

use anyhow::Context;
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::services::auth_service;

struct SeedCategory {
  slug: &'static str,
  name: &'static str,
  description: &'static str,
  image_url: &'static str,
}

struct SeedProduct {
  category: &'static str,
  slug: &'static str,
  name: &'static str,
  description: &'static str,
  price: Decimal,
  image_url: &'static str,
  characteristics: serde_json::Value,
}

fn categories() -> [SeedCategory; 3] {
  [
    SeedCategory {
      slug: "shovels",
      name: "Shovels",
      description: "Shovels for every kind of garden work",
      image_url: "/images/shovels_category.jpg",
    },
    SeedCategory {
      slug: "seeds",
      name: "Seeds",
      description: "High-quality seeds for a rich harvest",
      image_url: "/images/seeds_category.jpg",
    },
    SeedCategory {
      slug: "pots",
      name: "Pots and planters",
      description: "Good-looking, practical pots for your plants",
      image_url: "/images/pots_category.jpg",
    },
  ]
}

fn products() -> Vec<SeedProduct> {
  vec![
    SeedProduct {
      category: "shovels",
      slug: "fiskars-shovel",
      name: "Fiskars spade",
      description: "Heavy-duty spade for digging.",
      price: Decimal::new(250000, 2),
      image_url: "/images/fiskars_shovel.jpg",
      characteristics: json!({"material": "Hardened steel", "length": "120 cm"}),
    },
    SeedProduct {
      category: "shovels",
      slug: "palisad-scoop-shovel",
      name: "Palisad scoop shovel",
      description: "Scoop shovel for loose materials.",
      price: Decimal::new(120000, 2),
      image_url: "/images/folding_shovel.jpg",
      characteristics: json!({"material": "Carbon steel", "width": "25 cm"}),
    },
    SeedProduct {
      category: "seeds",
      slug: "tomato-black-prince",
      name: "Tomato seeds 'Black Prince'",
      description: "Early, large and sweet fruit.",
      price: Decimal::new(15000, 2),
      image_url: "/images/sunflower_seeds.jpg",
      characteristics: json!({"variety": "Indeterminate", "yield": "5 kg per plant"}),
    },
    SeedProduct {
      category: "seeds",
      slug: "cucumber-zozulya",
      name: "Cucumber seeds 'Zozulya'",
      description: "Parthenocarpic hybrid without bitterness.",
      price: Decimal::new(12000, 2),
      image_url: "/images/sunflower_seeds.jpg",
      characteristics: json!({"variety": "Self-pollinating", "ripening": "40-45 days"}),
    },
    SeedProduct {
      category: "pots",
      slug: "ceramic-pot-20cm",
      name: "Ceramic flower pot 20cm",
      description: "Classic ceramic pot for house plants.",
      price: Decimal::new(45000, 2),
      image_url: "/images/ceramic_pot.jpg",
      characteristics: json!({"material": "Ceramic", "diameter": "20 cm", "color": "Terracotta"}),
    },
    SeedProduct {
      category: "pots",
      slug: "hanging-plastic-pot-25cm",
      name: "Hanging plastic planter 25cm",
      description: "Light plastic planter for hanging arrangements.",
      price: Decimal::new(30000, 2),
      image_url: "/images/hanging_pot.jpg",
      characteristics: json!({"material": "Plastic", "diameter": "25 cm"}),
    },
  ]
}

/// Inserts the demo catalog. Rows whose slug already exists are left alone,
/// so seeding twice is harmless.
#[instrument(name = "seed::catalog", skip(pool))]
pub async fn seed_catalog(pool: &PgPool) -> anyhow::Result<()> {
  let mut tx = pool.begin().await.context("starting seed transaction")?;

  for category in categories() {
    sqlx::query(
      r#"
      INSERT INTO categories (id, slug, name, description, image_url)
      VALUES ($1, $2, $3, $4, $5)
      ON CONFLICT (slug) DO NOTHING
      "#,
    )
    .bind(Uuid::new_v4())
    .bind(category.slug)
    .bind(category.name)
    .bind(category.description)
    .bind(category.image_url)
    .execute(&mut *tx)
    .await
    .with_context(|| format!("seeding category '{}'", category.slug))?;
  }

  let seeded = products();
  for product in &seeded {
    sqlx::query(
      r#"
      INSERT INTO products (id, slug, name, description, price, image_url, characteristics, category_id, stock_quantity)
      SELECT $1, $2, $3, $4, $5, $6, $7, c.id, 100
      FROM categories c
      WHERE c.slug = $8
      ON CONFLICT (slug) DO NOTHING
      "#,
    )
    .bind(Uuid::new_v4())
    .bind(product.slug)
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.image_url)
    .bind(&product.characteristics)
    .bind(product.category)
    .execute(&mut *tx)
    .await
    .with_context(|| format!("seeding product '{}'", product.slug))?;
  }

  tx.commit().await.context("committing seed transaction")?;
  info!(categories = 3, products = seeded.len(), "Demo catalog seeded.");
  Ok(())
}

/// Creates the configured back-office account unless the email is taken.
pub async fn seed_admin(pool: &PgPool, config: &AppConfig) -> anyhow::Result<()> {
  let Some((email, password)) = config.seed_admin() else {
    return Ok(());
  };
  if auth_service::find_by_email(pool, email).await?.is_some() {
    info!(%email, "Admin account already present.");
    return Ok(());
  }
  let row = auth_service::create_profile(pool, email, password, Some("Administrator"), true).await?;
  info!(user_id = %row.id, "Admin account seeded.");
  Ok(())
}

pub async fn run(pool: &PgPool, config: &AppConfig) -> anyhow::Result<()> {
  seed_catalog(pool).await?;
  seed_admin(pool, config).await
}

#[cfg(test)]
mod tests {
  use super::*;
  use storefront_core::model::is_valid_slug;

  #[test]
  fn demo_catalog_is_consistent() {
    let slugs: Vec<&str> = categories().iter().map(|c| c.slug).collect();
    let products = products();
    assert_eq!(products.len(), 6);
    for product in &products {
      assert!(slugs.contains(&product.category), "{} has no category", product.slug);
      assert!(is_valid_slug(product.slug));
      assert_eq!(product.price.scale(), 2);
    }
  }
}
