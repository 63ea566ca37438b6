// app/src/state.rs
use crate::config::AppConfig;
use crate::services::token_service::TokenKeys;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub tokens: Arc<TokenKeys>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  pub fn new(db_pool: PgPool, config: Arc<AppConfig>) -> Self {
    let tokens = Arc::new(TokenKeys::from_config(&config));
    Self {
      db_pool,
      tokens,
      config,
    }
  }
}
