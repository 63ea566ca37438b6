// app/src/main.rs

mod config;
mod db;
mod errors;
mod models;
mod services;
mod state;
mod web;

use crate::config::AppConfig;
use crate::state::AppState;

use actix_web::{middleware, web as actix_data, App, HttpServer};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
  tracing::error!(error = %err, "{}", context);
  std::io::Error::other(format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting storefront server...");

  let app_config = AppConfig::from_env()
    .map(Arc::new)
    .map_err(|e| startup_error("Failed to load application configuration", e))?;

  let db_pool = db::connect(&app_config)
    .await
    .map_err(|e| startup_error("Failed to prepare the database", e))?;

  if app_config.seed_db {
    db::seed::run(&db_pool, &app_config)
      .await
      .map_err(|e| startup_error("Failed to seed database", format!("{:#}", e)))?;
  }

  let app_state = AppState::new(db_pool, app_config.clone());

  let server_address = app_config.server_address();
  tracing::info!(base_url = %app_config.app_base_url, "Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(middleware::from_fn(web::gate::page_gate))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
