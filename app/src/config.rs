// app/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub app_base_url: String,
  pub db_max_connections: u32,

  // Session tokens
  pub jwt_secret: String,
  pub access_token_ttl_minutes: i64,
  pub session_cookie_name: String,
  pub cookie_secure: bool,

  // Startup
  pub run_migrations: bool,
  pub seed_db: bool,
  pub seed_admin_email: Option<String>,
  pub seed_admin_password: Option<String>,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the configuration from any variable source.
  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get_env = |var_name: &str| {
      lookup(var_name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", var_name)))
    };
    let get_flag = |var_name: &str, default: bool| -> Result<bool> {
      match get_env(var_name) {
        Ok(raw) => raw
          .parse::<bool>()
          .map_err(|e| AppError::Config(format!("Invalid {} value: {}", var_name, e))),
        Err(_) => Ok(default),
      }
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;
    let app_base_url = get_env("APP_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));
    let db_max_connections = get_env("DB_MAX_CONNECTIONS")
      .unwrap_or_else(|_| "10".to_string())
      .parse::<u32>()
      .map_err(|e| AppError::Config(format!("Invalid DB_MAX_CONNECTIONS: {}", e)))?;

    let jwt_secret = get_env("JWT_SECRET")?;
    if jwt_secret.len() < 16 {
      return Err(AppError::Config("JWT_SECRET must be at least 16 bytes long".to_string()));
    }
    let access_token_ttl_minutes = get_env("ACCESS_TOKEN_TTL_MINUTES")
      .unwrap_or_else(|_| "60".to_string())
      .parse::<i64>()
      .map_err(|e| AppError::Config(format!("Invalid ACCESS_TOKEN_TTL_MINUTES: {}", e)))?;
    if access_token_ttl_minutes <= 0 {
      return Err(AppError::Config("ACCESS_TOKEN_TTL_MINUTES must be positive".to_string()));
    }
    let session_cookie_name = get_env("SESSION_COOKIE_NAME").unwrap_or_else(|_| "access_token".to_string());
    let cookie_secure = get_flag("COOKIE_SECURE", false)?;

    let run_migrations = get_flag("RUN_MIGRATIONS", true)?;
    let seed_db = get_flag("SEED_DB", false)?;
    let seed_admin_email = get_env("SEED_ADMIN_EMAIL").ok();
    let seed_admin_password = get_env("SEED_ADMIN_PASSWORD").ok();
    if seed_admin_email.is_some() != seed_admin_password.is_some() {
      return Err(AppError::Config(
        "SEED_ADMIN_EMAIL and SEED_ADMIN_PASSWORD must be set together".to_string(),
      ));
    }

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      app_base_url,
      db_max_connections,
      jwt_secret,
      access_token_ttl_minutes,
      session_cookie_name,
      cookie_secure,
      run_migrations,
      seed_db,
      seed_admin_email,
      seed_admin_password,
    })
  }

  pub fn server_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }

  /// Credentials for the seeded back-office account, when configured.
  pub fn seed_admin(&self) -> Option<(&str, &str)> {
    match (&self.seed_admin_email, &self.seed_admin_password) {
      (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
      _ => None,
    }
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use std::collections::HashMap;

  pub(crate) fn test_config() -> AppConfig {
    config_from(&[]).unwrap()
  }

  fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
    let mut vars: HashMap<String, String> = HashMap::from([
      ("DATABASE_URL".to_string(), "postgres://localhost/storefront".to_string()),
      ("JWT_SECRET".to_string(), "a-test-secret-of-some-length".to_string()),
    ]);
    for (k, v) in pairs {
      vars.insert(k.to_string(), v.to_string());
    }
    AppConfig::from_lookup(|name| vars.get(name).cloned())
  }

  #[test]
  fn defaults_apply() {
    let cfg = test_config();
    assert_eq!(cfg.server_address(), "127.0.0.1:8080");
    assert_eq!(cfg.session_cookie_name, "access_token");
    assert_eq!(cfg.access_token_ttl_minutes, 60);
    assert!(cfg.run_migrations);
    assert!(!cfg.seed_db);
    assert!(cfg.seed_admin().is_none());
  }

  #[test]
  fn database_url_and_secret_are_required() {
    let err = AppConfig::from_lookup(|_| None).unwrap_err();
    assert!(matches!(err, AppError::Config(m) if m.contains("DATABASE_URL")));
    assert!(config_from(&[("JWT_SECRET", "short")]).is_err());
  }

  #[test]
  fn bad_values_are_config_errors() {
    assert!(matches!(config_from(&[("SERVER_PORT", "eighty")]), Err(AppError::Config(_))));
    assert!(matches!(config_from(&[("SEED_DB", "maybe")]), Err(AppError::Config(_))));
    assert!(matches!(
      config_from(&[("SEED_ADMIN_EMAIL", "admin@example.com")]),
      Err(AppError::Config(_))
    ));
  }
}
