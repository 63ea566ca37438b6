// app/src/services/token_service.rs

//! Signed session tokens carried in the session cookie or a bearer header.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
  pub sub: Uuid,
  pub is_admin: bool,
  pub exp: i64,
}

pub const RESET_PURPOSE: &str = "password_reset";
pub const RESET_TTL_MINUTES: i64 = 30;

/// Claims of a password reset link. `pwd` pins the password hash the link
/// was issued against, so the link stops working once it has been used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetClaims {
  pub sub: Uuid,
  pub purpose: String,
  pub pwd: String,
  pub exp: i64,
}

/// The tail of a password hash: enough to tell two hashes apart without
/// putting the hash in a link.
pub fn hash_fingerprint(password_hash: &str) -> String {
  let start = password_hash.len().saturating_sub(16);
  password_hash.get(start..).unwrap_or(password_hash).to_string()
}

pub struct TokenKeys {
  encoding: EncodingKey,
  decoding: DecodingKey,
  validation: Validation,
  ttl: Duration,
}

impl TokenKeys {
  pub fn new(secret: &[u8], ttl: Duration) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);
    Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      validation,
      ttl,
    }
  }

  pub fn from_config(config: &AppConfig) -> Self {
    Self::new(
      config.jwt_secret.as_bytes(),
      Duration::minutes(config.access_token_ttl_minutes),
    )
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  #[instrument(name = "token_service::issue", skip(self), err(Display))]
  pub fn issue(&self, user_id: Uuid, is_admin: bool) -> Result<String> {
    let claims = Claims {
      sub: user_id,
      is_admin,
      exp: (Utc::now() + self.ttl).timestamp(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
      .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))
  }

  #[instrument(name = "token_service::issue_reset", skip(self, password_hash), err(Display))]
  pub fn issue_reset(&self, user_id: Uuid, password_hash: &str) -> Result<String> {
    let claims = ResetClaims {
      sub: user_id,
      purpose: RESET_PURPOSE.to_string(),
      pwd: hash_fingerprint(password_hash),
      exp: (Utc::now() + Duration::minutes(RESET_TTL_MINUTES)).timestamp(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
      .map_err(|e| AppError::Internal(format!("Failed to sign reset token: {}", e)))
  }

  /// Session tokens and tampered or expired links are all rejected alike.
  pub fn verify_reset(&self, token: &str) -> Result<ResetClaims> {
    let rejected = || AppError::invalid("token", "The reset link is invalid or has expired.");
    let claims = decode::<ResetClaims>(token, &self.decoding, &self.validation)
      .map(|data| data.claims)
      .map_err(|e| {
        debug!(error = %e, "Rejected reset token.");
        rejected()
      })?;
    if claims.purpose != RESET_PURPOSE {
      return Err(rejected());
    }
    Ok(claims)
  }

  /// Any failure (bad signature, expiry, garbage) is an authentication error.
  pub fn verify(&self, token: &str) -> Result<Claims> {
    decode::<Claims>(token, &self.decoding, &self.validation)
      .map(|data| data.claims)
      .map_err(|e| {
        debug!(error = %e, "Rejected session token.");
        AppError::Auth("Invalid or expired session token.".to_string())
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn keys() -> TokenKeys {
    TokenKeys::new(b"a-test-secret-of-some-length", Duration::minutes(5))
  }

  #[test]
  fn issued_token_verifies() {
    let keys = keys();
    let user = Uuid::new_v4();
    let token = keys.issue(user, true).unwrap();
    let claims = keys.verify(&token).unwrap();
    assert_eq!(claims.sub, user);
    assert!(claims.is_admin);
  }

  #[test]
  fn token_from_other_secret_is_rejected() {
    let other = TokenKeys::new(b"another-secret-entirely-here", Duration::minutes(5));
    let token = other.issue(Uuid::new_v4(), false).unwrap();
    assert!(matches!(keys().verify(&token), Err(AppError::Auth(_))));
  }

  #[test]
  fn expired_token_is_rejected() {
    // Past the default 60s leeway.
    let stale = TokenKeys::new(b"a-test-secret-of-some-length", Duration::minutes(-5));
    let token = stale.issue(Uuid::new_v4(), false).unwrap();
    assert!(keys().verify(&token).is_err());
  }

  #[test]
  fn garbage_is_rejected() {
    assert!(keys().verify("not-a-token").is_err());
  }

  #[test]
  fn reset_and_session_tokens_do_not_mix() {
    let keys = keys();
    let user = Uuid::new_v4();
    let reset = keys.issue_reset(user, "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaGhhc2hoYXNo").unwrap();

    let claims = keys.verify_reset(&reset).unwrap();
    assert_eq!(claims.sub, user);
    assert_eq!(claims.pwd, "aGFzaGhhc2hoYXNo");
    assert!(keys.verify(&reset).is_err(), "a reset link is not a session");

    let session = keys.issue(user, false).unwrap();
    assert!(matches!(keys.verify_reset(&session), Err(AppError::Validation(_))));
  }
}
