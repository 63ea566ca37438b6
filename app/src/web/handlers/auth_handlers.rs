// app/src/web/handlers/auth_handlers.rs

use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::{web, HttpResponse};
use serde_json::json;
use storefront_core::model::{AuthToken, PasswordReset, PasswordResetRequest, PasswordUpdate, SignIn, SignUp};
use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::services::auth_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

fn session_cookie(config: &AppConfig, token: String, max_age: time::Duration) -> Cookie<'static> {
  Cookie::build(config.session_cookie_name.clone(), token)
    .path("/")
    .http_only(true)
    .secure(config.cookie_secure)
    .same_site(SameSite::Lax)
    .max_age(max_age)
    .finish()
}

#[instrument(name = "handler::signup", skip(app_state, req_payload), fields(req_email = %req_payload.email))]
pub async fn signup_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SignUp>,
) -> Result<HttpResponse, AppError> {
  let profile = auth_service::sign_up(&app_state.db_pool, &req_payload).await?;
  Ok(HttpResponse::Created().json(profile))
}

/// Issues the session JWT both as an httpOnly cookie and in the body.
#[instrument(name = "handler::signin", skip(app_state, req_payload), fields(req_email = %req_payload.email))]
pub async fn signin_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SignIn>,
) -> Result<HttpResponse, AppError> {
  let user = auth_service::sign_in(&app_state.db_pool, &req_payload).await?;
  let token = app_state.tokens.issue(user.id, user.is_admin)?;
  let max_age = time::Duration::seconds(app_state.tokens.ttl().num_seconds());
  info!(user_id = %user.id, "Signin successful.");

  Ok(
    HttpResponse::Ok()
      .cookie(session_cookie(&app_state.config, token.clone(), max_age))
      .json(AuthToken {
        access_token: token,
        token_type: "bearer".to_string(),
        user,
      }),
  )
}

/// Tokens are stateless; signing out only drops the cookie.
#[instrument(name = "handler::logout", skip(app_state))]
pub async fn logout_handler(app_state: web::Data<AppState>) -> HttpResponse {
  HttpResponse::NoContent()
    .cookie(session_cookie(&app_state.config, String::new(), time::Duration::ZERO))
    .finish()
}

#[instrument(name = "handler::me", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn me_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let row = auth_service::find_by_id(&app_state.db_pool, auth_user.user_id)
    .await?
    .ok_or_else(|| AppError::Auth("Account no longer exists".to_string()))?;
  Ok(HttpResponse::Ok().json(row.into_profile()))
}

#[instrument(name = "handler::update_password", skip(app_state, req_payload, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn update_password_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<PasswordUpdate>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  auth_service::update_password(&app_state.db_pool, auth_user.user_id, &req_payload).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Password updated." })))
}

/// Answers the same for known and unknown addresses. There is no mail
/// transport; the link is written to the `storefront::mail` log target.
#[instrument(name = "handler::reset_password", skip(app_state, req_payload))]
pub async fn reset_password_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<PasswordResetRequest>,
) -> Result<HttpResponse, AppError> {
  let email = req_payload.email.trim();
  if let Some(token) = auth_service::request_password_reset(&app_state.db_pool, &app_state.tokens, email).await? {
    let link = reset_link(&app_state.config, &token);
    info!(target: "storefront::mail", to = %email, %link, "Password reset link issued.");
  }
  Ok(HttpResponse::Accepted().json(json!({
    "message": "If the address is registered, reset instructions have been sent."
  })))
}

#[instrument(name = "handler::confirm_password_reset", skip(app_state, req_payload))]
pub async fn confirm_password_reset_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<PasswordReset>,
) -> Result<HttpResponse, AppError> {
  auth_service::reset_password(&app_state.db_pool, &app_state.tokens, &req_payload).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Password updated." })))
}

fn reset_link(config: &AppConfig, token: &str) -> String {
  format!(
    "{}/reset-password?token={}",
    config.app_base_url.trim_end_matches('/'),
    urlencoding::encode(token)
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::tests::test_config;

  #[test]
  fn session_cookie_is_http_only() {
    let config = test_config();
    let cookie = session_cookie(&config, "tok".to_string(), time::Duration::minutes(60));
    assert_eq!(cookie.name(), "access_token");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.max_age(), Some(time::Duration::minutes(60)));
  }

  #[test]
  fn reset_link_points_at_the_app() {
    let mut config = test_config();
    config.app_base_url = "https://shop.example/".to_string();
    assert_eq!(
      reset_link(&config, "a.b+c"),
      "https://shop.example/reset-password?token=a.b%2Bc"
    );
  }
}
