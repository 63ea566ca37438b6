// app/src/web/extractors.rs

//! Request identity. The session JWT travels in the httpOnly cookie set at
//! sign-in or in an `Authorization: Bearer` header.

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::token_service::Claims;
use crate::state::AppState;

/// Raw token from the session cookie, falling back to a bearer header.
pub fn session_token(req: &HttpRequest, cookie_name: &str) -> Option<String> {
  if let Some(cookie) = req.cookie(cookie_name) {
    if !cookie.value().is_empty() {
      return Some(cookie.value().to_string());
    }
  }
  req
    .headers()
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(|t| t.trim().to_string())
    .filter(|t| !t.is_empty())
}

/// Verified claims of the request's session, if any.
pub fn session_claims(req: &HttpRequest) -> Option<Claims> {
  let state = req.app_data::<web::Data<AppState>>()?;
  let token = session_token(req, &state.config.session_cookie_name)?;
  state.tokens.verify(&token).ok()
}

#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
  pub is_admin: bool,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
      return ready(Err(AppError::Internal("Application state is not configured".to_string())));
    };
    let Some(token) = session_token(req, &state.config.session_cookie_name) else {
      return ready(Err(AppError::Auth("Authentication required".to_string())));
    };
    ready(match state.tokens.verify(&token) {
      Ok(claims) => Ok(AuthenticatedUser {
        user_id: claims.sub,
        is_admin: claims.is_admin,
      }),
      Err(e) => {
        warn!(path = %req.path(), "Rejected session token.");
        Err(e)
      }
    })
  }
}

/// A signed-in back-office user; anyone else gets 401 or 403.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser {
  pub user_id: Uuid,
}

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
    let user = match AuthenticatedUser::from_request(req, payload).into_inner() {
      Ok(user) => user,
      Err(e) => return ready(Err(e)),
    };
    if !user.is_admin {
      warn!(user_id = %user.user_id, path = %req.path(), "Non-admin hit an admin route.");
      return ready(Err(AppError::Forbidden("Administrator access required".to_string())));
    }
    ready(Ok(AdminUser { user_id: user.user_id }))
  }
}
