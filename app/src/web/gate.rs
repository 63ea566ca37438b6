// app/src/web/gate.rs

//! Edge gate for page routes. Member pages send anonymous visitors to the
//! login page with a `callback` back to where they were going; back-office
//! pages also turn away signed-in non-admins. API routes are left to the
//! extractors, which answer 401/403 JSON instead of redirecting.

use actix_web::{
  body::{EitherBody, MessageBody},
  dev::{ServiceRequest, ServiceResponse},
  http::header,
  middleware::Next,
  Error, HttpResponse,
};
use tracing::debug;

use crate::services::token_service::Claims;
use crate::web::extractors::session_claims;

const MEMBER_PAGES: [&str; 5] = ["/profile", "/favourites", "/cart", "/checkout", "/orders"];
const ADMIN_PAGES: &str = "/admin";
const LOGIN_PAGE: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
  Pass,
  Redirect(String),
}

/// `path` is `prefix` itself or a page below it.
fn under(path: &str, prefix: &str) -> bool {
  path.strip_prefix(prefix).is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn login_redirect(path: &str) -> GateDecision {
  GateDecision::Redirect(format!("{}?callback={}", LOGIN_PAGE, urlencoding::encode(path)))
}

pub fn decide(path: &str, session: Option<&Claims>) -> GateDecision {
  if under(path, "/api") {
    return GateDecision::Pass;
  }
  if under(path, ADMIN_PAGES) {
    return match session {
      None => login_redirect(path),
      Some(claims) if !claims.is_admin => GateDecision::Redirect("/".to_string()),
      Some(_) => GateDecision::Pass,
    };
  }
  if session.is_none() && MEMBER_PAGES.iter().any(|prefix| under(path, prefix)) {
    return login_redirect(path);
  }
  GateDecision::Pass
}

pub async fn page_gate(
  req: ServiceRequest,
  next: Next<impl MessageBody>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, Error> {
  let claims = session_claims(req.request());
  match decide(req.path(), claims.as_ref()) {
    GateDecision::Pass => Ok(next.call(req).await?.map_into_left_body()),
    GateDecision::Redirect(location) => {
      debug!(path = %req.path(), %location, "Gate redirect.");
      let response = HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish();
      Ok(req.into_response(response).map_into_right_body())
    }
  }
}
