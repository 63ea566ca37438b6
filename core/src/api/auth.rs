// core/src/api/auth.rs

use async_trait::async_trait;

use super::client::ApiClient;
use crate::error::{StoreError, StoreResult};
use crate::model::{AuthToken, PasswordReset, PasswordResetRequest, PasswordUpdate, SignIn, SignUp, UserProfile};
use crate::session::IdentityProvider;

/// Sessions issued by the storefront's own `/api/auth` endpoints.
///
/// The server sets an httpOnly cookie that the client's cookie jar keeps;
/// the returned access token is also kept as a bearer token for servers
/// reached on a different origin.
#[async_trait]
impl IdentityProvider for ApiClient {
  async fn sign_in(&self, credentials: &SignIn) -> StoreResult<AuthToken> {
    let token: AuthToken = self.post("/api/auth/signin", credentials).await?;
    self.set_bearer(Some(token.access_token.clone()));
    Ok(token)
  }

  async fn sign_up(&self, form: &SignUp) -> StoreResult<UserProfile> {
    self.post("/api/auth/signup", form).await
  }

  async fn sign_out(&self) -> StoreResult<()> {
    let result = self.post_unit("/api/auth/logout", &serde_json::json!({})).await;
    self.set_bearer(None);
    result
  }

  async fn current_user(&self) -> StoreResult<Option<UserProfile>> {
    match self.get("/api/auth/me").await {
      Ok(user) => Ok(Some(user)),
      Err(StoreError::Unauthorized(_)) | Err(StoreError::NotFound(_)) => Ok(None),
      Err(e) => Err(e),
    }
  }
}

impl ApiClient {
  /// Changes the signed-in user's password.
  pub async fn update_password(&self, form: &PasswordUpdate) -> StoreResult<()> {
    form.validate()?;
    self.post_unit("/api/auth/update-password", form).await
  }

  /// Asks for a reset link. The answer is the same whether or not the email
  /// belongs to an account.
  pub async fn request_password_reset(&self, email: &str) -> StoreResult<()> {
    let request = PasswordResetRequest { email: email.trim().to_string() };
    self.post_unit("/api/auth/reset-password", &request).await
  }

  pub async fn reset_password(&self, form: &PasswordReset) -> StoreResult<()> {
    form.validate()?;
    self.post_unit("/api/auth/reset-password/confirm", form).await
  }
}
