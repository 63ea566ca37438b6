// core/src/session.rs

//! Authentication state as an explicit, observable context.
//!
//! A [`SessionContext`] owns the current [`Session`] and publishes every
//! change on a `tokio::sync::watch` channel. Components that care about
//! sign-in transitions (the cart engine in particular) subscribe to it
//! instead of reading global state.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::model::{AuthToken, SignIn, SignUp, UserProfile};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
  pub user: Option<UserProfile>,
}

impl Session {
  pub fn anonymous() -> Self {
    Self::default()
  }

  pub fn authenticated(user: UserProfile) -> Self {
    Self { user: Some(user) }
  }

  pub fn is_authenticated(&self) -> bool {
    self.user.is_some()
  }

  pub fn is_admin(&self) -> bool {
    self.user.as_ref().is_some_and(|u| u.is_admin)
  }

  pub fn user_id(&self) -> Option<Uuid> {
    self.user.as_ref().map(|u| u.id)
  }
}

/// Whoever issues and checks sessions.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
  async fn sign_in(&self, credentials: &SignIn) -> StoreResult<AuthToken>;
  async fn sign_up(&self, form: &SignUp) -> StoreResult<UserProfile>;
  async fn sign_out(&self) -> StoreResult<()>;
  /// The user the current session cookie belongs to, `None` when signed out.
  async fn current_user(&self) -> StoreResult<Option<UserProfile>>;
}

#[async_trait]
impl<T: IdentityProvider + ?Sized> IdentityProvider for Arc<T> {
  async fn sign_in(&self, credentials: &SignIn) -> StoreResult<AuthToken> {
    (**self).sign_in(credentials).await
  }

  async fn sign_up(&self, form: &SignUp) -> StoreResult<UserProfile> {
    (**self).sign_up(form).await
  }

  async fn sign_out(&self) -> StoreResult<()> {
    (**self).sign_out().await
  }

  async fn current_user(&self) -> StoreResult<Option<UserProfile>> {
    (**self).current_user().await
  }
}

pub struct SessionContext<P: IdentityProvider> {
  provider: P,
  tx: watch::Sender<Session>,
}

impl<P: IdentityProvider> SessionContext<P> {
  pub fn new(provider: P) -> Self {
    let (tx, _rx) = watch::channel(Session::anonymous());
    Self { provider, tx }
  }

  pub fn provider(&self) -> &P {
    &self.provider
  }

  pub fn session(&self) -> Session {
    self.tx.borrow().clone()
  }

  pub fn user(&self) -> Option<UserProfile> {
    self.tx.borrow().user.clone()
  }

  pub fn is_authenticated(&self) -> bool {
    self.tx.borrow().is_authenticated()
  }

  pub fn is_admin(&self) -> bool {
    self.tx.borrow().is_admin()
  }

  /// A receiver that sees the current session and every later change.
  pub fn subscribe(&self) -> watch::Receiver<Session> {
    self.tx.subscribe()
  }

  fn publish(&self, session: Session) {
    self.tx.send_if_modified(|current| {
      if *current == session {
        false
      } else {
        *current = session;
        true
      }
    });
  }

  #[instrument(name = "session::login", skip(self, credentials), fields(email = %credentials.email))]
  pub async fn login(&self, credentials: &SignIn) -> StoreResult<UserProfile> {
    let token = self.provider.sign_in(credentials).await?;
    tracing::info!(user_id = %token.user.id, "Signed in.");
    self.publish(Session::authenticated(token.user.clone()));
    Ok(token.user)
  }

  /// Registers a new account. The session stays anonymous until `login`.
  #[instrument(name = "session::sign_up", skip(self, form), fields(email = %form.email))]
  pub async fn sign_up(&self, form: &SignUp) -> StoreResult<UserProfile> {
    form.validate()?;
    self.provider.sign_up(form).await
  }

  /// Drops the session locally even when the provider call fails.
  #[instrument(name = "session::logout", skip(self))]
  pub async fn logout(&self) -> StoreResult<()> {
    let result = self.provider.sign_out().await;
    if let Err(e) = &result {
      tracing::warn!(error = %e, "Sign-out request failed; clearing the local session anyway.");
    }
    self.publish(Session::anonymous());
    result
  }

  /// Re-reads the session from the provider, e.g. on start-up.
  #[instrument(name = "session::restore", skip(self))]
  pub async fn restore(&self) -> StoreResult<Session> {
    let session = match self.provider.current_user().await {
      Ok(Some(user)) => Session::authenticated(user),
      Ok(None) | Err(StoreError::Unauthorized(_)) => Session::anonymous(),
      Err(e) => return Err(e),
    };
    self.publish(session.clone());
    Ok(session)
  }
}
