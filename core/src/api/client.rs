// core/src/api/client.rs

use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use tracing::instrument;

use crate::error::{FieldErrors, StoreError, StoreResult};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Error body the storefront API answers with.
#[derive(Debug, Deserialize)]
struct ErrorBody {
  #[serde(default)]
  error: Option<String>,
  #[serde(default)]
  fields: Option<FieldErrors>,
}

/// HTTP access to the storefront API.
///
/// Cloning is cheap and clones share the cookie jar and bearer token, so a
/// sign-in through one handle authenticates all of them.
#[derive(Debug, Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: Arc<str>,
  bearer: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
  pub fn new(base_url: impl AsRef<str>) -> StoreResult<Self> {
    let http = reqwest::Client::builder()
      .cookie_store(true)
      .build()
      .map_err(|e| StoreError::Internal(format!("HTTP client could not be built: {}", e)))?;
    Ok(Self {
      http,
      base_url: Arc::from(base_url.as_ref().trim_end_matches('/')),
      bearer: Arc::new(RwLock::new(None)),
    })
  }

  /// Reads `STOREFRONT_API_URL`, falling back to a local server.
  pub fn from_env() -> StoreResult<Self> {
    let base_url = env::var("STOREFRONT_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    tracing::debug!(%base_url, "Storefront API client configured.");
    Self::new(base_url)
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  pub fn set_bearer(&self, token: Option<String>) {
    *self.bearer.write() = token;
  }

  pub fn has_bearer(&self) -> bool {
    self.bearer.read().is_some()
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let builder = self.http.request(method, self.url(path));
    match self.bearer.read().as_deref() {
      Some(token) => builder.bearer_auth(token),
      None => builder,
    }
  }

  /// Turns a non-success response into a `StoreError`.
  async fn check(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let body: Option<ErrorBody> = serde_json::from_str(&text).ok();
    let message = body
      .as_ref()
      .and_then(|b| b.error.clone())
      .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    if let Some(fields) = body.and_then(|b| b.fields).filter(|f| !f.is_empty()) {
      return Err(StoreError::Validation(fields));
    }
    Err(StoreError::from_status(status.as_u16(), message))
  }

  async fn send(&self, builder: RequestBuilder) -> StoreResult<Response> {
    let response = builder.send().await.map_err(StoreError::from)?;
    Self::check(response).await
  }

  async fn decode<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
    response.json::<T>().await.map_err(StoreError::from)
  }

  #[instrument(name = "api::get", skip(self))]
  pub async fn get<T: DeserializeOwned>(&self, path: &str) -> StoreResult<T> {
    let response = self.send(self.request(Method::GET, path)).await?;
    Self::decode(response).await
  }

  #[instrument(name = "api::get_query", skip(self, query))]
  pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> StoreResult<T> {
    let response = self.send(self.request(Method::GET, path).query(query)).await?;
    Self::decode(response).await
  }

  /// Like [`get`](Self::get), but a 404 is an absent value.
  pub async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> StoreResult<Option<T>> {
    match self.get(path).await {
      Ok(value) => Ok(Some(value)),
      Err(StoreError::NotFound(_)) => Ok(None),
      Err(e) => Err(e),
    }
  }

  #[instrument(name = "api::post", skip(self, body))]
  pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> StoreResult<T> {
    let response = self.send(self.request(Method::POST, path).json(body)).await?;
    Self::decode(response).await
  }

  /// POST whose response body is not needed.
  #[instrument(name = "api::post_unit", skip(self, body))]
  pub async fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> StoreResult<()> {
    self.send(self.request(Method::POST, path).json(body)).await?;
    Ok(())
  }

  #[instrument(name = "api::patch", skip(self, body))]
  pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> StoreResult<T> {
    let response = self.send(self.request(Method::PATCH, path).json(body)).await?;
    Self::decode(response).await
  }

  /// PATCH that may answer `204 No Content`, read as `None`.
  pub async fn patch_optional<B: Serialize + ?Sized, T: DeserializeOwned>(
    &self,
    path: &str,
    body: &B,
  ) -> StoreResult<Option<T>> {
    let response = self.send(self.request(Method::PATCH, path).json(body)).await?;
    if response.status() == StatusCode::NO_CONTENT {
      return Ok(None);
    }
    Self::decode(response).await.map(Some)
  }

  #[instrument(name = "api::delete", skip(self))]
  pub async fn delete(&self, path: &str) -> StoreResult<()> {
    self.send(self.request(Method::DELETE, path)).await?;
    Ok(())
  }

  #[instrument(name = "api::delete_body", skip(self, body))]
  pub async fn delete_with_body<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> StoreResult<()> {
    self.send(self.request(Method::DELETE, path).json(body)).await?;
    Ok(())
  }
}
