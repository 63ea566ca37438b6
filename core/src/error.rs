// core/src/error.rs
use anyhow::Error as AnyhowError;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Field-level validation messages, keyed by the camelCase field name the
/// form uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
    let mut errors = Self::new();
    errors.add(field, message);
    errors
  }

  /// Records the first message for a field; later messages for the same
  /// field are ignored so the form shows one problem at a time.
  pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
    self.0.entry(field.into()).or_insert_with(|| message.into());
  }

  pub fn get(&self, field: &str) -> Option<&str> {
    self.0.get(field).map(String::as_str)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  /// `Ok(())` when nothing was recorded, otherwise a validation error.
  pub fn into_result(self) -> StoreResult<()> {
    if self.is_empty() {
      Ok(())
    } else {
      Err(StoreError::Validation(self))
    }
  }
}

impl fmt::Display for FieldErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, message) in &self.0 {
      if !first {
        f.write_str("; ")?;
      }
      write!(f, "{}: {}", field, message)?;
      first = false;
    }
    Ok(())
  }
}

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Validation failed: {0}")]
  Validation(FieldErrors),

  #[error("Not found: {0}")]
  NotFound(String),

  #[error("Unauthorized: {0}")]
  Unauthorized(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Request failed with status {status}: {message}")]
  Api { status: u16, message: String },

  #[error("Transport error. Source: {source}")]
  Transport {
    #[source]
    source: AnyhowError,
  },

  #[error("Local storage error: {0}")]
  Storage(String),

  #[error("Internal storefront error: {0}")]
  Internal(String),
}

impl StoreError {
  /// Maps an HTTP status and the server's message onto the error taxonomy.
  pub fn from_status(status: u16, message: impl Into<String>) -> Self {
    let message = message.into();
    match status {
      400 | 422 => StoreError::Validation(FieldErrors::single("form", message)),
      401 => StoreError::Unauthorized(message),
      403 => StoreError::Forbidden(message),
      404 => StoreError::NotFound(message),
      409 => StoreError::Conflict(message),
      _ => StoreError::Api { status, message },
    }
  }

  /// The HTTP-like status this error corresponds to, if any.
  pub fn status(&self) -> Option<u16> {
    match self {
      StoreError::Validation(_) => Some(400),
      StoreError::Unauthorized(_) => Some(401),
      StoreError::Forbidden(_) => Some(403),
      StoreError::NotFound(_) => Some(404),
      StoreError::Conflict(_) => Some(409),
      StoreError::Api { status, .. } => Some(*status),
      StoreError::Transport { .. } | StoreError::Storage(_) | StoreError::Internal(_) => None,
    }
  }

  /// Whether repeating the same request may succeed: network failures,
  /// throttling and server-side errors.
  pub fn is_retryable(&self) -> bool {
    match self {
      StoreError::Transport { .. } => true,
      StoreError::Api { status, .. } => *status == 429 || *status >= 500,
      _ => false,
    }
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, StoreError::NotFound(_))
  }
}

/// Settles a read that degrades instead of failing: the error is logged and
/// the empty value is returned.
pub(crate) fn or_empty<T: Default>(read: &str, result: StoreResult<T>) -> T {
  result.unwrap_or_else(|e| {
    tracing::warn!(read, error = %e, "Read failed; showing nothing.");
    T::default()
  })
}

impl From<reqwest::Error> for StoreError {
  fn from(err: reqwest::Error) -> Self {
    if let Some(status) = err.status() {
      return StoreError::from_status(status.as_u16(), err.to_string());
    }
    StoreError::Transport { source: err.into() }
  }
}

impl From<serde_json::Error> for StoreError {
  fn from(err: serde_json::Error) -> Self {
    StoreError::Storage(format!("Malformed JSON: {}", err))
  }
}

impl From<std::io::Error> for StoreError {
  fn from(err: std::io::Error) -> Self {
    StoreError::Storage(err.to_string())
  }
}

pub type StoreResult<T, E = StoreError> = std::result::Result<T, E>;
