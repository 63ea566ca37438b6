// core/src/notify.rs

//! Transient user-facing notices ("toasts").
//!
//! Mutations report their outcome through a [`Notifier`] instead of
//! returning UI strings, so the same engine can drive a terminal, a test
//! log, or a browser bridge.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
  Info,
  Success,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
  pub level: NoticeLevel,
  pub message: String,
  /// The action that failed can be offered again.
  pub retryable: bool,
}

impl Notice {
  pub fn info(message: impl Into<String>) -> Self {
    Self {
      level: NoticeLevel::Info,
      message: message.into(),
      retryable: false,
    }
  }

  pub fn success(message: impl Into<String>) -> Self {
    Self {
      level: NoticeLevel::Success,
      message: message.into(),
      retryable: false,
    }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self {
      level: NoticeLevel::Error,
      message: message.into(),
      retryable: false,
    }
  }

  /// An error notice whose retry flag follows the error's classification.
  pub fn from_error(context: &str, err: &StoreError) -> Self {
    Self {
      level: NoticeLevel::Error,
      message: format!("{}: {}", context, err),
      retryable: err.is_retryable(),
    }
  }
}

pub trait Notifier: Send + Sync {
  fn notify(&self, notice: Notice);
}

/// Forwards notices to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
  fn notify(&self, notice: Notice) {
    match notice.level {
      NoticeLevel::Error => tracing::warn!(retryable = notice.retryable, "{}", notice.message),
      NoticeLevel::Success | NoticeLevel::Info => tracing::info!("{}", notice.message),
    }
  }
}

/// Collects notices in memory until drained.
#[derive(Debug, Default)]
pub struct NoticeLog {
  notices: Mutex<Vec<Notice>>,
}

impl NoticeLog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn snapshot(&self) -> Vec<Notice> {
    self.notices.lock().clone()
  }

  pub fn drain(&self) -> Vec<Notice> {
    std::mem::take(&mut *self.notices.lock())
  }

  pub fn errors(&self) -> Vec<Notice> {
    self
      .notices
      .lock()
      .iter()
      .filter(|n| n.level == NoticeLevel::Error)
      .cloned()
      .collect()
  }
}

impl Notifier for NoticeLog {
  fn notify(&self, notice: Notice) {
    tracing::debug!(level = ?notice.level, "notice: {}", notice.message);
    self.notices.lock().push(notice);
  }
}
