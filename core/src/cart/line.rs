// core/src/cart/line.rs

//! Per-line optimistic update state.

use serde::Serialize;

/// Where a cart line stands relative to the server.
///
/// `Pending` and `Failed` remember the quantity the line had before the
/// optimistic change; `0` means the line did not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum LineState {
  #[default]
  Idle,
  Pending { previous_quantity: u32 },
  Failed { previous_quantity: u32, message: String },
}

impl LineState {
  pub fn is_pending(&self) -> bool {
    matches!(self, LineState::Pending { .. })
  }

  pub fn is_failed(&self) -> bool {
    matches!(self, LineState::Failed { .. })
  }

  /// Moves a pending line into the failed state; any other state is
  /// returned unchanged.
  pub fn fail(self, message: impl Into<String>) -> Self {
    match self {
      LineState::Pending { previous_quantity } => LineState::Failed {
        previous_quantity,
        message: message.into(),
      },
      other => other,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_pending_lines_can_fail() {
    let failed = LineState::Pending { previous_quantity: 2 }.fail("offline");
    assert_eq!(
      failed,
      LineState::Failed {
        previous_quantity: 2,
        message: "offline".into()
      }
    );
    assert_eq!(LineState::Idle.fail("offline"), LineState::Idle);
  }
}
