//! Delete Confirmation Dialog: a yes/no gate in front of deletion.
//!
//! Only [`ConfirmAction::Confirm`] can release the gate. Clicking outside the
//! dialog does nothing at all; it neither confirms nor closes.

use serde::{Deserialize, Serialize};

use crate::types::RecordId;

/// User interactions the dialog can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmAction {
    /// The explicit confirm control.
    Confirm,
    /// The explicit cancel control.
    Cancel,
    /// Escape key.
    Dismiss,
    /// Pointer press outside the dialog.
    OutsideClick,
}

/// Result of feeding an action to the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmDecision {
    /// Delete this record, then close.
    Confirmed(RecordId),
    /// Close without touching the store.
    Cancelled,
    /// Ignore the action and stay open.
    StillOpen,
}

/// Pending deletion of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirmation {
    target: RecordId,
}

impl DeleteConfirmation {
    pub fn new(target: impl Into<RecordId>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn resolve(&self, action: ConfirmAction) -> ConfirmDecision {
        match action {
            ConfirmAction::Confirm => ConfirmDecision::Confirmed(self.target.clone()),
            ConfirmAction::Cancel | ConfirmAction::Dismiss => ConfirmDecision::Cancelled,
            ConfirmAction::OutsideClick => ConfirmDecision::StillOpen,
        }
    }
}
