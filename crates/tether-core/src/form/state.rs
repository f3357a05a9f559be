//! Per-field state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current state of one form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldState {
    pub value: Value,
    /// First failing rule's message; `None` when valid or not yet checked.
    pub error: Option<String>,
    pub touched: bool,
    /// Whether `value` differs from the field's initial value.
    pub dirty: bool,
}

impl FieldState {
    /// Pristine state holding `initial`.
    pub fn pristine(initial: Value) -> Self {
        Self {
            value: initial,
            error: None,
            touched: false,
            dirty: false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}
