//! Per-field validation rules.
//!
//! Rules run in a fixed order and the first failure wins:
//! required, min length, max length, pattern, custom.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

/// Custom predicate: `Some(message)` on failure.
pub type CustomRule = dyn Fn(&Value) -> Option<String> + Send + Sync;

/// Validation rules for one field.
#[derive(Clone, Default)]
pub struct FieldRules {
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    pub custom: Option<Arc<CustomRule>>,
}

impl fmt::Debug for FieldRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRules")
            .field("required", &self.required)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn custom(mut self, rule: impl Fn(&Value) -> Option<String> + Send + Sync + 'static) -> Self {
        self.custom = Some(Arc::new(rule));
        self
    }

    /// Whether any rule is set.
    pub fn is_empty(&self) -> bool {
        !self.required
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
            && self.custom.is_none()
    }

    /// First failing rule's message for `value`, or `None` when it passes.
    pub fn check(&self, field: &str, value: &Value) -> Option<String> {
        if self.required && is_blank(value) {
            return Some(format!("{} is required", field));
        }
        if !self.required && is_falsy(value) {
            return None;
        }

        let text = text_form(value);
        let length = text.chars().count();

        // A zero limit counts as unset.
        if let Some(min) = self.min_length.filter(|n| *n > 0) {
            if length < min {
                return Some(format!("{} must be at least {} characters", field, min));
            }
        }
        if let Some(max) = self.max_length.filter(|n| *n > 0) {
            if length > max {
                return Some(format!("{} must be no more than {} characters", field, max));
            }
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(&text) {
                return Some(format!("{} format is invalid", field));
            }
        }
        self.custom.as_ref().and_then(|rule| rule(value))
    }
}

/// Null, `false`, zero and the empty string.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Falsy, or a text form that is only whitespace.
pub fn is_blank(value: &Value) -> bool {
    is_falsy(value) || text_form(value).trim().is_empty()
}

/// Text a value is measured and matched against.
///
/// Strings are used as-is, arrays join their elements with commas and
/// objects have no meaningful text.
pub fn text_form(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_text(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => text_form(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Integral floats print without a fraction, so `1.0` reads as `1`.
fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{}", f as i128),
        _ => n.to_string(),
    }
}
