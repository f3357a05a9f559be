//! Form validation engine
//!
//! A [`Form`] is built from a [`FormSchema`] (field name to initial value
//! and [`FieldRules`]). Every field's [`FieldState`] lives in its own reactive
//! cell, and the aggregate `is_valid` / `is_dirty` flags are derived values
//! subscribed to those cells.
//!
//! Feedback is deferred until interaction: a field's error is only computed
//! once it has been touched, or when the whole form is validated before
//! submission.

mod engine;
mod rules;
mod schema;
mod state;

pub use engine::{Form, SubmitOutcome};
pub use rules::{CustomRule, FieldRules, is_blank, is_falsy, text_form};
pub use schema::{FieldDocument, FieldSpec, FormSchema, RulesDocument, SchemaDocument};
pub use state::FieldState;
