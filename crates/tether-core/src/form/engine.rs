//! The form state machine.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::schema::{FieldSpec, FormSchema};
use super::state::FieldState;
use crate::error::{TetherError, TetherResult};
use crate::reactive::{Computed, Observe, ReactiveCell};

/// Result of [`Form::submit_form`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The handler ran and returned `Ok`.
    Submitted,
    /// Validation failed; the handler was not called.
    Invalid,
    /// The handler returned an error or panicked.
    HandlerFailed(String),
}

impl SubmitOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted)
    }
}

struct FieldSlot {
    name: String,
    spec: FieldSpec,
    initial: Value,
    cell: ReactiveCell<FieldState>,
}

/// Multi-field form with validation and derived validity.
///
/// Each field lives in its own [`ReactiveCell`]; `is_valid` and `is_dirty`
/// are [`Computed`] values subscribed to every field cell. The set of fields
/// is fixed by the schema; naming any other field is a
/// [`TetherError::UnknownField`].
pub struct Form {
    fields: Vec<FieldSlot>,
    index: HashMap<String, usize>,
    is_valid: Computed<bool>,
    is_dirty: Computed<bool>,
    is_submitting: ReactiveCell<bool>,
    submit_count: ReactiveCell<u32>,
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("fields", &self.fields.iter().map(|s| &s.name).collect::<Vec<_>>())
            .field("is_valid", &self.is_valid.get())
            .field("is_dirty", &self.is_dirty.get())
            .field("submit_count", &self.submit_count.get())
            .finish()
    }
}

impl Form {
    pub fn new(schema: FormSchema) -> Self {
        let fields: Vec<FieldSlot> = schema
            .fields()
            .map(|(name, spec)| {
                let initial = spec.effective_initial();
                FieldSlot {
                    name: name.to_string(),
                    spec: spec.clone(),
                    cell: ReactiveCell::new(FieldState::pristine(initial.clone())),
                    initial,
                }
            })
            .collect();
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, slot)| (slot.name.clone(), i))
            .collect();

        let cells: Vec<ReactiveCell<FieldState>> = fields.iter().map(|s| s.cell.clone()).collect();
        let sources: Vec<&dyn Observe> = cells.iter().map(|c| c as &dyn Observe).collect();
        let is_valid = {
            let cells = cells.clone();
            Computed::new(&sources, move || cells.iter().all(|c| c.with(FieldState::is_valid)))
        };
        let is_dirty = {
            let cells = cells.clone();
            Computed::new(&sources, move || cells.iter().any(|c| c.with(|s| s.dirty)))
        };

        debug!(fields = fields.len(), "form created");
        Self {
            fields,
            index,
            is_valid,
            is_dirty,
            is_submitting: ReactiveCell::new(false),
            submit_count: ReactiveCell::new(0),
        }
    }

    fn slot(&self, name: &str) -> TetherResult<&FieldSlot> {
        self.index
            .get(name)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| TetherError::unknown_field(name))
    }

    /// Run `name`'s rules against `value` without touching its state.
    pub fn validate_field(&self, name: &str, value: &Value) -> TetherResult<Option<String>> {
        let slot = self.slot(name)?;
        Ok(slot.spec.rules.check(&slot.name, value))
    }

    /// Store a new value. Errors are refreshed only for touched fields.
    pub fn set_field_value(&self, name: &str, value: impl Into<Value>) -> TetherResult<()> {
        let slot = self.slot(name)?;
        let value = value.into();
        let dirty = value != slot.initial;
        let error = slot.cell.with(|s| s.touched).then(|| slot.spec.rules.check(&slot.name, &value));

        slot.cell.update(|state| {
            state.value = value;
            state.dirty = dirty;
            if let Some(error) = error {
                state.error = error;
            }
        });
        debug!(field = name, dirty, "field value updated");
        Ok(())
    }

    /// Mark a field touched (and validate it) or untouched.
    pub fn set_field_touched(&self, name: &str, touched: bool) -> TetherResult<()> {
        let slot = self.slot(name)?;
        slot.cell.update(|state| {
            state.touched = touched;
            if touched {
                state.error = slot.spec.rules.check(&slot.name, &state.value);
            }
        });
        Ok(())
    }

    /// Set or clear a field's error directly.
    pub fn set_field_error(&self, name: &str, error: Option<String>) -> TetherResult<()> {
        let slot = self.slot(name)?;
        slot.cell.update(|state| state.error = error);
        Ok(())
    }

    /// Validate and touch every field. `true` when no field has an error.
    pub fn validate_form(&self) -> bool {
        let mut valid = true;
        for slot in &self.fields {
            slot.cell.update(|state| {
                state.error = slot.spec.rules.check(&slot.name, &state.value);
                state.touched = true;
                valid &= state.error.is_none();
            });
        }
        debug!(valid, errors = ?self.errors(), "form validated");
        valid
    }

    /// Validate, then run `handler` with the aggregate values.
    ///
    /// The handler is not called when validation fails. The submitting flag
    /// is cleared when the handler finishes, fails, panics, or this future is
    /// dropped.
    pub async fn submit_form<F, Fut>(&self, handler: F) -> SubmitOutcome
    where
        F: FnOnce(Value) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        self.submit_count.update(|count| *count += 1);

        if !self.validate_form() {
            for error in self.validation_errors() {
                warn!(error = %error, "form submission blocked");
            }
            return SubmitOutcome::Invalid;
        }

        let _submitting = SubmittingGuard::start(&self.is_submitting);
        let values = self.values();
        let result = AssertUnwindSafe(async move { handler(values).await })
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(())) => {
                info!("form submitted");
                SubmitOutcome::Submitted
            }
            Ok(Err(e)) => {
                let error = TetherError::submit_handler(format!("{:#}", e));
                warn!(error = %error, "form submission failed");
                SubmitOutcome::HandlerFailed(e.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(panic = %message, "form submit handler panicked");
                SubmitOutcome::HandlerFailed(message)
            }
        }
    }

    /// Restore every field to its initial value and clear submit state.
    pub fn reset_form(&self) {
        for slot in &self.fields {
            slot.cell.set(FieldState::pristine(slot.initial.clone()));
        }
        self.is_submitting.set(false);
        self.submit_count.set(0);
        debug!("form reset");
    }

    /// Snapshot of one field.
    pub fn field(&self, name: &str) -> TetherResult<FieldState> {
        Ok(self.slot(name)?.cell.get())
    }

    /// Cell holding one field's state, for subscriptions.
    pub fn field_cell(&self, name: &str) -> TetherResult<ReactiveCell<FieldState>> {
        Ok(self.slot(name)?.cell.clone())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|s| s.name.as_str())
    }

    /// Current values as a JSON object keyed by field name.
    pub fn values(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|s| (s.name.clone(), s.cell.with(|state| state.value.clone())))
            .collect();
        Value::Object(map)
    }

    /// Current values deserialized into `T`.
    pub fn values_as<T: DeserializeOwned>(&self) -> TetherResult<T> {
        Ok(serde_json::from_value(self.values())?)
    }

    /// Messages of every field that currently has an error.
    pub fn errors(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter_map(|s| s.cell.with(|state| state.error.clone()).map(|e| (s.name.clone(), e)))
            .collect()
    }

    /// Current field errors as [`TetherError::Validation`], in declaration order.
    pub fn validation_errors(&self) -> Vec<TetherError> {
        self.fields
            .iter()
            .filter_map(|s| {
                s.cell
                    .with(|state| state.error.clone())
                    .map(|message| TetherError::validation(s.name.clone(), message))
            })
            .collect()
    }

    /// Names of touched fields in declaration order.
    pub fn touched_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|s| s.cell.with(|state| state.touched))
            .map(|s| s.name.clone())
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid.get()
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty.get()
    }

    /// Derived validity, for subscriptions.
    pub fn validity(&self) -> &Computed<bool> {
        &self.is_valid
    }

    /// Derived dirtiness, for subscriptions.
    pub fn dirtiness(&self) -> &Computed<bool> {
        &self.is_dirty
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting.get()
    }

    pub fn submitting_cell(&self) -> &ReactiveCell<bool> {
        &self.is_submitting
    }

    pub fn submit_count(&self) -> u32 {
        self.submit_count.get()
    }

    pub fn submit_count_cell(&self) -> &ReactiveCell<u32> {
        &self.submit_count
    }
}

struct SubmittingGuard<'a>(&'a ReactiveCell<bool>);

impl<'a> SubmittingGuard<'a> {
    fn start(flag: &'a ReactiveCell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("handler panicked: {}", s)
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnifiedError;
    use crate::form::FieldRules;
    use parking_lot::Mutex;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Arc;

    fn signup_schema() -> FormSchema {
        FormSchema::new()
            .field("name", FieldSpec::new().rules(FieldRules::new().required().min_length(2)))
            .field("email", FieldSpec::new().initial("a@b.c").rules(FieldRules::new().required()))
            .field("bio", FieldSpec::new().rules(FieldRules::new().max_length(10)))
    }

    #[test]
    fn test_initial_state() {
        let form = Form::new(signup_schema());
        assert_eq!(form.field("name").unwrap(), FieldState::pristine(json!("")));
        assert_eq!(form.values(), json!({"name": "", "email": "a@b.c", "bio": ""}));
        assert!(form.is_valid());
        assert!(!form.is_dirty());
        assert!(form.touched_fields().is_empty());
    }

    #[test]
    fn test_untouched_field_shows_no_error() {
        let form = Form::new(signup_schema());
        form.set_field_value("name", "x").unwrap();

        let name = form.field("name").unwrap();
        assert_eq!(name.error, None);
        assert!(name.dirty);
        assert!(form.is_dirty());
        assert!(form.is_valid());
    }

    #[test]
    fn test_touch_validates_and_later_edits_revalidate() {
        let form = Form::new(signup_schema());
        form.set_field_touched("name", true).unwrap();
        assert_eq!(form.field("name").unwrap().error.as_deref(), Some("name is required"));
        assert!(!form.is_valid());

        form.set_field_value("name", "a").unwrap();
        assert_eq!(
            form.field("name").unwrap().error.as_deref(),
            Some("name must be at least 2 characters")
        );

        form.set_field_value("name", "ada").unwrap();
        assert_eq!(form.field("name").unwrap().error, None);
        assert!(form.is_valid());
    }

    #[test]
    fn test_untouching_keeps_error() {
        let form = Form::new(signup_schema());
        form.set_field_touched("name", true).unwrap();
        form.set_field_touched("name", false).unwrap();
        let name = form.field("name").unwrap();
        assert!(!name.touched);
        assert!(name.error.is_some());
    }

    #[test]
    fn test_dirty_tracks_initial_value() {
        let form = Form::new(signup_schema());
        form.set_field_value("email", "x@y.z").unwrap();
        assert!(form.is_dirty());
        form.set_field_value("email", "a@b.c").unwrap();
        assert!(!form.is_dirty());
    }

    #[test]
    fn test_validate_form_touches_everything() {
        let form = Form::new(signup_schema());
        assert!(!form.validate_form());
        assert_eq!(form.touched_fields(), vec!["name", "email", "bio"]);
        assert_eq!(
            form.errors(),
            BTreeMap::from([("name".to_string(), "name is required".to_string())])
        );
    }

    #[test]
    fn test_validation_errors_follow_field_order() {
        let form = Form::new(signup_schema());
        form.set_field_value("bio", json!("far too long for a bio")).unwrap();
        form.validate_form();

        let errors = form.validation_errors();
        assert_eq!(errors.len(), 2);
        assert!(matches!(&errors[0], TetherError::Validation { field, .. } if field == "name"));
        assert_eq!(errors[1].error_code(), "TETHER_VALIDATION");
        assert_eq!(errors[1].message(), "bio must be no more than 10 characters");
        assert_eq!(errors[1].context(), Some("bio"));
    }

    #[test]
    fn test_manual_error() {
        let form = Form::new(signup_schema());
        form.set_field_error("email", Some("already taken".to_string())).unwrap();
        assert!(!form.is_valid());
        form.set_field_error("email", None).unwrap();
        assert!(form.is_valid());
    }

    #[test]
    fn test_unknown_field() {
        let form = Form::new(signup_schema());
        assert_eq!(
            form.set_field_value("age", 3),
            Err(TetherError::UnknownField { name: "age".to_string() })
        );
        assert!(form.field("age").is_err());
        assert!(form.validate_field("age", &json!(1)).is_err());
    }

    #[test]
    fn test_validity_notifies_subscribers() {
        let form = Form::new(signup_schema());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let _sub = form.validity().subscribe(move |v, _| seen_clone.lock().push(*v));

        form.set_field_touched("name", true).unwrap();
        form.set_field_value("name", "ada").unwrap();
        form.set_field_value("bio", "short").unwrap();
        assert_eq!(*seen.lock(), vec![false, true]);
    }

    #[test]
    fn test_reset_form() {
        let form = Form::new(signup_schema());
        form.set_field_value("name", "ada").unwrap();
        form.validate_form();
        form.reset_form();

        assert_eq!(form.field("name").unwrap(), FieldState::pristine(json!("")));
        assert!(form.touched_fields().is_empty());
        assert!(!form.is_dirty());
        assert_eq!(form.submit_count(), 0);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Signup {
        name: String,
        email: String,
        bio: String,
    }

    #[test]
    fn test_values_as() {
        let form = Form::new(signup_schema());
        form.set_field_value("name", "ada").unwrap();
        let signup: Signup = form.values_as().unwrap();
        assert_eq!(
            signup,
            Signup {
                name: "ada".to_string(),
                email: "a@b.c".to_string(),
                bio: String::new(),
            }
        );
    }

    #[tokio::test]
    async fn test_submit_invalid_skips_handler() {
        let form = Form::new(signup_schema());
        let called = Arc::new(Mutex::new(false));
        let called_clone = Arc::clone(&called);

        let outcome = form
            .submit_form(|_| async move {
                *called_clone.lock() = true;
                Ok(())
            })
            .await;

        assert_eq!(outcome, SubmitOutcome::Invalid);
        assert!(!*called.lock());
        assert_eq!(form.submit_count(), 1);
        assert!(form.field("name").unwrap().touched);
    }

    #[tokio::test]
    async fn test_submit_passes_values_and_clears_flag() {
        let form = Form::new(signup_schema());
        form.set_field_value("name", "ada").unwrap();
        let received = Arc::new(Mutex::new(None));
        let received_clone = Arc::clone(&received);
        let submitting = form.submitting_cell().clone();

        let outcome = form
            .submit_form(|values| async move {
                assert!(submitting.get());
                *received_clone.lock() = Some(values);
                Ok(())
            })
            .await;

        assert!(outcome.is_submitted());
        assert_eq!(received.lock().clone(), Some(json!({"name": "ada", "email": "a@b.c", "bio": ""})));
        assert!(!form.is_submitting());
    }

    fn form_is_broken() -> bool {
        true
    }

    #[tokio::test]
    async fn test_handler_error_and_panic_are_caught() {
        let form = Form::new(signup_schema());
        form.set_field_value("name", "ada").unwrap();

        let outcome = form.submit_form(|_| async { Err(anyhow::anyhow!("server said no")) }).await;
        assert_eq!(outcome, SubmitOutcome::HandlerFailed("server said no".to_string()));
        assert!(!form.is_submitting());

        let outcome = form
            .submit_form(|_| async {
                if form_is_broken() {
                    panic!("boom");
                }
                Ok(())
            })
            .await;
        assert_eq!(outcome, SubmitOutcome::HandlerFailed("handler panicked: boom".to_string()));
        assert!(!form.is_submitting());
        assert_eq!(form.submit_count(), 2);
    }
}
