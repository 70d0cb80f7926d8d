//! The form controller.
//!
//! A [`Form`] owns the values and errors of every field declared in its
//! [`FormSchema`]. It is the only writer to that state: screens read
//! snapshots with [`Form::state`] and send input through the change
//! handlers (or [`Form::dispatch`]).
//!
//! Every edit re-runs the full rule set, but errors stay hidden until the
//! first submit attempt. A blocked submit shows them; from then on they
//! update live with each edit until a submit passes validation.
//!
//! # Example
//!
//! ```
//! use trellis::form::{
//!     ChangeEvent, FieldSchema, Form, FormSchema, RulesByField, Submitter, validator, validators,
//! };
//!
//! let schema = FormSchema::new().field("name", FieldSchema::text());
//! let mut rules = RulesByField::new();
//! rules.insert("name".into(), vec![validator(validators::validate_length(2, 10), "too short/long")]);
//! let form = Form::new(schema, rules);
//!
//! form.change_field("name", &ChangeEvent::Input("a".into())).unwrap();
//! assert!(!form.state().show_field_errors);
//!
//! let submitter = Submitter::new(|fields| async move { Ok::<_, String>(fields) });
//! let outcome = futures_util::FutureExt::now_or_never(form.submit(&submitter)).unwrap();
//! assert!(outcome.is_invalid());
//! assert!(form.state().show_field_errors);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use trellis_core::logging::{span_names, targets};
use trellis_core::{PerfSpan, Property, Signal};

use super::schema::{ChangeEvent, FieldSchema, FormSchema};
use super::submit::{SubmitOutcome, SubmitStatus, Submitter};
use super::validation::{ErrorsByField, FieldError, FieldMap, RuleSet, RulesByField, run_validation_rules};
use crate::error::{FormError, FormResult};

/// Snapshot of a form's state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormState {
    /// Current value of every schema field.
    pub fields: FieldMap,
    /// Failures of the most recent validation pass.
    pub field_errors: ErrorsByField,
    /// Whether errors should be displayed.
    pub show_field_errors: bool,
}

impl FormState {
    /// The errors to display: all of them after a blocked submit, none
    /// while errors are hidden.
    pub fn visible_errors(&self) -> Option<&ErrorsByField> {
        self.show_field_errors.then_some(&self.field_errors)
    }

    /// The displayed error of `field`, if any.
    pub fn error(&self, field: &str) -> Option<&FieldError> {
        self.visible_errors()?.get(field)
    }

    /// Returns true if the last validation pass found no failures.
    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty()
    }
}

/// A form state transition, for adapters that route all input through one
/// entry point.
#[derive(Debug, Clone, PartialEq)]
pub enum FormAction<E = ChangeEvent> {
    /// Change a scalar field.
    Change { field: String, event: E },
    /// Change one element of an array field.
    ChangeAt { field: String, index: usize, event: E },
    /// Append the default element to an array field.
    Add { field: String },
    /// Remove one element of an array field.
    Remove { field: String, index: usize },
    /// Run validation.
    Validate,
    /// Restore the initial state.
    Reset,
}

/// Handler for a scalar field change.
pub type ChangeHandler<E> = Arc<dyn Fn(&E) -> FormResult<()> + Send + Sync>;

/// Handler for an indexed array field change.
pub type ChangeAtHandler<E> = Arc<dyn Fn(usize, &E) -> FormResult<()> + Send + Sync>;

/// Handler appending to an array field, returning the new element's index.
pub type AddHandler = Arc<dyn Fn() -> FormResult<usize> + Send + Sync>;

/// A handler bound to one field of a form.
pub enum FieldHandler<E = ChangeEvent> {
    /// `on_change_<field>` of a scalar field.
    Change(ChangeHandler<E>),
    /// `on_change_<field>` of an array field.
    ChangeAt(ChangeAtHandler<E>),
    /// `on_add_<field>` of an array field.
    Add(AddHandler),
}

impl<E> Clone for FieldHandler<E> {
    fn clone(&self) -> Self {
        match self {
            FieldHandler::Change(h) => FieldHandler::Change(h.clone()),
            FieldHandler::ChangeAt(h) => FieldHandler::ChangeAt(h.clone()),
            FieldHandler::Add(h) => FieldHandler::Add(h.clone()),
        }
    }
}

impl<E> fmt::Debug for FieldHandler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldHandler::Change(_) => f.write_str("Change(..)"),
            FieldHandler::ChangeAt(_) => f.write_str("ChangeAt(..)"),
            FieldHandler::Add(_) => f.write_str("Add(..)"),
        }
    }
}

/// Every handler of a form, by name.
pub struct FormHandlers<E = ChangeEvent> {
    handlers: BTreeMap<String, FieldHandler<E>>,
}

impl<E> FormHandlers<E> {
    /// Looks up a handler by name.
    pub fn get(&self, name: &str) -> Option<&FieldHandler<E>> {
        self.handlers.get(name)
    }

    /// Handler names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Number of handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if there are no handlers.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<E> fmt::Debug for FormHandlers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.handlers.iter()).finish()
    }
}

/// Converts a field name to snake case, keeping acronyms together.
///
/// `"netbootEnabled"` becomes `"netboot_enabled"` and `"bmcIPAddress"`
/// becomes `"bmc_ip_address"`.
fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p == '_' => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Name of the change handler of `field`.
pub fn change_handler_name(field: &str) -> String {
    format!("on_change_{}", snake_case(field))
}

/// Name of the add handler of array field `field`.
pub fn add_handler_name(field: &str) -> String {
    format!("on_add_{}", snake_case(field))
}

/// A stateful form over change events of type `E`.
pub struct Form<E = ChangeEvent> {
    schema: FormSchema<E>,
    rule_set: RuleSet,
    props: RwLock<Value>,
    rules: RwLock<RulesByField>,
    state: Property<FormState>,
    state_changed: Signal<FormState>,
    submitted: Signal<SubmitStatus>,
}

impl<E: 'static> Form<E> {
    /// Creates a form with `null` props.
    pub fn new(schema: FormSchema<E>, rules: impl Into<RuleSet>) -> Self {
        Self::with_props(schema, rules, Value::Null)
    }

    /// Creates a form whose defaults and rules may read `props`.
    ///
    /// Errors start empty; the first validation runs on the first edit,
    /// [`validate`](Self::validate) or [`submit`](Self::submit).
    pub fn with_props(schema: FormSchema<E>, rules: impl Into<RuleSet>, props: Value) -> Self {
        let rule_set = rules.into();
        let fields = schema.initial_fields(&props);
        let rules = rule_set.resolve(&props);
        tracing::debug!(
            target: targets::FORM,
            fields = schema.len(),
            rules = rules.len(),
            "created form"
        );
        Self {
            schema,
            rule_set,
            props: RwLock::new(props),
            rules: RwLock::new(rules),
            state: Property::new(FormState {
                fields,
                ..FormState::default()
            }),
            state_changed: Signal::new(),
            submitted: Signal::new(),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> FormState {
        self.state.get()
    }

    /// Snapshot of the current field values.
    pub fn fields(&self) -> FieldMap {
        self.state.with(|state| state.fields.clone())
    }

    /// The current props.
    pub fn props(&self) -> Value {
        self.props.read().clone()
    }

    /// The form schema.
    pub fn schema(&self) -> &FormSchema<E> {
        &self.schema
    }

    /// Signal emitted with the new state after each effective change.
    pub fn state_changed(&self) -> &Signal<FormState> {
        &self.state_changed
    }

    /// Signal emitted with the outcome kind of each submit.
    pub fn submitted(&self) -> &Signal<SubmitStatus> {
        &self.submitted
    }

    fn field_schema(&self, field: &str) -> FormResult<&FieldSchema<E>> {
        self.schema
            .get(field)
            .ok_or_else(|| FormError::unknown_field(field))
    }

    fn array_schema(&self, field: &str) -> FormResult<&FieldSchema<E>> {
        let schema = self.field_schema(field)?;
        if schema.is_array() {
            Ok(schema)
        } else {
            Err(FormError::not_an_array(field))
        }
    }

    /// Applies `f` to the fields and re-validates, atomically.
    ///
    /// Nothing changes if `f` fails.
    fn edit<T>(&self, f: impl FnOnce(&mut FieldMap) -> FormResult<T>) -> FormResult<T> {
        let rules = self.rules.read().clone();
        let (result, changed) = self.state.update(|state| {
            let result = f(&mut state.fields)?;
            let _perf = PerfSpan::new(span_names::FORM_VALIDATE);
            let (_, errors) = run_validation_rules(&rules, &state.fields);
            state.field_errors = errors;
            Ok(result)
        });
        if changed {
            self.state_changed.emit(self.state.get());
        }
        result
    }

    /// Sets scalar field `field` from a change event.
    ///
    /// `show_field_errors` is left as is.
    pub fn change_field(&self, field: &str, event: &E) -> FormResult<()> {
        let schema = self.field_schema(field)?;
        if schema.is_array() {
            return Err(FormError::needs_index(field));
        }
        let value = schema.read(event);
        tracing::trace!(target: targets::FORM, field, "field changed");
        self.edit(|fields| {
            fields.insert(field.to_string(), value);
            Ok(())
        })
    }

    /// Sets element `index` of array field `field` from a change event.
    pub fn change_array_field(&self, field: &str, index: usize, event: &E) -> FormResult<()> {
        let value = self.array_schema(field)?.read(event);
        tracing::trace!(target: targets::FORM, field, index, "array element changed");
        self.edit(|fields| {
            let items = array_mut(fields, field)?;
            let len = items.len();
            let slot = items
                .get_mut(index)
                .ok_or_else(|| FormError::index_out_of_range(field, index, len))?;
            *slot = value;
            Ok(())
        })
    }

    /// Appends the field's default element to array field `field`.
    ///
    /// Returns the index of the new element.
    pub fn add_array_element(&self, field: &str) -> FormResult<usize> {
        let element = self.array_schema(field)?.element_default(&self.props.read());
        tracing::trace!(target: targets::FORM, field, "array element added");
        self.edit(|fields| {
            let items = array_mut(fields, field)?;
            items.push(element);
            Ok(items.len() - 1)
        })
    }

    /// Removes element `index` of array field `field`, returning it.
    pub fn remove_array_element(&self, field: &str, index: usize) -> FormResult<Value> {
        self.array_schema(field)?;
        tracing::trace!(target: targets::FORM, field, index, "array element removed");
        self.edit(|fields| {
            let items = array_mut(fields, field)?;
            if index >= items.len() {
                return Err(FormError::index_out_of_range(field, index, items.len()));
            }
            Ok(items.remove(index))
        })
    }

    /// Runs every rule, replacing the recorded errors. Returns whether all
    /// fields passed.
    pub fn validate(&self) -> bool {
        let rules = self.rules.read().clone();
        let (ok, changed) = self.state.update(|state| {
            let _perf = PerfSpan::new(span_names::FORM_VALIDATE);
            let (ok, errors) = run_validation_rules(&rules, &state.fields);
            state.field_errors = errors;
            ok
        });
        tracing::debug!(target: targets::FORM, ok, "form validated");
        if changed {
            self.state_changed.emit(self.state.get());
        }
        ok
    }

    /// Validates and, if valid, submits the fields.
    ///
    /// An invalid form shows its errors and returns
    /// [`SubmitOutcome::Invalid`] without calling the operation. A valid one
    /// hides errors, hands a snapshot of the fields (through the transform,
    /// which also sees the current props) to the operation, awaits it once, then calls the matching
    /// continuation. Field values are not touched afterwards.
    pub async fn submit<P, T, X>(&self, submitter: &Submitter<P, T, X>) -> SubmitOutcome<T, X>
    where
        P: 'static,
        T: 'static,
        X: fmt::Debug + 'static,
    {
        let payload = {
            let _perf = PerfSpan::new(span_names::FORM_SUBMIT);
            let rules = self.rules.read().clone();
            let (snapshot, changed) = self.state.update(|state| {
                let (ok, errors) = run_validation_rules(&rules, &state.fields);
                state.field_errors = errors;
                state.show_field_errors = !ok;
                ok.then(|| state.fields.clone())
            });
            if changed {
                self.state_changed.emit(self.state.get());
            }
            match snapshot {
                Some(fields) => submitter.payload(fields, &self.props.read()),
                None => {
                    tracing::debug!(target: targets::FORM, "submit blocked by validation");
                    self.submitted.emit(SubmitStatus::Invalid);
                    return SubmitOutcome::Invalid;
                }
            }
        };

        tracing::debug!(target: targets::FORM, "submitting form");
        let outcome = match submitter.run(payload).await {
            Ok(value) => {
                tracing::debug!(target: targets::FORM, "submit succeeded");
                submitter.succeeded(&value);
                SubmitOutcome::Succeeded(value)
            }
            Err(error) => {
                tracing::warn!(target: targets::FORM, ?error, "submit failed");
                submitter.failed(&error);
                SubmitOutcome::Failed(error)
            }
        };
        self.submitted.emit(outcome.status());
        outcome
    }

    /// Replaces the props, re-deriving props-dependent rules.
    ///
    /// Recorded errors are refreshed by the next edit or validation.
    pub fn set_props(&self, props: Value) {
        if self.rule_set.depends_on_props() {
            *self.rules.write() = self.rule_set.resolve(&props);
        }
        *self.props.write() = props;
        tracing::debug!(target: targets::FORM, "props changed");
    }

    /// Restores the initial fields for the current props, clearing and
    /// hiding errors.
    pub fn reset(&self) {
        let fields = self.schema.initial_fields(&self.props.read());
        if self.state.set(FormState {
            fields,
            ..FormState::default()
        }) {
            self.state_changed.emit(self.state.get());
        }
        tracing::debug!(target: targets::FORM, "form reset");
    }

    /// Applies a [`FormAction`].
    pub fn dispatch(&self, action: FormAction<E>) -> FormResult<()> {
        match action {
            FormAction::Change { field, event } => self.change_field(&field, &event),
            FormAction::ChangeAt {
                field,
                index,
                event,
            } => self.change_array_field(&field, index, &event),
            FormAction::Add { field } => self.add_array_element(&field).map(|_| ()),
            FormAction::Remove { field, index } => {
                self.remove_array_element(&field, index).map(|_| ())
            }
            FormAction::Validate => {
                self.validate();
                Ok(())
            }
            FormAction::Reset => {
                self.reset();
                Ok(())
            }
        }
    }
}

impl<E: Send + Sync + 'static> Form<E> {
    /// Builds the named handlers of every field, bound to this form.
    ///
    /// Each field gets `on_change_<field>`; array fields take an element
    /// index and also get `on_add_<field>`. Field names are converted to
    /// snake case.
    pub fn handlers(self: &Arc<Self>) -> FormHandlers<E> {
        let mut handlers = BTreeMap::new();
        for (name, schema) in self.schema.iter() {
            let form = Arc::clone(self);
            let field = name.to_string();
            if schema.is_array() {
                handlers.insert(
                    change_handler_name(name),
                    FieldHandler::ChangeAt(Arc::new(move |index, event: &E| {
                        form.change_array_field(&field, index, event)
                    })),
                );
                let form = Arc::clone(self);
                let field = name.to_string();
                handlers.insert(
                    add_handler_name(name),
                    FieldHandler::Add(Arc::new(move || form.add_array_element(&field))),
                );
            } else {
                handlers.insert(
                    change_handler_name(name),
                    FieldHandler::Change(Arc::new(move |event: &E| form.change_field(&field, event))),
                );
            }
        }
        FormHandlers { handlers }
    }
}

impl<E> fmt::Debug for Form<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("schema", &self.schema)
            .field("rule_set", &self.rule_set)
            .field("state", &self.state)
            .finish()
    }
}

fn array_mut<'a>(fields: &'a mut FieldMap, field: &str) -> FormResult<&'a mut Vec<Value>> {
    fields
        .get_mut(field)
        .and_then(Value::as_array_mut)
        .ok_or_else(|| FormError::not_an_array(field))
}
