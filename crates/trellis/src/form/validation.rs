//! Validation rules for form fields.
//!
//! A [`Rule`] looks at one field's value (and, for cross-field checks, at
//! every field's value) and returns a [`RuleResult`]. Rules are built from
//! plain predicates:
//!
//! - [`validator`]: a boolean predicate plus a fixed message
//! - [`extended_validator`]: a predicate that picks its own message, with
//!   extra data closed over at construction time
//! - [`array_validator`]: lifts an element predicate over an array field,
//!   producing one message slot per element
//!
//! [`run_validation_rules`] evaluates a whole rule map. Rules of one field
//! run in order and stop at the first failure; fields are independent.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use trellis::form::{FieldMap, RulesByField, run_validation_rules, validator, validators};
//!
//! let mut rules = RulesByField::new();
//! rules.insert(
//!     "name".into(),
//!     vec![validator(validators::validate_length(2, 10), "too short/long")],
//! );
//!
//! let mut fields = FieldMap::new();
//! fields.insert("name".into(), json!("a"));
//!
//! let (ok, errors) = run_validation_rules(&rules, &fields);
//! assert!(!ok);
//! assert_eq!(errors["name"].message(), Some("too short/long"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use trellis_core::logging::targets;

/// Current values of every form field, by name.
pub type FieldMap = BTreeMap<String, Value>;

/// The error recorded for a failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldError {
    /// A single message for a scalar field.
    Message(String),
    /// One slot per array element, `None` where the element passed.
    Elements(Vec<Option<String>>),
}

impl FieldError {
    /// The message of a scalar field error.
    pub fn message(&self) -> Option<&str> {
        match self {
            FieldError::Message(message) => Some(message),
            FieldError::Elements(_) => None,
        }
    }

    /// The message for element `index` of an array field error.
    pub fn element(&self, index: usize) -> Option<&str> {
        match self {
            FieldError::Elements(slots) => slots.get(index)?.as_deref(),
            FieldError::Message(_) => None,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::Message(message) => f.write_str(message),
            FieldError::Elements(slots) => {
                let failing: Vec<_> = slots.iter().flatten().map(String::as_str).collect();
                f.write_str(&failing.join("; "))
            }
        }
    }
}

impl From<&str> for FieldError {
    fn from(message: &str) -> Self {
        FieldError::Message(message.to_string())
    }
}

impl From<String> for FieldError {
    fn from(message: String) -> Self {
        FieldError::Message(message)
    }
}

/// Outcome of one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleResult {
    /// Whether the field passed.
    pub ok: bool,
    /// The failure, present only when `ok` is false.
    pub error: Option<FieldError>,
}

impl RuleResult {
    /// A passing result.
    pub fn pass() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    /// A failing result.
    pub fn fail(error: impl Into<FieldError>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
        }
    }
}

/// A validation rule: `(field value, all field values) -> result`.
pub type Rule = Arc<dyn Fn(&Value, &FieldMap) -> RuleResult + Send + Sync>;

/// Ordered rules per field name.
pub type RulesByField = BTreeMap<String, Vec<Rule>>;

/// The first failure per failing field.
pub type ErrorsByField = BTreeMap<String, FieldError>;

/// Wraps a boolean predicate: fails with `message` when it returns false.
pub fn validator<F>(predicate: F, message: impl Into<String>) -> Rule
where
    F: Fn(&Value, &FieldMap) -> bool + Send + Sync + 'static,
{
    let message = message.into();
    Arc::new(move |value, fields| {
        if predicate(value, fields) {
            RuleResult::pass()
        } else {
            RuleResult::fail(message.as_str())
        }
    })
}

/// Wraps a predicate that returns `(ok, message)` itself.
///
/// `extra` is captured when the rule is built and handed to every call,
/// typically data from outside the form such as a list of valid parents.
/// The message is dropped when the predicate passes.
pub fn extended_validator<F, A>(predicate: F, extra: A) -> Rule
where
    F: Fn(&Value, &FieldMap, &A) -> (bool, String) + Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    Arc::new(move |value, fields| match predicate(value, fields, &extra) {
        (true, _) => RuleResult::pass(),
        (false, message) => RuleResult::fail(message),
    })
}

/// Applies an element predicate to each element of an array field.
///
/// The field passes only if every element does. The error holds `message`
/// for each failing slot and `None` for passing ones. A value that is not an
/// array is treated as an empty one.
pub fn array_validator<F>(predicate: F, message: impl Into<String>) -> Rule
where
    F: Fn(&Value, &FieldMap) -> bool + Send + Sync + 'static,
{
    let message = message.into();
    Arc::new(move |value, fields| {
        let elements = value.as_array().map(Vec::as_slice).unwrap_or_default();
        let slots: Vec<Option<String>> = elements
            .iter()
            .map(|element| (!predicate(element, fields)).then(|| message.clone()))
            .collect();
        if slots.iter().all(Option::is_none) {
            RuleResult::pass()
        } else {
            RuleResult::fail(FieldError::Elements(slots))
        }
    })
}

/// Runs every field's rules against `fields`.
///
/// Returns whether all fields passed, and the first failure of each failing
/// field. A field missing from `fields` is validated as `null`.
pub fn run_validation_rules(rules: &RulesByField, fields: &FieldMap) -> (bool, ErrorsByField) {
    let mut errors = ErrorsByField::new();

    for (name, field_rules) in rules {
        let value = fields.get(name).unwrap_or(&Value::Null);
        for rule in field_rules {
            let result = rule(value, fields);
            if !result.ok {
                tracing::trace!(target: targets::VALIDATION, field = %name, "field failed validation");
                // A failing rule without an error still fails the field.
                errors.insert(
                    name.clone(),
                    result.error.unwrap_or_else(|| FieldError::Message(String::new())),
                );
                break;
            }
        }
    }

    (errors.is_empty(), errors)
}

/// Validation rules that may depend on the form's ambient props.
#[derive(Clone)]
pub enum RuleSet {
    /// The same rules for every props value.
    Static(RulesByField),
    /// Rules derived from props, recomputed whenever props change.
    FromProps(Arc<dyn Fn(&Value) -> RulesByField + Send + Sync>),
}

impl RuleSet {
    /// Rules derived from props.
    pub fn from_props<F>(derive: F) -> Self
    where
        F: Fn(&Value) -> RulesByField + Send + Sync + 'static,
    {
        RuleSet::FromProps(Arc::new(derive))
    }

    /// The concrete rules for `props`.
    pub fn resolve(&self, props: &Value) -> RulesByField {
        match self {
            RuleSet::Static(rules) => rules.clone(),
            RuleSet::FromProps(derive) => derive(props),
        }
    }

    /// Returns true if the rules depend on props.
    pub fn depends_on_props(&self) -> bool {
        matches!(self, RuleSet::FromProps(_))
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSet::Static(RulesByField::new())
    }
}

impl From<RulesByField> for RuleSet {
    fn from(rules: RulesByField) -> Self {
        RuleSet::Static(rules)
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSet::Static(rules) => f
                .debug_tuple("Static")
                .field(&rules.keys().collect::<Vec<_>>())
                .finish(),
            RuleSet::FromProps(_) => f.write_str("FromProps(..)"),
        }
    }
}
