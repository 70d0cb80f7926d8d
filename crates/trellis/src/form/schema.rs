//! Declarative form schemas.
//!
//! A [`FormSchema`] names every field of a form. Each [`FieldSchema`] says
//! how the field's initial value is computed, how a change event becomes a
//! value, and whether the field holds a sequence of values.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use trellis::form::{FieldSchema, FormSchema};
//!
//! let schema = FormSchema::new()
//!     .field("hostname", FieldSchema::text())
//!     .field("netbootEnabled", FieldSchema::checkbox().with_default(json!(false)))
//!     .field("macs", FieldSchema::text().array().with_default_count(2));
//!
//! let fields = schema.initial_fields(&json!({}));
//! assert_eq!(fields["hostname"], json!(null));
//! assert_eq!(fields["netbootEnabled"], json!(false));
//! assert_eq!(fields["macs"], json!([null, null]));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::validation::FieldMap;

/// An input event delivered to a field's change handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// Text typed into an input.
    Input(String),
    /// A checkbox or switch flipped.
    Toggle(bool),
    /// An option picked from a list.
    Select(Value),
    /// Files chosen in a file picker.
    Files(Vec<String>),
}

/// Stock accessors turning a [`ChangeEvent`] into a field value.
///
/// Each returns `null` for events of another kind.
pub mod accessors {
    use super::*;

    /// The typed text.
    pub fn text(event: &ChangeEvent) -> Value {
        match event {
            ChangeEvent::Input(text) => Value::String(text.clone()),
            ChangeEvent::Select(value) => value.clone(),
            _ => Value::Null,
        }
    }

    /// The checked state.
    pub fn checked(event: &ChangeEvent) -> Value {
        match event {
            ChangeEvent::Toggle(on) => Value::Bool(*on),
            _ => Value::Null,
        }
    }

    /// The picked option.
    pub fn selected(event: &ChangeEvent) -> Value {
        match event {
            ChangeEvent::Select(value) => value.clone(),
            _ => Value::Null,
        }
    }

    /// The chosen files.
    pub fn files(event: &ChangeEvent) -> Value {
        match event {
            ChangeEvent::Files(files) => files.iter().cloned().map(Value::String).collect(),
            _ => Value::Null,
        }
    }
}

/// Type alias for a field accessor.
pub type Accessor<E> = Arc<dyn Fn(&E) -> Value + Send + Sync>;

/// Type alias for a default computed from the form's props.
pub type DefaultFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// How a field's initial value is produced.
#[derive(Clone, Default)]
pub enum DefaultValue {
    /// No default: `null`, or `default_count` nulls for array fields.
    #[default]
    Absent,
    /// A fixed value.
    Static(Value),
    /// Computed from the form's props.
    FromProps(DefaultFn),
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Absent => f.write_str("Absent"),
            DefaultValue::Static(value) => f.debug_tuple("Static").field(value).finish(),
            DefaultValue::FromProps(_) => f.write_str("FromProps(..)"),
        }
    }
}

/// Declaration of one form field.
pub struct FieldSchema<E = ChangeEvent> {
    default_value: DefaultValue,
    accessor: Accessor<E>,
    array: bool,
    default_count: usize,
}

impl<E> Clone for FieldSchema<E> {
    fn clone(&self) -> Self {
        Self {
            default_value: self.default_value.clone(),
            accessor: self.accessor.clone(),
            array: self.array,
            default_count: self.default_count,
        }
    }
}

impl<E> fmt::Debug for FieldSchema<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSchema")
            .field("default_value", &self.default_value)
            .field("array", &self.array)
            .field("default_count", &self.default_count)
            .finish()
    }
}

impl FieldSchema<ChangeEvent> {
    /// A text field.
    pub fn text() -> Self {
        Self::new(accessors::text)
    }

    /// A checkbox field.
    pub fn checkbox() -> Self {
        Self::new(accessors::checked)
    }

    /// A select field.
    pub fn select() -> Self {
        Self::new(accessors::selected)
    }

    /// A file picker field.
    pub fn files() -> Self {
        Self::new(accessors::files)
    }
}

impl<E> FieldSchema<E> {
    /// Creates a scalar field reading its value with `accessor`.
    pub fn new<F>(accessor: F) -> Self
    where
        F: Fn(&E) -> Value + Send + Sync + 'static,
    {
        Self {
            default_value: DefaultValue::Absent,
            accessor: Arc::new(accessor),
            array: false,
            default_count: 1,
        }
    }

    /// Makes this an array field.
    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    /// Sets a fixed default value.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = DefaultValue::Static(value);
        self
    }

    /// Sets a default computed from props.
    pub fn with_default_fn<F>(mut self, default: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.default_value = DefaultValue::FromProps(Arc::new(default));
        self
    }

    /// Sets how many elements an array field starts with.
    pub fn with_default_count(mut self, count: usize) -> Self {
        self.default_count = count;
        self
    }

    /// Returns true for array fields.
    pub fn is_array(&self) -> bool {
        self.array
    }

    /// Number of initial elements of an array field.
    pub fn default_count(&self) -> usize {
        self.default_count
    }

    /// The configured default.
    pub fn default_value(&self) -> &DefaultValue {
        &self.default_value
    }

    /// Turns a change event into a field value.
    pub fn read(&self, event: &E) -> Value {
        (self.accessor)(event)
    }

    /// Initial value of the field for `props`.
    ///
    /// Array fields always start as arrays: a non-array default is repeated
    /// `default_count` times.
    pub fn initial_value(&self, props: &Value) -> Value {
        let value = match &self.default_value {
            DefaultValue::Absent => Value::Null,
            DefaultValue::Static(value) => value.clone(),
            DefaultValue::FromProps(default) => default(props),
        };
        if !self.array {
            return value;
        }
        match (value, &self.default_value) {
            (Value::Array(items), DefaultValue::FromProps(_)) => Value::Array(items),
            (value, _) => Value::Array(vec![value; self.default_count]),
        }
    }

    /// Value appended by an add on an array field.
    ///
    /// For props-derived defaults this is the first element of the derived
    /// sequence, or `null` if it is empty.
    pub fn element_default(&self, props: &Value) -> Value {
        match &self.default_value {
            DefaultValue::Absent => Value::Null,
            DefaultValue::Static(value) => value.clone(),
            DefaultValue::FromProps(default) => match default(props) {
                Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
                other => other,
            },
        }
    }
}

/// The complete set of fields of a form.
pub struct FormSchema<E = ChangeEvent> {
    fields: BTreeMap<String, FieldSchema<E>>,
}

impl<E> Default for FormSchema<E> {
    fn default() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }
}

impl<E> Clone for FormSchema<E> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
        }
    }
}

impl<E> fmt::Debug for FormSchema<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.fields.iter()).finish()
    }
}

impl<E> FormSchema<E> {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a field.
    pub fn field(mut self, name: impl Into<String>, schema: FieldSchema<E>) -> Self {
        self.fields.insert(name.into(), schema);
        self
    }

    /// Looks up a field.
    pub fn get(&self, name: &str) -> Option<&FieldSchema<E>> {
        self.fields.get(name)
    }

    /// Field names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Fields with their declarations, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSchema<E>)> {
        self.fields.iter().map(|(name, schema)| (name.as_str(), schema))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The initial value of every field for `props`.
    pub fn initial_fields(&self, props: &Value) -> FieldMap {
        self.fields
            .iter()
            .map(|(name, schema)| (name.clone(), schema.initial_value(props)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        assert_eq!(accessors::text(&ChangeEvent::Input("x".into())), json!("x"));
        assert_eq!(accessors::text(&ChangeEvent::Toggle(true)), Value::Null);
        assert_eq!(accessors::checked(&ChangeEvent::Toggle(true)), json!(true));
        assert_eq!(accessors::selected(&ChangeEvent::Select(json!(3))), json!(3));
        assert_eq!(
            accessors::files(&ChangeEvent::Files(vec!["a.img".into()])),
            json!(["a.img"])
        );
    }

    #[test]
    fn test_scalar_initial_values() {
        let props = json!({ "user": "alice" });
        assert_eq!(FieldSchema::text().initial_value(&props), Value::Null);
        assert_eq!(
            FieldSchema::text()
                .with_default(json!("x"))
                .initial_value(&props),
            json!("x")
        );
        assert_eq!(
            FieldSchema::text()
                .with_default_fn(|props| props["user"].clone())
                .initial_value(&props),
            json!("alice")
        );
    }

    #[test]
    fn test_array_initial_values() {
        let props = json!({ "macs": ["aa", "bb", "cc"] });
        assert_eq!(FieldSchema::text().array().initial_value(&props), json!([null]));
        assert_eq!(
            FieldSchema::text()
                .array()
                .with_default(json!(""))
                .with_default_count(3)
                .initial_value(&props),
            json!(["", "", ""])
        );
        assert_eq!(
            FieldSchema::text()
                .array()
                .with_default_fn(|props| props["macs"].clone())
                .initial_value(&props),
            json!(["aa", "bb", "cc"])
        );
        assert_eq!(
            FieldSchema::text()
                .array()
                .with_default_count(0)
                .initial_value(&props),
            json!([])
        );
    }

    #[test]
    fn test_element_default() {
        let props = json!({ "macs": ["aa", "bb"] });
        assert_eq!(FieldSchema::text().array().element_default(&props), Value::Null);
        assert_eq!(
            FieldSchema::text()
                .array()
                .with_default(json!(""))
                .element_default(&props),
            json!("")
        );
        assert_eq!(
            FieldSchema::text()
                .array()
                .with_default_fn(|props| props["macs"].clone())
                .element_default(&props),
            json!("aa")
        );
        assert_eq!(
            FieldSchema::text()
                .array()
                .with_default_fn(|_| json!([]))
                .element_default(&props),
            Value::Null
        );
    }

    #[test]
    fn test_schema_initial_fields_has_every_key() {
        let schema = FormSchema::new()
            .field("name", FieldSchema::text())
            .field("macs", FieldSchema::text().array());
        let fields = schema.initial_fields(&Value::Null);
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["macs", "name"]);
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["macs", "name"]);
    }

    #[test]
    fn test_change_event_serde() {
        let event: ChangeEvent =
            serde_json::from_value(json!({ "kind": "input", "value": "node-1" })).unwrap();
        assert_eq!(event, ChangeEvent::Input("node-1".into()));
    }
}
