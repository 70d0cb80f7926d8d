//! Declarative forms.
//!
//! A form is built from two declarations:
//!
//! - a [`FormSchema`]: every field, its default, how change events map to
//!   values, and whether it holds a sequence
//! - a [`RuleSet`]: validation rules per field, fixed or derived from the
//!   form's props
//!
//! The [`Form`] controller owns the resulting state, derives named change
//! handlers, and runs the asynchronous submit pipeline described by a
//! [`Submitter`].
//!
//! # Core Types
//!
//! - `FieldSchema` / `FormSchema`: field declarations
//! - `Rule`, `validator`, `array_validator`, `extended_validator`: rules
//! - `validators`: reusable predicates (MAC addresses, lengths, CIDRs...)
//! - `Form`, `FormState`, `FormAction`: the controller and its state
//! - `Submitter`, `SubmitOutcome`: the submit pipeline

mod engine;
mod schema;
mod submit;
mod validation;
pub mod validators;

pub use engine::{
    AddHandler, ChangeAtHandler, ChangeHandler, FieldHandler, Form, FormAction, FormHandlers,
    FormState, add_handler_name, change_handler_name,
};
pub use schema::{
    Accessor, ChangeEvent, DefaultFn, DefaultValue, FieldSchema, FormSchema, accessors,
};
pub use submit::{
    ContinuationFn, SubmitFn, SubmitOutcome, SubmitStatus, Submitter, TransformFn,
};
pub use validation::{
    ErrorsByField, FieldError, FieldMap, Rule, RuleResult, RuleSet, RulesByField,
    array_validator, extended_validator, run_validation_rules, validator,
};
