//! Prelude module for Trellis.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```
//! use trellis::prelude::*;
//! ```

// ============================================================================
// Errors
// ============================================================================

pub use crate::{FormError, FormResult, GridError, GridResult};

// ============================================================================
// Signal/Slot and Property System
// ============================================================================

pub use crate::{ConnectionId, Property, Signal};

// ============================================================================
// Data Grid
// ============================================================================

pub use crate::model::{
    CellContent, Column, CompareFn, DataGrid, FieldPath, GridAction, GridOptions, GridState,
    GridView, Record, SearchMode, cells, comparators,
};

// ============================================================================
// Forms
// ============================================================================

pub use crate::form::{
    ChangeEvent, FieldError, FieldHandler, FieldMap, FieldSchema, Form, FormAction, FormSchema,
    FormState, RuleSet, RulesByField, SubmitOutcome, Submitter, array_validator,
    extended_validator, validator, validators,
};
