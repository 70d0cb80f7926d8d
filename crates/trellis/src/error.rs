//! Error types for the grid and form engines.
//!
//! Validation failures are never errors: they are reported as data in the
//! form state. The types here cover programmer mistakes (unknown fields,
//! out-of-range indices) and configuration problems.

/// Result type alias for form operations.
pub type FormResult<T> = std::result::Result<T, FormError>;

/// Result type alias for grid operations.
pub type GridResult<T> = std::result::Result<T, GridError>;

/// Errors raised by the form engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// The field name is not declared in the form schema.
    #[error("Unknown form field '{field}'")]
    UnknownField { field: String },

    /// An indexed operation was used on a scalar field.
    #[error("Form field '{field}' is not an array field")]
    NotAnArrayField { field: String },

    /// A whole-value change was sent to an array field.
    #[error("Form field '{field}' is an array field, change it by element index")]
    ArrayFieldNeedsIndex { field: String },

    /// An element index past the end of an array field.
    #[error("Index {index} out of range for field '{field}' with {len} elements")]
    IndexOutOfRange {
        field: String,
        index: usize,
        len: usize,
    },
}

impl FormError {
    /// Create an unknown-field error.
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
        }
    }

    /// Create a not-an-array error.
    pub fn not_an_array(field: impl Into<String>) -> Self {
        Self::NotAnArrayField {
            field: field.into(),
        }
    }

    /// Create an array-field-needs-index error.
    pub fn needs_index(field: impl Into<String>) -> Self {
        Self::ArrayFieldNeedsIndex {
            field: field.into(),
        }
    }

    /// Create an index error.
    pub fn index_out_of_range(field: impl Into<String>, index: usize, len: usize) -> Self {
        Self::IndexOutOfRange {
            field: field.into(),
            index,
            len,
        }
    }
}

/// Errors raised by the data grid.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// A column index past the last column descriptor.
    #[error("Column {index} out of range, grid has {count} columns")]
    ColumnOutOfRange { index: usize, count: usize },

    /// Page sizes must be positive.
    #[error("Page size must be greater than zero")]
    InvalidPageSize,

    /// Grid options failed validation.
    #[error("Invalid grid option '{option}': {message}")]
    InvalidOptions { option: String, message: String },

    /// Options could not be parsed from TOML.
    #[error("Failed to parse grid options: {0}")]
    Toml(#[from] toml::de::Error),

    /// Options could not be parsed from JSON.
    #[error("Failed to parse grid options: {0}")]
    Json(#[from] serde_json::Error),
}

impl GridError {
    /// Create an invalid-option error.
    pub fn invalid_option(option: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            option: option.into(),
            message: message.into(),
        }
    }
}
