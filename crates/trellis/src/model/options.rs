//! Grid configuration.
//!
//! Options are plain data, so a screen can build them in code or load them
//! from TOML or JSON:
//!
//! ```
//! use trellis::model::{GridOptions, SearchMode};
//!
//! let options = GridOptions::from_toml_str(
//!     r#"
//!     pagination = true
//!     page_size = 25
//!     search_keys = ["name", "bmc.name", "interfaces.mac"]
//!     search_mode = "substring"
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(options.page_size, 25);
//! assert_eq!(options.search_mode, SearchMode::Substring);
//! assert!(options.sort_ascending);
//! ```

use serde::{Deserialize, Serialize};

use super::record::FieldPath;
use super::search::{DEFAULT_MATCH_THRESHOLD, SearchMode};
use crate::error::{GridError, GridResult};

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 15;

/// Configuration for a [`DataGrid`](super::DataGrid).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    /// Rows per page when pagination is on.
    pub page_size: usize,
    /// Whether the view is split into pages.
    pub pagination: bool,
    /// Paths searched per row. Empty means every scalar in the row.
    pub search_keys: Vec<FieldPath>,
    /// How search text is matched.
    pub search_mode: SearchMode,
    /// Maximum fuzzy error score for a row to match, in `[0, 1]`.
    pub match_threshold: f64,
    /// Initially active sort column.
    pub sort_index: usize,
    /// Initial sort direction.
    pub sort_ascending: bool,
    /// Whether changing the search text returns to the first page.
    pub reset_page_on_search: bool,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            pagination: false,
            search_keys: Vec::new(),
            search_mode: SearchMode::default(),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            sort_index: 0,
            sort_ascending: true,
            reset_page_on_search: true,
        }
    }
}

impl GridOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables pagination with the given page size.
    pub fn with_pagination(mut self, page_size: usize) -> Self {
        self.pagination = true;
        self.page_size = page_size;
        self
    }

    /// Sets the searched paths.
    pub fn with_search_keys<I, P>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<FieldPath>,
    {
        self.search_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the search mode.
    pub fn with_search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    /// Sets the fuzzy match threshold.
    pub fn with_match_threshold(mut self, threshold: f64) -> Self {
        self.match_threshold = threshold;
        self
    }

    /// Sets the initial sort column and direction.
    pub fn with_sort(mut self, index: usize, ascending: bool) -> Self {
        self.sort_index = index;
        self.sort_ascending = ascending;
        self
    }

    /// Sets whether a search change returns to the first page.
    pub fn with_reset_page_on_search(mut self, reset: bool) -> Self {
        self.reset_page_on_search = reset;
        self
    }

    /// Checks the options for values the grid cannot work with.
    pub fn validate(&self) -> GridResult<()> {
        if self.page_size == 0 {
            return Err(GridError::invalid_option(
                "page_size",
                "must be greater than zero",
            ));
        }
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(GridError::invalid_option(
                "match_threshold",
                format!("{} is outside [0, 1]", self.match_threshold),
            ));
        }
        Ok(())
    }

    /// Parses and validates options from TOML.
    pub fn from_toml_str(source: &str) -> GridResult<Self> {
        let options: Self = toml::from_str(source)?;
        options.validate()?;
        Ok(options)
    }

    /// Parses and validates options from JSON.
    pub fn from_json_str(source: &str) -> GridResult<Self> {
        let options: Self = serde_json::from_str(source)?;
        options.validate()?;
        Ok(options)
    }
}
