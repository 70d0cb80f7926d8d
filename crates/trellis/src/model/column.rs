//! Column descriptors for the data grid.
//!
//! A [`Column`] pairs a header label with an optional comparator and a cell
//! renderer. The order of descriptors passed to the grid is the display
//! order, and the sort index addresses columns by that position.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::comparators::CompareFn;
use super::record::{FieldPath, Record, value_text};

/// Render-ready content of one grid cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellContent {
    /// Nothing to show.
    #[default]
    Empty,
    /// Plain text.
    Text { text: String },
    /// Text linking to another screen.
    Link { text: String, href: String },
    /// A read-only on/off indicator.
    Toggle { on: bool },
    /// One line per element, such as a machine's interfaces.
    Lines { lines: Vec<String> },
}

impl CellContent {
    /// Plain text content.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Type alias for a cell renderer.
pub type CellFn<R> = Arc<dyn Fn(&R) -> CellContent + Send + Sync>;

/// A grid column descriptor.
pub struct Column<R> {
    label: String,
    sort_fn: Option<CompareFn<R>>,
    cell: CellFn<R>,
}

impl<R> Clone for Column<R> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            sort_fn: self.sort_fn.clone(),
            cell: self.cell.clone(),
        }
    }
}

impl<R> fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("label", &self.label)
            .field("sortable", &self.is_sortable())
            .finish()
    }
}

impl<R> Column<R> {
    /// Creates an unsortable column.
    pub fn new<F>(label: impl Into<String>, cell: F) -> Self
    where
        F: Fn(&R) -> CellContent + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            sort_fn: None,
            cell: Arc::new(cell),
        }
    }

    /// Makes the column sortable with `compare`.
    pub fn with_sort(mut self, compare: CompareFn<R>) -> Self {
        self.sort_fn = Some(compare);
        self
    }

    /// The header label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The column comparator, if sortable.
    pub fn sort_fn(&self) -> Option<&CompareFn<R>> {
        self.sort_fn.as_ref()
    }

    /// Returns true if the column has a comparator.
    pub fn is_sortable(&self) -> bool {
        self.sort_fn.is_some()
    }

    /// Renders this column's cell for `row`.
    pub fn render(&self, row: &R) -> CellContent {
        (self.cell)(row)
    }
}

/// Stock cell renderers for JSON-shaped rows.
pub mod cells {
    use super::*;

    /// Text of the scalar at `path`, or empty.
    pub fn text<R: Record + 'static>(
        path: &str,
    ) -> impl Fn(&R) -> CellContent + Send + Sync + use<R> {
        let path = FieldPath::parse(path);
        move |row: &R| {
            row.lookup(&path)
                .and_then(value_text)
                .map_or(CellContent::Empty, CellContent::text)
        }
    }

    /// Link showing the text at `path`; empty when the text is absent.
    pub fn link<R, F>(path: &str, href: F) -> impl Fn(&R) -> CellContent + Send + Sync + use<R, F>
    where
        R: Record + 'static,
        F: Fn(&R) -> String + Send + Sync + 'static,
    {
        let path = FieldPath::parse(path);
        move |row: &R| match row.lookup(&path).and_then(value_text) {
            Some(text) => CellContent::Link {
                text: text.into_owned(),
                href: href(row),
            },
            None => CellContent::Empty,
        }
    }

    /// On/off indicator for the boolean at `path`, absent being off.
    pub fn toggle<R: Record + 'static>(
        path: &str,
    ) -> impl Fn(&R) -> CellContent + Send + Sync + use<R> {
        let path = FieldPath::parse(path);
        move |row: &R| CellContent::Toggle {
            on: row.lookup(&path).and_then(Value::as_bool).unwrap_or(false),
        }
    }

    /// One line per element of the sequence at `list`, rendered by `line`.
    pub fn lines<R, F>(list: &str, line: F) -> impl Fn(&R) -> CellContent + Send + Sync + use<R, F>
    where
        R: Record + 'static,
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        let list = FieldPath::parse(list);
        move |row: &R| CellContent::Lines {
            lines: row
                .lookup(&list)
                .and_then(Value::as_array)
                .map(|items| items.iter().map(&line).collect())
                .unwrap_or_default(),
        }
    }
}
