//! Row models and the data grid.
//!
//! This module provides everything a screen needs to show a searchable,
//! sortable, paginated table over rows it owns:
//!
//! # Core Types
//!
//! - `FieldPath` / `Record`: path-based access into opaque rows
//! - `CompareFn` and the `comparators` builders: row orderings
//! - `Column`: label, optional comparator and cell renderer
//! - `GridOptions`: search keys, pagination and initial sort
//! - `DataGrid`: the stateful controller, producing `GridView`s
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    Rows     │────>│  DataGrid   │────>│  GridView   │
//! │ (Record)    │     │ (GridState) │     │  (render)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            ^                   │
//!                            │    GridAction     │
//!                            └───────────────────┘
//! ```
//!
//! The renderer reads a [`GridView`], and user input flows back through the
//! grid's handlers (or [`DataGrid::dispatch`]). Connect to
//! [`DataGrid::state_changed`] to re-render after each change.

mod column;
pub mod comparators;
mod grid;
mod options;
mod record;
mod search;

pub use column::{CellContent, CellFn, Column, cells};
pub use comparators::CompareFn;
pub use grid::{DataGrid, GridAction, GridState, GridView, derive_view};
pub use options::{DEFAULT_PAGE_SIZE, GridOptions};
pub use record::{FieldPath, PathSegment, Record, leaf_values, value_text};
pub use search::{DEFAULT_MATCH_THRESHOLD, SearchHit, SearchMode, fuzzy_score, search_rows};
