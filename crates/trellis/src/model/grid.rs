//! The data grid controller.
//!
//! A grid turns a row set and column descriptors into a render-ready view,
//! recomputed from scratch on every call to [`DataGrid::view`]:
//!
//! 1. **Filter** rows by the search text (see [`search_rows`]).
//! 2. **Sort** with the active column's comparator, stably; a descending
//!    sort reverses the sorted sequence, so tied rows then appear in reverse
//!    input order.
//! 3. **Paginate** when pagination is on and "show all" is off.
//!
//! Source rows are shared, never mutated: a [`GridView`] refers to rows by
//! their source index.
//!
//! # Example
//!
//! ```
//! use serde_json::{json, Value};
//! use trellis::model::{cells, comparators, Column, DataGrid, GridOptions};
//!
//! let rows: Vec<Value> = (0..22).map(|i| json!({ "name": format!("node-{i:02}") })).collect();
//! let columns = vec![
//!     Column::new("Name", cells::text::<Value>("name"))
//!         .with_sort(comparators::string("name")),
//! ];
//! let grid = DataGrid::new(rows, columns, GridOptions::new().with_pagination(15)).unwrap();
//!
//! let view = grid.view();
//! assert_eq!(view.page_count, 2);
//! assert_eq!(view.visible.len(), 15);
//!
//! grid.change_page(1);
//! assert_eq!(grid.view().visible.len(), 7);
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use trellis_core::logging::{span_names, targets};
use trellis_core::{PerfSpan, Property, Signal};

use super::column::{CellContent, Column};
use super::options::GridOptions;
use super::record::Record;
use super::search::search_rows;
use crate::error::{GridError, GridResult};

/// Mutable state of a grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridState {
    /// Current search text; empty means no filtering.
    pub search_text: String,
    /// Index of the active sort column.
    pub sort_index: usize,
    /// Sort direction.
    pub sort_ascending: bool,
    /// Zero-based current page.
    pub page: usize,
    /// Rows per page, always positive.
    pub page_size: usize,
    /// Whether pagination is bypassed.
    pub show_all: bool,
}

impl GridState {
    /// Initial state for a grid configured with `options`.
    pub fn from_options(options: &GridOptions) -> Self {
        Self {
            search_text: String::new(),
            sort_index: options.sort_index,
            sort_ascending: options.sort_ascending,
            page: 0,
            page_size: options.page_size,
            show_all: false,
        }
    }
}

impl Default for GridState {
    fn default() -> Self {
        Self::from_options(&GridOptions::default())
    }
}

/// A state transition request, for adapters that route all input through
/// one entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridAction {
    /// Replace the search text.
    Search(String),
    /// Replace the sort column and direction together.
    Sort { column: usize, ascending: bool },
    /// Move to a page.
    Page(usize),
    /// Change the page size.
    PageSize(usize),
    /// Flip "show all".
    ToggleShowAll,
}

/// Derived, render-ready output of a grid.
pub struct GridView<R> {
    rows: Arc<[R]>,
    columns: Arc<[Column<R>]>,
    /// Source indices of the rows to render, in display order.
    pub visible: Vec<usize>,
    /// Number of pages; 0 when nothing matches.
    pub page_count: usize,
    /// The page this view shows.
    pub current_page: usize,
    /// Number of source rows.
    pub total_count: usize,
    /// Number of rows passing the search.
    pub filtered_count: usize,
}

impl<R> GridView<R> {
    /// The rows to render, in display order.
    pub fn visible_rows(&self) -> impl Iterator<Item = &R> + '_ {
        self.visible.iter().filter_map(|&i| self.rows.get(i))
    }

    /// Column labels, in display order.
    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(Column::label).collect()
    }

    /// Rendered cells, one inner vector per visible row.
    pub fn cells(&self) -> Vec<Vec<CellContent>> {
        self.visible_rows()
            .map(|row| self.columns.iter().map(|c| c.render(row)).collect())
            .collect()
    }

    /// Returns true if nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}

impl<R> std::fmt::Debug for GridView<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridView")
            .field("visible", &self.visible)
            .field("page_count", &self.page_count)
            .field("current_page", &self.current_page)
            .field("total_count", &self.total_count)
            .field("filtered_count", &self.filtered_count)
            .finish()
    }
}

/// Number of pages needed for `count` rows.
fn page_count_for(count: usize, state: &GridState, options: &GridOptions) -> usize {
    if options.pagination && !state.show_all {
        count.div_ceil(state.page_size.max(1))
    } else {
        usize::from(count > 0)
    }
}

/// Derives the view for `state` over `rows`.
///
/// Pure: the same inputs always produce the same view. A page past the last
/// one yields an empty slice.
pub fn derive_view<R: Record>(
    rows: Arc<[R]>,
    columns: Arc<[Column<R>]>,
    state: &GridState,
    options: &GridOptions,
) -> GridView<R> {
    let _perf = PerfSpan::new(span_names::GRID_DERIVE);

    let mut ordered: Vec<usize> = search_rows(
        &rows[..],
        &state.search_text,
        &options.search_keys,
        options.search_mode,
        options.match_threshold,
    )
    .into_iter()
    .map(|hit| hit.row)
    .collect();

    if let Some(compare) = columns.get(state.sort_index).and_then(Column::sort_fn) {
        ordered.sort_by(|&a, &b| compare(&rows[a], &rows[b]));
        if !state.sort_ascending {
            ordered.reverse();
        }
    }

    let filtered_count = ordered.len();
    let page_count = page_count_for(filtered_count, state, options);

    let visible = if options.pagination && !state.show_all {
        let size = state.page_size.max(1);
        let start = state.page.saturating_mul(size).min(filtered_count);
        let end = start.saturating_add(size).min(filtered_count);
        ordered[start..end].to_vec()
    } else {
        ordered
    };

    tracing::trace!(
        target: targets::GRID,
        total = rows.len(),
        filtered = filtered_count,
        visible = visible.len(),
        page = state.page,
        "derived grid view"
    );

    GridView {
        total_count: rows.len(),
        rows,
        columns,
        visible,
        page_count,
        current_page: state.page,
        filtered_count,
    }
}

/// A stateful data grid over rows of type `R`.
///
/// The grid owns its [`GridState`] and is the only writer to it. Every
/// effective state change is announced through [`state_changed`](Self::state_changed).
pub struct DataGrid<R> {
    rows: RwLock<Arc<[R]>>,
    columns: Arc<[Column<R>]>,
    options: GridOptions,
    state: Property<GridState>,
    state_changed: Signal<GridState>,
    rows_changed: Signal<usize>,
}

impl<R: Record + 'static> DataGrid<R> {
    /// Creates a grid.
    ///
    /// Fails if the options are invalid or the initial sort index does not
    /// address a column.
    pub fn new(
        rows: impl Into<Arc<[R]>>,
        columns: Vec<Column<R>>,
        options: GridOptions,
    ) -> GridResult<Self> {
        options.validate()?;
        if !columns.is_empty() && options.sort_index >= columns.len() {
            return Err(GridError::ColumnOutOfRange {
                index: options.sort_index,
                count: columns.len(),
            });
        }

        let rows = rows.into();
        tracing::debug!(
            target: targets::GRID,
            rows = rows.len(),
            columns = columns.len(),
            pagination = options.pagination,
            "created data grid"
        );

        Ok(Self {
            rows: RwLock::new(rows),
            columns: columns.into(),
            state: Property::new(GridState::from_options(&options)),
            options,
            state_changed: Signal::new(),
            rows_changed: Signal::new(),
        })
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> GridState {
        self.state.get()
    }

    /// Derives the current view.
    pub fn view(&self) -> GridView<R> {
        let rows = self.rows.read().clone();
        self.state
            .with(|state| derive_view(rows, self.columns.clone(), state, &self.options))
    }

    /// The column descriptors.
    pub fn columns(&self) -> &[Column<R>] {
        &self.columns
    }

    /// The grid options.
    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    /// Number of source rows.
    pub fn row_count(&self) -> usize {
        self.rows.read().len()
    }

    /// Signal emitted with the new state after each effective change.
    pub fn state_changed(&self) -> &Signal<GridState> {
        &self.state_changed
    }

    /// Signal emitted with the new row count after [`set_rows`](Self::set_rows).
    pub fn rows_changed(&self) -> &Signal<usize> {
        &self.rows_changed
    }

    /// Replaces the search text.
    ///
    /// Returns to the first page if the options ask for it.
    pub fn change_search(&self, text: impl Into<String>) {
        let text = text.into();
        let reset = self.options.reset_page_on_search;
        tracing::trace!(target: targets::GRID, search = %text, "search changed");
        self.commit(|state| {
            if state.search_text != text {
                state.search_text = text;
                if reset {
                    state.page = 0;
                }
            }
        });
    }

    /// Replaces the sort column and direction together.
    pub fn change_sort(&self, column: usize, ascending: bool) -> GridResult<()> {
        if column >= self.columns.len() {
            return Err(GridError::ColumnOutOfRange {
                index: column,
                count: self.columns.len(),
            });
        }
        tracing::trace!(target: targets::GRID, column, ascending, "sort changed");
        self.commit(|state| {
            state.sort_index = column;
            state.sort_ascending = ascending;
        });
        Ok(())
    }

    /// Moves to `page`, clamped to the existing pages. Returns the page the
    /// grid is on afterwards.
    pub fn change_page(&self, page: usize) -> usize {
        let page_count = self.page_count();
        let page = page.min(page_count.saturating_sub(1));
        tracing::trace!(target: targets::GRID, page, page_count, "page changed");
        self.commit(|state| state.page = page);
        page
    }

    /// Changes the page size, keeping the current page in range.
    pub fn change_page_size(&self, page_size: usize) -> GridResult<()> {
        if page_size == 0 {
            return Err(GridError::InvalidPageSize);
        }
        let filtered = self.filtered_count();
        let options = &self.options;
        self.commit(|state| {
            state.page_size = page_size;
            let last = page_count_for(filtered, state, options).saturating_sub(1);
            state.page = state.page.min(last);
        });
        tracing::trace!(target: targets::GRID, page_size, "page size changed");
        Ok(())
    }

    /// Flips between paginated and "show all" display.
    pub fn toggle_show_all(&self) {
        self.commit(|state| state.show_all = !state.show_all);
    }

    /// Replaces the row set, keeping the current page in range.
    ///
    /// The page is clamped before `rows_changed` fires, so slots always
    /// see a view of an existing page.
    pub fn set_rows(&self, rows: impl Into<Arc<[R]>>) {
        let rows = rows.into();
        let count = rows.len();
        *self.rows.write() = rows;
        tracing::debug!(target: targets::GRID, rows = count, "rows replaced");

        let page_count = self.page_count();
        self.commit(|state| state.page = state.page.min(page_count.saturating_sub(1)));
        self.rows_changed.emit(count);
    }

    /// Applies a [`GridAction`].
    pub fn dispatch(&self, action: GridAction) -> GridResult<()> {
        match action {
            GridAction::Search(text) => self.change_search(text),
            GridAction::Sort { column, ascending } => self.change_sort(column, ascending)?,
            GridAction::Page(page) => {
                self.change_page(page);
            }
            GridAction::PageSize(size) => self.change_page_size(size)?,
            GridAction::ToggleShowAll => self.toggle_show_all(),
        }
        Ok(())
    }

    fn filtered_count(&self) -> usize {
        let rows = self.rows.read().clone();
        let search_text = self.state.with(|state| state.search_text.clone());
        search_rows(
            &rows[..],
            &search_text,
            &self.options.search_keys,
            self.options.search_mode,
            self.options.match_threshold,
        )
        .len()
    }

    fn page_count(&self) -> usize {
        let filtered = self.filtered_count();
        self.state
            .with(|state| page_count_for(filtered, state, &self.options))
    }

    /// Mutates the state and emits `state_changed` if anything changed.
    fn commit(&self, f: impl FnOnce(&mut GridState)) {
        let (_, changed) = self.state.update(f);
        if changed {
            self.state_changed.emit(self.state.get());
        }
    }
}

impl<R> std::fmt::Debug for DataGrid<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataGrid")
            .field("rows", &self.rows.read().len())
            .field("columns", &self.columns)
            .field("options", &self.options)
            .field("state", &self.state)
            .finish()
    }
}
