//! Trellis - declarative data grid and form engines for admin front-ends.
//!
//! Trellis holds the state and logic behind the two widgets every admin
//! screen is made of, leaving markup and transport to the host:
//!
//! - [`model`]: a data grid with fuzzy search, stable multi-column sorting
//!   and pagination over opaque rows, driven by column descriptors
//! - [`form`]: a form engine turning a field schema and validation rules
//!   into live state, named change handlers and an async submit pipeline
//!
//! Both engines notify adapters through [`Signal`]s from `trellis-core`.
//!
//! # Example
//!
//! ```
//! use serde_json::{json, Value};
//! use trellis::prelude::*;
//!
//! let rows = vec![
//!     json!({ "name": "bravo", "bmc": { "name": "bmc-2" } }),
//!     json!({ "name": "alpha", "bmc": { "name": "bmc-1" } }),
//! ];
//! let columns = vec![
//!     Column::new("Name", cells::text::<Value>("name")).with_sort(comparators::string("name")),
//!     Column::new("BMC", cells::text::<Value>("bmc.name")),
//! ];
//! let grid = DataGrid::new(rows, columns, GridOptions::default())?;
//!
//! grid.change_search("alpha");
//! let view = grid.view();
//! assert_eq!(view.filtered_count, 1);
//! assert_eq!(view.cells()[0][1], CellContent::text("bmc-1"));
//! # Ok::<(), GridError>(())
//! ```

mod error;
pub mod form;
pub mod model;
pub mod prelude;

pub use error::{FormError, FormResult, GridError, GridResult};
pub use trellis_core::{ConnectionGuard, ConnectionId, PerfSpan, Property, Signal};
pub use trellis_core::logging;
