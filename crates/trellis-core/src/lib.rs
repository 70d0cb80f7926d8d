//! Core plumbing for Trellis.
//!
//! This crate provides the small reactive toolkit the Trellis engines are
//! built on:
//!
//! - **Signal/Slot System**: change notifications from engines to adapters
//! - **Property System**: lock-protected state cells with change detection
//! - **Logging**: `tracing` targets, span names and stage timing
//!
//! # Example
//!
//! ```
//! use trellis_core::{Property, Signal};
//!
//! let search = Property::new(String::new());
//! let search_changed = Signal::<String>::new();
//!
//! search_changed.connect(|text| println!("searching for {text}"));
//!
//! if search.set("node-1".to_string()) {
//!     search_changed.emit(search.get());
//! }
//! ```

pub mod logging;
pub mod property;
pub mod signal;

pub use logging::PerfSpan;
pub use property::Property;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
