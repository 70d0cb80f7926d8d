//! Lock-protected state cells with change detection.
//!
//! Engines keep their state in a [`Property`] and emit their change signal
//! only when a write reports that the value actually changed.
//!
//! # Example
//!
//! ```
//! use trellis_core::{Property, Signal};
//!
//! struct Pager {
//!     page: Property<usize>,
//!     page_changed: Signal<usize>,
//! }
//!
//! impl Pager {
//!     fn go_to(&self, page: usize) {
//!         if self.page.set(page) {
//!             self.page_changed.emit(page);
//!         }
//!     }
//! }
//!
//! let pager = Pager { page: Property::new(0), page_changed: Signal::new() };
//! pager.go_to(3);
//! assert_eq!(pager.page.get(), 3);
//! ```

use std::fmt;

use parking_lot::RwLock;

/// A value behind an `RwLock` whose writes report whether anything changed.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    /// Wraps `value`.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// A clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Reads the value in place under the read lock.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }

    /// Overwrites the value without comparing.
    pub fn set_silent(&self, value: T) {
        *self.value.write() = value;
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Stores `value`. Returns true if it differs from the previous one.
    pub fn set(&self, value: T) -> bool {
        self.replace(value).is_some()
    }

    /// Stores `value`, handing back the previous value if it differed.
    pub fn replace(&self, value: T) -> Option<T> {
        let mut current = self.value.write();
        (*current != value).then(|| std::mem::replace(&mut *current, value))
    }

    /// Runs `f` on the value under one write lock.
    ///
    /// Returns `f`'s result and whether the value differs afterwards.
    /// Concurrent updates never interleave.
    pub fn update<F, R>(&self, f: F) -> (R, bool)
    where
        F: FnOnce(&mut T) -> R,
    {
        let mut current = self.value.write();
        let before = current.clone();
        let result = f(&mut current);
        (result, *current != before)
    }
}

impl<T: Clone> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property").field(&*self.value.read()).finish()
    }
}
