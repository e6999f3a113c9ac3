//! The memo cell behind every derived fact in the graph.
//!
//! A [`Cache`] holds one lazily computed value for one node. It is computed
//! at most once by an outermost caller; a caller that re-enters the same
//! cell while it is still being computed (a cycle on the current call
//! stack) gets the `on_cycle` value instead, and that value is not stored.
//! The outermost frame stores whatever its computation returns.
//!
//! The cell is single-threaded: `InProgress` means "further up this call
//! stack", which only holds because `RefCell` makes the owner `!Sync`.

use std::cell::RefCell;
use std::fmt;

enum CacheState<T> {
    NotComputed,
    InProgress,
    Computed(T),
}

pub(crate) struct Cache<T> {
    state: RefCell<CacheState<T>>,
}

impl<T> Default for Cache<T> {
    fn default() -> Self {
        Self {
            state: RefCell::new(CacheState::NotComputed),
        }
    }
}

impl<T: Clone> Cache<T> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value, computing it on first access.
    ///
    /// No `RefCell` borrow is held while `compute` or `on_cycle` run, so
    /// both may freely read other cells, including this one.
    pub(crate) fn get_or_compute<F, C>(&self, compute: F, on_cycle: C) -> T
    where
        F: FnOnce() -> T,
        C: FnOnce() -> T,
    {
        let in_progress = match &*self.state.borrow() {
            CacheState::Computed(value) => return value.clone(),
            CacheState::InProgress => true,
            CacheState::NotComputed => false,
        };
        if in_progress {
            return on_cycle();
        }

        *self.state.borrow_mut() = CacheState::InProgress;
        let value = compute();
        *self.state.borrow_mut() = CacheState::Computed(value.clone());
        value
    }

    /// Like [`Cache::get_or_compute`], yielding `T::default()` on re-entry.
    pub(crate) fn get_or_default<F>(&self, compute: F) -> T
    where
        F: FnOnce() -> T,
        T: Default,
    {
        self.get_or_compute(compute, T::default)
    }

    /// Returns true while an outer frame is computing this cell.
    #[cfg(test)]
    pub(crate) fn is_in_progress(&self) -> bool {
        matches!(&*self.state.borrow(), CacheState::InProgress)
    }

    #[cfg(test)]
    pub(crate) fn is_computed(&self) -> bool {
        matches!(&*self.state.borrow(), CacheState::Computed(_))
    }
}

impl<T> fmt::Debug for Cache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.state.borrow() {
            CacheState::NotComputed => "NotComputed",
            CacheState::InProgress => "InProgress",
            CacheState::Computed(_) => "Computed",
        };
        f.debug_tuple("Cache").field(&state).finish()
    }
}
