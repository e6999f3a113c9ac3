//! Model configuration and resolution counters.

use std::cell::Cell;

/// Configuration for semantic resolution.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Nullability of a single-valued navigation property that does not say.
    pub nullable_navigation_default: bool,

    /// Run the partner scan for navigation properties without a `Partner`.
    pub implicit_partners: bool,

    /// Attach out-of-line `<Annotations>` groups to their targets.
    pub resolve_out_of_line_annotations: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            nullable_navigation_default: true,
            implicit_partners: true,
            resolve_out_of_line_annotations: true,
        }
    }
}

impl ModelConfig {
    /// Sets the nullability of single-valued navigation properties that omit `Nullable`.
    pub fn with_nullable_navigation_default(mut self, value: bool) -> Self {
        self.nullable_navigation_default = value;
        self
    }

    /// Enables or disables the implicit partner scan.
    pub fn with_implicit_partners(mut self, value: bool) -> Self {
        self.implicit_partners = value;
        self
    }

    /// Enables or disables `Annotations` blocks that target other elements.
    pub fn with_out_of_line_annotations(mut self, value: bool) -> Self {
        self.resolve_out_of_line_annotations = value;
        self
    }
}

/// A snapshot of what the model has allocated and detected so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelStats {
    /// Per-element inline-annotation caches allocated.
    pub annotation_caches: usize,
    /// Re-entrant reads answered with a cycle sentinel.
    pub cycles_detected: usize,
    /// Expression nodes created.
    pub expressions: usize,
    /// Contained and unknown navigation sources created.
    pub derived_sources: usize,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    pub(crate) annotation_caches: Cell<usize>,
    pub(crate) cycles_detected: Cell<usize>,
}

impl StatsCounters {
    pub(crate) fn bump(counter: &Cell<usize>) {
        counter.set(counter.get() + 1);
    }
}
