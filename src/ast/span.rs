//! Source locations carried by CSDL syntax nodes.

use std::ops::Range;

/// A byte range in the schema document a node was parsed from.
///
/// This is the canonical location type used by the AST and by every
/// diagnostic the resolver produces.
pub type Span = Range<usize>;

/// A syntax node that may know where it came from.
///
/// Synthetic nodes (built in code rather than parsed) report `None`; the
/// resolver then attaches diagnostics without a location.
pub trait Located {
    /// Returns the node's source location, if any.
    fn location(&self) -> Option<Span>;
}

/// Implements [`Located`] for AST structs with a `location: Option<Span>` field.
macro_rules! impl_located {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::ast::span::Located for $ty {
                fn location(&self) -> Option<$crate::ast::span::Span> {
                    self.location.clone()
                }
            }
        )*
    };
}

pub(crate) use impl_located;

#[cfg(test)]
mod tests {
    use super::*;

    struct Node {
        location: Option<Span>,
    }

    impl_located!(Node);

    #[test]
    fn located_reports_span() {
        let node = Node {
            location: Some(3..9),
        };
        assert_eq!(node.location(), Some(3..9));
    }

    #[test]
    fn synthetic_node_has_no_location() {
        let node = Node { location: None };
        assert!(node.location().is_none());
    }
}
