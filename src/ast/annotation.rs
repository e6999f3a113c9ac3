//! Annotations as written in a CSDL document.

use crate::ast::expression::CsdlExpression;
use crate::ast::span::{Span, impl_located};
use smol_str::SmolStr;

/// An inline `<Annotation Term="..." Qualifier="...">`.
#[derive(Debug, Clone, PartialEq)]
pub struct CsdlAnnotation {
    pub term: SmolStr,
    pub qualifier: Option<SmolStr>,
    pub value: CsdlExpression,
    /// Annotations on the annotation itself.
    pub annotations: CsdlAnnotationSet,
    pub location: Option<Span>,
}

impl_located!(CsdlAnnotation);

impl CsdlAnnotation {
    /// Applies `term` with `value`.
    pub fn new(term: impl Into<SmolStr>, value: CsdlExpression) -> Self {
        Self {
            term: term.into(),
            qualifier: None,
            value,
            annotations: CsdlAnnotationSet::default(),
            location: None,
        }
    }

    /// Sets the `Qualifier`.
    pub fn with_qualifier(mut self, qualifier: impl Into<SmolStr>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Nests an annotation on this annotation.
    pub fn with_annotation(mut self, annotation: CsdlAnnotation) -> Self {
        self.annotations.vocabulary.push(annotation);
        self
    }

    /// Records where the element was written.
    pub fn at(mut self, span: Span) -> Self {
        self.location = Some(span);
        self
    }
}

/// A foreign-namespace attribute or element kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsdlDirectValueAnnotation {
    pub namespace_uri: SmolStr,
    pub name: SmolStr,
    pub value: SmolStr,
    pub location: Option<Span>,
}

impl_located!(CsdlDirectValueAnnotation);

impl CsdlDirectValueAnnotation {
    /// A non-vocabulary annotation in a foreign XML namespace.
    pub fn new(
        namespace_uri: impl Into<SmolStr>,
        name: impl Into<SmolStr>,
        value: impl Into<SmolStr>,
    ) -> Self {
        Self {
            namespace_uri: namespace_uri.into(),
            name: name.into(),
            value: value.into(),
            location: None,
        }
    }
}

/// Everything an annotatable element carries inline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsdlAnnotationSet {
    pub vocabulary: Vec<CsdlAnnotation>,
    pub direct_values: Vec<CsdlDirectValueAnnotation>,
}

impl CsdlAnnotationSet {
    /// Returns true if the element has any inline annotation at all.
    pub fn has_any(&self) -> bool {
        !self.vocabulary.is_empty() || !self.direct_values.is_empty()
    }
}

/// An out-of-line `<Annotations Target="...">` group.
#[derive(Debug, Clone, PartialEq)]
pub struct CsdlAnnotations {
    pub target: SmolStr,
    pub qualifier: Option<SmolStr>,
    pub annotations: Vec<CsdlAnnotation>,
    pub location: Option<Span>,
}

impl_located!(CsdlAnnotations);

impl CsdlAnnotations {
    /// An `Annotations` block targeting `target`.
    pub fn new(target: impl Into<SmolStr>) -> Self {
        Self {
            target: target.into(),
            qualifier: None,
            annotations: Vec::new(),
            location: None,
        }
    }

    /// Adds an annotation to the block.
    pub fn with_annotation(mut self, annotation: CsdlAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// Adds the `with_annotation`/`with_direct_value` builders to AST nodes that
/// carry an `annotations: CsdlAnnotationSet` field.
macro_rules! impl_annotatable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $ty {
                /// Attaches an inline vocabulary annotation.
                pub fn with_annotation(mut self, annotation: $crate::ast::CsdlAnnotation) -> Self {
                    self.annotations.vocabulary.push(annotation);
                    self
                }

                /// Attaches a direct value annotation.
                pub fn with_direct_value(
                    mut self,
                    annotation: $crate::ast::CsdlDirectValueAnnotation,
                ) -> Self {
                    self.annotations.direct_values.push(annotation);
                    self
                }
            }
        )*
    };
}

pub(crate) use impl_annotatable;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_has_no_annotations() {
        assert!(!CsdlAnnotationSet::default().has_any());
    }

    #[test]
    fn direct_value_counts_as_annotation() {
        let set = CsdlAnnotationSet {
            vocabulary: Vec::new(),
            direct_values: vec![CsdlDirectValueAnnotation::new("urn:x", "Hint", "1")],
        };
        assert!(set.has_any());
    }
}
