//! Annotation value expressions.
//!
//! Expressions appear as the values of vocabulary annotations. They are kept
//! in their raw textual form here: constants hold the literal text, paths
//! hold the `/`-separated path, references hold the referenced name.

use crate::ast::span::{Span, impl_located};
use crate::ast::types::CsdlTypeReference;
use smol_str::SmolStr;

/// The literal kind of a constant expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstantKind {
    Binary,
    Boolean,
    Date,
    DateTimeOffset,
    Decimal,
    Duration,
    Float,
    Guid,
    Int,
    String,
    TimeOfDay,
}

/// Which path element a path expression was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// `<Path>`: a value path.
    Value,
    /// `<PropertyPath>`.
    Property,
    /// `<NavigationPropertyPath>`.
    NavigationProperty,
    /// `<AnnotationPath>`.
    Annotation,
}

/// A parsed expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct CsdlExpression {
    pub kind: CsdlExpressionKind,
    pub location: Option<Span>,
}

impl_located!(CsdlExpression);

/// The shape of an expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum CsdlExpressionKind {
    Constant {
        kind: ConstantKind,
        value: SmolStr,
    },
    Null,
    Path {
        kind: PathKind,
        path: SmolStr,
    },
    Cast {
        target: CsdlTypeReference,
        operand: Box<CsdlExpression>,
    },
    IsType {
        target: CsdlTypeReference,
        operand: Box<CsdlExpression>,
    },
    If {
        test: Box<CsdlExpression>,
        if_true: Box<CsdlExpression>,
        if_false: Box<CsdlExpression>,
    },
    Record {
        type_name: Option<SmolStr>,
        properties: Vec<CsdlPropertyValue>,
    },
    Collection {
        element_type: Option<CsdlTypeReference>,
        elements: Vec<CsdlExpression>,
    },
    PropertyReference {
        base: Option<Box<CsdlExpression>>,
        property: SmolStr,
    },
    ParameterReference {
        parameter: SmolStr,
    },
    OperationReference {
        operation: SmolStr,
    },
    Apply {
        operation: SmolStr,
        arguments: Vec<CsdlExpression>,
    },
    Labeled {
        label: SmolStr,
        element: Box<CsdlExpression>,
    },
    LabeledReference {
        label: SmolStr,
    },
    /// One or more space-separated `Namespace.Enum/Member` names.
    EnumMember {
        members: SmolStr,
    },
}

/// A `PropertyValue` inside a record expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CsdlPropertyValue {
    pub property: SmolStr,
    pub value: CsdlExpression,
    pub location: Option<Span>,
}

impl_located!(CsdlPropertyValue);

impl CsdlPropertyValue {
    /// One property of a record expression.
    pub fn new(property: impl Into<SmolStr>, value: CsdlExpression) -> Self {
        Self {
            property: property.into(),
            value,
            location: None,
        }
    }
}

impl CsdlExpression {
    /// Wraps a kind with no location.
    pub fn new(kind: CsdlExpressionKind) -> Self {
        Self {
            kind,
            location: None,
        }
    }

    /// Sets the source location.
    pub fn at(mut self, span: Span) -> Self {
        self.location = Some(span);
        self
    }

    /// A constant written with its text unparsed.
    pub fn constant(kind: ConstantKind, value: impl Into<SmolStr>) -> Self {
        Self::new(CsdlExpressionKind::Constant {
            kind,
            value: value.into(),
        })
    }

    /// An integer constant.
    pub fn int(value: i64) -> Self {
        Self::constant(ConstantKind::Int, value.to_string())
    }

    /// A string constant.
    pub fn string(value: impl Into<SmolStr>) -> Self {
        Self::constant(ConstantKind::String, value)
    }

    /// A boolean constant.
    pub fn boolean(value: bool) -> Self {
        Self::constant(ConstantKind::Boolean, if value { "true" } else { "false" })
    }

    /// The `Null` expression.
    pub fn null() -> Self {
        Self::new(CsdlExpressionKind::Null)
    }

    /// A path expression of the given kind.
    pub fn path(kind: PathKind, path: impl Into<SmolStr>) -> Self {
        Self::new(CsdlExpressionKind::Path {
            kind,
            path: path.into(),
        })
    }

    /// `Cast` of `operand` to `target`.
    pub fn cast(target: CsdlTypeReference, operand: CsdlExpression) -> Self {
        Self::new(CsdlExpressionKind::Cast {
            target,
            operand: Box::new(operand),
        })
    }

    /// `IsOf` test of `operand` against `target`.
    pub fn is_type(target: CsdlTypeReference, operand: CsdlExpression) -> Self {
        Self::new(CsdlExpressionKind::IsType {
            target,
            operand: Box::new(operand),
        })
    }

    /// `If` with a test and two branches.
    pub fn if_else(test: CsdlExpression, if_true: CsdlExpression, if_false: CsdlExpression) -> Self {
        Self::new(CsdlExpressionKind::If {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        })
    }

    /// A record, optionally typed.
    pub fn record(type_name: Option<&str>, properties: Vec<CsdlPropertyValue>) -> Self {
        Self::new(CsdlExpressionKind::Record {
            type_name: type_name.map(SmolStr::new),
            properties,
        })
    }

    /// An untyped collection.
    pub fn collection(elements: Vec<CsdlExpression>) -> Self {
        Self::new(CsdlExpressionKind::Collection {
            element_type: None,
            elements,
        })
    }

    /// A property reference, relative to `base` or to the annotation context.
    pub fn property_reference(base: Option<CsdlExpression>, property: impl Into<SmolStr>) -> Self {
        Self::new(CsdlExpressionKind::PropertyReference {
            base: base.map(Box::new),
            property: property.into(),
        })
    }

    /// A reference to a parameter of the enclosing operation.
    pub fn parameter_reference(parameter: impl Into<SmolStr>) -> Self {
        Self::new(CsdlExpressionKind::ParameterReference {
            parameter: parameter.into(),
        })
    }

    /// A reference to an operation by name.
    pub fn operation_reference(operation: impl Into<SmolStr>) -> Self {
        Self::new(CsdlExpressionKind::OperationReference {
            operation: operation.into(),
        })
    }

    /// A call to `operation`.
    pub fn apply(operation: impl Into<SmolStr>, arguments: Vec<CsdlExpression>) -> Self {
        Self::new(CsdlExpressionKind::Apply {
            operation: operation.into(),
            arguments,
        })
    }

    /// Labels `element` so it can be referenced by name.
    pub fn labeled(label: impl Into<SmolStr>, element: CsdlExpression) -> Self {
        Self::new(CsdlExpressionKind::Labeled {
            label: label.into(),
            element: Box::new(element),
        })
    }

    /// A reference to a labeled element.
    pub fn labeled_reference(label: impl Into<SmolStr>) -> Self {
        Self::new(CsdlExpressionKind::LabeledReference {
            label: label.into(),
        })
    }

    /// An enum member expression naming space-separated `NS.Enum/Member` values.
    pub fn enum_member(members: impl Into<SmolStr>) -> Self {
        Self::new(CsdlExpressionKind::EnumMember {
            members: members.into(),
        })
    }

    /// Returns the direct sub-expressions in source order.
    pub fn children(&self) -> Vec<&CsdlExpression> {
        match &self.kind {
            CsdlExpressionKind::Cast { operand, .. } | CsdlExpressionKind::IsType { operand, .. } => {
                vec![operand.as_ref()]
            }
            CsdlExpressionKind::If {
                test,
                if_true,
                if_false,
            } => vec![test.as_ref(), if_true.as_ref(), if_false.as_ref()],
            CsdlExpressionKind::Record { properties, .. } => {
                properties.iter().map(|p| &p.value).collect()
            }
            CsdlExpressionKind::Collection { elements, .. } => elements.iter().collect(),
            CsdlExpressionKind::Apply { arguments, .. } => arguments.iter().collect(),
            CsdlExpressionKind::Labeled { element, .. } => vec![element.as_ref()],
            CsdlExpressionKind::PropertyReference { base, .. } => {
                base.iter().map(|b| b.as_ref()).collect()
            }
            CsdlExpressionKind::Constant { .. }
            | CsdlExpressionKind::Null
            | CsdlExpressionKind::Path { .. }
            | CsdlExpressionKind::ParameterReference { .. }
            | CsdlExpressionKind::OperationReference { .. }
            | CsdlExpressionKind::LabeledReference { .. }
            | CsdlExpressionKind::EnumMember { .. } => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_follow_source_order() {
        let expr = CsdlExpression::if_else(
            CsdlExpression::boolean(true),
            CsdlExpression::int(1),
            CsdlExpression::int(2),
        );
        let children = expr.children();
        assert_eq!(children.len(), 3);
        assert_eq!(children[2], &CsdlExpression::int(2));
    }

    #[test]
    fn leaves_have_no_children() {
        assert!(CsdlExpression::labeled_reference("L").children().is_empty());
        assert!(CsdlExpression::null().children().is_empty());
    }

    #[test]
    fn record_children_are_property_values() {
        let expr = CsdlExpression::record(
            Some("NS.Address"),
            vec![
                CsdlPropertyValue::new("Street", CsdlExpression::string("Main")),
                CsdlPropertyValue::new("Number", CsdlExpression::int(7)),
            ],
        );
        assert_eq!(expr.children().len(), 2);
    }
}
