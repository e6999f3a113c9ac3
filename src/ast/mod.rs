//! Parsed CSDL syntax consumed by the semantic model.
//!
//! The parsing layer that produces these nodes lives outside this crate.
//! Every node keeps references to other declarations as raw, possibly
//! alias-qualified strings; nothing here is resolved. Nodes are immutable
//! once handed to [`crate::semantic::EdmModel`], which borrows them for its
//! whole lifetime.

mod annotation;
mod container;
mod expression;
mod operation;
mod schema;
mod span;
mod types;

pub use annotation::{CsdlAnnotation, CsdlAnnotationSet, CsdlAnnotations, CsdlDirectValueAnnotation};
pub use container::{
    CsdlEntityContainer, CsdlEntitySet, CsdlNavigationPropertyBinding, CsdlOperationImport,
    CsdlSingleton, ImportKind,
};
pub use expression::{ConstantKind, CsdlExpression, CsdlExpressionKind, CsdlPropertyValue, PathKind};
pub use operation::{CsdlOperation, CsdlParameter, CsdlReturnType, OperationKind};
pub use schema::{
    ConcurrencyMode, CsdlComplexType, CsdlEntityType, CsdlEnumMember, CsdlEnumType, CsdlKey,
    CsdlMember, CsdlNavigationProperty, CsdlProperty, CsdlPropertyRef, CsdlReferentialConstraint,
    CsdlSchema, CsdlTerm, CsdlTypeDefinition, OnDeleteAction,
};
pub use span::{Located, Span};
pub use types::{CsdlFacets, CsdlTypeReference, MaxLength, PrimitiveKind};
