//! Handles into the model arena.
//!
//! Every semantic node is addressed by a small `Copy` index. Handles are
//! only meaningful for the [`EdmModel`](super::EdmModel) that issued them.

macro_rules! define_id {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(usize);

            impl $name {
                pub(crate) fn new(index: usize) -> Self {
                    Self(index)
                }

                /// Returns the raw arena index.
                pub fn as_usize(self) -> usize {
                    self.0
                }
            }
        )*
    };
}

define_id! {
    /// A schema, in the order the model was given them.
    SchemaId;
    /// An entity or complex type.
    StructuredTypeId;
    /// A structural or navigation property.
    PropertyId;
    EnumTypeId;
    EnumMemberId;
    TypeDefinitionId;
    /// A function or action overload.
    OperationId;
    ParameterId;
    TermId;
    ContainerId;
    /// A declared entity set or singleton.
    NavigationSourceId;
    OperationImportId;
    /// An expression node, created on first access.
    ExprId;
    /// A vocabulary annotation, created on first access.
    AnnotationId;
    /// A contained or unknown navigation source, created on first access.
    DerivedSourceId;
}

/// Any element that can carry annotations or act as a binding context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementRef {
    Schema(SchemaId),
    StructuredType(StructuredTypeId),
    Property(PropertyId),
    EnumType(EnumTypeId),
    EnumMember(EnumMemberId),
    TypeDefinition(TypeDefinitionId),
    Operation(OperationId),
    Parameter(ParameterId),
    /// The return type of an operation.
    ReturnType(OperationId),
    Term(TermId),
    Container(ContainerId),
    NavigationSource(NavigationSourceId),
    OperationImport(OperationImportId),
    Annotation(AnnotationId),
}
