//! Semantic types and type references.
//!
//! A [`TypeDefinition`] is what a type name resolves to: a built-in
//! primitive, a handle to a declared type, a structural wrapper, or a
//! sentinel. A [`TypeReference`] adds the use-site nullability and facets.

use crate::ast::{CsdlFacets, CsdlTypeReference, PrimitiveKind};
use crate::semantic::error::{Checkable, EdmErrorCode, Sentinel};
use crate::semantic::ids::{EnumTypeId, StructuredTypeId, TypeDefinitionId};
use crate::semantic::model::EdmModel;
use tracing::debug;

/// The category a type belongs to, also carried by sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Primitive,
    Entity,
    Complex,
    Enum,
    TypeDefinition,
    Collection,
    EntityReference,
    /// The kind could not be determined (an unresolved plain name).
    Unknown,
}

/// A resolved type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefinition {
    Primitive(PrimitiveKind),
    Entity(StructuredTypeId),
    Complex(StructuredTypeId),
    Enum(EnumTypeId),
    /// A `<TypeDefinition>` over a primitive.
    Alias(TypeDefinitionId),
    Collection(Box<TypeReference>),
    EntityReference(Box<TypeReference>),
    Unresolved(TypeKind, Sentinel),
    Cyclic(TypeKind, Sentinel),
    Bad(TypeKind, Sentinel),
}

impl TypeDefinition {
    /// The kind of type, also known for sentinels.
    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Primitive(_) => TypeKind::Primitive,
            Self::Entity(_) => TypeKind::Entity,
            Self::Complex(_) => TypeKind::Complex,
            Self::Enum(_) => TypeKind::Enum,
            Self::Alias(_) => TypeKind::TypeDefinition,
            Self::Collection(_) => TypeKind::Collection,
            Self::EntityReference(_) => TypeKind::EntityReference,
            Self::Unresolved(kind, _) | Self::Cyclic(kind, _) | Self::Bad(kind, _) => *kind,
        }
    }

    /// Returns the sentinel payload of a placeholder type.
    pub fn sentinel(&self) -> Option<&Sentinel> {
        match self {
            Self::Unresolved(_, sentinel) | Self::Cyclic(_, sentinel) | Self::Bad(_, sentinel) => {
                Some(sentinel)
            }
            _ => None,
        }
    }

    /// Returns the handle of an entity or complex type.
    pub fn as_structured(&self) -> Option<StructuredTypeId> {
        match self {
            Self::Entity(id) | Self::Complex(id) => Some(*id),
            _ => None,
        }
    }

    /// The entity type, if this is one.
    pub fn as_entity(&self) -> Option<StructuredTypeId> {
        match self {
            Self::Entity(id) => Some(*id),
            _ => None,
        }
    }

    /// The primitive kind, if this is one.
    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            Self::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Returns true if the type inherits from itself.
    pub fn is_cyclic(&self) -> bool {
        matches!(self, Self::Cyclic(..))
    }

    pub(crate) fn unresolved(
        kind: TypeKind,
        name: &str,
        location: Option<crate::ast::Span>,
        code: EdmErrorCode,
    ) -> Self {
        Self::Unresolved(
            kind,
            Sentinel::error(name, location, code, format!("The type '{name}' could not be found.")),
        )
    }
}

/// Answer for a type slot read while it is still being computed.
pub(crate) fn reentrant_type(name: &str) -> TypeDefinition {
    TypeDefinition::Bad(
        TypeKind::Unknown,
        Sentinel::error(
            name,
            None,
            EdmErrorCode::BadUnresolvedType,
            format!("The type of '{name}' depends on itself."),
        ),
    )
}

impl Checkable for TypeDefinition {
    fn sentinel(&self) -> Option<&Sentinel> {
        match self {
            Self::Unresolved(_, sentinel) | Self::Cyclic(_, sentinel) | Self::Bad(_, sentinel) => {
                Some(sentinel)
            }
            Self::Collection(element) | Self::EntityReference(element) => element.sentinel(),
            _ => None,
        }
    }
}

/// A type at a use site.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeReference {
    pub definition: TypeDefinition,
    pub nullable: bool,
    pub facets: CsdlFacets,
}

impl TypeReference {
    /// Creates a reference without facets.
    pub fn new(definition: TypeDefinition, nullable: bool) -> Self {
        Self {
            definition,
            nullable,
            facets: CsdlFacets::default(),
        }
    }

    /// A reference to a primitive type without facets.
    pub fn primitive(kind: PrimitiveKind, nullable: bool) -> Self {
        Self::new(TypeDefinition::Primitive(kind), nullable)
    }

    /// A non-nullable collection of `element`.
    pub fn collection(element: TypeReference) -> Self {
        Self::new(TypeDefinition::Collection(Box::new(element)), false)
    }

    /// Replaces the facets.
    pub fn with_facets(mut self, facets: CsdlFacets) -> Self {
        self.facets = facets;
        self
    }

    /// Returns the element type of a collection reference.
    pub fn element(&self) -> Option<&TypeReference> {
        match &self.definition {
            TypeDefinition::Collection(element) => Some(element),
            _ => None,
        }
    }

    /// Returns true for `Collection(...)` references.
    pub fn is_collection(&self) -> bool {
        matches!(self.definition, TypeDefinition::Collection(_))
    }

    /// The structured type of this reference or of its collection element.
    pub fn structured_element(&self) -> Option<StructuredTypeId> {
        match &self.definition {
            TypeDefinition::Collection(element) => element.definition.as_structured(),
            other => other.as_structured(),
        }
    }
}

impl Checkable for TypeReference {
    fn sentinel(&self) -> Option<&Sentinel> {
        self.definition.sentinel()
    }
}

// ============================================================================
// Resolution
// ============================================================================

impl<'a> EdmModel<'a> {
    /// Resolves a use-site type reference from the syntax tree.
    pub fn resolve_type_reference(&self, ast: &CsdlTypeReference) -> TypeReference {
        match ast {
            CsdlTypeReference::Primitive {
                kind,
                nullable,
                facets,
                ..
            } => TypeReference::primitive(*kind, *nullable).with_facets(facets.clone()),
            CsdlTypeReference::Named {
                name,
                nullable,
                facets,
                location,
            } => {
                let definition = self.find_type(name).unwrap_or_else(|| {
                    debug!(name = %name, "unresolved type reference");
                    TypeDefinition::unresolved(
                        TypeKind::Unknown,
                        name,
                        location.clone(),
                        EdmErrorCode::BadUnresolvedType,
                    )
                });
                TypeReference::new(definition, *nullable).with_facets(facets.clone())
            }
            CsdlTypeReference::Collection { element, .. } => {
                TypeReference::collection(self.resolve_type_reference(element))
            }
            CsdlTypeReference::EntityReference {
                entity_type,
                nullable,
                location,
            } => {
                let target = self.find_entity_type(entity_type, location.clone());
                TypeReference::new(
                    TypeDefinition::EntityReference(Box::new(TypeReference::new(target, false))),
                    *nullable,
                )
            }
        }
    }

    /// Resolves `name` to an entity type or an unresolved entity sentinel.
    pub(crate) fn find_entity_type(
        &self,
        name: &str,
        location: Option<crate::ast::Span>,
    ) -> TypeDefinition {
        match self.find_type(name) {
            Some(definition @ TypeDefinition::Entity(_)) => definition,
            _ => {
                debug!(name, "unresolved entity type");
                TypeDefinition::unresolved(
                    TypeKind::Entity,
                    name,
                    location,
                    EdmErrorCode::BadUnresolvedEntityType,
                )
            }
        }
    }

    // ========================================================================
    // Castability
    // ========================================================================

    /// Returns true if a value of `from` may be passed where `to` is expected.
    ///
    /// Primitives widen along the promotion table, structured types cast to
    /// their ancestors, collections cast element-wise, and type definitions
    /// behave as their underlying type. Sentinels never cast.
    pub fn is_castable(&self, from: &TypeReference, to: &TypeReference) -> bool {
        self.definition_castable(&from.definition, &to.definition)
    }

    /// Returns true if `from` and `to` name the same type.
    ///
    /// Nullability and facets are ignored, including those of collection
    /// and entity reference elements.
    pub fn is_exact_match(&self, from: &TypeReference, to: &TypeReference) -> bool {
        !from.is_bad() && !to.is_bad() && same_definition(&from.definition, &to.definition)
    }

    fn definition_castable(&self, from: &TypeDefinition, to: &TypeDefinition) -> bool {
        if from.is_bad() || to.is_bad() {
            return false;
        }
        let from = self.strip_alias(from);
        let to = self.strip_alias(to);
        match (&from, &to) {
            (TypeDefinition::Primitive(a), TypeDefinition::Primitive(b)) => {
                a == b || a.promotes_to(*b) || *b == PrimitiveKind::PrimitiveType
            }
            (TypeDefinition::Entity(a), TypeDefinition::Entity(b))
            | (TypeDefinition::Complex(a), TypeDefinition::Complex(b)) => {
                self.is_derived_from(*a, *b)
            }
            (TypeDefinition::Enum(a), TypeDefinition::Enum(b)) => a == b,
            (TypeDefinition::Collection(a), TypeDefinition::Collection(b))
            | (TypeDefinition::EntityReference(a), TypeDefinition::EntityReference(b)) => {
                self.definition_castable(&a.definition, &b.definition)
            }
            _ => false,
        }
    }

    fn strip_alias(&self, definition: &TypeDefinition) -> TypeDefinition {
        match definition {
            TypeDefinition::Alias(id) => self.type_definition_underlying(*id),
            other => other.clone(),
        }
    }
}

fn same_definition(from: &TypeDefinition, to: &TypeDefinition) -> bool {
    match (from, to) {
        (TypeDefinition::Collection(a), TypeDefinition::Collection(b))
        | (TypeDefinition::EntityReference(a), TypeDefinition::EntityReference(b)) => {
            same_definition(&a.definition, &b.definition)
        }
        _ => from == to,
    }
}
