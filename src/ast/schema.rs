//! Schema-level declarations: types, properties, enumerations and terms.

use crate::ast::annotation::{CsdlAnnotationSet, CsdlAnnotations, impl_annotatable};
use crate::ast::container::CsdlEntityContainer;
use crate::ast::operation::CsdlOperation;
use crate::ast::span::{Span, impl_located};
use crate::ast::types::CsdlTypeReference;
use smol_str::SmolStr;

// ============================================================================
// Schema
// ============================================================================

/// One namespace's worth of declarations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsdlSchema {
    pub namespace: SmolStr,
    pub alias: Option<SmolStr>,
    pub entity_types: Vec<CsdlEntityType>,
    pub complex_types: Vec<CsdlComplexType>,
    pub enum_types: Vec<CsdlEnumType>,
    pub type_definitions: Vec<CsdlTypeDefinition>,
    pub operations: Vec<CsdlOperation>,
    pub terms: Vec<CsdlTerm>,
    pub entity_containers: Vec<CsdlEntityContainer>,
    pub out_of_line_annotations: Vec<CsdlAnnotations>,
    pub annotations: CsdlAnnotationSet,
    pub location: Option<Span>,
}

impl CsdlSchema {
    /// An empty schema in `namespace`.
    pub fn new(namespace: impl Into<SmolStr>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// Sets the alias.
    pub fn with_alias(mut self, alias: impl Into<SmolStr>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Appends an entity type.
    pub fn with_entity_type(mut self, ty: CsdlEntityType) -> Self {
        self.entity_types.push(ty);
        self
    }

    /// Appends a complex type.
    pub fn with_complex_type(mut self, ty: CsdlComplexType) -> Self {
        self.complex_types.push(ty);
        self
    }

    /// Appends an enum type.
    pub fn with_enum_type(mut self, ty: CsdlEnumType) -> Self {
        self.enum_types.push(ty);
        self
    }

    /// Appends a type definition.
    pub fn with_type_definition(mut self, ty: CsdlTypeDefinition) -> Self {
        self.type_definitions.push(ty);
        self
    }

    /// Appends an operation overload.
    pub fn with_operation(mut self, operation: CsdlOperation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Appends a term.
    pub fn with_term(mut self, term: CsdlTerm) -> Self {
        self.terms.push(term);
        self
    }

    /// Appends an entity container.
    pub fn with_container(mut self, container: CsdlEntityContainer) -> Self {
        self.entity_containers.push(container);
        self
    }

    /// Adds an `Annotations` block.
    pub fn with_out_of_line(mut self, annotations: CsdlAnnotations) -> Self {
        self.out_of_line_annotations.push(annotations);
        self
    }
}

// ============================================================================
// Structured Types
// ============================================================================

/// A declared member of a structured type, in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum CsdlMember {
    Property(CsdlProperty),
    Navigation(CsdlNavigationProperty),
}

impl CsdlMember {
    /// The unqualified name of the member.
    pub fn name(&self) -> &SmolStr {
        match self {
            Self::Property(p) => &p.name,
            Self::Navigation(n) => &n.name,
        }
    }
}

/// `<EntityType>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsdlEntityType {
    pub name: SmolStr,
    pub base_type: Option<SmolStr>,
    pub is_abstract: bool,
    pub is_open: bool,
    pub has_stream: bool,
    pub key: Option<CsdlKey>,
    pub members: Vec<CsdlMember>,
    pub annotations: CsdlAnnotationSet,
    pub location: Option<Span>,
}

/// `<ComplexType>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsdlComplexType {
    pub name: SmolStr,
    pub base_type: Option<SmolStr>,
    pub is_abstract: bool,
    pub is_open: bool,
    pub members: Vec<CsdlMember>,
    pub annotations: CsdlAnnotationSet,
    pub location: Option<Span>,
}

/// `<Key>` with its `<PropertyRef>` names in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsdlKey {
    pub property_refs: Vec<CsdlPropertyRef>,
    pub location: Option<Span>,
}

/// One `<PropertyRef Name="...">`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsdlPropertyRef {
    pub name: SmolStr,
    pub location: Option<Span>,
}

/// Builder methods shared by entity and complex types.
macro_rules! impl_structured_builders {
    ($($ty:ty),*) => {
        $(
            impl $ty {
                /// An empty type.
                pub fn new(name: impl Into<SmolStr>) -> Self {
                    Self {
                        name: name.into(),
                        ..Self::default()
                    }
                }

                /// Sets the base type by qualified name.
                pub fn with_base_type(mut self, name: impl Into<SmolStr>) -> Self {
                    self.base_type = Some(name.into());
                    self
                }

                /// Appends a structural property.
                pub fn with_property(mut self, property: CsdlProperty) -> Self {
                    self.members.push(CsdlMember::Property(property));
                    self
                }

                /// Appends a navigation property.
                pub fn with_navigation(mut self, property: CsdlNavigationProperty) -> Self {
                    self.members.push(CsdlMember::Navigation(property));
                    self
                }

                /// Marks the type `Abstract`.
                pub fn as_abstract(mut self) -> Self {
                    self.is_abstract = true;
                    self
                }

                /// Marks the type `OpenType`.
                pub fn as_open(mut self) -> Self {
                    self.is_open = true;
                    self
                }

                /// Records where the element was written.
                pub fn at(mut self, span: Span) -> Self {
                    self.location = Some(span);
                    self
                }
            }
        )*
    };
}

impl_structured_builders!(CsdlEntityType, CsdlComplexType);

impl CsdlEntityType {
    /// Declares the key from property names, in order.
    pub fn with_key<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.key = Some(CsdlKey {
            property_refs: names
                .into_iter()
                .map(|name| CsdlPropertyRef {
                    name: name.into(),
                    location: None,
                })
                .collect(),
            location: None,
        });
        self
    }
}

// ============================================================================
// Properties
// ============================================================================

/// `ConcurrencyMode` of a structural property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConcurrencyMode {
    #[default]
    None,
    Fixed,
}

/// `<Property>`.
#[derive(Debug, Clone, PartialEq)]
pub struct CsdlProperty {
    pub name: SmolStr,
    pub type_ref: CsdlTypeReference,
    pub default_value: Option<SmolStr>,
    pub concurrency_mode: ConcurrencyMode,
    pub annotations: CsdlAnnotationSet,
    pub location: Option<Span>,
}

impl CsdlProperty {
    /// A nullable structural property.
    pub fn new(name: impl Into<SmolStr>, type_ref: CsdlTypeReference) -> Self {
        Self {
            name: name.into(),
            type_ref,
            default_value: None,
            concurrency_mode: ConcurrencyMode::None,
            annotations: CsdlAnnotationSet::default(),
            location: None,
        }
    }

    /// Sets the `DefaultValue` text.
    pub fn with_default(mut self, value: impl Into<SmolStr>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Sets the concurrency mode.
    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    /// Records where the element was written.
    pub fn at(mut self, span: Span) -> Self {
        self.location = Some(span);
        self
    }
}

/// `OnDelete` action of a navigation property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OnDeleteAction {
    #[default]
    None,
    Cascade,
    SetNull,
    SetDefault,
}

/// `<ReferentialConstraint Property="..." ReferencedProperty="...">`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsdlReferentialConstraint {
    pub property: SmolStr,
    pub referenced_property: SmolStr,
    pub location: Option<Span>,
}

/// `<NavigationProperty>`.
///
/// `type_name` is kept raw, including any `Collection(...)` wrapper.
#[derive(Debug, Clone, PartialEq)]
pub struct CsdlNavigationProperty {
    pub name: SmolStr,
    pub type_name: SmolStr,
    pub nullable: Option<bool>,
    pub partner: Option<SmolStr>,
    pub contains_target: bool,
    pub on_delete: Option<OnDeleteAction>,
    pub referential_constraints: Vec<CsdlReferentialConstraint>,
    pub annotations: CsdlAnnotationSet,
    pub location: Option<Span>,
}

impl CsdlNavigationProperty {
    /// A navigation property to `type_name`, which may be `Collection(...)`.
    pub fn new(name: impl Into<SmolStr>, type_name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable: None,
            partner: None,
            contains_target: false,
            on_delete: None,
            referential_constraints: Vec::new(),
            annotations: CsdlAnnotationSet::default(),
            location: None,
        }
    }

    /// Names the partner on the target type.
    pub fn with_partner(mut self, partner: impl Into<SmolStr>) -> Self {
        self.partner = Some(partner.into());
        self
    }

    /// Sets `Nullable` explicitly.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    /// Marks the property `ContainsTarget`.
    pub fn containing(mut self) -> Self {
        self.contains_target = true;
        self
    }

    /// Sets the `OnDelete` action.
    pub fn with_on_delete(mut self, action: OnDeleteAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Appends a referential constraint.
    pub fn with_constraint(
        mut self,
        property: impl Into<SmolStr>,
        referenced_property: impl Into<SmolStr>,
    ) -> Self {
        self.referential_constraints.push(CsdlReferentialConstraint {
            property: property.into(),
            referenced_property: referenced_property.into(),
            location: None,
        });
        self
    }

    /// Records where the element was written.
    pub fn at(mut self, span: Span) -> Self {
        self.location = Some(span);
        self
    }
}

// ============================================================================
// Enumerations, Type Definitions, Terms
// ============================================================================

/// `<EnumType>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsdlEnumType {
    pub name: SmolStr,
    pub underlying_type: Option<SmolStr>,
    pub is_flags: bool,
    pub members: Vec<CsdlEnumMember>,
    pub annotations: CsdlAnnotationSet,
    pub location: Option<Span>,
}

impl CsdlEnumType {
    /// An enum type with the default underlying type.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the underlying integer type by name.
    pub fn with_underlying_type(mut self, name: impl Into<SmolStr>) -> Self {
        self.underlying_type = Some(name.into());
        self
    }

    /// Marks the enum `IsFlags`.
    pub fn as_flags(mut self) -> Self {
        self.is_flags = true;
        self
    }

    /// Adds a member with an implicit value.
    pub fn with_member(mut self, name: impl Into<SmolStr>) -> Self {
        self.members.push(CsdlEnumMember::new(name, None));
        self
    }

    /// Adds a member with an explicit value.
    pub fn with_valued_member(mut self, name: impl Into<SmolStr>, value: i64) -> Self {
        self.members.push(CsdlEnumMember::new(name, Some(value)));
        self
    }
}

/// `<Member Name="..." Value="...">`.
#[derive(Debug, Clone, PartialEq)]
pub struct CsdlEnumMember {
    pub name: SmolStr,
    pub value: Option<i64>,
    pub annotations: CsdlAnnotationSet,
    pub location: Option<Span>,
}

impl CsdlEnumMember {
    /// A member with an explicit or implicit value.
    pub fn new(name: impl Into<SmolStr>, value: Option<i64>) -> Self {
        Self {
            name: name.into(),
            value,
            annotations: CsdlAnnotationSet::default(),
            location: None,
        }
    }
}

/// `<TypeDefinition>`.
#[derive(Debug, Clone, PartialEq)]
pub struct CsdlTypeDefinition {
    pub name: SmolStr,
    pub underlying_type: SmolStr,
    pub annotations: CsdlAnnotationSet,
    pub location: Option<Span>,
}

impl CsdlTypeDefinition {
    /// A type definition over `underlying_type`.
    pub fn new(name: impl Into<SmolStr>, underlying_type: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            underlying_type: underlying_type.into(),
            annotations: CsdlAnnotationSet::default(),
            location: None,
        }
    }
}

/// `<Term>`.
#[derive(Debug, Clone, PartialEq)]
pub struct CsdlTerm {
    pub name: SmolStr,
    pub type_ref: CsdlTypeReference,
    pub base_term: Option<SmolStr>,
    pub applies_to: Vec<SmolStr>,
    pub default_value: Option<SmolStr>,
    pub annotations: CsdlAnnotationSet,
    pub location: Option<Span>,
}

impl CsdlTerm {
    /// A term whose values have type `type_ref`.
    pub fn new(name: impl Into<SmolStr>, type_ref: CsdlTypeReference) -> Self {
        Self {
            name: name.into(),
            type_ref,
            base_term: None,
            applies_to: Vec::new(),
            default_value: None,
            annotations: CsdlAnnotationSet::default(),
            location: None,
        }
    }

    /// Sets the term this one specializes.
    pub fn with_base_term(mut self, name: impl Into<SmolStr>) -> Self {
        self.base_term = Some(name.into());
        self
    }

    /// Adds one element kind to `AppliesTo`.
    pub fn applying_to(mut self, kind: impl Into<SmolStr>) -> Self {
        self.applies_to.push(kind.into());
        self
    }
}

impl_located!(
    CsdlSchema,
    CsdlEntityType,
    CsdlComplexType,
    CsdlKey,
    CsdlPropertyRef,
    CsdlProperty,
    CsdlReferentialConstraint,
    CsdlNavigationProperty,
    CsdlEnumType,
    CsdlEnumMember,
    CsdlTypeDefinition,
    CsdlTerm,
);

impl_annotatable!(
    CsdlSchema,
    CsdlEntityType,
    CsdlComplexType,
    CsdlProperty,
    CsdlNavigationProperty,
    CsdlEnumType,
    CsdlEnumMember,
    CsdlTypeDefinition,
    CsdlTerm,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::PrimitiveKind;

    #[test]
    fn members_keep_document_order() {
        let ty = CsdlEntityType::new("Order")
            .with_navigation(CsdlNavigationProperty::new("Id", "NS.Other"))
            .with_property(CsdlProperty::new(
                "Id",
                CsdlTypeReference::primitive(PrimitiveKind::Int32),
            ));
        assert!(matches!(ty.members[0], CsdlMember::Navigation(_)));
        assert!(matches!(ty.members[1], CsdlMember::Property(_)));
        assert_eq!(ty.members[1].name(), "Id");
    }

    #[test]
    fn key_builder_preserves_order() {
        let ty = CsdlEntityType::new("Line").with_key(["OrderId", "LineNo"]);
        let names: Vec<_> = ty
            .key
            .expect("key")
            .property_refs
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, ["OrderId", "LineNo"]);
    }
}
