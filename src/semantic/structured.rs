//! Entity and complex types: base types, property tables and keys.

use crate::ast::CsdlPropertyRef;
use crate::semantic::config::StatsCounters;
use crate::semantic::error::{Checkable, EdmError, EdmErrorCode, Sentinel};
use crate::semantic::ids::{PropertyId, StructuredTypeId};
use crate::semantic::model::{EdmModel, PropertyAst, StructuredAst, StructuredTypeNode};
use crate::semantic::types::{TypeDefinition, TypeKind};
use smol_str::SmolStr;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::debug;

/// Whether a property holds a value or points at another entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Structural,
    Navigation,
}

/// A property reached through a name.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Declared(PropertyId),
    Unresolved { kind: PropertyKind, sentinel: Sentinel },
}

impl Property {
    /// The declared property, or `None` for a sentinel.
    pub fn as_declared(&self) -> Option<PropertyId> {
        match self {
            Self::Declared(id) => Some(*id),
            Self::Unresolved { .. } => None,
        }
    }

    pub(crate) fn unresolved(kind: PropertyKind, name: &str, error: EdmError) -> Self {
        Self::Unresolved {
            kind,
            sentinel: Sentinel::new(name, error),
        }
    }
}

impl Checkable for Property {
    fn sentinel(&self) -> Option<&Sentinel> {
        match self {
            Self::Declared(_) => None,
            Self::Unresolved { sentinel, .. } => Some(sentinel),
        }
    }
}

/// Effective properties of a structured type: inherited first, then declared.
#[derive(Debug, Default)]
pub(crate) struct PropertyTable {
    pub(crate) ordered: Vec<PropertyId>,
    pub(crate) by_name: HashMap<SmolStr, PropertyId>,
    pub(crate) errors: Vec<EdmError>,
}

impl<'a> EdmModel<'a> {
    pub(crate) fn structured_node(&self, id: StructuredTypeId) -> &StructuredTypeNode<'a> {
        &self.structured[id.as_usize()]
    }

    /// Every entity and complex type, in declaration order.
    pub fn structured_types(&self) -> impl Iterator<Item = StructuredTypeId> + '_ {
        (0..self.structured.len()).map(StructuredTypeId::new)
    }

    /// The namespace-qualified name.
    pub fn structured_type_name(&self, id: StructuredTypeId) -> &SmolStr {
        &self.structured_node(id).qualified_name
    }

    /// [`TypeKind::Entity`] or [`TypeKind::Complex`].
    pub fn structured_type_kind(&self, id: StructuredTypeId) -> TypeKind {
        self.structured_node(id).ast.kind()
    }

    /// The type as a [`TypeDefinition`].
    pub fn structured_type_definition(&self, id: StructuredTypeId) -> TypeDefinition {
        match self.structured_node(id).ast {
            StructuredAst::Entity(_) => TypeDefinition::Entity(id),
            StructuredAst::Complex(_) => TypeDefinition::Complex(id),
        }
    }

    /// Returns true if the type is declared `Abstract`.
    pub fn is_abstract(&self, id: StructuredTypeId) -> bool {
        match self.structured_node(id).ast {
            StructuredAst::Entity(ast) => ast.is_abstract,
            StructuredAst::Complex(ast) => ast.is_abstract,
        }
    }

    /// Returns true if instances may carry undeclared properties.
    pub fn is_open(&self, id: StructuredTypeId) -> bool {
        match self.structured_node(id).ast {
            StructuredAst::Entity(ast) => ast.is_open,
            StructuredAst::Complex(ast) => ast.is_open,
        }
    }

    /// Returns true if an entity type is a media entity.
    pub fn has_stream(&self, id: StructuredTypeId) -> bool {
        matches!(self.structured_node(id).ast, StructuredAst::Entity(ast) if ast.has_stream)
    }

    // ========================================================================
    // Base Types
    // ========================================================================

    /// The resolved base type, `None` when none is declared.
    ///
    /// A type whose base chain loops back to it gets a `Cyclic` sentinel;
    /// a type that merely derives from a cyclic type keeps its real base.
    pub fn base_type(&self, id: StructuredTypeId) -> Option<TypeDefinition> {
        self.structured_node(id).base_type.get_or_compute(
            || self.compute_base_type(id),
            || {
                StatsCounters::bump(&self.counters.cycles_detected);
                debug!(ty = %self.structured_type_name(id), "base type cycle");
                Some(self.cyclic_type(id))
            },
        )
    }

    fn compute_base_type(&self, id: StructuredTypeId) -> Option<TypeDefinition> {
        let node = self.structured_node(id);
        let name = node.ast.base_type()?;
        let kind = node.ast.kind();

        let found = match (kind, self.find_type(name)) {
            (TypeKind::Entity, Some(found @ TypeDefinition::Entity(_)))
            | (TypeKind::Complex, Some(found @ TypeDefinition::Complex(_))) => found,
            _ => {
                let code = match kind {
                    TypeKind::Entity => EdmErrorCode::BadUnresolvedEntityType,
                    _ => EdmErrorCode::BadUnresolvedComplexType,
                };
                debug!(ty = %node.qualified_name, base = %name, "unresolved base type");
                return Some(TypeDefinition::unresolved(kind, name, node.ast.location(), code));
            }
        };

        // Inductive step: force the base's own base type. A cyclic answer
        // only makes this type cyclic when the loop comes back to it.
        let base = found.as_structured()?;
        let base_is_cyclic = self.base_type(base).is_some_and(|b| b.is_cyclic());
        if base_is_cyclic && self.declared_chain_reaches(base, id) {
            return Some(self.cyclic_type(id));
        }
        Some(found)
    }

    /// Follows declared base type names from `from`, looking for `target`.
    fn declared_chain_reaches(&self, from: StructuredTypeId, target: StructuredTypeId) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(from);
        while let Some(ty) = current {
            if ty == target {
                return true;
            }
            if !seen.insert(ty) {
                return false;
            }
            let ast = self.structured_node(ty).ast;
            current = ast
                .base_type()
                .and_then(|name| self.find_type(name))
                .and_then(|base| base.as_structured())
                .filter(|base| self.structured_node(*base).ast.kind() == ast.kind());
        }
        false
    }

    fn cyclic_type(&self, id: StructuredTypeId) -> TypeDefinition {
        let node = self.structured_node(id);
        let kind = node.ast.kind();
        let code = match kind {
            TypeKind::Entity => EdmErrorCode::BadCyclicEntity,
            _ => EdmErrorCode::BadCyclicComplex,
        };
        TypeDefinition::Cyclic(
            kind,
            Sentinel::error(
                node.qualified_name.clone(),
                node.ast.location(),
                code,
                format!("The base type of '{}' is part of a cycle.", node.qualified_name),
            ),
        )
    }

    /// Returns true if `derived` is `ancestor` or inherits from it.
    pub fn is_derived_from(&self, derived: StructuredTypeId, ancestor: StructuredTypeId) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(derived);
        while let Some(ty) = current {
            if ty == ancestor {
                return true;
            }
            if !seen.insert(ty) {
                return false;
            }
            current = self.base_type(ty).and_then(|base| base.as_structured());
        }
        false
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Properties declared directly on the type, in document order.
    pub fn declared_properties(&self, id: StructuredTypeId) -> &[PropertyId] {
        &self.structured_node(id).declared
    }

    /// All properties including inherited ones, ancestors first.
    pub fn properties(&self, id: StructuredTypeId) -> Vec<PropertyId> {
        self.property_table(id).ordered.clone()
    }

    /// Effective structural properties, inherited first.
    pub fn structural_properties(&self, id: StructuredTypeId) -> Vec<PropertyId> {
        self.properties_of_kind(id, PropertyKind::Structural)
    }

    /// Effective navigation properties, inherited first.
    pub fn navigation_properties(&self, id: StructuredTypeId) -> Vec<PropertyId> {
        self.properties_of_kind(id, PropertyKind::Navigation)
    }

    fn properties_of_kind(&self, id: StructuredTypeId, kind: PropertyKind) -> Vec<PropertyId> {
        self.property_table(id)
            .ordered
            .iter()
            .copied()
            .filter(|&property| self.property_kind(property) == kind)
            .collect()
    }

    /// Finds an effective property by name.
    pub fn find_property(&self, id: StructuredTypeId, name: &str) -> Option<PropertyId> {
        self.property_table(id).by_name.get(name).copied()
    }

    pub(crate) fn property_table(&self, id: StructuredTypeId) -> Rc<PropertyTable> {
        self.structured_node(id)
            .properties
            .get_or_default(|| Rc::new(self.compute_property_table(id)))
    }

    fn compute_property_table(&self, id: StructuredTypeId) -> PropertyTable {
        let mut table = match self.base_type(id).and_then(|base| base.as_structured()) {
            Some(base) if base != id => {
                let inherited = self.property_table(base);
                PropertyTable {
                    ordered: inherited.ordered.clone(),
                    by_name: inherited.by_name.clone(),
                    errors: Vec::new(),
                }
            }
            _ => PropertyTable::default(),
        };

        for &property in &self.structured_node(id).declared {
            let ast = self.property_node(property).ast;
            let name = ast.name();
            if table.by_name.contains_key(name) {
                table.errors.push(EdmError::new(
                    ast.location(),
                    EdmErrorCode::AlreadyDefined,
                    format!(
                        "Each property name in a type must be unique. '{name}' is already defined on '{}'.",
                        self.structured_type_name(id)
                    ),
                ));
                continue;
            }
            table.by_name.insert(name.clone(), property);
            table.ordered.push(property);
        }
        table
    }

    // ========================================================================
    // Keys
    // ========================================================================

    /// The key declared on this entity type itself.
    pub fn declared_key(&self, id: StructuredTypeId) -> Option<Rc<[Property]>> {
        self.structured_node(id)
            .declared_key
            .get_or_default(|| self.compute_declared_key(id))
    }

    /// The key in effect: the nearest declared key along the base chain.
    pub fn key(&self, id: StructuredTypeId) -> Option<Rc<[Property]>> {
        let mut seen = HashSet::new();
        let mut current = Some(id);
        while let Some(ty) = current {
            if !seen.insert(ty) {
                break;
            }
            if let Some(key) = self.declared_key(ty) {
                return Some(key);
            }
            current = self.base_type(ty).and_then(|base| base.as_entity());
        }
        None
    }

    fn compute_declared_key(&self, id: StructuredTypeId) -> Option<Rc<[Property]>> {
        let StructuredAst::Entity(entity) = self.structured_node(id).ast else {
            return None;
        };
        let key = entity.key.as_ref()?;
        Some(
            key.property_refs
                .iter()
                .map(|property_ref| self.resolve_key_property(id, property_ref))
                .collect(),
        )
    }

    fn resolve_key_property(&self, id: StructuredTypeId, property_ref: &CsdlPropertyRef) -> Property {
        let is_structural = |property: &PropertyId| {
            matches!(self.property_node(*property).ast, PropertyAst::Structural(_))
        };

        if let Some(found) = self.find_property(id, &property_ref.name).filter(is_structural) {
            return Property::Declared(found);
        }
        // The table keeps the first declaration of a name; a structural
        // property shadowed by an earlier navigation property is still a key.
        let declared = self.declared_properties(id).iter().copied().find(|property| {
            self.property_node(*property).ast.name() == &property_ref.name && is_structural(property)
        });
        if let Some(found) = declared {
            return Property::Declared(found);
        }

        let code = match self.find_property(id, &property_ref.name) {
            Some(_) => EdmErrorCode::KeyPropertyMustBeStructural,
            None => EdmErrorCode::BadUnresolvedProperty,
        };
        debug!(ty = %self.structured_type_name(id), key = %property_ref.name, "unresolved key property");
        Property::unresolved(
            PropertyKind::Structural,
            &property_ref.name,
            EdmError::new(
                property_ref.location.clone(),
                code,
                format!(
                    "The key property '{}' could not be found on '{}'.",
                    property_ref.name,
                    self.structured_type_name(id)
                ),
            ),
        )
    }
}
