//! Entity containers and the navigation sources they hold.
//!
//! Entity sets and singletons are declared sources. Following a navigation
//! property out of a source with no explicit binding yields a derived
//! source: a contained source when the property contains its target,
//! otherwise an unknown one. Derived sources are allocated once per
//! (source, property) pair, so repeated lookups return the same handle.

use crate::ast::{CsdlNavigationPropertyBinding, ImportKind, OperationKind, Span};
use crate::path::{PathSegmentSyntax, parse_path};
use crate::semantic::cache::Cache;
use crate::semantic::config::StatsCounters;
use crate::semantic::error::{Checkable, EdmError, EdmErrorCode, Sentinel};
use crate::semantic::ids::{
    ContainerId, DerivedSourceId, NavigationSourceId, OperationImportId, PropertyId,
    StructuredTypeId,
};
use crate::semantic::model::{
    ContainerNode, EdmModel, NavigationSourceNode, OperationImportNode, SourceAst,
};
use crate::semantic::names::qualified;
use crate::semantic::operation::OperationRef;
use crate::semantic::structured::{Property, PropertyKind};
use crate::semantic::types::{TypeDefinition, reentrant_type};
use smol_str::{SmolStr, format_smolstr};
use std::collections::HashSet;
use std::rc::Rc;
use tracing::debug;

// ============================================================================
// Values
// ============================================================================

/// The container named by an `Extends` attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum ContainerRef {
    Declared(ContainerId),
    Unresolved(Sentinel),
    Cyclic(Sentinel),
}

impl ContainerRef {
    /// The declared container, or `None` for a sentinel.
    pub fn as_declared(&self) -> Option<ContainerId> {
        match self {
            Self::Declared(id) => Some(*id),
            _ => None,
        }
    }
}

impl Checkable for ContainerRef {
    fn sentinel(&self) -> Option<&Sentinel> {
        match self {
            Self::Declared(_) => None,
            Self::Unresolved(sentinel) | Self::Cyclic(sentinel) => Some(sentinel),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationSourceKind {
    EntitySet,
    Singleton,
    Contained,
    Unknown,
}

/// Where a navigation lands.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationSource {
    EntitySet(NavigationSourceId),
    Singleton(NavigationSourceId),
    /// The targets of a containment navigation property under one parent.
    Contained(DerivedSourceId),
    /// The targets of an unbound, non-containment navigation property.
    Unknown(DerivedSourceId),
    Unresolved(Sentinel),
}

impl NavigationSource {
    /// What sort of source this is; `None` for an unresolved one.
    pub fn kind(&self) -> Option<NavigationSourceKind> {
        match self {
            Self::EntitySet(_) => Some(NavigationSourceKind::EntitySet),
            Self::Singleton(_) => Some(NavigationSourceKind::Singleton),
            Self::Contained(_) => Some(NavigationSourceKind::Contained),
            Self::Unknown(_) => Some(NavigationSourceKind::Unknown),
            Self::Unresolved(_) => None,
        }
    }

    pub(crate) fn key(&self) -> Option<SourceKey> {
        match self {
            Self::EntitySet(id) | Self::Singleton(id) => Some(SourceKey::Declared(*id)),
            Self::Contained(id) | Self::Unknown(id) => Some(SourceKey::Derived(*id)),
            Self::Unresolved(_) => None,
        }
    }
}

impl Checkable for NavigationSource {
    fn sentinel(&self) -> Option<&Sentinel> {
        match self {
            Self::Unresolved(sentinel) => Some(sentinel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum SourceKey {
    Declared(NavigationSourceId),
    Derived(DerivedSourceId),
}

/// A resolved `<NavigationPropertyBinding>`.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationPropertyBinding {
    pub path: SmolStr,
    pub navigation_property: Property,
    pub target: NavigationSource,
    errors: Vec<EdmError>,
}

impl Checkable for NavigationPropertyBinding {
    fn errors(&self) -> &[EdmError] {
        &self.errors
    }
}

/// The `EntitySet` attribute of an operation import.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportTarget {
    EntitySet(NavigationSource),
    /// A `/`-separated path to a navigation source.
    Path { path: SmolStr, target: NavigationSource },
}

impl ImportTarget {
    /// The navigation source, whichever way it was written.
    pub fn source(&self) -> &NavigationSource {
        match self {
            Self::EntitySet(source) | Self::Path { target: source, .. } => source,
        }
    }
}

impl Checkable for ImportTarget {
    fn sentinel(&self) -> Option<&Sentinel> {
        self.source().sentinel()
    }
}

pub(crate) struct DerivedSourceNode {
    pub(crate) parent: SourceKey,
    pub(crate) property: PropertyId,
    pub(crate) container: ContainerId,
    pub(crate) contained: bool,
    pub(crate) name: SmolStr,
    pub(crate) bindings: Cache<Rc<[NavigationPropertyBinding]>>,
}

impl<'a> EdmModel<'a> {
    // ========================================================================
    // Containers
    // ========================================================================

    pub(crate) fn container_node(&self, id: ContainerId) -> &ContainerNode<'a> {
        &self.containers[id.as_usize()]
    }

    /// Every declared container, in declaration order.
    pub fn containers(&self) -> impl Iterator<Item = ContainerId> + '_ {
        (0..self.containers.len()).map(ContainerId::new)
    }

    /// The qualified name of a container.
    pub fn container_name(&self, id: ContainerId) -> &SmolStr {
        &self.container_node(id).qualified_name
    }

    /// Entity sets and singletons declared directly in the container.
    pub fn declared_sources(&self, id: ContainerId) -> &[NavigationSourceId] {
        &self.container_node(id).sources
    }

    /// Operation imports declared directly in `id`.
    pub fn declared_imports(&self, id: ContainerId) -> &[OperationImportId] {
        &self.container_node(id).imports
    }

    /// The container this one extends.
    pub fn container_extends(&self, id: ContainerId) -> Option<ContainerRef> {
        self.container_node(id).extends.get_or_compute(
            || self.compute_container_extends(id),
            || {
                StatsCounters::bump(&self.counters.cycles_detected);
                debug!(container = %self.container_name(id), "extends cycle");
                Some(self.cyclic_container(id))
            },
        )
    }

    fn compute_container_extends(&self, id: ContainerId) -> Option<ContainerRef> {
        let node = self.container_node(id);
        let name = node.ast.extends.as_ref()?;
        let Some(found) = self.find_container(name) else {
            debug!(container = %node.qualified_name, extends = %name, "unresolved extends");
            return Some(ContainerRef::Unresolved(Sentinel::error(
                name.clone(),
                node.ast.location.clone(),
                EdmErrorCode::BadUnresolvedEntityContainer,
                format!("The entity container '{name}' could not be found."),
            )));
        };
        let found_is_cyclic = matches!(self.container_extends(found), Some(ContainerRef::Cyclic(_)));
        if found_is_cyclic && self.extends_chain_reaches(found, id) {
            return Some(self.cyclic_container(id));
        }
        Some(ContainerRef::Declared(found))
    }

    fn extends_chain_reaches(&self, from: ContainerId, target: ContainerId) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(from);
        while let Some(container) = current {
            if container == target {
                return true;
            }
            if !seen.insert(container) {
                return false;
            }
            current = self
                .container_node(container)
                .ast
                .extends
                .as_ref()
                .and_then(|name| self.find_container(name));
        }
        false
    }

    fn cyclic_container(&self, id: ContainerId) -> ContainerRef {
        let node = self.container_node(id);
        ContainerRef::Cyclic(Sentinel::error(
            node.qualified_name.clone(),
            node.ast.location.clone(),
            EdmErrorCode::BadCyclicEntityContainer,
            format!("The entity container '{}' extends itself.", node.qualified_name),
        ))
    }

    /// The container followed by every container it extends.
    pub fn container_chain(&self, id: ContainerId) -> Vec<ContainerId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(container) = current {
            if chain.contains(&container) {
                break;
            }
            chain.push(container);
            current = self
                .container_extends(container)
                .and_then(|extends| extends.as_declared());
        }
        chain
    }

    /// Finds an entity set or singleton by name, searching extended containers.
    pub fn find_navigation_source(&self, container: ContainerId, name: &str) -> Option<NavigationSourceId> {
        self.container_chain(container).into_iter().find_map(|c| {
            self.declared_sources(c)
                .iter()
                .copied()
                .find(|&source| self.source_node(source).ast.name() == name)
        })
    }

    /// Finds an entity set in `container` or a container it extends.
    pub fn find_entity_set(&self, container: ContainerId, name: &str) -> Option<NavigationSourceId> {
        self.find_navigation_source(container, name)
            .filter(|&source| matches!(self.source_node(source).ast, SourceAst::EntitySet(_)))
    }

    /// Finds a singleton in `container` or a container it extends.
    pub fn find_singleton(&self, container: ContainerId, name: &str) -> Option<NavigationSourceId> {
        self.find_navigation_source(container, name)
            .filter(|&source| matches!(self.source_node(source).ast, SourceAst::Singleton(_)))
    }

    /// Finds an operation import in `container` or a container it extends.
    pub fn find_operation_import(&self, container: ContainerId, name: &str) -> Option<OperationImportId> {
        self.container_chain(container).into_iter().find_map(|c| {
            self.declared_imports(c)
                .iter()
                .copied()
                .find(|&import| self.import_node(import).ast.name == name)
        })
    }

    // ========================================================================
    // Navigation Sources
    // ========================================================================

    pub(crate) fn source_node(&self, id: NavigationSourceId) -> &NavigationSourceNode<'a> {
        &self.sources[id.as_usize()]
    }

    pub(crate) fn derived_node(&self, id: DerivedSourceId) -> Rc<DerivedSourceNode> {
        Rc::clone(&self.derived.borrow()[id.as_usize()])
    }

    /// The declared source as a [`NavigationSource`].
    pub fn navigation_source(&self, id: NavigationSourceId) -> NavigationSource {
        match self.source_node(id).ast {
            SourceAst::EntitySet(_) => NavigationSource::EntitySet(id),
            SourceAst::Singleton(_) => NavigationSource::Singleton(id),
        }
    }

    /// The container that declares a navigation source.
    pub fn source_container(&self, id: NavigationSourceId) -> ContainerId {
        self.source_node(id).container
    }

    /// The `IncludeInServiceDocument` flag. Singletons are always listed.
    pub fn include_in_service_document(&self, id: NavigationSourceId) -> bool {
        match self.source_node(id).ast {
            SourceAst::EntitySet(ast) => ast.include_in_service_document,
            SourceAst::Singleton(_) => true,
        }
    }

    /// The name of a source; derived sources are named `parent/property`.
    pub fn navigation_source_name(&self, source: &NavigationSource) -> SmolStr {
        match source {
            NavigationSource::EntitySet(id) | NavigationSource::Singleton(id) => {
                self.source_node(*id).ast.name().clone()
            }
            NavigationSource::Contained(id) | NavigationSource::Unknown(id) => {
                self.derived_node(*id).name.clone()
            }
            NavigationSource::Unresolved(sentinel) => sentinel.name().clone(),
        }
    }

    /// The declared entity type of an entity set or singleton.
    pub fn source_entity_type(&self, id: NavigationSourceId) -> TypeDefinition {
        let node = self.source_node(id);
        node.entity_type.get_or_compute(
            || self.find_entity_type(node.ast.type_name(), node.ast.location()),
            || reentrant_type(node.ast.type_name()),
        )
    }

    /// The entity type of the instances a source holds.
    pub fn navigation_source_entity_type(&self, source: &NavigationSource) -> Option<StructuredTypeId> {
        self.key_entity_type(source.key()?)
    }

    fn key_container(&self, key: SourceKey) -> ContainerId {
        match key {
            SourceKey::Declared(id) => self.source_node(id).container,
            SourceKey::Derived(id) => self.derived_node(id).container,
        }
    }

    fn key_entity_type(&self, key: SourceKey) -> Option<StructuredTypeId> {
        match key {
            SourceKey::Declared(id) => self.source_entity_type(id).as_entity(),
            SourceKey::Derived(id) => self.navigation_target_entity(self.derived_node(id).property),
        }
    }

    // ========================================================================
    // Bindings
    // ========================================================================

    /// The navigation property bindings of a source.
    ///
    /// A contained source inherits its parent's bindings whose path starts
    /// with the containing property, re-rooted at the contained source.
    pub fn bindings(&self, source: &NavigationSource) -> Rc<[NavigationPropertyBinding]> {
        match source.key() {
            Some(SourceKey::Declared(id)) => self
                .source_node(id)
                .bindings
                .get_or_default(|| self.compute_bindings(SourceKey::Declared(id))),
            Some(SourceKey::Derived(id)) => self
                .derived_node(id)
                .bindings
                .get_or_default(|| self.compute_bindings(SourceKey::Derived(id))),
            None => Rc::default(),
        }
    }

    fn compute_bindings(&self, key: SourceKey) -> Rc<[NavigationPropertyBinding]> {
        let element = self.key_entity_type(key);
        let container = self.key_container(key);
        self.raw_bindings(key)
            .into_iter()
            .map(|(path, ast)| {
                let navigation_property = self.resolve_binding_path(element, &path, ast.location.clone());
                let target = self.resolve_source_path(container, &ast.target, ast.location.clone());
                let errors = navigation_property
                    .errors()
                    .iter()
                    .chain(target.errors())
                    .cloned()
                    .collect();
                NavigationPropertyBinding {
                    path,
                    navigation_property,
                    target,
                    errors,
                }
            })
            .collect()
    }

    fn raw_bindings(&self, key: SourceKey) -> Vec<(SmolStr, &'a CsdlNavigationPropertyBinding)> {
        match key {
            SourceKey::Declared(id) => self
                .source_node(id)
                .ast
                .bindings()
                .iter()
                .map(|binding| (binding.path.clone(), binding))
                .collect(),
            SourceKey::Derived(id) => {
                let node = self.derived_node(id);
                if !node.contained {
                    return Vec::new();
                }
                let prefix = format!("{}/", self.property_name(node.property));
                self.raw_bindings(node.parent)
                    .into_iter()
                    .filter_map(|(path, binding)| {
                        path.strip_prefix(prefix.as_str())
                            .map(|rest| (SmolStr::new(rest), binding))
                    })
                    .collect()
            }
        }
    }

    /// Walks a binding path from `element`: each segment is a type cast or
    /// a navigation property, and the last one must be a navigation property.
    fn resolve_binding_path(
        &self,
        element: Option<StructuredTypeId>,
        path: &SmolStr,
        location: Option<Span>,
    ) -> Property {
        let unresolved = |at: &str| {
            debug!(path = %path, segment = at, "unresolved binding path");
            Property::unresolved(
                PropertyKind::Navigation,
                path,
                EdmError::new(
                    location.clone(),
                    EdmErrorCode::BadUnresolvedNavigationPropertyPath,
                    format!("The navigation property path '{path}' could not be resolved at '{at}'."),
                ),
            )
        };

        let segments = match parse_path(path) {
            Ok(segments) => segments,
            Err(_) => return unresolved(path),
        };
        let Some(mut current) = element else {
            return unresolved(path);
        };
        let mut resolved = None;
        for (index, segment) in segments.iter().enumerate() {
            if let Some(cast) = self.cast_segment(current, segment) {
                current = cast;
                resolved = None;
                continue;
            }
            let PathSegmentSyntax::Name(name) = segment else {
                return unresolved(segment.text());
            };
            let navigation = self
                .find_property(current, name)
                .filter(|&p| self.property_kind(p) == PropertyKind::Navigation);
            let Some(navigation) = navigation else {
                return unresolved(name);
            };
            resolved = Some(navigation);
            match self.navigation_target_entity(navigation) {
                Some(next) => current = next,
                // Later segments have no entity type to be looked up in.
                None if index + 1 < segments.len() => return unresolved(name),
                None => {}
            }
        }
        match resolved {
            Some(navigation) => Property::Declared(navigation),
            None => unresolved(path),
        }
    }

    /// Resolves `Set`, `Container/Set`, `NS.Container/Set` and
    /// `Set/ContainedNav/...` relative to `container`.
    fn resolve_source_path(&self, container: ContainerId, path: &SmolStr, location: Option<Span>) -> NavigationSource {
        let unresolved = || {
            debug!(target = %path, "unresolved navigation source");
            NavigationSource::Unresolved(Sentinel::error(
                path.clone(),
                location.clone(),
                EdmErrorCode::BadUnresolvedEntitySet,
                format!("The entity set '{path}' could not be found."),
            ))
        };

        let segments: Vec<&str> = path.split('/').collect();
        let (scope, rest) = match segments.split_first() {
            Some((first, rest)) if !rest.is_empty() => match self.container_named(container, first) {
                Some(scope) => (scope, rest),
                None => (container, segments.as_slice()),
            },
            _ => (container, segments.as_slice()),
        };
        let Some((first, navigations)) = rest.split_first() else {
            return unresolved();
        };
        let Some(declared) = self.find_navigation_source(scope, first) else {
            return unresolved();
        };

        let mut source = self.navigation_source(declared);
        for segment in navigations {
            let Some(element) = self.navigation_source_entity_type(&source) else {
                return unresolved();
            };
            let navigation = self
                .find_property(element, segment)
                .filter(|&p| self.property_kind(p) == PropertyKind::Navigation);
            let Some(navigation) = navigation else {
                return unresolved();
            };
            source = self.find_navigation_target(&source, navigation);
        }
        source
    }

    /// A container named fully, or simply within `container`'s namespace.
    fn container_named(&self, container: ContainerId, name: &str) -> Option<ContainerId> {
        self.find_container(name).or_else(|| {
            let schema = self.container_node(container).schema;
            let namespace = &self.schemas[schema.as_usize()].ast.namespace;
            self.find_container(&qualified(namespace, name))
        })
    }

    /// The source reached by following `property` out of `source`.
    ///
    /// An explicit binding wins; otherwise containment yields a contained
    /// source and anything else an unknown one.
    pub fn find_navigation_target(&self, source: &NavigationSource, property: PropertyId) -> NavigationSource {
        let Some(key) = source.key() else {
            return source.clone();
        };
        if self.property_kind(property) != PropertyKind::Navigation {
            return NavigationSource::Unresolved(Sentinel::error(
                self.property_name(property).clone(),
                self.property_location(property),
                EdmErrorCode::BadUnresolvedNavigationPropertyPath,
                format!("'{}' is not a navigation property.", self.property_name(property)),
            ));
        }

        let bound = self
            .bindings(source)
            .iter()
            .find(|binding| binding.navigation_property.as_declared() == Some(property))
            .map(|binding| binding.target.clone());
        if let Some(target) = bound {
            return target;
        }

        let contained = self.contains_target(property);
        let id = self.derived_source(key, property, contained);
        if contained {
            NavigationSource::Contained(id)
        } else {
            NavigationSource::Unknown(id)
        }
    }

    fn derived_source(&self, parent: SourceKey, property: PropertyId, contained: bool) -> DerivedSourceId {
        if let Some(id) = self.derived_index.borrow().get(&(parent, property)) {
            return *id;
        }
        let parent_name = match parent {
            SourceKey::Declared(id) => self.source_node(id).ast.name().clone(),
            SourceKey::Derived(id) => self.derived_node(id).name.clone(),
        };
        let node = DerivedSourceNode {
            parent,
            property,
            container: self.key_container(parent),
            contained,
            name: format_smolstr!("{parent_name}/{}", self.property_name(property)),
            bindings: Cache::new(),
        };

        let id = DerivedSourceId::new(self.derived.borrow().len());
        self.derived.borrow_mut().push(Rc::new(node));
        self.derived_index.borrow_mut().insert((parent, property), id);
        debug!(source = %parent_name, property = %self.property_name(property), contained, "derived navigation source");
        id
    }

    /// The parent source and navigation property of a derived source.
    pub fn derived_source_origin(&self, id: DerivedSourceId) -> (NavigationSource, PropertyId) {
        let node = self.derived_node(id);
        let parent = match node.parent {
            SourceKey::Declared(source) => self.navigation_source(source),
            SourceKey::Derived(parent) => {
                if self.derived_node(parent).contained {
                    NavigationSource::Contained(parent)
                } else {
                    NavigationSource::Unknown(parent)
                }
            }
        };
        (parent, node.property)
    }

    // ========================================================================
    // Operation Imports
    // ========================================================================

    pub(crate) fn import_node(&self, id: OperationImportId) -> &OperationImportNode<'a> {
        &self.imports[id.as_usize()]
    }

    /// The unqualified name of an import.
    pub fn import_name(&self, id: OperationImportId) -> &SmolStr {
        &self.import_node(id).ast.name
    }

    /// Whether an import exposes a function or an action.
    pub fn import_kind(&self, id: OperationImportId) -> ImportKind {
        self.import_node(id).ast.kind
    }

    /// The container that declares an import.
    pub fn import_container(&self, id: OperationImportId) -> ContainerId {
        self.import_node(id).container
    }

    /// The unbound operation an import exposes.
    pub fn import_operation(&self, id: OperationImportId) -> OperationRef {
        let node = self.import_node(id);
        node.operation.get_or_compute(
            || self.compute_import_operation(id),
            || OperationRef::unresolved(&node.ast.operation, node.ast.location.clone()),
        )
    }

    fn compute_import_operation(&self, id: OperationImportId) -> OperationRef {
        let ast = self.import_node(id).ast;
        let wanted = match ast.kind {
            ImportKind::FunctionImport => OperationKind::Function,
            ImportKind::ActionImport => OperationKind::Action,
        };
        let found = self.find_operations(&ast.operation).iter().copied().find(|&operation| {
            let declared = self.operation_node(operation).ast;
            declared.kind == wanted && !declared.is_bound
        });
        match found {
            Some(operation) => OperationRef::Declared(operation),
            None => {
                debug!(import = %ast.name, operation = %ast.operation, "unresolved import operation");
                OperationRef::unresolved(&ast.operation, ast.location.clone())
            }
        }
    }

    /// The navigation source an import's results belong to.
    pub fn import_entity_set(&self, id: OperationImportId) -> Option<ImportTarget> {
        let node = self.import_node(id);
        node.entity_set.get_or_default(|| {
            let path = node.ast.entity_set.as_ref()?;
            let target = self.resolve_source_path(node.container, path, node.ast.location.clone());
            Some(if path.contains('/') {
                ImportTarget::Path {
                    path: path.clone(),
                    target,
                }
            } else {
                ImportTarget::EntitySet(target)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        CsdlEntityContainer, CsdlEntitySet, CsdlEntityType, CsdlNavigationProperty, CsdlOperation,
        CsdlOperationImport, CsdlSchema, CsdlSingleton, CsdlTypeReference, PrimitiveKind,
    };

    fn shop() -> CsdlSchema {
        CsdlSchema::new("Shop")
            .with_entity_type(
                CsdlEntityType::new("Customer")
                    .with_navigation(CsdlNavigationProperty::new("Orders", "Collection(Shop.Order)"))
                    .with_navigation(CsdlNavigationProperty::new("Cart", "Shop.Cart").containing())
                    .with_navigation(CsdlNavigationProperty::new("Friend", "Shop.Customer")),
            )
            .with_entity_type(
                CsdlEntityType::new("Order")
                    .with_navigation(CsdlNavigationProperty::new("Customer", "Shop.Customer")),
            )
            .with_entity_type(CsdlEntityType::new("VipOrder").with_base_type("Shop.Order"))
            .with_entity_type(
                CsdlEntityType::new("Cart")
                    .with_navigation(CsdlNavigationProperty::new("Lines", "Collection(Shop.Order)")),
            )
            .with_container(
                CsdlEntityContainer::new("Base")
                    .with_entity_set(CsdlEntitySet::new("Orders", "Shop.Order")),
            )
            .with_container(
                CsdlEntityContainer::new("Default")
                    .extending("Shop.Base")
                    .with_entity_set(
                        CsdlEntitySet::new("Customers", "Shop.Customer")
                            .with_binding("Orders", "Orders")
                            .with_binding("Cart/Lines", "Shop.Base/Orders")
                            .with_binding("Missing", "Orders")
                            .with_binding("Orders/", "Orders"),
                    )
                    .with_singleton(CsdlSingleton::new("Me", "Shop.Customer").with_binding("Friend", "Nowhere"))
                    .with_import(CsdlOperationImport::function("Top", "Shop.Top").with_entity_set("Orders"))
                    .with_import(CsdlOperationImport::action("Go", "Shop.Top"))
                    .with_import(
                        CsdlOperationImport::function("Nested", "Shop.Top").with_entity_set("Customers/Cart"),
                    ),
            )
            .with_operation(
                CsdlOperation::function("Top").returning(CsdlTypeReference::primitive(PrimitiveKind::Int32)),
            )
    }

    fn default_container(model: &EdmModel<'_>) -> ContainerId {
        model.find_container("Shop.Default").expect("container")
    }

    #[test]
    fn extends_chain_finds_inherited_sets() {
        let schemas = [shop()];
        let model = EdmModel::new(&schemas).expect("model");
        let default = default_container(&model);
        let base = model.find_container("Shop.Base").expect("base");

        assert_eq!(model.container_extends(default), Some(ContainerRef::Declared(base)));
        assert_eq!(model.container_chain(default), [default, base]);
        assert!(model.find_entity_set(default, "Orders").is_some());
        assert!(model.find_singleton(default, "Me").is_some());
        assert!(model.find_entity_set(default, "Me").is_none());
        assert!(model.find_entity_set(base, "Customers").is_none());
    }

    #[test]
    fn extends_cycle_is_cyclic() {
        let schemas = [CsdlSchema::new("NS")
            .with_container(CsdlEntityContainer::new("A").extending("NS.B"))
            .with_container(CsdlEntityContainer::new("B").extending("NS.A"))
            .with_container(CsdlEntityContainer::new("C").extending("NS.Gone"))];
        let model = EdmModel::new(&schemas).expect("model");
        let ids: Vec<_> = model.containers().collect();

        for &id in &ids[..2] {
            let extends = model.container_extends(id).expect("extends");
            assert_eq!(extends.errors()[0].code, EdmErrorCode::BadCyclicEntityContainer);
        }
        let gone = model.container_extends(ids[2]).expect("extends");
        assert_eq!(gone.errors()[0].code, EdmErrorCode::BadUnresolvedEntityContainer);
        assert_eq!(model.container_chain(ids[0]), [ids[0]]);
    }

    #[test]
    fn bindings_resolve_paths_and_targets() {
        let schemas = [shop()];
        let model = EdmModel::new(&schemas).expect("model");
        let default = default_container(&model);
        let customers = model.find_entity_set(default, "Customers").expect("set");
        let bindings = model.bindings(&model.navigation_source(customers));
        assert_eq!(bindings.len(), 4);

        let orders = model.find_entity_set(default, "Orders").expect("orders");
        assert!(!bindings[0].is_bad());
        assert_eq!(bindings[0].target, NavigationSource::EntitySet(orders));
        assert_eq!(bindings[1].target, NavigationSource::EntitySet(orders));
        assert_eq!(
            bindings[2].errors()[0].code,
            EdmErrorCode::BadUnresolvedNavigationPropertyPath
        );
        assert!(bindings[3].navigation_property.is_bad());
    }

    #[test]
    fn binding_path_stops_at_an_untyped_segment() {
        let schemas = [CsdlSchema::new("NS")
            .with_entity_type(
                CsdlEntityType::new("A")
                    .with_navigation(CsdlNavigationProperty::new("Lost", "NS.Nowhere"))
                    .with_navigation(CsdlNavigationProperty::new("Me", "NS.A")),
            )
            .with_container(
                CsdlEntityContainer::new("C").with_entity_set(
                    CsdlEntitySet::new("As", "NS.A")
                        .with_binding("Lost/Me", "As")
                        .with_binding("Me/Me", "As"),
                ),
            )];
        let model = EdmModel::new(&schemas).expect("model");
        let container = model.find_container("NS.C").expect("container");
        let set = model.find_entity_set(container, "As").expect("set");
        let bindings = model.bindings(&model.navigation_source(set));

        let lost = &bindings[0].navigation_property;
        assert_eq!(lost.errors()[0].code, EdmErrorCode::BadUnresolvedNavigationPropertyPath);
        assert!(lost.errors()[0].message.contains("at 'Lost'"));
        assert!(!bindings[1].is_bad());
    }

    #[test]
    fn unresolved_binding_target() {
        let schemas = [shop()];
        let model = EdmModel::new(&schemas).expect("model");
        let me = model.find_singleton(default_container(&model), "Me").expect("singleton");
        let bindings = model.bindings(&model.navigation_source(me));
        assert_eq!(bindings[0].target.errors()[0].code, EdmErrorCode::BadUnresolvedEntitySet);
    }

    #[test]
    fn contained_targets_are_memoized_and_inherit_bindings() {
        let schemas = [shop()];
        let model = EdmModel::new(&schemas).expect("model");
        let default = default_container(&model);
        let customers = model.navigation_source(model.find_entity_set(default, "Customers").expect("set"));
        let customer = model.navigation_source_entity_type(&customers).expect("entity");
        let cart = model.find_property(customer, "Cart").expect("cart");

        let first = model.find_navigation_target(&customers, cart);
        let second = model.find_navigation_target(&customers, cart);
        assert_eq!(first, second);
        assert_eq!(first.kind(), Some(NavigationSourceKind::Contained));
        assert_eq!(model.navigation_source_name(&first), "Customers/Cart");
        assert_eq!(model.stats().derived_sources, 1);

        let inherited = model.bindings(&first);
        assert_eq!(inherited.len(), 1);
        assert_eq!(inherited[0].path, "Lines");
        let orders = model.find_entity_set(default, "Orders").expect("orders");
        assert_eq!(inherited[0].target, NavigationSource::EntitySet(orders));
    }

    #[test]
    fn unbound_navigation_is_unknown() {
        let schemas = [shop()];
        let model = EdmModel::new(&schemas).expect("model");
        let orders = model.navigation_source(
            model.find_entity_set(default_container(&model), "Orders").expect("set"),
        );
        let order = model.navigation_source_entity_type(&orders).expect("entity");
        let customer = model.find_property(order, "Customer").expect("nav");

        let target = model.find_navigation_target(&orders, customer);
        assert_eq!(target.kind(), Some(NavigationSourceKind::Unknown));
        assert!(!target.is_bad());
        let (parent, property) = match target {
            NavigationSource::Unknown(id) => model.derived_source_origin(id),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(parent, orders);
        assert_eq!(property, customer);
    }

    #[test]
    fn imports_bind_unbound_operations() {
        let schemas = [shop()];
        let model = EdmModel::new(&schemas).expect("model");
        let default = default_container(&model);
        let top = model.find_operation_import(default, "Top").expect("import");
        let go = model.find_operation_import(default, "Go").expect("import");
        let nested = model.find_operation_import(default, "Nested").expect("import");

        assert!(model.import_operation(top).as_declared().is_some());
        assert_eq!(
            model.import_operation(go).errors()[0].code,
            EdmErrorCode::BadUnresolvedOperation
        );

        let orders = model.find_entity_set(default, "Orders").expect("orders");
        assert_eq!(
            model.import_entity_set(top),
            Some(ImportTarget::EntitySet(NavigationSource::EntitySet(orders)))
        );
        let nested_target = model.import_entity_set(nested).expect("target");
        assert_eq!(nested_target.source().kind(), Some(NavigationSourceKind::Contained));
        assert_eq!(model.import_entity_set(go), None);
    }
}
