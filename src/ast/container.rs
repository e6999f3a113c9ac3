//! Entity containers and their elements.

use crate::ast::annotation::{CsdlAnnotationSet, impl_annotatable};
use crate::ast::span::{Span, impl_located};
use smol_str::SmolStr;

/// `<EntityContainer>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsdlEntityContainer {
    pub name: SmolStr,
    pub extends: Option<SmolStr>,
    pub entity_sets: Vec<CsdlEntitySet>,
    pub singletons: Vec<CsdlSingleton>,
    pub operation_imports: Vec<CsdlOperationImport>,
    pub annotations: CsdlAnnotationSet,
    pub location: Option<Span>,
}

impl CsdlEntityContainer {
    /// An empty container.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the container this one `Extends`.
    pub fn extending(mut self, name: impl Into<SmolStr>) -> Self {
        self.extends = Some(name.into());
        self
    }

    /// Appends an entity set.
    pub fn with_entity_set(mut self, set: CsdlEntitySet) -> Self {
        self.entity_sets.push(set);
        self
    }

    /// Appends a singleton.
    pub fn with_singleton(mut self, singleton: CsdlSingleton) -> Self {
        self.singletons.push(singleton);
        self
    }

    /// Appends an operation import.
    pub fn with_import(mut self, import: CsdlOperationImport) -> Self {
        self.operation_imports.push(import);
        self
    }
}

/// `<NavigationPropertyBinding Path="..." Target="...">`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsdlNavigationPropertyBinding {
    pub path: SmolStr,
    pub target: SmolStr,
    pub location: Option<Span>,
}

/// `<EntitySet>`.
#[derive(Debug, Clone, PartialEq)]
pub struct CsdlEntitySet {
    pub name: SmolStr,
    pub entity_type: SmolStr,
    pub include_in_service_document: bool,
    pub bindings: Vec<CsdlNavigationPropertyBinding>,
    pub annotations: CsdlAnnotationSet,
    pub location: Option<Span>,
}

impl CsdlEntitySet {
    /// An entity set of `entity_type`.
    pub fn new(name: impl Into<SmolStr>, entity_type: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            include_in_service_document: true,
            bindings: Vec::new(),
            annotations: CsdlAnnotationSet::default(),
            location: None,
        }
    }

    /// Binds the navigation property at `path` to the source named `target`.
    pub fn with_binding(mut self, path: impl Into<SmolStr>, target: impl Into<SmolStr>) -> Self {
        self.bindings.push(CsdlNavigationPropertyBinding {
            path: path.into(),
            target: target.into(),
            location: None,
        });
        self
    }
}

/// `<Singleton>`.
#[derive(Debug, Clone, PartialEq)]
pub struct CsdlSingleton {
    pub name: SmolStr,
    pub type_name: SmolStr,
    pub bindings: Vec<CsdlNavigationPropertyBinding>,
    pub annotations: CsdlAnnotationSet,
    pub location: Option<Span>,
}

impl CsdlSingleton {
    /// A singleton of `type_name`.
    pub fn new(name: impl Into<SmolStr>, type_name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            bindings: Vec::new(),
            annotations: CsdlAnnotationSet::default(),
            location: None,
        }
    }

    /// Binds the navigation property at `path` to the source named `target`.
    pub fn with_binding(mut self, path: impl Into<SmolStr>, target: impl Into<SmolStr>) -> Self {
        self.bindings.push(CsdlNavigationPropertyBinding {
            path: path.into(),
            target: target.into(),
            location: None,
        });
        self
    }
}

/// Whether an import exposes a function or an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    FunctionImport,
    ActionImport,
}

/// `<FunctionImport>` or `<ActionImport>`.
#[derive(Debug, Clone, PartialEq)]
pub struct CsdlOperationImport {
    pub name: SmolStr,
    pub kind: ImportKind,
    pub operation: SmolStr,
    pub entity_set: Option<SmolStr>,
    pub include_in_service_document: bool,
    pub annotations: CsdlAnnotationSet,
    pub location: Option<Span>,
}

impl CsdlOperationImport {
    /// Imports the function `operation` under `name`.
    pub fn function(name: impl Into<SmolStr>, operation: impl Into<SmolStr>) -> Self {
        Self::new(name, ImportKind::FunctionImport, operation)
    }

    /// Imports the action `operation` under `name`.
    pub fn action(name: impl Into<SmolStr>, operation: impl Into<SmolStr>) -> Self {
        Self::new(name, ImportKind::ActionImport, operation)
    }

    fn new(name: impl Into<SmolStr>, kind: ImportKind, operation: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            kind,
            operation: operation.into(),
            entity_set: None,
            include_in_service_document: false,
            annotations: CsdlAnnotationSet::default(),
            location: None,
        }
    }

    /// Sets the entity set or path the import returns entities from.
    pub fn with_entity_set(mut self, entity_set: impl Into<SmolStr>) -> Self {
        self.entity_set = Some(entity_set.into());
        self
    }
}

impl_located!(
    CsdlEntityContainer,
    CsdlNavigationPropertyBinding,
    CsdlEntitySet,
    CsdlSingleton,
    CsdlOperationImport,
);

impl_annotatable!(
    CsdlEntityContainer,
    CsdlEntitySet,
    CsdlSingleton,
    CsdlOperationImport,
);
