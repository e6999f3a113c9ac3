//! Functions and actions.

use crate::ast::annotation::{CsdlAnnotationSet, impl_annotatable};
use crate::ast::span::{Span, impl_located};
use crate::ast::types::CsdlTypeReference;
use smol_str::SmolStr;

/// Whether an operation is side-effect free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Function,
    Action,
}

/// `<Function>` or `<Action>`.
#[derive(Debug, Clone, PartialEq)]
pub struct CsdlOperation {
    pub name: SmolStr,
    pub kind: OperationKind,
    pub is_bound: bool,
    pub is_composable: bool,
    pub entity_set_path: Option<SmolStr>,
    pub parameters: Vec<CsdlParameter>,
    pub return_type: Option<CsdlReturnType>,
    pub annotations: CsdlAnnotationSet,
    pub location: Option<Span>,
}

impl CsdlOperation {
    /// An unbound, non-composable function.
    pub fn function(name: impl Into<SmolStr>) -> Self {
        Self::new(name, OperationKind::Function)
    }

    /// An unbound action.
    pub fn action(name: impl Into<SmolStr>) -> Self {
        Self::new(name, OperationKind::Action)
    }

    fn new(name: impl Into<SmolStr>, kind: OperationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_bound: false,
            is_composable: false,
            entity_set_path: None,
            parameters: Vec::new(),
            return_type: None,
            annotations: CsdlAnnotationSet::default(),
            location: None,
        }
    }

    /// Marks the first parameter as the binding parameter.
    pub fn bound(mut self) -> Self {
        self.is_bound = true;
        self
    }

    /// Marks a function composable.
    pub fn composable(mut self) -> Self {
        self.is_composable = true;
        self
    }

    /// Sets the `EntitySetPath`.
    pub fn with_entity_set_path(mut self, path: impl Into<SmolStr>) -> Self {
        self.entity_set_path = Some(path.into());
        self
    }

    /// Appends a parameter.
    pub fn with_parameter(mut self, name: impl Into<SmolStr>, type_ref: CsdlTypeReference) -> Self {
        self.parameters.push(CsdlParameter::new(name, type_ref));
        self
    }

    /// Sets the return type.
    pub fn returning(mut self, type_ref: CsdlTypeReference) -> Self {
        self.return_type = Some(CsdlReturnType {
            type_ref,
            annotations: CsdlAnnotationSet::default(),
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

/// `<Parameter>`.
#[derive(Debug, Clone, PartialEq)]
pub struct CsdlParameter {
    pub name: SmolStr,
    pub type_ref: CsdlTypeReference,
    pub annotations: CsdlAnnotationSet,
    pub location: Option<Span>,
}

impl CsdlParameter {
    /// A parameter without annotations.
    pub fn new(name: impl Into<SmolStr>, type_ref: CsdlTypeReference) -> Self {
        Self {
            name: name.into(),
            type_ref,
            annotations: CsdlAnnotationSet::default(),
            location: None,
        }
    }
}

/// `<ReturnType>`.
#[derive(Debug, Clone, PartialEq)]
pub struct CsdlReturnType {
    pub type_ref: CsdlTypeReference,
    pub annotations: CsdlAnnotationSet,
    pub location: Option<Span>,
}

impl_located!(CsdlOperation, CsdlParameter, CsdlReturnType);
impl_annotatable!(CsdlOperation, CsdlParameter);
