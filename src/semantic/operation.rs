//! Functions and actions: parameters, return types and overload binding.

use crate::ast::{OperationKind, Span};
use crate::path::{PathSegmentSyntax, parse_path};
use crate::semantic::error::{Checkable, EdmError, EdmErrorCode, Sentinel};
use crate::semantic::ids::{OperationId, ParameterId};
use crate::semantic::model::{EdmModel, OperationNode, ParameterNode};
use crate::semantic::structured::{Property, PropertyKind};
use crate::semantic::types::{TypeReference, reentrant_type};
use smol_str::SmolStr;
use std::rc::Rc;
use tracing::debug;

/// An operation reached through a name.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationRef {
    Declared(OperationId),
    Unresolved(Sentinel),
    /// Several overloads fit equally well.
    Ambiguous {
        candidates: Vec<OperationId>,
        sentinel: Sentinel,
    },
}

impl OperationRef {
    /// The bound overload, or `None` for a sentinel.
    pub fn as_declared(&self) -> Option<OperationId> {
        match self {
            Self::Declared(id) => Some(*id),
            _ => None,
        }
    }

    pub(crate) fn unresolved(name: &str, location: Option<Span>) -> Self {
        Self::Unresolved(Sentinel::error(
            name,
            location,
            EdmErrorCode::BadUnresolvedOperation,
            format!("The operation '{name}' could not be found."),
        ))
    }
}

impl Checkable for OperationRef {
    fn sentinel(&self) -> Option<&Sentinel> {
        match self {
            Self::Declared(_) => None,
            Self::Unresolved(sentinel) | Self::Ambiguous { sentinel, .. } => Some(sentinel),
        }
    }
}

/// A parameter reached through a name.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterRef {
    Declared(ParameterId),
    Unresolved(Sentinel),
}

impl ParameterRef {
    /// The declared parameter, or `None` for a sentinel.
    pub fn as_declared(&self) -> Option<ParameterId> {
        match self {
            Self::Declared(id) => Some(*id),
            Self::Unresolved(_) => None,
        }
    }
}

impl Checkable for ParameterRef {
    fn sentinel(&self) -> Option<&Sentinel> {
        match self {
            Self::Declared(_) => None,
            Self::Unresolved(sentinel) => Some(sentinel),
        }
    }
}

/// A resolved `EntitySetPath`: the binding parameter followed by the
/// navigation properties leading to the returned entities.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySetPath {
    pub parameter: ParameterRef,
    pub navigation: Vec<Property>,
    errors: Vec<EdmError>,
}

impl Checkable for EntitySetPath {
    fn errors(&self) -> &[EdmError] {
        &self.errors
    }
}

/// The type of one call-site argument as seen by overload binding.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentType {
    Typed(TypeReference),
    /// A `null` literal.
    Null,
    /// Nothing could be inferred.
    Unknown,
}

impl<'a> EdmModel<'a> {
    pub(crate) fn operation_node(&self, id: OperationId) -> &OperationNode<'a> {
        &self.operations[id.as_usize()]
    }

    pub(crate) fn parameter_node(&self, id: ParameterId) -> &ParameterNode<'a> {
        &self.parameters[id.as_usize()]
    }

    /// Every declared operation, in declaration order.
    pub fn operations(&self) -> impl Iterator<Item = OperationId> + '_ {
        (0..self.operations.len()).map(OperationId::new)
    }

    /// The qualified name shared by all overloads.
    pub fn operation_name(&self, id: OperationId) -> &SmolStr {
        &self.operation_node(id).qualified_name
    }

    /// Function or action.
    pub fn operation_kind(&self, id: OperationId) -> OperationKind {
        self.operation_node(id).ast.kind
    }

    /// Returns true if the first parameter is the binding parameter.
    pub fn is_bound(&self, id: OperationId) -> bool {
        self.operation_node(id).ast.is_bound
    }

    /// Returns true if further path segments may follow a call to the function.
    pub fn is_composable(&self, id: OperationId) -> bool {
        self.operation_node(id).ast.is_composable
    }

    /// Parameters in declaration order.
    pub fn operation_parameters(&self, id: OperationId) -> &[ParameterId] {
        &self.operation_node(id).parameters
    }

    /// The first parameter of a bound operation.
    pub fn binding_parameter(&self, id: OperationId) -> Option<ParameterId> {
        if !self.is_bound(id) {
            return None;
        }
        self.operation_parameters(id).first().copied()
    }

    /// Finds a parameter of `id` by name.
    pub fn find_parameter(&self, id: OperationId, name: &str) -> Option<ParameterId> {
        self.operation_parameters(id)
            .iter()
            .copied()
            .find(|&parameter| self.parameter_name(parameter) == name)
    }

    /// The name of a parameter.
    pub fn parameter_name(&self, id: ParameterId) -> &SmolStr {
        &self.parameter_node(id).ast.name
    }

    /// The operation declaring a parameter.
    pub fn parameter_operation(&self, id: ParameterId) -> OperationId {
        self.parameter_node(id).operation
    }

    /// The resolved type of a parameter.
    pub fn parameter_type(&self, id: ParameterId) -> TypeReference {
        let node = self.parameter_node(id);
        node.type_ref.get_or_compute(
            || self.resolve_type_reference(&node.ast.type_ref),
            || TypeReference::new(reentrant_type(&node.ast.name), true),
        )
    }

    /// The resolved return type, or `None` for an action without one.
    pub fn return_type(&self, id: OperationId) -> Option<TypeReference> {
        let node = self.operation_node(id);
        node.return_type.get_or_default(|| {
            node.ast
                .return_type
                .as_ref()
                .map(|returns| self.resolve_type_reference(&returns.type_ref))
        })
    }

    // ========================================================================
    // Entity Set Path
    // ========================================================================

    /// The resolved `EntitySetPath`, if the operation declares one.
    pub fn entity_set_path(&self, id: OperationId) -> Option<Rc<EntitySetPath>> {
        self.operation_node(id)
            .entity_set_path
            .get_or_default(|| self.compute_entity_set_path(id).map(Rc::new))
    }

    fn compute_entity_set_path(&self, id: OperationId) -> Option<EntitySetPath> {
        let ast = self.operation_node(id).ast;
        let path = ast.entity_set_path.as_ref()?;
        let location = ast.location.clone();
        let segment_error = |text: &str, code: EdmErrorCode| {
            EdmError::new(
                location.clone(),
                code,
                format!("The entity set path '{path}' could not be resolved at '{text}'."),
            )
        };

        let segments = match parse_path(path) {
            Ok(segments) => segments,
            Err(_) => {
                let error = segment_error(path, EdmErrorCode::BadUnresolvedParameter);
                return Some(EntitySetPath {
                    parameter: ParameterRef::Unresolved(Sentinel::new(path.clone(), error.clone())),
                    navigation: Vec::new(),
                    errors: vec![error],
                });
            }
        };
        let (first, rest) = segments.split_first()?;

        let binding = self
            .binding_parameter(id)
            .filter(|&parameter| self.parameter_name(parameter) == first.text());
        let Some(binding) = binding else {
            let error = segment_error(first.text(), EdmErrorCode::BadUnresolvedParameter);
            debug!(operation = %self.operation_name(id), path = %path, "unresolved entity set path parameter");
            return Some(EntitySetPath {
                parameter: ParameterRef::Unresolved(Sentinel::new(first.text().clone(), error.clone())),
                navigation: Vec::new(),
                errors: vec![error],
            });
        };

        let mut navigation = Vec::new();
        let mut errors = Vec::new();
        let mut current = self.parameter_type(binding).structured_element();
        for segment in rest {
            let Some(ty) = current else {
                break;
            };
            if let Some(cast) = self.cast_segment(ty, segment) {
                current = Some(cast);
                continue;
            }
            let found = match segment {
                PathSegmentSyntax::Name(name) => self
                    .find_property(ty, name)
                    .filter(|&p| self.property_kind(p) == PropertyKind::Navigation),
                _ => None,
            };
            match found {
                Some(property) => {
                    navigation.push(Property::Declared(property));
                    current = self.navigation_target_entity(property);
                }
                None => {
                    let error = segment_error(
                        segment.text(),
                        EdmErrorCode::BadUnresolvedNavigationPropertyPath,
                    );
                    errors.push(error.clone());
                    navigation.push(Property::unresolved(PropertyKind::Navigation, segment.text(), error));
                    break;
                }
            }
        }

        Some(EntitySetPath {
            parameter: ParameterRef::Declared(binding),
            navigation,
            errors,
        })
    }

    // ========================================================================
    // Overload Binding
    // ========================================================================

    /// Binds a call of `name` with the given argument types.
    ///
    /// Overloads are narrowed in three stages: the name must exist, then
    /// every argument must cast to its positional parameter, and when more
    /// than one overload survives, exactly one must match every parameter
    /// without widening.
    pub fn bind_operation(&self, name: &str, arguments: &[ArgumentType], location: Option<Span>) -> OperationRef {
        let declared = self.find_operations(name);
        if declared.is_empty() {
            debug!(name, "no operation with this name");
            return OperationRef::unresolved(name, location);
        }

        let loose: Vec<OperationId> = declared
            .iter()
            .copied()
            .filter(|&operation| self.accepts(operation, arguments, Self::matches_loosely))
            .collect();
        match loose.as_slice() {
            [] => {
                debug!(name, arguments = arguments.len(), "no overload accepts the arguments");
                return OperationRef::Unresolved(Sentinel::error(
                    name,
                    location,
                    EdmErrorCode::BadUnresolvedOperation,
                    format!("No overload of '{name}' accepts the given arguments."),
                ));
            }
            [only] => return OperationRef::Declared(*only),
            _ => {}
        }

        let exact: Vec<OperationId> = loose
            .iter()
            .copied()
            .filter(|&operation| self.accepts(operation, arguments, Self::matches_exactly))
            .collect();
        if let [only] = exact.as_slice() {
            return OperationRef::Declared(*only);
        }
        debug!(name, candidates = loose.len(), "ambiguous overload");
        let error = EdmError::new(
            location,
            EdmErrorCode::BadAmbiguousOperation,
            format!("The call to '{name}' matches more than one overload."),
        )
        .with_candidates(self.overload_locations(&loose));
        OperationRef::Ambiguous {
            sentinel: Sentinel::new(name, error),
            candidates: loose,
        }
    }

    /// Where each of `candidates` is declared, skipping those without a
    /// location.
    pub(crate) fn overload_locations(&self, candidates: &[OperationId]) -> Vec<Span> {
        candidates
            .iter()
            .filter_map(|&id| self.operation_node(id).ast.location.clone())
            .collect()
    }

    fn accepts(
        &self,
        operation: OperationId,
        arguments: &[ArgumentType],
        matches: fn(&Self, &ArgumentType, &TypeReference) -> bool,
    ) -> bool {
        let parameters = self.operation_parameters(operation);
        parameters.len() == arguments.len()
            && parameters
                .iter()
                .zip(arguments)
                .all(|(&parameter, argument)| matches(self, argument, &self.parameter_type(parameter)))
    }

    fn matches_loosely(&self, argument: &ArgumentType, parameter: &TypeReference) -> bool {
        match argument {
            ArgumentType::Typed(ty) => self.is_castable(ty, parameter),
            ArgumentType::Null => parameter.nullable,
            ArgumentType::Unknown => true,
        }
    }

    fn matches_exactly(&self, argument: &ArgumentType, parameter: &TypeReference) -> bool {
        match argument {
            ArgumentType::Typed(ty) => self.is_exact_match(ty, parameter),
            ArgumentType::Null | ArgumentType::Unknown => false,
        }
    }
}
