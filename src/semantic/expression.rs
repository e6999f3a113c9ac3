//! Annotation value expressions.
//!
//! Expressions are wrapped on demand: an annotation wraps its value, and
//! each expression wraps its children the first time they are asked for.
//! Every wrapper remembers its schema (for label lookups) and the element
//! the annotation applies to (the binding context for paths and
//! references). Labeled elements are wrapped at most once per schema, so
//! every route to a label sees the same [`ExprId`].

use crate::ast::{ConstantKind, CsdlExpression, CsdlExpressionKind, PathKind, PrimitiveKind, Span};
use crate::path::{PathSegmentSyntax, parse_path};
use crate::semantic::annotation::TermRef;
use crate::semantic::cache::Cache;
use crate::semantic::error::{Checkable, EdmError, EdmErrorCode, Sentinel};
use crate::semantic::ids::{
    ElementRef, EnumMemberId, ExprId, OperationId, PropertyId, SchemaId, StructuredTypeId,
};
use crate::semantic::label::LabelTarget;
use crate::semantic::literal::{PrimitiveValue, parse_literal};
use crate::semantic::model::EdmModel;
use crate::semantic::operation::{ArgumentType, OperationRef, ParameterRef};
use crate::semantic::structured::{Property, PropertyKind};
use crate::semantic::types::{TypeDefinition, TypeKind, TypeReference};
use smol_str::SmolStr;
use std::rc::Rc;
use tracing::debug;

// ============================================================================
// Values
// ============================================================================

/// The shape of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionKind {
    Constant(ConstantKind),
    Null,
    Path(PathKind),
    Cast,
    IsType,
    If,
    Record,
    Collection,
    PropertyReference,
    ParameterReference,
    OperationReference,
    Apply,
    Labeled,
    LabeledReference,
    EnumMember,
}

/// The value of a constant expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Value(PrimitiveValue),
    /// The text does not parse as the constant's kind.
    Bad(Sentinel),
}

impl Checkable for ConstantValue {
    fn sentinel(&self) -> Option<&Sentinel> {
        match self {
            Self::Value(_) => None,
            Self::Bad(sentinel) => Some(sentinel),
        }
    }
}

/// One resolved segment of a path expression.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Property(PropertyId),
    TypeCast(TypeDefinition),
    Term {
        term: TermRef,
        qualifier: Option<SmolStr>,
    },
    Keyword(SmolStr),
    /// Resolution stopped here.
    Unresolved(Sentinel),
}

impl Checkable for PathSegment {
    fn sentinel(&self) -> Option<&Sentinel> {
        match self {
            Self::Unresolved(sentinel) => Some(sentinel),
            Self::Term { term, .. } => term.sentinel(),
            _ => None,
        }
    }
}

/// One member named by an enum member expression.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumMemberRef {
    Declared(EnumMemberId),
    Unresolved(Sentinel),
}

impl Checkable for EnumMemberRef {
    fn sentinel(&self) -> Option<&Sentinel> {
        match self {
            Self::Declared(_) => None,
            Self::Unresolved(sentinel) => Some(sentinel),
        }
    }
}

/// What an expression refers to, computed once per node.
#[derive(Debug, Clone, Default)]
pub(crate) enum Resolved {
    #[default]
    Nothing,
    Constant(ConstantValue),
    Path(Rc<[PathSegment]>),
    Property(Property),
    Parameter(ParameterRef),
    Operation(OperationRef),
    Type(TypeReference),
    Label(LabelTarget),
    EnumMembers(Rc<[EnumMemberRef]>),
}

pub(crate) struct ExprNode<'a> {
    pub(crate) schema: SchemaId,
    /// The annotated element paths and references are resolved against.
    pub(crate) context: Option<ElementRef>,
    pub(crate) ast: &'a CsdlExpression,
    pub(crate) children: Cache<Rc<[ExprId]>>,
    pub(crate) resolved: Cache<Resolved>,
    pub(crate) inferred: Cache<Option<TypeReference>>,
}

impl<'a> EdmModel<'a> {
    // ========================================================================
    // Wrapping
    // ========================================================================

    pub(crate) fn wrap_expression(
        &self,
        schema: SchemaId,
        context: Option<ElementRef>,
        ast: &'a CsdlExpression,
    ) -> ExprId {
        let labeled_key = matches!(ast.kind, CsdlExpressionKind::Labeled { .. })
            .then(|| (schema, ast as *const CsdlExpression as usize));
        if let Some(key) = labeled_key {
            if let Some(id) = self.labeled.borrow().get(&key).copied() {
                return id;
            }
        }

        let id = ExprId::new(self.exprs.borrow().len());
        self.exprs.borrow_mut().push(Rc::new(ExprNode {
            schema,
            context,
            ast,
            children: Cache::new(),
            resolved: Cache::new(),
            inferred: Cache::new(),
        }));
        if let Some(key) = labeled_key {
            self.labeled.borrow_mut().insert(key, id);
        }
        id
    }

    pub(crate) fn expr_node(&self, id: ExprId) -> Rc<ExprNode<'a>> {
        Rc::clone(&self.exprs.borrow()[id.as_usize()])
    }

    /// The syntactic kind of an expression.
    pub fn expression_kind(&self, id: ExprId) -> ExpressionKind {
        match &self.expr_node(id).ast.kind {
            CsdlExpressionKind::Constant { kind, .. } => ExpressionKind::Constant(*kind),
            CsdlExpressionKind::Null => ExpressionKind::Null,
            CsdlExpressionKind::Path { kind, .. } => ExpressionKind::Path(*kind),
            CsdlExpressionKind::Cast { .. } => ExpressionKind::Cast,
            CsdlExpressionKind::IsType { .. } => ExpressionKind::IsType,
            CsdlExpressionKind::If { .. } => ExpressionKind::If,
            CsdlExpressionKind::Record { .. } => ExpressionKind::Record,
            CsdlExpressionKind::Collection { .. } => ExpressionKind::Collection,
            CsdlExpressionKind::PropertyReference { .. } => ExpressionKind::PropertyReference,
            CsdlExpressionKind::ParameterReference { .. } => ExpressionKind::ParameterReference,
            CsdlExpressionKind::OperationReference { .. } => ExpressionKind::OperationReference,
            CsdlExpressionKind::Apply { .. } => ExpressionKind::Apply,
            CsdlExpressionKind::Labeled { .. } => ExpressionKind::Labeled,
            CsdlExpressionKind::LabeledReference { .. } => ExpressionKind::LabeledReference,
            CsdlExpressionKind::EnumMember { .. } => ExpressionKind::EnumMember,
        }
    }

    /// Where the expression was written.
    pub fn expression_location(&self, id: ExprId) -> Option<Span> {
        self.expr_node(id).ast.location.clone()
    }

    /// The element whose annotation holds this expression.
    pub fn expression_context(&self, id: ExprId) -> Option<ElementRef> {
        self.expr_node(id).context
    }

    /// Sub-expressions in source order.
    pub fn expression_children(&self, id: ExprId) -> Rc<[ExprId]> {
        let node = self.expr_node(id);
        node.children.get_or_default(|| {
            node.ast
                .children()
                .into_iter()
                .map(|child| self.wrap_expression(node.schema, node.context, child))
                .collect()
        })
    }

    /// Property names and values of a record expression.
    pub fn record_fields(&self, id: ExprId) -> Vec<(SmolStr, ExprId)> {
        let node = self.expr_node(id);
        let CsdlExpressionKind::Record { properties, .. } = &node.ast.kind else {
            return Vec::new();
        };
        properties
            .iter()
            .map(|field| field.property.clone())
            .zip(self.expression_children(id).iter().copied())
            .collect()
    }

    /// The label of a labeled element or labeled element reference.
    pub fn expression_label(&self, id: ExprId) -> Option<SmolStr> {
        match &self.expr_node(id).ast.kind {
            CsdlExpressionKind::Labeled { label, .. }
            | CsdlExpressionKind::LabeledReference { label } => Some(label.clone()),
            _ => None,
        }
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    fn resolved(&self, id: ExprId) -> Resolved {
        let node = self.expr_node(id);
        node.resolved.get_or_default(|| self.compute_resolved(id, &node))
    }

    fn compute_resolved(&self, id: ExprId, node: &ExprNode<'a>) -> Resolved {
        let location = node.ast.location.clone();
        match &node.ast.kind {
            CsdlExpressionKind::Constant { kind, value } => {
                Resolved::Constant(constant(*kind, value, location))
            }
            CsdlExpressionKind::Path { kind, path } => {
                Resolved::Path(self.resolve_path(node.context, *kind, path, location).into())
            }
            CsdlExpressionKind::Cast { target, .. } | CsdlExpressionKind::IsType { target, .. } => {
                Resolved::Type(self.resolve_type_reference(target))
            }
            CsdlExpressionKind::Collection {
                element_type: Some(element),
                ..
            } => Resolved::Type(self.resolve_type_reference(element)),
            CsdlExpressionKind::Record {
                type_name: Some(name),
                ..
            } => Resolved::Type(self.record_type_reference(name, location)),
            CsdlExpressionKind::PropertyReference { base, property } => {
                let owner = match base {
                    Some(_) => self
                        .expression_children(id)
                        .first()
                        .and_then(|&base| self.infer_expression_type(base))
                        .and_then(|ty| ty.structured_element()),
                    None => self.context_type(node.context),
                };
                Resolved::Property(self.any_property(owner, property, location))
            }
            CsdlExpressionKind::ParameterReference { parameter } => {
                Resolved::Parameter(self.resolve_parameter(node.context, parameter, location))
            }
            CsdlExpressionKind::OperationReference { operation } => {
                Resolved::Operation(self.resolve_operation_reference(operation, location))
            }
            CsdlExpressionKind::Apply { operation, .. } => {
                let arguments: Vec<ArgumentType> = self
                    .expression_children(id)
                    .iter()
                    .map(|&argument| self.argument_type(argument))
                    .collect();
                Resolved::Operation(self.bind_operation(operation, &arguments, location))
            }
            CsdlExpressionKind::LabeledReference { label } => {
                Resolved::Label(self.resolve_label(node.schema, label, location))
            }
            CsdlExpressionKind::EnumMember { members } => {
                Resolved::EnumMembers(self.resolve_enum_members(members, location).into())
            }
            _ => Resolved::Nothing,
        }
    }

    /// The parsed value of a constant expression.
    pub fn constant_value(&self, id: ExprId) -> Option<ConstantValue> {
        match self.resolved(id) {
            Resolved::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// The resolved segments of a path expression.
    pub fn path_segments(&self, id: ExprId) -> Rc<[PathSegment]> {
        match self.resolved(id) {
            Resolved::Path(segments) => segments,
            _ => Rc::default(),
        }
    }

    /// The target type of a cast or type test, the element type of a typed
    /// collection, or the type of a typed record.
    pub fn cast_target(&self, id: ExprId) -> Option<TypeReference> {
        match self.resolved(id) {
            Resolved::Type(ty) => Some(ty),
            _ => None,
        }
    }

    /// The property a property reference names.
    pub fn referenced_property(&self, id: ExprId) -> Option<Property> {
        match self.resolved(id) {
            Resolved::Property(property) => Some(property),
            _ => None,
        }
    }

    /// The parameter a parameter reference names.
    pub fn referenced_parameter(&self, id: ExprId) -> Option<ParameterRef> {
        match self.resolved(id) {
            Resolved::Parameter(parameter) => Some(parameter),
            _ => None,
        }
    }

    /// The operation named by an operation reference.
    pub fn referenced_operation(&self, id: ExprId) -> Option<OperationRef> {
        match (self.expression_kind(id), self.resolved(id)) {
            (ExpressionKind::OperationReference, Resolved::Operation(operation)) => Some(operation),
            _ => None,
        }
    }

    /// The overload an apply expression binds to.
    pub fn applied_operation(&self, id: ExprId) -> Option<OperationRef> {
        match (self.expression_kind(id), self.resolved(id)) {
            (ExpressionKind::Apply, Resolved::Operation(operation)) => Some(operation),
            _ => None,
        }
    }

    /// The members an enum member expression names, in source order.
    pub fn enum_member_references(&self, id: ExprId) -> Rc<[EnumMemberRef]> {
        match self.resolved(id) {
            Resolved::EnumMembers(members) => members,
            _ => Rc::default(),
        }
    }

    /// The labeled element a labeled element reference points at.
    pub fn label_target(&self, id: ExprId) -> Option<LabelTarget> {
        match self.resolved(id) {
            Resolved::Label(target) => Some(target),
            _ => None,
        }
    }

    /// The wrapped element of a labeled expression.
    pub fn labeled_element(&self, id: ExprId) -> Option<ExprId> {
        match self.expression_kind(id) {
            ExpressionKind::Labeled => self.expression_children(id).first().copied(),
            _ => None,
        }
    }

    /// Every diagnostic of this expression itself, not of its children.
    pub fn expression_errors(&self, id: ExprId) -> Vec<EdmError> {
        match self.resolved(id) {
            Resolved::Nothing => Vec::new(),
            Resolved::Constant(value) => value.errors().to_vec(),
            Resolved::Path(segments) => segments.iter().flat_map(|s| s.errors().to_vec()).collect(),
            Resolved::Property(property) => property.errors().to_vec(),
            Resolved::Parameter(parameter) => parameter.errors().to_vec(),
            Resolved::Operation(operation) => operation.errors().to_vec(),
            Resolved::Type(ty) => ty.errors().to_vec(),
            Resolved::Label(target) => target.errors().to_vec(),
            Resolved::EnumMembers(members) => members.iter().flat_map(|m| m.errors().to_vec()).collect(),
        }
    }

    // ========================================================================
    // Binding Context
    // ========================================================================

    /// The structured type paths in annotations on `context` start from.
    fn context_type(&self, context: Option<ElementRef>) -> Option<StructuredTypeId> {
        match context? {
            ElementRef::StructuredType(id) => Some(id),
            ElementRef::Property(id) => Some(self.declaring_type(id)),
            ElementRef::NavigationSource(id) => self.source_entity_type(id).as_entity(),
            ElementRef::Parameter(id) => self.parameter_type(id).structured_element(),
            ElementRef::ReturnType(id) => self.return_type(id)?.structured_element(),
            ElementRef::Operation(id) => self
                .binding_parameter(id)
                .and_then(|parameter| self.parameter_type(parameter).structured_element()),
            ElementRef::Annotation(id) => self.context_type(Some(self.annotation_target(id))),
            _ => None,
        }
    }

    fn context_operation(&self, context: Option<ElementRef>) -> Option<OperationId> {
        match context? {
            ElementRef::Operation(id) | ElementRef::ReturnType(id) => Some(id),
            ElementRef::Parameter(id) => Some(self.parameter_operation(id)),
            ElementRef::OperationImport(id) => self.import_operation(id).as_declared(),
            ElementRef::Annotation(id) => self.context_operation(Some(self.annotation_target(id))),
            _ => None,
        }
    }

    fn resolve_path(
        &self,
        context: Option<ElementRef>,
        kind: PathKind,
        path: &SmolStr,
        location: Option<Span>,
    ) -> Vec<PathSegment> {
        let unresolved = |text: &str, code: EdmErrorCode| {
            debug!(path = %path, segment = text, "unresolved path segment");
            PathSegment::Unresolved(Sentinel::error(
                text,
                location.clone(),
                code,
                format!("The path '{path}' could not be resolved at '{text}'."),
            ))
        };
        let syntax = match parse_path(path) {
            Ok(syntax) => syntax,
            Err(error) => {
                return vec![unresolved(&error.to_string(), EdmErrorCode::BadUnresolvedProperty)];
            }
        };

        let mut current = self.context_type(context);
        let mut segments = Vec::with_capacity(syntax.len());
        for segment in syntax {
            let resolved = match &segment {
                PathSegmentSyntax::Keyword(keyword) => PathSegment::Keyword(keyword.clone()),
                PathSegmentSyntax::Term(term) => match self.find_term(&term.term) {
                    Some(found) => {
                        current = self.term_type(found).structured_element();
                        PathSegment::Term {
                            term: TermRef::Declared(found),
                            qualifier: term.qualifier.clone(),
                        }
                    }
                    None => unresolved(term.term.as_str(), EdmErrorCode::BadUnresolvedTerm),
                },
                PathSegmentSyntax::Name(name) if segment.is_qualified() => match self.find_type(name) {
                    Some(found) => {
                        current = found.as_structured();
                        PathSegment::TypeCast(found)
                    }
                    None => unresolved(name.as_str(), EdmErrorCode::BadUnresolvedType),
                },
                PathSegmentSyntax::Name(name) => {
                    let found = current.and_then(|ty| self.find_property(ty, name));
                    match found {
                        Some(property) => {
                            current = self.property_type(property).structured_element();
                            PathSegment::Property(property)
                        }
                        None => unresolved(name.as_str(), EdmErrorCode::BadUnresolvedProperty),
                    }
                }
            };
            let stop = matches!(resolved, PathSegment::Unresolved(_));
            segments.push(resolved);
            if stop {
                return segments;
            }
        }

        if kind == PathKind::NavigationProperty {
            let last_is_navigation = matches!(
                segments.last(),
                Some(PathSegment::Property(p)) if self.property_kind(*p) == PropertyKind::Navigation
            );
            if !last_is_navigation {
                segments.push(unresolved(path.as_str(), EdmErrorCode::BadUnresolvedNavigationPropertyPath));
            }
        }
        segments
    }

    fn any_property(&self, owner: Option<StructuredTypeId>, name: &SmolStr, location: Option<Span>) -> Property {
        if let Some(found) = owner.and_then(|ty| self.find_property(ty, name)) {
            return Property::Declared(found);
        }
        debug!(property = %name, "unresolved property reference");
        Property::unresolved(
            PropertyKind::Structural,
            name,
            EdmError::new(
                location,
                EdmErrorCode::BadUnresolvedProperty,
                format!("The property '{name}' could not be found."),
            ),
        )
    }

    fn resolve_parameter(&self, context: Option<ElementRef>, name: &SmolStr, location: Option<Span>) -> ParameterRef {
        let found = self
            .context_operation(context)
            .and_then(|operation| self.find_parameter(operation, name));
        match found {
            Some(parameter) => ParameterRef::Declared(parameter),
            None => {
                debug!(parameter = %name, "unresolved parameter reference");
                ParameterRef::Unresolved(Sentinel::error(
                    name.clone(),
                    location,
                    EdmErrorCode::BadUnresolvedParameter,
                    format!("The parameter '{name}' could not be found."),
                ))
            }
        }
    }

    fn resolve_operation_reference(&self, name: &SmolStr, location: Option<Span>) -> OperationRef {
        match self.find_operations(name) {
            [] => OperationRef::unresolved(name, location),
            [only] => OperationRef::Declared(*only),
            many => OperationRef::Ambiguous {
                candidates: many.to_vec(),
                sentinel: Sentinel::new(
                    name.clone(),
                    EdmError::new(
                        location,
                        EdmErrorCode::BadAmbiguousOperation,
                        format!("The operation reference '{name}' names more than one overload."),
                    )
                    .with_candidates(self.overload_locations(many)),
                ),
            },
        }
    }

    fn record_type_reference(&self, name: &SmolStr, location: Option<Span>) -> TypeReference {
        let definition = match self.find_type(name) {
            Some(found @ (TypeDefinition::Entity(_) | TypeDefinition::Complex(_))) => found,
            _ => TypeDefinition::unresolved(
                TypeKind::Complex,
                name,
                location,
                EdmErrorCode::BadUnresolvedComplexType,
            ),
        };
        TypeReference::new(definition, true)
    }

    /// Resolves `NS.Enum/Member NS.Enum/Other`.
    fn resolve_enum_members(&self, members: &SmolStr, location: Option<Span>) -> Vec<EnumMemberRef> {
        members
            .split_whitespace()
            .map(|path| {
                let found = path.split_once('/').and_then(|(enum_name, member)| {
                    let TypeDefinition::Enum(enum_type) = self.find_type(enum_name)? else {
                        return None;
                    };
                    self.find_enum_member(enum_type, member)
                });
                match found {
                    Some(member) => EnumMemberRef::Declared(member),
                    None => {
                        debug!(member = path, "unresolved enum member");
                        EnumMemberRef::Unresolved(Sentinel::error(
                            path,
                            location.clone(),
                            EdmErrorCode::BadUnresolvedEnumMember,
                            format!("The enumeration member '{path}' could not be found."),
                        ))
                    }
                }
            })
            .collect()
    }

    // ========================================================================
    // Type Inference
    // ========================================================================

    /// The type an expression evaluates to, when it can be told statically.
    pub fn infer_expression_type(&self, id: ExprId) -> Option<TypeReference> {
        let node = self.expr_node(id);
        node.inferred.get_or_default(|| self.compute_inferred_type(id, &node))
    }

    fn compute_inferred_type(&self, id: ExprId, node: &ExprNode<'a>) -> Option<TypeReference> {
        match &node.ast.kind {
            CsdlExpressionKind::Constant { kind, value } => {
                let primitive = match self.constant_value(id)? {
                    ConstantValue::Value(PrimitiveValue::Int(value)) => integer_kind(value),
                    ConstantValue::Value(_) => constant_primitive(*kind),
                    ConstantValue::Bad(_) => {
                        debug!(value = %value, "no type for malformed constant");
                        return None;
                    }
                };
                Some(TypeReference::primitive(primitive, false))
            }
            CsdlExpressionKind::Cast { .. } | CsdlExpressionKind::Record { .. } => self.cast_target(id),
            CsdlExpressionKind::IsType { .. } => Some(TypeReference::primitive(PrimitiveKind::Boolean, false)),
            CsdlExpressionKind::If { .. } => {
                let branch = self.expression_children(id).get(1).copied()?;
                self.infer_expression_type(branch)
            }
            CsdlExpressionKind::Collection { .. } => {
                let element = match self.cast_target(id) {
                    Some(element) => element,
                    None => {
                        let first = self.expression_children(id).first().copied()?;
                        self.infer_expression_type(first)?
                    }
                };
                Some(TypeReference::collection(element))
            }
            CsdlExpressionKind::Path { .. } => match self.path_segments(id).last()? {
                PathSegment::Property(property) => Some(self.property_type(*property)),
                PathSegment::TypeCast(definition) => Some(TypeReference::new(definition.clone(), true)),
                PathSegment::Term {
                    term: TermRef::Declared(term),
                    ..
                } => Some(self.term_type(*term)),
                _ => None,
            },
            CsdlExpressionKind::PropertyReference { .. } => {
                let property = self.referenced_property(id)?.as_declared()?;
                Some(self.property_type(property))
            }
            CsdlExpressionKind::ParameterReference { .. } => {
                let parameter = self.referenced_parameter(id)?.as_declared()?;
                Some(self.parameter_type(parameter))
            }
            CsdlExpressionKind::Apply { .. } => {
                let operation = self.applied_operation(id)?.as_declared()?;
                self.return_type(operation)
            }
            CsdlExpressionKind::Labeled { .. } => {
                let element = self.labeled_element(id)?;
                self.infer_expression_type(element)
            }
            CsdlExpressionKind::LabeledReference { .. } => {
                let target = self.label_target(id)?.element()?;
                self.infer_expression_type(target)
            }
            CsdlExpressionKind::EnumMember { .. } => match self.enum_member_references(id).first()? {
                EnumMemberRef::Declared(member) => Some(TypeReference::new(
                    TypeDefinition::Enum(self.declaring_enum(*member)),
                    false,
                )),
                EnumMemberRef::Unresolved(_) => None,
            },
            CsdlExpressionKind::Null | CsdlExpressionKind::OperationReference { .. } => None,
        }
    }

    /// How an argument takes part in overload binding.
    pub fn argument_type(&self, id: ExprId) -> ArgumentType {
        if self.expression_kind(id) == ExpressionKind::Null {
            return ArgumentType::Null;
        }
        match self.infer_expression_type(id) {
            Some(ty) => ArgumentType::Typed(ty),
            None => ArgumentType::Unknown,
        }
    }
}

fn constant(kind: ConstantKind, text: &SmolStr, location: Option<Span>) -> ConstantValue {
    match parse_literal(kind, text) {
        Ok(value) => ConstantValue::Value(value),
        Err(error) => {
            debug!(%error, "malformed literal");
            ConstantValue::Bad(Sentinel::error(
                text.clone(),
                location,
                EdmErrorCode::InvalidLiteral,
                error.to_string(),
            ))
        }
    }
}

/// `Int32` when the value fits, `Int64` otherwise.
fn integer_kind(value: i64) -> PrimitiveKind {
    if i32::try_from(value).is_ok() {
        PrimitiveKind::Int32
    } else {
        PrimitiveKind::Int64
    }
}

fn constant_primitive(kind: ConstantKind) -> PrimitiveKind {
    match kind {
        ConstantKind::Binary => PrimitiveKind::Binary,
        ConstantKind::Boolean => PrimitiveKind::Boolean,
        ConstantKind::Date => PrimitiveKind::Date,
        ConstantKind::DateTimeOffset => PrimitiveKind::DateTimeOffset,
        ConstantKind::Decimal => PrimitiveKind::Decimal,
        ConstantKind::Duration => PrimitiveKind::Duration,
        ConstantKind::Float => PrimitiveKind::Double,
        ConstantKind::Guid => PrimitiveKind::Guid,
        ConstantKind::Int => PrimitiveKind::Int64,
        ConstantKind::String => PrimitiveKind::String,
        ConstantKind::TimeOfDay => PrimitiveKind::TimeOfDay,
    }
}
