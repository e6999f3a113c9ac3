//! Terms and annotation binding.
//!
//! Inline annotations hang off an [`AnnotationSlot`] embedded in each
//! element node. The slot only allocates its cache when the element's
//! syntax carries at least one annotation, so unannotated elements cost a
//! null pointer. Out-of-line `<Annotations Target="...">` groups are bound
//! once, model-wide, into an [`OutOfLineIndex`].

use crate::ast::{CsdlAnnotation, CsdlAnnotationSet, CsdlDirectValueAnnotation, Span};
use crate::semantic::cache::Cache;
use crate::semantic::config::StatsCounters;
use crate::semantic::error::{Checkable, EdmError, EdmErrorCode, Sentinel};
use crate::semantic::ids::{AnnotationId, ElementRef, ExprId, OperationId, SchemaId, TermId};
use crate::semantic::model::{EdmModel, TermNode};
use crate::semantic::navigation::split_collection;
use crate::semantic::types::{TypeDefinition, TypeReference, reentrant_type};
use smol_str::SmolStr;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::debug;

// ============================================================================
// Values
// ============================================================================

/// The term an annotation or a base-term link resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum TermRef {
    Declared(TermId),
    Unresolved(Sentinel),
    /// The base-term chain loops back to the term.
    Cyclic(Sentinel),
}

impl TermRef {
    /// The declared term, or `None` for a sentinel.
    pub fn as_declared(&self) -> Option<TermId> {
        match self {
            Self::Declared(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns true if the term inherits from itself.
    pub fn is_cyclic(&self) -> bool {
        matches!(self, Self::Cyclic(_))
    }
}

impl Checkable for TermRef {
    fn sentinel(&self) -> Option<&Sentinel> {
        match self {
            Self::Declared(_) => None,
            Self::Unresolved(sentinel) | Self::Cyclic(sentinel) => Some(sentinel),
        }
    }
}

struct SlotCache<'a> {
    set: &'a CsdlAnnotationSet,
    vocabulary: Cache<Rc<[AnnotationId]>>,
}

/// Inline annotations of one element.
pub(crate) struct AnnotationSlot<'a> {
    inner: Option<Box<SlotCache<'a>>>,
}

impl<'a> AnnotationSlot<'a> {
    pub(crate) fn new(set: &'a CsdlAnnotationSet, counters: &StatsCounters) -> Self {
        if !set.has_any() {
            return Self::empty();
        }
        StatsCounters::bump(&counters.annotation_caches);
        Self {
            inner: Some(Box::new(SlotCache {
                set,
                vocabulary: Cache::new(),
            })),
        }
    }

    pub(crate) fn empty() -> Self {
        Self { inner: None }
    }

    pub(crate) fn set(&self) -> Option<&'a CsdlAnnotationSet> {
        self.inner.as_ref().map(|inner| inner.set)
    }

    pub(crate) fn is_allocated(&self) -> bool {
        self.inner.is_some()
    }
}

pub(crate) struct AnnotationNode<'a> {
    /// The schema the annotation is written in.
    pub(crate) schema: SchemaId,
    pub(crate) target: ElementRef,
    pub(crate) ast: &'a CsdlAnnotation,
    /// The annotation's own qualifier, or the one of its out-of-line group.
    pub(crate) qualifier: Option<SmolStr>,
    pub(crate) value: ExprId,
    pub(crate) term: Cache<TermRef>,
    pub(crate) annotations: AnnotationSlot<'a>,
}

/// Out-of-line annotations bound to their targets.
#[derive(Debug, Default)]
pub(crate) struct OutOfLineIndex {
    pub(crate) by_target: HashMap<ElementRef, Vec<AnnotationId>>,
    /// Annotations per declaring schema, in document order.
    pub(crate) by_schema: HashMap<SchemaId, Vec<AnnotationId>>,
    pub(crate) errors: Vec<EdmError>,
}

impl<'a> EdmModel<'a> {
    // ========================================================================
    // Terms
    // ========================================================================

    pub(crate) fn term_node(&self, id: TermId) -> &TermNode<'a> {
        &self.terms[id.as_usize()]
    }

    /// Every declared term, in declaration order.
    pub fn terms(&self) -> impl Iterator<Item = TermId> + '_ {
        (0..self.terms.len()).map(TermId::new)
    }

    /// The qualified name of a term.
    pub fn term_name(&self, id: TermId) -> &SmolStr {
        &self.term_node(id).qualified_name
    }

    /// The declared type of a term's values.
    pub fn term_type(&self, id: TermId) -> TypeReference {
        let node = self.term_node(id);
        node.type_ref.get_or_compute(
            || self.resolve_type_reference(&node.ast.type_ref),
            || TypeReference::new(reentrant_type(&node.qualified_name), true),
        )
    }

    /// The element kinds listed in `AppliesTo`, empty when unrestricted.
    pub fn term_applies_to(&self, id: TermId) -> &[SmolStr] {
        &self.term_node(id).ast.applies_to
    }

    /// The `DefaultValue` text, unparsed.
    pub fn term_default_value(&self, id: TermId) -> Option<&SmolStr> {
        self.term_node(id).ast.default_value.as_ref()
    }

    /// The term this one specializes, `None` when it declares no base.
    pub fn base_term(&self, id: TermId) -> Option<TermRef> {
        self.term_node(id).base_term.get_or_compute(
            || self.compute_base_term(id),
            || {
                StatsCounters::bump(&self.counters.cycles_detected);
                debug!(term = %self.term_name(id), "base term cycle");
                Some(self.cyclic_term(id))
            },
        )
    }

    fn compute_base_term(&self, id: TermId) -> Option<TermRef> {
        let node = self.term_node(id);
        let name = node.ast.base_term.as_ref()?;
        let Some(base) = self.find_term(name) else {
            debug!(term = %node.qualified_name, base = %name, "unresolved base term");
            return Some(TermRef::Unresolved(Sentinel::error(
                name.clone(),
                node.ast.location.clone(),
                EdmErrorCode::BadUnresolvedTerm,
                format!("The term '{name}' could not be found."),
            )));
        };

        let base_is_cyclic = self.base_term(base).is_some_and(|b| b.is_cyclic());
        if base_is_cyclic && self.base_term_chain_reaches(base, id) {
            return Some(self.cyclic_term(id));
        }
        Some(TermRef::Declared(base))
    }

    fn base_term_chain_reaches(&self, from: TermId, target: TermId) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(from);
        while let Some(term) = current {
            if term == target {
                return true;
            }
            if !seen.insert(term) {
                return false;
            }
            current = self
                .term_node(term)
                .ast
                .base_term
                .as_ref()
                .and_then(|name| self.find_term(name));
        }
        false
    }

    fn cyclic_term(&self, id: TermId) -> TermRef {
        let node = self.term_node(id);
        TermRef::Cyclic(Sentinel::error(
            node.qualified_name.clone(),
            node.ast.location.clone(),
            EdmErrorCode::BadCyclicTerm,
            format!("The base term of '{}' is part of a cycle.", node.qualified_name),
        ))
    }

    // ========================================================================
    // Annotation Nodes
    // ========================================================================

    pub(crate) fn annotation_node(&self, id: AnnotationId) -> Rc<AnnotationNode<'a>> {
        Rc::clone(&self.annotation_nodes.borrow()[id.as_usize()])
    }

    fn add_annotation(
        &self,
        schema: SchemaId,
        target: ElementRef,
        ast: &'a CsdlAnnotation,
        group_qualifier: Option<&SmolStr>,
    ) -> AnnotationId {
        let id = AnnotationId::new(self.annotation_nodes.borrow().len());
        let value = self.wrap_expression(schema, Some(target), &ast.value);
        let node = AnnotationNode {
            schema,
            target,
            ast,
            qualifier: ast.qualifier.clone().or_else(|| group_qualifier.cloned()),
            value,
            term: Cache::new(),
            annotations: AnnotationSlot::new(&ast.annotations, &self.counters),
        };
        self.annotation_nodes.borrow_mut().push(Rc::new(node));
        id
    }

    /// The element an annotation is attached to.
    pub fn annotation_target(&self, id: AnnotationId) -> ElementRef {
        self.annotation_node(id).target
    }

    /// The schema the annotation is written in.
    pub fn annotation_schema(&self, id: AnnotationId) -> SchemaId {
        self.annotation_node(id).schema
    }

    /// The term name as written.
    pub fn annotation_term_name(&self, id: AnnotationId) -> SmolStr {
        self.annotation_node(id).ast.term.clone()
    }

    /// The `Qualifier`, if any.
    pub fn annotation_qualifier(&self, id: AnnotationId) -> Option<SmolStr> {
        self.annotation_node(id).qualifier.clone()
    }

    /// The expression holding the annotation's value.
    pub fn annotation_value(&self, id: AnnotationId) -> ExprId {
        self.annotation_node(id).value
    }

    /// Where the annotation was written.
    pub fn annotation_location(&self, id: AnnotationId) -> Option<Span> {
        self.annotation_node(id).ast.location.clone()
    }

    /// The term the annotation applies, or an `Unresolved` sentinel.
    pub fn annotation_term(&self, id: AnnotationId) -> TermRef {
        let node = self.annotation_node(id);
        let name = &node.ast.term;
        let unresolved = || {
            TermRef::Unresolved(Sentinel::error(
                name.clone(),
                node.ast.location.clone(),
                EdmErrorCode::BadUnresolvedTerm,
                format!("The term '{name}' could not be found."),
            ))
        };
        node.term.get_or_compute(
            || match self.find_term(name) {
                Some(term) => TermRef::Declared(term),
                None => {
                    debug!(term = %name, "unresolved annotation term");
                    unresolved()
                }
            },
            &unresolved,
        )
    }

    // ========================================================================
    // Binding
    // ========================================================================

    /// The schema an element is declared in.
    pub fn element_schema(&self, element: ElementRef) -> SchemaId {
        match element {
            ElementRef::Schema(id) => id,
            ElementRef::StructuredType(id) => self.structured_node(id).schema,
            ElementRef::Property(id) => self.structured_node(self.declaring_type(id)).schema,
            ElementRef::EnumType(id) => self.enum_node(id).schema,
            ElementRef::EnumMember(id) => self.enum_node(self.declaring_enum(id)).schema,
            ElementRef::TypeDefinition(id) => self.type_definition_node(id).schema,
            ElementRef::Operation(id) | ElementRef::ReturnType(id) => self.operation_node(id).schema,
            ElementRef::Parameter(id) => self.operation_node(self.parameter_operation(id)).schema,
            ElementRef::Term(id) => self.term_node(id).schema,
            ElementRef::Container(id) => self.container_node(id).schema,
            ElementRef::NavigationSource(id) => self.container_node(self.source_container(id)).schema,
            ElementRef::OperationImport(id) => self.container_node(self.import_container(id)).schema,
            ElementRef::Annotation(id) => self.annotation_schema(id),
        }
    }

    fn with_slot<R>(&self, element: ElementRef, f: impl FnOnce(&AnnotationSlot<'a>) -> R) -> R {
        match element {
            ElementRef::Schema(id) => f(&self.schemas[id.as_usize()].annotations),
            ElementRef::StructuredType(id) => f(&self.structured_node(id).annotations),
            ElementRef::Property(id) => f(&self.property_node(id).annotations),
            ElementRef::EnumType(id) => f(&self.enum_node(id).annotations),
            ElementRef::EnumMember(id) => f(&self.enum_member_node(id).annotations),
            ElementRef::TypeDefinition(id) => f(&self.type_definition_node(id).annotations),
            ElementRef::Operation(id) => f(&self.operation_node(id).annotations),
            ElementRef::ReturnType(id) => f(&self.operation_node(id).return_annotations),
            ElementRef::Parameter(id) => f(&self.parameter_node(id).annotations),
            ElementRef::Term(id) => f(&self.term_node(id).annotations),
            ElementRef::Container(id) => f(&self.container_node(id).annotations),
            ElementRef::NavigationSource(id) => f(&self.source_node(id).annotations),
            ElementRef::OperationImport(id) => f(&self.import_node(id).annotations),
            ElementRef::Annotation(id) => f(&self.annotation_node(id).annotations),
        }
    }

    /// Returns true if the element allocated an inline annotation cache.
    pub fn has_annotation_cache(&self, element: ElementRef) -> bool {
        self.with_slot(element, AnnotationSlot::is_allocated)
    }

    /// Inline vocabulary annotations, in document order.
    pub fn inline_annotations(&self, element: ElementRef) -> Rc<[AnnotationId]> {
        let schema = self.element_schema(element);
        self.with_slot(element, |slot| match &slot.inner {
            None => Rc::default(),
            Some(inner) => inner.vocabulary.get_or_default(|| {
                inner
                    .set
                    .vocabulary
                    .iter()
                    .map(|ast| self.add_annotation(schema, element, ast, None))
                    .collect()
            }),
        })
    }

    /// Inline annotations followed by out-of-line ones.
    pub fn vocabulary_annotations(&self, element: ElementRef) -> Vec<AnnotationId> {
        let mut annotations = self.inline_annotations(element).to_vec();
        if let Some(out_of_line) = self.out_of_line_index().by_target.get(&element) {
            annotations.extend_from_slice(out_of_line);
        }
        annotations
    }

    /// Non-vocabulary annotations attached to `element`, in source order.
    pub fn direct_value_annotations(&self, element: ElementRef) -> &'a [CsdlDirectValueAnnotation] {
        self.with_slot(element, |slot| match slot.set() {
            Some(set) => set.direct_values.as_slice(),
            None => &[],
        })
    }

    /// The first annotation on `element` for `term` with `qualifier`.
    pub fn find_vocabulary_annotation(
        &self,
        element: ElementRef,
        term: &str,
        qualifier: Option<&str>,
    ) -> Option<AnnotationId> {
        let wanted = self.qualify(term).into_owned();
        self.vocabulary_annotations(element).into_iter().find(|&annotation| {
            let node = self.annotation_node(annotation);
            self.qualify(&node.ast.term) == wanted.as_str() && node.qualifier.as_deref() == qualifier
        })
    }

    // ========================================================================
    // Out-of-line Annotations
    // ========================================================================

    pub(crate) fn out_of_line_index(&self) -> Rc<OutOfLineIndex> {
        self.out_of_line
            .get_or_default(|| Rc::new(self.compute_out_of_line_index()))
    }

    fn compute_out_of_line_index(&self) -> OutOfLineIndex {
        let mut index = OutOfLineIndex::default();
        if !self.config.resolve_out_of_line_annotations {
            return index;
        }

        for (position, schema_node) in self.schemas.iter().enumerate() {
            let schema = SchemaId::new(position);
            for group in &schema_node.ast.out_of_line_annotations {
                let targets = self.resolve_annotation_target(&group.target);
                if targets.is_empty() {
                    debug!(target = %group.target, "unresolved annotation target");
                    index.errors.push(EdmError::new(
                        group.location.clone(),
                        EdmErrorCode::BadUnresolvedTarget,
                        format!("The annotation target '{}' could not be found.", group.target),
                    ));
                    continue;
                }
                for target in targets {
                    for ast in &group.annotations {
                        let id = self.add_annotation(schema, target, ast, group.qualifier.as_ref());
                        index.by_target.entry(target).or_default().push(id);
                        index.by_schema.entry(schema).or_default().push(id);
                    }
                }
            }
        }
        index
    }

    /// Binds an annotation target path. Unqualified operation targets
    /// apply to every overload.
    fn resolve_annotation_target(&self, target: &str) -> Vec<ElementRef> {
        let (head, rest) = match target.split_once('/') {
            Some((head, rest)) => (head, Some(rest)),
            None => (target, None),
        };
        let (name, signature) = match head.split_once('(') {
            Some((name, signature)) => (name, signature.strip_suffix(')')),
            None => (head, None),
        };

        if rest.is_none() && signature.is_none() {
            let qualified = self.qualify(name);
            if let Some(schema) = self
                .schemas
                .iter()
                .position(|s| s.ast.namespace == qualified.as_ref())
            {
                return vec![ElementRef::Schema(SchemaId::new(schema))];
            }
            if let Some(term) = self.find_term(name) {
                return vec![ElementRef::Term(term)];
            }
            if let Some(container) = self.find_container(name) {
                return vec![ElementRef::Container(container)];
            }
        }

        if let Some(definition) = self.find_type(name).filter(|_| signature.is_none()) {
            return match (rest, definition) {
                (None, TypeDefinition::Primitive(_)) => Vec::new(),
                (None, definition) => self.type_element(&definition).into_iter().collect(),
                (Some(member), TypeDefinition::Enum(enum_type)) => self
                    .find_enum_member(enum_type, member)
                    .map(ElementRef::EnumMember)
                    .into_iter()
                    .collect(),
                (Some(property), definition) => definition
                    .as_structured()
                    .and_then(|ty| self.find_property(ty, property))
                    .map(ElementRef::Property)
                    .into_iter()
                    .collect(),
            };
        }

        if let (Some(container), Some(member), None) = (self.find_container(name), rest, signature) {
            if let Some(source) = self.find_navigation_source(container, member) {
                return vec![ElementRef::NavigationSource(source)];
            }
            return self
                .find_operation_import(container, member)
                .map(ElementRef::OperationImport)
                .into_iter()
                .collect();
        }

        let overloads = self
            .find_operations(name)
            .iter()
            .copied()
            .filter(|&operation| signature.is_none_or(|s| self.signature_matches(operation, s)));
        match rest {
            None => overloads.map(ElementRef::Operation).collect(),
            Some("$ReturnType") => overloads
                .filter(|&operation| self.operation_node(operation).ast.return_type.is_some())
                .map(ElementRef::ReturnType)
                .collect(),
            Some(parameter) => overloads
                .filter_map(|operation| self.find_parameter(operation, parameter))
                .map(ElementRef::Parameter)
                .collect(),
        }
    }

    fn type_element(&self, definition: &TypeDefinition) -> Option<ElementRef> {
        match definition {
            TypeDefinition::Entity(id) | TypeDefinition::Complex(id) => Some(ElementRef::StructuredType(*id)),
            TypeDefinition::Enum(id) => Some(ElementRef::EnumType(*id)),
            TypeDefinition::Alias(id) => Some(ElementRef::TypeDefinition(*id)),
            _ => None,
        }
    }

    /// Compares `NS.T1,Collection(NS.T2)` against the parameter types.
    fn signature_matches(&self, operation: OperationId, signature: &str) -> bool {
        let names: Vec<&str> = if signature.trim().is_empty() {
            Vec::new()
        } else {
            split_signature(signature)
        };
        let parameters = self.operation_parameters(operation);
        parameters.len() == names.len()
            && parameters
                .iter()
                .zip(names)
                .all(|(&parameter, name)| self.type_name_matches(&self.parameter_type(parameter), name))
    }

    fn type_name_matches(&self, ty: &TypeReference, name: &str) -> bool {
        match (split_collection(name), ty.element()) {
            ((true, inner), Some(element)) => self.type_name_matches(element, inner),
            ((false, plain), None) => self.find_type(plain).is_some_and(|found| found == ty.definition),
            _ => false,
        }
    }
}

/// Splits on top-level commas only.
fn split_signature(signature: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (offset, ch) in signature.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(signature[start..offset].trim());
                start = offset + 1;
            }
            _ => {}
        }
    }
    parts.push(signature[start..].trim());
    parts
}
