//! Forcing the whole model.
//!
//! [`EdmModel::errors`] reads every lazily computed fact reachable from a
//! declaration and gathers the diagnostics in declaration order. After it
//! returns, every memo slot it touched is computed.

use crate::semantic::error::{Checkable, EdmError};
use crate::semantic::expression::ExpressionKind;
use crate::semantic::ids::{AnnotationId, ElementRef, ExprId, SchemaId};
use crate::semantic::label::LabelTarget;
use crate::semantic::model::EdmModel;
use crate::semantic::structured::PropertyKind;
use std::collections::HashSet;
use std::rc::Rc;
use tracing::debug;

/// Collects diagnostics.
///
/// A sentinel reached through several accessors (a navigation target and
/// the property type wrapping it) is reported once. Distinct elements that
/// happen to carry equal errors are all reported.
#[derive(Default)]
struct ErrorSink {
    seen: HashSet<*const EdmError>,
    // Keeps reported sentinels alive so their addresses stay unique.
    held: Vec<Rc<[EdmError]>>,
    errors: Vec<EdmError>,
}

impl ErrorSink {
    fn extend(&mut self, errors: &[EdmError]) {
        self.errors.extend_from_slice(errors);
    }

    fn check(&mut self, value: &impl Checkable) {
        let Some(sentinel) = value.sentinel() else {
            self.extend(value.errors());
            return;
        };
        let shared = sentinel.shared_errors();
        if self.seen.insert(Rc::as_ptr(shared).cast::<EdmError>()) {
            self.extend(shared);
            self.held.push(Rc::clone(shared));
        }
    }
}

impl<'a> EdmModel<'a> {
    /// Every diagnostic in the model.
    pub fn errors(&self) -> Vec<EdmError> {
        let mut sink = ErrorSink::default();
        sink.extend(&self.names.errors);

        self.walk_types(&mut sink);
        self.walk_operations(&mut sink);
        self.walk_containers(&mut sink);
        self.walk_annotations(&mut sink);

        debug!(errors = sink.errors.len(), "walked model");
        sink.errors
    }

    /// Returns true if the model has no diagnostics at all.
    pub fn is_valid(&self) -> bool {
        self.errors().is_empty()
    }

    fn walk_types(&self, sink: &mut ErrorSink) {
        for ty in self.structured_types() {
            if let Some(base) = self.base_type(ty) {
                sink.check(&base);
            }
            sink.extend(&self.property_table(ty).errors);
            if let Some(key) = self.declared_key(ty) {
                key.iter().for_each(|property| sink.check(property));
            }

            for &property in self.declared_properties(ty) {
                sink.check(&self.property_type(property));
                sink.extend(&self.property_errors(property));
                if self.property_kind(property) != PropertyKind::Navigation {
                    continue;
                }
                if let Some(target) = self.navigation_target(property) {
                    sink.check(&target);
                }
                if let Some(partner) = self.partner(property) {
                    sink.check(&partner);
                }
                for constraint in self.referential_constraints(property).iter() {
                    sink.check(&constraint.dependent);
                    sink.check(&constraint.principal);
                }
            }
        }

        for enum_type in self.enum_types() {
            sink.check(&self.enum_underlying_type(enum_type));
            for &member in self.enum_members(enum_type) {
                sink.check(&self.enum_member_value(member));
            }
        }
        for definition in self.type_definitions() {
            sink.check(&self.type_definition_underlying(definition));
        }
        for term in self.terms() {
            sink.check(&self.term_type(term));
            if let Some(base) = self.base_term(term) {
                sink.check(&base);
            }
        }
    }

    fn walk_operations(&self, sink: &mut ErrorSink) {
        for operation in self.operations() {
            for &parameter in self.operation_parameters(operation) {
                sink.check(&self.parameter_type(parameter));
            }
            if let Some(returns) = self.return_type(operation) {
                sink.check(&returns);
            }
            if let Some(path) = self.entity_set_path(operation) {
                sink.check(path.as_ref());
            }
        }
    }

    fn walk_containers(&self, sink: &mut ErrorSink) {
        for container in self.containers() {
            if let Some(extends) = self.container_extends(container) {
                sink.check(&extends);
            }
            for &source in self.declared_sources(container) {
                sink.check(&self.source_entity_type(source));
                for binding in self.bindings(&self.navigation_source(source)).iter() {
                    sink.check(binding);
                }
            }
            for &import in self.declared_imports(container) {
                sink.check(&self.import_operation(import));
                if let Some(target) = self.import_entity_set(import) {
                    sink.check(&target);
                }
            }
        }
    }

    fn walk_annotations(&self, sink: &mut ErrorSink) {
        let out_of_line = self.out_of_line_index();
        sink.extend(&out_of_line.errors);

        for position in 0..self.schemas.len() {
            let schema = SchemaId::new(position);
            let mut roots: Vec<AnnotationId> = self.schemas[position]
                .annotated
                .iter()
                .flat_map(|&element| self.inline_annotations(element).to_vec())
                .collect();
            if let Some(annotations) = out_of_line.by_schema.get(&schema) {
                roots.extend_from_slice(annotations);
            }
            for annotation in roots {
                self.walk_annotation(annotation, sink);
            }
        }
    }

    fn walk_annotation(&self, annotation: AnnotationId, sink: &mut ErrorSink) {
        sink.check(&self.annotation_term(annotation));
        self.walk_expression(self.annotation_value(annotation), sink);
        for &nested in self.inline_annotations(ElementRef::Annotation(annotation)).iter() {
            self.walk_annotation(nested, sink);
        }
    }

    fn walk_expression(&self, root: ExprId, sink: &mut ErrorSink) {
        let mut pending = vec![root];
        while let Some(expr) = pending.pop() {
            match self.label_target(expr) {
                // Only the ambiguity itself; the candidates are walked on
                // their own.
                Some(LabelTarget::Ambiguous { sentinel, .. }) => {
                    sink.extend(sentinel.errors().get(..1).unwrap_or_default());
                }
                _ => sink.extend(&self.expression_errors(expr)),
            }
            self.infer_expression_type(expr);
            if self.expression_kind(expr) == ExpressionKind::LabeledReference {
                if let Some(target @ LabelTarget::Cyclic(_)) = self.dereference_label(expr) {
                    sink.check(&target);
                }
            }
            pending.extend(self.expression_children(expr).iter().rev().copied());
        }
    }
}
