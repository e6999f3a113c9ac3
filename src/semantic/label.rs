//! Labeled elements and label references.
//!
//! Each schema scans every annotation written in it (inline, out-of-line
//! and nested) once and records the labeled elements it finds. References
//! bind through that table, so a reference may appear before or after the
//! label it names.

use crate::ast::Span;
use crate::semantic::error::{Checkable, EdmError, EdmErrorCode, Sentinel};
use crate::semantic::expression::ExpressionKind;
use crate::semantic::ids::{AnnotationId, ElementRef, ExprId, SchemaId};
use crate::semantic::model::EdmModel;
use smol_str::SmolStr;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::debug;

/// Labeled elements of one schema by label, in scan order.
#[derive(Debug, Default)]
pub(crate) struct LabelTable {
    pub(crate) by_name: HashMap<SmolStr, Vec<ExprId>>,
}

/// What a label reference binds to.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelTarget {
    Declared(ExprId),
    /// More than one labeled element carries the label. The sentinel
    /// holds the ambiguity first, then the errors of every candidate.
    Ambiguous {
        candidates: Vec<ExprId>,
        sentinel: Sentinel,
    },
    Unresolved(Sentinel),
    /// Following references from label to label comes back around.
    Cyclic(Sentinel),
}

impl LabelTarget {
    /// The labeled element to continue with. An ambiguous target yields its
    /// first candidate in scan order.
    pub fn element(&self) -> Option<ExprId> {
        match self {
            Self::Declared(id) => Some(*id),
            Self::Ambiguous { candidates, .. } => candidates.first().copied(),
            Self::Unresolved(_) | Self::Cyclic(_) => None,
        }
    }
}

impl Checkable for LabelTarget {
    fn sentinel(&self) -> Option<&Sentinel> {
        match self {
            Self::Declared(_) => None,
            Self::Ambiguous { sentinel, .. } | Self::Unresolved(sentinel) | Self::Cyclic(sentinel) => {
                Some(sentinel)
            }
        }
    }
}

impl<'a> EdmModel<'a> {
    pub(crate) fn label_table(&self, schema: SchemaId) -> Rc<LabelTable> {
        self.schemas[schema.as_usize()]
            .labels
            .get_or_default(|| Rc::new(self.scan_labels(schema)))
    }

    fn scan_labels(&self, schema: SchemaId) -> LabelTable {
        let mut table = LabelTable::default();
        let node = &self.schemas[schema.as_usize()];
        let mut roots: Vec<AnnotationId> = node
            .annotated
            .iter()
            .flat_map(|&element| self.inline_annotations(element).to_vec())
            .collect();
        if let Some(out_of_line) = self.out_of_line_index().by_schema.get(&schema) {
            roots.extend_from_slice(out_of_line);
        }

        let mut pending: Vec<ExprId> = Vec::new();
        let mut annotations = roots;
        while !annotations.is_empty() {
            let mut nested = Vec::new();
            for annotation in annotations {
                pending.push(self.annotation_value(annotation));
                nested.extend_from_slice(&self.inline_annotations(ElementRef::Annotation(annotation)));
            }
            annotations = nested;
        }

        // Depth-first, children in source order.
        pending.reverse();
        while let Some(expr) = pending.pop() {
            if self.expression_kind(expr) == ExpressionKind::Labeled {
                if let Some(label) = self.expression_label(expr) {
                    table.by_name.entry(label).or_default().push(expr);
                }
            }
            pending.extend(self.expression_children(expr).iter().rev().copied());
        }

        debug!(
            schema = %node.ast.namespace,
            labels = table.by_name.len(),
            "scanned labeled elements"
        );
        table
    }

    pub(crate) fn resolve_label(&self, schema: SchemaId, label: &SmolStr, location: Option<Span>) -> LabelTarget {
        let table = self.label_table(schema);
        match table.by_name.get(label).map(Vec::as_slice) {
            None | Some([]) => {
                debug!(label = %label, "unresolved label");
                LabelTarget::Unresolved(Sentinel::error(
                    label.clone(),
                    location,
                    EdmErrorCode::BadUnresolvedLabeledElement,
                    format!("The labeled element '{label}' could not be found."),
                ))
            }
            Some([only]) => LabelTarget::Declared(*only),
            Some(many) => {
                debug!(label = %label, candidates = many.len(), "ambiguous label");
                let mut errors = vec![EdmError::new(
                    location,
                    EdmErrorCode::BadAmbiguousLabeledElement,
                    format!("The label '{label}' is declared {} times.", many.len()),
                )
                .with_candidates(many.iter().filter_map(|&candidate| self.expression_location(candidate)))];
                for element in many.iter().filter_map(|&candidate| self.labeled_element(candidate)) {
                    errors.extend(self.expression_errors(element));
                }
                LabelTarget::Ambiguous {
                    candidates: many.to_vec(),
                    sentinel: Sentinel::with_errors(label.clone(), errors),
                }
            }
        }
    }

    /// Follows a label reference through labeled elements that merely
    /// wrap another reference, down to the first labeled element holding
    /// something else.
    pub fn dereference_label(&self, reference: ExprId) -> Option<LabelTarget> {
        let mut seen = HashSet::new();
        let mut current = reference;
        loop {
            let target = self.label_target(current)?;
            let Some(element) = target.element() else {
                return Some(target);
            };
            if !seen.insert(element) {
                let label = self.expression_label(current).unwrap_or_default();
                debug!(label = %label, "label reference cycle");
                return Some(LabelTarget::Cyclic(Sentinel::error(
                    label.clone(),
                    self.expression_location(reference),
                    EdmErrorCode::BadCyclicLabeledElement,
                    format!("The labeled element '{label}' refers back to itself."),
                )));
            }
            match self.labeled_element(element) {
                Some(inner) if self.expression_kind(inner) == ExpressionKind::LabeledReference => {
                    current = inner;
                }
                _ => return Some(target),
            }
        }
    }

    /// The labeled elements of a schema carrying `label`, in scan order.
    pub fn find_labeled_elements(&self, schema: SchemaId, label: &str) -> Vec<ExprId> {
        self.label_table(schema)
            .by_name
            .get(label)
            .cloned()
            .unwrap_or_default()
    }
}
