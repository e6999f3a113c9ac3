//! Stress Testing and Large Model Handling
//!
//! Validates that resolution stays correct on long inheritance chains, long
//! cycles, wide schemas, heavily overloaded operations and deeply nested
//! expressions.
//!
//! Test Categories:
//! - Deep inheritance (200+ levels)
//! - Long cycles
//! - Wide schemas (1000+ types and sources)
//! - Many overloads
//! - Deep expression nesting

mod common;

use common::{entity, entity_set, init_tracing, int32, property};
use csdl_semantics::ast::{
    CsdlAnnotation, CsdlEntityContainer, CsdlEntitySet, CsdlEntityType, CsdlExpression, CsdlNavigationProperty,
    CsdlOperation, CsdlProperty, CsdlSchema, CsdlTerm, CsdlTypeReference, PrimitiveKind,
};
use csdl_semantics::semantic::{
    Checkable, EdmErrorCode, EdmModel, ElementRef, ExprId, NavigationSourceKind, TypeDefinition, TypeReference,
};

fn note_term() -> CsdlTerm {
    CsdlTerm::new("Note", CsdlTypeReference::primitive(PrimitiveKind::PrimitiveType))
}

/// The annotation values on `NS.Host`.
fn host_values(model: &EdmModel<'_>) -> Vec<ExprId> {
    let host = entity(model, "NS.Host");
    model
        .vocabulary_annotations(ElementRef::StructuredType(host))
        .into_iter()
        .map(|annotation| model.annotation_value(annotation))
        .collect()
}

// ===== Deep Inheritance =====

#[test]
fn inheritance_chain_of_200_levels() {
    init_tracing();
    let mut schema = CsdlSchema::new("NS").with_entity_type(
        CsdlEntityType::new("T0")
            .with_key(["P0"])
            .with_property(CsdlProperty::new("P0", int32().with_nullable(false))),
    );
    for level in 1..200 {
        schema = schema.with_entity_type(
            CsdlEntityType::new(format!("T{level}"))
                .with_base_type(format!("NS.T{}", level - 1))
                .with_property(CsdlProperty::new(format!("P{level}"), int32())),
        );
    }
    let schemas = [schema];
    let model = EdmModel::new(&schemas).expect("model");

    // Start at the bottom so the whole chain resolves in one descent.
    let leaf = entity(&model, "NS.T199");
    assert_eq!(model.properties(leaf).len(), 200);
    let key = model.key(leaf).expect("inherited key");
    assert_eq!(key[0].as_declared(), Some(property(&model, "NS.T0", "P0")));

    let root = TypeDefinition::Entity(entity(&model, "NS.T0"));
    let leaf_ref = TypeReference::new(TypeDefinition::Entity(leaf), true);
    let root_ref = TypeReference::new(root, true);
    assert!(model.is_castable(&leaf_ref, &root_ref));

    assert!(model.errors().is_empty());
    assert_eq!(model.stats().cycles_detected, 0);
}

// ===== Long Cycles =====

#[test]
fn cycle_of_150_types_marks_every_member() {
    let mut schema = CsdlSchema::new("NS");
    for index in 0..150 {
        schema = schema.with_entity_type(
            CsdlEntityType::new(format!("C{index}")).with_base_type(format!("NS.C{}", (index + 1) % 150)),
        );
    }
    let schemas = [schema];
    let model = EdmModel::new(&schemas).expect("model");

    let _ = model.base_type(entity(&model, "NS.C75"));
    for index in 0..150 {
        let base = model.base_type(entity(&model, &format!("NS.C{index}"))).expect("base");
        assert!(base.is_cyclic(), "C{index} should be cyclic");
    }
    let errors = model.errors();
    assert_eq!(
        errors.iter().filter(|e| e.code == EdmErrorCode::BadCyclicEntity).count(),
        150
    );
}

#[test]
fn long_tail_into_a_cycle_stays_resolved() {
    let mut schema = CsdlSchema::new("NS")
        .with_entity_type(CsdlEntityType::new("A").with_base_type("NS.B"))
        .with_entity_type(CsdlEntityType::new("B").with_base_type("NS.A"))
        .with_entity_type(CsdlEntityType::new("Tail0").with_base_type("NS.A"));
    for index in 1..100 {
        schema = schema
            .with_entity_type(CsdlEntityType::new(format!("Tail{index}")).with_base_type(format!("NS.Tail{}", index - 1)));
    }
    let schemas = [schema];
    let model = EdmModel::new(&schemas).expect("model");

    let _ = model.properties(entity(&model, "NS.Tail99"));
    for index in 0..100 {
        let base = model.base_type(entity(&model, &format!("NS.Tail{index}"))).expect("base");
        assert!(!base.is_bad(), "Tail{index} is not part of the cycle");
    }
}

// ===== Wide Schemas =====

#[test]
fn wide_schema_with_1000_linked_types() {
    const WIDTH: usize = 1000;
    let mut schema = CsdlSchema::new("NS");
    let mut container = CsdlEntityContainer::new("C");
    for index in 0..WIDTH {
        let mut ty = CsdlEntityType::new(format!("W{index}"))
            .with_key(["Id"])
            .with_property(CsdlProperty::new("Id", int32().with_nullable(false)))
            .with_navigation(CsdlNavigationProperty::new("Next", format!("NS.W{}", (index + 1) % WIDTH)));
        for column in 0..10 {
            ty = ty.with_property(CsdlProperty::new(format!("Col{column}"), int32()));
        }
        schema = schema.with_entity_type(ty);
        container = container.with_entity_set(
            CsdlEntitySet::new(format!("S{index}"), format!("NS.W{index}"))
                .with_binding("Next", format!("S{}", (index + 1) % WIDTH)),
        );
    }
    let schemas = [schema.with_container(container)];
    let model = EdmModel::new(&schemas).expect("model");

    assert!(model.errors().is_empty());

    let mut source = model.navigation_source(entity_set(&model, "NS.C", "S0"));
    for step in 1..=WIDTH {
        let ty = format!("NS.W{}", (step - 1) % WIDTH);
        source = model.find_navigation_target(&source, property(&model, &ty, "Next"));
        assert_eq!(source.kind(), Some(NavigationSourceKind::EntitySet));
    }
    assert_eq!(model.navigation_source_name(&source), "S0");
    assert_eq!(model.stats().derived_sources, 0);
}

// ===== Many Overloads =====

#[test]
fn apply_picks_one_of_40_overloads() {
    let mut schema = CsdlSchema::new("NS").with_term(note_term());
    for index in 0..40 {
        let name = format!("NS.O{index}");
        schema = schema
            .with_entity_type(CsdlEntityType::new(format!("O{index}")))
            .with_operation(
                CsdlOperation::function("Pick")
                    .with_parameter("x", CsdlTypeReference::named(name.as_str()))
                    .returning(CsdlTypeReference::named(name.as_str())),
            );
    }
    let schema = schema.with_entity_type(CsdlEntityType::new("Host").with_annotation(CsdlAnnotation::new(
        "NS.Note",
        CsdlExpression::apply(
            "NS.Pick",
            vec![CsdlExpression::cast(CsdlTypeReference::named("NS.O17"), CsdlExpression::null())],
        ),
    )));
    let schemas = [schema];
    let model = EdmModel::new(&schemas).expect("model");
    assert_eq!(model.find_operations("NS.Pick").len(), 40);

    let apply = host_values(&model)[0];
    let operation = model
        .applied_operation(apply)
        .and_then(|op| op.as_declared())
        .expect("bound overload");
    let parameter = model.operation_parameters(operation)[0];
    assert_eq!(
        model.parameter_type(parameter).structured_element(),
        Some(entity(&model, "NS.O17"))
    );
    assert!(model.errors().is_empty());
}

// ===== Deep Expressions =====

#[test]
fn nested_if_64_levels_infers_innermost_type() {
    let mut expr = CsdlExpression::string("deep");
    for _ in 0..64 {
        expr = CsdlExpression::if_else(CsdlExpression::boolean(true), expr, CsdlExpression::string("other"));
    }
    let schemas = [CsdlSchema::new("NS")
        .with_term(note_term())
        .with_entity_type(CsdlEntityType::new("Host").with_annotation(CsdlAnnotation::new("NS.Note", expr)))];
    let model = EdmModel::new(&schemas).expect("model");

    let root = host_values(&model)[0];
    let inferred = model.infer_expression_type(root).expect("type");
    assert_eq!(inferred.definition.as_primitive(), Some(PrimitiveKind::String));
    assert!(model.errors().is_empty());
    assert_eq!(model.stats().expressions, 64 * 3 + 1);
}

#[test]
fn nested_apply_32_levels_binds_every_call() {
    let mut expr = CsdlExpression::int(1);
    for _ in 0..32 {
        expr = CsdlExpression::apply("NS.Grow", vec![expr]);
    }
    let schemas = [CsdlSchema::new("NS")
        .with_term(note_term())
        .with_operation(CsdlOperation::function("Grow").with_parameter("x", int32()).returning(int32()))
        .with_operation(
            CsdlOperation::function("Grow")
                .with_parameter("x", CsdlTypeReference::primitive(PrimitiveKind::Int64))
                .returning(CsdlTypeReference::primitive(PrimitiveKind::Int64)),
        )
        .with_entity_type(CsdlEntityType::new("Host").with_annotation(CsdlAnnotation::new("NS.Note", expr)))];
    let model = EdmModel::new(&schemas).expect("model");

    let mut current = host_values(&model)[0];
    for depth in 0..32 {
        let operation = model.applied_operation(current).expect("operation");
        assert!(!operation.is_bad(), "call at depth {depth} should bind");
        current = model.expression_children(current)[0];
    }
    let root = host_values(&model)[0];
    assert_eq!(
        model.infer_expression_type(root).and_then(|ty| ty.definition.as_primitive()),
        Some(PrimitiveKind::Int32)
    );
    assert!(model.errors().is_empty());
}
