//! Annotation Expression Resolution
//!
//! Binding and type inference for the expressions held by vocabulary
//! annotations.
//!
//! Test Categories:
//! - Overload binding through `Apply`
//! - Paths and property references
//! - Constants and type inference
//! - Enumeration members
//! - Labeled elements across annotations

mod common;

use common::{assert_has_code, init_tracing, int32, property, string};
use csdl_semantics::ast::{
    ConstantKind, CsdlAnnotation, CsdlEntityType, CsdlEnumType, CsdlExpression, CsdlNavigationProperty,
    CsdlOperation, CsdlProperty, CsdlPropertyValue, CsdlSchema, CsdlTerm, CsdlTypeReference, PathKind,
    PrimitiveKind,
};
use csdl_semantics::semantic::{
    Checkable, ConstantValue, EdmErrorCode, EdmModel, ElementRef, EnumMemberRef, ExprId, ExpressionKind,
    LabelTarget, OperationRef, ParameterRef, PathSegment, PrimitiveValue, TypeDefinition, TypeReference,
};

/// A schema whose `Item` type carries one `Calc.Note` annotation per
/// expression in `values`, in order.
fn calc_schema(values: Vec<CsdlExpression>) -> CsdlSchema {
    let mut item = CsdlEntityType::new("Item")
        .with_key(["Id"])
        .with_property(CsdlProperty::new("Id", int32().with_nullable(false)))
        .with_property(CsdlProperty::new("Price", CsdlTypeReference::primitive(PrimitiveKind::Decimal)))
        .with_property(CsdlProperty::new("Color", CsdlTypeReference::named("Calc.Color")))
        .with_navigation(CsdlNavigationProperty::new("Category", "Calc.Category"));
    for value in values {
        item = item.with_annotation(CsdlAnnotation::new("Calc.Note", value));
    }

    CsdlSchema::new("Calc")
        .with_entity_type(item)
        .with_entity_type(
            CsdlEntityType::new("Category")
                .with_key(["Name"])
                .with_property(CsdlProperty::new("Name", string().with_nullable(false))),
        )
        .with_enum_type(
            CsdlEnumType::new("Color")
                .as_flags()
                .with_valued_member("Red", 1)
                .with_valued_member("Blue", 2),
        )
        .with_operation(CsdlOperation::function("F").with_parameter("x", int32()).returning(string()))
        .with_operation(CsdlOperation::function("F").with_parameter("x", string()).returning(int32()))
        .with_operation(CsdlOperation::function("G").with_parameter("x", int32()).returning(int32()))
        .with_operation(
            CsdlOperation::function("G")
                .with_parameter("x", CsdlTypeReference::primitive(PrimitiveKind::Int64))
                .returning(CsdlTypeReference::primitive(PrimitiveKind::Int64)),
        )
        .with_term(CsdlTerm::new("Note", CsdlTypeReference::primitive(PrimitiveKind::PrimitiveType)))
}

/// The annotation values on `Calc.Item`, in document order.
fn values(model: &EdmModel<'_>) -> Vec<ExprId> {
    let item = model
        .find_type("Calc.Item")
        .and_then(|ty| ty.as_structured())
        .expect("item type");
    model
        .vocabulary_annotations(ElementRef::StructuredType(item))
        .into_iter()
        .map(|annotation| model.annotation_value(annotation))
        .collect()
}

fn bound_overload_parameter(model: &EdmModel<'_>, expr: ExprId) -> TypeReference {
    let operation = model
        .applied_operation(expr)
        .and_then(|op| op.as_declared())
        .expect("bound overload");
    model.parameter_type(model.operation_parameters(operation)[0])
}

// ===== Overload Binding =====

#[test]
fn castability_picks_the_only_viable_overload() {
    init_tracing();
    let schemas = [calc_schema(vec![
        CsdlExpression::apply("Calc.F", vec![CsdlExpression::int(1)]),
        CsdlExpression::apply("Calc.F", vec![CsdlExpression::string("x")]),
    ])];
    let model = EdmModel::new(&schemas).expect("model");
    let exprs = values(&model);

    assert_eq!(
        bound_overload_parameter(&model, exprs[0]).definition,
        TypeDefinition::Primitive(PrimitiveKind::Int32)
    );
    assert_eq!(
        bound_overload_parameter(&model, exprs[1]).definition,
        TypeDefinition::Primitive(PrimitiveKind::String)
    );
}

#[test]
fn exact_match_breaks_a_widening_tie() {
    let schemas = [calc_schema(vec![
        CsdlExpression::apply("Calc.G", vec![CsdlExpression::int(1)]),
        CsdlExpression::apply("Calc.G", vec![CsdlExpression::int(1 << 40)]),
    ])];
    let model = EdmModel::new(&schemas).expect("model");
    let exprs = values(&model);

    assert_eq!(
        bound_overload_parameter(&model, exprs[0]).definition,
        TypeDefinition::Primitive(PrimitiveKind::Int32)
    );
    assert_eq!(
        bound_overload_parameter(&model, exprs[1]).definition,
        TypeDefinition::Primitive(PrimitiveKind::Int64)
    );
}

#[test]
fn exact_match_looks_inside_collection_arguments() {
    let schemas = [calc_schema(vec![CsdlExpression::apply(
        "Calc.H",
        vec![CsdlExpression::collection(vec![CsdlExpression::int(1)])],
    )])
    .with_operation(
        CsdlOperation::function("H")
            .with_parameter("x", CsdlTypeReference::collection(int32()))
            .returning(int32()),
    )
    .with_operation(
        CsdlOperation::function("H")
            .with_parameter(
                "x",
                CsdlTypeReference::collection(CsdlTypeReference::primitive(PrimitiveKind::Int64)),
            )
            .returning(int32()),
    )];
    let model = EdmModel::new(&schemas).expect("model");
    let call = values(&model)[0];

    // Both overloads accept the argument; element nullability differs
    // from the inferred collection but the element type matches one.
    let parameter = bound_overload_parameter(&model, call);
    assert_eq!(
        parameter.element().map(|element| element.definition.clone()),
        Some(TypeDefinition::Primitive(PrimitiveKind::Int32))
    );
    assert!(model.errors().is_empty(), "{:?}", model.errors());
}

#[test]
fn null_argument_leaves_the_call_ambiguous() {
    let schemas = [calc_schema(vec![CsdlExpression::apply("Calc.F", vec![CsdlExpression::null()])])];
    let model = EdmModel::new(&schemas).expect("model");
    let call = values(&model)[0];

    match model.applied_operation(call).expect("apply") {
        OperationRef::Ambiguous { candidates, sentinel } => {
            assert_eq!(candidates.len(), 2);
            assert_eq!(sentinel.errors()[0].code, EdmErrorCode::BadAmbiguousOperation);
        }
        other => panic!("expected an ambiguous call, got {other:?}"),
    }
    assert_eq!(model.infer_expression_type(call), None);
}

#[test]
fn no_viable_overload_is_unresolved() {
    let schemas = [calc_schema(vec![
        CsdlExpression::apply("Calc.F", vec![CsdlExpression::boolean(true)]),
        CsdlExpression::apply("Calc.Missing", vec![]),
    ])];
    let model = EdmModel::new(&schemas).expect("model");
    let exprs = values(&model);

    for expr in exprs {
        let operation = model.applied_operation(expr).expect("apply");
        assert_has_code(operation.errors(), EdmErrorCode::BadUnresolvedOperation);
    }
}

#[test]
fn apply_infers_the_return_type_and_feeds_outer_calls() {
    let schemas = [calc_schema(vec![CsdlExpression::apply(
        "Calc.F",
        vec![CsdlExpression::apply("Calc.F", vec![CsdlExpression::int(3)])],
    )])];
    let model = EdmModel::new(&schemas).expect("model");
    let outer = values(&model)[0];

    // The inner call returns a string, so the outer call binds F(String).
    assert_eq!(
        bound_overload_parameter(&model, outer).definition,
        TypeDefinition::Primitive(PrimitiveKind::String)
    );
    assert_eq!(
        model.infer_expression_type(outer).map(|ty| ty.definition),
        Some(TypeDefinition::Primitive(PrimitiveKind::Int32))
    );
}

#[test]
fn operation_reference_to_overloads_is_ambiguous() {
    let schemas = [calc_schema(vec![CsdlExpression::operation_reference("Calc.F")])];
    let model = EdmModel::new(&schemas).expect("model");

    let reference = model.referenced_operation(values(&model)[0]).expect("reference");
    assert_has_code(reference.errors(), EdmErrorCode::BadAmbiguousOperation);
}

// ===== Paths =====

#[test]
fn paths_start_at_the_annotated_type() {
    let schemas = [calc_schema(vec![
        CsdlExpression::path(PathKind::Value, "Price"),
        CsdlExpression::path(PathKind::Value, "Category/Name"),
        CsdlExpression::path(PathKind::NavigationProperty, "Category"),
    ])];
    let model = EdmModel::new(&schemas).expect("model");
    let exprs = values(&model);

    let price = model.path_segments(exprs[0]);
    assert_eq!(&*price, &[PathSegment::Property(property(&model, "Calc.Item", "Price"))]);
    assert_eq!(
        model.infer_expression_type(exprs[0]).map(|ty| ty.definition),
        Some(TypeDefinition::Primitive(PrimitiveKind::Decimal))
    );

    let name = model.path_segments(exprs[1]);
    assert_eq!(name.len(), 2);
    assert_eq!(name[1], PathSegment::Property(property(&model, "Calc.Category", "Name")));

    assert!(model.expression_errors(exprs[2]).is_empty());
}

#[test]
fn path_stops_at_the_first_unresolved_segment() {
    let schemas = [calc_schema(vec![
        CsdlExpression::path(PathKind::Value, "Nope/Name"),
        CsdlExpression::path(PathKind::Value, "Calc.Ghost/Price"),
        CsdlExpression::path(PathKind::NavigationProperty, "Price"),
    ])];
    let model = EdmModel::new(&schemas).expect("model");
    let exprs = values(&model);

    let nope = model.path_segments(exprs[0]);
    assert_eq!(nope.len(), 1);
    assert_has_code(nope[0].errors(), EdmErrorCode::BadUnresolvedProperty);
    assert_eq!(model.infer_expression_type(exprs[0]), None);

    assert_has_code(&model.expression_errors(exprs[1]), EdmErrorCode::BadUnresolvedType);
    assert_has_code(
        &model.expression_errors(exprs[2]),
        EdmErrorCode::BadUnresolvedNavigationPropertyPath,
    );
}

#[test]
fn term_segments_switch_to_the_term_type() {
    let schemas = [calc_schema(vec![CsdlExpression::path(PathKind::Annotation, "Category/@Calc.Note")])];
    let model = EdmModel::new(&schemas).expect("model");
    let path = model.path_segments(values(&model)[0]);

    assert_eq!(path.len(), 2);
    let PathSegment::Term { term, qualifier } = &path[1] else {
        panic!("expected a term segment, got {:?}", path[1]);
    };
    assert!(!term.is_bad());
    assert_eq!(qualifier, &None);
}

#[test]
fn property_reference_follows_its_base_expression() {
    let schemas = [calc_schema(vec![
        CsdlExpression::property_reference(
            Some(CsdlExpression::path(PathKind::NavigationProperty, "Category")),
            "Name",
        ),
        CsdlExpression::property_reference(None, "Id"),
        CsdlExpression::property_reference(None, "Ghost"),
    ])];
    let model = EdmModel::new(&schemas).expect("model");
    let exprs = values(&model);

    assert_eq!(
        model.referenced_property(exprs[0]).and_then(|p| p.as_declared()),
        Some(property(&model, "Calc.Category", "Name"))
    );
    assert_eq!(
        model.referenced_property(exprs[1]).and_then(|p| p.as_declared()),
        Some(property(&model, "Calc.Item", "Id"))
    );
    assert_has_code(&model.expression_errors(exprs[2]), EdmErrorCode::BadUnresolvedProperty);
}

#[test]
fn parameter_reference_binds_within_the_annotated_operation() {
    let schemas = [CsdlSchema::new("Calc")
        .with_term(CsdlTerm::new("Note", string()))
        .with_operation(
            CsdlOperation::function("Scale")
                .with_parameter("factor", int32())
                .returning(int32())
                .with_annotation(CsdlAnnotation::new("Calc.Note", CsdlExpression::parameter_reference("factor")))
                .with_annotation(CsdlAnnotation::new("Calc.Note", CsdlExpression::parameter_reference("other"))),
        )];
    let model = EdmModel::new(&schemas).expect("model");
    let operation = model.operations().next().expect("operation");
    let annotations = model.vocabulary_annotations(ElementRef::Operation(operation));

    let found = model.referenced_parameter(model.annotation_value(annotations[0]));
    assert_eq!(found, Some(ParameterRef::Declared(model.operation_parameters(operation)[0])));
    let missing = model
        .referenced_parameter(model.annotation_value(annotations[1]))
        .expect("reference");
    assert_has_code(missing.errors(), EdmErrorCode::BadUnresolvedParameter);
}

// ===== Constants and Inference =====

#[test]
fn constants_parse_and_infer_primitive_types() {
    let schemas = [calc_schema(vec![
        CsdlExpression::int(7),
        CsdlExpression::constant(ConstantKind::Float, "2.5"),
        CsdlExpression::constant(ConstantKind::Guid, "not-a-guid"),
        CsdlExpression::string("hi"),
    ])];
    let model = EdmModel::new(&schemas).expect("model");
    let exprs = values(&model);

    assert_eq!(model.constant_value(exprs[0]), Some(ConstantValue::Value(PrimitiveValue::Int(7))));
    assert_eq!(
        model.infer_expression_type(exprs[0]),
        Some(TypeReference::primitive(PrimitiveKind::Int32, false))
    );
    assert_eq!(
        model.infer_expression_type(exprs[1]),
        Some(TypeReference::primitive(PrimitiveKind::Double, false))
    );

    assert!(model.constant_value(exprs[2]).is_some_and(|value| value.is_bad()));
    assert_has_code(&model.expression_errors(exprs[2]), EdmErrorCode::InvalidLiteral);
    assert_eq!(model.infer_expression_type(exprs[2]), None);
    assert_has_code(&model.errors(), EdmErrorCode::InvalidLiteral);

    assert_eq!(model.expression_kind(exprs[3]), ExpressionKind::Constant(ConstantKind::String));
}

#[test]
fn structural_expressions_infer_through_their_parts() {
    let schemas = [calc_schema(vec![
        CsdlExpression::cast(CsdlTypeReference::primitive(PrimitiveKind::Int64), CsdlExpression::int(1)),
        CsdlExpression::is_type(string(), CsdlExpression::int(1)),
        CsdlExpression::if_else(
            CsdlExpression::boolean(true),
            CsdlExpression::string("yes"),
            CsdlExpression::string("no"),
        ),
        CsdlExpression::collection(vec![CsdlExpression::int(1), CsdlExpression::int(2)]),
        CsdlExpression::record(
            Some("Calc.Category"),
            vec![CsdlPropertyValue::new("Name", CsdlExpression::string("Tools"))],
        ),
        CsdlExpression::record(Some("Calc.Nowhere"), vec![]),
    ])];
    let model = EdmModel::new(&schemas).expect("model");
    let exprs = values(&model);
    let kind_of = |expr: ExprId| model.infer_expression_type(expr).map(|ty| ty.definition);

    assert_eq!(kind_of(exprs[0]), Some(TypeDefinition::Primitive(PrimitiveKind::Int64)));
    assert_eq!(kind_of(exprs[1]), Some(TypeDefinition::Primitive(PrimitiveKind::Boolean)));
    assert_eq!(kind_of(exprs[2]), Some(TypeDefinition::Primitive(PrimitiveKind::String)));

    let collection = model.infer_expression_type(exprs[3]).expect("collection");
    assert_eq!(
        collection.element().map(|e| e.definition.clone()),
        Some(TypeDefinition::Primitive(PrimitiveKind::Int32))
    );

    let record = model.infer_expression_type(exprs[4]).expect("record");
    assert_eq!(record.structured_element(), model.find_type("Calc.Category").and_then(|t| t.as_structured()));
    let fields = model.record_fields(exprs[4]);
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].0, "Name");

    assert_has_code(&model.expression_errors(exprs[5]), EdmErrorCode::BadUnresolvedComplexType);
}

// ===== Enumeration Members =====

#[test]
fn enum_member_lists_resolve_each_member() {
    let schemas = [calc_schema(vec![
        CsdlExpression::enum_member("Calc.Color/Red Calc.Color/Blue"),
        CsdlExpression::enum_member("Calc.Color/Purple"),
    ])];
    let model = EdmModel::new(&schemas).expect("model");
    let exprs = values(&model);

    let members = model.enum_member_references(exprs[0]);
    assert_eq!(members.len(), 2);
    assert!(members.iter().all(|m| matches!(m, EnumMemberRef::Declared(_))));
    assert!(matches!(
        model.infer_expression_type(exprs[0]).map(|ty| ty.definition),
        Some(TypeDefinition::Enum(_))
    ));

    assert_has_code(&model.expression_errors(exprs[1]), EdmErrorCode::BadUnresolvedEnumMember);
}

// ===== Labeled Elements =====

#[test]
fn labels_are_shared_across_elements_of_one_schema() {
    let schemas = [calc_schema(vec![CsdlExpression::labeled("Base", CsdlExpression::int(10))])
        .with_entity_type(CsdlEntityType::new("Other").with_annotation(CsdlAnnotation::new(
            "Calc.Note",
            CsdlExpression::apply("Calc.G", vec![CsdlExpression::labeled_reference("Base")]),
        )))];
    let model = EdmModel::new(&schemas).expect("model");
    let label = values(&model)[0];
    let other = model
        .find_type("Calc.Other")
        .and_then(|ty| ty.as_structured())
        .expect("other");
    let call = model.annotation_value(model.vocabulary_annotations(ElementRef::StructuredType(other))[0]);
    let reference = model.expression_children(call)[0];

    assert_eq!(model.label_target(reference), Some(LabelTarget::Declared(label)));
    assert_eq!(
        bound_overload_parameter(&model, call).definition,
        TypeDefinition::Primitive(PrimitiveKind::Int32)
    );
}

#[test]
fn labels_do_not_cross_schemas() {
    let schemas = [
        calc_schema(vec![CsdlExpression::labeled("Shared", CsdlExpression::int(1))]),
        CsdlSchema::new("Elsewhere").with_entity_type(
            CsdlEntityType::new("T")
                .with_annotation(CsdlAnnotation::new("Calc.Note", CsdlExpression::labeled_reference("Shared"))),
        ),
    ];
    let model = EdmModel::new(&schemas).expect("model");

    assert_has_code(&model.errors(), EdmErrorCode::BadUnresolvedLabeledElement);
}

#[test]
fn labeled_element_keeps_one_identity() {
    let schemas = [calc_schema(vec![
        CsdlExpression::labeled("Twice", CsdlExpression::int(2)),
        CsdlExpression::labeled_reference("Twice"),
        CsdlExpression::labeled_reference("Twice"),
    ])];
    let model = EdmModel::new(&schemas).expect("model");
    let exprs = values(&model);

    let first = model.label_target(exprs[1]).and_then(|t| t.element());
    let second = model.label_target(exprs[2]).and_then(|t| t.element());
    assert_eq!(first, Some(exprs[0]));
    assert_eq!(first, second);
    let item = model
        .find_type("Calc.Item")
        .and_then(|ty| ty.as_structured())
        .expect("item");
    let schema = model.element_schema(ElementRef::StructuredType(item));
    assert_eq!(model.find_labeled_elements(schema, "Twice"), vec![exprs[0]]);
}
