//! Common test utilities
//!
//! Shared fixtures and assertion helpers for the integration suites.
//!
//! # Fixtures
//! - [`sales_schema`] - a small, fully valid order-management schema
//! - [`vocabulary_schema`] - terms used by annotation tests
//!
//! # Helpers
//! - [`init_tracing`] - route `tracing` output to the test harness
//! - [`entity`] / [`property`] - look up declarations by name, panicking if absent
//! - [`assert_no_errors`] / [`assert_has_code`] - diagnostic assertions

#![allow(dead_code)]

use csdl_semantics::ast::{
    CsdlComplexType, CsdlEntityContainer, CsdlEntitySet, CsdlEntityType, CsdlEnumType,
    CsdlNavigationProperty, CsdlOperation, CsdlOperationImport, CsdlProperty, CsdlSchema,
    CsdlSingleton, CsdlTerm, CsdlTypeDefinition, CsdlTypeReference, PrimitiveKind,
};
use csdl_semantics::semantic::{
    ContainerId, EdmError, EdmErrorCode, EdmModel, NavigationSourceId, PropertyId, StructuredTypeId,
};

// ============================================================================
// Tracing
// ============================================================================

/// Installs a fmt subscriber writing through the test harness.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn int32() -> CsdlTypeReference {
    CsdlTypeReference::primitive(PrimitiveKind::Int32)
}

pub fn string() -> CsdlTypeReference {
    CsdlTypeReference::primitive(PrimitiveKind::String)
}

/// An order-management schema without a single diagnostic.
pub fn sales_schema() -> CsdlSchema {
    CsdlSchema::new("Sales")
        .with_alias("S")
        .with_entity_type(
            CsdlEntityType::new("Customer")
                .with_key(["Id"])
                .with_property(CsdlProperty::new("Id", int32().with_nullable(false)))
                .with_property(CsdlProperty::new("Name", string()))
                .with_property(CsdlProperty::new("Address", CsdlTypeReference::named("Sales.Address")))
                .with_navigation(
                    CsdlNavigationProperty::new("Orders", "Collection(Sales.Order)").with_partner("Customer"),
                ),
        )
        .with_entity_type(
            CsdlEntityType::new("Order")
                .with_key(["Id"])
                .with_property(CsdlProperty::new("Id", int32().with_nullable(false)))
                .with_property(CsdlProperty::new("CustomerId", int32()))
                .with_property(CsdlProperty::new("Total", CsdlTypeReference::named("S.Money")))
                .with_property(CsdlProperty::new("Status", CsdlTypeReference::named("Sales.Status")))
                .with_navigation(
                    CsdlNavigationProperty::new("Customer", "Sales.Customer")
                        .with_nullable(false)
                        .with_constraint("CustomerId", "Id"),
                )
                .with_navigation(CsdlNavigationProperty::new("Lines", "Collection(Sales.OrderLine)").containing()),
        )
        .with_entity_type(
            CsdlEntityType::new("SpecialOrder")
                .with_base_type("Sales.Order")
                .with_property(CsdlProperty::new("Discount", CsdlTypeReference::primitive(PrimitiveKind::Decimal))),
        )
        .with_entity_type(
            CsdlEntityType::new("OrderLine")
                .with_key(["LineNo"])
                .with_property(CsdlProperty::new("LineNo", int32().with_nullable(false)))
                .with_property(CsdlProperty::new("Quantity", int32()))
                .with_navigation(CsdlNavigationProperty::new("Product", "Sales.Product")),
        )
        .with_entity_type(
            CsdlEntityType::new("Product")
                .with_key(["Id"])
                .with_property(CsdlProperty::new("Id", int32().with_nullable(false)))
                .with_property(CsdlProperty::new("Name", string())),
        )
        .with_complex_type(
            CsdlComplexType::new("Address")
                .with_property(CsdlProperty::new("Street", string()))
                .with_property(CsdlProperty::new("City", string())),
        )
        .with_enum_type(
            CsdlEnumType::new("Status")
                .with_member("Open")
                .with_valued_member("Closed", 5)
                .with_member("Archived"),
        )
        .with_type_definition(CsdlTypeDefinition::new("Money", "Edm.Decimal"))
        .with_operation(
            CsdlOperation::function("Describe")
                .with_parameter("value", int32())
                .returning(string()),
        )
        .with_operation(
            CsdlOperation::function("Describe")
                .with_parameter("value", string())
                .returning(string()),
        )
        .with_operation(
            CsdlOperation::function("TopLines")
                .bound()
                .with_parameter("order", CsdlTypeReference::named("Sales.Order"))
                .with_entity_set_path("order/Lines")
                .returning(CsdlTypeReference::collection(CsdlTypeReference::named("Sales.OrderLine"))),
        )
        .with_term(CsdlTerm::new("Label", string()))
        .with_container(
            CsdlEntityContainer::new("Default")
                .with_entity_set(CsdlEntitySet::new("Customers", "Sales.Customer").with_binding("Orders", "Orders"))
                .with_entity_set(
                    CsdlEntitySet::new("Orders", "Sales.Order")
                        .with_binding("Customer", "Customers")
                        .with_binding("Lines/Product", "Products"),
                )
                .with_entity_set(CsdlEntitySet::new("Products", "Sales.Product"))
                .with_singleton(CsdlSingleton::new("Me", "Sales.Customer").with_binding("Orders", "Orders"))
                .with_import(CsdlOperationImport::function("DescribeAll", "Sales.Describe")),
        )
}

/// Terms referenced by annotation tests.
pub fn vocabulary_schema() -> CsdlSchema {
    CsdlSchema::new("Org.Core")
        .with_alias("Core")
        .with_term(CsdlTerm::new("Description", string()))
        .with_term(CsdlTerm::new("Computed", CsdlTypeReference::primitive(PrimitiveKind::Boolean)))
        .with_term(CsdlTerm::new("Rank", int32()))
}

// ============================================================================
// Lookups
// ============================================================================

pub fn entity(model: &EdmModel<'_>, name: &str) -> StructuredTypeId {
    model
        .find_type(name)
        .and_then(|ty| ty.as_structured())
        .unwrap_or_else(|| panic!("no structured type named {name}"))
}

pub fn property(model: &EdmModel<'_>, ty: &str, name: &str) -> PropertyId {
    let owner = entity(model, ty);
    model
        .find_property(owner, name)
        .unwrap_or_else(|| panic!("no property {name} on {ty}"))
}

pub fn container(model: &EdmModel<'_>, name: &str) -> ContainerId {
    model
        .find_container(name)
        .unwrap_or_else(|| panic!("no container named {name}"))
}

pub fn entity_set(model: &EdmModel<'_>, container_name: &str, name: &str) -> NavigationSourceId {
    let container = container(model, container_name);
    model
        .find_navigation_source(container, name)
        .unwrap_or_else(|| panic!("no navigation source {name} in {container_name}"))
}

// ============================================================================
// Diagnostic Assertions
// ============================================================================

/// Formats errors for assertion messages.
pub fn format_errors(errors: &[EdmError]) -> String {
    errors
        .iter()
        .map(|error| format!("{error} @ {:?}", error.location))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Asserts that the whole model is free of diagnostics.
pub fn assert_no_errors(model: &EdmModel<'_>) {
    let errors = model.errors();
    assert!(errors.is_empty(), "expected no errors, got:\n{}", format_errors(&errors));
}

/// Asserts that `errors` contains at least one error with `code`.
pub fn assert_has_code(errors: &[EdmError], code: EdmErrorCode) {
    assert!(
        errors.iter().any(|error| error.code == code),
        "expected {code:?}, got:\n{}",
        format_errors(errors)
    );
}
