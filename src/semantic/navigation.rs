//! Property accessors and navigation property resolution.
//!
//! A navigation property's raw type name may be wrapped in
//! `Collection(...)`; the wrapper decides cardinality and the inner name
//! must resolve to an entity type. Partners are resolved either through
//! the explicit `Partner` path or by scanning the target type for the
//! navigation property whose own partner points back here.

use crate::ast::{ConcurrencyMode, OnDeleteAction, Span};
use crate::path::{PathSegmentSyntax, parse_path};
use crate::semantic::error::{Checkable, EdmError, EdmErrorCode, Sentinel};
use crate::semantic::ids::{PropertyId, StructuredTypeId};
use crate::semantic::model::{EdmModel, PropertyAst, PropertyNode};
use crate::semantic::structured::{Property, PropertyKind};
use crate::semantic::types::{TypeDefinition, TypeKind, TypeReference, reentrant_type};
use smol_str::SmolStr;
use std::rc::Rc;
use tracing::debug;

/// One `<ReferentialConstraint>` of a navigation property.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferentialConstraint {
    /// The property on the declaring (dependent) type.
    pub dependent: Property,
    /// The property on the target (principal) type.
    pub principal: Property,
}

impl ReferentialConstraint {
    /// Returns true if either side failed to resolve.
    pub fn is_bad(&self) -> bool {
        self.dependent.is_bad() || self.principal.is_bad()
    }
}

/// Splits `Collection(NS.T)` into `(true, "NS.T")`.
pub(crate) fn split_collection(type_name: &str) -> (bool, &str) {
    match type_name
        .strip_prefix("Collection(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (true, inner.trim()),
        None => (false, type_name),
    }
}

impl<'a> EdmModel<'a> {
    pub(crate) fn property_node(&self, id: PropertyId) -> &PropertyNode<'a> {
        &self.properties[id.as_usize()]
    }

    /// The unqualified name of a property.
    pub fn property_name(&self, id: PropertyId) -> &SmolStr {
        self.property_node(id).ast.name()
    }

    /// Whether a property is structural or navigation.
    pub fn property_kind(&self, id: PropertyId) -> PropertyKind {
        self.property_node(id).ast.kind()
    }

    /// The structured type the property is declared on.
    pub fn declaring_type(&self, id: PropertyId) -> StructuredTypeId {
        self.property_node(id).declaring
    }

    /// Where the property was declared.
    pub fn property_location(&self, id: PropertyId) -> Option<Span> {
        self.property_node(id).ast.location()
    }

    /// The `DefaultValue` text of a structural property, unparsed.
    pub fn default_value(&self, id: PropertyId) -> Option<&SmolStr> {
        match self.property_node(id).ast {
            PropertyAst::Structural(ast) => ast.default_value.as_ref(),
            PropertyAst::Navigation(_) => None,
        }
    }

    /// The `ConcurrencyMode` of a structural property.
    pub fn concurrency_mode(&self, id: PropertyId) -> ConcurrencyMode {
        match self.property_node(id).ast {
            PropertyAst::Structural(ast) => ast.concurrency_mode,
            PropertyAst::Navigation(_) => ConcurrencyMode::None,
        }
    }

    /// Returns true if the navigation property is a containment.
    pub fn contains_target(&self, id: PropertyId) -> bool {
        matches!(self.property_node(id).ast, PropertyAst::Navigation(ast) if ast.contains_target)
    }

    /// The `OnDelete` action of a navigation property.
    pub fn on_delete(&self, id: PropertyId) -> Option<OnDeleteAction> {
        match self.property_node(id).ast {
            PropertyAst::Navigation(ast) => ast.on_delete,
            PropertyAst::Structural(_) => None,
        }
    }

    // ========================================================================
    // Property Types
    // ========================================================================

    /// The resolved type of a structural or navigation property.
    pub fn property_type(&self, id: PropertyId) -> TypeReference {
        let node = self.property_node(id);
        node.type_ref.get_or_compute(
            || self.compute_property_type(id),
            || TypeReference::new(reentrant_type(node.ast.name()), true),
        )
    }

    fn compute_property_type(&self, id: PropertyId) -> TypeReference {
        let ast = match self.property_node(id).ast {
            PropertyAst::Structural(ast) => return self.resolve_type_reference(&ast.type_ref),
            PropertyAst::Navigation(ast) => ast,
        };
        let (is_collection, _) = split_collection(&ast.type_name);
        let target = self
            .navigation_target(id)
            .unwrap_or_else(|| reentrant_type(&ast.type_name));

        if !is_collection {
            let nullable = ast
                .nullable
                .unwrap_or(self.config.nullable_navigation_default);
            return TypeReference::new(target, nullable);
        }
        TypeReference::collection(TypeReference::new(target, false))
    }

    /// Errors in the property declaration itself that leave its type intact.
    ///
    /// A collection-valued navigation property marked nullable keeps its
    /// `Collection(Target)` type and reports the flag here.
    pub fn property_errors(&self, id: PropertyId) -> Vec<EdmError> {
        let PropertyAst::Navigation(ast) = self.property_node(id).ast else {
            return Vec::new();
        };
        let (is_collection, _) = split_collection(&ast.type_name);
        if !is_collection || ast.nullable != Some(true) {
            return Vec::new();
        }
        debug!(property = %ast.name, "nullable collection navigation property");
        vec![EdmError::new(
            ast.location.clone(),
            EdmErrorCode::NavigationPropertyWithCollectionTypeCannotHaveNullableAttribute,
            format!(
                "The navigation property '{}' is a collection and cannot be nullable.",
                ast.name
            ),
        )]
    }

    /// The entity type a navigation property points at, `None` for
    /// structural properties.
    pub fn navigation_target(&self, id: PropertyId) -> Option<TypeDefinition> {
        let node = self.property_node(id);
        let caches = node.navigation.as_ref()?;
        Some(caches.target.get_or_compute(
            || self.compute_navigation_target(id),
            || reentrant_type(node.ast.name()),
        ))
    }

    /// The target entity type when it resolved.
    pub fn navigation_target_entity(&self, id: PropertyId) -> Option<StructuredTypeId> {
        self.navigation_target(id).and_then(|target| target.as_entity())
    }

    fn compute_navigation_target(&self, id: PropertyId) -> TypeDefinition {
        let PropertyAst::Navigation(ast) = self.property_node(id).ast else {
            return reentrant_type(self.property_name(id));
        };
        let (_, inner) = split_collection(&ast.type_name);
        match self.find_type(inner) {
            Some(found @ TypeDefinition::Entity(_)) => found,
            Some(_) => {
                debug!(property = %ast.name, target = inner, "navigation target is not an entity");
                TypeDefinition::Unresolved(
                    TypeKind::Entity,
                    Sentinel::error(
                        inner,
                        ast.location.clone(),
                        EdmErrorCode::InvalidNavigationPropertyType,
                        format!(
                            "The type '{inner}' of navigation property '{}' is not an entity type.",
                            ast.name
                        ),
                    ),
                )
            }
            None => self.find_entity_type(inner, ast.location.clone()),
        }
    }

    // ========================================================================
    // Partners
    // ========================================================================

    /// The navigation property on the target type that points back here.
    ///
    /// An explicit `Partner` that does not resolve yields an unresolved
    /// navigation path; a missing partner yields `None`.
    pub fn partner(&self, id: PropertyId) -> Option<Property> {
        let caches = self.property_node(id).navigation.as_ref()?;
        caches.partner.get_or_default(|| self.compute_partner(id))
    }

    fn compute_partner(&self, id: PropertyId) -> Option<Property> {
        let PropertyAst::Navigation(ast) = self.property_node(id).ast else {
            return None;
        };
        match &ast.partner {
            Some(path) => Some(self.resolve_partner_path(id, path, ast.location.clone())),
            None if self.config.implicit_partners => {
                let target = self.navigation_target_entity(id)?;
                self.find_implicit_partner(id, target)
            }
            None => None,
        }
    }

    fn resolve_partner_path(&self, id: PropertyId, path: &SmolStr, location: Option<Span>) -> Property {
        let unresolved = || {
            debug!(property = %self.property_name(id), partner = %path, "unresolved partner");
            Property::unresolved(
                PropertyKind::Navigation,
                path,
                EdmError::new(
                    location.clone(),
                    EdmErrorCode::BadUnresolvedNavigationPropertyPath,
                    format!(
                        "The partner path '{path}' of navigation property '{}' could not be resolved.",
                        self.property_name(id)
                    ),
                ),
            )
        };

        let Some(mut current) = self.navigation_target_entity(id) else {
            return unresolved();
        };
        let Ok(segments) = parse_path(path) else {
            return unresolved();
        };
        let Some((last, casts)) = segments.split_last() else {
            return unresolved();
        };
        for segment in casts {
            match self.cast_segment(current, segment) {
                Some(cast) => current = cast,
                None => return unresolved(),
            }
        }

        let PathSegmentSyntax::Name(name) = last else {
            return unresolved();
        };
        match self.find_property(current, name) {
            Some(found) if self.property_kind(found) == PropertyKind::Navigation => {
                Property::Declared(found)
            }
            _ => unresolved(),
        }
    }

    fn has_explicit_partner(&self, id: PropertyId) -> bool {
        matches!(self.property_node(id).ast, PropertyAst::Navigation(ast) if ast.partner.is_some())
    }

    /// Applies a qualified segment as a cast to a type derived from `current`.
    pub(crate) fn cast_segment(
        &self,
        current: StructuredTypeId,
        segment: &PathSegmentSyntax,
    ) -> Option<StructuredTypeId> {
        if !segment.is_qualified() {
            return None;
        }
        let cast = self.find_type(segment.text())?.as_structured()?;
        self.is_derived_from(cast, current).then_some(cast)
    }

    /// Scans `target` for a navigation property whose explicit `Partner`
    /// names `id`. Candidates without one are skipped, so the scan never
    /// recurses into another implicit scan.
    fn find_implicit_partner(&self, id: PropertyId, target: StructuredTypeId) -> Option<Property> {
        let mut candidates = self
            .navigation_properties(target)
            .into_iter()
            .filter(|&candidate| candidate != id)
            .filter(|&candidate| self.has_explicit_partner(candidate))
            .filter(|&candidate| {
                self.partner(candidate)
                    .and_then(|partner| partner.as_declared())
                    == Some(id)
            });
        let first = candidates.next()?;
        if candidates.next().is_some() {
            debug!(property = %self.property_name(id), "several implicit partners");
            return None;
        }
        Some(Property::Declared(first))
    }

    // ========================================================================
    // Referential Constraints
    // ========================================================================

    /// Dependent and principal property pairs, in declaration order.
    pub fn referential_constraints(&self, id: PropertyId) -> Rc<[ReferentialConstraint]> {
        match &self.property_node(id).navigation {
            Some(caches) => caches
                .constraints
                .get_or_default(|| self.compute_referential_constraints(id)),
            None => Rc::default(),
        }
    }

    fn compute_referential_constraints(&self, id: PropertyId) -> Rc<[ReferentialConstraint]> {
        let PropertyAst::Navigation(ast) = self.property_node(id).ast else {
            return Rc::default();
        };
        let declaring = self.declaring_type(id);
        let target = self.navigation_target_entity(id);

        ast.referential_constraints
            .iter()
            .map(|constraint| ReferentialConstraint {
                dependent: self.structural_property(
                    Some(declaring),
                    &constraint.property,
                    constraint.location.clone(),
                ),
                principal: self.structural_property(
                    target,
                    &constraint.referenced_property,
                    constraint.location.clone(),
                ),
            })
            .collect()
    }

    /// Looks `name` up as a structural property of `owner`.
    pub(crate) fn structural_property(
        &self,
        owner: Option<StructuredTypeId>,
        name: &SmolStr,
        location: Option<Span>,
    ) -> Property {
        let found = owner.and_then(|ty| self.find_property(ty, name));
        if let Some(property) = found {
            if self.property_kind(property) == PropertyKind::Structural {
                return Property::Declared(property);
            }
        }
        let owner_name = owner
            .map(|ty| self.structured_type_name(ty).clone())
            .unwrap_or_default();
        debug!(property = %name, owner = %owner_name, "unresolved structural property");
        Property::unresolved(
            PropertyKind::Structural,
            name,
            EdmError::new(
                location,
                EdmErrorCode::BadUnresolvedProperty,
                format!("The property '{name}' could not be found on '{owner_name}'."),
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CsdlEntityType, CsdlNavigationProperty, CsdlProperty, CsdlSchema, CsdlTypeReference, PrimitiveKind};
    use crate::semantic::config::ModelConfig;

    fn entity(model: &EdmModel<'_>, name: &str) -> StructuredTypeId {
        model.find_type(name).and_then(|t| t.as_entity()).expect("entity type")
    }

    fn nav(model: &EdmModel<'_>, ty: &str, name: &str) -> PropertyId {
        model.find_property(entity(model, ty), name).expect("navigation property")
    }

    fn int(name: &str) -> CsdlProperty {
        CsdlProperty::new(name, CsdlTypeReference::primitive(PrimitiveKind::Int32))
    }

    fn orders() -> CsdlSchema {
        CsdlSchema::new("NS")
            .with_entity_type(
                CsdlEntityType::new("Customer")
                    .with_key(["Id"])
                    .with_property(int("Id"))
                    .with_navigation(CsdlNavigationProperty::new("Orders", "Collection(NS.Order)")),
            )
            .with_entity_type(
                CsdlEntityType::new("Order")
                    .with_key(["Id"])
                    .with_property(int("Id"))
                    .with_property(int("CustomerId"))
                    .with_navigation(
                        CsdlNavigationProperty::new("Customer", "NS.Customer")
                            .with_partner("Orders")
                            .with_nullable(false)
                            .with_constraint("CustomerId", "Id")
                            .with_constraint("Missing", "Id"),
                    ),
            )
    }

    #[test]
    fn collection_wrapper_is_split() {
        assert_eq!(split_collection("Collection(NS.T)"), (true, "NS.T"));
        assert_eq!(split_collection("NS.T"), (false, "NS.T"));
        assert_eq!(split_collection("Collection(NS.T"), (false, "Collection(NS.T"));
    }

    #[test]
    fn navigation_types_follow_cardinality() {
        let schemas = [orders()];
        let model = EdmModel::new(&schemas).expect("model");

        let many = model.property_type(nav(&model, "NS.Customer", "Orders"));
        assert!(many.is_collection());
        assert!(!many.nullable);
        assert_eq!(many.structured_element(), Some(entity(&model, "NS.Order")));

        let one = model.property_type(nav(&model, "NS.Order", "Customer"));
        assert!(!one.nullable);
        assert_eq!(one.definition.as_entity(), Some(entity(&model, "NS.Customer")));
    }

    #[test]
    fn nullable_collection_keeps_its_target() {
        let schemas = [CsdlSchema::new("NS").with_entity_type(
            CsdlEntityType::new("E")
                .with_navigation(CsdlNavigationProperty::new("Many", "Collection(NS.E)").with_nullable(true))
                .with_navigation(CsdlNavigationProperty::new("One", "NS.E").with_nullable(true)),
        )];
        let model = EdmModel::new(&schemas).expect("model");
        let many = nav(&model, "NS.E", "Many");
        let ty = model.property_type(many);
        assert_eq!(ty.definition.kind(), TypeKind::Collection);
        assert!(!ty.is_bad());
        assert_eq!(ty.structured_element(), Some(entity(&model, "NS.E")));

        let errors = model.property_errors(many);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].code,
            EdmErrorCode::NavigationPropertyWithCollectionTypeCannotHaveNullableAttribute
        );
        assert!(model.property_errors(nav(&model, "NS.E", "One")).is_empty());
    }

    #[test]
    fn single_navigation_uses_configured_default() {
        let schemas = [CsdlSchema::new("NS")
            .with_entity_type(CsdlEntityType::new("E").with_navigation(CsdlNavigationProperty::new("Next", "NS.E")))];
        let config = ModelConfig::default().with_nullable_navigation_default(false);
        let model = EdmModel::with_config(&schemas, config).expect("model");
        assert!(!model.property_type(nav(&model, "NS.E", "Next")).nullable);
    }

    #[test]
    fn non_entity_target_is_invalid() {
        let schemas = [CsdlSchema::new("NS")
            .with_complex_type(crate::ast::CsdlComplexType::new("Address"))
            .with_entity_type(CsdlEntityType::new("E").with_navigation(CsdlNavigationProperty::new("Home", "NS.Address")))
            .with_entity_type(CsdlEntityType::new("F").with_navigation(CsdlNavigationProperty::new("Gone", "NS.Gone")))];
        let model = EdmModel::new(&schemas).expect("model");

        let home = model.navigation_target(nav(&model, "NS.E", "Home")).expect("target");
        assert_eq!(home.errors()[0].code, EdmErrorCode::InvalidNavigationPropertyType);
        let gone = model.navigation_target(nav(&model, "NS.F", "Gone")).expect("target");
        assert_eq!(gone.errors()[0].code, EdmErrorCode::BadUnresolvedEntityType);
    }

    #[test]
    fn partners_are_mutual() {
        let schemas = [orders()];
        let model = EdmModel::new(&schemas).expect("model");
        let orders = nav(&model, "NS.Customer", "Orders");
        let customer = nav(&model, "NS.Order", "Customer");

        assert_eq!(model.partner(orders), Some(Property::Declared(customer)));
        assert_eq!(model.partner(customer), Some(Property::Declared(orders)));
    }

    #[test]
    fn implicit_scan_can_be_disabled() {
        let schemas = [orders()];
        let config = ModelConfig::default().with_implicit_partners(false);
        let model = EdmModel::with_config(&schemas, config).expect("model");
        assert_eq!(model.partner(nav(&model, "NS.Customer", "Orders")), None);
        assert!(model.partner(nav(&model, "NS.Order", "Customer")).is_some());
    }

    #[test]
    fn implicit_partners_need_an_explicit_side() {
        let schemas = [CsdlSchema::new("NS")
            .with_entity_type(CsdlEntityType::new("A").with_navigation(CsdlNavigationProperty::new("ToB", "NS.B")))
            .with_entity_type(CsdlEntityType::new("B").with_navigation(CsdlNavigationProperty::new("ToA", "NS.A")))];
        let model = EdmModel::new(&schemas).expect("model");
        assert_eq!(model.partner(nav(&model, "NS.A", "ToB")), None);
        assert_eq!(model.partner(nav(&model, "NS.B", "ToA")), None);
    }

    #[test]
    fn implicit_scan_does_not_follow_long_rings() {
        const LENGTH: usize = 5000;
        let mut schema = CsdlSchema::new("NS");
        for index in 0..LENGTH {
            schema = schema.with_entity_type(
                CsdlEntityType::new(format!("R{index}"))
                    .with_navigation(CsdlNavigationProperty::new("Next", format!("NS.R{}", (index + 1) % LENGTH))),
            );
        }
        let schemas = [schema];
        let model = EdmModel::new(&schemas).expect("model");
        assert_eq!(model.partner(nav(&model, "NS.R0", "Next")), None);
        assert_eq!(model.stats().cycles_detected, 0);
    }

    #[test]
    fn partner_path_may_cast() {
        let schemas = [CsdlSchema::new("NS")
            .with_entity_type(
                CsdlEntityType::new("Person")
                    .with_navigation(CsdlNavigationProperty::new("Badge", "NS.Badge").with_partner("NS.Employee/Badge")),
            )
            .with_entity_type(CsdlEntityType::new("Badge"))
            .with_entity_type(CsdlEntityType::new("Employee").with_base_type("NS.Badge"))];
        let model = EdmModel::new(&schemas).expect("model");
        let badge = nav(&model, "NS.Person", "Badge");
        let partner = model.partner(badge).expect("partner");
        assert_eq!(partner.errors()[0].code, EdmErrorCode::BadUnresolvedNavigationPropertyPath);

        let schemas = [CsdlSchema::new("NS")
            .with_entity_type(
                CsdlEntityType::new("Badge")
                    .with_navigation(CsdlNavigationProperty::new("Holder", "NS.Person").with_partner("NS.Employee/Badge")),
            )
            .with_entity_type(CsdlEntityType::new("Person"))
            .with_entity_type(
                CsdlEntityType::new("Employee")
                    .with_base_type("NS.Person")
                    .with_navigation(CsdlNavigationProperty::new("Badge", "NS.Badge")),
            )];
        let model = EdmModel::new(&schemas).expect("model");
        let holder = nav(&model, "NS.Badge", "Holder");
        let badge = nav(&model, "NS.Employee", "Badge");
        assert_eq!(model.partner(holder), Some(Property::Declared(badge)));
    }

    #[test]
    fn unknown_partner_name_is_unresolved() {
        let schemas = [CsdlSchema::new("NS").with_entity_type(
            CsdlEntityType::new("E")
                .with_property(int("Id"))
                .with_navigation(CsdlNavigationProperty::new("Self", "NS.E").with_partner("Id")),
        )];
        let model = EdmModel::new(&schemas).expect("model");
        let partner = model.partner(nav(&model, "NS.E", "Self")).expect("partner");
        assert!(partner.is_bad());
    }

    #[test]
    fn constraints_resolve_both_ends() {
        let schemas = [orders()];
        let model = EdmModel::new(&schemas).expect("model");
        let constraints = model.referential_constraints(nav(&model, "NS.Order", "Customer"));
        assert_eq!(constraints.len(), 2);

        let first = &constraints[0];
        assert!(!first.is_bad());
        let dependent = first.dependent.as_declared().expect("dependent");
        assert_eq!(model.property_name(dependent), "CustomerId");
        let principal = first.principal.as_declared().expect("principal");
        assert_eq!(model.declaring_type(principal), entity(&model, "NS.Customer"));

        assert_eq!(constraints[1].dependent.errors()[0].code, EdmErrorCode::BadUnresolvedProperty);
        assert!(Rc::ptr_eq(
            &constraints,
            &model.referential_constraints(nav(&model, "NS.Order", "Customer"))
        ));
    }
}
