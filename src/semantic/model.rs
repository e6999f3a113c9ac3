//! The model arena.
//!
//! [`EdmModel`] borrows the parsed schemas and allocates one node per
//! declared element up front. Every derived fact (base types, property
//! tables, partners, bindings, ...) lives in a [`Cache`] embedded in the
//! node it belongs to and is computed on first read. Expressions,
//! annotations and derived navigation sources are only allocated when a
//! caller reaches them.

use crate::ast::{
    CsdlAnnotationSet, CsdlComplexType, CsdlEntityContainer, CsdlEntitySet, CsdlEntityType,
    CsdlEnumMember, CsdlEnumType, CsdlMember, CsdlNavigationProperty, CsdlNavigationPropertyBinding,
    CsdlOperation, CsdlOperationImport, CsdlParameter, CsdlProperty, CsdlSchema, CsdlSingleton,
    CsdlTerm, CsdlTypeDefinition, Span,
};
use crate::semantic::annotation::{AnnotationNode, AnnotationSlot, OutOfLineIndex, TermRef};
use crate::semantic::cache::Cache;
use crate::semantic::config::{ModelConfig, ModelStats, StatsCounters};
use crate::semantic::container::{
    ContainerRef, DerivedSourceNode, ImportTarget, NavigationPropertyBinding, SourceKey,
};
use crate::semantic::enums::EnumMemberValue;
use crate::semantic::error::ModelError;
use crate::semantic::expression::ExprNode;
use crate::semantic::ids::*;
use crate::semantic::label::LabelTable;
use crate::semantic::names::{NameIndex, qualified};
use crate::semantic::navigation::ReferentialConstraint;
use crate::semantic::operation::{EntitySetPath, OperationRef};
use crate::semantic::structured::{Property, PropertyKind, PropertyTable};
use crate::semantic::types::{TypeDefinition, TypeKind, TypeReference};
use smol_str::SmolStr;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

// ============================================================================
// Nodes
// ============================================================================

pub(crate) struct SchemaNode<'a> {
    pub(crate) ast: &'a CsdlSchema,
    pub(crate) annotations: AnnotationSlot<'a>,
    /// Elements of this schema carrying inline annotations, in declaration order.
    pub(crate) annotated: Vec<ElementRef>,
    pub(crate) labels: Cache<Rc<LabelTable>>,
}

#[derive(Clone, Copy)]
pub(crate) enum StructuredAst<'a> {
    Entity(&'a CsdlEntityType),
    Complex(&'a CsdlComplexType),
}

impl<'a> StructuredAst<'a> {
    pub(crate) fn name(self) -> &'a SmolStr {
        match self {
            Self::Entity(ast) => &ast.name,
            Self::Complex(ast) => &ast.name,
        }
    }

    pub(crate) fn base_type(self) -> Option<&'a SmolStr> {
        match self {
            Self::Entity(ast) => ast.base_type.as_ref(),
            Self::Complex(ast) => ast.base_type.as_ref(),
        }
    }

    pub(crate) fn members(self) -> &'a [CsdlMember] {
        match self {
            Self::Entity(ast) => &ast.members,
            Self::Complex(ast) => &ast.members,
        }
    }

    pub(crate) fn annotations(self) -> &'a CsdlAnnotationSet {
        match self {
            Self::Entity(ast) => &ast.annotations,
            Self::Complex(ast) => &ast.annotations,
        }
    }

    pub(crate) fn location(self) -> Option<Span> {
        match self {
            Self::Entity(ast) => ast.location.clone(),
            Self::Complex(ast) => ast.location.clone(),
        }
    }

    pub(crate) fn kind(self) -> TypeKind {
        match self {
            Self::Entity(_) => TypeKind::Entity,
            Self::Complex(_) => TypeKind::Complex,
        }
    }
}

pub(crate) struct StructuredTypeNode<'a> {
    pub(crate) schema: SchemaId,
    pub(crate) ast: StructuredAst<'a>,
    pub(crate) qualified_name: SmolStr,
    pub(crate) declared: Vec<PropertyId>,
    pub(crate) base_type: Cache<Option<TypeDefinition>>,
    pub(crate) properties: Cache<Rc<PropertyTable>>,
    pub(crate) declared_key: Cache<Option<Rc<[Property]>>>,
    pub(crate) annotations: AnnotationSlot<'a>,
}

#[derive(Clone, Copy)]
pub(crate) enum PropertyAst<'a> {
    Structural(&'a CsdlProperty),
    Navigation(&'a CsdlNavigationProperty),
}

impl<'a> PropertyAst<'a> {
    pub(crate) fn name(self) -> &'a SmolStr {
        match self {
            Self::Structural(ast) => &ast.name,
            Self::Navigation(ast) => &ast.name,
        }
    }

    pub(crate) fn location(self) -> Option<Span> {
        match self {
            Self::Structural(ast) => ast.location.clone(),
            Self::Navigation(ast) => ast.location.clone(),
        }
    }

    pub(crate) fn kind(self) -> PropertyKind {
        match self {
            Self::Structural(_) => PropertyKind::Structural,
            Self::Navigation(_) => PropertyKind::Navigation,
        }
    }
}

#[derive(Default)]
pub(crate) struct NavigationCaches {
    pub(crate) target: Cache<TypeDefinition>,
    pub(crate) partner: Cache<Option<Property>>,
    pub(crate) constraints: Cache<Rc<[ReferentialConstraint]>>,
}

pub(crate) struct PropertyNode<'a> {
    pub(crate) declaring: StructuredTypeId,
    pub(crate) ast: PropertyAst<'a>,
    pub(crate) type_ref: Cache<TypeReference>,
    pub(crate) navigation: Option<NavigationCaches>,
    pub(crate) annotations: AnnotationSlot<'a>,
}

pub(crate) struct EnumTypeNode<'a> {
    pub(crate) schema: SchemaId,
    pub(crate) ast: &'a CsdlEnumType,
    pub(crate) qualified_name: SmolStr,
    pub(crate) members: Vec<EnumMemberId>,
    pub(crate) underlying: Cache<TypeDefinition>,
    pub(crate) annotations: AnnotationSlot<'a>,
}

pub(crate) struct EnumMemberNode<'a> {
    pub(crate) enum_type: EnumTypeId,
    pub(crate) position: usize,
    pub(crate) ast: &'a CsdlEnumMember,
    pub(crate) value: Cache<EnumMemberValue>,
    pub(crate) annotations: AnnotationSlot<'a>,
}

pub(crate) struct TypeDefinitionNode<'a> {
    pub(crate) schema: SchemaId,
    pub(crate) ast: &'a CsdlTypeDefinition,
    pub(crate) qualified_name: SmolStr,
    pub(crate) underlying: Cache<TypeDefinition>,
    pub(crate) annotations: AnnotationSlot<'a>,
}

pub(crate) struct OperationNode<'a> {
    pub(crate) schema: SchemaId,
    pub(crate) ast: &'a CsdlOperation,
    pub(crate) qualified_name: SmolStr,
    pub(crate) parameters: Vec<ParameterId>,
    pub(crate) return_type: Cache<Option<TypeReference>>,
    pub(crate) entity_set_path: Cache<Option<Rc<EntitySetPath>>>,
    pub(crate) annotations: AnnotationSlot<'a>,
    pub(crate) return_annotations: AnnotationSlot<'a>,
}

pub(crate) struct ParameterNode<'a> {
    pub(crate) operation: OperationId,
    pub(crate) ast: &'a CsdlParameter,
    pub(crate) type_ref: Cache<TypeReference>,
    pub(crate) annotations: AnnotationSlot<'a>,
}

pub(crate) struct TermNode<'a> {
    pub(crate) schema: SchemaId,
    pub(crate) ast: &'a CsdlTerm,
    pub(crate) qualified_name: SmolStr,
    pub(crate) type_ref: Cache<TypeReference>,
    pub(crate) base_term: Cache<Option<TermRef>>,
    pub(crate) annotations: AnnotationSlot<'a>,
}

pub(crate) struct ContainerNode<'a> {
    pub(crate) schema: SchemaId,
    pub(crate) ast: &'a CsdlEntityContainer,
    pub(crate) qualified_name: SmolStr,
    pub(crate) sources: Vec<NavigationSourceId>,
    pub(crate) imports: Vec<OperationImportId>,
    pub(crate) extends: Cache<Option<ContainerRef>>,
    pub(crate) annotations: AnnotationSlot<'a>,
}

#[derive(Clone, Copy)]
pub(crate) enum SourceAst<'a> {
    EntitySet(&'a CsdlEntitySet),
    Singleton(&'a CsdlSingleton),
}

impl<'a> SourceAst<'a> {
    pub(crate) fn name(self) -> &'a SmolStr {
        match self {
            Self::EntitySet(ast) => &ast.name,
            Self::Singleton(ast) => &ast.name,
        }
    }

    pub(crate) fn type_name(self) -> &'a SmolStr {
        match self {
            Self::EntitySet(ast) => &ast.entity_type,
            Self::Singleton(ast) => &ast.type_name,
        }
    }

    pub(crate) fn bindings(self) -> &'a [CsdlNavigationPropertyBinding] {
        match self {
            Self::EntitySet(ast) => &ast.bindings,
            Self::Singleton(ast) => &ast.bindings,
        }
    }

    pub(crate) fn location(self) -> Option<Span> {
        match self {
            Self::EntitySet(ast) => ast.location.clone(),
            Self::Singleton(ast) => ast.location.clone(),
        }
    }
}

pub(crate) struct NavigationSourceNode<'a> {
    pub(crate) container: ContainerId,
    pub(crate) ast: SourceAst<'a>,
    pub(crate) entity_type: Cache<TypeDefinition>,
    pub(crate) bindings: Cache<Rc<[NavigationPropertyBinding]>>,
    pub(crate) annotations: AnnotationSlot<'a>,
}

pub(crate) struct OperationImportNode<'a> {
    pub(crate) container: ContainerId,
    pub(crate) ast: &'a CsdlOperationImport,
    pub(crate) operation: Cache<OperationRef>,
    pub(crate) entity_set: Cache<Option<ImportTarget>>,
    pub(crate) annotations: AnnotationSlot<'a>,
}

// ============================================================================
// Model
// ============================================================================

/// The semantic graph over a set of parsed schemas.
///
/// Reads are memoized and never fail: anything that does not resolve comes
/// back as a sentinel value (see [`Checkable`](super::Checkable)). The
/// model is single-threaded; force it with [`EdmModel::errors`] before
/// handing results elsewhere.
pub struct EdmModel<'a> {
    pub(crate) config: ModelConfig,
    pub(crate) names: NameIndex,
    pub(crate) schemas: Vec<SchemaNode<'a>>,
    pub(crate) structured: Vec<StructuredTypeNode<'a>>,
    pub(crate) properties: Vec<PropertyNode<'a>>,
    pub(crate) enums: Vec<EnumTypeNode<'a>>,
    pub(crate) enum_members: Vec<EnumMemberNode<'a>>,
    pub(crate) type_definitions: Vec<TypeDefinitionNode<'a>>,
    pub(crate) operations: Vec<OperationNode<'a>>,
    pub(crate) parameters: Vec<ParameterNode<'a>>,
    pub(crate) terms: Vec<TermNode<'a>>,
    pub(crate) containers: Vec<ContainerNode<'a>>,
    pub(crate) sources: Vec<NavigationSourceNode<'a>>,
    pub(crate) imports: Vec<OperationImportNode<'a>>,

    pub(crate) exprs: RefCell<Vec<Rc<ExprNode<'a>>>>,
    /// Labeled elements already wrapped, keyed by schema and syntax node address.
    pub(crate) labeled: RefCell<HashMap<(SchemaId, usize), ExprId>>,
    pub(crate) annotation_nodes: RefCell<Vec<Rc<AnnotationNode<'a>>>>,
    pub(crate) derived: RefCell<Vec<Rc<DerivedSourceNode>>>,
    pub(crate) derived_index: RefCell<HashMap<(SourceKey, PropertyId), DerivedSourceId>>,
    pub(crate) out_of_line: Cache<Rc<OutOfLineIndex>>,

    pub(crate) counters: StatsCounters,
}

impl<'a> EdmModel<'a> {
    /// Builds a model over `schemas` with the default configuration.
    pub fn new(schemas: &'a [CsdlSchema]) -> Result<Self, ModelError> {
        Self::with_config(schemas, ModelConfig::default())
    }

    /// Builds a model over `schemas`.
    ///
    /// Only the name index is computed here; everything else is resolved
    /// on demand.
    pub fn with_config(schemas: &'a [CsdlSchema], config: ModelConfig) -> Result<Self, ModelError> {
        let mut model = Self {
            config,
            names: NameIndex::default(),
            schemas: Vec::with_capacity(schemas.len()),
            structured: Vec::new(),
            properties: Vec::new(),
            enums: Vec::new(),
            enum_members: Vec::new(),
            type_definitions: Vec::new(),
            operations: Vec::new(),
            parameters: Vec::new(),
            terms: Vec::new(),
            containers: Vec::new(),
            sources: Vec::new(),
            imports: Vec::new(),
            exprs: RefCell::new(Vec::new()),
            labeled: RefCell::new(HashMap::new()),
            annotation_nodes: RefCell::new(Vec::new()),
            derived: RefCell::new(Vec::new()),
            derived_index: RefCell::new(HashMap::new()),
            out_of_line: Cache::new(),
            counters: StatsCounters::default(),
        };

        for (position, schema) in schemas.iter().enumerate() {
            if schema.namespace.trim().is_empty() {
                return Err(ModelError::EmptyNamespace { position });
            }
            model.add_schema(schema);
        }

        debug!(
            schemas = model.schemas.len(),
            types = model.structured.len(),
            operations = model.operations.len(),
            name_errors = model.names.errors.len(),
            "built model"
        );
        Ok(model)
    }

    /// The options the model was built with.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// A snapshot of what has been materialized so far.
    pub fn stats(&self) -> ModelStats {
        ModelStats {
            annotation_caches: self.counters.annotation_caches.get(),
            cycles_detected: self.counters.cycles_detected.get(),
            expressions: self.exprs.borrow().len(),
            derived_sources: self.derived.borrow().len(),
        }
    }

    // ========================================================================
    // Construction
    // ========================================================================

    fn slot(&self, set: &'a CsdlAnnotationSet) -> AnnotationSlot<'a> {
        AnnotationSlot::new(set, &self.counters)
    }

    fn add_schema(&mut self, ast: &'a CsdlSchema) {
        let schema = SchemaId::new(self.schemas.len());
        let mut annotated = Vec::new();
        note(&mut annotated, ElementRef::Schema(schema), &ast.annotations);

        if let Some(alias) = &ast.alias {
            self.names.declare_alias(alias, &ast.namespace, ast.location.clone());
        }
        for entity in &ast.entity_types {
            self.add_structured(schema, &ast.namespace, StructuredAst::Entity(entity), &mut annotated);
        }
        for complex in &ast.complex_types {
            self.add_structured(schema, &ast.namespace, StructuredAst::Complex(complex), &mut annotated);
        }
        for enum_type in &ast.enum_types {
            self.add_enum(schema, &ast.namespace, enum_type, &mut annotated);
        }
        for definition in &ast.type_definitions {
            let id = TypeDefinitionId::new(self.type_definitions.len());
            let name = qualified(&ast.namespace, &definition.name);
            self.names
                .declare_type(&name, TypeDefinition::Alias(id), definition.location.clone());
            note(&mut annotated, ElementRef::TypeDefinition(id), &definition.annotations);
            self.type_definitions.push(TypeDefinitionNode {
                schema,
                ast: definition,
                qualified_name: name,
                underlying: Cache::new(),
                annotations: self.slot(&definition.annotations),
            });
        }
        for operation in &ast.operations {
            self.add_operation(schema, &ast.namespace, operation, &mut annotated);
        }
        for term in &ast.terms {
            let id = TermId::new(self.terms.len());
            let name = qualified(&ast.namespace, &term.name);
            self.names.declare_term(&name, id, term.location.clone());
            note(&mut annotated, ElementRef::Term(id), &term.annotations);
            self.terms.push(TermNode {
                schema,
                ast: term,
                qualified_name: name,
                type_ref: Cache::new(),
                base_term: Cache::new(),
                annotations: self.slot(&term.annotations),
            });
        }
        for container in &ast.entity_containers {
            self.add_container(schema, &ast.namespace, container, &mut annotated);
        }

        let annotations = self.slot(&ast.annotations);
        self.schemas.push(SchemaNode {
            ast,
            annotations,
            annotated,
            labels: Cache::new(),
        });
    }

    fn add_structured(
        &mut self,
        schema: SchemaId,
        namespace: &str,
        ast: StructuredAst<'a>,
        annotated: &mut Vec<ElementRef>,
    ) {
        let id = StructuredTypeId::new(self.structured.len());
        let name = qualified(namespace, ast.name());
        let definition = match ast {
            StructuredAst::Entity(_) => TypeDefinition::Entity(id),
            StructuredAst::Complex(_) => TypeDefinition::Complex(id),
        };
        self.names.declare_type(&name, definition, ast.location());
        note(annotated, ElementRef::StructuredType(id), ast.annotations());

        let mut declared = Vec::with_capacity(ast.members().len());
        for member in ast.members() {
            let property = PropertyId::new(self.properties.len());
            let (property_ast, set, navigation) = match member {
                CsdlMember::Property(p) => (PropertyAst::Structural(p), &p.annotations, None),
                CsdlMember::Navigation(n) => (
                    PropertyAst::Navigation(n),
                    &n.annotations,
                    Some(NavigationCaches::default()),
                ),
            };
            note(annotated, ElementRef::Property(property), set);
            let annotations = self.slot(set);
            self.properties.push(PropertyNode {
                declaring: id,
                ast: property_ast,
                type_ref: Cache::new(),
                navigation,
                annotations,
            });
            declared.push(property);
        }

        let annotations = self.slot(ast.annotations());
        self.structured.push(StructuredTypeNode {
            schema,
            ast,
            qualified_name: name,
            declared,
            base_type: Cache::new(),
            properties: Cache::new(),
            declared_key: Cache::new(),
            annotations,
        });
    }

    fn add_enum(
        &mut self,
        schema: SchemaId,
        namespace: &str,
        ast: &'a CsdlEnumType,
        annotated: &mut Vec<ElementRef>,
    ) {
        let id = EnumTypeId::new(self.enums.len());
        let name = qualified(namespace, &ast.name);
        self.names
            .declare_type(&name, TypeDefinition::Enum(id), ast.location.clone());
        note(annotated, ElementRef::EnumType(id), &ast.annotations);

        let mut members = Vec::with_capacity(ast.members.len());
        for (position, member) in ast.members.iter().enumerate() {
            let member_id = EnumMemberId::new(self.enum_members.len());
            note(annotated, ElementRef::EnumMember(member_id), &member.annotations);
            let annotations = self.slot(&member.annotations);
            self.enum_members.push(EnumMemberNode {
                enum_type: id,
                position,
                ast: member,
                value: Cache::new(),
                annotations,
            });
            members.push(member_id);
        }

        let annotations = self.slot(&ast.annotations);
        self.enums.push(EnumTypeNode {
            schema,
            ast,
            qualified_name: name,
            members,
            underlying: Cache::new(),
            annotations,
        });
    }

    fn add_operation(
        &mut self,
        schema: SchemaId,
        namespace: &str,
        ast: &'a CsdlOperation,
        annotated: &mut Vec<ElementRef>,
    ) {
        let id = OperationId::new(self.operations.len());
        let name = qualified(namespace, &ast.name);
        self.names.declare_operation(&name, id);
        note(annotated, ElementRef::Operation(id), &ast.annotations);

        let mut parameters = Vec::with_capacity(ast.parameters.len());
        for parameter in &ast.parameters {
            let parameter_id = ParameterId::new(self.parameters.len());
            note(annotated, ElementRef::Parameter(parameter_id), &parameter.annotations);
            let annotations = self.slot(&parameter.annotations);
            self.parameters.push(ParameterNode {
                operation: id,
                ast: parameter,
                type_ref: Cache::new(),
                annotations,
            });
            parameters.push(parameter_id);
        }

        let return_annotations = match &ast.return_type {
            Some(returns) => {
                note(annotated, ElementRef::ReturnType(id), &returns.annotations);
                self.slot(&returns.annotations)
            }
            None => AnnotationSlot::empty(),
        };
        let annotations = self.slot(&ast.annotations);
        self.operations.push(OperationNode {
            schema,
            ast,
            qualified_name: name,
            parameters,
            return_type: Cache::new(),
            entity_set_path: Cache::new(),
            annotations,
            return_annotations,
        });
    }

    fn add_container(
        &mut self,
        schema: SchemaId,
        namespace: &str,
        ast: &'a CsdlEntityContainer,
        annotated: &mut Vec<ElementRef>,
    ) {
        let id = ContainerId::new(self.containers.len());
        let name = qualified(namespace, &ast.name);
        self.names.declare_container(&name, id, ast.location.clone());
        note(annotated, ElementRef::Container(id), &ast.annotations);

        let declared = ast
            .entity_sets
            .iter()
            .map(|set| (SourceAst::EntitySet(set), &set.annotations))
            .chain(
                ast.singletons
                    .iter()
                    .map(|singleton| (SourceAst::Singleton(singleton), &singleton.annotations)),
            );
        let mut sources = Vec::new();
        for (source_ast, set) in declared {
            let source = NavigationSourceId::new(self.sources.len());
            note(annotated, ElementRef::NavigationSource(source), set);
            let annotations = self.slot(set);
            self.sources.push(NavigationSourceNode {
                container: id,
                ast: source_ast,
                entity_type: Cache::new(),
                bindings: Cache::new(),
                annotations,
            });
            sources.push(source);
        }

        let mut imports = Vec::with_capacity(ast.operation_imports.len());
        for import in &ast.operation_imports {
            let import_id = OperationImportId::new(self.imports.len());
            note(annotated, ElementRef::OperationImport(import_id), &import.annotations);
            let annotations = self.slot(&import.annotations);
            self.imports.push(OperationImportNode {
                container: id,
                ast: import,
                operation: Cache::new(),
                entity_set: Cache::new(),
                annotations,
            });
            imports.push(import_id);
        }

        let annotations = self.slot(&ast.annotations);
        self.containers.push(ContainerNode {
            schema,
            ast,
            qualified_name: name,
            sources,
            imports,
            extends: Cache::new(),
            annotations,
        });
    }
}

fn note(annotated: &mut Vec<ElementRef>, element: ElementRef, set: &CsdlAnnotationSet) {
    if !set.vocabulary.is_empty() {
        annotated.push(element);
    }
}
