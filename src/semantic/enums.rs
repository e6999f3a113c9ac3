//! Enumerations and type definitions.
//!
//! Implicit member values number sequentially from the previous member, so
//! members are always valued in declaration order: asking for member `k`
//! first values members `0..k`. Each value is memoized on its member node;
//! the syntax tree is never written to.

use crate::ast::PrimitiveKind;
use crate::semantic::error::{Checkable, EdmErrorCode, Sentinel};
use crate::semantic::ids::{EnumMemberId, EnumTypeId, TypeDefinitionId};
use crate::semantic::model::{EdmModel, EnumMemberNode, EnumTypeNode, TypeDefinitionNode};
use crate::semantic::types::{TypeDefinition, TypeKind, reentrant_type};
use smol_str::SmolStr;
use tracing::debug;

/// The numeric value of an enumeration member.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumMemberValue {
    Value(i64),
    /// The value broke a rule; `attempted` is still used to number the
    /// members that follow.
    Bad { attempted: i64, sentinel: Sentinel },
}

impl EnumMemberValue {
    /// The member value, or the value it was assigned before being flagged.
    pub fn value(&self) -> i64 {
        match self {
            Self::Value(value) | Self::Bad { attempted: value, .. } => *value,
        }
    }
}

impl Checkable for EnumMemberValue {
    fn sentinel(&self) -> Option<&Sentinel> {
        match self {
            Self::Value(_) => None,
            Self::Bad { sentinel, .. } => Some(sentinel),
        }
    }
}

const DEFAULT_UNDERLYING: &str = "Edm.Int32";

impl<'a> EdmModel<'a> {
    pub(crate) fn enum_node(&self, id: EnumTypeId) -> &EnumTypeNode<'a> {
        &self.enums[id.as_usize()]
    }

    pub(crate) fn enum_member_node(&self, id: EnumMemberId) -> &EnumMemberNode<'a> {
        &self.enum_members[id.as_usize()]
    }

    /// Every declared enum type, in declaration order.
    pub fn enum_types(&self) -> impl Iterator<Item = EnumTypeId> + '_ {
        (0..self.enums.len()).map(EnumTypeId::new)
    }

    /// The qualified name of an enum type.
    pub fn enum_type_name(&self, id: EnumTypeId) -> &SmolStr {
        &self.enum_node(id).qualified_name
    }

    /// Returns true if members may be combined.
    pub fn is_flags(&self, id: EnumTypeId) -> bool {
        self.enum_node(id).ast.is_flags
    }

    /// Members in declaration order.
    pub fn enum_members(&self, id: EnumTypeId) -> &[EnumMemberId] {
        &self.enum_node(id).members
    }

    /// The name of a member.
    pub fn enum_member_name(&self, id: EnumMemberId) -> &SmolStr {
        &self.enum_member_node(id).ast.name
    }

    /// The enumeration declaring `id`.
    pub fn declaring_enum(&self, id: EnumMemberId) -> EnumTypeId {
        self.enum_member_node(id).enum_type
    }

    /// Finds a member of `id` by name.
    pub fn find_enum_member(&self, id: EnumTypeId, name: &str) -> Option<EnumMemberId> {
        self.enum_members(id)
            .iter()
            .copied()
            .find(|&member| self.enum_member_name(member) == name)
    }

    /// The integral primitive the enumeration is based on.
    pub fn enum_underlying_type(&self, id: EnumTypeId) -> TypeDefinition {
        let node = self.enum_node(id);
        node.underlying.get_or_compute(
            || self.compute_enum_underlying_type(id),
            || reentrant_type(&node.qualified_name),
        )
    }

    fn compute_enum_underlying_type(&self, id: EnumTypeId) -> TypeDefinition {
        let node = self.enum_node(id);
        let name = node
            .ast
            .underlying_type
            .as_deref()
            .unwrap_or(DEFAULT_UNDERLYING);
        match self.find_type(name) {
            Some(TypeDefinition::Primitive(kind)) if kind.is_integral() => {
                TypeDefinition::Primitive(kind)
            }
            Some(_) => {
                debug!(ty = %node.qualified_name, underlying = name, "invalid enum underlying type");
                TypeDefinition::Bad(
                    TypeKind::Primitive,
                    Sentinel::error(
                        name,
                        node.ast.location.clone(),
                        EdmErrorCode::InvalidEnumUnderlyingType,
                        format!(
                            "The underlying type '{name}' of enumeration '{}' must be Byte, SByte, Int16, Int32 or Int64.",
                            node.qualified_name
                        ),
                    ),
                )
            }
            None => TypeDefinition::unresolved(
                TypeKind::Primitive,
                name,
                node.ast.location.clone(),
                EdmErrorCode::BadUnresolvedPrimitiveType,
            ),
        }
    }

    /// The explicit or implicit value of a member.
    pub fn enum_member_value(&self, id: EnumMemberId) -> EnumMemberValue {
        let node = self.enum_member_node(id);
        let preceding = &self.enum_node(node.enum_type).members[..node.position];
        for &earlier in preceding {
            self.member_value_slot(earlier);
        }
        self.member_value_slot(id)
    }

    fn member_value_slot(&self, id: EnumMemberId) -> EnumMemberValue {
        self.enum_member_node(id)
            .value
            .get_or_compute(|| self.compute_member_value(id), || EnumMemberValue::Value(0))
    }

    fn compute_member_value(&self, id: EnumMemberId) -> EnumMemberValue {
        let node = self.enum_member_node(id);
        let enum_node = self.enum_node(node.enum_type);

        let implicit = match node.position.checked_sub(1) {
            None => Some(0),
            Some(previous) => self
                .member_value_slot(enum_node.members[previous])
                .value()
                .checked_add(1),
        };
        let attempted = match (node.ast.value, implicit) {
            (Some(value), _) => value,
            (None, Some(value)) => value,
            (None, None) => {
                return self.bad_member(id, i64::MAX, EdmErrorCode::EnumMemberValueOutOfRange);
            }
        };

        if enum_node.ast.is_flags && node.ast.value.is_none() {
            return self.bad_member(id, attempted, EdmErrorCode::EnumMemberMustHaveValue);
        }
        let range = self
            .enum_underlying_type(node.enum_type)
            .as_primitive()
            .and_then(PrimitiveKind::integral_range);
        if let Some((min, max)) = range {
            if attempted < min || attempted > max {
                return self.bad_member(id, attempted, EdmErrorCode::EnumMemberValueOutOfRange);
            }
        }
        EnumMemberValue::Value(attempted)
    }

    fn bad_member(&self, id: EnumMemberId, attempted: i64, code: EdmErrorCode) -> EnumMemberValue {
        let node = self.enum_member_node(id);
        let enum_name = self.enum_type_name(node.enum_type);
        let message = match code {
            EdmErrorCode::EnumMemberMustHaveValue => format!(
                "The member '{}' of flags enumeration '{enum_name}' must have an explicit value.",
                node.ast.name
            ),
            _ => format!(
                "The value {attempted} of member '{}' is out of range for the underlying type of '{enum_name}'.",
                node.ast.name
            ),
        };
        debug!(member = %node.ast.name, attempted, ?code, "bad enum member value");
        EnumMemberValue::Bad {
            attempted,
            sentinel: Sentinel::error(node.ast.name.clone(), node.ast.location.clone(), code, message),
        }
    }

    // ========================================================================
    // Type Definitions
    // ========================================================================

    pub(crate) fn type_definition_node(&self, id: TypeDefinitionId) -> &TypeDefinitionNode<'a> {
        &self.type_definitions[id.as_usize()]
    }

    /// Every declared type definition, in declaration order.
    pub fn type_definitions(&self) -> impl Iterator<Item = TypeDefinitionId> + '_ {
        (0..self.type_definitions.len()).map(TypeDefinitionId::new)
    }

    /// The qualified name of a type definition.
    pub fn type_definition_name(&self, id: TypeDefinitionId) -> &SmolStr {
        &self.type_definition_node(id).qualified_name
    }

    /// The primitive a type definition stands for.
    pub fn type_definition_underlying(&self, id: TypeDefinitionId) -> TypeDefinition {
        let node = self.type_definition_node(id);
        node.underlying.get_or_compute(
            || self.compute_type_definition_underlying(id),
            || reentrant_type(&node.qualified_name),
        )
    }

    fn compute_type_definition_underlying(&self, id: TypeDefinitionId) -> TypeDefinition {
        let node = self.type_definition_node(id);
        let name = &node.ast.underlying_type;
        match self.find_type(name) {
            Some(found @ TypeDefinition::Primitive(_)) => found,
            found => {
                debug!(ty = %node.qualified_name, underlying = %name, "type definition over a non-primitive");
                let message = match found {
                    Some(_) => format!(
                        "The underlying type '{name}' of type definition '{}' is not primitive.",
                        node.qualified_name
                    ),
                    None => format!("The type '{name}' could not be found."),
                };
                TypeDefinition::Unresolved(
                    TypeKind::Primitive,
                    Sentinel::error(
                        name.clone(),
                        node.ast.location.clone(),
                        EdmErrorCode::BadUnresolvedPrimitiveType,
                        message,
                    ),
                )
            }
        }
    }
}
