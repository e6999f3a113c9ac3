//! Model-wide name lookup.
//!
//! The index is filled once while the model is built; lookups afterwards
//! are plain hash table reads. Alias-qualified names (`Alias.Name`) are
//! rewritten to their namespace before the lookup.

use crate::ast::{PrimitiveKind, Span};
use crate::semantic::error::{EdmError, EdmErrorCode};
use crate::semantic::ids::{ContainerId, OperationId, TermId};
use crate::semantic::model::EdmModel;
use crate::semantic::types::TypeDefinition;
use smol_str::{SmolStr, format_smolstr};
use std::borrow::Cow;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::trace;

#[derive(Debug, Default)]
pub(crate) struct NameIndex {
    aliases: HashMap<SmolStr, SmolStr>,
    types: HashMap<SmolStr, TypeDefinition>,
    operations: HashMap<SmolStr, Vec<OperationId>>,
    terms: HashMap<SmolStr, TermId>,
    containers: HashMap<SmolStr, ContainerId>,
    pub(crate) errors: Vec<EdmError>,
}

impl NameIndex {
    pub(crate) fn declare_alias(&mut self, alias: &SmolStr, namespace: &SmolStr, location: Option<Span>) {
        match self.aliases.entry(alias.clone()) {
            Entry::Occupied(existing) if existing.get() != namespace => {
                self.errors.push(EdmError::new(
                    location,
                    EdmErrorCode::DuplicateAlias,
                    format!(
                        "The alias '{alias}' is already bound to namespace '{}'.",
                        existing.get()
                    ),
                ));
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(slot) => {
                slot.insert(namespace.clone());
            }
        }
    }

    pub(crate) fn declare_type(&mut self, name: &SmolStr, definition: TypeDefinition, location: Option<Span>) {
        match self.types.entry(name.clone()) {
            Entry::Occupied(_) => self.errors.push(already_defined("type", name, location)),
            Entry::Vacant(slot) => {
                slot.insert(definition);
            }
        }
    }

    /// Operations overload by name, so every declaration is kept.
    pub(crate) fn declare_operation(&mut self, name: &SmolStr, id: OperationId) {
        self.operations.entry(name.clone()).or_default().push(id);
    }

    pub(crate) fn declare_term(&mut self, name: &SmolStr, id: TermId, location: Option<Span>) {
        match self.terms.entry(name.clone()) {
            Entry::Occupied(_) => self.errors.push(already_defined("term", name, location)),
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
    }

    pub(crate) fn declare_container(&mut self, name: &SmolStr, id: ContainerId, location: Option<Span>) {
        match self.containers.entry(name.clone()) {
            Entry::Occupied(_) => self.errors.push(already_defined("entity container", name, location)),
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
    }

    /// Rewrites `Alias.Name` to `Namespace.Name`.
    pub(crate) fn qualify<'n>(&self, name: &'n str) -> Cow<'n, str> {
        if let Some((prefix, simple)) = name.rsplit_once('.') {
            if let Some(namespace) = self.aliases.get(prefix) {
                return Cow::Owned(format!("{namespace}.{simple}"));
            }
        }
        Cow::Borrowed(name)
    }
}

fn already_defined(what: &str, name: &str, location: Option<Span>) -> EdmError {
    EdmError::new(
        location,
        EdmErrorCode::AlreadyDefined,
        format!("A {what} named '{name}' is already defined."),
    )
}

/// Joins a namespace and a simple name.
pub(crate) fn qualified(namespace: &str, name: &str) -> SmolStr {
    format_smolstr!("{namespace}.{name}")
}

impl<'a> EdmModel<'a> {
    /// Resolves an alias-qualified name to its namespace-qualified form.
    pub fn qualify<'n>(&self, name: &'n str) -> Cow<'n, str> {
        self.names.qualify(name)
    }

    /// Finds a type by qualified name, including the `Edm` primitives.
    pub fn find_type(&self, name: &str) -> Option<TypeDefinition> {
        let qualified = self.names.qualify(name);
        trace!(name, qualified = %qualified, "find type");
        if let Some(kind) = PrimitiveKind::from_qualified_name(&qualified) {
            return Some(TypeDefinition::Primitive(kind));
        }
        self.names.types.get(qualified.as_ref()).cloned()
    }

    /// Every overload declared under `name`, in declaration order.
    pub fn find_operations(&self, name: &str) -> &[OperationId] {
        let qualified = self.names.qualify(name);
        trace!(name, qualified = %qualified, "find operations");
        self.names
            .operations
            .get(qualified.as_ref())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Looks up a term by qualified or alias-qualified name.
    pub fn find_term(&self, name: &str) -> Option<TermId> {
        let qualified = self.names.qualify(name);
        trace!(name, qualified = %qualified, "find term");
        self.names.terms.get(qualified.as_ref()).copied()
    }

    /// Looks up a container by qualified or alias-qualified name.
    pub fn find_container(&self, name: &str) -> Option<ContainerId> {
        let qualified = self.names.qualify(name);
        trace!(name, qualified = %qualified, "find container");
        self.names.containers.get(qualified.as_ref()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_rewrites_prefix_only() {
        let mut index = NameIndex::default();
        index.declare_alias(&"Self".into(), &"My.Service".into(), None);
        assert_eq!(index.qualify("Self.Order"), "My.Service.Order");
        assert_eq!(index.qualify("My.Service.Order"), "My.Service.Order");
        assert_eq!(index.qualify("Order"), "Order");
        assert!(index.errors.is_empty());
    }

    #[test]
    fn conflicting_alias_is_reported() {
        let mut index = NameIndex::default();
        index.declare_alias(&"A".into(), &"One".into(), None);
        index.declare_alias(&"A".into(), &"One".into(), None);
        index.declare_alias(&"A".into(), &"Two".into(), Some(5..6));
        assert_eq!(index.errors.len(), 1);
        assert_eq!(index.errors[0].code, EdmErrorCode::DuplicateAlias);
        assert_eq!(index.qualify("A.X"), "One.X");
    }

    #[test]
    fn first_type_declaration_wins() {
        let mut index = NameIndex::default();
        let name = qualified("NS", "T");
        index.declare_type(&name, TypeDefinition::Primitive(PrimitiveKind::Int32), None);
        index.declare_type(&name, TypeDefinition::Primitive(PrimitiveKind::String), None);
        assert_eq!(
            index.types.get("NS.T"),
            Some(&TypeDefinition::Primitive(PrimitiveKind::Int32))
        );
        assert_eq!(index.errors[0].code, EdmErrorCode::AlreadyDefined);
    }
}
