//! Diagnostics carried by the semantic graph.
//!
//! Resolution never fails with a Rust error for bad schema data. Instead the
//! resolver hands back a sentinel ([`Sentinel`]) holding one or more
//! [`EdmError`]s, and every value returned from the graph implements
//! [`Checkable`] so callers can ask `errors()` without knowing whether they
//! hold a real element or a placeholder.
//!
//! Only caller mistakes escalate, as [`ModelError`].

use crate::ast::Span;
use crate::diag::Diag;
use smol_str::SmolStr;
use std::fmt;
use std::rc::Rc;

// ============================================================================
// Error Codes
// ============================================================================

/// The closed set of diagnostic codes the resolver produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdmErrorCode {
    /// A type name did not resolve.
    BadUnresolvedType,
    /// A name expected to be an entity type did not resolve to one.
    BadUnresolvedEntityType,
    /// A name expected to be a complex type did not resolve to one.
    BadUnresolvedComplexType,
    /// A name expected to be a primitive type did not resolve to one.
    BadUnresolvedPrimitiveType,
    /// A property name did not resolve.
    BadUnresolvedProperty,
    /// A navigation path (binding path or partner) did not resolve.
    BadUnresolvedNavigationPropertyPath,
    /// An entity set or binding target did not resolve.
    BadUnresolvedEntitySet,
    /// No operation matched.
    BadUnresolvedOperation,
    /// More than one operation matched.
    BadAmbiguousOperation,
    /// A term name did not resolve.
    BadUnresolvedTerm,
    /// A labeled-element reference did not resolve.
    BadUnresolvedLabeledElement,
    /// A labeled-element reference matched more than one label.
    BadAmbiguousLabeledElement,
    /// A labeled element refers back to itself.
    BadCyclicLabeledElement,
    /// A container name did not resolve.
    BadUnresolvedEntityContainer,
    /// A parameter name did not resolve.
    BadUnresolvedParameter,
    /// An enum member reference did not resolve.
    BadUnresolvedEnumMember,
    /// An out-of-line annotation target did not resolve.
    BadUnresolvedTarget,
    /// An entity type's base type chain loops back on itself.
    BadCyclicEntity,
    /// A complex type's base type chain loops back on itself.
    BadCyclicComplex,
    /// A container's `Extends` chain loops back on itself.
    BadCyclicEntityContainer,
    /// A term's base term chain loops back on itself.
    BadCyclicTerm,
    /// A constant's text does not parse as its declared kind.
    InvalidLiteral,
    /// A name is declared twice where it must be unique.
    AlreadyDefined,
    /// A key names a navigation property.
    KeyPropertyMustBeStructural,
    /// A navigation property's type is not an entity type.
    InvalidNavigationPropertyType,
    /// One alias is bound to two namespaces.
    DuplicateAlias,
    /// A collection-valued navigation property is also marked nullable.
    NavigationPropertyWithCollectionTypeCannotHaveNullableAttribute,
    /// An enum member value does not fit the underlying type.
    EnumMemberValueOutOfRange,
    /// A flags enum member omits its value.
    EnumMemberMustHaveValue,
    /// An enum's underlying type is not an integral primitive.
    InvalidEnumUnderlyingType,
}

impl EdmErrorCode {
    /// Returns the stable name used as the rendered diagnostic code.
    pub fn name(self) -> &'static str {
        match self {
            Self::BadUnresolvedType => "BadUnresolvedType",
            Self::BadUnresolvedEntityType => "BadUnresolvedEntityType",
            Self::BadUnresolvedComplexType => "BadUnresolvedComplexType",
            Self::BadUnresolvedPrimitiveType => "BadUnresolvedPrimitiveType",
            Self::BadUnresolvedProperty => "BadUnresolvedProperty",
            Self::BadUnresolvedNavigationPropertyPath => "BadUnresolvedNavigationPropertyPath",
            Self::BadUnresolvedEntitySet => "BadUnresolvedEntitySet",
            Self::BadUnresolvedOperation => "BadUnresolvedOperation",
            Self::BadAmbiguousOperation => "BadAmbiguousOperation",
            Self::BadUnresolvedTerm => "BadUnresolvedTerm",
            Self::BadUnresolvedLabeledElement => "BadUnresolvedLabeledElement",
            Self::BadAmbiguousLabeledElement => "BadAmbiguousLabeledElement",
            Self::BadCyclicLabeledElement => "BadCyclicLabeledElement",
            Self::BadUnresolvedEntityContainer => "BadUnresolvedEntityContainer",
            Self::BadUnresolvedParameter => "BadUnresolvedParameter",
            Self::BadUnresolvedEnumMember => "BadUnresolvedEnumMember",
            Self::BadUnresolvedTarget => "BadUnresolvedTarget",
            Self::BadCyclicEntity => "BadCyclicEntity",
            Self::BadCyclicComplex => "BadCyclicComplex",
            Self::BadCyclicEntityContainer => "BadCyclicEntityContainer",
            Self::BadCyclicTerm => "BadCyclicTerm",
            Self::InvalidLiteral => "InvalidLiteral",
            Self::AlreadyDefined => "AlreadyDefined",
            Self::KeyPropertyMustBeStructural => "KeyPropertyMustBeStructural",
            Self::InvalidNavigationPropertyType => "InvalidNavigationPropertyType",
            Self::DuplicateAlias => "DuplicateAlias",
            Self::NavigationPropertyWithCollectionTypeCannotHaveNullableAttribute => {
                "NavigationPropertyWithCollectionTypeCannotHaveNullableAttribute"
            }
            Self::EnumMemberValueOutOfRange => "EnumMemberValueOutOfRange",
            Self::EnumMemberMustHaveValue => "EnumMemberMustHaveValue",
            Self::InvalidEnumUnderlyingType => "InvalidEnumUnderlyingType",
        }
    }
}

impl EdmErrorCode {
    /// A short hint on how to repair a schema reporting this code.
    pub fn help(self) -> Option<&'static str> {
        match self {
            Self::BadUnresolvedType
            | Self::BadUnresolvedEntityType
            | Self::BadUnresolvedComplexType
            | Self::BadUnresolvedPrimitiveType
            | Self::BadUnresolvedOperation
            | Self::BadUnresolvedTerm
            | Self::BadUnresolvedEntityContainer
            | Self::BadUnresolvedTarget => {
                Some("qualify the name with the namespace or alias of a schema in the model")
            }
            Self::BadCyclicEntity | Self::BadCyclicComplex | Self::BadCyclicEntityContainer | Self::BadCyclicTerm => {
                Some("remove one base reference from the cycle")
            }
            Self::BadAmbiguousOperation => Some("cast the arguments so that exactly one overload accepts them"),
            Self::BadAmbiguousLabeledElement => Some("labels must be unique within a schema"),
            Self::NavigationPropertyWithCollectionTypeCannotHaveNullableAttribute => {
                Some("remove the Nullable attribute from the collection")
            }
            Self::EnumMemberValueOutOfRange => Some("pick a wider underlying type or a smaller value"),
            _ => None,
        }
    }
}

impl fmt::Display for EdmErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// One `(location, code, message)` diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdmError {
    /// Where the offending reference or declaration was written.
    pub location: Option<Span>,
    pub code: EdmErrorCode,
    pub message: String,
    /// Declarations competing for an ambiguous name.
    pub candidates: Vec<Span>,
}

impl EdmError {
    /// Creates an error without candidates.
    pub fn new(location: Option<Span>, code: EdmErrorCode, message: impl Into<String>) -> Self {
        Self {
            location,
            code,
            message: message.into(),
            candidates: Vec::new(),
        }
    }

    /// Adds the declarations an ambiguous name could refer to.
    pub fn with_candidates(mut self, candidates: impl IntoIterator<Item = Span>) -> Self {
        self.candidates.extend(candidates);
        self
    }

    /// Lowers the error into a renderable diagnostic.
    ///
    /// The location becomes the primary label and every candidate a
    /// secondary one. Codes with a known repair get help text.
    pub fn to_diag(&self) -> Diag {
        let mut diag = Diag::error(self.message.clone()).with_code(self.code.name());
        if let Some(span) = &self.location {
            diag = diag.with_primary_label(span.clone(), self.code.name());
        }
        for span in &self.candidates {
            diag = diag.with_secondary_label(span.clone(), "candidate");
        }
        match self.code.help() {
            Some(help) => diag.with_help(help),
            None => diag,
        }
    }
}

impl fmt::Display for EdmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Errors caused by the calling code rather than by schema data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("schema #{position} has an empty namespace")]
    EmptyNamespace { position: usize },
}

// ============================================================================
// Checkable
// ============================================================================

/// Anything returned from the graph that may be a sentinel.
///
/// Real elements report no errors; sentinels report at least one.
pub trait Checkable {
    /// The sentinel standing in for the real element, if this is one.
    fn sentinel(&self) -> Option<&Sentinel> {
        None
    }

    fn errors(&self) -> &[EdmError] {
        match self.sentinel() {
            Some(sentinel) => &sentinel.errors[..],
            None => &[],
        }
    }

    fn is_bad(&self) -> bool {
        !self.errors().is_empty()
    }
}

/// The payload of an `Unresolved`, `Cyclic`, `Bad` or `Ambiguous` variant.
///
/// `name` is the name that failed to resolve (or the element that is bad),
/// so a sentinel still answers "what is your name" like a real element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinel {
    name: SmolStr,
    errors: Rc<[EdmError]>,
}

impl Sentinel {
    /// Creates a sentinel with a single error.
    pub fn new(name: impl Into<SmolStr>, error: EdmError) -> Self {
        Self {
            name: name.into(),
            errors: Rc::new([error]),
        }
    }

    /// Creates a sentinel from errors gathered elsewhere, such as the candidates of an ambiguous name.
    pub fn with_errors(name: impl Into<SmolStr>, errors: Vec<EdmError>) -> Self {
        Self {
            name: name.into(),
            errors: errors.into(),
        }
    }

    /// Shorthand for a sentinel with a single freshly built error.
    pub(crate) fn error(
        name: impl Into<SmolStr>,
        location: Option<Span>,
        code: EdmErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self::new(name, EdmError::new(location, code, message))
    }

    /// The name that failed to resolve.
    pub fn name(&self) -> &SmolStr {
        &self.name
    }

    /// The error list shared by every clone of this sentinel.
    pub(crate) fn shared_errors(&self) -> &Rc<[EdmError]> {
        &self.errors
    }
}

impl Checkable for Sentinel {
    fn sentinel(&self) -> Option<&Sentinel> {
        Some(self)
    }
}
