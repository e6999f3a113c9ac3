//! Type references as written in a CSDL document.
//!
//! The parser already splits a `Type="..."` attribute into one of four
//! shapes: a recognized primitive, a named (still unresolved) type, a
//! `Collection(...)` wrapper, or an entity reference. Named references stay
//! raw strings here; turning them into semantic types is the resolver's job.

use crate::ast::span::Span;
use smol_str::SmolStr;
use std::fmt;

// ============================================================================
// Primitive Kinds
// ============================================================================

/// The built-in primitive types of the `Edm` namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Binary,
    Boolean,
    Byte,
    Date,
    DateTimeOffset,
    Decimal,
    Double,
    Duration,
    Guid,
    Int16,
    Int32,
    Int64,
    SByte,
    Single,
    Stream,
    String,
    TimeOfDay,
    /// The abstract `Edm.PrimitiveType`.
    PrimitiveType,
}

impl PrimitiveKind {
    /// Every primitive kind, in `Edm` declaration order.
    pub const ALL: [PrimitiveKind; 18] = [
        Self::Binary,
        Self::Boolean,
        Self::Byte,
        Self::Date,
        Self::DateTimeOffset,
        Self::Decimal,
        Self::Double,
        Self::Duration,
        Self::Guid,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::SByte,
        Self::Single,
        Self::Stream,
        Self::String,
        Self::TimeOfDay,
        Self::PrimitiveType,
    ];

    /// The namespace all primitive types live in.
    pub const NAMESPACE: &'static str = "Edm";

    /// Returns the simple name (`Int32`).
    pub fn name(self) -> &'static str {
        match self {
            Self::Binary => "Binary",
            Self::Boolean => "Boolean",
            Self::Byte => "Byte",
            Self::Date => "Date",
            Self::DateTimeOffset => "DateTimeOffset",
            Self::Decimal => "Decimal",
            Self::Double => "Double",
            Self::Duration => "Duration",
            Self::Guid => "Guid",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::SByte => "SByte",
            Self::Single => "Single",
            Self::Stream => "Stream",
            Self::String => "String",
            Self::TimeOfDay => "TimeOfDay",
            Self::PrimitiveType => "PrimitiveType",
        }
    }

    /// Looks up a primitive by its qualified name (`Edm.Int32`).
    pub fn from_qualified_name(name: &str) -> Option<Self> {
        let simple = name.strip_prefix("Edm.")?;
        Self::ALL.into_iter().find(|kind| kind.name() == simple)
    }

    /// Returns true for the integral kinds an enumeration may be based on.
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            Self::Byte | Self::SByte | Self::Int16 | Self::Int32 | Self::Int64
        )
    }

    /// Returns the inclusive value range of an integral kind.
    pub fn integral_range(self) -> Option<(i64, i64)> {
        match self {
            Self::Byte => Some((u8::MIN.into(), u8::MAX.into())),
            Self::SByte => Some((i8::MIN.into(), i8::MAX.into())),
            Self::Int16 => Some((i16::MIN.into(), i16::MAX.into())),
            Self::Int32 => Some((i32::MIN.into(), i32::MAX.into())),
            Self::Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    /// Returns true if a value of `self` widens implicitly to `target`.
    ///
    /// Identity is not a promotion; callers check equality first.
    pub fn promotes_to(self, target: PrimitiveKind) -> bool {
        use PrimitiveKind::*;
        match self {
            Byte | SByte => matches!(target, Int16 | Int32 | Int64 | Single | Double | Decimal),
            Int16 => matches!(target, Int32 | Int64 | Single | Double | Decimal),
            Int32 => matches!(target, Int64 | Single | Double | Decimal),
            Int64 => matches!(target, Single | Double | Decimal),
            Single => matches!(target, Double),
            _ => false,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", Self::NAMESPACE, self.name())
    }
}

// ============================================================================
// Facets
// ============================================================================

/// The `MaxLength` facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaxLength {
    /// A fixed upper bound.
    Bounded(u32),
    /// `MaxLength="max"`: unbounded.
    Max,
}

/// Facets that refine a primitive or collection type reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CsdlFacets {
    pub max_length: Option<MaxLength>,
    pub unicode: Option<bool>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub srid: Option<i32>,
}

// ============================================================================
// Type References
// ============================================================================

/// A use-site type reference (`Type="..."` plus `Nullable` and facets).
#[derive(Debug, Clone, PartialEq)]
pub enum CsdlTypeReference {
    /// A primitive recognized by the parser.
    Primitive {
        kind: PrimitiveKind,
        nullable: bool,
        facets: CsdlFacets,
        location: Option<Span>,
    },
    /// A named type: entity, complex, enum, type definition, or a primitive
    /// spelled by qualified name.
    Named {
        name: SmolStr,
        nullable: bool,
        facets: CsdlFacets,
        location: Option<Span>,
    },
    /// `Collection(...)`.
    Collection {
        element: Box<CsdlTypeReference>,
        location: Option<Span>,
    },
    /// A reference to an entity (`Ref(...)` in V3, `Edm.EntityType` paths in V4).
    EntityReference {
        entity_type: SmolStr,
        nullable: bool,
        location: Option<Span>,
    },
}

impl CsdlTypeReference {
    /// Creates a nullable primitive reference.
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::Primitive {
            kind,
            nullable: true,
            facets: CsdlFacets::default(),
            location: None,
        }
    }

    /// Creates a nullable named reference.
    pub fn named(name: impl Into<SmolStr>) -> Self {
        Self::Named {
            name: name.into(),
            nullable: true,
            facets: CsdlFacets::default(),
            location: None,
        }
    }

    /// Creates a collection of `element`.
    pub fn collection(element: CsdlTypeReference) -> Self {
        Self::Collection {
            element: Box::new(element),
            location: None,
        }
    }

    /// Creates a nullable entity reference.
    pub fn entity_reference(entity_type: impl Into<SmolStr>) -> Self {
        Self::EntityReference {
            entity_type: entity_type.into(),
            nullable: true,
            location: None,
        }
    }

    /// Sets the nullability flag (ignored for collections).
    pub fn with_nullable(mut self, value: bool) -> Self {
        match &mut self {
            Self::Primitive { nullable, .. }
            | Self::Named { nullable, .. }
            | Self::EntityReference { nullable, .. } => *nullable = value,
            Self::Collection { .. } => {}
        }
        self
    }

    /// Replaces the facets (ignored for collections and entity references).
    pub fn with_facets(mut self, value: CsdlFacets) -> Self {
        match &mut self {
            Self::Primitive { facets, .. } | Self::Named { facets, .. } => *facets = value,
            Self::Collection { .. } | Self::EntityReference { .. } => {}
        }
        self
    }

    /// Sets the source location.
    pub fn at(mut self, span: Span) -> Self {
        match &mut self {
            Self::Primitive { location, .. }
            | Self::Named { location, .. }
            | Self::Collection { location, .. }
            | Self::EntityReference { location, .. } => *location = Some(span),
        }
        self
    }

    /// Returns the source location.
    pub fn location(&self) -> Option<Span> {
        match self {
            Self::Primitive { location, .. }
            | Self::Named { location, .. }
            | Self::Collection { location, .. }
            | Self::EntityReference { location, .. } => location.clone(),
        }
    }
}
