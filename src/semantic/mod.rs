//! Semantic resolution over parsed CSDL schemas.
//!
//! [`EdmModel`] turns a set of [`CsdlSchema`](crate::ast::CsdlSchema)
//! values into a cross-linked type graph. Nothing beyond the name index is
//! computed up front: base types, property tables, navigation partners,
//! binding targets, overload bindings and annotations are resolved the
//! first time they are read and then remembered.
//!
//! Resolution never fails. A name that does not bind, a base-type loop or
//! an ambiguous overload comes back as a sentinel variant carrying
//! [`EdmError`]s, and callers continue walking the graph. Use
//! [`EdmModel::errors`] to force the whole model and collect every
//! diagnostic at once.
//!
//! # Example
//!
//! ```
//! use csdl_semantics::ast::{CsdlEntityType, CsdlSchema};
//! use csdl_semantics::semantic::{Checkable, EdmModel};
//!
//! let schemas = [CsdlSchema::new("NS")
//!     .with_entity_type(CsdlEntityType::new("Base"))
//!     .with_entity_type(CsdlEntityType::new("Derived").with_base_type("NS.Missing"))];
//! let model = EdmModel::new(&schemas).unwrap();
//!
//! let derived = model.find_type("NS.Derived").and_then(|t| t.as_structured()).unwrap();
//! let base = model.base_type(derived).unwrap();
//! assert!(base.is_bad());
//! assert_eq!(model.errors().len(), 1);
//! ```

pub mod annotation;
mod cache;
pub mod config;
pub mod container;
pub mod enums;
pub mod error;
pub mod expression;
pub mod ids;
pub mod label;
pub mod literal;
pub mod model;
mod names;
pub mod navigation;
pub mod operation;
pub mod structured;
pub mod types;
mod walk;

pub use annotation::TermRef;
pub use config::{ModelConfig, ModelStats};
pub use container::{ContainerRef, ImportTarget, NavigationPropertyBinding, NavigationSource, NavigationSourceKind};
pub use enums::EnumMemberValue;
pub use error::{Checkable, EdmError, EdmErrorCode, ModelError, Sentinel};
pub use expression::{ConstantValue, EnumMemberRef, ExpressionKind, PathSegment};
pub use ids::*;
pub use label::LabelTarget;
pub use literal::{LiteralError, PrimitiveValue, parse_literal};
pub use model::EdmModel;
pub use navigation::ReferentialConstraint;
pub use operation::{ArgumentType, EntitySetPath, OperationRef, ParameterRef};
pub use structured::{Property, PropertyKind};
pub use types::{TypeDefinition, TypeKind, TypeReference};
