//! Lazy, cycle-safe semantic model for CSDL schemas.
//!
//! The crate consumes an already parsed CSDL syntax tree ([`ast`]) and
//! exposes a semantic graph over it ([`semantic::EdmModel`]). Every derived
//! fact is computed on first access and memoized; data errors come back as
//! sentinel values carrying diagnostics instead of aborting resolution.
//!
//! # Example
//!
//! ```
//! use csdl_semantics::ast::{CsdlEntityType, CsdlProperty, CsdlSchema, CsdlTypeReference, PrimitiveKind};
//! use csdl_semantics::semantic::EdmModel;
//!
//! let schemas = [CsdlSchema::new("Shop").with_entity_type(
//!     CsdlEntityType::new("Order")
//!         .with_key(["Id"])
//!         .with_property(CsdlProperty::new("Id", CsdlTypeReference::primitive(PrimitiveKind::Int32))),
//! )];
//! let model = EdmModel::new(&schemas).unwrap();
//!
//! let order = model.find_type("Shop.Order").and_then(|t| t.as_entity()).unwrap();
//! assert_eq!(model.key(order).map(|key| key.len()), Some(1));
//! assert!(model.errors().is_empty());
//! ```

pub mod ast;
pub mod diag;
pub mod path;
pub mod semantic;

// Re-export the diagnostic rendering types.
pub use ast::Span;
pub use diag::{Diag, DiagLabel, LabelRole, SourceFile};
pub use semantic::{Checkable, EdmError, EdmErrorCode, EdmModel, ModelConfig};
