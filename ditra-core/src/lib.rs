//! # Ditra Core
//!
//! Data model and evaluators for the subentry administration engine:
//! hierarchical names, attribute containers, administrative roles, subtree
//! specifications with their membership evaluator, refinement filters, and
//! the concurrent subentry registry.
//!
//! This crate performs no I/O and has no async surface; the orchestration
//! that reacts to directory mutations lives in `ditra-engine`.

pub mod entry;
pub mod error;
pub mod name;
pub mod refinement;
pub mod registry;
pub mod roles;
pub mod spec_parser;
pub mod subtree;
pub mod vocab;

// Re-export main types
pub use entry::{Attribute, Entry, ModOp, Modification};
pub use error::{Error, Result};
pub use name::{Name, Rdn};
pub use refinement::{Refinement, SchemaNameResolver, StaticSchemaResolver};
pub use registry::{RegistryConfig, Subentry, SubentryRegistry};
pub use roles::{AdministrativeRole, RoleSet};
pub use spec_parser::parse_subtree_specification;
pub use subtree::{SubtreeEvaluator, SubtreeSpecification};
