//! # Ditra Engine
//!
//! The subentry maintenance orchestrator. Sits in the directory's mutation
//! pipeline: each hook runs synchronously around the underlying operation
//! (passed in as a continuation), consulting the registry and the subtree
//! evaluator from `ditra-core` and issuing follow-up searches and
//! modifications through the [`Directory`] facade.

pub mod facade;
pub mod maintenance;
pub mod visibility;

pub use facade::{Directory, SearchFilter, SearchResults, SearchScope};
pub use maintenance::{is_subentry, SubentryMaintenance, SEQ_ABSENT};
pub use visibility::{SubentriesControl, Visibility};
