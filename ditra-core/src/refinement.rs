//! Refinement filters: boolean expression trees over objectClass assertions.
//!
//! A refinement restricts subtree-specification membership by the candidate
//! entry's object classes. Items carry a single equality assertion whose
//! attribute is fixed to `objectClass` by the grammar; values may be names
//! (`person`) or numeric OIDs (`2.5.6.6`), the latter resolved to their
//! registered names through a [`SchemaNameResolver`].

use crate::error::{Error, Result};
use crate::vocab::attr;
use rustc_hash::{FxHashMap, FxHashSet};

/// A refinement expression.
///
/// `Not` boxes exactly one child, so structurally malformed trees are
/// unrepresentable; the parser reports `MalformedRefinement` for bad text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refinement {
    /// Equality assertion `attribute = value` (attribute is always
    /// objectClass in conforming input)
    Item {
        /// Assertion attribute
        attribute: String,
        /// Asserted objectClass name or numeric OID
        value: String,
    },
    /// Conjunction; empty is vacuously true
    And(Vec<Refinement>),
    /// Disjunction; empty is vacuously false
    Or(Vec<Refinement>),
    /// Negation
    Not(Box<Refinement>),
}

impl Refinement {
    /// An objectClass assertion item.
    pub fn item(value: impl Into<String>) -> Self {
        Refinement::Item {
            attribute: attr::OBJECT_CLASS.to_string(),
            value: value.into(),
        }
    }
}

/// Resolves a numeric OID to the set of names registered for it.
///
/// Implemented by the schema subsystem; [`StaticSchemaResolver`] is a
/// table-backed implementation for embedders and tests.
pub trait SchemaNameResolver {
    /// All names registered for `oid`, or `None` when the OID is unknown.
    fn names_for_oid(&self, oid: &str) -> Option<Vec<String>>;
}

/// A fixed OID-to-names table.
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaResolver {
    names: FxHashMap<String, Vec<String>>,
}

impl StaticSchemaResolver {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a name for an OID.
    pub fn register(&mut self, oid: impl Into<String>, name: impl Into<String>) {
        self.names
            .entry(oid.into())
            .or_default()
            .push(name.into());
    }

    /// Table pre-seeded with the object classes the engine's own vocabulary
    /// names, plus a handful of ubiquitous directory classes.
    pub fn with_common_classes() -> Self {
        let mut r = Self::new();
        r.register("2.5.6.0", "top");
        r.register("2.5.6.4", "organization");
        r.register("2.5.6.5", "organizationalUnit");
        r.register("2.5.6.6", "person");
        r.register("2.5.6.7", "organizationalPerson");
        r.register("2.5.17.0", "subentry");
        r.register("2.5.17.2", "collectiveAttributeSubentry");
        r
    }
}

impl SchemaNameResolver for StaticSchemaResolver {
    fn names_for_oid(&self, oid: &str) -> Option<Vec<String>> {
        self.names.get(oid).cloned()
    }
}

/// Evaluate a single assertion item against an entry's objectClass set
/// (lowercased, per [`Entry::object_classes`](crate::entry::Entry::object_classes)).
pub fn evaluate_item<R: SchemaNameResolver>(
    attribute: &str,
    value: &str,
    resolver: &R,
    object_classes: &FxHashSet<String>,
) -> Result<bool> {
    if !attribute.eq_ignore_ascii_case(attr::OBJECT_CLASS) {
        return Err(Error::invalid_assertion(format!(
            "refinement items assert objectClass, not '{attribute}'"
        )));
    }
    if object_classes.contains(&value.to_ascii_lowercase()) {
        return Ok(true);
    }
    // A leading digit marks a numeric OID; check its registered aliases.
    if value.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        if let Some(names) = resolver.names_for_oid(value) {
            return Ok(names
                .iter()
                .any(|n| object_classes.contains(&n.to_ascii_lowercase())));
        }
    }
    Ok(false)
}

/// Recursively evaluate a refinement tree against an entry's objectClass set.
pub fn evaluate<R: SchemaNameResolver>(
    refinement: &Refinement,
    resolver: &R,
    object_classes: &FxHashSet<String>,
) -> Result<bool> {
    match refinement {
        Refinement::Item { attribute, value } => {
            evaluate_item(attribute, value, resolver, object_classes)
        }
        Refinement::And(children) => {
            for child in children {
                if !evaluate(child, resolver, object_classes)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Refinement::Or(children) => {
            for child in children {
                if evaluate(child, resolver, object_classes)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Refinement::Not(child) => Ok(!evaluate(child, resolver, object_classes)?),
    }
}
