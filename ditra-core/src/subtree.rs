//! Subtree specifications and the membership evaluator.
//!
//! A subtree specification scopes a region of an administrative area:
//! a base name relative to the administrative point, chop-distance bounds,
//! chop exclusions, and an optional objectClass refinement. The evaluator
//! decides whether a candidate entry falls inside that region.

use crate::error::Result;
use crate::name::Name;
use crate::refinement::{self, Refinement, SchemaNameResolver};
use rustc_hash::FxHashSet;

/// A subtree specification.
///
/// The default value selects the whole administrative area: empty base,
/// minimum 0, unbounded maximum, no exclusions, no refinement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtreeSpecification {
    /// Base of the selected subtree, relative to the administrative point
    pub base: Name,
    /// Minimum chop distance below the base (0 = the base itself)
    pub minimum: u32,
    /// Maximum chop distance below the base; `None` = unbounded
    pub maximum: Option<u32>,
    /// Exclusions removing the named relative subtree, root included
    pub chop_before: FxHashSet<Name>,
    /// Exclusions removing everything strictly below the named relative node
    pub chop_after: FxHashSet<Name>,
    /// Optional objectClass refinement
    pub refinement: Option<Refinement>,
}

impl SubtreeSpecification {
    /// Specification selecting the whole administrative area.
    pub fn whole_area() -> Self {
        Self::default()
    }
}

/// Decides subtree-specification membership.
///
/// Owns the schema resolver the refinement evaluator needs for OID aliasing.
#[derive(Debug, Clone)]
pub struct SubtreeEvaluator<R> {
    resolver: R,
}

impl<R: SchemaNameResolver> SubtreeEvaluator<R> {
    /// Create an evaluator over the given schema resolver.
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// The schema resolver in use.
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// True iff the entry at `entry_name` with the given objectClass set
    /// (lowercased) is selected by `spec` under the administrative point at
    /// `ap_name`.
    ///
    /// Checks run cheapest-first: ancestry and distance bounds before chop
    /// exclusions, the refinement filter last.
    pub fn evaluate(
        &self,
        spec: &SubtreeSpecification,
        ap_name: &Name,
        entry_name: &Name,
        object_classes: &FxHashSet<String>,
    ) -> Result<bool> {
        // Outside the administrative point's subtree entirely.
        let Some(ap_relative) = entry_name.relative_to(ap_name) else {
            return Ok(false);
        };

        // Position relative to the specification base.
        let base_relative = if spec.base.is_empty() {
            ap_relative
        } else {
            match ap_relative.relative_to(&spec.base) {
                Some(rel) => rel,
                None => return Ok(false),
            }
        };

        let distance = base_relative.len() as u32;
        if let Some(maximum) = spec.maximum {
            if distance > maximum {
                return Ok(false);
            }
        }
        if distance < spec.minimum {
            return Ok(false);
        }

        // chopBefore excludes the named node and everything below it.
        for chop in &spec.chop_before {
            if base_relative == *chop || base_relative.is_descendant_of(chop) {
                return Ok(false);
            }
        }

        // chopAfter keeps the named node but excludes everything below it.
        for chop in &spec.chop_after {
            if base_relative.is_descendant_of(chop) {
                return Ok(false);
            }
        }

        match &spec.refinement {
            Some(r) => refinement::evaluate(r, &self.resolver, object_classes),
            None => Ok(true),
        }
    }
}
