//! Subentry visibility filtering for list/search results.
//!
//! Subentries are hidden from ordinary searches; a request carrying the
//! subentries-visibility control flips the view to subentries-only. Object
//! scope (direct lookup by name) always bypasses the filtering.

use crate::facade::SearchScope;
use ditra_core::entry::Entry;
use ditra_core::vocab::{attr, control, oc};

/// The subentries-visibility request control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubentriesControl {
    /// Criticality flag from the request
    pub critical: bool,
    /// `true`: return only subentries; `false`: return only regular entries
    pub visible: bool,
}

impl SubentriesControl {
    /// Control identifier recognized on requests.
    pub const OID: &'static str = control::SUBENTRIES_VISIBILITY;

    /// Non-critical control with the given visibility flag.
    pub fn new(visible: bool) -> Self {
        Self {
            critical: false,
            visible,
        }
    }
}

/// Which result class a request gets to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// No filtering (object-scope requests)
    All,
    /// Regular entries only (default for list/search)
    HideSubentries,
    /// Subentries only (control with `visible = true`)
    HideRegular,
}

impl Visibility {
    /// Resolve the visibility for a request from its scope and control.
    pub fn for_request(scope: SearchScope, ctl: Option<&SubentriesControl>) -> Self {
        if scope == SearchScope::Object {
            // Direct lookup by name is intentional regardless of subentry status.
            return Visibility::All;
        }
        match ctl {
            Some(c) if c.visible => Visibility::HideRegular,
            _ => Visibility::HideSubentries,
        }
    }

    /// True when the entry may appear in the result set.
    pub fn admits(&self, entry: &Entry) -> bool {
        let is_subentry = entry.contains(attr::OBJECT_CLASS, oc::SUBENTRY);
        match self {
            Visibility::All => true,
            Visibility::HideSubentries => !is_subentry,
            Visibility::HideRegular => is_subentry,
        }
    }

    /// Filter an entry sequence down to the admitted ones.
    pub fn filter_results<'a, N: 'a>(
        &'a self,
        results: impl Iterator<Item = (N, Entry)> + 'a,
    ) -> impl Iterator<Item = (N, Entry)> + 'a {
        results.filter(move |(_, entry)| self.admits(entry))
    }
}
