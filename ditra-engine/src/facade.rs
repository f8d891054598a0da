//! The directory-mutation facade the engine runs against.
//!
//! A narrow, synchronous seam: lookup, search, and modify. The engine never
//! adds, deletes, or renames entries itself — those mutations belong to the
//! interceptor pipeline that invokes the hooks and passes the underlying
//! operation in as a continuation.

use ditra_core::entry::{Entry, Modification};
use ditra_core::error::Result;
use ditra_core::name::Name;
use ditra_core::vocab::attr;

/// Search scope, mirroring the protocol's three scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// The named entry only
    Object,
    /// Direct subordinates of the named entry
    OneLevel,
    /// The named entry and all its subordinates
    Subtree,
}

/// Candidate filter for facade searches.
///
/// The engine only ever needs presence and objectClass-equality tests; the
/// full protocol filter language stays outside this seam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    /// Every entry in scope
    Any,
    /// Entries carrying the given objectClass value
    ObjectClass(String),
    /// Entries with at least one value of the named attribute
    Present(String),
}

impl SearchFilter {
    /// Apply the filter to an entry.
    pub fn matches(&self, entry: &Entry) -> bool {
        match self {
            SearchFilter::Any => true,
            SearchFilter::ObjectClass(oc) => entry.contains(attr::OBJECT_CLASS, oc),
            SearchFilter::Present(name) => entry.has_attribute(name),
        }
    }
}

/// Lazy search result sequence.
pub type SearchResults<'a> = Box<dyn Iterator<Item = Result<(Name, Entry)>> + 'a>;

/// Synchronous directory access used by the maintenance engine.
///
/// Implementations must propagate their own failures; the engine re-raises
/// them unchanged and applies no retry policy of its own.
pub trait Directory {
    /// Fetch a single entry, `None` when absent.
    fn lookup(&self, name: &Name) -> Result<Option<Entry>>;

    /// Enumerate entries under `base` within `scope` matching `filter`.
    /// Each call yields a fresh snapshot traversal.
    fn search(&self, base: &Name, scope: SearchScope, filter: &SearchFilter)
        -> Result<SearchResults<'_>>;

    /// Apply a modification list to one entry.
    fn modify(&self, name: &Name, modifications: &[Modification]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matching() {
        let mut e = Entry::new();
        e.put("objectClass", vec!["top".into(), "subentry".into()]);
        e.put("cn", vec!["test".into()]);

        assert!(SearchFilter::Any.matches(&e));
        assert!(SearchFilter::ObjectClass("SUBENTRY".into()).matches(&e));
        assert!(!SearchFilter::ObjectClass("person".into()).matches(&e));
        assert!(SearchFilter::Present("CN".into()).matches(&e));
        assert!(!SearchFilter::Present("sn".into()).matches(&e));
    }
}
