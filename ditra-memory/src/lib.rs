//! # Ditra Memory
//!
//! An in-memory [`Directory`] over an ordered map of normalized names.
//! Backs the engine's integration tests and small embedders; also provides
//! the owner-side mutators (`add`, `delete`, `rename`) that tests pass to
//! the maintenance hooks as next-stage continuations, plus modify-failure
//! injection for exercising partial-sweep behavior.

use ditra_core::entry::{Entry, Modification};
use ditra_core::error::{Error, Result};
use ditra_core::name::Name;
use ditra_engine::facade::{Directory, SearchFilter, SearchResults, SearchScope};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// In-memory directory: normalized name -> entry, ordered so parents sort
/// before their subordinates.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    entries: RwLock<BTreeMap<Name, Entry>>,
    /// Remaining modifies before injected failure; negative = unlimited.
    modify_budget: AtomicI64,
}

impl MemoryDirectory {
    /// Empty directory.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            modify_budget: AtomicI64::new(-1),
        }
    }

    /// Make every modify after the next `n` fail with a directory error.
    pub fn fail_modifies_after(&self, n: u32) {
        self.modify_budget.store(n as i64, Ordering::SeqCst);
    }

    /// Lift a previously injected failure budget.
    pub fn clear_modify_failures(&self) {
        self.modify_budget.store(-1, Ordering::SeqCst);
    }

    /// Insert or replace an entry.
    pub fn add(&self, name: Name, entry: Entry) {
        self.entries.write().insert(name, entry);
    }

    /// Remove an entry, erroring when absent.
    pub fn delete(&self, name: &Name) -> Result<Entry> {
        self.entries
            .write()
            .remove(name)
            .ok_or_else(|| Error::no_such_entry(name.to_string()))
    }

    /// Rename/move an entry, rewriting the keys of its whole subtree.
    pub fn rename(&self, old: &Name, new: &Name) -> Result<()> {
        let mut entries = self.entries.write();
        if !entries.contains_key(old) {
            return Err(Error::no_such_entry(old.to_string()));
        }
        let affected: Vec<Name> = entries
            .keys()
            .filter(|k| *k == old || k.is_descendant_of(old))
            .cloned()
            .collect();
        for key in affected {
            let entry = entries.remove(&key).unwrap();
            let relative = key.relative_to(old).unwrap();
            entries.insert(new.append(&relative), entry);
        }
        Ok(())
    }

    /// Fetch a copy of an entry (test assertions).
    pub fn get(&self, name: &Name) -> Option<Entry> {
        self.entries.read().get(name).cloned()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn in_scope(base: &Name, scope: SearchScope, name: &Name) -> bool {
        match scope {
            SearchScope::Object => name == base,
            SearchScope::OneLevel => name.parent().as_ref() == Some(base),
            SearchScope::Subtree => name == base || name.is_descendant_of(base),
        }
    }
}

impl Directory for MemoryDirectory {
    fn lookup(&self, name: &Name) -> Result<Option<Entry>> {
        Ok(self.entries.read().get(name).cloned())
    }

    fn search(
        &self,
        base: &Name,
        scope: SearchScope,
        filter: &SearchFilter,
    ) -> Result<SearchResults<'_>> {
        // Snapshot under the read lock; the returned sequence holds no lock.
        let matched: Vec<(Name, Entry)> = self
            .entries
            .read()
            .iter()
            .filter(|(name, entry)| Self::in_scope(base, scope, name) && filter.matches(entry))
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect();
        Ok(Box::new(matched.into_iter().map(Ok)))
    }

    fn modify(&self, name: &Name, modifications: &[Modification]) -> Result<()> {
        let budget = self.modify_budget.load(Ordering::SeqCst);
        if budget >= 0 {
            if budget == 0 {
                return Err(Error::directory(format!(
                    "injected modify failure on '{name}'"
                )));
            }
            self.modify_budget.store(budget - 1, Ordering::SeqCst);
        }
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(name)
            .ok_or_else(|| Error::no_such_entry(name.to_string()))?;
        entry.apply_all(modifications);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        Name::parse(s).unwrap()
    }

    fn entry(classes: &[&str]) -> Entry {
        let mut e = Entry::new();
        e.put(
            "objectClass",
            classes.iter().map(|c| c.to_string()).collect(),
        );
        e
    }

    fn seeded() -> MemoryDirectory {
        let dir = MemoryDirectory::new();
        dir.add(name("ou=system"), entry(&["organizationalUnit"]));
        dir.add(name("cn=a,ou=system"), entry(&["person"]));
        dir.add(name("cn=b,cn=a,ou=system"), entry(&["person"]));
        dir.add(name("ou=other"), entry(&["organizationalUnit"]));
        dir
    }

    #[test]
    fn test_lookup_and_modify() {
        let dir = seeded();
        let n = name("cn=a,ou=system");
        assert!(dir.lookup(&n).unwrap().is_some());

        dir.modify(&n, &[Modification::add("description", vec!["x".into()])])
            .unwrap();
        assert!(dir.get(&n).unwrap().contains("description", "x"));

        assert!(matches!(
            dir.modify(&name("cn=missing"), &[]),
            Err(Error::NoSuchEntry(_))
        ));
    }

    #[test]
    fn test_search_scopes() {
        let dir = seeded();
        let base = name("ou=system");
        let count = |scope| {
            dir.search(&base, scope, &SearchFilter::Any)
                .unwrap()
                .count()
        };
        assert_eq!(count(SearchScope::Object), 1);
        assert_eq!(count(SearchScope::OneLevel), 1);
        assert_eq!(count(SearchScope::Subtree), 3);
    }

    #[test]
    fn test_search_filter() {
        let dir = seeded();
        let people = dir
            .search(
                &name("ou=system"),
                SearchScope::Subtree,
                &SearchFilter::ObjectClass("person".into()),
            )
            .unwrap()
            .count();
        assert_eq!(people, 2);
    }

    #[test]
    fn test_rename_rewrites_subtree() {
        let dir = seeded();
        dir.rename(&name("cn=a,ou=system"), &name("cn=z,ou=other"))
            .unwrap();
        assert!(dir.get(&name("cn=a,ou=system")).is_none());
        assert!(dir.get(&name("cn=z,ou=other")).is_some());
        assert!(dir.get(&name("cn=b,cn=z,ou=other")).is_some());
    }

    #[test]
    fn test_modify_failure_injection() {
        let dir = seeded();
        let n = name("cn=a,ou=system");
        dir.fail_modifies_after(1);
        assert!(dir.modify(&n, &[]).is_ok());
        assert!(matches!(dir.modify(&n, &[]), Err(Error::Directory(_))));
        dir.clear_modify_failures();
        assert!(dir.modify(&n, &[]).is_ok());
    }
}
