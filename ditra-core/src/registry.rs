//! The subentry registry: a process-wide concurrent map of active subentries.
//!
//! One record per normalized subentry name. All operations are independently
//! thread-safe; no multi-key atomicity is provided (callers order their own
//! insert-new-before-remove-old sequences). `snapshot()` hands out a fresh
//! traversal each call, so sweeps never hold the lock while doing I/O.

use crate::name::Name;
use crate::roles::RoleSet;
use crate::subtree::SubtreeSpecification;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// An active subentry: identity, scope, and roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subentry {
    /// Normalized subentry name (identity)
    pub name: Name,
    /// The governed region, relative to the administrative point
    pub spec: SubtreeSpecification,
    /// Roles this subentry administers
    pub roles: RoleSet,
    /// commonName, kept for diagnostics
    pub common_name: Option<String>,
}

impl Subentry {
    /// The administrative point this subentry hangs under (its parent).
    /// `None` only for a root-named subentry, which no valid add produces.
    pub fn administrative_point(&self) -> Option<Name> {
        self.name.parent()
    }
}

/// Registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Advisory size bound; inserts beyond it succeed and log a warning.
    pub soft_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            soft_capacity: 1000,
        }
    }
}

/// Concurrent map from normalized subentry name to its record.
#[derive(Debug, Default)]
pub struct SubentryRegistry {
    entries: RwLock<FxHashMap<Name, Arc<Subentry>>>,
    config: RegistryConfig,
}

impl SubentryRegistry {
    /// Registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Registry with an explicit configuration.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
            config,
        }
    }

    /// Look up a subentry by normalized name.
    pub fn get(&self, name: &Name) -> Option<Arc<Subentry>> {
        self.entries.read().get(name).cloned()
    }

    /// Insert or replace; returns the previous record for the name.
    ///
    /// The soft capacity is advisory: crossing it logs a warning but the
    /// insert proceeds (eviction would silently drop governance state).
    pub fn put(&self, subentry: Subentry) -> Option<Arc<Subentry>> {
        let name = subentry.name.clone();
        let mut entries = self.entries.write();
        let previous = entries.insert(name, Arc::new(subentry));
        if previous.is_none() && entries.len() > self.config.soft_capacity {
            warn!(
                size = entries.len(),
                soft_capacity = self.config.soft_capacity,
                "subentry registry exceeds its soft capacity"
            );
        }
        previous
    }

    /// Remove a subentry, returning its record.
    pub fn remove(&self, name: &Name) -> Option<Arc<Subentry>> {
        self.entries.write().remove(name)
    }

    /// Membership test by normalized name.
    pub fn contains(&self, name: &Name) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Number of registered subentries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// A fresh snapshot of all records. Concurrent mutations made after the
    /// snapshot is taken are not reflected in it.
    pub fn snapshot(&self) -> Vec<Arc<Subentry>> {
        self.entries.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subentry(name: &str) -> Subentry {
        Subentry {
            name: Name::parse(name).unwrap(),
            spec: SubtreeSpecification::whole_area(),
            roles: RoleSet::all(),
            common_name: None,
        }
    }

    #[test]
    fn test_put_get_remove() {
        let reg = SubentryRegistry::new();
        let name = Name::parse("cn=test,ou=system").unwrap();

        assert!(reg.put(subentry("cn=test,ou=system")).is_none());
        assert!(reg.contains(&name));
        assert_eq!(reg.get(&name).unwrap().name, name);
        assert_eq!(reg.len(), 1);

        let removed = reg.remove(&name).unwrap();
        assert_eq!(removed.name, name);
        assert!(reg.get(&name).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_replace_keeps_size_stable() {
        let reg = SubentryRegistry::new();
        reg.put(subentry("cn=test,ou=system"));
        // Same normalized name, different case.
        let previous = reg.put(subentry("CN=Test,OU=System"));
        assert!(previous.is_some());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let reg = SubentryRegistry::new();
        reg.put(subentry("cn=a,ou=system"));
        reg.put(subentry("cn=b,ou=system"));
        let snap = reg.snapshot();
        assert_eq!(snap.len(), 2);
        reg.remove(&Name::parse("cn=a,ou=system").unwrap());
        assert_eq!(snap.len(), 2);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_soft_capacity_does_not_reject() {
        let reg = SubentryRegistry::with_config(RegistryConfig { soft_capacity: 1 });
        reg.put(subentry("cn=a,ou=system"));
        reg.put(subentry("cn=b,ou=system"));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_administrative_point() {
        let s = subentry("cn=test,ou=system");
        assert_eq!(
            s.administrative_point().unwrap(),
            Name::parse("ou=system").unwrap()
        );
    }
}
