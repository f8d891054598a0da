//! The subentry maintenance engine.
//!
//! Reacts to add/delete/rename/move/modify of subentries and regular
//! entries: keeps the registry current, versions administrative points
//! through per-role sequence counters, and propagates or retracts the
//! role-specific operational attributes on selected entries.
//!
//! Every hook takes the next pipeline stage as a continuation and executes
//! its steps in a fixed order around it (register before delegating, sweep
//! after), so concurrent readers never observe a subentry without registry
//! backing. Sweeps are search-then-modify per candidate with no cross-entry
//! transaction: a failing candidate aborts the sweep and surfaces, leaving
//! earlier candidates updated. Callers must treat attribute maintenance as
//! best-effort eventually-consistent across a multi-entry sweep.

use crate::facade::{Directory, SearchFilter, SearchScope};
use ditra_core::entry::{Entry, Modification};
use ditra_core::error::{Error, Result};
use ditra_core::name::{Name, Rdn};
use ditra_core::refinement::SchemaNameResolver;
use ditra_core::registry::{Subentry, SubentryRegistry};
use ditra_core::roles::{AdministrativeRole, RoleSet};
use ditra_core::spec_parser::parse_subtree_specification;
use ditra_core::subtree::SubtreeEvaluator;
use ditra_core::vocab::{attr, oc};
use std::sync::Arc;
use tracing::debug;

/// Sequence-number value reported for an entry with no covering
/// administrative point. Distinct from `-1`, which is "role present but no
/// subentry ever added".
pub const SEQ_ABSENT: i64 = i64::MIN;

/// True when the entry carries the subentry marker object class.
pub fn is_subentry(entry: &Entry) -> bool {
    entry.contains(attr::OBJECT_CLASS, oc::SUBENTRY)
}

/// The maintenance engine. Stateless apart from its injected collaborators;
/// one instance serves the whole directory service.
pub struct SubentryMaintenance<D, R> {
    directory: Arc<D>,
    registry: Arc<SubentryRegistry>,
    evaluator: SubtreeEvaluator<R>,
}

impl<D: Directory, R: SchemaNameResolver> SubentryMaintenance<D, R> {
    /// Create an engine over the given directory, registry, and schema
    /// resolver.
    pub fn new(directory: Arc<D>, registry: Arc<SubentryRegistry>, resolver: R) -> Self {
        Self {
            directory,
            registry,
            evaluator: SubtreeEvaluator::new(resolver),
        }
    }

    /// The subentry registry this engine maintains.
    pub fn registry(&self) -> &Arc<SubentryRegistry> {
        &self.registry
    }

    /// One-time initialization sweep: register every subentry currently
    /// stored under the given naming contexts. Returns the number
    /// registered.
    pub fn bootstrap(&self, naming_contexts: &[Name]) -> Result<usize> {
        let filter = SearchFilter::ObjectClass(oc::SUBENTRY.to_string());
        let mut registered = 0;
        for context in naming_contexts {
            let results = self.directory.search(context, SearchScope::Subtree, &filter)?;
            for item in results {
                let (name, entry) = item?;
                let record = subentry_from_entry(&name, &entry)?;
                self.registry.put(record);
                registered += 1;
            }
        }
        debug!(registered, "subentry registry bootstrapped");
        Ok(registered)
    }

    /// The operational attributes (subentry references plus per-role
    /// sequence numbers) an entry added at `name` now would receive.
    pub fn compute_subentry_attributes(&self, name: &Name, entry: &Entry) -> Result<Entry> {
        let object_classes = entry.object_classes();
        let mut attrs = Entry::new();
        for subentry in self.registry.snapshot() {
            let Some(ap_name) = subentry.administrative_point() else {
                continue;
            };
            if !self
                .evaluator
                .evaluate(&subentry.spec, &ap_name, name, &object_classes)?
            {
                continue;
            }
            let ap_entry = self.lookup_required(&ap_name)?;
            let reference = subentry.name.to_string();
            for role in subentry.roles.iter() {
                attrs.add_value(role.operational_attribute(), reference.clone());
                attrs.put(
                    role.seq_number_attribute(),
                    vec![read_seq(&ap_entry, role).to_string()],
                );
            }
        }
        Ok(attrs)
    }

    /// Current sequence number governing `entry_name` for `role`: the
    /// counter of the nearest administrative point at or above the entry
    /// carrying the role, `-1` when that point has never issued for the
    /// role, or [`SEQ_ABSENT`] when no covering administrative point
    /// exists. An administrative point is governed by its own counter.
    pub fn sequence_number(&self, entry_name: &Name, role: AdministrativeRole) -> Result<i64> {
        let mut cursor = Some(entry_name.clone());
        while let Some(name) = cursor {
            if let Some(entry) = self.directory.lookup(&name)? {
                if RoleSet::from_administrative_point(&entry).contains(role) {
                    return Ok(read_seq(&entry, role));
                }
            }
            cursor = name.parent();
        }
        Ok(SEQ_ABSENT)
    }

    // ------------------------------------------------------------------
    // Mutation hooks
    // ------------------------------------------------------------------

    /// Add hook. For a subentry: validate the administrative point, register
    /// the record and bump counters before delegating, then retrofit every
    /// existing selected entry. For a regular entry: pre-populate its
    /// operational attributes so it is persisted with correct metadata.
    pub fn add<F>(&self, name: &Name, entry: &mut Entry, next: F) -> Result<()>
    where
        F: FnOnce(&Name, &Entry) -> Result<()>,
    {
        if is_subentry(entry) {
            self.add_subentry(name, entry, next)
        } else {
            let attrs = self.compute_subentry_attributes(name, entry)?;
            for attribute in attrs.attributes() {
                entry.put(attribute.name().to_string(), attribute.values().to_vec());
            }
            next(name, entry)
        }
    }

    fn add_subentry<F>(&self, name: &Name, entry: &Entry, next: F) -> Result<()>
    where
        F: FnOnce(&Name, &Entry) -> Result<()>,
    {
        let ap_name = name.parent().ok_or_else(|| {
            Error::no_administrative_point(format!("subentry '{name}' has no parent"))
        })?;
        let ap_entry = self.lookup_required(&ap_name)?;
        if RoleSet::from_administrative_point(&ap_entry).is_empty() {
            return Err(Error::no_administrative_point(format!(
                "'{ap_name}' declares no administrative role"
            )));
        }

        let record = subentry_from_entry(name, entry)?;

        // Register before delegating so concurrent searches see the subentry.
        self.registry.put(record.clone());
        self.bump_counters(&ap_name, record.roles)?;
        next(name, entry)?;

        // Retrofit pass over entries already stored in the selected region.
        self.sweep_add(&record, &ap_name)
    }

    /// Delete hook. For a subentry: deregister (capturing its scope),
    /// delegate, strip its references from previously selected entries, and
    /// bump counters to signal the membership change. For a regular entry:
    /// reject when the entry is or contains an administrative point with
    /// subordinates still governed by it.
    pub fn delete<F>(&self, name: &Name, next: F) -> Result<()>
    where
        F: FnOnce(&Name) -> Result<()>,
    {
        let entry = self.lookup_required(name)?;
        if is_subentry(&entry) {
            let captured = match self.registry.remove(name) {
                Some(record) => record,
                // Never registered (inconsistent store); nothing to strip.
                None => return next(name),
            };
            let ap_name = captured.administrative_point().ok_or_else(|| {
                Error::no_administrative_point(format!("subentry '{name}' has no parent"))
            })?;
            next(name)?;
            self.sweep_remove(&captured, &ap_name)?;
            // The subentry is gone but its administrative point's view
            // changed; cached consumers key off the counters.
            self.bump_counters(&ap_name, captured.roles)
        } else {
            // An administrative point with subordinates, or anything holding
            // an administrative point beneath it, may not be deleted.
            let is_ap = entry.has_attribute(attr::ADMINISTRATIVE_ROLE);
            let (any_subordinate, admin_subordinate) = self.scan_subordinates(name)?;
            if (is_ap && any_subordinate) || admin_subordinate {
                return Err(Error::not_allowed_on_non_leaf(format!(
                    "'{name}' still governs administrative subordinates"
                )));
            }
            next(name)
        }
    }

    /// Rename hook (same parent, new RDN).
    pub fn rename<F>(&self, name: &Name, new_rdn: Rdn, next: F) -> Result<()>
    where
        F: FnOnce(&Name, &Name) -> Result<()>,
    {
        let new_name = name.with_rdn(new_rdn).ok_or_else(|| {
            Error::not_allowed_on_rdn("cannot rename the root entry".to_string())
        })?;
        self.relocate(name, &new_name, false, next)
    }

    /// Move hook (new parent, same RDN).
    pub fn move_to<F>(&self, name: &Name, new_parent: &Name, next: F) -> Result<()>
    where
        F: FnOnce(&Name, &Name) -> Result<()>,
    {
        let rdn = name.rdn().cloned().ok_or_else(|| {
            Error::not_allowed_on_rdn("cannot move the root entry".to_string())
        })?;
        self.relocate(name, &new_parent.child(rdn), true, next)
    }

    /// Combined move-and-rename hook.
    pub fn move_and_rename<F>(
        &self,
        name: &Name,
        new_parent: &Name,
        new_rdn: Rdn,
        next: F,
    ) -> Result<()>
    where
        F: FnOnce(&Name, &Name) -> Result<()>,
    {
        self.relocate(name, &new_parent.child(new_rdn), true, next)
    }

    fn relocate<F>(&self, name: &Name, new_name: &Name, moved: bool, next: F) -> Result<()>
    where
        F: FnOnce(&Name, &Name) -> Result<()>,
    {
        let entry = self.lookup_required(name)?;
        if is_subentry(&entry) {
            self.relocate_subentry(name, new_name, moved, &entry, next)
        } else {
            self.relocate_entry(name, new_name, &entry, next)
        }
    }

    fn relocate_subentry<F>(
        &self,
        name: &Name,
        new_name: &Name,
        moved: bool,
        entry: &Entry,
        next: F,
    ) -> Result<()>
    where
        F: FnOnce(&Name, &Name) -> Result<()>,
    {
        let ap_name = new_name.parent().ok_or_else(|| {
            Error::no_administrative_point(format!("subentry '{new_name}' has no parent"))
        })?;
        if moved {
            let ap_entry = self.lookup_required(&ap_name)?;
            if RoleSet::from_administrative_point(&ap_entry).is_empty() {
                return Err(Error::no_administrative_point(format!(
                    "'{ap_name}' declares no administrative role"
                )));
            }
        }

        let old_ap = name.parent().ok_or_else(|| {
            Error::no_administrative_point(format!("subentry '{name}' has no parent"))
        })?;
        let record = match self.registry.get(name) {
            Some(record) => (*record).clone(),
            None => subentry_from_entry(name, entry)?,
        };
        let renamed = Subentry {
            name: new_name.clone(),
            ..record.clone()
        };

        // New key in before the move, old key out after: a concurrent
        // reader must always find at least one of the two.
        self.registry.put(renamed.clone());
        next(name, new_name)?;
        if name == new_name {
            // Rename to the current RDN: the put above already replaced the
            // record in place; removing the key here would deregister it.
            return Ok(());
        }
        self.registry.remove(name);

        if old_ap == ap_name {
            // Pure relabeling: membership is unchanged, counters stay put.
            return self.sweep_rename(&renamed, &ap_name, &name.to_string());
        }

        // The governed region moved with the subentry: strip the old
        // region, version both points, then tag the new region.
        self.sweep_remove(&record, &old_ap)?;
        self.bump_counters(&old_ap, record.roles)?;
        self.bump_counters(&ap_name, renamed.roles)?;
        self.sweep_add(&renamed, &ap_name)
    }

    fn relocate_entry<F>(&self, name: &Name, new_name: &Name, entry: &Entry, next: F) -> Result<()>
    where
        F: FnOnce(&Name, &Name) -> Result<()>,
    {
        // Administrative points and their ancestors stay put.
        if entry.has_attribute(attr::ADMINISTRATIVE_ROLE) || self.scan_subordinates(name)?.1 {
            return Err(Error::not_allowed_on_rdn(format!(
                "'{name}' is or contains an administrative point"
            )));
        }
        next(name, new_name)?;

        let object_classes = entry.object_classes();
        let mut mods = Vec::new();
        for subentry in self.registry.snapshot() {
            let Some(ap_name) = subentry.administrative_point() else {
                continue;
            };
            let before =
                self.evaluator
                    .evaluate(&subentry.spec, &ap_name, name, &object_classes)?;
            let after =
                self.evaluator
                    .evaluate(&subentry.spec, &ap_name, new_name, &object_classes)?;
            if before != after {
                self.push_flip_mods(&mut mods, &subentry, &ap_name, after)?;
            }
        }
        if mods.is_empty() {
            return Ok(());
        }
        self.directory.modify(new_name, &mods)
    }

    /// Modify hook. A subentry whose subtree specification or object
    /// classes change gets its registry record swapped (parse first — a bad
    /// specification rejects the operation before any state changes),
    /// counters bumped, and both the old and the new regions swept. A
    /// regular entry whose object classes change is re-evaluated against
    /// every registered subentry and receives one delta modification.
    pub fn modify<F>(&self, name: &Name, modifications: &[Modification], next: F) -> Result<()>
    where
        F: FnOnce(&Name, &[Modification]) -> Result<()>,
    {
        let entry = self.lookup_required(name)?;
        let touches = |a: &str| {
            modifications
                .iter()
                .any(|m| m.attribute.eq_ignore_ascii_case(a))
        };

        if is_subentry(&entry) {
            if !touches(attr::SUBTREE_SPECIFICATION) && !touches(attr::OBJECT_CLASS) {
                return next(name, modifications);
            }
            self.modify_subentry(name, &entry, modifications, next)
        } else {
            if !touches(attr::OBJECT_CLASS) {
                return next(name, modifications);
            }
            self.modify_entry(name, &entry, modifications, next)
        }
    }

    fn modify_subentry<F>(
        &self,
        name: &Name,
        entry: &Entry,
        modifications: &[Modification],
        next: F,
    ) -> Result<()>
    where
        F: FnOnce(&Name, &[Modification]) -> Result<()>,
    {
        let ap_name = name.parent().ok_or_else(|| {
            Error::no_administrative_point(format!("subentry '{name}' has no parent"))
        })?;

        let mut new_entry = entry.clone();
        new_entry.apply_all(modifications);
        // Parse before touching registry state: a bad specification rejects
        // the whole operation.
        let renewed = subentry_from_entry(name, &new_entry)?;
        let new_roles = renewed.roles;

        let old = match self.registry.remove(name) {
            Some(record) => (*record).clone(),
            None => subentry_from_entry(name, entry)?,
        };
        self.registry.put(renewed.clone());
        self.bump_counters(&ap_name, old.roles.union(new_roles))?;
        next(name, modifications)?;

        // Strip the old region, then tag the new one.
        self.sweep_remove(&old, &ap_name)?;
        self.sweep_add(&renewed, &ap_name)
    }

    fn modify_entry<F>(
        &self,
        name: &Name,
        entry: &Entry,
        modifications: &[Modification],
        next: F,
    ) -> Result<()>
    where
        F: FnOnce(&Name, &[Modification]) -> Result<()>,
    {
        next(name, modifications)?;

        let old_classes = entry.object_classes();
        let mut new_entry = entry.clone();
        new_entry.apply_all(modifications);
        let new_classes = new_entry.object_classes();
        if old_classes == new_classes {
            return Ok(());
        }

        let mut mods = Vec::new();
        for subentry in self.registry.snapshot() {
            let Some(ap_name) = subentry.administrative_point() else {
                continue;
            };
            let before = self
                .evaluator
                .evaluate(&subentry.spec, &ap_name, name, &old_classes)?;
            let after = self
                .evaluator
                .evaluate(&subentry.spec, &ap_name, name, &new_classes)?;
            if before != after {
                self.push_flip_mods(&mut mods, &subentry, &ap_name, after)?;
            }
        }
        if mods.is_empty() {
            return Ok(());
        }
        self.directory.modify(name, &mods)
    }

    // ------------------------------------------------------------------
    // Sweeps
    // ------------------------------------------------------------------

    /// Tag every stored entry the subentry now selects.
    fn sweep_add(&self, subentry: &Subentry, ap_name: &Name) -> Result<()> {
        let ap_entry = self.lookup_required(ap_name)?;
        let base = ap_name.append(&subentry.spec.base);
        let reference = subentry.name.to_string();
        debug!(subentry = %subentry.name, base = %base, "add sweep");

        let results = self
            .directory
            .search(&base, SearchScope::Subtree, &SearchFilter::Any)?;
        for item in results {
            let (name, entry) = item?;
            if is_subentry(&entry) {
                continue;
            }
            if !self
                .evaluator
                .evaluate(&subentry.spec, ap_name, &name, &entry.object_classes())?
            {
                continue;
            }
            let mut mods = Vec::new();
            for role in subentry.roles.iter() {
                mods.push(Modification::add(
                    role.operational_attribute(),
                    vec![reference.clone()],
                ));
                mods.push(Modification::replace(
                    role.seq_number_attribute(),
                    vec![read_seq(&ap_entry, role).to_string()],
                ));
            }
            self.directory.modify(&name, &mods)?;
        }
        Ok(())
    }

    /// Strip the subentry's references from every entry in its region.
    fn sweep_remove(&self, subentry: &Subentry, ap_name: &Name) -> Result<()> {
        let base = ap_name.append(&subentry.spec.base);
        let reference = subentry.name.to_string();
        debug!(subentry = %subentry.name, base = %base, "remove sweep");

        let results = self
            .directory
            .search(&base, SearchScope::Subtree, &SearchFilter::Any)?;
        for item in results {
            let (name, entry) = item?;
            let mut mods = Vec::new();
            for role in subentry.roles.iter() {
                if entry.contains(role.operational_attribute(), &reference) {
                    mods.push(Modification::remove(
                        role.operational_attribute(),
                        vec![reference.clone()],
                    ));
                }
            }
            if !mods.is_empty() {
                self.directory.modify(&name, &mods)?;
            }
        }
        Ok(())
    }

    /// Replace the old reference value with the new one on every selected
    /// entry, one combined replace per attribute.
    fn sweep_rename(&self, subentry: &Subentry, ap_name: &Name, old_reference: &str) -> Result<()> {
        let base = ap_name.append(&subentry.spec.base);
        let new_reference = subentry.name.to_string();
        debug!(subentry = %new_reference, old = old_reference, "rename sweep");

        let results = self
            .directory
            .search(&base, SearchScope::Subtree, &SearchFilter::Any)?;
        for item in results {
            let (name, entry) = item?;
            let mut mods = Vec::new();
            for role in subentry.roles.iter() {
                let op_attr = role.operational_attribute();
                if !entry.contains(op_attr, old_reference) {
                    continue;
                }
                let values: Vec<String> = entry
                    .get(op_attr)
                    .map(|a| {
                        a.values()
                            .iter()
                            .map(|v| {
                                if v.eq_ignore_ascii_case(old_reference) {
                                    new_reference.clone()
                                } else {
                                    v.clone()
                                }
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                mods.push(Modification::replace(op_attr, values));
            }
            if !mods.is_empty() {
                self.directory.modify(&name, &mods)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn lookup_required(&self, name: &Name) -> Result<Entry> {
        self.directory
            .lookup(name)?
            .ok_or_else(|| Error::no_such_entry(name.to_string()))
    }

    /// Strictly increase the administrative point's counter for each role.
    fn bump_counters(&self, ap_name: &Name, roles: RoleSet) -> Result<()> {
        if roles.is_empty() {
            return Ok(());
        }
        let ap_entry = self.lookup_required(ap_name)?;
        let mods: Vec<Modification> = roles
            .iter()
            .map(|role| {
                Modification::replace(
                    role.seq_number_attribute(),
                    vec![next_seq(read_seq(&ap_entry, role)).to_string()],
                )
            })
            .collect();
        self.directory.modify(ap_name, &mods)
    }

    /// Delta modifications for an entry whose membership in `subentry`
    /// flipped: additions (with a fresh sequence number) when now selected,
    /// removals otherwise.
    fn push_flip_mods(
        &self,
        mods: &mut Vec<Modification>,
        subentry: &Subentry,
        ap_name: &Name,
        selected: bool,
    ) -> Result<()> {
        let reference = subentry.name.to_string();
        if selected {
            let ap_entry = self.lookup_required(ap_name)?;
            for role in subentry.roles.iter() {
                mods.push(Modification::add(
                    role.operational_attribute(),
                    vec![reference.clone()],
                ));
                mods.push(Modification::replace(
                    role.seq_number_attribute(),
                    vec![read_seq(&ap_entry, role).to_string()],
                ));
            }
        } else {
            for role in subentry.roles.iter() {
                mods.push(Modification::remove(
                    role.operational_attribute(),
                    vec![reference.clone()],
                ));
            }
        }
        Ok(())
    }

    /// Scan strict subordinates of `name`: returns (any subordinate exists,
    /// some subordinate is an administrative point).
    fn scan_subordinates(&self, name: &Name) -> Result<(bool, bool)> {
        let results =
            self.directory
                .search(name, SearchScope::Subtree, &SearchFilter::Any)?;
        let mut any = false;
        for item in results {
            let (descendant, descendant_entry) = item?;
            if &descendant == name {
                continue;
            }
            any = true;
            if descendant_entry.has_attribute(attr::ADMINISTRATIVE_ROLE) {
                return Ok((true, true));
            }
        }
        Ok((any, false))
    }
}

/// Build a registry record from a stored subentry's attributes.
fn subentry_from_entry(name: &Name, entry: &Entry) -> Result<Subentry> {
    let text = entry.first(attr::SUBTREE_SPECIFICATION).ok_or_else(|| {
        Error::invalid_subtree_specification(format!(
            "subentry '{name}' has no subtreeSpecification attribute"
        ))
    })?;
    let spec = parse_subtree_specification(text)?;
    Ok(Subentry {
        name: name.clone(),
        spec,
        roles: RoleSet::from_object_classes(&entry.object_classes()),
        common_name: entry.first(attr::CN).map(String::from),
    })
}

/// Read a role's sequence counter off an administrative point entry.
/// Unset reads as `-1`.
fn read_seq(entry: &Entry, role: AdministrativeRole) -> i64 {
    entry
        .first(role.seq_number_attribute())
        .and_then(|v| v.parse().ok())
        .unwrap_or(-1)
}

/// Successor of a counter value. Counters issue from 1; `-1` means the role
/// has never issued.
fn next_seq(current: i64) -> i64 {
    if current < 0 {
        1
    } else {
        current + 1
    }
}
