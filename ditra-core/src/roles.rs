//! Administrative roles and role sets.
//!
//! Each subentry carries one or more of the four specific administrative
//! roles, derived from its object classes. Administrative points declare
//! areas through the `administrativeRole` attribute; `autonomousArea`
//! expands to all four specific areas.

use crate::entry::Entry;
use crate::vocab::{attr, oc, op_attr, role_value, seq_attr};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four specific administrative roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdministrativeRole {
    /// Access-control administration
    AccessControl,
    /// Collective-attribute administration
    CollectiveAttribute,
    /// Subschema administration
    Subschema,
    /// Trigger-execution administration
    TriggerExecution,
}

impl AdministrativeRole {
    /// All four roles, in a fixed order.
    pub const ALL: [AdministrativeRole; 4] = [
        AdministrativeRole::AccessControl,
        AdministrativeRole::CollectiveAttribute,
        AdministrativeRole::Subschema,
        AdministrativeRole::TriggerExecution,
    ];

    /// The subentry object class that confers this role.
    pub fn subentry_object_class(self) -> &'static str {
        match self {
            AdministrativeRole::AccessControl => oc::ACCESS_CONTROL_SUBENTRY,
            AdministrativeRole::CollectiveAttribute => oc::COLLECTIVE_ATTRIBUTE_SUBENTRY,
            AdministrativeRole::Subschema => oc::SUBSCHEMA,
            AdministrativeRole::TriggerExecution => oc::TRIGGER_EXECUTION_SUBENTRY,
        }
    }

    /// The operational attribute recording which subentries of this role
    /// select an entry.
    pub fn operational_attribute(self) -> &'static str {
        match self {
            AdministrativeRole::AccessControl => op_attr::ACCESS_CONTROL_SUBENTRIES,
            AdministrativeRole::CollectiveAttribute => op_attr::COLLECTIVE_ATTRIBUTE_SUBENTRIES,
            AdministrativeRole::Subschema => op_attr::SUBSCHEMA_SUBENTRY,
            AdministrativeRole::TriggerExecution => op_attr::TRIGGER_EXECUTION_SUBENTRIES,
        }
    }

    /// The sequence-number attribute versioning this role on an
    /// administrative point (and on selected entries).
    pub fn seq_number_attribute(self) -> &'static str {
        match self {
            AdministrativeRole::AccessControl => seq_attr::ACCESS_CONTROL,
            AdministrativeRole::CollectiveAttribute => seq_attr::COLLECTIVE_ATTRIBUTE,
            AdministrativeRole::Subschema => seq_attr::SUBSCHEMA,
            AdministrativeRole::TriggerExecution => seq_attr::TRIGGER_EXECUTION,
        }
    }

    fn bit(self) -> u8 {
        match self {
            AdministrativeRole::AccessControl => 1,
            AdministrativeRole::CollectiveAttribute => 1 << 1,
            AdministrativeRole::Subschema => 1 << 2,
            AdministrativeRole::TriggerExecution => 1 << 3,
        }
    }
}

impl fmt::Display for AdministrativeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AdministrativeRole::AccessControl => "accessControl",
            AdministrativeRole::CollectiveAttribute => "collectiveAttribute",
            AdministrativeRole::Subschema => "subschema",
            AdministrativeRole::TriggerExecution => "triggerExecution",
        };
        f.write_str(s)
    }
}

/// A set of administrative roles (at most four members).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RoleSet(u8);

impl RoleSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set containing all four roles.
    pub fn all() -> Self {
        let mut set = Self::new();
        for role in AdministrativeRole::ALL {
            set.insert(role);
        }
        set
    }

    /// Insert a role.
    pub fn insert(&mut self, role: AdministrativeRole) {
        self.0 |= role.bit();
    }

    /// Membership test.
    pub fn contains(&self, role: AdministrativeRole) -> bool {
        self.0 & role.bit() != 0
    }

    /// True when no role is present.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of roles present.
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Set union.
    pub fn union(&self, other: RoleSet) -> RoleSet {
        RoleSet(self.0 | other.0)
    }

    /// Iterate members in the fixed role order.
    pub fn iter(&self) -> impl Iterator<Item = AdministrativeRole> + '_ {
        AdministrativeRole::ALL
            .into_iter()
            .filter(|r| self.contains(*r))
    }

    /// Roles conferred by a subentry's object classes (lowercased set, as
    /// produced by [`Entry::object_classes`]).
    pub fn from_object_classes(object_classes: &FxHashSet<String>) -> Self {
        let mut set = Self::new();
        for role in AdministrativeRole::ALL {
            if object_classes.contains(&role.subentry_object_class().to_ascii_lowercase()) {
                set.insert(role);
            }
        }
        set
    }

    /// Areas declared by an administrative point's `administrativeRole`
    /// attribute. `autonomousArea` expands to all four roles; specific and
    /// inner area values map to their role. Unrecognized values are ignored
    /// (add-time validation of the attribute happens upstream).
    pub fn from_administrative_point(entry: &Entry) -> Self {
        let mut set = Self::new();
        let Some(attr) = entry.get(attr::ADMINISTRATIVE_ROLE) else {
            return set;
        };
        for value in attr.values() {
            if value.eq_ignore_ascii_case(role_value::AUTONOMOUS_AREA) {
                return Self::all();
            }
            let role = if value.eq_ignore_ascii_case(role_value::ACCESS_CONTROL_SPECIFIC_AREA)
                || value.eq_ignore_ascii_case(role_value::ACCESS_CONTROL_INNER_AREA)
            {
                Some(AdministrativeRole::AccessControl)
            } else if value.eq_ignore_ascii_case(role_value::COLLECTIVE_ATTRIBUTE_SPECIFIC_AREA)
                || value.eq_ignore_ascii_case(role_value::COLLECTIVE_ATTRIBUTE_INNER_AREA)
            {
                Some(AdministrativeRole::CollectiveAttribute)
            } else if value.eq_ignore_ascii_case(role_value::SUBSCHEMA_ADMIN_SPECIFIC_AREA) {
                Some(AdministrativeRole::Subschema)
            } else if value.eq_ignore_ascii_case(role_value::TRIGGER_EXECUTION_SPECIFIC_AREA)
                || value.eq_ignore_ascii_case(role_value::TRIGGER_EXECUTION_INNER_AREA)
            {
                Some(AdministrativeRole::TriggerExecution)
            } else {
                None
            };
            if let Some(role) = role {
                set.insert(role);
            }
        }
        set
    }
}

impl FromIterator<AdministrativeRole> for RoleSet {
    fn from_iter<I: IntoIterator<Item = AdministrativeRole>>(iter: I) -> Self {
        let mut set = Self::new();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, role) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{role}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_set_basics() {
        let mut set = RoleSet::new();
        assert!(set.is_empty());
        set.insert(AdministrativeRole::AccessControl);
        set.insert(AdministrativeRole::AccessControl);
        assert_eq!(set.len(), 1);
        assert!(set.contains(AdministrativeRole::AccessControl));
        assert!(!set.contains(AdministrativeRole::Subschema));
        assert_eq!(RoleSet::all().len(), 4);
    }

    #[test]
    fn test_roles_from_object_classes() {
        let mut e = Entry::new();
        e.put(
            "objectClass",
            vec![
                "top".into(),
                "subentry".into(),
                "collectiveAttributeSubentry".into(),
                "accessControlSubentry".into(),
            ],
        );
        let roles = RoleSet::from_object_classes(&e.object_classes());
        assert!(roles.contains(AdministrativeRole::CollectiveAttribute));
        assert!(roles.contains(AdministrativeRole::AccessControl));
        assert!(!roles.contains(AdministrativeRole::TriggerExecution));
        assert_eq!(roles.len(), 2);
    }

    #[test]
    fn test_autonomous_area_expands_to_all() {
        let mut e = Entry::new();
        e.put("administrativeRole", vec!["autonomousArea".into()]);
        assert_eq!(RoleSet::from_administrative_point(&e), RoleSet::all());
    }

    #[test]
    fn test_specific_and_inner_areas() {
        let mut e = Entry::new();
        e.put(
            "administrativeRole",
            vec![
                "collectiveAttributeSpecificArea".into(),
                "accessControlInnerArea".into(),
            ],
        );
        let roles = RoleSet::from_administrative_point(&e);
        assert!(roles.contains(AdministrativeRole::CollectiveAttribute));
        assert!(roles.contains(AdministrativeRole::AccessControl));
        assert_eq!(roles.len(), 2);
    }

    #[test]
    fn test_no_administrative_role_attribute() {
        let e = Entry::new();
        assert!(RoleSet::from_administrative_point(&e).is_empty());
    }
}
