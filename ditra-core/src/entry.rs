//! Entries: multi-valued string attributes keyed case-insensitively.
//!
//! `Entry` is the attribute-container capability the evaluators and the
//! maintenance engine work against. Attribute names are looked up by
//! normalized (lowercased) key; the original casing of the first writer is
//! preserved for display. Value comparison is case-insensitive throughout,
//! which covers both objectClass values and normalized-name strings.

use crate::vocab::attr;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// A single multi-valued attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    values: Vec<String>,
}

impl Attribute {
    /// Create an attribute with the given values.
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Attribute name as originally written.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute values in insertion order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// First value, if any.
    pub fn first(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// Case-insensitive value membership.
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v.eq_ignore_ascii_case(value))
    }

    /// Add a value unless an equal one (case-insensitive) is present.
    pub fn add(&mut self, value: impl Into<String>) {
        let value = value.into();
        if !self.contains(&value) {
            self.values.push(value);
        }
    }

    /// Remove all values equal (case-insensitive) to the given one.
    pub fn remove(&mut self, value: &str) {
        self.values.retain(|v| !v.eq_ignore_ascii_case(value));
    }

    /// True when no values remain.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Modification operator for a single attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModOp {
    /// Add the listed values (creating the attribute if absent)
    Add,
    /// Replace the attribute's values wholesale
    Replace,
    /// Remove the listed values; empty value list removes the attribute
    Remove,
}

/// One attribute modification within a modification list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    /// Operator
    pub op: ModOp,
    /// Attribute name
    pub attribute: String,
    /// Values the operator applies to
    pub values: Vec<String>,
}

impl Modification {
    /// Add-values modification.
    pub fn add(attribute: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            op: ModOp::Add,
            attribute: attribute.into(),
            values,
        }
    }

    /// Replace-values modification.
    pub fn replace(attribute: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            op: ModOp::Replace,
            attribute: attribute.into(),
            values,
        }
    }

    /// Remove-values modification (empty `values` removes the attribute).
    pub fn remove(attribute: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            op: ModOp::Remove,
            attribute: attribute.into(),
            values,
        }
    }
}

/// An entry: named multi-valued attributes with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    /// Normalized (lowercase) attribute name -> attribute
    attrs: FxHashMap<String, Attribute>,
}

impl Entry {
    /// Empty entry.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(name: &str) -> String {
        name.to_ascii_lowercase()
    }

    /// Look up an attribute by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attrs.get(&Self::key(name))
    }

    /// True when the attribute exists with at least one value.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.get(name).is_some_and(|a| !a.is_empty())
    }

    /// First value of the named attribute, if any.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Attribute::first)
    }

    /// Case-insensitive test for a value of the named attribute.
    pub fn contains(&self, name: &str, value: &str) -> bool {
        self.get(name).is_some_and(|a| a.contains(value))
    }

    /// Set an attribute wholesale, replacing any previous values.
    pub fn put(&mut self, name: impl Into<String>, values: Vec<String>) {
        let name = name.into();
        self.attrs
            .insert(Self::key(&name), Attribute::new(name, values));
    }

    /// Add a value to an attribute, creating the attribute if absent.
    pub fn add_value(&mut self, name: &str, value: impl Into<String>) {
        match self.attrs.get_mut(&Self::key(name)) {
            Some(attr) => attr.add(value),
            None => self.put(name, vec![value.into()]),
        }
    }

    /// Remove a value; the attribute disappears when its last value goes.
    pub fn remove_value(&mut self, name: &str, value: &str) {
        let key = Self::key(name);
        if let Some(attr) = self.attrs.get_mut(&key) {
            attr.remove(value);
            if attr.is_empty() {
                self.attrs.remove(&key);
            }
        }
    }

    /// Remove an attribute entirely.
    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        self.attrs.remove(&Self::key(name))
    }

    /// Iterate attributes in arbitrary order.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attrs.values()
    }

    /// True when the entry has no attributes.
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// The entry's objectClass values, lowercased, as a set.
    pub fn object_classes(&self) -> FxHashSet<String> {
        self.get(attr::OBJECT_CLASS)
            .map(|a| {
                a.values()
                    .iter()
                    .map(|v| v.to_ascii_lowercase())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Apply one modification in place.
    pub fn apply(&mut self, modification: &Modification) {
        match modification.op {
            ModOp::Add => {
                for value in &modification.values {
                    self.add_value(&modification.attribute, value.clone());
                }
            }
            ModOp::Replace => {
                if modification.values.is_empty() {
                    self.remove_attribute(&modification.attribute);
                } else {
                    self.put(modification.attribute.clone(), modification.values.clone());
                }
            }
            ModOp::Remove => {
                if modification.values.is_empty() {
                    self.remove_attribute(&modification.attribute);
                } else {
                    for value in &modification.values {
                        self.remove_value(&modification.attribute, value);
                    }
                }
            }
        }
    }

    /// Apply a modification list in order.
    pub fn apply_all(&mut self, modifications: &[Modification]) {
        for m in modifications {
            self.apply(m);
        }
    }
}
