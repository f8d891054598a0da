//! Hierarchical names (distinguished names).
//!
//! A [`Name`] is an immutable sequence of relative names (RDNs) stored
//! root-first, so ancestry tests are prefix tests. Equality, hashing, and
//! ordering are over the normalized form (ASCII-lowercased, trimmed), which
//! also gives B-tree keyed stores a stable order with parents sorting before
//! their subordinates.
//!
//! The textual form is the usual leaf-first LDAP rendering
//! (`cn=leaf,ou=mid,o=root`). Parsing is deliberately minimal: single-valued
//! RDNs, backslash-escaped `,` and `=` inside values, no hex escapes.

use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A single relative name component (`attribute=value`).
///
/// Comparison, hashing, and ordering are case-insensitive over both parts.
#[derive(Debug, Clone)]
pub struct Rdn {
    attribute: String,
    value: String,
}

impl Rdn {
    /// Create an RDN from an attribute/value pair. Both sides are trimmed;
    /// the original case is preserved for display.
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into().trim().to_string(),
            value: value.into().trim().to_string(),
        }
    }

    /// Attribute type of this RDN.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Attribute value of this RDN.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl PartialEq for Rdn {
    fn eq(&self, other: &Self) -> bool {
        self.attribute.eq_ignore_ascii_case(&other.attribute)
            && self.value.eq_ignore_ascii_case(&other.value)
    }
}

impl Eq for Rdn {}

impl Hash for Rdn {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.attribute.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
        state.write_u8(b'=');
        for b in self.value.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl Ord for Rdn {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self
            .attribute
            .bytes()
            .chain(std::iter::once(b'='))
            .chain(self.value.bytes())
            .map(|b| b.to_ascii_lowercase());
        let rhs = other
            .attribute
            .bytes()
            .chain(std::iter::once(b'='))
            .chain(other.value.bytes())
            .map(|b| b.to_ascii_lowercase());
        lhs.cmp(rhs)
    }
}

impl PartialOrd for Rdn {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.attribute, escape_value(&self.value))
    }
}

/// A hierarchical name: RDN sequence stored root-first.
///
/// The empty name is the root; every non-empty name is a strict descendant
/// of the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
    rdns: SmallVec<[Rdn; 4]>,
}

impl Name {
    /// The empty (root) name.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a leaf-first textual name (`cn=x,ou=y`). Empty input parses to
    /// the root name.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::root());
        }
        let mut rdns: SmallVec<[Rdn; 4]> = SmallVec::new();
        for component in split_unescaped(text, ',') {
            let component = component.trim();
            if component.is_empty() {
                return Err(Error::invalid_name(format!(
                    "empty component in '{text}'"
                )));
            }
            let mut halves = split_unescaped(component, '=');
            let attribute = halves.next().unwrap_or_default();
            let value = match halves.next() {
                Some(v) => v,
                None => {
                    return Err(Error::invalid_name(format!(
                        "component '{component}' has no '='"
                    )))
                }
            };
            if halves.next().is_some() {
                return Err(Error::invalid_name(format!(
                    "component '{component}' has more than one unescaped '='"
                )));
            }
            if attribute.trim().is_empty() || value.trim().is_empty() {
                return Err(Error::invalid_name(format!(
                    "component '{component}' has an empty attribute or value"
                )));
            }
            rdns.push(Rdn::new(attribute, unescape(&value)));
        }
        // Input is leaf-first; storage is root-first.
        rdns.reverse();
        Ok(Self { rdns })
    }

    /// Number of RDN components.
    pub fn len(&self) -> usize {
        self.rdns.len()
    }

    /// True for the root name.
    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    /// The leaf (least significant) RDN, if any.
    pub fn rdn(&self) -> Option<&Rdn> {
        self.rdns.last()
    }

    /// RDN components, root-first.
    pub fn rdns(&self) -> &[Rdn] {
        &self.rdns
    }

    /// Parent name, or `None` for the root.
    pub fn parent(&self) -> Option<Name> {
        if self.rdns.is_empty() {
            return None;
        }
        Some(Name {
            rdns: self.rdns[..self.rdns.len() - 1].iter().cloned().collect(),
        })
    }

    /// Name of a direct subordinate.
    pub fn child(&self, rdn: Rdn) -> Name {
        let mut rdns = self.rdns.clone();
        rdns.push(rdn);
        Name { rdns }
    }

    /// Append a relative name beneath this one.
    pub fn append(&self, relative: &Name) -> Name {
        let mut rdns = self.rdns.clone();
        rdns.extend(relative.rdns.iter().cloned());
        Name { rdns }
    }

    /// Same name with the leaf RDN replaced. `None` for the root.
    pub fn with_rdn(&self, rdn: Rdn) -> Option<Name> {
        if self.rdns.is_empty() {
            return None;
        }
        let mut rdns = self.rdns.clone();
        *rdns.last_mut().unwrap() = rdn;
        Some(Name { rdns })
    }

    /// True iff `self` is a strict descendant of `ancestor` (never true for
    /// equal names).
    pub fn is_descendant_of(&self, ancestor: &Name) -> bool {
        self.rdns.len() > ancestor.rdns.len()
            && self.rdns[..ancestor.rdns.len()] == ancestor.rdns[..]
    }

    /// The suffix of `self` relative to `ancestor`: the root name when the
    /// two are equal, the remaining components when `self` is a strict
    /// descendant, `None` otherwise.
    pub fn relative_to(&self, ancestor: &Name) -> Option<Name> {
        if self == ancestor {
            return Some(Name::root());
        }
        if !self.is_descendant_of(ancestor) {
            return None;
        }
        Some(Name {
            rdns: self.rdns[ancestor.rdns.len()..].iter().cloned().collect(),
        })
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rdn) in self.rdns.iter().rev().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{rdn}")?;
        }
        Ok(())
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Name::parse(s)
    }
}

/// Split on an unescaped separator, keeping backslash escapes intact.
fn split_unescaped(text: &str, sep: char) -> impl Iterator<Item = String> + '_ {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for ch in text.chars() {
        if escaped {
            current.push('\\');
            current.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == sep {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    if escaped {
        current.push('\\');
    }
    parts.push(current);
    parts.into_iter()
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut escaped = false;
    for ch in value.chars() {
        if escaped {
            out.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else {
            out.push(ch);
        }
    }
    out
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == ',' || ch == '=' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        Name::parse(s).unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let n = name("cn=Test, ou=System , o=Example");
        assert_eq!(n.len(), 3);
        assert_eq!(n.to_string(), "cn=Test,ou=System,o=Example");
        assert_eq!(n.rdn().unwrap().attribute(), "cn");
        assert_eq!(n.rdn().unwrap().value(), "Test");
    }

    #[test]
    fn test_root_name() {
        let root = Name::parse("").unwrap();
        assert!(root.is_empty());
        assert_eq!(root.to_string(), "");
        assert_eq!(root.parent(), None);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Name::parse("cn").is_err());
        assert!(Name::parse("cn=a,,ou=b").is_err());
        assert!(Name::parse("=x").is_err());
        assert!(Name::parse("cn=a=b").is_err());
    }

    #[test]
    fn test_escaped_separator() {
        let n = name(r"cn=Smith\, John,ou=People");
        assert_eq!(n.len(), 2);
        assert_eq!(n.rdn().unwrap().value(), "Smith, John");
        assert_eq!(name(&n.to_string()), n);
    }

    #[test]
    fn test_case_insensitive_equality() {
        assert_eq!(name("CN=Test,OU=System"), name("cn=test,ou=system"));
    }

    #[test]
    fn test_descendant_and_relative() {
        let ap = name("ou=system");
        let entry = name("cn=e1,ou=users,ou=system");
        assert!(entry.is_descendant_of(&ap));
        assert!(!ap.is_descendant_of(&entry));
        assert!(!ap.is_descendant_of(&ap));

        let rel = entry.relative_to(&ap).unwrap();
        assert_eq!(rel, name("cn=e1,ou=users"));
        assert_eq!(ap.relative_to(&ap).unwrap(), Name::root());
        assert_eq!(name("ou=other").relative_to(&ap), None);

        // Everything is a strict descendant of the root.
        assert!(entry.is_descendant_of(&Name::root()));
    }

    #[test]
    fn test_parent_child_append() {
        let base = name("ou=system");
        let child = base.child(Rdn::new("cn", "sub"));
        assert_eq!(child, name("cn=sub,ou=system"));
        assert_eq!(child.parent().unwrap(), base);

        let rel = name("cn=a,ou=b");
        assert_eq!(base.append(&rel), name("cn=a,ou=b,ou=system"));
        assert_eq!(base.append(&Name::root()), base);
    }

    #[test]
    fn test_with_rdn() {
        let n = name("cn=test,ou=system");
        let renamed = n.with_rdn(Rdn::new("cn", "test1")).unwrap();
        assert_eq!(renamed, name("cn=test1,ou=system"));
        assert!(Name::root().with_rdn(Rdn::new("cn", "x")).is_none());
    }

    #[test]
    fn test_ordering_parents_first() {
        let mut names = vec![
            name("cn=b,ou=system"),
            name("ou=system"),
            name("cn=a,ou=system"),
            Name::root(),
        ];
        names.sort();
        assert_eq!(names[0], Name::root());
        assert_eq!(names[1], name("ou=system"));
        assert_eq!(names[2], name("cn=a,ou=system"));
    }
}
