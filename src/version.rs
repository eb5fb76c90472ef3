//! Schema version identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered set of version ids.
///
/// Order follows the declaration order of the merge run, which is how every
/// version set in a merged schema gets populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionSet(Vec<String>);

impl VersionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a version, keeping first-insertion order
    pub fn insert(&mut self, version: &str) -> bool {
        if self.contains(version) {
            return false;
        }
        self.0.push(version.to_string());
        true
    }

    pub fn contains(&self, version: &str) -> bool {
        self.0.iter().any(|v| v == version)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every version of `other` is also in this set
    pub fn is_superset_of(&self, other: &VersionSet) -> bool {
        other.iter().all(|v| self.contains(v))
    }
}

impl fmt::Display for VersionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

impl<'a> FromIterator<&'a str> for VersionSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = Self::new();
        for version in iter {
            set.insert(version);
        }
        set
    }
}

/// Type-name suffix for a version id ("v1" -> "V1", "v2_beta" -> "V2Beta")
pub fn type_suffix(version: &str) -> String {
    let mut result = String::with_capacity(version.len());
    let mut capitalize_next = true;
    for c in version.chars() {
        if !c.is_ascii_alphanumeric() {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }
    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, 'V');
    }
    result
}

/// Package segment for a version id ("v1.2" -> "v1_2")
pub fn package_segment(version: &str) -> String {
    let segment: String = version
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if segment.starts_with(|c: char| c.is_ascii_digit()) {
        format!("v{}", segment)
    } else {
        segment
    }
}

/// Constant name for a version id ("v1" -> "V1", "v2-beta" -> "V2_BETA")
pub fn constant_name(version: &str) -> String {
    let constant: String = version
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    if constant.starts_with(|c: char| c.is_ascii_digit()) {
        format!("V{}", constant)
    } else {
        constant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_set_keeps_insertion_order() {
        let mut set = VersionSet::new();
        assert!(set.insert("v2"));
        assert!(set.insert("v1"));
        assert!(!set.insert("v2"));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["v2", "v1"]);
        assert_eq!(set.to_string(), "[v2, v1]");
    }

    #[test]
    fn test_superset() {
        let all: VersionSet = ["v1", "v2", "v3"].into_iter().collect();
        let some: VersionSet = ["v3", "v1"].into_iter().collect();
        assert!(all.is_superset_of(&some));
        assert!(!some.is_superset_of(&all));
    }

    #[test]
    fn test_name_derivations() {
        assert_eq!(type_suffix("v1"), "V1");
        assert_eq!(type_suffix("v2_beta"), "V2Beta");
        assert_eq!(type_suffix("2024"), "V2024");
        assert_eq!(package_segment("v1.2"), "v1_2");
        assert_eq!(package_segment("3"), "v3");
        assert_eq!(constant_name("v2-beta"), "V2_BETA");
    }
}
