//! Enums unified across versions

use indexmap::IndexMap;
use serde::Serialize;

use super::MessageId;
use crate::version::VersionSet;

/// One enum value matched by name across versions
#[derive(Debug, Clone, Serialize)]
pub struct MergedEnumValue {
    name: String,
    numbers: IndexMap<String, i32>,
}

impl MergedEnumValue {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            numbers: IndexMap::new(),
        }
    }

    pub(crate) fn add_version(&mut self, version: &str, number: i32) {
        self.numbers.insert(version.to_string(), number);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn versions(&self) -> VersionSet {
        self.numbers.keys().map(String::as_str).collect()
    }

    pub fn number(&self, version: &str) -> Option<i32> {
        self.numbers.get(version).copied()
    }

    /// Number from the first version declaring the value
    pub fn first_number(&self) -> i32 {
        self.numbers.values().next().copied().unwrap_or_default()
    }

    pub fn numbers(&self) -> impl Iterator<Item = (&str, i32)> {
        self.numbers.iter().map(|(v, n)| (v.as_str(), *n))
    }

    pub fn has_number_conflict(&self) -> bool {
        let first = self.first_number();
        self.numbers.values().any(|n| *n != first)
    }
}

/// One enum type unified across versions
#[derive(Debug, Clone, Serialize)]
pub struct MergedEnum {
    name: String,
    parent: Option<MessageId>,
    versions: VersionSet,
    values: Vec<MergedEnumValue>,
}

impl MergedEnum {
    pub(crate) fn new(name: impl Into<String>, parent: Option<MessageId>) -> Self {
        Self {
            name: name.into(),
            parent,
            versions: VersionSet::new(),
            values: Vec::new(),
        }
    }

    pub(crate) fn add_version(&mut self, version: &str) {
        self.versions.insert(version);
    }

    pub(crate) fn value_mut(&mut self, name: &str) -> &mut MergedEnumValue {
        let index = match self.values.iter().position(|v| v.name() == name) {
            Some(index) => index,
            None => {
                self.values.push(MergedEnumValue::new(name));
                self.values.len() - 1
            }
        };
        &mut self.values[index]
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<MessageId> {
        self.parent
    }

    pub fn versions(&self) -> &VersionSet {
        &self.versions
    }

    pub fn is_present_in(&self, version: &str) -> bool {
        self.versions.contains(version)
    }

    pub fn values(&self) -> &[MergedEnumValue] {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&MergedEnumValue> {
        self.values.iter().find(|v| v.name() == name)
    }

    /// (name, number) pairs declared in one version
    pub fn values_in(&self, version: &str) -> Vec<(&str, i32)> {
        self.values
            .iter()
            .filter_map(|v| v.number(version).map(|n| (v.name(), n)))
            .collect()
    }
}
