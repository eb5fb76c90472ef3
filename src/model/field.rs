//! Fields and oneofs unified across versions

use indexmap::IndexMap;
use serde::Serialize;

use crate::descriptor::{Cardinality, FieldDescriptor, FieldType};
use crate::version::VersionSet;

/// Shape of a field in one version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSnapshot {
    pub number: i32,
    pub field_type: FieldType,
    pub cardinality: Cardinality,
    pub oneof: Option<String>,
}

impl FieldSnapshot {
    /// Compact shape string, e.g. "repeated int64 = 3"
    pub fn shape(&self) -> String {
        let mut out = String::new();
        if self.cardinality.is_repeated() {
            out.push_str("repeated ");
        }
        out.push_str(&self.field_type.to_string());
        out.push_str(&format!(" = {}", self.number));
        if let Some(oneof) = &self.oneof {
            out.push_str(&format!(" (oneof {})", oneof));
        }
        out
    }
}

impl From<&FieldDescriptor> for FieldSnapshot {
    fn from(field: &FieldDescriptor) -> Self {
        Self {
            number: field.number,
            field_type: field.field_type.clone(),
            cardinality: field.cardinality,
            oneof: field.oneof.clone(),
        }
    }
}

/// One field matched by name across all versions of its message
#[derive(Debug, Clone, Serialize)]
pub struct MergedField {
    name: String,
    snapshots: IndexMap<String, FieldSnapshot>,
}

impl MergedField {
    pub(crate) fn new(name: impl Into<String>, version: &str, snapshot: FieldSnapshot) -> Self {
        let mut snapshots = IndexMap::new();
        snapshots.insert(version.to_string(), snapshot);
        Self {
            name: name.into(),
            snapshots,
        }
    }

    pub(crate) fn add_version(&mut self, version: &str, snapshot: FieldSnapshot) {
        self.snapshots.insert(version.to_string(), snapshot);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Versions in which the field exists
    pub fn versions(&self) -> VersionSet {
        self.snapshots.keys().map(String::as_str).collect()
    }

    pub fn snapshot(&self, version: &str) -> Option<&FieldSnapshot> {
        self.snapshots.get(version)
    }

    pub fn snapshots(&self) -> impl Iterator<Item = (&str, &FieldSnapshot)> {
        self.snapshots.iter().map(|(v, s)| (v.as_str(), s))
    }

    /// Snapshot from the first version that declares the field
    pub fn first_snapshot(&self) -> &FieldSnapshot {
        &self.snapshots[0]
    }

    pub fn is_present_in(&self, version: &str) -> bool {
        self.snapshots.contains_key(version)
    }

    /// Present under this name in every version of the owning message
    pub fn is_universal(&self, message_versions: &VersionSet) -> bool {
        message_versions.iter().all(|v| self.is_present_in(v))
    }

    /// Universal, and with the same type and cardinality everywhere
    pub fn is_common(&self, message_versions: &VersionSet) -> bool {
        self.is_universal(message_versions) && !self.has_type_conflict() && !self.has_cardinality_conflict()
    }

    pub fn has_type_conflict(&self) -> bool {
        let first = &self.first_snapshot().field_type;
        self.snapshots.values().any(|s| !s.field_type.same_shape(first))
    }

    pub fn has_cardinality_conflict(&self) -> bool {
        let first = self.first_snapshot().cardinality;
        self.snapshots.values().any(|s| s.cardinality != first)
    }

    pub fn has_number_conflict(&self) -> bool {
        let first = self.first_snapshot().number;
        self.snapshots.values().any(|s| s.number != first)
    }

    pub fn is_repeated_anywhere(&self) -> bool {
        self.snapshots.values().any(|s| s.cardinality.is_repeated())
    }

    /// Oneof membership in the given version
    pub fn oneof_in(&self, version: &str) -> Option<&str> {
        self.snapshot(version).and_then(|s| s.oneof.as_deref())
    }

    /// Distinct declared types in first-seen order
    pub fn distinct_types(&self) -> Vec<&FieldType> {
        let mut types: Vec<&FieldType> = Vec::new();
        for snapshot in self.snapshots.values() {
            if !types.iter().any(|t| t.same_shape(&snapshot.field_type)) {
                types.push(&snapshot.field_type);
            }
        }
        types
    }
}

/// A oneof group unified across versions
#[derive(Debug, Clone, Serialize)]
pub struct MergedOneof {
    name: String,
    versions: VersionSet,
    members: Vec<String>,
}

impl MergedOneof {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            versions: VersionSet::new(),
            members: Vec::new(),
        }
    }

    pub(crate) fn add_version(&mut self, version: &str) {
        self.versions.insert(version);
    }

    pub(crate) fn add_member(&mut self, field: &str) {
        if !self.members.iter().any(|m| m == field) {
            self.members.push(field.to_string());
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn versions(&self) -> &VersionSet {
        &self.versions
    }

    /// Member field names across all versions, first-seen order
    pub fn members(&self) -> &[String] {
        &self.members
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ScalarType;

    fn snapshot(number: i32, field_type: FieldType) -> FieldSnapshot {
        FieldSnapshot {
            number,
            field_type,
            cardinality: Cardinality::Singular,
            oneof: None,
        }
    }

    #[test]
    fn test_universal_and_common() {
        let all: VersionSet = ["v1", "v2"].into_iter().collect();

        let mut id = MergedField::new("id", "v1", snapshot(1, FieldType::Scalar(ScalarType::Int64)));
        id.add_version("v2", snapshot(7, FieldType::Scalar(ScalarType::Int64)));
        assert!(id.is_universal(&all));
        assert!(id.is_common(&all));
        assert!(id.has_number_conflict());

        let mut amount = MergedField::new("amount", "v1", snapshot(2, FieldType::Scalar(ScalarType::Int32)));
        amount.add_version("v2", snapshot(2, FieldType::Message("Money".into())));
        assert!(amount.is_universal(&all));
        assert!(!amount.is_common(&all));
        assert_eq!(amount.distinct_types().len(), 2);

        let note = MergedField::new("note", "v2", snapshot(3, FieldType::Scalar(ScalarType::String)));
        assert!(!note.is_universal(&all));
        assert!(!note.is_common(&all));
    }

    #[test]
    fn test_shape_string() {
        let mut s = snapshot(4, FieldType::Message("Order.Item".into()));
        s.cardinality = Cardinality::Repeated;
        assert_eq!(s.shape(), "repeated Item = 4");
        s.oneof = Some("payload".into());
        assert_eq!(s.shape(), "repeated Item = 4 (oneof payload)");
    }
}
