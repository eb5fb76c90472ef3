//! Messages unified across versions

use indexmap::IndexMap;
use serde::Serialize;

use super::field::{FieldSnapshot, MergedField, MergedOneof};
use super::{EntityId, MessageId};
use crate::version::VersionSet;

/// One message type unified across versions
#[derive(Debug, Clone, Serialize)]
pub struct MergedMessage {
    name: String,
    parent: Option<MessageId>,
    nested: Vec<EntityId>,
    versions: VersionSet,
    fields: Vec<MergedField>,
    oneofs: Vec<MergedOneof>,
    source_files: IndexMap<String, String>,
}

impl MergedMessage {
    pub(crate) fn new(name: impl Into<String>, parent: Option<MessageId>) -> Self {
        Self {
            name: name.into(),
            parent,
            nested: Vec::new(),
            versions: VersionSet::new(),
            fields: Vec::new(),
            oneofs: Vec::new(),
            source_files: IndexMap::new(),
        }
    }

    pub(crate) fn add_version(&mut self, version: &str) {
        self.versions.insert(version);
    }

    pub(crate) fn add_source_file(&mut self, version: &str, file: &str) {
        self.source_files.insert(version.to_string(), file.to_string());
    }

    pub(crate) fn push_nested(&mut self, child: EntityId) {
        if !self.nested.contains(&child) {
            self.nested.push(child);
        }
    }

    /// Record a field's shape for one version, matching by name
    pub(crate) fn add_field_version(&mut self, name: &str, version: &str, snapshot: FieldSnapshot) {
        match self.fields.iter_mut().find(|f| f.name() == name) {
            Some(field) => field.add_version(version, snapshot),
            None => self.fields.push(MergedField::new(name, version, snapshot)),
        }
    }

    pub(crate) fn oneof_mut(&mut self, name: &str) -> &mut MergedOneof {
        let index = match self.oneofs.iter().position(|o| o.name() == name) {
            Some(index) => index,
            None => {
                self.oneofs.push(MergedOneof::new(name));
                self.oneofs.len() - 1
            }
        };
        &mut self.oneofs[index]
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning message, `None` for top-level messages
    pub fn parent(&self) -> Option<MessageId> {
        self.parent
    }

    pub fn is_nested(&self) -> bool {
        self.parent.is_some()
    }

    /// Nested messages and enums in first-seen order
    pub fn nested(&self) -> &[EntityId] {
        &self.nested
    }

    pub fn versions(&self) -> &VersionSet {
        &self.versions
    }

    pub fn is_present_in(&self, version: &str) -> bool {
        self.versions.contains(version)
    }

    pub fn fields(&self) -> &[MergedField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&MergedField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Fields present with a compatible shape in every version
    pub fn common_fields(&self) -> impl Iterator<Item = &MergedField> {
        self.fields.iter().filter(move |f| f.is_common(&self.versions))
    }

    /// Fields missing from at least one version
    pub fn version_specific_fields(&self) -> impl Iterator<Item = &MergedField> {
        self.fields.iter().filter(move |f| !f.is_universal(&self.versions))
    }

    /// Fields declared in the given version, in merged order
    pub fn fields_in(&self, version: &str) -> impl Iterator<Item = &MergedField> + '_ {
        let version = version.to_string();
        self.fields.iter().filter(move |f| f.is_present_in(&version))
    }

    pub fn oneofs(&self) -> &[MergedOneof] {
        &self.oneofs
    }

    pub fn oneof(&self, name: &str) -> Option<&MergedOneof> {
        self.oneofs.iter().find(|o| o.name() == name)
    }

    pub fn source_file(&self, version: &str) -> Option<&str> {
        self.source_files.get(version).map(String::as_str)
    }
}
