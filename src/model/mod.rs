//! Merged Schema Model
//!
//! The unified, version-spanning model produced by the merger.
//!
//! Architecture:
//! - Arena: messages and enums live in flat vectors addressed by id
//! - Ownership is tree-shaped: each nested entity has exactly one parent id,
//!   assigned at insertion and never changed
//! - Identity is the structural path ("Outer.Middle.Inner"), resolved through
//!   a path table that is only written while the merge runs
//!
//! Once `SchemaBuilder::finish` returns, the schema is read-only.

pub mod enumeration;
pub mod field;
pub mod message;

pub use enumeration::{MergedEnum, MergedEnumValue};
pub use field::{FieldSnapshot, MergedField, MergedOneof};
pub use message::MergedMessage;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{Result, WrapgenError};

/// Index of a message in the schema arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MessageId(usize);

/// Index of an enum in the schema arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EnumId(usize);

/// Either kind of schema entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityId {
    Message(MessageId),
    Enum(EnumId),
}

// =============================================================================
// MergedSchema
// =============================================================================

/// Root container of the unified model
#[derive(Debug, Clone, Serialize)]
pub struct MergedSchema {
    versions: Vec<String>,
    messages: Vec<MergedMessage>,
    enums: Vec<MergedEnum>,
    roots: Vec<EntityId>,
    message_paths: IndexMap<String, MessageId>,
    enum_paths: IndexMap<String, EnumId>,
    /// nested enum path -> equivalent top-level enum name
    equivalent_enums: IndexMap<String, String>,
}

impl MergedSchema {
    /// Version ids in declaration order
    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    pub fn has_version(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }

    pub fn message(&self, id: MessageId) -> &MergedMessage {
        &self.messages[id.0]
    }

    pub fn enumeration(&self, id: EnumId) -> &MergedEnum {
        &self.enums[id.0]
    }

    /// Top-level messages and enums in first-seen order
    pub fn roots(&self) -> &[EntityId] {
        &self.roots
    }

    pub fn top_level_messages(&self) -> impl Iterator<Item = MessageId> + '_ {
        self.roots.iter().filter_map(|e| match e {
            EntityId::Message(id) => Some(*id),
            EntityId::Enum(_) => None,
        })
    }

    pub fn top_level_enums(&self) -> impl Iterator<Item = EnumId> + '_ {
        self.roots.iter().filter_map(|e| match e {
            EntityId::Enum(id) => Some(*id),
            EntityId::Message(_) => None,
        })
    }

    pub fn nested_messages(&self, id: MessageId) -> impl Iterator<Item = MessageId> + '_ {
        self.message(id).nested().iter().filter_map(|e| match e {
            EntityId::Message(id) => Some(*id),
            EntityId::Enum(_) => None,
        })
    }

    pub fn nested_enums(&self, id: MessageId) -> impl Iterator<Item = EnumId> + '_ {
        self.message(id).nested().iter().filter_map(|e| match e {
            EntityId::Enum(id) => Some(*id),
            EntityId::Message(_) => None,
        })
    }

    /// Look up a message by structural path
    pub fn find_message(&self, path: &str) -> Option<MessageId> {
        self.message_paths.get(path).copied()
    }

    /// Look up an enum by structural path
    pub fn find_enum(&self, path: &str) -> Option<EnumId> {
        self.enum_paths.get(path).copied()
    }

    /// Top-level message by simple name
    pub fn message_named(&self, name: &str) -> Option<&MergedMessage> {
        self.find_message(name).map(|id| self.message(id))
    }

    /// Top-level enum by simple name
    pub fn enum_named(&self, name: &str) -> Option<&MergedEnum> {
        self.find_enum(name).map(|id| self.enumeration(id))
    }

    /// Qualified path of a message, computed through parent ids
    pub fn message_path(&self, id: MessageId) -> String {
        let message = self.message(id);
        match message.parent() {
            Some(parent) => format!("{}.{}", self.message_path(parent), message.name()),
            None => message.name().to_string(),
        }
    }

    pub fn enum_path(&self, id: EnumId) -> String {
        let enumeration = self.enumeration(id);
        match enumeration.parent() {
            Some(parent) => format!("{}.{}", self.message_path(parent), enumeration.name()),
            None => enumeration.name().to_string(),
        }
    }

    pub fn path_of(&self, entity: EntityId) -> String {
        match entity {
            EntityId::Message(id) => self.message_path(id),
            EntityId::Enum(id) => self.enum_path(id),
        }
    }

    /// Every message, pre-order: a message before its nested messages
    pub fn all_messages(&self) -> Vec<MessageId> {
        let mut out = Vec::with_capacity(self.messages.len());
        for root in self.top_level_messages() {
            self.collect_messages(root, &mut out);
        }
        out
    }

    fn collect_messages(&self, id: MessageId, out: &mut Vec<MessageId>) {
        out.push(id);
        for nested in self.nested_messages(id) {
            self.collect_messages(nested, out);
        }
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn enum_count(&self) -> usize {
        self.enums.len()
    }

    /// Nested enums structurally equivalent to a top-level enum
    pub fn equivalent_enums(&self) -> &IndexMap<String, String> {
        &self.equivalent_enums
    }

    /// Top-level enum that a nested enum path is unified with
    pub fn equivalent_top_level(&self, nested_path: &str) -> Option<&str> {
        self.equivalent_enums.get(nested_path).map(String::as_str)
    }
}

// =============================================================================
// SchemaBuilder
// =============================================================================

/// Incremental construction of a merged schema.
///
/// Only the merger writes through this type; `finish` freezes the result.
#[derive(Debug)]
pub(crate) struct SchemaBuilder {
    schema: MergedSchema,
}

impl SchemaBuilder {
    pub(crate) fn new(versions: Vec<String>) -> Self {
        Self {
            schema: MergedSchema {
                versions,
                messages: Vec::new(),
                enums: Vec::new(),
                roots: Vec::new(),
                message_paths: IndexMap::new(),
                enum_paths: IndexMap::new(),
                equivalent_enums: IndexMap::new(),
            },
        }
    }

    pub(crate) fn schema(&self) -> &MergedSchema {
        &self.schema
    }

    fn child_path(&self, parent: Option<MessageId>, name: &str) -> String {
        match parent {
            Some(parent) => format!("{}.{}", self.schema.message_path(parent), name),
            None => name.to_string(),
        }
    }

    /// Resolve the message at `parent.name`, creating it on first sight
    pub(crate) fn message_at(&mut self, parent: Option<MessageId>, name: &str) -> Result<MessageId> {
        let path = self.child_path(parent, name);
        if let Some(id) = self.schema.message_paths.get(&path) {
            return Ok(*id);
        }
        if let Some(clash) = self.schema.enum_paths.get(&path) {
            let versions = self.schema.enums[clash.0].versions().to_string();
            return Err(kind_clash(&path, "an enum", &versions));
        }
        let id = MessageId(self.schema.messages.len());
        self.schema.messages.push(MergedMessage::new(name, parent));
        self.schema.message_paths.insert(path, id);
        self.attach(parent, EntityId::Message(id))?;
        Ok(id)
    }

    /// Resolve the enum at `parent.name`, creating it on first sight
    pub(crate) fn enum_at(&mut self, parent: Option<MessageId>, name: &str) -> Result<EnumId> {
        let path = self.child_path(parent, name);
        if let Some(id) = self.schema.enum_paths.get(&path) {
            return Ok(*id);
        }
        if let Some(clash) = self.schema.message_paths.get(&path) {
            let versions = self.schema.messages[clash.0].versions().to_string();
            return Err(kind_clash(&path, "a message", &versions));
        }
        let id = EnumId(self.schema.enums.len());
        self.schema.enums.push(MergedEnum::new(name, parent));
        self.schema.enum_paths.insert(path, id);
        self.attach(parent, EntityId::Enum(id))?;
        Ok(id)
    }

    /// Link a freshly created entity to its owner.
    ///
    /// An entity already listed under a different owner is rejected.
    fn attach(&mut self, parent: Option<MessageId>, child: EntityId) -> Result<()> {
        let owners: Vec<MessageId> = self
            .schema
            .messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.nested().contains(&child))
            .map(|(i, _)| MessageId(i))
            .collect();
        let already_root = self.schema.roots.contains(&child);

        match parent {
            Some(parent) => {
                if already_root || owners.iter().any(|o| *o != parent) {
                    return Err(self.reparent_error(child, owners.first().copied()));
                }
                self.schema.messages[parent.0].push_nested(child);
            }
            None => {
                if let Some(owner) = owners.first() {
                    return Err(self.reparent_error(child, Some(*owner)));
                }
                if !already_root {
                    self.schema.roots.push(child);
                }
            }
        }
        Ok(())
    }

    fn reparent_error(&self, child: EntityId, owner: Option<MessageId>) -> WrapgenError {
        let child = self.schema.path_of(child);
        let parent = owner
            .map(|o| self.schema.message_path(o))
            .unwrap_or_else(|| "<root>".to_string());
        WrapgenError::Reparent { child, parent }
    }

    pub(crate) fn message_mut(&mut self, id: MessageId) -> &mut MergedMessage {
        &mut self.schema.messages[id.0]
    }

    pub(crate) fn enum_mut(&mut self, id: EnumId) -> &mut MergedEnum {
        &mut self.schema.enums[id.0]
    }

    pub(crate) fn record_equivalent_enum(&mut self, nested_path: String, top_level: String) {
        self.schema.equivalent_enums.insert(nested_path, top_level);
    }

    pub(crate) fn finish(self) -> MergedSchema {
        self.schema
    }
}

/// One path cannot name a message in some versions and an enum in others
fn kind_clash(path: &str, existing: &str, versions: &str) -> WrapgenError {
    WrapgenError::InvalidInput(format!(
        "'{}' is already {} in versions {}; a path cannot name both a message and an enum",
        path, existing, versions
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_identity() {
        let mut builder = SchemaBuilder::new(vec!["v1".into()]);
        let order = builder.message_at(None, "Order").unwrap();
        let item = builder.message_at(Some(order), "Item").unwrap();
        let again = builder.message_at(Some(order), "Item").unwrap();
        let status = builder.enum_at(Some(item), "Status").unwrap();
        assert_eq!(item, again);

        let schema = builder.finish();
        assert_eq!(schema.message_path(item), "Order.Item");
        assert_eq!(schema.enum_path(status), "Order.Item.Status");
        assert_eq!(schema.find_message("Order.Item"), Some(item));
        assert_eq!(schema.message(item).parent(), Some(order));
        assert_eq!(schema.roots(), &[EntityId::Message(order)]);
        assert_eq!(schema.all_messages(), vec![order, item]);
    }

    #[test]
    fn test_reparenting_is_rejected() {
        let mut builder = SchemaBuilder::new(vec!["v1".into()]);
        let order = builder.message_at(None, "Order").unwrap();
        let invoice = builder.message_at(None, "Invoice").unwrap();
        let item = builder.message_at(Some(order), "Item").unwrap();

        let err = builder.attach(Some(invoice), EntityId::Message(item)).unwrap_err();
        match err {
            WrapgenError::Reparent { child, parent } => {
                assert_eq!(child, "Order.Item");
                assert_eq!(parent, "Order");
            }
            other => panic!("expected Reparent, got {:?}", other),
        }

        let err = builder.attach(None, EntityId::Message(item)).unwrap_err();
        assert!(matches!(err, WrapgenError::Reparent { .. }));
    }
}
