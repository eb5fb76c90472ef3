//! Change records
//!
//! Immutable descriptions of one difference between exactly two versions.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::conflict::TypeConflict;
use crate::model::FieldSnapshot;

/// Kind of change for fields, messages and enums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Added,
    Removed,
    Renamed,
    TypeChanged,
    NumberChanged,
    Moved,
    LabelChanged,
    Modified,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "ADDED",
            Self::Removed => "REMOVED",
            Self::Renamed => "RENAMED",
            Self::TypeChanged => "TYPE_CHANGED",
            Self::NumberChanged => "NUMBER_CHANGED",
            Self::Moved => "MOVED",
            Self::LabelChanged => "LABEL_CHANGED",
            Self::Modified => "MODIFIED",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of change for a single enum value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueChangeKind {
    ValueAdded,
    ValueRemoved,
    ValueNumberChanged,
}

impl ValueChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValueAdded => "VALUE_ADDED",
            Self::ValueRemoved => "VALUE_REMOVED",
            Self::ValueNumberChanged => "VALUE_NUMBER_CHANGED",
        }
    }
}

impl fmt::Display for ValueChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Field changes
// =============================================================================

/// One differing field between two versions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    /// Field name in the "to" version (the "from" name for removals)
    pub field_name: String,
    /// Previous name when `kind` is `Renamed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renamed_from: Option<String>,
    pub kind: ChangeKind,
    pub before: Option<FieldSnapshot>,
    pub after: Option<FieldSnapshot>,
    /// Classification for `TypeChanged`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<TypeConflict>,
    /// Secondary differences folded into this record
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration_hint: Option<String>,
}

impl FieldChange {
    pub(crate) fn new(field_name: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            field_name: field_name.into(),
            renamed_from: None,
            kind,
            before: None,
            after: None,
            conflict: None,
            notes: Vec::new(),
            migration_hint: None,
        }
    }

    pub(crate) fn with_before(mut self, snapshot: &FieldSnapshot) -> Self {
        self.before = Some(snapshot.clone());
        self
    }

    pub(crate) fn with_after(mut self, snapshot: &FieldSnapshot) -> Self {
        self.after = Some(snapshot.clone());
        self
    }

    pub(crate) fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.migration_hint = Some(hint.into());
        self
    }

    /// "int32 = 2" style rendering of the old shape
    pub fn before_shape(&self) -> Option<String> {
        self.before.as_ref().map(FieldSnapshot::shape)
    }

    pub fn after_shape(&self) -> Option<String> {
        self.after.as_ref().map(FieldSnapshot::shape)
    }

    /// One-line human-readable description
    pub fn summary(&self) -> String {
        let before = self.before_shape().unwrap_or_default();
        let after = self.after_shape().unwrap_or_default();
        match self.kind {
            ChangeKind::Added => format!("added field {} ({})", self.field_name, after),
            ChangeKind::Removed => format!("removed field {} ({})", self.field_name, before),
            ChangeKind::Renamed => format!(
                "renamed field {} -> {}",
                self.renamed_from.as_deref().unwrap_or("?"),
                self.field_name
            ),
            ChangeKind::TypeChanged => {
                let conflict = self.conflict.map(|c| c.to_string()).unwrap_or_default();
                format!("type of {} changed: {} -> {} [{}]", self.field_name, before, after, conflict)
            }
            ChangeKind::LabelChanged => format!("cardinality of {} changed: {} -> {}", self.field_name, before, after),
            ChangeKind::NumberChanged => format!("number of {} changed: {} -> {}", self.field_name, before, after),
            ChangeKind::Modified | ChangeKind::Moved => {
                format!("{} changed: {}", self.field_name, self.notes.join("; "))
            }
        }
    }
}

// =============================================================================
// Enum value changes
// =============================================================================

/// One differing enum value between two versions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValueChange {
    pub value_name: String,
    pub kind: ValueChangeKind,
    pub before: Option<i32>,
    pub after: Option<i32>,
}

impl EnumValueChange {
    pub fn summary(&self) -> String {
        match (self.kind, self.before, self.after) {
            (ValueChangeKind::ValueAdded, _, Some(n)) => format!("added value {} = {}", self.value_name, n),
            (ValueChangeKind::ValueRemoved, Some(n), _) => format!("removed value {} = {}", self.value_name, n),
            (ValueChangeKind::ValueNumberChanged, Some(a), Some(b)) => {
                format!("number of {} changed: {} -> {}", self.value_name, a, b)
            }
            _ => format!("{} {}", self.kind, self.value_name),
        }
    }
}

// =============================================================================
// Message and enum diffs
// =============================================================================

/// Changes of one message between two versions, nested types included
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageDiff {
    /// Qualified path ("Order.Item")
    pub path: String,
    /// `Added`, `Removed` or `Modified`
    pub kind: ChangeKind,
    pub field_changes: Vec<FieldChange>,
    pub nested_messages: Vec<MessageDiff>,
    pub nested_enums: Vec<EnumDiff>,
}

impl MessageDiff {
    pub fn name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    pub fn added_fields(&self) -> impl Iterator<Item = &FieldChange> {
        self.field_changes.iter().filter(|c| c.kind == ChangeKind::Added)
    }

    pub fn removed_fields(&self) -> impl Iterator<Item = &FieldChange> {
        self.field_changes.iter().filter(|c| c.kind == ChangeKind::Removed)
    }

    pub fn field_change(&self, name: &str) -> Option<&FieldChange> {
        self.field_changes.iter().find(|c| c.field_name == name)
    }

    /// Total records in this diff and everything nested under it
    pub fn change_count(&self) -> usize {
        let own = match self.kind {
            ChangeKind::Modified => self.field_changes.len(),
            _ => 1,
        };
        own + self.nested_messages.iter().map(MessageDiff::change_count).sum::<usize>()
            + self.nested_enums.iter().map(EnumDiff::change_count).sum::<usize>()
    }
}

/// Changes of one enum between two versions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumDiff {
    pub path: String,
    /// `Added`, `Removed`, `Moved` or `Modified`
    pub kind: ChangeKind,
    /// Path the enum occupied in the "from" version when `Moved`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moved_from: Option<String>,
    pub value_changes: Vec<EnumValueChange>,
}

impl EnumDiff {
    pub fn name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    pub fn value_change(&self, name: &str) -> Option<&EnumValueChange> {
        self.value_changes.iter().find(|c| c.value_name == name)
    }

    pub fn change_count(&self) -> usize {
        match self.kind {
            ChangeKind::Modified => self.value_changes.len(),
            _ => 1 + self.value_changes.len(),
        }
    }
}
