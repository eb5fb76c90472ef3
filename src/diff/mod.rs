//! Diff & Conflict Classifier
//!
//! Compares two versions inside one merged schema and produces ordered
//! change records.
//!
//! Rules per field, first match wins:
//! 1. presence: ADDED / REMOVED
//! 2. declared type: TYPE_CHANGED, classified through `TypeConflict`
//! 3. cardinality: LABEL_CHANGED
//! 4. number: NUMBER_CHANGED
//! 5. oneof membership: MODIFIED
//!
//! A field yields at most one record; lower-priority differences become notes
//! on it. Output follows merge order, pre-order through nested types.

pub mod change;
pub mod conflict;

pub use change::{ChangeKind, EnumDiff, EnumValueChange, FieldChange, MessageDiff, ValueChangeKind};
pub use conflict::TypeConflict;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codegen::names;
use crate::error::{Result, WrapgenError};
use crate::model::{EntityId, EnumId, FieldSnapshot, MergedEnum, MergedMessage, MergedSchema, MessageId};

/// Explicit pairing of a removed field name with an added one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameHint {
    /// Qualified message path ("Order.Item")
    pub message: String,
    pub from: String,
    pub to: String,
}

/// Diff settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOptions {
    #[serde(default)]
    pub renames: Vec<RenameHint>,
}

impl DiffOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `from` -> `to` in `message` as one renamed field
    pub fn rename(mut self, message: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.renames.push(RenameHint {
            message: message.into(),
            from: from.into(),
            to: to.into(),
        });
        self
    }
}

/// Every change between two versions of a merged schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDiff {
    pub from: String,
    pub to: String,
    /// Top-level message diffs; nested diffs hang off their parents
    pub messages: Vec<MessageDiff>,
    pub enums: Vec<EnumDiff>,
}

impl SchemaDiff {
    pub fn into_parts(self) -> (Vec<MessageDiff>, Vec<EnumDiff>) {
        (self.messages, self.enums)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.enums.is_empty()
    }

    /// Find a message diff by qualified path, searching nested diffs
    pub fn message(&self, path: &str) -> Option<&MessageDiff> {
        fn find<'a>(diffs: &'a [MessageDiff], path: &str) -> Option<&'a MessageDiff> {
            diffs.iter().find_map(|d| {
                if d.path == path {
                    Some(d)
                } else {
                    find(&d.nested_messages, path)
                }
            })
        }
        find(&self.messages, path)
    }

    /// Find an enum diff by qualified path, searching nested diffs
    pub fn enumeration(&self, path: &str) -> Option<&EnumDiff> {
        fn find<'a>(diffs: &'a [MessageDiff], path: &str) -> Option<&'a EnumDiff> {
            diffs.iter().find_map(|d| {
                d.nested_enums
                    .iter()
                    .find(|e| e.path == path)
                    .or_else(|| find(&d.nested_messages, path))
            })
        }
        self.enums.iter().find(|e| e.path == path).or_else(|| find(&self.messages, path))
    }

    pub fn change_count(&self) -> usize {
        self.messages.iter().map(MessageDiff::change_count).sum::<usize>()
            + self.enums.iter().map(EnumDiff::change_count).sum::<usize>()
    }
}

/// Diff two versions with default options
pub fn diff(schema: &MergedSchema, from: &str, to: &str) -> Result<SchemaDiff> {
    diff_with(schema, from, to, &DiffOptions::default())
}

/// Diff two versions
pub fn diff_with(schema: &MergedSchema, from: &str, to: &str, options: &DiffOptions) -> Result<SchemaDiff> {
    for version in [from, to] {
        if !schema.has_version(version) {
            return Err(WrapgenError::UnknownVersion(version.to_string()));
        }
    }

    let engine = DiffEngine {
        schema,
        from,
        to,
        options,
    };

    let mut messages = Vec::new();
    let mut enums = Vec::new();
    for root in schema.roots() {
        match root {
            EntityId::Message(id) => messages.extend(engine.diff_message(*id)),
            EntityId::Enum(id) => enums.extend(engine.diff_enum(*id)),
        }
    }

    let result = SchemaDiff {
        from: from.to_string(),
        to: to.to_string(),
        messages,
        enums,
    };
    debug!(from, to, changes = result.change_count(), "diff complete");
    Ok(result)
}

struct DiffEngine<'a> {
    schema: &'a MergedSchema,
    from: &'a str,
    to: &'a str,
    options: &'a DiffOptions,
}

impl DiffEngine<'_> {
    fn diff_message(&self, id: MessageId) -> Option<MessageDiff> {
        let message = self.schema.message(id);
        let path = self.schema.message_path(id);

        let kind = match (message.is_present_in(self.from), message.is_present_in(self.to)) {
            (false, false) => return None,
            (true, false) => ChangeKind::Removed,
            (false, true) => ChangeKind::Added,
            (true, true) => ChangeKind::Modified,
        };
        if kind != ChangeKind::Modified {
            return Some(MessageDiff {
                path,
                kind,
                field_changes: Vec::new(),
                nested_messages: Vec::new(),
                nested_enums: Vec::new(),
            });
        }

        let field_changes = self.diff_fields(message, &path);
        let nested_messages: Vec<MessageDiff> = self
            .schema
            .nested_messages(id)
            .filter_map(|nested| self.diff_message(nested))
            .collect();
        let nested_enums: Vec<EnumDiff> = self
            .schema
            .nested_enums(id)
            .filter_map(|nested| self.diff_enum(nested))
            .collect();

        if field_changes.is_empty() && nested_messages.is_empty() && nested_enums.is_empty() {
            return None;
        }
        Some(MessageDiff {
            path,
            kind,
            field_changes,
            nested_messages,
            nested_enums,
        })
    }

    fn diff_fields(&self, message: &MergedMessage, path: &str) -> Vec<FieldChange> {
        let hints: Vec<&RenameHint> = self.options.renames.iter().filter(|h| h.message == path).collect();
        let mut consumed: HashSet<&str> = HashSet::new();
        let mut changes = Vec::new();

        for field in message.fields() {
            if consumed.contains(field.name()) {
                continue;
            }
            match (field.snapshot(self.from), field.snapshot(self.to)) {
                (None, None) => {}
                (Some(before), None) => {
                    let paired = hints
                        .iter()
                        .filter(|h| h.from == field.name())
                        .find_map(|h| self.rename_target(message, &h.to).map(|after| (h, after)));
                    match paired {
                        Some((hint, after)) => {
                            consumed.insert(hint.to.as_str());
                            changes.push(renamed(&hint.from, &hint.to, before, after));
                        }
                        None => changes.push(removed(field.name(), before)),
                    }
                }
                (None, Some(after)) => {
                    let paired = hints
                        .iter()
                        .filter(|h| h.to == field.name())
                        .find_map(|h| self.rename_source(message, &h.from).map(|before| (h, before)));
                    match paired {
                        Some((hint, before)) => {
                            consumed.insert(hint.from.as_str());
                            changes.push(renamed(&hint.from, &hint.to, before, after));
                        }
                        None => changes.push(added(field.name(), after)),
                    }
                }
                (Some(before), Some(after)) => changes.extend(compare(field.name(), before, after)),
            }
        }
        changes
    }

    /// Snapshot of a field that exists only in "to"
    fn rename_target<'m>(&self, message: &'m MergedMessage, name: &str) -> Option<&'m FieldSnapshot> {
        let field = message.field(name)?;
        match (field.snapshot(self.from), field.snapshot(self.to)) {
            (None, Some(after)) => Some(after),
            _ => None,
        }
    }

    /// Snapshot of a field that exists only in "from"
    fn rename_source<'m>(&self, message: &'m MergedMessage, name: &str) -> Option<&'m FieldSnapshot> {
        let field = message.field(name)?;
        match (field.snapshot(self.from), field.snapshot(self.to)) {
            (Some(before), None) => Some(before),
            _ => None,
        }
    }

    fn diff_enum(&self, id: EnumId) -> Option<EnumDiff> {
        let enumeration = self.schema.enumeration(id);
        let path = self.schema.enum_path(id);

        match (enumeration.is_present_in(self.from), enumeration.is_present_in(self.to)) {
            (false, false) => None,
            (true, true) => {
                let value_changes = self.diff_values(enumeration, enumeration);
                if value_changes.is_empty() {
                    return None;
                }
                Some(EnumDiff {
                    path,
                    kind: ChangeKind::Modified,
                    moved_from: None,
                    value_changes,
                })
            }
            (true, false) => {
                if self.moved_counterpart(&path, true).is_some() {
                    return None;
                }
                Some(EnumDiff {
                    path,
                    kind: ChangeKind::Removed,
                    moved_from: None,
                    value_changes: Vec::new(),
                })
            }
            (false, true) => match self.moved_counterpart(&path, false) {
                Some(origin) => {
                    let value_changes = self.diff_values(self.schema.enumeration(origin), enumeration);
                    Some(EnumDiff {
                        path,
                        kind: ChangeKind::Moved,
                        moved_from: Some(self.schema.enum_path(origin)),
                        value_changes,
                    })
                }
                None => Some(EnumDiff {
                    path,
                    kind: ChangeKind::Added,
                    moved_from: None,
                    value_changes: Vec::new(),
                }),
            },
        }
    }

    /// Equivalent enum on the other side of a move.
    ///
    /// With `vanished` set, `path` exists only in "from" and the counterpart
    /// must exist only in "to"; otherwise the reverse.
    fn moved_counterpart(&self, path: &str, vanished: bool) -> Option<EnumId> {
        let (present, absent) = if vanished { (self.to, self.from) } else { (self.from, self.to) };
        let candidates: Vec<String> = match self.schema.equivalent_top_level(path) {
            Some(top_level) => vec![top_level.to_string()],
            None => self
                .schema
                .equivalent_enums()
                .iter()
                .filter(|(_, top)| top.as_str() == path)
                .map(|(nested, _)| nested.clone())
                .collect(),
        };
        candidates.iter().find_map(|candidate| {
            let id = self.schema.find_enum(candidate)?;
            let other = self.schema.enumeration(id);
            (other.is_present_in(present) && !other.is_present_in(absent)).then_some(id)
        })
    }

    fn diff_values(&self, before: &MergedEnum, after: &MergedEnum) -> Vec<EnumValueChange> {
        let mut names: Vec<&str> = before.values().iter().map(|v| v.name()).collect();
        for value in after.values() {
            if !names.contains(&value.name()) {
                names.push(value.name());
            }
        }

        names
            .into_iter()
            .filter_map(|name| {
                let old = before.value(name).and_then(|v| v.number(self.from));
                let new = after.value(name).and_then(|v| v.number(self.to));
                let kind = match (old, new) {
                    (None, Some(_)) => ValueChangeKind::ValueAdded,
                    (Some(_), None) => ValueChangeKind::ValueRemoved,
                    (Some(a), Some(b)) if a != b => ValueChangeKind::ValueNumberChanged,
                    _ => return None,
                };
                Some(EnumValueChange {
                    value_name: name.to_string(),
                    kind,
                    before: old,
                    after: new,
                })
            })
            .collect()
    }
}

fn added(name: &str, after: &FieldSnapshot) -> FieldChange {
    FieldChange::new(name, ChangeKind::Added)
        .with_after(after)
        .with_hint(guard_hint(name))
}

fn removed(name: &str, before: &FieldSnapshot) -> FieldChange {
    FieldChange::new(name, ChangeKind::Removed)
        .with_before(before)
        .with_hint(guard_hint(name))
}

fn renamed(old: &str, new: &str, before: &FieldSnapshot, after: &FieldSnapshot) -> FieldChange {
    let mut change = FieldChange::new(new, ChangeKind::Renamed)
        .with_before(before)
        .with_after(after)
        .with_hint(format!("{}() replaces {}()", names::getter(new), names::getter(old)));
    change.renamed_from = Some(old.to_string());
    change.notes = shape_differences(before, after).into_iter().map(|(_, note)| note).collect();
    change
}

fn guard_hint(name: &str) -> String {
    format!("check {}() before calling {}()", names::supports(name), names::getter(name))
}

/// Classify a field present in both versions
fn compare(name: &str, before: &FieldSnapshot, after: &FieldSnapshot) -> Option<FieldChange> {
    let mut differences = shape_differences(before, after).into_iter();
    let (kind, primary_note) = differences.next()?;

    let mut change = FieldChange::new(name, kind).with_before(before).with_after(after);
    match kind {
        ChangeKind::TypeChanged => {
            let conflict = TypeConflict::classify(&before.field_type, &after.field_type);
            change.conflict = conflict;
            if let Some(conflict) = conflict {
                change = change.with_hint(conflict.note());
            }
        }
        ChangeKind::LabelChanged => {
            change = change.with_hint(format!("{}() exposes a list in every version", names::getter(name)));
        }
        ChangeKind::NumberChanged => {
            change = change.with_hint("each version adapter reads its own wire number");
        }
        _ => {
            change.notes.push(primary_note);
            if let Some(oneof) = after.oneof.as_deref().or(before.oneof.as_deref()) {
                change = change.with_hint(format!(
                    "check {}() before reading {}",
                    names::oneof_case_getter(oneof),
                    name
                ));
            }
        }
    }
    change.notes.extend(differences.map(|(_, note)| note));
    Some(change)
}

/// Differing attributes in priority order, each with a note
fn shape_differences(before: &FieldSnapshot, after: &FieldSnapshot) -> Vec<(ChangeKind, String)> {
    let mut out = Vec::new();
    if !before.field_type.same_shape(&after.field_type) {
        out.push((
            ChangeKind::TypeChanged,
            format!("type {} -> {}", before.field_type, after.field_type),
        ));
    }
    if before.cardinality != after.cardinality {
        out.push((
            ChangeKind::LabelChanged,
            format!(
                "cardinality {} -> {}",
                before.cardinality.as_str(),
                after.cardinality.as_str()
            ),
        ));
    }
    if before.number != after.number {
        out.push((
            ChangeKind::NumberChanged,
            format!("number {} -> {}", before.number, after.number),
        ));
    }
    if before.oneof != after.oneof {
        let note = match (&before.oneof, &after.oneof) {
            (None, Some(to)) => format!("moved into oneof {}", to),
            (Some(from), None) => format!("moved out of oneof {}", from),
            (Some(from), Some(to)) => format!("moved from oneof {} to oneof {}", from, to),
            (None, None) => String::new(),
        };
        out.push((ChangeKind::Modified, note));
    }
    out
}
