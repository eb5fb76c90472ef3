//! Breaking-change detection
//!
//! Flattens a schema diff into a path-qualified list of changes annotated
//! with a severity. Severity reflects what generated wrappers can absorb:
//! `Info` is fully absorbed, `Warning` is absorbed but worth a look, `Error`
//! means no unified accessor can be produced.
//!
//! Additions and explicit renames are not reported.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::diff::{ChangeKind, EnumDiff, EnumValueChange, FieldChange, MessageDiff, TypeConflict, ValueChangeKind};

// =============================================================================
// Severity
// =============================================================================

/// Breaking-change severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Breaking Change
// =============================================================================

/// What kind of element broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakingKind {
    MessageRemoved,
    FieldRemoved,
    FieldTypeChanged,
    CardinalityChanged,
    FieldNumberChanged,
    OneofChanged,
    EnumRemoved,
    EnumMoved,
    EnumValueRemoved,
    EnumValueNumberChanged,
}

/// One reported change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakingChange {
    pub kind: BreakingKind,
    /// Underlying change-record kind ("REMOVED", "VALUE_NUMBER_CHANGED", ...)
    pub change: String,
    pub severity: Severity,
    /// Dot-qualified location ("Order.total", "Priority.LOW")
    pub path: String,
    pub rationale: String,
    pub before: Option<String>,
    pub after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<TypeConflict>,
}

impl BreakingChange {
    /// `[ERROR] Order.amount TYPE_CHANGED: int32 = 2 -> Money = 2 (...)`
    pub fn display_line(&self) -> String {
        let mut line = format!("[{}] {} {}", self.severity, self.path, self.change);
        match (&self.before, &self.after) {
            (Some(before), Some(after)) => line.push_str(&format!(": {} -> {}", before, after)),
            (Some(before), None) => line.push_str(&format!(": {}", before)),
            (None, Some(after)) => line.push_str(&format!(": {}", after)),
            (None, None) => {}
        }
        line.push_str(&format!(" ({})", self.rationale));
        line
    }
}

/// Count of reported changes per severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub info: usize,
    pub warning: usize,
    pub error: usize,
}

impl SeverityCounts {
    pub fn total(&self) -> usize {
        self.info + self.warning + self.error
    }
}

pub fn has_errors(changes: &[BreakingChange]) -> bool {
    changes.iter().any(|c| c.severity == Severity::Error)
}

pub fn count_by_severity(changes: &[BreakingChange]) -> SeverityCounts {
    let mut counts = SeverityCounts::default();
    for change in changes {
        match change.severity {
            Severity::Info => counts.info += 1,
            Severity::Warning => counts.warning += 1,
            Severity::Error => counts.error += 1,
        }
    }
    counts
}

// =============================================================================
// Detector
// =============================================================================

/// Detect breaking changes with the default detector
pub fn detect_all(messages: &[MessageDiff], enums: &[EnumDiff]) -> Vec<BreakingChange> {
    BreakingChangeDetector::new().detect_all(messages, enums)
}

/// Walks message and enum diffs in pre-order
#[derive(Debug, Clone)]
pub struct BreakingChangeDetector {
    min_severity: Severity,
}

impl Default for BreakingChangeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl BreakingChangeDetector {
    pub fn new() -> Self {
        Self {
            min_severity: Severity::Info,
        }
    }

    /// Drop changes below the given severity
    pub fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = severity;
        self
    }

    pub fn detect_all(&self, messages: &[MessageDiff], enums: &[EnumDiff]) -> Vec<BreakingChange> {
        let mut out = Vec::new();
        for message in messages {
            self.walk_message(message, &mut out);
        }
        for enum_diff in enums {
            self.walk_enum(enum_diff, &mut out);
        }
        out.retain(|c| c.severity >= self.min_severity);
        out
    }

    fn walk_message(&self, diff: &MessageDiff, out: &mut Vec<BreakingChange>) {
        match diff.kind {
            ChangeKind::Added => {}
            ChangeKind::Removed => out.push(BreakingChange {
                kind: BreakingKind::MessageRemoved,
                change: ChangeKind::Removed.to_string(),
                severity: Severity::Warning,
                path: diff.path.clone(),
                rationale: "wrappers for the message only exist in the versions that declare it".into(),
                before: Some(diff.name().to_string()),
                after: None,
                conflict: None,
            }),
            _ => {
                for change in &diff.field_changes {
                    out.extend(field_change(&diff.path, change));
                }
                for nested in &diff.nested_messages {
                    self.walk_message(nested, out);
                }
                for nested in &diff.nested_enums {
                    self.walk_enum(nested, out);
                }
            }
        }
    }

    fn walk_enum(&self, diff: &EnumDiff, out: &mut Vec<BreakingChange>) {
        match diff.kind {
            ChangeKind::Added => {}
            ChangeKind::Removed => out.push(BreakingChange {
                kind: BreakingKind::EnumRemoved,
                change: ChangeKind::Removed.to_string(),
                severity: Severity::Warning,
                path: diff.path.clone(),
                rationale: "the enum only exists in the versions that declare it".into(),
                before: Some(diff.name().to_string()),
                after: None,
                conflict: None,
            }),
            ChangeKind::Moved => {
                out.push(BreakingChange {
                    kind: BreakingKind::EnumMoved,
                    change: ChangeKind::Moved.to_string(),
                    severity: Severity::Info,
                    path: diff.path.clone(),
                    rationale: "equivalent enums are unified into one generated type".into(),
                    before: diff.moved_from.clone(),
                    after: Some(diff.path.clone()),
                    conflict: None,
                });
                for change in &diff.value_changes {
                    out.extend(value_change(&diff.path, change));
                }
            }
            _ => {
                for change in &diff.value_changes {
                    out.extend(value_change(&diff.path, change));
                }
            }
        }
    }
}

fn field_change(message_path: &str, change: &FieldChange) -> Option<BreakingChange> {
    let (kind, severity, rationale) = match change.kind {
        ChangeKind::Added | ChangeKind::Renamed => return None,
        ChangeKind::Removed => (
            BreakingKind::FieldRemoved,
            Severity::Info,
            "version-guarded accessor generated".to_string(),
        ),
        ChangeKind::TypeChanged => {
            let conflict = change.conflict.unwrap_or(TypeConflict::Incompatible);
            (BreakingKind::FieldTypeChanged, conflict.severity(), conflict.note().to_string())
        }
        ChangeKind::LabelChanged => (
            BreakingKind::CardinalityChanged,
            Severity::Info,
            "accessor exposes a list in every version".to_string(),
        ),
        ChangeKind::NumberChanged => (
            BreakingKind::FieldNumberChanged,
            Severity::Warning,
            "wire number differs; generated code still works per version".to_string(),
        ),
        ChangeKind::Modified | ChangeKind::Moved => (
            BreakingKind::OneofChanged,
            Severity::Warning,
            change
                .notes
                .first()
                .cloned()
                .unwrap_or_else(|| "oneof membership changed".to_string()),
        ),
    };

    let field_path = format!("{}.{}", message_path, change.field_name);
    Some(BreakingChange {
        kind,
        change: change.kind.to_string(),
        severity,
        path: field_path,
        rationale,
        before: change.before_shape(),
        after: change.after_shape(),
        conflict: change.conflict,
    })
}

fn value_change(enum_path: &str, change: &EnumValueChange) -> Option<BreakingChange> {
    let (kind, severity, rationale) = match change.kind {
        ValueChangeKind::ValueAdded => return None,
        ValueChangeKind::ValueRemoved => (
            BreakingKind::EnumValueRemoved,
            Severity::Info,
            "unified enum keeps the value; it is unrecognized in versions without it",
        ),
        ValueChangeKind::ValueNumberChanged => (
            BreakingKind::EnumValueNumberChanged,
            Severity::Warning,
            "wire number differs; access by number maps per version",
        ),
    };

    Some(BreakingChange {
        kind,
        change: change.kind.to_string(),
        severity,
        path: format!("{}.{}", enum_path, change.value_name),
        rationale: rationale.to_string(),
        before: change.before.map(|n| n.to_string()),
        after: change.after.map(|n| n.to_string()),
        conflict: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DescriptorSet, EnumDescriptor, FieldDescriptor, FieldType, MessageDescriptor, ScalarType};
    use crate::diff::diff;
    use crate::merge::build_merged_schema;

    fn detect(v1: DescriptorSet, v2: DescriptorSet) -> Vec<BreakingChange> {
        let schema = build_merged_schema(&["v1", "v2"], &[v1, v2]).unwrap();
        let (messages, enums) = diff(&schema, "v1", "v2").unwrap().into_parts();
        detect_all(&messages, &enums)
    }

    #[test]
    fn test_removed_field_is_info() {
        let changes = detect(
            DescriptorSet::new().message(
                MessageDescriptor::new("Order")
                    .field(FieldDescriptor::new("id", 1, FieldType::Scalar(ScalarType::Int64)))
                    .field(FieldDescriptor::new("total", 2, FieldType::Scalar(ScalarType::Double))),
            ),
            DescriptorSet::new().message(
                MessageDescriptor::new("Order")
                    .field(FieldDescriptor::new("id", 1, FieldType::Scalar(ScalarType::Int64)))
                    .field(FieldDescriptor::new("note", 3, FieldType::Scalar(ScalarType::String))),
            ),
        );

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "Order.total");
        assert_eq!(changes[0].severity, Severity::Info);
        assert_eq!(changes[0].display_line(), "[INFO] Order.total REMOVED: double = 2 (version-guarded accessor generated)");
    }

    #[test]
    fn test_enum_value_number_change_is_warning() {
        let changes = detect(
            DescriptorSet::new().enumeration(EnumDescriptor::new("Priority").value("LOW", 0).value("HIGH", 1)),
            DescriptorSet::new().enumeration(EnumDescriptor::new("Priority").value("HIGH", 2)),
        );

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].path, "Priority.LOW");
        assert_eq!(changes[0].severity, Severity::Info);
        assert_eq!(changes[1].path, "Priority.HIGH");
        assert_eq!(changes[1].severity, Severity::Warning);
        assert_eq!(changes[1].before.as_deref(), Some("1"));
        assert_eq!(changes[1].after.as_deref(), Some("2"));
    }

    #[test]
    fn test_field_number_change_is_warning() {
        let changes = detect(
            DescriptorSet::new().message(
                MessageDescriptor::new("Order").field(FieldDescriptor::new("code", 2, FieldType::Scalar(ScalarType::String))),
            ),
            DescriptorSet::new().message(
                MessageDescriptor::new("Order").field(FieldDescriptor::new("code", 7, FieldType::Scalar(ScalarType::String))),
            ),
        );

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, BreakingKind::FieldNumberChanged);
        assert_eq!(changes[0].severity, Severity::Warning);
        assert_eq!(changes[0].before.as_deref(), Some("string = 2"));
        assert_eq!(changes[0].after.as_deref(), Some("string = 7"));
    }

    #[test]
    fn test_oneof_move_is_warning() {
        let card = || FieldDescriptor::new("card", 3, FieldType::Scalar(ScalarType::String));
        let changes = detect(
            DescriptorSet::new().message(MessageDescriptor::new("Payment").oneof("legacy").field(card().in_oneof("legacy"))),
            DescriptorSet::new().message(MessageDescriptor::new("Payment").oneof("method").field(card().in_oneof("method"))),
        );

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "Payment.card");
        assert_eq!(changes[0].kind, BreakingKind::OneofChanged);
        assert_eq!(changes[0].severity, Severity::Warning);
        assert_eq!(changes[0].rationale, "moved from oneof legacy to oneof method");
    }

    #[test]
    fn test_enum_moved_is_info() {
        let status = || EnumDescriptor::new("Status").value("OPEN", 0).value("CLOSED", 1);
        let changes = detect(
            DescriptorSet::new().message(
                MessageDescriptor::new("Order")
                    .field(FieldDescriptor::new("status", 1, FieldType::Enum("Order.Status".into())))
                    .nested_enum(status()),
            ),
            DescriptorSet::new()
                .message(
                    MessageDescriptor::new("Order")
                        .field(FieldDescriptor::new("status", 1, FieldType::Enum("Status".into()))),
                )
                .enumeration(status()),
        );

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, BreakingKind::EnumMoved);
        assert_eq!(changes[0].severity, Severity::Info);
        assert_eq!(changes[0].path, "Status");
        assert_eq!(changes[0].before.as_deref(), Some("Order.Status"));
        assert!(!has_errors(&changes));
    }

    #[test]
    fn test_removed_message_and_min_severity() {
        let schema = build_merged_schema(
            &["v1", "v2"],
            &[
                DescriptorSet::new()
                    .message(MessageDescriptor::new("Legacy"))
                    .message(MessageDescriptor::new("Order").field(FieldDescriptor::new(
                        "amount",
                        1,
                        FieldType::Scalar(ScalarType::Int32),
                    ))),
                DescriptorSet::new()
                    .message(MessageDescriptor::new("Order").field(FieldDescriptor::new(
                        "amount",
                        1,
                        FieldType::Message("Money".into()),
                    )))
                    .message(MessageDescriptor::new("Money")),
            ],
        )
        .unwrap();
        let (messages, enums) = diff(&schema, "v1", "v2").unwrap().into_parts();

        let all = detect_all(&messages, &enums);
        assert_eq!(all[0].kind, BreakingKind::MessageRemoved);
        assert_eq!(all[0].severity, Severity::Warning);
        assert_eq!(all[1].kind, BreakingKind::FieldTypeChanged);
        assert_eq!(all[1].conflict, Some(TypeConflict::PrimitiveMessage));
        assert!(has_errors(&all));

        let counts = count_by_severity(&all);
        assert_eq!((counts.info, counts.warning, counts.error), (0, 1, 1));

        let errors_only = BreakingChangeDetector::new()
            .with_min_severity(Severity::Error)
            .detect_all(&messages, &enums);
        assert_eq!(errors_only.len(), 1);
        assert_eq!(errors_only[0].path, "Order.amount");
    }
}
