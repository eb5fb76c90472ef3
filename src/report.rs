//! Rendering of diffs and breaking-change lists for humans and CI

use std::fmt::Write as _;

use serde::Serialize;

use crate::breaking::{count_by_severity, BreakingChange, SeverityCounts};
use crate::diff::{ChangeKind, EnumDiff, MessageDiff, SchemaDiff};
use crate::error::Result;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(format!("unknown report format '{}'", other)),
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    from: &'a str,
    to: &'a str,
    counts: SeverityCounts,
    changes: &'a [BreakingChange],
}

/// Render breaking changes between `from` and `to` in the given format
pub fn render(format: ReportFormat, from: &str, to: &str, changes: &[BreakingChange]) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(from, to, changes)),
        ReportFormat::Json => render_json(from, to, changes),
        ReportFormat::Markdown => Ok(render_markdown(from, to, changes)),
    }
}

pub fn render_text(from: &str, to: &str, changes: &[BreakingChange]) -> String {
    let mut out = format!("Breaking changes {} -> {}\n", from, to);
    if changes.is_empty() {
        out.push_str("  none\n");
    }
    for change in changes {
        let _ = writeln!(out, "  {}", change.display_line());
    }
    let _ = writeln!(out, "{}", counts_line(&count_by_severity(changes)));
    out
}

pub fn render_json(from: &str, to: &str, changes: &[BreakingChange]) -> Result<String> {
    let report = JsonReport {
        from,
        to,
        counts: count_by_severity(changes),
        changes,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

pub fn render_markdown(from: &str, to: &str, changes: &[BreakingChange]) -> String {
    let mut out = format!("## Breaking changes `{}` → `{}`\n\n", from, to);
    if changes.is_empty() {
        out.push_str("No breaking changes.\n");
        return out;
    }

    out.push_str("| Severity | Path | Change | Details |\n");
    out.push_str("|----------|------|--------|---------|\n");
    for change in changes {
        let details = match (&change.before, &change.after) {
            (Some(before), Some(after)) => format!("`{}` → `{}`<br>{}", before, after, change.rationale),
            (Some(shape), None) | (None, Some(shape)) => format!("`{}`<br>{}", shape, change.rationale),
            (None, None) => change.rationale.clone(),
        };
        let _ = writeln!(
            out,
            "| {} | `{}` | {} | {} |",
            change.severity,
            change.path,
            change.change,
            escape_cell(&details)
        );
    }
    let _ = writeln!(out, "\n{}", counts_line(&count_by_severity(changes)));
    out
}

fn counts_line(counts: &SeverityCounts) -> String {
    format!(
        "{} change(s): {} error, {} warning, {} info",
        counts.total(),
        counts.error,
        counts.warning,
        counts.info
    )
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Indented tree of every change record in a diff
pub fn diff_summary(diff: &SchemaDiff) -> String {
    let mut out = format!("Diff {} -> {}\n", diff.from, diff.to);
    if diff.is_empty() {
        out.push_str("  no changes\n");
        return out;
    }
    for message in &diff.messages {
        write_message(&mut out, message, 1);
    }
    for enumeration in &diff.enums {
        write_enum(&mut out, enumeration, 1);
    }
    out
}

fn write_message(out: &mut String, message: &MessageDiff, depth: usize) {
    let indent = "  ".repeat(depth);
    let _ = writeln!(out, "{}message {} {}", indent, message.path, message.kind);
    if message.kind == ChangeKind::Modified {
        for change in &message.field_changes {
            let _ = writeln!(out, "{}  {}", indent, change.summary());
            if let Some(hint) = &change.migration_hint {
                let _ = writeln!(out, "{}    hint: {}", indent, hint);
            }
        }
    }
    for nested in &message.nested_messages {
        write_message(out, nested, depth + 1);
    }
    for nested in &message.nested_enums {
        write_enum(out, nested, depth + 1);
    }
}

fn write_enum(out: &mut String, enumeration: &EnumDiff, depth: usize) {
    let indent = "  ".repeat(depth);
    match &enumeration.moved_from {
        Some(from) => {
            let _ = writeln!(out, "{}enum {} {} from {}", indent, enumeration.path, enumeration.kind, from);
        }
        None => {
            let _ = writeln!(out, "{}enum {} {}", indent, enumeration.path, enumeration.kind);
        }
    }
    for change in &enumeration.value_changes {
        let _ = writeln!(out, "{}  {}", indent, change.summary());
    }
}
