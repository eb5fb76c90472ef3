//! Schema Merger
//!
//! Builds one `MergedSchema` from N ordered (version, descriptor set) pairs.
//!
//! Identity across versions is the structural path of an entity relative to
//! its version root. Fields and enum values are matched by name inside their
//! merged owner. Everything keeps first-seen order: versions are visited in
//! declaration order, and each version's roots, fields and nested types in
//! their own declaration order.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::descriptor::{DescriptorSet, EnumDescriptor, MessageDescriptor};
use crate::error::{Result, WrapgenError};
use crate::model::{FieldSnapshot, MergedSchema, MessageId, SchemaBuilder};

/// Merge per-version descriptor sets into a unified schema.
///
/// Fails only on malformed input: no versions, duplicate version ids, a
/// version/set count mismatch, or a set that does not validate. Differences
/// between versions are recorded in the model, never reported as errors.
pub fn build_merged_schema<S: AsRef<str>>(versions: &[S], sets: &[DescriptorSet]) -> Result<MergedSchema> {
    if versions.is_empty() {
        return Err(WrapgenError::InvalidInput("at least one version is required".into()));
    }
    if versions.len() != sets.len() {
        return Err(WrapgenError::InvalidInput(format!(
            "{} version ids but {} descriptor sets",
            versions.len(),
            sets.len()
        )));
    }

    let mut seen = HashSet::new();
    for version in versions {
        let version = version.as_ref();
        if version.trim().is_empty() {
            return Err(WrapgenError::InvalidInput("version id must not be empty".into()));
        }
        if !seen.insert(version) {
            return Err(WrapgenError::InvalidInput(format!("duplicate version id '{}'", version)));
        }
    }

    for (version, set) in versions.iter().zip(sets) {
        set.validate(version.as_ref())?;
    }

    let ordered: Vec<String> = versions.iter().map(|v| v.as_ref().to_string()).collect();
    let mut builder = SchemaBuilder::new(ordered);

    for (version, set) in versions.iter().zip(sets) {
        let version = version.as_ref();
        debug!(version, messages = set.messages.len(), enums = set.enums.len(), "merging version");
        for message in &set.messages {
            merge_message(&mut builder, None, version, message, None)?;
        }
        for enum_desc in &set.enums {
            merge_enum(&mut builder, None, version, enum_desc)?;
        }
    }

    record_equivalent_enums(&mut builder, sets);

    let schema = builder.finish();
    log_type_conflicts(&schema);
    info!(
        versions = schema.versions().len(),
        messages = schema.message_count(),
        enums = schema.enum_count(),
        "merged schema"
    );
    Ok(schema)
}

fn merge_message(
    builder: &mut SchemaBuilder,
    parent: Option<MessageId>,
    version: &str,
    message: &MessageDescriptor,
    inherited_file: Option<&str>,
) -> Result<()> {
    let id = builder.message_at(parent, &message.name)?;
    let source_file = message.source_file.as_deref().or(inherited_file);

    let merged = builder.message_mut(id);
    merged.add_version(version);
    if let Some(file) = source_file {
        merged.add_source_file(version, file);
    }

    for oneof in &message.oneofs {
        merged.oneof_mut(&oneof.name).add_version(version);
    }
    for field in &message.fields {
        merged.add_field_version(&field.name, version, FieldSnapshot::from(field));
        if let Some(oneof) = &field.oneof {
            merged.oneof_mut(oneof).add_member(&field.name);
        }
    }

    for nested in &message.nested_messages {
        merge_message(builder, Some(id), version, nested, source_file)?;
    }
    for nested in &message.nested_enums {
        merge_enum(builder, Some(id), version, nested)?;
    }

    debug!(version, message = %builder.schema().message_path(id), "merged message");
    Ok(())
}

fn merge_enum(
    builder: &mut SchemaBuilder,
    parent: Option<MessageId>,
    version: &str,
    enum_desc: &EnumDescriptor,
) -> Result<()> {
    let id = builder.enum_at(parent, &enum_desc.name)?;
    let merged = builder.enum_mut(id);
    merged.add_version(version);
    for value in &enum_desc.values {
        merged.value_mut(&value.name).add_version(version, value.number);
    }
    Ok(())
}

/// Record nested enums that duplicate a top-level enum.
///
/// A nested enum matches when its simple name equals a top-level enum name
/// and its value set equals that enum's value set in any version.
fn record_equivalent_enums(builder: &mut SchemaBuilder, sets: &[DescriptorSet]) {
    let top_level: Vec<&EnumDescriptor> = sets.iter().flat_map(|s| s.enums.iter()).collect();
    if top_level.is_empty() {
        return;
    }

    let mut nested = Vec::new();
    for set in sets {
        for message in &set.messages {
            collect_nested_enums(message, &message.name, &mut nested);
        }
    }

    for (path, enum_desc) in nested {
        if builder.schema().equivalent_top_level(&path).is_some() {
            continue;
        }
        let matched = top_level
            .iter()
            .find(|top| top.name == enum_desc.name && top.is_equivalent_to(enum_desc));
        if let Some(top) = matched {
            info!(nested = %path, top_level = %top.name, "nested enum is equivalent to top-level enum");
            builder.record_equivalent_enum(path, top.name.clone());
        }
    }
}

fn collect_nested_enums<'a>(message: &'a MessageDescriptor, path: &str, out: &mut Vec<(String, &'a EnumDescriptor)>) {
    for enum_desc in &message.nested_enums {
        out.push((format!("{}.{}", path, enum_desc.name), enum_desc));
    }
    for nested in &message.nested_messages {
        collect_nested_enums(nested, &format!("{}.{}", path, nested.name), out);
    }
}

fn log_type_conflicts(schema: &MergedSchema) {
    for id in schema.all_messages() {
        for field in schema.message(id).fields() {
            if field.has_type_conflict() {
                let types: Vec<String> = field.distinct_types().iter().map(|t| t.to_string()).collect();
                debug!(
                    message = %schema.message_path(id),
                    field = field.name(),
                    types = %types.join(" / "),
                    "field type differs across versions"
                );
            }
        }
    }
}
