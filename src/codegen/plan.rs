//! Field planning
//!
//! Resolves every field's per-version declared type against the merged
//! schema and folds the versions into one accessor type. Fields whose
//! versions disagree in a way no single accessor can express end up in
//! `MessagePlan::unsupported` instead.

use indexmap::IndexMap;
use tracing::warn;

use super::well_known::WellKnown;
use super::GeneratorOptions;
use crate::descriptor::{FieldType, ScalarType};
use crate::diff::TypeConflict;
use crate::error::{Result, WrapgenError};
use crate::model::{EnumId, MergedField, MergedSchema, MessageId};

/// A declared type resolved to a schema entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolved {
    Scalar(ScalarType),
    /// Redirected to the top-level enum when an equivalent one exists
    Enum(EnumId),
    Message(MessageId),
    WellKnown(WellKnown),
}

/// Accessor-level scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JavaScalar {
    Int,
    Long,
    Float,
    Double,
    Boolean,
    String,
    Bytes,
}

impl JavaScalar {
    /// Type the native API uses for a scalar
    pub(crate) fn of(scalar: ScalarType) -> Self {
        match scalar {
            ScalarType::Double => Self::Double,
            ScalarType::Float => Self::Float,
            ScalarType::Bool => Self::Boolean,
            ScalarType::String => Self::String,
            ScalarType::Bytes => Self::Bytes,
            other if other.integer_width() == Some(64) => Self::Long,
            _ => Self::Int,
        }
    }
}

/// Unified accessor type of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ValueType {
    Scalar(JavaScalar),
    Enum(EnumId),
    Message(MessageId),
    WellKnown(WellKnown),
}

/// A field that gets accessors
#[derive(Debug, Clone)]
pub(crate) struct FieldPlan<'s> {
    pub field: &'s MergedField,
    /// `Order.amount`
    pub path: String,
    pub value: ValueType,
    /// Exposed as a list
    pub repeated: bool,
    /// Declared in every version of the owning message
    pub universal: bool,
    /// Integer accessor that also offers an enum view
    pub enum_helper: Option<EnumId>,
    pub oneof: Option<String>,
    /// Worst handled conflict across versions
    pub conflict: Option<TypeConflict>,
    /// Resolved declared type per version
    pub native: IndexMap<String, Resolved>,
}

impl FieldPlan<'_> {
    pub(crate) fn name(&self) -> &str {
        self.field.name()
    }

    /// `hasX()` is offered for singular message-like fields outside oneofs
    pub(crate) fn has_presence(&self) -> bool {
        !self.repeated
            && self.oneof.is_none()
            && matches!(self.value, ValueType::Message(_) | ValueType::WellKnown(_))
    }

    pub(crate) fn is_present_in(&self, version: &str) -> bool {
        self.native.contains_key(version)
    }
}

/// A field left without accessors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Unsupported {
    pub field: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub(crate) struct MessagePlan<'s> {
    pub id: MessageId,
    pub path: String,
    pub fields: Vec<FieldPlan<'s>>,
    pub unsupported: Vec<Unsupported>,
}

impl<'s> MessagePlan<'s> {
    pub(crate) fn build(schema: &'s MergedSchema, options: &GeneratorOptions, id: MessageId) -> Result<Self> {
        let message = schema.message(id);
        let path = schema.message_path(id);
        let mut fields = Vec::new();
        let mut unsupported = Vec::new();

        for field in message.fields() {
            match plan_field(schema, options, &path, field, message.versions())? {
                Ok(plan) => fields.push(plan),
                Err(reason) => {
                    warn!(field = %format!("{}.{}", path, field.name()), %reason, "no unified accessor");
                    unsupported.push(Unsupported {
                        field: field.name().to_string(),
                        reason,
                    });
                }
            }
        }

        Ok(Self {
            id,
            path,
            fields,
            unsupported,
        })
    }

    #[cfg(test)]
    pub(crate) fn field(&self, name: &str) -> Option<&FieldPlan<'s>> {
        self.fields.iter().find(|f| f.name() == name)
    }
}

/// Resolve one declared type. Unknown references are hard errors.
pub(crate) fn resolve(
    schema: &MergedSchema,
    options: &GeneratorOptions,
    field_path: &str,
    field_type: &FieldType,
) -> Result<Resolved> {
    let unresolved = |type_name: &str| WrapgenError::UnresolvedType {
        path: field_path.to_string(),
        type_name: type_name.to_string(),
    };

    match field_type {
        FieldType::Scalar(scalar) => Ok(Resolved::Scalar(*scalar)),
        FieldType::Enum(path) => {
            let target = schema.equivalent_top_level(path).unwrap_or(path);
            schema
                .find_enum(target)
                .map(Resolved::Enum)
                .ok_or_else(|| unresolved(path))
        }
        FieldType::Message(path) => {
            if let Some(id) = schema.find_message(path) {
                let top = path.split('.').next().unwrap_or(path);
                if !options.includes(top) {
                    return Err(unresolved(path));
                }
                return Ok(Resolved::Message(id));
            }
            WellKnown::lookup(path)
                .map(Resolved::WellKnown)
                .ok_or_else(|| unresolved(path))
        }
    }
}

type Planned<'s> = std::result::Result<FieldPlan<'s>, String>;

fn plan_field<'s>(
    schema: &MergedSchema,
    options: &GeneratorOptions,
    owner: &str,
    field: &'s MergedField,
    message_versions: &crate::version::VersionSet,
) -> Result<Planned<'s>> {
    let path = format!("{}.{}", owner, field.name());

    let mut native = IndexMap::new();
    for (version, snapshot) in field.snapshots() {
        native.insert(version.to_string(), resolve(schema, options, &path, &snapshot.field_type)?);
    }

    let first = field.first_snapshot();
    let mut conflict: Option<TypeConflict> = None;
    for (_, snapshot) in field.snapshots().skip(1) {
        if let Some(found) = TypeConflict::classify(&first.field_type, &snapshot.field_type) {
            if !found.is_handled() {
                return Ok(Err(format!(
                    "{} ({} -> {})",
                    found.note(),
                    first.field_type,
                    snapshot.field_type
                )));
            }
            if conflict.map_or(true, |c| found.severity() > c.severity()) {
                conflict = Some(found);
            }
        }
    }

    let value = match unify(&native) {
        Ok(value) => value,
        Err(reason) => return Ok(Err(reason)),
    };

    let enum_helper = match (&value, conflict) {
        (ValueType::Scalar(_), Some(TypeConflict::IntEnum)) if !field.is_repeated_anywhere() => {
            let mut enums = native.values().filter_map(|r| match r {
                Resolved::Enum(id) => Some(*id),
                _ => None,
            });
            let first_enum = enums.next();
            if enums.all(|id| Some(id) == first_enum) {
                first_enum
            } else {
                None
            }
        }
        _ => None,
    };

    Ok(Ok(FieldPlan {
        field,
        path,
        value,
        repeated: field.is_repeated_anywhere(),
        universal: field.is_universal(message_versions),
        enum_helper,
        oneof: field.snapshots().find_map(|(_, s)| s.oneof.clone()),
        conflict,
        native,
    }))
}

/// Fold per-version resolved types into one accessor type
fn unify(native: &IndexMap<String, Resolved>) -> std::result::Result<ValueType, String> {
    let mut types = native.values();
    let Some(first) = types.next() else {
        return Err("field has no versions".to_string());
    };

    if native.values().all(|r| r == first) {
        return Ok(match first {
            Resolved::Scalar(scalar) => ValueType::Scalar(JavaScalar::of(*scalar)),
            Resolved::Enum(id) => ValueType::Enum(*id),
            Resolved::Message(id) => ValueType::Message(*id),
            Resolved::WellKnown(known) => ValueType::WellKnown(known.clone()),
        });
    }

    let scalars: Vec<ScalarType> = native
        .values()
        .filter_map(|r| match r {
            Resolved::Scalar(s) => Some(*s),
            _ => None,
        })
        .collect();
    let enums = native.values().filter(|r| matches!(r, Resolved::Enum(_))).count();
    let others = native.len() - scalars.len() - enums;

    if others > 0 {
        return Err("refers to different message types across versions".to_string());
    }

    let integers = scalars.iter().all(ScalarType::is_integer);
    if integers {
        let wide = scalars
            .iter()
            .any(|s| s.integer_width() == Some(64) || s.is_unsigned());
        return Ok(ValueType::Scalar(if wide { JavaScalar::Long } else { JavaScalar::Int }));
    }
    if enums == 0 && scalars.iter().all(ScalarType::is_floating) {
        return Ok(ValueType::Scalar(JavaScalar::Double));
    }
    if enums == 0 && scalars.iter().all(|s| matches!(s, ScalarType::String | ScalarType::Bytes)) {
        return Ok(ValueType::Scalar(JavaScalar::Bytes));
    }
    Err("types cannot share one accessor".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DescriptorSet, EnumDescriptor, FieldDescriptor, MessageDescriptor};
    use crate::merge::build_merged_schema;

    fn scalar(s: ScalarType) -> FieldType {
        FieldType::Scalar(s)
    }

    fn two_versions(v1: MessageDescriptor, v2: MessageDescriptor) -> MergedSchema {
        let status = EnumDescriptor::new("Status").value("UNKNOWN", 0).value("PAID", 1);
        build_merged_schema(
            &["v1", "v2"],
            &[
                DescriptorSet::new().message(v1).enumeration(status.clone()),
                DescriptorSet::new().message(v2).enumeration(status),
            ],
        )
        .unwrap()
    }

    fn plan_of(schema: &MergedSchema) -> MessagePlan<'_> {
        let id = schema.find_message("Order").unwrap();
        MessagePlan::build(schema, &GeneratorOptions::default(), id).unwrap()
    }

    #[test]
    fn test_integer_widening_unifies_to_long() {
        let schema = two_versions(
            MessageDescriptor::new("Order").field(FieldDescriptor::new("qty", 1, scalar(ScalarType::Int32))),
            MessageDescriptor::new("Order").field(FieldDescriptor::new("qty", 1, scalar(ScalarType::Int64))),
        );
        let plan = plan_of(&schema);
        let qty = plan.field("qty").unwrap();
        assert_eq!(qty.value, ValueType::Scalar(JavaScalar::Long));
        assert_eq!(qty.conflict, Some(TypeConflict::Widening));
        assert!(qty.universal);
    }

    #[test]
    fn test_int_enum_offers_enum_helper() {
        let schema = two_versions(
            MessageDescriptor::new("Order").field(FieldDescriptor::new("status", 1, scalar(ScalarType::Int32))),
            MessageDescriptor::new("Order").field(FieldDescriptor::new("status", 1, FieldType::Enum("Status".into()))),
        );
        let plan = plan_of(&schema);
        let status = plan.field("status").unwrap();
        assert_eq!(status.value, ValueType::Scalar(JavaScalar::Int));
        assert_eq!(status.enum_helper, schema.find_enum("Status"));
    }

    #[test]
    fn test_string_bytes_unifies_to_bytes() {
        let schema = two_versions(
            MessageDescriptor::new("Order").field(FieldDescriptor::new("memo", 1, scalar(ScalarType::String))),
            MessageDescriptor::new("Order").field(FieldDescriptor::new("memo", 1, scalar(ScalarType::Bytes))),
        );
        assert_eq!(
            plan_of(&schema).field("memo").unwrap().value,
            ValueType::Scalar(JavaScalar::Bytes)
        );
    }

    #[test]
    fn test_primitive_message_is_unsupported() {
        let money = MessageDescriptor::new("Money").field(FieldDescriptor::new("units", 1, scalar(ScalarType::Int64)));
        let schema = build_merged_schema(
            &["v1", "v2"],
            &[
                DescriptorSet::new()
                    .message(MessageDescriptor::new("Order").field(FieldDescriptor::new("amount", 2, scalar(ScalarType::Int32)))),
                DescriptorSet::new()
                    .message(
                        MessageDescriptor::new("Order")
                            .field(FieldDescriptor::new("amount", 2, FieldType::Message("Money".into()))),
                    )
                    .message(money),
            ],
        )
        .unwrap();
        let plan = plan_of(&schema);
        assert!(plan.field("amount").is_none());
        assert_eq!(plan.unsupported.len(), 1);
        assert_eq!(plan.unsupported[0].field, "amount");
    }

    #[test]
    fn test_version_specific_field_is_not_universal() {
        let schema = two_versions(
            MessageDescriptor::new("Order").field(FieldDescriptor::new("id", 1, scalar(ScalarType::String))),
            MessageDescriptor::new("Order")
                .field(FieldDescriptor::new("id", 1, scalar(ScalarType::String)))
                .field(FieldDescriptor::new("note", 2, scalar(ScalarType::String))),
        );
        let plan = plan_of(&schema);
        assert!(plan.field("id").unwrap().universal);
        let note = plan.field("note").unwrap();
        assert!(!note.universal);
        assert!(note.is_present_in("v2"));
        assert!(!note.is_present_in("v1"));
    }

    #[test]
    fn test_unknown_reference_is_an_error() {
        let schema = two_versions(
            MessageDescriptor::new("Order").field(FieldDescriptor::new("id", 1, scalar(ScalarType::String))),
            MessageDescriptor::new("Order").field(FieldDescriptor::new("id", 1, scalar(ScalarType::String))),
        );
        let err = resolve(
            &schema,
            &GeneratorOptions::default(),
            "Order.customer",
            &FieldType::Message("Customer".into()),
        )
        .unwrap_err();
        assert!(matches!(err, WrapgenError::UnresolvedType { ref type_name, .. } if type_name == "Customer"));
    }

    #[test]
    fn test_well_known_reference() {
        let schema = two_versions(
            MessageDescriptor::new("Order").field(FieldDescriptor::new("id", 1, scalar(ScalarType::String))),
            MessageDescriptor::new("Order").field(FieldDescriptor::new("id", 1, scalar(ScalarType::String))),
        );
        let resolved = resolve(
            &schema,
            &GeneratorOptions::default(),
            "Order.created_at",
            &FieldType::Message("google.protobuf.Timestamp".into()),
        )
        .unwrap();
        assert_eq!(resolved, Resolved::WellKnown(WellKnown::Timestamp));
    }
}
