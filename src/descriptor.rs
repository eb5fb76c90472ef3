//! Per-version schema descriptors
//!
//! A descriptor set is the structural description of one compiled schema
//! version: messages with fields and oneofs, enums, and nested types. Sets are
//! produced by an external schema compiler and loaded here from JSON.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{Result, WrapgenError};

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());
const WELL_KNOWN_PREFIX: &str = "google.protobuf.";

static TYPE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap());

/// Scalar field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

impl ScalarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Float => "float",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Sint32 => "sint32",
            Self::Sint64 => "sint64",
            Self::Fixed32 => "fixed32",
            Self::Fixed64 => "fixed64",
            Self::Sfixed32 => "sfixed32",
            Self::Sfixed64 => "sfixed64",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Bytes => "bytes",
        }
    }

    pub fn is_integer(&self) -> bool {
        self.integer_width().is_some()
    }

    /// Bit width for integer kinds
    pub fn integer_width(&self) -> Option<u8> {
        match self {
            Self::Int32 | Self::Uint32 | Self::Sint32 | Self::Fixed32 | Self::Sfixed32 => Some(32),
            Self::Int64 | Self::Uint64 | Self::Sint64 | Self::Fixed64 | Self::Sfixed64 => Some(64),
            _ => None,
        }
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(self, Self::Uint32 | Self::Uint64 | Self::Fixed32 | Self::Fixed64)
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type of a field
///
/// Message and enum references are dot-separated paths relative to the
/// version root (`Money`, `Order.Item`) or well-known names such as
/// `google.protobuf.Timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Scalar(ScalarType),
    Message(String),
    Enum(String),
}

impl FieldType {
    /// Last path segment of a message or enum reference
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            Self::Scalar(_) => None,
            Self::Message(path) | Self::Enum(path) => path.rsplit('.').next(),
        }
    }

    /// Referenced type path of a message or enum field
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::Scalar(_) => None,
            Self::Message(path) | Self::Enum(path) => Some(path),
        }
    }

    pub fn is_message(&self) -> bool {
        matches!(self, Self::Message(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, Self::Enum(_))
    }

    pub fn scalar(&self) -> Option<ScalarType> {
        match self {
            Self::Scalar(s) => Some(*s),
            _ => None,
        }
    }

    /// Whether two declared types have the same shape.
    ///
    /// Enum references compare by simple name so that an enum moved between
    /// a nested and a top-level scope is still the same type. Message
    /// references compare by full path: a nested and a top-level message are
    /// distinct entities with distinct wrapper classes.
    pub fn same_shape(&self, other: &FieldType) -> bool {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => a == b,
            (Self::Message(a), Self::Message(b)) => a == b,
            (Self::Enum(_), Self::Enum(_)) => self.simple_name() == other.simple_name(),
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{}", s),
            Self::Message(path) => f.write_str(path),
            Self::Enum(_) => f.write_str(self.simple_name().unwrap_or_default()),
        }
    }
}

/// Singular or repeated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    #[default]
    Singular,
    Repeated,
}

impl Cardinality {
    pub fn is_repeated(&self) -> bool {
        matches!(self, Self::Repeated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Singular => "singular",
            Self::Repeated => "repeated",
        }
    }
}

/// A field declared in a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub number: i32,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub cardinality: Cardinality,
    /// Name of the oneof this field belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oneof: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, number: i32, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            number,
            field_type,
            cardinality: Cardinality::Singular,
            oneof: None,
        }
    }

    pub fn repeated(mut self) -> Self {
        self.cardinality = Cardinality::Repeated;
        self
    }

    pub fn in_oneof(mut self, oneof: impl Into<String>) -> Self {
        self.oneof = Some(oneof.into());
        self
    }
}

/// A oneof group declared in a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneofDescriptor {
    pub name: String,
}

/// A message definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    pub name: String,
    /// Schema file the message was compiled from (e.g. "order.proto")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub oneofs: Vec<OneofDescriptor>,
    #[serde(default)]
    pub nested_messages: Vec<MessageDescriptor>,
    #[serde(default)]
    pub nested_enums: Vec<EnumDescriptor>,
}

impl MessageDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_file: None,
            fields: Vec::new(),
            oneofs: Vec::new(),
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
        }
    }

    pub fn from_file(mut self, source_file: impl Into<String>) -> Self {
        self.source_file = Some(source_file.into());
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn oneof(mut self, name: impl Into<String>) -> Self {
        self.oneofs.push(OneofDescriptor { name: name.into() });
        self
    }

    pub fn nested_message(mut self, message: MessageDescriptor) -> Self {
        self.nested_messages.push(message);
        self
    }

    pub fn nested_enum(mut self, enum_desc: EnumDescriptor) -> Self {
        self.nested_enums.push(enum_desc);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One value of an enum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValueDescriptor {
    pub name: String,
    pub number: i32,
}

/// An enum definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDescriptor {
    pub name: String,
    pub values: Vec<EnumValueDescriptor>,
}

impl EnumDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn value(mut self, name: impl Into<String>, number: i32) -> Self {
        self.values.push(EnumValueDescriptor {
            name: name.into(),
            number,
        });
        self
    }

    /// Same value names and numbers, ignoring declaration order
    pub fn is_equivalent_to(&self, other: &EnumDescriptor) -> bool {
        if self.values.len() != other.values.len() {
            return false;
        }
        let ours: HashSet<(&str, i32)> = self.values.iter().map(|v| (v.name.as_str(), v.number)).collect();
        other
            .values
            .iter()
            .all(|v| ours.contains(&(v.name.as_str(), v.number)))
    }
}

/// All root messages and enums of one schema version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorSet {
    #[serde(default)]
    pub messages: Vec<MessageDescriptor>,
    #[serde(default)]
    pub enums: Vec<EnumDescriptor>,
}

impl DescriptorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(mut self, message: MessageDescriptor) -> Self {
        self.messages.push(message);
        self
    }

    pub fn enumeration(mut self, enum_desc: EnumDescriptor) -> Self {
        self.enums.push(enum_desc);
        self
    }

    /// Parse a descriptor set from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a descriptor set from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Load every `*.json` file under a directory into one set.
    ///
    /// Files are visited in path order so that declaration order is stable.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut set = Self::new();
        let walker = WalkDir::new(dir).sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(|e| {
                WrapgenError::Io(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "directory walk failed")
                }))
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let part = Self::from_file(path)?;
            set.messages.extend(part.messages);
            set.enums.extend(part.enums);
        }
        Ok(set)
    }

    /// Find a message by dot-separated path relative to the root
    pub fn find_message(&self, path: &str) -> Option<&MessageDescriptor> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.messages.iter().find(|m| m.name == first)?;
        for segment in segments {
            current = current.nested_messages.iter().find(|m| m.name == segment)?;
        }
        Some(current)
    }

    /// Find an enum by dot-separated path relative to the root
    pub fn find_enum(&self, path: &str) -> Option<&EnumDescriptor> {
        match path.rsplit_once('.') {
            None => self.enums.iter().find(|e| e.name == path),
            Some((parent, name)) => self
                .find_message(parent)?
                .nested_enums
                .iter()
                .find(|e| e.name == name),
        }
    }

    /// Check structural well-formedness.
    ///
    /// Errors carry a `version:Path.element` location.
    pub fn validate(&self, version: &str) -> Result<()> {
        let mut names = HashSet::new();
        for message in &self.messages {
            check_unique(&mut names, &message.name, version, "")?;
            validate_message(message, version, &message.name)?;
        }
        for enum_desc in &self.enums {
            check_unique(&mut names, &enum_desc.name, version, "")?;
            validate_enum(enum_desc, version, &enum_desc.name)?;
        }
        for message in &self.messages {
            self.check_references(message, version, &message.name)?;
        }
        Ok(())
    }

    /// Every message and enum reference must name a type of this same set
    fn check_references(&self, message: &MessageDescriptor, version: &str, path: &str) -> Result<()> {
        for field in &message.fields {
            let found = match &field.field_type {
                FieldType::Scalar(_) => true,
                FieldType::Message(target) | FieldType::Enum(target) if target.starts_with(WELL_KNOWN_PREFIX) => true,
                FieldType::Message(target) => self.find_message(target).is_some(),
                FieldType::Enum(target) => self.find_enum(target).is_some(),
            };
            if !found {
                let kind = if field.field_type.is_message() { "message" } else { "enum" };
                return Err(WrapgenError::descriptor(
                    location(version, &format!("{}.{}", path, field.name)),
                    format!("unknown {} type '{}'", kind, field.field_type.reference().unwrap_or_default()),
                ));
            }
        }
        for nested in &message.nested_messages {
            self.check_references(nested, version, &format!("{}.{}", path, nested.name))?;
        }
        Ok(())
    }
}

fn location(version: &str, path: &str) -> String {
    format!("{}:{}", version, path)
}

fn check_identifier(name: &str, version: &str, path: &str) -> Result<()> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(WrapgenError::descriptor(
            location(version, path),
            format!("'{}' is not a valid identifier", name),
        ))
    }
}

fn check_unique<'a>(seen: &mut HashSet<&'a str>, name: &'a str, version: &str, scope: &str) -> Result<()> {
    let path = if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", scope, name)
    };
    check_identifier(name, version, &path)?;
    if !seen.insert(name) {
        return Err(WrapgenError::descriptor(
            location(version, &path),
            "duplicate type name in scope",
        ));
    }
    Ok(())
}

fn validate_message(message: &MessageDescriptor, version: &str, path: &str) -> Result<()> {
    let oneofs: HashSet<&str> = message.oneofs.iter().map(|o| o.name.as_str()).collect();
    for oneof in &message.oneofs {
        check_identifier(&oneof.name, version, &format!("{}.{}", path, oneof.name))?;
    }

    let mut field_names = HashSet::new();
    let mut field_numbers = HashSet::new();
    for field in &message.fields {
        let field_path = format!("{}.{}", path, field.name);
        check_identifier(&field.name, version, &field_path)?;
        if !field_names.insert(field.name.as_str()) {
            return Err(WrapgenError::descriptor(location(version, &field_path), "duplicate field name"));
        }
        if field.number <= 0 {
            return Err(WrapgenError::descriptor(
                location(version, &field_path),
                format!("field number must be positive, got {}", field.number),
            ));
        }
        if !field_numbers.insert(field.number) {
            return Err(WrapgenError::descriptor(
                location(version, &field_path),
                format!("field number {} already used", field.number),
            ));
        }
        if let FieldType::Message(target) | FieldType::Enum(target) = &field.field_type {
            if !TYPE_PATH.is_match(target) {
                return Err(WrapgenError::descriptor(
                    location(version, &field_path),
                    format!("'{}' is not a valid type reference", target),
                ));
            }
        }
        if let Some(oneof) = &field.oneof {
            if !oneofs.contains(oneof.as_str()) {
                return Err(WrapgenError::descriptor(
                    location(version, &field_path),
                    format!("oneof '{}' is not declared in {}", oneof, path),
                ));
            }
            if field.cardinality.is_repeated() {
                return Err(WrapgenError::descriptor(
                    location(version, &field_path),
                    "repeated fields cannot be oneof members",
                ));
            }
        }
    }

    let mut nested_names = HashSet::new();
    for nested in &message.nested_messages {
        check_unique(&mut nested_names, &nested.name, version, path)?;
        validate_message(nested, version, &format!("{}.{}", path, nested.name))?;
    }
    for nested in &message.nested_enums {
        check_unique(&mut nested_names, &nested.name, version, path)?;
        validate_enum(nested, version, &format!("{}.{}", path, nested.name))?;
    }
    Ok(())
}

fn validate_enum(enum_desc: &EnumDescriptor, version: &str, path: &str) -> Result<()> {
    if enum_desc.values.is_empty() {
        return Err(WrapgenError::descriptor(location(version, path), "enum declares no values"));
    }
    let mut names = HashSet::new();
    for value in &enum_desc.values {
        let value_path = format!("{}.{}", path, value.name);
        check_identifier(&value.name, version, &value_path)?;
        if !names.insert(value.name.as_str()) {
            return Err(WrapgenError::descriptor(location(version, &value_path), "duplicate enum value name"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> MessageDescriptor {
        MessageDescriptor::new("Order")
            .field(FieldDescriptor::new("id", 1, FieldType::Scalar(ScalarType::Int64)))
            .field(FieldDescriptor::new("total", 2, FieldType::Scalar(ScalarType::Double)))
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "messages": [{
                "name": "Order",
                "source_file": "order.proto",
                "fields": [
                    {"name": "id", "number": 1, "type": {"scalar": "int64"}},
                    {"name": "items", "number": 2, "type": {"message": "Order.Item"}, "cardinality": "repeated"},
                    {"name": "card", "number": 3, "type": {"scalar": "string"}, "oneof": "payment"}
                ],
                "oneofs": [{"name": "payment"}],
                "nested_messages": [{"name": "Item"}]
            }],
            "enums": [{"name": "Priority", "values": [{"name": "LOW", "number": 0}]}]
        }"#;

        let set = DescriptorSet::from_json_str(json).unwrap();
        assert_eq!(set.messages.len(), 1);
        let order = &set.messages[0];
        assert_eq!(order.fields[1].cardinality, Cardinality::Repeated);
        assert_eq!(order.fields[2].oneof.as_deref(), Some("payment"));
        assert!(set.find_message("Order.Item").is_some());
        assert!(set.find_enum("Priority").is_some());
        set.validate("v1").unwrap();
    }

    #[test]
    fn test_unknown_oneof_is_rejected() {
        let set = DescriptorSet::new().message(
            MessageDescriptor::new("Order")
                .field(FieldDescriptor::new("card", 1, FieldType::Scalar(ScalarType::String)).in_oneof("payment")),
        );

        let err = set.validate("v2").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("v2:Order.card"), "{}", message);
        assert!(message.contains("payment"));
    }

    #[test]
    fn test_unknown_type_reference_is_rejected() {
        let set = DescriptorSet::new().message(
            order().field(FieldDescriptor::new("status", 3, FieldType::Enum("NoSuchEnum".into()))),
        );
        let message = set.validate("v1").unwrap_err().to_string();
        assert!(message.contains("v1:Order.status"), "{}", message);
        assert!(message.contains("unknown enum type 'NoSuchEnum'"), "{}", message);

        let nested_ref = DescriptorSet::new().message(
            MessageDescriptor::new("Order").nested_message(
                MessageDescriptor::new("Item").field(FieldDescriptor::new("price", 1, FieldType::Message("Money".into()))),
            ),
        );
        let message = nested_ref.validate("v2").unwrap_err().to_string();
        assert!(message.contains("v2:Order.Item.price"), "{}", message);
    }

    #[test]
    fn test_references_resolve_against_the_same_set() {
        let set = DescriptorSet::new()
            .message(
                MessageDescriptor::new("Order")
                    .field(FieldDescriptor::new("item", 1, FieldType::Message("Order.Item".into())))
                    .field(FieldDescriptor::new("status", 2, FieldType::Enum("Order.Status".into())))
                    .field(FieldDescriptor::new("created_at", 3, FieldType::Message("google.protobuf.Timestamp".into())))
                    .field(FieldDescriptor::new("priority", 4, FieldType::Enum("Priority".into())))
                    .nested_message(MessageDescriptor::new("Item"))
                    .nested_enum(EnumDescriptor::new("Status").value("OPEN", 0)),
            )
            .enumeration(EnumDescriptor::new("Priority").value("LOW", 0));
        set.validate("v1").unwrap();

        // an enum path is not a message
        let wrong_kind = DescriptorSet::new()
            .message(MessageDescriptor::new("Order").field(FieldDescriptor::new("p", 1, FieldType::Message("Priority".into()))))
            .enumeration(EnumDescriptor::new("Priority").value("LOW", 0));
        assert!(wrong_kind.validate("v1").is_err());
    }

    #[test]
    fn test_duplicate_field_number_is_rejected() {
        let set = DescriptorSet::new().message(
            order().field(FieldDescriptor::new("status", 2, FieldType::Scalar(ScalarType::Int32))),
        );
        assert!(matches!(
            set.validate("v1"),
            Err(WrapgenError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn test_duplicate_nested_name_is_rejected() {
        let set = DescriptorSet::new().message(
            order()
                .nested_message(MessageDescriptor::new("Item"))
                .nested_enum(EnumDescriptor::new("Item").value("A", 0)),
        );
        assert!(set.validate("v1").is_err());
    }

    #[test]
    fn test_enum_equivalence_ignores_order() {
        let a = EnumDescriptor::new("Status").value("ACTIVE", 0).value("CLOSED", 1);
        let b = EnumDescriptor::new("Status").value("CLOSED", 1).value("ACTIVE", 0);
        let c = EnumDescriptor::new("Status").value("ACTIVE", 0).value("CLOSED", 2);
        assert!(a.is_equivalent_to(&b));
        assert!(!a.is_equivalent_to(&c));
    }

    #[test]
    fn test_same_shape_uses_simple_names_for_enums() {
        let nested = FieldType::Enum("Order.Status".into());
        let top = FieldType::Enum("Status".into());
        assert!(nested.same_shape(&top));
        assert!(!top.same_shape(&FieldType::Message("Status".into())));
        assert_eq!(nested.to_string(), "Status");
    }

    #[test]
    fn test_same_shape_uses_paths_for_messages() {
        let nested = FieldType::Message("Order.Item".into());
        let top = FieldType::Message("Item".into());
        assert!(!nested.same_shape(&top));
        assert!(nested.same_shape(&FieldType::Message("Order.Item".into())));
        assert_eq!(nested.to_string(), "Order.Item");
    }

    #[test]
    fn test_from_dir_concatenates_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("b.json"),
            r#"{"messages": [{"name": "Second"}]}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("a.json"),
            r#"{"messages": [{"name": "First"}]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let set = DescriptorSet::from_dir(dir.path()).unwrap();
        let names: Vec<_> = set.messages.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }
}
