//! Generator Configuration
//!
//! Options recognized by `generate`. Every field has a default so partial
//! configuration files deserialize cleanly.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WrapgenError};
use crate::model::MergedSchema;
use crate::version::{package_segment, type_suffix};

/// How per-version implementation types are named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionLayout {
    /// `{base}.impl.OrderV1`
    #[default]
    Suffix,
    /// `{base}.v1.Order`
    SubPackage,
}

/// Generator options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Package of contracts and shared types
    pub base_package: String,

    /// Package of the native per-version classes; `{version}` is replaced
    /// with the version's package segment
    pub proto_package_pattern: String,

    pub version_layout: VersionLayout,

    /// Emit the interface layer. Without it the shared base class is the
    /// version-agnostic surface.
    pub emit_contract: bool,

    /// Emit `Builder` contracts and per-version builders
    pub emit_builders: bool,

    /// Map well-known types (Timestamp, Duration, wrappers) onto standard types
    pub convert_well_known: bool,

    /// Version exposed as `ProtocolVersions.DEFAULT`; the last declared
    /// version when unset
    pub default_version: Option<String>,

    /// Only generate these top-level messages (empty = all)
    pub include_messages: Vec<String>,

    pub exclude_messages: Vec<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            base_package: "com.example.model".to_string(),
            proto_package_pattern: "com.example.proto.{version}".to_string(),
            version_layout: VersionLayout::Suffix,
            emit_contract: true,
            emit_builders: false,
            convert_well_known: true,
            default_version: None,
            include_messages: Vec::new(),
            exclude_messages: Vec::new(),
        }
    }
}

impl GeneratorOptions {
    pub fn with_base_package(mut self, package: impl Into<String>) -> Self {
        self.base_package = package.into();
        self
    }

    pub fn with_builders(mut self, enabled: bool) -> Self {
        self.emit_builders = enabled;
        self
    }

    pub fn with_layout(mut self, layout: VersionLayout) -> Self {
        self.version_layout = layout;
        self
    }

    /// Check option values against the schema they will be applied to
    pub fn validate(&self, schema: &MergedSchema) -> Result<()> {
        if self.base_package.trim().is_empty() {
            return Err(WrapgenError::InvalidInput("base_package must not be empty".into()));
        }
        if let Some(version) = &self.default_version {
            if !schema.has_version(version) {
                return Err(WrapgenError::UnknownVersion(version.clone()));
            }
        }
        Ok(())
    }

    /// Default version, falling back to the last declared one
    pub fn resolve_default_version<'a>(&'a self, schema: &'a MergedSchema) -> Option<&'a str> {
        self.default_version
            .as_deref()
            .or_else(|| schema.versions().last().map(String::as_str))
    }

    /// Whether a top-level message passes the include/exclude filters
    pub fn includes(&self, message: &str) -> bool {
        let included = self.include_messages.is_empty() || self.include_messages.iter().any(|m| m == message);
        included && !self.exclude_messages.iter().any(|m| m == message)
    }

    pub fn proto_package(&self, version: &str) -> String {
        self.proto_package_pattern.replace("{version}", &package_segment(version))
    }

    /// Package of per-version implementation classes
    pub fn impl_package(&self, version: &str) -> String {
        match self.version_layout {
            VersionLayout::Suffix => format!("{}.impl", self.base_package),
            VersionLayout::SubPackage => format!("{}.{}", self.base_package, package_segment(version)),
        }
    }

    /// Implementation class name for a message in a version
    pub fn impl_name(&self, message: &str, version: &str) -> String {
        match self.version_layout {
            VersionLayout::Suffix => format!("{}{}", message, type_suffix(version)),
            VersionLayout::SubPackage => message.to_string(),
        }
    }

    /// Package of shared base classes
    pub fn base_class_package(&self) -> String {
        format!("{}.impl", self.base_package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let options: GeneratorOptions = serde_json::from_str(r#"{"base_package": "org.acme", "emit_builders": true}"#).unwrap();
        assert_eq!(options.base_package, "org.acme");
        assert!(options.emit_builders);
        assert!(options.emit_contract);
        assert_eq!(options.version_layout, VersionLayout::Suffix);
    }

    #[test]
    fn test_layouts() {
        let suffix = GeneratorOptions::default().with_base_package("org.acme");
        assert_eq!(suffix.impl_package("v1"), "org.acme.impl");
        assert_eq!(suffix.impl_name("Order", "v1"), "OrderV1");
        assert_eq!(suffix.proto_package("v1"), "com.example.proto.v1");

        let sub = suffix.with_layout(VersionLayout::SubPackage);
        assert_eq!(sub.impl_package("v2"), "org.acme.v2");
        assert_eq!(sub.impl_name("Order", "v2"), "Order");
    }

    #[test]
    fn test_message_filters() {
        let mut options = GeneratorOptions::default();
        assert!(options.includes("Order"));
        options.include_messages = vec!["Order".into(), "Customer".into()];
        options.exclude_messages = vec!["Customer".into()];
        assert!(options.includes("Order"));
        assert!(!options.includes("Customer"));
        assert!(!options.includes("Invoice"));
    }
}
