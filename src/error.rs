//! Error types for merging, diffing and generation

use std::fmt;

use thiserror::Error;

/// Result type for wrapgen operations
pub type Result<T> = std::result::Result<T, WrapgenError>;

/// Step of schema-compiler resolution that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStep {
    ExplicitPath,
    CacheLookup,
    Download,
    Install,
    VersionQuery,
}

impl ResolutionStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExplicitPath => "explicit_path",
            Self::CacheLookup => "cache_lookup",
            Self::Download => "download",
            Self::Install => "install",
            Self::VersionQuery => "version_query",
        }
    }
}

impl fmt::Display for ResolutionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wrapgen errors
///
/// Schema evolution between versions is never an error; it is reported as
/// change records. Only malformed input and failing collaborators end up here.
#[derive(Error, Debug)]
pub enum WrapgenError {
    #[error("Invalid descriptor at {path}: {reason}")]
    InvalidDescriptor { path: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown version: {0}")]
    UnknownVersion(String),

    #[error("Cannot re-parent {child}: already owned by {parent}")]
    Reparent { child: String, parent: String },

    #[error("Unresolved type reference '{type_name}' at {path}")]
    UnresolvedType { path: String, type_name: String },

    #[error("Schema compiler resolution failed during {step}: {source}")]
    Toolchain {
        step: ResolutionStep,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl WrapgenError {
    pub(crate) fn descriptor(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn toolchain(
        step: ResolutionStep,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Toolchain {
            step,
            source: source.into(),
        }
    }
}
