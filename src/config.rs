//! Configuration management for wrapgen
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (wrapgen.toml)
//! - Environment variables (WRAPGEN__*)
//!
//! ## Example config file (wrapgen.toml):
//! ```toml
//! [generator]
//! base_package = "com.acme.orders.model"
//! proto_package_pattern = "com.acme.orders.proto.{version}"
//! version_layout = "suffix"
//! emit_builders = true
//!
//! [diff]
//! min_severity = "WARNING"
//!
//! [[diff.renames]]
//! message = "Order"
//! from = "total"
//! to = "grand_total"
//!
//! [toolchain]
//! compiler_version = "25.1"
//! version_timeout_secs = 10
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::breaking::Severity;
use crate::codegen::GeneratorOptions;
use crate::diff::{DiffOptions, RenameHint};
use crate::error::{Result, WrapgenError};

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WrapgenConfig {
    #[serde(default)]
    pub generator: GeneratorOptions,

    #[serde(default)]
    pub diff: DiffConfig,

    #[serde(default)]
    pub toolchain: ToolchainConfig,
}

/// Diff and breaking-change settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Explicit field renames; never inferred
    #[serde(default)]
    pub renames: Vec<RenameHint>,

    /// Lowest severity that appears in reports
    #[serde(default = "default_min_severity")]
    pub min_severity: Severity,
}

/// Schema-compiler resolution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// Use this executable instead of the cache
    #[serde(default)]
    pub compiler_path: Option<PathBuf>,

    /// Cache directory (platform cache dir when unset)
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    #[serde(default = "default_compiler_version")]
    pub compiler_version: String,

    /// Run `<compiler> --version` after resolving
    #[serde(default = "default_true")]
    pub query_version: bool,

    #[serde(default = "default_version_timeout")]
    pub version_timeout_secs: u64,
}

fn default_min_severity() -> Severity {
    Severity::Info
}

fn default_compiler_version() -> String {
    "25.1".to_string()
}

fn default_true() -> bool {
    true
}

fn default_version_timeout() -> u64 {
    10
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            renames: Vec::new(),
            min_severity: default_min_severity(),
        }
    }
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler_path: None,
            cache_dir: None,
            compiler_version: default_compiler_version(),
            query_version: true,
            version_timeout_secs: default_version_timeout(),
        }
    }
}

impl DiffConfig {
    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            renames: self.renames.clone(),
        }
    }
}

impl ToolchainConfig {
    /// Cache directory, falling back to the platform cache dir
    pub fn resolved_cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir.clone().or_else(|| {
            directories::ProjectDirs::from("dev", "wrapgen", "wrapgen").map(|dirs| dirs.cache_dir().join("toolchain"))
        })
    }
}

impl WrapgenConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        for location in ["wrapgen.toml", ".wrapgen.toml", "config/wrapgen.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "wrapgen", "wrapgen") {
            let xdg_config = dirs.config_dir().join("wrapgen.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // WRAPGEN__GENERATOR__BASE_PACKAGE=com.acme
        builder = builder.add_source(
            Environment::with_prefix("WRAPGEN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| WrapgenError::InvalidInput(format!("cannot serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
