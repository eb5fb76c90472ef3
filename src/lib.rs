//! wrapgen
//!
//! Merges several independently evolving versions of a message schema into one
//! unified model, reports what changed between any two versions, and emits a
//! language-neutral declaration tree for version-agnostic wrapper code.
//!
//! ## Pipeline
//!
//! ```text
//! DescriptorSet (v1) ─┐
//! DescriptorSet (v2) ─┼─> merge ─> MergedSchema ─┬─> diff ─> breaking ─> report
//! DescriptorSet (vN) ─┘                          └─> codegen ─> Vec<TypeDecl>
//! ```
//!
//! - **Merge**: fields are matched by number, entities by qualified name;
//!   type conflicts are classified per field
//! - **Diff**: fields by name, with explicit rename hints
//! - **Breaking changes**: INFO / WARNING / ERROR per change record
//! - **Codegen**: contract interfaces, abstract bases and one implementation
//!   per version, plus optional builders

pub mod breaking;
pub mod checksum;
pub mod codegen;
pub mod config;
pub mod descriptor;
pub mod diff;
pub mod error;
pub mod ir;
pub mod merge;
pub mod model;
pub mod report;
pub mod toolchain;
pub mod version;

pub use breaking::{detect_all, BreakingChange, BreakingChangeDetector, Severity};
pub use checksum::Checksum;
pub use codegen::{generate, GeneratorOptions};
pub use config::WrapgenConfig;
pub use descriptor::DescriptorSet;
pub use diff::{diff, diff_with, DiffOptions, SchemaDiff};
pub use error::{Result, WrapgenError};
pub use ir::TypeDecl;
pub use merge::build_merged_schema;
pub use model::MergedSchema;
