//! wrapgen CLI
//!
//! Diffs schema versions, gates CI on breaking changes and emits the
//! wrapper declaration tree as JSON.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wrapgen::breaking::{has_errors, BreakingChangeDetector};
use wrapgen::report::{self, ReportFormat};
use wrapgen::{build_merged_schema, diff_with, generate, Checksum, DescriptorSet, MergedSchema, TypeDecl, WrapgenConfig};

#[derive(Parser)]
#[command(name = "wrapgen")]
#[command(about = "Merge schema versions, report breaking changes and generate wrapper IR")]
struct Cli {
    /// Explicit config file, layered over the default locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every change between two versions
    Diff(CompareArgs),

    /// Report breaking changes; exits non-zero on ERROR severity
    Check(CompareArgs),

    /// Emit the declaration tree as JSON
    Generate {
        #[command(flatten)]
        schemas: SchemaArgs,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SchemaArgs {
    /// Version and descriptor file or directory, e.g. `v1=schemas/v1`
    #[arg(short, long = "schema", value_name = "VERSION=PATH", required = true)]
    schemas: Vec<String>,
}

#[derive(Args)]
struct CompareArgs {
    #[command(flatten)]
    schemas: SchemaArgs,

    /// Base version (first declared when omitted)
    #[arg(long)]
    from: Option<String>,

    /// Target version (last declared when omitted)
    #[arg(long)]
    to: Option<String>,

    /// text, json or markdown
    #[arg(long, default_value = "text")]
    format: ReportFormat,
}

#[derive(Serialize)]
struct GeneratedOutput<'a> {
    checksum: &'a Checksum,
    versions: &'a [String],
    declarations: &'a [TypeDecl],
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let config = WrapgenConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Diff(args) => {
            let schema = load_schema(&args.schemas)?;
            let (from, to) = endpoints(&schema, &args)?;
            let diff = diff_with(&schema, &from, &to, &config.diff.diff_options())?;
            match args.format {
                ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&diff)?),
                _ => print!("{}", report::diff_summary(&diff)),
            }
            Ok(0)
        }
        Commands::Check(args) => {
            let schema = load_schema(&args.schemas)?;
            let (from, to) = endpoints(&schema, &args)?;
            let diff = diff_with(&schema, &from, &to, &config.diff.diff_options())?;
            let all = BreakingChangeDetector::new().detect_all(&diff.messages, &diff.enums);
            let shown = BreakingChangeDetector::new()
                .with_min_severity(config.diff.min_severity)
                .detect_all(&diff.messages, &diff.enums);
            print!("{}", report::render(args.format, &from, &to, &shown)?);

            if has_errors(&all) {
                eprintln!("\n❌ ERROR-severity changes between {} and {}", from, to);
                return Ok(1);
            }
            Ok(0)
        }
        Commands::Generate { schemas, out } => {
            let schema = load_schema(&schemas)?;
            let declarations = generate(&schema, &config.generator)?;
            let checksum = Checksum::of_declarations(&declarations)?;
            info!(types = declarations.len(), checksum = checksum.short(), "generation complete");

            let output = GeneratedOutput {
                checksum: &checksum,
                versions: schema.versions(),
                declarations: &declarations,
            };
            let json = serde_json::to_string_pretty(&output)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("✅ Wrote {} declarations to {}", declarations.len(), path.display());
                }
                None => println!("{}", json),
            }
            Ok(0)
        }
    }
}

fn load_schema(args: &SchemaArgs) -> Result<MergedSchema> {
    let mut versions = Vec::new();
    let mut sets = Vec::new();
    for arg in &args.schemas {
        let (version, path) = arg
            .split_once('=')
            .with_context(|| format!("expected VERSION=PATH, got '{}'", arg))?;
        versions.push(version.to_string());
        sets.push(load_descriptor_set(Path::new(path))?);
    }
    Ok(build_merged_schema(&versions, &sets)?)
}

fn load_descriptor_set(path: &Path) -> Result<DescriptorSet> {
    let set = if path.is_dir() {
        DescriptorSet::from_dir(path)
    } else {
        DescriptorSet::from_file(path)
    };
    set.with_context(|| format!("failed to read descriptors from {}", path.display()))
}

fn endpoints(schema: &MergedSchema, args: &CompareArgs) -> Result<(String, String)> {
    let versions = schema.versions();
    let (Some(first), Some(last)) = (versions.first(), versions.last()) else {
        bail!("no versions loaded");
    };
    let from = args.from.clone().unwrap_or_else(|| first.to_string());
    let to = args.to.clone().unwrap_or_else(|| last.to_string());
    Ok((from, to))
}
