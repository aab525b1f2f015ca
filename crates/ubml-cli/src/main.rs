use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use walkdir::WalkDir;

use ubml_core::{Config, Diagnostic, DocumentType, ElementType, Report, Severity};
use ubml_engine::{SourceText, ValidationEngine};
use ubml_schema::SchemaRegistry;

/// Default config file looked up in the working directory
const CONFIG_FILE: &str = "ubml.toml";

/// UBML - validation for business modeling workspaces
#[derive(Parser)]
#[command(name = "ubml")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ubml.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate UBML documents
    Validate {
        /// Files or directories to validate
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Do not warn about identifiers nobody references
        #[arg(long)]
        suppress_unused: bool,

        /// Directory holding the document schemas
        #[arg(long)]
        schemas: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Also write the JSON report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List document types and identifier prefixes
    Types,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate {
            paths,
            strict,
            suppress_unused,
            schemas,
            format,
            output,
        } => {
            let mut config = config;
            config.validation.strict |= strict;
            config.validation.suppress_unused_warnings |= suppress_unused;
            if let Some(dir) = schemas {
                config.schema_dir = Some(dir);
            }
            validate_command(config, &paths, format, output.as_deref())
        }
        Commands::Types => {
            types_command();
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    let default_path = Path::new(CONFIG_FILE);
    if default_path.exists() {
        return Config::from_file(default_path)
            .with_context(|| format!("Failed to load config from {}", CONFIG_FILE));
    }

    tracing::info!("no config file found, using defaults");
    Ok(Config::default())
}

/// Validate command - check every document in the given paths
fn validate_command(
    config: Config,
    paths: &[PathBuf],
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let schema_dir = config.resolved_schema_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "No schema directory configured. Pass --schemas DIR or set schema_dir in {}.",
            CONFIG_FILE
        )
    })?;

    tracing::info!(dir = %schema_dir.display(), "loading schemas");
    let registry = SchemaRegistry::from_dir(&schema_dir)
        .with_context(|| format!("Failed to load schemas from {}", schema_dir.display()))?;

    let sources = discover(paths)?;
    tracing::info!(documents = sources.len(), "validating");

    let engine = ValidationEngine::with_builtin_rules(Arc::new(registry), config);
    let result = engine.validate(&sources)?;
    let report = Report::new(result, sources.len());

    if let Some(path) = output {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        tracing::info!(path = %path.display(), "report saved");
    }

    match format {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => print_report(&report),
    }

    // Exit with error code if there are errors
    if report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Collect `*.ubml.yaml` files under `paths`, in a stable order
fn discover(paths: &[PathBuf]) -> Result<Vec<SourceText>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.exists() {
            return Err(anyhow::anyhow!("Path not found: {}", path.display()));
        }

        let walker = WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));
        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to read {}", path.display()))?;
            if entry.file_type().is_file() && is_ubml_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }

    files
        .iter()
        .map(|file| {
            SourceText::from_file(file).with_context(|| format!("Failed to read {}", file.display()))
        })
        .collect()
}

fn is_ubml_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".ubml.yaml") || name.ends_with(".ubml.yml"))
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn print_report(report: &Report) {
    for diag in report.result.diagnostics() {
        print_diagnostic(diag);
    }

    if report.result.errors.is_empty() && report.result.warnings.is_empty() {
        println!("{}", "✓ No issues found!".green().bold());
    }

    println!();
    println!(
        "Checked {} files: {}, {}",
        report.summary.files_checked,
        if report.summary.errors > 0 {
            format!("{} errors", report.summary.errors).red().bold()
        } else {
            format!("{} errors", report.summary.errors).green()
        },
        if report.summary.warnings > 0 {
            format!("{} warnings", report.summary.warnings).yellow()
        } else {
            format!("{} warnings", report.summary.warnings).green()
        }
    );
}

fn print_diagnostic(diag: &Diagnostic) {
    let severity_str = match diag.severity {
        Severity::Error => "ERROR".red().bold(),
        Severity::Warn => "WARN".yellow().bold(),
        Severity::Info => "INFO".cyan(),
    };

    match &diag.location {
        Some(location) => println!("{} [{}] {}: {}", location, severity_str, diag.code, diag.message),
        None => println!("[{}] {}: {}", severity_str, diag.code, diag.message),
    }

    if let Some(suggestion) = &diag.suggestion {
        println!("    {} {}", "suggestion:".green(), suggestion);
    }
    if let Some(hint) = &diag.hint {
        println!("    {} {}", "hint:".cyan(), hint);
    }
    if !diag.valid_options.is_empty() {
        println!("    {} {}", "valid options:".dimmed(), diag.valid_options.join(", "));
    }
    if let Some(example) = &diag.example {
        println!("    {}", "example:".dimmed());
        for line in example.lines() {
            println!("      {}", line);
        }
    }
    for related in &diag.related {
        println!("    {} {}", "see also:".dimmed(), related);
    }
}

/// Types command - print the document types and identifier prefixes
fn types_command() {
    println!("{}", "Document types:".bold());
    for document_type in DocumentType::ALL {
        println!(
            "  {:<12} {}",
            document_type.as_str().green(),
            document_type.signature_keys().join(", ")
        );
    }

    println!();
    println!("{}", "Identifier prefixes:".bold());
    for element_type in ElementType::ALL {
        println!("  {:<4} {}", element_type.prefix().cyan(), element_type.label());
    }
}
