//! CLI entry point for gofacts.
//!
//! Each command prints JSON to stdout; logs and errors go to stderr.

use anyhow::{Context, Result, anyhow};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use gofacts::report::{ScopeReport, StructReport};
use gofacts::{
    Diagnostic, EmbeddedField, FactsError, FileReport, GoSourceParser, ParseError, PromotedField,
    RawTagPair, Settings, StructTag, TagEntry,
};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use walkdir::WalkDir;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Go struct tag, type declaration and embedded field facts
#[derive(Parser)]
#[command(
    name = "gofacts",
    version = env!("CARGO_PKG_VERSION"),
    about = "Extract struct tag, type declaration and embedded field facts from Go source",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .gofacts directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration
    #[command(about = "Display the effective settings as TOML")]
    Config,

    /// Lex and interpret a struct tag literal
    #[command(about = "Parse a tag such as 'json:\"name,omitempty\" xml:\"name\"'")]
    Tags {
        /// The tag contents, without the surrounding backquotes
        tag: String,

        /// Only interpret this key, honouring the configured precedence
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Type declarations per scope
    #[command(about = "Classify type declarations as aliases or defined types")]
    Types {
        /// Go files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Embedded fields per struct
    #[command(about = "List embedded fields and promoted field names per struct")]
    Embedded {
        /// Go files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Full per-file report
    #[command(about = "Report tags, declarations and embedded fields for every Go file")]
    Report {
        /// Go files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Serialize)]
struct TagsOutput {
    pairs: Vec<RawTagPair>,
    entries: Vec<TagEntry>,
}

#[derive(Serialize)]
struct FileFailure {
    path: PathBuf,
    error: Diagnostic,
}

#[derive(Serialize)]
#[serde(untagged)]
enum FileOutcome {
    Report(Box<FileReport>),
    Failed(FileFailure),
}

#[derive(Serialize)]
struct TypesView<'a> {
    path: Option<&'a Path>,
    scopes: &'a [ScopeReport],
}

#[derive(Serialize)]
struct EmbeddedView<'a> {
    path: Option<&'a Path>,
    structs: Vec<EmbeddedStructView<'a>>,
}

#[derive(Serialize)]
struct EmbeddedStructView<'a> {
    label: &'a str,
    scope: &'a str,
    line: usize,
    embedded: &'a [EmbeddedField],
    promoted: &'a [PromotedField],
    #[serde(skip_serializing_if = "<[Diagnostic]>::is_empty")]
    diagnostics: &'a [Diagnostic],
}

impl<'a> From<&'a StructReport> for EmbeddedStructView<'a> {
    fn from(report: &'a StructReport) -> Self {
        Self {
            label: &report.label,
            scope: &report.scope,
            line: report.line,
            embedded: &report.embedded,
            promoted: &report.promoted,
            diagnostics: &report.diagnostics,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("Configuration error loading from {}", path.display()))?,
        None => Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        }),
    };
    if cli.debug {
        settings.debug = true;
    }
    gofacts::logging::init_logging(&settings);

    match cli.command {
        Commands::Init { force } => {
            let dir = std::env::current_dir()?;
            let path = Settings::init_config_file(&dir, force).map_err(|e| anyhow!("{e}"))?;
            println!("Created configuration file at: {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config => {
            println!("{}", settings.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Tags { tag, key } => {
            let parsed = StructTag::parse(&tag)?;
            match key {
                Some(key) => {
                    let entry = parsed.entry(&key, settings.tags.precedence);
                    print_json(&entry)?;
                }
                None => print_json(&TagsOutput {
                    pairs: parsed.pairs().to_vec(),
                    entries: parsed.entries(),
                })?,
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Types { paths } => {
            let outcomes = analyze(&paths, &settings)?;
            let views: Vec<_> = outcomes
                .iter()
                .map(|outcome| match outcome {
                    FileOutcome::Report(report) => serde_json::to_value(TypesView {
                        path: report.path.as_deref(),
                        scopes: &report.scopes,
                    }),
                    FileOutcome::Failed(failure) => serde_json::to_value(failure),
                })
                .collect::<Result<_, _>>()?;
            print_json(&views)?;
            Ok(exit_code(&outcomes))
        }
        Commands::Embedded { paths } => {
            let outcomes = analyze(&paths, &settings)?;
            let views: Vec<_> = outcomes
                .iter()
                .map(|outcome| match outcome {
                    FileOutcome::Report(report) => serde_json::to_value(EmbeddedView {
                        path: report.path.as_deref(),
                        structs: report.structs.iter().map(EmbeddedStructView::from).collect(),
                    }),
                    FileOutcome::Failed(failure) => serde_json::to_value(failure),
                })
                .collect::<Result<_, _>>()?;
            print_json(&views)?;
            Ok(exit_code(&outcomes))
        }
        Commands::Report { paths } => {
            let outcomes = analyze(&paths, &settings)?;
            print_json(&outcomes)?;
            Ok(exit_code(&outcomes))
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_code(outcomes: &[FileOutcome]) -> ExitCode {
    if outcomes.iter().any(|o| matches!(o, FileOutcome::Failed(_))) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Expand directories into the `.go` files below them, sorted
fn collect_go_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.exists() {
            return Err(anyhow!("Path not found: {}", path.display()));
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && entry.path().extension().is_some_and(|e| e == "go") {
                files.push(entry.into_path());
            }
        }
    }
    debug!("Collected {} Go files", files.len());
    Ok(files)
}

/// Report every file in parallel; each rayon worker owns its parser
fn analyze(paths: &[PathBuf], settings: &Settings) -> Result<Vec<FileOutcome>> {
    let files = collect_go_files(paths)?;

    let outcomes = files
        .par_iter()
        .map_init(GoSourceParser::new, |parser, path| {
            let result = parser
                .as_mut()
                .map_err(|e| FactsError::from(clone_init_error(e)))
                .and_then(|parser| report_file(parser, path, settings));
            match result {
                Ok(report) => FileOutcome::Report(Box::new(report)),
                Err(err) => FileOutcome::Failed(FileFailure {
                    path: path.clone(),
                    error: Diagnostic::from_error(err),
                }),
            }
        })
        .collect::<Vec<_>>();

    let failed = outcomes
        .iter()
        .filter(|o| matches!(o, FileOutcome::Failed(_)))
        .count();
    info!("Analyzed {} files, {failed} failed", outcomes.len());
    Ok(outcomes)
}

fn report_file(
    parser: &mut GoSourceParser,
    path: &Path,
    settings: &Settings,
) -> Result<FileReport, FactsError> {
    let bytes = std::fs::read(path).map_err(|source| ParseError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let source = parser.parse_bytes(&bytes)?;
    Ok(FileReport::from_parsed(&source, settings)?.with_path(path))
}

fn clone_init_error(err: &ParseError) -> ParseError {
    ParseError::ParserInit {
        language: "Go".to_string(),
        reason: err.to_string(),
    }
}
