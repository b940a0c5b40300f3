use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use crudiff_common::{
    ensure_config, load_config, AppConfig, ArrayFallback, CrudOperation, DescendPolicy,
    NodeKind,
};
use crudiff_core::{load_document, load_match_on, ChangeReport, CompareEngine, OpSummary};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crudiff")]
#[command(author = "crudiff Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Structural JSON/YAML diff annotating every node with its CRUD operation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two documents and print the annotated modified document
    Compare {
        /// Original document (JSON or YAML)
        original: PathBuf,

        /// Modified document (JSON or YAML)
        modified: PathBuf,

        /// Identity fields per array (JSON, YAML or TOML file)
        #[arg(short, long)]
        match_on: Option<PathBuf>,

        /// Which array elements to descend into while enumerating paths
        #[arg(long, value_enum)]
        descend: Option<DescendArg>,

        /// Comparison mode for object arrays without identity fields
        #[arg(long, value_enum)]
        array_fallback: Option<FallbackArg>,

        /// Print a flat change report instead of the annotated document
        #[arg(short, long)]
        report: bool,

        /// Leave unchanged nodes out of the report
        #[arg(short = 'c', long, requires = "report")]
        changes_only: bool,

        /// Print JSON on a single line
        #[arg(long)]
        compact: bool,
    },

    /// List the object/array paths the comparison walks
    Paths {
        /// Original document (JSON or YAML)
        original: PathBuf,

        /// Modified document (JSON or YAML)
        modified: PathBuf,

        /// Which array elements to descend into while enumerating paths
        #[arg(long, value_enum)]
        descend: Option<DescendArg>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration file
    Config {
        /// Write the configuration file if it does not exist yet
        #[arg(long)]
        init: bool,

        /// Use the configuration file next to the executable
        #[arg(long)]
        portable: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DescendArg {
    Always,
    NestedOnly,
}

impl From<DescendArg> for DescendPolicy {
    fn from(arg: DescendArg) -> Self {
        match arg {
            DescendArg::Always => DescendPolicy::Always,
            DescendArg::NestedOnly => DescendPolicy::NestedOnly,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FallbackArg {
    IndexPaired,
    Whole,
}

impl From<FallbackArg> for ArrayFallback {
    fn from(arg: FallbackArg) -> Self {
        match arg {
            FallbackArg::IndexPaired => ArrayFallback::IndexPaired,
            FallbackArg::Whole => ArrayFallback::Whole,
        }
    }
}

fn main() {
    // Initialize tracing to stderr (so JSON output can go cleanly to stdout)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Compare {
            original,
            modified,
            match_on,
            descend,
            array_fallback,
            report,
            changes_only,
            compact,
        } => run_compare(
            &original,
            &modified,
            Overrides {
                match_on,
                descend,
                array_fallback,
            },
            report,
            changes_only,
            compact,
        )
        .context("Compare failed"),
        Commands::Paths {
            original,
            modified,
            descend,
            json,
        } => run_paths(&original, &modified, descend, json).context("Listing paths failed"),
        Commands::Config { init, portable } => {
            run_config(init, portable).context("Config command failed")
        }
    };

    if let Err(e) = outcome {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Command line values that take precedence over the config file
#[derive(Default)]
struct Overrides {
    match_on: Option<PathBuf>,
    descend: Option<DescendArg>,
    array_fallback: Option<FallbackArg>,
}

fn apply_overrides(config: &mut AppConfig, overrides: Overrides) -> Result<()> {
    if let Some(path) = overrides.match_on {
        config.match_on = load_match_on(&path)
            .with_context(|| format!("Failed to load match configuration {}", path.display()))?;
    }
    if let Some(descend) = overrides.descend {
        config.descend_policy = descend.into();
    }
    if let Some(fallback) = overrides.array_fallback {
        config.array_fallback = fallback.into();
    }
    Ok(())
}

fn check_inputs(original: &Path, modified: &Path) -> Result<()> {
    if !original.exists() {
        bail!("Original path does not exist: {}", original.display());
    }
    if !modified.exists() {
        bail!("Modified path does not exist: {}", modified.display());
    }
    Ok(())
}

fn run_compare(
    original: &Path,
    modified: &Path,
    overrides: Overrides,
    report: bool,
    changes_only: bool,
    compact: bool,
) -> Result<()> {
    check_inputs(original, modified)?;

    let mut config = load_config(false)?.config;
    apply_overrides(&mut config, overrides)?;

    let engine = CompareEngine::from_config(&config);
    let result = engine.compare_files(original, modified)?;

    let output = if report {
        let changes = ChangeReport::from_tagged(&result, changes_only);
        info!(
            "{} tagged nodes: {} inserted, {} updated, {} deleted",
            changes.summary.total,
            changes.summary.insert,
            changes.summary.update,
            changes.summary.delete
        );
        render(&build_json_report(original, modified, changes), compact)?
    } else {
        render(&result, compact)?
    };

    println!("{output}");
    Ok(())
}

fn run_paths(
    original: &Path,
    modified: &Path,
    descend: Option<DescendArg>,
    json: bool,
) -> Result<()> {
    check_inputs(original, modified)?;

    let mut config = load_config(false)?.config;
    apply_overrides(
        &mut config,
        Overrides {
            descend,
            ..Overrides::default()
        },
    )?;

    let original = load_document(original)?;
    let modified = load_document(modified)?;
    let paths = CompareEngine::from_config(&config).paths(&original, &modified);

    if json {
        println!("{}", serde_json::to_string_pretty(&paths)?);
        return Ok(());
    }

    for info in &paths {
        let kind = match info.kind {
            NodeKind::Object => "object",
            NodeKind::Array => "array",
        };
        let marker = if info.processable { "" } else { "  (via parent array)" };
        println!("{:<7} {}{}", kind, info.path, marker);
    }
    Ok(())
}

fn run_config(init: bool, portable: bool) -> Result<()> {
    let loaded = if init {
        ensure_config(portable)?
    } else {
        load_config(portable)?
    };

    if init {
        info!("Configuration file: {}", loaded.path.display());
    }

    let view = ConfigView {
        path: loaded.path.display().to_string(),
        exists: loaded.exists || init,
        portable: loaded.portable,
        config: loaded.config,
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

fn render<T: Serialize>(value: &T, compact: bool) -> Result<String> {
    let output = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(output)
}

#[derive(Serialize)]
struct ConfigView {
    path: String,
    exists: bool,
    portable: bool,
    config: AppConfig,
}

#[derive(Serialize)]
struct JsonReport {
    original: String,
    modified: String,
    summary: OpSummary,
    entries: Vec<JsonEntry>,
}

#[derive(Serialize)]
struct JsonEntry {
    path: String,
    op: CrudOperation,
}

fn build_json_report(original: &Path, modified: &Path, report: ChangeReport) -> JsonReport {
    JsonReport {
        original: original.display().to_string(),
        modified: modified.display().to_string(),
        summary: report.summary,
        entries: report
            .entries
            .into_iter()
            .map(|entry| JsonEntry {
                path: entry.path.to_string(),
                op: entry.op,
            })
            .collect(),
    }
}
