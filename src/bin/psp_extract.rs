use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use psp_report_extract::{Extraction, ReportDocument, builtin, extract};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "psp-extract",
    version,
    about = "Extract normalized snapshots from grid operator PSP report documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract a snapshot from a provider document dump.
    Extract(ExtractArgs),
    /// List the built-in operator schemas.
    Schemas,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input document JSON (pages with text, words, and tables).
    #[arg(short, long)]
    input: PathBuf,

    /// Operator schema name, e.g. southern_region.
    #[arg(short, long)]
    schema: String,

    /// Output snapshot JSON path. Defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pin the report date (YYYY-MM-DD) instead of resolving it.
    #[arg(long)]
    date: Option<String>,

    /// Pretty-print the snapshot JSON.
    #[arg(long)]
    pretty: bool,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

fn log_warnings(extraction: &Extraction, verbose: bool) {
    if extraction.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", extraction.warnings.len());
    if verbose {
        for warning in &extraction.warnings {
            eprintln!(
                "  - {:?} page={:?} table={:?} section={:?}: {}",
                warning.code, warning.page, warning.table, warning.section, warning.message
            );
        }
    }
}

/// Records substituted from an entity template carry a zero page.
fn extracted_rows(extraction: &Extraction) -> usize {
    extraction
        .snapshot
        .sections
        .iter()
        .flat_map(|(_, records)| records)
        .filter(|record| record.provenance.page != 0)
        .count()
}

fn run_extract(args: &ExtractArgs) -> Result<Extraction> {
    let schema = builtin(&args.schema)
        .ok_or_else(|| anyhow!("unknown operator schema '{}'", args.schema))?;
    let target_date = args
        .date
        .as_deref()
        .map(|value| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|error| anyhow!("invalid --date '{value}': {error}"))
        })
        .transpose()?;

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read '{}'", args.input.display()))?;
    let document: ReportDocument = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse document JSON '{}'", args.input.display()))?;

    let extraction = extract(&document, &schema, target_date)
        .with_context(|| format!("failed to extract snapshot from '{}'", args.input.display()))?;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&extraction.snapshot)
    } else {
        serde_json::to_string(&extraction.snapshot)
    }
    .context("failed to serialize snapshot")?;

    match &args.output {
        Some(path) => std::fs::write(path, rendered + "\n")
            .with_context(|| format!("failed to write '{}'", path.display()))?,
        None => println!("{rendered}"),
    }
    Ok(extraction)
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("psp_report_extract=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => match run_extract(&args) {
            Ok(extraction) => {
                log_warnings(&extraction, args.verbose);
                if extracted_rows(&extraction) > 0 {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(2)
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
        Commands::Schemas => {
            for name in ["southern_region", "northern_region"] {
                println!("{name}");
            }
            ExitCode::SUCCESS
        }
    }
}
