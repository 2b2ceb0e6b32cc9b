// src/main.rs
// =============================================================================
// This is the entry point of the repo-ingest CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (stderr, RUST_LOG or --verbose)
// 3. Dispatch to the subcommand handler
// 4. Print the artifacts and exit with a meaningful code:
//      0 = complete snapshot
//      1 = ingestion failed (not found, upstream error, timeout)
//      2 = invalid input or internal error
//      3 = snapshot truncated by a budget
//
// Rust concepts:
// - #[tokio::main]: an async entry point
// - anyhow::Result: any error can bubble up to main
// - std::process::exit: report the outcome as an exit code
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, IngestArgs, Show};
use repo_ingest::{Digest, ErrorKind, IngestFailure, IngestSource, Ingestion, Ingestor};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const EXIT_OK: i32 = 0;
const EXIT_FAILED: i32 = 1;
const EXIT_INVALID: i32 = 2;
const EXIT_TRUNCATED: i32 = 3;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // Anything that escaped the handlers is our problem, not the input's
            eprintln!("Error: {:#}", e);
            EXIT_INVALID
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so stdout stays clean for --json
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("repo_ingest=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Ingest(args) => handle_ingest(&args).await,
        Commands::Parse { reference, json } => handle_parse(&reference, json),
    }
}

// Handles the 'ingest' subcommand
async fn handle_ingest(args: &IngestArgs) -> Result<i32> {
    let config = args.ingestion_config()?;
    let ingestor = Ingestor::new(args.host.host_config())?;

    if !args.json {
        println!("🔍 Ingesting {}", args.reference);
    }

    let ingestion = match ingestor.ingest(&args.reference, &config).await {
        Ok(ingestion) => ingestion,
        Err(failure) => return Ok(report_failure(&failure, args.json)),
    };

    let digest = ingestion.digest();

    if args.json {
        let output = JsonReport {
            ingestion: &ingestion,
            digest: &digest,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_ingestion(&ingestion, &digest, args.show);
    }

    if let Some(path) = &args.output {
        let text = format!("{}\n{}\n{}", digest.summary, digest.tree, digest.content);
        std::fs::write(path, text)
            .with_context(|| format!("writing digest to {}", path.display()))?;
        if !args.json {
            println!("💾 Digest written to {}", path.display());
        }
    }

    if ingestion.is_partial() {
        Ok(EXIT_TRUNCATED)
    } else {
        Ok(EXIT_OK)
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    ingestion: &'a Ingestion,
    digest: &'a Digest,
}

fn print_ingestion(ingestion: &Ingestion, digest: &Digest, show: Show) {
    let stats = &ingestion.stats;
    println!(
        "📄 {} file(s) admitted, {} left out, {} bytes",
        stats.accepted_files, stats.excluded_files, stats.total_accepted_bytes
    );
    if stats.skipped_binary > 0 {
        println!("   {} binary file(s) skipped", stats.skipped_binary);
    }
    if stats.truncated {
        println!("⚠️  Snapshot is partial: a size or file-count budget was reached");
    }
    println!();

    if matches!(show, Show::Summary | Show::All) {
        println!("{}", digest.summary);
    }
    if matches!(show, Show::Tree | Show::All) {
        println!("{}", digest.tree);
    }
    if matches!(show, Show::Content | Show::All) {
        print!("{}", digest.content);
    }
}

#[derive(Serialize)]
struct JsonFailure<'a> {
    error: String,
    kind: String,
    status: Option<u16>,
    details: Option<&'a str>,
    stats: &'a repo_ingest::IngestionStats,
}

// Prints a failed ingestion and picks the exit code for it
fn report_failure(failure: &IngestFailure, json: bool) -> i32 {
    let kind = failure.error.kind();

    if json {
        let output = JsonFailure {
            error: failure.error.to_string(),
            kind: format!("{:?}", kind),
            status: failure.error.status(),
            details: failure.error.details(),
            stats: &failure.stats,
        };
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(_) => eprintln!("Error: {}", failure.error),
        }
    } else {
        let hint = match kind {
            ErrorKind::InvalidInput => "check the reference and patterns",
            ErrorKind::NotFound => "the repository may be private or misspelled",
            ErrorKind::Retryable => "this may succeed if you retry",
            ErrorKind::TimedOut => "retry with a larger --timeout-ms",
        };
        eprintln!("❌ {}", failure.error);
        if let Some(details) = failure.error.details() {
            eprintln!("   {}", details);
        }
        eprintln!("   ({})", hint);
    }

    match kind {
        ErrorKind::InvalidInput => EXIT_INVALID,
        _ => EXIT_FAILED,
    }
}

// Handles the 'parse' subcommand
fn handle_parse(reference: &str, json: bool) -> Result<i32> {
    let source = IngestSource::parse(reference);
    let valid = match &source {
        IngestSource::Hosted(parsed) => parsed.is_valid,
        IngestSource::Local(_) => true,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&source)?);
    } else {
        match &source {
            IngestSource::Hosted(parsed) if parsed.is_valid => {
                println!("✅ {}", parsed);
                println!("   URL:     {}", parsed.canonical_url);
                if let Some(branch) = &parsed.branch {
                    println!("   Branch:  {}", branch);
                }
                if let Some(commit) = &parsed.commit {
                    println!("   Commit:  {}", commit);
                }
                println!("   Subpath: {}", parsed.subpath);
            }
            IngestSource::Hosted(_) => {
                println!("❌ Not a repository reference: {}", reference);
            }
            IngestSource::Local(local) => {
                println!("📦 Local archive {}", local.path.display());
                println!("   Name: {}", local.name);
            }
        }
    }

    Ok(if valid { EXIT_OK } else { EXIT_INVALID })
}
