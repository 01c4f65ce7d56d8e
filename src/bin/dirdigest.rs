//! # dirdigest CLI - directory fingerprints and drift reports
//!
//! ## Usage
//! ```bash
//! # Index a directory into a file
//! dirdigest build --input /srv/www --output www.json
//!
//! # Print the index to stdout instead
//! dirdigest build --input /srv/www
//!
//! # Re-scan the indexed directory and report drift
//! dirdigest reval --input www.json
//!
//! # Compare two saved indexes
//! dirdigest compare --old-index monday.json --new-index friday.json
//! ```

use clap::{Args, Parser, Subcommand};
use colored::*;
use dirdigest::reevaluate::{compare_with_fresh, rebuild_builder};
use dirdigest::{
    compare, format_bytes, DiffResult, DigestError, DigestWidth, DirectoryIndex, IndexBuilder,
    IndexOptions, ProgressInfo, Result, DEFAULT_CHUNK_SIZE,
};
use humantime::format_duration;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const RULE_WIDTH: usize = 100;

/// dirdigest - fingerprint directory trees and report what changed
#[derive(Parser)]
#[command(name = "dirdigest")]
#[command(version)]
#[command(about = "Fingerprint directory trees and report added, removed and modified files")]
#[command(long_about = None)]
struct Cli {
    /// Enable verbose logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build an index for a directory
    Build(BuildArgs),

    /// Rebuild the index of a saved root and report drift
    #[command(name = "reval", alias = "reevaluate")]
    Reevaluate(ReevaluateArgs),

    /// Compare two saved indexes
    Compare(CompareArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Directory to index
    #[arg(short, long)]
    input: PathBuf,

    /// Write the index here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Per-file digest width (256, 384 or 512)
    #[arg(short, long, default_value = "256")]
    sha: DigestWidth,

    /// Aggregate digest width (256, 384 or 512)
    #[arg(long, default_value = "512")]
    aggregate_sha: DigestWidth,

    #[command(flatten)]
    scan: ScanArgs,
}

#[derive(Args)]
struct ReevaluateArgs {
    /// Index file to re-evaluate
    #[arg(short, long)]
    input: PathBuf,

    /// Print the diff as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    scan: ScanArgs,
}

#[derive(Args)]
struct CompareArgs {
    /// Older index file
    #[arg(long)]
    old_index: PathBuf,

    /// Newer index file
    #[arg(long)]
    new_index: PathBuf,

    /// Print the diff as JSON
    #[arg(long)]
    json: bool,
}

/// Settings that affect how a scan runs but never its digests
#[derive(Args)]
struct ScanArgs {
    /// Bytes read per chunk
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Hashing threads (defaults to the number of CPU cores)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Show a progress bar
    #[arg(long)]
    progress: bool,
}

impl ScanArgs {
    fn apply(&self, mut options: IndexOptions) -> Result<IndexOptions> {
        options.chunk_size = self.chunk_size;
        if let Some(threads) = self.threads {
            options.parallel_workers = threads;
        }
        options.validate()?;
        Ok(options)
    }
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli.command) {
        eprintln!("{}: {}", "Error".red().bold(), e.user_message());
        std::process::exit(e.exit_code());
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Build(args) => cmd_build(args),
        Command::Reevaluate(args) => cmd_reevaluate(args),
        Command::Compare(args) => cmd_compare(args),
    }
}

/// Build an index and write it to a file or stdout
///
/// Status lines go to stderr so stdout carries only the index.
fn cmd_build(args: BuildArgs) -> Result<()> {
    let options = args.scan.apply(IndexOptions {
        file_digest: args.sha,
        aggregate_digest: args.aggregate_sha,
        ..IndexOptions::default()
    })?;

    let start = Instant::now();
    let progress = args.scan.progress.then(new_progress_bar);

    let mut builder = IndexBuilder::new(&args.input).with_options(options);
    if let Some(pb) = progress.clone() {
        builder = builder.with_progress(move |info| update_progress(&pb, &info));
    }
    let built = builder.build();

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let index = built?;

    match &args.output {
        Some(path) => {
            index.save(path)?;
            eprintln!(
                "{} Indexed {} files in {}",
                "✓".green().bold(),
                index.len().to_string().cyan(),
                format_duration(start.elapsed()).to_string().cyan()
            );
            eprintln!("  Directory: {}", index.root().display().to_string().cyan());
            eprintln!("  Digest: {}", index.aggregate_digest().yellow());
            eprintln!("  Index: {}", path.display().to_string().cyan());
        }
        None => index.write_to(io::stdout().lock())?,
    }

    Ok(())
}

/// Rescan the directory recorded in an index and report drift
fn cmd_reevaluate(args: ReevaluateArgs) -> Result<()> {
    let saved = DirectoryIndex::load(&args.input)?;
    let options = args.scan.apply(IndexOptions::default())?;

    let progress = args.scan.progress.then(new_progress_bar);
    let mut builder = rebuild_builder(&saved, &options)?;
    if let Some(pb) = progress.clone() {
        builder = builder.with_progress(move |info| update_progress(&pb, &info));
    }
    let built = builder.build();

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let fresh = built?;

    let diff = compare_with_fresh(&saved, &fresh);
    report(&saved, &fresh, &diff, args.json)
}

/// Compare two saved indexes
fn cmd_compare(args: CompareArgs) -> Result<()> {
    let old = DirectoryIndex::load(&args.old_index)?;
    let new = DirectoryIndex::load(&args.new_index)?;

    let diff = compare(&old, &new);
    report(&old, &new, &diff, args.json)
}

fn report(old: &DirectoryIndex, new: &DirectoryIndex, diff: &DiffResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(diff).map_err(DigestError::from)?);
    } else {
        print_diff(old, new, diff);
    }
    Ok(())
}

fn print_diff(old: &DirectoryIndex, new: &DirectoryIndex, diff: &DiffResult) {
    let rule = "-".repeat(RULE_WIDTH);

    if diff.aggregates_match {
        println!("{}", "Matching directory digests, no further comparison needed.".green().bold());
    } else {
        println!("{}", "Directory digests differ, comparing files...".yellow().bold());
    }
    println!("{}", rule.dimmed());
    println!("OLD {}", old.aggregate_digest());
    println!("NEW {}", new.aggregate_digest());
    println!("{}", rule.dimmed());

    if diff.aggregates_match {
        return;
    }
    println!();

    for (path, digest) in &diff.added {
        println!("{} {}", format!("{:.<15}", "NEW FILE").green().bold(), path);
        println!("- ({})\n", digest.dimmed());
    }
    if !diff.added.is_empty() {
        println!("{}\n", rule.dimmed());
    }

    for (path, digest) in &diff.removed {
        println!("{} {}", format!("{:.<15}", "FILE ABSENT").red().bold(), path);
        println!("- ({})\n", digest.dimmed());
    }
    if !diff.removed.is_empty() {
        println!("{}\n", rule.dimmed());
    }

    for (path, digests) in &diff.modified {
        println!("{} {}", format!("{:.<15}", "FILE MODIFIED").yellow().bold(), path);
        println!("- OLD: ({})", digests.old.dimmed());
        println!("- NEW: ({})\n", digests.new.dimmed());
    }
    if !diff.modified.is_empty() {
        println!("{}\n", rule.dimmed());
    }

    println!(
        "{} added, {} removed, {} modified ({} files before, {} after)",
        diff.added.len().to_string().green(),
        diff.removed.len().to_string().red(),
        diff.modified.len().to_string().yellow(),
        old.len(),
        new.len()
    );
}

fn new_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("=>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

fn update_progress(pb: &ProgressBar, info: &ProgressInfo) {
    if let Some(total) = info.total {
        pb.set_length(total as u64);
    }
    pb.set_position(info.processed as u64);
    pb.set_message(format!(
        "{} {}",
        format_bytes(info.bytes_processed),
        info.current_item.as_deref().unwrap_or_default()
    ));
}
