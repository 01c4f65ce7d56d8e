//! # dirsum - print the aggregate digest of a directory
//!
//! ```bash
//! dirsum --input ./photos --sha 384
//! ```
//!
//! Files and the aggregate are hashed at the same width. Status output goes
//! to stderr; stdout gets the single result line.

use clap::Parser;
use colored::*;
use dirdigest::{DigestWidth, IndexBuilder, IndexOptions, DEFAULT_CHUNK_SIZE};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Print the aggregate SHA-2 digest of every file under a directory
#[derive(Parser)]
#[command(name = "dirsum")]
#[command(version)]
#[command(about = "Print the aggregate SHA-2 digest of a directory tree")]
struct Cli {
    /// Directory to digest
    #[arg(short, long, default_value = ".")]
    input: PathBuf,

    /// Digest width (256, 384 or 512)
    #[arg(short, long, default_value = "256")]
    sha: DigestWidth,

    /// Bytes read per chunk
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Hashing threads (defaults to the number of CPU cores)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Suppress the progress bar
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    let mut options = IndexOptions::uniform(cli.sha);
    options.chunk_size = cli.chunk_size;
    if let Some(threads) = cli.threads {
        options.parallel_workers = threads;
    }

    let mut builder = IndexBuilder::new(&cli.input).with_options(options);

    let progress = (!cli.quiet).then(|| {
        let pb = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("....{percent}% --> {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    });
    if let Some(pb) = progress.clone() {
        builder = builder.with_progress(move |info| {
            if let Some(total) = info.total {
                pb.set_length(total as u64);
            }
            pb.set_position(info.processed as u64);
            if let Some(item) = info.current_item {
                pb.set_message(item);
            }
        });
    }

    let result = builder.build();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    match result {
        Ok(index) => {
            println!("Hexdigest of {} files: {}", index.len(), index.aggregate_digest());
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e.user_message());
            std::process::exit(e.exit_code());
        }
    }
}
