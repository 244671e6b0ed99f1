//! ragprep - Markdown chunking and embedding for retrieval
//!
//! Splits markdown documents into header-aware chunks, embeds them, and writes
//! an index for a semantic-search component.

use anyhow::Result;
use ragprep::cli::{
    build, chunk_file, config, print_build_report, print_chunks_json, print_chunks_text, status,
    BuildArgs, Cli, Commands, OutputFormat,
};
use ragprep::corpus::Corpus;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let docs_dir = cli.docs_dir.as_path();

    // Execute command
    match cli.command {
        Commands::Build(args) => {
            let report = build(docs_dir, &args)?;
            print_build_report(&report, cli.format)?;
        }

        Commands::Chunk(args) => {
            let chunks = chunk_file(&args.file, args.source.as_deref())?;

            match cli.format {
                OutputFormat::Json => print_chunks_json(&chunks)?,
                OutputFormat::Text => print_chunks_text(&chunks),
            }
        }

        Commands::Status(args) => {
            status(docs_dir, args.sources, cli.format)?;
        }

        Commands::Config(args) => {
            config(docs_dir, args.show, args.reset, cli.format)?;
        }

        Commands::Watch(args) => {
            run_watch(docs_dir, args.debounce, &args.build, cli.format)?;
        }
    }

    Ok(())
}

/// Run in watch mode
fn run_watch(path: &Path, debounce_ms: u64, args: &BuildArgs, format: OutputFormat) -> Result<()> {
    use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
    use std::sync::mpsc::channel;
    use std::time::Duration;

    let corpus = Corpus::open(path)?;
    let mode = if corpus.config().recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };

    // Initial build so the index exists before the first change
    rebuild(corpus.root(), args, format);

    println!("Watching for changes in {:?}...", corpus.root());
    println!("Press Ctrl+C to stop.\n");

    let (tx, rx) = channel();

    let config = Config::default().with_poll_interval(Duration::from_millis(debounce_ms));

    let mut watcher = RecommendedWatcher::new(tx, config)?;
    watcher.watch(corpus.root(), mode)?;

    let mut last_build = std::time::Instant::now();
    let debounce = Duration::from_millis(debounce_ms);

    loop {
        match rx.recv() {
            Ok(Ok(event)) => {
                // Debounce
                if last_build.elapsed() < debounce {
                    continue;
                }

                let changed = event.paths.iter().any(|p| corpus.is_tracked(p));

                if changed {
                    println!("\n📝 Changes detected, rebuilding...");
                    rebuild(corpus.root(), args, format);
                    last_build = std::time::Instant::now();
                }
            }
            Ok(Err(e)) => {
                tracing::warn!("Watch event error: {}", e);
            }
            Err(e) => {
                eprintln!("Watch error: {}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Build once, reporting failures without leaving watch mode
fn rebuild(path: &Path, args: &BuildArgs, format: OutputFormat) {
    match build(path, args).and_then(|report| print_build_report(&report, format)) {
        Ok(()) => {}
        Err(e) => eprintln!("Build error: {:#}", e),
    }
}
