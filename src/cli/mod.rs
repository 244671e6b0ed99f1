//! CLI interface using clap
//!
//! Provides the command-line interface for ragprep

mod commands;

pub use commands::*;

use crate::corpus::ProviderKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ragprep - Markdown chunking and embedding for retrieval
#[derive(Parser, Debug)]
#[command(name = "ragprep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory containing the markdown documents
    #[arg(short, long, global = true, env = "RAG_DOCS_DIR", default_value = ".")]
    pub docs_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short = 'o', long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chunk all documents, generate embeddings, and write the index
    Build(BuildArgs),

    /// Chunk a single file and print the result
    Chunk(ChunkArgs),

    /// Show statistics for the written index
    Status(StatusArgs),

    /// Show or reset configuration
    Config(ConfigArgs),

    /// Watch the docs directory and rebuild on changes
    Watch(WatchArgs),
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Arguments for build command
#[derive(Parser, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Embedding provider (overrides config)
    #[arg(long)]
    pub provider: Option<ProviderKind>,

    /// Embedding model name (overrides config)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Embedding API endpoint (overrides config)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Directory for chunks.json and embeddings.json (overrides config)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Chunks per embedding request (overrides config)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Chunk documents only; skip embedding and writing
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for chunk command
#[derive(Parser, Debug)]
pub struct ChunkArgs {
    /// Markdown file to chunk
    pub file: PathBuf,

    /// Source identifier (defaults to the file stem)
    #[arg(short, long)]
    pub source: Option<String>,
}

/// Arguments for status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// List chunk counts per source
    #[arg(short, long)]
    pub sources: bool,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Show current configuration
    #[arg(long)]
    pub show: bool,

    /// Write the default configuration, replacing any existing one
    #[arg(long)]
    pub reset: bool,
}

/// Arguments for watch command
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Debounce interval in milliseconds
    #[arg(long, default_value = "1000")]
    pub debounce: u64,

    #[command(flatten)]
    pub build: BuildArgs,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
