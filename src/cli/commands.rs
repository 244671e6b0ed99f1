//! Command implementations

use super::{BuildArgs, OutputFormat};
use crate::corpus::{source_for, Config, Corpus};
use crate::embed::{embed_chunks, provider_from_config};
use crate::extract::{section, Chunk};
use crate::storage::{Index, IndexStats, IndexStore};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Characters of chunk text shown in previews
const PREVIEW_CHARS: usize = 200;

/// Outcome of a build run
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    /// Documents that were chunked
    pub documents: usize,
    /// Documents that could not be loaded
    pub skipped: Vec<PathBuf>,
    /// Total chunks across all documents
    pub chunks: usize,
    /// Embedding dimension, when embeddings were generated
    pub dimension: Option<usize>,
    /// Where chunk records were written
    pub chunks_path: Option<PathBuf>,
    /// Where embeddings were written
    pub embeddings_path: Option<PathBuf>,
    /// First chunk of the run
    pub sample: Option<Chunk>,
}

/// Apply command-line overrides to a configuration
pub fn apply_overrides(config: &mut Config, args: &BuildArgs) {
    if let Some(provider) = args.provider {
        config.embedding.provider = provider;
    }
    if let Some(ref model) = args.model {
        config.embedding.model = model.clone();
    }
    if let Some(ref endpoint) = args.endpoint {
        config.embedding.endpoint = Some(endpoint.clone());
    }
    if let Some(ref output_dir) = args.output_dir {
        config.output_dir = Some(output_dir.clone());
    }
    if args.batch_size.is_some() {
        config.embedding.batch_size = args.batch_size;
    }
}

/// Chunk every document, embed the chunks, and write the index
///
/// Documents that fail to load are skipped. An embedding failure aborts the
/// run before anything is written.
pub fn build(docs_dir: &Path, args: &BuildArgs) -> Result<BuildReport> {
    let mut corpus = Corpus::open(docs_dir)?;
    apply_overrides(corpus.config_mut(), args);

    let result = corpus.chunk_all()?;

    let mut report = BuildReport {
        documents: result.documents.len(),
        skipped: result.skipped.iter().map(|s| s.path.clone()).collect(),
        chunks: result.chunks.len(),
        dimension: None,
        chunks_path: None,
        embeddings_path: None,
        sample: result.chunks.first().cloned(),
    };

    if result.documents.is_empty() && result.skipped.is_empty() {
        tracing::warn!("No markdown files found in {:?}", corpus.root());
        return Ok(report);
    }

    tracing::info!("Total chunks: {}", result.chunks.len());

    if args.dry_run {
        return Ok(report);
    }

    let embedding_config = &corpus.config().embedding;
    let provider = provider_from_config(embedding_config)?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let embeddings = runtime
        .block_on(embed_chunks(
            &*provider,
            &result.chunks,
            embedding_config.batch_size,
        ))
        .context("Embedding generation failed; no index files were written")?;

    let index = Index::new(result.chunks, embeddings)?;
    let store = IndexStore::from_config(corpus.output_dir(), corpus.config());
    store.save(&index)?;

    tracing::info!("Saved chunks to: {:?}", store.chunks_path());
    tracing::info!("Saved embeddings to: {:?}", store.embeddings_path());

    report.dimension = index.stats().dimension;
    report.chunks_path = Some(store.chunks_path().to_path_buf());
    report.embeddings_path = Some(store.embeddings_path().to_path_buf());

    Ok(report)
}

/// Chunk a single file without embedding it
pub fn chunk_file(path: &Path, source: Option<&str>) -> Result<Vec<Chunk>> {
    let source = match source {
        Some(s) => s.to_string(),
        None => source_for(path)
            .ok_or_else(|| anyhow::anyhow!("Cannot derive a source name from {:?}", path))?,
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {:?}", path))?;

    Ok(section(&content, &source))
}

/// Load the written index for a docs directory
pub fn load_index(docs_dir: &Path) -> Result<Index> {
    let corpus = Corpus::open(docs_dir)?;
    let store = IndexStore::from_config(corpus.output_dir(), corpus.config());

    if !store.exists() {
        anyhow::bail!(
            "No index found in {:?}. Run 'ragprep build' first.",
            corpus.output_dir()
        );
    }

    store.load()
}

/// Chunk counts per source, sorted by source
pub fn source_counts(index: &Index) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for (chunk, _) in index.iter() {
        *counts.entry(chunk.source.clone()).or_insert(0) += 1;
    }
    counts
}

/// Show index statistics
pub fn status(docs_dir: &Path, show_sources: bool, format: OutputFormat) -> Result<IndexStats> {
    let index = load_index(docs_dir)?;
    let stats = index.stats();

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "chunks": stats.chunks,
                "sources": stats.sources,
                "dimension": stats.dimension,
                "per_source": source_counts(&index),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("ragprep Status");
            println!("==============\n");
            println!("Chunks: {}", stats.chunks);
            println!("Sources: {}", stats.sources);
            match stats.dimension {
                Some(dim) => println!("Dimension: {}", dim),
                None => println!("Dimension: -"),
            }

            if show_sources {
                println!("\nPer source:");
                for (source, count) in source_counts(&index) {
                    println!("  {}: {}", source, count);
                }
            }
        }
    }

    Ok(stats)
}

/// Show or reset the configuration of a docs directory
pub fn config(docs_dir: &Path, show: bool, reset: bool, format: OutputFormat) -> Result<()> {
    let corpus = Corpus::open(docs_dir)?;

    if reset {
        Config::default().save(corpus.root())?;
        println!("✓ Configuration reset to defaults");
    }

    if show || !reset {
        let config = if reset {
            Config::default()
        } else {
            corpus.config().clone()
        };

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
            OutputFormat::Text => {
                println!("ragprep Configuration");
                println!("=====================\n");
                println!("Config file: {:?}", Config::path(corpus.root()));
                println!("\nDocument patterns:");
                for pattern in &config.patterns {
                    println!("  - {}", pattern);
                }
                println!("\nIgnore patterns:");
                for pattern in &config.ignore_patterns {
                    println!("  - {}", pattern);
                }
                println!("\nRecursive: {}", config.recursive);
                println!("Chunks file: {}", config.chunks_file);
                println!("Embeddings file: {}", config.embeddings_file);
                if let Some(ref dir) = config.output_dir {
                    println!("Output directory: {:?}", dir);
                }

                println!("\nEmbedding provider: {}", config.embedding.provider);
                println!("Embedding model: {}", config.embedding.model);
                if let Some(ref endpoint) = config.embedding.endpoint {
                    println!("Embedding endpoint: {}", endpoint);
                }
                if let Some(dim) = config.embedding.dimension {
                    println!("Expected dimension: {}", dim);
                }
                if let Some(size) = config.embedding.batch_size {
                    println!("Batch size: {}", size);
                }
            }
        }
    }

    Ok(())
}

/// First `PREVIEW_CHARS` characters of a chunk's text
pub fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

/// Print chunks in JSON format
pub fn print_chunks_json(chunks: &[Chunk]) -> Result<()> {
    let json = serde_json::to_string_pretty(chunks)?;
    println!("{}", json);
    Ok(())
}

/// Print chunks in text format
pub fn print_chunks_text(chunks: &[Chunk]) {
    if chunks.is_empty() {
        println!("No chunks produced.");
        return;
    }

    for chunk in chunks {
        println!("[{}] {}", chunk.id, chunk.header_path());
        for line in chunk.text.lines() {
            println!("    {}", line);
        }
        println!();
    }
}

/// Print a build report
pub fn print_build_report(report: &BuildReport, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    if report.documents == 0 && report.skipped.is_empty() {
        println!("No markdown files found.");
        return Ok(());
    }

    println!("Documents: {}", report.documents);
    if !report.skipped.is_empty() {
        println!("Skipped: {}", report.skipped.len());
        for path in &report.skipped {
            println!("  - {:?}", path);
        }
    }
    println!("Total chunks: {}", report.chunks);

    if let (Some(chunks), Some(embeddings)) = (&report.chunks_path, &report.embeddings_path) {
        if let Some(dim) = report.dimension {
            println!("Embedding dimension: {}", dim);
        }
        println!("\n✓ Saved chunks to: {:?}", chunks);
        println!("✓ Saved embeddings to: {:?}", embeddings);
    }

    if let Some(ref sample) = report.sample {
        println!("\n--- Sample chunk ---");
        println!("ID: {}", sample.id);
        println!("Headers: {:?}", sample.headers);
        println!("Text preview: {}", preview(&sample.text));
    }

    Ok(())
}
