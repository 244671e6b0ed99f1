//! Documentation corpus discovery and loading
//!
//! This module handles the file-system side of indexing:
//! - Discovering markdown documents under a docs directory
//! - Loading them and deriving their source identifiers
//! - Sectioning every document into chunks, skipping unreadable files

mod config;

pub use config::{Config, EmbeddingConfig, ProviderKind, CONFIG_FILE, STATE_DIR};

use crate::extract::{section, Chunk};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A directory of markdown documents being indexed
pub struct Corpus {
    /// Path to the docs root
    root: PathBuf,
    /// Corpus configuration
    config: Config,
}

/// A loaded document
#[derive(Debug, Clone)]
pub struct Document {
    /// Source identifier (the file stem)
    pub source: String,
    /// Path to the file
    pub path: PathBuf,
    /// Full text content
    pub content: String,
}

impl Document {
    /// Split this document into chunks
    pub fn chunks(&self) -> Vec<Chunk> {
        section(&self.content, &self.source)
    }
}

/// Per-document result of a corpus run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub source: String,
    pub path: PathBuf,
    pub chunk_count: usize,
}

/// A file that could not be loaded
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Chunks of every loadable document, in discovery order
#[derive(Debug, Clone, Default)]
pub struct CorpusChunks {
    pub chunks: Vec<Chunk>,
    pub documents: Vec<DocumentSummary>,
    pub skipped: Vec<SkippedFile>,
}

impl Corpus {
    /// Open a docs directory, loading its configuration
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let root = Self::resolve_root(path.as_ref())?;
        let config = Config::load_or_default(&root)?;
        Ok(Self { root, config })
    }

    /// Open a docs directory with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(path: P, config: Config) -> Result<Self> {
        let root = Self::resolve_root(path.as_ref())?;
        Ok(Self { root, config })
    }

    fn resolve_root(path: &Path) -> Result<PathBuf> {
        let root = path
            .canonicalize()
            .with_context(|| format!("Failed to open docs directory {:?}", path))?;

        if !root.is_dir() {
            anyhow::bail!("Not a directory: {:?}", root);
        }

        Ok(root)
    }

    /// Get the docs root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the corpus configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to the configuration (for command-line overrides)
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Directory the index files are written to
    pub fn output_dir(&self) -> PathBuf {
        match &self.config.output_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.root.join(dir),
            None => self.root.clone(),
        }
    }

    /// Path relative to the root, with `/` separators, for pattern matching
    fn relative_key(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        Some(parts.join("/"))
    }

    /// Check whether a path under the root is a document this corpus indexes
    pub fn is_tracked(&self, path: &Path) -> bool {
        match self.relative_key(path) {
            Some(key) => self.config.is_document(&key) && !self.config.should_ignore(&key),
            None => false,
        }
    }

    /// List document files in a stable, sorted order
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let max_depth = if self.config.recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();

        for entry in walkdir::WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || e.file_type().is_file()
                    || !e.file_name().to_string_lossy().starts_with('.')
            })
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable path: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            if self.is_tracked(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        tracing::debug!("Discovered {} documents in {:?}", files.len(), self.root);

        Ok(files)
    }

    /// Load a single document
    pub fn load(&self, path: &Path) -> Result<Document> {
        let source = source_for(path)
            .ok_or_else(|| anyhow::anyhow!("Cannot derive a source name from {:?}", path))?;

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {:?}", path))?;

        Ok(Document {
            source,
            path: path.to_path_buf(),
            content,
        })
    }

    /// Discover, load, and section every document
    ///
    /// Files that fail to load are reported in `skipped` rather than failing
    /// the run.
    pub fn chunk_all(&self) -> Result<CorpusChunks> {
        let mut result = CorpusChunks::default();
        let mut seen_sources: HashMap<String, PathBuf> = HashMap::new();

        for path in self.discover()? {
            let document = match self.load(&path) {
                Ok(document) => document,
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {:#}", path, e);
                    result.skipped.push(SkippedFile {
                        path,
                        reason: format!("{:#}", e),
                    });
                    continue;
                }
            };

            if let Some(previous) = seen_sources.insert(document.source.clone(), path.clone()) {
                tracing::warn!(
                    "Source '{}' is shared by {:?} and {:?}; chunk ids will collide",
                    document.source,
                    previous,
                    path
                );
            }

            let chunks = document.chunks();
            tracing::info!("Processing {:?} -> {} chunks", path, chunks.len());

            result.documents.push(DocumentSummary {
                source: document.source,
                path: document.path,
                chunk_count: chunks.len(),
            });
            result.chunks.extend(chunks);
        }

        Ok(result)
    }
}

/// Source identifier for a document path (its file stem)
pub fn source_for(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
}
