//! JSON storage layer for the retrieval index
//!
//! This module handles persistent storage of:
//! - Chunk records (`chunks.json`)
//! - Embedding vectors (`embeddings.json`), aligned by index with the chunks

use crate::corpus::Config;
use crate::extract::Chunk;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Chunk records with their embeddings, aligned by index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Index {
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
}

impl Index {
    /// Pair chunks with embeddings; lengths must match
    pub fn new(chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            anyhow::bail!(
                "Index misaligned: {} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            );
        }

        Ok(Self { chunks, embeddings })
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Iterate over (chunk, embedding) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&Chunk, &Vec<f32>)> {
        self.chunks.iter().zip(self.embeddings.iter())
    }

    /// Summary statistics
    pub fn stats(&self) -> IndexStats {
        let sources: BTreeSet<&str> = self.chunks.iter().map(|c| c.source.as_str()).collect();

        IndexStats {
            chunks: self.chunks.len(),
            sources: sources.len(),
            dimension: self.embeddings.first().map(|e| e.len()),
        }
    }
}

/// Index statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub chunks: usize,
    pub sources: usize,
    pub dimension: Option<usize>,
}

/// Reads and writes the two index files in one directory
#[derive(Debug, Clone)]
pub struct IndexStore {
    chunks_path: PathBuf,
    embeddings_path: PathBuf,
}

impl IndexStore {
    /// Create a store for the given directory and file names
    pub fn new<P: AsRef<Path>>(dir: P, chunks_file: &str, embeddings_file: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            chunks_path: dir.join(chunks_file),
            embeddings_path: dir.join(embeddings_file),
        }
    }

    /// Create a store using the file names from a configuration
    pub fn from_config<P: AsRef<Path>>(dir: P, config: &Config) -> Self {
        Self::new(dir, &config.chunks_file, &config.embeddings_file)
    }

    pub fn chunks_path(&self) -> &Path {
        &self.chunks_path
    }

    pub fn embeddings_path(&self) -> &Path {
        &self.embeddings_path
    }

    /// Check whether both index files exist
    pub fn exists(&self) -> bool {
        self.chunks_path.exists() && self.embeddings_path.exists()
    }

    /// Write both index files
    ///
    /// Each file is written to a temporary sibling first and renamed into
    /// place once both serialized successfully.
    pub fn save(&self, index: &Index) -> Result<()> {
        for path in [&self.chunks_path, &self.embeddings_path] {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {:?}", parent))?;
            }
        }

        let chunks_json =
            serde_json::to_string_pretty(&index.chunks).context("Failed to serialize chunks")?;
        let embeddings_json =
            serde_json::to_string(&index.embeddings).context("Failed to serialize embeddings")?;

        let chunks_tmp = tmp_path(&self.chunks_path);
        let embeddings_tmp = tmp_path(&self.embeddings_path);

        std::fs::write(&chunks_tmp, chunks_json)
            .with_context(|| format!("Failed to write {:?}", chunks_tmp))?;
        std::fs::write(&embeddings_tmp, embeddings_json)
            .with_context(|| format!("Failed to write {:?}", embeddings_tmp))?;

        std::fs::rename(&chunks_tmp, &self.chunks_path)
            .with_context(|| format!("Failed to write {:?}", self.chunks_path))?;
        std::fs::rename(&embeddings_tmp, &self.embeddings_path)
            .with_context(|| format!("Failed to write {:?}", self.embeddings_path))?;

        Ok(())
    }

    /// Read both index files back
    pub fn load(&self) -> Result<Index> {
        let chunks_json = std::fs::read_to_string(&self.chunks_path)
            .with_context(|| format!("Failed to read {:?}", self.chunks_path))?;
        let chunks: Vec<Chunk> = serde_json::from_str(&chunks_json)
            .with_context(|| format!("Failed to parse {:?}", self.chunks_path))?;

        let embeddings_json = std::fs::read_to_string(&self.embeddings_path)
            .with_context(|| format!("Failed to read {:?}", self.embeddings_path))?;
        let embeddings: Vec<Vec<f32>> = serde_json::from_str(&embeddings_json)
            .with_context(|| format!("Failed to parse {:?}", self.embeddings_path))?;

        Index::new(chunks, embeddings)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
