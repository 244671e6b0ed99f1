//! Embedding generation for chunk retrieval
//!
//! This module turns chunks into vectors:
//! - Builds the header-prefixed text submitted for each chunk
//! - Calls an embedding provider once per batch, never once per chunk
//! - Checks that the vectors stay aligned with the chunks they describe

mod providers;

pub use providers::{LocalEmbedding, MockEmbedding, OpenAIEmbedding};

use crate::corpus::{EmbeddingConfig, ProviderKind};
use crate::extract::{Chunk, HEADER_PATH_SEPARATOR};
use anyhow::Result;
use std::time::Duration;

/// Trait for embedding providers
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for a batch of texts, in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("No embedding returned"))
    }

    /// Expected embedding dimension, if known up front
    fn dimension(&self) -> Option<usize>;

    /// Short provider description for logs
    fn name(&self) -> String;
}

/// Alignment failures between chunks and the vectors returned for them
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EmbedError {
    #[error("provider returned {actual} embeddings for {expected} chunks")]
    CountMismatch { expected: usize, actual: usize },

    #[error("embedding {index} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("embedding {index} is empty")]
    EmptyVector { index: usize },
}

/// Build the text submitted for embedding
///
/// The header path and a newline are prepended when the chunk has headers.
pub fn embedding_text(chunk: &Chunk) -> String {
    if chunk.headers.is_empty() {
        chunk.text.clone()
    } else {
        format!(
            "{}\n{}",
            chunk.headers.join(HEADER_PATH_SEPARATOR),
            chunk.text
        )
    }
}

/// Embed every chunk, returning vectors aligned by index with `chunks`
///
/// `batch_size` of `None` (or zero) submits all chunks in a single call.
/// Any provider failure or misalignment fails the whole run.
pub async fn embed_chunks(
    provider: &dyn EmbeddingProvider,
    chunks: &[Chunk],
    batch_size: Option<usize>,
) -> Result<Vec<Vec<f32>>> {
    if chunks.is_empty() {
        return Ok(Vec::new());
    }

    let texts: Vec<String> = chunks.iter().map(embedding_text).collect();
    let batch_size = match batch_size {
        Some(size) if size > 0 => size,
        _ => texts.len(),
    };

    tracing::info!(
        "Generating embeddings for {} chunks with {}",
        texts.len(),
        provider.name()
    );

    let mut embeddings = Vec::with_capacity(texts.len());
    for (batch_index, batch) in texts.chunks(batch_size).enumerate() {
        tracing::debug!("Embedding batch {} ({} texts)", batch_index, batch.len());
        let vectors = provider.embed_batch(batch).await?;

        if vectors.len() != batch.len() {
            return Err(EmbedError::CountMismatch {
                expected: batch.len(),
                actual: vectors.len(),
            }
            .into());
        }

        embeddings.extend(vectors);
    }

    validate_dimensions(&embeddings, provider.dimension())?;

    Ok(embeddings)
}

/// Check that all vectors are non-empty and share one dimension
pub fn validate_dimensions(
    embeddings: &[Vec<f32>],
    expected: Option<usize>,
) -> std::result::Result<(), EmbedError> {
    let Some(first) = embeddings.first() else {
        return Ok(());
    };
    let expected = expected.unwrap_or(first.len());

    for (index, vector) in embeddings.iter().enumerate() {
        if vector.is_empty() {
            return Err(EmbedError::EmptyVector { index });
        }
        if vector.len() != expected {
            return Err(EmbedError::DimensionMismatch {
                index,
                expected,
                actual: vector.len(),
            });
        }
    }

    Ok(())
}

/// Create the provider selected in the configuration
pub fn provider_from_config(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    let timeout = Duration::from_secs(config.timeout_secs);

    let provider: Box<dyn EmbeddingProvider> = match config.provider {
        ProviderKind::Ollama => {
            let endpoint = config
                .endpoint
                .as_deref()
                .unwrap_or(LocalEmbedding::DEFAULT_ENDPOINT);
            Box::new(
                LocalEmbedding::new(endpoint, &config.model, timeout)?
                    .with_dimension(config.dimension),
            )
        }
        ProviderKind::OpenAI => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                anyhow::anyhow!("The openai provider requires an embedding endpoint")
            })?;
            Box::new(
                OpenAIEmbedding::new(endpoint, &config.model, config.api_key.as_deref(), timeout)?
                    .with_dimension(config.dimension),
            )
        }
        ProviderKind::Mock => Box::new(MockEmbedding::new(
            config.dimension.unwrap_or(MockEmbedding::DEFAULT_DIMENSION),
        )),
    };

    Ok(provider)
}
