//! Embedding providers
//!
//! Supports local embedding via Ollama, OpenAI-style endpoints, and a
//! deterministic mock for tests and offline runs.

use super::EmbeddingProvider;
use crate::extract::content_hash;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Local embedding provider using Ollama or compatible API
pub struct LocalEmbedding {
    /// API endpoint URL
    endpoint: String,
    /// Model name
    model: String,
    /// HTTP client
    client: reqwest::Client,
    /// Expected embedding dimension
    dimension: Option<usize>,
}

impl LocalEmbedding {
    /// Default Ollama endpoint
    pub const DEFAULT_ENDPOINT: &'static str = "http://localhost:11434";

    /// Create a new local embedding provider
    pub fn new(endpoint: &str, model: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: http_client(timeout)?,
            dimension: None,
        })
    }

    /// Set the expected embedding dimension
    pub fn with_dimension(mut self, dim: Option<usize>) -> Self {
        self.dimension = dim;
        self
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for LocalEmbedding {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.endpoint);

        let request = OllamaEmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send embedding request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Embedding request failed: {} - {}", status, body);
        }

        let result: OllamaEmbedResponse = response
            .json()
            .await
            .context("Failed to parse embedding response")?;

        Ok(result.embeddings)
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn name(&self) -> String {
        format!("ollama:{}", self.model)
    }
}

/// Ollama batch embedding request
#[derive(Debug, Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Ollama batch embedding response
#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// OpenAI-compatible embedding provider
pub struct OpenAIEmbedding {
    /// API endpoint URL
    endpoint: String,
    /// Model name
    model: String,
    /// API key
    api_key: Option<String>,
    /// HTTP client
    client: reqwest::Client,
    /// Expected embedding dimension
    dimension: Option<usize>,
}

impl OpenAIEmbedding {
    /// Create a new OpenAI-compatible embedding provider
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.map(|s| s.to_string()),
            client: http_client(timeout)?,
            dimension: None,
        })
    }

    /// Set the expected embedding dimension
    pub fn with_dimension(mut self, dim: Option<usize>) -> Self {
        self.dimension = dim;
        self
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAIEmbedding {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/v1/embeddings", self.endpoint);

        let request = OpenAIEmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let mut req_builder = self.client.post(&url).json(&request);

        if let Some(ref key) = self.api_key {
            req_builder = req_builder.bearer_auth(key);
        }

        let response = req_builder
            .send()
            .await
            .context("Failed to send embedding request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Embedding request failed: {} - {}", status, body);
        }

        let result: OpenAIEmbeddingResponse = response
            .json()
            .await
            .context("Failed to parse embedding response")?;

        Ok(reorder_by_index(result.data))
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn name(&self) -> String {
        format!("openai:{}", self.model)
    }
}

/// Restore input order; the API does not guarantee it
fn reorder_by_index(data: Vec<OpenAIEmbeddingData>) -> Vec<Vec<f32>> {
    let mut embeddings: Vec<_> = data.into_iter().map(|d| (d.index, d.embedding)).collect();
    embeddings.sort_by_key(|(idx, _)| *idx);
    embeddings.into_iter().map(|(_, e)| e).collect()
}

/// OpenAI embedding request
#[derive(Debug, Serialize)]
struct OpenAIEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// OpenAI embedding response
#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

/// OpenAI embedding data item
#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Mock embedding provider for testing
pub struct MockEmbedding {
    dimension: usize,
}

impl MockEmbedding {
    /// Same dimension as all-MiniLM-L6-v2
    pub const DEFAULT_DIMENSION: usize = 384;

    /// Create a new mock embedding provider
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Deterministic vector in [-1, 1] derived from the text hash
    fn vector_for(&self, text: &str) -> Vec<f32> {
        let hash = content_hash(text);
        let bytes = hash.as_bytes();

        (0..self.dimension)
            .map(|i| {
                let byte = bytes[i % bytes.len()] as f32;
                (byte / 255.0) * 2.0 - 1.0
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockEmbedding {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.vector_for(text)).collect())
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }

    fn name(&self) -> String {
        format!("mock:{}", self.dimension)
    }
}
