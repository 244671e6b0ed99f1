//! ragprep - Markdown chunking and embedding for retrieval
//!
//! This library splits markdown documents into chunks along header
//! boundaries, tags each chunk with its header hierarchy, and prepares the
//! chunks and their embeddings for a semantic-search component.

pub mod cli;
pub mod corpus;
pub mod embed;
pub mod extract;
pub mod storage;

/// Re-export commonly used types
pub use corpus::{Config, Corpus, Document};
pub use embed::{embed_chunks, embedding_text, EmbeddingProvider};
pub use extract::{section, Chunk};
pub use storage::{Index, IndexStore};

/// Application-wide error type
pub use anyhow::Result;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "ragprep";
