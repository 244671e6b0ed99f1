//! Chunk extraction from markdown documents
//!
//! This module turns raw document text into retrievable chunks:
//! - Splits documents at header lines (levels 1 to 5)
//! - Tags each chunk with the header hierarchy active at that point

pub mod doc;

pub use doc::{match_header, section, HeaderHierarchy, HeaderLine, MAX_HEADER_DEPTH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Separator placed between header levels in a header path
pub const HEADER_PATH_SEPARATOR: &str = " > ";

/// Compute a stable hash for content
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// A unit of retrieval produced by sectioning a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Identifier of the form `{source}_{sequence}`
    pub id: String,
    /// Identifier of the originating document
    pub source: String,
    /// Active header hierarchy, outermost first, without unset levels
    pub headers: Vec<String>,
    /// Raw section text including its own header line, trimmed
    pub text: String,
}

impl Chunk {
    /// Create a new chunk with the `{source}_{sequence}` id
    pub fn new(source: &str, sequence: usize, headers: Vec<String>, text: &str) -> Self {
        Self {
            id: format!("{}_{}", source, sequence),
            source: source.to_string(),
            headers,
            text: text.to_string(),
        }
    }

    /// Get the header hierarchy as a single string (e.g. "Install > Linux")
    pub fn header_path(&self) -> String {
        self.headers.join(HEADER_PATH_SEPARATOR)
    }
}
