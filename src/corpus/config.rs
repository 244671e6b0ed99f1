//! Configuration for a documentation corpus

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory (inside the docs root) holding ragprep state
pub const STATE_DIR: &str = ".ragprep";

/// Configuration file name inside the state directory
pub const CONFIG_FILE: &str = "config.toml";

/// Configuration for a documentation corpus being indexed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Patterns for document files (glob patterns)
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,

    /// Descend into subdirectories when discovering documents
    #[serde(default)]
    pub recursive: bool,

    /// Patterns to ignore (glob patterns)
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Where index files are written (relative to the docs root, defaults to it)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// File name for chunk records
    #[serde(default = "default_chunks_file")]
    pub chunks_file: String,

    /// File name for embedding vectors
    #[serde(default = "default_embeddings_file")]
    pub embeddings_file: String,

    /// Embedding provider configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Which embedding backend to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local Ollama server
    #[default]
    Ollama,
    /// OpenAI-compatible `/v1/embeddings` endpoint
    #[value(name = "openai")]
    OpenAI,
    /// Deterministic hash-based vectors (no network)
    Mock,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Ollama => write!(f, "ollama"),
            ProviderKind::OpenAI => write!(f, "openai"),
            ProviderKind::Mock => write!(f, "mock"),
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Backend to use
    #[serde(default)]
    pub provider: ProviderKind,

    /// API endpoint URL (Ollama defaults to http://localhost:11434)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Model name to use
    #[serde(default = "default_model")]
    pub model: String,

    /// API key (if required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Expected vector dimension; checked against every returned vector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,

    /// Chunks per provider call; unset sends the whole batch at once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_patterns() -> Vec<String> {
    vec!["*.md".to_string()]
}

fn default_ignore_patterns() -> Vec<String> {
    vec![
        ".ragprep/**".to_string(),
        ".git/**".to_string(),
        "node_modules/**".to_string(),
    ]
}

fn default_chunks_file() -> String {
    "chunks.json".to_string()
}

fn default_embeddings_file() -> String {
    "embeddings.json".to_string()
}

fn default_model() -> String {
    "all-minilm".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            endpoint: None,
            model: default_model(),
            api_key: None,
            dimension: None,
            batch_size: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            patterns: default_patterns(),
            recursive: false,
            ignore_patterns: default_ignore_patterns(),
            output_dir: None,
            chunks_file: default_chunks_file(),
            embeddings_file: default_embeddings_file(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl Config {
    /// Path of the configuration file for a docs root
    pub fn path(root: &Path) -> PathBuf {
        root.join(STATE_DIR).join(CONFIG_FILE)
    }

    /// Load configuration from the docs root or return defaults
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let config_path = Self::path(root);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the docs root
    pub fn save(&self, root: &Path) -> Result<()> {
        let state_dir = root.join(STATE_DIR);
        std::fs::create_dir_all(&state_dir)
            .with_context(|| format!("Failed to create {:?}", state_dir))?;

        let config_path = Self::path(root);
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Check if a path (relative to the docs root) should be ignored
    pub fn should_ignore(&self, path: &str) -> bool {
        self.ignore_patterns
            .iter()
            .any(|pattern| glob_match_simple(pattern, path))
    }

    /// Check if a path (relative to the docs root) is a document
    pub fn is_document(&self, path: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| glob_match_simple(pattern, path))
    }
}

/// Simple glob matching helper (supports one `*` or one `**`)
fn glob_match_simple(pattern: &str, path: &str) -> bool {
    if pattern.contains("**") {
        let parts: Vec<&str> = pattern.split("**").collect();
        if parts.len() == 2 {
            let prefix = parts[0].trim_end_matches('/');
            let suffix = parts[1].trim_start_matches('/');
            return (prefix.is_empty() || path.starts_with(prefix))
                && (suffix.is_empty() || path.ends_with(suffix));
        }
    }

    if pattern.contains('*') {
        let parts: Vec<&str> = pattern.split('*').collect();
        if parts.len() == 2 {
            return path.starts_with(parts[0]) && path.ends_with(parts[1]);
        }
    }

    path == pattern || path.ends_with(&format!("/{}", pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.patterns, vec!["*.md"]);
        assert!(!config.recursive);
        assert_eq!(config.chunks_file, "chunks.json");
        assert_eq!(config.embeddings_file, "embeddings.json");
        assert_eq!(config.embedding.provider, ProviderKind::Ollama);
        assert_eq!(config.embedding.model, "all-minilm");
        assert_eq!(config.embedding.batch_size, None);
    }

    #[test]
    fn test_glob_matching() {
        assert!(glob_match_simple("*.md", "README.md"));
        assert!(glob_match_simple("*.md", "guides/setup.md"));
        assert!(glob_match_simple(".ragprep/**", ".ragprep/config.toml"));
        assert!(glob_match_simple("docs/**/*.md", "docs/api/guide.md"));
        assert!(!glob_match_simple("*.md", "notes.txt"));
        assert!(glob_match_simple("CHANGELOG.md", "sub/CHANGELOG.md"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
recursive = true

[embedding]
provider = "openai"
endpoint = "http://localhost:8080"
dimension = 384
"#,
        )
        .unwrap();

        assert!(config.recursive);
        assert_eq!(config.patterns, vec!["*.md"]);
        assert_eq!(config.embedding.provider, ProviderKind::OpenAI);
        assert_eq!(config.embedding.model, "all-minilm");
        assert_eq!(config.embedding.dimension, Some(384));
        assert_eq!(config.embedding.timeout_secs, 120);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.embedding.provider = ProviderKind::Mock;
        config.embedding.dimension = Some(12);
        config.output_dir = Some(PathBuf::from("out"));

        config.save(dir.path()).unwrap();
        assert!(Config::path(dir.path()).exists());

        let loaded = Config::load_or_default(dir.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_or_default(dir.path()).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(STATE_DIR)).unwrap();
        std::fs::write(Config::path(dir.path()), "recursive = \"maybe\"").unwrap();

        assert!(Config::load_or_default(dir.path()).is_err());
    }
}
