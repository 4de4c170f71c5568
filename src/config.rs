//! Layered configuration loading.
//!
//! Merges, in ascending priority: the embedded [`DEFAULT_CONFIG_TOML`], an
//! optional user TOML file, and `CODECTX__`-prefixed environment variables
//! (double underscore as the nesting separator, e.g.
//! `CODECTX__VECTOR_STORE__URL`).

use crate::domain::error::{Error, Result};
use config::{Config as ConfigBuilder, Environment, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Vector store connection and collection-layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Qdrant gRPC endpoint.
    pub url: String,
    /// Width of dense vectors produced by the embedding provider.
    pub vector_size: usize,
    /// Whether to also write/search named sparse vectors.
    pub sparse_vectors_enabled: bool,
    /// Whether each chunk kind gets its own collection, vs. one shared one.
    pub separate_collections: bool,
    /// Name of the legacy single collection, used when
    /// `separate_collections` is false.
    pub legacy_codebase_collection: String,
}

/// Embedding provider selection and connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider identifier (`"hashing"`, `"null"`, or a real backend name).
    pub provider: String,
    /// HTTP endpoint, for providers that call out.
    pub endpoint: String,
    /// API key, for providers that require one.
    pub api_key: String,
}

/// LLM provider selection, used by the context pack rerank step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider identifier (`"null"` or a real backend name).
    pub provider: String,
    /// HTTP endpoint, for providers that call out.
    pub endpoint: String,
    /// API key, for providers that require one.
    pub api_key: String,
    /// Model identifier to request.
    pub model: String,
}

/// Limits applied while an autonomous agent drives the engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Hard wall-clock timeout per agent step, in seconds.
    pub timeout_secs: u64,
    /// Maximum agent loop iterations before giving up.
    pub max_iterations: u32,
}

/// Batch sizes and size ceilings applied during indexing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Files processed per batch when walking a project.
    pub file_batch_size: usize,
    /// Chunks embedded per provider call.
    pub embedding_batch_size: usize,
    /// Chunks larger than this many characters are skipped, not embedded.
    pub max_chunk_chars: usize,
}

/// Timeouts applied to subprocess-backed quality gates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GatesConfig {
    /// Timeout for the typecheck gate, in seconds.
    pub typecheck_timeout_secs: u64,
    /// Timeout for the test-suite gate, in seconds.
    pub test_timeout_secs: u64,
}

/// Logging output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit newline-delimited JSON instead of human-readable text.
    pub json: bool,
}

/// Root configuration for the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Vector store settings.
    pub vector_store: VectorStoreConfig,
    /// Embedding provider settings.
    pub embedding: EmbeddingConfig,
    /// LLM provider settings.
    pub llm: LlmConfig,
    /// Agent-loop limits.
    pub agent: AgentConfig,
    /// Indexing batch sizes and limits.
    pub indexing: IndexingConfig,
    /// Quality gate timeouts.
    pub gates: GatesConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from embedded defaults and environment overrides.
    pub fn load() -> Result<Self> {
        Self::build(None)
    }

    /// Load configuration from embedded defaults, a user TOML file, and
    /// environment overrides, in that priority order.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::build(Some(path))
    }

    fn build(user_file: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG_TOML, FileFormat::Toml));

        if let Some(path) = user_file {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("CODECTX")
                .separator("__")
                .try_parsing(true),
        );

        let raw = builder
            .build()
            .map_err(|e| Error::config(format!("failed to build configuration: {e}")))?;

        raw.try_deserialize()
            .map_err(|e| Error::config(format!("failed to deserialize configuration: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_parse() {
        let cfg = EngineConfig::load().expect("embedded defaults must parse");
        assert_eq!(cfg.vector_store.vector_size, 1536);
        assert_eq!(cfg.indexing.file_batch_size, 20);
        assert_eq!(cfg.gates.test_timeout_secs, 60);
    }

    #[test]
    fn env_override_takes_precedence() {
        std::env::set_var("CODECTX__VECTOR_STORE__VECTOR_SIZE", "768");
        let cfg = EngineConfig::load().expect("config with env override must parse");
        assert_eq!(cfg.vector_store.vector_size, 768);
        std::env::remove_var("CODECTX__VECTOR_STORE__VECTOR_SIZE");
    }
}
