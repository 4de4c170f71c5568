//! Embedding provider implementations.

/// Deterministic hashing-based embedder, used as the in-crate test double
/// and as a dependency-free default when no real provider is configured.
pub mod hashing;
/// Embedder that always returns a zero vector; used where embeddings are
/// deliberately unused (e.g. exercising non-embedding code paths in tests).
pub mod null;

pub use hashing::HashingEmbeddingProvider;
pub use null::NullEmbeddingProvider;
