//! Concrete implementations of the domain's port traits.

/// Embedding provider implementations.
pub mod embedding;
/// LLM provider implementations.
pub mod llm;
/// Vector store provider implementations.
pub mod vector_store;
