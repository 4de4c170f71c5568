//! Vector store provider implementations.

/// In-process test double backing [`crate::domain::ports::VectorStoreProvider`].
pub mod memory;
/// Qdrant-backed implementation.
pub mod qdrant;

pub use memory::InMemoryVectorStore;
pub use qdrant::QdrantVectorStore;
