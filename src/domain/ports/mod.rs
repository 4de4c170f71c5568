//! Port interfaces: boundary contracts between the domain and the outside
//! world (vector database, embedding service, LLM). Each trait is object
//! safe and implemented behind `Arc<dyn Trait>` so the composition root
//! (`crate::engine::Engine`) can wire concrete providers without a DI
//! container.

/// Text-to-embedding provider contract.
pub mod embedding;
/// LLM completion provider contract, used by the context pack reranker.
pub mod llm;
/// Vector database facade contract (C1).
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use llm::{CompletionOptions, LlmProvider};
pub use vector_store::{
    DuplicateGroup, FusedHit, GroupedHits, RecommendRequest, SearchRequest, VectorStoreProvider,
};
