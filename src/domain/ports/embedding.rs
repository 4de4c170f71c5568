//! Text-to-embedding provider contract (component C2).

use crate::domain::error::Result;
use crate::domain::types::{DenseVector, SparseVector};
use async_trait::async_trait;

/// Transforms text into dense (and optionally sparse) embedding vectors.
///
/// Implementations are expected to be stateless and cheaply cloneable via
/// `Arc`; batching is a separate method rather than a loop over `embed` so
/// a real provider can use its batch HTTP endpoint.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single piece of text.
    async fn embed(&self, text: &str) -> Result<DenseVector>;

    /// Embed a batch of texts in one call, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<DenseVector>>;

    /// Produce a sparse (lexical) vector for `text`, if this provider
    /// supports hybrid search. Returns `None` for dense-only providers.
    async fn embed_sparse(&self, _text: &str) -> Result<Option<SparseVector>> {
        Ok(None)
    }

    /// Width of vectors produced by [`Self::embed`].
    fn dimensions(&self) -> usize;

    /// Short identifier used in logs and in the collection metadata.
    fn provider_name(&self) -> &str;
}
