//! No-op embedding provider: always returns a zero vector, never sparse.

use crate::domain::error::Result;
use crate::domain::ports::EmbeddingProvider;
use crate::domain::types::DenseVector;
use async_trait::async_trait;

/// An embedder that performs no real work. Useful where an
/// [`EmbeddingProvider`] is required by a signature but embeddings are not
/// on the path under test.
pub struct NullEmbeddingProvider {
    dimensions: usize,
}

impl NullEmbeddingProvider {
    /// Create a provider that emits `dimensions`-wide zero vectors.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for NullEmbeddingProvider {
    async fn embed(&self, _text: &str) -> Result<DenseVector> {
        Ok(vec![0.0; self.dimensions])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<DenseVector>> {
        Ok(texts.iter().map(|_| vec![0.0; self.dimensions]).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "null"
    }
}
