//! Deterministic hashing embedding provider.
//!
//! Not a real semantic embedder — it feature-hashes whitespace tokens into
//! a fixed-width vector and L2-normalizes the result. Same text always
//! produces the same vector, which is exactly what the crate's own test
//! suite needs (deterministic chunking, RRF-determinism, round-trip
//! invariants) without a network dependency.

use crate::domain::error::Result;
use crate::domain::ports::EmbeddingProvider;
use crate::domain::types::{DenseVector, SparseVector};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Feature-hashing embedder with a configurable dense width.
pub struct HashingEmbeddingProvider {
    dimensions: usize,
}

impl HashingEmbeddingProvider {
    /// Create a provider that emits `dimensions`-wide dense vectors.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn hash_token(token: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        hasher.finish()
    }
}

fn normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    v
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<DenseVector> {
        let mut v = vec![0.0f32; self.dimensions];
        for token in text.split_whitespace() {
            let h = Self::hash_token(token);
            let idx = (h as usize) % self.dimensions;
            let sign = if (h >> 63) & 1 == 0 { 1.0 } else { -1.0 };
            v[idx] += sign;
        }
        Ok(normalize(v))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<DenseVector>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    async fn embed_sparse(&self, text: &str) -> Result<Option<SparseVector>> {
        const VOCAB_SIZE: u32 = 50_000;
        let mut indices = Vec::new();
        let mut values = Vec::new();
        for token in text.split_whitespace() {
            let idx = (Self::hash_token(token) as u32) % VOCAB_SIZE;
            match indices.iter().position(|i| *i == idx) {
                Some(pos) => values[pos] += 1.0,
                None => {
                    indices.push(idx);
                    values.push(1.0);
                }
            }
        }
        Ok(Some(SparseVector { indices, values }))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "hashing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_always_embeds_identically() {
        let provider = HashingEmbeddingProvider::new(64);
        let a = provider.embed("fn login() {}").await.unwrap();
        let b = provider.embed("fn login() {}").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn different_text_embeds_differently() {
        let provider = HashingEmbeddingProvider::new(64);
        let a = provider.embed("fn login() {}").await.unwrap();
        let b = provider.embed("fn logout() {}").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn embed_batch_preserves_order() {
        let provider = HashingEmbeddingProvider::new(32);
        let texts = vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()];
        let batch = provider.embed_batch(&texts).await.unwrap();
        for (text, vec) in texts.iter().zip(batch.iter()) {
            assert_eq!(*vec, provider.embed(text).await.unwrap());
        }
    }

    #[tokio::test]
    async fn vectors_are_unit_normalized() {
        let provider = HashingEmbeddingProvider::new(32);
        let v = provider.embed("some arbitrary source text here").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4 || norm == 0.0);
    }
}
