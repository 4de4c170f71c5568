//! LLM completion provider contract, used by the context pack builder's
//! rerank step. Not part of the original component list; added because the
//! rerank step needs a seam to call out to a model, and the fallback
//! (fused-score ordering) needs something to fall back *from*.

use crate::domain::error::Result;
use async_trait::async_trait;

/// Parameters for a single completion call.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    /// Maximum tokens to generate.
    pub max_tokens: usize,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.0,
        }
    }
}

/// A provider that can complete a prompt with a text response.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete `prompt`, returning the model's raw text response.
    async fn complete(&self, prompt: &str, opts: CompletionOptions) -> Result<String>;
}
