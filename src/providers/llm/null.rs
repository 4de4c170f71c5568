//! No-op LLM provider: every call fails with [`Error::llm`].
//!
//! Used when no LLM is configured (the `llm.provider = "null"` default) or
//! in tests. Callers that have a non-LLM fallback path — the context pack
//! rerank step falls back to fused-score ordering — treat this provider's
//! error as the signal to take it.

use crate::domain::error::{Error, Result};
use crate::domain::ports::llm::{CompletionOptions, LlmProvider};
use async_trait::async_trait;

/// An [`LlmProvider`] that never produces a completion.
pub struct NullLlmProvider;

#[async_trait]
impl LlmProvider for NullLlmProvider {
    async fn complete(&self, _prompt: &str, _opts: CompletionOptions) -> Result<String> {
        Err(Error::llm("no LLM provider configured"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_errors() {
        let provider = NullLlmProvider;
        let result = provider.complete("anything", CompletionOptions::default()).await;
        assert!(result.is_err());
    }
}
