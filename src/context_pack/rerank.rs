//! Step 5 — LLM rerank, with a fused-score fallback on any failure.

use super::fusion::RetrievedChunk;
use crate::domain::ports::{CompletionOptions, LlmProvider};

const POOL_SIZE: usize = 15;
const RERANK_THRESHOLD: usize = 5;
const PROMPT_EXCERPT_CHARS: usize = 200;

/// Rerank `candidates` (already sorted by fused score) with an LLM call.
///
/// Candidates beyond the top 15 are never sent to the model and are kept
/// at the tail, in their original order. Any parse or provider failure
/// falls back to the input order unchanged.
pub async fn rerank(llm: &dyn LlmProvider, query: &str, mut candidates: Vec<RetrievedChunk>) -> Vec<RetrievedChunk> {
    if candidates.len() <= RERANK_THRESHOLD {
        return candidates;
    }

    let pool_len = candidates.len().min(POOL_SIZE);
    let pool: Vec<RetrievedChunk> = candidates.drain(..pool_len).collect();
    let non_candidates = candidates;

    let prompt = build_prompt(query, &pool);
    let opts = CompletionOptions { max_tokens: 256, temperature: 0.0 };

    let mut result = match llm.complete(&prompt, opts).await {
        Ok(text) => parse_indices(&text).map(|indices| apply_rerank(pool.clone(), indices)).unwrap_or(pool),
        Err(_) => pool,
    };
    result.extend(non_candidates);
    result
}

fn apply_rerank(pool: Vec<RetrievedChunk>, indices: Vec<usize>) -> Vec<RetrievedChunk> {
    let mut taken = vec![false; pool.len()];
    let mut ranked = Vec::with_capacity(pool.len());

    for (rank, idx) in indices.into_iter().enumerate() {
        if let Some(slot) = taken.get_mut(idx) {
            if !*slot {
                *slot = true;
                let mut chunk = pool[idx].clone();
                chunk.score = 1.0 - 0.05 * rank as f32;
                ranked.push(chunk);
            }
        }
    }

    let unranked = pool.into_iter().zip(taken).filter(|(_, was_taken)| !was_taken).map(|(chunk, _)| chunk);
    ranked.extend(unranked);
    ranked
}

fn parse_indices(text: &str) -> Option<Vec<usize>> {
    let start = text.find('[')?;
    let end = text[start..].find(']')? + start + 1;
    serde_json::from_str::<Vec<usize>>(&text[start..end]).ok()
}

fn build_prompt(query: &str, pool: &[RetrievedChunk]) -> String {
    let mut prompt = format!(
        "Query: {query}\n\nRank the following snippets by relevance to the query. \
         Respond with only a JSON array of their indices, most relevant first.\n\n"
    );
    for (i, chunk) in pool.iter().enumerate() {
        let excerpt: String = chunk.content.chars().take(PROMPT_EXCERPT_CHARS).collect();
        prompt.push_str(&format!("{i}. [{}] {}\n", chunk.file, excerpt.replace('\n', " ")));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::Result;
    use async_trait::async_trait;

    fn chunk(file: &str, score: f32) -> RetrievedChunk {
        RetrievedChunk { file: file.to_string(), content: "x".repeat(10), language: "rust".to_string(), score, facet: "code".to_string() }
    }

    struct StubLlm(String);

    #[async_trait]
    impl LlmProvider for StubLlm {
        async fn complete(&self, _prompt: &str, _opts: CompletionOptions) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn six_or_fewer_candidates_skip_reranking() {
        let llm = StubLlm("[0]".to_string());
        let candidates: Vec<_> = (0..5).map(|i| chunk(&format!("f{i}.rs"), 1.0)).collect();
        let result = rerank(&llm, "q", candidates.clone()).await;
        assert_eq!(result.len(), candidates.len());
        assert_eq!(result[0].file, candidates[0].file);
    }

    #[tokio::test]
    async fn llm_order_is_applied_to_the_ranked_pool() {
        let llm = StubLlm("noise before [2, 0, 1] noise after".to_string());
        let candidates: Vec<_> = (0..6).map(|i| chunk(&format!("f{i}.rs"), 1.0)).collect();
        let result = rerank(&llm, "q", candidates).await;
        assert_eq!(result[0].file, "f2.rs");
        assert_eq!(result[1].file, "f0.rs");
        assert_eq!(result[2].file, "f1.rs");
    }

    #[tokio::test]
    async fn malformed_llm_output_falls_back_to_fused_order() {
        let llm = StubLlm("not json".to_string());
        let candidates: Vec<_> = (0..6).map(|i| chunk(&format!("f{i}.rs"), 1.0)).collect();
        let result = rerank(&llm, "q", candidates.clone()).await;
        assert_eq!(result[0].file, candidates[0].file);
    }
}
