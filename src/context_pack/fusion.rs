//! Step 3 — per-facet hybrid retrieval: native dense+sparse search when the
//! embedder supports it, otherwise dense search fused with a client-side
//! keyword scan via weighted fusion.

use crate::domain::error::Result;
use crate::domain::ports::vector_store::SearchRequest;
use crate::domain::ports::VectorStoreProvider;
use crate::domain::types::{Chunk, DenseVector, SparseVector};
use std::collections::HashMap;
use uuid::Uuid;

/// A page size for the keyword-search scroll; bounds how much of a
/// collection gets scanned client-side per facet query.
const KEYWORD_SCROLL_PAGE: usize = 100;
/// Stop scrolling for keyword matches once this many candidates are found.
const KEYWORD_SCAN_CAP_MULTIPLIER: usize = 4;
/// Tokens at or below this length are dropped from keyword matching.
const MIN_KEYWORD_LEN: usize = 2;

/// One chunk retrieved for a facet, with its fused relevance score.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    /// Source file.
    pub file: String,
    /// Raw chunk content.
    pub content: String,
    /// Language tag, for code-fence rendering at assembly time.
    pub language: String,
    /// Fused (or graph-expansion-discounted) relevance score.
    pub score: f32,
    /// Facet this chunk was retrieved under (`"code"`, `"graph"`, ...).
    pub facet: String,
}

/// Retrieve the top `limit` chunks for one facet's collection.
pub async fn retrieve_facet(
    vector_store: &dyn VectorStoreProvider,
    collection: &str,
    facet: &str,
    query: &str,
    dense: &DenseVector,
    sparse: Option<&SparseVector>,
    semantic_weight: f32,
    limit: usize,
) -> Result<Vec<RetrievedChunk>> {
    match sparse {
        Some(sparse) => native_hybrid(vector_store, collection, facet, dense, sparse, limit).await,
        None => fallback_fusion(vector_store, collection, facet, query, dense, semantic_weight, limit).await,
    }
}

async fn native_hybrid(
    vector_store: &dyn VectorStoreProvider,
    collection: &str,
    facet: &str,
    dense: &DenseVector,
    sparse: &SparseVector,
    limit: usize,
) -> Result<Vec<RetrievedChunk>> {
    let request = SearchRequest {
        collection: collection.to_string(),
        dense: Some(dense.clone()),
        sparse: Some(sparse.clone()),
        limit: limit * 2,
        filter: HashMap::new(),
        score_threshold: None,
    };
    let hits = vector_store.search(request).await?;
    Ok(hits.into_iter().take(limit).map(|h| RetrievedChunk {
        file: h.chunk.chunk.file,
        content: h.chunk.chunk.content,
        language: h.chunk.chunk.language,
        score: h.chunk.score,
        facet: facet.to_string(),
    }).collect())
}

async fn fallback_fusion(
    vector_store: &dyn VectorStoreProvider,
    collection: &str,
    facet: &str,
    query: &str,
    dense: &DenseVector,
    semantic_weight: f32,
    limit: usize,
) -> Result<Vec<RetrievedChunk>> {
    let semantic_hits = vector_store.search(SearchRequest::dense(collection, dense.clone(), limit * 2)).await?;
    let keyword_hits = keyword_search(vector_store, collection, query, limit * 2).await?;

    let mut combined: HashMap<Uuid, (Option<f32>, Option<f32>, Chunk)> = HashMap::new();
    for hit in semantic_hits {
        combined.entry(hit.chunk.id).or_insert_with(|| (None, None, hit.chunk.chunk.clone())).0 = Some(hit.chunk.score);
    }
    for (chunk, keyword_score) in keyword_hits {
        combined.entry(chunk.id).or_insert_with(|| (None, None, chunk.clone())).1 = Some(keyword_score);
    }

    let mut fused: Vec<RetrievedChunk> = combined
        .into_values()
        .map(|(semantic, keyword, chunk)| {
            let score = fuse(semantic, keyword, semantic_weight);
            RetrievedChunk { file: chunk.file, content: chunk.content, language: chunk.language, score, facet: facet.to_string() }
        })
        .collect();

    fused.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    fused.truncate(limit);
    Ok(fused)
}

/// `semanticWeight * semanticScore + (1 - semanticWeight) * keywordScore`,
/// where a missing side of the hit scores zero rather than being imputed.
fn fuse(semantic: Option<f32>, keyword: Option<f32>, semantic_weight: f32) -> f32 {
    semantic_weight * semantic.unwrap_or(0.0) + (1.0 - semantic_weight) * keyword.unwrap_or(0.0)
}

async fn keyword_search(
    vector_store: &dyn VectorStoreProvider,
    collection: &str,
    query: &str,
    limit: usize,
) -> Result<Vec<(Chunk, f32)>> {
    let tokens: Vec<String> = query.split_whitespace().map(|t| t.to_lowercase()).filter(|t| t.chars().count() > MIN_KEYWORD_LEN).collect();
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let mut matches: Vec<(Chunk, f32)> = Vec::new();
    let mut offset = None;
    loop {
        let (chunks, next) = vector_store.scroll(collection, KEYWORD_SCROLL_PAGE, offset).await?;
        if chunks.is_empty() {
            break;
        }
        for chunk in chunks {
            let content_lower = chunk.content.to_lowercase();
            let hits = tokens.iter().filter(|t| content_lower.contains(t.as_str())).count();
            if hits > 0 {
                matches.push((chunk, hits as f32 / tokens.len() as f32));
            }
        }
        match next {
            Some(n) if matches.len() < limit * KEYWORD_SCAN_CAP_MULTIPLIER => offset = Some(n),
            _ => break,
        }
    }

    matches.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    matches.truncate(limit);
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::EmbeddingProvider;
    use crate::providers::embedding::hashing::HashingEmbeddingProvider;
    use crate::providers::vector_store::InMemoryVectorStore;
    use crate::domain::types::{Chunk, ChunkKind, Layer};
    use chrono::Utc;

    fn sample_chunk(file: &str, content: &str) -> Chunk {
        Chunk {
            id: Uuid::new_v4(),
            file: file.to_string(),
            start_line: 1,
            end_line: 3,
            language: "rust".to_string(),
            content: content.to_string(),
            chunk_type: ChunkKind::Code,
            layer: Layer::Other,
            service: None,
            imports: Vec::new(),
            symbols: Vec::new(),
            chunk_index: 0,
            total_chunks: 1,
            project: "demo".to_string(),
            indexed_at: Utc::now(),
            file_hash: None,
            git_commit: None,
        }
    }

    #[test]
    fn fuse_matches_the_worked_hybrid_fallback_example() {
        let d1 = fuse(Some(0.9), None, 0.7);
        let d2 = fuse(Some(0.6), Some(0.8), 0.7);
        let d3 = fuse(None, Some(0.5), 0.7);

        assert!((d1 - 0.63).abs() < 1e-6);
        assert!((d2 - 0.66).abs() < 1e-6);
        assert!((d3 - 0.15).abs() < 1e-6);

        let mut ordered = vec![("d1", d1), ("d2", d2), ("d3", d3)];
        ordered.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        let order: Vec<&str> = ordered.into_iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["d2", "d1", "d3"]);
    }

    #[tokio::test]
    async fn fallback_fusion_blends_semantic_and_keyword_scores() {
        let store = InMemoryVectorStore::new();
        let embedder = HashingEmbeddingProvider::new(32);

        let chunks = vec![
            sample_chunk("a.rs", "fn retry_with_backoff() { loop {} }"),
            sample_chunk("b.rs", "struct Unrelated;"),
        ];
        let mut payload = Vec::new();
        for chunk in &chunks {
            let vector = embedder.embed(&chunk.content).await.unwrap();
            payload.push((chunk.clone(), vector, None));
        }
        store.ensure_collection("demo_code", 32, false).await.unwrap();
        store.upsert("demo_code", &payload).await.unwrap();

        let query_dense = embedder.embed("retry backoff loop").await.unwrap();
        let hits = retrieve_facet(&store, "demo_code", "code", "retry backoff loop", &query_dense, None, 0.7, 8).await.unwrap();

        assert!(!hits.is_empty());
        assert_eq!(hits[0].file, "a.rs");
    }
}
