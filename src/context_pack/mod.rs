//! Context Pack Builder (component C10): the eight-step hybrid retrieval
//! pipeline that turns a free-text query into a token-budgeted, assembled
//! context string plus its guardrails.

mod compress;
mod facets;
mod fusion;
mod rerank;

use crate::collection::{named, typed_collection};
use crate::domain::error::Result;
use crate::domain::ports::vector_store::SearchRequest;
use crate::domain::ports::{EmbeddingProvider, LlmProvider, VectorStoreProvider};
use crate::domain::types::MemoryType;
use crate::graph_store::GraphStore;
use crate::memory::MemoryService;
use fusion::RetrievedChunk;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

const GRAPH_EXPAND_SEED_CAP: usize = 5;
const GRAPH_EXPAND_NEW_FILE_CAP: usize = 5;
const GRAPH_EXPAND_SCORE_MULTIPLIER: f32 = 0.8;
const GRAPH_FACET_NAME: &str = "graph";
const GUARDRAIL_SCORE_FLOOR: f32 = 0.5;
const GUARDRAIL_CONTENT_CHARS: usize = 200;
const GUARDRAIL_LIMIT: usize = 3;

/// Request parameters for [`ContextPackBuilder::build`].
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Project to retrieve from.
    pub project_name: String,
    /// Free-text query.
    pub query: String,
    /// Total token budget for the assembled pack.
    pub max_tokens: usize,
    /// Weight given to semantic score in the fallback fusion formula.
    pub semantic_weight: f32,
    /// Whether to surface related ADRs (durable `Decision` memories) as a guardrail.
    pub include_adrs: bool,
    /// Whether to surface known test commands (durable `Context` memories) as a guardrail.
    pub include_tests: bool,
    /// Whether to run one hop of graph expansion from retrieved files.
    pub graph_expand: bool,
}

impl BuildRequest {
    /// Build a request with the documented defaults
    /// (`semanticWeight=0.7`, `includeADRs=true`, `includeTests=false`, `graphExpand=true`).
    pub fn new(project_name: impl Into<String>, query: impl Into<String>, max_tokens: usize) -> Self {
        Self {
            project_name: project_name.into(),
            query: query.into(),
            max_tokens,
            semantic_weight: 0.7,
            include_adrs: true,
            include_tests: false,
            graph_expand: true,
        }
    }
}

/// One chunk surviving compression, as it will be assembled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackedChunk {
    /// Source file.
    pub file: String,
    /// Chunk content, possibly truncated.
    pub content: String,
    /// Final relevance score.
    pub score: f32,
}

/// Selected chunks for one facet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacetPack {
    /// Facet name (`"code"`, `"docs"`, `"config"`, `"contracts"`, `"graph"`).
    pub name: String,
    /// Chunks this facet contributed to the final pack.
    pub chunks: Vec<PackedChunk>,
}

/// Guardrail content surfaced alongside the pack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Guardrails {
    /// Related architecture decisions (durable `Decision` memories).
    pub related_adrs: Vec<String>,
    /// Known test commands (durable `Context` memories).
    pub test_commands: Vec<String>,
}

/// The built context pack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextPack {
    /// Per-facet breakdown of the selected chunks.
    pub facets: Vec<FacetPack>,
    /// Estimated total tokens across every selected chunk.
    pub total_tokens: usize,
    /// Guardrail content.
    pub guardrails: Guardrails,
    /// Final assembled markdown string.
    pub assembled: String,
}

/// Builds [`ContextPack`]s via an eight-step hybrid retrieval pipeline.
pub struct ContextPackBuilder {
    vector_store: Arc<dyn VectorStoreProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    graph_store: Arc<GraphStore>,
    memory: Arc<MemoryService>,
    sparse_enabled: bool,
}

impl ContextPackBuilder {
    /// Build a pipeline over the given providers and stores.
    pub fn new(
        vector_store: Arc<dyn VectorStoreProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        graph_store: Arc<GraphStore>,
        memory: Arc<MemoryService>,
        sparse_enabled: bool,
    ) -> Self {
        Self { vector_store, embedder, llm, graph_store, memory, sparse_enabled }
    }

    /// Run the full eight-step pipeline for `request`.
    pub async fn build(&self, request: BuildRequest) -> Result<ContextPack> {
        let project = request.project_name.as_str();

        let facet_specs = facets::decompose(&request.query);

        let dense = self.embedder.embed(&request.query).await?;
        let sparse = if self.sparse_enabled { self.embedder.embed_sparse(&request.query).await? } else { None };

        let mut candidates: Vec<RetrievedChunk> = Vec::new();
        for facet in &facet_specs {
            let collection = typed_collection(project, facet.chunk_kind).unwrap_or_else(|| named(project, "codebase"));
            let hits = fusion::retrieve_facet(
                self.vector_store.as_ref(),
                &collection,
                facet.name,
                &request.query,
                &dense,
                sparse.as_ref(),
                request.semantic_weight,
                facet.limit,
            )
            .await?;
            candidates.extend(hits);
        }

        if request.graph_expand && !candidates.is_empty() {
            self.expand_via_graph(project, &dense, &mut candidates).await?;
        }

        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        let ranked = if candidates.len() > 5 {
            rerank::rerank(self.llm.as_ref(), &request.query, candidates).await
        } else {
            candidates
        };

        let (selected, total_tokens) = compress::compress(ranked, request.max_tokens);

        let guardrails = self.guardrails(project, &request).await?;

        let facets = group_by_facet(&selected);
        let assembled = assemble(&facets, &guardrails);

        Ok(ContextPack { facets, total_tokens, guardrails, assembled })
    }

    async fn expand_via_graph(&self, project: &str, dense: &crate::domain::types::DenseVector, candidates: &mut Vec<RetrievedChunk>) -> Result<()> {
        let seed_files: Vec<String> = {
            let mut seen = HashSet::new();
            candidates.iter().map(|c| c.file.clone()).filter(|f| seen.insert(f.clone())).take(GRAPH_EXPAND_SEED_CAP).collect()
        };

        let expanded = self.graph_store.expand(project, &seed_files, 1).await?;
        let seed_set: HashSet<&String> = seed_files.iter().collect();
        let new_files: Vec<String> = expanded.into_iter().filter(|f| !seed_set.contains(f)).take(GRAPH_EXPAND_NEW_FILE_CAP).collect();

        let codebase = named(project, "codebase");
        for file in new_files {
            let request = SearchRequest::dense(&codebase, dense.clone(), 1).with_filter("file", file.clone());
            let hits = self.vector_store.search(request).await?;
            if let Some(hit) = hits.into_iter().next() {
                candidates.push(RetrievedChunk {
                    file: hit.chunk.chunk.file,
                    content: hit.chunk.chunk.content,
                    language: hit.chunk.chunk.language,
                    score: hit.chunk.score * GRAPH_EXPAND_SCORE_MULTIPLIER,
                    facet: GRAPH_FACET_NAME.to_string(),
                });
            }
        }

        Ok(())
    }

    async fn guardrails(&self, project: &str, request: &BuildRequest) -> Result<Guardrails> {
        let related_adrs = if request.include_adrs {
            self.recall_guardrail(project, &format!("decision {}", request.query), MemoryType::Decision).await?
        } else {
            Vec::new()
        };

        let test_commands = if request.include_tests {
            self.recall_guardrail(project, &format!("test command {}", request.query), MemoryType::Context).await?
        } else {
            Vec::new()
        };

        Ok(Guardrails { related_adrs, test_commands })
    }

    async fn recall_guardrail(&self, project: &str, query: &str, memory_type: MemoryType) -> Result<Vec<String>> {
        let hits = self.memory.recall_durable(project, query, Some(memory_type), None, GUARDRAIL_LIMIT).await?;
        Ok(hits
            .into_iter()
            .filter(|(_, score)| *score >= GUARDRAIL_SCORE_FLOOR)
            .map(|(memory, _)| memory.content.chars().take(GUARDRAIL_CONTENT_CHARS).collect())
            .collect())
    }
}

fn group_by_facet(selected: &[RetrievedChunk]) -> Vec<FacetPack> {
    let mut order: Vec<String> = Vec::new();
    let mut by_facet: std::collections::HashMap<String, Vec<PackedChunk>> = std::collections::HashMap::new();

    for chunk in selected {
        if !by_facet.contains_key(&chunk.facet) {
            order.push(chunk.facet.clone());
        }
        by_facet.entry(chunk.facet.clone()).or_default().push(PackedChunk {
            file: chunk.file.clone(),
            content: chunk.content.clone(),
            score: chunk.score,
        });
    }

    order.into_iter().map(|name| {
        let chunks = by_facet.remove(&name).unwrap_or_default();
        FacetPack { name, chunks }
    }).collect()
}

fn assemble(facets: &[FacetPack], guardrails: &Guardrails) -> String {
    let mut by_file: Vec<(String, Vec<&PackedChunk>)> = Vec::new();
    for facet in facets {
        for chunk in &facet.chunks {
            match by_file.iter_mut().find(|(file, _)| file == &chunk.file) {
                Some((_, chunks)) => chunks.push(chunk),
                None => by_file.push((chunk.file.clone(), vec![chunk])),
            }
        }
    }

    let mut out = String::new();
    for (file, chunks) in &by_file {
        let language = guess_language(file);
        out.push_str(&format!("--- {file} ---\n"));
        for chunk in chunks {
            out.push_str(&format!("```{language}\n{}\n```\n", chunk.content));
        }
    }

    if !guardrails.related_adrs.is_empty() {
        out.push_str("--- Related Decisions ---\n");
        for adr in &guardrails.related_adrs {
            out.push_str(&format!("- {adr}\n"));
        }
    }

    if !guardrails.test_commands.is_empty() {
        out.push_str("--- Test Commands ---\n");
        for cmd in &guardrails.test_commands {
            out.push_str(&format!("- {cmd}\n"));
        }
    }

    out
}

fn guess_language(file: &str) -> &'static str {
    match file.rsplit('.').next().unwrap_or("") {
        "rs" => "rust",
        "py" => "python",
        "ts" | "tsx" => "typescript",
        "js" | "jsx" => "javascript",
        "md" => "markdown",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::embedding::hashing::HashingEmbeddingProvider;
    use crate::providers::llm::null::NullLlmProvider;
    use crate::providers::vector_store::InMemoryVectorStore;
    use crate::domain::types::{Chunk, ChunkKind, Layer};
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_chunk(file: &str, content: &str, kind: ChunkKind) -> Chunk {
        Chunk {
            id: Uuid::new_v4(),
            file: file.to_string(),
            start_line: 1,
            end_line: 3,
            language: "rust".to_string(),
            content: content.to_string(),
            chunk_type: kind,
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

    async fn builder() -> (ContextPackBuilder, Arc<InMemoryVectorStore>, Arc<HashingEmbeddingProvider>) {
        let store = Arc::new(InMemoryVectorStore::new());
        let embedder = Arc::new(HashingEmbeddingProvider::new(32));
        let llm = Arc::new(NullLlmProvider);
        let graph = Arc::new(GraphStore::new(embedder.clone(), store.clone()));
        let memory = Arc::new(MemoryService::new(Arc::new(crate::memory::MemoryStore::new(embedder.clone(), store.clone()))));

        let chunk = sample_chunk("a.rs", "fn retry_with_backoff() { loop {} }", ChunkKind::Code);
        let vector = embedder.embed(&chunk.content).await.unwrap();
        store.ensure_collection("demo_code", 32, false).await.unwrap();
        store.upsert("demo_code", &[(chunk, vector, None)]).await.unwrap();

        let builder = ContextPackBuilder::new(store.clone(), embedder.clone(), llm, graph, memory, false);
        (builder, store, embedder)
    }

    #[tokio::test]
    async fn build_returns_a_pack_with_the_code_facet_populated() {
        let (builder, _, _) = builder().await;
        let request = BuildRequest::new("demo", "retry backoff loop", 2000);
        let pack = builder.build(request).await.unwrap();
        assert!(pack.facets.iter().any(|f| f.name == "code"));
        assert!(pack.assembled.contains("a.rs"));
    }

    #[tokio::test]
    async fn empty_project_returns_an_empty_but_valid_pack() {
        let store = Arc::new(InMemoryVectorStore::new());
        let embedder = Arc::new(HashingEmbeddingProvider::new(32));
        let llm = Arc::new(NullLlmProvider);
        let graph = Arc::new(GraphStore::new(embedder.clone(), store.clone()));
        let memory = Arc::new(MemoryService::new(Arc::new(crate::memory::MemoryStore::new(embedder.clone(), store.clone()))));
        let builder = ContextPackBuilder::new(store, embedder, llm, graph, memory, false);

        let pack = builder.build(BuildRequest::new("empty", "nothing here", 1000)).await.unwrap();
        assert_eq!(pack.total_tokens, 0);
        assert!(pack.assembled.is_empty());
    }
}
