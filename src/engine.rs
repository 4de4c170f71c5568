//! Composition root: wires every component into one public surface.
//!
//! No DI container — every provider is constructed explicitly from
//! [`crate::config::EngineConfig`] and handed to its consumers as
//! `Arc<dyn Trait>`.

use crate::collection::named;
use crate::config::EngineConfig;
use crate::context_pack::{BuildRequest, ContextPack, ContextPackBuilder};
use crate::domain::error::Result;
use crate::domain::ports::vector_store::{FusedHit, GroupedHits, SearchRequest};
use crate::domain::ports::{EmbeddingProvider, LlmProvider, VectorStoreProvider};
use crate::domain::types::{IndexProgress, IndexResult, Memory, MemoryType, PromoteReason, SymbolKind};
use crate::gates::{GatesReport, QualityGates, RunGatesRequest};
use crate::graph_store::GraphStore;
use crate::indexer::{CacheInvalidator, IndexRequest, Indexer};
use crate::memory::governance::PromoteOptions;
use crate::memory::{MemoryGovernance, MemoryService, MemoryStore};
use crate::providers::embedding::{HashingEmbeddingProvider, NullEmbeddingProvider};
use crate::providers::llm::NullLlmProvider;
use crate::providers::vector_store::{InMemoryVectorStore, QdrantVectorStore};
use crate::reindex::{ReindexReport, ReindexRequest, Reindexer};
use crate::symbols::SymbolIndex;
use moka::future::Cache;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info_span;
use uuid::Uuid;

const CONTEXT_PACK_CACHE_CAPACITY: u64 = 1_000;
const CONTEXT_PACK_CACHE_KEY_SEPARATOR: &str = "::";

/// Caches built [`ContextPack`]s, invalidated per-project by the indexer
/// and reindexer after any run that changes what a project's packs would
/// contain.
pub struct ContextPackCache {
    cache: Cache<String, Arc<ContextPack>>,
}

impl ContextPackCache {
    fn new() -> Self {
        let cache = Cache::builder().max_capacity(CONTEXT_PACK_CACHE_CAPACITY).support_invalidation_closures().build();
        Self { cache }
    }

    fn key(project: &str, request: &BuildRequest) -> String {
        format!(
            "{project}{sep}{}{sep}{}{sep}{}",
            request.query,
            request.max_tokens,
            request.graph_expand,
            sep = CONTEXT_PACK_CACHE_KEY_SEPARATOR
        )
    }

    async fn get(&self, key: &str) -> Option<Arc<ContextPack>> {
        self.cache.get(key).await
    }

    async fn insert(&self, key: String, pack: Arc<ContextPack>) {
        self.cache.insert(key, pack).await;
    }
}

impl CacheInvalidator for ContextPackCache {
    fn invalidate_project(&self, project: &str) {
        let prefix = format!("{project}{CONTEXT_PACK_CACHE_KEY_SEPARATOR}");
        let _ = self.cache.invalidate_entries_if(move |key, _| key.starts_with(&prefix));
    }
}

/// The engine's full public surface: ingestion, memory, gates, and
/// retrieval, wired from one [`EngineConfig`].
pub struct Engine {
    vector_store: Arc<dyn VectorStoreProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    sparse_enabled: bool,
    indexer: Arc<Indexer>,
    reindexer: Reindexer,
    symbols: Arc<SymbolIndex>,
    graph: Arc<GraphStore>,
    memory_service: Arc<MemoryService>,
    memory_governance: MemoryGovernance,
    gates: Arc<QualityGates>,
    context_pack_builder: ContextPackBuilder,
    context_pack_cache: Arc<ContextPackCache>,
}

impl Engine {
    /// Wire a fresh engine from providers constructed out of `config`.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let vector_store = build_vector_store(config)?;
        let embedder = build_embedder(config);
        let llm = build_llm(config);
        Ok(Self::new(vector_store, embedder, llm, config))
    }

    /// Wire a fresh engine from explicit providers (used by integration
    /// tests and anywhere a caller wants non-default backends).
    pub fn new(
        vector_store: Arc<dyn VectorStoreProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        config: &EngineConfig,
    ) -> Self {
        let symbols = Arc::new(SymbolIndex::new(embedder.clone(), vector_store.clone()));
        let graph = Arc::new(GraphStore::new(embedder.clone(), vector_store.clone()));
        let context_pack_cache = Arc::new(ContextPackCache::new());

        let legacy_collection = if config.vector_store.separate_collections {
            None
        } else {
            Some(config.vector_store.legacy_codebase_collection.clone())
        };

        let indexer = Arc::new(
            Indexer::new(
                vector_store.clone(),
                embedder.clone(),
                symbols.clone(),
                graph.clone(),
                config.vector_store.sparse_vectors_enabled,
                legacy_collection,
                config.indexing.max_chunk_chars,
            )
            .with_cache_invalidator(context_pack_cache.clone()),
        );

        let reindexer = Reindexer::new(vector_store.clone(), indexer.clone()).with_cache_invalidator(context_pack_cache.clone());

        let memory_store = Arc::new(MemoryStore::new(embedder.clone(), vector_store.clone()));
        let memory_service = Arc::new(MemoryService::new(memory_store.clone()));
        let gates = Arc::new(QualityGates::new(graph.clone()));
        let memory_governance = MemoryGovernance::new(memory_store).with_gate_runner(gates.clone());

        let context_pack_builder = ContextPackBuilder::new(
            vector_store.clone(),
            embedder.clone(),
            llm,
            graph.clone(),
            memory_service.clone(),
            config.vector_store.sparse_vectors_enabled,
        );

        Self {
            vector_store,
            embedder,
            sparse_enabled: config.vector_store.sparse_vectors_enabled,
            indexer,
            reindexer,
            symbols,
            graph,
            memory_service,
            memory_governance,
            gates,
            context_pack_builder,
            context_pack_cache,
        }
    }

    /// Run the indexing algorithm for `request`.
    pub async fn index_project(&self, request: IndexRequest) -> Result<IndexResult> {
        let _span = info_span!("index_project", project = %request.project).entered();
        self.indexer.index_project(request).await
    }

    /// Current progress for `project`'s last (or in-flight) index run.
    pub fn index_progress(&self, project: &str) -> IndexProgress {
        self.indexer.progress(project)
    }

    /// Run a zero-downtime reindex for `request`.
    pub async fn reindex(&self, request: ReindexRequest) -> Result<ReindexReport> {
        let _span = info_span!("reindex", project = %request.project).entered();
        self.reindexer.reindex(request).await
    }

    /// Ingest a memory, routing to quarantine or durable per its source.
    pub async fn ingest_memory(&self, project: &str, request: crate::memory::IngestRequest) -> Result<Memory> {
        self.memory_service.ingest(project, request).await
    }

    /// Semantic search over durable memories.
    pub async fn recall_durable(
        &self,
        project: &str,
        query: &str,
        memory_type: Option<MemoryType>,
        tag: Option<&str>,
        limit: usize,
    ) -> Result<Vec<(Memory, f32)>> {
        self.memory_service.recall_durable(project, query, memory_type, tag, limit).await
    }

    /// Semantic search over quarantined memories.
    pub async fn recall_quarantine(
        &self,
        project: &str,
        query: &str,
        memory_type: Option<MemoryType>,
        tag: Option<&str>,
        limit: usize,
    ) -> Result<Vec<(Memory, f32)>> {
        self.memory_service.recall_quarantine(project, query, memory_type, tag, limit).await
    }

    /// Promote a quarantined memory to durable, optionally gating on
    /// `run_gates`.
    pub async fn promote_memory(
        &self,
        project: &str,
        id: Uuid,
        reason: PromoteReason,
        evidence: Option<String>,
        opts: PromoteOptions,
    ) -> Result<Memory> {
        let _span = info_span!("promote", project = %project, %id).entered();
        self.memory_governance.promote(project, id, reason, evidence, opts).await
    }

    /// Reject (delete) a quarantined memory.
    pub async fn reject_memory(&self, project: &str, id: Uuid) -> Result<()> {
        self.memory_governance.reject(project, id).await
    }

    /// Run quality gates directly, outside of a promotion.
    pub async fn run_gates(&self, request: &RunGatesRequest) -> Result<GatesReport> {
        self.gates.run_gates(request).await
    }

    /// Build a context pack, serving a cached pack when the project hasn't
    /// been reindexed since the last identical query.
    pub async fn build_context_pack(&self, request: BuildRequest) -> Result<Arc<ContextPack>> {
        let _span = info_span!("build_context_pack", project = %request.project_name).entered();
        let key = ContextPackCache::key(&request.project_name, &request);

        if let Some(cached) = self.context_pack_cache.get(&key).await {
            return Ok(cached);
        }

        let pack = Arc::new(self.context_pack_builder.build(request).await?);
        self.context_pack_cache.insert(key, pack.clone()).await;
        Ok(pack)
    }

    /// Dense similarity search over `project`'s `{suffix}` collection.
    pub async fn search(&self, project: &str, suffix: &str, query: &str, limit: usize) -> Result<Vec<FusedHit>> {
        let dense = self.embedder.embed(query).await?;
        let collection = named(project, suffix);
        self.vector_store.search(SearchRequest::dense(collection, dense, limit)).await
    }

    /// Dense similarity search over `project`'s `{suffix}` collection,
    /// grouped by `group_by`, at most `group_limit` hits per group and
    /// `groups` groups.
    pub async fn search_grouped(
        &self,
        project: &str,
        suffix: &str,
        query: &str,
        group_by: &str,
        group_limit: usize,
        groups: usize,
    ) -> Result<Vec<GroupedHits>> {
        let dense = self.embedder.embed(query).await?;
        let collection = named(project, suffix);
        let request = SearchRequest::dense(collection, dense, group_limit * groups);
        self.vector_store.search_grouped(request, group_by, group_limit, groups).await
    }

    /// Dense+sparse hybrid search (RRF-fused when the backend doesn't fuse
    /// natively) over `project`'s `{suffix}` collection.
    pub async fn search_hybrid(&self, project: &str, suffix: &str, query: &str, limit: usize) -> Result<Vec<FusedHit>> {
        let dense = self.embedder.embed(query).await?;
        let sparse = if self.sparse_enabled { self.embedder.embed_sparse(query).await? } else { None };
        let collection = named(project, suffix);
        let mut request = SearchRequest::dense(collection, dense, limit);
        request.sparse = sparse;
        self.vector_store.search(request).await
    }

    /// BFS graph expansion from `seed_files`, `hops` deep.
    pub async fn search_graph(&self, project: &str, seed_files: &[String], hops: u32) -> Result<HashSet<String>> {
        self.graph.expand(project, seed_files, hops).await
    }

    /// Find symbols matching `name`, optionally filtered to `kind`.
    pub async fn find_symbol(
        &self,
        project: &str,
        name: &str,
        kind: Option<SymbolKind>,
        limit: usize,
    ) -> Result<Vec<(crate::domain::types::Symbol, f32)>> {
        self.symbols.find_symbol(project, name, kind, limit).await
    }

    /// The shared symbol index, for direct `find_symbol`/`file_exports`/
    /// `cross_file_context` queries.
    pub fn symbols(&self) -> &Arc<SymbolIndex> {
        &self.symbols
    }

    /// The shared dependency graph, for direct `expand`/`dependents`/
    /// `dependencies`/`blast_radius` queries.
    pub fn graph(&self) -> &Arc<GraphStore> {
        &self.graph
    }
}

fn build_vector_store(config: &EngineConfig) -> Result<Arc<dyn VectorStoreProvider>> {
    if config.vector_store.url.is_empty() || config.vector_store.url == "memory" {
        Ok(Arc::new(InMemoryVectorStore::new()))
    } else {
        Ok(Arc::new(QdrantVectorStore::connect(&config.vector_store.url)?))
    }
}

fn build_embedder(config: &EngineConfig) -> Arc<dyn EmbeddingProvider> {
    match config.embedding.provider.as_str() {
        "null" => Arc::new(NullEmbeddingProvider::new(config.vector_store.vector_size)),
        _ => Arc::new(HashingEmbeddingProvider::new(config.vector_store.vector_size)),
    }
}

fn build_llm(_config: &EngineConfig) -> Arc<dyn LlmProvider> {
    // No real LLM provider is wired yet; the rerank step's fused-score
    // fallback makes this a correct default rather than a stub.
    Arc::new(NullLlmProvider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn memory_config() -> EngineConfig {
        let mut config = EngineConfig::load().expect("embedded defaults always parse");
        config.vector_store.url = "memory".to_string();
        config.vector_store.vector_size = 32;
        config
    }

    #[tokio::test]
    async fn engine_wires_up_and_reports_empty_progress_for_a_new_project() {
        let engine = Engine::from_config(&memory_config()).unwrap();
        let progress = engine.index_progress("demo");
        assert_eq!(progress.status, crate::domain::types::IndexStatus::Idle);
    }

    #[tokio::test]
    async fn ingest_then_recall_round_trips_through_the_engine() {
        let engine = Engine::from_config(&memory_config()).unwrap();
        let memory = engine
            .ingest_memory(
                "demo",
                crate::memory::IngestRequest {
                    memory_type: MemoryType::Decision,
                    content: "adopt weighted fusion over RRF for the context pack".to_string(),
                    source: Some("human".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(memory.validated);
        let hits = engine.recall_durable("demo", "weighted fusion", None, None, 5).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn retrieval_wrappers_delegate_to_the_underlying_components() {
        let engine = Engine::from_config(&memory_config()).unwrap();

        let symbol = crate::domain::types::Symbol {
            name: "login".to_string(),
            kind: crate::domain::types::SymbolKind::Function,
            file: "src/lib.rs".to_string(),
            start_line: 1,
            end_line: 3,
            signature: "fn login()".to_string(),
            exported: true,
            project: "demo".to_string(),
            indexed_at: chrono::Utc::now(),
        };
        engine.symbols().index_file_symbols("demo", "src/lib.rs", vec![symbol]).await.unwrap();

        let hits = engine.find_symbol("demo", "login", None, 10).await.unwrap();
        assert_eq!(hits.len(), 1);

        let visited = engine.search_graph("demo", &["src/lib.rs".to_string()], 1).await.unwrap();
        assert!(visited.contains("src/lib.rs"));
    }
}
