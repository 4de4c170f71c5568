//! Zero-Downtime Reindexer (component C9): build a full shadow collection,
//! then atomically flip an alias onto it. Retrieval never addresses a
//! timestamped collection directly — only the alias is a stable name.

use crate::collection::named;
use crate::domain::error::Result;
use crate::domain::ports::VectorStoreProvider;
use crate::domain::types::IndexResult;
use crate::indexer::{CacheInvalidator, Indexer};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// A request to rebuild a project's codebase collection behind its alias.
#[derive(Debug, Clone)]
pub struct ReindexRequest {
    /// Project identifier.
    pub project: String,
    /// Root of the source tree to walk.
    pub project_path: PathBuf,
    /// Glob include patterns; empty means "everything".
    pub patterns: Vec<String>,
    /// Glob exclude patterns.
    pub exclude_patterns: Vec<String>,
    /// Alias to flip once the shadow build succeeds. Defaults to
    /// `{project}_codebase`.
    pub alias_name: Option<String>,
}

impl ReindexRequest {
    /// A request for `project` rooted at `project_path`, using the default
    /// `{project}_codebase` alias.
    pub fn new(project: impl Into<String>, project_path: impl Into<PathBuf>) -> Self {
        Self {
            project: project.into(),
            project_path: project_path.into(),
            patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            alias_name: None,
        }
    }
}

/// Outcome of a reindex run.
#[derive(Debug, Clone)]
pub struct ReindexReport {
    /// The alias that was (or would have been) flipped.
    pub alias: String,
    /// The shadow collection built this run.
    pub shadow_collection: String,
    /// Whether the alias was actually redirected to the shadow collection.
    pub swapped: bool,
    /// Indexing statistics for the shadow build.
    pub index_report: IndexResult,
}

/// Builds a fresh shadow collection and atomically swaps a project's alias
/// onto it, so readers never observe a partially-built collection.
pub struct Reindexer {
    vector_store: Arc<dyn VectorStoreProvider>,
    indexer: Arc<Indexer>,
    cache_invalidator: Option<Arc<dyn CacheInvalidator>>,
}

impl Reindexer {
    /// Build a reindexer sharing the given vector store and indexer.
    pub fn new(vector_store: Arc<dyn VectorStoreProvider>, indexer: Arc<Indexer>) -> Self {
        Self { vector_store, indexer, cache_invalidator: None }
    }

    /// Attach a cache invalidation hook, called with the alias name after a
    /// successful swap.
    pub fn with_cache_invalidator(mut self, invalidator: Arc<dyn CacheInvalidator>) -> Self {
        self.cache_invalidator = Some(invalidator);
        self
    }

    /// Run the zero-downtime reindex protocol for `request`.
    pub async fn reindex(&self, request: ReindexRequest) -> Result<ReindexReport> {
        let alias = request.alias_name.clone().unwrap_or_else(|| named(&request.project, "codebase"));
        // A plain timestamp can collide when two runs land in the same second;
        // the short uuid suffix guarantees a fresh shadow name every time.
        let shadow = format!("{alias}_{}_{}", Utc::now().format("%Y%m%d%H%M%S"), Uuid::new_v4().simple());

        let previous_target = self.vector_store.resolve_alias(&alias).await?;

        let build_result = self
            .indexer
            .build_into(&request.project, &request.project_path, &request.patterns, &request.exclude_patterns, &shadow)
            .await;

        let index_report = match build_result {
            Ok(report) => report,
            Err(e) => {
                self.cleanup_orphan(&shadow).await;
                return Err(e);
            }
        };

        if index_report.indexed_files == 0 {
            warn!(project = %request.project, "reindex produced no indexed files, leaving alias untouched");
            self.cleanup_orphan(&shadow).await;
            return Ok(ReindexReport { alias, shadow_collection: shadow, swapped: false, index_report });
        }

        self.vector_store.swap_alias(&alias, &shadow).await?;
        info!(alias = %alias, collection = %shadow, "alias swapped to new shadow collection");

        if let Some(previous) = previous_target {
            if previous != shadow {
                if let Err(e) = self.vector_store.drop_collection(&previous).await {
                    warn!(collection = %previous, error = %e, "failed to delete previous collection after alias swap");
                }
            }
        }

        if let Some(invalidator) = &self.cache_invalidator {
            invalidator.invalidate_project(&alias);
        }

        Ok(ReindexReport { alias, shadow_collection: shadow, swapped: true, index_report })
    }

    async fn cleanup_orphan(&self, collection: &str) {
        if let Err(e) = self.vector_store.drop_collection(collection).await {
            warn!(collection = %collection, error = %e, "failed to clean up orphaned shadow collection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_store::GraphStore;
    use crate::providers::embedding::hashing::HashingEmbeddingProvider;
    use crate::providers::vector_store::memory::InMemoryVectorStore;
    use crate::symbols::SymbolIndex;
    use std::fs;
    use tempfile::tempdir;

    fn reindexer(vector_store: Arc<dyn VectorStoreProvider>) -> Reindexer {
        let embedder = Arc::new(HashingEmbeddingProvider::new(32));
        let indexer = Arc::new(Indexer::new(
            vector_store.clone(),
            embedder.clone(),
            Arc::new(SymbolIndex::new(embedder.clone(), vector_store.clone())),
            Arc::new(GraphStore::new(embedder, vector_store.clone())),
            true,
            None,
            40_000,
        ));
        Reindexer::new(vector_store, indexer)
    }

    #[tokio::test]
    async fn first_reindex_swaps_alias_onto_a_fresh_shadow_collection() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("lib.rs"), "pub fn login() {}\n").unwrap();

        let store: Arc<dyn VectorStoreProvider> = Arc::new(InMemoryVectorStore::new());
        let reindexer = reindexer(store.clone());

        let report = reindexer.reindex(ReindexRequest::new("demo", dir.path())).await.unwrap();

        assert!(report.swapped);
        assert_eq!(report.alias, "demo_codebase");
        assert_eq!(store.resolve_alias("demo_codebase").await.unwrap(), Some(report.shadow_collection));
    }

    #[tokio::test]
    async fn second_reindex_drops_the_previous_shadow_collection() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("lib.rs"), "pub fn login() {}\n").unwrap();

        let store: Arc<dyn VectorStoreProvider> = Arc::new(InMemoryVectorStore::new());
        let reindexer = reindexer(store.clone());

        let first = reindexer.reindex(ReindexRequest::new("demo", dir.path())).await.unwrap();
        let second = reindexer.reindex(ReindexRequest::new("demo", dir.path())).await.unwrap();

        assert_ne!(first.shadow_collection, second.shadow_collection);
        assert!(!store.collection_exists(&first.shadow_collection).await.unwrap());
    }

    #[tokio::test]
    async fn empty_project_leaves_the_alias_untouched() {
        let dir = tempdir().unwrap();
        let store: Arc<dyn VectorStoreProvider> = Arc::new(InMemoryVectorStore::new());
        let reindexer = reindexer(store.clone());

        let report = reindexer.reindex(ReindexRequest::new("demo", dir.path())).await.unwrap();

        assert!(!report.swapped);
        assert_eq!(store.resolve_alias("demo_codebase").await.unwrap(), None);
    }
}
