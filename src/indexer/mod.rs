//! Indexer (component C8): walk -> hash diff -> parse -> anchor+embed ->
//! upsert, incremental by default, full on `force`. The one component that
//! mutates chunks, symbols, and edges; every other component is read-only
//! against those stores.

/// Process-wide `FileHashIndex` cache used for incremental diffing.
pub mod hash_index;
/// Process-wide `IndexProgress` cache; its `indexing` status is the
/// advisory lock against concurrent runs of the same project.
pub mod progress;
/// Glob-filtered filesystem walk.
pub mod walk;

use crate::anchor::anchor_text;
use crate::collection::{named, typed_collection, TYPED_CHUNK_SUFFIXES};
use crate::domain::error::{Error, Result};
use crate::domain::ports::{EmbeddingProvider, VectorStoreProvider};
use crate::domain::types::{
    Chunk, ChunkKind, DenseVector, Edge, FileHashEntry, IndexResult, Layer, SparseVector, Symbol,
    SymbolKind,
};
use crate::graph_store::GraphStore;
use crate::parsing::edges::extract_edges;
use crate::parsing::registry::{ParsedChunk, ParserRegistry};
use crate::symbols::{derive_signature, SymbolIndex};
use chrono::Utc;
use hash_index::{FileDiff, FileHashStore};
use progress::ProgressStore;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A request to (re)index a project's source tree.
#[derive(Debug, Clone)]
pub struct IndexRequest {
    /// Project identifier; namespaces every collection this run touches.
    pub project: String,
    /// Root of the source tree to walk.
    pub project_path: PathBuf,
    /// Glob include patterns; empty means "everything".
    pub patterns: Vec<String>,
    /// Glob exclude patterns.
    pub exclude_patterns: Vec<String>,
    /// Discard the file-hash index and every prior chunk, treating this as
    /// a full rebuild.
    pub force: bool,
    /// Diff against the stored file-hash index rather than embedding every
    /// file unconditionally. Defaults to `true`; always `true` for
    /// `index_project` callers (the zero-downtime reindexer bypasses this
    /// type entirely via [`Indexer::build_into`]).
    pub incremental: bool,
}

impl IndexRequest {
    /// A request for `project` rooted at `project_path`, indexing
    /// everything incrementally.
    pub fn new(project: impl Into<String>, project_path: impl Into<PathBuf>) -> Self {
        Self {
            project: project.into(),
            project_path: project_path.into(),
            patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            force: false,
            incremental: true,
        }
    }
}

/// Invoked after a successful run so callers holding a retrieval-result
/// cache keyed by project can drop stale entries.
pub trait CacheInvalidator: Send + Sync {
    /// Invalidate every cached result for `project`.
    fn invalidate_project(&self, project: &str);
}

const OVERSIZE_CHARS: usize = 40_000;
const FILE_BATCH_SIZE: usize = 20;
const EMBED_SUB_BATCH: usize = 100;

/// Orchestrates the ingestion pipeline for every project.
pub struct Indexer {
    vector_store: Arc<dyn VectorStoreProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    symbols: Arc<SymbolIndex>,
    graph: Arc<GraphStore>,
    parser: ParserRegistry,
    hashes: FileHashStore,
    progress: ProgressStore,
    sparse_enabled: bool,
    legacy_collection_suffix: Option<String>,
    max_chunk_chars: usize,
    cache_invalidator: Option<Arc<dyn CacheInvalidator>>,
}

impl Indexer {
    /// Build an indexer over the given providers and stores.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        vector_store: Arc<dyn VectorStoreProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
        symbols: Arc<SymbolIndex>,
        graph: Arc<GraphStore>,
        sparse_enabled: bool,
        legacy_collection_suffix: Option<String>,
        max_chunk_chars: usize,
    ) -> Self {
        Self {
            vector_store,
            embedder,
            symbols,
            graph,
            parser: ParserRegistry::new(),
            hashes: FileHashStore::new(),
            progress: ProgressStore::new(),
            sparse_enabled,
            legacy_collection_suffix,
            max_chunk_chars,
            cache_invalidator: None,
        }
    }

    /// Attach a cache invalidation hook, called with the project name at
    /// the end of every successful run.
    pub fn with_cache_invalidator(mut self, invalidator: Arc<dyn CacheInvalidator>) -> Self {
        self.cache_invalidator = Some(invalidator);
        self
    }

    /// Current progress for `project`.
    pub fn progress(&self, project: &str) -> crate::domain::types::IndexProgress {
        self.progress.get(project)
    }

    /// Run the indexing algorithm for `request`.
    pub async fn index_project(&self, request: IndexRequest) -> Result<IndexResult> {
        if self.progress.is_indexing(&request.project) {
            return Err(Error::concurrent_index(request.project.clone()));
        }

        if request.force {
            self.hashes.clear_project(&request.project);
            self.clear_project_collections(&request.project).await?;
        }

        let files = walk::walk_files(&request.project_path, &request.patterns, &request.exclude_patterns)?;
        self.progress.start(&request.project, files.len());

        match self.run(&request, &files).await {
            Ok(report) => {
                self.progress.complete(&request.project);
                if let Some(invalidator) = &self.cache_invalidator {
                    invalidator.invalidate_project(&request.project);
                }
                Ok(report)
            }
            Err(e) => {
                self.progress.fail(&request.project, e.to_string());
                Err(e)
            }
        }
    }

    async fn run(&self, request: &IndexRequest, files: &[(PathBuf, String)]) -> Result<IndexResult> {
        let legacy_collection = self.legacy_collection_suffix.as_deref().map(|suffix| named(&request.project, suffix));
        let mut report = IndexResult::default();
        let seen: Vec<String> = files.iter().map(|(_, rel)| rel.clone()).collect();

        let mut staged_hashes = if request.incremental {
            self.hashes.snapshot(&request.project)
        } else {
            HashMap::new()
        };

        let removed = self.hashes.removed_files(&request.project, &seen);
        for file in &removed {
            self.delete_file_everywhere(&request.project, file).await?;
            staged_hashes.remove(file);
        }
        report.removed_files = removed.len();

        let mut to_process: Vec<(PathBuf, String, String)> = Vec::new();
        for (path, rel) in files {
            let content = match tokio::fs::read(path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(file = %rel, error = %e, "failed to read file");
                    report.errors += 1;
                    continue;
                }
            };
            let digest = format!("{:x}", md5::compute(&content));

            if request.incremental {
                if let FileDiff::Unchanged = self.hashes.diff(&request.project, rel, &digest) {
                    continue;
                }
            }

            let Ok(text) = String::from_utf8(content) else {
                debug!(file = %rel, "skipping non-utf8 file");
                continue;
            };
            to_process.push((path.clone(), rel.clone(), text));
            let _ = digest;
        }

        let git_commit = self.detect_git_commit(&request.project_path).await;

        for batch in to_process.chunks(FILE_BATCH_SIZE) {
            for (path, rel, content) in batch {
                let digest = format!("{:x}", md5::compute(content.as_bytes()));

                if request.incremental {
                    self.delete_file_everywhere(&request.project, rel).await?;
                }

                let chunk_count = match self
                    .index_file(&request.project, rel, content, &git_commit, legacy_collection.as_deref(), &mut report)
                    .await
                {
                    Ok(count) => count,
                    Err(e) => {
                        warn!(file = %rel, error = %e, "failed to index file");
                        report.errors += 1;
                        continue;
                    }
                };

                staged_hashes.insert(
                    rel.clone(),
                    FileHashEntry { md5: digest, indexed_at: Utc::now(), chunk_count },
                );
                report.indexed_files += 1;
                let _ = path;
            }
            self.progress.advance(&request.project, batch.len());
        }

        self.hashes.commit(&request.project, staged_hashes);
        Ok(report)
    }

    /// Run steps 2 and 5-8 of the indexing algorithm for `project`: walk,
    /// parse, symbol/edge index, anchor+embed, and upsert into the typed
    /// collections plus `legacy_collection` (when given) — with no hash
    /// diffing, no deletion, and no progress/hash-store bookkeeping. Used
    /// directly by the zero-downtime reindexer to build a shadow collection
    /// without touching the live project's incremental state.
    pub async fn build_into(
        &self,
        project: &str,
        project_path: &Path,
        patterns: &[String],
        exclude_patterns: &[String],
        legacy_collection: &str,
    ) -> Result<IndexResult> {
        let files = walk::walk_files(project_path, patterns, exclude_patterns)?;
        let git_commit = self.detect_git_commit(project_path).await;
        let mut report = IndexResult::default();

        for batch in files.chunks(FILE_BATCH_SIZE) {
            for (path, rel) in batch {
                let content = match tokio::fs::read_to_string(path).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(file = %rel, error = %e, "failed to read file");
                        report.errors += 1;
                        continue;
                    }
                };
                match self
                    .index_file(project, rel, &content, &git_commit, Some(legacy_collection), &mut report)
                    .await
                {
                    Ok(_) => report.indexed_files += 1,
                    Err(e) => {
                        warn!(file = %rel, error = %e, "failed to index file");
                        report.errors += 1;
                    }
                }
            }
        }
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    async fn index_file(
        &self,
        project: &str,
        rel: &str,
        content: &str,
        git_commit: &Option<String>,
        legacy_collection: Option<&str>,
        report: &mut IndexResult,
    ) -> Result<usize> {
        let (parsed, language) = self.parser.parse(content, rel);
        let chunk_type = self.parser.classify_file(rel);
        let layer = Layer::from_path(rel);

        let file_hash = format!("{:x}", md5::compute(content.as_bytes()));
        let total_chunks = parsed.len() as u32;

        let mut chunks = Vec::with_capacity(parsed.len());
        for (index, p) in parsed.iter().enumerate() {
            if p.content.len() > self.max_chunk_chars {
                warn!(file = rel, start_line = p.start_line, "chunk exceeds size ceiling, skipping");
                report.errors += 1;
                continue;
            }
            chunks.push(self.build_chunk(
                project,
                rel,
                &language,
                chunk_type,
                layer,
                p,
                index as u32,
                total_chunks,
                &file_hash,
                git_commit,
            ));
        }

        self.index_symbols(project, rel, content, &language, &parsed).await;
        self.index_edges(project, rel, content, &parsed).await;

        let upserted = self.embed_and_upsert(project, chunk_type, legacy_collection, &chunks).await?;
        report.total_chunks += upserted;
        Ok(chunks.len())
    }

    #[allow(clippy::too_many_arguments)]
    fn build_chunk(
        &self,
        project: &str,
        rel: &str,
        language: &str,
        chunk_type: ChunkKind,
        layer: Layer,
        parsed: &ParsedChunk,
        chunk_index: u32,
        total_chunks: u32,
        file_hash: &str,
        git_commit: &Option<String>,
    ) -> Chunk {
        Chunk {
            id: Uuid::new_v4(),
            file: rel.to_string(),
            start_line: parsed.start_line,
            end_line: parsed.end_line,
            language: language.to_string(),
            content: parsed.content.clone(),
            chunk_type,
            layer,
            service: derive_service(&parsed.symbols),
            imports: parsed.imports.clone(),
            symbols: parsed.symbols.clone(),
            chunk_index,
            total_chunks,
            project: project.to_string(),
            indexed_at: Utc::now(),
            file_hash: Some(file_hash.to_string()),
            git_commit: git_commit.clone(),
        }
    }

    async fn index_symbols(&self, project: &str, rel: &str, content: &str, language: &str, parsed: &[ParsedChunk]) {
        let mut symbols = Vec::new();
        for p in parsed {
            for name in &p.symbols {
                let signature = derive_signature(&p.content, name);
                symbols.push(Symbol {
                    name: name.clone(),
                    kind: infer_symbol_kind(&p.content, name, language),
                    file: rel.to_string(),
                    start_line: p.start_line,
                    end_line: p.end_line,
                    signature: signature.clone(),
                    exported: is_exported(&signature, language),
                    project: project.to_string(),
                    indexed_at: Utc::now(),
                });
            }
        }
        if let Err(e) = self.symbols.index_file_symbols(project, rel, symbols).await {
            debug!(file = rel, error = %e, "symbol indexing failed for file");
        }
        let _ = content;
    }

    async fn index_edges(&self, project: &str, rel: &str, content: &str, parsed: &[ParsedChunk]) {
        let symbols: Vec<String> = parsed.iter().flat_map(|p| p.symbols.clone()).collect();
        let edges: Vec<Edge> = extract_edges(project, rel, content, &symbols);
        if let Err(e) = self.graph.index_file_edges(project, rel, edges).await {
            debug!(file = rel, error = %e, "edge indexing failed for file");
        }
    }

    async fn embed_and_upsert(
        &self,
        project: &str,
        chunk_type: ChunkKind,
        legacy_collection: Option<&str>,
        chunks: &[Chunk],
    ) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut upserted = 0;
        for sub_batch in chunks.chunks(EMBED_SUB_BATCH) {
            let texts: Vec<String> = sub_batch.iter().map(anchor_text).collect();

            let dense_vectors = match self.embedder.embed_batch(&texts).await {
                Ok(vectors) => vectors,
                Err(e) => {
                    warn!(error = %e, "batch embedding failed, falling back to sequential");
                    let mut vectors = Vec::with_capacity(texts.len());
                    for text in &texts {
                        match self.embedder.embed(text).await {
                            Ok(v) => vectors.push(v),
                            Err(e) => {
                                warn!(error = %e, "sequential embedding also failed for chunk, skipping");
                                vectors.push(Vec::new());
                            }
                        }
                    }
                    vectors
                }
            };

            let mut sparse_vectors: Vec<Option<SparseVector>> = Vec::with_capacity(texts.len());
            if self.sparse_enabled {
                for text in &texts {
                    sparse_vectors.push(self.embedder.embed_sparse(text).await.unwrap_or(None));
                }
            } else {
                sparse_vectors.resize(texts.len(), None);
            }

            let points: Vec<(Chunk, DenseVector, Option<SparseVector>)> = sub_batch
                .iter()
                .cloned()
                .zip(dense_vectors)
                .zip(sparse_vectors)
                .filter_map(|((chunk, dense), sparse)| {
                    if dense.is_empty() {
                        None
                    } else {
                        Some((chunk, dense, sparse))
                    }
                })
                .collect();

            if points.is_empty() {
                continue;
            }

            if let Some(collection) = typed_collection(project, chunk_type) {
                self.upsert_ensuring_collection(&collection, &points).await?;
            }
            if let Some(legacy) = legacy_collection {
                self.upsert_ensuring_collection(legacy, &points).await?;
            }
            upserted += points.len();
        }
        Ok(upserted)
    }

    async fn upsert_ensuring_collection(
        &self,
        collection: &str,
        points: &[(Chunk, DenseVector, Option<SparseVector>)],
    ) -> Result<()> {
        let dense_size = points[0].1.len();
        match self.vector_store.upsert(collection, points).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                self.vector_store.ensure_collection(collection, dense_size, self.sparse_enabled).await?;
                self.vector_store.upsert(collection, points).await
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_file_everywhere(&self, project: &str, rel: &str) -> Result<()> {
        for suffix in TYPED_CHUNK_SUFFIXES {
            let collection = named(project, suffix);
            match self.vector_store.delete_by_file(&collection, rel).await {
                Ok(_) | Err(crate::domain::error::Error::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        if let Some(suffix) = &self.legacy_collection_suffix {
            let legacy = named(project, suffix);
            match self.vector_store.delete_by_file(&legacy, rel).await {
                Ok(_) | Err(crate::domain::error::Error::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        self.symbols.clear_file_symbols(project, rel).await?;
        self.graph.index_file_edges(project, rel, Vec::new()).await?;
        Ok(())
    }

    async fn clear_project_collections(&self, project: &str) -> Result<()> {
        for suffix in TYPED_CHUNK_SUFFIXES {
            self.vector_store.drop_collection(&named(project, suffix)).await.ok();
        }
        if let Some(suffix) = &self.legacy_collection_suffix {
            self.vector_store.drop_collection(&named(project, suffix)).await.ok();
        }
        Ok(())
    }

    async fn detect_git_commit(&self, project_path: &Path) -> Option<String> {
        let output = tokio::process::Command::new("git")
            .args(["rev-parse", "--short", "HEAD"])
            .current_dir(project_path)
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let hash = String::from_utf8(output.stdout).ok()?.trim().to_string();
        if hash.is_empty() {
            None
        } else {
            info!(commit = %hash, "resolved git commit for index run");
            Some(hash)
        }
    }
}

fn derive_service(symbols: &[String]) -> Option<String> {
    symbols.iter().find(|s| s.chars().next().is_some_and(|c| c.is_uppercase())).cloned()
}

fn infer_symbol_kind(content: &str, name: &str, language: &str) -> SymbolKind {
    let line = content.lines().find(|l| l.contains(name)).unwrap_or("");
    if line.contains("struct ") || line.contains("class ") {
        SymbolKind::Class
    } else if line.contains("trait ") || line.contains("interface ") {
        SymbolKind::Interface
    } else if line.contains("enum ") {
        SymbolKind::Enum
    } else if line.contains("type ") {
        SymbolKind::Type
    } else if line.contains("const ") {
        SymbolKind::Const
    } else if line.contains("fn ") || line.contains("def ") || line.contains("function ") || language == "javascript" || language == "typescript" {
        SymbolKind::Function
    } else {
        SymbolKind::Variable
    }
}

fn is_exported(signature: &str, language: &str) -> bool {
    if language == "python" {
        return true;
    }
    signature.contains("pub ") || signature.contains("export ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::embedding::hashing::HashingEmbeddingProvider;
    use crate::providers::vector_store::memory::InMemoryVectorStore;
    use std::fs;
    use tempfile::tempdir;

    fn indexer() -> Indexer {
        let vector_store: Arc<dyn VectorStoreProvider> = Arc::new(InMemoryVectorStore::new());
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbeddingProvider::new(32));
        Indexer::new(
            vector_store.clone(),
            embedder.clone(),
            Arc::new(SymbolIndex::new(embedder.clone(), vector_store.clone())),
            Arc::new(GraphStore::new(embedder, vector_store)),
            true,
            Some("codebase".to_string()),
            OVERSIZE_CHARS,
        )
    }

    #[tokio::test]
    async fn indexes_a_small_rust_project() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("lib.rs"), "pub fn login() {}\n").unwrap();

        let idx = indexer();
        let report = idx.index_project(IndexRequest::new("demo", dir.path())).await.unwrap();

        assert_eq!(report.indexed_files, 1);
        assert!(report.total_chunks > 0);
        assert_eq!(idx.progress("demo").status, crate::domain::types::IndexStatus::Completed);
    }

    #[tokio::test]
    async fn incremental_run_skips_unchanged_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("lib.rs"), "pub fn login() {}\n").unwrap();

        let idx = indexer();
        idx.index_project(IndexRequest::new("demo", dir.path())).await.unwrap();
        let second = idx.index_project(IndexRequest::new("demo", dir.path())).await.unwrap();

        assert_eq!(second.indexed_files, 0);
    }

    #[tokio::test]
    async fn removed_file_is_deleted_from_the_index() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("lib.rs");
        fs::write(&file_path, "pub fn login() {}\n").unwrap();

        let idx = indexer();
        idx.index_project(IndexRequest::new("demo", dir.path())).await.unwrap();

        fs::remove_file(&file_path).unwrap();
        let report = idx.index_project(IndexRequest::new("demo", dir.path())).await.unwrap();
        assert_eq!(report.removed_files, 1);
    }

    #[tokio::test]
    async fn concurrent_index_runs_for_the_same_project_are_rejected() {
        let idx = indexer();
        idx.progress.start("demo", 1);
        let dir = tempdir().unwrap();
        let result = idx.index_project(IndexRequest::new("demo", dir.path())).await;
        assert!(matches!(result, Err(Error::ConcurrentIndex { .. })));
    }
}
