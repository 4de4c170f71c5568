//! Durable/quarantine memory store and the `ingest`/`recall` half of the
//! memory contract.
//!
//! Memories are points in a project's `{project}_memory` (durable) and
//! `{project}_memory_pending` (quarantine) collections, routed through
//! [`VectorStoreProvider`] like every other piece of durable state the
//! engine keeps. A [`Memory`] is JSON-encoded whole into a [`Chunk`]'s
//! `content` field at the storage boundary (see [`memory_to_chunk`]/
//! [`chunk_to_memory`]) — there is no per-field mapping to maintain, and the
//! chunk id is reused as the memory id so promote/reject can address a
//! memory directly by [`VectorStoreProvider::delete_by_ids`].

use crate::collection;
use crate::domain::error::Result;
use crate::domain::ports::{EmbeddingProvider, VectorStoreProvider};
use crate::domain::types::{Chunk, ChunkKind, Layer, Memory, MemoryType, StatusHistoryEntry, TodoStatus};
use crate::domain::ports::vector_store::SearchRequest;
use chrono::Utc;
use std::collections::HashMap as StdHashMap;
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_AUTO_CONFIDENCE: f32 = 0.5;
const RECALL_SCORE_FLOOR: f32 = 0.0;
const SCROLL_PAGE: usize = 100;

/// Shared pool of durable and quarantined memories, backed by the vector
/// store's `{project}_memory`/`{project}_memory_pending` collections.
pub struct MemoryStore {
    pub(crate) embedder: Arc<dyn EmbeddingProvider>,
    pub(crate) vector_store: Arc<dyn VectorStoreProvider>,
}

impl MemoryStore {
    /// Create a store backed by `embedder` for semantic recall and
    /// `vector_store` for durable state.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, vector_store: Arc<dyn VectorStoreProvider>) -> Self {
        Self { embedder, vector_store }
    }

    pub(crate) async fn upsert_into(&self, suffix: &str, project: &str, memory: &Memory) -> Result<()> {
        let collection = collection::named(project, suffix);
        self.vector_store
            .ensure_collection(&collection, self.embedder.dimensions(), false)
            .await?;
        let vector = self.embedder.embed(&memory.content).await?;
        self.vector_store
            .upsert(&collection, &[(memory_to_chunk(project, memory), vector, None)])
            .await
    }

    pub(crate) async fn remove_from(&self, suffix: &str, project: &str, id: Uuid) -> Result<usize> {
        let collection = collection::named(project, suffix);
        self.vector_store.delete_by_ids(&collection, &[id]).await
    }

    pub(crate) async fn find_in(&self, suffix: &str, project: &str, id: Uuid) -> Result<Option<Memory>> {
        Ok(self.scroll_all(suffix, project).await?.into_iter().find(|m| m.id == id))
    }

    async fn recall_from(
        &self,
        suffix: &str,
        project: &str,
        query: &str,
        memory_type: Option<MemoryType>,
        tag: Option<&str>,
        limit: usize,
    ) -> Result<Vec<(Memory, f32)>> {
        let collection = collection::named(project, suffix);
        let query_vector = self.embedder.embed(query).await?;
        let oversample = (limit * 4).max(20);

        let hits = self
            .vector_store
            .search(SearchRequest::dense(collection, query_vector, oversample))
            .await?;

        let mut ranked: Vec<(Memory, f32)> = hits
            .into_iter()
            .filter_map(|hit| chunk_to_memory(&hit.chunk.chunk).map(|m| (m, hit.chunk.score)))
            .filter(|(m, _)| memory_type.is_none_or(|t| m.memory_type == t))
            .filter(|(m, _)| tag.is_none_or(|t| m.tags.iter().any(|mt| mt == t)))
            .filter(|(_, score)| *score >= RECALL_SCORE_FLOOR)
            .collect();

        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn scroll_all(&self, suffix: &str, project: &str) -> Result<Vec<Memory>> {
        let collection = collection::named(project, suffix);
        let mut out = Vec::new();
        let mut offset = None;
        loop {
            let (chunks, next) = self.vector_store.scroll(&collection, SCROLL_PAGE, offset).await?;
            if chunks.is_empty() {
                break;
            }
            out.extend(chunks.iter().filter_map(chunk_to_memory));
            match next {
                Some(id) => offset = Some(id),
                None => break,
            }
        }
        Ok(out)
    }
}

/// Fields accepted when ingesting a new memory.
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    /// Memory type.
    pub memory_type: MemoryType,
    /// Free-form content.
    pub content: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Optional related-entity reference.
    pub related_to: Option<String>,
    /// Open metadata bag.
    pub metadata: StdHashMap<String, serde_json::Value>,
    /// Source tag; values starting with `auto_` route to quarantine.
    pub source: Option<String>,
    /// Caller-supplied confidence, used verbatim for quarantine routing.
    pub confidence: Option<f32>,
}

/// `ingest`/`recall_durable`/`recall_quarantine` (component C11).
pub struct MemoryService {
    store: Arc<MemoryStore>,
}

impl MemoryService {
    /// Build a service over `store`.
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Ingest a memory, routing to quarantine if `request.source` starts
    /// with `auto_`, otherwise straight to durable. Todos are stamped
    /// `status = Pending` with an initial history entry regardless of route.
    pub async fn ingest(&self, project: &str, request: IngestRequest) -> Result<Memory> {
        let is_auto = request.source.as_deref().is_some_and(|s| s.starts_with("auto_"));
        let now = Utc::now();

        let (status, status_history) = if request.memory_type == MemoryType::Todo {
            (Some(TodoStatus::Pending), vec![StatusHistoryEntry { status: TodoStatus::Pending, at: now }])
        } else {
            (None, Vec::new())
        };

        let confidence = if is_auto { Some(request.confidence.unwrap_or(DEFAULT_AUTO_CONFIDENCE)) } else { request.confidence };

        let memory = Memory {
            id: Uuid::new_v4(),
            memory_type: request.memory_type,
            content: request.content,
            tags: request.tags,
            related_to: request.related_to,
            created_at: now,
            updated_at: now,
            metadata: request.metadata,
            source: request.source,
            confidence,
            validated: !is_auto,
            status,
            status_history,
        };

        let suffix = if is_auto { collection::MEMORY_PENDING_SUFFIX } else { collection::MEMORY_SUFFIX };
        self.store.upsert_into(suffix, project, &memory).await?;

        Ok(memory)
    }

    /// Semantic search over durable memories, optionally filtered by type
    /// and/or tag.
    pub async fn recall_durable(
        &self,
        project: &str,
        query: &str,
        memory_type: Option<MemoryType>,
        tag: Option<&str>,
        limit: usize,
    ) -> Result<Vec<(Memory, f32)>> {
        self.store.recall_from(collection::MEMORY_SUFFIX, project, query, memory_type, tag, limit).await
    }

    /// Semantic search over quarantined memories, optionally filtered by
    /// type and/or tag.
    pub async fn recall_quarantine(
        &self,
        project: &str,
        query: &str,
        memory_type: Option<MemoryType>,
        tag: Option<&str>,
        limit: usize,
    ) -> Result<Vec<(Memory, f32)>> {
        self.store.recall_from(collection::MEMORY_PENDING_SUFFIX, project, query, memory_type, tag, limit).await
    }
}

/// Encode a [`Memory`] whole as a [`Chunk`]'s JSON `content`, reusing the
/// memory's own id as the chunk id.
fn memory_to_chunk(project: &str, memory: &Memory) -> Chunk {
    Chunk {
        id: memory.id,
        file: memory_type_to_string(memory.memory_type),
        start_line: 0,
        end_line: 0,
        language: "memory".to_string(),
        content: serde_json::to_string(memory).unwrap_or_default(),
        chunk_type: ChunkKind::Unknown,
        layer: Layer::Other,
        service: None,
        imports: Vec::new(),
        symbols: memory.tags.clone(),
        chunk_index: 0,
        total_chunks: 1,
        project: project.to_string(),
        indexed_at: memory.updated_at,
        file_hash: None,
        git_commit: None,
    }
}

fn chunk_to_memory(chunk: &Chunk) -> Option<Memory> {
    serde_json::from_str(&chunk.content).ok()
}

fn memory_type_to_string(memory_type: MemoryType) -> String {
    serde_json::to_value(memory_type)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::embedding::hashing::HashingEmbeddingProvider;
    use crate::providers::vector_store::memory::InMemoryVectorStore;

    fn service() -> MemoryService {
        MemoryService::new(Arc::new(MemoryStore::new(
            Arc::new(HashingEmbeddingProvider::new(32)),
            Arc::new(InMemoryVectorStore::new()),
        )))
    }

    #[tokio::test]
    async fn auto_sourced_memory_routes_to_quarantine_unvalidated() {
        let svc = service();
        let memory = svc
            .ingest(
                "demo",
                IngestRequest {
                    memory_type: MemoryType::Insight,
                    content: "looks like a race condition in the worker pool".to_string(),
                    source: Some("auto_agent".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!memory.validated);
        assert_eq!(memory.confidence, Some(DEFAULT_AUTO_CONFIDENCE));
        assert!(svc.recall_durable("demo", "race condition", None, None, 10).await.unwrap().is_empty());
        assert_eq!(svc.recall_quarantine("demo", "race condition", None, None, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn human_sourced_memory_routes_to_durable_validated() {
        let svc = service();
        let memory = svc
            .ingest(
                "demo",
                IngestRequest {
                    memory_type: MemoryType::Decision,
                    content: "use RRF fusion for hybrid search".to_string(),
                    source: Some("human".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(memory.validated);
        assert_eq!(svc.recall_durable("demo", "RRF fusion", None, None, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn todo_gets_pending_status_and_history_entry() {
        let svc = service();
        let memory = svc
            .ingest(
                "demo",
                IngestRequest {
                    memory_type: MemoryType::Todo,
                    content: "wire the cache invalidator into the reindexer".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(memory.status, Some(TodoStatus::Pending));
        assert_eq!(memory.status_history.len(), 1);
    }
}
