//! End-to-end scenarios exercising the public surface across component
//! boundaries: incremental indexing, zero-downtime reindex, and
//! gate-guarded memory promotion.

use codectx::domain::error::Error;
use codectx::domain::ports::VectorStoreProvider;
use codectx::domain::types::{IndexStatus, MemoryType, PromoteReason};
use codectx::graph_store::GraphStore;
use codectx::indexer::{IndexRequest, Indexer};
use codectx::memory::{GateOutcome, GateRunner, IngestRequest, MemoryGovernance, MemoryService, MemoryStore, PromoteOptions};
use codectx::providers::embedding::HashingEmbeddingProvider;
use codectx::providers::vector_store::InMemoryVectorStore;
use codectx::reindex::{ReindexRequest, Reindexer};
use codectx::symbols::SymbolIndex;
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn indexer_over(store: Arc<dyn VectorStoreProvider>) -> Arc<Indexer> {
    let embedder = Arc::new(HashingEmbeddingProvider::new(32));
    Arc::new(Indexer::new(
        store.clone(),
        embedder.clone(),
        Arc::new(SymbolIndex::new(embedder.clone(), store.clone())),
        Arc::new(GraphStore::new(embedder, store)),
        true,
        Some("codebase".to_string()),
        40_000,
    ))
}

async fn chunk_ids(store: &InMemoryVectorStore, collection: &str, file: &str) -> Vec<uuid::Uuid> {
    let (chunks, _) = store.scroll(collection, 1000, None).await.unwrap();
    let mut ids: Vec<_> = chunks.into_iter().filter(|c| c.file == file).map(|c| c.id).collect();
    ids.sort();
    ids
}

/// S1 — incremental update: only the modified file is touched, with fresh
/// ids, while unrelated files keep their chunk ids across the re-run.
#[tokio::test]
async fn s1_incremental_reindex_only_touches_the_modified_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.ts"), "function a(): number {\n  return 1;\n}\n").unwrap();
    fs::write(
        dir.path().join("b.ts"),
        "function b1(): number {\n  return 1;\n}\n\nfunction b2(): number {\n  return 2;\n}\n",
    )
    .unwrap();
    fs::write(dir.path().join("c.md"), "# Notes\n\nSome project notes go here.\n").unwrap();

    let store = Arc::new(InMemoryVectorStore::new());
    let idx = indexer_over(store.clone());

    let first = idx.index_project(IndexRequest::new("demo", dir.path())).await.unwrap();
    assert_eq!(first.indexed_files, 3);

    let a_ids_before = chunk_ids(&store, "demo_code", "a.ts").await;
    let c_ids_before = chunk_ids(&store, "demo_docs", "c.md").await;
    assert_eq!(a_ids_before.len(), 1);
    assert_eq!(c_ids_before.len(), 1);
    assert_eq!(chunk_ids(&store, "demo_code", "b.ts").await.len(), 2);

    fs::write(
        dir.path().join("b.ts"),
        "function b1(): number {\n  return 1;\n}\n\nfunction b2(): number {\n  return 2;\n}\n\nfunction b3(): number {\n  return 3;\n}\n",
    )
    .unwrap();

    let second = idx.index_project(IndexRequest::new("demo", dir.path())).await.unwrap();
    assert_eq!(second.indexed_files, 1);

    assert_eq!(chunk_ids(&store, "demo_code", "a.ts").await, a_ids_before);
    assert_eq!(chunk_ids(&store, "demo_docs", "c.md").await, c_ids_before);

    let b_ids_after = chunk_ids(&store, "demo_code", "b.ts").await;
    assert_eq!(b_ids_after.len(), 3);
}

/// S2 — removed file: re-indexing after a deletion leaves zero points for
/// that file in its typed collection and drops it from the hash index (a
/// further re-run with nothing else changed reports zero indexed files).
#[tokio::test]
async fn s2_removed_file_is_purged_on_the_next_index_run() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.ts"), "function a(): number {\n  return 1;\n}\n").unwrap();
    fs::write(dir.path().join("c.md"), "# Notes\n\nSome project notes go here.\n").unwrap();

    let store = Arc::new(InMemoryVectorStore::new());
    let idx = indexer_over(store.clone());
    idx.index_project(IndexRequest::new("demo", dir.path())).await.unwrap();
    assert_eq!(chunk_ids(&store, "demo_docs", "c.md").await.len(), 1);

    fs::remove_file(dir.path().join("c.md")).unwrap();
    let report = idx.index_project(IndexRequest::new("demo", dir.path())).await.unwrap();

    assert_eq!(report.removed_files, 1);
    assert!(chunk_ids(&store, "demo_docs", "c.md").await.is_empty());

    let stable = idx.index_project(IndexRequest::new("demo", dir.path())).await.unwrap();
    assert_eq!(stable.indexed_files, 0);
    assert_eq!(stable.removed_files, 0);
}

/// S5 — zero-downtime reindex: the alias always resolves to a real,
/// populated collection, and the previous generation is gone once the swap
/// has settled.
#[tokio::test]
async fn s5_reindex_swaps_the_alias_without_ever_leaving_it_unresolved() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("lib.rs"), "pub fn login() {}\n").unwrap();

    let store: Arc<dyn VectorStoreProvider> = Arc::new(InMemoryVectorStore::new());
    let indexer = indexer_over(store.clone());
    let reindexer = Reindexer::new(store.clone(), indexer);

    let first = reindexer.reindex(ReindexRequest::new("p", dir.path())).await.unwrap();
    assert!(first.swapped);
    let t0 = store.resolve_alias("p_codebase").await.unwrap().unwrap();
    assert_eq!(t0, first.shadow_collection);
    assert!(store.collection_exists(&t0).await.unwrap());

    fs::write(dir.path().join("logout.rs"), "pub fn logout() {}\n").unwrap();
    let second = reindexer.reindex(ReindexRequest::new("p", dir.path())).await.unwrap();
    assert!(second.swapped);
    assert_ne!(second.shadow_collection, t0);

    let t1 = store.resolve_alias("p_codebase").await.unwrap().unwrap();
    assert_eq!(t1, second.shadow_collection);
    assert!(store.collection_exists(&t1).await.unwrap());
    assert!(!store.collection_exists(&t0).await.unwrap());

    let (chunks, _) = store.scroll(&t1, 1000, None).await.unwrap();
    assert!(chunks.iter().any(|c| c.file == "logout.rs"));
}

struct AlwaysFailingGates;

#[async_trait]
impl GateRunner for AlwaysFailingGates {
    async fn run_gates(&self, _project: &str, _project_path: &Path, _affected_files: &[String]) -> codectx::domain::error::Result<GateOutcome> {
        Ok(GateOutcome { passed: false, details: "typecheck: 3 errors in src/auth.ts".to_string() })
    }
}

/// S6 — gate-guarded promotion: a failing mandatory gate blocks promotion
/// entirely. The memory stays in quarantine and no durable copy appears.
#[tokio::test]
async fn s6_promotion_is_blocked_when_a_mandatory_gate_fails() {
    let embedder = Arc::new(HashingEmbeddingProvider::new(32));
    let store = Arc::new(MemoryStore::new(embedder, Arc::new(InMemoryVectorStore::new())));
    let service = MemoryService::new(store.clone());
    let governance = MemoryGovernance::new(store).with_gate_runner(Arc::new(AlwaysFailingGates));

    let memory = service
        .ingest(
            "demo",
            IngestRequest {
                memory_type: MemoryType::Insight,
                content: "auth middleware drops the bearer token on retry".to_string(),
                source: Some("auto_agent".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let opts = PromoteOptions { run_gates: true, project_path: Some(std::env::temp_dir()), affected_files: vec!["src/auth.ts".to_string()] };

    let result = governance.promote("demo", memory.id, PromoteReason::PrMerged, None, opts).await;

    match result {
        Err(Error::GateFailed { gate, details }) => {
            assert_eq!(gate, "quality_gates");
            assert!(details.contains("typecheck"));
        }
        other => panic!("expected GateFailed, got {other:?}"),
    }

    assert_eq!(service.recall_quarantine("demo", "auth middleware", None, None, 10).await.unwrap().len(), 1);
    assert!(service.recall_durable("demo", "auth middleware", None, None, 10).await.unwrap().is_empty());
}

/// Promotion soundness (invariant 6): a successful promotion removes the
/// quarantine copy and the resulting durable memory carries the original
/// source under `originalSource`.
#[tokio::test]
async fn promotion_soundness_quarantine_copy_is_gone_after_a_successful_promotion() {
    let embedder = Arc::new(HashingEmbeddingProvider::new(32));
    let store = Arc::new(MemoryStore::new(embedder, Arc::new(InMemoryVectorStore::new())));
    let service = MemoryService::new(store.clone());
    let governance = MemoryGovernance::new(store);

    let memory = service
        .ingest(
            "demo",
            IngestRequest {
                memory_type: MemoryType::Insight,
                content: "retrying with backoff fixed the flaky checkout test".to_string(),
                source: Some("auto_agent".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let promoted = governance
        .promote("demo", memory.id, PromoteReason::TestsPassed, None, PromoteOptions::default())
        .await
        .unwrap();

    assert_eq!(promoted.metadata.get("originalSource").and_then(|v| v.as_str()), Some("auto_agent"));
    assert!(service.recall_quarantine("demo", "retrying with backoff", None, None, 10).await.unwrap().is_empty());
    assert_eq!(service.recall_durable("demo", "retrying with backoff", None, None, 10).await.unwrap().len(), 1);
}

/// `index_progress` reports `Idle` before any run and `Completed` right
/// after one finishes successfully.
#[tokio::test]
async fn index_progress_transitions_from_idle_to_completed() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("lib.rs"), "pub fn login() {}\n").unwrap();
    let idx = indexer_over(Arc::new(InMemoryVectorStore::new()));

    assert_eq!(idx.progress("demo").status, IndexStatus::Idle);
    idx.index_project(IndexRequest::new("demo", dir.path())).await.unwrap();
    assert_eq!(idx.progress("demo").status, IndexStatus::Completed);
}
